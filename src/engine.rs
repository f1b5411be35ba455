use crate::browser;
use crate::sprite::SpriteFrame;
use anyhow::{anyhow, Error, Result};
// web assembly is a single threaded environment, so Rc RefCell > Mutex
use async_trait::async_trait;
use futures::channel::oneshot::channel;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::{
    // unchecked_ref (unsafe) cast from Javascript type to Rust type
    // - we control the closure creation and specify the expected type
    JsCast,
    JsValue,
};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use self::input::KeyState;

#[async_trait(?Send)]
pub trait Game {
    async fn initialize(&self) -> Result<Box<dyn Game>>;
    /// One simulation tick, `viewport` is the canvas size sampled this tick
    fn update(&mut self, keystate: &KeyState, viewport: Size);
    fn draw(&self, renderer: &Renderer);
}

pub struct GameLoop {
    frames: u64,
}

type SharedLoopClosure = Rc<RefCell<Option<browser::LoopClosure>>>;

impl GameLoop {
    /// Runs exactly one update and one draw per animation frame callback
    pub async fn start(game: impl Game + 'static) -> Result<()> {
        let mut keyevent_receiver = input::prepare_input()?;
        let canvas = browser::canvas()?;
        browser::keep_canvas_fitted(canvas.clone())?;

        let mut game = game.initialize().await?;
        let mut game_loop = GameLoop { frames: 0 };
        let mut keystate = KeyState::new();
        let renderer = Renderer {
            context: browser::context()?,
            canvas,
        };
        let f: SharedLoopClosure = Rc::new(RefCell::new(None));
        let g = f.clone();
        *g.borrow_mut() = Some(browser::create_raf_closure(move |_perf: f64| {
            // everything that arrived since the last callback lands in this tick
            input::process_input(&mut keystate, &mut keyevent_receiver);
            game.update(&keystate, renderer.viewport());
            keystate.end_tick();
            game.draw(&renderer);
            game_loop.frames += 1;
            if let Some(closure) = f.borrow().as_ref() {
                if let Err(err) = browser::request_animation_frame(closure) {
                    error!("Game loop stopped after {} frames : {:#}", game_loop.frames, err);
                }
            }
        }));

        browser::request_animation_frame(
            g.borrow()
                .as_ref()
                .ok_or_else(|| anyhow!("GameLoop: Loop is None"))?,
        )?;

        Ok(())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rect {
    pub position: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(position: Point, size: Size) -> Self {
        Rect { position, size }
    }

    pub fn from_origin(size: Size) -> Self {
        Rect::new(Point::default(), size)
    }
}

pub struct Renderer {
    context: CanvasRenderingContext2d,
    canvas: HtmlCanvasElement,
}

impl Renderer {
    pub fn viewport(&self) -> Size {
        Size {
            width: self.canvas.width().into(),
            height: self.canvas.height().into(),
        }
    }

    pub fn fill(&self, rect: &Rect, color: &str) {
        self.context.set_fill_style_str(color);
        self.context.fill_rect(
            rect.position.x,
            rect.position.y,
            rect.size.width,
            rect.size.height,
        );
    }

    /// Blit one frame of a sheet, mirrored about the sprite's own vertical
    /// axis when facing left
    pub fn draw_sprite(&self, image: &HtmlImageElement, frame: &SpriteFrame) -> Result<()> {
        let destination = frame.local_destination();
        self.context.save();
        let drawn = self.blit_at(image, frame, &destination);
        self.context.restore();
        drawn
    }

    fn blit_at(
        &self,
        image: &HtmlImageElement,
        frame: &SpriteFrame,
        destination: &Rect,
    ) -> Result<()> {
        self.context
            .translate(frame.origin.x, frame.origin.y)
            .map_err(|err| anyhow!("Could not translate context : {:#?}", err))?;
        self.context
            .scale(frame.facing.sign(), 1.0)
            .map_err(|err| anyhow!("Could not scale context : {:#?}", err))?;
        self.context
            .draw_image_with_html_image_element_and_sw_and_sh_and_dx_and_dy_and_dw_and_dh(
                image,
                frame.source.position.x,
                frame.source.position.y,
                frame.source.size.width,
                frame.source.size.height,
                destination.position.x,
                destination.position.y,
                destination.size.width,
                destination.size.height,
            )
            .map_err(|err| anyhow!("Could not draw sprite : {:#?}", err))
    }

    /// Rounded translucent box with one line of text per entry
    pub fn draw_panel(&self, panel: &Panel, lines: &[&str]) -> Result<()> {
        let Rect { position, size } = panel.rect;
        let radius = panel.corner_radius;
        self.context.save();
        self.context.begin_path();
        self.context.move_to(position.x + radius, position.y);
        let corners = [
            (position.x + size.width, position.y, position.x + size.width, position.y + size.height),
            (position.x + size.width, position.y + size.height, position.x, position.y + size.height),
            (position.x, position.y + size.height, position.x, position.y),
            (position.x, position.y, position.x + size.width, position.y),
        ];
        for (x1, y1, x2, y2) in corners {
            self.context
                .arc_to(x1, y1, x2, y2, radius)
                .map_err(|err| anyhow!("Could not trace panel : {:#?}", err))?;
        }
        self.context.close_path();
        self.context.set_fill_style_str(panel.fill);
        self.context.fill();
        self.context.set_stroke_style_str(panel.stroke);
        self.context.stroke();

        self.context.set_fill_style_str(panel.text_color);
        self.context.set_font(panel.font);
        self.context.set_text_align("left");
        self.context.set_text_baseline("top");
        for (row, line) in lines.iter().enumerate() {
            let y = position.y + panel.padding + row as f64 * panel.line_height;
            self.context
                .fill_text(line, position.x + panel.padding, y)
                .map_err(|err| anyhow!("Could not draw text : {:#?}", err))?;
        }
        self.context.restore();
        Ok(())
    }
}

/// Styling of an on-screen text panel
pub struct Panel {
    pub rect: Rect,
    pub corner_radius: f64,
    pub padding: f64,
    pub line_height: f64,
    pub fill: &'static str,
    pub stroke: &'static str,
    pub text_color: &'static str,
    pub font: &'static str,
}

/// Asynchronously load an image from a given source path
/// # Arguments
/// * `source` - string slice to path/url
/// # Returns
/// * `Ok(HtmlImageElement)` - on load success
/// * `Err` - on load fail
pub async fn load_image(source: &str) -> Result<HtmlImageElement> {
    let image = browser::new_image()?;
    let (tx, rx) = channel::<Result<(), Error>>();
    let success_tx = Rc::new(RefCell::new(Some(tx)));
    let error_tx = success_tx.clone();

    let success_callback = browser::closure_once(move || {
        if let Some(tx) = success_tx.borrow_mut().take() {
            let _ = tx.send(Ok(()));
        }
    });

    let owned_source = source.to_string();
    let error_callback = browser::closure_once(move |err: JsValue| {
        if let Some(tx) = error_tx.borrow_mut().take() {
            let _ = tx.send(Err(anyhow!(
                "Error loading image [{}] : {:#?}",
                owned_source,
                err
            )));
        }
    });

    image.set_onload(Some(success_callback.as_ref().unchecked_ref()));
    image.set_onerror(Some(error_callback.as_ref().unchecked_ref()));
    image.set_src(source);

    // keep callback alive until image is loaded or errors
    success_callback.forget();
    error_callback.forget();

    // ?? - Result<Result<(), Error>, oneshot::Canceled>
    // - first ? yields channel result
    // - second ? yields image load result
    rx.await??;

    Ok(image)
}

pub mod input {
    use crate::browser;
    use anyhow::{anyhow, Result};
    use futures::channel::mpsc::{unbounded, UnboundedReceiver};
    use std::collections::HashSet;
    use wasm_bindgen::closure::Closure;
    use wasm_bindgen::JsCast;
    use web_sys::KeyboardEvent;

    pub const ARROW_UP: &str = "ArrowUp";
    pub const ARROW_DOWN: &str = "ArrowDown";
    pub const ARROW_LEFT: &str = "ArrowLeft";
    pub const ARROW_RIGHT: &str = "ArrowRight";
    pub const SPACE: &str = "Space";

    // keys whose default browser action (scrolling) is suppressed
    const CAPTURED: [&str; 5] = [ARROW_UP, ARROW_DOWN, ARROW_LEFT, ARROW_RIGHT, SPACE];

    #[derive(Debug)]
    pub enum KeyPress {
        KeyDown(KeyboardEvent),
        KeyUp(KeyboardEvent),
    }

    /// Held keys (level) plus keys pressed since the last tick (edge)
    #[derive(Debug, Default)]
    pub struct KeyState {
        held: HashSet<String>,
        pressed: HashSet<String>,
    }

    impl KeyState {
        pub fn new() -> Self {
            KeyState::default()
        }

        pub fn is_pressed(&self, code: &str) -> bool {
            self.held.contains(code)
        }

        /// True when `code` went down since the previous tick, auto repeat excluded
        pub fn was_pressed(&self, code: &str) -> bool {
            self.pressed.contains(code)
        }

        pub fn set_pressed(&mut self, code: &str, repeat: bool) {
            if !repeat && self.held.insert(code.to_string()) {
                self.pressed.insert(code.to_string());
            }
        }

        pub fn set_released(&mut self, code: &str) {
            self.held.remove(code);
        }

        /// Forget edge presses once a tick consumed them
        pub fn end_tick(&mut self) {
            self.pressed.clear();
        }
    }

    pub fn prepare_input() -> Result<UnboundedReceiver<KeyPress>> {
        let (keydown_sender, keyevent_receiver) = unbounded();
        let keyup_sender = keydown_sender.clone();

        let onkeydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            if CAPTURED.contains(&event.code().as_str()) {
                event.prevent_default();
            }
            let _ = keydown_sender.unbounded_send(KeyPress::KeyDown(event));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let onkeyup = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
            let _ = keyup_sender.unbounded_send(KeyPress::KeyUp(event));
        }) as Box<dyn FnMut(KeyboardEvent)>);

        let window = browser::window()?;
        listen(&window, "keydown", &onkeydown)?;
        listen(&window, "keyup", &onkeyup)?;
        onkeydown.forget();
        onkeyup.forget();

        Ok(keyevent_receiver)
    }

    fn listen(
        window: &web_sys::Window,
        event: &str,
        callback: &Closure<dyn FnMut(KeyboardEvent)>,
    ) -> Result<()> {
        window
            .add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
            .map_err(|err| anyhow!("Could not listen for {} : {:#?}", event, err))
    }

    /// Drain every queued key event into `state`, stops once the queue is
    /// empty or every sender is gone
    pub fn process_input(state: &mut KeyState, keyevent_receiver: &mut UnboundedReceiver<KeyPress>) {
        while let Ok(evt) = keyevent_receiver.try_recv() {
            apply(state, &evt);
        }
    }

    pub fn apply(state: &mut KeyState, evt: &KeyPress) {
        match evt {
            KeyPress::KeyDown(event) => state.set_pressed(&event.code(), event.repeat()),
            KeyPress::KeyUp(event) => state.set_released(&event.code()),
        }
    }

}
