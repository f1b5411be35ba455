use crate::browser;
use crate::config::{DemoConfig, CONFIG_PATH};
use crate::engine::input::*;
use crate::engine::{self, Game, Panel, Point, Rect, Renderer, Size};
use crate::simulation::{Frame, Simulation, TickInput};
use crate::sprite::{AnimationRegistry, AnimationState, Controls};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use futures::join;
use std::collections::HashMap;
use web_sys::HtmlImageElement;

/// ┌───────────────────── Tick Overview ─────────────────────────────────────┐
/// │                                                                         │
/// │    ┌─────────────┐          ┌─────────────┐          ┌─────────────┐    │
/// │    │  engine.rs  │ KeyState │   game.rs   │TickInput │simulation.rs│    │
/// │    │  GameLoop   ├─────────►│  SonicBoom  ├─────────►│    step()   │    │
/// │    └──────┬──────┘          └──────┬──────┘          └──────┬──────┘    │
/// │           │                        │                        │           │
/// │           │ draw()                 │ images + Frame ◄───────┘           │
/// │           └───────────────────────►│ Renderer                           │
/// │                                                                         │
/// └─────────────────────────────────────────────────────────────────────────┘
pub enum SonicBoom {
    /// Config and sheets are still loading
    Loading,

    /// Everything loaded, ticking
    Loaded(Stage),
}

impl SonicBoom {
    pub fn new() -> Self {
        SonicBoom::Loading
    }

    /// A missing or broken `demo.json` is not fatal, the defaults run instead
    async fn load_config() -> DemoConfig {
        let config = match browser::fetch_json::<DemoConfig>(CONFIG_PATH).await {
            Ok(config) => config,
            Err(err) => {
                log!("No usable {} ({:#}), using built-in settings", CONFIG_PATH, err);
                DemoConfig::default()
            }
        };
        match config.validate() {
            Ok(warnings) => {
                for warning in warnings {
                    warn!("{}", warning);
                }
                config
            }
            Err(err) => {
                error!("{:#}, using built-in settings", err);
                DemoConfig::default()
            }
        }
    }

    async fn load_character_sheets(
        config: &DemoConfig,
    ) -> Vec<(AnimationState, Result<HtmlImageElement>)> {
        let base = &config.assets.base_path;
        let loads = config.animations.iter().map(|(state, _)| async move {
            let path = state.sheet_path(base);
            let image = engine::load_image(&path)
                .await
                .with_context(|| format!("Failed to load sprite sheet from : {}", path));
            (state, image)
        });
        join_all(loads).await
    }

    async fn load_projectile_sheet(config: &DemoConfig) -> Result<HtmlImageElement> {
        let path = config.projectile.sheet_path(&config.assets.base_path);
        engine::load_image(&path)
            .await
            .with_context(|| format!("Failed to load projectile sheet from : {}", path))
    }
}

impl Default for SonicBoom {
    fn default() -> Self {
        SonicBoom::new()
    }
}

#[async_trait(?Send)]
impl Game for SonicBoom {
    async fn initialize(&self) -> Result<Box<dyn Game>> {
        match self {
            SonicBoom::Loading => {
                let mut config = Self::load_config().await;
                // every sheet must be in before the first tick
                let (character_sheets, projectile_sheet) = join!(
                    Self::load_character_sheets(&config),
                    Self::load_projectile_sheet(&config),
                );
                let projectile_sheet = projectile_sheet?;

                let mut sheets = HashMap::new();
                for (state, image) in character_sheets {
                    match image {
                        Ok(image) => {
                            sheets.insert(state, image);
                        }
                        Err(err) => {
                            // the state keeps working, it just draws nothing
                            error!("{:#}", err);
                            config.animations.remove(state);
                        }
                    }
                }

                let adopt = config.assets.adopt_measured_sheet_size;
                reconcile_sheet_sizes(&mut config.animations, &sheets, adopt);
                let measured = measured_size(&projectile_sheet);
                if !config.projectile.animation.sheet_matches(measured.width, measured.height) {
                    warn!(
                        "projectile sheet is {}x{}, configured {}x{}",
                        measured.width,
                        measured.height,
                        config.projectile.animation.sheet_width,
                        config.projectile.animation.sheet_height
                    );
                    if adopt {
                        config.projectile.animation = config
                            .projectile
                            .animation
                            .with_sheet_size(measured.width, measured.height);
                    }
                }

                let canvas = browser::canvas()?;
                let viewport = Size {
                    width: canvas.width().into(),
                    height: canvas.height().into(),
                };
                log!(
                    "Loaded {} character sheets, canvas {}x{}",
                    sheets.len(),
                    viewport.width,
                    viewport.height
                );

                let stage = Stage {
                    simulation: Simulation::new(&config, viewport),
                    sheets,
                    projectile_sheet,
                    frame: Frame::default(),
                    background: config.display.background.clone(),
                    show_controls: config.display.show_controls,
                };
                Ok(Box::new(SonicBoom::Loaded(stage)))
            }
            SonicBoom::Loaded(_) => Err(anyhow!("Game is already initialized")),
        }
    }

    fn update(&mut self, keystate: &KeyState, viewport: Size) {
        if let SonicBoom::Loaded(stage) = self {
            let input = TickInput {
                controls: Controls {
                    up: keystate.is_pressed(ARROW_UP),
                    down: keystate.is_pressed(ARROW_DOWN),
                    left: keystate.is_pressed(ARROW_LEFT),
                    right: keystate.is_pressed(ARROW_RIGHT),
                },
                attack: keystate.was_pressed(SPACE),
            };
            stage.frame = stage.simulation.step(&input, viewport);
        }
    }

    fn draw(&self, renderer: &Renderer) {
        if let SonicBoom::Loaded(stage) = self {
            if let Err(err) = stage.draw(renderer) {
                error!("{:#}", err);
            }
        }
    }
}

const CONTROLS: [&str; 5] = [
    "\u{2190} : \u{5411}\u{5de6}\u{8dd1} (Run)",
    "\u{2192} : \u{5411}\u{53f3}\u{8d70} (Walk)",
    "\u{2191} : \u{8df3}\u{8e8d} (Jump)",
    "\u{2193} : \u{8e72}\u{4e0b} (Crouch)",
    "\u{7a7a}\u{767d}\u{9375} : \u{653b}\u{64ca} (Combo)",
];

const CONTROLS_PANEL: Panel = Panel {
    rect: Rect {
        position: Point { x: 10.0, y: 10.0 },
        size: Size {
            width: 220.0,
            height: 115.0,
        },
    },
    corner_radius: 10.0,
    padding: 10.0,
    line_height: 18.0,
    fill: "rgba(255, 255, 255, 0.78)",
    stroke: "rgba(0, 0, 0, 0.59)",
    text_color: "#000000",
    font: "14px Arial",
};

pub struct Stage {
    simulation: Simulation,
    sheets: HashMap<AnimationState, HtmlImageElement>,
    projectile_sheet: HtmlImageElement,
    /// Output of the latest tick
    frame: Frame,
    background: String,
    show_controls: bool,
}

impl Stage {
    /// Draw order : background -> character -> projectiles -> controls
    fn draw(&self, renderer: &Renderer) -> Result<()> {
        renderer.fill(&Rect::from_origin(renderer.viewport()), &self.background);

        if let Some(sprite) = &self.frame.character {
            // animate() leaves the state on the sheet it picked the frame from
            let state = self.simulation.character().state;
            if let Some(sheet) = self.sheets.get(&state) {
                renderer.draw_sprite(sheet, sprite)?;
            }
        }

        for sprite in &self.frame.projectiles {
            renderer.draw_sprite(&self.projectile_sheet, sprite)?;
        }

        if self.show_controls {
            renderer.draw_panel(&CONTROLS_PANEL, &CONTROLS)?;
        }
        Ok(())
    }
}

fn measured_size(image: &HtmlImageElement) -> Size {
    Size {
        width: image.natural_width().into(),
        height: image.natural_height().into(),
    }
}

/// Compare every configured sheet with the image that actually loaded
fn reconcile_sheet_sizes(
    registry: &mut AnimationRegistry,
    sheets: &HashMap<AnimationState, HtmlImageElement>,
    adopt: bool,
) {
    for (state, image) in sheets {
        let Some(spec) = registry.get(*state).copied() else {
            continue;
        };
        let measured = measured_size(image);
        if spec.sheet_matches(measured.width, measured.height) {
            continue;
        }
        warn!(
            "[{}] sheet is {}x{}, configured {}x{}",
            state.name(),
            measured.width,
            measured.height,
            spec.sheet_width,
            spec.sheet_height
        );
        if adopt {
            registry.insert(*state, spec.with_sheet_size(measured.width, measured.height));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legend_is_bilingual() {
        assert_eq!(
            CONTROLS,
            [
                "← : 向左跑 (Run)",
                "→ : 向右走 (Walk)",
                "↑ : 跳躍 (Jump)",
                "↓ : 蹲下 (Crouch)",
                "空白鍵 : 攻擊 (Combo)",
            ]
        );
    }

    #[test]
    fn test_legend_fits_panel() {
        let lines = CONTROLS.len() as f64;
        let needed = 2.0 * CONTROLS_PANEL.padding + lines * CONTROLS_PANEL.line_height;
        assert!(needed <= CONTROLS_PANEL.rect.size.height);
    }
}
