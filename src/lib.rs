use wasm_bindgen::prelude::*;

#[macro_use]
mod browser;
pub mod config;
pub mod engine;
mod game;
pub mod simulation;
pub mod sprite;

use engine::GameLoop;
use game::SonicBoom;

/// Main entry for Webassembly module
/// - installs the panic hook
/// - sizes the canvas to the window
/// - loads config and sprite sheets, then starts the loop
#[wasm_bindgen]
pub fn main_js() -> Result<(), JsValue> {
    // setup better panic messages for debugging
    console_error_panic_hook::set_once();

    browser::spawn_local(async move {
        if let Err(err) = GameLoop::start(SonicBoom::new()).await {
            error!("Could not start game : {:#}", err);
        }
    });

    Ok(())
}
