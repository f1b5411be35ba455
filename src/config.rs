//! Demo settings, read from `demo.json` next to the page.
//!
//! Every field has a default so a partial file (or no file at all) works :
//!
//! ```json
//! {
//!   "assets": { "base_path": "1", "adopt_measured_sheet_size": true },
//!   "physics": { "speed": 8, "jump_power": 25, "gravity": 1.2 },
//!   "projectile": { "speed": 15, "timer": "per_instance" },
//!   "animations": { "combo": { "frame_count": 7, "sheet_width": 1822,
//!                              "sheet_height": 165, "ticks_per_frame": 5 } }
//! }
//! ```
use crate::engine::Size;
use crate::sprite::{AnimationRegistry, ProjectileSprite};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_PATH: &str = "demo.json";

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DemoConfig {
    pub assets: AssetConfig,
    pub physics: PhysicsConfig,
    pub animations: AnimationRegistry,
    pub projectile: ProjectileSprite,
    pub display: DisplayConfig,
}

impl DemoConfig {
    /// Reject tables the frame math cannot run on, return soft warnings
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = self
            .animations
            .validate()
            .context("invalid character animation table")?;
        warnings.extend(
            self.projectile
                .animation
                .validate("projectile")
                .context("invalid projectile animation")?,
        );
        Ok(warnings)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding `<state>/<state>_all.png`
    pub base_path: String,
    /// Replace configured sheet sizes with the loaded image's natural size
    pub adopt_measured_sheet_size: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        AssetConfig {
            base_path: "1".to_string(),
            adopt_measured_sheet_size: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Horizontal pixels per tick
    pub speed: f64,
    pub jump_power: f64,
    /// Added to vertical velocity every airborne tick, no terminal velocity
    pub gravity: f64,
    /// Ground sits this far above the bottom of the canvas
    pub ground_offset: f64,
    /// Projectiles spawn this far above the character's feet
    pub attack_offset: f64,
    /// Clamp width used when the current state has no sheet
    pub fallback_width: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            speed: 8.0,
            jump_power: 25.0,
            gravity: 1.2,
            ground_offset: 200.0,
            attack_offset: 80.0,
            fallback_width: 50.0,
        }
    }
}

impl PhysicsConfig {
    pub fn ground_level(&self, viewport: Size) -> f64 {
        viewport.height - self.ground_offset
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub background: String,
    pub show_controls: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            background: "#1B1B3A".to_string(),
            show_controls: true,
        }
    }
}
