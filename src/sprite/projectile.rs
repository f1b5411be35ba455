use super::{looping_frame, Anchor, AnimationSpec, Facing, SpriteFrame};
use crate::engine::Point;
use serde::{Deserialize, Serialize};

/// Which clock drives a projectile's animation
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileTimer {
    /// One global tick counter, every projectile animates in lockstep
    #[default]
    Shared,
    /// Each projectile counts its own age
    PerInstance,
}

/// Sheet and flight parameters shared by every projectile
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectileSprite {
    pub sheet: String,
    pub animation: AnimationSpec,
    pub speed: f64,
    /// Distance past either canvas edge before a projectile is dropped
    pub cull_margin: f64,
    pub timer: ProjectileTimer,
}

impl Default for ProjectileSprite {
    fn default() -> Self {
        ProjectileSprite {
            sheet: "sonic boom/sonicboom_all.png".to_string(),
            animation: AnimationSpec::new(5, 740.0, 19.0, 6),
            speed: 15.0,
            cull_margin: 100.0,
            timer: ProjectileTimer::Shared,
        }
    }
}

impl ProjectileSprite {
    pub fn sheet_path(&self, base: &str) -> String {
        if base.is_empty() {
            self.sheet.clone()
        } else {
            format!("{}/{}", base.trim_end_matches('/'), self.sheet)
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Projectile {
    pub position: Point,
    pub facing: Facing,
    age: u64,
}

impl Projectile {
    pub fn new(position: Point, facing: Facing) -> Self {
        Projectile {
            position,
            facing,
            age: 0,
        }
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    fn fly(mut self, speed: f64) -> Self {
        self.position.x += speed * self.facing.sign();
        self.age += 1;
        self
    }

    pub fn is_off_screen(&self, canvas_width: f64, margin: f64) -> bool {
        self.position.x > canvas_width + margin || self.position.x < -margin
    }
}

/// In-flight projectiles in spawn order
#[derive(Debug, Clone, Default)]
pub struct ProjectileList {
    projectiles: Vec<Projectile>,
}

impl ProjectileList {
    pub fn new() -> Self {
        ProjectileList::default()
    }

    pub fn spawn(&mut self, projectile: Projectile) {
        self.projectiles.push(projectile);
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    /// Move every projectile, collect the frames to draw this tick, then
    /// compact away the ones that left the canvas.
    ///
    /// A projectile that crosses the bound is still drawn on the crossing
    /// tick and never after it.
    pub fn advance(&mut self, tick: u64, sprite: &ProjectileSprite, canvas_width: f64) -> Vec<SpriteFrame> {
        let mut frames = Vec::with_capacity(self.projectiles.len());
        for projectile in self.projectiles.iter_mut() {
            *projectile = projectile.fly(sprite.speed);
            let clock = match sprite.timer {
                ProjectileTimer::Shared => tick,
                ProjectileTimer::PerInstance => projectile.age,
            };
            frames.push(SpriteFrame::new(
                &sprite.animation,
                looping_frame(clock, &sprite.animation),
                projectile.position,
                Anchor::Center,
                projectile.facing,
            ));
        }
        self.projectiles
            .retain(|projectile| !projectile.is_off_screen(canvas_width, sprite.cull_margin));
        frames
    }
}
