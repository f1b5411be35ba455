// TABLE:
// ┌──────────────────────────────────────────────────────────────────────────┐
// │                          sprite/ layout                                  │
// ├───────────────────┬──────────────────────────────────────────────────────┤
// │ mod.rs            │ AnimationState, Facing, SpriteFrame, frame math      │
// │ animation.rs      │ AnimationSpec + AnimationRegistry (sheet table)      │
// │ state.rs          │ Character value + transitions + physics              │
// │ projectile.rs     │ Projectile + ProjectileList                          │
// └───────────────────┴──────────────────────────────────────────────────────┘
// Nothing in here touches the DOM, every type is plain data so the whole
// character can be stepped in a native unit test.
pub mod animation;
pub mod projectile;
pub mod state;

use crate::engine::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

pub use animation::{AnimationRegistry, AnimationSpec};
pub use projectile::{Projectile, ProjectileList, ProjectileSprite, ProjectileTimer};
pub use state::{Character, Controls, Event};

/// Every animation the character can be in.
///
/// ┌──────────────── State Transition Flow ──────────────────┐
/// │  From State       →  Event      →  To State             │
/// ├─────────────────────────────────────────────────────────┤
/// │  any looping      →  Steer      →  Jump/Walk/Run/       │
/// │                                    Crouch/Waiting       │
/// │  any looping      →  Attack     →  Combo                │
/// │  Jump (airborne)  →  Land       →  Waiting              │
/// │  Combo            →  Finish     →  Waiting              │
/// └─────────────────────────────────────────────────────────┘
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationState {
    Waiting,
    Walk,
    Run,
    Jump,
    Crouch,
    Combo,
}

impl AnimationState {
    pub const ALL: [AnimationState; 6] = [
        AnimationState::Waiting,
        AnimationState::Walk,
        AnimationState::Run,
        AnimationState::Jump,
        AnimationState::Crouch,
        AnimationState::Combo,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AnimationState::Waiting => "waiting",
            AnimationState::Walk => "walk",
            AnimationState::Run => "run",
            AnimationState::Jump => "jump",
            AnimationState::Crouch => "crouch",
            AnimationState::Combo => "combo",
        }
    }

    /// One-shot animations play once and hand control back to `Waiting`
    pub fn is_one_shot(self) -> bool {
        matches!(self, AnimationState::Combo)
    }

    /// `<base>/<state>/<state>_all.png`
    pub fn sheet_path(self, base: &str) -> String {
        let name = self.name();
        if base.is_empty() {
            format!("{name}/{name}_all.png")
        } else {
            format!("{}/{name}/{name}_all.png", base.trim_end_matches('/'))
        }
    }

    /// Pure steering rule, directional priority is up > right > left > down
    pub fn steer(self, controls: &Controls, on_ground: bool) -> AnimationState {
        if self.is_one_shot() {
            return self;
        }
        // an airborne jump is not one-shot, it re-steers like any other state
        if controls.up && on_ground {
            AnimationState::Jump
        } else if controls.right {
            AnimationState::Walk
        } else if controls.left {
            AnimationState::Run
        } else if controls.down {
            AnimationState::Crouch
        } else {
            AnimationState::Waiting
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Facing {
    #[default]
    Right,
    Left,
}

impl Facing {
    pub fn sign(self) -> f64 {
        match self {
            Facing::Right => 1.0,
            Facing::Left => -1.0,
        }
    }
}

/// Which point of the frame sits on `SpriteFrame::origin`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Anchor {
    BottomCenter,
    Center,
}

/// Everything the renderer needs to blit one frame of one sheet
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteFrame {
    pub index: u32,
    pub source: Rect,
    pub origin: Point,
    pub anchor: Anchor,
    pub facing: Facing,
}

impl SpriteFrame {
    pub fn new(spec: &AnimationSpec, index: u32, origin: Point, anchor: Anchor, facing: Facing) -> Self {
        let size = spec.frame_size();
        SpriteFrame {
            index,
            source: Rect::new(
                Point {
                    x: f64::from(index) * size.width,
                    y: 0.0,
                },
                size,
            ),
            origin,
            anchor,
            facing,
        }
    }

    /// Destination rectangle relative to `origin`, before mirroring
    pub fn local_destination(&self) -> Rect {
        let Size { width, height } = self.source.size;
        let y = match self.anchor {
            Anchor::BottomCenter => -height,
            Anchor::Center => -height / 2.0,
        };
        Rect::new(Point { x: -width / 2.0, y }, self.source.size)
    }

    /// World space box covered by the sprite, same for both facings
    pub fn bounds(&self) -> Rect {
        let local = self.local_destination();
        Rect::new(
            Point {
                x: self.origin.x + local.position.x,
                y: self.origin.y + local.position.y,
            },
            local.size,
        )
    }
}

/// Frame shown for a looping animation after `ticks` ticks
pub fn looping_frame(ticks: u64, spec: &AnimationSpec) -> u32 {
    ((ticks / u64::from(spec.ticks_per_frame)) % u64::from(spec.frame_count)) as u32
}

/// Frame of a one-shot animation, `None` once it has played through
pub fn one_shot_frame(ticks: u64, spec: &AnimationSpec) -> Option<u32> {
    let index = ticks / u64::from(spec.ticks_per_frame);
    (index < u64::from(spec.frame_count)).then_some(index as u32)
}
