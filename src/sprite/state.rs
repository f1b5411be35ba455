//! Character state is a plain `Copy` value. Every step consumes the old value
//! and hands back the next one, so a tick is a chain of pure functions :
//!
//! ┌──────────┐ Steer ┌───────────┐ integrate ┌──────────┐ animate ┌───────┐
//! │ Character├──────►│ Character ├──────────►│ Character├────────►│ Frame │
//! └──────────┘       └───────────┘           └──────────┘         └───────┘
use super::{looping_frame, one_shot_frame, Anchor, AnimationRegistry, AnimationState, Facing, SpriteFrame};
use crate::config::PhysicsConfig;
use crate::engine::{Point, Size};

/// Directional keys held this tick
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Controls {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Event {
    /// Polled directional input
    Steer(Controls),
    /// Attack key went down
    Attack,
    /// Feet touched the ground
    Land,
    /// One-shot animation played its last frame
    Finish,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Character {
    pub position: Point,
    pub velocity: Point,
    pub state: AnimationState,
    pub frame_ticks: u64,
    pub facing: Facing,
    pub on_ground: bool,
}

impl Character {
    /// Standing on the ground at `position`, facing right
    pub fn new(position: Point) -> Self {
        Character {
            position,
            velocity: Point::default(),
            state: AnimationState::Waiting,
            frame_ticks: 0,
            facing: Facing::Right,
            on_ground: true,
        }
    }

    pub fn transition(self, event: Event, physics: &PhysicsConfig) -> Self {
        match event {
            Event::Steer(controls) => self.steer(&controls, physics),
            Event::Attack if !self.state.is_one_shot() => self.enter(AnimationState::Combo),
            Event::Attack => self,
            Event::Land if self.state == AnimationState::Jump => self.enter(AnimationState::Waiting),
            Event::Finish if self.state.is_one_shot() => self.enter(AnimationState::Waiting),
            Event::Land | Event::Finish => self,
        }
    }

    /// Where a projectile fired right now starts
    pub fn muzzle(&self, physics: &PhysicsConfig) -> Point {
        Point {
            x: self.position.x,
            y: self.position.y - physics.attack_offset,
        }
    }

    fn steer(mut self, controls: &Controls, physics: &PhysicsConfig) -> Self {
        // one-shot animations pin the character in place
        if self.state.is_one_shot() {
            self.velocity.x = 0.0;
            return self;
        }

        let next = self.state.steer(controls, self.on_ground);
        self.velocity.x = 0.0;
        if next == AnimationState::Jump && self.on_ground {
            self.velocity.y = -physics.jump_power;
            self.on_ground = false;
        } else if controls.right {
            self.velocity.x = physics.speed;
            self.facing = Facing::Right;
        } else if controls.left {
            self.velocity.x = -physics.speed;
            self.facing = Facing::Left;
        }

        if next != self.state {
            self.enter(next)
        } else {
            self
        }
    }

    /// ::enter
    /// - reset frame_ticks on every state change, each sheet has its own
    /// frame count so a stale counter would index past the strip
    fn enter(mut self, state: AnimationState) -> Self {
        self.state = state;
        self.frame_ticks = 0;
        self
    }

    /// Integrate one tick : velocity, gravity, ground contact, canvas clamp
    pub fn integrate(
        mut self,
        physics: &PhysicsConfig,
        registry: &AnimationRegistry,
        viewport: Size,
    ) -> Self {
        self.position.x += self.velocity.x;
        self.position.y += self.velocity.y;

        if !self.on_ground {
            self.velocity.y += physics.gravity;
        }

        let ground = physics.ground_level(viewport);
        // a grounded character rides the ground when the canvas is resized
        if self.on_ground || self.position.y >= ground {
            self.position.y = ground;
            self.velocity.y = 0.0;
            self.on_ground = true;
            self = self.transition(Event::Land, physics);
        }

        let width = registry
            .get(self.state)
            .map(|spec| spec.frame_width())
            .unwrap_or(physics.fallback_width);
        let half = width / 2.0;
        // lower bound wins when the canvas is narrower than the sprite
        self.position.x = self.position.x.min(viewport.width - half).max(half);
        self
    }

    /// Advance the animation clock and pick the frame to draw this tick.
    ///
    /// A finished one-shot switches to `Waiting` before the frame is chosen,
    /// so the tick that ends the combo already shows the idle sheet. A
    /// one-shot without a sheet has no frames to play and finishes at once.
    pub fn animate(mut self, registry: &AnimationRegistry, physics: &PhysicsConfig) -> (Self, Option<SpriteFrame>) {
        self.frame_ticks = self.frame_ticks.wrapping_add(1);
        let Some(spec) = registry.get(self.state) else {
            if self.state.is_one_shot() {
                self = self.transition(Event::Finish, physics);
                return (self, self.sprite_frame(registry));
            }
            return (self, None);
        };

        let index = if self.state.is_one_shot() {
            match one_shot_frame(self.frame_ticks, spec) {
                Some(index) => index,
                None => {
                    self = self.transition(Event::Finish, physics);
                    return (self, self.sprite_frame(registry));
                }
            }
        } else {
            looping_frame(self.frame_ticks, spec)
        };

        let frame = SpriteFrame::new(spec, index, self.position, Anchor::BottomCenter, self.facing);
        (self, Some(frame))
    }

    fn sprite_frame(&self, registry: &AnimationRegistry) -> Option<SpriteFrame> {
        registry.get(self.state).map(|spec| {
            SpriteFrame::new(
                spec,
                looping_frame(self.frame_ticks, spec),
                self.position,
                Anchor::BottomCenter,
                self.facing,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite::AnimationSpec;
    use approx::assert_relative_eq;

    const VIEWPORT: Size = Size {
        width: 1000.0,
        height: 700.0,
    };

    fn physics() -> PhysicsConfig {
        PhysicsConfig::default()
    }

    fn grounded() -> Character {
        Character::new(Point {
            x: 500.0,
            y: physics().ground_level(VIEWPORT),
        })
    }

    fn held(up: bool, down: bool, left: bool, right: bool) -> Controls {
        Controls {
            up,
            down,
            left,
            right,
        }
    }

    #[test]
    fn test_walk_right_sets_velocity_and_facing() {
        let character = grounded().transition(Event::Steer(held(false, false, false, true)), &physics());
        assert_eq!(character.state, AnimationState::Walk);
        assert_relative_eq!(character.velocity.x, 8.0);
        assert_eq!(character.facing, Facing::Right);
    }

    #[test]
    fn test_run_left_sets_velocity_and_facing() {
        let character = grounded().transition(Event::Steer(held(false, false, true, false)), &physics());
        assert_eq!(character.state, AnimationState::Run);
        assert_relative_eq!(character.velocity.x, -8.0);
        assert_eq!(character.facing, Facing::Left);
    }

    #[test]
    fn test_jump_leaves_ground() {
        let character = grounded().transition(Event::Steer(held(true, false, false, true)), &physics());
        assert_eq!(character.state, AnimationState::Jump);
        assert!(!character.on_ground);
        assert_relative_eq!(character.velocity.y, -25.0);
        assert_relative_eq!(character.velocity.x, 0.0);
    }

    #[test]
    fn test_same_state_keeps_frame_ticks() {
        let mut character = grounded().transition(Event::Steer(held(false, false, false, true)), &physics());
        character.frame_ticks = 12;
        let character = character.transition(Event::Steer(held(false, false, false, true)), &physics());
        assert_eq!(character.frame_ticks, 12);
        let character = character.transition(Event::Steer(held(false, true, false, false)), &physics());
        assert_eq!(character.state, AnimationState::Crouch);
        assert_eq!(character.frame_ticks, 0);
    }

    #[test]
    fn test_combo_ignores_steering_and_stops() {
        let mut character = grounded().transition(Event::Steer(held(false, false, false, true)), &physics());
        character = character.transition(Event::Attack, &physics());
        assert_eq!(character.state, AnimationState::Combo);
        character.frame_ticks = 3;
        let character = character.transition(Event::Steer(held(true, false, true, false)), &physics());
        assert_eq!(character.state, AnimationState::Combo);
        assert_eq!(character.frame_ticks, 3);
        assert_relative_eq!(character.velocity.x, 0.0);
        assert!(character.on_ground);
    }

    #[test]
    fn test_attack_during_combo_is_noop() {
        let mut character = grounded().transition(Event::Attack, &physics());
        character.frame_ticks = 9;
        let again = character.transition(Event::Attack, &physics());
        assert_eq!(again, character);
    }

    #[test]
    fn test_muzzle_is_above_feet() {
        let character = grounded();
        let muzzle = character.muzzle(&physics());
        assert_relative_eq!(muzzle.x, 500.0);
        assert_relative_eq!(muzzle.y, character.position.y - 80.0);
    }

    #[test]
    fn test_gravity_pulls_until_landing() {
        let registry = AnimationRegistry::default();
        let ground = physics().ground_level(VIEWPORT);
        let mut character = grounded().transition(Event::Steer(held(true, false, false, false)), &physics());
        let mut ticks = 0;
        loop {
            character = character.integrate(&physics(), &registry, VIEWPORT);
            ticks += 1;
            assert!(character.position.y <= ground);
            assert_eq!(character.on_ground, character.position.y == ground);
            if character.on_ground {
                break;
            }
            assert!(ticks < 200, "never landed");
        }
        assert_eq!(character.state, AnimationState::Waiting);
        assert_eq!(character.frame_ticks, 0);
        assert_relative_eq!(character.velocity.y, 0.0);
    }

    #[test]
    fn test_airborne_steering_follows_priority() {
        let registry = AnimationRegistry::default();
        let character = grounded()
            .transition(Event::Steer(held(true, false, false, false)), &physics())
            .integrate(&physics(), &registry, VIEWPORT)
            .transition(Event::Steer(held(true, false, true, false)), &physics());
        assert_eq!(character.state, AnimationState::Run);
        assert!(!character.on_ground);
        assert_relative_eq!(character.velocity.x, -8.0);
        assert_eq!(character.facing, Facing::Left);
    }

    #[test]
    fn test_tick_after_takeoff_without_keys_is_waiting() {
        let registry = AnimationRegistry::default();
        let character = grounded()
            .transition(Event::Steer(held(true, false, false, false)), &physics())
            .integrate(&physics(), &registry, VIEWPORT)
            .transition(Event::Steer(Controls::default()), &physics());
        assert_eq!(character.state, AnimationState::Waiting);
        assert_eq!(character.frame_ticks, 0);
        assert!(!character.on_ground);
        // still rising, no second launch
        assert!(character.velocity.y < 0.0);
        let character = character.integrate(&physics(), &registry, VIEWPORT);
        assert!(character.position.y < physics().ground_level(VIEWPORT));
        assert_eq!(character.state, AnimationState::Waiting);
    }

    #[test]
    fn test_clamp_uses_frame_width() {
        let registry = AnimationRegistry::default();
        let mut character = grounded().transition(Event::Steer(held(false, false, false, true)), &physics());
        character.position.x = VIEWPORT.width;
        let character = character.integrate(&physics(), &registry, VIEWPORT);
        let half = registry.get(AnimationState::Walk).map(|s| s.frame_width()).unwrap() / 2.0;
        assert_relative_eq!(character.position.x, VIEWPORT.width - half);
    }

    #[test]
    fn test_clamp_falls_back_without_spec() {
        let mut registry = AnimationRegistry::default();
        registry.remove(AnimationState::Run);
        let mut character = grounded().transition(Event::Steer(held(false, false, true, false)), &physics());
        character.position.x = 0.0;
        let character = character.integrate(&physics(), &registry, VIEWPORT);
        assert_relative_eq!(character.position.x, 25.0);
    }

    #[test]
    fn test_grounded_character_follows_resize() {
        let registry = AnimationRegistry::default();
        let taller = Size {
            width: 1000.0,
            height: 900.0,
        };
        let character = grounded().integrate(&physics(), &registry, taller);
        assert_relative_eq!(character.position.y, 700.0);
        assert!(character.on_ground);
    }

    #[test]
    fn test_looping_animation_wraps() {
        let mut registry = AnimationRegistry::empty();
        registry.insert(AnimationState::Waiting, AnimationSpec::new(2, 200.0, 50.0, 3));
        let mut character = grounded();
        let mut seen = Vec::new();
        for _ in 0..12 {
            let (next, frame) = character.animate(&registry, &physics());
            character = next;
            seen.push(frame.map(|f| f.index));
        }
        let expected: Vec<_> = [0, 0, 1, 1, 1, 0, 0, 0, 1, 1, 1, 0].into_iter().map(Some).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_combo_finishes_into_waiting_same_tick() {
        let registry = AnimationRegistry::default();
        let mut character = grounded().transition(Event::Attack, &physics());
        for tick in 1..35 {
            let (next, frame) = character.animate(&registry, &physics());
            character = next;
            assert_eq!(character.state, AnimationState::Combo, "tick {tick}");
            assert_eq!(frame.map(|f| f.index), Some(tick / 5));
        }
        let (character, frame) = character.animate(&registry, &physics());
        assert_eq!(character.state, AnimationState::Waiting);
        assert_eq!(character.frame_ticks, 0);
        let frame = frame.expect("waiting frame drawn");
        assert_eq!(frame.index, 0);
        let waiting = registry.get(AnimationState::Waiting).unwrap();
        assert_relative_eq!(frame.source.size.height, waiting.frame_height());
    }

    #[test]
    fn test_missing_spec_draws_nothing_but_counts() {
        let mut registry = AnimationRegistry::default();
        registry.remove(AnimationState::Crouch);
        let character = grounded().transition(Event::Steer(held(false, true, false, false)), &physics());
        let (character, frame) = character.animate(&registry, &physics());
        assert!(frame.is_none());
        assert_eq!(character.frame_ticks, 1);
    }

    #[test]
    fn test_missing_combo_sheet_finishes_immediately() {
        let mut registry = AnimationRegistry::default();
        registry.remove(AnimationState::Combo);
        let character = grounded().transition(Event::Attack, &physics());
        assert_eq!(character.state, AnimationState::Combo);
        let (character, frame) = character.animate(&registry, &physics());
        assert_eq!(character.state, AnimationState::Waiting);
        assert_eq!(character.frame_ticks, 0);
        assert_eq!(frame.map(|f| f.index), Some(0));
        let character = character.transition(Event::Steer(held(false, false, false, true)), &physics());
        assert_eq!(character.state, AnimationState::Walk);
        assert_relative_eq!(character.velocity.x, 8.0);
    }

    #[test]
    fn test_frame_ticks_survive_long_idle() {
        let registry = AnimationRegistry::default();
        let mut character = grounded();
        character.frame_ticks = u64::from(u32::MAX);
        let (character, frame) = character.animate(&registry, &physics());
        assert_eq!(character.frame_ticks, u64::from(u32::MAX) + 1);
        assert!(frame.is_some());

        let mut character = character;
        character.frame_ticks = u64::MAX;
        let (character, frame) = character.animate(&registry, &physics());
        assert_eq!(character.frame_ticks, 0);
        assert_eq!(frame.map(|f| f.index), Some(0));
    }

    #[test]
    fn test_events_are_debug_printable() {
        assert_eq!(format!("{:?}", Event::Land), "Land");
        let steer = Event::Steer(held(true, false, false, false));
        assert!(format!("{steer:?}").starts_with("Steer(Controls { up: true"));
    }
}
