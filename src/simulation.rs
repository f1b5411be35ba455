use crate::config::{DemoConfig, PhysicsConfig};
use crate::engine::{Point, Size};
use crate::sprite::{
    AnimationRegistry, Character, Controls, Event, Projectile, ProjectileList, ProjectileSprite,
    SpriteFrame,
};

/// Input for one tick : held arrows plus whether the attack key went down
/// since the previous tick
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TickInput {
    pub controls: Controls,
    pub attack: bool,
}

/// What to draw for one tick, in draw order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub character: Option<SpriteFrame>,
    pub projectiles: Vec<SpriteFrame>,
}

/// Whole demo state, advanced one tick at a time without a browser
#[derive(Debug, Clone)]
pub struct Simulation {
    character: Character,
    projectiles: ProjectileList,
    registry: AnimationRegistry,
    projectile_sprite: ProjectileSprite,
    physics: PhysicsConfig,
    tick: u64,
}

impl Simulation {
    /// Character starts centered on the ground
    pub fn new(config: &DemoConfig, viewport: Size) -> Self {
        let start = Point {
            x: viewport.width / 2.0,
            y: config.physics.ground_level(viewport),
        };
        Simulation {
            character: Character::new(start),
            projectiles: ProjectileList::new(),
            registry: config.animations.clone(),
            projectile_sprite: config.projectile.clone(),
            physics: config.physics,
            tick: 0,
        }
    }

    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn projectiles(&self) -> &ProjectileList {
        &self.projectiles
    }

    pub fn registry(&self) -> &AnimationRegistry {
        &self.registry
    }

    /// Ticks stepped so far, also the shared projectile clock
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// ::step
    /// 1. queued attack
    /// 2. steering from held keys
    /// 3. physics
    /// 4. character animation
    /// 5. projectiles
    pub fn step(&mut self, input: &TickInput, viewport: Size) -> Frame {
        self.tick += 1;

        if input.attack {
            self.attack();
        }

        let character = self
            .character
            .transition(Event::Steer(input.controls), &self.physics)
            .integrate(&self.physics, &self.registry, viewport);
        let (character, sprite) = character.animate(&self.registry, &self.physics);
        self.character = character;

        let projectiles = self
            .projectiles
            .advance(self.tick, &self.projectile_sprite, viewport.width);

        Frame {
            character: sprite,
            projectiles,
        }
    }

    /// Fire unless a one-shot animation is already playing
    fn attack(&mut self) {
        if self.character.state.is_one_shot() {
            return;
        }
        self.projectiles.spawn(Projectile::new(
            self.character.muzzle(&self.physics),
            self.character.facing,
        ));
        self.character = self.character.transition(Event::Attack, &self.physics);
    }
}
