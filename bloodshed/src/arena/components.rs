//! Components of the arena.

use bloodshed_ecs::{Component, EntityHandle, EntityMut, FrameTime};

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Self) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl Component for Position {}

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Velocity of given speed directed from `from` to `to`.
    pub fn towards(from: &Position, to: &Position, speed: f32) -> Self {
        let distance = from.distance(to);
        if distance <= f32::EPSILON {
            return Self::default();
        }
        Self::new(
            (to.x - from.x) / distance * speed,
            (to.y - from.y) / distance * speed,
        )
    }
}

impl Component for Velocity {}

#[derive(Debug, Clone, PartialEq)]
pub struct Health {
    pub hp: i32,
    pub max: i32,
}

impl Health {
    pub const fn new(hp: i32) -> Self {
        Self { hp, max: hp }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }
}

impl Component for Health {
    fn init(&mut self, entity: &mut EntityMut<'_>) {
        self.max = self.max.max(self.hp);
        log::trace!("{:?} spawned with {} hp", entity.stat(), self.hp);
    }
}

/// Short living entity which damages the first enemy it touches.
#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner: Option<EntityHandle>,
    pub ttl: FrameTime,
    pub damage: i32,
    pub radius: f32,
}

impl Component for Projectile {}

/// Periodically fires projectiles at the nearest enemy.
#[derive(Debug, Clone, PartialEq)]
pub struct Gun {
    pub cooldown: FrameTime,
    pub timer: FrameTime,
    pub speed: f32,
    pub damage: i32,
}

impl Gun {
    pub const fn new(cooldown: FrameTime, speed: f32, damage: i32) -> Self {
        Self {
            cooldown,
            timer: cooldown,
            speed,
            damage,
        }
    }
}

impl Component for Gun {}

/// Glyph which represents the entity on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub glyph: char,
    pub frames_drawn: u64,
}

impl Sprite {
    pub const fn new(glyph: char) -> Self {
        Self {
            glyph,
            frames_drawn: 0,
        }
    }
}

impl Component for Sprite {
    fn draw(&mut self, entity: &mut EntityMut<'_>) {
        self.frames_drawn += 1;
        if let Ok(position) = entity.try_component::<Position>() {
            log::trace!(
                "draw '{}' at ({:.1}, {:.1}) with priority {}",
                self.glyph,
                position.x,
                position.y,
                entity.draw_priority(),
            );
        }
    }
}
