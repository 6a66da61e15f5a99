//! Headless arena where players shoot waves of enemies.

use bloodshed_ecs::{ComponentSystem, FrameTime, Group, Manager, SystemHandle};

use components::{Gun, Health, Position, Sprite, Velocity};
use systems::{Collision, Death, Lifetime, Movement, Shooting};

mod components;
mod systems;

pub const PLAYER: Group = 0;
pub const ENEMY: Group = 1;
pub const PROJECTILE: Group = 2;

const HALF_SIZE: f32 = 10.0;
const PLAYERS: usize = 2;

/// Count of alive entities per group.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub players: usize,
    pub enemies: usize,
    pub projectiles: usize,
}

pub struct Arena {
    manager: Manager,
    collision: SystemHandle<Collision>,
    death: SystemHandle<Death>,
    elapsed: FrameTime,
    seconds: u32,
    wave: u32,
}

impl Arena {
    pub fn new() -> Self {
        let mut manager = Manager::with_capacity(256);
        manager.register_system(Shooting);
        manager.register_system(Movement {
            half_size: HALF_SIZE,
        });
        manager.register_system(Lifetime);
        let collision = manager.register_system(Collision::default());
        let death = manager.register_system(Death::default());
        manager.register_system(ComponentSystem::<Sprite>::new());

        for index in 0..PLAYERS {
            let x = if index % 2 == 0 { -2.0 } else { 2.0 };
            let mut player = manager.create_entity();
            player.create_component(Position::new(x, -HALF_SIZE + 1.0));
            player.create_component(Health::new(100));
            player.create_component(Gun::new(0.25 + 0.05 * index as FrameTime, 12.0, 2));
            player.create_component(Sprite::new('@'));
            player.add_groups([PLAYER]);
            player.set_draw_priority(10);
        }
        manager.refresh();

        let mut arena = Self {
            manager,
            collision,
            death,
            elapsed: 0.0,
            seconds: 0,
            wave: 0,
        };
        arena.spawn_wave();
        arena
    }

    /// Simulates one frame, spawning the next wave every second of game time.
    pub fn step(&mut self, dt: FrameTime) {
        self.manager.step(dt);
        self.elapsed += dt;
        while self.elapsed >= 1.0 {
            self.elapsed -= 1.0;
            self.seconds += 1;
            self.report();
            self.spawn_wave();
        }
    }

    /// Enemies of the wave enter the arena at its top edge.
    fn spawn_wave(&mut self) {
        self.wave += 1;
        let count = 1 + self.wave as usize % 4;
        for index in 0..count {
            let offset = (index as f32 - count as f32 / 2.0) * 3.0;
            let drift = if (self.wave as usize + index) % 2 == 0 { 1.5 } else { -1.5 };
            let mut enemy = self.manager.create_entity();
            enemy.create_component(Position::new(offset, HALF_SIZE - 1.0));
            enemy.create_component(Velocity::new(drift, -1.0));
            enemy.create_component(Health::new(3 + self.wave as i32 / 3));
            enemy.create_component(Sprite::new('E'));
            enemy.add_groups([ENEMY]);
        }
        log::debug!("wave {} spawned with {} enemies", self.wave, count);
    }

    pub fn roster(&self) -> Roster {
        let world = self.manager.world();
        Roster {
            players: world.entities_in_group(PLAYER).count(),
            enemies: world.entities_in_group(ENEMY).count(),
            projectiles: world.entities_in_group(PROJECTILE).count(),
        }
    }

    pub fn kills(&self) -> u64 {
        self.manager.system(self.death).kills
    }

    pub fn hits(&self) -> u64 {
        self.manager.system(self.collision).hits
    }

    pub fn report(&self) {
        let roster = self.roster();
        log::info!(
            "{:>3}s: {} entities ({} players, {} enemies, {} projectiles), {} hits, {} kills",
            self.seconds,
            self.manager.world().len(),
            roster.players,
            roster.enemies,
            roster.projectiles,
            self.hits(),
            self.kills(),
        );
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena() {
        let mut arena = Arena::new();
        let roster = arena.roster();
        assert_eq!(roster.players, PLAYERS);
        assert_eq!(roster.enemies, 2);
        assert_eq!(roster.projectiles, 0);

        for _ in 0..600 {
            arena.step(1.0 / 60.0);
        }
        let roster = arena.roster();
        assert_eq!(roster.players, PLAYERS);
        assert!(arena.hits() > 0);
        assert!(arena.kills() > 0);
        assert!(arena.kills() <= arena.hits());
    }
}
