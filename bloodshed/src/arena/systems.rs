//! Systems of the arena, in order of their registration.

use bloodshed_ecs::{EntityHandle, Filter, FrameTime, System, World};

use super::components::{Gun, Health, Position, Projectile, Sprite, Velocity};
use super::{ENEMY, PROJECTILE};

/// Fires projectiles of entities with a gun.
pub struct Shooting;

impl System for Shooting {
    type Signature = (Position, Gun);

    fn update(&mut self, world: &mut World, entity: EntityHandle, dt: FrameTime) {
        let (origin, gun) = {
            let (position, gun) = world.components::<(Position, Gun)>(entity);
            gun.timer -= dt;
            if gun.timer > 0.0 {
                return;
            }
            gun.timer += gun.cooldown;
            (*position, gun.clone())
        };

        let target = world
            .entities_in_group(ENEMY)
            .filter_map(|enemy| {
                let enemy = world.entity(enemy);
                let position = *enemy.try_component::<Position>().ok()?;
                let velocity = enemy.try_component::<Velocity>().ok().copied();
                Some((position, velocity.unwrap_or_default()))
            })
            .min_by(|(a, _), (b, _)| a.distance(&origin).total_cmp(&b.distance(&origin)));
        let (position, velocity) = match target {
            Some(target) => target,
            None => return,
        };

        // lead the target assuming it keeps its velocity
        let mut target = position;
        for _ in 0..2 {
            let flight = origin.distance(&target) / gun.speed;
            target = Position::new(position.x + velocity.x * flight, position.y + velocity.y * flight);
        }

        let mut projectile = world.create_entity();
        projectile.create_component(origin);
        projectile.create_component(Velocity::towards(&origin, &target, gun.speed));
        projectile.create_component(Projectile {
            owner: Some(entity),
            ttl: 2.0,
            damage: gun.damage,
            radius: 0.5,
        });
        projectile.create_component(Sprite::new('*'));
        projectile.add_groups([PROJECTILE]);
        projectile.set_draw_priority(5);
    }
}

/// Moves entities, bouncing them off the walls of the arena.
pub struct Movement {
    pub half_size: f32,
}

impl System for Movement {
    type Signature = (Position, Velocity);

    fn update(&mut self, world: &mut World, entity: EntityHandle, dt: FrameTime) {
        let bound = self.half_size;
        let (position, velocity) = world.components::<(Position, Velocity)>(entity);
        position.x += velocity.x * dt;
        position.y += velocity.y * dt;
        if position.x.abs() > bound {
            position.x = position.x.clamp(-bound, bound);
            velocity.x = -velocity.x;
        }
        if position.y.abs() > bound {
            position.y = position.y.clamp(-bound, bound);
            velocity.y = -velocity.y;
        }
    }
}

/// Destroys projectiles which lived too long.
pub struct Lifetime;

impl System for Lifetime {
    type Signature = (Projectile,);

    fn update(&mut self, world: &mut World, entity: EntityHandle, dt: FrameTime) {
        let mut entity = world.entity_mut(entity);
        let projectile = entity.component_mut::<Projectile>();
        projectile.ttl -= dt;
        if projectile.ttl <= 0.0 {
            log::trace!("projectile of {:?} expired", projectile.owner);
            entity.destroy();
        }
    }
}

/// Applies damage of projectiles to enemies within their radius.
#[derive(Default)]
pub struct Collision {
    pub hits: u64,
}

impl System for Collision {
    type Signature = (Position, Projectile);

    fn update(&mut self, world: &mut World, entity: EntityHandle, _dt: FrameTime) {
        let projectile = world.entity(entity);
        if projectile.is_destroyed() {
            return;
        }
        let (position, projectile) = projectile.components::<(Position, Projectile)>();
        let (position, damage, radius) = (*position, projectile.damage, projectile.radius);

        let target = world.entities_in_group(ENEMY).find(|&enemy| {
            world
                .entity(enemy)
                .try_component::<Position>()
                .map_or(false, |enemy| enemy.distance(&position) <= radius)
        });
        let target = match target {
            Some(target) => target,
            None => return,
        };

        if let Ok(health) = world.entity_mut(target).try_component_mut::<Health>() {
            health.hp -= damage;
        }
        world.destroy(entity);
        self.hits += 1;
    }
}

/// Destroys entities which ran out of health.
#[derive(Default)]
pub struct Death {
    pub kills: u64,
}

impl System for Death {
    type Signature = (Health,);

    fn filter(&self) -> Filter {
        Filter::new().exclude::<Projectile>()
    }

    fn update(&mut self, world: &mut World, entity: EntityHandle, _dt: FrameTime) {
        let mut entity = world.entity_mut(entity);
        if entity.is_destroyed() || !entity.component::<Health>().is_dead() {
            return;
        }
        entity.destroy();
        if entity.has_group(ENEMY) {
            self.kills += 1;
        }
        log::debug!("{:?} died", entity.stat());
    }

    fn on_entity_removed(&mut self, world: &mut World, entity: EntityHandle) {
        if let Some(sprite) = world
            .get(entity)
            .and_then(|entity| entity.try_component::<Sprite>().ok())
        {
            log::trace!("'{}' left after {} frames", sprite.glyph, sprite.frames_drawn);
        }
    }
}
