//! Utilities for storage of ECS.

use crate::entity::{Entity, EntityHandle, EntityMut, EntityRef, EntityStorage, Group};
use crate::error::{fatal, EcsError, Result};
use crate::{Component, Signature, TypeRegistry};

/// Storage for entities and the registry of component types of ECS.
///
/// Structural changes made through the world only set flags of entities,
/// they are applied to systems by the [`Manager`](crate::Manager).
///
#[derive(Debug, Default)]
pub struct World {
    /// Registry of all known component types.
    pub(crate) registry: TypeRegistry,
    /// Storage for all entities.
    pub(crate) entities: EntityStorage,
}

impl World {
    /// Creates an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty world with room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: TypeRegistry::new(),
            entities: EntityStorage::with_capacity_and_key(capacity),
        }
    }

    /// Creates an empty world which uses already populated registry.
    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self {
            registry,
            entities: EntityStorage::with_key(),
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Registers the component type `T`, returning its index.
    pub fn register_component<T>(&mut self) -> usize
    where
        T: Component,
    {
        self.registry.register::<T>()
    }

    /// Creates new entity without components and groups.
    pub fn create_entity(&mut self) -> EntityMut<'_> {
        let handle = self.entities.insert(Entity::new());
        log::trace!("created entity {:?}", handle);
        EntityMut::new(handle, &mut self.entities[handle], &mut self.registry)
    }

    /// Returns `true` if the entity was not erased yet, even if it is destroyed.
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.entities.contains_key(handle)
    }

    /// Returns `true` if the entity exists and is not queued for destruction.
    pub fn is_alive(&self, handle: EntityHandle) -> bool {
        self.entities
            .get(handle)
            .map_or(false, |entity| !entity.is_destroyed())
    }

    /// Shared view of the entity, if it was not erased yet.
    pub fn get(&self, handle: EntityHandle) -> Option<EntityRef<'_>> {
        let entity = self.entities.get(handle)?;
        Some(EntityRef::new(handle, entity, &self.registry))
    }

    /// Exclusive view of the entity, if it was not erased yet.
    pub fn get_mut(&mut self, handle: EntityHandle) -> Option<EntityMut<'_>> {
        let entity = self.entities.get_mut(handle)?;
        Some(EntityMut::new(handle, entity, &mut self.registry))
    }

    pub fn try_entity(&self, handle: EntityHandle) -> Result<EntityRef<'_>> {
        self.get(handle).ok_or(EcsError::StaleHandle(handle))
    }

    pub fn try_entity_mut(&mut self, handle: EntityHandle) -> Result<EntityMut<'_>> {
        self.get_mut(handle).ok_or(EcsError::StaleHandle(handle))
    }

    /// Shared view of the entity.
    ///
    /// # Panics
    ///
    /// Panics if the entity was already erased.
    ///
    #[track_caller]
    pub fn entity(&self, handle: EntityHandle) -> EntityRef<'_> {
        fatal(self.try_entity(handle))
    }

    /// Exclusive view of the entity.
    ///
    /// # Panics
    ///
    /// Panics if the entity was already erased.
    ///
    #[track_caller]
    pub fn entity_mut(&mut self, handle: EntityHandle) -> EntityMut<'_> {
        fatal(self.try_entity_mut(handle))
    }

    /// Retrieves all components of the signature of the entity mutably at once.
    ///
    /// # Panics
    ///
    /// Panics if the entity was already erased or any of components is missing.
    ///
    #[track_caller]
    pub fn components<S>(&mut self, handle: EntityHandle) -> S::Muts<'_>
    where
        S: Signature,
    {
        let entity = match self.entities.get_mut(handle) {
            Some(entity) => entity,
            None => panic!("{}", EcsError::StaleHandle(handle)),
        };
        S::fetch_mut(handle, entity, &self.registry)
    }

    /// Queues the entity for destruction, stale handles are ignored.
    pub fn destroy(&mut self, handle: EntityHandle) {
        if let Some(mut entity) = self.get_mut(handle) {
            entity.destroy();
        }
    }

    /// Count of entities which were not erased yet, including destroyed ones.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Handles of all entities which were not erased yet, in slot order.
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.entities.keys()
    }

    /// Views of alive entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = EntityRef<'_>> + '_ {
        self.entities
            .iter()
            .filter(|(_, entity)| !entity.is_destroyed())
            .map(|(handle, entity)| EntityRef::new(handle, entity, &self.registry))
    }

    /// Handles of alive entities tagged with the group, in slot order.
    pub fn entities_in_group(&self, group: Group) -> impl Iterator<Item = EntityHandle> + '_ {
        self.entities
            .iter()
            .filter(move |(_, entity)| !entity.is_destroyed() && entity.groups().test(group))
            .map(|(handle, _)| handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health(u32);

    impl Component for Health {}

    const PLAYER: Group = 0;
    const ENEMY: Group = 1;

    #[test]
    fn test_lookup() {
        let mut world = World::with_capacity(4);
        world.register_component::<Health>();

        let mut entity = world.create_entity();
        entity.create_component(Health(10));
        let handle = entity.handle();

        assert!(world.contains(handle));
        assert!(world.is_alive(handle));
        assert_eq!(world.entity(handle).component::<Health>(), &Health(10));

        world.entity_mut(handle).component_mut::<Health>().0 = 5;
        assert_eq!(world.get(handle).unwrap().component::<Health>(), &Health(5));

        // destroyed entity stays readable until it is erased
        world.destroy(handle);
        world.destroy(handle);
        assert!(world.contains(handle));
        assert!(!world.is_alive(handle));
        assert_eq!(world.len(), 1);
        assert_eq!(world.iter().count(), 0);
        assert_eq!(world.entity(handle).component::<Health>(), &Health(5));
    }

    #[test]
    fn test_stale_handle() {
        let mut world = World::new();
        let handle = world.create_entity().handle();
        world.entities.remove(handle);
        let fresh = world.create_entity().handle();

        assert!(!world.contains(handle));
        assert!(world.get(handle).is_none());
        assert!(matches!(
            world.try_entity_mut(handle),
            Err(EcsError::StaleHandle(stale)) if stale == handle,
        ));
        assert!(world.is_alive(fresh));
        world.destroy(handle);
        assert!(world.is_alive(fresh));
    }

    #[test]
    #[should_panic]
    fn test_stale_entity() {
        let mut world = World::new();
        let handle = world.create_entity().handle();
        world.entities.remove(handle);
        world.entity(handle);
    }

    #[test]
    fn test_groups() {
        let mut world = World::new();
        let player = world.create_entity().handle();
        let enemy = world.create_entity().handle();
        let dead = world.create_entity().handle();

        world.entity_mut(player).add_groups([PLAYER]);
        world.entity_mut(enemy).add_groups([ENEMY]);
        world.entity_mut(dead).add_groups([ENEMY]);
        world.destroy(dead);

        assert_eq!(world.entities_in_group(PLAYER).collect::<Vec<_>>(), [player]);
        assert_eq!(world.entities_in_group(ENEMY).collect::<Vec<_>>(), [enemy]);
        assert_eq!(world.handles().count(), 3);
    }
}
