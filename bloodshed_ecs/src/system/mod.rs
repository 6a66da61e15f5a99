//! Utilities for *systems* in ECS.

use std::any::type_name;
use std::marker::PhantomData;

use crate::bitset::{GroupBitset, TypeIdsBitset};
use crate::component::AsAny;
use crate::entity::{Entity, EntityHandle, Group};
use crate::{Component, ComponentKey, FrameTime, TypeRegistry, World};

pub(crate) use matched::MatchedSet;
pub use signature::Signature;

mod matched;
mod signature;

/// Objects of this trait represent *system* of ECS.
///
/// System handles every entity which owns all the component types
/// of its [`Signature`] and passes its [`Filter`].
/// Systems never own entities: they receive the [`World`] and a handle
/// of the entity, and structural changes made through the world
/// are applied after the current pass.
///
pub trait System: 'static {
    /// Component types which are required by this system.
    type Signature: Signature;

    /// Additional conditions for entities, evaluated once on registration.
    fn filter(&self) -> Filter {
        Filter::new()
    }

    /// Called when the entity starts matching this system.
    fn on_entity_added(&mut self, _world: &mut World, _entity: EntityHandle) {}

    /// Called when the entity stops matching this system or is about to be erased.
    /// The entity is still readable at this point.
    fn on_entity_removed(&mut self, _world: &mut World, _entity: EntityHandle) {}

    /// Handles the entity during the update pass.
    fn update(&mut self, _world: &mut World, _entity: EntityHandle, _dt: FrameTime) {}

    /// Handles the entity during the draw pass.
    fn draw(&mut self, _world: &mut World, _entity: EntityHandle) {}
}

/// Policy of matching entity groups.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum GroupPredicate {
    /// Groups of the entity are not checked.
    #[default]
    Ignore,
    /// Entity must be tagged with every group of the bitset.
    All(GroupBitset),
    /// Entity must be tagged with at least one group of the bitset.
    Any(GroupBitset),
}

impl GroupPredicate {
    pub fn matches(&self, groups: &GroupBitset) -> bool {
        match self {
            Self::Ignore => true,
            Self::All(required) => groups.contains_all(required),
            Self::Any(required) => groups.intersects(required),
        }
    }
}

/// Conditions on entities in addition to the signature of the system.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    excluded: Vec<ComponentKey>,
    groups: GroupPredicate,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities owning the component of type `T` are not matched.
    pub fn exclude<T>(mut self) -> Self
    where
        T: Component,
    {
        self.excluded.push(ComponentKey::of::<T>());
        self
    }

    /// Entities must be tagged with every given group.
    pub fn all_groups(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
        self.groups = GroupPredicate::All(GroupBitset::from_indices(groups));
        self
    }

    /// Entities must be tagged with at least one of given groups.
    pub fn any_group(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
        self.groups = GroupPredicate::Any(GroupBitset::from_indices(groups));
        self
    }

    pub fn excluded(&self) -> &[ComponentKey] {
        &self.excluded
    }

    pub fn groups(&self) -> GroupPredicate {
        self.groups
    }
}

/// Compiled form of the signature and the filter of the system.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Matcher {
    required: TypeIdsBitset,
    excluded: TypeIdsBitset,
    groups: GroupPredicate,
}

impl Matcher {
    /// Registers every type mentioned by `S` and `filter`, then compiles them into bitsets.
    pub fn new<S>(filter: &Filter, registry: &mut TypeRegistry) -> Self
    where
        S: Signature,
    {
        let required = S::register(registry);
        let excluded = filter
            .excluded()
            .iter()
            .map(|&key| registry.register_key(key))
            .collect();
        Self {
            required,
            excluded,
            groups: filter.groups(),
        }
    }

    pub fn required(&self) -> TypeIdsBitset {
        self.required
    }

    pub fn excluded(&self) -> TypeIdsBitset {
        self.excluded
    }

    /// Entity matches if it is not destroyed, owns all required types,
    /// owns none of excluded types and passes the group predicate.
    pub fn matches(&self, entity: &Entity) -> bool {
        let type_ids = entity.type_ids();
        !entity.is_destroyed()
            && type_ids.contains_all(&self.required)
            && !type_ids.intersects(&self.excluded)
            && self.groups.matches(&entity.groups())
    }
}

/// System which runs hooks of the component of type `T`
/// for every entity that owns it.
pub struct ComponentSystem<T> {
    marker: PhantomData<fn() -> T>,
}

impl<T> ComponentSystem<T>
where
    T: Component,
{
    pub fn new() -> Self {
        Self {
            marker: PhantomData,
        }
    }
}

impl<T> Default for ComponentSystem<T>
where
    T: Component,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> System for ComponentSystem<T>
where
    T: Component,
{
    type Signature = (T,);

    fn update(&mut self, world: &mut World, entity: EntityHandle, dt: FrameTime) {
        if let Ok(mut entity) = world.try_entity_mut(entity) {
            // component could be removed earlier in this pass
            if entity.has_component::<T>() {
                entity.update_component::<T>(dt);
            }
        }
    }

    fn draw(&mut self, world: &mut World, entity: EntityHandle) {
        if let Ok(mut entity) = world.try_entity_mut(entity) {
            if entity.has_component::<T>() {
                entity.draw_component::<T>();
            }
        }
    }
}

/// Object safe counterpart of [`System`] stored by the manager.
pub(crate) trait AnySystem: AsAny {
    fn name(&self) -> &'static str;

    fn matcher(&self, registry: &mut TypeRegistry) -> Matcher;

    fn on_entity_added(&mut self, world: &mut World, entity: EntityHandle);

    fn on_entity_removed(&mut self, world: &mut World, entity: EntityHandle);

    fn update(&mut self, world: &mut World, entity: EntityHandle, dt: FrameTime);

    fn draw(&mut self, world: &mut World, entity: EntityHandle);
}

impl<S> AnySystem for S
where
    S: System,
{
    fn name(&self) -> &'static str {
        type_name::<S>()
    }

    fn matcher(&self, registry: &mut TypeRegistry) -> Matcher {
        Matcher::new::<S::Signature>(&System::filter(self), registry)
    }

    fn on_entity_added(&mut self, world: &mut World, entity: EntityHandle) {
        System::on_entity_added(self, world, entity)
    }

    fn on_entity_removed(&mut self, world: &mut World, entity: EntityHandle) {
        System::on_entity_removed(self, world, entity)
    }

    fn update(&mut self, world: &mut World, entity: EntityHandle, dt: FrameTime) {
        System::update(self, world, entity, dt)
    }

    fn draw(&mut self, world: &mut World, entity: EntityHandle) {
        System::draw(self, world, entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    struct Velocity;
    struct Frozen;

    impl Component for Position {}
    impl Component for Velocity {}
    impl Component for Frozen {}

    const PLAYER: Group = 0;
    const ENEMY: Group = 1;

    #[test]
    fn test_group_predicate() {
        let groups = GroupBitset::from_indices([PLAYER]);
        assert!(GroupPredicate::Ignore.matches(&groups));
        assert!(GroupPredicate::Any(GroupBitset::from_indices([PLAYER, ENEMY])).matches(&groups));
        assert!(!GroupPredicate::All(GroupBitset::from_indices([PLAYER, ENEMY])).matches(&groups));
        assert!(GroupPredicate::All(GroupBitset::new()).matches(&groups));
        assert!(!GroupPredicate::Any(GroupBitset::new()).matches(&groups));
    }

    #[test]
    fn test_matcher_registers_types() {
        let mut world = World::new();
        let filter = Filter::new().exclude::<Frozen>();
        let matcher = Matcher::new::<(Position, Velocity)>(&filter, world.registry_mut());

        let registry = world.registry();
        assert_eq!(registry.len(), 3);
        assert!(matcher.required().test(registry.index_of::<Position>()));
        assert!(matcher.required().test(registry.index_of::<Velocity>()));
        assert!(matcher.excluded().test(registry.index_of::<Frozen>()));
    }

    #[test]
    fn test_matcher() {
        let mut world = World::new();
        let filter = Filter::new().exclude::<Frozen>().all_groups([ENEMY]);
        let matcher = Matcher::new::<(Position, Velocity)>(&filter, world.registry_mut());

        let mut entity = world.create_entity();
        entity.create_component(Position);
        let handle = entity.handle();
        assert!(!matcher.matches(world.entity(handle).entity()));

        let mut entity = world.entity_mut(handle);
        entity.create_component(Velocity);
        assert!(!matcher.matches(world.entity(handle).entity()));

        world.entity_mut(handle).add_groups([ENEMY]);
        assert!(matcher.matches(world.entity(handle).entity()));

        world.entity_mut(handle).create_component(Frozen);
        assert!(!matcher.matches(world.entity(handle).entity()));

        world.entity_mut(handle).remove_component::<Frozen>();
        assert!(matcher.matches(world.entity(handle).entity()));

        world.destroy(handle);
        assert!(!matcher.matches(world.entity(handle).entity()));
    }
}
