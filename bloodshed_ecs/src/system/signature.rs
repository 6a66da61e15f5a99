//! Utilities for signature of *systems* in ECS.

use crate::component::downcast_mut;
use crate::error::{fatal, EcsError};
use crate::{Component, ComponentKey, Entity, EntityHandle, TypeIdsBitset, TypeRegistry};

/// Signature of the *system* in ECS.
///
/// Describes which component types an entity must own to be handled by the system.
/// Implemented for the unit type and for tuples up to 8 elements.
///
pub trait Signature: 'static {
    /// Tuple of shared references to the components of this signature.
    type Refs<'a>;

    /// Tuple of mutable references to the components of this signature.
    type Muts<'a>;

    /// Keys of the component types in this signature.
    fn keys() -> Box<[ComponentKey]>;

    /// Registers every type of this signature, returning the bitset of their indices.
    fn register(registry: &mut TypeRegistry) -> TypeIdsBitset {
        Self::keys()
            .iter()
            .map(|&key| registry.register_key(key))
            .collect()
    }

    fn fetch<'a>(handle: EntityHandle, entity: &'a Entity, registry: &TypeRegistry) -> Self::Refs<'a>;

    fn fetch_mut<'a>(
        handle: EntityHandle,
        entity: &'a mut Entity,
        registry: &TypeRegistry,
    ) -> Self::Muts<'a>;
}

impl Signature for () {
    type Refs<'a> = ();
    type Muts<'a> = ();

    fn keys() -> Box<[ComponentKey]> {
        Box::from([])
    }

    fn fetch<'a>(_: EntityHandle, _: &'a Entity, _: &TypeRegistry) -> Self::Refs<'a> {}

    fn fetch_mut<'a>(_: EntityHandle, _: &'a mut Entity, _: &TypeRegistry) -> Self::Muts<'a> {}
}

#[track_caller]
fn get<'a, T>(handle: EntityHandle, entity: &'a Entity, registry: &TypeRegistry) -> &'a T
where
    T: Component,
{
    fatal(entity.try_component::<T>(handle, registry))
}

/// Takes the component of type `T` out of the slot references,
/// so every component can be borrowed mutably only once.
#[track_caller]
fn take<'a, T>(
    handle: EntityHandle,
    slots: &mut [Option<&'a mut dyn Component>],
    registry: &TypeRegistry,
) -> &'a mut T
where
    T: Component,
{
    let index = fatal(registry.try_index_of::<T>());
    match slots[index].take() {
        Some(component) => downcast_mut(component),
        None => panic!("{}", EcsError::missing::<T>(handle)),
    }
}

// Generate implementations of Signature for tuples up to 8 elements.
macro_rules! impl_signature {
    ($($name:ident),+) => {
        impl<$($name),+> Signature for ($($name,)+)
        where
            $($name: Component,)+
        {
            type Refs<'a> = ($(&'a $name,)+);
            type Muts<'a> = ($(&'a mut $name,)+);

            fn keys() -> Box<[ComponentKey]> {
                Box::from([$(ComponentKey::of::<$name>()),+])
            }

            #[track_caller]
            fn fetch<'a>(handle: EntityHandle, entity: &'a Entity, registry: &TypeRegistry) -> Self::Refs<'a> {
                ($(get::<$name>(handle, entity, registry),)+)
            }

            #[track_caller]
            fn fetch_mut<'a>(
                handle: EntityHandle,
                entity: &'a mut Entity,
                registry: &TypeRegistry,
            ) -> Self::Muts<'a> {
                let mut slots = entity.slots_mut();
                ($(take::<$name>(handle, &mut slots, registry),)+)
            }
        }
    };
}

impl_signature!(A);
impl_signature!(A, B);
impl_signature!(A, B, C);
impl_signature!(A, B, C, D);
impl_signature!(A, B, C, D, E);
impl_signature!(A, B, C, D, E, F);
impl_signature!(A, B, C, D, E, F, G);
impl_signature!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::World;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    #[derive(Debug, PartialEq)]
    struct Velocity(i32);

    impl Component for Position {}
    impl Component for Velocity {}

    #[test]
    fn test_keys() {
        let keys = <(Position, Velocity)>::keys();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0], ComponentKey::of::<Position>());
        assert_eq!(keys[1], ComponentKey::of::<Velocity>());
        assert!(<()>::keys().is_empty());
    }

    #[test]
    fn test_register() {
        let mut registry = TypeRegistry::new();
        let velocity = registry.register::<Velocity>();
        let bitset = <(Position, Velocity)>::register(&mut registry);
        let position = registry.index_of::<Position>();

        assert_eq!(bitset.count(), 2);
        assert!(bitset.test(position));
        assert!(bitset.test(velocity));
    }

    #[test]
    fn test_fetch_mut() {
        let mut world = World::new();
        world.register_component::<Position>();
        world.register_component::<Velocity>();

        let mut entity = world.create_entity();
        entity.create_component(Position(1));
        entity.create_component(Velocity(2));
        let handle = entity.handle();

        let (position, velocity) = world.components::<(Position, Velocity)>(handle);
        position.0 += velocity.0;
        velocity.0 = 0;

        let entity = world.entity(handle);
        let (position, velocity) = entity.components::<(Position, Velocity)>();
        assert_eq!(position, &Position(3));
        assert_eq!(velocity, &Velocity(0));
    }

    #[test]
    #[should_panic]
    fn test_fetch_missing() {
        let mut world = World::new();
        world.register_component::<Position>();
        world.register_component::<Velocity>();

        let mut entity = world.create_entity();
        entity.create_component(Position(1));
        let handle = entity.handle();
        let _ = world.components::<(Position, Velocity)>(handle);
    }
}
