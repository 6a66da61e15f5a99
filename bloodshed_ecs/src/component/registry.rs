//! Registry of component types.

use std::any::TypeId;
use std::collections::HashMap;

use crate::bitset::{TypeIdsBitset, MAX_COMPONENTS};
use crate::error::{fatal, EcsError, Result};

use super::{Component, ComponentKey};

/// Maps every registered component type to a stable index in `0..MAX_COMPONENTS`.
///
/// Indices are assigned sequentially on first registration and never change
/// for the lifetime of the registry. The registry is owned by the
/// [`World`](crate::World), types are registered during setup.
///
#[derive(Debug, Default)]
pub struct TypeRegistry {
    indices: HashMap<TypeId, usize>,
    names: Vec<&'static str>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the component type `T`, returning its index.
    /// Registering the same type again returns the same index.
    ///
    /// # Panics
    ///
    /// Panics if `MAX_COMPONENTS` distinct types were already registered.
    ///
    pub fn register<T>(&mut self) -> usize
    where
        T: Component,
    {
        self.register_key(ComponentKey::of::<T>())
    }

    /// Same as [`register`](Self::register) for an erased type key.
    pub fn register_key(&mut self, key: ComponentKey) -> usize {
        if let Some(&index) = self.indices.get(&key.type_id()) {
            return index;
        }
        let index = self.names.len();
        assert!(
            index < MAX_COMPONENTS,
            "cannot register component `{}`: at most {} component types are supported",
            key.name(),
            MAX_COMPONENTS,
        );
        self.indices.insert(key.type_id(), index);
        self.names.push(key.name());
        log::debug!("registered component `{}` with index {}", key.name(), index);
        index
    }

    /// Index of the component type `T`, if it was registered.
    pub fn try_index_of<T>(&self) -> Result<usize>
    where
        T: Component,
    {
        self.try_index_of_key(ComponentKey::of::<T>())
    }

    pub fn try_index_of_key(&self, key: ComponentKey) -> Result<usize> {
        self.indices
            .get(&key.type_id())
            .copied()
            .ok_or(EcsError::Unregistered(key.name()))
    }

    /// Index of the component type `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was not registered.
    ///
    #[track_caller]
    pub fn index_of<T>(&self) -> usize
    where
        T: Component,
    {
        fatal(self.try_index_of::<T>())
    }

    /// Bitset of the given type keys, all of them must be registered.
    #[track_caller]
    pub fn bitset_of(&self, keys: &[ComponentKey]) -> TypeIdsBitset {
        keys.iter()
            .map(|&key| fatal(self.try_index_of_key(key)))
            .collect()
    }

    /// Type name of the component registered with `index`.
    pub fn name_of(&self, index: usize) -> Option<&'static str> {
        self.names.get(index).copied()
    }

    /// Count of registered component types.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health;
    struct Velocity;

    impl Component for Health {}
    impl Component for Velocity {}

    #[test]
    fn test_registration() {
        let mut registry = TypeRegistry::new();
        assert!(registry.is_empty());

        let health = registry.register::<Health>();
        let velocity = registry.register::<Velocity>();
        assert_ne!(health, velocity);
        assert_eq!(registry.register::<Health>(), health);
        assert_eq!(registry.index_of::<Velocity>(), velocity);
        assert_eq!(registry.len(), 2);
        assert!(registry.name_of(health).unwrap().ends_with("Health"));
        assert_eq!(registry.name_of(2), None);
    }

    #[test]
    fn test_unregistered() {
        let registry = TypeRegistry::new();
        assert!(matches!(
            registry.try_index_of::<Health>(),
            Err(EcsError::Unregistered(_)),
        ));
    }

    #[test]
    #[should_panic]
    fn test_capacity() {
        struct Marker<const I: usize>;
        impl<const I: usize> Component for Marker<I> {}

        macro_rules! register_all {
            ($registry:ident, $($index:literal)*) => {
                $($registry.register::<Marker<$index>>();)*
            };
        }

        let mut registry = TypeRegistry::new();
        register_all!(registry, 0 1 2 3 4 5 6 7 8 9 10 11 12 13 14 15 16);
        register_all!(registry, 17 18 19 20 21 22 23 24 25 26 27 28 29 30 31);
        assert_eq!(registry.len(), MAX_COMPONENTS);
        registry.register::<Marker<32>>();
    }
}
