//! Utilities for *entities* in ECS.

use slotmap::{new_key_type, Key, SlotMap};

use crate::bitset::{GroupBitset, TypeIdsBitset, MAX_COMPONENTS};
use crate::component::downcast_ref;
use crate::error::{EcsError, Result};
use crate::{Component, TypeRegistry};

pub use view::{EntityMut, EntityRef};

mod view;

new_key_type! {
    /// Unique identifier of the *entity* of ECS.
    ///
    /// Handle stays valid until the entity is erased by the manager,
    /// after that every lookup with it fails instead of reaching
    /// another entity which reused the same slot.
    pub struct EntityHandle;
}

/// Storage for all entities of ECS.
pub type EntityStorage = SlotMap<EntityHandle, Entity>;

/// Index of the semantic group an entity can be tagged with.
pub type Group = usize;

/// Slot index and generation counter of the entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct EntityStat {
    pub id: u32,
    pub ctr: u32,
}

impl From<EntityHandle> for EntityStat {
    fn from(handle: EntityHandle) -> Self {
        let bits = handle.data().as_ffi();
        Self {
            id: bits as u32,
            ctr: (bits >> 32) as u32,
        }
    }
}

/// Aggregate of components, group tags and lifecycle flags.
///
/// Entity is owned by the entity table of the [`World`](crate::World).
/// Components live in a slot array indexed by the component type index,
/// the slot `i` is populated if and only if the bit `i` of [`type_ids`](Self::type_ids) is set.
///
pub struct Entity {
    components: [Option<Box<dyn Component>>; MAX_COMPONENTS],
    type_ids: TypeIdsBitset,
    groups: GroupBitset,
    component_count: usize,
    must_destroy: bool,
    must_rematch: bool,
    draw_priority: i32,
}

impl Entity {
    pub(crate) fn new() -> Self {
        Self {
            components: std::array::from_fn(|_| None),
            type_ids: TypeIdsBitset::new(),
            groups: GroupBitset::new(),
            component_count: 0,
            must_destroy: false,
            must_rematch: true,
            draw_priority: 0,
        }
    }

    /// Bitset of component types attached to the entity.
    pub fn type_ids(&self) -> TypeIdsBitset {
        self.type_ids
    }

    /// Bitset of groups the entity is tagged with.
    pub fn groups(&self) -> GroupBitset {
        self.groups
    }

    pub fn component_count(&self) -> usize {
        self.component_count
    }

    /// Returns `true` if the entity is queued for removal.
    pub fn is_destroyed(&self) -> bool {
        self.must_destroy
    }

    /// Returns `true` if membership of the entity in systems is out of date.
    pub fn must_rematch(&self) -> bool {
        self.must_rematch
    }

    /// Entities with greater priority are drawn first.
    pub fn draw_priority(&self) -> i32 {
        self.draw_priority
    }

    pub(crate) fn mark_rematch(&mut self) {
        self.must_rematch = true;
    }

    pub(crate) fn rematched(&mut self) {
        self.must_rematch = false;
    }

    pub(crate) fn destroy(&mut self) -> bool {
        let first = !self.must_destroy;
        self.must_destroy = true;
        first
    }

    pub(crate) fn slot(&self, index: usize) -> Option<&dyn Component> {
        self.components[index].as_deref()
    }

    pub(crate) fn try_component<T>(&self, handle: EntityHandle, registry: &TypeRegistry) -> Result<&T>
    where
        T: Component,
    {
        let index = registry.try_index_of::<T>()?;
        match self.slot(index) {
            Some(component) => Ok(downcast_ref(component)),
            None => Err(EcsError::missing::<T>(handle)),
        }
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut dyn Component> {
        self.components[index].as_deref_mut()
    }

    /// Mutable references to every populated slot, indexed by component type index.
    pub(crate) fn slots_mut(&mut self) -> [Option<&mut dyn Component>; MAX_COMPONENTS] {
        let mut slots = self.components.iter_mut();
        std::array::from_fn(|_| slots.next().and_then(|slot| slot.as_deref_mut()))
    }

    /// Takes the component out of its slot while one of its hooks runs.
    pub(crate) fn detach(&mut self, index: usize) -> Option<Box<dyn Component>> {
        self.components[index].take()
    }

    /// Puts back a component taken by [`detach`](Self::detach).
    ///
    /// The component is dropped if it was removed from the entity meanwhile.
    ///
    pub(crate) fn reattach(&mut self, index: usize, component: Box<dyn Component>) {
        let slot = &mut self.components[index];
        if self.type_ids.test(index) && slot.is_none() {
            *slot = Some(component);
        }
    }

    /// Drops every component in the order of component type indices.
    pub(crate) fn teardown(&mut self) {
        for slot in self.components.iter_mut() {
            drop(slot.take());
        }
        self.type_ids.clear();
        self.component_count = 0;
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("type_ids", &self.type_ids)
            .field("groups", &self.groups)
            .field("must_destroy", &self.must_destroy)
            .field("must_rematch", &self.must_rematch)
            .field("draw_priority", &self.draw_priority)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat() {
        let mut entities = EntityStorage::with_key();
        let first = entities.insert(Entity::new());
        entities.remove(first);
        let second = entities.insert(Entity::new());

        let (first, second) = (EntityStat::from(first), EntityStat::from(second));
        assert_eq!(first.id, second.id);
        assert_ne!(first.ctr, second.ctr);
    }

    #[test]
    fn test_new_entity() {
        let mut entity = Entity::new();
        assert!(entity.must_rematch());
        assert!(!entity.is_destroyed());
        assert_eq!(entity.component_count(), 0);
        assert!(entity.type_ids().is_empty());

        assert!(entity.destroy());
        assert!(!entity.destroy());
        assert!(entity.is_destroyed());
    }
}
