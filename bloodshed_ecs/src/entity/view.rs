//! Typed access to entities through the component registry.

use std::any::type_name;
use std::panic::{self, AssertUnwindSafe};

use crate::bitset::{GroupBitset, TypeIdsBitset};
use crate::component::downcast_mut;
use crate::error::{fatal, EcsError, Result};
use crate::{Component, FrameTime, Signature, TypeRegistry};

use super::{Entity, EntityHandle, EntityStat, Group};

/// Shared view of the entity.
#[derive(Copy, Clone)]
pub struct EntityRef<'w> {
    handle: EntityHandle,
    entity: &'w Entity,
    registry: &'w TypeRegistry,
}

/// Exclusive view of the entity, the only way to mutate it.
///
/// Structural changes made through this view (components, groups, destruction)
/// only set flags of the entity, they are applied to systems
/// at the next [`Manager::refresh`](crate::Manager::refresh).
///
pub struct EntityMut<'w> {
    handle: EntityHandle,
    entity: &'w mut Entity,
    registry: &'w mut TypeRegistry,
}

impl<'w> EntityRef<'w> {
    pub(crate) fn new(handle: EntityHandle, entity: &'w Entity, registry: &'w TypeRegistry) -> Self {
        Self {
            handle,
            entity,
            registry,
        }
    }

    /// Handle of the entity, valid until it is erased.
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Printable identity of the entity for logs.
    pub fn stat(&self) -> EntityStat {
        self.handle.into()
    }

    /// Underlying entity record.
    pub fn entity(&self) -> &'w Entity {
        self.entity
    }

    /// Returns `true` if the component of type `T` is attached to the entity.
    pub fn has_component<T>(&self) -> bool
    where
        T: Component,
    {
        has_component::<T>(self.entity, self.registry)
    }

    /// Retrieves the component of type `T`, if it is attached to the entity.
    pub fn try_component<T>(&self) -> Result<&'w T>
    where
        T: Component,
    {
        self.entity.try_component(self.handle, self.registry)
    }

    /// Retrieves the component of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if there is no such component attached to the entity.
    ///
    #[track_caller]
    pub fn component<T>(&self) -> &'w T
    where
        T: Component,
    {
        fatal(self.try_component())
    }

    /// Retrieves all components of the signature at once.
    #[track_caller]
    pub fn components<S>(&self) -> S::Refs<'w>
    where
        S: Signature,
    {
        S::fetch(self.handle, self.entity, self.registry)
    }

    /// Returns `true` if the entity is queued for destruction.
    pub fn is_destroyed(&self) -> bool {
        self.entity.must_destroy
    }

    /// Count of components attached to the entity.
    pub fn component_count(&self) -> usize {
        self.entity.component_count
    }

    /// Indices of component types attached to the entity.
    pub fn type_ids(&self) -> TypeIdsBitset {
        self.entity.type_ids
    }

    /// Groups the entity is tagged with.
    pub fn groups(&self) -> GroupBitset {
        self.entity.groups
    }

    /// Returns `true` if the entity is tagged with the group.
    pub fn has_group(&self, group: Group) -> bool {
        self.entity.groups.test(group)
    }

    /// Returns `true` if the entity is tagged with any of given groups.
    pub fn has_any_group(&self, groups: &GroupBitset) -> bool {
        self.entity.groups.intersects(groups)
    }

    /// Returns `true` if the entity is tagged with all of given groups.
    pub fn has_all_groups(&self, groups: &GroupBitset) -> bool {
        self.entity.groups.contains_all(groups)
    }

    /// Entities with higher priority are drawn first.
    pub fn draw_priority(&self) -> i32 {
        self.entity.draw_priority
    }
}

impl<'w> EntityMut<'w> {
    pub(crate) fn new(
        handle: EntityHandle,
        entity: &'w mut Entity,
        registry: &'w mut TypeRegistry,
    ) -> Self {
        Self {
            handle,
            entity,
            registry,
        }
    }

    /// Handle of the entity, valid until it is erased.
    pub fn handle(&self) -> EntityHandle {
        self.handle
    }

    /// Printable identity of the entity for logs.
    pub fn stat(&self) -> EntityStat {
        self.handle.into()
    }

    /// Reborrows this view as a shared one.
    pub fn to_ref(&self) -> EntityRef<'_> {
        EntityRef::new(self.handle, self.entity, &*self.registry)
    }

    /// Registry of component types, shared by all entities of the world.
    pub fn registry(&self) -> &TypeRegistry {
        &*self.registry
    }

    /// Attaches the component of type `T` to the entity and initializes it.
    ///
    /// `T` is registered on first use. The component is initialized
    /// before it is placed into its slot, so [`Component::init`] can look
    /// at components attached earlier.
    ///
    /// # Panics
    ///
    /// Panics if the component of type `T` was already attached,
    /// if the entity is queued for destruction or if the registry is full.
    /// The entity is left untouched in these cases.
    /// If [`Component::init`] panics, the component is detached again.
    ///
    #[track_caller]
    pub fn create_component<T>(&mut self, component: T) -> &mut T
    where
        T: Component,
    {
        if self.entity.must_destroy {
            panic!("{}", EcsError::Destroyed(self.handle));
        }
        let index = self.registry.register::<T>();
        if self.entity.type_ids.test(index) {
            panic!(
                "{}",
                EcsError::DuplicateComponent {
                    entity: self.handle,
                    component: type_name::<T>(),
                }
            );
        }

        self.entity.type_ids.set(index);
        self.entity.component_count += 1;
        self.entity.must_rematch = true;

        let mut component = Box::new(component);
        let init = panic::catch_unwind(AssertUnwindSafe(|| component.init(self)));
        if let Err(payload) = init {
            if self.entity.type_ids.test(index) && self.entity.slot(index).is_none() {
                self.entity.type_ids.reset(index);
                self.entity.component_count -= 1;
            }
            panic::resume_unwind(payload);
        }
        assert!(
            self.entity.type_ids.test(index) && self.entity.slot(index).is_none(),
            "component `{}` was detached from the entity {:?} during its own initialization",
            type_name::<T>(),
            self.handle,
        );
        log::trace!("attached `{}` to the entity {:?}", type_name::<T>(), self.handle);

        let slot = self.entity.components[index].insert(component);
        downcast_mut(&mut **slot)
    }

    /// Detaches the component of type `T` from the entity and drops it.
    ///
    /// # Panics
    ///
    /// Panics if there is no such component attached to the entity.
    ///
    #[track_caller]
    pub fn remove_component<T>(&mut self)
    where
        T: Component,
    {
        let index = match self.registry.try_index_of::<T>() {
            Ok(index) if self.entity.type_ids.test(index) => index,
            _ => panic!("{}", EcsError::missing::<T>(self.handle)),
        };
        self.entity.type_ids.reset(index);
        self.entity.component_count -= 1;
        self.entity.must_rematch = true;
        drop(self.entity.detach(index));
        log::trace!("removed `{}` from the entity {:?}", type_name::<T>(), self.handle);
    }

    /// Returns `true` if the component of type `T` is attached to the entity.
    pub fn has_component<T>(&self) -> bool
    where
        T: Component,
    {
        has_component::<T>(self.entity, &*self.registry)
    }

    /// Retrieves the component of type `T`, if it is attached to the entity.
    pub fn try_component<T>(&self) -> Result<&T>
    where
        T: Component,
    {
        self.entity.try_component(self.handle, &*self.registry)
    }

    /// Retrieves the component of type `T` mutably, if it is attached to the entity.
    pub fn try_component_mut<T>(&mut self) -> Result<&mut T>
    where
        T: Component,
    {
        let index = self.registry.try_index_of::<T>()?;
        match self.entity.slot_mut(index) {
            Some(component) => Ok(downcast_mut(component)),
            None => Err(EcsError::missing::<T>(self.handle)),
        }
    }

    /// Retrieves the component of type `T`.
    ///
    /// # Panics
    ///
    /// Panics if there is no such component attached to the entity.
    ///
    #[track_caller]
    pub fn component<T>(&self) -> &T
    where
        T: Component,
    {
        fatal(self.try_component())
    }

    /// Retrieves the component of type `T` mutably.
    ///
    /// # Panics
    ///
    /// Panics if there is no such component attached to the entity.
    ///
    #[track_caller]
    pub fn component_mut<T>(&mut self) -> &mut T
    where
        T: Component,
    {
        fatal(self.try_component_mut())
    }

    /// Retrieves all components of the signature mutably at once.
    ///
    /// # Panics
    ///
    /// Panics if any of them is not attached to the entity.
    ///
    #[track_caller]
    pub fn components<S>(&mut self) -> S::Muts<'_>
    where
        S: Signature,
    {
        S::fetch_mut(self.handle, self.entity, &*self.registry)
    }

    /// Runs [`Component::update`] of the component of type `T`.
    #[track_caller]
    pub fn update_component<T>(&mut self, dt: FrameTime)
    where
        T: Component,
    {
        self.with_detached::<T>(|component, entity| component.update(entity, dt))
    }

    /// Runs [`Component::draw`] of the component of type `T`.
    #[track_caller]
    pub fn draw_component<T>(&mut self)
    where
        T: Component,
    {
        self.with_detached::<T>(|component, entity| component.draw(entity))
    }

    #[track_caller]
    fn with_detached<T>(&mut self, hook: impl FnOnce(&mut T, &mut Self))
    where
        T: Component,
    {
        let detached = self
            .registry
            .try_index_of::<T>()
            .ok()
            .and_then(|index| Some((index, self.entity.detach(index)?)));
        let (index, mut component) = match detached {
            Some(detached) => detached,
            None => panic!("{}", EcsError::missing::<T>(self.handle)),
        };
        hook(downcast_mut(&mut *component), self);
        self.entity.reattach(index, component);
    }

    /// Queues the entity for destruction. Calling it again has no effect.
    ///
    /// The entity and its components stay accessible until the next
    /// [`Manager::refresh`](crate::Manager::refresh).
    ///
    pub fn destroy(&mut self) {
        if self.entity.destroy() {
            log::trace!("entity {:?} queued for destruction", self.handle);
        }
    }

    /// Returns `true` if the entity is queued for destruction.
    pub fn is_destroyed(&self) -> bool {
        self.entity.must_destroy
    }

    /// Count of components attached to the entity.
    pub fn component_count(&self) -> usize {
        self.entity.component_count
    }

    /// Indices of component types attached to the entity.
    pub fn type_ids(&self) -> TypeIdsBitset {
        self.entity.type_ids
    }

    /// Tags the entity with all given groups.
    pub fn add_groups(&mut self, groups: impl IntoIterator<Item = Group>) {
        let mut updated = self.entity.groups;
        for group in groups {
            updated.set(group);
        }
        self.set_groups(updated);
    }

    /// Removes all given group tags from the entity.
    pub fn del_groups(&mut self, groups: impl IntoIterator<Item = Group>) {
        let mut updated = self.entity.groups;
        for group in groups {
            updated.reset(group);
        }
        self.set_groups(updated);
    }

    /// Removes all group tags from the entity.
    pub fn clear_groups(&mut self) {
        self.set_groups(GroupBitset::new());
    }

    fn set_groups(&mut self, groups: GroupBitset) {
        if self.entity.groups != groups {
            self.entity.groups = groups;
            self.entity.must_rematch = true;
        }
    }

    /// Groups the entity is tagged with.
    pub fn groups(&self) -> GroupBitset {
        self.entity.groups
    }

    /// Returns `true` if the entity is tagged with the group.
    pub fn has_group(&self, group: Group) -> bool {
        self.entity.groups.test(group)
    }

    /// Returns `true` if the entity is tagged with any of given groups.
    pub fn has_any_group(&self, groups: &GroupBitset) -> bool {
        self.entity.groups.intersects(groups)
    }

    /// Returns `true` if the entity is tagged with all of given groups.
    pub fn has_all_groups(&self, groups: &GroupBitset) -> bool {
        self.entity.groups.contains_all(groups)
    }

    /// Entities with higher priority are drawn first.
    pub fn draw_priority(&self) -> i32 {
        self.entity.draw_priority
    }

    /// Changes draw priority, which takes effect at the next draw.
    pub fn set_draw_priority(&mut self, priority: i32) {
        self.entity.draw_priority = priority;
    }
}

fn has_component<T>(entity: &Entity, registry: &TypeRegistry) -> bool
where
    T: Component,
{
    registry
        .try_index_of::<T>()
        .map_or(false, |index| entity.type_ids.test(index))
}
