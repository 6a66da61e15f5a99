//! Manager of entities and systems, which drives the frame step.

use std::any::type_name;
use std::cmp::Reverse;
use std::fmt;
use std::marker::PhantomData;

use crate::entity::{EntityHandle, EntityMut};
use crate::system::{AnySystem, MatchedSet, Matcher};
use crate::{Component, FrameTime, System, TypeRegistry, World};


/// Typed identifier of the system registered in the [`Manager`].
pub struct SystemHandle<S> {
    index: usize,
    marker: PhantomData<fn() -> S>,
}

impl<S> Clone for SystemHandle<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for SystemHandle<S> {}

impl<S> PartialEq for SystemHandle<S> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<S> Eq for SystemHandle<S> {}

impl<S> fmt::Debug for SystemHandle<S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("SystemHandle")
            .field(&type_name::<S>())
            .field(&self.index)
            .finish()
    }
}

struct SystemEntry {
    name: &'static str,
    system: Box<dyn AnySystem>,
    matcher: Matcher,
    matched: MatchedSet,
}

/// Owner of the [`World`] and all registered systems.
///
/// Systems are dispatched in order of their registration.
/// Structural changes requested during a pass are applied
/// by [`refresh`](Self::refresh) strictly after that pass,
/// so sets of entities handled by systems never change during iteration.
///
#[derive(Default)]
pub struct Manager {
    world: World,
    systems: Vec<SystemEntry>,
    draw_queue: Vec<EntityHandle>,
}

impl Manager {
    /// Creates new manager with an empty world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates new manager with room for `capacity` entities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_world(World::with_capacity(capacity))
    }

    /// Creates new manager which uses already populated registry.
    pub fn with_registry(registry: TypeRegistry) -> Self {
        Self::with_world(World::with_registry(registry))
    }

    fn with_world(world: World) -> Self {
        Self {
            world,
            systems: Vec::new(),
            draw_queue: Vec::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Registers the component type `T`, returning its index.
    pub fn register_component<T>(&mut self) -> usize
    where
        T: Component,
    {
        self.world.register_component::<T>()
    }

    /// Creates new entity, it is matched against systems at the next refresh.
    pub fn create_entity(&mut self) -> EntityMut<'_> {
        self.world.create_entity()
    }

    /// Registers the system, after all previously registered ones.
    ///
    /// Component types of its signature and filter are registered too.
    /// Every existing entity is marked for rematch, so the system
    /// is populated at the next refresh.
    ///
    pub fn register_system<S>(&mut self, system: S) -> SystemHandle<S>
    where
        S: System,
    {
        let matcher = AnySystem::matcher(&system, &mut self.world.registry);
        for (_, entity) in self.world.entities.iter_mut() {
            entity.mark_rematch();
        }

        let index = self.systems.len();
        let name = AnySystem::name(&system);
        self.systems.push(SystemEntry {
            name,
            system: Box::new(system),
            matcher,
            matched: MatchedSet::new(),
        });
        log::debug!("registered system `{}` with index {}", name, index);

        SystemHandle {
            index,
            marker: PhantomData,
        }
    }

    /// Retrieves the system registered with the handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by another manager for another system.
    ///
    #[track_caller]
    pub fn system<S>(&self, handle: SystemHandle<S>) -> &S
    where
        S: System,
    {
        let entry = self.entry(handle);
        match (*entry.system).as_any().downcast_ref() {
            Some(system) => system,
            None => panic!("system {:?} is `{}`", handle, entry.name),
        }
    }

    /// Retrieves the system registered with the handle mutably.
    ///
    /// # Panics
    ///
    /// Panics if the handle was issued by another manager for another system.
    ///
    #[track_caller]
    pub fn system_mut<S>(&mut self, handle: SystemHandle<S>) -> &mut S
    where
        S: System,
    {
        let entry = self.entry_mut(handle);
        let name = entry.name;
        match (*entry.system).as_any_mut().downcast_mut() {
            Some(system) => system,
            None => panic!("system {:?} is `{}`", handle, name),
        }
    }

    /// Entities currently handled by the system, in no particular order.
    #[track_caller]
    pub fn matched<S>(&self, handle: SystemHandle<S>) -> &[EntityHandle] {
        self.entry(handle).matched.as_slice()
    }

    /// Returns `true` if the entity is currently handled by the system.
    #[track_caller]
    pub fn is_matched<S>(&self, handle: SystemHandle<S>, entity: EntityHandle) -> bool {
        self.entry(handle).matched.contains(entity)
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    #[track_caller]
    fn entry<S>(&self, handle: SystemHandle<S>) -> &SystemEntry {
        match self.systems.get(handle.index) {
            Some(entry) => entry,
            None => panic!("there is no system {:?}", handle),
        }
    }

    #[track_caller]
    fn entry_mut<S>(&mut self, handle: SystemHandle<S>) -> &mut SystemEntry {
        match self.systems.get_mut(handle.index) {
            Some(entry) => entry,
            None => panic!("there is no system {:?}", handle),
        }
    }

    /// Runs the update pass of every system, then applies structural changes.
    pub fn update(&mut self, dt: FrameTime) {
        let Self { world, systems, .. } = self;
        for entry in systems.iter_mut() {
            for &entity in entry.matched.as_slice() {
                entry.system.update(world, entity, dt);
            }
        }
        self.refresh();
    }

    /// Runs the draw pass of every system.
    ///
    /// Entities of one system are visited in descending order of their draw priority,
    /// entities with equal priority keep the order of the matched set.
    ///
    pub fn draw(&mut self) {
        let Self {
            world,
            systems,
            draw_queue,
        } = self;
        for entry in systems.iter_mut() {
            draw_queue.clear();
            draw_queue.extend_from_slice(entry.matched.as_slice());
            draw_queue.sort_by_key(|&entity| {
                Reverse(world.get(entity).map_or(0, |entity| entity.draw_priority()))
            });
            for &entity in draw_queue.iter() {
                entry.system.draw(world, entity);
            }
        }
    }

    /// Updates, then draws every system.
    pub fn step(&mut self, dt: FrameTime) {
        self.update(dt);
        self.draw();
    }

    /// Applies structural changes made since the last refresh.
    ///
    /// Destroyed entities are removed from systems and erased first,
    /// then entities marked for rematch are added to or removed from systems.
    /// Both phases are repeated while system hooks keep destroying entities,
    /// so no destroyed entity survives the refresh. Other changes made
    /// by hooks after the rematch phase are applied by the next refresh.
    ///
    pub fn refresh(&mut self) {
        let Self { world, systems, .. } = self;

        let (mut erased, mut rematched) = (0, 0);
        for pass in 0.. {
            let destroyed: Vec<_> = world
                .entities
                .iter()
                .filter(|(_, entity)| entity.is_destroyed())
                .map(|(handle, _)| handle)
                .collect();
            if pass > 0 && destroyed.is_empty() {
                break;
            }
            for &handle in &destroyed {
                for entry in systems.iter_mut() {
                    if entry.matched.remove(handle) {
                        entry.system.on_entity_removed(world, handle);
                    }
                }
                if let Some(mut entity) = world.entities.remove(handle) {
                    entity.teardown();
                }
                log::trace!("erased entity {:?}", handle);
            }
            erased += destroyed.len();

            let dirty: Vec<_> = world
                .entities
                .iter()
                .filter(|(_, entity)| entity.must_rematch())
                .map(|(handle, _)| handle)
                .collect();
            for &handle in &dirty {
                match world.entities.get_mut(handle) {
                    Some(entity) => entity.rematched(),
                    None => continue,
                }
                for entry in systems.iter_mut() {
                    let matches = world
                        .entities
                        .get(handle)
                        .map_or(false, |entity| entry.matcher.matches(entity));
                    if matches {
                        if entry.matched.insert(handle) {
                            log::trace!("entity {:?} added to `{}`", handle, entry.name);
                            entry.system.on_entity_added(world, handle);
                        }
                    } else if entry.matched.remove(handle) {
                        log::trace!("entity {:?} removed from `{}`", handle, entry.name);
                        entry.system.on_entity_removed(world, handle);
                    }
                }
            }
            rematched += dirty.len();
        }

        if erased + rematched > 0 {
            log::debug!(
                "refresh: {} erased, {} rematched, {} entities left",
                erased,
                rematched,
                world.len(),
            );
        }
    }

    /// Destroys every entity, then applies the changes.
    pub fn clear(&mut self) {
        for (_, entity) in self.world.entities.iter_mut() {
            entity.destroy();
        }
        self.refresh();
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let systems: Vec<_> = self
            .systems
            .iter()
            .map(|entry| (entry.name, entry.matched.len()))
            .collect();
        f.debug_struct("Manager")
            .field("world", &self.world)
            .field("systems", &systems)
            .finish()
    }
}
