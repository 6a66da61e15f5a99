//! Entity Component System (ECS) utilities for game engine.
//!
//! Entities own their components in a slot array indexed by the component type,
//! systems handle every entity which owns all components of their signature.
//! Structural changes (new or removed components, groups, destruction)
//! are deferred until [`Manager::refresh`], so systems can mutate
//! entities freely while iterating over them.

pub use bitset::{Bitset, GroupBitset, TypeIdsBitset, MAX_COMPONENTS, MAX_GROUPS};
pub use component::{AsAny, Component, ComponentKey, TypeRegistry};
pub use entity::{Entity, EntityHandle, EntityMut, EntityRef, EntityStat, EntityStorage, Group};
pub use error::{EcsError, Result};
pub use manager::{Manager, SystemHandle};
pub use system::{ComponentSystem, Filter, GroupPredicate, Matcher, Signature, System};
pub use world::World;

/// Time elapsed since the previous frame, in seconds.
pub type FrameTime = f32;

pub mod bitset;

mod component;
mod entity;
mod error;
mod manager;
mod system;
mod world;
