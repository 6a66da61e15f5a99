//! Utilities for *components* in ECS.

use std::any::{type_name, Any, TypeId};

use crate::{EntityMut, FrameTime};

pub use registry::TypeRegistry;

mod registry;

/// Objects of this trait represent *component* of ECS.
///
/// Each component is exclusively owned by the slot of one entity,
/// at most one component of each type can be attached to an entity.
/// Hooks receive a view of the owning entity, so components can reach
/// their siblings, groups and lifecycle flags.
///
pub trait Component: AsAny {
    /// Called once when the component is attached, before it is placed
    /// into the slot of the entity.
    ///
    /// Components attached earlier are already visible through `entity`.
    ///
    fn init(&mut self, _entity: &mut EntityMut<'_>) {}

    /// Called by [`ComponentSystem`](crate::ComponentSystem) during the update pass.
    fn update(&mut self, _entity: &mut EntityMut<'_>, _dt: FrameTime) {}

    /// Called by [`ComponentSystem`](crate::ComponentSystem) during the draw pass.
    fn draw(&mut self, _entity: &mut EntityMut<'_>) {}
}

/// Dynamic typing support for components.
///
/// Implemented automatically for every `'static` type.
///
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T> AsAny for T
where
    T: Any,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// Runtime identity of the component type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ComponentKey {
    type_id: TypeId,
    name: &'static str,
}

impl ComponentKey {
    /// Key of the component type `T`.
    pub fn of<T>() -> Self
    where
        T: Component,
    {
        Self {
            type_id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full type name, used for diagnostics only.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

pub(crate) fn downcast_ref<T>(component: &dyn Component) -> &T
where
    T: Component,
{
    match component.as_any().downcast_ref() {
        Some(component) => component,
        None => unreachable!("slot of `{}` holds `{}`", type_name::<T>(), component.type_name()),
    }
}

pub(crate) fn downcast_mut<T>(component: &mut dyn Component) -> &mut T
where
    T: Component,
{
    let name = AsAny::type_name(&*component);
    match component.as_any_mut().downcast_mut() {
        Some(component) => component,
        None => unreachable!("slot of `{}` holds `{}`", type_name::<T>(), name),
    }
}
