//! Resource kinds
//!
//! Each kind has a `factory` that appends its segment to a copy of the
//! parent's path and trims the inherited query options to the ones that
//! still apply.

/// Implement [`ODataResource`](super::ODataResource) for a `{ resource }` wrapper
macro_rules! impl_resource {
    ($kind:ty) => {
        impl $crate::resources::ODataResource for $kind {
            fn resource(&self) -> &$crate::resources::Resource {
                &self.resource
            }

            fn resource_mut(&mut self) -> &mut $crate::resources::Resource {
                &mut self.resource
            }
        }
    };
}
pub(crate) use impl_resource;

pub mod action;
pub mod count;
pub mod entity;
pub mod entity_set;
pub mod function;
pub mod metadata;
pub mod navigation_property;
pub mod property;
pub mod reference;
pub mod singleton;

pub use action::ActionResource;
pub use count::CountResource;
pub use entity::EntityResource;
pub use entity_set::EntitySetResource;
pub use function::FunctionResource;
pub use metadata::MetadataResource;
pub use navigation_property::NavigationPropertyResource;
pub use property::PropertyResource;
pub use reference::ReferenceResource;
pub use singleton::SingletonResource;

use super::resource::Resource;
use super::segments::{PathSegment, SegmentKind};

/// Copy of `resource` with a type-cast segment re-binding its type
pub(crate) fn cast(resource: &Resource, type_name: &str) -> Resource {
    let registry = resource.client().registry();
    if registry.find_structured_for_type(type_name).is_none() {
        log::warn!("Casting {} to unknown type {}", resource.path(), type_name);
    }
    let mut next = resource.clone();
    next.segments_mut().push(
        PathSegment::new(SegmentKind::TypeCast, type_name).with_type(Some(type_name.to_string())),
    );
    next
}

/// Declared type of a field of the resource's bound type
pub(crate) fn field_type(resource: &Resource, name: &str) -> Option<String> {
    let parser = resource.structured_parser()?;
    match parser.field(name) {
        Some(field) => Some(field.def().type_name.clone()),
        None => {
            log::debug!("{} has no field {}", parser.qualified_name(), name);
            None
        }
    }
}
