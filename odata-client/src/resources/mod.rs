//! Resources: addressable parts of the service
//!
//! Start from [`ODataClient`](crate::ODataClient) (`entity_set`,
//! `singleton`, `action`, `function`, `metadata`) and navigate with the
//! typed resource methods. Fluent query options come from the
//! [`ODataResource`], [`EntityQuery`] and [`CollectionQuery`] traits.

pub mod key;
pub mod query;
pub mod resource;
pub mod responses;
pub mod segments;
pub mod types;

pub use key::EntityKey;
pub use resource::{CollectionQuery, EntityQuery, ODataResource, Resource};
pub use responses::{ODataEntities, ODataEntity, ODataMeta, ODataProperty};
pub use segments::{PathSegment, PathSegments, SegmentKind};
pub use types::{
    ActionResource, CountResource, EntityResource, EntitySetResource, FunctionResource,
    MetadataResource, NavigationPropertyResource, PropertyResource, ReferenceResource,
    SingletonResource,
};
