//! Entity set resource: `People`

use super::{
    ActionResource, CountResource, EntityResource, FunctionResource, cast, impl_resource,
};
use crate::api::ODataClient;
use crate::error::ODataError;
use crate::request::{HttpOptions, Method};
use crate::resources::key::EntityKey;
use crate::resources::query::QueryOptions;
use crate::resources::resource::{CollectionQuery, Resource};
use crate::resources::responses::{ODataEntities, ODataEntity};
use crate::resources::segments::{PathSegment, PathSegments, SegmentKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct EntitySetResource {
    resource: Resource,
}

impl_resource!(EntitySetResource);
impl CollectionQuery for EntitySetResource {}

impl EntitySetResource {
    pub fn factory(
        client: ODataClient,
        name: &str,
        type_name: Option<String>,
        mut segments: PathSegments,
        options: QueryOptions,
    ) -> Self {
        segments.push(PathSegment::new(SegmentKind::EntitySet, name).with_type(type_name));
        Self {
            resource: Resource::new(client, segments, options),
        }
    }

    /// Entity addressed by key
    pub fn entity(&self, key: impl Into<EntityKey>) -> EntityResource {
        EntityResource::factory(
            self.resource.client().clone(),
            Some(key.into()),
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    /// Entity whose key is resolved from an attribute bag through the bound type
    ///
    /// The result has no key when the attributes lack one; requests that need
    /// it then fail with an identity error.
    pub fn entity_from(&self, attrs: &Value) -> EntityResource {
        let key = EntityKey::from_value(attrs, self.resource.structured_parser());
        EntityResource::factory(
            self.resource.client().clone(),
            key,
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    /// Entity set restricted to a derived type: `People/Acme.Employee`
    pub fn cast(&self, type_name: &str) -> EntitySetResource {
        Self {
            resource: cast(&self.resource, type_name),
        }
    }

    pub fn count(&self) -> CountResource {
        CountResource::factory(
            self.resource.client().clone(),
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    /// Action bound to the collection
    pub fn action(&self, name: &str) -> ActionResource {
        let (path, type_name) = self.resource.client().callable_path(name);
        ActionResource::factory(
            self.resource.client().clone(),
            &path,
            type_name,
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    /// Function bound to the collection
    pub fn function(&self, name: &str) -> FunctionResource {
        let (path, type_name) = self.resource.client().callable_path(name);
        FunctionResource::factory(
            self.resource.client().clone(),
            &path,
            type_name,
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    /// GET the collection; `with_count` adds `$count=true`
    pub async fn get(&self, options: &HttpOptions) -> Result<ODataEntities, ODataError> {
        self.resource.send_entities(Method::Get, None, options).await
    }

    /// POST a new entity
    pub async fn create(
        &self,
        entity: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        let body = self.resource.serialize_entity(entity);
        self.resource.send_entity(Method::Post, Some(body), options).await
    }
}
