//! Navigation property resource: `People(1)/friends`, `People(1)/friends(2)`

use super::{
    ActionResource, CountResource, FunctionResource, PropertyResource, ReferenceResource, cast,
    field_type, impl_resource,
};
use crate::api::ODataClient;
use crate::error::ODataError;
use crate::request::{HttpOptions, Method, ResponseType};
use crate::resources::key::EntityKey;
use crate::resources::query::{QueryOptionName, QueryOptions};
use crate::resources::resource::{CollectionQuery, Resource};
use crate::resources::responses::{ODataEntities, ODataEntity};
use crate::resources::segments::{PathSegment, PathSegments, SegmentKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationPropertyResource {
    resource: Resource,
}

impl_resource!(NavigationPropertyResource);
impl CollectionQuery for NavigationPropertyResource {}

impl NavigationPropertyResource {
    pub fn factory(
        client: ODataClient,
        name: &str,
        type_name: Option<String>,
        mut segments: PathSegments,
        mut options: QueryOptions,
    ) -> Self {
        segments.push(PathSegment::new(SegmentKind::NavigationProperty, name).with_type(type_name));
        options.keep(&[QueryOptionName::Format]);
        Self {
            resource: Resource::new(client, segments, options),
        }
    }

    /// Member of a collection-valued navigation, addressed by key
    pub fn entity(&self, key: impl Into<EntityKey>) -> NavigationPropertyResource {
        let mut next = self.clone();
        if let Some(last) = next.resource.segments_mut().key_segment_mut() {
            last.key = Some(key.into());
        }
        next
    }

    /// Member whose key is resolved from an attribute bag
    pub fn entity_from(&self, attrs: &Value) -> NavigationPropertyResource {
        let key = EntityKey::from_value(attrs, self.resource.structured_parser());
        let mut next = self.clone();
        if let Some(last) = next.resource.segments_mut().key_segment_mut() {
            last.key = key;
        }
        next
    }

    pub fn key(&self) -> Option<&EntityKey> {
        self.resource.key()
    }

    pub fn has_key(&self) -> bool {
        self.key().is_some()
    }

    pub fn cast(&self, type_name: &str) -> NavigationPropertyResource {
        Self {
            resource: cast(&self.resource, type_name),
        }
    }

    pub fn navigation_property(&self, name: &str) -> NavigationPropertyResource {
        Self::factory(
            self.resource.client().clone(),
            name,
            field_type(&self.resource, name),
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    pub fn property(&self, name: &str) -> PropertyResource {
        PropertyResource::factory(
            self.resource.client().clone(),
            name,
            field_type(&self.resource, name),
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    /// Entity references of this navigation: `.../friends/$ref`
    pub fn reference(&self) -> ReferenceResource {
        ReferenceResource::factory(
            self.resource.client().clone(),
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    pub fn count(&self) -> CountResource {
        CountResource::factory(
            self.resource.client().clone(),
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

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

    /// GET a single-valued navigation, or one keyed member of a collection
    pub async fn get_entity(&self, options: &HttpOptions) -> Result<ODataEntity, ODataError> {
        self.resource.send_entity(Method::Get, None, options).await
    }

    /// GET a collection-valued navigation
    pub async fn get_entities(&self, options: &HttpOptions) -> Result<ODataEntities, ODataError> {
        self.resource.send_entities(Method::Get, None, options).await
    }

    /// POST a new related entity into the collection
    pub async fn create(
        &self,
        entity: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        let body = self.resource.serialize_entity(entity);
        self.resource.send_entity(Method::Post, Some(body), options).await
    }

    pub async fn update(
        &self,
        entity: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        self.resource.require_key("update")?;
        let body = self.resource.serialize_entity(entity);
        self.resource.send_entity(Method::Put, Some(body), options).await
    }

    pub async fn delete(&self, options: &HttpOptions) -> Result<(), ODataError> {
        self.resource.require_key("delete")?;
        self.resource
            .send(Method::Delete, None, ResponseType::None, options)
            .await?;
        Ok(())
    }
}
