//! Single entity resource: `People(1)`

use super::{
    ActionResource, FunctionResource, NavigationPropertyResource, PropertyResource, cast,
    field_type, impl_resource,
};
use crate::api::ODataClient;
use crate::error::ODataError;
use crate::request::{HttpOptions, Method, ResponseType};
use crate::resources::key::EntityKey;
use crate::resources::query::{QueryOptionName, QueryOptions};
use crate::resources::resource::{EntityQuery, Resource};
use crate::resources::responses::ODataEntity;
use crate::resources::segments::PathSegments;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityResource {
    resource: Resource,
}

impl_resource!(EntityResource);
impl EntityQuery for EntityResource {}

impl EntityResource {
    /// Address an entity of the collection ending `segments`
    pub fn factory(
        client: ODataClient,
        key: Option<EntityKey>,
        mut segments: PathSegments,
        mut options: QueryOptions,
    ) -> Self {
        match segments.last_mut() {
            Some(last) if last.kind.is_keyable() => last.key = key,
            Some(last) => log::warn!("Segment {} cannot carry an entity key", last.name),
            None => log::warn!("Entity resource created without a collection segment"),
        }
        options.keep(&[
            QueryOptionName::Select,
            QueryOptionName::Expand,
            QueryOptionName::Format,
            QueryOptionName::Custom,
        ]);
        Self {
            resource: Resource::new(client, segments, options),
        }
    }

    pub fn key(&self) -> Option<&EntityKey> {
        self.resource.key()
    }

    pub fn has_key(&self) -> bool {
        self.key().is_some()
    }

    /// Same entity path with another key
    pub fn with_key(&self, key: impl Into<EntityKey>) -> Self {
        let mut next = self.clone();
        if let Some(last) = next.resource.segments_mut().key_segment_mut() {
            last.key = Some(key.into());
        }
        next
    }

    /// The entity viewed as a derived type: `People(1)/Acme.Employee`
    pub fn cast(&self, type_name: &str) -> EntityResource {
        Self {
            resource: cast(&self.resource, type_name),
        }
    }

    pub fn navigation_property(&self, name: &str) -> NavigationPropertyResource {
        NavigationPropertyResource::factory(
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

    /// Action bound to this entity
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

    /// Function bound to this entity
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

    pub async fn get(&self, options: &HttpOptions) -> Result<ODataEntity, ODataError> {
        self.resource.require_key("fetch")?;
        self.resource.send_entity(Method::Get, None, options).await
    }

    /// PUT the whole entity
    pub async fn update(
        &self,
        entity: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        self.resource.require_key("update")?;
        let body = self.resource.serialize_entity(entity);
        self.resource.send_entity(Method::Put, Some(body), options).await
    }

    /// PATCH the given fields
    pub async fn patch(
        &self,
        changes: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        self.resource.require_key("patch")?;
        let body = self.resource.serialize_entity(changes);
        self.resource.send_entity(Method::Patch, Some(body), options).await
    }

    pub async fn delete(&self, options: &HttpOptions) -> Result<(), ODataError> {
        self.resource.require_key("delete")?;
        self.resource
            .send(Method::Delete, None, ResponseType::None, options)
            .await?;
        Ok(())
    }
}
