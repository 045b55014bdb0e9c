//! Singleton resource: `Me`

use super::{
    ActionResource, FunctionResource, NavigationPropertyResource, PropertyResource, field_type,
    impl_resource,
};
use crate::api::ODataClient;
use crate::error::ODataError;
use crate::request::{HttpOptions, Method};
use crate::resources::query::{QueryOptionName, QueryOptions};
use crate::resources::resource::{EntityQuery, Resource};
use crate::resources::responses::ODataEntity;
use crate::resources::segments::{PathSegment, PathSegments, SegmentKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct SingletonResource {
    resource: Resource,
}

impl_resource!(SingletonResource);
impl EntityQuery for SingletonResource {}

impl SingletonResource {
    pub fn factory(
        client: ODataClient,
        name: &str,
        type_name: Option<String>,
        mut segments: PathSegments,
        mut options: QueryOptions,
    ) -> Self {
        segments.push(PathSegment::new(SegmentKind::Singleton, name).with_type(type_name));
        options.keep(&[QueryOptionName::Format]);
        Self {
            resource: Resource::new(client, segments, options),
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

    pub async fn get(&self, options: &HttpOptions) -> Result<ODataEntity, ODataError> {
        self.resource.send_entity(Method::Get, None, options).await
    }

    pub async fn update(
        &self,
        entity: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        let body = self.resource.serialize_entity(entity);
        self.resource.send_entity(Method::Put, Some(body), options).await
    }

    pub async fn patch(
        &self,
        changes: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        let body = self.resource.serialize_entity(changes);
        self.resource.send_entity(Method::Patch, Some(body), options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ODataResponse;
    use crate::resources::ODataResource;
    use crate::testing::{self, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_singleton() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({
            "id": 1,
            "name": "Ann",
            "favoriteColors": ["Red", "Green, Blue"]
        })));
        let client = testing::sample_client(transport.clone());

        let me = client.singleton("Me").select(["id", "name", "favoriteColors"]);
        let result = me.get(&HttpOptions::new()).await.unwrap();

        assert_eq!(result.entity.unwrap()["favoriteColors"], json!([1, 6]));
        assert_eq!(
            transport.last_request().url_with_params(),
            "https://example.org/odata/Me?$select=id,name,favoriteColors"
        );
    }

    #[tokio::test]
    async fn test_patch_singleton() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::new(204, "No Content"));
        let client = testing::sample_client(transport.clone());

        client
            .singleton("Me")
            .patch(json!({"favoriteColors": [4]}), &HttpOptions::new())
            .await
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.method, Method::Patch);
        assert_eq!(request.body, Some(json!({"favoriteColors": ["Blue"]})));
    }

    #[test]
    fn test_singleton_children() {
        let client = testing::sample_client(MockTransport::new());
        let me = client.singleton("Me").format("json");

        assert_eq!(me.type_name().as_deref(), Some("Acme.Person"));
        assert_eq!(
            me.navigation_property("friends").url(),
            "https://example.org/odata/Me/friends?$format=json"
        );
        assert_eq!(me.property("address").property("city").path(), "Me/address/city");
    }
}
