//! Action resource: `People(1)/Acme.Promote`
//!
//! Actions are invoked with POST; parameters travel in the body and are
//! serialized through the callable's parameter definitions.

use super::impl_resource;
use crate::api::ODataClient;
use crate::error::ODataError;
use crate::parsers::{ParseContext, TypeParser};
use crate::request::{HttpOptions, Method, ResponseType};
use crate::resources::query::QueryOptions;
use crate::resources::resource::Resource;
use crate::resources::responses::{ODataEntities, ODataEntity, ODataProperty};
use crate::resources::segments::{PathSegment, PathSegments, SegmentKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct ActionResource {
    resource: Resource,
}

impl_resource!(ActionResource);

impl ActionResource {
    /// `type_name` is the qualified name of the registered callable
    pub fn factory(
        client: ODataClient,
        path: &str,
        type_name: Option<String>,
        mut segments: PathSegments,
        mut options: QueryOptions,
    ) -> Self {
        segments.push(PathSegment::new(SegmentKind::Action, path).with_type(type_name));
        options.clear();
        Self {
            resource: Resource::new(client, segments, options),
        }
    }

    fn body(&self, parameters: Value) -> Option<Value> {
        if parameters.is_null() {
            return None;
        }
        let ctx = ParseContext::new(self.resource.client().options());
        match self.resource.parser() {
            TypeParser::Callable(parser) => Some(parser.serialize(parameters, &ctx)),
            _ => Some(parameters),
        }
    }

    /// Invoke, discarding any result
    pub async fn call(&self, parameters: Value, options: &HttpOptions) -> Result<(), ODataError> {
        let body = self.body(parameters);
        self.resource
            .send(Method::Post, body, ResponseType::None, options)
            .await?;
        Ok(())
    }

    /// Invoke an action returning an entity
    pub async fn call_entity(
        &self,
        parameters: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        let body = self.body(parameters);
        self.resource.send_entity(Method::Post, body, options).await
    }

    /// Invoke an action returning a collection of entities
    pub async fn call_entities(
        &self,
        parameters: Value,
        options: &HttpOptions,
    ) -> Result<ODataEntities, ODataError> {
        let body = self.body(parameters);
        self.resource.send_entities(Method::Post, body, options).await
    }

    /// Invoke an action returning a primitive, enum or complex value
    pub async fn call_property(
        &self,
        parameters: Value,
        options: &HttpOptions,
    ) -> Result<ODataProperty, ODataError> {
        let body = self.body(parameters);
        self.resource.send_property(Method::Post, body, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ODataResponse;
    use crate::resources::{CollectionQuery, ODataResource};
    use crate::testing::{self, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_bound_action_serializes_parameters() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({
            "@odata.type": "#Acme.Employee",
            "id": 1,
            "name": "Ann",
            "salary": "5000.00"
        })));
        let client = testing::sample_client(transport.clone());

        let promoted = client
            .entity_set("People")
            .entity(1)
            .action("Promote")
            .call_entity(json!({"level": "3", "color": 4}), &HttpOptions::new())
            .await
            .unwrap();

        assert_eq!(promoted.entity.unwrap()["salary"], json!(5000.0));
        let request = transport.last_request();
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://example.org/odata/People(1)/Acme.Promote");
        assert_eq!(request.body, Some(json!({"level": 3, "color": "Blue"})));
    }

    #[tokio::test]
    async fn test_unregistered_action_passes_through() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::new(204, "No Content"));
        let client = testing::sample_client(transport.clone());

        let reset = client.action("ResetDataSource");
        assert_eq!(reset.type_name(), None);
        reset.call(Value::Null, &HttpOptions::new()).await.unwrap();

        let request = transport.last_request();
        assert_eq!(request.url, "https://example.org/odata/ResetDataSource");
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_action_clears_options() {
        let client = testing::sample_client(MockTransport::new());
        let action = client.entity_set("People").top(3).custom("lang", "en").action("Promote");
        assert_eq!(action.url(), "https://example.org/odata/People/Acme.Promote");
    }
}
