//! Function resource: `TopPerson()`, `GetColors(since='2024-01-01')`
//!
//! Functions are invoked with GET. Parameters are rendered inline in the
//! segment; composable functions accept collection query options.

use super::impl_resource;
use crate::api::ODataClient;
use crate::error::ODataError;
use crate::parsers::{ParseContext, TypeParser};
use crate::request::{HttpOptions, Method};
use crate::resources::query::QueryOptions;
use crate::resources::resource::{CollectionQuery, Resource};
use crate::resources::responses::{ODataEntities, ODataEntity, ODataProperty};
use crate::resources::segments::{PathSegment, PathSegments, SegmentKind};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResource {
    resource: Resource,
}

impl_resource!(FunctionResource);
impl CollectionQuery for FunctionResource {}

impl FunctionResource {
    pub fn factory(
        client: ODataClient,
        path: &str,
        type_name: Option<String>,
        mut segments: PathSegments,
        mut options: QueryOptions,
    ) -> Self {
        segments.push(PathSegment::new(SegmentKind::Function, path).with_type(type_name));
        options.clear();
        Self {
            resource: Resource::new(client, segments, options),
        }
    }

    /// Copy with inline parameters, serialized through the callable
    pub fn parameters(&self, parameters: Value) -> FunctionResource {
        let ctx = ParseContext::new(self.resource.client().options());
        let parameters = match self.resource.parser() {
            TypeParser::Callable(parser) => parser.serialize(parameters, &ctx),
            _ => parameters,
        };
        let mut next = self.clone();
        if let Some(last) = next.resource.segments_mut().last_mut() {
            last.parameters = Some(parameters);
        }
        next
    }

    pub async fn call_entity(&self, options: &HttpOptions) -> Result<ODataEntity, ODataError> {
        self.resource.send_entity(Method::Get, None, options).await
    }

    pub async fn call_entities(&self, options: &HttpOptions) -> Result<ODataEntities, ODataError> {
        self.resource.send_entities(Method::Get, None, options).await
    }

    pub async fn call_property(&self, options: &HttpOptions) -> Result<ODataProperty, ODataError> {
        self.resource.send_property(Method::Get, None, options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ODataResponse;
    use crate::resources::ODataResource;
    use crate::resources::query::Filter;
    use crate::testing::{self, MockTransport};
    use serde_json::json;

    #[test]
    fn test_unbound_function_uses_configured_path() {
        let client = testing::sample_client(MockTransport::new());

        let top = client.function("GetTopPerson");
        assert_eq!(top.url(), "https://example.org/odata/TopPerson()");
        assert_eq!(top.type_name().as_deref(), Some("Acme.GetTopPerson"));

        let from_people = client
            .entity_set("People")
            .filter(Filter::eq("name", "Ann"))
            .top(3)
            .function("GetTopPerson");
        assert_eq!(from_people.url(), "https://example.org/odata/People/TopPerson()");
    }

    #[tokio::test]
    async fn test_function_returns_most_derived_entity() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({
            "@odata.type": "#Acme.Employee",
            "id": 1,
            "name": "Ann",
            "hiredOn": "2020-02-01"
        })));
        let client = testing::sample_client(transport.clone());

        let top = client
            .function("GetTopPerson")
            .call_entity(&HttpOptions::new())
            .await
            .unwrap();

        assert_eq!(top.meta.type_name.as_deref(), Some("Acme.Employee"));
        assert_eq!(top.entity.unwrap()["hiredOn"], json!("2020-02-01"));
        assert_eq!(transport.last_request().method, Method::Get);
    }

    #[tokio::test]
    async fn test_parameters_render_inline() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({"value": ["Red", "Red, Green"]})));
        let client = testing::sample_client(transport.clone());

        let colors = client
            .function("GetColors")
            .parameters(json!({"since": "2024-01-01"}));
        assert_eq!(colors.path(), "GetColors(since='2024-01-01')");

        let result = colors.call_property(&HttpOptions::new()).await.unwrap();
        assert_eq!(result.property, Some(json!([1, 3])));
    }

    #[test]
    fn test_composable_function_accepts_options() {
        let client = testing::sample_client(MockTransport::new());
        let url = client.function("GetTopPerson").top(1).url();
        assert_eq!(url, "https://example.org/odata/TopPerson()?$top=1");
    }
}
