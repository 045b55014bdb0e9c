//! Structural property resource: `People(1)/address/city`

use super::{CountResource, field_type, impl_resource};
use crate::api::ODataClient;
use crate::constants::ODATA_VALUE;
use crate::error::ODataError;
use crate::parsers::ParseContext;
use crate::request::{HttpOptions, Method};
use crate::resources::query::{QueryOptionName, QueryOptions};
use crate::resources::resource::Resource;
use crate::resources::responses::ODataProperty;
use crate::resources::segments::{PathSegment, PathSegments, SegmentKind};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyResource {
    resource: Resource,
}

impl_resource!(PropertyResource);

impl PropertyResource {
    pub fn factory(
        client: ODataClient,
        name: &str,
        type_name: Option<String>,
        mut segments: PathSegments,
        mut options: QueryOptions,
    ) -> Self {
        segments.push(PathSegment::new(SegmentKind::Property, name).with_type(type_name));
        options.keep(&[QueryOptionName::Format]);
        Self {
            resource: Resource::new(client, segments, options),
        }
    }

    /// Field of a complex-typed property
    pub fn property(&self, name: &str) -> PropertyResource {
        Self::factory(
            self.resource.client().clone(),
            name,
            field_type(&self.resource, name),
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    /// Size of a collection-valued property
    pub fn count(&self) -> CountResource {
        CountResource::factory(
            self.resource.client().clone(),
            self.resource.segments().clone(),
            self.resource.options().clone(),
        )
    }

    pub async fn get(&self, options: &HttpOptions) -> Result<ODataProperty, ODataError> {
        self.resource.send_property(Method::Get, None, options).await
    }

    /// PUT a new value, wrapped as `{"value": ...}`
    pub async fn update(
        &self,
        value: Value,
        options: &HttpOptions,
    ) -> Result<ODataProperty, ODataError> {
        let ctx = ParseContext::new(self.resource.client().options());
        let parser = self.resource.parser();
        let value = match value {
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| parser.serialize(item, &ctx))
                    .collect(),
            ),
            value => parser.serialize(value, &ctx),
        };
        let mut body = Map::new();
        body.insert(ODATA_VALUE.to_string(), value);
        self.resource
            .send_property(Method::Put, Some(Value::Object(body)), options)
            .await
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
    async fn test_get_complex_property() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({
            "@odata.context": "$metadata#People(1)/address",
            "street": "Main St",
            "city": "Springfield"
        })));
        let client = testing::sample_client(transport);

        let address = client
            .entity_set("People")
            .entity(1)
            .property("address")
            .get(&HttpOptions::new())
            .await
            .unwrap();

        assert_eq!(
            address.property,
            Some(json!({"street": "Main St", "city": "Springfield", "country": "US"}))
        );
        assert_eq!(address.meta.context.as_deref(), Some("$metadata#People(1)/address"));
    }

    #[tokio::test]
    async fn test_get_enum_collection_property() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({"value": ["Red", "Blue"]})));
        let client = testing::sample_client(transport);

        let colors = client
            .entity_set("People")
            .entity(1)
            .property("favoriteColors")
            .get(&HttpOptions::new())
            .await
            .unwrap();
        assert_eq!(colors.property, Some(json!([1, 4])));
    }

    #[tokio::test]
    async fn test_update_wraps_value() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::new(204, "No Content"));
        let client = testing::sample_client(transport.clone());

        client
            .entity_set("People")
            .entity(1)
            .property("favoriteColors")
            .update(json!([1, 2]), &HttpOptions::new())
            .await
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.url, "https://example.org/odata/People(1)/favoriteColors");
        assert_eq!(request.body, Some(json!({"value": ["Red", "Green"]})));
    }

    #[test]
    fn test_nested_property_types() {
        let client = testing::sample_client(MockTransport::new());
        let city = client.entity_set("People").entity(1).property("address").property("city");
        assert_eq!(city.path(), "People(1)/address/city");
        assert_eq!(city.type_name().as_deref(), Some("Edm.String"));
        assert_eq!(
            client.entity_set("People").entity(1).property("emails").count().path(),
            "People(1)/emails/$count"
        );
    }
}
