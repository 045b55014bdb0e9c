//! `$ref` resource for associating and disassociating entities

use super::impl_resource;
use crate::api::ODataClient;
use crate::constants::{ID_PARAM, ODATA_ID};
use crate::error::ODataError;
use crate::request::{HttpOptions, Method, ResponseType};
use crate::resources::query::QueryOptions;
use crate::resources::resource::Resource;
use crate::resources::segments::{PathSegment, PathSegments};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceResource {
    resource: Resource,
}

impl_resource!(ReferenceResource);

fn id_body(target_id: &str) -> Value {
    let mut body = Map::new();
    body.insert(ODATA_ID.to_string(), Value::String(target_id.to_string()));
    Value::Object(body)
}

impl ReferenceResource {
    pub fn factory(
        client: ODataClient,
        mut segments: PathSegments,
        mut options: QueryOptions,
    ) -> Self {
        segments.push(PathSegment::reference());
        options.clear();
        Self {
            resource: Resource::new(client, segments, options),
        }
    }

    /// Add `target_id` to a collection-valued navigation
    pub async fn add(&self, target_id: &str, options: &HttpOptions) -> Result<(), ODataError> {
        self.resource
            .send(Method::Post, Some(id_body(target_id)), ResponseType::None, options)
            .await?;
        Ok(())
    }

    /// Point a single-valued navigation at `target_id`
    pub async fn set(&self, target_id: &str, options: &HttpOptions) -> Result<(), ODataError> {
        self.resource
            .send(Method::Put, Some(id_body(target_id)), ResponseType::None, options)
            .await?;
        Ok(())
    }

    /// Remove a reference
    ///
    /// Collection members are named with `target_id` (sent as `$id`);
    /// single-valued navigations and keyed paths pass `None`.
    pub async fn remove(
        &self,
        target_id: Option<&str>,
        options: &HttpOptions,
    ) -> Result<(), ODataError> {
        let options = match target_id {
            Some(id) => options.clone().param(ID_PARAM, id),
            None => options.clone(),
        };
        self.resource
            .send(Method::Delete, None, ResponseType::None, &options)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ODataResponse;
    use crate::testing::{self, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_add_and_remove_references() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::new(204, "No Content"));
        transport.respond(ODataResponse::new(204, "No Content"));
        let client = testing::sample_client(transport.clone());
        let friends = client
            .entity_set("People")
            .entity(1)
            .navigation_property("friends")
            .reference();

        friends
            .add("https://example.org/odata/People(2)", &HttpOptions::new())
            .await
            .unwrap();
        friends
            .remove(Some("https://example.org/odata/People(2)"), &HttpOptions::new())
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "https://example.org/odata/People(1)/friends/$ref");
        assert_eq!(
            requests[0].body,
            Some(json!({"@odata.id": "https://example.org/odata/People(2)"}))
        );
        assert_eq!(requests[1].method, Method::Delete);
        assert_eq!(
            requests[1].url_with_params(),
            "https://example.org/odata/People(1)/friends/$ref?$id=https://example.org/odata/People(2)"
        );
    }

    #[tokio::test]
    async fn test_set_reference() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::new(204, "No Content"));
        let client = testing::sample_client(transport.clone());

        client
            .singleton("Me")
            .navigation_property("friends")
            .entity(2)
            .reference()
            .set("People(3)", &HttpOptions::new())
            .await
            .unwrap();

        let request = transport.last_request();
        assert_eq!(request.method, Method::Put);
        assert_eq!(request.url, "https://example.org/odata/Me/friends(2)/$ref");
    }
}
