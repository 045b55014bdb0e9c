//! Schema-aware OData v4 client engine
//!
//! Configure an [`ApiConfig`] with the service root and its schemas, build an
//! [`ODataClient`] with a [`Transport`], then address resources fluently:
//!
//! ```no_run
//! use odata_client::prelude::*;
//!
//! # async fn run(config: ApiConfig) -> Result<(), ODataError> {
//! let client = ODataApi::builder(config)
//!     .transport(ReqwestTransport::new())
//!     .build()?;
//!
//! let people = client
//!     .entity_set("People")
//!     .filter(Filter::starts_with("name", "A"))
//!     .top(10)
//!     .get(&HttpOptions::new().with_count())
//!     .await?;
//! println!("{} of {:?}", people.entities.len(), people.count());
//! # Ok(())
//! # }
//! ```
//!
//! Payloads are converted between their wire and in-memory JSON forms by the
//! parsers the [`Registry`] builds from the configured schemas.

pub mod api;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod parsers;
pub mod request;
pub mod resources;
pub mod schema;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ErrorHandler, ODataApi, ODataApiBuilder, ODataClient};
pub use config::{ApiConfig, ApiOptions, CacheConfig, SchemaConfig};
pub use error::ODataError;
pub use request::{HttpOptions, Method, ODataRequest, ODataResponse, ResponseType};
pub use schema::Registry;
pub use transport::{Transport, TransportError, TransportEvent};

#[cfg(feature = "reqwest-transport")]
pub use transport::ReqwestTransport;

/// Everything needed to configure a client and build queries
pub mod prelude {
    pub use crate::api::{ODataApi, ODataClient};
    pub use crate::config::{ApiConfig, ApiOptions, SchemaConfig};
    pub use crate::error::ODataError;
    pub use crate::request::HttpOptions;
    pub use crate::resources::query::{ExpandItem, Filter, FilterValue, OrderBy, Transform};
    pub use crate::resources::{CollectionQuery, EntityKey, EntityQuery, ODataResource};
    #[cfg(feature = "reqwest-transport")]
    pub use crate::transport::ReqwestTransport;
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::request::ODataResponse;
    use crate::testing::{self, MockTransport};
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_person_by_key() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({"id": 1, "name": "Ann"})));
        let client = ODataApi::builder(
            ApiConfig::new(testing::SERVICE_ROOT).with_schema(testing::sample_schema()),
        )
        .transport(transport.clone())
        .build()
        .unwrap();

        let person = client
            .entity_set("People")
            .entity(1)
            .get(&HttpOptions::new())
            .await
            .unwrap();

        assert_eq!(person.entity, Some(json!({"id": 1, "name": "Ann"})));
        assert_eq!(transport.last_request().url, "https://example.org/odata/People(1)");
    }

    #[tokio::test]
    async fn test_derived_entity_deserializes_inherited_fields() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({
            "@odata.type": "#Acme.Employee",
            "id": "7",
            "name": "Bob",
            "salary": "1234.5"
        })));
        let client = testing::sample_client(transport);

        let employee = client
            .entity_set("People")
            .cast("Acme.Employee")
            .entity(7)
            .get(&HttpOptions::new())
            .await
            .unwrap();

        assert_eq!(
            employee.entity,
            Some(json!({"id": 7, "name": "Bob", "salary": 1234.5}))
        );
    }

    #[test]
    fn test_unbound_function_clears_inherited_options() {
        let client = testing::sample_client(MockTransport::new());
        let top = client
            .entity_set("People")
            .select(["name"])
            .top(1)
            .function("GetTopPerson");

        assert_eq!(top.path(), "People/TopPerson()");
        assert_eq!(top.url(), "https://example.org/odata/People/TopPerson()");
        assert_eq!(
            client.function("GetTopPerson").url(),
            "https://example.org/odata/TopPerson()"
        );
    }
}
