//! Client entry point and request dispatcher
//!
//! [`ODataApi`] owns everything configured once per service: settings, the
//! linked type registry, the response cache and the transport. Resources hold
//! a cheap [`ODataClient`] handle onto it and dispatch through
//! [`ODataClient::send`].

use crate::cache::{Clock, ODataCache, SystemClock};
use crate::config::{ApiConfig, ApiOptions, SchemaConfig};
use crate::constants::{
    ACCEPT_HEADER, CONTENT_TYPE_HEADER, COUNT_PARAM, IF_MATCH_HEADER, JSON_CONTENT_TYPE,
    ODATA_VERSION_HEADER,
};
use crate::error::ODataError;
use crate::request::{HttpOptions, Method, ODataRequest, ODataResponse, ResponseType};
use crate::resources::{
    ActionResource, EntitySetResource, FunctionResource, MetadataResource, Resource,
    SingletonResource,
};
use crate::schema::{Registry, RegistryBuilder};
use crate::transport::{Transport, TransportError, TransportEvent};
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;

/// Callback that may turn a failed request into a response
pub type ErrorHandler = Arc<dyn Fn(ODataError) -> Result<ODataResponse, ODataError> + Send + Sync>;

/// Configured service
pub struct ODataApi {
    config: ApiConfig,
    registry: Registry,
    cache: Option<ODataCache>,
    transport: Option<Arc<dyn Transport>>,
    error_handler: Option<ErrorHandler>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for ODataApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ODataApi")
            .field("service_root_url", &self.config.service_root_url)
            .field("schemas", &self.registry.schemas().len())
            .field("cache", &self.cache.is_some())
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

impl ODataApi {
    pub fn builder(config: ApiConfig) -> ODataApiBuilder {
        ODataApiBuilder::new(config)
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn cache(&self) -> Option<&ODataCache> {
        self.cache.as_ref()
    }
}

/// Builder for [`ODataApi`]
pub struct ODataApiBuilder {
    config: ApiConfig,
    transport: Option<Arc<dyn Transport>>,
    error_handler: Option<ErrorHandler>,
    clock: Arc<dyn Clock>,
}

impl ODataApiBuilder {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            transport: None,
            error_handler: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Register an additional schema
    pub fn schema(mut self, schema: SchemaConfig) -> Self {
        self.config.schemas.push(schema);
        self
    }

    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Install a handler consulted for every failed request
    pub fn error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(ODataError) -> Result<ODataResponse, ODataError> + Send + Sync + 'static,
    {
        self.error_handler = Some(Arc::new(handler));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the settings and link the registry
    pub fn build(self) -> Result<ODataClient, ODataError> {
        let mut config = self.config;
        config.service_root_url = normalize_root(&config.service_root_url)?;

        let registry = RegistryBuilder::new()
            .with_schemas(config.schemas.iter().cloned())
            .configure()?;

        log::info!(
            "Configured OData API {} with {} schema(s)",
            config.service_root_url,
            registry.schemas().len()
        );

        let cache = config.cache.enabled.then(ODataCache::new);
        Ok(ODataClient {
            api: Arc::new(ODataApi {
                config,
                registry,
                cache,
                transport: self.transport,
                error_handler: self.error_handler,
                clock: self.clock,
            }),
        })
    }
}

/// Service roots must be bare and end with a slash
fn normalize_root(url: &str) -> Result<String, ODataError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ODataError::configuration("service root URL is empty"));
    }
    if url.contains('?') {
        return Err(ODataError::configuration(format!(
            "service root URL '{}' must not contain a query string",
            url
        )));
    }
    if url.ends_with('/') {
        Ok(url.to_string())
    } else {
        Ok(format!("{}/", url))
    }
}

/// Cloneable handle onto a configured service
#[derive(Clone)]
pub struct ODataClient {
    api: Arc<ODataApi>,
}

impl std::fmt::Debug for ODataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.api.fmt(f)
    }
}

impl ODataClient {
    pub fn api(&self) -> &ODataApi {
        &self.api
    }

    pub fn registry(&self) -> &Registry {
        &self.api.registry
    }

    pub fn options(&self) -> &ApiOptions {
        &self.api.config.options
    }

    /// Service root, always ending with `/`
    pub fn service_root_url(&self) -> &str {
        &self.api.config.service_root_url
    }

    pub fn cache(&self) -> Option<&ODataCache> {
        self.api.cache.as_ref()
    }

    /// Entity set by name, typed from the container when registered
    pub fn entity_set(&self, name: &str) -> EntitySetResource {
        let type_name = self
            .registry()
            .find_entity_set_by_name(name)
            .map(|set| set.entity_type.clone());
        if type_name.is_none() {
            log::debug!("Entity set {} is not declared by any container", name);
        }
        EntitySetResource::factory(
            self.clone(),
            name,
            type_name,
            Default::default(),
            Default::default(),
        )
    }

    pub fn singleton(&self, name: &str) -> SingletonResource {
        let type_name = self
            .registry()
            .find_singleton_by_name(name)
            .map(|singleton| singleton.type_name.clone());
        SingletonResource::factory(
            self.clone(),
            name,
            type_name,
            Default::default(),
            Default::default(),
        )
    }

    /// Unbound action, by name or qualified name
    pub fn action(&self, name: &str) -> ActionResource {
        let (path, type_name) = self.callable_path(name);
        ActionResource::factory(
            self.clone(),
            &path,
            type_name,
            Default::default(),
            Default::default(),
        )
    }

    /// Unbound function, by name or qualified name
    pub fn function(&self, name: &str) -> FunctionResource {
        let (path, type_name) = self.callable_path(name);
        FunctionResource::factory(
            self.clone(),
            &path,
            type_name,
            Default::default(),
            Default::default(),
        )
    }

    pub fn metadata(&self) -> MetadataResource {
        MetadataResource::factory(self.clone())
    }

    /// Invocation path and qualified name of a callable
    pub(crate) fn callable_path(&self, name: &str) -> (String, Option<String>) {
        let registry = self.registry();
        let callable = registry
            .find_callable_for_type(name)
            .or_else(|| registry.find_callable_by_name(name));
        match callable {
            Some(callable) => (callable.path.clone(), Some(callable.qualified_name())),
            None => {
                log::debug!("Callable {} is not registered", name);
                (name.to_string(), None)
            }
        }
    }

    /// Render a resource into a request
    ///
    /// Parameters are merged lowest precedence first: configured defaults,
    /// the resource's query options, caller parameters, then computed ones.
    pub fn build_request(
        &self,
        resource: &Resource,
        method: Method,
        body: Option<Value>,
        response_type: ResponseType,
        options: &HttpOptions,
    ) -> ODataRequest {
        let config = &self.api.config;
        let url = format!("{}{}", self.service_root_url(), resource.path());
        let mut request = ODataRequest::new(method, url, response_type);

        for (name, value) in &config.params {
            request.set_param(name.as_str(), value.as_str());
        }
        for (name, value) in resource.options().to_params() {
            request.set_param(name, value);
        }
        for (name, value) in &options.params {
            request.set_param(name.as_str(), value.as_str());
        }
        if options.with_count && response_type == ResponseType::Entities {
            request.set_param(COUNT_PARAM, "true");
        }

        request
            .headers
            .insert(ACCEPT_HEADER.to_string(), config.options.accept_header());
        request
            .headers
            .insert(ODATA_VERSION_HEADER.to_string(), config.version.clone());
        if body.is_some() {
            request
                .headers
                .insert(CONTENT_TYPE_HEADER.to_string(), JSON_CONTENT_TYPE.to_string());
        }
        request.headers.extend(config.headers.clone());
        request.headers.extend(options.headers.clone());

        request.body = body;
        let etag = options
            .etag
            .clone()
            .or_else(|| request.body_etag().map(str::to_string));
        if let Some(etag) = etag {
            request.headers.insert(IF_MATCH_HEADER.to_string(), etag);
        }

        request
    }

    /// Dispatch a rendered request
    ///
    /// GET responses are served from and stored in the cache unless the cache
    /// is disabled or `no_cache` is set. Failures go through the error handler
    /// when one is installed.
    pub async fn send(
        &self,
        request: ODataRequest,
        no_cache: bool,
    ) -> Result<ODataResponse, ODataError> {
        let api = &self.api;
        let cache = api
            .cache
            .as_ref()
            .filter(|_| !no_cache && ODataCache::is_cacheable(&request));
        let max_age = api.config.cache.max_age();
        let url = request.url_with_params();

        if let Some(cache) = cache {
            if let Some(response) = cache.get(&url, api.clock.now(), max_age) {
                return Ok(response);
            }
        }

        let transport = api.transport.as_ref().ok_or(ODataError::NoTransport)?;
        log::debug!("{} {}", request.method, url);

        let response = match receive(transport.as_ref(), request).await {
            Ok(response) if response.status >= 400 => Err(ODataError::Http {
                status: response.status,
                status_text: response.status_text,
                body: response.body,
            }),
            other => other,
        };

        match (response, &api.error_handler) {
            (Ok(response), _) => {
                if let Some(cache) = cache {
                    if response.is_success() {
                        cache.put(&url, response.clone(), api.clock.now(), max_age);
                    }
                }
                Ok(response)
            }
            // Substitutes stand in for this call only and never reach the cache
            (Err(err), Some(handler)) => {
                let message = err.to_string();
                let response = handler(err)?;
                log::info!("Error handler recovered from: {}", message);
                Ok(response)
            }
            (Err(err), None) => Err(err),
        }
    }

    /// Build and dispatch in one step
    pub async fn request(
        &self,
        resource: &Resource,
        method: Method,
        body: Option<Value>,
        response_type: ResponseType,
        options: &HttpOptions,
    ) -> Result<ODataResponse, ODataError> {
        let request = self.build_request(resource, method, body, response_type, options);
        self.send(request, options.no_cache).await
    }
}

/// Drain the transport stream up to the terminal response
async fn receive(
    transport: &dyn Transport,
    request: ODataRequest,
) -> Result<ODataResponse, ODataError> {
    let mut events = transport.send(request);
    while let Some(event) = events.next().await {
        match event? {
            TransportEvent::Sent => log::trace!("Request sent"),
            TransportEvent::Progress { loaded, total } => match total {
                Some(total) => log::trace!("Received {} of {} bytes", loaded, total),
                None => log::trace!("Received {} bytes", loaded),
            },
            TransportEvent::Response(response) => return Ok(response),
        }
    }
    Err(TransportError::new("transport closed without a response").into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::{CollectionQuery, ODataResource};
    use crate::testing::{self, ManualClock, MockTransport};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn test_service_root_validation() {
        let err = ODataApi::builder(ApiConfig::new("https://example.org/odata?x=1"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ODataError::Configuration { .. }));

        let client = ODataApi::builder(ApiConfig::new("https://example.org/odata"))
            .build()
            .unwrap();
        assert_eq!(client.service_root_url(), "https://example.org/odata/");
    }

    #[test]
    fn test_inheritance_cycle_fails_build() {
        use crate::config::StructuredTypeConfig;
        let config = ApiConfig::new("https://example.org/odata").with_schema(
            SchemaConfig::new("Loop")
                .with_entity(StructuredTypeConfig::new("A").base("Loop.B"))
                .with_entity(StructuredTypeConfig::new("B").base("Loop.A")),
        );
        assert!(ODataApi::builder(config).build().is_err());
    }

    #[test]
    fn test_parameter_and_header_precedence() {
        let config = testing::sample_config()
            .with_param("lang", "en")
            .with_param("$top", "1")
            .with_header("X-Tenant", "a");
        let client = ODataApi::builder(config).build().unwrap();
        let people = client.entity_set("People").top(5);

        let options = HttpOptions::new()
            .param("lang", "fr")
            .header("X-Tenant", "b")
            .with_count();
        let request = client.build_request(
            people.resource(),
            Method::Get,
            None,
            ResponseType::Entities,
            &options,
        );

        assert_eq!(request.url, "https://example.org/odata/People");
        assert_eq!(request.param("$top"), Some("5"));
        assert_eq!(request.param("lang"), Some("fr"));
        assert_eq!(request.param("$count"), Some("true"));
        assert_eq!(request.headers["X-Tenant"], "b");
        assert_eq!(request.headers["OData-Version"], "4.0");
        assert!(!request.headers.contains_key("If-Match"));
    }

    #[test]
    fn test_if_match_prefers_explicit_etag() {
        let client = testing::sample_client(MockTransport::new());
        let person = client.entity_set("People").entity(1);
        let body = Some(json!({"@odata.etag": "W/\"body\"", "name": "Ann"}));

        let request = client.build_request(
            person.resource(),
            Method::Put,
            body.clone(),
            ResponseType::Entity,
            &HttpOptions::new(),
        );
        assert_eq!(request.headers["If-Match"], "W/\"body\"");
        assert_eq!(request.headers["Content-Type"], "application/json");

        let request = client.build_request(
            person.resource(),
            Method::Put,
            body,
            ResponseType::Entity,
            &HttpOptions::new().etag("W/\"explicit\""),
        );
        assert_eq!(request.headers["If-Match"], "W/\"explicit\"");
    }

    #[tokio::test]
    async fn test_get_is_served_from_cache_within_window() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::ok_json(&json!({"id": 1, "name": "Ann"})));
        transport.respond(ODataResponse::ok_json(&json!({"id": 1, "name": "Ann B."})));
        let clock = Arc::new(ManualClock::new());
        let client = ODataApi::builder(testing::sample_config())
            .transport(transport.clone())
            .clock(clock.clone())
            .build()
            .unwrap();
        let person = client.entity_set("People").entity(1);

        let first = person.get(&HttpOptions::new()).await.unwrap();
        clock.advance(Duration::from_secs(10));
        let second = person.get(&HttpOptions::new()).await.unwrap();
        assert_eq!(first.entity, second.entity);
        assert_eq!(transport.requests().len(), 1);

        clock.advance(Duration::from_secs(25));
        let third = person.get(&HttpOptions::new()).await.unwrap();
        assert_eq!(third.entity.unwrap()["name"], json!("Ann B."));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_no_cache_and_writes_bypass_cache() {
        let transport = MockTransport::new();
        for _ in 0..3 {
            transport.respond(ODataResponse::ok_json(&json!({"id": 1})));
        }
        let client = testing::sample_client(transport.clone());
        let person = client.entity_set("People").entity(1);

        person.get(&HttpOptions::new()).await.unwrap();
        person.get(&HttpOptions::new().no_cache()).await.unwrap();
        person
            .update(json!({"id": 1}), &HttpOptions::new())
            .await
            .unwrap();
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(client.cache().map(|c| c.len()), Some(1));
    }

    #[tokio::test]
    async fn test_http_errors_surface_with_status() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::new(404, "Not Found").with_body("{}"));
        let client = testing::sample_client(transport);

        let err = client
            .entity_set("People")
            .entity(9)
            .get(&HttpOptions::new())
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(client.cache().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_handler_can_recover() {
        let transport = MockTransport::new();
        transport.fail("connection reset");
        let client = ODataApi::builder(testing::sample_config())
            .transport(transport)
            .error_handler(|err| match err {
                ODataError::Transport(_) => {
                    Ok(ODataResponse::ok_json(&json!({"id": 0, "name": "offline"})))
                }
                other => Err(other),
            })
            .build()
            .unwrap();

        let person = client
            .entity_set("People")
            .entity(1)
            .get(&HttpOptions::new())
            .await
            .unwrap();
        assert_eq!(person.entity.unwrap()["name"], json!("offline"));
    }

    #[tokio::test]
    async fn test_recovered_responses_are_not_cached() {
        let transport = MockTransport::new();
        transport.fail("connection reset");
        transport.respond(ODataResponse::ok_json(&json!({"id": 1, "name": "Ann"})));
        let client = ODataApi::builder(testing::sample_config())
            .transport(transport.clone())
            .error_handler(|_| Ok(ODataResponse::ok_json(&json!({"id": 0, "name": "offline"}))))
            .build()
            .unwrap();
        let person = client.entity_set("People").entity(1);

        let first = person.get(&HttpOptions::new()).await.unwrap();
        assert_eq!(first.entity.unwrap()["name"], json!("offline"));
        assert!(client.cache().unwrap().is_empty());

        let second = person.get(&HttpOptions::new()).await.unwrap();
        assert_eq!(second.entity.unwrap()["name"], json!("Ann"));
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_error_handler_can_resignal() {
        let transport = MockTransport::new();
        transport.respond(ODataResponse::new(500, "Internal Server Error"));
        let client = ODataApi::builder(testing::sample_config())
            .transport(transport)
            .error_handler(|err| Err(ODataError::Payload {
                message: format!("wrapped: {}", err),
            }))
            .build()
            .unwrap();

        let err = client
            .entity_set("People")
            .get(&HttpOptions::new())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid payload: wrapped: service responded with 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_missing_transport() {
        let client = ODataApi::builder(testing::sample_config()).build().unwrap();
        let err = client
            .entity_set("People")
            .get(&HttpOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ODataError::NoTransport));
    }

    #[tokio::test]
    async fn test_progress_events_are_skipped() {
        let transport = MockTransport::new();
        transport.respond_with_progress(ODataResponse::ok_json(&json!({"value": []})));
        let client = testing::sample_client(transport);

        let people = client.entity_set("People").get(&HttpOptions::new()).await.unwrap();
        assert!(people.entities.is_empty());
    }
}
