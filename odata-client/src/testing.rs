//! Test fixtures: scripted transport, manual clock and the `Acme` sample schema

use crate::api::{ODataApi, ODataClient};
use crate::cache::Clock;
use crate::config::{
    ApiConfig, CallableConfig, ContainerConfig, EntitySetConfig, EnumConfig, FieldConfig,
    SchemaConfig, SingletonConfig, StructuredTypeConfig,
};
use crate::request::{ODataRequest, ODataResponse};
use crate::schema::{Registry, RegistryBuilder};
use crate::transport::{Transport, TransportError, TransportEvent};
use chrono::{DateTime, TimeZone, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SERVICE_ROOT: &str = "https://example.org/odata/";

enum Scripted {
    Response(ODataResponse),
    Progress(ODataResponse),
    Failure(String),
}

/// Transport answering from a queue and recording every request
#[derive(Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<ODataRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: ODataResponse) {
        self.script.lock().unwrap().push_back(Scripted::Response(response));
    }

    /// Answer after emitting progress events
    pub fn respond_with_progress(&self, response: ODataResponse) {
        self.script.lock().unwrap().push_back(Scripted::Progress(response));
    }

    pub fn fail(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Failure(message.to_string()));
    }

    pub fn requests(&self) -> Vec<ODataRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> ODataRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for MockTransport {
    fn send(
        &self,
        request: ODataRequest,
    ) -> BoxStream<'static, Result<TransportEvent, TransportError>> {
        self.requests.lock().unwrap().push(request);
        let events = match self.script.lock().unwrap().pop_front() {
            Some(Scripted::Response(response)) => {
                vec![Ok(TransportEvent::Sent), Ok(TransportEvent::Response(response))]
            }
            Some(Scripted::Progress(response)) => vec![
                Ok(TransportEvent::Sent),
                Ok(TransportEvent::Progress {
                    loaded: 10,
                    total: Some(20),
                }),
                Ok(TransportEvent::Progress {
                    loaded: 20,
                    total: None,
                }),
                Ok(TransportEvent::Response(response)),
            ],
            Some(Scripted::Failure(message)) => vec![Err(TransportError::new(message))],
            None => vec![Err(TransportError::new("no scripted response"))],
        };
        stream::iter(events).boxed()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += chrono::Duration::from_std(by).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// The `Acme` namespace used across the test suite
///
/// Person (key id) <- Employee <- Manager, the complex type Address, the
/// flags enum Color, OrderLine with a composite key, a bound action, two
/// unbound functions and a container exposing People, OrderLines and Me.
pub fn sample_schema() -> SchemaConfig {
    SchemaConfig::new("Acme")
        .with_enum(
            EnumConfig::new("Color")
                .member("Red", 1)
                .member("Green", 2)
                .member("Blue", 4)
                .flags(true),
        )
        .with_entity(
            StructuredTypeConfig::new("Person")
                .field(FieldConfig::new("id", "Edm.Int32").key())
                .field(FieldConfig::new("name", "Edm.String"))
                .field(FieldConfig::new("emails", "Edm.String").collection())
                .field(FieldConfig::new("favoriteColors", "Acme.Color").collection())
                .field(FieldConfig::new("address", "Acme.Address"))
                .field(
                    FieldConfig::new("friends", "Acme.Person")
                        .navigation()
                        .collection(),
                ),
        )
        .with_entity(
            StructuredTypeConfig::new("Employee")
                .base("Acme.Person")
                .field(FieldConfig::new("salary", "Edm.Decimal").precision(10, 2))
                .field(FieldConfig::new("hiredOn", "Edm.Date")),
        )
        .with_entity(
            StructuredTypeConfig::new("Manager")
                .base("Acme.Employee")
                .field(FieldConfig::new("budget", "Edm.Int64")),
        )
        .with_entity(
            StructuredTypeConfig::new("Address")
                .field(FieldConfig::new("street", "Edm.String"))
                .field(FieldConfig::new("city", "Edm.String").max_length(64))
                .field(FieldConfig::new("country", "Edm.String").default_value(json!("US"))),
        )
        .with_entity(
            StructuredTypeConfig::new("OrderLine")
                .field(
                    FieldConfig::new("orderId", "Edm.Int32")
                        .key()
                        .reference("order/id"),
                )
                .field(FieldConfig::new("lineNo", "Edm.Int32").key())
                .field(FieldConfig::new("quantity", "Edm.Int32")),
        )
        .with_callable(
            CallableConfig::action("Promote")
                .bound()
                .parameter(FieldConfig::new("level", "Edm.Int32"))
                .parameter(FieldConfig::new("color", "Acme.Color"))
                .returns("Acme.Employee", false),
        )
        .with_callable(
            CallableConfig::function("GetTopPerson")
                .path("TopPerson")
                .returns("Acme.Person", false),
        )
        .with_callable(
            CallableConfig::function("GetColors")
                .parameter(FieldConfig::new("since", "Edm.Date"))
                .returns("Acme.Color", true),
        )
        .with_container(
            ContainerConfig::new("Container")
                .entity_set(EntitySetConfig::new("People", "Acme.Person").bind("friends", "People"))
                .entity_set(EntitySetConfig::new("OrderLines", "Acme.OrderLine"))
                .singleton(SingletonConfig::new("Me", "Acme.Person")),
        )
}

pub fn sample_registry() -> Registry {
    RegistryBuilder::new()
        .with_schema(sample_schema())
        .configure()
        .expect("sample schema should configure")
}

pub fn sample_config() -> ApiConfig {
    ApiConfig::new(SERVICE_ROOT).with_schema(sample_schema())
}

/// Route `log` output through the test harness; `RUST_LOG=debug` to see it
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn sample_client(transport: MockTransport) -> ODataClient {
    init_logging();
    ODataApi::builder(sample_config())
        .transport(transport)
        .build()
        .expect("sample client should build")
}
