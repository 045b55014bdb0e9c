//! Core resource and fluent query traits
//!
//! A [`Resource`] is a path segment chain plus a query option set, bound to
//! the client it will be dispatched through. Typed resources wrap it and pick
//! which fluent mutators apply. Every mutator returns a modified copy.

use super::key::EntityKey;
use super::query::{ExpandItem, Filter, OrderBy, QueryOptionValue, QueryOptions, Transform};
use super::responses::{ODataEntities, ODataEntity, ODataProperty};
use super::segments::PathSegments;
use crate::api::ODataClient;
use crate::error::ODataError;
use crate::parsers::{ParseContext, StructuredParser, TypeParser};
use crate::request::{HttpOptions, Method, ODataRequest, ODataResponse, ResponseType};
use serde_json::Value;

#[derive(Clone)]
pub struct Resource {
    client: ODataClient,
    segments: PathSegments,
    options: QueryOptions,
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments && self.options == other.options
    }
}

impl std::fmt::Debug for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("path", &self.segments.path())
            .field("options", &self.options)
            .finish()
    }
}

impl Resource {
    pub fn new(client: ODataClient, segments: PathSegments, options: QueryOptions) -> Self {
        Self {
            client,
            segments,
            options,
        }
    }

    pub fn client(&self) -> &ODataClient {
        &self.client
    }

    pub fn segments(&self) -> &PathSegments {
        &self.segments
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub(crate) fn segments_mut(&mut self) -> &mut PathSegments {
        &mut self.segments
    }

    pub(crate) fn options_mut(&mut self) -> &mut QueryOptions {
        &mut self.options
    }

    /// Path relative to the service root
    pub fn path(&self) -> String {
        self.segments.path_in(self.client.registry())
    }

    /// Absolute URL with the rendered query options
    pub fn url(&self) -> String {
        let mut request = ODataRequest::new(
            Method::Get,
            format!("{}{}", self.client.service_root_url(), self.path()),
            ResponseType::Raw,
        );
        for (name, value) in self.options.to_params() {
            request.set_param(name, value);
        }
        request.url_with_params()
    }

    pub fn type_name(&self) -> Option<&str> {
        self.segments.type_name()
    }

    /// Key of the last segment, when it addresses an entity
    pub fn key(&self) -> Option<&EntityKey> {
        self.segments.key().filter(|key| !key.is_empty())
    }

    /// Parser for the bound type; unknown types degrade to passthrough
    pub fn parser(&self) -> TypeParser<'_> {
        match self.type_name() {
            Some(type_name) => self.client.registry().parser_for_type(type_name),
            None => TypeParser::None,
        }
    }

    /// Parser for the bound entity or complex type
    pub fn structured_parser(&self) -> Option<StructuredParser<'_>> {
        match self.parser() {
            TypeParser::Structured(parser) => Some(parser),
            TypeParser::Callable(parser) => parser.return_parser(),
            _ => None,
        }
    }

    pub(crate) fn require_key(&self, operation: &'static str) -> Result<(), ODataError> {
        match self.key() {
            Some(_) => Ok(()),
            None => Err(ODataError::identity(self.path(), operation)),
        }
    }

    /// Serialize an entity body through the bound type
    pub(crate) fn serialize_entity(&self, value: Value) -> Value {
        let ctx = ParseContext::new(self.client.options());
        match self.structured_parser() {
            Some(parser) => parser.for_value(&value).serialize(value, &ctx),
            None => value,
        }
    }

    pub(crate) async fn send(
        &self,
        method: Method,
        body: Option<Value>,
        response_type: ResponseType,
        options: &HttpOptions,
    ) -> Result<ODataResponse, ODataError> {
        self.client
            .request(self, method, body, response_type, options)
            .await
    }

    pub(crate) async fn send_entity(
        &self,
        method: Method,
        body: Option<Value>,
        options: &HttpOptions,
    ) -> Result<ODataEntity, ODataError> {
        let response = self.send(method, body, ResponseType::Entity, options).await?;
        let ctx = ParseContext::new(self.client.options());
        ODataEntity::from_response(&response, self.structured_parser(), &ctx)
    }

    pub(crate) async fn send_entities(
        &self,
        method: Method,
        body: Option<Value>,
        options: &HttpOptions,
    ) -> Result<ODataEntities, ODataError> {
        let response = self.send(method, body, ResponseType::Entities, options).await?;
        let ctx = ParseContext::new(self.client.options());
        ODataEntities::from_response(&response, self.structured_parser(), &ctx)
    }

    pub(crate) async fn send_property(
        &self,
        method: Method,
        body: Option<Value>,
        options: &HttpOptions,
    ) -> Result<ODataProperty, ODataError> {
        let response = self.send(method, body, ResponseType::Property, options).await?;
        let ctx = ParseContext::new(self.client.options());
        ODataProperty::from_response(&response, self.parser(), &ctx)
    }
}

/// Operations shared by every resource kind
pub trait ODataResource: Clone {
    fn resource(&self) -> &Resource;

    fn resource_mut(&mut self) -> &mut Resource;

    fn path(&self) -> String {
        self.resource().path()
    }

    fn url(&self) -> String {
        self.resource().url()
    }

    fn type_name(&self) -> Option<String> {
        self.resource().type_name().map(str::to_string)
    }

    /// Copy with the query options modified by `f`
    fn query<F>(&self, f: F) -> Self
    where
        F: FnOnce(&mut QueryOptions),
    {
        let mut next = self.clone();
        f(next.resource_mut().options_mut());
        next
    }

    /// Add an unprefixed query parameter
    fn custom(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        self.query(|options| {
            options.custom_mut().insert(name, value);
        })
    }

    fn format(&self, format: impl Into<String>) -> Self {
        let format = format.into();
        self.query(|options| {
            options.set_option(QueryOptionValue::Format(format));
        })
    }
}

/// Query options of resources addressing a single entity
pub trait EntityQuery: ODataResource {
    fn select<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query(|options| options.select_mut().extend(fields.into_iter().map(Into::into)))
    }

    fn expand(&self, item: impl Into<ExpandItem>) -> Self {
        let item = item.into();
        self.query(|options| options.expand_mut().push(item))
    }
}

/// Query options of resources addressing a collection
pub trait CollectionQuery: ODataResource {
    fn select<I, S>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query(|options| options.select_mut().extend(fields.into_iter().map(Into::into)))
    }

    fn expand(&self, item: impl Into<ExpandItem>) -> Self {
        let item = item.into();
        self.query(|options| options.expand_mut().push(item))
    }

    /// Add a filter; successive filters are combined with `and`
    fn filter(&self, filter: Filter) -> Self {
        self.query(|options| options.filter_mut().push(filter))
    }

    fn search(&self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.query(|options| {
            options.set_option(QueryOptionValue::Search(search));
        })
    }

    fn orderby(&self, item: OrderBy) -> Self {
        self.query(|options| options.orderby_mut().push(item))
    }

    fn top(&self, top: u64) -> Self {
        self.query(|options| {
            options.set_option(QueryOptionValue::Top(top));
        })
    }

    fn skip(&self, skip: u64) -> Self {
        self.query(|options| {
            options.set_option(QueryOptionValue::Skip(skip));
        })
    }

    fn skiptoken(&self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.query(|options| {
            options.set_option(QueryOptionValue::SkipToken(token));
        })
    }

    /// Append an `$apply` step
    fn apply(&self, step: Transform) -> Self {
        self.query(|options| options.apply_mut().push(step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::query::QueryOptionName;
    use crate::testing::{self, MockTransport};

    #[test]
    fn test_mutators_copy() {
        let client = testing::sample_client(MockTransport::new());
        let people = client.entity_set("People");
        let filtered = people.filter(Filter::eq("name", "Ann")).top(3);

        assert!(people.resource().options().is_empty());
        assert_ne!(people, filtered);
        assert_eq!(
            filtered.url(),
            "https://example.org/odata/People?$filter=name%20eq%20'Ann'&$top=3"
        );
        assert_eq!(people.filter(Filter::eq("name", "Ann")).top(3), filtered);
    }

    #[test]
    fn test_query_handle_mutates_copy_only() {
        let client = testing::sample_client(MockTransport::new());
        let people = client.entity_set("People").search("ann");
        let changed = people.query(|options| {
            options.remove(QueryOptionName::Search);
            options.custom_mut().insert("debug".into(), "1".into());
        });

        assert_eq!(people.url(), "https://example.org/odata/People?$search=ann");
        assert_eq!(changed.url(), "https://example.org/odata/People?debug=1");
    }

    #[test]
    fn test_collection_options_render_in_order() {
        let client = testing::sample_client(MockTransport::new());
        let url = client
            .entity_set("People")
            .orderby(OrderBy::desc("name"))
            .skip(10)
            .select(["id", "name"])
            .expand("friends")
            .format("json")
            .custom("lang", "en")
            .url();
        assert_eq!(
            url,
            "https://example.org/odata/People?$select=id,name&$expand=friends&$orderby=name%20desc&$skip=10&$format=json&lang=en"
        );
    }
}
