//! Rendered requests and raw responses exchanged with the transport

use crate::constants::ODATA_ETAG;
use crate::error::ODataError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// HTTP verbs used by OData resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Whether the method sends a request body
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape the dispatcher expects the response body to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseType {
    Entity,
    Entities,
    Property,
    /// Body returned untouched
    Raw,
    /// No body expected
    None,
}

/// Caller-supplied per-request options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpOptions {
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    /// Concurrency token; wins over one found in the body
    pub etag: Option<String>,
    /// Ask an entity set for its total count (`$count=true`)
    pub with_count: bool,
    /// Skip the response cache for this request
    pub no_cache: bool,
}

impl HttpOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_count(mut self) -> Self {
        self.with_count = true;
        self
    }

    pub fn no_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }
}

/// A fully rendered request handed to the transport
#[derive(Debug, Clone, PartialEq)]
pub struct ODataRequest {
    pub method: Method,
    /// Absolute URL without query string
    pub url: String,
    /// Query parameters in rendering order
    pub params: Vec<(String, String)>,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Value>,
    pub response_type: ResponseType,
}

impl ODataRequest {
    pub fn new(method: Method, url: impl Into<String>, response_type: ResponseType) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            headers: BTreeMap::new(),
            body: None,
            response_type,
        }
    }

    /// Set a query parameter, replacing an existing one with the same name
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concurrency token of the body, if it carries one
    pub fn body_etag(&self) -> Option<&str> {
        self.body.as_ref()?.get(ODATA_ETAG)?.as_str()
    }

    /// Full URL including the encoded query string; also the cache key
    pub fn url_with_params(&self) -> String {
        if self.params.is_empty() {
            return self.url.clone();
        }
        let query = self
            .params
            .iter()
            .map(|(name, value)| format!("{}={}", encode_param(name), encode_param(value)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{}?{}", self.url, query)
    }
}

/// Percent-encode a query component, leaving OData punctuation readable
pub fn encode_param(value: &str) -> String {
    const READABLE: [(&str, &str); 14] = [
        ("%24", "$"),
        ("%40", "@"),
        ("%3A", ":"),
        ("%2C", ","),
        ("%3B", ";"),
        ("%3D", "="),
        ("%3F", "?"),
        ("%2F", "/"),
        ("%27", "'"),
        ("%28", "("),
        ("%29", ")"),
        ("%2A", "*"),
        ("%21", "!"),
        ("%7E", "~"),
    ];

    let mut encoded = urlencoding::encode(value).into_owned();
    for (escaped, plain) in READABLE {
        if encoded.contains(escaped) {
            encoded = encoded.replace(escaped, plain);
        }
    }
    encoded
}

/// Raw response as captured from the transport
///
/// Header names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ODataResponse {
    pub status: u16,
    #[serde(rename = "statusText")]
    pub status_text: String,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub body: Option<String>,
}

impl ODataResponse {
    pub fn new(status: u16, status_text: impl Into<String>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// 200 response with a JSON body
    pub fn ok_json(body: &Value) -> Self {
        Self::new(200, "OK")
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// First value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body parsed as JSON; `None` for an empty body
    pub fn json(&self) -> Result<Option<Value>, ODataError> {
        match self.body.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(body) => Ok(Some(serde_json::from_str(body)?)),
        }
    }
}
