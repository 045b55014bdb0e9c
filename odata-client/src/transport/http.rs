//! HTTP transport on top of `reqwest`

use super::{Transport, TransportError, TransportEvent};
use crate::request::{Method, ODataRequest, ODataResponse};
use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;

/// Sends requests with a shared `reqwest::Client`
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Client with a whole-request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::new(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

impl Transport for ReqwestTransport {
    fn send(
        &self,
        request: ODataRequest,
    ) -> BoxStream<'static, Result<TransportEvent, TransportError>> {
        let client = self.client.clone();
        let sent = stream::once(async { Ok(TransportEvent::Sent) });
        let response = stream::once(async move {
            execute(client, request)
                .await
                .map(TransportEvent::Response)
        });
        sent.chain(response).boxed()
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

async fn execute(client: Client, request: ODataRequest) -> Result<ODataResponse, TransportError> {
    let url = request.url_with_params();
    let mut builder = client.request(to_reqwest_method(request.method), &url);

    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = &request.body {
        builder = builder.json(body);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| TransportError::new(format!("{} {} failed: {}", request.method, url, e)))?;

    let status = response.status();
    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in response.headers() {
        match value.to_str() {
            Ok(value) => headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(value.to_string()),
            Err(_) => log::debug!("Dropping non-ASCII response header {}", name),
        }
    }

    let body = response
        .text()
        .await
        .map_err(|e| TransportError::new(format!("failed to read response body: {}", e)))?;

    Ok(ODataResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        headers,
        body: (!body.is_empty()).then_some(body),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ResponseType;
    use futures::TryStreamExt;

    #[test]
    fn test_method_mapping() {
        assert_eq!(to_reqwest_method(Method::Get), reqwest::Method::GET);
        assert_eq!(to_reqwest_method(Method::Patch), reqwest::Method::PATCH);
        assert_eq!(to_reqwest_method(Method::Delete), reqwest::Method::DELETE);
    }

    #[tokio::test]
    async fn test_unreachable_host_yields_transport_error() {
        let transport = ReqwestTransport::with_timeout(Duration::from_millis(500)).unwrap();
        let request = ODataRequest::new(
            Method::Get,
            "http://127.0.0.1:9/odata/People",
            ResponseType::Entities,
        );

        let result: Result<Vec<TransportEvent>, TransportError> =
            transport.send(request).try_collect().await;
        assert!(result.is_err());
    }
}
