//! `$metadata` resource

use crate::api::ODataClient;
use crate::config::{SchemaConfig, csdl};
use crate::constants::ACCEPT_HEADER;
use crate::error::ODataError;
use crate::request::{HttpOptions, Method, ResponseType};
use crate::resources::resource::Resource;
use crate::resources::segments::{PathSegment, PathSegments};

const XML_CONTENT_TYPE: &str = "application/xml";

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataResource {
    resource: Resource,
}

super::impl_resource!(MetadataResource);

impl MetadataResource {
    pub fn factory(client: ODataClient) -> Self {
        let mut segments = PathSegments::new();
        segments.push(PathSegment::metadata());
        Self {
            resource: Resource::new(client, segments, Default::default()),
        }
    }

    /// Raw CSDL document
    pub async fn get(&self, options: &HttpOptions) -> Result<String, ODataError> {
        let options = options.clone().header(ACCEPT_HEADER, XML_CONTENT_TYPE);
        let response = self
            .resource
            .send(Method::Get, None, ResponseType::Raw, &options)
            .await?;
        match response.body {
            Some(body) if !body.trim().is_empty() => Ok(body),
            _ => Err(ODataError::Payload {
                message: "empty metadata document".to_string(),
            }),
        }
    }

    /// Fetch the document and convert it into schema definitions
    pub async fn schemas(&self, options: &HttpOptions) -> Result<Vec<SchemaConfig>, ODataError> {
        let xml = self.get(options).await?;
        let schemas = csdl::parse_metadata(&xml).map_err(|err| ODataError::Payload {
            message: format!("{:#}", err),
        })?;
        log::info!("Loaded {} schema(s) from $metadata", schemas.len());
        Ok(schemas)
    }
}
