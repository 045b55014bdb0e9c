//! `$count` resource: `People/$count?$filter=...`

use super::impl_resource;
use crate::api::ODataClient;
use crate::error::ODataError;
use crate::request::{HttpOptions, Method, ResponseType};
use crate::resources::query::{Filter, QueryOptionName, QueryOptionValue, QueryOptions};
use crate::resources::resource::{ODataResource, Resource};
use crate::resources::segments::{PathSegment, PathSegments};

#[derive(Debug, Clone, PartialEq)]
pub struct CountResource {
    resource: Resource,
}

impl_resource!(CountResource);

impl CountResource {
    /// Count of the collection ending `segments`; only `$filter` and `$search` carry over
    pub fn factory(
        client: ODataClient,
        mut segments: PathSegments,
        mut options: QueryOptions,
    ) -> Self {
        segments.push(PathSegment::count());
        options.keep(&[QueryOptionName::Filter, QueryOptionName::Search]);
        Self {
            resource: Resource::new(client, segments, options),
        }
    }

    pub fn filter(&self, filter: Filter) -> Self {
        self.query(|options| options.filter_mut().push(filter))
    }

    pub fn search(&self, search: impl Into<String>) -> Self {
        let search = search.into();
        self.query(|options| {
            options.set_option(QueryOptionValue::Search(search));
        })
    }

    pub async fn get(&self, options: &HttpOptions) -> Result<u64, ODataError> {
        let response = self
            .resource
            .send(Method::Get, None, ResponseType::Raw, options)
            .await?;
        let body = response.body.as_deref().map(str::trim).unwrap_or_default();
        // Plain text per the protocol; some services quote it as a JSON string
        body.trim_matches('"').parse().map_err(|_| ODataError::Payload {
            message: format!("expected a count, got '{}'", body),
        })
    }
}
