//! OData protocol constants

pub const DEFAULT_VERSION: &str = "4.0";
pub const DEFAULT_CACHE_MAX_AGE_MS: u64 = 30_000;

pub const EDM_PREFIX: &str = "Edm.";

// Payload annotations
pub const ODATA_ANNOTATION_PREFIX: char = '@';
pub const ODATA_CONTEXT: &str = "@odata.context";
pub const ODATA_ETAG: &str = "@odata.etag";
pub const ODATA_TYPE: &str = "@odata.type";
pub const ODATA_ID: &str = "@odata.id";
pub const ODATA_COUNT: &str = "@odata.count";
pub const ODATA_NEXT_LINK: &str = "@odata.nextLink";
pub const ODATA_DELTA_LINK: &str = "@odata.deltaLink";
pub const ODATA_VALUE: &str = "value";

// Path segments
pub const METADATA_SEGMENT: &str = "$metadata";
pub const COUNT_SEGMENT: &str = "$count";
pub const REF_SEGMENT: &str = "$ref";

// Headers
pub const IF_MATCH_HEADER: &str = "If-Match";
pub const ACCEPT_HEADER: &str = "Accept";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const ODATA_VERSION_HEADER: &str = "OData-Version";
pub const JSON_CONTENT_TYPE: &str = "application/json";

// Request parameters
pub const COUNT_PARAM: &str = "$count";
pub const ID_PARAM: &str = "$id";
