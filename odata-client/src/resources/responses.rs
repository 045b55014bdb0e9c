//! Response envelopes
//!
//! Top-level `@` annotations are split off into [`ODataMeta`]; the remaining
//! payload is deserialized through the parser of the most derived type named
//! by the entity's `@odata.type`.

use crate::constants::{
    ODATA_ANNOTATION_PREFIX, ODATA_CONTEXT, ODATA_COUNT, ODATA_DELTA_LINK, ODATA_ETAG, ODATA_ID,
    ODATA_NEXT_LINK, ODATA_TYPE, ODATA_VALUE,
};
use crate::error::ODataError;
use crate::parsers::{ParseContext, StructuredParser, TypeParser};
use crate::request::ODataResponse;
use serde_json::{Map, Value};

/// Control information carried by a payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ODataMeta {
    pub context: Option<String>,
    pub etag: Option<String>,
    /// Qualified type name without the leading `#`
    pub type_name: Option<String>,
    pub id: Option<String>,
    pub count: Option<u64>,
    pub next_link: Option<String>,
    pub delta_link: Option<String>,
    /// `$skip` of the next page
    pub skip: Option<u64>,
    /// `$skiptoken` of the next page
    pub skiptoken: Option<String>,
    /// Every other top-level annotation
    pub annotations: Map<String, Value>,
}

impl ODataMeta {
    /// Remove the top-level annotations from `object`
    pub fn extract(object: &mut Map<String, Value>) -> Self {
        let names: Vec<String> = object
            .keys()
            .filter(|name| name.starts_with(ODATA_ANNOTATION_PREFIX))
            .cloned()
            .collect();

        let mut meta = ODataMeta::default();
        for name in names {
            let Some(value) = object.remove(&name) else {
                continue;
            };
            match name.as_str() {
                ODATA_CONTEXT => meta.context = value.as_str().map(str::to_string),
                ODATA_ETAG => meta.etag = value.as_str().map(str::to_string),
                ODATA_TYPE => {
                    meta.type_name = value
                        .as_str()
                        .map(|t| t.trim_start_matches('#').to_string())
                }
                ODATA_ID => meta.id = value.as_str().map(str::to_string),
                ODATA_COUNT => meta.count = as_count(&value),
                ODATA_NEXT_LINK => meta.next_link = value.as_str().map(str::to_string),
                ODATA_DELTA_LINK => meta.delta_link = value.as_str().map(str::to_string),
                _ => {
                    meta.annotations.insert(name, value);
                }
            }
        }

        if let Some(next) = &meta.next_link {
            meta.skip = link_param(next, "$skip").and_then(|skip| skip.parse().ok());
            meta.skiptoken = link_param(next, "$skiptoken");
        }
        meta
    }
}

// Counts arrive as numbers, or as strings under IEEE754Compatible
fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Decoded value of a query parameter in a link
fn link_param(link: &str, name: &str) -> Option<String> {
    let (_, query) = link.split_once('?')?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        let key = urlencoding::decode(key).ok()?;
        if key == name {
            urlencoding::decode(value).ok().map(|v| v.into_owned())
        } else {
            None
        }
    })
}

fn body_object(response: &ODataResponse) -> Result<Option<Map<String, Value>>, ODataError> {
    match response.json()? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(other) => Err(ODataError::Payload {
            message: format!("expected a JSON object, got {}", other),
        }),
    }
}

/// A single entity
#[derive(Debug, Clone, PartialEq)]
pub struct ODataEntity {
    pub entity: Option<Value>,
    pub meta: ODataMeta,
}

impl ODataEntity {
    pub fn from_response(
        response: &ODataResponse,
        parser: Option<StructuredParser<'_>>,
        ctx: &ParseContext,
    ) -> Result<Self, ODataError> {
        let Some(object) = body_object(response)? else {
            return Ok(Self {
                entity: None,
                meta: ODataMeta::default(),
            });
        };
        let (entity, mut meta) = split_entity(object, parser, ctx);
        if meta.etag.is_none() {
            meta.etag = response.header("etag").map(str::to_string);
        }
        Ok(Self {
            entity: Some(entity),
            meta,
        })
    }
}

/// Deserialize one entity object, returning it with its own annotations
fn split_entity(
    mut object: Map<String, Value>,
    parser: Option<StructuredParser<'_>>,
    ctx: &ParseContext,
) -> (Value, ODataMeta) {
    let meta = ODataMeta::extract(&mut object);
    let value = Value::Object(object);
    let entity = match parser {
        Some(parser) => {
            let parser = match &meta.type_name {
                Some(type_name) => parser.find_by_type(type_name).unwrap_or(parser),
                None => parser,
            };
            parser.deserialize(value, ctx)
        }
        None => value,
    };
    (entity, meta)
}

/// A collection of entities
#[derive(Debug, Clone, PartialEq)]
pub struct ODataEntities {
    pub entities: Vec<Value>,
    /// Per-entity annotations, parallel to `entities`
    pub entity_meta: Vec<ODataMeta>,
    pub meta: ODataMeta,
}

impl ODataEntities {
    pub fn from_response(
        response: &ODataResponse,
        parser: Option<StructuredParser<'_>>,
        ctx: &ParseContext,
    ) -> Result<Self, ODataError> {
        let Some(mut object) = body_object(response)? else {
            return Ok(Self {
                entities: Vec::new(),
                entity_meta: Vec::new(),
                meta: ODataMeta::default(),
            });
        };
        let meta = ODataMeta::extract(&mut object);
        let items = match object.remove(ODATA_VALUE) {
            Some(Value::Array(items)) => items,
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                return Err(ODataError::Payload {
                    message: format!("expected an array under 'value', got {}", other),
                });
            }
        };

        let mut entities = Vec::with_capacity(items.len());
        let mut entity_meta = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Object(map) => {
                    let (entity, meta) = split_entity(map, parser, ctx);
                    entities.push(entity);
                    entity_meta.push(meta);
                }
                other => {
                    entities.push(other);
                    entity_meta.push(ODataMeta::default());
                }
            }
        }

        Ok(Self {
            entities,
            entity_meta,
            meta,
        })
    }

    /// Total count, when requested with `$count=true`
    pub fn count(&self) -> Option<u64> {
        self.meta.count
    }
}

/// A primitive, enum or complex value addressed through a property path
#[derive(Debug, Clone, PartialEq)]
pub struct ODataProperty {
    pub property: Option<Value>,
    pub meta: ODataMeta,
}

impl ODataProperty {
    pub fn from_response(
        response: &ODataResponse,
        parser: TypeParser<'_>,
        ctx: &ParseContext,
    ) -> Result<Self, ODataError> {
        let Some(mut object) = body_object(response)? else {
            return Ok(Self {
                property: None,
                meta: ODataMeta::default(),
            });
        };
        let meta = ODataMeta::extract(&mut object);
        let value = match object.remove(ODATA_VALUE) {
            Some(value) if object.is_empty() => value,
            Some(value) => {
                // A complex value that happens to have a `value` field
                object.insert(ODATA_VALUE.to_string(), value);
                Value::Object(object)
            }
            None => Value::Object(object),
        };
        let property = match (parser, value) {
            (_, Value::Null) => None,
            // Callables map collection returns themselves
            (TypeParser::Callable(_), value) => Some(parser.deserialize(value, ctx)),
            (_, Value::Array(items)) => Some(Value::Array(
                items
                    .into_iter()
                    .map(|item| parser.deserialize(item, ctx))
                    .collect(),
            )),
            (_, value) => Some(parser.deserialize(value, ctx)),
        };
        Ok(Self { property, meta })
    }
}
