//! Path segment chain
//!
//! A resource's URL path is an ordered list of segments. Each segment knows
//! its kind, the name it renders and, when known, the type it addresses.
//! Segments are cloned along with the resource on every fluent step.

use super::key::{EntityKey, literal};
use crate::constants::{COUNT_SEGMENT, METADATA_SEGMENT, REF_SEGMENT};
use crate::parsers::StructuredParser;
use crate::schema::Registry;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Metadata,
    EntitySet,
    Singleton,
    TypeCast,
    NavigationProperty,
    Property,
    Function,
    Action,
    Count,
    Ref,
}

impl SegmentKind {
    /// Kinds that accept an entity key
    pub fn is_keyable(&self) -> bool {
        matches!(
            self,
            SegmentKind::EntitySet | SegmentKind::NavigationProperty | SegmentKind::TypeCast
        )
    }
}

/// One step of a resource path
#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub kind: SegmentKind,
    pub name: String,
    /// Qualified type addressed by this segment
    pub type_name: Option<String>,
    pub key: Option<EntityKey>,
    /// Inline function parameters, already in wire form
    pub parameters: Option<Value>,
}

impl PathSegment {
    pub fn new(kind: SegmentKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            type_name: None,
            key: None,
            parameters: None,
        }
    }

    pub fn metadata() -> Self {
        Self::new(SegmentKind::Metadata, METADATA_SEGMENT)
    }

    pub fn count() -> Self {
        Self::new(SegmentKind::Count, COUNT_SEGMENT)
    }

    pub fn reference() -> Self {
        Self::new(SegmentKind::Ref, REF_SEGMENT)
    }

    pub fn with_type(mut self, type_name: Option<String>) -> Self {
        self.type_name = type_name;
        self
    }

    /// Rendered segment, e.g. `People(1)` or `GetNearest(lat=1.5,lon=2)`
    pub fn render(&self) -> String {
        self.render_typed(None)
    }

    /// Rendered segment with its key typed by the addressed entity type
    pub fn render_typed(&self, parser: Option<StructuredParser>) -> String {
        match self.kind {
            SegmentKind::Function => {
                format!("{}({})", self.name, render_parameters(self.parameters.as_ref()))
            }
            _ => match &self.key {
                Some(key) => format!("{}{}", self.name, key.render_typed(parser)),
                None => self.name.clone(),
            },
        }
    }
}

fn render_parameters(parameters: Option<&Value>) -> String {
    match parameters {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(name, value)| format!("{}={}", name, literal(value)))
            .collect::<Vec<_>>()
            .join(","),
        _ => String::new(),
    }
}

/// Ordered segments of a resource path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathSegments {
    segments: Vec<PathSegment>,
}

impl PathSegments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: PathSegment) -> &mut PathSegment {
        self.segments.push(segment);
        let last = self.segments.len() - 1;
        &mut self.segments[last]
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    pub fn last_mut(&mut self) -> Option<&mut PathSegment> {
        self.segments.last_mut()
    }

    /// Last segment of the given kind
    pub fn get(&self, kind: SegmentKind) -> Option<&PathSegment> {
        self.segments.iter().rev().find(|segment| segment.kind == kind)
    }

    pub fn contains(&self, kind: SegmentKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Slash-joined path relative to the service root
    pub fn path(&self) -> String {
        self.segments
            .iter()
            .map(PathSegment::render)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Path with keys rendered through the registered entity types
    pub fn path_in(&self, registry: &Registry) -> String {
        self.segments
            .iter()
            .map(|segment| {
                let parser = segment
                    .type_name
                    .as_deref()
                    .and_then(|type_name| registry.find_structured_for_type(type_name))
                    .map(|ty| StructuredParser::new(registry, ty));
                segment.render_typed(parser)
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Type addressed by the path
    ///
    /// `$count` and `$ref` address their parent, so the type comes from the
    /// last segment of any other kind.
    pub fn type_name(&self) -> Option<&str> {
        self.segments
            .iter()
            .rev()
            .find(|segment| !matches!(segment.kind, SegmentKind::Count | SegmentKind::Ref))
            .and_then(|segment| segment.type_name.as_deref())
    }

    /// Key of the addressed entity
    ///
    /// Keyless type casts are stepped over, so `People(1)/Acme.Employee`
    /// still reports the key `1`.
    pub fn key(&self) -> Option<&EntityKey> {
        self.key_index()
            .and_then(|index| self.segments[index].key.as_ref())
    }

    /// Segment that carries (or would carry) the entity key
    pub fn key_segment_mut(&mut self) -> Option<&mut PathSegment> {
        let index = self.key_index()?;
        self.segments.get_mut(index)
    }

    fn key_index(&self) -> Option<usize> {
        let last = self.segments.len().checked_sub(1)?;
        let nearest = self
            .segments
            .iter()
            .rposition(|segment| segment.key.is_some() || segment.kind != SegmentKind::TypeCast);
        match nearest {
            Some(index) if self.segments[index].key.is_some() => Some(index),
            _ => Some(last),
        }
    }
}
