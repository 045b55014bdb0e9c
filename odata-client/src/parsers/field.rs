//! Field parser
//!
//! Applies a field's resolved parser to its value, mapping collections
//! element-wise and dispatching entity values to the most derived parser
//! named by their `@odata.type` annotation.

use super::{ParseContext, StructuredParser};
use crate::schema::{FieldDef, ParserRef, Registry};
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct FieldParser<'r> {
    registry: &'r Registry,
    def: &'r FieldDef,
}

impl<'r> FieldParser<'r> {
    pub fn new(registry: &'r Registry, def: &'r FieldDef) -> Self {
        Self { registry, def }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn def(&self) -> &'r FieldDef {
        self.def
    }

    pub fn name(&self) -> &'r str {
        &self.def.name
    }

    /// Structured parser for the field's declared type
    pub fn structured(&self) -> Option<StructuredParser<'r>> {
        match self.def.parser {
            ParserRef::Structured(id) => {
                Some(StructuredParser::new(self.registry, self.registry.structured(id)))
            }
            _ => None,
        }
    }

    pub fn deserialize(&self, value: Value, ctx: &ParseContext) -> Value {
        let ctx = ctx.with_field(self.def);
        match value {
            Value::Array(items) if self.def.collection => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.deserialize_one(item, &ctx))
                    .collect(),
            ),
            value => self.deserialize_one(value, &ctx),
        }
    }

    pub fn serialize(&self, value: Value, ctx: &ParseContext) -> Value {
        let ctx = ctx.with_field(self.def);
        match value {
            Value::Array(items) if self.def.collection => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.serialize_one(item, &ctx))
                    .collect(),
            ),
            value => self.serialize_one(value, &ctx),
        }
    }

    fn deserialize_one(&self, value: Value, ctx: &ParseContext) -> Value {
        match self.structured() {
            Some(parser) => parser.for_value(&value).deserialize(value, ctx),
            None => self.registry.parser(self.def.parser).deserialize(value, ctx),
        }
    }

    fn serialize_one(&self, value: Value, ctx: &ParseContext) -> Value {
        match self.structured() {
            Some(parser) => parser.for_value(&value).serialize(value, ctx),
            None => self.registry.parser(self.def.parser).serialize(value, ctx),
        }
    }

    /// Value of this field inside an attribute bag, following its `ref` path
    pub fn resolve<'v>(&self, attrs: &'v Value) -> Option<&'v Value> {
        resolve_path(attrs, self.def.key_path())
    }
}

/// Walk a `/`- or `.`-separated path into nested objects
pub fn resolve_path<'v>(attrs: &'v Value, path: &str) -> Option<&'v Value> {
    path.split(['/', '.'])
        .filter(|segment| !segment.is_empty())
        .try_fold(attrs, |current, segment| current.get(segment))
}
