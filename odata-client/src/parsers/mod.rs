//! Payload parsers
//!
//! Parsers are lightweight views over the [`Registry`](crate::schema::Registry):
//! every registered type can be turned into a [`TypeParser`] that converts
//! values between their wire and in-memory JSON forms. Parsers never fail;
//! values they cannot coerce pass through unchanged.

pub mod callable;
pub mod edm;
pub mod enums;
pub mod field;
pub mod json_schema;
pub mod structured;

pub use callable::CallableParser;
pub use edm::EdmType;
pub use enums::EnumParser;
pub use field::{FieldParser, resolve_path};
pub use json_schema::JsonSchemaOptions;
pub use structured::StructuredParser;

use crate::config::ApiOptions;
use crate::schema::{EnumType, FieldDef};
use serde_json::Value;

/// Options and position a value is parsed with
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    pub options: &'a ApiOptions,
    /// Field the value belongs to, when parsed through one
    pub field: Option<&'a FieldDef>,
}

impl<'a> ParseContext<'a> {
    pub fn new(options: &'a ApiOptions) -> Self {
        Self {
            options,
            field: None,
        }
    }

    /// Same options, positioned on `field`
    pub fn with_field<'b>(&self, field: &'b FieldDef) -> ParseContext<'b>
    where
        'a: 'b,
    {
        ParseContext {
            options: self.options,
            field: Some(field),
        }
    }
}

/// Parser for any resolvable type
#[derive(Debug, Clone, Copy)]
pub enum TypeParser<'r> {
    /// Passthrough for unresolved types
    None,
    Primitive(EdmType),
    Enum(EnumParser<'r>),
    Structured(StructuredParser<'r>),
    Callable(CallableParser<'r>),
}

impl<'r> TypeParser<'r> {
    pub(crate) fn for_enum(enum_type: &'r EnumType) -> Self {
        TypeParser::Enum(EnumParser::new(enum_type))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TypeParser::None)
    }

    /// Wire value to in-memory value
    pub fn deserialize(&self, value: Value, ctx: &ParseContext) -> Value {
        match self {
            TypeParser::None => value,
            TypeParser::Primitive(edm) => edm.deserialize(value, ctx),
            TypeParser::Enum(parser) => parser.deserialize(value, ctx),
            TypeParser::Structured(parser) => parser.for_value(&value).deserialize(value, ctx),
            TypeParser::Callable(parser) => parser.deserialize(value, ctx),
        }
    }

    /// In-memory value to wire value
    pub fn serialize(&self, value: Value, ctx: &ParseContext) -> Value {
        match self {
            TypeParser::None => value,
            TypeParser::Primitive(edm) => edm.serialize(value, ctx),
            TypeParser::Enum(parser) => parser.serialize(value, ctx),
            TypeParser::Structured(parser) => parser.for_value(&value).serialize(value, ctx),
            TypeParser::Callable(parser) => parser.serialize(value, ctx),
        }
    }

    /// Structured view, if this parser is one
    pub fn as_structured(&self) -> Option<StructuredParser<'r>> {
        match self {
            TypeParser::Structured(parser) => Some(*parser),
            _ => None,
        }
    }
}
