//! Action and function parser
//!
//! Parameters serialize through their declared definitions; return values
//! deserialize through the return type's parser.

use super::{FieldParser, ParseContext, StructuredParser};
use crate::schema::{Callable, ParserRef, Registry};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy)]
pub struct CallableParser<'r> {
    registry: &'r Registry,
    callable: &'r Callable,
}

impl<'r> CallableParser<'r> {
    pub fn new(registry: &'r Registry, callable: &'r Callable) -> Self {
        Self { registry, callable }
    }

    pub fn callable(&self) -> &'r Callable {
        self.callable
    }

    /// Parameter parser by name
    pub fn parameter(&self, name: &str) -> Option<FieldParser<'r>> {
        self.callable
            .parameters
            .iter()
            .find(|p| p.name == name)
            .map(|def| FieldParser::new(self.registry, def))
    }

    /// Serialize a parameter object; undeclared entries pass through
    pub fn serialize(&self, params: Value, ctx: &ParseContext) -> Value {
        let map = match params {
            Value::Object(map) => map,
            other => return other,
        };
        let serialized: Map<String, Value> = map
            .into_iter()
            .map(|(name, value)| match self.parameter(&name) {
                Some(parser) if !value.is_null() => {
                    let value = parser.serialize(value, ctx);
                    (name, value)
                }
                Some(_) => (name, value),
                None => {
                    log::debug!(
                        "Parameter {} is not declared by {}",
                        name,
                        self.callable.qualified_name()
                    );
                    (name, value)
                }
            })
            .collect();
        Value::Object(serialized)
    }

    /// Deserialize a return value
    pub fn deserialize(&self, value: Value, ctx: &ParseContext) -> Value {
        let Some(ret) = &self.callable.return_type else {
            return value;
        };
        match value {
            Value::Array(items) if ret.collection => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.deserialize_one(ret.parser, item, ctx))
                    .collect(),
            ),
            value => self.deserialize_one(ret.parser, value, ctx),
        }
    }

    fn deserialize_one(&self, parser: ParserRef, value: Value, ctx: &ParseContext) -> Value {
        match parser {
            ParserRef::Structured(id) => {
                StructuredParser::new(self.registry, self.registry.structured(id))
                    .for_value(&value)
                    .deserialize(value, ctx)
            }
            other => self.registry.parser(other).deserialize(value, ctx),
        }
    }

    /// Structured return type, if any
    pub fn return_parser(&self) -> Option<StructuredParser<'r>> {
        match self.callable.return_type.as_ref()?.parser {
            ParserRef::Structured(id) => {
                Some(StructuredParser::new(self.registry, self.registry.structured(id)))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiOptions;
    use crate::parsers::TypeParser;
    use crate::testing;
    use serde_json::json;

    #[test]
    fn test_serialize_parameters() {
        let registry = testing::sample_registry();
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);

        let TypeParser::Callable(promote) = registry.parser_for_type("Acme.Promote") else {
            panic!("Promote should resolve to a callable parser");
        };
        let params = promote.serialize(json!({"level": "3", "color": 4, "note": "x"}), &ctx);
        assert_eq!(params, json!({"level": 3, "color": "Blue", "note": "x"}));
    }

    #[test]
    fn test_deserialize_return_values() {
        let registry = testing::sample_registry();
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);

        let TypeParser::Callable(top) = registry.parser_for_type("Acme.GetTopPerson") else {
            panic!("GetTopPerson should resolve to a callable parser");
        };
        assert_eq!(top.return_parser().map(|p| p.name()), Some("Person"));

        let value = top.deserialize(
            json!({"@odata.type": "#Acme.Employee", "id": 1, "name": "Ann", "salary": "10"}),
            &ctx,
        );
        assert_eq!(value["salary"], json!(10));

        let TypeParser::Callable(names) = registry.parser_for_type("Acme.GetColors") else {
            panic!("GetColors should resolve to a callable parser");
        };
        assert_eq!(names.deserialize(json!(["Red", "Blue"]), &ctx), json!([1, 4]));
    }
}
