//! JSON schema generation for structured types

use super::{FieldParser, StructuredParser};
use crate::schema::{FieldDef, ParserRef, StructId};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Field selection applied when generating a schema
///
/// Navigation fields only appear when expanded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonSchemaOptions {
    pub select: Option<Vec<String>>,
    pub expand: BTreeMap<String, JsonSchemaOptions>,
}

impl JsonSchemaOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn expand(mut self, field: impl Into<String>, options: JsonSchemaOptions) -> Self {
        self.expand.insert(field.into(), options);
        self
    }

    fn includes(&self, def: &FieldDef) -> bool {
        if def.navigation {
            return self.expand.contains_key(&def.name);
        }
        match &self.select {
            Some(select) => select.iter().any(|name| name == &def.name),
            None => true,
        }
    }
}

impl<'r> StructuredParser<'r> {
    /// Draft-07 JSON schema of this type, inherited fields included
    pub fn json_schema(&self, options: &JsonSchemaOptions) -> Value {
        let mut schema = self.object_schema(options, &mut Vec::new());
        if let Value::Object(map) = &mut schema {
            map.insert("$schema".into(), Value::String(DRAFT_07.into()));
            map.insert("$id".into(), Value::String(self.qualified_name()));
        }
        schema
    }

    fn object_schema(&self, options: &JsonSchemaOptions, stack: &mut Vec<StructId>) -> Value {
        stack.push(self.ty().id);

        let mut properties = Map::new();
        let mut required = Vec::new();
        for def in self.fields(true) {
            if !options.includes(def) {
                continue;
            }
            let nested = options.expand.get(&def.name).cloned().unwrap_or_default();
            let field = FieldParser::new(self.registry(), def);
            properties.insert(def.name.clone(), field_schema(&field, &nested, stack));
            if !def.nullable {
                required.push(Value::String(def.name.clone()));
            }
        }

        stack.pop();
        json!({
            "title": self.name(),
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

fn field_schema(
    field: &FieldParser,
    options: &JsonSchemaOptions,
    stack: &mut Vec<StructId>,
) -> Value {
    let def = field.def();
    let mut schema = match def.parser {
        ParserRef::Primitive(edm) => edm.json_schema(),
        ParserRef::Enum(id) => {
            let names: Vec<&str> = field
                .registry()
                .enum_type(id)
                .members
                .iter()
                .map(|(name, _)| name.as_str())
                .collect();
            json!({"type": "string", "enum": names})
        }
        ParserRef::Structured(id) => match field.structured() {
            // Self-referencing complex types stop at the first repeat
            Some(_) if !def.navigation && stack.contains(&id) => json!({"type": "object"}),
            Some(parser) => parser.object_schema(options, stack),
            None => json!({}),
        },
        ParserRef::Callable(_) | ParserRef::None => json!({}),
    };

    if let Value::Object(map) = &mut schema {
        if let Some(max) = def.max_length {
            map.insert("maxLength".into(), Value::from(max));
        }
        if let Some(default) = &def.default {
            map.insert("default".into(), default.clone());
        }
    }

    if def.collection {
        json!({"title": def.name, "type": "array", "items": schema})
    } else {
        schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_schema_for_person() {
        let registry = testing::sample_registry();
        let person = registry.structured_parser("Acme.Person").unwrap();

        let schema = person.json_schema(&JsonSchemaOptions::new());
        assert_eq!(schema["$schema"], json!(DRAFT_07));
        assert_eq!(schema["$id"], json!("Acme.Person"));
        assert_eq!(schema["properties"]["id"]["type"], json!("integer"));
        assert_eq!(schema["properties"]["emails"]["type"], json!("array"));
        assert_eq!(
            schema["properties"]["favoriteColors"]["items"]["enum"],
            json!(["Red", "Green", "Blue"])
        );
        assert_eq!(schema["required"], json!(["id"]));
        // Navigation properties need an explicit expand
        assert!(schema["properties"].get("friends").is_none());
    }

    #[test]
    fn test_select_and_expand() {
        let registry = testing::sample_registry();
        let employee = registry.structured_parser("Acme.Employee").unwrap();

        let options = JsonSchemaOptions::new()
            .select(["id", "salary"])
            .expand("friends", JsonSchemaOptions::new().select(["name"]));
        let schema = employee.json_schema(&options);

        let properties = schema["properties"].as_object().unwrap();
        let mut names: Vec<&str> = properties.keys().map(String::as_str).collect();
        names.sort();
        assert_eq!(names, vec!["friends", "id", "salary"]);

        let friend = &schema["properties"]["friends"]["items"];
        assert_eq!(friend["title"], json!("Person"));
        assert!(friend["properties"]["name"].is_object());
        assert!(friend["properties"].get("id").is_none());
    }

    #[test]
    fn test_complex_fields_are_nested() {
        let registry = testing::sample_registry();
        let person = registry.structured_parser("Acme.Person").unwrap();
        let schema = person.json_schema(&JsonSchemaOptions::new());

        let address = &schema["properties"]["address"];
        assert_eq!(address["title"], json!("Address"));
        assert_eq!(address["properties"]["country"]["default"], json!("US"));
        assert_eq!(address["properties"]["city"]["maxLength"], json!(64));
    }
}
