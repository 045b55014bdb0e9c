//! Entity keys and OData literal rendering

use crate::parsers::{EdmType, StructuredParser};
use serde_json::Value;
use uuid::Uuid;

/// Key addressing a single entity in a collection
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKey {
    /// `People(1)`
    Single(Value),
    /// `OrderLines(orderId=1,lineNo=2)`, in key declaration order
    Composite(Vec<(String, Value)>),
}

impl EntityKey {
    /// Key from a raw value or an attribute bag
    ///
    /// Objects are resolved through the bound type's key fields when a parser
    /// is available; scalars are taken as the key itself. Null and empty
    /// values yield no key.
    pub fn from_value(value: &Value, parser: Option<StructuredParser>) -> Option<EntityKey> {
        match value {
            Value::Null => None,
            Value::String(s) if s.is_empty() => None,
            Value::Object(map) => match parser {
                Some(parser) => parser.resolve_key(value),
                None => {
                    let components: Vec<(String, Value)> = map
                        .iter()
                        .filter(|(name, v)| !v.is_null() && !name.starts_with('@'))
                        .map(|(name, v)| (name.clone(), v.clone()))
                        .collect();
                    match components.len() {
                        0 => None,
                        1 => components.into_iter().next().map(|(_, v)| EntityKey::Single(v)),
                        _ => Some(EntityKey::Composite(components)),
                    }
                }
            },
            Value::Array(_) => None,
            scalar => Some(EntityKey::Single(scalar.clone())),
        }
    }

    /// Check whether the key addresses nothing (null or empty components)
    pub fn is_empty(&self) -> bool {
        let blank = |value: &Value| value.is_null() || value.as_str() == Some("");
        match self {
            EntityKey::Single(value) => blank(value),
            EntityKey::Composite(components) => {
                components.is_empty() || components.iter().any(|(_, value)| blank(value))
            }
        }
    }

    /// Parenthesized key segment, e.g. `(1)` or `(a=1,b='x')`
    ///
    /// Without a bound type, GUID-shaped strings are emitted bare.
    pub fn render(&self) -> String {
        self.render_typed(None)
    }

    /// Key segment rendered through the declared key field types
    ///
    /// `Edm.Guid` keys are emitted bare and other strings are quoted, whatever
    /// their shape. Components without a declared type fall back to
    /// [`literal`].
    pub fn render_typed(&self, parser: Option<StructuredParser>) -> String {
        let keys = parser.map(|parser| parser.keys()).unwrap_or_default();
        let edm_of = |name: Option<&str>| {
            let def = match name {
                Some(name) => keys.iter().find(|def| def.name == name),
                None if keys.len() == 1 => keys.first(),
                None => None,
            };
            def.and_then(|def| EdmType::from_name(&def.type_name))
        };
        match self {
            EntityKey::Single(value) => format!("({})", typed_literal(value, edm_of(None))),
            EntityKey::Composite(components) => {
                let parts: Vec<String> = components
                    .iter()
                    .map(|(name, value)| {
                        format!("{}={}", name, typed_literal(value, edm_of(Some(name.as_str()))))
                    })
                    .collect();
                format!("({})", parts.join(","))
            }
        }
    }
}

fn typed_literal(value: &Value, edm: Option<EdmType>) -> String {
    match (edm, value) {
        (Some(EdmType::Guid), Value::String(s)) => s.clone(),
        (Some(EdmType::String), Value::String(s)) => quote(s),
        _ => literal(value),
    }
}

macro_rules! integer_keys {
    ($($int:ty),*) => {
        $(
            impl From<$int> for EntityKey {
                fn from(value: $int) -> Self {
                    EntityKey::Single(Value::from(value))
                }
            }
        )*
    };
}

integer_keys!(i32, i64, u32, u64);

impl From<&str> for EntityKey {
    fn from(value: &str) -> Self {
        EntityKey::Single(Value::String(value.to_string()))
    }
}

impl From<String> for EntityKey {
    fn from(value: String) -> Self {
        EntityKey::Single(Value::String(value))
    }
}

impl From<Uuid> for EntityKey {
    fn from(value: Uuid) -> Self {
        EntityKey::Single(Value::String(value.hyphenated().to_string()))
    }
}

/// Render a JSON value as an OData URL literal
///
/// Strings are single-quoted with embedded quotes doubled; GUID-shaped
/// strings are emitted bare.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if is_guid(s) => s.clone(),
        Value::String(s) => quote(s),
        other => other.to_string(),
    }
}

/// Single-quote a string literal
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

fn is_guid(s: &str) -> bool {
    s.len() == 36 && Uuid::parse_str(s).is_ok()
}
