//! Built-in parsers for the `Edm.*` primitive types

use super::ParseContext;
use crate::constants::EDM_PREFIX;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value, json};
use uuid::Uuid;

/// Primitive types with dedicated coercion rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmType {
    String,
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Decimal,
    Double,
    Single,
    Guid,
    Date,
    DateTimeOffset,
    TimeOfDay,
    Duration,
    Binary,
    Stream,
    /// Geography and geometry values are passed through as GeoJSON
    Spatial,
    /// Abstract or untyped values
    Untyped,
}

impl EdmType {
    /// Look up a primitive type by its qualified name
    pub fn from_name(type_name: &str) -> Option<Self> {
        let name = type_name.strip_prefix(EDM_PREFIX)?;
        let edm = match name {
            "String" => EdmType::String,
            "Boolean" => EdmType::Boolean,
            "Byte" => EdmType::Byte,
            "SByte" => EdmType::SByte,
            "Int16" => EdmType::Int16,
            "Int32" => EdmType::Int32,
            "Int64" => EdmType::Int64,
            "Decimal" => EdmType::Decimal,
            "Double" => EdmType::Double,
            "Single" => EdmType::Single,
            "Guid" => EdmType::Guid,
            "Date" => EdmType::Date,
            "DateTimeOffset" => EdmType::DateTimeOffset,
            "TimeOfDay" => EdmType::TimeOfDay,
            "Duration" => EdmType::Duration,
            "Binary" => EdmType::Binary,
            "Stream" => EdmType::Stream,
            "Untyped" | "PrimitiveType" | "ComplexType" | "EntityType" => EdmType::Untyped,
            other if other.starts_with("Geography") || other.starts_with("Geometry") => {
                EdmType::Spatial
            }
            _ => return None,
        };
        Some(edm)
    }

    fn is_integer(&self) -> bool {
        matches!(
            self,
            EdmType::Byte | EdmType::SByte | EdmType::Int16 | EdmType::Int32 | EdmType::Int64
        )
    }

    /// Types exchanged as strings in IEEE754-compatible mode
    fn is_ieee754_sensitive(&self) -> bool {
        matches!(self, EdmType::Int64 | EdmType::Decimal)
    }

    /// Coerce a wire value into its in-memory form
    pub fn deserialize(&self, value: Value, _ctx: &ParseContext) -> Value {
        match (self, value) {
            (_, Value::Null) => Value::Null,
            (EdmType::Boolean, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
            (edm, Value::String(s)) if edm.is_integer() => match s.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s),
            },
            (EdmType::Decimal | EdmType::Double | EdmType::Single, Value::String(s)) => {
                parse_float(&s).unwrap_or(Value::String(s))
            }
            (EdmType::Guid, Value::String(s)) => Value::String(normalize_guid(s)),
            (EdmType::DateTimeOffset, Value::String(s)) => Value::String(normalize_datetime(s)),
            (EdmType::Date, Value::String(s)) => Value::String(normalize_date(s)),
            (_, value) => value,
        }
    }

    /// Coerce an in-memory value into its wire form
    pub fn serialize(&self, value: Value, ctx: &ParseContext) -> Value {
        let field = ctx.field;
        match (self, value) {
            (_, Value::Null) => Value::Null,
            (edm, Value::Number(n))
                if edm.is_ieee754_sensitive() && ctx.options.ieee754_compatible =>
            {
                // Integral values keep their integer form so they read back unchanged
                let scale = field.and_then(|f| f.scale);
                match (edm, scale, n.as_f64()) {
                    (EdmType::Decimal, Some(scale), Some(f)) if n.is_f64() => {
                        Value::String(format!("{:.*}", scale as usize, f))
                    }
                    _ => Value::String(n.to_string()),
                }
            }
            (EdmType::Boolean, Value::String(s)) => match s.to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => Value::String(s),
            },
            (EdmType::String, Value::String(s)) => {
                if let Some(max) = field.and_then(|f| f.max_length) {
                    if s.chars().count() > max as usize {
                        log::warn!(
                            "Value of {} exceeds max length {} ({} chars)",
                            field.map(|f| f.name.as_str()).unwrap_or("?"),
                            max,
                            s.chars().count()
                        );
                    }
                }
                Value::String(s)
            }
            (EdmType::Guid, Value::String(s)) => Value::String(normalize_guid(s)),
            (EdmType::DateTimeOffset, Value::String(s)) => Value::String(normalize_datetime(s)),
            (EdmType::Date, Value::String(s)) => Value::String(normalize_date(s)),
            (_, value) => value,
        }
    }

    /// JSON schema fragment describing the type
    pub fn json_schema(&self) -> Value {
        match self {
            EdmType::String => json!({"type": "string"}),
            EdmType::Boolean => json!({"type": "boolean"}),
            EdmType::Byte | EdmType::SByte | EdmType::Int16 | EdmType::Int32 | EdmType::Int64 => {
                json!({"type": "integer"})
            }
            EdmType::Decimal | EdmType::Double | EdmType::Single => json!({"type": "number"}),
            EdmType::Guid => json!({"type": "string", "format": "uuid"}),
            EdmType::Date => json!({"type": "string", "format": "date"}),
            EdmType::DateTimeOffset => json!({"type": "string", "format": "date-time"}),
            EdmType::TimeOfDay => json!({"type": "string", "format": "time"}),
            EdmType::Duration => json!({"type": "string", "format": "duration"}),
            EdmType::Binary | EdmType::Stream => {
                json!({"type": "string", "contentEncoding": "base64"})
            }
            EdmType::Spatial => json!({"type": "object"}),
            EdmType::Untyped => json!({}),
        }
    }
}

fn parse_float(s: &str) -> Option<Value> {
    let trimmed = s.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(Value::from(n));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
}

fn normalize_guid(s: String) -> String {
    match Uuid::parse_str(&s) {
        Ok(uuid) => uuid.hyphenated().to_string(),
        Err(_) => s,
    }
}

fn normalize_datetime(s: String) -> String {
    match DateTime::parse_from_rfc3339(&s) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::AutoSi, true),
        Err(_) => s,
    }
}

fn normalize_date(s: String) -> String {
    if NaiveDate::parse_from_str(&s, "%Y-%m-%d").is_ok() {
        return s;
    }
    match DateTime::parse_from_rfc3339(&s) {
        Ok(dt) => dt.date_naive().format("%Y-%m-%d").to_string(),
        Err(_) => {
            log::debug!("Passing through malformed Edm.Date value {}", s);
            s
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiOptions, FieldConfig};
    use crate::schema::FieldDef;

    fn options(ieee754_compatible: bool) -> ApiOptions {
        ApiOptions {
            ieee754_compatible,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(EdmType::from_name("Edm.Int32"), Some(EdmType::Int32));
        assert_eq!(
            EdmType::from_name("Edm.GeographyPoint"),
            Some(EdmType::Spatial)
        );
        assert_eq!(EdmType::from_name("Edm.Unknown"), None);
        assert_eq!(EdmType::from_name("Acme.Person"), None);
    }

    #[test]
    fn test_deserialize_string_spellings() {
        let opts = options(false);
        let ctx = ParseContext::new(&opts);

        assert_eq!(EdmType::Boolean.deserialize(json!("TRUE"), &ctx), json!(true));
        assert_eq!(EdmType::Int32.deserialize(json!("42"), &ctx), json!(42));
        assert_eq!(
            EdmType::Int64.deserialize(json!("9007199254740993"), &ctx),
            json!(9007199254740993i64)
        );
        assert_eq!(EdmType::Decimal.deserialize(json!("12.5"), &ctx), json!(12.5));
        assert_eq!(EdmType::Int32.deserialize(json!("n/a"), &ctx), json!("n/a"));
        assert_eq!(EdmType::String.deserialize(json!(5), &ctx), json!(5));
    }

    #[test]
    fn test_ieee754_serialization() {
        let opts = options(true);
        let ctx = ParseContext::new(&opts);
        assert_eq!(EdmType::Int64.serialize(json!(12), &ctx), json!("12"));
        assert_eq!(EdmType::Int32.serialize(json!(12), &ctx), json!(12));

        let salary =
            FieldDef::from_config(&FieldConfig::new("salary", "Edm.Decimal").precision(10, 2));
        let ctx = ParseContext::new(&opts).with_field(&salary);
        assert_eq!(EdmType::Decimal.serialize(json!(5000.5), &ctx), json!("5000.50"));
        assert_eq!(EdmType::Decimal.serialize(json!(5000), &ctx), json!("5000"));
        assert_eq!(EdmType::Decimal.deserialize(json!("5000"), &ctx), json!(5000));

        let plain = options(false);
        let ctx = ParseContext::new(&plain);
        assert_eq!(EdmType::Int64.serialize(json!(12), &ctx), json!(12));
    }

    #[test]
    fn test_guid_and_datetime_normalization() {
        let opts = options(false);
        let ctx = ParseContext::new(&opts);

        assert_eq!(
            EdmType::Guid.deserialize(json!("{A0B1C2D3-0000-4000-8000-00000000ABCD}"), &ctx),
            json!("a0b1c2d3-0000-4000-8000-00000000abcd")
        );
        assert_eq!(
            EdmType::DateTimeOffset.serialize(json!("2024-05-01T12:00:00+02:00"), &ctx),
            json!("2024-05-01T10:00:00Z")
        );
        assert_eq!(EdmType::Date.serialize(json!("2024-05-01"), &ctx), json!("2024-05-01"));
        assert_eq!(
            EdmType::Date.serialize(json!("2024-05-01T23:00:00Z"), &ctx),
            json!("2024-05-01")
        );
        assert_eq!(EdmType::Date.serialize(json!("May 1st"), &ctx), json!("May 1st"));
    }

    #[test]
    fn test_null_passes_through() {
        let opts = options(true);
        let ctx = ParseContext::new(&opts);
        assert_eq!(EdmType::Int64.serialize(Value::Null, &ctx), Value::Null);
        assert_eq!(EdmType::Guid.deserialize(Value::Null, &ctx), Value::Null);
    }
}
