//! Enum parser
//!
//! Enum values travel as member names (`"Red"`, `"Red, Blue"` for flags, or
//! the qualified literal `Acme.Color'Red'`). In memory they are numbers
//! unless `string_as_enum` is set.

use super::ParseContext;
use crate::schema::EnumType;
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct EnumParser<'r> {
    enum_type: &'r EnumType,
}

impl<'r> EnumParser<'r> {
    pub fn new(enum_type: &'r EnumType) -> Self {
        Self { enum_type }
    }

    pub fn enum_type(&self) -> &'r EnumType {
        self.enum_type
    }

    pub fn deserialize(&self, value: Value, ctx: &ParseContext) -> Value {
        match value {
            Value::String(s) => {
                let Some(names) = self.parse_names(&s) else {
                    return Value::String(s);
                };
                if ctx.options.string_as_enum {
                    return Value::String(names.join(", "));
                }
                match self.value_of(&names) {
                    Some(n) => Value::from(n),
                    None => Value::String(s),
                }
            }
            Value::Number(n) if ctx.options.string_as_enum => match n.as_i64() {
                Some(raw) => self
                    .names_of(raw)
                    .map(Value::String)
                    .unwrap_or(Value::Number(n)),
                None => Value::Number(n),
            },
            other => other,
        }
    }

    pub fn serialize(&self, value: Value, _ctx: &ParseContext) -> Value {
        match value {
            Value::Number(n) => match n.as_i64().and_then(|raw| self.names_of(raw)) {
                Some(names) => Value::String(names),
                None => Value::Number(n),
            },
            Value::String(s) => match self.parse_names(&s) {
                Some(names) => Value::String(names.join(", ")),
                None => Value::String(s),
            },
            other => other,
        }
    }

    /// Member names of a wire literal; `None` if any name is unknown
    fn parse_names<'s>(&self, literal: &'s str) -> Option<Vec<&'s str>> {
        let inner = match (literal.find('\''), literal.rfind('\'')) {
            (Some(start), Some(end)) if end > start => &literal[start + 1..end],
            _ => literal,
        };
        let names: Vec<&str> = inner
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect();

        if names.is_empty() || (!self.enum_type.flags && names.len() > 1) {
            return None;
        }
        names
            .iter()
            .all(|name| self.enum_type.member_value(name).is_some())
            .then_some(names)
    }

    fn value_of(&self, names: &[&str]) -> Option<i64> {
        names.iter().try_fold(0i64, |acc, name| {
            self.enum_type.member_value(name).map(|value| acc | value)
        })
    }

    /// Member names for a numeric value, decomposing flags
    fn names_of(&self, raw: i64) -> Option<String> {
        if let Some(name) = self.enum_type.member_name(raw) {
            return Some(name.to_string());
        }
        if !self.enum_type.flags || raw <= 0 {
            return None;
        }

        let mut remaining = raw;
        let mut names = Vec::new();
        for (name, value) in &self.enum_type.members {
            if *value != 0 && raw & value == *value {
                names.push(name.as_str());
                remaining &= !value;
            }
        }
        (remaining == 0 && !names.is_empty()).then(|| names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiOptions, EnumConfig};
    use crate::schema::EnumId;
    use serde_json::json;

    fn color() -> EnumType {
        EnumType::from_config(
            EnumId(0),
            "Acme",
            EnumConfig::new("Color")
                .member("Red", 1)
                .member("Green", 2)
                .member("Blue", 4)
                .flags(true),
        )
    }

    fn gender() -> EnumType {
        EnumType::from_config(
            EnumId(1),
            "Acme",
            EnumConfig::new("Gender").member("Male", 0).member("Female", 1),
        )
    }

    #[test]
    fn test_deserialize_to_numbers() {
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);
        let color = color();
        let parser = EnumParser::new(&color);

        assert_eq!(parser.deserialize(json!("Green"), &ctx), json!(2));
        assert_eq!(parser.deserialize(json!("Red, Blue"), &ctx), json!(5));
        assert_eq!(parser.deserialize(json!("Acme.Color'Red,Green'"), &ctx), json!(3));
        assert_eq!(parser.deserialize(json!("Purple"), &ctx), json!("Purple"));
    }

    #[test]
    fn test_string_as_enum_keeps_names() {
        let options = ApiOptions {
            string_as_enum: true,
            ..Default::default()
        };
        let ctx = ParseContext::new(&options);
        let color = color();
        let parser = EnumParser::new(&color);

        assert_eq!(parser.deserialize(json!("Red,Blue"), &ctx), json!("Red, Blue"));
        assert_eq!(parser.deserialize(json!(6), &ctx), json!("Green, Blue"));
    }

    #[test]
    fn test_serialize_numbers_to_names() {
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);

        let color = color();
        let parser = EnumParser::new(&color);
        assert_eq!(parser.serialize(json!(5), &ctx), json!("Red, Blue"));
        assert_eq!(parser.serialize(json!(8), &ctx), json!(8));

        let gender = gender();
        let parser = EnumParser::new(&gender);
        assert_eq!(parser.serialize(json!(0), &ctx), json!("Male"));
        assert_eq!(parser.serialize(json!(3), &ctx), json!(3));
    }

    #[test]
    fn test_non_flags_reject_combinations() {
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);
        let gender = gender();
        let parser = EnumParser::new(&gender);

        assert_eq!(parser.deserialize(json!("Female"), &ctx), json!(1));
        assert_eq!(
            parser.deserialize(json!("Male, Female"), &ctx),
            json!("Male, Female")
        );
    }
}
