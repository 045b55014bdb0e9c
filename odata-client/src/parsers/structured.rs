//! Entity and complex type parser
//!
//! Inherited fields are always handled by the parent first; a type then
//! overlays only the fields it declares itself.

use super::{FieldParser, ParseContext};
use crate::constants::ODATA_TYPE;
use crate::resources::EntityKey;
use crate::schema::{FieldDef, Registry, StructuredType};
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub struct StructuredParser<'r> {
    registry: &'r Registry,
    ty: &'r StructuredType,
}

impl<'r> StructuredParser<'r> {
    pub fn new(registry: &'r Registry, ty: &'r StructuredType) -> Self {
        Self { registry, ty }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    pub fn ty(&self) -> &'r StructuredType {
        self.ty
    }

    pub fn name(&self) -> &'r str {
        &self.ty.name
    }

    pub fn qualified_name(&self) -> String {
        self.ty.qualified_name()
    }

    pub fn parent(&self) -> Option<StructuredParser<'r>> {
        self.ty
            .parent
            .map(|id| StructuredParser::new(self.registry, self.registry.structured(id)))
    }

    pub fn children(&self) -> impl Iterator<Item = StructuredParser<'r>> + 'r {
        let registry = self.registry;
        self.ty
            .children
            .iter()
            .map(move |id| StructuredParser::new(registry, registry.structured(*id)))
    }

    /// Fields in declaration order, inherited ones first
    pub fn fields(&self, include_parents: bool) -> Vec<&'r FieldDef> {
        let mut fields = match (include_parents, self.parent()) {
            (true, Some(parent)) => parent.fields(true),
            _ => Vec::new(),
        };
        fields.extend(self.ty.fields.iter());
        fields
    }

    /// Parser for a field declared here or on any ancestor
    pub fn field(&self, name: &str) -> Option<FieldParser<'r>> {
        match self.ty.own_field(name) {
            Some(def) => Some(FieldParser::new(self.registry, def)),
            None => self.parent()?.field(name),
        }
    }

    /// Declared type name of a field, searching ancestors
    pub fn type_for(&self, name: &str) -> Option<&'r str> {
        self.field(name).map(|field| field.def().type_name.as_str())
    }

    /// Key fields across the inheritance chain, parent keys first
    pub fn keys(&self) -> Vec<&'r FieldDef> {
        self.fields(true).into_iter().filter(|f| f.key).collect()
    }

    /// True when neither this type nor any ancestor declares a key
    pub fn is_complex_type(&self) -> bool {
        self.keys().is_empty()
    }

    /// Extract the entity key from an attribute bag
    ///
    /// A single key field yields its scalar value; composite keys yield every
    /// component by field name, or nothing when any component is missing.
    pub fn resolve_key(&self, attrs: &Value) -> Option<EntityKey> {
        let keys = self.keys();
        let resolve = |def: &'r FieldDef| {
            FieldParser::new(self.registry, def)
                .resolve(attrs)
                .filter(|value| !value.is_null())
                .cloned()
        };

        match keys.as_slice() {
            [] => None,
            [key] => resolve(*key).map(EntityKey::Single),
            composite => composite
                .iter()
                .map(|key| resolve(*key).map(|value| (key.name.clone(), value)))
                .collect::<Option<Vec<_>>>()
                .map(EntityKey::Composite),
        }
    }

    /// Depth-first search over this parser and its descendants
    pub fn find<F>(&self, predicate: &F) -> Option<StructuredParser<'r>>
    where
        F: Fn(&StructuredParser<'r>) -> bool,
    {
        if predicate(self) {
            return Some(*self);
        }
        self.children().find_map(|child| child.find(predicate))
    }

    /// Descendant (or self) registered under `type_name`
    pub fn find_by_type(&self, type_name: &str) -> Option<StructuredParser<'r>> {
        let target = self.registry.find_structured_for_type(type_name)?.id;
        self.find(&|parser: &StructuredParser<'r>| parser.ty.id == target)
    }

    /// Most derived parser applicable to a value's `@odata.type` annotation
    pub fn for_value(&self, value: &Value) -> StructuredParser<'r> {
        let Some(annotated) = value.get(ODATA_TYPE).and_then(Value::as_str) else {
            return *self;
        };
        let type_name = annotated.trim_start_matches('#');
        match self.find_by_type(type_name) {
            Some(parser) => parser,
            None => {
                log::debug!(
                    "{} is not a subtype of {}, keeping base parser",
                    type_name,
                    self.qualified_name()
                );
                *self
            }
        }
    }

    /// Wire payload to in-memory value; absent fields with defaults are filled in
    pub fn deserialize(&self, value: Value, ctx: &ParseContext) -> Value {
        let value = match self.parent() {
            Some(parent) => parent.deserialize(value, ctx),
            None => value,
        };
        let mut map = match value {
            Value::Object(map) => map,
            other => return other,
        };

        for def in &self.ty.fields {
            let parser = FieldParser::new(self.registry, def);
            match map.get_mut(def.wire_name()) {
                Some(slot) if !slot.is_null() => {
                    let raw = slot.take();
                    *slot = parser.deserialize(raw, ctx);
                }
                Some(_) => {}
                None => {
                    if let Some(default) = &def.default {
                        map.insert(
                            def.wire_name().to_string(),
                            parser.deserialize(default.clone(), ctx),
                        );
                    }
                }
            }
        }
        Value::Object(map)
    }

    /// In-memory value to wire payload
    pub fn serialize(&self, value: Value, ctx: &ParseContext) -> Value {
        let value = match self.parent() {
            Some(parent) => parent.serialize(value, ctx),
            None => value,
        };
        let mut map = match value {
            Value::Object(map) => map,
            other => return other,
        };

        for def in &self.ty.fields {
            if let Some(slot) = map.get_mut(def.wire_name()) {
                if !slot.is_null() {
                    let raw = slot.take();
                    *slot = FieldParser::new(self.registry, def).serialize(raw, ctx);
                }
            }
        }
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiOptions;
    use crate::testing;
    use serde_json::json;

    #[test]
    fn test_person_deserializes() {
        let registry = testing::sample_registry();
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);

        let person = registry.structured_parser("Acme.Person").unwrap();
        let value = person.deserialize(json!({"id": 1, "name": "Ann"}), &ctx);
        assert_eq!(value, json!({"id": 1, "name": "Ann"}));
    }

    #[test]
    fn test_employee_deserializes_inherited_fields() {
        let registry = testing::sample_registry();
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);

        let employee = registry.structured_parser("Acme.Employee").unwrap();
        let value = employee.deserialize(json!({"id": 2, "name": "Bob", "salary": "5000.5"}), &ctx);
        assert_eq!(value, json!({"id": 2, "name": "Bob", "salary": 5000.5}));

        let names: Vec<&str> = employee.fields(true).iter().map(|f| f.name.as_str()).collect();
        assert_eq!(&names[..2], &["id", "name"]);
        assert!(names.contains(&"salary"));
        assert_eq!(employee.fields(false).len(), 2);
    }

    #[test]
    fn test_round_trip_through_inheritance_chain() {
        let registry = testing::sample_registry();
        let options = ApiOptions {
            ieee754_compatible: true,
            ..Default::default()
        };
        let ctx = ParseContext::new(&options);

        let manager = registry.structured_parser("Acme.Manager").unwrap();
        let original = json!({
            "id": 3,
            "name": "Cid",
            "salary": 7000.25,
            "hiredOn": "2020-01-02",
            "budget": 100000,
            "favoriteColors": [1, 2],
            "address": {"street": "Main", "city": "Springfield", "country": "US"}
        });

        let wire = manager.serialize(original.clone(), &ctx);
        assert_eq!(wire["salary"], json!("7000.25"));
        assert_eq!(wire["budget"], json!("100000"));
        assert_eq!(wire["favoriteColors"], json!(["Red", "Green"]));

        assert_eq!(manager.deserialize(wire, &ctx), original);

        let employee = registry.structured_parser("Acme.Employee").unwrap();
        let integral = json!({"id": 4, "name": "Dee", "salary": 5000});
        let wire = employee.serialize(integral.clone(), &ctx);
        assert_eq!(wire["salary"], json!("5000"));
        assert_eq!(employee.deserialize(wire, &ctx), integral);
    }

    #[test]
    fn test_defaults_fill_absent_fields_only() {
        let registry = testing::sample_registry();
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);

        let address = registry.structured_parser("Acme.Address").unwrap();
        assert_eq!(
            address.deserialize(json!({"city": "Paris"}), &ctx),
            json!({"city": "Paris", "country": "US"})
        );
        assert_eq!(
            address.deserialize(json!({"city": "Paris", "country": null}), &ctx),
            json!({"city": "Paris", "country": null})
        );
    }

    #[test]
    fn test_non_objects_pass_through() {
        let registry = testing::sample_registry();
        let options = ApiOptions::default();
        let ctx = ParseContext::new(&options);

        let person = registry.structured_parser("Acme.Person").unwrap();
        assert_eq!(person.deserialize(json!(42), &ctx), json!(42));
        assert_eq!(person.serialize(Value::Null, &ctx), Value::Null);
    }

    #[test]
    fn test_resolve_key_single() {
        let registry = testing::sample_registry();
        let person = registry.structured_parser("Acme.Person").unwrap();

        assert_eq!(
            person.resolve_key(&json!({"id": 1, "name": "Ann"})),
            Some(EntityKey::Single(json!(1)))
        );
        assert_eq!(person.resolve_key(&json!({"name": "Ann"})), None);
        assert_eq!(person.resolve_key(&json!({"id": null})), None);

        // Employee inherits its key from Person
        let employee = registry.structured_parser("Acme.Employee").unwrap();
        assert_eq!(
            employee.resolve_key(&json!({"id": 5})),
            Some(EntityKey::Single(json!(5)))
        );
    }

    #[test]
    fn test_resolve_key_composite() {
        let registry = testing::sample_registry();
        let line = registry.structured_parser("Acme.OrderLine").unwrap();

        assert_eq!(
            line.resolve_key(&json!({"order": {"id": 10}, "lineNo": 2})),
            Some(EntityKey::Composite(vec![
                ("orderId".to_string(), json!(10)),
                ("lineNo".to_string(), json!(2)),
            ]))
        );
        assert_eq!(line.resolve_key(&json!({"lineNo": 2})), None);
    }

    #[test]
    fn test_is_complex_type() {
        let registry = testing::sample_registry();
        assert!(registry.structured_parser("Acme.Address").unwrap().is_complex_type());
        assert!(!registry.structured_parser("Acme.Person").unwrap().is_complex_type());
        assert!(!registry.structured_parser("Acme.Manager").unwrap().is_complex_type());
    }

    #[test]
    fn test_find_most_derived_parser() {
        let registry = testing::sample_registry();
        let person = registry.structured_parser("Acme.Person").unwrap();

        let found = person.for_value(&json!({"@odata.type": "#Acme.Manager"}));
        assert_eq!(found.name(), "Manager");

        // Unrelated types keep the base parser
        let found = person.for_value(&json!({"@odata.type": "#Acme.Address"}));
        assert_eq!(found.name(), "Person");

        assert_eq!(person.type_for("name"), Some("Edm.String"));
        let manager = registry.structured_parser("Acme.Manager").unwrap();
        assert_eq!(manager.type_for("salary"), Some("Edm.Decimal"));
        assert_eq!(manager.type_for("nothing"), None);
    }
}
