//! Linked type definitions held by the [`Registry`](super::Registry)

use crate::config::{
    CallableConfig, CallableKind, EnumConfig, FieldConfig, NavigationBindingConfig,
    StructuredTypeConfig,
};
use crate::parsers::EdmType;
use serde_json::Value;

/// Index of an enum type in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnumId(pub(crate) usize);

/// Index of a structured type in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructId(pub(crate) usize);

/// Index of a callable in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallableId(pub(crate) usize);

/// Resolved parser for a type name
///
/// `None` is the passthrough parser used for anything that did not resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParserRef {
    #[default]
    None,
    Primitive(EdmType),
    Enum(EnumId),
    Structured(StructId),
    Callable(CallableId),
}

impl ParserRef {
    pub fn is_none(&self) -> bool {
        matches!(self, ParserRef::None)
    }
}

/// Enumeration type
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub id: EnumId,
    pub namespace: String,
    pub name: String,
    /// Members ordered by value
    pub members: Vec<(String, i64)>,
    pub flags: bool,
}

impl EnumType {
    pub(crate) fn from_config(id: EnumId, namespace: &str, config: EnumConfig) -> Self {
        let mut members: Vec<(String, i64)> = config.members.into_iter().collect();
        members.sort_by_key(|(_, value)| *value);
        Self {
            id,
            namespace: namespace.to_string(),
            name: config.name,
            members,
            flags: config.flags,
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn member_value(&self, name: &str) -> Option<i64> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(_, value)| *value)
    }

    pub fn member_name(&self, value: i64) -> Option<&str> {
        self.members
            .iter()
            .find(|(_, v)| *v == value)
            .map(|(member, _)| member.as_str())
    }
}

/// Field of a structured type or parameter of a callable
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub type_name: String,
    pub collection: bool,
    pub nullable: bool,
    pub key: bool,
    pub navigation: bool,
    pub default: Option<Value>,
    pub max_length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub field: Option<String>,
    pub reference: Option<String>,
    /// Parser for `type_name`, filled in by `configure`
    pub parser: ParserRef,
}

impl FieldDef {
    pub fn from_config(config: &FieldConfig) -> Self {
        Self {
            name: config.name.clone(),
            type_name: config.type_name.clone(),
            collection: config.collection,
            nullable: config.nullable && !config.key,
            key: config.key,
            navigation: config.navigation,
            default: config.default.clone(),
            max_length: config.max_length,
            precision: config.precision,
            scale: config.scale,
            field: config.field.clone(),
            reference: config.reference.clone(),
            parser: ParserRef::None,
        }
    }

    /// Name of the property in wire payloads
    pub fn wire_name(&self) -> &str {
        self.field.as_deref().unwrap_or(&self.name)
    }

    /// Path used to locate a key value inside an attribute bag
    pub fn key_path(&self) -> &str {
        self.reference.as_deref().unwrap_or(&self.name)
    }
}

/// Entity or complex type with its position in the inheritance tree
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredType {
    pub id: StructId,
    pub namespace: String,
    pub name: String,
    pub base: Option<String>,
    pub open: bool,
    pub parent: Option<StructId>,
    pub children: Vec<StructId>,
    /// Fields declared by this type only
    pub fields: Vec<FieldDef>,
}

impl StructuredType {
    pub(crate) fn from_config(id: StructId, namespace: &str, config: StructuredTypeConfig) -> Self {
        Self {
            id,
            namespace: namespace.to_string(),
            name: config.name,
            base: config.base,
            open: config.open,
            parent: None,
            children: Vec::new(),
            fields: config.fields.iter().map(FieldDef::from_config).collect(),
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    /// Own field by name or wire name
    pub fn own_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields
            .iter()
            .find(|f| f.name == name || f.wire_name() == name)
    }
}

/// Declared return type of a callable
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnDef {
    pub type_name: String,
    pub collection: bool,
    pub nullable: bool,
    pub parser: ParserRef,
}

/// Action or function
#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    pub id: CallableId,
    pub namespace: String,
    pub name: String,
    pub kind: CallableKind,
    pub bound: bool,
    pub composable: bool,
    /// URL path segment used to invoke the callable
    pub path: String,
    pub entity_set_path: Option<String>,
    pub parameters: Vec<FieldDef>,
    pub return_type: Option<ReturnDef>,
}

impl Callable {
    pub(crate) fn from_config(id: CallableId, namespace: &str, config: CallableConfig) -> Self {
        let path = match &config.path {
            Some(path) => path.clone(),
            None if config.bound => format!("{}.{}", namespace, config.name),
            None => config.name.clone(),
        };
        Self {
            id,
            namespace: namespace.to_string(),
            path,
            kind: config.kind,
            bound: config.bound,
            composable: config.composable,
            entity_set_path: config.entity_set_path,
            parameters: config.parameters.iter().map(FieldDef::from_config).collect(),
            return_type: config.return_type.map(|ret| ReturnDef {
                type_name: ret.type_name,
                collection: ret.collection,
                nullable: ret.nullable,
                parser: ParserRef::None,
            }),
            name: config.name,
        }
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn is_function(&self) -> bool {
        self.kind == CallableKind::Function
    }
}

/// Entity set exposed by a container
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySet {
    pub namespace: String,
    pub container: String,
    pub name: String,
    pub entity_type: String,
    pub entity: Option<StructId>,
    pub navigation_bindings: Vec<NavigationBindingConfig>,
}

impl EntitySet {
    /// Target entity set bound to a navigation property path
    pub fn binding_target(&self, path: &str) -> Option<&str> {
        self.navigation_bindings
            .iter()
            .find(|b| b.path == path)
            .map(|b| b.target.as_str())
    }
}

/// Singleton exposed by a container
#[derive(Debug, Clone, PartialEq)]
pub struct Singleton {
    pub namespace: String,
    pub container: String,
    pub name: String,
    pub type_name: String,
    pub entity: Option<StructId>,
    pub navigation_bindings: Vec<NavigationBindingConfig>,
}

/// Where an unresolved type name was referenced from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    BaseType,
    Field,
    Parameter,
    ReturnType,
    EntitySet,
    Singleton,
    /// Lookup made while building resources or parsing responses
    Lookup,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReferenceKind::BaseType => "base type",
            ReferenceKind::Field => "field",
            ReferenceKind::Parameter => "parameter",
            ReferenceKind::ReturnType => "return type",
            ReferenceKind::EntitySet => "entity set",
            ReferenceKind::Singleton => "singleton",
            ReferenceKind::Lookup => "lookup",
        };
        f.write_str(name)
    }
}

/// A type reference that degraded to the passthrough parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Qualified name of the referencing definition (e.g. "Acme.Person.home")
    pub owner: String,
    pub type_name: String,
    pub kind: ReferenceKind,
}

impl UnresolvedReference {
    pub fn new(
        owner: impl Into<String>,
        type_name: impl Into<String>,
        kind: ReferenceKind,
    ) -> Self {
        Self {
            owner: owner.into(),
            type_name: type_name.into(),
            kind,
        }
    }
}

impl std::fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} references unknown type '{}'",
            self.kind, self.owner, self.type_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callable_path_derivation() {
        let unbound = Callable::from_config(
            CallableId(0),
            "Acme",
            CallableConfig::function("GetTopPerson"),
        );
        assert_eq!(unbound.path, "GetTopPerson");

        let bound = Callable::from_config(
            CallableId(1),
            "Acme",
            CallableConfig::action("Promote").bound(),
        );
        assert_eq!(bound.path, "Acme.Promote");

        let explicit = Callable::from_config(
            CallableId(2),
            "Acme",
            CallableConfig::function("GetTopPerson").path("TopPerson"),
        );
        assert_eq!(explicit.path, "TopPerson");
    }

    #[test]
    fn test_enum_members_sorted_by_value() {
        let config = EnumConfig::new("Color")
            .member("Red", 1)
            .member("Blue", 4)
            .member("Green", 2);
        let color = EnumType::from_config(EnumId(0), "Acme", config);

        let names: Vec<&str> = color.members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Red", "Green", "Blue"]);
        assert_eq!(color.member_value("Green"), Some(2));
        assert_eq!(color.member_name(4), Some("Blue"));
        assert_eq!(color.qualified_name(), "Acme.Color");
    }

    #[test]
    fn test_field_names() {
        let mut config = FieldConfig::new("ownerId", "Edm.Int32").reference("owner/id");
        config.field = Some("_owner_value".into());
        let field = FieldDef::from_config(&config);

        assert_eq!(field.wire_name(), "_owner_value");
        assert_eq!(field.key_path(), "owner/id");
    }
}
