//! The linked type registry

use super::types::{
    Callable, CallableId, EntitySet, EnumId, EnumType, ParserRef, ReferenceKind, Singleton,
    StructId, StructuredType, UnresolvedReference,
};
use crate::constants::EDM_PREFIX;
use crate::parsers::{CallableParser, EdmType, StructuredParser, TypeParser};
use std::collections::HashMap;
use std::sync::RwLock;

/// Definitions of one namespace
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub namespace: String,
    pub alias: Option<String>,
    pub(crate) enums: HashMap<String, EnumId>,
    pub(crate) structs: HashMap<String, StructId>,
    pub(crate) callables: HashMap<String, Vec<CallableId>>,
    pub entity_sets: Vec<EntitySet>,
    pub singletons: Vec<Singleton>,
}

impl Schema {
    pub(crate) fn new(namespace: String, alias: Option<String>) -> Self {
        Self {
            namespace,
            alias,
            enums: HashMap::new(),
            structs: HashMap::new(),
            callables: HashMap::new(),
            entity_sets: Vec::new(),
            singletons: Vec::new(),
        }
    }

    /// Check whether the namespace or alias qualifies `type_name`
    pub fn is_namespace_of(&self, type_name: &str) -> bool {
        self.local_name(type_name).is_some()
    }

    /// Strip the namespace (or alias) qualifier from a type name
    pub fn local_name<'t>(&self, type_name: &'t str) -> Option<&'t str> {
        let strip = |prefix: &str| {
            type_name
                .strip_prefix(prefix)
                .and_then(|rest| rest.strip_prefix('.'))
                .filter(|rest| !rest.is_empty())
        };
        strip(&self.namespace).or_else(|| self.alias.as_deref().and_then(strip))
    }
}

/// Fully linked index of every registered type
///
/// Built by [`RegistryBuilder::configure`](super::RegistryBuilder::configure)
/// and immutable afterwards apart from the diagnostics list, which also
/// collects lookup misses made at runtime.
#[derive(Debug, Default)]
pub struct Registry {
    pub(crate) schemas: Vec<Schema>,
    pub(crate) enums: Vec<EnumType>,
    pub(crate) structs: Vec<StructuredType>,
    pub(crate) callables: Vec<Callable>,
    pub(crate) unresolved: RwLock<Vec<UnresolvedReference>>,
}

impl Registry {
    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    pub fn enum_type(&self, id: EnumId) -> &EnumType {
        &self.enums[id.0]
    }

    pub fn structured(&self, id: StructId) -> &StructuredType {
        &self.structs[id.0]
    }

    pub fn callable(&self, id: CallableId) -> &Callable {
        &self.callables[id.0]
    }

    /// Schema whose namespace or alias qualifies `type_name`; longest namespace wins
    pub fn find_schema_for_type(&self, type_name: &str) -> Option<&Schema> {
        self.schemas
            .iter()
            .filter(|schema| schema.is_namespace_of(type_name))
            .fold(None, |best: Option<&Schema>, schema| match best {
                Some(current) if current.namespace.len() >= schema.namespace.len() => Some(current),
                _ => Some(schema),
            })
    }

    pub fn find_enum_for_type(&self, type_name: &str) -> Option<&EnumType> {
        let schema = self.find_schema_for_type(type_name)?;
        let id = schema.enums.get(schema.local_name(type_name)?)?;
        Some(self.enum_type(*id))
    }

    pub fn find_structured_for_type(&self, type_name: &str) -> Option<&StructuredType> {
        let schema = self.find_schema_for_type(type_name)?;
        let id = schema.structs.get(schema.local_name(type_name)?)?;
        Some(self.structured(*id))
    }

    /// First callable registered under `type_name` (overloads share a name)
    pub fn find_callable_for_type(&self, type_name: &str) -> Option<&Callable> {
        let schema = self.find_schema_for_type(type_name)?;
        let ids = schema.callables.get(schema.local_name(type_name)?)?;
        ids.first().map(|id| self.callable(*id))
    }

    /// Entity set whose entity type is `type_name`
    pub fn find_entity_set_for_type(&self, type_name: &str) -> Option<&EntitySet> {
        let id = self.find_structured_for_type(type_name)?.id;
        self.schemas
            .iter()
            .flat_map(|schema| schema.entity_sets.iter())
            .find(|set| set.entity == Some(id))
    }

    /// Resolve a type name to a parser
    ///
    /// `Edm.*` names map to the built-in primitives; anything else is tried as
    /// an enum, then a structured type, then a callable. Misses yield
    /// [`ParserRef::None`].
    pub fn find_parser_for_type(&self, type_name: &str) -> ParserRef {
        if type_name.starts_with(EDM_PREFIX) {
            return EdmType::from_name(type_name)
                .map(ParserRef::Primitive)
                .unwrap_or(ParserRef::None);
        }
        if let Some(enum_type) = self.find_enum_for_type(type_name) {
            return ParserRef::Enum(enum_type.id);
        }
        if let Some(structured) = self.find_structured_for_type(type_name) {
            return ParserRef::Structured(structured.id);
        }
        if let Some(callable) = self.find_callable_for_type(type_name) {
            return ParserRef::Callable(callable.id);
        }
        ParserRef::None
    }

    pub fn find_enum_by_name(&self, name: &str) -> Option<&EnumType> {
        self.enums
            .iter()
            .find(|e| e.name == name || e.qualified_name() == name)
    }

    pub fn find_structured_by_name(&self, name: &str) -> Option<&StructuredType> {
        self.structs
            .iter()
            .find(|s| s.name == name || s.qualified_name() == name)
    }

    pub fn find_callable_by_name(&self, name: &str) -> Option<&Callable> {
        self.callables
            .iter()
            .find(|c| c.name == name || c.qualified_name() == name || c.path == name)
    }

    pub fn find_entity_set_by_name(&self, name: &str) -> Option<&EntitySet> {
        self.schemas
            .iter()
            .flat_map(|schema| schema.entity_sets.iter())
            .find(|set| set.name == name)
    }

    pub fn find_singleton_by_name(&self, name: &str) -> Option<&Singleton> {
        self.schemas
            .iter()
            .flat_map(|schema| schema.singletons.iter())
            .find(|singleton| singleton.name == name)
    }

    /// Parser view for a resolved reference
    pub fn parser(&self, parser: ParserRef) -> TypeParser<'_> {
        match parser {
            ParserRef::None => TypeParser::None,
            ParserRef::Primitive(edm) => TypeParser::Primitive(edm),
            ParserRef::Enum(id) => TypeParser::for_enum(self.enum_type(id)),
            ParserRef::Structured(id) => {
                TypeParser::Structured(StructuredParser::new(self, self.structured(id)))
            }
            ParserRef::Callable(id) => {
                TypeParser::Callable(CallableParser::new(self, self.callable(id)))
            }
        }
    }

    /// Parser view for a type name, recording a miss when it does not resolve
    pub fn parser_for_type(&self, type_name: &str) -> TypeParser<'_> {
        let parser = self.find_parser_for_type(type_name);
        if parser.is_none() {
            self.record_miss(UnresolvedReference::new(
                type_name,
                type_name,
                ReferenceKind::Lookup,
            ));
        }
        self.parser(parser)
    }

    /// Structured parser for an entity or complex type name
    pub fn structured_parser(&self, type_name: &str) -> Option<StructuredParser<'_>> {
        match self.find_structured_for_type(type_name) {
            Some(structured) => Some(StructuredParser::new(self, structured)),
            None => {
                self.record_miss(UnresolvedReference::new(
                    type_name,
                    type_name,
                    ReferenceKind::Lookup,
                ));
                None
            }
        }
    }

    /// Every reference that degraded to the passthrough parser
    pub fn unresolved(&self) -> Vec<UnresolvedReference> {
        self.unresolved
            .read()
            .map(|list| list.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub(crate) fn record_miss(&self, miss: UnresolvedReference) {
        let mut list = self
            .unresolved
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !list.contains(&miss) {
            log::warn!("Unresolved {}", miss);
            list.push(miss);
        }
    }
}
