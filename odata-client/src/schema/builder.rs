//! Two-phase registry construction
//!
//! `register_schema` only indexes raw definitions. `configure` links base
//! types and resolves every field, parameter and return type to a parser.

use super::registry::{Registry, Schema};
use super::types::{
    Callable, CallableId, EntitySet, EnumId, EnumType, ReferenceKind, Singleton, StructId,
    StructuredType, UnresolvedReference,
};
use crate::config::SchemaConfig;
use crate::error::ODataError;
use std::collections::HashSet;
use std::sync::RwLock;

/// Collects schema definitions before linking
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    schemas: Vec<SchemaConfig>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema definition; forward references are allowed
    pub fn register_schema(&mut self, config: SchemaConfig) -> &mut Self {
        log::debug!("Registering schema {}", config.namespace);
        self.schemas.push(config);
        self
    }

    pub fn with_schema(mut self, config: SchemaConfig) -> Self {
        self.register_schema(config);
        self
    }

    pub fn with_schemas(mut self, configs: impl IntoIterator<Item = SchemaConfig>) -> Self {
        for config in configs {
            self.register_schema(config);
        }
        self
    }

    /// Link all registered definitions into a [`Registry`]
    ///
    /// Fails on duplicate namespaces or type names and on inheritance cycles.
    /// Type names that do not resolve are tolerated and listed by
    /// [`Registry::unresolved`].
    pub fn configure(self) -> Result<Registry, ODataError> {
        let mut registry = index(self.schemas)?;
        let mut unresolved = Vec::new();

        link_parents(&mut registry, &mut unresolved);
        check_cycles(&registry)?;
        link_children(&mut registry);
        resolve_fields(&mut registry, &mut unresolved);
        resolve_callables(&mut registry, &mut unresolved);
        resolve_containers(&mut registry, &mut unresolved);

        for miss in &unresolved {
            log::warn!("Unresolved {}", miss);
        }
        log::info!(
            "Configured {} schemas: {} enums, {} structured types, {} callables ({} unresolved references)",
            registry.schemas.len(),
            registry.enums.len(),
            registry.structs.len(),
            registry.callables.len(),
            unresolved.len()
        );

        registry.unresolved = RwLock::new(unresolved);
        Ok(registry)
    }
}

fn index(configs: Vec<SchemaConfig>) -> Result<Registry, ODataError> {
    let mut registry = Registry::default();
    let mut namespaces = HashSet::new();

    for config in configs {
        let namespace = config.namespace.clone();
        if !namespaces.insert(namespace.clone()) {
            return Err(ODataError::configuration(format!(
                "namespace {} is registered twice",
                namespace
            )));
        }
        let mut schema = Schema::new(namespace.clone(), config.alias.clone());

        for enum_config in config.enums {
            let id = EnumId(registry.enums.len());
            if schema.enums.insert(enum_config.name.clone(), id).is_some() {
                return Err(duplicate(&namespace, &enum_config.name));
            }
            registry
                .enums
                .push(EnumType::from_config(id, &namespace, enum_config));
        }

        for struct_config in config.entities {
            let id = StructId(registry.structs.len());
            if schema.structs.insert(struct_config.name.clone(), id).is_some() {
                return Err(duplicate(&namespace, &struct_config.name));
            }
            registry
                .structs
                .push(StructuredType::from_config(id, &namespace, struct_config));
        }

        for callable_config in config.callables {
            let id = CallableId(registry.callables.len());
            schema
                .callables
                .entry(callable_config.name.clone())
                .or_default()
                .push(id);
            registry
                .callables
                .push(Callable::from_config(id, &namespace, callable_config));
        }

        for container in config.containers {
            for set in container.entity_sets {
                schema.entity_sets.push(EntitySet {
                    namespace: namespace.clone(),
                    container: container.name.clone(),
                    name: set.name,
                    entity_type: set.entity_type,
                    entity: None,
                    navigation_bindings: set.navigation_bindings,
                });
            }
            for singleton in container.singletons {
                schema.singletons.push(Singleton {
                    namespace: namespace.clone(),
                    container: container.name.clone(),
                    name: singleton.name,
                    type_name: singleton.type_name,
                    entity: None,
                    navigation_bindings: singleton.navigation_bindings,
                });
            }
        }

        registry.schemas.push(schema);
    }

    Ok(registry)
}

fn duplicate(namespace: &str, name: &str) -> ODataError {
    ODataError::configuration(format!("type {}.{} is declared twice", namespace, name))
}

fn link_parents(registry: &mut Registry, unresolved: &mut Vec<UnresolvedReference>) {
    for idx in 0..registry.structs.len() {
        let Some(base) = registry.structs[idx].base.clone() else {
            continue;
        };
        let parent = registry.find_structured_for_type(&base).map(|s| s.id);
        match parent {
            Some(parent) => registry.structs[idx].parent = Some(parent),
            None => unresolved.push(UnresolvedReference::new(
                registry.structs[idx].qualified_name(),
                base,
                ReferenceKind::BaseType,
            )),
        }
    }
}

fn check_cycles(registry: &Registry) -> Result<(), ODataError> {
    for structured in &registry.structs {
        let mut seen = HashSet::new();
        let mut current = Some(structured.id);
        while let Some(id) = current {
            if !seen.insert(id) {
                return Err(ODataError::configuration(format!(
                    "inheritance cycle involving {}",
                    structured.qualified_name()
                )));
            }
            current = registry.structured(id).parent;
        }
    }
    Ok(())
}

fn link_children(registry: &mut Registry) {
    for idx in 0..registry.structs.len() {
        if let Some(parent) = registry.structs[idx].parent {
            let child = registry.structs[idx].id;
            log::debug!(
                "Linked {} to base {}",
                registry.structs[idx].qualified_name(),
                registry.structs[parent.0].qualified_name()
            );
            registry.structs[parent.0].children.push(child);
        }
    }
}

fn resolve_fields(registry: &mut Registry, unresolved: &mut Vec<UnresolvedReference>) {
    for idx in 0..registry.structs.len() {
        for f in 0..registry.structs[idx].fields.len() {
            let type_name = registry.structs[idx].fields[f].type_name.clone();
            let parser = registry.find_parser_for_type(&type_name);
            if parser.is_none() {
                unresolved.push(UnresolvedReference::new(
                    format!(
                        "{}.{}",
                        registry.structs[idx].qualified_name(),
                        registry.structs[idx].fields[f].name
                    ),
                    type_name,
                    ReferenceKind::Field,
                ));
            }
            registry.structs[idx].fields[f].parser = parser;
        }
    }
}

fn resolve_callables(registry: &mut Registry, unresolved: &mut Vec<UnresolvedReference>) {
    for idx in 0..registry.callables.len() {
        for p in 0..registry.callables[idx].parameters.len() {
            let type_name = registry.callables[idx].parameters[p].type_name.clone();
            let parser = registry.find_parser_for_type(&type_name);
            if parser.is_none() {
                unresolved.push(UnresolvedReference::new(
                    format!(
                        "{}({})",
                        registry.callables[idx].qualified_name(),
                        registry.callables[idx].parameters[p].name
                    ),
                    type_name,
                    ReferenceKind::Parameter,
                ));
            }
            registry.callables[idx].parameters[p].parser = parser;
        }

        let Some(type_name) = registry.callables[idx]
            .return_type
            .as_ref()
            .map(|ret| ret.type_name.clone())
        else {
            continue;
        };
        let parser = registry.find_parser_for_type(&type_name);
        if parser.is_none() {
            unresolved.push(UnresolvedReference::new(
                registry.callables[idx].qualified_name(),
                type_name,
                ReferenceKind::ReturnType,
            ));
        }
        if let Some(ret) = registry.callables[idx].return_type.as_mut() {
            ret.parser = parser;
        }
    }
}

fn resolve_containers(registry: &mut Registry, unresolved: &mut Vec<UnresolvedReference>) {
    for s in 0..registry.schemas.len() {
        for e in 0..registry.schemas[s].entity_sets.len() {
            let type_name = registry.schemas[s].entity_sets[e].entity_type.clone();
            let entity = registry.find_structured_for_type(&type_name).map(|t| t.id);
            if entity.is_none() {
                unresolved.push(UnresolvedReference::new(
                    registry.schemas[s].entity_sets[e].name.clone(),
                    type_name,
                    ReferenceKind::EntitySet,
                ));
            }
            registry.schemas[s].entity_sets[e].entity = entity;
        }
        for i in 0..registry.schemas[s].singletons.len() {
            let type_name = registry.schemas[s].singletons[i].type_name.clone();
            let entity = registry.find_structured_for_type(&type_name).map(|t| t.id);
            if entity.is_none() {
                unresolved.push(UnresolvedReference::new(
                    registry.schemas[s].singletons[i].name.clone(),
                    type_name,
                    ReferenceKind::Singleton,
                ));
            }
            registry.schemas[s].singletons[i].entity = entity;
        }
    }
}
