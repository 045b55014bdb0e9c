//! CSDL `$metadata` import
//!
//! Converts an OData v4 metadata document (EDMX/CSDL XML) into the same
//! [`SchemaConfig`] definitions a hand-written configuration produces.

use super::schema::{
    CallableConfig, CallableKind, ContainerConfig, EntitySetConfig, EnumConfig, FieldConfig,
    NavigationBindingConfig, ReturnTypeConfig, SchemaConfig, SingletonConfig,
    StructuredTypeConfig,
};
use anyhow::{Context, Result};
use roxmltree::{Document, Node};
use serde_json::Value;
use std::collections::HashSet;

/// Parse a `$metadata` document into schema definitions
pub fn parse_metadata(xml: &str) -> Result<Vec<SchemaConfig>> {
    let doc = Document::parse(xml).context("Failed to parse metadata XML")?;

    let mut schemas = Vec::new();
    let mut imports = Vec::new();

    for node in doc.descendants().filter(|n| is_element(n, "Schema")) {
        let namespace = node
            .attribute("Namespace")
            .context("Schema element without Namespace attribute")?;
        let mut schema = SchemaConfig::new(namespace);
        schema.alias = node.attribute("Alias").map(str::to_string);

        for child in node.children().filter(Node::is_element) {
            match child.tag_name().name() {
                "EnumType" => schema.enums.push(parse_enum(&child)?),
                "EntityType" | "ComplexType" => schema.entities.push(parse_structured(&child)?),
                "Action" => schema
                    .callables
                    .push(parse_callable(&child, CallableKind::Action)?),
                "Function" => schema
                    .callables
                    .push(parse_callable(&child, CallableKind::Function)?),
                "EntityContainer" => {
                    let (container, container_imports) = parse_container(&child)?;
                    schema.containers.push(container);
                    imports.extend(container_imports);
                }
                _ => {}
            }
        }

        log::debug!(
            "Imported schema {}: {} enums, {} structured types, {} callables",
            schema.namespace,
            schema.enums.len(),
            schema.entities.len(),
            schema.callables.len()
        );
        schemas.push(schema);
    }

    if schemas.is_empty() {
        anyhow::bail!("Metadata document contains no Schema elements");
    }

    apply_imports(&mut schemas, &imports);
    Ok(schemas)
}

/// Function or action import declared in an entity container
#[derive(Debug)]
struct CallableImport {
    name: String,
    target: String,
    entity_set: Option<String>,
}

fn is_element(node: &Node, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

fn required<'a>(node: &Node<'a, '_>, attribute: &str) -> Result<&'a str> {
    node.attribute(attribute).with_context(|| {
        format!(
            "{} element without {} attribute",
            node.tag_name().name(),
            attribute
        )
    })
}

fn parse_bool(node: &Node, attribute: &str, default: bool) -> bool {
    match node.attribute(attribute) {
        Some(value) => value.eq_ignore_ascii_case("true"),
        None => default,
    }
}

/// Split `Collection(Ns.Type)` into the element type and a collection flag
fn split_collection(type_name: &str) -> (String, bool) {
    match type_name
        .strip_prefix("Collection(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner.to_string(), true),
        None => (type_name.to_string(), false),
    }
}

fn parse_enum(node: &Node) -> Result<EnumConfig> {
    let mut config = EnumConfig::new(required(node, "Name")?);
    config.flags = parse_bool(node, "IsFlags", false);

    let mut next_value = if config.flags { 1 } else { 0 };
    for member in node.children().filter(|n| is_element(n, "Member")) {
        let name = required(&member, "Name")?;
        let value = match member.attribute("Value") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .with_context(|| format!("Invalid value '{}' for enum member {}", raw, name))?,
            None => next_value,
        };
        next_value = if config.flags { value.max(1) * 2 } else { value + 1 };
        config.members.insert(name.to_string(), value);
    }

    Ok(config)
}

fn parse_structured(node: &Node) -> Result<StructuredTypeConfig> {
    let mut config = StructuredTypeConfig::new(required(node, "Name")?);
    config.base = node.attribute("BaseType").map(str::to_string);
    config.open = parse_bool(node, "OpenType", false);

    let keys: HashSet<&str> = node
        .children()
        .filter(|n| is_element(n, "Key"))
        .flat_map(|key| key.children().filter(|n| is_element(n, "PropertyRef")))
        .filter_map(|property_ref| property_ref.attribute("Name"))
        .collect();

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "Property" => {
                let mut field = parse_field(&child)?;
                if keys.contains(field.name.as_str()) {
                    field.key = true;
                    field.nullable = false;
                }
                config.fields.push(field);
            }
            "NavigationProperty" => {
                let mut field = parse_field(&child)?;
                field.navigation = true;
                config.fields.push(field);
            }
            _ => {}
        }
    }

    Ok(config)
}

fn parse_field(node: &Node) -> Result<FieldConfig> {
    let (type_name, collection) = split_collection(required(node, "Type")?);
    let mut field = FieldConfig::new(required(node, "Name")?, type_name);
    field.collection = collection;
    field.nullable = parse_bool(node, "Nullable", true);
    field.max_length = node.attribute("MaxLength").and_then(|v| v.parse().ok());
    field.precision = node.attribute("Precision").and_then(|v| v.parse().ok());
    field.scale = node.attribute("Scale").and_then(|v| v.parse().ok());
    field.default = node
        .attribute("DefaultValue")
        .map(|raw| default_value(&field.type_name, raw));
    Ok(field)
}

/// Interpret a `DefaultValue` attribute according to the declared type
fn default_value(type_name: &str, raw: &str) -> Value {
    match type_name {
        "Edm.Boolean" => raw
            .parse::<bool>()
            .map(Value::Bool)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "Edm.Byte" | "Edm.SByte" | "Edm.Int16" | "Edm.Int32" | "Edm.Int64" => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(raw.to_string())),
        "Edm.Double" | "Edm.Single" | "Edm.Decimal" => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(raw.to_string())),
        _ => Value::String(raw.to_string()),
    }
}

fn parse_callable(node: &Node, kind: CallableKind) -> Result<CallableConfig> {
    let mut config = match kind {
        CallableKind::Action => CallableConfig::action(required(node, "Name")?),
        CallableKind::Function => CallableConfig::function(required(node, "Name")?),
    };
    config.bound = parse_bool(node, "IsBound", false);
    config.composable = parse_bool(node, "IsComposable", false);
    config.entity_set_path = node.attribute("EntitySetPath").map(str::to_string);

    // The binding parameter is addressed by the URL path, not the payload
    let skip = usize::from(config.bound);
    for parameter in node
        .children()
        .filter(|n| is_element(n, "Parameter"))
        .skip(skip)
    {
        config.parameters.push(parse_field(&parameter)?);
    }

    if let Some(return_type) = node.children().find(|n| is_element(n, "ReturnType")) {
        let (type_name, collection) = split_collection(required(&return_type, "Type")?);
        config.return_type = Some(ReturnTypeConfig {
            type_name,
            collection,
            nullable: parse_bool(&return_type, "Nullable", true),
        });
    }

    Ok(config)
}

fn parse_bindings(node: &Node) -> Vec<NavigationBindingConfig> {
    node.children()
        .filter(|n| is_element(n, "NavigationPropertyBinding"))
        .filter_map(|binding| {
            Some(NavigationBindingConfig {
                path: binding.attribute("Path")?.to_string(),
                target: binding.attribute("Target")?.to_string(),
            })
        })
        .collect()
}

fn parse_container(node: &Node) -> Result<(ContainerConfig, Vec<CallableImport>)> {
    let mut container = ContainerConfig::new(required(node, "Name")?);
    let mut imports = Vec::new();

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "EntitySet" => {
                let mut entity_set = EntitySetConfig::new(
                    required(&child, "Name")?,
                    required(&child, "EntityType")?,
                );
                entity_set.navigation_bindings = parse_bindings(&child);
                container.entity_sets.push(entity_set);
            }
            "Singleton" => {
                let mut singleton =
                    SingletonConfig::new(required(&child, "Name")?, required(&child, "Type")?);
                singleton.navigation_bindings = parse_bindings(&child);
                container.singletons.push(singleton);
            }
            "FunctionImport" => imports.push(CallableImport {
                name: required(&child, "Name")?.to_string(),
                target: required(&child, "Function")?.to_string(),
                entity_set: child.attribute("EntitySet").map(str::to_string),
            }),
            "ActionImport" => imports.push(CallableImport {
                name: required(&child, "Name")?.to_string(),
                target: required(&child, "Action")?.to_string(),
                entity_set: child.attribute("EntitySet").map(str::to_string),
            }),
            _ => {}
        }
    }

    Ok((container, imports))
}

/// Attach import names and entity sets to the unbound callables they expose
fn apply_imports(schemas: &mut [SchemaConfig], imports: &[CallableImport]) {
    for import in imports {
        let Some((namespace, name)) = import.target.rsplit_once('.') else {
            log::warn!("Ignoring import {} with unqualified target", import.name);
            continue;
        };

        let callable = schemas
            .iter_mut()
            .filter(|s| s.namespace == namespace || s.alias.as_deref() == Some(namespace))
            .flat_map(|s| s.callables.iter_mut())
            .find(|c| c.name == name && !c.bound);

        match callable {
            Some(callable) => {
                if import.name != callable.name {
                    callable.path = Some(import.name.clone());
                }
                if callable.entity_set_path.is_none() {
                    callable.entity_set_path = import.entity_set.clone();
                }
            }
            None => log::warn!(
                "Import {} targets unknown callable {}",
                import.name,
                import.target
            ),
        }
    }
}
