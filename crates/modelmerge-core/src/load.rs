//! Loading schema models from raw descriptions
//!
//! Importers (DDL parsers, diagram files, catalog introspection) hand the core a
//! [`RawSchemaModel`], which mirrors the diagram editor's interchange format:
//! relationships are listed at model level with `from`/`to` entity ids, constraint
//! tags may use short spellings and nullability may be omitted. Layout-only keys
//! such as `x`, `y` and `color` are accepted and dropped.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::error::{ModelError, ModelResult};
use crate::model::{Attribute, Cardinality, Constraint, Entity, ModelHeader, Relationship, SchemaModel};

/// Raw model description as produced by an importer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSchemaModel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub entities: Vec<RawEntity>,
    #[serde(default)]
    pub relationships: Vec<RawRelationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    /// Defaults to the entity name
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default)]
    pub constraints: Vec<String>,
    #[serde(default)]
    pub nullable: Option<bool>,
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRelationship {
    pub id: String,
    /// Defaults to the id
    #[serde(default)]
    pub name: Option<String>,
    pub from: String,
    pub to: String,
    /// Long form, e.g. `one-to-many`
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Short form, e.g. `1:N`
    #[serde(default)]
    pub cardinality: Option<String>,
    #[serde(default)]
    pub identifying: bool,
}

/// Normalize and validate a raw description into a [`SchemaModel`]
pub fn load_schema_model(raw: RawSchemaModel) -> ModelResult<SchemaModel> {
    let mut entities = raw
        .entities
        .into_iter()
        .map(load_entity)
        .collect::<ModelResult<Vec<_>>>()?;

    // Endpoints may name an entity by id or by name; ids win on collision.
    let mut ids: HashMap<String, String> = entities
        .iter()
        .map(|e| (e.name.clone(), e.id.clone()))
        .collect();
    ids.extend(entities.iter().map(|e| (e.id.clone(), e.id.clone())));

    for raw_rel in raw.relationships {
        let relationship = load_relationship(raw_rel, &ids)?;
        let owner = entities
            .iter_mut()
            .find(|e| e.id == relationship.source)
            .ok_or_else(|| ModelError::dangling(relationship.name.clone(), relationship.source.clone()))?;
        owner.relationships.push(relationship);
    }

    SchemaModel::from_parts(ModelHeader::new(raw.id, raw.name, raw.version), entities)
}

fn load_entity(raw: RawEntity) -> ModelResult<Entity> {
    let attributes = raw
        .attributes
        .into_iter()
        .map(|a| load_attribute(&raw.name, a))
        .collect::<ModelResult<Vec<_>>>()?;

    Ok(Entity {
        id: raw.id.unwrap_or_else(|| raw.name.clone()),
        name: raw.name,
        attributes,
        relationships: Vec::new(),
    })
}

fn load_attribute(entity: &str, raw: RawAttribute) -> ModelResult<Attribute> {
    let constraints = raw
        .constraints
        .iter()
        .map(|tag| {
            tag.parse::<Constraint>().map_err(|_| {
                ModelError::validation(format!(
                    "{}.{}: unknown constraint tag '{}'",
                    entity, raw.name, tag
                ))
            })
        })
        .collect::<ModelResult<BTreeSet<_>>>()?;

    let implied_not_null = constraints.iter().any(|c| c.implies_not_null());
    let nullable = match raw.nullable {
        Some(true) if implied_not_null => {
            return Err(ModelError::validation(format!(
                "{}.{} is a key or NOT NULL column but declared nullable",
                entity, raw.name
            )));
        }
        Some(nullable) => nullable,
        None => !implied_not_null,
    };

    Ok(Attribute {
        name: raw.name,
        data_type: raw.data_type.trim().to_string(),
        constraints,
        nullable,
        domain: raw.domain.filter(|d| !d.trim().is_empty()),
    })
}

fn load_relationship(raw: RawRelationship, ids: &HashMap<String, String>) -> ModelResult<Relationship> {
    let name = raw.name.unwrap_or_else(|| raw.id.clone());

    let cardinality = match (raw.kind.as_deref(), raw.cardinality.as_deref()) {
        (Some(kind), Some(short)) => {
            let long: Cardinality = kind.parse()?;
            let short: Cardinality = short.parse()?;
            if long != short {
                return Err(ModelError::validation(format!(
                    "relationship '{}' declares type {} but cardinality {}",
                    name, long, short
                )));
            }
            long
        }
        (Some(value), None) | (None, Some(value)) => value.parse()?,
        (None, None) => {
            return Err(ModelError::validation(format!(
                "relationship '{}' has no cardinality",
                name
            )));
        }
    };

    let source = ids
        .get(&raw.from)
        .cloned()
        .ok_or_else(|| ModelError::dangling(name.clone(), raw.from.clone()))?;
    let target = ids
        .get(&raw.to)
        .cloned()
        .ok_or_else(|| ModelError::dangling(name.clone(), raw.to.clone()))?;

    Ok(Relationship {
        name,
        source,
        target,
        cardinality,
        identifying: raw.identifying,
    })
}
