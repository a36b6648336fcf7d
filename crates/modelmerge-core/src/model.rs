//! Schema model types
//!
//! A [`SchemaModel`] is an immutable, validated snapshot of a logical data model.
//! The only way to obtain one is through [`SchemaModel::new`] (or the loaders
//! built on top of it), so every instance upholds the structural invariants:
//! unique entity names and ids, unique attribute names per entity, primary keys
//! never nullable, and relationships that resolve inside the same model.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::{ModelError, ModelResult};

/// Build the `Entity.Member` form used for attribute and relationship lookups
pub fn qualified_name(entity: &str, member: &str) -> String {
    format!("{}.{}", entity, member)
}

/// Constraint tag attached to an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Constraint {
    /// Part of the entity's primary key (implies NOT NULL)
    #[serde(alias = "PK")]
    PrimaryKey,

    /// References another entity's key
    #[serde(alias = "FK")]
    ForeignKey,

    /// Values must be unique
    #[serde(alias = "UQ")]
    Unique,

    /// Values must be present
    #[serde(alias = "NN")]
    NotNull,

    /// Check constraint
    Check,

    /// Indexed column
    #[serde(alias = "IX")]
    Index,
}

impl Constraint {
    /// Stable tag spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryKey => "PRIMARY_KEY",
            Self::ForeignKey => "FOREIGN_KEY",
            Self::Unique => "UNIQUE",
            Self::NotNull => "NOT_NULL",
            Self::Check => "CHECK",
            Self::Index => "INDEX",
        }
    }

    /// Whether this tag forces the attribute to be non-nullable
    pub fn implies_not_null(&self) -> bool {
        matches!(self, Self::PrimaryKey | Self::NotNull)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Constraint {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "PRIMARY_KEY" | "PK" => Ok(Self::PrimaryKey),
            "FOREIGN_KEY" | "FK" => Ok(Self::ForeignKey),
            "UNIQUE" | "UQ" => Ok(Self::Unique),
            "NOT_NULL" | "NN" => Ok(Self::NotNull),
            "CHECK" => Ok(Self::Check),
            "INDEX" | "IX" => Ok(Self::Index),
            _ => Err(ModelError::validation(format!("unknown constraint tag '{}'", s))),
        }
    }
}

/// Relationship cardinality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    #[serde(alias = "1:1")]
    OneToOne,

    #[serde(alias = "1:N")]
    OneToMany,

    #[serde(alias = "N:M", alias = "M:N")]
    ManyToMany,
}

impl Cardinality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneToOne => "one-to-one",
            Self::OneToMany => "one-to-many",
            Self::ManyToMany => "many-to-many",
        }
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Cardinality {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one-to-one" | "1:1" => Ok(Self::OneToOne),
            "one-to-many" | "1:n" => Ok(Self::OneToMany),
            "many-to-many" | "n:m" | "m:n" => Ok(Self::ManyToMany),
            _ => Err(ModelError::validation(format!("unknown cardinality '{}'", s))),
        }
    }
}

/// A column of an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name, unique within the owning entity
    pub name: String,

    /// Declared type, kept verbatim (e.g. `VARCHAR(50)`)
    #[serde(rename = "type")]
    pub data_type: String,

    /// Constraint tags
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub constraints: BTreeSet<Constraint>,

    /// Whether NULL is allowed
    pub nullable: bool,

    /// Optional domain reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Attribute {
    /// Create a nullable attribute without constraints
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            constraints: BTreeSet::new(),
            nullable: true,
            domain: None,
        }
    }

    /// Add a constraint tag; PRIMARY_KEY and NOT_NULL clear nullability
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        if constraint.implies_not_null() {
            self.nullable = false;
        }
        self.constraints.insert(constraint);
        self
    }

    /// Set nullability
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set domain reference
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraints.contains(&Constraint::PrimaryKey)
    }

    pub fn has_constraint(&self, constraint: Constraint) -> bool {
        self.constraints.contains(&constraint)
    }

    /// Check the attribute-level invariants
    pub fn validate(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() {
            return Err(ModelError::validation("attribute name must not be empty"));
        }

        if self.data_type.trim().is_empty() {
            return Err(ModelError::validation(format!(
                "attribute '{}' has an empty type",
                self.name
            )));
        }

        if self.nullable {
            if let Some(tag) = self.constraints.iter().find(|c| c.implies_not_null()) {
                return Err(ModelError::validation(format!(
                    "attribute '{}' is tagged {} but marked nullable",
                    self.name, tag
                )));
            }
        }

        Ok(())
    }

    /// One-line rendering used in reports and detail rows
    pub fn definition(&self) -> String {
        let mut parts = vec![self.data_type.clone()];
        parts.extend(
            self.constraints
                .iter()
                .filter(|c| **c != Constraint::NotNull)
                .map(|c| c.as_str().to_string()),
        );
        parts.push(if self.nullable { "NULL" } else { "NOT NULL" }.to_string());
        if let Some(domain) = &self.domain {
            parts.push(format!("[{}]", domain));
        }
        parts.join(" ")
    }
}

/// A directed relationship owned by its source entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// Name, unique among the source entity's relationships
    pub name: String,

    /// Source entity id
    pub source: String,

    /// Target entity id
    pub target: String,

    pub cardinality: Cardinality,

    /// Identifying relationships contribute to the target's compound key
    #[serde(default)]
    pub identifying: bool,
}

impl Relationship {
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        cardinality: Cardinality,
    ) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
            target: target.into(),
            cardinality,
            identifying: false,
        }
    }

    pub fn with_identifying(mut self, identifying: bool) -> Self {
        self.identifying = identifying;
        self
    }
}

/// An entity (table) in a schema model
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier, stable across snapshots of the same model
    pub id: String,

    /// Name, unique within the model
    pub name: String,

    /// Ordered attributes
    #[serde(default)]
    pub attributes: Vec<Attribute>,

    /// Outgoing relationships
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships: Vec<Relationship>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_attributes(mut self, attributes: Vec<Attribute>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Add an outgoing relationship; its source is set to this entity
    pub fn with_relationship(mut self, mut relationship: Relationship) -> Self {
        relationship.source = self.id.clone();
        self.relationships.push(relationship);
        self
    }

    /// Find an attribute by name
    pub fn find_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Find an outgoing relationship by name
    pub fn find_relationship(&self, name: &str) -> Option<&Relationship> {
        self.relationships.iter().find(|r| r.name == name)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    /// Attributes tagged PRIMARY_KEY, in declaration order
    pub fn primary_key(&self) -> Vec<&Attribute> {
        self.attributes.iter().filter(|a| a.is_primary_key()).collect()
    }

    /// Check entity-local invariants (relationship targets are checked by the model)
    pub fn validate(&self) -> ModelResult<()> {
        if self.id.trim().is_empty() {
            return Err(ModelError::validation(format!(
                "entity '{}' has an empty id",
                self.name
            )));
        }

        if self.name.trim().is_empty() {
            return Err(ModelError::validation(format!(
                "entity '{}' has an empty name",
                self.id
            )));
        }

        let mut seen = HashSet::new();
        for attribute in &self.attributes {
            attribute.validate().map_err(|e| match e {
                ModelError::Validation(msg) => {
                    ModelError::validation(format!("entity '{}': {}", self.name, msg))
                }
                other => other,
            })?;

            if !seen.insert(attribute.name.as_str()) {
                return Err(ModelError::validation(format!(
                    "duplicate attribute '{}'",
                    qualified_name(&self.name, &attribute.name)
                )));
            }
        }

        let mut seen = HashSet::new();
        for relationship in &self.relationships {
            if relationship.name.trim().is_empty() {
                return Err(ModelError::validation(format!(
                    "entity '{}' has a relationship with an empty name",
                    self.name
                )));
            }

            if !seen.insert(relationship.name.as_str()) {
                return Err(ModelError::validation(format!(
                    "duplicate relationship '{}'",
                    qualified_name(&self.name, &relationship.name)
                )));
            }

            if relationship.source != self.id {
                return Err(ModelError::validation(format!(
                    "relationship '{}' is owned by '{}' but its source is '{}'",
                    qualified_name(&self.name, &relationship.name),
                    self.id,
                    relationship.source
                )));
            }
        }

        Ok(())
    }
}

/// Identity of a model snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelHeader {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: String,
}

impl ModelHeader {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModelHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{} [{}]", self.name, self.id)
        } else {
            write!(f, "{} v{} [{}]", self.name, self.version, self.id)
        }
    }
}

/// Serialized shape of a schema model
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModelSnapshot {
    #[serde(flatten)]
    header: ModelHeader,
    #[serde(default)]
    entities: Vec<Entity>,
}

/// Validated, immutable schema snapshot with lookup indices
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ModelSnapshot", into = "ModelSnapshot")]
pub struct SchemaModel {
    header: ModelHeader,
    entities: Vec<Entity>,
    by_name: HashMap<String, usize>,
    by_id: HashMap<String, usize>,
}

impl SchemaModel {
    /// Build and validate a model
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
        entities: Vec<Entity>,
    ) -> ModelResult<Self> {
        Self::from_parts(ModelHeader::new(id, name, version), entities)
    }

    /// Build and validate a model from an existing header
    pub fn from_parts(header: ModelHeader, entities: Vec<Entity>) -> ModelResult<Self> {
        if header.id.trim().is_empty() {
            return Err(ModelError::validation("model id must not be empty"));
        }

        let mut by_name = HashMap::with_capacity(entities.len());
        let mut by_id = HashMap::with_capacity(entities.len());

        for (index, entity) in entities.iter().enumerate() {
            entity.validate()?;

            if by_name.insert(entity.name.clone(), index).is_some() {
                return Err(ModelError::validation(format!(
                    "duplicate entity name '{}' in model '{}'",
                    entity.name, header.id
                )));
            }

            if by_id.insert(entity.id.clone(), index).is_some() {
                return Err(ModelError::validation(format!(
                    "duplicate entity id '{}' in model '{}'",
                    entity.id, header.id
                )));
            }
        }

        for entity in &entities {
            for relationship in &entity.relationships {
                if !by_id.contains_key(&relationship.target) {
                    return Err(ModelError::dangling(
                        qualified_name(&entity.name, &relationship.name),
                        relationship.target.clone(),
                    ));
                }
            }
        }

        Ok(Self {
            header,
            entities,
            by_name,
            by_id,
        })
    }

    /// Parse a raw JSON description (see [`crate::load`]) into a validated model
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let raw: crate::load::RawSchemaModel = serde_json::from_str(json)?;
        crate::load::load_schema_model(raw)
    }

    /// Serialize to the normalized JSON shape
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn id(&self) -> &str {
        &self.header.id
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn version(&self) -> &str {
        &self.header.version
    }

    pub fn header(&self) -> &ModelHeader {
        &self.header
    }

    /// Entities in declaration order
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Look up an entity by name
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.by_name.get(name).map(|&i| &self.entities[i])
    }

    /// Look up an entity by id
    pub fn entity_by_id(&self, id: &str) -> Option<&Entity> {
        self.by_id.get(id).map(|&i| &self.entities[i])
    }

    /// Look up an attribute by its qualified `Entity.Attribute` name
    pub fn attribute(&self, qualified: &str) -> Option<&Attribute> {
        let (entity, attribute) = qualified.split_once('.')?;
        self.entity(entity)?.find_attribute(attribute)
    }

    /// Look up a relationship by its qualified `Entity.Relationship` name
    pub fn relationship(&self, qualified: &str) -> Option<&Relationship> {
        let (entity, relationship) = qualified.split_once('.')?;
        self.entity(entity)?.find_relationship(relationship)
    }

    /// Name of the entity a relationship points at
    pub fn target_name(&self, relationship: &Relationship) -> Option<&str> {
        self.entity_by_id(&relationship.target).map(|e| e.name.as_str())
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn attribute_count(&self) -> usize {
        self.entities.iter().map(|e| e.attributes.len()).sum()
    }

    pub fn relationship_count(&self) -> usize {
        self.entities.iter().map(|e| e.relationships.len()).sum()
    }

    /// Relationships from any entity that point at `entity_id`
    pub fn incoming(&self, entity_id: &str) -> Vec<(&Entity, &Relationship)> {
        self.entities
            .iter()
            .flat_map(|e| e.relationships.iter().map(move |r| (e, r)))
            .filter(|(_, r)| r.target == entity_id)
            .collect()
    }
}

impl PartialEq for SchemaModel {
    fn eq(&self, other: &Self) -> bool {
        self.header == other.header && self.entities == other.entities
    }
}

impl Eq for SchemaModel {}

impl TryFrom<ModelSnapshot> for SchemaModel {
    type Error = ModelError;

    fn try_from(snapshot: ModelSnapshot) -> Result<Self, Self::Error> {
        Self::from_parts(snapshot.header, snapshot.entities)
    }
}

impl From<SchemaModel> for ModelSnapshot {
    fn from(model: SchemaModel) -> Self {
        Self {
            header: model.header,
            entities: model.entities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer() -> Entity {
        Entity::new("customer", "Customer").with_attributes(vec![
            Attribute::new("CustomerID", "INT").with_constraint(Constraint::PrimaryKey),
            Attribute::new("FirstName", "VARCHAR(50)"),
            Attribute::new("Email", "VARCHAR(100)").with_constraint(Constraint::Unique),
        ])
    }

    fn order() -> Entity {
        Entity::new("order", "Order")
            .with_attribute(Attribute::new("OrderID", "INT").with_constraint(Constraint::PrimaryKey))
            .with_attribute(Attribute::new("CustomerID", "INT").with_constraint(Constraint::ForeignKey))
    }

    #[test]
    fn primary_key_implies_not_null() {
        let attr = Attribute::new("id", "INT").with_constraint(Constraint::PrimaryKey);
        assert!(!attr.nullable);
        assert!(attr.validate().is_ok());

        let broken = attr.with_nullable(true);
        assert!(matches!(broken.validate(), Err(ModelError::Validation(_))));
    }

    #[test]
    fn constraint_parsing_accepts_short_forms() {
        assert_eq!("PK".parse::<Constraint>().unwrap(), Constraint::PrimaryKey);
        assert_eq!("fk".parse::<Constraint>().unwrap(), Constraint::ForeignKey);
        assert_eq!("not null".parse::<Constraint>().unwrap(), Constraint::NotNull);
        assert!("SPARSE".parse::<Constraint>().is_err());
    }

    #[test]
    fn cardinality_parsing() {
        assert_eq!("1:N".parse::<Cardinality>().unwrap(), Cardinality::OneToMany);
        assert_eq!("many-to-many".parse::<Cardinality>().unwrap(), Cardinality::ManyToMany);
        assert!("lots".parse::<Cardinality>().is_err());
    }

    #[test]
    fn model_lookups() {
        let customer = customer()
            .with_relationship(Relationship::new("places", "", "order", Cardinality::OneToMany));
        let model = SchemaModel::new("m1", "Sales", "1.0", vec![customer, order()]).unwrap();

        assert_eq!(model.entity_names(), vec!["Customer", "Order"]);
        assert!(model.entity("Customer").is_some());
        assert!(model.entity_by_id("order").is_some());
        assert_eq!(model.attribute("Customer.Email").unwrap().data_type, "VARCHAR(100)");
        assert!(model.attribute("Customer.Missing").is_none());
        assert_eq!(model.relationship("Customer.places").unwrap().source, "customer");
        assert_eq!(model.incoming("order").len(), 1);
        assert_eq!(model.attribute_count(), 5);
        assert_eq!(model.relationship_count(), 1);
    }

    #[test]
    fn duplicate_entity_name_rejected() {
        let err = SchemaModel::new(
            "m1",
            "Sales",
            "1.0",
            vec![customer(), Entity::new("customer2", "Customer")],
        )
        .unwrap_err();

        assert!(matches!(err, ModelError::Validation(_)));
    }

    #[test]
    fn duplicate_attribute_rejected() {
        let entity = customer().with_attribute(Attribute::new("Email", "TEXT"));
        let err = SchemaModel::new("m1", "Sales", "1.0", vec![entity]).unwrap_err();
        assert!(err.to_string().contains("Customer.Email"));
    }

    #[test]
    fn dangling_relationship_rejected() {
        let customer = customer()
            .with_relationship(Relationship::new("places", "", "invoice", Cardinality::OneToMany));
        let err = SchemaModel::new("m1", "Sales", "1.0", vec![customer]).unwrap_err();

        assert_eq!(
            err,
            ModelError::DanglingReference {
                relationship: "Customer.places".to_string(),
                entity: "invoice".to_string(),
            }
        );
    }

    #[test]
    fn serde_goes_through_validation() {
        let model = SchemaModel::new("m1", "Sales", "1.0", vec![customer(), order()]).unwrap();
        let json = model.to_json().unwrap();
        let parsed: SchemaModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model, parsed);
        assert!(parsed.entity("Order").is_some());

        let invalid = r#"{"id":"m","name":"M","entities":[
            {"id":"a","name":"A","attributes":[]},
            {"id":"b","name":"A","attributes":[]}]}"#;
        assert!(serde_json::from_str::<SchemaModel>(invalid).is_err());
    }

    #[test]
    fn attribute_definition_rendering() {
        let attr = Attribute::new("CustomerID", "INT")
            .with_constraint(Constraint::PrimaryKey)
            .with_domain("ID");
        assert_eq!(attr.definition(), "INT PRIMARY_KEY NOT NULL [ID]");
        assert_eq!(Attribute::new("Email", "VARCHAR(100)").definition(), "VARCHAR(100) NULL");
    }
}
