//! Structural fingerprints
//!
//! A fingerprint is a SHA-256 digest over everything the diff engine looks at.
//! Relationship targets are hashed by entity *name*, so the same structure in two
//! snapshots with different entity ids produces the same fingerprint.

use sha2::{Digest, Sha256};

use crate::model::{Entity, SchemaModel};

const FIELD: u8 = 0x1f;
const RECORD: u8 = 0x1e;

/// Fingerprint of one entity, resolved against its owning model
pub fn entity_fingerprint(model: &SchemaModel, entity: &Entity) -> String {
    let mut hasher = Sha256::new();
    write_entity(&mut hasher, model, entity);
    hex::encode(hasher.finalize())
}

/// Fingerprint of a whole model (entity order included, header excluded)
pub fn model_fingerprint(model: &SchemaModel) -> String {
    let mut hasher = Sha256::new();
    for entity in model.entities() {
        write_entity(&mut hasher, model, entity);
        hasher.update([RECORD, RECORD]);
    }
    hex::encode(hasher.finalize())
}

fn write_entity(hasher: &mut Sha256, model: &SchemaModel, entity: &Entity) {
    field(hasher, &entity.name);
    hasher.update([RECORD]);

    for attribute in &entity.attributes {
        field(hasher, "A");
        field(hasher, &attribute.name);
        field(hasher, &attribute.data_type);
        for constraint in &attribute.constraints {
            field(hasher, constraint.as_str());
        }
        field(hasher, if attribute.nullable { "NULL" } else { "NOT NULL" });
        field(hasher, attribute.domain.as_deref().unwrap_or(""));
        hasher.update([RECORD]);
    }

    for relationship in &entity.relationships {
        field(hasher, "R");
        field(hasher, &relationship.name);
        field(hasher, model.target_name(relationship).unwrap_or(relationship.target.as_str()));
        field(hasher, relationship.cardinality.as_str());
        field(hasher, if relationship.identifying { "identifying" } else { "non-identifying" });
        hasher.update([RECORD]);
    }
}

fn field(hasher: &mut Sha256, value: &str) {
    hasher.update(value.as_bytes());
    hasher.update([FIELD]);
}
