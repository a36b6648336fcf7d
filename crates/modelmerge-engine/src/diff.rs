//! Diff engine for comparing two schema snapshots
//!
//! For every entity pair produced by the matcher this computes the field-level
//! differences of matched attributes and relationships, plus membership
//! conflicts for one-sided members. Results follow the matcher's order exactly,
//! so identical inputs always produce identical output.
//!
//! Type strings are compared verbatim: `DECIMAL(10,2)` and `DECIMAL(12,2)` are
//! simply different strings, and no precision/scale parsing is attempted.

use modelmerge_core::{
    entity_fingerprint, qualified_name, Attribute, CompareConfig, ComparisonResult,
    ComparisonStatus, Conflict, ConflictCode, DetailRow, Entity, ObjectKind, Relationship,
    SchemaModel, Severity,
};

use crate::matcher::{match_attributes, match_entities, match_relationships, Pair};

/// Computes comparison results under a configuration
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine<'c> {
    config: &'c CompareConfig,
}

impl<'c> DiffEngine<'c> {
    pub fn new(config: &'c CompareConfig) -> Self {
        Self { config }
    }

    /// Compare two models, one result per entity pair
    pub fn compare(&self, left: &SchemaModel, right: &SchemaModel) -> Vec<ComparisonResult> {
        match_entities(left, right, &self.config.ignore)
            .into_iter()
            .map(|pair| self.compare_entity_pair(left, right, pair))
            .collect()
    }

    fn compare_entity_pair(
        &self,
        left_model: &SchemaModel,
        right_model: &SchemaModel,
        pair: Pair<'_, Entity>,
    ) -> ComparisonResult {
        let name = pair.name();
        let left_fp = pair.left.map(|e| entity_fingerprint(left_model, e));
        let right_fp = pair.right.map(|e| entity_fingerprint(right_model, e));

        let conflicts = match (pair.left, pair.right) {
            (Some(_), Some(_)) if left_fp == right_fp => {
                tracing::debug!(entity = name, "fingerprints match, skipping field diff");
                Vec::new()
            }
            (Some(l), Some(r)) => self.diff_entities(left_model, l, right_model, r),
            (None, Some(_)) => vec![self.conflict(
                ConflictCode::EntityAdded,
                name,
                "entity only exists in right model".to_string(),
            )],
            (Some(_), None) => vec![self.conflict(
                ConflictCode::EntityRemoved,
                name,
                "entity only exists in left model".to_string(),
            )],
            (None, None) => Vec::new(),
        };

        ComparisonResult::new(
            ObjectKind::Entity,
            name,
            pair.left.is_some(),
            pair.right.is_some(),
            conflicts,
        )
        .with_fingerprints(left_fp, right_fp)
    }

    /// Conflicts between two versions of the same entity
    ///
    /// Attribute conflicts come first (in matcher order), then relationship
    /// conflicts.
    pub fn diff_entities(
        &self,
        left_model: &SchemaModel,
        left: &Entity,
        right_model: &SchemaModel,
        right: &Entity,
    ) -> Vec<Conflict> {
        let entity = left.name.as_str();
        let mut conflicts = Vec::new();

        for pair in match_attributes(entity, Some(left), Some(right), &self.config.ignore) {
            conflicts.extend(self.attribute_pair_conflicts(entity, pair));
        }

        if self.config.compare_relationships {
            for pair in match_relationships(Some(left), Some(right)) {
                conflicts.extend(self.relationship_pair_conflicts(
                    entity,
                    left_model,
                    right_model,
                    pair,
                ));
            }
        }

        tracing::debug!(entity, conflicts = conflicts.len(), "entity diffed");
        conflicts
    }

    fn attribute_pair_conflicts(&self, entity: &str, pair: Pair<'_, Attribute>) -> Vec<Conflict> {
        let subject = qualified_name(entity, pair.name());

        match (pair.left, pair.right) {
            (Some(l), Some(r)) => self.diff_attribute(entity, l, r),
            (None, Some(r)) => vec![self
                .conflict(
                    ConflictCode::AttributeAdded,
                    &subject,
                    format!("attribute added in right model: {}", r.name),
                )
                .with_values(None, Some(r.definition()))],
            (Some(l), None) => vec![self
                .conflict(
                    ConflictCode::AttributeRemoved,
                    &subject,
                    format!("attribute removed in right model: {}", l.name),
                )
                .with_values(Some(l.definition()), None)],
            (None, None) => Vec::new(),
        }
    }

    /// Field-level differences of one attribute, in fixed order:
    /// type, nullability, constraints, domain
    pub fn diff_attribute(&self, entity: &str, left: &Attribute, right: &Attribute) -> Vec<Conflict> {
        let subject = qualified_name(entity, &left.name);
        let mut conflicts = Vec::new();

        if left.data_type != right.data_type {
            conflicts.push(
                self.conflict(
                    ConflictCode::TypeChanged,
                    &subject,
                    format!("type changed from {} to {}", left.data_type, right.data_type),
                )
                .with_values(Some(left.data_type.clone()), Some(right.data_type.clone())),
            );
        }

        if left.nullable != right.nullable {
            let describe = |nullable: bool| if nullable { "NULL" } else { "NOT NULL" };
            // NULL -> NOT NULL can reject existing rows
            let default = if left.nullable { Severity::Error } else { Severity::Warn };
            conflicts.push(
                self.conflict_with_severity(
                    ConflictCode::NullabilityChanged,
                    &subject,
                    format!(
                        "nullability changed from {} to {}",
                        describe(left.nullable),
                        describe(right.nullable)
                    ),
                    default,
                )
                .with_values(
                    Some(describe(left.nullable).to_string()),
                    Some(describe(right.nullable).to_string()),
                ),
            );
        }

        for added in right.constraints.difference(&left.constraints) {
            conflicts.push(
                self.conflict(
                    ConflictCode::ConstraintAdded,
                    &subject,
                    format!("constraint added: {}", added),
                )
                .with_values(None, Some(added.to_string())),
            );
        }

        for removed in left.constraints.difference(&right.constraints) {
            conflicts.push(
                self.conflict(
                    ConflictCode::ConstraintRemoved,
                    &subject,
                    format!("constraint removed: {}", removed),
                )
                .with_values(Some(removed.to_string()), None),
            );
        }

        if self.config.compare_domains && left.domain != right.domain {
            let describe = |d: &Option<String>| d.clone().unwrap_or_else(|| "none".to_string());
            conflicts.push(
                self.conflict(
                    ConflictCode::DomainChanged,
                    &subject,
                    format!(
                        "domain changed from {} to {}",
                        describe(&left.domain),
                        describe(&right.domain)
                    ),
                )
                .with_values(left.domain.clone(), right.domain.clone()),
            );
        }

        conflicts
    }

    fn relationship_pair_conflicts(
        &self,
        entity: &str,
        left_model: &SchemaModel,
        right_model: &SchemaModel,
        pair: Pair<'_, Relationship>,
    ) -> Vec<Conflict> {
        let subject = qualified_name(entity, pair.name());

        match (pair.left, pair.right) {
            (Some(l), Some(r)) => self.diff_relationship(&subject, left_model, l, right_model, r),
            (None, Some(r)) => vec![self
                .conflict(
                    ConflictCode::RelationshipAdded,
                    &subject,
                    format!("relationship added in right model: {}", r.name),
                )
                .with_values(None, Some(relationship_definition(right_model, r)))],
            (Some(l), None) => vec![self
                .conflict(
                    ConflictCode::RelationshipRemoved,
                    &subject,
                    format!("relationship removed in right model: {}", l.name),
                )
                .with_values(Some(relationship_definition(left_model, l)), None)],
            (None, None) => Vec::new(),
        }
    }

    fn diff_relationship(
        &self,
        subject: &str,
        left_model: &SchemaModel,
        left: &Relationship,
        right_model: &SchemaModel,
        right: &Relationship,
    ) -> Vec<Conflict> {
        let mut conflicts = Vec::new();

        if left.cardinality != right.cardinality {
            conflicts.push(
                self.conflict(
                    ConflictCode::RelationshipCardinalityChanged,
                    subject,
                    format!(
                        "cardinality changed from {} to {}",
                        left.cardinality, right.cardinality
                    ),
                )
                .with_values(Some(left.cardinality.to_string()), Some(right.cardinality.to_string())),
            );
        }

        if left.identifying != right.identifying {
            let describe = |identifying: bool| {
                if identifying { "identifying" } else { "non-identifying" }
            };
            conflicts.push(
                self.conflict(
                    ConflictCode::RelationshipIdentifyingChanged,
                    subject,
                    format!(
                        "relationship changed from {} to {}",
                        describe(left.identifying),
                        describe(right.identifying)
                    ),
                )
                .with_values(
                    Some(describe(left.identifying).to_string()),
                    Some(describe(right.identifying).to_string()),
                ),
            );
        }

        let left_target = left_model.target_name(left).unwrap_or(left.target.as_str());
        let right_target = right_model.target_name(right).unwrap_or(right.target.as_str());
        if left_target != right_target {
            conflicts.push(
                self.conflict(
                    ConflictCode::RelationshipTargetChanged,
                    subject,
                    format!("target changed from {} to {}", left_target, right_target),
                )
                .with_values(Some(left_target.to_string()), Some(right_target.to_string())),
            );
        }

        conflicts
    }

    /// Drill-down rows for one entity pair: attributes, then relationships
    pub fn detail_rows(
        &self,
        left_model: &SchemaModel,
        right_model: &SchemaModel,
        entity: &str,
    ) -> Vec<DetailRow> {
        let left = left_model.entity(entity);
        let right = right_model.entity(entity);
        let mut rows = Vec::new();

        for pair in match_attributes(entity, left, right, &self.config.ignore) {
            let conflicts = self.attribute_pair_conflicts(entity, pair);
            rows.push(DetailRow {
                kind: ObjectKind::Attribute,
                name: qualified_name(entity, pair.name()),
                status: ComparisonStatus::classify(
                    pair.left.is_some(),
                    pair.right.is_some(),
                    !conflicts.is_empty(),
                ),
                left: pair.left.map(Attribute::definition),
                right: pair.right.map(Attribute::definition),
                conflicts,
            });
        }

        if self.config.compare_relationships {
            for pair in match_relationships(left, right) {
                let conflicts =
                    self.relationship_pair_conflicts(entity, left_model, right_model, pair);
                rows.push(DetailRow {
                    kind: ObjectKind::Relationship,
                    name: qualified_name(entity, pair.name()),
                    status: ComparisonStatus::classify(
                        pair.left.is_some(),
                        pair.right.is_some(),
                        !conflicts.is_empty(),
                    ),
                    left: pair.left.map(|r| relationship_definition(left_model, r)),
                    right: pair.right.map(|r| relationship_definition(right_model, r)),
                    conflicts,
                });
            }
        }

        rows
    }

    fn conflict(&self, code: ConflictCode, subject: &str, message: String) -> Conflict {
        self.conflict_with_severity(code, subject, message, code.default_severity())
    }

    fn conflict_with_severity(
        &self,
        code: ConflictCode,
        subject: &str,
        message: String,
        default: Severity,
    ) -> Conflict {
        Conflict::new(code, subject, message)
            .with_severity(self.config.severity.get_severity(code, default))
    }
}

/// One-line rendering of a relationship, e.g. `places -> Order (one-to-many)`
pub fn relationship_definition(model: &SchemaModel, relationship: &Relationship) -> String {
    let target = model
        .target_name(relationship)
        .unwrap_or(relationship.target.as_str());
    let identifying = if relationship.identifying { ", identifying" } else { "" };
    format!(
        "{} -> {} ({}{})",
        relationship.name, target, relationship.cardinality, identifying
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use modelmerge_core::{Cardinality, Constraint};

    fn customer() -> Entity {
        Entity::new("customer", "Customer").with_attributes(vec![
            Attribute::new("CustomerID", "INT").with_constraint(Constraint::PrimaryKey),
            Attribute::new("FirstName", "VARCHAR(50)"),
            Attribute::new("LastName", "VARCHAR(50)"),
            Attribute::new("Email", "VARCHAR(100)"),
        ])
    }

    fn model(id: &str, entities: Vec<Entity>) -> SchemaModel {
        SchemaModel::new(id, id, "1", entities).unwrap()
    }

    #[test]
    fn test_identical_entities() {
        let config = CompareConfig::default();
        let left = model("left", vec![customer()]);
        let right = model("right", vec![customer()]);

        let results = DiffEngine::new(&config).compare(&left, &right);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, ComparisonStatus::Same);
        assert!(results[0].conflicts.is_empty());
        assert_eq!(results[0].left_fingerprint, results[0].right_fingerprint);
    }

    #[test]
    fn test_attribute_field_order() {
        let config = CompareConfig::default();
        let engine = DiffEngine::new(&config);

        let left = Attribute::new("Email", "VARCHAR(100)").with_domain("EmailAddress");
        let right = Attribute::new("Email", "VARCHAR(255)")
            .with_constraint(Constraint::NotNull)
            .with_constraint(Constraint::Unique)
            .with_domain("Contact");

        let conflicts = engine.diff_attribute("Customer", &left, &right);
        let codes: Vec<ConflictCode> = conflicts.iter().map(|c| c.code).collect();

        assert_eq!(
            codes,
            vec![
                ConflictCode::TypeChanged,
                ConflictCode::NullabilityChanged,
                ConflictCode::ConstraintAdded,
                ConflictCode::ConstraintAdded,
                ConflictCode::DomainChanged,
            ]
        );
        assert_eq!(conflicts[0].message, "type changed from VARCHAR(100) to VARCHAR(255)");
        assert_eq!(conflicts[1].severity, Severity::Error, "tightening nullability is breaking");
        assert_eq!(conflicts[2].message, "constraint added: UNIQUE");
        assert_eq!(conflicts[3].message, "constraint added: NOT_NULL");
        assert!(conflicts.iter().all(|c| c.subject == "Customer.Email"));
    }

    #[test]
    fn test_domains_can_be_ignored() {
        let config = CompareConfig {
            compare_domains: false,
            ..CompareConfig::default()
        };
        let left = Attribute::new("Email", "TEXT").with_domain("A");
        let right = Attribute::new("Email", "TEXT").with_domain("B");

        assert!(DiffEngine::new(&config).diff_attribute("Customer", &left, &right).is_empty());
    }

    #[test]
    fn test_severity_override() {
        let mut config = CompareConfig::default();
        config
            .severity
            .set_override(ConflictCode::AttributeAdded, Severity::Error);

        let left = model("left", vec![customer()]);
        let right = model(
            "right",
            vec![customer().with_attribute(Attribute::new("PhoneNumber", "VARCHAR(20)"))],
        );

        let results = DiffEngine::new(&config).compare(&left, &right);
        assert_eq!(results[0].conflicts[0].severity, Severity::Error);
    }

    #[test]
    fn test_relationship_changes() {
        let config = CompareConfig::default();
        let order = Entity::new("order", "Order");
        let invoice = Entity::new("invoice", "Invoice");

        let left = model(
            "left",
            vec![
                customer()
                    .with_relationship(Relationship::new("places", "", "order", Cardinality::OneToMany))
                    .with_relationship(Relationship::new("owns", "", "order", Cardinality::OneToOne)),
                order.clone(),
                invoice.clone(),
            ],
        );
        let right = model(
            "right",
            vec![
                customer()
                    .with_relationship(
                        Relationship::new("places", "", "invoice", Cardinality::ManyToMany)
                            .with_identifying(true),
                    )
                    .with_relationship(Relationship::new("bills", "", "invoice", Cardinality::OneToMany)),
                order,
                invoice,
            ],
        );

        let results = DiffEngine::new(&config).compare(&left, &right);
        let customer = &results[0];
        let codes: Vec<ConflictCode> = customer.conflicts.iter().map(|c| c.code).collect();

        assert_eq!(customer.status, ComparisonStatus::Different);
        assert_eq!(
            codes,
            vec![
                ConflictCode::RelationshipCardinalityChanged,
                ConflictCode::RelationshipIdentifyingChanged,
                ConflictCode::RelationshipTargetChanged,
                ConflictCode::RelationshipRemoved,
                ConflictCode::RelationshipAdded,
            ]
        );
        assert_eq!(customer.conflicts[2].message, "target changed from Order to Invoice");
        assert_eq!(customer.conflicts[4].message, "relationship added in right model: bills");

        let without = CompareConfig {
            compare_relationships: false,
            ..CompareConfig::default()
        };
        let results = DiffEngine::new(&without).compare(&left, &right);
        assert!(results[0].conflicts.is_empty());
        assert_eq!(results[0].status, ComparisonStatus::Same);
    }

    #[test]
    fn test_detail_rows() {
        let config = CompareConfig::default();
        let left = model("left", vec![customer()]);
        let right = model(
            "right",
            vec![Entity::new("customer", "Customer").with_attributes(vec![
                Attribute::new("CustomerID", "BIGINT").with_constraint(Constraint::PrimaryKey),
                Attribute::new("FirstName", "VARCHAR(50)"),
                Attribute::new("LastName", "VARCHAR(50)"),
                Attribute::new("PhoneNumber", "VARCHAR(20)"),
            ])],
        );

        let rows = DiffEngine::new(&config).detail_rows(&left, &right, "Customer");
        let summary: Vec<(&str, ComparisonStatus)> =
            rows.iter().map(|r| (r.name.as_str(), r.status)).collect();

        assert_eq!(
            summary,
            vec![
                ("Customer.CustomerID", ComparisonStatus::Different),
                ("Customer.FirstName", ComparisonStatus::Same),
                ("Customer.LastName", ComparisonStatus::Same),
                ("Customer.Email", ComparisonStatus::Removed),
                ("Customer.PhoneNumber", ComparisonStatus::New),
            ]
        );
        assert_eq!(rows[0].left.as_deref(), Some("INT PRIMARY_KEY NOT NULL"));
        assert_eq!(rows[0].right.as_deref(), Some("BIGINT PRIMARY_KEY NOT NULL"));
        assert_eq!(rows[4].left, None);
    }

    #[test]
    fn test_relationship_definition() {
        let m = model(
            "m",
            vec![
                customer().with_relationship(
                    Relationship::new("places", "", "order", Cardinality::OneToMany).with_identifying(true),
                ),
                Entity::new("order", "Order"),
            ],
        );
        let rel = m.relationship("Customer.places").unwrap();
        assert_eq!(relationship_definition(&m, rel), "places -> Order (one-to-many, identifying)");
    }
}
