//! Explicit selection context for property panes
//!
//! The host states what is selected; the core never infers it from which
//! selection happens to be set.

use serde::{Deserialize, Serialize};

use crate::model::{Attribute, Entity, Relationship, SchemaModel};

/// What the host has selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "context", rename_all = "lowercase")]
pub enum SelectionContext {
    Model,
    Entity { entity: String },
    Attribute { entity: String, attribute: String },
    Relationship { entity: String, relationship: String },
    /// Diagrams are a presentation concern and carry no model object
    Diagram { diagram: String },
}

/// Model object a selection resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selected<'a> {
    Model(&'a SchemaModel),
    Entity(&'a Entity),
    Attribute(&'a Entity, &'a Attribute),
    Relationship(&'a Entity, &'a Relationship),
}

impl SchemaModel {
    /// Resolve a selection against this model
    pub fn select(&self, context: &SelectionContext) -> Option<Selected<'_>> {
        match context {
            SelectionContext::Model => Some(Selected::Model(self)),
            SelectionContext::Entity { entity } => self.entity(entity).map(Selected::Entity),
            SelectionContext::Attribute { entity, attribute } => {
                let owner = self.entity(entity)?;
                owner
                    .find_attribute(attribute)
                    .map(|a| Selected::Attribute(owner, a))
            }
            SelectionContext::Relationship { entity, relationship } => {
                let owner = self.entity(entity)?;
                owner
                    .find_relationship(relationship)
                    .map(|r| Selected::Relationship(owner, r))
            }
            SelectionContext::Diagram { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cardinality, Constraint};

    fn model() -> SchemaModel {
        let customer = Entity::new("customer", "Customer")
            .with_attribute(Attribute::new("CustomerID", "INT").with_constraint(Constraint::PrimaryKey))
            .with_relationship(Relationship::new("places", "", "order", Cardinality::OneToMany));
        let order = Entity::new("order", "Order");
        SchemaModel::new("m", "Sales", "1", vec![customer, order]).unwrap()
    }

    #[test]
    fn resolves_each_context() {
        let model = model();

        assert!(matches!(model.select(&SelectionContext::Model), Some(Selected::Model(_))));
        assert!(matches!(
            model.select(&SelectionContext::Entity { entity: "Order".into() }),
            Some(Selected::Entity(e)) if e.id == "order"
        ));
        assert!(matches!(
            model.select(&SelectionContext::Attribute {
                entity: "Customer".into(),
                attribute: "CustomerID".into()
            }),
            Some(Selected::Attribute(_, a)) if a.is_primary_key()
        ));
        assert!(matches!(
            model.select(&SelectionContext::Relationship {
                entity: "Customer".into(),
                relationship: "places".into()
            }),
            Some(Selected::Relationship(_, r)) if r.target == "order"
        ));
        assert_eq!(model.select(&SelectionContext::Diagram { diagram: "d1".into() }), None);
        assert_eq!(model.select(&SelectionContext::Entity { entity: "Nope".into() }), None);
    }

    #[test]
    fn context_serialization() {
        let ctx: SelectionContext =
            serde_json::from_str(r#"{"context":"attribute","entity":"Order","attribute":"Status"}"#).unwrap();
        assert_eq!(
            ctx,
            SelectionContext::Attribute { entity: "Order".into(), attribute: "Status".into() }
        );
    }
}
