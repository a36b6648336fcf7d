//! Test fixtures for comparison sessions
//!
//! A small order-management schema in two versions. `v12` is the baseline;
//! `v13` differs from it in the ways the integration tests exercise:
//! - Customer gains PhoneNumber VARCHAR(20)
//! - Order.TotalAmount widens from DECIMAL(10,2) to DECIMAL(12,2)
//! - Product is new and OrderItem references it
#![allow(dead_code)]

use modelmerge_core::{Attribute, Cardinality, Constraint, Entity, Relationship, SchemaModel};

/// Customer with CustomerID PK, FirstName, LastName, Email
pub fn customer() -> Entity {
    Entity::new("ent_customer", "Customer")
        .with_attributes(vec![
            Attribute::new("CustomerID", "INT").with_constraint(Constraint::PrimaryKey),
            Attribute::new("FirstName", "VARCHAR(50)").with_nullable(false),
            Attribute::new("LastName", "VARCHAR(50)").with_nullable(false),
            Attribute::new("Email", "VARCHAR(100)").with_domain("EmailAddress"),
        ])
        .with_relationship(Relationship::new(
            "places",
            "ent_customer",
            "ent_order",
            Cardinality::OneToMany,
        ))
}

pub fn order(total_type: &str) -> Entity {
    Entity::new("ent_order", "Order")
        .with_attributes(vec![
            Attribute::new("OrderID", "INT").with_constraint(Constraint::PrimaryKey),
            Attribute::new("CustomerID", "INT")
                .with_constraint(Constraint::ForeignKey)
                .with_nullable(false),
            Attribute::new("OrderDate", "DATE").with_nullable(false),
            Attribute::new("TotalAmount", total_type),
        ])
        .with_relationship(
            Relationship::new("contains", "ent_order", "ent_order_item", Cardinality::OneToMany)
                .with_identifying(true),
        )
}

pub fn order_item() -> Entity {
    Entity::new("ent_order_item", "OrderItem").with_attributes(vec![
        Attribute::new("OrderID", "INT").with_constraint(Constraint::PrimaryKey),
        Attribute::new("LineNumber", "INT").with_constraint(Constraint::PrimaryKey),
        Attribute::new("Quantity", "INT").with_nullable(false),
    ])
}

pub fn product() -> Entity {
    Entity::new("ent_product", "Product").with_attributes(vec![
        Attribute::new("ProductID", "INT").with_constraint(Constraint::PrimaryKey),
        Attribute::new("Name", "VARCHAR(100)").with_nullable(false),
        Attribute::new("UnitPrice", "DECIMAL(10,2)"),
    ])
}

/// Baseline schema, version 1.2
pub fn v12() -> SchemaModel {
    SchemaModel::new(
        "customer_db_v12",
        "CustomerDB",
        "1.2",
        vec![customer(), order("DECIMAL(10,2)"), order_item()],
    )
    .expect("v1.2 fixture is valid")
}

/// Revised schema, version 1.3
pub fn v13() -> SchemaModel {
    let customer = customer().with_attribute(Attribute::new("PhoneNumber", "VARCHAR(20)"));
    let order_item = order_item()
        .with_attribute(Attribute::new("ProductID", "INT").with_constraint(Constraint::ForeignKey))
        .with_relationship(Relationship::new(
            "refers_to",
            "ent_order_item",
            "ent_product",
            Cardinality::OneToOne,
        ));

    SchemaModel::new(
        "customer_db_v13",
        "CustomerDB",
        "1.3",
        vec![customer, order("DECIMAL(12,2)"), order_item, product()],
    )
    .expect("v1.3 fixture is valid")
}

/// Same content as `model`, under a different id
pub fn copy_of(model: &SchemaModel, id: &str) -> SchemaModel {
    SchemaModel::new(id, model.name(), model.version(), model.entities().to_vec())
        .expect("copy of a valid model is valid")
}

/// Model with a single entity, its relationships dropped
pub fn single(id: &str, entity: Entity) -> SchemaModel {
    let entity = Entity {
        relationships: Vec::new(),
        ..entity
    };
    SchemaModel::new(id, "Single", "1", vec![entity]).expect("single-entity fixture is valid")
}

/// Raw JSON description of the v1.2 schema, in the loader's input format
pub const V12_JSON: &str = r#"{
    "id": "customer_db_v12",
    "name": "CustomerDB",
    "version": "1.2",
    "entities": [
        {
            "id": "ent_customer",
            "name": "Customer",
            "attributes": [
                { "name": "CustomerID", "type": "INT", "constraints": ["PK"] },
                { "name": "FirstName", "type": "VARCHAR(50)", "nullable": false },
                { "name": "LastName", "type": "VARCHAR(50)", "nullable": false },
                { "name": "Email", "type": "VARCHAR(100)", "domain": "EmailAddress" }
            ]
        },
        {
            "id": "ent_order",
            "name": "Order",
            "attributes": [
                { "name": "OrderID", "type": "INT", "constraints": ["PK"] },
                { "name": "CustomerID", "type": "INT", "constraints": ["FK"], "nullable": false },
                { "name": "OrderDate", "type": "DATE", "nullable": false },
                { "name": "TotalAmount", "type": "DECIMAL(10,2)" }
            ]
        },
        {
            "id": "ent_order_item",
            "name": "OrderItem",
            "attributes": [
                { "name": "OrderID", "type": "INT", "constraints": ["PK"] },
                { "name": "LineNumber", "type": "INT", "constraints": ["PK"] },
                { "name": "Quantity", "type": "INT", "nullable": false }
            ]
        }
    ],
    "relationships": [
        { "id": "rel_places", "name": "places", "from": "Customer", "to": "ent_order", "cardinality": "1:N" },
        { "id": "rel_contains", "name": "contains", "from": "ent_order", "to": "OrderItem", "type": "1:N", "identifying": true }
    ]
}"#;
