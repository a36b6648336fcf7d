//! Name-based matching of objects between two snapshots
//!
//! Pairs are emitted in a fixed order: left objects in their original order
//! (matched or left-only), then right-only objects in right's original order.
//! Matching is exact and case-sensitive. If a name occurs more than once, the
//! first occurrence on each side is the one that gets paired; later duplicates
//! fall through as unmatched.

use modelmerge_core::{Attribute, Entity, IgnoreRules, Relationship, SchemaModel, qualified_name};
use std::collections::HashMap;

/// Anything matched by name
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Entity {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Attribute {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Relationship {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A left/right pairing; at least one side is present
#[derive(Debug)]
pub struct Pair<'a, T> {
    pub left: Option<&'a T>,
    pub right: Option<&'a T>,
}

impl<T> Clone for Pair<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Pair<'_, T> {}

impl<'a, T: Named> Pair<'a, T> {
    /// Name shared by both sides
    pub fn name(&self) -> &'a str {
        match (self.left, self.right) {
            (Some(l), _) => l.name(),
            (None, Some(r)) => r.name(),
            (None, None) => "",
        }
    }

    pub fn is_matched(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

/// Pair two ordered collections by exact name
pub fn pair_by_name<'a, T: Named>(left: &[&'a T], right: &[&'a T]) -> Vec<Pair<'a, T>> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(right.len());
    for (i, item) in right.iter().enumerate() {
        index.entry(item.name()).or_insert(i);
    }

    let mut claimed = vec![false; right.len()];
    let mut pairs = Vec::with_capacity(left.len().max(right.len()));

    for item in left {
        let partner = index
            .get(item.name())
            .copied()
            .filter(|&i| !claimed[i]);

        match partner {
            Some(i) => {
                claimed[i] = true;
                pairs.push(Pair { left: Some(*item), right: Some(right[i]) });
            }
            None => pairs.push(Pair { left: Some(*item), right: None }),
        }
    }

    for (i, item) in right.iter().enumerate() {
        if !claimed[i] {
            pairs.push(Pair { left: None, right: Some(*item) });
        }
    }

    pairs
}

/// Pair the entities of two models, leaving out ignored entities
pub fn match_entities<'a>(
    left: &'a SchemaModel,
    right: &'a SchemaModel,
    ignore: &IgnoreRules,
) -> Vec<Pair<'a, Entity>> {
    let keep = |e: &&'a Entity| !ignore.is_entity_ignored(&e.name);
    let left: Vec<&Entity> = left.entities().iter().filter(keep).collect();
    let right: Vec<&Entity> = right.entities().iter().filter(keep).collect();
    pair_by_name(&left, &right)
}

/// Pair the attributes of a matched entity pair, leaving out ignored attributes
pub fn match_attributes<'a>(
    entity: &str,
    left: Option<&'a Entity>,
    right: Option<&'a Entity>,
    ignore: &IgnoreRules,
) -> Vec<Pair<'a, Attribute>> {
    let collect = |side: Option<&'a Entity>| -> Vec<&'a Attribute> {
        side.map(|e| {
            e.attributes
                .iter()
                .filter(|a| !ignore.is_attribute_ignored(&qualified_name(entity, &a.name)))
                .collect()
        })
        .unwrap_or_default()
    };
    pair_by_name(&collect(left), &collect(right))
}

/// Pair the outgoing relationships of a matched entity pair
pub fn match_relationships<'a>(
    left: Option<&'a Entity>,
    right: Option<&'a Entity>,
) -> Vec<Pair<'a, Relationship>> {
    let collect = |side: Option<&'a Entity>| -> Vec<&'a Relationship> {
        side.map(|e| e.relationships.iter().collect()).unwrap_or_default()
    };
    pair_by_name(&collect(left), &collect(right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(names: &[&str]) -> Vec<Entity> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| Entity::new(format!("e{}", i), *n))
            .collect()
    }

    fn names<'a>(pairs: &[Pair<'a, Entity>]) -> Vec<(Option<&'a str>, Option<&'a str>)> {
        pairs
            .iter()
            .map(|p| (p.left.map(|e| e.name.as_str()), p.right.map(|e| e.name.as_str())))
            .collect()
    }

    #[test]
    fn pairing_order() {
        let left = entities(&["Customer", "Order", "Legacy"]);
        let right = entities(&["Product", "Order", "Customer", "Category"]);
        let l: Vec<&Entity> = left.iter().collect();
        let r: Vec<&Entity> = right.iter().collect();

        let pairs = pair_by_name(&l, &r);

        assert_eq!(
            names(&pairs),
            vec![
                (Some("Customer"), Some("Customer")),
                (Some("Order"), Some("Order")),
                (Some("Legacy"), None),
                (None, Some("Product")),
                (None, Some("Category")),
            ]
        );
        assert!(pairs[0].is_matched());
        assert_eq!(pairs[3].name(), "Product");
    }

    #[test]
    fn matching_is_case_sensitive() {
        let left = entities(&["customer"]);
        let right = entities(&["Customer"]);
        let l: Vec<&Entity> = left.iter().collect();
        let r: Vec<&Entity> = right.iter().collect();

        let pairs = pair_by_name(&l, &r);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| !p.is_matched()));
    }

    #[test]
    fn duplicate_names_first_wins() {
        let left = entities(&["A", "A"]);
        let right = entities(&["A"]);
        let l: Vec<&Entity> = left.iter().collect();
        let r: Vec<&Entity> = right.iter().collect();

        let pairs = pair_by_name(&l, &r);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].left.unwrap().id, "e0");
        assert!(pairs[0].is_matched());
        assert_eq!(pairs[1].left.unwrap().id, "e1");
        assert!(pairs[1].right.is_none());
    }

    #[test]
    fn ignored_entities_are_not_paired() {
        let left = SchemaModel::new("l", "L", "1", entities(&["Customer", "audit_log"])).unwrap();
        let right = SchemaModel::new("r", "R", "1", entities(&["Customer", "audit_trail"])).unwrap();
        let ignore = IgnoreRules {
            entities: vec!["audit_*".to_string()],
            attributes: vec![],
        };

        let pairs = match_entities(&left, &right, &ignore);
        assert_eq!(names(&pairs), vec![(Some("Customer"), Some("Customer"))]);
    }

    #[test]
    fn ignored_attributes_are_not_paired() {
        let left = Entity::new("c", "Customer")
            .with_attribute(Attribute::new("CustomerID", "INT"))
            .with_attribute(Attribute::new("updated_at", "TIMESTAMP"));
        let right = Entity::new("c", "Customer").with_attribute(Attribute::new("CustomerID", "BIGINT"));
        let ignore = IgnoreRules {
            entities: vec![],
            attributes: vec!["*.updated_at".to_string()],
        };

        let pairs = match_attributes("Customer", Some(&left), Some(&right), &ignore);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].name(), "CustomerID");
    }
}
