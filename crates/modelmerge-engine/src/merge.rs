//! Merge builder
//!
//! Folds a decision map over the comparison results to produce a new model.
//! Building is pure: the same results, decisions and inputs always give the
//! same merge model, and nothing is mutated along the way.

use modelmerge_core::{
    qualified_name, ComparisonKey, ComparisonResult, Entity, ModelError, ModelHeader,
    ResolutionKind, SchemaModel,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::error::{CompareError, CompareResult, Side};

/// Decision for one comparison result
///
/// Serialized as `{"decision": "take-left"}` or
/// `{"decision": "custom", "definition": { ...entity... }}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "decision", content = "definition", rename_all = "kebab-case")]
pub enum MergeDecision {
    #[default]
    Unresolved,
    TakeLeft,
    TakeRight,
    /// Replacement definition; must carry the result's name
    Custom(Entity),
    Skip,
}

impl MergeDecision {
    pub fn kind(&self) -> ResolutionKind {
        match self {
            Self::Unresolved => ResolutionKind::Unresolved,
            Self::TakeLeft => ResolutionKind::TakeLeft,
            Self::TakeRight => ResolutionKind::TakeRight,
            Self::Custom(_) => ResolutionKind::Custom,
            Self::Skip => ResolutionKind::Skip,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

/// Decisions keyed by result
pub type DecisionMap = BTreeMap<ComparisonKey, MergeDecision>;

/// Where a merged entity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Left,
    Right,
    Custom,
}

/// Validates decisions and builds merge models for one comparison
#[derive(Debug, Clone, Copy)]
pub struct MergeBuilder<'a> {
    left: &'a SchemaModel,
    right: &'a SchemaModel,
    results: &'a [ComparisonResult],
}

impl<'a> MergeBuilder<'a> {
    pub fn new(left: &'a SchemaModel, right: &'a SchemaModel, results: &'a [ComparisonResult]) -> Self {
        Self { left, right, results }
    }

    fn result(&self, key: &ComparisonKey) -> CompareResult<&'a ComparisonResult> {
        self.results
            .iter()
            .find(|r| &r.key == key)
            .ok_or_else(|| CompareError::UnknownResult(key.clone()))
    }

    /// Check that a decision can be applied to a result
    pub fn check(&self, key: &ComparisonKey, decision: &MergeDecision) -> CompareResult<()> {
        let result = self.result(key)?;

        match decision {
            MergeDecision::Unresolved => Err(ModelError::validation(format!(
                "'{}' cannot be resolved to 'unresolved'; clear the decision instead",
                key
            ))
            .into()),
            MergeDecision::TakeLeft if !result.left_present => Err(CompareError::MissingSide {
                key: key.clone(),
                decision: decision.kind(),
                side: Side::Left,
            }),
            MergeDecision::TakeRight if !result.right_present => Err(CompareError::MissingSide {
                key: key.clone(),
                decision: decision.kind(),
                side: Side::Right,
            }),
            MergeDecision::Custom(entity) => {
                if entity.name != key.as_str() {
                    return Err(ModelError::validation(format!(
                        "custom definition for '{}' is named '{}'",
                        key, entity.name
                    ))
                    .into());
                }
                let clash = [self.left, self.right]
                    .into_iter()
                    .filter_map(|model| model.entity_by_id(&entity.id))
                    .find(|other| other.name != entity.name);
                if let Some(other) = clash {
                    return Err(ModelError::validation(format!(
                        "custom definition for '{}' reuses id '{}' of '{}'",
                        key, entity.id, other.name
                    ))
                    .into());
                }
                entity.validate()?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Build the merge model
    ///
    /// Results are visited in order. `skip` and unresolved results are left
    /// out. An entity whose id is already taken by an earlier merged entity
    /// gets a fresh one. Relationship targets are re-pointed at the merged
    /// entity of the same name, so a relationship whose target was excluded
    /// fails with a dangling reference.
    pub fn build(&self, header: ModelHeader, decisions: &DecisionMap) -> CompareResult<SchemaModel> {
        let mut picked: Vec<(Origin, Entity)> = Vec::with_capacity(self.results.len());

        for result in self.results {
            let decision = decisions.get(&result.key).unwrap_or(&MergeDecision::Unresolved);
            let name = result.name();

            let chosen = match decision {
                MergeDecision::TakeLeft => self.left.entity(name).map(|e| (Origin::Left, e.clone())),
                MergeDecision::TakeRight => self.right.entity(name).map(|e| (Origin::Right, e.clone())),
                MergeDecision::Custom(entity) => Some((Origin::Custom, entity.clone())),
                MergeDecision::Skip | MergeDecision::Unresolved => continue,
            };

            match chosen {
                Some(entry) => picked.push(entry),
                None => {
                    let side = if matches!(decision, MergeDecision::TakeLeft) {
                        Side::Left
                    } else {
                        Side::Right
                    };
                    return Err(CompareError::MissingSide {
                        key: result.key.clone(),
                        decision: decision.kind(),
                        side,
                    });
                }
            }
        }

        // Custom relationships may point at any merged entity by its original id
        let original_names: HashMap<String, String> = picked
            .iter()
            .rev()
            .map(|(_, e)| (e.id.clone(), e.name.clone()))
            .collect();
        let renamed = assign_unique_ids(&mut picked);
        if renamed > 0 {
            tracing::debug!(renamed, "merged entities given fresh ids");
        }

        let merged_ids: HashMap<String, String> = picked
            .iter()
            .map(|(_, e)| (e.name.clone(), e.id.clone()))
            .collect();

        let mut entities = Vec::with_capacity(picked.len());
        for (origin, mut entity) in picked {
            for relationship in &mut entity.relationships {
                let target_name = match origin {
                    Origin::Left => self.left.target_name(relationship).map(str::to_string),
                    Origin::Right => self.right.target_name(relationship).map(str::to_string),
                    Origin::Custom => original_names
                        .get(&relationship.target)
                        .map(String::as_str)
                        .or_else(|| self.left.target_name(relationship))
                        .or_else(|| self.right.target_name(relationship))
                        .map(str::to_string),
                };

                if let Some(target_name) = target_name {
                    let Some(id) = merged_ids.get(&target_name) else {
                        return Err(ModelError::dangling(
                            qualified_name(&entity.name, &relationship.name),
                            target_name,
                        )
                        .into());
                    };
                    relationship.target = id.clone();
                }
                relationship.source = entity.id.clone();
            }
            entities.push(entity);
        }

        tracing::debug!(entities = entities.len(), "merge model assembled");
        Ok(SchemaModel::from_parts(header, entities)?)
    }
}

/// Give every entity after the first holder of an id a fresh one
///
/// Fresh ids never collide with any picked entity's original id, so later
/// entities keep theirs. Returns how many entities were renamed.
fn assign_unique_ids(picked: &mut [(Origin, Entity)]) -> usize {
    let originals: HashSet<String> = picked.iter().map(|(_, e)| e.id.clone()).collect();
    let mut taken: HashSet<String> = HashSet::with_capacity(picked.len());
    let mut renamed = 0;

    for (_, entity) in picked.iter_mut() {
        if taken.insert(entity.id.clone()) {
            continue;
        }
        let fresh = (2..)
            .map(|n| format!("{}_{}", entity.id, n))
            .find(|candidate| !originals.contains(candidate) && !taken.contains(candidate))
            .unwrap_or_default();
        taken.insert(fresh.clone());
        entity.id = fresh;
        renamed += 1;
    }

    renamed
}

/// Build a merge model headed like the left model
pub fn build_merge_model(
    results: &[ComparisonResult],
    decisions: &DecisionMap,
    left: &SchemaModel,
    right: &SchemaModel,
) -> CompareResult<SchemaModel> {
    MergeBuilder::new(left, right, results).build(left.header().clone(), decisions)
}
