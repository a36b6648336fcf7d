//! modelmerge engine
//!
//! Matching, diffing and merging of schema snapshots, driven through a
//! [`ComparisonSession`]:
//!
//! ```no_run
//! use modelmerge_core::{CompareConfig, SchemaModel};
//! use modelmerge_engine::{ComparisonSession, MergeDecision};
//!
//! # fn run(left: SchemaModel, right: SchemaModel) -> modelmerge_engine::CompareResult<()> {
//! let mut session = ComparisonSession::new(CompareConfig::default());
//! session.start(left, right)?;
//! for key in session.pending().into_iter().cloned().collect::<Vec<_>>() {
//!     session.resolve(&key, MergeDecision::Skip)?;
//! }
//! let merged = session.export_merge_model()?;
//! # let _ = merged;
//! # Ok(())
//! # }
//! ```

pub mod diff;
pub mod error;
pub mod matcher;
pub mod merge;
pub mod session;

pub use diff::{relationship_definition, DiffEngine};
pub use error::{CompareError, CompareResult, Side};
pub use matcher::{match_attributes, match_entities, match_relationships, pair_by_name, Named, Pair};
pub use merge::{build_merge_model, DecisionMap, MergeBuilder, MergeDecision};
pub use session::{ComparisonSession, Progress, SessionState};
