//! Comparison session
//!
//! Owns the two snapshots, the comparison results and the decision map for
//! one compare/merge run. The lifecycle is `Idle -> Comparing -> Compared`,
//! and `reset` returns to `Idle` from any state. Every operation that fails
//! leaves the previous state untouched.

use modelmerge_core::{
    model_fingerprint, CompareConfig, ComparisonKey, ComparisonReport, ComparisonResult,
    DetailRow, ReportFormat, ResolutionKind, ResultFilter, SchemaModel,
};
use std::fmt;

use crate::diff::DiffEngine;
use crate::error::{CompareError, CompareResult};
use crate::merge::{DecisionMap, MergeBuilder, MergeDecision};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Comparing,
    Compared,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Comparing => write!(f, "comparing"),
            Self::Compared => write!(f, "compared"),
        }
    }
}

/// Resolution progress over results that need a decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub resolved: usize,
    pub required: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.resolved == self.required
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} resolved", self.resolved, self.required)
    }
}

#[derive(Debug, Clone)]
struct Comparison {
    left: SchemaModel,
    right: SchemaModel,
    results: Vec<ComparisonResult>,
    decisions: DecisionMap,
    /// Cached merge model, dropped whenever a decision changes
    merged: Option<SchemaModel>,
}

impl Comparison {
    fn builder(&self) -> MergeBuilder<'_> {
        MergeBuilder::new(&self.left, &self.right, &self.results)
    }

    fn build(&self) -> CompareResult<SchemaModel> {
        self.builder().build(self.left.header().clone(), &self.decisions)
    }

    fn pending(&self) -> Vec<&ComparisonKey> {
        self.results
            .iter()
            .filter(|r| r.needs_resolution())
            .filter(|r| !self.decisions.get(&r.key).is_some_and(MergeDecision::is_resolved))
            .map(|r| &r.key)
            .collect()
    }
}

/// A single compare/merge run
#[derive(Debug, Clone, Default)]
pub struct ComparisonSession {
    config: CompareConfig,
    state: SessionState,
    comparison: Option<Comparison>,
}

impl ComparisonSession {
    pub fn new(config: CompareConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            comparison: None,
        }
    }

    pub fn config(&self) -> &CompareConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn compared(&self, operation: &'static str) -> CompareResult<&Comparison> {
        match (&self.comparison, self.state) {
            (Some(comparison), SessionState::Compared) => Ok(comparison),
            (_, state) => Err(Self::invalid_state(operation, state)),
        }
    }

    fn compared_mut(&mut self, operation: &'static str) -> CompareResult<&mut Comparison> {
        match (&mut self.comparison, self.state) {
            (Some(comparison), SessionState::Compared) => Ok(comparison),
            (_, state) => Err(Self::invalid_state(operation, state)),
        }
    }

    fn invalid_state(operation: &'static str, actual: SessionState) -> CompareError {
        tracing::warn!(operation, state = %actual, "operation rejected");
        CompareError::InvalidState {
            operation,
            expected: SessionState::Compared,
            actual,
        }
    }

    /// Compare two snapshots and store the results
    ///
    /// Starting from `Compared` discards the previous run. Results that are
    /// `same` are pre-resolved to take-left.
    pub fn start(&mut self, left: SchemaModel, right: SchemaModel) -> CompareResult<&[ComparisonResult]> {
        if left.id() == right.id() {
            tracing::warn!(model = left.id(), "refusing to compare a model with itself");
            return Err(CompareError::IdenticalModel(left.id().to_string()));
        }

        if self.state == SessionState::Compared {
            tracing::debug!("discarding previous comparison");
        }
        self.reset();

        tracing::info!(left = %left.header(), right = %right.header(), "comparison started");
        self.state = SessionState::Comparing;

        let results = DiffEngine::new(&self.config).compare(&left, &right);
        let decisions: DecisionMap = results
            .iter()
            .filter(|r| r.is_same())
            .map(|r| (r.key.clone(), MergeDecision::TakeLeft))
            .collect();

        tracing::info!(
            results = results.len(),
            pending = results.len() - decisions.len(),
            "comparison finished"
        );

        let comparison = self.comparison.insert(Comparison {
            left,
            right,
            results,
            decisions,
            merged: None,
        });
        self.state = SessionState::Compared;
        Ok(&comparison.results)
    }

    /// Drop all results and decisions
    pub fn reset(&mut self) {
        if self.comparison.take().is_some() {
            tracing::info!("session reset");
        }
        self.state = SessionState::Idle;
    }

    /// Results in matcher order; empty unless compared
    pub fn results(&self) -> &[ComparisonResult] {
        self.comparison
            .as_ref()
            .map(|c| c.results.as_slice())
            .unwrap_or_default()
    }

    pub fn result(&self, key: &ComparisonKey) -> CompareResult<&ComparisonResult> {
        self.compared("result")?
            .results
            .iter()
            .find(|r| &r.key == key)
            .ok_or_else(|| CompareError::UnknownResult(key.clone()))
    }

    /// Results passing a status/search filter
    pub fn filter(&self, filter: &ResultFilter) -> Vec<&ComparisonResult> {
        self.results().iter().filter(|r| filter.matches(r)).collect()
    }

    /// Attribute and relationship rows of one entity result
    pub fn drill_down(&self, key: &ComparisonKey) -> CompareResult<Vec<DetailRow>> {
        let result = self.result(key)?;
        let comparison = self.compared("drill_down")?;
        Ok(DiffEngine::new(&self.config).detail_rows(
            &comparison.left,
            &comparison.right,
            result.name(),
        ))
    }

    /// Record a decision, replacing any earlier one for the same key
    pub fn resolve(&mut self, key: &ComparisonKey, decision: MergeDecision) -> CompareResult<()> {
        let comparison = self.compared_mut("resolve")?;

        if let Err(err) = comparison.builder().check(key, &decision) {
            tracing::warn!(key = %key, decision = %decision.kind(), error = %err, "decision rejected");
            return Err(err);
        }

        tracing::debug!(key = %key, decision = %decision.kind(), "resolved");
        comparison.decisions.insert(key.clone(), decision);
        comparison.merged = None;
        Ok(())
    }

    /// Return a result to the unresolved state
    pub fn clear_decision(&mut self, key: &ComparisonKey) -> CompareResult<()> {
        self.result(key)?;
        let comparison = self.compared_mut("clear_decision")?;
        if comparison.decisions.remove(key).is_some() {
            tracing::debug!(key = %key, "decision cleared");
            comparison.merged = None;
        }
        Ok(())
    }

    /// Current decision for a key
    pub fn decision(&self, key: &ComparisonKey) -> CompareResult<&MergeDecision> {
        self.result(key)?;
        let comparison = self.compared("decision")?;
        Ok(comparison
            .decisions
            .get(key)
            .unwrap_or(&MergeDecision::Unresolved))
    }

    pub fn decisions(&self) -> Option<&DecisionMap> {
        self.comparison.as_ref().map(|c| &c.decisions)
    }

    /// Keys that still need a decision, in result order
    pub fn pending(&self) -> Vec<&ComparisonKey> {
        self.comparison
            .as_ref()
            .map(Comparison::pending)
            .unwrap_or_default()
    }

    pub fn progress(&self) -> Progress {
        let required = self.results().iter().filter(|r| r.needs_resolution()).count();
        Progress {
            resolved: required - self.pending().len(),
            required,
        }
    }

    /// Preview of the merge model under the current decisions
    ///
    /// Unlike [`export_merge_model`](Self::export_merge_model) this does not
    /// require every difference to be resolved.
    pub fn merge_model(&mut self) -> CompareResult<&SchemaModel> {
        let comparison = self.compared_mut("merge_model")?;
        let model = match comparison.merged.take() {
            Some(model) => model,
            None => comparison.build()?,
        };
        Ok(&*comparison.merged.insert(model))
    }

    /// Build the final merge model
    ///
    /// In merge mode every non-`same` result must have a decision.
    pub fn export_merge_model(&mut self) -> CompareResult<SchemaModel> {
        let merge_enabled = self.config.merge_enabled;
        let comparison = self.compared("export_merge_model")?;

        if merge_enabled {
            let pending = comparison.pending();
            if !pending.is_empty() {
                tracing::warn!(pending = pending.len(), "export blocked by unresolved conflicts");
                return Err(CompareError::UnresolvedConflicts {
                    keys: pending.into_iter().cloned().collect(),
                });
            }
        }

        let model = self.merge_model()?.clone();
        tracing::info!(
            model = %model.header(),
            entities = model.entities().len(),
            "merge model exported"
        );
        Ok(model)
    }

    /// Structured report of the current comparison
    pub fn report(&self) -> CompareResult<ComparisonReport> {
        let comparison = self.compared("report")?;

        let resolutions = comparison
            .results
            .iter()
            .map(|r| {
                let kind = comparison
                    .decisions
                    .get(&r.key)
                    .map(MergeDecision::kind)
                    .unwrap_or(ResolutionKind::Unresolved);
                (r.key.clone(), kind)
            })
            .collect();

        Ok(ComparisonReport::new(
            comparison.left.header().clone(),
            comparison.right.header().clone(),
            model_fingerprint(&comparison.left),
            model_fingerprint(&comparison.right),
            comparison.results.clone(),
            resolutions,
        ))
    }

    /// Text rendering of the report
    pub fn export_report(&self, format: ReportFormat) -> CompareResult<String> {
        let report = self.report()?;
        tracing::info!(format = ?format, "report exported");
        Ok(report.render(format))
    }
}
