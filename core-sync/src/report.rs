//! # Run Reports
//!
//! Records what a reconciliation run did with every action it considered.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let report = coordinator.reconcile(&mut catalog).await?;
//! println!(
//!     "{} executed, {} failed",
//!     report.executed(),
//!     report.failed()
//! );
//! for outcome in report.failures() {
//!     eprintln!("{}", outcome);
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// ID Types
// ============================================================================

/// Unique identifier for a reconciliation run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SyncRunId(Uuid);

impl SyncRunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SyncRunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SyncRunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for SyncRunId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// What an outcome was about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Album,
    Image,
    /// Persisting the image cache
    Cache,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Album => "album",
            EntityKind::Image => "image",
            EntityKind::Cache => "cache",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "status", content = "message")]
pub enum OutcomeStatus {
    Executed,
    /// Reported only (dry run)
    Skipped,
    /// The operator answered no
    Declined,
    Failed(String),
}

impl OutcomeStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, OutcomeStatus::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub entity: EntityKind,
    pub id: String,
    /// Action name, e.g. `create` or `load_photos`
    pub action: String,
    pub status: OutcomeStatus,
}

impl ActionOutcome {
    pub fn new(
        entity: EntityKind,
        id: impl Into<String>,
        action: impl Into<String>,
        status: OutcomeStatus,
    ) -> Self {
        Self {
            entity,
            id: id.into(),
            action: action.into(),
            status,
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: ", self.action, self.entity.as_str(), self.id)?;
        match &self.status {
            OutcomeStatus::Executed => f.write_str("done"),
            OutcomeStatus::Skipped => f.write_str("skipped (dry run)"),
            OutcomeStatus::Declined => f.write_str("declined"),
            OutcomeStatus::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

// ============================================================================
// Report
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncReport {
    pub run_id: SyncRunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Albums in the catalog when reconciliation started
    pub albums: usize,
    /// Images in the catalog when reconciliation started
    pub images: usize,
    pub outcomes: Vec<ActionOutcome>,
}

impl SyncReport {
    pub fn new(run_id: SyncRunId, albums: usize, images: usize) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            finished_at: None,
            albums,
            images,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ActionOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    fn count(&self, predicate: impl Fn(&OutcomeStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(&o.status)).count()
    }

    pub fn executed(&self) -> usize {
        self.count(|s| *s == OutcomeStatus::Executed)
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| *s == OutcomeStatus::Skipped)
    }

    pub fn declined(&self) -> usize {
        self.count(|s| *s == OutcomeStatus::Declined)
    }

    pub fn failed(&self) -> usize {
        self.count(OutcomeStatus::is_failure)
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ActionOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    /// Outcomes for one entity kind and action name
    pub fn outcomes_for<'a>(
        &'a self,
        entity: EntityKind,
        action: &'a str,
    ) -> impl Iterator<Item = &'a ActionOutcome> + 'a {
        self.outcomes
            .iter()
            .filter(move |o| o.entity == entity && o.action == action)
    }
}
