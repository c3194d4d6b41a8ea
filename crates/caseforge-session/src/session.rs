use caseforge_stream::{GenerationEvent, HallucinationReport, TestCase};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// How the server decided to process the source document.
///
/// A session starts out `Single` and flips to `Batch` on the first
/// `batch_start` event; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Single,
    Batch,
}

/// Session lifecycle. Moves strictly forward:
/// `Idle -> Streaming -> {Completed, Cancelled, Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Idle,
    Streaming,
    Completed,
    Cancelled,
    Failed,
}

impl SessionStatus {
    /// Terminal states are absorbing: nothing mutates the session after.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Batch completion counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub current: u32,
    pub total: u32,
    pub feature: String,
}

impl Progress {
    /// Completion ratio in `[0, 1]`. A zero total never divides.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.current) / f64::from(self.total)
        }
    }
}

/// Why a session reached its terminal state.
///
/// Cancelled sessions carry no outcome at all; that absence is how the
/// caller tells user cancellation apart from failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionOutcome {
    Completed { report: HallucinationReport },
    Failed { message: String },
}

/// Insertion-ordered view over a session's items, bucketed by feature.
///
/// Groups are derived, never stored: replaying the items in arrival order
/// and bucketing on their `feature` label always reconstructs them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGroup {
    /// None for the implicit group of a single-feature session.
    pub name: Option<String>,
    /// Taken from the first item assigned to the group.
    pub description: Option<String>,
    pub items: Vec<TestCase>,
}

/// Full mutable state of one generation exchange.
///
/// Owned by its orchestrator for the session's lifetime; the rendering
/// boundary only ever sees snapshots.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    mode: Mode,
    status: SessionStatus,
    status_message: String,
    items: Vec<TestCase>,
    progress: Option<Progress>,
    outcome: Option<SessionOutcome>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            mode: Mode::Single,
            status: SessionStatus::Idle,
            status_message: String::new(),
            items: Vec::new(),
            progress: None,
            outcome: None,
        }
    }

    /// Transition `Idle -> Streaming`. Any other starting point is a bug in
    /// the orchestrator, not the wire, so it is only logged.
    pub fn start(&mut self) {
        if self.status == SessionStatus::Idle {
            self.status = SessionStatus::Streaming;
        } else {
            warn!(session = %self.id, status = ?self.status, "start on a non-idle session");
        }
    }

    /// Apply one decoded event.
    ///
    /// Only a streaming session mutates. Events against a terminal session
    /// (after `complete`, after an error, after cancellation) are protocol
    /// noise: dropped with a diagnostic, never a crash.
    pub fn apply(&mut self, event: GenerationEvent) {
        if self.status != SessionStatus::Streaming {
            warn!(session = %self.id, status = ?self.status, "dropping event outside streaming state");
            return;
        }

        match event {
            GenerationEvent::Status { message } => {
                self.status_message = message;
            }
            GenerationEvent::BatchStart { total_features } => {
                if self.mode == Mode::Batch {
                    warn!(session = %self.id, "duplicate batch_start, ignoring");
                    return;
                }
                self.mode = Mode::Batch;
                self.items.clear();
                self.progress = Some(Progress {
                    current: 0,
                    total: total_features,
                    feature: String::new(),
                });
            }
            GenerationEvent::Progress {
                current,
                total,
                feature,
            } => {
                self.progress = Some(Progress {
                    current,
                    total,
                    feature,
                });
            }
            GenerationEvent::TestCase { test_case } => {
                // Exactly one append per event; duplicate ids stay distinct.
                self.items.push(test_case);
            }
            GenerationEvent::Complete { result } => {
                self.outcome = Some(SessionOutcome::Completed {
                    report: result.hallucination_report,
                });
                self.status = SessionStatus::Completed;
            }
            GenerationEvent::Error { message } => {
                self.fail(message);
            }
            GenerationEvent::Unrecognized => {
                debug!(session = %self.id, "ignoring unrecognized event");
            }
        }
    }

    /// Abort path: drops the buffered aggregate and parks the session in
    /// `Cancelled`. Idempotent, and a no-op once terminal.
    pub fn cancel(&mut self) {
        if self.status.is_terminal() {
            return;
        }
        self.items.clear();
        self.progress = None;
        self.outcome = None;
        self.status = SessionStatus::Cancelled;
    }

    /// Terminal failure with a caller-visible reason. No-op once terminal.
    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.outcome = Some(SessionOutcome::Failed {
            message: message.into(),
        });
        self.status = SessionStatus::Failed;
    }

    /// Derive the feature groups for rendering.
    ///
    /// Batch mode buckets items by feature in order of first appearance;
    /// single mode is one implicit unnamed group.
    pub fn groups(&self) -> Vec<FeatureGroup> {
        match self.mode {
            Mode::Single => vec![FeatureGroup {
                name: None,
                description: None,
                items: self.items.clone(),
            }],
            Mode::Batch => {
                let mut groups: Vec<FeatureGroup> = Vec::new();
                for item in &self.items {
                    match groups.iter_mut().find(|group| group.name == item.feature) {
                        Some(group) => group.items.push(item.clone()),
                        None => groups.push(FeatureGroup {
                            name: item.feature.clone(),
                            description: item.feature_description.clone(),
                            items: vec![item.clone()],
                        }),
                    }
                }
                groups
            }
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Latest advisory status line from the server.
    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    /// All items in arrival order. Export consumes this untruncated.
    pub fn items(&self) -> &[TestCase] {
        &self.items
    }

    pub fn progress(&self) -> Option<&Progress> {
        self.progress.as_ref()
    }

    /// Completion ratio, 0.0 before any progress is known.
    pub fn ratio(&self) -> f64 {
        self.progress.as_ref().map(Progress::ratio).unwrap_or(0.0)
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
