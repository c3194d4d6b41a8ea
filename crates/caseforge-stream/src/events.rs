use serde::{Deserialize, Serialize};

/// Canonical event decoded from one frame of the generation stream.
///
/// The wire carries internally tagged JSON (`{"type": "...", ...}`); tags we
/// do not know map to `Unrecognized` instead of failing, so newer servers
/// can add event types without breaking older clients.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    /// Advisory human-readable status line. Overwritten by the next one.
    Status { message: String },

    /// The server decided to process the whole document feature by feature.
    BatchStart { total_features: u32 },

    /// Batch completion counter, one per feature being processed.
    Progress {
        current: u32,
        total: u32,
        feature: String,
    },

    /// One generated test case, already normalized to canonical shape.
    TestCase { test_case: TestCase },

    /// Clean end of generation, carrying the validation result.
    Complete { result: CompletionResult },

    /// Server-side failure. Terminal for the session.
    Error { message: String },

    /// An event type this client does not understand.
    Unrecognized,
}

/// One generated test case in canonical shape.
///
/// The wire accepts two key sets per field (capitalized `Test Case ID`
/// style and camel-cased `testCaseId` style, depending on the model that
/// produced it); normalization happens exactly once at decode time, so
/// everything downstream only ever sees this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub description: String,
    pub preconditions: String,
    pub steps: Steps,
    pub expected_result: String,

    /// Feature this case belongs to. Present only in batch mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature: Option<String>,

    /// Description of the owning feature, used for group headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_description: Option<String>,

    /// Per-case anomaly annotation from the validation pass.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hallucination: Option<HallucinationFlag>,
}

/// Steps arrive either as an ordered list or as one free-text block.
///
/// Both shapes are valid and must survive aggregation and export as
/// received; collapsing one into the other would lose formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Steps {
    List(Vec<String>),
    Text(String),
}

impl Steps {
    /// Single-line rendering used by the flat text encoders.
    pub fn joined(&self) -> String {
        match self {
            Steps::List(steps) => steps.join(", "),
            Steps::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Steps::List(steps) => steps.is_empty(),
            Steps::Text(text) => text.is_empty(),
        }
    }
}

impl Default for Steps {
    fn default() -> Self {
        Steps::Text(String::new())
    }
}

/// Validation annotation attached to a single test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HallucinationFlag {
    pub flagged: bool,
    #[serde(default)]
    pub reason: String,
}

/// Payload of the `complete` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    #[serde(default)]
    pub hallucination_report: HallucinationReport,
}

/// Session-level result of the hallucination check.
///
/// `found_issues` is the authority, never inferred from the issue list:
/// `true` with zero issues still reads as detected, and `false` renders as
/// an explicit pass rather than as missing data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HallucinationReport {
    #[serde(default)]
    pub found_issues: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl HallucinationReport {
    /// Badge text matching the UI contract.
    pub fn verdict(&self) -> &'static str {
        if self.found_issues {
            "Potential Hallucinations Detected"
        } else {
            "Hallucination Check Passed"
        }
    }
}
