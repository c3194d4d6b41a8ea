use serde::Deserialize;
use serde_json::Value;

use crate::error::StreamError;
use crate::events::{CompletionResult, GenerationEvent, HallucinationFlag, Steps, TestCase};

/// Wire-level event, internally tagged by `type`.
///
/// `test_case` payloads arrive as loose objects because their key set
/// varies; they are normalized into [`TestCase`] before anything else
/// touches them.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawEvent {
    Status {
        message: String,
    },
    BatchStart {
        total_features: u32,
    },
    Progress {
        current: u32,
        total: u32,
        feature: String,
    },
    TestCase {
        test_case: Value,
        #[serde(default)]
        feature: Option<String>,
    },
    Complete {
        result: CompletionResult,
    },
    Error {
        message: String,
    },
    #[serde(other)]
    Unknown,
}

/// Parse one frame payload (the text after the `data: ` prefix) into a
/// canonical event. Unparseable JSON is a [`StreamError::Decode`]; an
/// unknown `type` tag is not an error.
pub fn decode_frame(payload: &str) -> Result<GenerationEvent, StreamError> {
    let raw: RawEvent = serde_json::from_str(payload)?;

    Ok(match raw {
        RawEvent::Status { message } => GenerationEvent::Status { message },
        RawEvent::BatchStart { total_features } => GenerationEvent::BatchStart { total_features },
        RawEvent::Progress {
            current,
            total,
            feature,
        } => GenerationEvent::Progress {
            current,
            total,
            feature,
        },
        RawEvent::TestCase { test_case, feature } => GenerationEvent::TestCase {
            test_case: normalize_test_case(&test_case, feature),
        },
        RawEvent::Complete { result } => GenerationEvent::Complete { result },
        RawEvent::Error { message } => GenerationEvent::Error { message },
        RawEvent::Unknown => GenerationEvent::Unrecognized,
    })
}

/// Collapse the two wire key sets into the canonical test case shape.
///
/// Per field the first present key wins, in the listed precedence order.
/// Absent fields default to empty strings, the id to "No ID".
fn normalize_test_case(raw: &Value, feature: Option<String>) -> TestCase {
    TestCase {
        id: first_string(raw, &["Test Case ID", "testCaseId", "testCaseID", "id"])
            .unwrap_or_else(|| "No ID".to_string()),
        description: first_string(raw, &["Description", "description"]).unwrap_or_default(),
        preconditions: first_string(raw, &["Preconditions", "preconditions"]).unwrap_or_default(),
        steps: extract_steps(raw),
        expected_result: first_string(raw, &["Expected Result", "expectedResult"])
            .unwrap_or_default(),
        feature,
        feature_description: first_string(raw, &["feature_description"]),
        hallucination: extract_hallucination(raw),
    }
}

fn first_string(raw: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| raw.get(key))
        .and_then(|value| match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            // Models occasionally emit numeric ids; keep them as text.
            other => Some(other.to_string()),
        })
}

fn extract_steps(raw: &Value) -> Steps {
    match raw.get("Steps").or_else(|| raw.get("steps")) {
        Some(Value::Array(items)) => Steps::List(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        ),
        Some(Value::String(text)) => Steps::Text(text.clone()),
        _ => Steps::Text(String::new()),
    }
}

fn extract_hallucination(raw: &Value) -> Option<HallucinationFlag> {
    let flagged = raw.get("hallucination_flag")?.as_bool()?;
    let reason = first_string(raw, &["hallucination_reason"]).unwrap_or_default();
    Some(HallucinationFlag { flagged, reason })
}
