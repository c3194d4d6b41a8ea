use anyhow::Result;
use caseforge_stream::{Steps, TestCase};

/// Output encodings for a finished item collection.
///
/// Markdown is the document-shaped format; binary page layouts (DOCX, PDF)
/// stay outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    PlainText,
    Json,
    Markdown,
}

/// Encode the finished, immutable item collection.
///
/// Items are passed through untruncated: descriptions and steps appear
/// exactly as they were received.
pub fn export(items: &[TestCase], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::PlainText => Ok(export_plain_text(items)),
        ExportFormat::Json => Ok(serde_json::to_string_pretty(items)?),
        ExportFormat::Markdown => Ok(export_markdown(items)),
    }
}

fn export_plain_text(items: &[TestCase]) -> String {
    let mut content = String::from("TEST CASES\n");
    content.push_str(&"=".repeat(80));
    content.push_str("\n\n");

    for (index, tc) in items.iter().enumerate() {
        content.push_str(&display_id(tc, index));
        content.push('\n');
        content.push_str(&"-".repeat(80));
        content.push('\n');
        content.push_str(&format!("Description: {}\n", tc.description));
        content.push_str(&format!("Preconditions: {}\n", tc.preconditions));
        content.push_str(&format!("Steps: {}\n", tc.steps.joined()));
        content.push_str(&format!("Expected Result: {}\n\n", tc.expected_result));
    }

    content
}

fn export_markdown(items: &[TestCase]) -> String {
    let mut content = String::from("# Test Cases\n\n");

    for (index, tc) in items.iter().enumerate() {
        content.push_str(&format!("## {}\n\n", display_id(tc, index)));
        if let Some(feature) = &tc.feature {
            content.push_str(&format!("**Feature:** {feature}\n\n"));
        }
        content.push_str(&format!("**Description:** {}\n\n", tc.description));
        content.push_str(&format!("**Preconditions:** {}\n\n", tc.preconditions));

        match &tc.steps {
            Steps::List(steps) => {
                content.push_str("**Steps:**\n\n");
                for (number, step) in steps.iter().enumerate() {
                    content.push_str(&format!("{}. {}\n", number + 1, step));
                }
                content.push('\n');
            }
            Steps::Text(text) => {
                content.push_str(&format!("**Steps:** {text}\n\n"));
            }
        }

        content.push_str(&format!("**Expected Result:** {}\n\n", tc.expected_result));

        if let Some(flag) = &tc.hallucination {
            if flag.flagged {
                content.push_str(&format!("**Potential Hallucination:** {}\n\n", flag.reason));
            }
        }
    }

    content
}

/// Sheets fall back to positional ids where the decoder's "No ID" default
/// would look like data.
fn display_id(tc: &TestCase, index: usize) -> String {
    if tc.id.is_empty() || tc.id == "No ID" {
        format!("TC-{}", index + 1)
    } else {
        tc.id.clone()
    }
}
