use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest title accepted for a course.
pub const MAX_TITLE_LEN: usize = 100;

/// A course row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub title: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create/update payload as sent by the client. `id` and the timestamps are
/// read-only and ignored if a client sends them.
///
/// The outer `Option` is whether the key was present, the inner one whether
/// its value was `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoursePayload {
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub summary: Option<Option<String>>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Validated field values with surrounding whitespace trimmed. `None` leaves
/// the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub summary: Option<String>,
}

/// Field name -> list of messages, serialized as the 400 body.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

impl CoursePayload {
    /// Validate the payload. With `partial`, absent fields are allowed
    /// (PATCH); otherwise every writable field is required (POST).
    pub fn validate(&self, partial: bool) -> Result<CourseChanges, FieldErrors> {
        let mut errors = FieldErrors::new();
        let title = check_text(&mut errors, "title", self.title.as_ref(), partial, Some(MAX_TITLE_LEN));
        let summary = check_text(&mut errors, "summary", self.summary.as_ref(), partial, None);

        if errors.is_empty() {
            Ok(CourseChanges { title, summary })
        } else {
            Err(errors)
        }
    }
}

/// Trim and check one text field, recording at most one message for it.
fn check_text(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&Option<String>>,
    partial: bool,
    max_len: Option<usize>,
) -> Option<String> {
    let message = match value {
        None if partial => return None,
        None => "This field is required.".to_string(),
        Some(None) => "This field may not be null.".to_string(),
        Some(Some(raw)) => {
            let trimmed = raw.trim();
            match max_len {
                _ if trimmed.is_empty() => "This field may not be blank.".to_string(),
                Some(max) if trimmed.chars().count() > max => {
                    format!("Ensure this field has no more than {max} characters.")
                }
                _ => return Some(trimmed.to_string()),
            }
        }
    };
    push_error(errors, field, &message);
    None
}

fn push_error(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

/// Chat request after validation
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub query: String,
}

/// Chat response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Fetched page text with the page it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub url: String,
    pub text: String,
}
