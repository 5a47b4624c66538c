//! Request DTOs for the studio API
//!
//! Record upserts take the record itself as the body; the types here cover
//! the endpoints whose bodies are not a full record.

use std::collections::HashMap;

use serde::Deserialize;

use crate::models::parse_date;

/// Maximum length of a template label in characters
pub const MAX_LABEL_LENGTH: usize = 100;

/// Returns an error message when a required text field is blank.
pub fn require_text(field: &str, value: &str) -> Option<String> {
    if value.trim().is_empty() {
        Some(format!("{} cannot be empty", field))
    } else {
        None
    }
}

/// Request body for creating or editing a custom template
/// (POST /templates, PUT /templates/:id)
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateRequest {
    pub label: String,
    pub text: String,
}

impl TemplateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(msg) = require_text("Label", &self.label) {
            return Some(msg);
        }
        if self.label.chars().count() > MAX_LABEL_LENGTH {
            return Some(format!(
                "Label exceeds maximum length of {} characters",
                MAX_LABEL_LENGTH
            ));
        }
        require_text("Text", &self.text)
    }
}

/// Request body for POST /templates/:id/render
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RenderRequest {
    /// Placeholder name to replacement text
    #[serde(default)]
    pub values: HashMap<String, String>,
}

/// Request body for POST /sheet-music/:id/assignments
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub student_id: i64,
    pub student_name: String,
}

/// Request body for POST /reports
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub student_id: i64,
    pub student_name: String,
    pub date: String,
    pub message: String,
    #[serde(default)]
    pub template_label: String,
}

impl ReportRequest {
    pub fn validate(&self) -> Option<String> {
        require_text("Message", &self.message).or_else(|| {
            parse_date(&self.date)
                .is_none()
                .then(|| format!("Invalid date '{}'", self.date))
        })
    }
}

// == Query Strings ==
/// `?year=&month=` filter; both or neither must be given.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// `?months=` for the monthly summary
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    pub months: Option<u32>,
}

/// `?studentId=` filter for report history
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub student_id: Option<i64>,
}

/// Checks a 1-based calendar month.
pub fn validate_month(month: u32) -> Option<String> {
    (!(1..=12).contains(&month)).then(|| format!("Month must be between 1 and 12, got {}", month))
}
