//! Studio records and their spreadsheet row layouts.
//!
//! Every record keeps its id in the first column. Nested lists (a student's
//! pieces, a recital's programme) are stored as a JSON cell.

use chrono::{DateTime, NaiveDate};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::sheets::{cell, optional_cell, parse_cell, Row};

fn json_cell<T: DeserializeOwned + Default>(row: &[String], index: usize, what: &str) -> T {
    let text = cell(row, index).trim();
    if text.is_empty() {
        return T::default();
    }
    serde_json::from_str(text).unwrap_or_else(|err| {
        warn!(column = what, error = %err, "unreadable JSON cell, treating as empty");
        T::default()
    })
}

fn text(row: &[String], index: usize) -> String {
    cell(row, index).to_string()
}

/// Reads an ISO date, or the date part of an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

fn non_empty(row: &[String], index: usize) -> Option<String> {
    let value = cell(row, index);
    (!value.is_empty()).then(|| value.to_string())
}

// == Students ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceStatus {
    #[default]
    Active,
    Completed,
}

/// A piece a student is working on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Piece {
    pub id: i64,
    pub title: String,
    /// Percent complete, 0-100
    pub progress: u8,
    #[serde(default)]
    pub status: PieceStatus,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub lesson_day: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub pieces: Vec<Piece>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub parent_name: String,
    #[serde(default)]
    pub parent_phone: String,
    #[serde(default)]
    pub birth_date: String,
    #[serde(default)]
    pub memo: String,
}

fn default_color() -> String {
    "bg-gray-500".to_string()
}

impl Student {
    pub fn from_row(row: &[String]) -> Self {
        let color = cell(row, 5);
        Self {
            id: parse_cell(row, 0).unwrap_or_default(),
            name: text(row, 1),
            phone: text(row, 2),
            address: text(row, 3),
            lesson_day: text(row, 4),
            color: if color.is_empty() { default_color() } else { color.to_string() },
            pieces: json_cell(row, 6, "pieces"),
            email: text(row, 7),
            parent_name: text(row, 8),
            parent_phone: text(row, 9),
            birth_date: text(row, 10),
            memo: text(row, 11),
        }
    }

    pub fn to_row(&self) -> Result<Row> {
        Ok(vec![
            self.id.to_string(),
            self.name.clone(),
            self.phone.clone(),
            self.address.clone(),
            self.lesson_day.clone(),
            self.color.clone(),
            serde_json::to_string(&self.pieces)?,
            self.email.clone(),
            self.parent_name.clone(),
            self.parent_phone.clone(),
            self.birth_date.clone(),
            self.memo.clone(),
        ])
    }
}

// == Recitals ==
/// One slot in a recital programme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecitalParticipant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
    pub student_name: String,
    pub piece: String,
    pub order: u32,
    #[serde(default)]
    pub is_guest: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_recital_record_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recital {
    pub id: i64,
    pub name: String,
    /// ISO date, `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub participants: Vec<RecitalParticipant>,
}

impl Recital {
    pub fn from_row(row: &[String]) -> Self {
        Self {
            id: parse_cell(row, 0).unwrap_or_default(),
            name: text(row, 1),
            date: text(row, 2),
            location: text(row, 3),
            description: text(row, 4),
            participants: json_cell(row, 5, "participants"),
        }
    }

    pub fn to_row(&self) -> Result<Row> {
        Ok(vec![
            self.id.to_string(),
            self.name.clone(),
            self.date.clone(),
            self.location.clone(),
            self.description.clone(),
            serde_json::to_string(&self.participants)?,
        ])
    }

    /// Parsed date; `None` when the cell is not a date.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

// == Sheet Music ==
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetMusic {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub composer: String,
    /// 1 (easiest) to 5
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub pdf_url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub textbook_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_in_textbook: Option<u32>,
}

impl SheetMusic {
    pub fn from_row(row: &[String]) -> Self {
        Self {
            id: parse_cell(row, 0).unwrap_or_default(),
            title: text(row, 1),
            composer: text(row, 2),
            difficulty: parse_cell(row, 3),
            genre: text(row, 4),
            pdf_url: text(row, 5),
            notes: text(row, 6),
            textbook_id: parse_cell(row, 7),
            order_in_textbook: parse_cell(row, 8),
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.id.to_string(),
            self.title.clone(),
            self.composer.clone(),
            optional_cell(&self.difficulty),
            self.genre.clone(),
            self.pdf_url.clone(),
            self.notes.clone(),
            optional_cell(&self.textbook_id),
            optional_cell(&self.order_in_textbook),
        ]
    }
}

// == Sheet Music Assignments ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    #[default]
    Practicing,
    Completed,
}

impl AssignmentStatus {
    fn from_cell(value: &str) -> Self {
        match value.trim() {
            "completed" => AssignmentStatus::Completed,
            _ => AssignmentStatus::Practicing,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            AssignmentStatus::Practicing => "practicing",
            AssignmentStatus::Completed => "completed",
        }
    }
}

/// A piece of sheet music handed to a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAssignment {
    pub sheet_music_id: i64,
    pub student_id: i64,
    pub student_name: String,
    /// ISO date the piece was assigned
    pub assigned_at: String,
    #[serde(default)]
    pub status: AssignmentStatus,
}

impl StudentAssignment {
    pub fn from_row(row: &[String]) -> Self {
        Self {
            sheet_music_id: parse_cell(row, 0).unwrap_or_default(),
            student_id: parse_cell(row, 1).unwrap_or_default(),
            student_name: text(row, 2),
            assigned_at: text(row, 3),
            status: AssignmentStatus::from_cell(cell(row, 4)),
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.sheet_music_id.to_string(),
            self.student_id.to_string(),
            self.student_name.clone(),
            self.assigned_at.clone(),
            self.status.as_str().to_string(),
        ]
    }
}

// == Report Templates ==
/// A lesson-report template. Built-in templates are not custom and cannot be
/// edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTemplate {
    pub id: i64,
    pub label: String,
    pub text: String,
    pub is_custom: bool,
}

impl ReportTemplate {
    /// Rows in the templates sheet are always custom.
    pub fn from_row(row: &[String]) -> Self {
        Self {
            id: parse_cell(row, 0).unwrap_or_default(),
            label: text(row, 1),
            text: text(row, 2),
            is_custom: true,
        }
    }

    pub fn to_row(&self) -> Row {
        vec![self.id.to_string(), self.label.clone(), self.text.clone()]
    }
}

// == Report History ==
/// A lesson report that was sent to a student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHistory {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub date: String,
    pub message: String,
    #[serde(default)]
    pub template_label: String,
}

impl ReportHistory {
    pub fn from_row(row: &[String]) -> Self {
        Self {
            id: parse_cell(row, 0).unwrap_or_default(),
            student_id: parse_cell(row, 1).unwrap_or_default(),
            student_name: text(row, 2),
            date: text(row, 3),
            message: text(row, 4),
            template_label: text(row, 5),
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.id.to_string(),
            self.student_id.to_string(),
            self.student_name.clone(),
            self.date.clone(),
            self.message.clone(),
            self.template_label.clone(),
        ]
    }
}

// == Finance ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    fn from_cell(value: &str) -> Option<Self> {
        match value.trim() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// One line of the studio's books. Amounts are whole yen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub amount: i64,
    /// ISO date
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<i64>,
}

impl Transaction {
    /// `None` for rows whose type column is neither income nor expense.
    pub fn from_row(row: &[String]) -> Option<Self> {
        let Some(kind) = TransactionKind::from_cell(cell(row, 1)) else {
            warn!(row = cell(row, 0), kind = cell(row, 1), "skipping transaction of unknown type");
            return None;
        };
        Some(Self {
            id: parse_cell(row, 0).unwrap_or_default(),
            kind,
            category: text(row, 2),
            description: text(row, 3),
            amount: parse_cell(row, 4).unwrap_or_default(),
            date: text(row, 5),
            student_name: non_empty(row, 6),
            student_id: parse_cell(row, 7),
        })
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.id.to_string(),
            self.kind.as_str().to_string(),
            self.category.clone(),
            self.description.clone(),
            self.amount.to_string(),
            self.date.clone(),
            self.student_name.clone().unwrap_or_default(),
            optional_cell(&self.student_id),
        ]
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }
}

/// Whether a student's tuition for one month has been paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TuitionPayment {
    pub student_id: i64,
    pub student_name: String,
    pub year: i32,
    /// 1-12
    pub month: u32,
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_date: Option<String>,
    #[serde(default)]
    pub amount: i64,
}

impl TuitionPayment {
    pub fn from_row(row: &[String]) -> Self {
        Self {
            student_id: parse_cell(row, 0).unwrap_or_default(),
            student_name: text(row, 1),
            year: parse_cell(row, 2).unwrap_or_default(),
            month: parse_cell(row, 3).unwrap_or_default(),
            paid: cell(row, 4).trim().eq_ignore_ascii_case("true"),
            paid_date: non_empty(row, 5),
            amount: parse_cell(row, 6).unwrap_or_default(),
        }
    }

    pub fn to_row(&self) -> Row {
        vec![
            self.student_id.to_string(),
            self.student_name.clone(),
            self.year.to_string(),
            self.month.to_string(),
            if self.paid { "TRUE" } else { "FALSE" }.to_string(),
            self.paid_date.clone().unwrap_or_default(),
            self.amount.to_string(),
        ]
    }

    /// Whether this row records the same student and month as `other`.
    pub fn same_period(&self, other: &TuitionPayment) -> bool {
        self.student_id == other.student_id && self.year == other.year && self.month == other.month
    }
}
