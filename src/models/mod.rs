//! Records and request/response models
//!
//! Studio records with their spreadsheet row layouts, plus the DTOs used for
//! serializing/deserializing HTTP bodies.

pub mod records;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use records::{
    parse_date, AssignmentStatus, Piece, PieceStatus, Recital, RecitalParticipant,
    ReportHistory, ReportTemplate, SheetMusic, Student, StudentAssignment, Transaction,
    TransactionKind, TuitionPayment,
};
pub use requests::{
    require_text, validate_month, AssignRequest, HistoryQuery, MonthQuery, RenderRequest,
    ReportRequest, SummaryQuery, TemplateRequest,
};
pub use responses::{
    DatasetStats, HealthResponse, InvalidateResponse, MonthlySummary, MutationResponse,
    RenderResponse, StatsResponse,
};
