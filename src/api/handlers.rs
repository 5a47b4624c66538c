//! API Handlers
//!
//! HTTP request handlers for each studio endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::cache::Dataset;
use crate::config::Config;
use crate::error::{Result, StudioError};
use crate::models::{
    parse_date, require_text, validate_month, AssignRequest, HealthResponse, HistoryQuery,
    InvalidateResponse, MonthQuery, MonthlySummary, MutationResponse, Recital, RenderRequest,
    RenderResponse, ReportHistory, ReportRequest, ReportTemplate, SheetMusic, StatsResponse,
    Student, StudentAssignment, SummaryQuery, TemplateRequest, Transaction, TuitionPayment,
};
use crate::services::{
    DataCache, FinanceService, RecitalService, ReportHistoryService, SheetMusicService,
    StudentService, TemplateService, DEFAULT_SUMMARY_MONTHS,
};
use crate::sheets::{MemorySheets, SheetBackend};

/// Application state shared across all handlers.
///
/// One `DataCache` is built here and handed to every service, so every
/// handler sees the same cached datasets.
#[derive(Clone)]
pub struct AppState {
    pub cache: DataCache,
    pub students: StudentService,
    pub finance: FinanceService,
    pub recitals: RecitalService,
    pub sheet_music: SheetMusicService,
    pub templates: TemplateService,
    pub reports: ReportHistoryService,
}

impl AppState {
    /// Wires every service to the given record store and cache.
    pub fn new(backend: Arc<dyn SheetBackend>, cache: DataCache) -> Self {
        Self {
            students: StudentService::new(backend.clone(), cache.clone()),
            finance: FinanceService::new(backend.clone(), cache.clone()),
            recitals: RecitalService::new(backend.clone(), cache.clone()),
            sheet_music: SheetMusicService::new(backend.clone(), cache.clone()),
            templates: TemplateService::new(backend.clone(), cache.clone()),
            reports: ReportHistoryService::new(backend, cache.clone()),
            cache,
        }
    }

    /// Creates a new AppState from configuration, backed by an in-memory
    /// record store.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(MemorySheets::new()),
            DataCache::new(config.ttl.clone()),
        )
    }
}

/// Longest window the monthly summary accepts
pub const MAX_SUMMARY_MONTHS: u32 = 120;

fn reject(problem: Option<String>) -> Result<()> {
    match problem {
        Some(msg) => Err(StudioError::InvalidRequest(msg)),
        None => Ok(()),
    }
}

fn reject_blank(field: &str, value: &str) -> Result<()> {
    reject(require_text(field, value))
}

/// Both halves of a month filter, or neither.
fn month_filter(query: &MonthQuery) -> Result<Option<(i32, u32)>> {
    match (query.year, query.month) {
        (None, None) => Ok(None),
        (Some(year), Some(month)) => {
            reject(validate_month(month))?;
            Ok(Some((year, month)))
        }
        _ => Err(StudioError::InvalidRequest(
            "year and month must be given together".to_string(),
        )),
    }
}

fn validate_transaction(transaction: &Transaction) -> Result<()> {
    if transaction.amount < 0 {
        return Err(StudioError::InvalidRequest(
            "Amount cannot be negative".to_string(),
        ));
    }
    if parse_date(&transaction.date).is_none() {
        return Err(StudioError::InvalidRequest(format!(
            "Invalid date '{}'",
            transaction.date
        )));
    }
    Ok(())
}

// == Students ==

/// Handler for GET /students
pub async fn list_students(State(state): State<AppState>) -> Json<Vec<Student>> {
    Json(state.students.list().await)
}

/// Handler for PUT /students
pub async fn save_student(
    State(state): State<AppState>,
    Json(student): Json<Student>,
) -> Result<Json<MutationResponse>> {
    reject_blank("Name", &student.name)?;
    state.students.save(&student).await?;
    Ok(Json(MutationResponse::ok(student.id)))
}

/// Handler for DELETE /students/:id
pub async fn delete_student(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MutationResponse>> {
    state.students.delete(id).await?;
    Ok(Json(MutationResponse::ok(id)))
}

// == Finance ==

/// Handler for GET /transactions, optionally `?year=&month=`
pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<Transaction>>> {
    let transactions = match month_filter(&query)? {
        Some((year, month)) => state.finance.list_for_month(year, month).await,
        None => state.finance.list().await,
    };
    Ok(Json(transactions))
}

/// Handler for POST /transactions
pub async fn add_transaction(
    State(state): State<AppState>,
    Json(transaction): Json<Transaction>,
) -> Result<Json<MutationResponse>> {
    validate_transaction(&transaction)?;
    state.finance.add(&transaction).await?;
    Ok(Json(MutationResponse::ok(transaction.id)))
}

/// Handler for PUT /transactions/:id
pub async fn update_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut transaction): Json<Transaction>,
) -> Result<Json<MutationResponse>> {
    transaction.id = id;
    validate_transaction(&transaction)?;
    state.finance.update(&transaction).await?;
    Ok(Json(MutationResponse::ok(id)))
}

/// Handler for DELETE /transactions/:id
pub async fn delete_transaction(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MutationResponse>> {
    state.finance.delete(id).await?;
    Ok(Json(MutationResponse::ok(id)))
}

/// Handler for GET /finance/summary?months=
pub async fn monthly_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Vec<MonthlySummary>>> {
    let months = query.months.unwrap_or(DEFAULT_SUMMARY_MONTHS);
    if !(1..=MAX_SUMMARY_MONTHS).contains(&months) {
        return Err(StudioError::InvalidRequest(format!(
            "months must be between 1 and {}",
            MAX_SUMMARY_MONTHS
        )));
    }
    Ok(Json(state.finance.monthly_summary(months).await))
}

/// Handler for GET /tuition?year=&month=
pub async fn list_tuition_payments(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<TuitionPayment>>> {
    let (year, month) = month_filter(&query)?.ok_or_else(|| {
        StudioError::InvalidRequest("year and month are required".to_string())
    })?;
    Ok(Json(state.finance.tuition_payments(year, month).await))
}

/// Handler for PUT /tuition
pub async fn save_tuition_payment(
    State(state): State<AppState>,
    Json(payment): Json<TuitionPayment>,
) -> Result<Json<MutationResponse>> {
    reject(validate_month(payment.month))?;
    state.finance.save_tuition_payment(&payment).await?;
    Ok(Json(MutationResponse::ok(payment.student_id)))
}

// == Recitals ==

/// Handler for GET /recitals
pub async fn list_recitals(State(state): State<AppState>) -> Json<Vec<Recital>> {
    Json(state.recitals.list().await)
}

/// Handler for PUT /recitals
pub async fn save_recital(
    State(state): State<AppState>,
    Json(recital): Json<Recital>,
) -> Result<Json<MutationResponse>> {
    reject_blank("Name", &recital.name)?;
    state.recitals.save(&recital).await?;
    Ok(Json(MutationResponse::ok(recital.id)))
}

/// Handler for DELETE /recitals/:id
pub async fn delete_recital(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MutationResponse>> {
    state.recitals.delete(id).await?;
    Ok(Json(MutationResponse::ok(id)))
}

// == Sheet Music ==

/// Handler for GET /sheet-music
pub async fn list_sheet_music(State(state): State<AppState>) -> Json<Vec<SheetMusic>> {
    Json(state.sheet_music.list().await)
}

/// Handler for GET /textbooks/:id/sheet-music
pub async fn list_textbook_sheet_music(
    State(state): State<AppState>,
    Path(textbook_id): Path<i64>,
) -> Json<Vec<SheetMusic>> {
    Json(state.sheet_music.list_for_textbook(textbook_id).await)
}

/// Handler for PUT /sheet-music
pub async fn save_sheet_music(
    State(state): State<AppState>,
    Json(music): Json<SheetMusic>,
) -> Result<Json<MutationResponse>> {
    reject_blank("Title", &music.title)?;
    if let Some(difficulty) = music.difficulty {
        if !(1..=5).contains(&difficulty) {
            return Err(StudioError::InvalidRequest(
                "Difficulty must be between 1 and 5".to_string(),
            ));
        }
    }
    state.sheet_music.save(&music).await?;
    Ok(Json(MutationResponse::ok(music.id)))
}

/// Handler for DELETE /sheet-music/:id
pub async fn delete_sheet_music(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MutationResponse>> {
    state.sheet_music.delete(id).await?;
    Ok(Json(MutationResponse::ok(id)))
}

/// Handler for GET /assignments
pub async fn list_assignments(State(state): State<AppState>) -> Json<Vec<StudentAssignment>> {
    Json(state.sheet_music.assignments(None).await)
}

/// Handler for GET /sheet-music/:id/assignments
pub async fn list_sheet_music_assignments(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Json<Vec<StudentAssignment>> {
    Json(state.sheet_music.assignments(Some(id)).await)
}

/// Handler for POST /sheet-music/:id/assignments
pub async fn assign_sheet_music(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<StudentAssignment>> {
    reject_blank("Student name", &req.student_name)?;
    let assignment = state
        .sheet_music
        .assign(id, req.student_id, &req.student_name)
        .await?;
    Ok(Json(assignment))
}

/// Handler for DELETE /sheet-music/:id/assignments/:student_id
pub async fn remove_assignment(
    State(state): State<AppState>,
    Path((id, student_id)): Path<(i64, i64)>,
) -> Result<Json<MutationResponse>> {
    state.sheet_music.remove_assignment(id, student_id).await?;
    Ok(Json(MutationResponse::ok(id)))
}

// == Report Templates ==

/// Handler for GET /templates
pub async fn list_templates(State(state): State<AppState>) -> Json<Vec<ReportTemplate>> {
    Json(state.templates.list().await)
}

/// Handler for POST /templates
pub async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<MutationResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(StudioError::InvalidRequest(error_msg));
    }
    let id = state.templates.create(&req).await?;
    Ok(Json(MutationResponse::ok(id)))
}

/// Handler for PUT /templates/:id
pub async fn update_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<TemplateRequest>,
) -> Result<Json<MutationResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(StudioError::InvalidRequest(error_msg));
    }
    state.templates.update(id, &req).await?;
    Ok(Json(MutationResponse::ok(id)))
}

/// Handler for DELETE /templates/:id
pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MutationResponse>> {
    state.templates.delete(id).await?;
    Ok(Json(MutationResponse::ok(id)))
}

/// Handler for POST /templates/:id/render
pub async fn render_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<RenderRequest>,
) -> Result<Json<RenderResponse>> {
    let text = state.templates.render(id, &req.values).await?;
    Ok(Json(RenderResponse { text }))
}

// == Report History ==

/// Handler for GET /reports, optionally `?studentId=`
pub async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Vec<ReportHistory>> {
    Json(state.reports.list(query.student_id).await)
}

/// Handler for POST /reports
pub async fn save_report(
    State(state): State<AppState>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<MutationResponse>> {
    reject(req.validate())?;
    let id = state.reports.save(&req).await?;
    Ok(Json(MutationResponse::ok(id)))
}

// == Cache Admin ==

/// Handler for GET /cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::new(state.cache.stats().await))
}

/// Handler for DELETE /cache
pub async fn invalidate_all(State(state): State<AppState>) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate_all().await;
    info!(removed, "cache cleared on request");
    Json(InvalidateResponse::new("all datasets", removed))
}

/// Handler for DELETE /cache/:dataset
pub async fn invalidate_dataset(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<InvalidateResponse>> {
    let dataset = Dataset::from_key(&key)
        .filter(|dataset| DataCache::is_cached(*dataset))
        .ok_or_else(|| StudioError::NotFound(format!("cached dataset '{}'", key)))?;
    let removed = state.cache.invalidate(dataset).await;
    info!(%dataset, removed, "dataset invalidated on request");
    Ok(Json(InvalidateResponse::new(dataset, removed)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
