//! Service tests against an in-memory record store.
//!
//! These check the read-through and invalidation discipline: cached reads do
//! not reach the store, and every mutation is visible to the next read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::*;
use crate::cache::{ManualClock, TtlPolicy};
use crate::error::{Result, StudioError};
use crate::models::{
    AssignmentStatus, Recital, RecitalParticipant, ReportRequest, SheetMusic, Student,
    TemplateRequest, Transaction, TransactionKind, TuitionPayment,
};
use crate::sheets::{MemorySheets, Row, SheetBackend};

fn row(cells: &[&str]) -> Row {
    cells.iter().map(|c| c.to_string()).collect()
}

fn setup(sheets: MemorySheets) -> (Arc<MemorySheets>, DataCache, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));
    let cache = DataCache::with_clock(TtlPolicy::default(), clock.clone());
    (Arc::new(sheets), cache, clock)
}

/// A store that is always down.
struct UnavailableSheets;

#[async_trait]
impl SheetBackend for UnavailableSheets {
    async fn read_rows(&self, _sheet: &str) -> Result<Vec<Row>> {
        Err(StudioError::Backend("quota exceeded".into()))
    }

    async fn append_row(&self, _sheet: &str, _row: Row) -> Result<()> {
        Err(StudioError::Backend("quota exceeded".into()))
    }

    async fn update_row(&self, _sheet: &str, _index: usize, _row: Row) -> Result<()> {
        Err(StudioError::Backend("quota exceeded".into()))
    }

    async fn delete_row(&self, _sheet: &str, _index: usize) -> Result<()> {
        Err(StudioError::Backend("quota exceeded".into()))
    }
}

/// Parks the first read until `release` is notified, with the rows it saw
/// already in hand.
struct GatedSheets {
    inner: MemorySheets,
    armed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedSheets {
    fn new(inner: MemorySheets) -> Self {
        Self {
            inner,
            armed: AtomicBool::new(true),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }
}

#[async_trait]
impl SheetBackend for GatedSheets {
    async fn read_rows(&self, sheet: &str) -> Result<Vec<Row>> {
        let rows = self.inner.read_rows(sheet).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(rows)
    }

    async fn append_row(&self, sheet: &str, row: Row) -> Result<()> {
        self.inner.append_row(sheet, row).await
    }

    async fn update_row(&self, sheet: &str, index: usize, row: Row) -> Result<()> {
        self.inner.update_row(sheet, index, row).await
    }

    async fn delete_row(&self, sheet: &str, index: usize) -> Result<()> {
        self.inner.delete_row(sheet, index).await
    }
}

fn student(id: i64, name: &str) -> Student {
    let id = id.to_string();
    Student::from_row(&row(&[id.as_str(), name]))
}

// == Students ==

#[tokio::test]
async fn test_students_served_from_cache_within_ttl() {
    let (sheets, cache, clock) = setup(
        MemorySheets::new().with_rows("Students", vec![row(&["1", "Aiko"]), row(&["2", "Ben"])]),
    );
    let service = StudentService::new(sheets.clone(), cache);

    assert_eq!(service.list().await.len(), 2);
    clock.advance(59_000);
    assert_eq!(service.list().await.len(), 2);
    assert_eq!(sheets.reads(), 1);

    clock.advance(2_000);
    assert_eq!(service.list().await.len(), 2);
    assert_eq!(sheets.reads(), 2, "stale entry must be refetched");
}

#[tokio::test]
async fn test_student_save_invalidates() {
    let (sheets, cache, _) = setup(MemorySheets::new().with_rows("Students", vec![row(&["1", "Aiko"])]));
    let service = StudentService::new(sheets.clone(), cache);
    assert_eq!(service.list().await[0].name, "Aiko");

    service.save(&student(1, "Aiko Sato")).await.unwrap();
    service.save(&student(2, "Ben")).await.unwrap();

    let names: Vec<_> = service.list().await.into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec!["Aiko Sato", "Ben"]);
}

#[tokio::test]
async fn test_student_delete() {
    let (sheets, cache, _) = setup(
        MemorySheets::new().with_rows("Students", vec![row(&["1", "Aiko"]), row(&["2", "Ben"])]),
    );
    let service = StudentService::new(sheets, cache);
    service.list().await;

    service.delete(1).await.unwrap();
    let students = service.list().await;
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].id, 2);

    assert!(matches!(service.delete(1).await, Err(StudioError::NotFound(_))));
}

#[tokio::test]
async fn test_backend_failure_degrades_to_empty() {
    let (_, cache, _) = setup(MemorySheets::new());
    let service = StudentService::new(Arc::new(UnavailableSheets), cache.clone());

    assert!(service.list().await.is_empty());
    assert!(cache.students.read().await.is_empty(), "failures are not cached");

    let saved = service.save(&student(1, "Aiko")).await;
    assert!(matches!(saved, Err(StudioError::Backend(_))));
}

#[tokio::test]
async fn test_save_during_slow_read_is_not_lost() {
    let sheets = Arc::new(GatedSheets::new(
        MemorySheets::new().with_rows("Students", vec![row(&["1", "Aiko"])]),
    ));
    let (_, cache, _) = setup(MemorySheets::new());
    let service = StudentService::new(sheets.clone(), cache);

    let reader = {
        let service = service.clone();
        tokio::spawn(async move { service.list().await })
    };
    sheets.entered.notified().await;

    service.save(&student(1, "Aiko Sato")).await.unwrap();
    sheets.release.notify_one();

    // The slow reader still answers with what it read
    assert_eq!(reader.await.unwrap()[0].name, "Aiko");
    assert_eq!(service.list().await[0].name, "Aiko Sato");
}

// == Recitals ==

#[tokio::test]
async fn test_recitals_sorted_newest_first() {
    let (sheets, cache, _) = setup(MemorySheets::new().with_rows(
        "Recitals",
        vec![
            row(&["1", "Spring 2023", "2023-04-01"]),
            row(&["2", "Undated", ""]),
            row(&["3", "Spring 2024", "2024-04-01"]),
        ],
    ));
    let service = RecitalService::new(sheets, cache);

    let ids: Vec<_> = service.list().await.into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
}

#[tokio::test]
async fn test_recital_save_keeps_participants() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let service = RecitalService::new(sheets, cache);
    assert!(service.list().await.is_empty());

    let recital = Recital {
        id: 10,
        name: "Summer Concert".into(),
        date: "2024-08-10".into(),
        location: "Community Hall".into(),
        description: String::new(),
        participants: vec![RecitalParticipant {
            id: None,
            student_id: Some(1),
            student_name: "Aiko".into(),
            piece: "Gymnopédie No. 1".into(),
            order: 1,
            is_guest: false,
            student_recital_record_id: None,
        }],
    };
    service.save(&recital).await.unwrap();

    assert_eq!(service.list().await, vec![recital]);
}

// == Sheet Music ==

#[tokio::test]
async fn test_sheet_music_mutations_visible_immediately() {
    let (sheets, cache, _) = setup(MemorySheets::new().with_rows(
        "SheetMusic",
        vec![row(&["1", "Prelude in C", "Bach", "2"])],
    ));
    let service = SheetMusicService::new(sheets.clone(), cache);
    assert_eq!(service.list().await.len(), 1);

    let mut music = SheetMusic::from_row(&row(&["2", "Clair de Lune", "Debussy", "4"]));
    service.save(&music).await.unwrap();
    assert_eq!(service.list().await.len(), 2);

    music.difficulty = Some(5);
    service.save(&music).await.unwrap();
    assert_eq!(service.list().await[1].difficulty, Some(5));

    service.delete(1).await.unwrap();
    assert_eq!(service.list().await.len(), 1);
}

#[tokio::test]
async fn test_sheet_music_by_textbook() {
    let (sheets, cache, _) = setup(MemorySheets::new().with_rows(
        "SheetMusic",
        vec![
            row(&["1", "No. 2", "", "", "", "", "", "7", "2"]),
            row(&["2", "Other", "", "", "", "", "", "8", "1"]),
            row(&["3", "No. 1", "", "", "", "", "", "7", "1"]),
        ],
    ));
    let service = SheetMusicService::new(sheets, cache);

    let titles: Vec<_> = service
        .list_for_textbook(7)
        .await
        .into_iter()
        .map(|m| m.title)
        .collect();
    assert_eq!(titles, vec!["No. 1", "No. 2"]);
}

#[tokio::test]
async fn test_sheet_music_assignments() {
    let (sheets, cache, clock) = setup(MemorySheets::new());
    // 2024-03-01T00:00:00Z
    clock.set(1_709_251_200_000);
    let service = SheetMusicService::new(sheets, cache);
    assert!(service.assignments(None).await.is_empty());

    let assignment = service.assign(4, 1, "Aiko").await.unwrap();
    assert_eq!(assignment.assigned_at, "2024-03-01");
    assert_eq!(assignment.status, AssignmentStatus::Practicing);
    service.assign(4, 2, "Ben").await.unwrap();
    service.assign(5, 1, "Aiko").await.unwrap();

    assert_eq!(service.assignments(None).await.len(), 3);
    let students: Vec<_> = service
        .assignments(Some(4))
        .await
        .into_iter()
        .map(|a| a.student_id)
        .collect();
    assert_eq!(students, vec![1, 2]);

    service.remove_assignment(4, 1).await.unwrap();
    assert_eq!(service.assignments(Some(4)).await.len(), 1);
    assert_eq!(service.assignments(Some(5)).await.len(), 1);

    let missing = service.remove_assignment(4, 1).await;
    assert!(matches!(missing, Err(StudioError::NotFound(_))));
}

// == Templates ==

fn template_request(label: &str, text: &str) -> TemplateRequest {
    TemplateRequest {
        label: label.into(),
        text: text.into(),
    }
}

#[tokio::test]
async fn test_templates_list_defaults_then_custom() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let service = TemplateService::new(sheets, cache);
    assert_eq!(service.list().await.len(), 10);

    let id = service.create(&template_request("Scales", "Practise {scale}")).await.unwrap();
    let templates = service.list().await;
    assert_eq!(templates.len(), 11);
    assert_eq!(templates[10].id, id);
    assert!(templates[10].is_custom);
}

#[tokio::test]
async fn test_template_ids_are_unique() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let service = TemplateService::new(sheets, cache);

    let first = service.create(&template_request("A", "a")).await.unwrap();
    let second = service.create(&template_request("B", "b")).await.unwrap();
    assert!(second > first);
}

#[tokio::test]
async fn test_template_ids_follow_cache_clock() {
    let (sheets, cache, clock) = setup(MemorySheets::new());
    let service = TemplateService::new(sheets, cache);

    let first = service.create(&template_request("A", "a")).await.unwrap();
    assert_eq!(first, 1_700_000_000_000);

    // Same millisecond: bumped past the newest id
    let second = service.create(&template_request("B", "b")).await.unwrap();
    assert_eq!(second, first + 1);

    clock.advance(5_000);
    let third = service.create(&template_request("C", "c")).await.unwrap();
    assert_eq!(third, 1_700_000_005_000);
}

#[tokio::test]
async fn test_template_update_and_delete() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let service = TemplateService::new(sheets, cache);
    let id = service.create(&template_request("Draft", "old")).await.unwrap();
    service.list().await;

    service.update(id, &template_request("Final", "new {piece}")).await.unwrap();
    let updated = service.list().await.into_iter().find(|t| t.id == id).unwrap();
    assert_eq!(updated.label, "Final");

    service.delete(id).await.unwrap();
    assert_eq!(service.list().await.len(), 10);

    let missing = service.update(id, &template_request("x", "y")).await;
    assert!(matches!(missing, Err(StudioError::NotFound(_))));
}

#[tokio::test]
async fn test_built_in_templates_are_read_only() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let service = TemplateService::new(sheets, cache);

    let built_ins = service.list().await.iter().filter(|t| !t.is_custom).count();
    assert_eq!(built_ins, 10);

    for id in 1..=10 {
        let update = service.update(id, &template_request("x", "y")).await;
        assert!(matches!(update, Err(StudioError::ReadOnly(_))), "template {}", id);
        assert!(matches!(service.delete(id).await, Err(StudioError::ReadOnly(_))));
    }

    let custom = service.update(11, &template_request("x", "y")).await;
    assert!(matches!(custom, Err(StudioError::NotFound(_))));
}

#[tokio::test]
async fn test_templates_fall_back_to_built_ins() {
    let (_, cache, _) = setup(MemorySheets::new());
    let service = TemplateService::new(Arc::new(UnavailableSheets), cache);

    let templates = service.list().await;
    assert_eq!(templates, default_templates());
}

#[tokio::test]
async fn test_render_template() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let service = TemplateService::new(sheets, cache);
    let id = service
        .create(&template_request("Short", "{piece} went well; next: {next_goal}"))
        .await
        .unwrap();

    let values: HashMap<String, String> = [("piece", "Minuet"), ("next_goal", "legato")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let text = service.render(id, &values).await.unwrap();
    assert_eq!(text, "Minuet went well; next: legato");

    assert!(matches!(service.render(999, &values).await, Err(StudioError::NotFound(_))));
}

// == Report History ==

fn report_request(student_id: i64, date: &str, message: &str) -> ReportRequest {
    ReportRequest {
        student_id,
        student_name: format!("Student {}", student_id),
        date: date.into(),
        message: message.into(),
        template_label: String::new(),
    }
}

#[tokio::test]
async fn test_report_history_newest_first_per_student() {
    let (sheets, cache, clock) = setup(MemorySheets::new());
    let service = ReportHistoryService::new(sheets, cache);

    let first = service.save(&report_request(1, "2024-04-02", "Scales")).await.unwrap();
    assert_eq!(first, 1_700_000_000_000);
    clock.advance(10);
    service.save(&report_request(2, "2024-04-03", "Arpeggios")).await.unwrap();
    clock.advance(10);
    service.save(&report_request(1, "2024-04-09", "Sonatina")).await.unwrap();

    let messages: Vec<_> = service
        .list(Some(1))
        .await
        .into_iter()
        .map(|r| r.message)
        .collect();
    assert_eq!(messages, vec!["Sonatina", "Scales"]);
    assert_eq!(service.list(None).await.len(), 3);
    assert!(service.list(Some(7)).await.is_empty());
}

#[tokio::test]
async fn test_report_history_unavailable() {
    let (_, cache, _) = setup(MemorySheets::new());
    let service = ReportHistoryService::new(Arc::new(UnavailableSheets), cache);

    assert!(service.list(None).await.is_empty());
    let saved = service.save(&report_request(1, "2024-04-02", "x")).await;
    assert!(matches!(saved, Err(StudioError::Backend(_))));
}

// == Finance ==

fn transaction(id: i64, kind: TransactionKind, amount: i64, date: &str) -> Transaction {
    Transaction {
        id,
        kind,
        category: "Lessons".into(),
        description: String::new(),
        amount,
        date: date.into(),
        student_name: None,
        student_id: None,
    }
}

#[tokio::test]
async fn test_transactions_cached_for_a_minute() {
    let (sheets, cache, clock) = setup(MemorySheets::new().with_rows(
        "Finance",
        vec![row(&["1", "income", "Tuition", "", "8000", "2024-05-01"])],
    ));
    let service = FinanceService::new(sheets.clone(), cache);

    assert_eq!(service.list().await.len(), 1);
    sheets
        .append_row("Finance", row(&["2", "expense", "Books", "", "1500", "2024-05-02"]))
        .await
        .unwrap();

    clock.advance(59_999);
    assert_eq!(service.list().await.len(), 1);
    assert_eq!(sheets.reads(), 1);

    clock.advance(1);
    assert_eq!(service.list().await.len(), 2);
    assert_eq!(sheets.reads(), 2);
}

#[tokio::test]
async fn test_transaction_mutations_invalidate() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let service = FinanceService::new(sheets, cache.clone());
    assert!(service.list().await.is_empty());

    let mut tx = transaction(1, TransactionKind::Income, 8_000, "2024-05-01");
    service.add(&tx).await.unwrap();
    assert_eq!(service.list().await, vec![tx.clone()]);

    let duplicate = service.add(&tx).await;
    assert!(matches!(duplicate, Err(StudioError::InvalidRequest(_))));

    tx.amount = 9_000;
    service.update(&tx).await.unwrap();
    assert_eq!(service.list().await[0].amount, 9_000);

    service.delete(1).await.unwrap();
    assert!(service.list().await.is_empty());

    assert!(matches!(service.update(&tx).await, Err(StudioError::NotFound(_))));
    assert!(matches!(service.delete(1).await, Err(StudioError::NotFound(_))));
    assert_eq!(cache.transactions.read().await.stats().invalidations, 3);
}

#[tokio::test]
async fn test_transactions_by_month_and_summary() {
    let (sheets, cache, clock) = setup(MemorySheets::new());
    // 2024-03-15T00:00:00Z
    clock.set(1_710_460_800_000);
    let service = FinanceService::new(sheets, cache);

    for tx in [
        transaction(1, TransactionKind::Income, 20_000, "2024-03-01"),
        transaction(2, TransactionKind::Expense, 4_000, "2024-03-10"),
        transaction(3, TransactionKind::Income, 18_000, "2024-02-01"),
        transaction(4, TransactionKind::Income, 50_000, "2023-03-01"),
    ] {
        service.add(&tx).await.unwrap();
    }

    let march: Vec<_> = service
        .list_for_month(2024, 3)
        .await
        .into_iter()
        .map(|tx| tx.id)
        .collect();
    assert_eq!(march, vec![1, 2]);

    let summary = service.monthly_summary(2).await;
    assert_eq!(summary.len(), 2);
    assert_eq!(summary[0].month, "2024/2");
    assert_eq!(summary[0].income, 18_000);
    assert_eq!(summary[1].month, "2024/3");
    assert_eq!(summary[1].profit, 16_000);

    let year = service.monthly_summary(12).await;
    assert_eq!(year[0].month, "2023/4");
    assert_eq!(year.iter().map(|m| m.income).sum::<i64>(), 38_000);
}

fn payment(student_id: i64, month: u32, paid: bool) -> TuitionPayment {
    TuitionPayment {
        student_id,
        student_name: format!("Student {}", student_id),
        year: 2024,
        month,
        paid,
        paid_date: paid.then(|| "2024-05-03".to_string()),
        amount: 8_000,
    }
}

#[tokio::test]
async fn test_tuition_payment_upsert() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let service = FinanceService::new(sheets.clone(), cache);

    service.save_tuition_payment(&payment(1, 5, false)).await.unwrap();
    service.save_tuition_payment(&payment(2, 5, true)).await.unwrap();
    service.save_tuition_payment(&payment(1, 6, false)).await.unwrap();
    service.save_tuition_payment(&payment(1, 5, true)).await.unwrap();

    assert_eq!(sheets.read_rows("TuitionPayments").await.unwrap().len(), 3);

    let may = service.tuition_payments(2024, 5).await;
    assert_eq!(may.len(), 2);
    assert!(may.iter().all(|p| p.paid && p.amount == 8_000));
    assert!(service.tuition_payments(2023, 5).await.is_empty());
}

// == Shared Cache ==

#[tokio::test]
async fn test_invalidate_all_forces_refetch() {
    let (sheets, cache, _) = setup(MemorySheets::new());
    let students = StudentService::new(sheets.clone(), cache.clone());
    let recitals = RecitalService::new(sheets.clone(), cache.clone());

    students.list().await;
    recitals.list().await;
    assert_eq!(sheets.reads(), 2);

    students.list().await;
    recitals.list().await;
    assert_eq!(sheets.reads(), 2);

    cache.invalidate_all().await;
    students.list().await;
    recitals.list().await;
    assert_eq!(sheets.reads(), 4);
}
