//! Studio books: income and expense transactions, monthly totals, and
//! per-student tuition payments.
//!
//! Transactions are cached under `transactions`. Tuition payments are read
//! from the record store on every call.

use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{error, info};

use crate::cache::{read_through, Dataset};
use crate::error::{Result, StudioError};
use crate::models::{MonthlySummary, Transaction, TransactionKind, TuitionPayment};
use crate::services::DataCache;
use crate::sheets::{delete_row_by_id, find_row, SheetBackend};

const SHEET_NAME: &str = "Finance";
const TUITION_SHEET: &str = "TuitionPayments";

/// Months covered by the summary when the caller names none
pub const DEFAULT_SUMMARY_MONTHS: u32 = 12;

#[derive(Clone)]
pub struct FinanceService {
    backend: Arc<dyn SheetBackend>,
    cache: DataCache,
}

impl FinanceService {
    pub fn new(backend: Arc<dyn SheetBackend>, cache: DataCache) -> Self {
        Self { backend, cache }
    }

    // == Transactions ==

    /// Every transaction in sheet order. A backend failure yields an empty
    /// list.
    pub async fn list(&self) -> Vec<Transaction> {
        let dataset = Dataset::Transactions;
        read_through(
            &self.cache.transactions,
            dataset.key(),
            self.cache.ttl_ms(dataset),
            || self.fetch(),
        )
        .await
        .unwrap_or_else(|err| {
            error!(error = %err, "failed to fetch transactions");
            Vec::new()
        })
    }

    async fn fetch(&self) -> Result<Vec<Transaction>> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        Ok(rows.iter().filter_map(|row| Transaction::from_row(row)).collect())
    }

    /// Transactions dated in `month` (1-12) of `year`.
    pub async fn list_for_month(&self, year: i32, month: u32) -> Vec<Transaction> {
        self.list()
            .await
            .into_iter()
            .filter(|tx| in_month(tx, year, month))
            .collect()
    }

    /// Totals for the last `months` calendar months, oldest first, ending
    /// with the current month.
    pub async fn monthly_summary(&self, months: u32) -> Vec<MonthlySummary> {
        summarize(&self.list().await, months, self.cache.today())
    }

    /// Adds a transaction. Ids must be unique.
    pub async fn add(&self, transaction: &Transaction) -> Result<()> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        if find_row(&rows, transaction.id).is_some() {
            return Err(StudioError::InvalidRequest(format!(
                "transaction {} already exists",
                transaction.id
            )));
        }
        self.backend.append_row(SHEET_NAME, transaction.to_row()).await?;
        self.cache.invalidate(Dataset::Transactions).await;
        info!(id = transaction.id, amount = transaction.amount, "transaction added");
        Ok(())
    }

    /// Replaces the transaction with the same id.
    pub async fn update(&self, transaction: &Transaction) -> Result<()> {
        let rows = self.backend.read_rows(SHEET_NAME).await?;
        let index = find_row(&rows, transaction.id)
            .ok_or_else(|| StudioError::NotFound(format!("transaction {}", transaction.id)))?;
        self.backend
            .update_row(SHEET_NAME, index, transaction.to_row())
            .await?;
        self.cache.invalidate(Dataset::Transactions).await;
        info!(id = transaction.id, "transaction updated");
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        delete_row_by_id(self.backend.as_ref(), SHEET_NAME, id).await?;
        self.cache.invalidate(Dataset::Transactions).await;
        info!(id, "transaction deleted");
        Ok(())
    }

    // == Tuition ==

    /// Payment records for one month.
    pub async fn tuition_payments(&self, year: i32, month: u32) -> Vec<TuitionPayment> {
        match self.backend.read_rows(TUITION_SHEET).await {
            Ok(rows) => rows
                .iter()
                .map(|row| TuitionPayment::from_row(row))
                .filter(|payment| payment.year == year && payment.month == month)
                .collect(),
            Err(err) => {
                error!(error = %err, "failed to fetch tuition payments");
                Vec::new()
            }
        }
    }

    /// Records a payment status, replacing any earlier record for the same
    /// student and month.
    pub async fn save_tuition_payment(&self, payment: &TuitionPayment) -> Result<()> {
        let rows = self.backend.read_rows(TUITION_SHEET).await?;
        let existing = rows
            .iter()
            .position(|row| TuitionPayment::from_row(row).same_period(payment));
        match existing {
            Some(index) => {
                self.backend
                    .update_row(TUITION_SHEET, index, payment.to_row())
                    .await?
            }
            None => self.backend.append_row(TUITION_SHEET, payment.to_row()).await?,
        }
        info!(
            student_id = payment.student_id,
            year = payment.year,
            month = payment.month,
            paid = payment.paid,
            "tuition payment saved"
        );
        Ok(())
    }
}

fn in_month(tx: &Transaction, year: i32, month: u32) -> bool {
    tx.parsed_date()
        .is_some_and(|date| date.year() == year && date.month() == month)
}

/// `(year, month)` that is `back` months before the month of `today`.
fn month_before(today: NaiveDate, back: u32) -> (i32, u32) {
    let index = today.year() * 12 + today.month0() as i32 - back as i32;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Per-month income, expense and profit for the `months` months ending with
/// the month of `today`, oldest first. Months without transactions are zero.
pub fn summarize(transactions: &[Transaction], months: u32, today: NaiveDate) -> Vec<MonthlySummary> {
    (0..months)
        .rev()
        .map(|back| {
            let (year, month) = month_before(today, back);
            let (mut income, mut expense) = (0, 0);
            for tx in transactions.iter().filter(|tx| in_month(tx, year, month)) {
                match tx.kind {
                    TransactionKind::Income => income += tx.amount,
                    TransactionKind::Expense => expense += tx.amount,
                }
            }
            MonthlySummary {
                month: format!("{}/{}", year, month),
                income,
                expense,
                profit: income - expense,
            }
        })
        .collect()
}
