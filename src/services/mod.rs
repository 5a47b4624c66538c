//! Data-Access Services
//!
//! One service per dataset. Reads go through the dataset's cache; every
//! mutation writes to the record store and then invalidates the dataset's key
//! before reporting success.

mod data_cache;
mod finance;
mod recitals;
mod report_history;
mod sheet_music;
mod students;
mod templates;

pub use data_cache::DataCache;
pub use finance::{summarize, FinanceService, DEFAULT_SUMMARY_MONTHS};
pub use recitals::RecitalService;
pub use report_history::ReportHistoryService;
pub use sheet_music::SheetMusicService;
pub use students::StudentService;
pub use templates::{default_templates, render_text, TemplateService};

#[cfg(test)]
mod tests;
