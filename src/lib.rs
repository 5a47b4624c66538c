//! Piano Studio - records service for a piano teacher
//!
//! Students, tuition and the studio's books, recitals, sheet music and
//! lesson reports kept in a spreadsheet-style record store, fronted by a TTL
//! read-through cache.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod sheets;

pub use api::AppState;
pub use config::Config;
pub use services::DataCache;
