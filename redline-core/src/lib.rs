pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod filter;
pub mod ipc;
pub mod models;
pub mod paginate;
pub mod severity;
pub mod store;

pub use config::RedlineConfig;
pub use engine::ModerationEngine;
pub use error::RedlineError;
pub use export::ExportFormat;
pub use filter::{CategoryFilter, DateRangeFilter, FilterSpec, RecordFilter, ReviewFilter};
pub use models::{
    Assessment, Category, CategoryFlagSet, CategoryScoreSet, ContentRef, ModerationRecord,
    RecordId, Score, ScoredAssessment,
};
pub use paginate::{page_links, paginate, Page, PageLink, View};
pub use severity::{categories_above, total_of, Classifier, SeverityBand};
pub use store::{RecordStore, Snapshot};
