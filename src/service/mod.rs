pub mod access;
pub mod classifier;
pub mod importer;
pub mod resolver;
pub mod semaphore;
pub mod tabular;

pub use importer::{ImportService, ImportSummary};
pub use resolver::{resolve, Calendar, Resolver};
pub use semaphore::{RecomputeSummary, SemaphoreService};

/// Reference day for deadline arithmetic (local calendar date)
pub fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
