pub mod error;
pub mod report_store;

pub use error::{IngestError, StoreError};
pub use report_store::{IngestOptions, IngestOutcome, ListOrder, ReportList, ReportStore};
