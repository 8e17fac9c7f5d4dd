pub mod contract;
pub mod error;
pub mod report;

pub use error::ValidationError;
pub use report::{BasicInfo, NewsItem, Recommendation, Report};
