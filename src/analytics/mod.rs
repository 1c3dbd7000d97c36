//! Performance analytics: normalization, rollups, topic weakness and marking coverage over
//! already school-scoped assessment records.

pub mod aggregate;
pub mod coverage;
pub mod distribution;
pub mod facade;
pub mod normalize;
pub mod report;
pub mod scope;
pub mod source;
pub mod topics;
pub mod types;

pub use facade::{compute_report, AnalyticsFacade, FacadeOptions, ReportInput};
pub use report::AnalyticsReport;
pub use scope::{ActorRole, ScopeContext, ScopeFilter};
pub use source::{AnalyticsSource, SourceError};
