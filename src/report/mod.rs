//! Report Module
//!
//! Byte-exact encoding of priced asset reports for the on-ledger verifier.

pub mod report_codec;
pub mod report_errors;

// Re-exports for convenience
pub use report_codec::{encode_report, FeedId, Report, ReportLayout};
pub use report_errors::{ReportError, ReportResult};
