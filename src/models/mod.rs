//! Models Module
//!
//! Serializable views of cache state for logging and monitoring.

mod report;

pub use report::StatsReport;
