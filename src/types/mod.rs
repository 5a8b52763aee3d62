//! Type definitions for the fraud detection service

pub mod posting;
pub mod report;

pub use posting::{ContactInfo, JobPosting};
pub use report::{FraudReport, RiskTier};
