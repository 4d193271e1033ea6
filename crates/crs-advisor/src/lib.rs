//! Points-based eligibility assessment: profile aggregation, requirements gating,
//! CRS scoring and band classification.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
