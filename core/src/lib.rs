//! Customer complaint risk scoring and complaint reporting.
//!
//! The crate reads a complaint fact stream (from SQLite or memory), scores
//! every customer with a multi-factor churn-risk model normalised across the
//! population, and produces the dashboard summaries built on the same facts.

pub mod complaint;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;
pub mod risk;
pub mod rng;
pub mod sentiment;
pub mod store;
pub mod summary;
pub mod synthetic;
pub mod types;
