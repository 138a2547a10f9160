//! examscore-core — Scoring engine, question registry, and band conversion.
//!
//! This crate defines the exam/submission data model, the per-type
//! correctness rules, section aggregation, and the service that scores
//! submissions through collaborator-provided stores.

pub mod aggregate;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod registry;
pub mod report;
pub mod scorer;
pub mod scoring;
pub mod statistics;
pub mod traits;

pub use error::{CorruptRecord, ScoringError};
