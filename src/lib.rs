//! Finance Query Consensus Engine
//!
//! Answers natural-language questions about a personal-finance document:
//! - Translates the question into a JMESPath query via a text-generation model
//! - Runs several independent trials concurrently
//! - Executes each candidate against the document with a flattening `sum`
//! - Resolves the final answer by majority vote, isolating per-trial failures
//!
//! REQUEST FLOW:
//! QUESTION → FAN OUT → SANITIZE → EVALUATE → VOTE → ANSWER

pub mod api;
pub mod collaborator;
pub mod config;
pub mod consensus;
pub mod document;
pub mod engine;
pub mod error;
pub mod fanout;
pub mod models;
pub mod query;
pub mod trial;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use engine::QueryEngine;
pub use error::{EngineError, TrialError};
