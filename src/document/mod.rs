//! Document store
//!
//! Loads the finance document for one request. The loaded [`Document`] is
//! read-only and shared by every trial of that request.

use crate::error::EngineError;
use crate::models::FinanceDocument;
use crate::Result;
use jmespath::{Rcvar, ToJmespath};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Parsed, validated finance document
#[derive(Debug)]
pub struct Document {
    root: Rcvar,
    summary: DocumentSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentSummary {
    pub bank_accounts: usize,
    pub transactions: usize,
    pub receipts: usize,
    pub savings_profiles: usize,
}

impl Document {
    /// Validate `raw` against the finance schema and prepare it for querying.
    pub fn from_value(raw: Value) -> Result<Self> {
        let typed = FinanceDocument::deserialize(&raw).map_err(|e| {
            EngineError::DocumentError(format!("Document does not match schema: {}", e))
        })?;

        let summary = DocumentSummary {
            bank_accounts: typed.bank_accounts.len(),
            transactions: typed
                .bank_accounts
                .iter()
                .map(|a| a.transactions.len())
                .sum(),
            receipts: typed.receipts.len(),
            savings_profiles: typed.savings_profiles.len(),
        };

        let root = raw
            .to_jmespath()
            .map_err(|e| EngineError::DocumentError(e.to_string()))?;

        Ok(Self { root, summary })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(raw)
    }

    pub fn root(&self) -> &Rcvar {
        &self.root
    }

    pub fn summary(&self) -> DocumentSummary {
        self.summary
    }
}

/// Where documents come from (loaded fresh for every request)
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn load(&self) -> Result<Document>;
}

/// Reads the document from a JSON file on every load
pub struct FileDocumentSource {
    path: PathBuf,
}

impl FileDocumentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl DocumentSource for FileDocumentSource {
    async fn load(&self) -> Result<Document> {
        let text = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            EngineError::DocumentError(format!(
                "Failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let document = Document::from_json(&text)?;

        debug!(
            path = %self.path.display(),
            summary = ?document.summary(),
            "Document loaded"
        );

        Ok(document)
    }
}

/// In-memory document source for development & testing
pub struct InMemoryDocumentSource {
    raw: Value,
}

impl InMemoryDocumentSource {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }
}

#[async_trait::async_trait]
impl DocumentSource for InMemoryDocumentSource {
    async fn load(&self) -> Result<Document> {
        Document::from_value(self.raw.clone())
    }
}
