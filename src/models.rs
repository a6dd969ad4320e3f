//! Core data models for the finance query engine

use crate::error::TrialError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

//
// ================= Finance Document =================
//

/// Typed view of the finance document.
///
/// Used to validate the document when it is loaded. Queries run against the
/// raw JSON, so fields not modelled here stay reachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceDocument {
    pub bank_accounts: Vec<BankAccount>,
    pub receipts: Vec<Receipt>,
    pub savings_profiles: Vec<SavingsProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccount {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub current_balance: f64,
    pub currency: String,
    pub transactions: Vec<Transaction>,
    pub recurrent_payments: Vec<RecurrentPayment>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Personal,
    Savings,
    Retirement,
    Marriage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Positive for income, negative for expenses
    pub amount: f64,
    pub date: String,
    pub category: String,
    #[serde(default)]
    pub receipt_id: Option<String>,
    #[serde(default)]
    pub recurrent_payment_id: Option<String>,
    /// Account balance after this transaction
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrentPayment {
    pub id: String,
    pub amount: f64,
    pub name: String,
    pub category: String,
    pub frequency: Frequency,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub auto_pay: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub description: String,
    pub merchant: String,
    pub location: Location,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsProfile {
    pub id: String,
    pub name: String,
    pub current_amount: f64,
    pub target_amount: f64,
    pub start_date: String,
    #[serde(default)]
    pub target_date: Option<String>,
    pub category: String,
}

//
// ================= Trials =================
//

/// Result of one generation-and-execution trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialOutcome {
    /// Evaluated value; `null` when the query legitimately matched nothing
    Success(Value),
    Failure(TrialError),
}

impl TrialOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TrialOutcome::Success(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            TrialOutcome::Success(value) => Some(value),
            TrialOutcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&TrialError> {
        match self {
            TrialOutcome::Success(_) => None,
            TrialOutcome::Failure(err) => Some(err),
        }
    }
}

impl From<Result<Value, TrialError>> for TrialOutcome {
    fn from(result: Result<Value, TrialError>) -> Self {
        match result {
            Ok(value) => TrialOutcome::Success(value),
            Err(err) => TrialOutcome::Failure(err),
        }
    }
}

//
// ================= Consensus =================
//

/// Majority-selected answer plus every trial outcome in dispatch order.
///
/// Serialize-only: a `null` answer and no answer both write `"result": null`,
/// and only `votes` tells them apart.
#[derive(Debug, Clone, Serialize)]
pub struct ConsensusResult {
    /// `None` when no trial succeeded
    pub result: Option<Value>,
    /// Number of trials that agreed with `result`
    pub votes: usize,
    pub responses: Vec<TrialOutcome>,
}

impl ConsensusResult {
    pub fn is_empty(&self) -> bool {
        self.result.is_none()
    }

    pub fn failure_count(&self) -> usize {
        self.responses.iter().filter(|o| !o.is_success()).count()
    }
}

impl fmt::Display for ConsensusResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Some(value) => write!(
                f,
                "{} ({}/{} trials agree)",
                value,
                self.votes,
                self.responses.len()
            ),
            None => write!(
                f,
                "could not determine an answer ({} trials failed)",
                self.failure_count()
            ),
        }
    }
}
