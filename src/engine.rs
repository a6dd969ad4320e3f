//! Query engine - one request end to end
//!
//! QUESTION → LOAD DOCUMENT → FAN OUT TRIALS → RESOLVE CONSENSUS

use crate::collaborator::{prompt, Collaborator, Prompt};
use crate::config::EngineConfig;
use crate::consensus;
use crate::document::DocumentSource;
use crate::error::EngineError;
use crate::fanout::GenerationFanOut;
use crate::models::ConsensusResult;
use crate::query::QueryRuntime;
use crate::trial::TrialExecutor;
use crate::Result;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct QueryEngine {
    documents: Arc<dyn DocumentSource>,
    fan_out: GenerationFanOut,
    instruction: String,
}

impl QueryEngine {
    pub fn new(
        documents: Arc<dyn DocumentSource>,
        collaborator: Arc<dyn Collaborator>,
        runtime: &'static QueryRuntime,
        config: &EngineConfig,
    ) -> Self {
        Self {
            documents,
            fan_out: GenerationFanOut::new(
                collaborator,
                TrialExecutor::new(runtime),
                config.trial_count,
                config.trial_timeout,
            ),
            instruction: prompt::system_instruction(),
        }
    }

    /// Answer a natural-language question by trial consensus.
    ///
    /// Only a blank question or an unloadable document is an error. When no
    /// trial succeeds the result is an empty consensus.
    pub async fn answer(&self, question: &str) -> Result<ConsensusResult> {
        let question = question.trim();
        if question.is_empty() {
            return Err(EngineError::InvalidQuestion(
                "Question must not be empty".to_string(),
            ));
        }

        let start = Instant::now();
        let document = self.documents.load().await?;

        info!(
            trials = self.fan_out.trial_count(),
            "Fanning out question"
        );

        let prompt = Prompt::new(self.instruction.as_str(), question);
        let outcomes = self.fan_out.run(&prompt, &document).await;
        let result = consensus::resolve(outcomes);

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            votes = result.votes,
            failures = result.failure_count(),
            "Question answered"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborator::{ScriptedCollaborator, ScriptedReply};
    use crate::document::InMemoryDocumentSource;
    use crate::error::TrialError;
    use crate::models::TrialOutcome;
    use serde_json::json;
    use std::time::Duration;

    fn finance_document() -> serde_json::Value {
        json!({
            "bankAccounts": [
                {
                    "id": "acc-1",
                    "name": "Personal",
                    "type": "personal",
                    "currentBalance": 100.0,
                    "currency": "CHF",
                    "transactions": [
                        {
                            "id": "t1",
                            "amount": -30.0,
                            "date": "2024-10-01T00:00:00Z",
                            "category": "food",
                            "balance": 70.0
                        },
                        {
                            "id": "t2",
                            "amount": -120.0,
                            "date": "2024-10-02T00:00:00Z",
                            "category": "food",
                            "balance": -50.0
                        }
                    ],
                    "recurrentPayments": []
                },
                {
                    "id": "acc-2",
                    "name": "Savings",
                    "type": "savings",
                    "currentBalance": 50.0,
                    "currency": "CHF",
                    "transactions": [],
                    "recurrentPayments": []
                }
            ],
            "receipts": [],
            "savingsProfiles": []
        })
    }

    fn config(trials: usize, timeout: Duration) -> EngineConfig {
        let mut config = EngineConfig::from_lookup(|_| None).unwrap();
        config.trial_count = trials;
        config.trial_timeout = timeout;
        config
    }

    fn engine(replies: Vec<ScriptedReply>, timeout: Duration) -> QueryEngine {
        QueryEngine::new(
            Arc::new(InMemoryDocumentSource::new(finance_document())),
            Arc::new(ScriptedCollaborator::new(replies)),
            QueryRuntime::new().into_static(),
            &config(3, timeout),
        )
    }

    #[tokio::test]
    async fn test_majority_with_one_execution_error() {
        let engine = engine(
            vec![
                ScriptedReply::content("sum(bankAccounts[].currentBalance)"),
                ScriptedReply::content("```jmespath\nsum(bankAccounts[*].currentBalance)\n```"),
                ScriptedReply::content("sum(bankAccounts[?type=='personal'"),
            ],
            Duration::from_secs(5),
        );

        let result = engine.answer("What is my total balance?").await.unwrap();

        assert_eq!(result.result, Some(json!(150.0)));
        assert_eq!(result.votes, 2);
        assert_eq!(result.failure_count(), 1);
        assert!(matches!(
            result.responses[2],
            TrialOutcome::Failure(TrialError::QueryExecutionError(_))
        ));
    }

    #[tokio::test]
    async fn test_all_trials_time_out() {
        let engine = engine(
            vec![ScriptedReply::content("sum(bankAccounts[].currentBalance)")
                .delayed(Duration::from_secs(10))],
            Duration::from_millis(50),
        );

        let result = engine.answer("What is my total balance?").await.unwrap();

        assert!(result.is_empty());
        assert_eq!(result.responses.len(), 3);
        assert!(result
            .responses
            .iter()
            .all(|o| matches!(o, TrialOutcome::Failure(TrialError::CollaboratorError(_)))));
    }

    #[tokio::test]
    async fn test_flattening_sum_over_transactions() {
        let engine = engine(
            vec![ScriptedReply::content(
                "sum(bankAccounts[].transactions[?category=='food'].amount)",
            )],
            Duration::from_secs(5),
        );

        let result = engine.answer("How much did I spend on food?").await.unwrap();

        assert_eq!(result.result, Some(json!(-150.0)));
        assert_eq!(result.votes, 3);
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let engine = engine(vec![ScriptedReply::content("receipts")], Duration::from_secs(1));

        assert!(matches!(
            engine.answer("   ").await,
            Err(EngineError::InvalidQuestion(_))
        ));
    }

    #[tokio::test]
    async fn test_unloadable_document_is_fatal() {
        let engine = QueryEngine::new(
            Arc::new(InMemoryDocumentSource::new(json!({ "unexpected": true }))),
            Arc::new(ScriptedCollaborator::new(vec![ScriptedReply::content("receipts")])),
            QueryRuntime::new().into_static(),
            &config(3, Duration::from_secs(1)),
        );

        assert!(matches!(
            engine.answer("Anything?").await,
            Err(EngineError::DocumentError(_))
        ));
    }
}
