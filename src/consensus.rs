//! Consensus resolver
//!
//! Majority vote over successful trial outcomes. Values are compared by a
//! canonical string form so that `5`, `5.0` and `"5"` count as one answer.
//! Ties go to the value that first appeared in dispatch order.

use crate::models::{ConsensusResult, TrialOutcome};
use serde_json::{Number, Value};
use std::collections::HashMap;
use tracing::info;

/// Largest integer an f64 represents exactly
const MAX_EXACT_INT: f64 = 9_007_199_254_740_992.0;

struct Tally<'a> {
    value: &'a Value,
    count: usize,
}

/// Collapse outcomes into a single answer.
///
/// Never fails: with no successful trial the result is empty.
pub fn resolve(outcomes: Vec<TrialOutcome>) -> ConsensusResult {
    let (result, votes) = match leader(&outcomes) {
        Some((value, count)) => (Some(value.clone()), count),
        None => (None, 0),
    };

    info!(
        trials = outcomes.len(),
        successes = outcomes.iter().filter(|o| o.is_success()).count(),
        votes,
        resolved = result.is_some(),
        "Consensus resolved"
    );

    ConsensusResult {
        result,
        votes,
        responses: outcomes,
    }
}

fn leader(outcomes: &[TrialOutcome]) -> Option<(&Value, usize)> {
    // tallies stay in first-occurrence order
    let mut tallies: Vec<Tally<'_>> = Vec::new();
    let mut index_by_key: HashMap<String, usize> = HashMap::new();

    for value in outcomes.iter().filter_map(TrialOutcome::value) {
        let key = canonical(value);
        match index_by_key.get(&key) {
            Some(&idx) => tallies[idx].count += 1,
            None => {
                index_by_key.insert(key, tallies.len());
                tallies.push(Tally { value, count: 1 });
            }
        }
    }

    let mut best: Option<&Tally<'_>> = None;
    for tally in &tallies {
        if best.map_or(true, |b| tally.count > b.count) {
            best = Some(tally);
        }
    }

    best.map(|t| (t.value, t.count))
}

/// Canonical representation used only for vote comparison.
///
/// Numbers and numeric strings share one normalized form. Any other string
/// keeps its JSON quotes, so `"null"` never collides with `null`. Nested
/// values follow the same rule.
pub fn canonical(value: &Value) -> String {
    match value {
        Value::Number(n) => canonical_number(n),
        Value::String(s) => match numeric_string(s) {
            Some(number) => number,
            None => Value::String(s.clone()).to_string(),
        },
        Value::Null | Value::Bool(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => canonical_json(value).to_string(),
    }
}

fn canonical_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_INT => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

fn numeric_string(s: &str) -> Option<String> {
    let parsed: f64 = s.trim().parse().ok()?;
    Number::from_f64(parsed).map(|n| canonical_number(&n))
}

/// Rewrite nested numbers into canonical form so `[150]` and `[150.0]` agree.
fn canonical_json(value: &Value) -> Value {
    match value {
        Value::Number(n) => Value::String(canonical_number(n)),
        Value::String(s) => match numeric_string(s) {
            Some(number) => Value::String(number),
            None => value.clone(),
        },
        Value::Array(items) => Value::Array(items.iter().map(canonical_json).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), canonical_json(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrialError;
    use serde_json::json;

    fn ok(value: Value) -> TrialOutcome {
        TrialOutcome::Success(value)
    }

    fn failed() -> TrialOutcome {
        TrialOutcome::Failure(TrialError::QueryExecutionError("syntax error".to_string()))
    }

    #[test]
    fn test_no_success_is_empty() {
        let result = resolve(vec![failed(), failed(), failed()]);

        assert!(result.is_empty());
        assert_eq!(result.votes, 0);
        assert_eq!(result.failure_count(), 3);
    }

    #[test]
    fn test_no_trials_is_empty() {
        let result = resolve(vec![]);
        assert!(result.is_empty());
        assert!(result.responses.is_empty());
    }

    #[test]
    fn test_single_success_wins() {
        let result = resolve(vec![failed(), ok(json!("Groceries")), failed()]);

        assert_eq!(result.result, Some(json!("Groceries")));
        assert_eq!(result.votes, 1);
    }

    #[test]
    fn test_strict_majority_wins() {
        let result = resolve(vec![ok(json!(7)), ok(json!(12.5)), ok(json!(12.5))]);

        assert_eq!(result.result, Some(json!(12.5)));
        assert_eq!(result.votes, 2);
    }

    #[test]
    fn test_tie_goes_to_earliest() {
        let a_first = resolve(vec![ok(json!("A")), ok(json!("B"))]);
        let b_first = resolve(vec![ok(json!("B")), ok(json!("A"))]);

        assert_eq!(a_first.result, Some(json!("A")));
        assert_eq!(b_first.result, Some(json!("B")));
    }

    #[test]
    fn test_differently_typed_values_vote_together() {
        let result = resolve(vec![ok(json!(5)), ok(json!("5")), ok(json!(7))]);

        // first occurrence is returned as-is, not its canonical form
        assert_eq!(result.result, Some(json!(5)));
        assert_eq!(result.votes, 2);
    }

    #[test]
    fn test_trailing_zero_formatting_ignored() {
        let result = resolve(vec![ok(json!(3)), ok(json!(150)), ok(json!(150.0))]);

        assert_eq!(result.result, Some(json!(150)));
        assert_eq!(result.votes, 2);
    }

    #[test]
    fn test_arrays_and_objects_vote() {
        let result = resolve(vec![
            ok(json!(["Rent", "Gym"])),
            ok(json!({ "name": "Rent" })),
            ok(json!(["Rent", "Gym"])),
        ]);

        assert_eq!(result.result, Some(json!(["Rent", "Gym"])));
        assert_eq!(canonical(&json!([1.0, 2])), canonical(&json!([1, 2.0])));
    }

    #[test]
    fn test_failures_do_not_block_successes() {
        let result = resolve(vec![failed(), ok(json!(150.0)), ok(json!(150.0))]);

        assert_eq!(result.result, Some(json!(150.0)));
        assert_eq!(result.votes, 2);
        assert_eq!(result.failure_count(), 1);
        assert_eq!(result.responses.len(), 3);
    }

    #[test]
    fn test_null_is_a_vote() {
        let result = resolve(vec![ok(Value::Null), ok(Value::Null), ok(json!(1))]);

        assert_eq!(result.result, Some(Value::Null));
        assert!(!result.is_empty());
    }

    #[test]
    fn test_canonical_forms() {
        assert_eq!(canonical(&json!(150.0)), "150");
        assert_eq!(canonical(&json!(-0.25)), "-0.25");
        assert_eq!(canonical(&json!("150")), "150");
        assert_eq!(canonical(&json!(true)), "true");
        assert_eq!(canonical(&Value::Null), "null");
        assert_eq!(canonical(&json!("Rent")), "\"Rent\"");
    }

    #[test]
    fn test_literal_strings_do_not_match_null_or_bools() {
        assert_ne!(canonical(&json!("null")), canonical(&Value::Null));
        assert_ne!(canonical(&json!("true")), canonical(&json!(true)));
        assert_ne!(canonical(&json!(["null"])), canonical(&json!([null])));

        let result = resolve(vec![ok(json!("null")), ok(Value::Null), ok(Value::Null)]);
        assert_eq!(result.result, Some(Value::Null));
        assert_eq!(result.votes, 2);
    }

    #[test]
    fn test_nested_values_follow_scalar_rule() {
        assert_eq!(canonical(&json!(["5"])), canonical(&json!([5.0])));
        assert_eq!(
            canonical(&json!({ "total": "150" })),
            canonical(&json!({ "total": 150 }))
        );
    }
}
