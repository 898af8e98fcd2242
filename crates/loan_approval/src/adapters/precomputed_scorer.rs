// Rust guideline compliant 2026-10-18

//! Demo adapter for the `ScoringProvider` port.
//!
//! Stands in for an offline credit model: scores are computed ahead of time
//! and looked up by customer id. Customers the model has not seen get no
//! score, which lets a `FallbackScorer` take over.

use std::collections::HashMap;

use domain::{ApplicationFeatures, CreditScoreResult, ScoringError, ScoringProvider};

/// Model name written into the notes of every score.
const MODEL_NAME: &str = "DEMO";

/// Lookup-table scorer keyed by customer id.
#[derive(Debug, Default)]
pub struct PrecomputedScorer {
    scores: HashMap<String, CreditScoreResult>,
}

impl PrecomputedScorer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the model output for `customer_id`, replacing any earlier one.
    pub fn insert(&mut self, customer_id: impl Into<String>, score: u16, risk_level: u8) {
        self.scores.insert(
            customer_id.into(),
            CreditScoreResult { score, risk_level, notes: format!("model: {MODEL_NAME}") },
        );
    }

    #[must_use]
    pub fn customer_count(&self) -> usize {
        self.scores.len()
    }
}

impl ScoringProvider for PrecomputedScorer {
    /// # Errors
    ///
    /// Infallible; returns `Ok(None)` for unknown customers.
    async fn compute(
        &self,
        customer_id: &str,
        _features: Option<&ApplicationFeatures>,
    ) -> Result<Option<CreditScoreResult>, ScoringError> {
        Ok(self.scores.get(customer_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::PrecomputedScorer;
    use domain::ScoringProvider as _;

    #[tokio::test]
    async fn known_customer_gets_stored_score() {
        let mut scorer = PrecomputedScorer::new();
        scorer.insert("c-1", 712, 2);
        let result = scorer.compute("c-1", None).await.unwrap().unwrap();
        assert_eq!((result.score, result.risk_level), (712, 2));
        assert_eq!(result.notes, "model: DEMO");
    }

    #[tokio::test]
    async fn unknown_customer_is_not_scored() {
        let scorer = PrecomputedScorer::new();
        assert!(scorer.compute("nobody", None).await.unwrap().is_none());
    }

    #[test]
    fn later_insert_replaces_earlier() {
        let mut scorer = PrecomputedScorer::new();
        scorer.insert("c-1", 600, 3);
        scorer.insert("c-1", 640, 3);
        assert_eq!(scorer.customer_count(), 1);
    }
}
