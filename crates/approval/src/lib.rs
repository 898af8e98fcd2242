// Rust guideline compliant 2026-10-18

//! Loan approval decision engine.
//!
//! [`ApprovalEngine::decide`] combines a `domain::ScoringProvider`, a
//! `domain::CashFlowStore` and an [`ApprovalPolicy`] into exactly one
//! `domain::ApprovalDecision`. Business conditions never surface as errors;
//! only collaborator faults do.

mod amortization;
mod policy;

pub use amortization::{SEARCH_ITERATIONS, max_affordable_principal, monthly_payment};
pub use policy::{ApprovalPolicy, ApprovalPolicyBuilder, PolicyError};

use std::sync::Arc;

use domain::{
    ApplicationFeatures, ApprovalDecision, CashFlowStore, CreditScoreResult, DecisionOutcome,
    DecisionReason, ScoringError, ScoringProvider, StorageError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Hard-decline threshold on the score.
const MIN_ACCEPTABLE_SCORE: u16 = 600;
/// Risk tier at and above which applications are declined outright.
const DECLINE_RISK_LEVEL: u8 = 4;
/// Requests above `risk_cap * CAP_TOLERANCE` go to manual review.
const CAP_TOLERANCE: Decimal = dec!(1.25);
/// Smallest counter-offer worth auto-approving.
const MIN_COUNTER_OFFER: Decimal = dec!(500);

// ---------------------------------------------------------------------------
// ApprovalError
// ---------------------------------------------------------------------------

/// Collaborator faults surfaced by [`ApprovalEngine::decide`].
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// The scoring provider failed.
    #[error("scoring provider error: {0}")]
    Scoring(#[from] ScoringError),
    /// The aggregate cash-flow store failed.
    #[error("cash-flow store error: {0}")]
    CashFlow(#[from] StorageError),
    /// The installment for this principal and term leaves the `Decimal` range.
    #[error("installment of {principal} over {months} months is out of range")]
    PaymentOutOfRange {
        principal: Decimal,
        months: u32,
    },
}

// ---------------------------------------------------------------------------
// ApprovalEngine
// ---------------------------------------------------------------------------

/// Policy-driven decision procedure.
///
/// Generic over both read ports for static dispatch. Reads, never writes.
#[derive(Debug)]
pub struct ApprovalEngine<S, C> {
    scoring: S,
    cash_flow: C,
    policy: Arc<ApprovalPolicy>,
}

impl<S: ScoringProvider, C: CashFlowStore> ApprovalEngine<S, C> {
    #[must_use]
    pub fn new(scoring: S, cash_flow: C, policy: Arc<ApprovalPolicy>) -> Self {
        Self { scoring, cash_flow, policy }
    }

    #[must_use]
    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /// Decide on an application for `customer_id`.
    ///
    /// The score is fetched first; cash flow is only read when the score and
    /// the risk cap have not already settled the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::Scoring`] or [`ApprovalError::CashFlow`] when a
    /// collaborator fails, and [`ApprovalError::PaymentOutOfRange`] when the
    /// term is too long to price. Missing data is never an error.
    pub async fn decide(
        &self,
        customer_id: &str,
        features: &ApplicationFeatures,
    ) -> Result<ApprovalDecision, ApprovalError> {
        let Some(score) = self.scoring.compute(customer_id, Some(features)).await? else {
            tracing::info!(customer_id, "engine.decision: no score available");
            return Ok(ApprovalDecision {
                outcome: DecisionOutcome::PendingReview { reason: DecisionReason::NoCreditFeatures },
                score: 0,
                risk_level: 0,
                score_notes: String::new(),
            });
        };

        let decision = match screen(&self.policy, &score, features) {
            Some(early) => early,
            None => {
                let net_flow = self
                    .cash_flow
                    .get_by_user_id(customer_id)
                    .await?
                    .unwrap_or_default()
                    .net_flow();
                assess_affordability(&self.policy, &score, features, net_flow)?
            }
        };

        tracing::info!(
            customer_id,
            score = decision.score,
            risk_level = decision.risk_level,
            outcome = ?decision.outcome,
            "engine.decision"
        );
        Ok(decision)
    }
}

/// Score and risk-cap checks that need no cash-flow data.
///
/// Returns `Some` when they already settle the outcome.
#[must_use]
pub fn screen(
    policy: &ApprovalPolicy,
    score: &CreditScoreResult,
    features: &ApplicationFeatures,
) -> Option<ApprovalDecision> {
    let decided = |outcome| {
        Some(ApprovalDecision {
            outcome,
            score: score.score,
            risk_level: score.risk_level,
            score_notes: score.notes.clone(),
        })
    };

    if score.risk_level >= DECLINE_RISK_LEVEL || score.score < MIN_ACCEPTABLE_SCORE {
        return decided(DecisionOutcome::AutoDeclined { reason: DecisionReason::HighRiskLowScore });
    }

    // Between the cap and the tolerance band the request is capped later on.
    if features.requested_amount > policy.risk_cap(score.risk_level) * CAP_TOLERANCE {
        return decided(DecisionOutcome::PendingReview {
            reason: DecisionReason::RequestedFarAboveRiskCap,
        });
    }

    None
}

/// Affordability, counter-offer and score-floor rules, given the net monthly flow.
///
/// # Errors
///
/// Returns [`ApprovalError::PaymentOutOfRange`] when the installment cannot
/// be computed for the requested term.
pub fn assess_affordability(
    policy: &ApprovalPolicy,
    score: &CreditScoreResult,
    features: &ApplicationFeatures,
    net_flow: Decimal,
) -> Result<ApprovalDecision, ApprovalError> {
    let decided = |outcome| {
        Ok(ApprovalDecision {
            outcome,
            score: score.score,
            risk_level: score.risk_level,
            score_notes: score.notes.clone(),
        })
    };

    let risk_cap = policy.risk_cap(score.risk_level);
    let principal = features.requested_amount.min(risk_cap);
    let months = policy.resolve_months(features.term_months);
    let installment = monthly_payment(principal, policy.annual_interest, months)
        .ok_or(ApprovalError::PaymentOutOfRange { principal, months })?;

    let max_installment = net_flow.max(Decimal::ZERO) * policy.max_installment_to_net_flow;
    if max_installment <= Decimal::ZERO {
        return decided(DecisionOutcome::PendingReview { reason: DecisionReason::UnknownNetFlow });
    }

    if installment > max_installment {
        let affordable =
            max_affordable_principal(principal, policy.annual_interest, months, max_installment);
        tracing::debug!(%installment, %max_installment, %affordable, "engine.affordability_capped");
        if affordable < MIN_COUNTER_OFFER {
            return decided(DecisionOutcome::PendingReview {
                reason: DecisionReason::InsufficientAffordability,
            });
        }
        return decided(DecisionOutcome::AutoApproved {
            amount: affordable,
            reason: DecisionReason::CappedByAffordability,
        });
    }

    if score.score < policy.min_score(score.risk_level) {
        return decided(DecisionOutcome::PendingReview { reason: DecisionReason::ScoreBorderline });
    }

    decided(DecisionOutcome::AutoApproved { amount: principal, reason: DecisionReason::WithinPolicy })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{AggregateCashFlow, LoanProduct};
    use std::cell::Cell;

    // ------------------------------------------------------------------
    // Mock adapters
    // ------------------------------------------------------------------

    struct MockScoring {
        result: Option<CreditScoreResult>,
        fail: bool,
        saw_features: Cell<bool>,
    }

    impl MockScoring {
        fn scored(score: u16, risk_level: u8) -> Self {
            Self {
                result: Some(CreditScoreResult { score, risk_level, notes: "mock".to_owned() }),
                fail: false,
                saw_features: Cell::new(false),
            }
        }

        fn absent() -> Self {
            Self { result: None, fail: false, saw_features: Cell::new(false) }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::absent() }
        }
    }

    impl ScoringProvider for MockScoring {
        async fn compute(
            &self,
            _customer_id: &str,
            features: Option<&ApplicationFeatures>,
        ) -> Result<Option<CreditScoreResult>, ScoringError> {
            if self.fail {
                return Err(ScoringError::Unavailable { reason: "mock failure".to_owned() });
            }
            self.saw_features.set(features.is_some());
            Ok(self.result.clone())
        }
    }

    struct MockCashFlow {
        row: Option<AggregateCashFlow>,
        fail: bool,
        reads: Cell<u32>,
    }

    impl MockCashFlow {
        fn with(inflow: Decimal, outflow: Decimal) -> Self {
            Self {
                row: Some(AggregateCashFlow {
                    avg_monthly_inflow: Some(inflow),
                    avg_monthly_outflow: Some(outflow),
                }),
                fail: false,
                reads: Cell::new(0),
            }
        }

        fn missing() -> Self {
            Self { row: None, fail: false, reads: Cell::new(0) }
        }

        fn failing() -> Self {
            Self { fail: true, ..Self::missing() }
        }
    }

    impl CashFlowStore for MockCashFlow {
        async fn get_by_user_id(
            &self,
            _customer_id: &str,
        ) -> Result<Option<AggregateCashFlow>, StorageError> {
            self.reads.set(self.reads.get() + 1);
            if self.fail {
                return Err(StorageError::Unavailable { reason: "mock failure".to_owned() });
            }
            Ok(self.row)
        }
    }

    fn features(requested_amount: Decimal) -> ApplicationFeatures {
        ApplicationFeatures { requested_amount, term_months: 0, product: LoanProduct::Personal }
    }

    fn engine(scoring: MockScoring, cash_flow: MockCashFlow) -> ApprovalEngine<MockScoring, MockCashFlow> {
        ApprovalEngine::new(scoring, cash_flow, Arc::new(ApprovalPolicy::default()))
    }

    // ------------------------------------------------------------------
    // Early exits
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn no_score_goes_to_review() {
        let e = engine(MockScoring::absent(), MockCashFlow::with(dec!(2000), dec!(500)));
        let d = e.decide("cust", &features(dec!(3000))).await.unwrap();
        assert_eq!(
            d.outcome,
            DecisionOutcome::PendingReview { reason: DecisionReason::NoCreditFeatures }
        );
        assert_eq!(d.approved_amount(), None);
        assert_eq!((d.score, d.risk_level), (0, 0));
        assert_eq!(d.reason().to_string(), "No credit features for user.");
    }

    #[tokio::test]
    async fn features_are_forwarded_to_scoring() {
        let e = engine(MockScoring::scored(750, 1), MockCashFlow::with(dec!(2000), dec!(500)));
        e.decide("cust", &features(dec!(3000))).await.unwrap();
        assert!(e.scoring.saw_features.get());
    }

    #[tokio::test]
    async fn risk_four_is_declined_regardless_of_amount() {
        for amount in [dec!(100), dec!(3000), dec!(1000000)] {
            let e = engine(MockScoring::scored(800, 4), MockCashFlow::with(dec!(9000), dec!(0)));
            let d = e.decide("cust", &features(amount)).await.unwrap();
            assert_eq!(
                d.outcome,
                DecisionOutcome::AutoDeclined { reason: DecisionReason::HighRiskLowScore }
            );
            assert_eq!(d.approved_amount(), None);
        }
    }

    #[tokio::test]
    async fn low_score_is_declined_without_reading_cash_flow() {
        let e = engine(MockScoring::scored(599, 1), MockCashFlow::with(dec!(9000), dec!(0)));
        let d = e.decide("cust", &features(dec!(1000))).await.unwrap();
        assert!(matches!(d.outcome, DecisionOutcome::AutoDeclined { .. }));
        assert_eq!(d.score, 599);
        assert_eq!(e.cash_flow.reads.get(), 0);
    }

    #[tokio::test]
    async fn request_far_above_cap_goes_to_review() {
        let e = engine(MockScoring::scored(700, 2), MockCashFlow::with(dec!(9000), dec!(0)));
        let d = e.decide("cust", &features(dec!(10000))).await.unwrap();
        assert_eq!(
            d.outcome,
            DecisionOutcome::PendingReview { reason: DecisionReason::RequestedFarAboveRiskCap }
        );
        assert_eq!(e.cash_flow.reads.get(), 0);
    }

    #[tokio::test]
    async fn request_inside_tolerance_band_is_capped_to_risk_cap() {
        let e = engine(MockScoring::scored(700, 2), MockCashFlow::with(dec!(10000), dec!(0)));
        let d = e.decide("cust", &features(dec!(6000))).await.unwrap();
        assert_eq!(
            d.outcome,
            DecisionOutcome::AutoApproved { amount: dec!(5000), reason: DecisionReason::WithinPolicy }
        );
    }

    // ------------------------------------------------------------------
    // Affordability
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn within_policy_approves_requested_amount() {
        let e = engine(MockScoring::scored(750, 1), MockCashFlow::with(dec!(2000), dec!(500)));
        let d = e.decide("cust", &features(dec!(3000))).await.unwrap();
        assert_eq!(d.approved_amount(), Some(dec!(3000)));
        assert_eq!(d.reason(), DecisionReason::WithinPolicy);
        assert_eq!((d.score, d.risk_level), (750, 1));
    }

    #[tokio::test]
    async fn unaffordable_request_gets_counter_offer() {
        let e = engine(MockScoring::scored(700, 2), MockCashFlow::with(dec!(1000), dec!(100)));
        let d = e.decide("cust", &features(dec!(5000))).await.unwrap();
        assert_eq!(
            d.outcome,
            DecisionOutcome::AutoApproved {
                amount: dec!(3030),
                reason: DecisionReason::CappedByAffordability
            }
        );
        let amount = d.approved_amount().unwrap();
        assert!(amount < dec!(5000));
        assert!(monthly_payment(amount, dec!(0.12), 12).is_some_and(|p| p <= dec!(270)));
    }

    #[tokio::test]
    async fn tiny_counter_offer_goes_to_review() {
        let e = engine(MockScoring::scored(700, 2), MockCashFlow::with(dec!(100), dec!(0)));
        let d = e.decide("cust", &features(dec!(5000))).await.unwrap();
        assert_eq!(
            d.outcome,
            DecisionOutcome::PendingReview { reason: DecisionReason::InsufficientAffordability }
        );
    }

    #[tokio::test]
    async fn negative_net_flow_goes_to_review() {
        let e = engine(MockScoring::scored(750, 1), MockCashFlow::with(dec!(500), dec!(900)));
        let d = e.decide("cust", &features(dec!(1000))).await.unwrap();
        assert_eq!(
            d.outcome,
            DecisionOutcome::PendingReview { reason: DecisionReason::UnknownNetFlow }
        );
    }

    #[tokio::test]
    async fn missing_cash_flow_row_goes_to_review() {
        let e = engine(MockScoring::scored(750, 1), MockCashFlow::missing());
        let d = e.decide("cust", &features(dec!(1000))).await.unwrap();
        assert_eq!(d.reason(), DecisionReason::UnknownNetFlow);
        assert_eq!(e.cash_flow.reads.get(), 1);
    }

    #[tokio::test]
    async fn borderline_score_goes_to_review_even_when_affordable() {
        let e = engine(MockScoring::scored(650, 1), MockCashFlow::with(dec!(2000), dec!(500)));
        let d = e.decide("cust", &features(dec!(3000))).await.unwrap();
        assert_eq!(
            d.outcome,
            DecisionOutcome::PendingReview { reason: DecisionReason::ScoreBorderline }
        );
    }

    #[tokio::test]
    async fn requested_term_overrides_default() {
        // 3000 over 12 months needs 266.55, over 36 months far less.
        let e = engine(MockScoring::scored(750, 1), MockCashFlow::with(dec!(800), dec!(0)));
        let short = e.decide("cust", &features(dec!(3000))).await.unwrap();
        assert_eq!(short.reason(), DecisionReason::CappedByAffordability);

        let long = ApplicationFeatures { term_months: 36, ..features(dec!(3000)) };
        let d = e.decide("cust", &long).await.unwrap();
        assert_eq!(d.approved_amount(), Some(dec!(3000)));
    }

    #[tokio::test]
    async fn zero_interest_policy_divides_evenly() {
        let policy = ApprovalPolicy::builder().annual_interest(Decimal::ZERO).build().unwrap();
        let e = ApprovalEngine::new(
            MockScoring::scored(750, 1),
            MockCashFlow::with(dec!(1000), dec!(0)),
            Arc::new(policy),
        );
        // 3600 / 12 = 300 sits exactly on the 30 % ceiling.
        let d = e.decide("cust", &features(dec!(3600))).await.unwrap();
        assert_eq!(d.approved_amount(), Some(dec!(3600)));
    }

    // ------------------------------------------------------------------
    // Collaborator faults
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn scoring_failure_propagates() {
        let e = engine(MockScoring::failing(), MockCashFlow::with(dec!(2000), dec!(500)));
        let result = e.decide("cust", &features(dec!(3000))).await;
        assert!(
            matches!(result, Err(ApprovalError::Scoring(ScoringError::Unavailable { .. }))),
            "expected scoring error, got {result:?}"
        );
        assert_eq!(e.cash_flow.reads.get(), 0);
    }

    #[tokio::test]
    async fn cash_flow_failure_propagates() {
        let e = engine(MockScoring::scored(750, 1), MockCashFlow::failing());
        let result = e.decide("cust", &features(dec!(3000))).await;
        assert!(
            matches!(result, Err(ApprovalError::CashFlow(StorageError::Unavailable { .. }))),
            "expected cash-flow error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn term_too_long_to_price_is_an_error() {
        let e = engine(MockScoring::scored(750, 1), MockCashFlow::with(dec!(2000), dec!(500)));
        let long_term = ApplicationFeatures { term_months: 8_000, ..features(dec!(3000)) };
        let result = e.decide("cust", &long_term).await;
        assert!(
            matches!(result, Err(ApprovalError::PaymentOutOfRange { months: 8_000, .. })),
            "expected out-of-range error, got {result:?}"
        );
    }

    #[tokio::test]
    async fn scorer_notes_ride_along_with_the_decision() {
        let e = engine(MockScoring::scored(750, 1), MockCashFlow::with(dec!(2000), dec!(500)));
        let d = e.decide("cust", &features(dec!(3000))).await.unwrap();
        assert_eq!(d.score_notes, "mock");
        assert_eq!(d.audit_notes(), "Within policy. | mock");
    }

    #[test]
    fn screen_passes_through_acceptable_applications() {
        let score = CreditScoreResult { score: 720, risk_level: 3, notes: String::new() };
        // Tier 3 cap 2000 * 1.25 = 2500 is still acceptable.
        assert!(screen(&ApprovalPolicy::default(), &score, &features(dec!(2500))).is_none());
        assert!(screen(&ApprovalPolicy::default(), &score, &features(dec!(2500.01))).is_some());
    }
}
