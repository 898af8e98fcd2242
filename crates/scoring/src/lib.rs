// Rust guideline compliant 2026-10-18

//! Scoring-provider implementations for the `domain::ScoringProvider` port.
//!
//! [`HeuristicScorer`] derives a score from aggregate cash flow alone and is
//! the fallback used when no model-based score exists. [`FallbackScorer`]
//! chains a primary provider with such a fallback.

use domain::{
    ApplicationFeatures, CashFlowStore, CreditScoreResult, LoanProduct, ScoringError,
    ScoringProvider,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const BASE_SCORE: i32 = 600;
const MIN_SCORE: i32 = 300;
const MAX_SCORE: i32 = 850;
/// Requests above this many months of net flow are penalized.
const NET_FLOW_MONTHS_COVER: Decimal = dec!(6);

// ---------------------------------------------------------------------------
// HeuristicScorer
// ---------------------------------------------------------------------------

/// Deterministic cash-flow based scorer.
///
/// Scores from the share of inflow the customer keeps each month, then applies
/// small adjustments for the requested amount and product. Customers without a
/// cash-flow row, or without any inflow, are not scored.
#[derive(Debug)]
pub struct HeuristicScorer<C> {
    cash_flow: C,
}

impl<C: CashFlowStore> HeuristicScorer<C> {
    #[must_use]
    pub fn new(cash_flow: C) -> Self {
        Self { cash_flow }
    }
}

/// Risk tier implied by a score.
#[must_use]
pub fn risk_level_for(score: u16) -> u8 {
    match score {
        740.. => 1,
        680..=739 => 2,
        600..=679 => 3,
        _ => 4,
    }
}

fn savings_adjustment(savings_ratio: Decimal) -> i32 {
    if savings_ratio >= dec!(0.5) {
        150
    } else if savings_ratio >= dec!(0.3) {
        100
    } else if savings_ratio >= dec!(0.15) {
        50
    } else if savings_ratio >= Decimal::ZERO {
        0
    } else {
        -100
    }
}

fn application_adjustment(features: &ApplicationFeatures, net_flow: Decimal) -> i32 {
    let product = match features.product {
        LoanProduct::Mortgage | LoanProduct::Auto => 10,
        LoanProduct::CreditCard => -10,
        LoanProduct::Personal => 0,
    };
    let exposure = if net_flow > Decimal::ZERO
        && features.requested_amount > net_flow * NET_FLOW_MONTHS_COVER
    {
        -40
    } else {
        0
    };
    product + exposure
}

impl<C: CashFlowStore> ScoringProvider for HeuristicScorer<C> {
    /// # Errors
    ///
    /// Returns [`ScoringError::Unavailable`] when the cash-flow store fails.
    async fn compute(
        &self,
        customer_id: &str,
        features: Option<&ApplicationFeatures>,
    ) -> Result<Option<CreditScoreResult>, ScoringError> {
        let row = self
            .cash_flow
            .get_by_user_id(customer_id)
            .await
            .map_err(|e| ScoringError::Unavailable { reason: e.to_string() })?;
        let Some(row) = row else {
            return Ok(None);
        };
        let Some(inflow) = row.avg_monthly_inflow.filter(|v| *v > Decimal::ZERO) else {
            return Ok(None);
        };

        let net_flow = row.net_flow();
        let savings_ratio = (net_flow / inflow).round_dp(2);
        let base = savings_adjustment(savings_ratio);
        let adjust = features.map_or(0, |f| application_adjustment(f, net_flow));

        let clamped = (BASE_SCORE + base + adjust).clamp(MIN_SCORE, MAX_SCORE);
        let score = u16::try_from(clamped).unwrap_or(u16::MAX);
        let risk_level = risk_level_for(score);
        tracing::debug!(customer_id, score, risk_level, "heuristic_scorer.compute");

        Ok(Some(CreditScoreResult {
            score,
            risk_level,
            notes: format!(
                "heuristic: savings_ratio={savings_ratio} base_adj={base} application_adj={adjust}"
            ),
        }))
    }
}

// ---------------------------------------------------------------------------
// FallbackScorer
// ---------------------------------------------------------------------------

/// Asks `primary` first and `fallback` only when the primary has no score.
///
/// Primary failures propagate; they do not trigger the fallback.
#[derive(Debug)]
pub struct FallbackScorer<P, F> {
    primary: P,
    fallback: F,
}

impl<P: ScoringProvider, F: ScoringProvider> FallbackScorer<P, F> {
    #[must_use]
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl<P: ScoringProvider, F: ScoringProvider> ScoringProvider for FallbackScorer<P, F> {
    /// # Errors
    ///
    /// Propagates the error of whichever provider was consulted.
    async fn compute(
        &self,
        customer_id: &str,
        features: Option<&ApplicationFeatures>,
    ) -> Result<Option<CreditScoreResult>, ScoringError> {
        if let Some(result) = self.primary.compute(customer_id, features).await? {
            return Ok(Some(result));
        }
        tracing::debug!(customer_id, "fallback_scorer.using_fallback");
        self.fallback.compute(customer_id, features).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
