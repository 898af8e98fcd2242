// Rust guideline compliant 2026-10-18

//! Approval policy: risk-tiered caps and score floors plus affordability knobs.
//!
//! Construct via [`ApprovalPolicy::builder`]; the result is immutable and is
//! shared between the engine and the workflow behind an `Arc`.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ---------------------------------------------------------------------------
// PolicyError
// ---------------------------------------------------------------------------

/// Errors raised while building an [`ApprovalPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// The supplied configuration is invalid.
    #[error("invalid approval policy: {reason}")]
    InvalidConfig {
        /// Human-readable description of the problem.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// ApprovalPolicy + builder
// ---------------------------------------------------------------------------

/// Static decision knobs.
///
/// Risk tier 1 uses the `*_risk1` values, tier 2 the `*_risk2` values and every
/// other tier the `*_risk3` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalPolicy {
    pub min_score_risk1: u16,
    pub min_score_risk2: u16,
    pub min_score_risk3: u16,
    pub max_amount_risk1: Decimal,
    pub max_amount_risk2: Decimal,
    pub max_amount_risk3: Decimal,
    /// Share of positive net monthly flow an installment may consume.
    pub max_installment_to_net_flow: Decimal,
    /// Term used when the application does not request one.
    pub default_months: u32,
    /// Nominal annual rate, e.g. `0.12` for 12 %.
    pub annual_interest: Decimal,
}

impl Default for ApprovalPolicy {
    fn default() -> Self {
        Self {
            min_score_risk1: 700,
            min_score_risk2: 650,
            min_score_risk3: 620,
            max_amount_risk1: dec!(10000),
            max_amount_risk2: dec!(5000),
            max_amount_risk3: dec!(2000),
            max_installment_to_net_flow: dec!(0.3),
            default_months: 12,
            annual_interest: dec!(0.12),
        }
    }
}

impl ApprovalPolicy {
    /// Create a builder pre-filled with the default policy.
    #[must_use]
    pub fn builder() -> ApprovalPolicyBuilder {
        ApprovalPolicyBuilder { policy: Self::default() }
    }

    /// Maximum amount grantable at `risk_level`.
    #[must_use]
    pub fn risk_cap(&self, risk_level: u8) -> Decimal {
        match risk_level {
            1 => self.max_amount_risk1,
            2 => self.max_amount_risk2,
            _ => self.max_amount_risk3,
        }
    }

    /// Lowest score auto-approvable at `risk_level`.
    #[must_use]
    pub fn min_score(&self, risk_level: u8) -> u16 {
        match risk_level {
            1 => self.min_score_risk1,
            2 => self.min_score_risk2,
            _ => self.min_score_risk3,
        }
    }

    /// `requested` when positive, otherwise the policy default.
    #[must_use]
    pub fn resolve_months(&self, requested: u32) -> u32 {
        if requested > 0 { requested } else { self.default_months }
    }
}

/// Builder for [`ApprovalPolicy`].
///
/// Obtain via [`ApprovalPolicy::builder`]; finalize with [`build`](Self::build).
#[derive(Debug)]
pub struct ApprovalPolicyBuilder {
    policy: ApprovalPolicy,
}

impl ApprovalPolicyBuilder {
    /// Minimum scores for risk tiers 1, 2 and 3+.
    #[must_use]
    pub fn min_scores(mut self, risk1: u16, risk2: u16, risk3: u16) -> Self {
        self.policy.min_score_risk1 = risk1;
        self.policy.min_score_risk2 = risk2;
        self.policy.min_score_risk3 = risk3;
        self
    }

    /// Amount caps for risk tiers 1, 2 and 3+.
    #[must_use]
    pub fn max_amounts(mut self, risk1: Decimal, risk2: Decimal, risk3: Decimal) -> Self {
        self.policy.max_amount_risk1 = risk1;
        self.policy.max_amount_risk2 = risk2;
        self.policy.max_amount_risk3 = risk3;
        self
    }

    #[must_use]
    pub fn max_installment_to_net_flow(mut self, ratio: Decimal) -> Self {
        self.policy.max_installment_to_net_flow = ratio;
        self
    }

    #[must_use]
    pub fn default_months(mut self, months: u32) -> Self {
        self.policy.default_months = months;
        self
    }

    #[must_use]
    pub fn annual_interest(mut self, rate: Decimal) -> Self {
        self.policy.annual_interest = rate;
        self
    }

    /// Validate and build the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::InvalidConfig`] when a cap is not positive, a
    /// minimum score lies outside `[300, 850]`, the installment ratio is not in
    /// `(0, 1]`, the interest rate is negative or the default term is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<ApprovalPolicy, PolicyError> {
        let p = self.policy;
        let invalid = |reason: &str| Err(PolicyError::InvalidConfig { reason: reason.to_owned() });

        if p.default_months == 0 {
            return invalid("default_months must be >= 1");
        }
        if [p.max_amount_risk1, p.max_amount_risk2, p.max_amount_risk3]
            .iter()
            .any(|cap| *cap <= Decimal::ZERO)
        {
            return invalid("max amounts must be > 0");
        }
        if [p.min_score_risk1, p.min_score_risk2, p.min_score_risk3]
            .iter()
            .any(|score| !(300..=850).contains(score))
        {
            return invalid("min scores must be within [300, 850]");
        }
        if p.max_installment_to_net_flow <= Decimal::ZERO || p.max_installment_to_net_flow > Decimal::ONE {
            return invalid("max_installment_to_net_flow must be within (0, 1]");
        }
        if p.annual_interest < Decimal::ZERO {
            return invalid("annual_interest must be >= 0");
        }
        Ok(p)
    }
}
