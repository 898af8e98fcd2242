// Rust guideline compliant 2026-10-18

//! Synthetic applicants for the demo binaries.
//!
//! Each applicant carries a submitted loan, usually an aggregate cash-flow
//! row and sometimes a precomputed model score. Configuration via
//! [`DemoConfig::builder`].

use chrono::{Days, NaiveDate};
use domain::{AggregateCashFlow, ApprovalDecision, Loan, LoanStatus};
use rand::seq::IndexedRandom as _;
use rand::{Rng, SeedableRng, rngs::StdRng};
use rust_decimal::Decimal;

/// Free-text loan types as applicants type them; `Boat` maps to `Personal`.
const LOAN_TYPES: &[&str] = &["Personal", "Mortgage", "auto", "CreditCard", "Boat"];

/// Share of applicants the offline model has already scored.
const MODEL_COVERAGE: f64 = 0.3;
/// Share of applicants without any cash-flow history.
const NO_HISTORY: f64 = 0.1;

// ---------------------------------------------------------------------------
// DemoConfig + builder
// ---------------------------------------------------------------------------

/// Errors raised while building a [`DemoConfig`].
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error("invalid demo configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// How many applicants to generate, and from which seed.
#[derive(Debug)]
pub struct DemoConfig {
    pub applicants: usize,
    /// `None` seeds from the OS.
    pub seed: Option<u64>,
}

/// Builder for [`DemoConfig`].
#[derive(Debug)]
pub struct DemoConfigBuilder {
    applicants: usize,
    seed: Option<u64>,
}

impl DemoConfig {
    /// Create a builder. `applicants` is the only required parameter.
    #[must_use]
    pub fn builder(applicants: usize) -> DemoConfigBuilder {
        DemoConfigBuilder { applicants, seed: None }
    }
}

impl DemoConfigBuilder {
    /// Fix the RNG seed for deterministic output.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// # Errors
    ///
    /// Returns [`DemoError::InvalidConfig`] when `applicants` is zero.
    #[must_use = "the Result must be checked; use ? or unwrap"]
    pub fn build(self) -> Result<DemoConfig, DemoError> {
        if self.applicants == 0 {
            return Err(DemoError::InvalidConfig { reason: "applicants must be >= 1".to_owned() });
        }
        Ok(DemoConfig { applicants: self.applicants, seed: self.seed })
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// One synthetic applicant.
#[derive(Debug)]
pub struct DemoApplicant {
    pub loan: Loan,
    pub cash_flow: Option<AggregateCashFlow>,
    /// `(score, risk_level)` from the offline model, if it has seen the customer.
    pub model_score: Option<(u16, u8)>,
}

/// Generate `config.applicants` applicants with maturity dates relative to `today`.
#[must_use]
pub fn generate(config: &DemoConfig, today: NaiveDate) -> Vec<DemoApplicant> {
    let mut rng = match config.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_os_rng(),
    };
    (0..config.applicants)
        .map(|i| applicant(&mut rng, format!("cust-{i:04}"), today))
        .collect()
}

fn applicant(rng: &mut StdRng, customer_id: String, today: NaiveDate) -> DemoApplicant {
    // Whole hundreds between 500 and 15 000.
    let amount = Decimal::from(rng.random_range(5u32..=150) * 100);
    let loan_type = LOAN_TYPES.choose(rng).copied().unwrap_or("Personal");
    let term = if rng.random_bool(0.5) {
        today.checked_add_days(Days::new(rng.random_range(90..=1_095)))
    } else {
        None
    };

    let cash_flow = (!rng.random_bool(NO_HISTORY)).then(|| {
        let inflow = rng.random_range(800u32..=6_000);
        // Outflow between 40 % and 110 % of inflow.
        let outflow = inflow * rng.random_range(40u32..=110) / 100;
        AggregateCashFlow {
            avg_monthly_inflow: Some(Decimal::from(inflow)),
            avg_monthly_outflow: Some(Decimal::from(outflow)),
        }
    });

    let model_score = rng.random_bool(MODEL_COVERAGE).then(|| {
        let score = rng.random_range(520u16..=820);
        (score, scoring::risk_level_for(score))
    });

    DemoApplicant { loan: Loan::new(customer_id, loan_type, amount, term), cash_flow, model_score }
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Decision counts of one demo run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub approved: usize,
    pub declined: usize,
    pub pending_review: usize,
}

impl Tally {
    pub fn record(&mut self, decision: &ApprovalDecision) {
        match decision.status() {
            LoanStatus::AutoApproved => self.approved += 1,
            LoanStatus::AutoDeclined => self.declined += 1,
            LoanStatus::PendingReview | LoanStatus::Submitted => self.pending_review += 1,
        }
    }

    /// Log one processed loan and count its decision.
    pub fn log_and_record(&mut self, loan: &Loan, decision: &ApprovalDecision) {
        tracing::info!(
            loan_id = %loan.id,
            customer_id = %loan.customer_id,
            requested = %loan.amount,
            status = %loan.status,
            approved_amount = %loan.approved_amount,
            score = decision.score,
            risk_level = decision.risk_level,
            reason = %decision.reason(),
            "demo.processed"
        );
        self.record(decision);
    }
}
