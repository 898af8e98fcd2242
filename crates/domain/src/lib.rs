// Rust guideline compliant 2026-10-18

//! Shared domain types for the loan approval core.
//!
//! Defines the application/decision value objects, the persisted records
//! (`Loan`, `CreditAssessment`, `RepaymentInstallment`) and the hexagonal port
//! traits: `ScoringProvider`, `CashFlowStore`, `LoanStore`, `LoanStoreTx` and
//! `Clock`. Every other crate in the workspace depends on this one.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Application input
// ---------------------------------------------------------------------------

/// Loan product requested by the applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanProduct {
    /// Unsecured personal loan; also the fallback for unknown loan types.
    #[default]
    Personal,
    Mortgage,
    Auto,
    CreditCard,
}

impl LoanProduct {
    /// Map the free-text loan type of a [`Loan`] to a product.
    ///
    /// Matching is case-insensitive; anything unrecognized is `Personal`.
    #[must_use]
    pub fn from_loan_type(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "mortgage" => Self::Mortgage,
            "auto" => Self::Auto,
            "creditcard" => Self::CreditCard,
            _ => Self::Personal,
        }
    }
}

/// Per-request input to the approval engine. Built once per decision.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationFeatures {
    /// Amount being asked for. Expected to be positive; not validated.
    pub requested_amount: Decimal,
    /// Requested term in months. `0` means "use the policy default".
    pub term_months: u32,
    pub product: LoanProduct,
}

// ---------------------------------------------------------------------------
// Collaborator outputs
// ---------------------------------------------------------------------------

/// Output of a [`ScoringProvider`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditScoreResult {
    /// Credit score in `[300, 850]`.
    pub score: u16,
    /// Risk tier in `{1, 2, 3, 4}`, 1 being the lowest risk.
    pub risk_level: u8,
    /// Free-text diagnostic from the provider.
    pub notes: String,
}

/// Aggregate monthly cash flow of a customer, read from the features store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateCashFlow {
    pub avg_monthly_inflow: Option<Decimal>,
    pub avg_monthly_outflow: Option<Decimal>,
}

impl AggregateCashFlow {
    /// Inflow minus outflow, absent components counting as zero.
    #[must_use]
    pub fn net_flow(&self) -> Decimal {
        self.avg_monthly_inflow.unwrap_or_default() - self.avg_monthly_outflow.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Short justification attached to every decision.
///
/// `Display` renders the exact wording stored in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    NoCreditFeatures,
    HighRiskLowScore,
    RequestedFarAboveRiskCap,
    UnknownNetFlow,
    InsufficientAffordability,
    CappedByAffordability,
    ScoreBorderline,
    WithinPolicy,
}

impl DecisionReason {
    /// Audit text for this reason.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoCreditFeatures => "No credit features for user.",
            Self::HighRiskLowScore => "High risk / low score.",
            Self::RequestedFarAboveRiskCap => "Requested >> risk cap",
            Self::UnknownNetFlow => "Unknown/negative net monthly flow",
            Self::InsufficientAffordability => "Insufficient affordability",
            Self::CappedByAffordability => "Capped by affordability.",
            Self::ScoreBorderline => "Score borderline",
            Self::WithinPolicy => "Within policy.",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three possible outcomes; only an approval carries an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    AutoApproved { amount: Decimal, reason: DecisionReason },
    PendingReview { reason: DecisionReason },
    AutoDeclined { reason: DecisionReason },
}

/// Result of one engine run.
///
/// `score`, `risk_level` and `score_notes` echo the scoring input; they are
/// `0`, `0` and empty when no score was available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalDecision {
    pub outcome: DecisionOutcome,
    pub score: u16,
    pub risk_level: u8,
    /// Scorer diagnostics, passed through unmodified.
    pub score_notes: String,
}

impl ApprovalDecision {
    /// Text stored on the credit assessment: the reason, then the scorer notes.
    #[must_use]
    pub fn audit_notes(&self) -> String {
        if self.score_notes.is_empty() {
            self.reason().to_string()
        } else {
            format!("{} | {}", self.reason(), self.score_notes)
        }
    }

    /// Approved amount, present only for `AutoApproved`.
    #[must_use]
    pub fn approved_amount(&self) -> Option<Decimal> {
        match self.outcome {
            DecisionOutcome::AutoApproved { amount, .. } => Some(amount),
            DecisionOutcome::PendingReview { .. } | DecisionOutcome::AutoDeclined { .. } => None,
        }
    }

    #[must_use]
    pub fn reason(&self) -> DecisionReason {
        match self.outcome {
            DecisionOutcome::AutoApproved { reason, .. }
            | DecisionOutcome::PendingReview { reason }
            | DecisionOutcome::AutoDeclined { reason } => reason,
        }
    }

    /// Loan status this decision moves an application into.
    #[must_use]
    pub fn status(&self) -> LoanStatus {
        match self.outcome {
            DecisionOutcome::AutoApproved { .. } => LoanStatus::AutoApproved,
            DecisionOutcome::AutoDeclined { .. } => LoanStatus::AutoDeclined,
            DecisionOutcome::PendingReview { .. } => LoanStatus::PendingReview,
        }
    }
}

// ---------------------------------------------------------------------------
// Persisted records
// ---------------------------------------------------------------------------

/// A status string read back from storage did not match any known value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Lifecycle state of a loan application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoanStatus {
    /// Freshly submitted, not yet through the workflow.
    #[default]
    Submitted,
    PendingReview,
    AutoApproved,
    AutoDeclined,
}

impl LoanStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Submitted => "Submitted",
            Self::PendingReview => "PendingReview",
            Self::AutoApproved => "AutoApproved",
            Self::AutoDeclined => "AutoDeclined",
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Submitted" => Ok(Self::Submitted),
            "PendingReview" => Ok(Self::PendingReview),
            "AutoApproved" => Ok(Self::AutoApproved),
            "AutoDeclined" => Ok(Self::AutoDeclined),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// A loan application, owned by the caller and mutated by the workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Loan {
    pub id: uuid::Uuid,
    /// Identity-layer user id. Must be non-blank before the workflow runs.
    pub customer_id: String,
    /// Free-text loan type, mapped through [`LoanProduct::from_loan_type`].
    pub loan_type: String,
    pub amount: Decimal,
    /// Zero until a decision (or an admin) sets it.
    pub approved_amount: Decimal,
    /// Maturity date; `None` until the applicant or the workflow sets one.
    pub term: Option<NaiveDate>,
    pub status: LoanStatus,
    pub approval_date: Option<DateTime<Utc>>,
}

impl Loan {
    /// Create a freshly submitted application with a random id.
    #[must_use]
    pub fn new(
        customer_id: impl Into<String>,
        loan_type: impl Into<String>,
        amount: Decimal,
        term: Option<NaiveDate>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            customer_id: customer_id.into(),
            loan_type: loan_type.into(),
            amount,
            approved_amount: Decimal::ZERO,
            term,
            status: LoanStatus::Submitted,
            approval_date: None,
        }
    }
}

/// Append-only audit record of one decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditAssessment {
    pub id: uuid::Uuid,
    pub loan_id: uuid::Uuid,
    pub credit_score: u16,
    pub risk_level: u8,
    pub notes: String,
    pub assessed_at: DateTime<Utc>,
}

/// Payment state of a scheduled installment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstallmentStatus {
    #[default]
    Scheduled,
    Paid,
    Overdue,
}

impl InstallmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
        }
    }
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallmentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Scheduled" => Ok(Self::Scheduled),
            "Paid" => Ok(Self::Paid),
            "Overdue" => Ok(Self::Overdue),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// One row of a repayment schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepaymentInstallment {
    pub id: uuid::Uuid,
    pub loan_id: uuid::Uuid,
    pub due_date: NaiveDate,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub payment_date: Option<NaiveDate>,
    pub status: InstallmentStatus,
}

// ---------------------------------------------------------------------------
// Port errors
// ---------------------------------------------------------------------------

/// Errors from the persistence ports.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backend could not be reached or rejected the operation.
    #[error("storage unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
    /// A stored row could not be decoded into a domain value.
    #[error("corrupt record: {reason}")]
    Corrupt {
        /// Human-readable description.
        reason: String,
    },
}

/// Errors from the scoring port. Absence of a score is not an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("scoring unavailable: {reason}")]
    Unavailable {
        /// Human-readable description.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Hexagonal port: credit scoring.
///
/// Implementations may be model-based or heuristic; the engine does not care.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait ScoringProvider {
    /// Score `customer_id`, optionally adjusted for a specific application.
    ///
    /// Returns `Ok(None)` when there is not enough data to score.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::Unavailable`] on infrastructure failure.
    async fn compute(
        &self,
        customer_id: &str,
        features: Option<&ApplicationFeatures>,
    ) -> Result<Option<CreditScoreResult>, ScoringError>;
}

/// Hexagonal port: read-only per-user aggregate cash-flow features.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait CashFlowStore {
    /// Fetch the aggregate row for `customer_id`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the store cannot be read.
    async fn get_by_user_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<AggregateCashFlow>, StorageError>;
}

/// Hexagonal port: loan persistence with an explicit transaction boundary.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait LoanStore {
    /// Open transaction type. Dropping it without `commit` rolls back.
    type Tx<'a>: LoanStoreTx
    where
        Self: 'a;

    /// Open a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if no transaction can be started.
    async fn begin(&self) -> Result<Self::Tx<'_>, StorageError>;

    /// Load a loan by id outside of any transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on backend or decoding failure.
    async fn find_loan(&self, id: uuid::Uuid) -> Result<Option<Loan>, StorageError>;
}

/// Writes staged inside one [`LoanStore`] transaction.
#[expect(
    async_fn_in_trait,
    reason = "no dyn dispatch needed; internal workspace only"
)]
pub trait LoanStoreTx {
    /// # Errors
    ///
    /// Returns [`StorageError`] when the write is rejected.
    async fn insert_assessment(&mut self, assessment: CreditAssessment) -> Result<(), StorageError>;

    /// Insert or overwrite `loan`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the write is rejected.
    async fn update_loan(&mut self, loan: &Loan) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns [`StorageError`] when the write is rejected.
    async fn insert_installments(
        &mut self,
        installments: Vec<RepaymentInstallment>,
    ) -> Result<(), StorageError>;

    /// Make every staged write durable at once.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the commit fails; nothing is persisted then.
    async fn commit(self) -> Result<(), StorageError>;
}

/// Source of "now" and "today", injectable for deterministic tests.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date of [`now`](Self::now) in UTC.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock [`Clock`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// [`Clock`] frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone as _;
    use rust_decimal_macros::dec;

    #[test]
    fn product_mapping_is_case_insensitive() {
        assert_eq!(LoanProduct::from_loan_type("Mortgage"), LoanProduct::Mortgage);
        assert_eq!(LoanProduct::from_loan_type("AUTO"), LoanProduct::Auto);
        assert_eq!(LoanProduct::from_loan_type("creditCard"), LoanProduct::CreditCard);
    }

    #[test]
    fn unknown_product_defaults_to_personal() {
        assert_eq!(LoanProduct::from_loan_type("boat"), LoanProduct::Personal);
        assert_eq!(LoanProduct::from_loan_type(""), LoanProduct::Personal);
        assert_eq!(LoanProduct::from_loan_type("credit card"), LoanProduct::Personal);
    }

    #[test]
    fn net_flow_treats_missing_components_as_zero() {
        let full = AggregateCashFlow {
            avg_monthly_inflow: Some(dec!(2000)),
            avg_monthly_outflow: Some(dec!(500)),
        };
        assert_eq!(full.net_flow(), dec!(1500));

        let no_outflow = AggregateCashFlow { avg_monthly_inflow: Some(dec!(800)), avg_monthly_outflow: None };
        assert_eq!(no_outflow.net_flow(), dec!(800));

        assert_eq!(AggregateCashFlow::default().net_flow(), Decimal::ZERO);
    }

    #[test]
    fn reason_text_is_stable() {
        assert_eq!(DecisionReason::NoCreditFeatures.to_string(), "No credit features for user.");
        assert_eq!(DecisionReason::HighRiskLowScore.to_string(), "High risk / low score.");
        assert_eq!(DecisionReason::RequestedFarAboveRiskCap.to_string(), "Requested >> risk cap");
        assert_eq!(
            DecisionReason::UnknownNetFlow.to_string(),
            "Unknown/negative net monthly flow"
        );
        assert_eq!(
            DecisionReason::InsufficientAffordability.to_string(),
            "Insufficient affordability"
        );
        assert_eq!(DecisionReason::CappedByAffordability.to_string(), "Capped by affordability.");
        assert_eq!(DecisionReason::ScoreBorderline.to_string(), "Score borderline");
        assert_eq!(DecisionReason::WithinPolicy.to_string(), "Within policy.");
    }

    #[test]
    fn audit_notes_append_scorer_notes() {
        let scored = ApprovalDecision {
            outcome: DecisionOutcome::PendingReview { reason: DecisionReason::ScoreBorderline },
            score: 640,
            risk_level: 3,
            score_notes: "heuristic: savings_ratio=0.20".to_owned(),
        };
        assert_eq!(scored.audit_notes(), "Score borderline | heuristic: savings_ratio=0.20");

        let unscored = ApprovalDecision {
            outcome: DecisionOutcome::PendingReview { reason: DecisionReason::NoCreditFeatures },
            score: 0,
            risk_level: 0,
            score_notes: String::new(),
        };
        assert_eq!(unscored.audit_notes(), "No credit features for user.");
    }

    #[test]
    fn only_approval_carries_an_amount() {
        let approved = ApprovalDecision {
            outcome: DecisionOutcome::AutoApproved { amount: dec!(3000), reason: DecisionReason::WithinPolicy },
            score: 750,
            risk_level: 1,
            score_notes: String::new(),
        };
        assert_eq!(approved.approved_amount(), Some(dec!(3000)));
        assert_eq!(approved.status(), LoanStatus::AutoApproved);

        let pending = ApprovalDecision {
            outcome: DecisionOutcome::PendingReview { reason: DecisionReason::ScoreBorderline },
            score: 650,
            risk_level: 1,
            score_notes: String::new(),
        };
        assert_eq!(pending.approved_amount(), None);
        assert_eq!(pending.reason(), DecisionReason::ScoreBorderline);
        assert_eq!(pending.status(), LoanStatus::PendingReview);
    }

    #[test]
    fn statuses_parse_their_own_text() {
        for status in [
            LoanStatus::Submitted,
            LoanStatus::PendingReview,
            LoanStatus::AutoApproved,
            LoanStatus::AutoDeclined,
        ] {
            assert_eq!(status.as_str().parse::<LoanStatus>(), Ok(status));
        }
        assert_eq!("Scheduled".parse::<InstallmentStatus>(), Ok(InstallmentStatus::Scheduled));
        assert_eq!(
            "approved".parse::<LoanStatus>(),
            Err(UnknownStatus("approved".to_owned()))
        );
    }

    #[test]
    fn new_loan_starts_submitted_with_zero_approved_amount() {
        let loan = Loan::new("cust-1", "Auto", dec!(1200), None);
        assert_eq!(loan.status, LoanStatus::Submitted);
        assert_eq!(loan.approved_amount, Decimal::ZERO);
        assert!(loan.approval_date.is_none());
    }

    #[test]
    fn storage_error_display() {
        let e = StorageError::Unavailable { reason: "disk full".to_owned() };
        assert_eq!(e.to_string(), "storage unavailable: disk full");
        let s = ScoringError::Unavailable { reason: "timeout".to_owned() };
        assert_eq!(s.to_string(), "scoring unavailable: timeout");
    }

    #[test]
    fn fixed_clock_today_is_utc_date() {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 3, 31, 23, 59, 0).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
    }

    /// A minimal scoring port implementation compiles and can report absence.
    #[tokio::test]
    async fn scoring_port_minimal_impl() {
        struct NoData;

        impl ScoringProvider for NoData {
            async fn compute(
                &self,
                _customer_id: &str,
                _features: Option<&ApplicationFeatures>,
            ) -> Result<Option<CreditScoreResult>, ScoringError> {
                Ok(None)
            }
        }

        assert!(NoData.compute("c", None).await.unwrap().is_none());
    }
}
