// Rust guideline compliant 2026-10-18

//! Loan workflow orchestrator.
//!
//! [`LoanWorkflow::process_new_application`] turns a submitted loan into a
//! persisted decision: one credit assessment, the loan's new status and, on
//! approval, a full repayment schedule. All writes go through one
//! `domain::LoanStoreTx` and are committed together or not at all.
//!
//! The workflow does not guard against being run twice for the same loan; a
//! second run appends a second assessment (and schedule). Callers own
//! single-invocation per loan.

use std::time::Duration;

use approval::{ApprovalEngine, ApprovalError, ApprovalPolicy, monthly_payment};
use chrono::{Months, NaiveDate};
use domain::{
    ApplicationFeatures, ApprovalDecision, CashFlowStore, Clock, CreditAssessment,
    DecisionOutcome, InstallmentStatus, Loan, LoanProduct, LoanStatus, LoanStore, LoanStoreTx,
    RepaymentInstallment, ScoringProvider, StorageError,
};
use rust_decimal::Decimal;

/// Days per month in the coarse maturity-date to term conversion.
const DAYS_PER_MONTH: i64 = 30;
/// Schedule length used when no positive term is supplied.
const FALLBACK_SCHEDULE_MONTHS: u32 = 12;

// ---------------------------------------------------------------------------
// WorkflowError
// ---------------------------------------------------------------------------

/// Errors that can occur while processing an application.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// No loan exists for the requested id.
    #[error("loan {id} not found")]
    MissingLoan {
        /// Requested loan id.
        id: uuid::Uuid,
    },
    /// The loan cannot enter the workflow in its current state.
    #[error("invalid workflow state: {reason}")]
    InvalidState {
        /// Human-readable description of the problem.
        reason: String,
    },
    /// The approval engine's collaborators failed.
    #[error("approval error: {0}")]
    Approval(#[from] ApprovalError),
    /// A read or write against the loan store failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// The run did not finish in time; nothing was committed.
    #[error("workflow timed out after {limit:?}")]
    TimedOut {
        /// Time limit that elapsed.
        limit: Duration,
    },
}

// ---------------------------------------------------------------------------
// Pure helpers
// ---------------------------------------------------------------------------

/// Build engine input from a loan.
///
/// The requested amount is the approved amount when positive, else the
/// original amount. An unset maturity date yields the policy default term;
/// otherwise the term is the whole number of 30-day periods until maturity,
/// at least one.
#[must_use]
pub fn derive_features(loan: &Loan, today: NaiveDate, policy: &ApprovalPolicy) -> ApplicationFeatures {
    let requested_amount = if loan.approved_amount > Decimal::ZERO {
        loan.approved_amount
    } else {
        loan.amount
    };

    let term_months = match loan.term {
        None => policy.default_months,
        Some(maturity) => {
            let months = (maturity - today).num_days().div_euclid(DAYS_PER_MONTH).max(1);
            u32::try_from(months).unwrap_or(u32::MAX)
        }
    };

    ApplicationFeatures {
        requested_amount,
        term_months,
        product: LoanProduct::from_loan_type(&loan.loan_type),
    }
}

fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, WorkflowError> {
    date.checked_add_months(Months::new(months)).ok_or_else(|| WorkflowError::InvalidState {
        reason: format!("{date} + {months} months is out of range"),
    })
}

/// Level-payment schedule for an approved loan, one installment per month.
///
/// The first installment is due one month after `today`. Principal is the
/// approved amount when positive, else the original amount.
///
/// # Errors
///
/// Returns [`WorkflowError::InvalidState`] if the installment cannot be
/// priced or a due date falls outside the supported calendar range.
pub fn build_repayment_plan(
    loan: &Loan,
    months: u32,
    today: NaiveDate,
    annual_interest: Decimal,
) -> Result<Vec<RepaymentInstallment>, WorkflowError> {
    let mut principal = if loan.approved_amount > Decimal::ZERO {
        loan.approved_amount
    } else {
        loan.amount
    };
    if principal <= Decimal::ZERO {
        principal = loan.amount;
    }
    let months = if months == 0 { FALLBACK_SCHEDULE_MONTHS } else { months };
    let amount_due = monthly_payment(principal, annual_interest, months).ok_or_else(|| {
        WorkflowError::InvalidState {
            reason: format!("installment of {principal} over {months} months is out of range"),
        }
    })?;

    (1..=months)
        .map(|n| {
            Ok(RepaymentInstallment {
                id: uuid::Uuid::new_v4(),
                loan_id: loan.id,
                due_date: add_months(today, n)?,
                amount_due,
                amount_paid: Decimal::ZERO,
                payment_date: None,
                status: InstallmentStatus::Scheduled,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// LoanWorkflow
// ---------------------------------------------------------------------------

/// Transactional use case driving the [`ApprovalEngine`].
///
/// Generic over the engine's read ports, the loan store and the clock.
#[derive(Debug)]
pub struct LoanWorkflow<S, C, L, K> {
    engine: ApprovalEngine<S, C>,
    store: L,
    clock: K,
}

impl<S, C, L, K> LoanWorkflow<S, C, L, K>
where
    S: ScoringProvider,
    C: CashFlowStore,
    L: LoanStore,
    K: Clock,
{
    #[must_use]
    pub fn new(engine: ApprovalEngine<S, C>, store: L, clock: K) -> Self {
        Self { engine, store, clock }
    }

    /// Decide on `loan` and persist the outcome atomically.
    ///
    /// Always records a credit assessment. `AutoApproved` sets the approved
    /// amount, approval date, a maturity date if none was set, and writes one
    /// `Scheduled` installment per month. `AutoDeclined` zeroes the approved
    /// amount and stamps the date. `PendingReview` only changes the status.
    ///
    /// `loan` is updated in place only after the commit succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::InvalidState`] for a blank customer id before
    /// any store access, [`WorkflowError::Approval`] or
    /// [`WorkflowError::Storage`] on collaborator failure. On error nothing is
    /// committed.
    pub async fn process_new_application(
        &self,
        loan: &mut Loan,
    ) -> Result<ApprovalDecision, WorkflowError> {
        if loan.customer_id.trim().is_empty() {
            return Err(WorkflowError::InvalidState {
                reason: "Loan.CustomerId is required before workflow".to_owned(),
            });
        }

        let mut tx = self.store.begin().await?;

        let today = self.clock.today();
        let now = self.clock.now();
        let policy = self.engine.policy();
        let features = derive_features(loan, today, policy);
        tracing::debug!(loan_id = %loan.id, ?features, "workflow.features");

        let decision = self.engine.decide(&loan.customer_id, &features).await?;

        tx.insert_assessment(CreditAssessment {
            id: uuid::Uuid::new_v4(),
            loan_id: loan.id,
            credit_score: decision.score,
            risk_level: decision.risk_level,
            notes: decision.audit_notes(),
            assessed_at: now,
        })
        .await?;

        let mut updated = loan.clone();
        let mut installments = Vec::new();
        match decision.outcome {
            DecisionOutcome::AutoApproved { amount, .. } => {
                updated.status = LoanStatus::AutoApproved;
                updated.approved_amount = amount;
                updated.approval_date = Some(now);
                if updated.term.is_none() {
                    updated.term = Some(add_months(today, features.term_months)?);
                }
                installments =
                    build_repayment_plan(&updated, features.term_months, today, policy.annual_interest)?;
            }
            DecisionOutcome::AutoDeclined { .. } => {
                updated.status = LoanStatus::AutoDeclined;
                updated.approved_amount = Decimal::ZERO;
                updated.approval_date = Some(now);
            }
            DecisionOutcome::PendingReview { .. } => {
                updated.status = LoanStatus::PendingReview;
            }
        }

        tx.update_loan(&updated).await?;
        let scheduled = installments.len();
        if !installments.is_empty() {
            tx.insert_installments(installments).await?;
        }
        tx.commit().await?;

        tracing::info!(
            loan_id = %updated.id,
            status = %updated.status,
            approved_amount = %updated.approved_amount,
            installments = scheduled,
            "workflow.committed"
        );
        *loan = updated;
        Ok(decision)
    }

    /// Load a loan by id and run [`process_new_application`](Self::process_new_application).
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::MissingLoan`] when no such loan exists,
    /// otherwise the errors of `process_new_application`.
    pub async fn process_loan(
        &self,
        id: uuid::Uuid,
    ) -> Result<(Loan, ApprovalDecision), WorkflowError> {
        let Some(mut loan) = self.store.find_loan(id).await? else {
            return Err(WorkflowError::MissingLoan { id });
        };
        let decision = self.process_new_application(&mut loan).await?;
        Ok((loan, decision))
    }

    /// Run [`process_new_application`](Self::process_new_application) under a
    /// time limit.
    ///
    /// On expiry the in-flight transaction is dropped uncommitted and `loan`
    /// is left untouched. No retry is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::TimedOut`] on expiry, otherwise the errors of
    /// `process_new_application`.
    pub async fn process_with_timeout(
        &self,
        loan: &mut Loan,
        limit: Duration,
    ) -> Result<ApprovalDecision, WorkflowError> {
        let loan_id = loan.id;
        tokio::time::timeout(limit, self.process_new_application(loan))
            .await
            .map_err(|elapsed| {
                tracing::warn!(%loan_id, %elapsed, "workflow.timed_out");
                WorkflowError::TimedOut { limit }
            })?
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
