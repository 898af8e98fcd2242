// Rust guideline compliant 2026-10-18

//! In-memory adapter for the `LoanStore` and `CashFlowStore` ports.
//!
//! Intended for demo runs and unit tests only. Handles are cheap clones of one
//! shared state so the same store can back the cash-flow reads of the engine
//! and the transactional writes of the workflow.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use domain::{
    AggregateCashFlow, CashFlowStore, CreditAssessment, Loan, LoanStore, LoanStoreTx,
    RepaymentInstallment, StorageError,
};
use uuid::Uuid;

#[derive(Debug, Default)]
struct State {
    loans: HashMap<Uuid, Loan>,
    assessments: Vec<CreditAssessment>,
    installments: Vec<RepaymentInstallment>,
    cash_flows: HashMap<String, AggregateCashFlow>,
}

/// `LoanStore` + `CashFlowStore` adapter backed by in-memory maps.
///
/// Transactions stage their writes and apply them in one step on `commit`;
/// a dropped transaction leaves the state untouched.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLoanStore {
    state: Rc<RefCell<State>>,
    /// Fault injection: reject every `insert_installments` call.
    fail_installments: Rc<Cell<bool>>,
}

impl InMemoryLoanStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `insert_installments` fail with `Unavailable`.
    #[cfg(test)]
    pub fn fail_on_installments(&self, fail: bool) {
        self.fail_installments.set(fail);
    }

    /// Register a submitted loan outside of any transaction.
    pub fn insert_loan(&self, loan: Loan) {
        self.state.borrow_mut().loans.insert(loan.id, loan);
    }

    /// Set the aggregate cash-flow row of `customer_id`.
    pub fn upsert_cash_flow(&self, customer_id: impl Into<String>, row: AggregateCashFlow) {
        self.state.borrow_mut().cash_flows.insert(customer_id.into(), row);
    }

    /// Number of committed assessments.
    #[must_use]
    pub fn assessment_count(&self) -> usize {
        self.state.borrow().assessments.len()
    }

    /// Number of committed installments.
    #[must_use]
    pub fn installment_count(&self) -> usize {
        self.state.borrow().installments.len()
    }

    #[cfg(test)]
    #[must_use]
    pub fn installments_for(&self, loan_id: Uuid) -> Vec<RepaymentInstallment> {
        self.state
            .borrow()
            .installments
            .iter()
            .filter(|i| i.loan_id == loan_id)
            .cloned()
            .collect()
    }
}

impl CashFlowStore for InMemoryLoanStore {
    /// # Errors
    ///
    /// Infallible; always returns `Ok`.
    async fn get_by_user_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<AggregateCashFlow>, StorageError> {
        Ok(self.state.borrow().cash_flows.get(customer_id).copied())
    }
}

impl LoanStore for InMemoryLoanStore {
    type Tx<'a>
        = InMemoryTx<'a>
    where
        Self: 'a;

    async fn begin(&self) -> Result<InMemoryTx<'_>, StorageError> {
        Ok(InMemoryTx { store: self, staged: Staged::default() })
    }

    async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, StorageError> {
        Ok(self.state.borrow().loans.get(&id).cloned())
    }
}

#[derive(Debug, Default)]
struct Staged {
    loans: Vec<Loan>,
    assessments: Vec<CreditAssessment>,
    installments: Vec<RepaymentInstallment>,
}

/// Open transaction over an [`InMemoryLoanStore`].
#[derive(Debug)]
pub struct InMemoryTx<'a> {
    store: &'a InMemoryLoanStore,
    staged: Staged,
}

impl LoanStoreTx for InMemoryTx<'_> {
    async fn insert_assessment(&mut self, assessment: CreditAssessment) -> Result<(), StorageError> {
        self.staged.assessments.push(assessment);
        Ok(())
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<(), StorageError> {
        self.staged.loans.push(loan.clone());
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when fault injection is enabled.
    async fn insert_installments(
        &mut self,
        installments: Vec<RepaymentInstallment>,
    ) -> Result<(), StorageError> {
        if self.store.fail_installments.get() {
            return Err(StorageError::Unavailable {
                reason: "installment write rejected".to_owned(),
            });
        }
        self.staged.installments.extend(installments);
        Ok(())
    }

    async fn commit(self) -> Result<(), StorageError> {
        let Staged { loans, assessments, installments } = self.staged;
        let mut state = self.store.state.borrow_mut();
        for loan in loans {
            state.loans.insert(loan.id, loan);
        }
        state.assessments.extend(assessments);
        state.installments.extend(installments);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
