// Rust guideline compliant 2026-10-18

//! Loan-approval demo entry point.
//!
//! Generates synthetic applicants, seeds an in-memory store with their cash
//! flow, and runs every application through the transactional workflow. A
//! precomputed model score is used when one exists; otherwise the cash-flow
//! heuristic scores the applicant.
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info cargo run --bin loan_approval
//!
//! # Also show features and per-scorer debug output
//! RUST_LOG=debug cargo run --bin loan_approval
//! ```

mod adapters;
mod demo;

use std::sync::Arc;
use std::time::Duration;

use adapters::in_memory_store::InMemoryLoanStore;
use adapters::precomputed_scorer::PrecomputedScorer;
use anyhow::Context as _;
use approval::{ApprovalEngine, ApprovalPolicy};
use demo::{DemoConfig, Tally};
use domain::{Clock as _, SystemClock};
use scoring::{FallbackScorer, HeuristicScorer};
use workflow::LoanWorkflow;

/// Upper bound for one application, scoring and commit included.
const PROCESS_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize the tracing subscriber before any async work.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let policy = ApprovalPolicy::builder()
        .build()
        .context("failed to build approval policy")?;
    // Set .seed(..) here for a reproducible run.
    let demo_config = DemoConfig::builder(40)
        .build()
        .context("failed to build demo config")?;

    let clock = SystemClock;
    let applicants = demo::generate(&demo_config, clock.today());

    // One shared store backs the cash-flow reads and the loan writes.
    let store = InMemoryLoanStore::new();
    let mut model = PrecomputedScorer::new();
    for applicant in &applicants {
        if let Some(row) = applicant.cash_flow {
            store.upsert_cash_flow(applicant.loan.customer_id.clone(), row);
        }
        if let Some((score, risk_level)) = applicant.model_score {
            model.insert(applicant.loan.customer_id.clone(), score, risk_level);
        }
    }
    tracing::info!(
        applicants = applicants.len(),
        model_scores = model.customer_count(),
        "main.seeded"
    );

    let scorer = FallbackScorer::new(model, HeuristicScorer::new(store.clone()));
    let engine = ApprovalEngine::new(scorer, store.clone(), Arc::new(policy));
    let workflow = LoanWorkflow::new(engine, store.clone(), clock);

    let pipeline = async {
        let mut tally = Tally::default();
        for applicant in applicants {
            let mut loan = applicant.loan;
            store.insert_loan(loan.clone());
            let decision = workflow
                .process_with_timeout(&mut loan, PROCESS_TIMEOUT)
                .await
                .with_context(|| format!("workflow failed for loan {}", loan.id))?;
            tally.log_and_record(&loan, &decision);
        }
        anyhow::Ok(tally)
    };

    // Race the run against CTRL+C; committed loans stay committed.
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("main.shutdown: ctrl_c received, stopping");
        }
        result = pipeline => {
            let tally = result?;
            tracing::info!(
                approved = tally.approved,
                declined = tally.declined,
                pending_review = tally.pending_review,
                assessments = store.assessment_count(),
                installments = store.installment_count(),
                "main.summary"
            );
        }
    }

    Ok(())
}
