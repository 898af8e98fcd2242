// Rust guideline compliant 2026-10-18

//! Loan-approval demo entry point -- `SQLite` storage.
//!
//! Same flow as the `loan_approval` binary, but loans, assessments,
//! installments and cash-flow rows live in a `SQLite` database. Loans are
//! inserted as `Submitted` first and then processed by id, so the decision
//! and its schedule are committed in one database transaction.
//!
//! # Usage
//!
//! ```text
//! RUST_LOG=info cargo run --bin loan_approval_sqlite
//!
//! # Use another database file
//! LOAN_APPROVAL_DB_URL=sqlite:/tmp/loans.db RUST_LOG=info cargo run --bin loan_approval_sqlite
//! ```
//!
//! The database file is created on first run. Every run appends new loans.

mod demo;

// Load adapters directly so the in-memory store stays out of this binary's
// module tree.
#[path = "adapters/precomputed_scorer.rs"]
mod precomputed_scorer;
#[path = "adapters/sqlite_store.rs"]
mod sqlite_store;

use std::sync::Arc;

use anyhow::Context as _;
use approval::{ApprovalEngine, ApprovalPolicy};
use demo::{DemoConfig, Tally};
use domain::{Clock as _, SystemClock};
use precomputed_scorer::PrecomputedScorer;
use scoring::{FallbackScorer, HeuristicScorer};
use sqlite_store::SqliteLoanStore;
use workflow::LoanWorkflow;

/// Environment variable overriding [`DEFAULT_DB_URL`].
const DB_URL_ENV: &str = "LOAN_APPROVAL_DB_URL";
/// Database file created in the current working directory on first run.
const DEFAULT_DB_URL: &str = "sqlite:loan_approval.db";
/// Fixed so repeated runs generate the same applicant profiles.
const DEMO_SEED: u64 = 2026;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let db_url = std::env::var(DB_URL_ENV).unwrap_or_else(|_| DEFAULT_DB_URL.to_owned());
    let store = SqliteLoanStore::new(&db_url)
        .await
        .with_context(|| format!("failed to open SQLite store at {db_url}"))?;
    tracing::info!(%db_url, "main.store_opened");

    let policy = ApprovalPolicy::builder()
        .build()
        .context("failed to build approval policy")?;
    let demo_config = DemoConfig::builder(20)
        .seed(DEMO_SEED)
        .build()
        .context("failed to build demo config")?;

    let clock = SystemClock;
    let applicants = demo::generate(&demo_config, clock.today());

    let mut model = PrecomputedScorer::new();
    let mut loan_ids = Vec::with_capacity(applicants.len());
    for applicant in &applicants {
        let customer_id = &applicant.loan.customer_id;
        if let Some(row) = &applicant.cash_flow {
            store
                .upsert_cash_flow(customer_id, row)
                .await
                .context("failed to seed cash flow")?;
        }
        if let Some((score, risk_level)) = applicant.model_score {
            model.insert(customer_id.clone(), score, risk_level);
        }
        store
            .insert_loan(&applicant.loan)
            .await
            .context("failed to submit loan")?;
        loan_ids.push(applicant.loan.id);
    }
    tracing::info!(
        applicants = loan_ids.len(),
        model_scores = model.customer_count(),
        "main.seeded"
    );

    let scorer = FallbackScorer::new(model, HeuristicScorer::new(store.clone()));
    let engine = ApprovalEngine::new(scorer, store.clone(), Arc::new(policy));
    let workflow = LoanWorkflow::new(engine, store, clock);

    let pipeline = async {
        let mut tally = Tally::default();
        for id in loan_ids {
            let (loan, decision) = workflow
                .process_loan(id)
                .await
                .with_context(|| format!("workflow failed for loan {id}"))?;
            tally.log_and_record(&loan, &decision);
        }
        anyhow::Ok(tally)
    };

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
                "main.summary"
            );
        }
    }

    Ok(())
}
