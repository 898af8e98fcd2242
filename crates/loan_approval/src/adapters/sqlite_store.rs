// Rust guideline compliant 2026-10-18

//! SQLite adapter for the `LoanStore` and `CashFlowStore` ports (demo).
//!
//! Persists loans, credit assessments and repayment installments via `sqlx`
//! and serves the `user_aggregate_features` table as the cash-flow source.
//! Proves the workflow's transaction port is swappable without touching the
//! domain, approval or workflow crates.
//!
//! # Column encoding
//!
//! Money is stored as decimal TEXT so no precision is lost to floating point.
//! Dates are ISO-8601 TEXT (`YYYY-MM-DD`) and timestamps RFC 3339 TEXT.
//!
//! # `INSERT OR REPLACE` semantics
//!
//! Loans are upserted by id. Assessments and installments use plain `INSERT`:
//! they are append-only and every row carries a fresh UUID.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use domain::{
    AggregateCashFlow, CashFlowStore, CreditAssessment, Loan, LoanStatus, LoanStore, LoanStoreTx,
    RepaymentInstallment, StorageError,
};
use rust_decimal::Decimal;
use sqlx::Row as _;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqliteRow};
use uuid::Uuid;

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS loans (
        id              TEXT PRIMARY KEY,
        customer_id     TEXT NOT NULL,
        loan_type       TEXT NOT NULL,
        amount          TEXT NOT NULL,
        approved_amount TEXT NOT NULL,
        term            TEXT,            -- NULL until set
        status          TEXT NOT NULL,
        approval_date   TEXT             -- NULL until decided
    )",
    "CREATE TABLE IF NOT EXISTS credit_assessments (
        id           TEXT    PRIMARY KEY,
        loan_id      TEXT    NOT NULL,
        credit_score INTEGER NOT NULL,
        risk_level   INTEGER NOT NULL,
        notes        TEXT    NOT NULL,
        assessed_at  TEXT    NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS repayment_installments (
        id           TEXT PRIMARY KEY,
        loan_id      TEXT NOT NULL,
        due_date     TEXT NOT NULL,
        amount_due   TEXT NOT NULL,
        amount_paid  TEXT NOT NULL,
        payment_date TEXT,
        status       TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS user_aggregate_features (
        user_id             TEXT PRIMARY KEY,
        avg_monthly_inflow  TEXT,
        avg_monthly_outflow TEXT
    )",
];

/// `LoanStore` + `CashFlowStore` adapter backed by a SQLite database via `sqlx`.
#[derive(Debug, Clone)]
pub struct SqliteLoanStore {
    pool: SqlitePool,
}

impl SqliteLoanStore {
    /// Open or create a SQLite database and initialize the schema.
    ///
    /// Tables are created with `CREATE TABLE IF NOT EXISTS`, so repeated
    /// calls against the same file are safe.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the connection or schema creation fails.
    pub async fn new(db_url: &str) -> Result<Self, sqlx::Error> {
        // sqlx 0.8 does not create file databases unless asked to.
        let opts = db_url.parse::<SqliteConnectOptions>()?.create_if_missing(true);
        let pool = SqlitePool::connect_with(opts).await?;
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    /// Insert or overwrite `loan` outside of any transaction.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` on any `sqlx` error.
    pub async fn insert_loan(&self, loan: &Loan) -> Result<(), StorageError> {
        write_loan(&self.pool, loan).await.map_err(unavailable("insert_loan"))
    }

    /// Insert or overwrite the aggregate cash-flow row of `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` on any `sqlx` error.
    pub async fn upsert_cash_flow(
        &self,
        customer_id: &str,
        row: &AggregateCashFlow,
    ) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT OR REPLACE INTO user_aggregate_features
             (user_id, avg_monthly_inflow, avg_monthly_outflow)
             VALUES (?, ?, ?)",
        )
        .bind(customer_id)
        .bind(row.avg_monthly_inflow.map(|v| v.to_string()))
        .bind(row.avg_monthly_outflow.map(|v| v.to_string()))
        .execute(&self.pool)
        .await
        .map_err(unavailable("upsert_cash_flow"))?;
        Ok(())
    }
}

/// Log a `sqlx` failure and map it to `StorageError::Unavailable`.
fn unavailable(op: &'static str) -> impl FnOnce(sqlx::Error) -> StorageError {
    move |e| {
        tracing::error!(op, error = %e, "sqlite.query_failed");
        StorageError::Unavailable { reason: e.to_string() }
    }
}

async fn write_loan<'e, E>(executor: E, loan: &Loan) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT OR REPLACE INTO loans
         (id, customer_id, loan_type, amount, approved_amount, term, status, approval_date)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(loan.id.to_string())
    .bind(&loan.customer_id)
    .bind(&loan.loan_type)
    .bind(loan.amount.to_string())
    .bind(loan.approved_amount.to_string())
    .bind(loan.term.map(|d| d.to_string()))
    .bind(loan.status.as_str())
    .bind(loan.approval_date.map(|t| t.to_rfc3339()))
    .execute(executor)
    .await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

fn column<T: FromStr>(row: &SqliteRow, name: &str) -> Result<T, StorageError>
where
    T::Err: Display,
{
    let raw: String = row
        .try_get(name)
        .map_err(|e| StorageError::Corrupt { reason: format!("{name}: {e}") })?;
    parse(name, &raw)
}

fn optional_column<T: FromStr>(row: &SqliteRow, name: &str) -> Result<Option<T>, StorageError>
where
    T::Err: Display,
{
    let raw: Option<String> = row
        .try_get(name)
        .map_err(|e| StorageError::Corrupt { reason: format!("{name}: {e}") })?;
    raw.map(|raw| parse(name, &raw)).transpose()
}

fn parse<T: FromStr>(name: &str, raw: &str) -> Result<T, StorageError>
where
    T::Err: Display,
{
    raw.parse()
        .map_err(|e| StorageError::Corrupt { reason: format!("{name}={raw:?}: {e}") })
}

fn loan_from_row(row: &SqliteRow) -> Result<Loan, StorageError> {
    Ok(Loan {
        id: column::<Uuid>(row, "id")?,
        customer_id: column(row, "customer_id")?,
        loan_type: column(row, "loan_type")?,
        amount: column::<Decimal>(row, "amount")?,
        approved_amount: column::<Decimal>(row, "approved_amount")?,
        term: optional_column::<NaiveDate>(row, "term")?,
        status: column::<LoanStatus>(row, "status")?,
        approval_date: optional_column::<DateTime<Utc>>(row, "approval_date")?,
    })
}

// ---------------------------------------------------------------------------
// Port implementations
// ---------------------------------------------------------------------------

impl CashFlowStore for SqliteLoanStore {
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` on query failure and
    /// `StorageError::Corrupt` when a stored amount is not a decimal.
    async fn get_by_user_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<AggregateCashFlow>, StorageError> {
        let row = sqlx::query(
            "SELECT avg_monthly_inflow, avg_monthly_outflow
             FROM user_aggregate_features WHERE user_id = ?",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable("get_by_user_id"))?;
        row.map(|row| {
            Ok(AggregateCashFlow {
                avg_monthly_inflow: optional_column(&row, "avg_monthly_inflow")?,
                avg_monthly_outflow: optional_column(&row, "avg_monthly_outflow")?,
            })
        })
        .transpose()
    }
}

impl LoanStore for SqliteLoanStore {
    type Tx<'a>
        = SqliteTx
    where
        Self: 'a;

    async fn begin(&self) -> Result<SqliteTx, StorageError> {
        let tx = self.pool.begin().await.map_err(unavailable("begin"))?;
        Ok(SqliteTx { tx })
    }

    async fn find_loan(&self, id: Uuid) -> Result<Option<Loan>, StorageError> {
        let row = sqlx::query(
            "SELECT id, customer_id, loan_type, amount, approved_amount, term, status, approval_date
             FROM loans WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable("find_loan"))?;
        row.as_ref().map(loan_from_row).transpose()
    }
}

/// Open `sqlx` transaction. Dropping it without `commit` rolls back.
pub struct SqliteTx {
    tx: sqlx::Transaction<'static, Sqlite>,
}

impl std::fmt::Debug for SqliteTx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteTx").finish_non_exhaustive()
    }
}

impl LoanStoreTx for SqliteTx {
    async fn insert_assessment(&mut self, assessment: CreditAssessment) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO credit_assessments
             (id, loan_id, credit_score, risk_level, notes, assessed_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(assessment.id.to_string())
        .bind(assessment.loan_id.to_string())
        .bind(i64::from(assessment.credit_score))
        .bind(i64::from(assessment.risk_level))
        .bind(&assessment.notes)
        .bind(assessment.assessed_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .map_err(unavailable("insert_assessment"))?;
        Ok(())
    }

    async fn update_loan(&mut self, loan: &Loan) -> Result<(), StorageError> {
        write_loan(&mut *self.tx, loan).await.map_err(unavailable("update_loan"))
    }

    async fn insert_installments(
        &mut self,
        installments: Vec<RepaymentInstallment>,
    ) -> Result<(), StorageError> {
        for item in installments {
            sqlx::query(
                "INSERT INTO repayment_installments
                 (id, loan_id, due_date, amount_due, amount_paid, payment_date, status)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(item.id.to_string())
            .bind(item.loan_id.to_string())
            .bind(item.due_date.to_string())
            .bind(item.amount_due.to_string())
            .bind(item.amount_paid.to_string())
            .bind(item.payment_date.map(|d| d.to_string()))
            .bind(item.status.as_str())
            .execute(&mut *self.tx)
            .await
            .map_err(unavailable("insert_installments"))?;
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), StorageError> {
        self.tx.commit().await.map_err(unavailable("commit"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
