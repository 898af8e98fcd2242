// Rust guideline compliant 2026-10-18

//! Adapters (secondary ports) for the `loan_approval` binary.
//!
//! Each sub-module implements one or more port traits defined in the `domain`
//! crate. The SQLite adapter is loaded by `loan_approval_sqlite` only.

pub mod in_memory_store;
pub mod precomputed_scorer;
