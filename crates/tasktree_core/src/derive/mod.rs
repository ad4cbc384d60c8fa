//! Derived state computed from loaded entity collections.
//!
//! # Responsibility
//! - Resolve parent references into display descriptors.
//! - Filter and search collections with composable predicates.
//! - Compute metrics that are never persisted (days left, overdue,
//!   progress) and re-derive persisted aggregates.
//!
//! # Invariants
//! - Every function here is pure over entity snapshots and never fails.
//! - Date comparisons use UTC calendar-day granularity; an item due today
//!   is not overdue.

pub mod aggregate;
pub mod filter;
pub mod metrics;
pub mod resolve;
pub mod stats;
