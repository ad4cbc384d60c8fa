//! Client use-case services.
//!
//! # Responsibility
//! - Orchestrate gateway calls, cache bookkeeping and session state into
//!   intent-level APIs.
//! - Keep presentation layers decoupled from transport details.

pub mod notice;
pub mod views;
pub mod workspace;
