//! Domain model for the project/task/todo hierarchy.
//!
//! # Responsibility
//! - Define the wire shapes exchanged with the remote API.
//! - Define form drafts/patches and their client-side validation rules.
//! - Model loosely-typed parent references as one tagged union.
//!
//! # Invariants
//! - Every entity identity is a server-assigned string; the client never
//!   synthesizes one.
//! - Denormalized aggregate fields are server projections; see
//!   `crate::derive::aggregate` for the recomputation rules.

pub mod common;
pub mod project;
pub mod reference;
pub mod stats;
pub mod task;
pub mod todo;
pub mod user;
