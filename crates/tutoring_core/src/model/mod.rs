//! Domain model for accounts, tutors, sessions and feedback.
//!
//! # Responsibility
//! - Define the records core business logic passes around.
//! - Own input validation that does not need storage access.
//!
//! # Invariants
//! - Every persisted record is identified by its SQLite row id.
//! - An account carries exactly one `Role`; profile rows follow it.

pub mod account;
pub mod feedback;
pub mod session;
pub mod tutor;
