//! Signed capability links.
//!
//! # Responsibility
//! - Issue and verify tamper-evident, time-limited feedback links.
//!
//! # Invariants
//! - Verification is pure: no storage access and no server-side state.
//!   Tutor resolution happens in `service::feedback_service`.

pub mod feedback_link;
