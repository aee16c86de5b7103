//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Translate repository errors into per-use-case errors that each map to
//!   one stable `ErrorKind`.
//! - Emit metadata-only logging for every state-changing operation.

pub mod account_service;
pub mod booking_service;
pub mod feedback_service;
pub mod rating_service;
pub mod schedule_service;
pub mod tutor_service;
