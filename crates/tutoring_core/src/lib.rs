//! Core domain logic for tutoring appointments.
//! This crate is the single source of truth for booking, role and rating
//! invariants.

pub mod config;
pub mod db;
pub mod error;
pub mod link;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError};
pub use error::ErrorKind;
pub use link::feedback_link::{FeedbackLinkSigner, LinkError, VerifiedLink};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{Account, AccountId, NewAccount, RegisteredAccount, Role, RoleProfile};
pub use model::session::{BookingDetails, Session, SessionId, Shift};
pub use model::tutor::{ClassId, SubjectClass, Tutor, TutorFilter, TutorId};
pub use repo::{RepoError, RepoResult};
pub use service::account_service::{AccountError, AccountService};
pub use service::booking_service::{BookingError, BookingService};
pub use service::feedback_service::{FeedbackError, FeedbackService};
pub use service::rating_service::{RatingError, RatingService};
pub use service::schedule_service::{ScheduleError, ScheduleService};
pub use service::tutor_service::{DirectoryError, TutorService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
