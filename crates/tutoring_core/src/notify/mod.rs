//! Outbound notification collaborators.
//!
//! # Responsibility
//! - Define the template-rendering and mail-dispatch seams the core needs.
//! - Compose them into the booking confirmation notifier.
//!
//! # Invariants
//! - Notification runs after the booking commits; its failure is reported
//!   to the caller for logging and never undoes the booking.
//! - Log lines carry metadata only (template name, recipient count), never
//!   addresses, bodies or link tokens.

mod booking;
mod mail;
mod template;

pub use booking::{BookingNotifier, MailBookingNotifier, BOOKING_CONFIRMATION_TEMPLATE};
pub use mail::{LogMailDispatcher, MailDispatcher, MailMessage};
pub use template::{HandlebarsRenderer, TemplateRenderer};

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure inside a notification collaborator.
#[derive(Debug)]
pub enum NotifyError {
    /// Template registration or rendering failed.
    Template(String),
    /// The mail backend refused or failed the message.
    Dispatch(String),
    /// Message has no recipients.
    NoRecipients,
}

impl Display for NotifyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(message) => write!(f, "template error: {message}"),
            Self::Dispatch(message) => write!(f, "mail dispatch failed: {message}"),
            Self::NoRecipients => write!(f, "mail message has no recipients"),
        }
    }
}

impl Error for NotifyError {}
