use super::{MailDispatcher, MailMessage, NotifyError, TemplateRenderer};
use crate::link::feedback_link::FeedbackLinkSigner;
use crate::model::session::BookingDetails;
use chrono::{DateTime, Utc};
use log::info;
use serde_json::json;

pub const BOOKING_CONFIRMATION_TEMPLATE: &str = "booking_confirmation";
const BOOKING_CONFIRMATION_SUBJECT: &str = "Your Appointment";

pub(super) const BOOKING_CONFIRMATION_BODY: &str = "Hi {{student_name}},

Your tutoring session with {{tutor_name}}{{#if class_label}} for {{class_label}}{{/if}} is booked.

When: {{starts_at}} to {{ends_at}}

After the session, let us know how it went:
{{feedback_url}}

This link is valid for {{link_valid_hours}} hours.
";

/// Receives confirmed bookings.
pub trait BookingNotifier {
    fn booking_confirmed(&self, details: &BookingDetails) -> Result<(), NotifyError>;
}

impl<N: BookingNotifier + ?Sized> BookingNotifier for &N {
    fn booking_confirmed(&self, details: &BookingDetails) -> Result<(), NotifyError> {
        (**self).booking_confirmed(details)
    }
}

/// Emails the student a confirmation carrying a signed feedback link for
/// the session's tutor.
pub struct MailBookingNotifier<T: TemplateRenderer, M: MailDispatcher> {
    renderer: T,
    mailer: M,
    signer: FeedbackLinkSigner,
    from_address: String,
    site_base_url: String,
    link_max_age_secs: u64,
}

impl<T: TemplateRenderer, M: MailDispatcher> MailBookingNotifier<T, M> {
    pub fn new(
        renderer: T,
        mailer: M,
        signer: FeedbackLinkSigner,
        from_address: impl Into<String>,
        site_base_url: impl Into<String>,
        link_max_age_secs: u64,
    ) -> Self {
        Self {
            renderer,
            mailer,
            signer,
            from_address: from_address.into(),
            site_base_url: site_base_url.into(),
            link_max_age_secs,
        }
    }

    /// Public URL of the feedback form for one signed token.
    pub fn feedback_url(&self, token: &str) -> String {
        format!(
            "{}/feedback/{token}",
            self.site_base_url.trim_end_matches('/')
        )
    }
}

impl<T: TemplateRenderer, M: MailDispatcher> BookingNotifier for MailBookingNotifier<T, M> {
    fn booking_confirmed(&self, details: &BookingDetails) -> Result<(), NotifyError> {
        let token = self.signer.issue(details.tutor_id);
        let context = json!({
            "student_name": details.student_name,
            "tutor_name": details.tutor_name,
            "class_label": details.class_label,
            "starts_at": format_epoch_ms(details.session.start_at),
            "ends_at": format_epoch_ms(details.session.end_at),
            "feedback_url": self.feedback_url(&token),
            "link_valid_hours": self.link_max_age_secs / 3600,
        });
        let body = self
            .renderer
            .render(BOOKING_CONFIRMATION_TEMPLATE, &context)?;

        let message = MailMessage {
            subject: BOOKING_CONFIRMATION_SUBJECT.to_string(),
            body,
            from: self.from_address.clone(),
            to: vec![details.student_email.clone()],
        };
        self.mailer.send(&message)?;

        info!(
            "event=booking_notify module=notify status=ok session_id={} tutor_id={}",
            details.session.id, details.tutor_id
        );
        Ok(())
    }
}

fn format_epoch_ms(epoch_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(epoch_ms)
        .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| epoch_ms.to_string())
}
