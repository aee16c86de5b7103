use super::NotifyError;
use log::info;

/// One outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Delivers mail messages.
pub trait MailDispatcher {
    fn send(&self, message: &MailMessage) -> Result<(), NotifyError>;
}

impl<M: MailDispatcher + ?Sized> MailDispatcher for &M {
    fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        (**self).send(message)
    }
}

/// Development dispatcher: records that a message would have been sent.
///
/// Only metadata is logged; the body and addresses stay out of log files.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailDispatcher;

impl MailDispatcher for LogMailDispatcher {
    fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        if message.to.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        info!(
            "event=mail_send module=notify status=ok backend=log recipients={} body_chars={}",
            message.to.len(),
            message.body.chars().count()
        );
        Ok(())
    }
}
