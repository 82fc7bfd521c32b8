//! Outgoing email: the sender abstraction, its SMTP and logging
//! implementations, and the HTML templates.

mod log_sender;
mod sender;
mod smtp_sender;
pub mod templates;

pub use log_sender::LogEmailSender;
pub use sender::{EmailMessage, EmailSender};
pub use smtp_sender::SmtpEmailSender;

use std::sync::Arc;

use crate::config::EmailConfig;
use crate::error::AppResult;

/// SMTP when email is enabled, otherwise a sender that only logs.
pub fn build_email_sender(config: &EmailConfig) -> AppResult<Arc<dyn EmailSender>> {
    if config.enabled {
        Ok(Arc::new(SmtpEmailSender::new(config)?))
    } else {
        tracing::warn!("Email delivery disabled, outgoing mail will only be logged");
        Ok(Arc::new(LogEmailSender::new(config.from_address.clone())))
    }
}
