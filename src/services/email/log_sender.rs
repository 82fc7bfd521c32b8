use async_trait::async_trait;

use super::{EmailMessage, EmailSender};
use crate::error::AppResult;

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone)]
pub struct LogEmailSender {
    from_address: String,
}

impl LogEmailSender {
    pub fn new(from_address: impl Into<String>) -> Self {
        Self {
            from_address: from_address.into(),
        }
    }
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        tracing::info!(
            from = %self.from_address,
            to = %message.to,
            subject = %message.subject,
            body = %message.text_body(),
            "Email not delivered (email disabled)"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sender_always_succeeds() {
        let sender = LogEmailSender::new("no-reply@test.com");
        let message = EmailMessage::new("bob@test.com", "Subject", "<p>Body</p>");
        assert!(sender.send(&message).await.is_ok());
        assert_eq!(sender.name(), "log");
    }
}
