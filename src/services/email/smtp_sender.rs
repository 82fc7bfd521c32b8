use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::{EmailMessage, EmailSender};
use crate::config::EmailConfig;
use crate::error::{AppError, AppResult};

/// STARTTLS SMTP relay.
#[derive(Clone)]
pub struct SmtpEmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &EmailConfig) -> AppResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| AppError::Configuration {
                key: "email.smtp_host".to_string(),
                source: anyhow::Error::from(e),
            })?
            .port(config.smtp_port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        let from = format!("{} <{}>", config.from_name, config.from_address)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Configuration {
                key: "email.from_address".to_string(),
                source: anyhow::Error::from(e),
            })?;

        Ok(Self {
            mailer: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, message: &EmailMessage) -> AppResult<()> {
        let to = message
            .to
            .parse::<Mailbox>()
            .map_err(|_| AppError::bad_request(format!("Invalid email address: {}", message.to)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text_body()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html_body.clone()),
                    ),
            )
            .map_err(|e| AppError::Internal {
                source: anyhow::anyhow!("Failed to build email: {e}"),
            })?;

        self.mailer.send(email).await.map_err(|e| AppError::Internal {
            source: anyhow::anyhow!("SMTP delivery failed: {e}"),
        })?;

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            smtp_host: "smtp.example.com".to_string(),
            ..EmailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_builds_from_config() {
        let sender = SmtpEmailSender::new(&config()).unwrap();
        assert_eq!(sender.from.email.to_string(), "no-reply@ecommerce.local");
        assert_eq!(sender.name(), "smtp");
    }

    #[test]
    fn test_rejects_bad_from_address() {
        let config = EmailConfig {
            from_address: "not an address".to_string(),
            ..config()
        };
        assert!(matches!(
            SmtpEmailSender::new(&config),
            Err(AppError::Configuration { .. })
        ));
    }
}
