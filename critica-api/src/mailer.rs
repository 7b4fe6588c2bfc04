/// Outbound email collaborator
///
/// Registration hands the confirmation code to a [`Mailer`] and treats any
/// delivery failure as a hard error (the caller rolls the new account back).
/// Two implementations exist: [`SmtpMailer`] for real delivery over lettre's
/// async SMTP transport, and [`LogMailer`] which writes the code to the log
/// for development and tests.
use crate::config::SmtpConfig;
use async_trait::async_trait;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

/// Error type for mail delivery
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Recipient or sender address failed to parse
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Message could not be assembled
    #[error("Failed to build message: {0}")]
    Build(String),

    /// Transport-level delivery failure
    #[error("Failed to send message: {0}")]
    Send(String),
}

/// Sends account confirmation codes
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a confirmation code to the given address
    async fn send_confirmation(&self, to: &str, code: &str) -> Result<(), EmailError>;
}

/// Mailer backed by an async SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Builds the transport from SMTP configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the relay host or from address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| EmailError::Build(format!("Invalid SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| EmailError::InvalidAddress(format!("{}: {}", config.from, e)))?;

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_confirmation(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let recipient = to
            .parse::<Mailbox>()
            .map_err(|e| EmailError::InvalidAddress(format!("{}: {}", to, e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject("Your Critica confirmation code")
            .body(format!(
                "Welcome to Critica!\n\n\
                 Your confirmation code is:\n\n    {}\n\n\
                 Activate your account by posting it together with your email \
                 to /v1/auth/activate. The code expires in 3 days.\n",
                code
            ))
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| EmailError::Send(e.to_string()))?;

        tracing::info!(to = %to, "Confirmation code delivered");
        Ok(())
    }
}

/// Mailer that logs codes instead of sending them
///
/// Selected when no SMTP host is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_confirmation(&self, to: &str, code: &str) -> Result<(), EmailError> {
        tracing::info!(to = %to, code = %code, "SMTP not configured; confirmation code logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = LogMailer;
        assert!(mailer
            .send_confirmation("reader@example.com", "1a2b-code")
            .await
            .is_ok());
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_from_address() {
        let config = SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "mailer".to_string(),
            password: "secret".to_string(),
            from: "not an address".to_string(),
        };

        assert!(matches!(
            SmtpMailer::new(&config),
            Err(EmailError::InvalidAddress(_))
        ));
    }
}
