//! Outgoing mail service.
//!
//! Invitation delivery is triggered, never awaited, by the invite flow;
//! callers spawn sends and log failures.

use hearth_common::{AppError, AppResult, Config};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};

/// Mail service for outgoing notifications.
#[derive(Clone)]
pub struct MailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
    server_url: String,
}

impl MailService {
    /// Create a new mail service from configuration.
    ///
    /// When mail is disabled, messages are logged instead of delivered.
    pub fn new(config: &Config) -> AppResult<Self> {
        let from = format!("{} <{}>", config.mail.from_name, config.mail.from_address)
            .parse::<Mailbox>()
            .map_err(|e| AppError::Config(format!("Invalid from address: {e}")))?;

        let transport = if config.mail.enabled {
            let mut builder =
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.mail.smtp_host)
                    .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
                    .port(config.mail.smtp_port);

            if let (Some(username), Some(password)) =
                (&config.mail.username, &config.mail.password)
            {
                builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            }

            Some(builder.build())
        } else {
            None
        };

        Ok(Self {
            transport,
            from,
            server_url: config.server.url.clone(),
        })
    }

    /// Send an invitation email.
    pub async fn send_invitation(
        &self,
        to: &str,
        inviter_name: &str,
        token: &str,
    ) -> AppResult<()> {
        let subject = format!("{inviter_name} invited you to join Hearth");
        let body = format!(
            "Hi!\n\n\
            {inviter_name} has invited you to join their community on Hearth.\n\n\
            Accept the invitation here: {}/invitations/{token}\n\n\
            If you weren't expecting this, you can ignore this email.",
            self.server_url
        );

        let Some(transport) = &self.transport else {
            tracing::info!(to = %to, "Mail disabled; skipping invitation delivery");
            return Ok(());
        };

        let to = to
            .parse::<Mailbox>()
            .map_err(|e| AppError::Validation(format!("Invalid email address: {e}")))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Mail(format!("Failed to build message: {e}")))?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::Mail(format!("Failed to send message: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use hearth_common::config::{DatabaseConfig, MailConfig, ServerConfig, StorageConfig};

    fn test_config(mail_enabled: bool) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                url: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/hearth".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            mail: MailConfig {
                enabled: mail_enabled,
                ..MailConfig::default()
            },
            storage: StorageConfig::default(),
        }
    }

    #[tokio::test]
    async fn test_disabled_mail_is_a_noop() {
        let service = MailService::new(&test_config(false)).unwrap();

        let result = service
            .send_invitation("friend@example.com", "Alice", "tok123")
            .await;

        assert!(result.is_ok());
    }

    #[test]
    fn test_bad_from_address_is_a_config_error() {
        let mut config = test_config(false);
        config.mail.from_address = "not an address".to_string();

        let result = MailService::new(&config);

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
