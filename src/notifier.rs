//! Email notification over SMTP.

use crate::config::{Settings, SmtpSettings, TlsMode};
use crate::error::Result;
use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Subject line of every change notification.
pub const SUBJECT: &str = "new dynamic IP detected";

/// Delivers an address-change notification.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Tell the recipient about the new address.
    async fn notify(&self, address: &str) -> Result<()>;
}

/// Build the notification message. Sender and recipient are both `settings.email`.
pub fn build_message(address: &str, settings: &Settings) -> Result<Message> {
    let mailbox: Mailbox = settings.email.parse()?;

    let message = Message::builder()
        .from(mailbox.clone())
        .to(mailbox)
        .subject(SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(format!("IP: {}\r\n", address))?;
    Ok(message)
}

/// Sends notifications through an authenticated SMTP session.
pub struct SmtpNotifier {
    settings: Settings,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(settings: Settings) -> Result<Self> {
        let transport = build_transport(&settings.smtp)?;
        Ok(Self {
            settings,
            transport,
        })
    }
}

fn build_transport(smtp: &SmtpSettings) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
    let builder = match smtp.tls {
        TlsMode::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.server)?,
        TlsMode::Wrapper => AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.server)?,
        TlsMode::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.server),
    };

    Ok(builder
        .port(smtp.port)
        .credentials(Credentials::new(
            smtp.username.clone(),
            smtp.password.clone(),
        ))
        .authentication(vec![Mechanism::Plain])
        .build())
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, address: &str) -> Result<()> {
        let message = build_message(address, &self.settings)?;
        tracing::debug!(
            "Sending notification to {} via {}:{}",
            self.settings.email,
            self.settings.smtp.server,
            self.settings.smtp.port
        );
        self.transport.send(message).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_IP_SERVICE;
    use std::path::PathBuf;

    fn settings(tls: TlsMode) -> Settings {
        Settings {
            cache_file: PathBuf::from("/tmp/ip.cache"),
            email: "me@example.com".to_string(),
            smtp: SmtpSettings {
                server: "smtp.example.com".to_string(),
                port: 587,
                username: "me".to_string(),
                password: "secret".to_string(),
                tls,
            },
            ip_service: DEFAULT_IP_SERVICE.to_string(),
        }
    }

    #[test]
    fn test_message_headers_and_body() {
        let message = build_message("5.6.7.8", &settings(TlsMode::Starttls)).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("Subject: new dynamic IP detected"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("From: me@example.com"));
        assert!(raw.contains("IP: 5.6.7.8"));
    }

    #[test]
    fn test_single_recipient() {
        let message = build_message("5.6.7.8", &settings(TlsMode::Starttls)).unwrap();
        let to: Vec<String> = message
            .envelope()
            .to()
            .iter()
            .map(|a| a.to_string())
            .collect();

        assert_eq!(to, vec!["me@example.com".to_string()]);
        assert_eq!(
            message.envelope().from().map(|a| a.to_string()),
            Some("me@example.com".to_string())
        );
    }

    #[test]
    fn test_invalid_email_is_mail_error() {
        let mut s = settings(TlsMode::Starttls);
        s.email = "not an address".to_string();

        let err = build_message("5.6.7.8", &s).unwrap_err();
        assert!(matches!(err, crate::error::MailerError::Mail(_)));
    }

    #[tokio::test]
    async fn test_transport_for_each_tls_mode() {
        for tls in [TlsMode::Starttls, TlsMode::Wrapper, TlsMode::None] {
            assert!(SmtpNotifier::new(settings(tls)).is_ok());
        }
    }

    #[tokio::test]
    async fn test_unreachable_server_is_error() {
        let mut s = settings(TlsMode::None);
        s.smtp.server = "127.0.0.1".to_string();
        s.smtp.port = 1;

        let notifier = SmtpNotifier::new(s).unwrap();
        assert!(notifier.notify("5.6.7.8").await.is_err());
    }
}
