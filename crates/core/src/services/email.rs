//! Outgoing email.
//!
//! Services depend on the [`Mailer`] trait. [`EmailService`] is the
//! production implementation and picks a provider from configuration.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use owr_common::config::{EmailProviderKind, EmailSettings};
use owr_common::{AppError, AppResult};
use std::sync::Arc;
use tokio::task::JoinHandle;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub text_body: String,
    /// HTML body.
    pub html_body: Option<String>,
}

/// Something that can deliver an [`EmailMessage`].
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: EmailMessage) -> AppResult<()>;
}

/// Email service backed by the configured provider.
#[derive(Clone)]
pub struct EmailService {
    settings: EmailSettings,
    http_client: reqwest::Client,
    smtp: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl EmailService {
    /// Create an email service. SMTP settings are checked here so a bad relay
    /// host fails at startup rather than on the first message.
    pub fn new(settings: &EmailSettings) -> AppResult<Self> {
        let smtp = match settings.provider {
            EmailProviderKind::Smtp => Some(build_smtp_transport(settings)?),
            EmailProviderKind::Resend if settings.api_key.is_none() => {
                return Err(AppError::Config(
                    "email.api_key is required for the resend provider".to_string(),
                ));
            }
            _ => None,
        };

        Ok(Self {
            settings: settings.clone(),
            http_client: reqwest::Client::new(),
            smtp,
        })
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.settings.from_name, self.settings.from_address)
    }

    async fn send_resend(&self, message: EmailMessage) -> AppResult<()> {
        let api_key = self.settings.api_key.as_deref().unwrap_or_default();
        let body = serde_json::json!({
            "from": self.from_header(),
            "to": [message.to],
            "subject": message.subject,
            "text": message.text_body,
            "html": message.html_body,
        });

        let response = self
            .http_client
            .post(RESEND_ENDPOINT)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Resend request failed: {e}")))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        Err(AppError::ExternalService(format!(
            "Resend returned {status}: {error_text}"
        )))
    }

    async fn send_smtp(&self, message: EmailMessage) -> AppResult<()> {
        let transport = self
            .smtp
            .as_ref()
            .ok_or_else(|| AppError::Config("SMTP transport not configured".to_string()))?;

        let from: Mailbox = self
            .from_header()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid sender address: {e}")))?;
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::BadRequest(format!("Invalid recipient address: {e}")))?;

        let builder = Message::builder().from(from).to(to).subject(message.subject);
        let email = match message.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text_body,
                html,
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(message.text_body),
        }
        .map_err(|e| AppError::Internal(format!("Failed to build email: {e}")))?;

        transport
            .send(email)
            .await
            .map_err(|e| AppError::ExternalService(format!("SMTP delivery failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl Mailer for EmailService {
    async fn send(&self, message: EmailMessage) -> AppResult<()> {
        match self.settings.provider {
            EmailProviderKind::Log => {
                tracing::info!(
                    to = %message.to,
                    subject = %message.subject,
                    body = %message.text_body,
                    "Email (log provider)"
                );
                Ok(())
            }
            EmailProviderKind::Resend => self.send_resend(message).await,
            EmailProviderKind::Smtp => self.send_smtp(message).await,
        }
    }
}

fn build_smtp_transport(settings: &EmailSettings) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
    let host = settings
        .smtp_host
        .as_deref()
        .ok_or_else(|| AppError::Config("email.smtp_host is required for SMTP".to_string()))?;

    let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
        .map_err(|e| AppError::Config(format!("Invalid SMTP relay: {e}")))?
        .port(settings.smtp_port);

    if let (Some(username), Some(password)) = (&settings.smtp_username, &settings.smtp_password) {
        builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
    }

    Ok(builder.build())
}

/// Send a message on a detached task. Failures are logged and never reach
/// the caller.
pub fn send_detached(mailer: Arc<dyn Mailer>, message: EmailMessage) -> JoinHandle<()> {
    tokio::spawn(async move {
        let to = message.to.clone();
        let subject = message.subject.clone();
        match mailer.send(message).await {
            Ok(()) => tracing::debug!(to = %to, subject = %subject, "Email sent"),
            Err(e) => {
                tracing::warn!(to = %to, subject = %subject, error = %e, "Email delivery failed");
            }
        }
    })
}

/// "Appointment Confirmed" message.
#[must_use]
pub fn appointment_confirmed(to: &str, name: &str, date: DateTime<Utc>) -> EmailMessage {
    let formatted = format_date(date);
    let name_html = escape_html(name);

    EmailMessage {
        to: to.to_string(),
        subject: "Appointment Confirmed".to_string(),
        text_body: format!(
            "Hello {name}!\n\nYour appointment has been confirmed for:\n{formatted}\n\n\
             We look forward to seeing you.\n\nBest regards,\nThe OWR Team\n"
        ),
        html_body: Some(format!(
            "<h1>Hello {name_html}!</h1>\
             <p>Your appointment has been confirmed for:</p>\
             <p><strong>{formatted}</strong></p>\
             <p>We look forward to seeing you.</p>\
             <p>Best regards,<br>The OWR Team</p>"
        )),
    }
}

/// "Your Certificate is Ready!" message with a download link.
#[must_use]
pub fn certificate_ready(
    to: &str,
    full_name: Option<&str>,
    download_url: &str,
    expires_at: DateTime<Utc>,
) -> EmailMessage {
    let name = full_name.filter(|n| !n.trim().is_empty()).unwrap_or("User");
    let expires = format_date(expires_at);

    EmailMessage {
        to: to.to_string(),
        subject: "Your Certificate is Ready!".to_string(),
        text_body: format!(
            "Dear {name},\n\nYour certificate is now available!\n\
             Download it here: {download_url}\n\nThis link works until {expires}.\n"
        ),
        html_body: Some(format!(
            "<p>Dear {},</p>\
             <p>Your certificate is now available!</p>\
             <p><a href=\"{}\">Download Certificate</a></p>\
             <p>This link works until {expires}.</p>",
            escape_html(name),
            escape_html(download_url),
        )),
    }
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%B %-d, %Y at %H:%M UTC").to_string()
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_appointment_template() {
        let date = Utc.with_ymd_and_hms(2025, 3, 7, 14, 30, 0).unwrap();
        let message = appointment_confirmed("ada@example.com", "Ada <3", date);

        assert_eq!(message.subject, "Appointment Confirmed");
        let html = message.html_body.unwrap();
        assert!(html.contains("<h1>Hello Ada &lt;3!</h1>"));
        assert!(html.contains("March 7, 2025 at 14:30 UTC"));
        assert!(message.text_body.contains("Hello Ada <3!"));
    }

    #[test]
    fn test_certificate_template_defaults_name() {
        let message = certificate_ready(
            "u@example.com",
            None,
            "https://owr.example/api/files/certificates/a.pdf?expires=1&signature=ab",
            Utc::now(),
        );

        assert_eq!(message.subject, "Your Certificate is Ready!");
        let html = message.html_body.unwrap();
        assert!(html.contains("Dear User"));
        assert!(html.contains("expires=1&amp;signature=ab"));
    }

    #[test]
    fn test_resend_requires_api_key() {
        let settings = EmailSettings {
            provider: EmailProviderKind::Resend,
            ..EmailSettings::default()
        };
        assert!(matches!(
            EmailService::new(&settings),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_smtp_requires_host() {
        let settings = EmailSettings {
            provider: EmailProviderKind::Smtp,
            ..EmailSettings::default()
        };
        assert!(matches!(
            EmailService::new(&settings),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_log_provider_always_succeeds() {
        let service = EmailService::new(&EmailSettings::default()).unwrap();
        let message = appointment_confirmed("a@example.com", "A", Utc::now());
        assert!(service.send(message).await.is_ok());
    }
}
