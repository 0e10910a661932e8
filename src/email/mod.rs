pub mod templates;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::EmailConfig;
pub use templates::EmailTemplate;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email provider rejected message: {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Provider request body: `{from, to, subject, html, reply_to}`
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

/// Transactional email provider
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// Sender for a Resend-compatible `POST /emails` API
pub struct ResendMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let response = self
            .http
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&email)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected { status, message });
        }
        Ok(())
    }
}

/// Stands in when no provider key is configured: logs and drops
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        tracing::info!(
            "Email delivery disabled; dropping '{}' to {}",
            email.subject,
            email.to.join(", ")
        );
        Ok(())
    }
}

pub fn build_mailer(config: &EmailConfig) -> Arc<dyn Mailer> {
    match &config.api_key {
        Some(key) => Arc::new(ResendMailer::new(&config.api_url, key)),
        None => {
            tracing::warn!("RESEND_API_KEY not set; outgoing email will only be logged");
            Arc::new(LogMailer)
        }
    }
}

/// Render `template` and send it to `to`. Failures are logged, never
/// returned: a booking is not rolled back because a notification bounced.
pub async fn notify(mailer: &dyn Mailer, config: &EmailConfig, to: Vec<String>, template: &EmailTemplate) {
    if to.is_empty() {
        tracing::debug!("No recipients for '{}'", template.subject());
        return;
    }

    let email = OutgoingEmail {
        from: config.from.clone(),
        to,
        subject: template.subject(),
        html: template.render_html(),
        reply_to: config.reply_to.clone(),
    };
    let subject = email.subject.clone();

    match mailer.send(email).await {
        Ok(()) => tracing::info!("Sent email '{}'", subject),
        Err(e) => tracing::error!("Failed to send email '{}': {}", subject, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Outbox(Mutex<Vec<OutgoingEmail>>);

    #[async_trait]
    impl Mailer for Outbox {
        async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
            self.0.lock().unwrap().push(email);
            Ok(())
        }
    }

    fn config() -> EmailConfig {
        EmailConfig {
            api_url: "https://api.resend.com".to_string(),
            api_key: None,
            from: "Daycare <bookings@example.com>".to_string(),
            reply_to: Some("desk@example.com".to_string()),
        }
    }

    #[tokio::test]
    async fn notify_fills_envelope_from_config() {
        let outbox = Outbox::default();
        let template = EmailTemplate::Welcome {
            name: "Robin".to_string(),
            site_url: "https://app.example.com".to_string(),
        };
        notify(&outbox, &config(), vec!["robin@example.com".to_string()], &template).await;

        let sent = outbox.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, "Daycare <bookings@example.com>");
        assert_eq!(sent[0].reply_to.as_deref(), Some("desk@example.com"));
        assert_eq!(sent[0].subject, template.subject());
    }

    #[tokio::test]
    async fn notify_skips_empty_recipient_list() {
        let outbox = Outbox::default();
        let template = EmailTemplate::Welcome {
            name: "Robin".to_string(),
            site_url: "https://app.example.com".to_string(),
        };
        notify(&outbox, &config(), vec![], &template).await;
        assert!(outbox.0.lock().unwrap().is_empty());
    }

    #[test]
    fn provider_body_uses_snake_case_reply_to() {
        let body = serde_json::to_value(OutgoingEmail {
            from: "a@example.com".to_string(),
            to: vec!["b@example.com".to_string()],
            subject: "Hi".to_string(),
            html: "<p>Hi</p>".to_string(),
            reply_to: None,
        })
        .unwrap();
        assert!(body.get("reply_to").is_none());
        assert_eq!(body["to"][0], "b@example.com");
    }
}
