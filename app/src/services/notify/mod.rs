mod mnotify;
mod smtp;
pub mod templates;

pub use mnotify::MnotifySmsSender;
pub use smtp::SmtpEmailSender;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info};

use crate::config::config::Config;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Failed to send: {0}")]
    SendFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError>;
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SendError>;
}

/// Fans notifications out to the configured channels. Email always has a
/// sender; SMS is optional and skipped when no provider is configured.
/// Sends are best effort: failures are logged, never surfaced to callers.
#[derive(Clone)]
pub struct Notifier {
    email: Arc<dyn EmailSender>,
    sms: Option<Arc<dyn SmsSender>>,
}

impl Notifier {
    pub fn new(email: Arc<dyn EmailSender>, sms: Option<Arc<dyn SmsSender>>) -> Self {
        Self { email, sms }
    }

    pub fn from_config(config: &Config) -> Result<Self, SendError> {
        let email = SmtpEmailSender::new(
            config.smtp_host.clone(),
            config.smtp_port,
            config.smtp_username.clone(),
            config.smtp_password.clone(),
            config.smtp_use_tls,
            &config.email_from,
        )?;

        let sms: Option<Arc<dyn SmsSender>> = match &config.mnotify_api_key {
            Some(api_key) => Some(Arc::new(MnotifySmsSender::new(
                api_key.clone(),
                config.mnotify_sender.clone(),
            ))),
            None => {
                info!("MNOTIFY_API_KEY not set, SMS notifications are disabled");
                None
            }
        };

        Ok(Self::new(Arc::new(email), sms))
    }

    pub async fn send_email(&self, to: &str, subject: &str, body: &str) {
        if let Err(e) = self.email.send(to, subject, body).await {
            error!("Failed to send email to {}: {}", to, e);
        }
    }

    pub async fn send_sms(&self, phone: &str, message: &str) {
        let Some(sender) = &self.sms else {
            info!("SMS provider not configured, skipping SMS to {}", phone);
            return;
        };

        if let Err(e) = sender.send(phone, message).await {
            error!("Failed to send SMS to {}: {}", phone, e);
        }
    }
}
