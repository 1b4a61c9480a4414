use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use super::{EmailSender, SendError};

pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(
        host: String,
        port: u16,
        username: Option<String>,
        password: Option<String>,
        use_tls: bool,
        from: &str,
    ) -> Result<Self, SendError> {
        let from = from
            .parse()
            .map_err(|e| SendError::InvalidConfig(format!("Invalid from address: {}", e)))?;

        let mut builder = if use_tls {
            let tls_params = TlsParameters::new(host.clone())
                .map_err(|e| SendError::InvalidConfig(format!("TLS configuration error: {}", e)))?;

            // Port 465 uses implicit TLS (SMTPS), other ports use STARTTLS
            if port == 465 {
                AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
                    .map_err(|e| SendError::InvalidConfig(format!("SMTP relay error: {}", e)))?
                    .port(port)
                    .tls(Tls::Wrapper(tls_params))
            } else {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
                    .map_err(|e| SendError::InvalidConfig(format!("SMTP relay error: {}", e)))?
                    .port(port)
                    .tls(Tls::Required(tls_params))
            }
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&host).port(port)
        };

        if let (Some(user), Some(pass)) = (username, password) {
            builder = builder.credentials(Credentials::new(user, pass));
        }

        let transport = builder.build();

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), SendError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(to
                .parse()
                .map_err(|e| SendError::SendFailed(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| SendError::SendFailed(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| SendError::SendFailed(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_creation_no_tls() {
        let sender = SmtpEmailSender::new(
            "localhost".to_string(),
            25,
            None,
            None,
            false,
            "FlowBoard <noreply@flowboard.local>",
        );
        assert!(sender.is_ok());
    }

    #[test]
    fn test_sender_creation_with_credentials() {
        let sender = SmtpEmailSender::new(
            "localhost".to_string(),
            587,
            Some("user".to_string()),
            Some("pass".to_string()),
            false,
            "noreply@flowboard.local",
        );
        assert!(sender.is_ok());
    }

    #[test]
    fn test_sender_rejects_bad_from_address() {
        let sender = SmtpEmailSender::new(
            "localhost".to_string(),
            25,
            None,
            None,
            false,
            "not an address",
        );
        assert!(sender.is_err());
    }
}
