use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use super::{SendError, SmsSender};

const MNOTIFY_QUICK_SMS_URL: &str = "https://api.mnotify.com/api/sms/quick";

/// SMS delivery through the mNotify bulk messaging API.
pub struct MnotifySmsSender {
    http_client: Client,
    api_key: String,
    sender_id: String,
}

#[derive(Serialize)]
struct QuickSmsRequest<'a> {
    recipient: Vec<&'a str>,
    sender: &'a str,
    message: &'a str,
    is_schedule: bool,
    schedule_date: &'a str,
}

impl MnotifySmsSender {
    pub fn new(api_key: String, sender_id: String) -> Self {
        Self {
            http_client: Client::new(),
            api_key,
            sender_id,
        }
    }
}

#[async_trait]
impl SmsSender for MnotifySmsSender {
    async fn send(&self, phone: &str, message: &str) -> Result<(), SendError> {
        let url = format!(
            "{}?key={}",
            MNOTIFY_QUICK_SMS_URL,
            urlencoding::encode(&self.api_key)
        );

        let payload = QuickSmsRequest {
            recipient: vec![phone],
            sender: &self.sender_id,
            message,
            is_schedule: false,
            schedule_date: "",
        };

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SendError::SendFailed(e.to_string()))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(SendError::SendFailed(format!(
                "mNotify returned {}: {}",
                status, body
            )));
        }

        debug!("mNotify response for {}: {}", phone, body);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quick_sms_payload_shape() {
        let payload = QuickSmsRequest {
            recipient: vec!["0241234567"],
            sender: "FlowBoard",
            message: "hello",
            is_schedule: false,
            schedule_date: "",
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "recipient": ["0241234567"],
                "sender": "FlowBoard",
                "message": "hello",
                "is_schedule": false,
                "schedule_date": ""
            })
        );
    }
}
