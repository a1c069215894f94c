use async_trait::async_trait;
use serde_json::json;

use super::{summary_text, Notifier, NotifyError};
use crate::config::NotifyConfig;
use crate::schema::SubmissionRecord;

/// SMS through an HTTP gateway.
pub struct SmsNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    origination_number: String,
    recipient_number: String,
}

impl SmsNotifier {
    pub fn new(client: reqwest::Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            endpoint: config.sms_endpoint.clone(),
            api_key: config.sms_api_key.clone(),
            origination_number: config.sms_origination_number.clone(),
            recipient_number: config.sms_recipient_number.clone(),
        }
    }
}

#[async_trait]
impl Notifier for SmsNotifier {
    fn name(&self) -> &'static str {
        "sms"
    }

    fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
            && !self.api_key.is_empty()
            && !self.origination_number.is_empty()
            && !self.recipient_number.is_empty()
    }

    async fn send(&self, submission: &SubmissionRecord) -> Result<String, NotifyError> {
        // SMS bodies are short; keep to a single segment where possible
        let body: String = summary_text(submission).chars().take(160).collect();

        let payload = json!({
            "from": self.origination_number,
            "to": self.recipient_number,
            "message": body,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
        Ok(format!("delivered to {}", self.recipient_number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enabled_only_when_fully_configured() {
        let client = reqwest::Client::new();
        let mut config = NotifyConfig::default();
        assert!(!SmsNotifier::new(client.clone(), &config).is_enabled());

        config.sms_endpoint = "https://sms.example/send".to_string();
        config.sms_api_key = "key".to_string();
        config.sms_origination_number = "+60123".to_string();
        config.sms_recipient_number = "+60456".to_string();
        assert!(SmsNotifier::new(client, &config).is_enabled());
    }
}
