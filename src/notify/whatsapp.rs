use async_trait::async_trait;
use serde_json::json;

use super::{summary_text, Notifier, NotifyError};
use crate::config::NotifyConfig;
use crate::schema::SubmissionRecord;

const GRAPH_API_BASE: &str = "https://graph.facebook.com/v20.0";

/// WhatsApp text message through the Cloud API.
pub struct WhatsAppNotifier {
    client: reqwest::Client,
    token: String,
    phone_number_id: String,
    recipient: String,
}

impl WhatsAppNotifier {
    pub fn new(client: reqwest::Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            token: config.whatsapp_token.clone(),
            phone_number_id: config.whatsapp_phone_number_id.clone(),
            recipient: config.whatsapp_recipient.clone(),
        }
    }
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    fn name(&self) -> &'static str {
        "whatsapp"
    }

    fn is_enabled(&self) -> bool {
        !self.token.is_empty() && !self.phone_number_id.is_empty() && !self.recipient.is_empty()
    }

    async fn send(&self, submission: &SubmissionRecord) -> Result<String, NotifyError> {
        let url = format!("{}/{}/messages", GRAPH_API_BASE, self.phone_number_id);
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": self.recipient,
            "type": "text",
            "text": { "body": summary_text(submission) },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
        Ok(format!("delivered to {}", self.recipient))
    }
}
