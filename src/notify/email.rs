use async_trait::async_trait;
use serde_json::json;

use super::{summary_text, Notifier, NotifyError};
use crate::config::NotifyConfig;
use crate::schema::SubmissionRecord;

/// Email via an HTTP sending service (Resend-style JSON API).
pub struct EmailNotifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender: String,
    recipient: String,
}

impl EmailNotifier {
    pub fn new(client: reqwest::Client, config: &NotifyConfig) -> Self {
        Self {
            client,
            endpoint: config.email_endpoint.clone(),
            api_key: config.email_api_key.clone(),
            sender: config.email_sender.clone(),
            recipient: config.email_recipient.clone(),
        }
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    fn is_enabled(&self) -> bool {
        !self.endpoint.is_empty()
            && !self.api_key.is_empty()
            && !self.sender.is_empty()
            && !self.recipient.is_empty()
    }

    async fn send(&self, submission: &SubmissionRecord) -> Result<String, NotifyError> {
        let payload = json!({
            "from": self.sender,
            "to": [self.recipient],
            "subject": format!(
                "New submission: {} at {}",
                submission.job.title, submission.job.company
            ),
            "text": summary_text(submission),
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
        Ok(format!("delivered to {}", self.recipient))
    }
}
