//! New-submission notifications.
//!
//! Channels share one capability-style trait: a channel knows whether it is
//! configured and how to send. Dispatch is strictly best-effort; a channel
//! failure is logged and never fails the request that triggered it.

mod email;
mod sms;
mod whatsapp;

pub use email::EmailNotifier;
pub use sms::SmsNotifier;
pub use whatsapp::WhatsAppNotifier;

use async_trait::async_trait;

use crate::schema::SubmissionRecord;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("channel returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Request(err.to_string())
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    /// A channel is enabled when all of its required settings are present.
    fn is_enabled(&self) -> bool;

    async fn send(&self, submission: &SubmissionRecord) -> Result<String, NotifyError>;
}

/// Human-readable summary used as the message body on every channel.
pub(crate) fn summary_text(submission: &SubmissionRecord) -> String {
    let mut text = format!(
        "New recruiter submission: {} at {}",
        submission.job.title, submission.job.company
    );
    if !submission.recruiter.name.is_empty() {
        text.push_str(&format!(" (from {}", submission.recruiter.name));
        if !submission.recruiter.agency.is_empty() {
            text.push_str(&format!(", {}", submission.recruiter.agency));
        }
        text.push(')');
    }
    text.push_str(&format!(" [{}]", submission.id));
    text
}

/// Fan a submission out to every enabled channel, sequentially. Returns a
/// per-channel status summary for the response body.
pub async fn dispatch(notifiers: &[Box<dyn Notifier>], submission: &SubmissionRecord) -> Vec<String> {
    let mut statuses = Vec::new();
    for notifier in notifiers {
        if !notifier.is_enabled() {
            continue;
        }
        match notifier.send(submission).await {
            Ok(detail) => {
                tracing::info!(channel = notifier.name(), "notification sent: {}", detail);
                statuses.push(format!("{}: sent", notifier.name()));
            }
            Err(e) => {
                tracing::warn!(channel = notifier.name(), "notification failed: {}", e);
                statuses.push(format!("{}: failed", notifier.name()));
            }
        }
    }
    statuses
}
