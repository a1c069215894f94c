use std::sync::Arc;
use std::time::Duration;

use crate::admission::Admission;
use crate::config::AppConfig;
use crate::lifecycle::Lifecycle;
use crate::notify::{EmailNotifier, Notifier, SmsNotifier, WhatsAppNotifier};
use crate::ratelimit::{FixedWindowLimiter, RateLimiter};
use crate::store::{ObjectStore, Presigner};

/// Shared handler state. Everything is behind an `Arc` so the state clones
/// cheaply per request.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ObjectStore>,
    pub lifecycle: Arc<Lifecycle>,
    pub admission: Arc<Admission>,
    pub limiter: Arc<dyn RateLimiter>,
    pub notifiers: Arc<Vec<Box<dyn Notifier>>>,
    pub presigner: Presigner,
}

impl AppState {
    /// Wire the full stack from configuration over the given store backend.
    pub fn new(store: Arc<dyn ObjectStore>, config: &AppConfig) -> Self {
        let presigner = Presigner::new(
            &config.storage.public_base_url,
            &config.storage.signing_secret,
            config.storage.presign_expiry_secs,
        );

        let limiter = Arc::new(FixedWindowLimiter::new(
            config.api.rate_limit_requests,
            Duration::from_secs(config.api.rate_limit_window_secs),
        ));

        let client = reqwest::Client::new();
        let notifiers: Vec<Box<dyn Notifier>> = vec![
            Box::new(EmailNotifier::new(client.clone(), &config.notify)),
            Box::new(WhatsAppNotifier::new(client.clone(), &config.notify)),
            Box::new(SmsNotifier::new(client, &config.notify)),
        ];

        Self {
            lifecycle: Arc::new(Lifecycle::new(
                store.clone(),
                presigner.clone(),
                config.api.list_default_limit,
            )),
            admission: Arc::new(Admission::new(store.clone())),
            limiter,
            notifiers: Arc::new(notifiers),
            presigner,
            store,
        }
    }

    /// Swap the rate limiter, used by tests to exercise throttling paths.
    pub fn with_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Drop all notification channels, used by tests to avoid network calls.
    pub fn without_notifiers(mut self) -> Self {
        self.notifiers = Arc::new(Vec::new());
        self
    }
}
