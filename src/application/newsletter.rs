//! Newsletter signup forwarded to a hosted form relay.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::NewsletterSettings;
use crate::domain::newsletter::EmailAddress;

const SOURCE: &str = "application::newsletter::NewsletterService";

/// Fields posted to the relay, in wire order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayForm {
    pub access_key: String,
    pub subject: String,
    pub from_name: String,
    pub redirect: String,
    pub botcheck: String,
    pub email: String,
}

impl RelayForm {
    pub fn pairs(&self) -> [(&'static str, &str); 6] {
        [
            ("access_key", self.access_key.as_str()),
            ("subject", self.subject.as_str()),
            ("from_name", self.from_name.as_str()),
            ("redirect", self.redirect.as_str()),
            ("botcheck", self.botcheck.as_str()),
            ("email", self.email.as_str()),
        ]
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("relay request failed: {0}")]
    Transport(String),
}

#[async_trait]
pub trait NewsletterRelay: Send + Sync {
    /// Deliver the form. Implementations do not interpret the relay's response body.
    async fn submit(&self, form: RelayForm) -> Result<(), RelayError>;
}

/// Static metadata sent alongside every signup.
#[derive(Debug, Clone)]
pub struct SignupMetadata {
    pub access_key: String,
    pub subject: String,
    pub from_name: String,
    pub redirect: String,
}

impl SignupMetadata {
    /// `None` when no access key is configured.
    pub fn from_settings(settings: &NewsletterSettings) -> Option<Self> {
        let access_key = settings.access_key.clone()?;
        Some(Self {
            access_key,
            subject: settings.subject.clone(),
            from_name: settings.from_name.clone(),
            redirect: settings.redirect.clone(),
        })
    }
}

struct RelayBinding {
    relay: Arc<dyn NewsletterRelay>,
    metadata: SignupMetadata,
}

#[derive(Clone)]
pub struct NewsletterService {
    binding: Option<Arc<RelayBinding>>,
}

impl NewsletterService {
    pub fn new(relay: Arc<dyn NewsletterRelay>, metadata: SignupMetadata) -> Self {
        Self {
            binding: Some(Arc::new(RelayBinding { relay, metadata })),
        }
    }

    /// A service that accepts signups but forwards nothing.
    pub fn disabled() -> Self {
        Self { binding: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.binding.is_some()
    }

    pub fn build_form(metadata: &SignupMetadata, email: &EmailAddress) -> RelayForm {
        RelayForm {
            access_key: metadata.access_key.clone(),
            subject: metadata.subject.clone(),
            from_name: metadata.from_name.clone(),
            redirect: metadata.redirect.clone(),
            botcheck: String::new(),
            email: email.as_str().to_string(),
        }
    }

    /// Fire-and-forget delivery. The returned handle exists for tests; callers drop it.
    pub fn dispatch(&self, email: &EmailAddress) -> Option<JoinHandle<()>> {
        let Some(binding) = self.binding.clone() else {
            warn!(
                target = SOURCE,
                "newsletter relay is not configured; signup not forwarded"
            );
            return None;
        };

        let form = Self::build_form(&binding.metadata, email);
        metrics::counter!("visuopost_newsletter_dispatch_total").increment(1);

        Some(tokio::spawn(async move {
            match binding.relay.submit(form).await {
                Ok(()) => info!(target = SOURCE, "newsletter signup forwarded"),
                Err(err) => {
                    metrics::counter!("visuopost_newsletter_dispatch_failed_total").increment(1);
                    error!(target = SOURCE, error = %err, "failed to forward newsletter signup");
                }
            }
        }))
    }
}
