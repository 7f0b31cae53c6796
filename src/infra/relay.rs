//! HTTP client for the hosted newsletter form relay.

use async_trait::async_trait;
use reqwest::{Client, Url, header::CONTENT_TYPE};
use tracing::debug;

use crate::application::newsletter::{NewsletterRelay, RelayError, RelayForm};
use crate::infra::error::InfraError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

#[derive(Clone, Debug)]
pub struct FormRelayClient {
    client: Client,
    endpoint: Url,
}

impl FormRelayClient {
    pub fn new(endpoint: Url) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(user_agent())
            .build()
            .map_err(|err| InfraError::configuration(format!("relay http client: {err}")))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub(crate) fn user_agent() -> &'static str {
    concat!("visuopost/", env!("CARGO_PKG_VERSION"))
}

/// URL-encode the form in field order.
pub fn encode_form(form: &RelayForm) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in form.pairs() {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

#[async_trait]
impl NewsletterRelay for FormRelayClient {
    async fn submit(&self, form: RelayForm) -> Result<(), RelayError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(encode_form(&form))
            .send()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;

        // The relay's verdict is not interpreted; only transport failures count.
        debug!(
            target = "visuopost::relay",
            status = response.status().as_u16(),
            "relay responded"
        );
        Ok(())
    }
}
