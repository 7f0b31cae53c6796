use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "visuopost_comment_fetch_total",
            Unit::Count,
            "Total number of comment list requests sent to the store."
        );
        describe_counter!(
            "visuopost_comment_fetch_failed_total",
            Unit::Count,
            "Total number of comment list requests that failed."
        );
        describe_counter!(
            "visuopost_comment_submit_total",
            Unit::Count,
            "Total number of comments sent to the store."
        );
        describe_counter!(
            "visuopost_comment_submit_failed_total",
            Unit::Count,
            "Total number of comment writes the store did not accept."
        );
        describe_counter!(
            "visuopost_comment_submit_rejected_total",
            Unit::Count,
            "Total number of comment submissions rejected for blank fields."
        );
        describe_counter!(
            "visuopost_newsletter_dispatch_total",
            Unit::Count,
            "Total number of newsletter signups forwarded to the relay."
        );
        describe_counter!(
            "visuopost_newsletter_dispatch_failed_total",
            Unit::Count,
            "Total number of newsletter relay requests that failed."
        );
        describe_counter!(
            "visuopost_http_session_created_total",
            Unit::Count,
            "Total number of visitor sessions started."
        );
        describe_counter!(
            "visuopost_http_session_evicted_total",
            Unit::Count,
            "Total number of visitor sessions dropped to stay within capacity."
        );
        describe_counter!(
            "visuopost_http_error_responses_total",
            Unit::Count,
            "Total number of 4xx and 5xx responses, labelled by class."
        );
    });
}
