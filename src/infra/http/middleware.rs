//! Request tagging and error-response logging for the public site.

use std::time::Instant;

use axum::{
    body::Body,
    http::{Request, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{error, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

use super::session::{self, SESSION_COOKIE};

const TARGET: &str = "visuopost::http::response";

/// Per-request identifiers shared with handlers and the response logger.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: Uuid,
    /// Session presented by the visitor's cookie; `None` for first visits and bad cookies.
    pub session: Option<Uuid>,
}

impl RequestContext {
    fn from_request(request: &Request<Body>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            session: session::presented_id(&CookieJar::from_headers(request.headers())),
        }
    }
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let ctx = RequestContext::from_request(&request);
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

fn issues_session_cookie(response: &Response) -> bool {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(SESSION_COOKIE))
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();
    let ctx = request.extensions().get::<RequestContext>().cloned();

    let mut response = next.run(request).await;
    let status = response.status();
    if !status.is_client_error() && !status.is_server_error() {
        return response;
    }

    let class = if status.is_server_error() { "server" } else { "client" };
    metrics::counter!("visuopost_http_error_responses_total", "class" => class).increment(1);

    let elapsed_ms = start.elapsed().as_millis();
    let new_session = issues_session_cookie(&response);
    let (source, messages) = match response.extensions_mut().remove::<ErrorReport>() {
        Some(report) => (report.source, report.messages),
        None => ("unknown", Vec::new()),
    };
    let detail = messages
        .first()
        .cloned()
        .unwrap_or_else(|| "no diagnostic available".to_string());
    let request_id = ctx.as_ref().map(|ctx| ctx.request_id);
    let session = ctx.and_then(|ctx| ctx.session);

    if status.is_server_error() {
        error!(
            target = TARGET,
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            source,
            detail = %detail,
            chain = ?messages,
            request_id = ?request_id,
            session = ?session,
            new_session,
            "request failed",
        );
    } else {
        warn!(
            target = TARGET,
            status = status.as_u16(),
            method = %method,
            path = %path,
            elapsed_ms,
            source,
            detail = %detail,
            request_id = ?request_id,
            session = ?session,
            new_session,
            "client request error",
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn request(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::empty()).expect("request")
    }

    #[test]
    fn context_reads_session_from_cookie() {
        let id = Uuid::new_v4();
        let ctx = RequestContext::from_request(&request(Some(&format!(
            "theme=dark; {SESSION_COOKIE}={id}"
        ))));
        assert_eq!(ctx.session, Some(id));

        let ctx = RequestContext::from_request(&request(Some(&format!(
            "{SESSION_COOKIE}=not-a-uuid"
        ))));
        assert_eq!(ctx.session, None);

        assert_eq!(RequestContext::from_request(&request(None)).session, None);
    }

    #[tokio::test]
    async fn context_is_visible_to_handlers_and_on_the_response() {
        let id = Uuid::new_v4();
        let router = Router::new()
            .route(
                "/",
                get(|axum::Extension(ctx): axum::Extension<RequestContext>| async move {
                    ctx.session.map(|id| id.to_string()).unwrap_or_default()
                }),
            )
            .layer(axum::middleware::from_fn(log_responses))
            .layer(axum::middleware::from_fn(set_request_context));

        let response = router
            .oneshot(request(Some(&format!("{SESSION_COOKIE}={id}"))))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        let ctx = response
            .extensions()
            .get::<RequestContext>()
            .cloned()
            .expect("context");
        assert_eq!(ctx.session, Some(id));
    }

    #[test]
    fn session_cookie_issuance_is_detected() {
        let mut response = Response::new(Body::empty());
        assert!(!issues_session_cookie(&response));
        response.headers_mut().append(
            SET_COOKIE,
            format!("{SESSION_COOKIE}=abc; Path=/; HttpOnly")
                .parse()
                .expect("header"),
        );
        assert!(issues_session_cookie(&response));
    }
}
