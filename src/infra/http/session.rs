//! Cookie-keyed visitor sessions.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;
use uuid::Uuid;

use crate::application::error::HttpError;
use crate::application::session::{SessionHandle, SessionStore};

pub const SESSION_COOKIE: &str = "visuopost_session";

/// Session id carried by the request's cookie, if it is well formed.
pub fn presented_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Find the visitor's session, starting one (and issuing its cookie) when needed.
pub fn resolve(
    store: &SessionStore,
    jar: CookieJar,
) -> Result<(CookieJar, SessionHandle), HttpError> {
    let presented = presented_id(&jar);

    let opened = store.open(presented).map_err(HttpError::from)?;

    if !opened.created {
        return Ok((jar, opened.handle));
    }

    metrics::counter!("visuopost_http_session_created_total").increment(1);
    debug!(
        target = "visuopost::http::session",
        session_id = %opened.id,
        replaced = presented.is_some(),
        "started visitor session"
    );

    let cookie = Cookie::build((SESSION_COOKIE, opened.id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    Ok((jar.add(cookie), opened.handle))
}
