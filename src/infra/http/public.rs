use std::sync::Arc;

use axum::{
    Form, Router,
    extract::State,
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    application::{blog::BlogService, session::SessionStore},
    domain::newsletter::SignupRequest,
    infra::{assets, images::ImageStorage},
    presentation::views::{
        BlogTemplate, LayoutChrome, LayoutContext, render_not_found_response,
        render_template_response,
    },
};

use super::{
    middleware::{log_responses, set_request_context},
    session,
};

/// Fragment the comment form lives under, so the browser returns to it after posting.
const COMMENT_FORM_ANCHOR: &str = "/#commentForm";

#[derive(Clone)]
pub struct HttpState {
    pub blog: Arc<BlogService>,
    pub sessions: Arc<SessionStore>,
    pub images: Arc<ImageStorage>,
    pub chrome: LayoutChrome,
}

pub fn build_router(state: HttpState) -> Router {
    let images = Router::new()
        .route("/images/{*path}", get(assets::serve_image))
        .with_state(state.images.clone());

    Router::new()
        .route("/", get(index))
        .route("/posts/next", post(next_post))
        .route("/posts/previous", post(previous_post))
        .route("/comments", post(submit_comment))
        .route("/newsletter", post(subscribe))
        .route("/_health", get(health))
        .route("/static/{*path}", get(assets::serve_embedded))
        .fallback(fallback)
        .with_state(state)
        .merge(images)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommentForm {
    name: String,
    comment: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NewsletterForm {
    email: String,
    botcheck: Option<String>,
}

async fn index(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let (jar, handle) = match session::resolve(&state.sessions, jar) {
        Ok(resolved) => resolved,
        Err(err) => return err.into_response(),
    };

    let content = state.blog.page_view(&handle).await;
    let chrome = state.chrome.clone().with_page_title(&content.post.title);
    let view = LayoutContext::new(chrome, content);

    let mut response = render_template_response(BlogTemplate { view }, StatusCode::OK);
    // Each page reflects one visitor's session.
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    (jar, response).into_response()
}

async fn next_post(State(state): State<HttpState>, jar: CookieJar) -> Response {
    match session::resolve(&state.sessions, jar) {
        Ok((jar, handle)) => {
            state.blog.next_post(&handle).await;
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn previous_post(State(state): State<HttpState>, jar: CookieJar) -> Response {
    match session::resolve(&state.sessions, jar) {
        Ok((jar, handle)) => {
            state.blog.previous_post(&handle).await;
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn submit_comment(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<CommentForm>,
) -> Response {
    match session::resolve(&state.sessions, jar) {
        Ok((jar, handle)) => {
            state
                .blog
                .submit_comment(&handle, &form.name, &form.comment)
                .await;
            (jar, Redirect::to(COMMENT_FORM_ANCHOR)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn subscribe(
    State(state): State<HttpState>,
    jar: CookieJar,
    Form(form): Form<NewsletterForm>,
) -> Response {
    match session::resolve(&state.sessions, jar) {
        Ok((jar, handle)) => {
            let request = SignupRequest {
                email: form.email,
                botcheck: form.botcheck,
            };
            state.blog.subscribe(&handle, &request).await;
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => err.into_response(),
    }
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn fallback(State(state): State<HttpState>) -> Response {
    render_not_found_response(state.chrome.clone().with_page_title("Page Not Found"))
}
