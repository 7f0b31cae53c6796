#![allow(dead_code)]

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt;
use tokio::sync::Mutex;
use tower::ServiceExt;

use visuopost::application::blog::BlogService;
use visuopost::application::comments::CommentService;
use visuopost::application::newsletter::{
    NewsletterRelay, NewsletterService, RelayError, RelayForm, SignupMetadata,
};
use visuopost::application::render::HtmlBodyRenderer;
use visuopost::application::session::SessionStore;
use visuopost::domain::posts;
use visuopost::infra::http::{HttpState, build_router};
use visuopost::infra::images::ImageStorage;
use visuopost::infra::store::MemoryComments;
use visuopost::presentation::views::LayoutChrome;

#[derive(Default)]
pub struct RecordingRelay {
    pub forms: Mutex<Vec<RelayForm>>,
}

#[async_trait]
impl NewsletterRelay for RecordingRelay {
    async fn submit(&self, form: RelayForm) -> Result<(), RelayError> {
        self.forms.lock().await.push(form);
        Ok(())
    }
}

pub struct TestSite {
    pub router: Router,
    pub comments: Arc<MemoryComments>,
    pub relay: Arc<RecordingRelay>,
    pub sessions: Arc<SessionStore>,
}

pub fn site(images_dir: PathBuf) -> TestSite {
    site_with_comments(images_dir, MemoryComments::new())
}

pub fn site_with_comments(images_dir: PathBuf, comments: MemoryComments) -> TestSite {
    build_site(images_dir, comments, 1_000)
}

pub fn site_with_session_capacity(images_dir: PathBuf, capacity: usize) -> TestSite {
    build_site(images_dir, MemoryComments::new(), capacity)
}

fn build_site(images_dir: PathBuf, comments: MemoryComments, capacity: usize) -> TestSite {
    let comments = Arc::new(comments);
    let relay = Arc::new(RecordingRelay::default());
    let metadata = SignupMetadata {
        access_key: "test-access-key".to_string(),
        subject: "New Newsletter Signup".to_string(),
        from_name: "My Blog".to_string(),
        redirect: "https://visuopost.netlify.app".to_string(),
    };

    let blog = BlogService::new(
        CommentService::new(comments.clone()),
        NewsletterService::new(relay.clone(), metadata),
        Arc::new(HtmlBodyRenderer),
        "/images",
    );

    let capacity = NonZeroUsize::new(capacity).expect("non-zero capacity");
    let sessions = Arc::new(SessionStore::new(posts::all(), capacity).expect("session store"));
    let state = HttpState {
        blog: Arc::new(blog),
        sessions: sessions.clone(),
        images: Arc::new(ImageStorage::new(images_dir)),
        chrome: LayoutChrome::new("My Blog", "A test blog"),
    };

    TestSite {
        router: build_router(state),
        comments,
        relay,
        sessions,
    }
}

pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router
        .clone()
        .oneshot(request)
        .await
        .expect("router responds")
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

pub fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

/// `name=value` pair of the session cookie issued by `response`, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("visuopost_session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.expect("collect body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// Open a session and return its cookie.
pub async fn start_session(router: &Router) -> String {
    let response = send(router, get("/", None)).await;
    session_cookie(&response).expect("session cookie issued")
}
