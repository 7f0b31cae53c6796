//! The blog page: post navigation, comments, and newsletter signup for one visitor session.

use std::sync::Arc;

use tracing::{debug, error};

use crate::application::comments::{CommentError, CommentService};
use crate::application::newsletter::NewsletterService;
use crate::application::render::BodyRenderer;
use crate::application::session::{BlogSession, SessionHandle};
use crate::domain::newsletter::SignupRequest;
use crate::domain::posts::{self, Post};
use crate::presentation::views::{
    BlogPageView, CommentFormView, CommentView, NewsletterFormView, PostNavigationView, PostView,
};

const SOURCE: &str = "application::blog::BlogService";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentOutcome {
    /// Stored remotely and appended to the session view; the draft was cleared.
    Stored,
    /// Blank name or text; nothing was sent.
    Rejected,
    /// The store failed; the draft is kept for another attempt.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    Dispatched,
    /// A previous signup from this session is still marked in flight.
    AlreadySubscribing,
    Rejected,
}

#[derive(Clone)]
pub struct BlogService {
    comments: CommentService,
    newsletter: NewsletterService,
    renderer: Arc<dyn BodyRenderer>,
    image_base: String,
}

impl BlogService {
    pub fn new(
        comments: CommentService,
        newsletter: NewsletterService,
        renderer: Arc<dyn BodyRenderer>,
        image_base: impl Into<String>,
    ) -> Self {
        let image_base = image_base.into().trim_end_matches('/').to_string();
        Self {
            comments,
            newsletter,
            renderer,
            image_base,
        }
    }

    /// Build the page for the current post, loading its comments on the session's first render.
    pub async fn page_view(&self, session: &SessionHandle) -> BlogPageView {
        let first_render = {
            let mut state = session.lock().await;
            state.mount().then(|| state.viewer.current().id)
        };
        if let Some(post_id) = first_render {
            self.refresh_comments(session, post_id).await;
        }

        let state = session.lock().await;
        self.build_view(&state)
    }

    pub async fn next_post(&self, session: &SessionHandle) {
        let moved_to = {
            let mut state = session.lock().await;
            state.viewer.next().then(|| state.viewer.current().id)
        };
        self.after_navigation(session, moved_to).await;
    }

    pub async fn previous_post(&self, session: &SessionHandle) {
        let moved_to = {
            let mut state = session.lock().await;
            state.viewer.previous().then(|| state.viewer.current().id)
        };
        self.after_navigation(session, moved_to).await;
    }

    async fn after_navigation(&self, session: &SessionHandle, moved_to: Option<&'static str>) {
        let Some(post_id) = moved_to else {
            debug!(target = SOURCE, "navigation ignored at sequence boundary");
            return;
        };
        {
            // Navigation counts as the mount for sessions that never rendered.
            session.lock().await.mount();
        }
        self.refresh_comments(session, post_id).await;
    }

    /// Fetch and cache comments for `post_id`. Failures are logged and leave the cache untouched.
    async fn refresh_comments(&self, session: &SessionHandle, post_id: &'static str) {
        match self.comments.fetch_comments(post_id).await {
            Ok(comments) => session.lock().await.replace_comments(post_id, comments),
            Err(err) => {
                error!(
                    target = SOURCE,
                    post_id,
                    error = %err,
                    "failed to fetch comments"
                );
            }
        }
    }

    pub async fn submit_comment(
        &self,
        session: &SessionHandle,
        name: &str,
        text: &str,
    ) -> CommentOutcome {
        let post_id = {
            let mut state = session.lock().await;
            state.draft.name = name.to_string();
            state.draft.text = text.to_string();
            state.viewer.current().id
        };

        match self.comments.submit_comment(post_id, name, text).await {
            Ok(comment) => {
                let mut state = session.lock().await;
                state.push_comment(post_id, comment);
                state.draft.clear();
                CommentOutcome::Stored
            }
            Err(CommentError::Invalid(err)) => {
                debug!(target = SOURCE, post_id, reason = %err, "comment rejected");
                CommentOutcome::Rejected
            }
            Err(CommentError::Store(err)) => {
                error!(
                    target = SOURCE,
                    post_id,
                    error = %err,
                    "failed to submit comment"
                );
                CommentOutcome::Failed
            }
        }
    }

    pub async fn subscribe(&self, session: &SessionHandle, request: &SignupRequest) -> SignupOutcome {
        let email = match request.validate() {
            Ok(email) => email,
            Err(err) => {
                debug!(target = SOURCE, reason = %err, "newsletter signup rejected");
                return SignupOutcome::Rejected;
            }
        };

        {
            let mut state = session.lock().await;
            if state.is_subscribing() {
                return SignupOutcome::AlreadySubscribing;
            }
            state.mark_subscribing();
        }

        // Detached; the relay's answer is never awaited here.
        drop(self.newsletter.dispatch(&email));
        SignupOutcome::Dispatched
    }

    fn build_view(&self, state: &BlogSession) -> BlogPageView {
        let post = state.viewer.current();
        let cursor = state.viewer.cursor();

        BlogPageView {
            post: self.post_view(post),
            navigation: PostNavigationView {
                position: cursor.position(),
                total: cursor.total(),
                has_previous: cursor.has_previous(),
                has_next: cursor.has_next(),
            },
            comment_form: CommentFormView {
                name: state.draft.name.clone(),
                text: state.draft.text.clone(),
            },
            comments: state
                .comments_for(post.id)
                .iter()
                .map(|comment| CommentView {
                    name: comment.name.clone(),
                    text: comment.text.clone(),
                    posted: comment.display_date(),
                })
                .collect(),
            newsletter: NewsletterFormView {
                subscribing: state.is_subscribing(),
            },
        }
    }

    fn post_view(&self, post: &Post) -> PostView {
        PostView {
            id: post.id.to_string(),
            title: post.title.to_string(),
            published: posts::format_human_date(post.date),
            iso_date: posts::format_iso_date(post.date),
            image_src: format!("{}/{}", self.image_base, post.image),
            body_html: self.renderer.render(post.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::application::newsletter::{NewsletterRelay, RelayError, RelayForm, SignupMetadata};
    use crate::application::render::HtmlBodyRenderer;
    use crate::application::repos::{CommentsRepo, RepoError};
    use crate::domain::comments::Comment;

    #[derive(Default)]
    struct ScriptedComments {
        stored: StdMutex<HashMap<String, Vec<Comment>>>,
        list_calls: StdMutex<Vec<String>>,
        appended: StdMutex<Vec<Comment>>,
        fail_reads: AtomicBool,
        fail_writes: AtomicBool,
    }

    impl ScriptedComments {
        fn list_calls(&self) -> Vec<String> {
            self.list_calls.lock().expect("lock").clone()
        }

        fn appended(&self) -> Vec<Comment> {
            self.appended.lock().expect("lock").clone()
        }

        fn seed(&self, comment: Comment) {
            self.stored
                .lock()
                .expect("lock")
                .entry(comment.post_id.clone())
                .or_default()
                .push(comment);
        }
    }

    #[async_trait]
    impl CommentsRepo for ScriptedComments {
        async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, RepoError> {
            self.list_calls
                .lock()
                .expect("lock")
                .push(post_id.to_string());
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(RepoError::from_persistence("store offline"));
            }
            Ok(self
                .stored
                .lock()
                .expect("lock")
                .get(post_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn append_comment(&self, comment: &Comment) -> Result<(), RepoError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(RepoError::from_persistence("store offline"));
            }
            self.appended.lock().expect("lock").push(comment.clone());
            self.seed(comment.clone());
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingRelay {
        forms: Mutex<Vec<RelayForm>>,
    }

    #[async_trait]
    impl NewsletterRelay for CountingRelay {
        async fn submit(&self, form: RelayForm) -> Result<(), RelayError> {
            self.forms.lock().await.push(form);
            Ok(())
        }
    }

    fn service(repo: Arc<ScriptedComments>) -> BlogService {
        BlogService::new(
            CommentService::new(repo),
            NewsletterService::disabled(),
            Arc::new(HtmlBodyRenderer),
            "/images/",
        )
    }

    fn session() -> SessionHandle {
        Arc::new(Mutex::new(
            BlogSession::new(posts::all()).expect("session"),
        ))
    }

    fn stored(post_id: &str, name: &str, date: &str) -> Comment {
        Comment {
            post_id: post_id.to_string(),
            name: name.to_string(),
            text: format!("from {name}"),
            date: date.to_string(),
        }
    }

    #[tokio::test]
    async fn first_render_fetches_once_and_rerenders_use_cache() {
        let repo = Arc::new(ScriptedComments::default());
        let blog = service(repo.clone());
        let session = session();

        let view = blog.page_view(&session).await;
        assert_eq!(view.post.id, "post-1");
        assert_eq!(view.post.image_src, "/images/screenshot-20251.jpg");
        assert!(view.comments.is_empty());

        blog.page_view(&session).await;
        assert_eq!(repo.list_calls(), ["post-1"]);
    }

    #[tokio::test]
    async fn every_cursor_change_fetches_again() {
        let repo = Arc::new(ScriptedComments::default());
        let blog = service(repo.clone());
        let session = session();

        blog.page_view(&session).await;
        blog.next_post(&session).await;
        blog.previous_post(&session).await;
        blog.page_view(&session).await;

        assert_eq!(repo.list_calls(), ["post-1", "post-2", "post-1"]);
    }

    #[tokio::test]
    async fn boundary_navigation_does_not_fetch() {
        let repo = Arc::new(ScriptedComments::default());
        let blog = service(repo.clone());
        let session = session();

        blog.page_view(&session).await;
        blog.previous_post(&session).await;
        blog.next_post(&session).await;
        blog.next_post(&session).await;
        blog.next_post(&session).await;

        let view = blog.page_view(&session).await;
        assert_eq!(view.navigation.position, 3);
        assert_eq!(view.navigation.total, 3);
        assert!(view.navigation.has_previous);
        assert!(!view.navigation.has_next);
        assert_eq!(repo.list_calls(), ["post-1", "post-2", "post-3"]);
    }

    #[tokio::test]
    async fn fetched_comments_are_shown_oldest_first() {
        let repo = Arc::new(ScriptedComments::default());
        repo.seed(stored("post-1", "late", "2025-04-19T08:00:00Z"));
        repo.seed(stored("post-1", "early", "2025-04-18T08:00:00Z"));
        repo.seed(stored("post-2", "elsewhere", "2025-04-18T08:00:00Z"));
        let blog = service(repo);
        let session = session();

        let view = blog.page_view(&session).await;
        let names: Vec<_> = view.comments.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["early", "late"]);
    }

    #[tokio::test]
    async fn fetch_failure_shows_empty_state() {
        let repo = Arc::new(ScriptedComments::default());
        repo.seed(stored("post-1", "hidden", "2025-04-18T08:00:00Z"));
        repo.fail_reads.store(true, Ordering::SeqCst);
        let blog = service(repo);
        let session = session();

        let view = blog.page_view(&session).await;
        assert!(view.comments.is_empty());
    }

    #[tokio::test]
    async fn blank_comment_is_not_sent() {
        let repo = Arc::new(ScriptedComments::default());
        let blog = service(repo.clone());
        let session = session();
        blog.page_view(&session).await;

        assert_eq!(
            blog.submit_comment(&session, "   ", "Great post!").await,
            CommentOutcome::Rejected
        );
        assert_eq!(
            blog.submit_comment(&session, "Alice", "").await,
            CommentOutcome::Rejected
        );

        assert!(repo.appended().is_empty());
        assert!(session.lock().await.comments_for("post-1").is_empty());
    }

    #[tokio::test]
    async fn stored_comment_is_appended_and_draft_cleared() {
        let repo = Arc::new(ScriptedComments::default());
        let blog = service(repo.clone());
        let session = session();
        blog.page_view(&session).await;

        let outcome = blog.submit_comment(&session, "Alice", "Great post!").await;
        assert_eq!(outcome, CommentOutcome::Stored);

        let appended = repo.appended();
        assert_eq!(appended.len(), 1);
        let written = &appended[0];
        assert_eq!(written.post_id, "post-1");
        assert_eq!(written.name, "Alice");
        assert_eq!(written.text, "Great post!");
        assert!(written.timestamp().is_some());

        let state = session.lock().await;
        assert_eq!(state.comments_for("post-1"), std::slice::from_ref(written));
        assert!(state.draft.is_empty());
    }

    #[tokio::test]
    async fn failed_comment_keeps_draft_and_view() {
        let repo = Arc::new(ScriptedComments::default());
        repo.fail_writes.store(true, Ordering::SeqCst);
        let blog = service(repo.clone());
        let session = session();
        blog.page_view(&session).await;

        let outcome = blog.submit_comment(&session, "Alice", "Great post!").await;
        assert_eq!(outcome, CommentOutcome::Failed);

        let view = blog.page_view(&session).await;
        assert!(view.comments.is_empty());
        assert_eq!(view.comment_form.name, "Alice");
        assert_eq!(view.comment_form.text, "Great post!");
    }

    #[tokio::test]
    async fn comments_follow_the_post_they_were_written_on() {
        let repo = Arc::new(ScriptedComments::default());
        let blog = service(repo.clone());
        let session = session();
        blog.page_view(&session).await;
        blog.next_post(&session).await;

        blog.submit_comment(&session, "Bob", "Nice tips").await;

        assert_eq!(repo.appended()[0].post_id, "post-2");
        let view = blog.page_view(&session).await;
        assert_eq!(view.comments.len(), 1);
        blog.previous_post(&session).await;
        assert!(blog.page_view(&session).await.comments.is_empty());
    }

    #[tokio::test]
    async fn signup_sets_flag_permanently_and_dispatches_once() {
        let repo = Arc::new(ScriptedComments::default());
        let relay = Arc::new(CountingRelay::default());
        let metadata = SignupMetadata {
            access_key: "key".to_string(),
            subject: "New Newsletter Signup".to_string(),
            from_name: "My Blog".to_string(),
            redirect: "https://example.com".to_string(),
        };
        let blog = BlogService::new(
            CommentService::new(repo),
            NewsletterService::new(relay.clone(), metadata),
            Arc::new(HtmlBodyRenderer),
            "/images",
        );
        let session = session();
        let request = SignupRequest {
            email: "reader@example.com".to_string(),
            botcheck: None,
        };

        assert_eq!(
            blog.subscribe(&session, &request).await,
            SignupOutcome::Dispatched
        );
        assert_eq!(
            blog.subscribe(&session, &request).await,
            SignupOutcome::AlreadySubscribing
        );

        for _ in 0..50 {
            if !relay.forms.lock().await.is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(relay.forms.lock().await.len(), 1);

        blog.next_post(&session).await;
        let view = blog.page_view(&session).await;
        assert!(view.newsletter.subscribing);
        assert_eq!(view.newsletter.button_label(), "Subscribing...");
    }

    #[tokio::test]
    async fn invalid_signup_leaves_flag_unset() {
        let blog = service(Arc::new(ScriptedComments::default()));
        let session = session();
        let request = SignupRequest {
            email: "   ".to_string(),
            botcheck: None,
        };

        assert_eq!(
            blog.subscribe(&session, &request).await,
            SignupOutcome::Rejected
        );
        assert!(!session.lock().await.is_subscribing());
    }
}
