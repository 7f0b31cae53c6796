//! Per-visitor page state held in a bounded in-memory store.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::comments::{Comment, CommentDraft};
use crate::domain::error::DomainError;
use crate::domain::posts::Post;
use crate::domain::viewer::PostViewer;

const SOURCE: &str = "visuopost::application::session";

/// Everything one visitor's page remembers between requests.
#[derive(Debug, Clone)]
pub struct BlogSession {
    pub viewer: PostViewer,
    pub draft: CommentDraft,
    comments: HashMap<&'static str, Vec<Comment>>,
    subscribing: bool,
    mounted: bool,
}

impl BlogSession {
    pub fn new(posts: &'static [Post]) -> Result<Self, DomainError> {
        Ok(Self {
            viewer: PostViewer::new(posts)?,
            draft: CommentDraft::default(),
            comments: HashMap::new(),
            subscribing: false,
            mounted: false,
        })
    }

    pub fn comments_for(&self, post_id: &str) -> &[Comment] {
        self.comments.get(post_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Overwrite the cached list for `post_id` with a fresh fetch result.
    pub fn replace_comments(&mut self, post_id: &'static str, comments: Vec<Comment>) {
        self.comments.insert(post_id, comments);
    }

    pub fn push_comment(&mut self, post_id: &'static str, comment: Comment) {
        self.comments.entry(post_id).or_default().push(comment);
    }

    pub fn is_subscribing(&self) -> bool {
        self.subscribing
    }

    /// Set once; nothing clears it.
    pub fn mark_subscribing(&mut self) {
        self.subscribing = true;
    }

    /// Returns `true` exactly once, on the first render.
    pub fn mount(&mut self) -> bool {
        !std::mem::replace(&mut self.mounted, true)
    }
}

pub type SessionHandle = Arc<Mutex<BlogSession>>;

/// Opened session plus whether it was created by this call.
pub struct OpenedSession {
    pub id: Uuid,
    pub handle: SessionHandle,
    pub created: bool,
}

/// Sessions are kept in least-recently-used order; the oldest is dropped once
/// `capacity` is reached.
pub struct SessionStore {
    posts: &'static [Post],
    sessions: StdMutex<LruCache<Uuid, SessionHandle>>,
}

impl SessionStore {
    pub fn new(posts: &'static [Post], capacity: NonZeroUsize) -> Result<Self, DomainError> {
        // Fail at startup rather than on the first visitor.
        BlogSession::new(posts)?;
        Ok(Self {
            posts,
            sessions: StdMutex::new(LruCache::new(capacity)),
        })
    }

    /// Look up `id`, or start a fresh session when it is absent, unknown or evicted.
    pub fn open(&self, id: Option<Uuid>) -> Result<OpenedSession, DomainError> {
        let mut sessions = self.lock("open");
        if let Some(id) = id
            && let Some(handle) = sessions.get(&id)
        {
            return Ok(OpenedSession {
                id,
                handle: Arc::clone(handle),
                created: false,
            });
        }

        let id = Uuid::new_v4();
        let handle = Arc::new(Mutex::new(BlogSession::new(self.posts)?));
        if let Some((evicted, _)) = sessions.push(id, Arc::clone(&handle)) {
            debug!(target = SOURCE, session = %evicted, "evicted least recently used session");
            metrics::counter!("visuopost_http_session_evicted_total").increment(1);
        }
        Ok(OpenedSession {
            id,
            handle,
            created: true,
        })
    }

    pub fn len(&self) -> usize {
        self.lock("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock("is_empty").is_empty()
    }

    pub fn capacity(&self) -> NonZeroUsize {
        self.lock("capacity").cap()
    }

    fn lock(&self, op: &'static str) -> MutexGuard<'_, LruCache<Uuid, SessionHandle>> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!(
                    target = SOURCE,
                    op,
                    result = "poisoned_recovered",
                    "Recovered from poisoned session lock"
                );
                poisoned.into_inner()
            }
        }
    }
}
