//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::comments::Comment;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("document store rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected document store response: {message}")]
    Protocol { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

/// Read/append access to the `comments` document collection.
#[async_trait]
pub trait CommentsRepo: Send + Sync {
    /// Every stored comment whose `postId` equals `post_id`, in store order.
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, RepoError>;

    async fn append_comment(&self, comment: &Comment) -> Result<(), RepoError>;
}
