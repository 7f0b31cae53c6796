//! Comment gateway over the document store.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

use crate::application::repos::{CommentsRepo, RepoError};
use crate::domain::comments::{self, Comment};
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum CommentError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] RepoError),
}

#[derive(Clone)]
pub struct CommentService {
    repo: Arc<dyn CommentsRepo>,
}

impl CommentService {
    pub fn new(repo: Arc<dyn CommentsRepo>) -> Self {
        Self { repo }
    }

    /// All comments for `post_id`, oldest first.
    pub async fn fetch_comments(&self, post_id: &str) -> Result<Vec<Comment>, RepoError> {
        metrics::counter!("visuopost_comment_fetch_total").increment(1);

        let mut comments = self.repo.list_comments(post_id).await.inspect_err(|_| {
            metrics::counter!("visuopost_comment_fetch_failed_total").increment(1);
        })?;
        comments::sort_by_date(&mut comments);

        debug!(
            target = "visuopost::comments",
            post_id,
            count = comments.len(),
            "fetched comments"
        );
        Ok(comments)
    }

    /// Validate and store a comment. Blank input never reaches the store.
    pub async fn submit_comment(
        &self,
        post_id: &str,
        name: &str,
        text: &str,
    ) -> Result<Comment, CommentError> {
        let comment = Comment::compose(post_id, name, text, OffsetDateTime::now_utc())
            .inspect_err(|_| {
                metrics::counter!("visuopost_comment_submit_rejected_total").increment(1);
            })?;

        metrics::counter!("visuopost_comment_submit_total").increment(1);
        self.repo.append_comment(&comment).await.inspect_err(|_| {
            metrics::counter!("visuopost_comment_submit_failed_total").increment(1);
        })?;

        Ok(comment)
    }
}
