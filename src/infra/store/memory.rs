use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::repos::{CommentsRepo, RepoError};
use crate::domain::comments::Comment;

/// Process-local comment collection.
#[derive(Debug, Default)]
pub struct MemoryComments {
    documents: RwLock<Vec<Comment>>,
}

impl MemoryComments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_comments(comments: Vec<Comment>) -> Self {
        Self {
            documents: RwLock::new(comments),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl CommentsRepo for MemoryComments {
    async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, RepoError> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect())
    }

    async fn append_comment(&self, comment: &Comment) -> Result<(), RepoError> {
        self.documents.write().await.push(comment.clone());
        Ok(())
    }
}
