//! Bounded cursor navigation over the post sequence.

use super::error::DomainError;
use super::posts::Post;

/// Zero-based position within a non-empty sequence. Never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostCursor {
    index: usize,
    total: usize,
}

impl PostCursor {
    pub fn new(total: usize) -> Result<Self, DomainError> {
        if total == 0 {
            return Err(DomainError::invariant(
                "cannot navigate an empty post sequence",
            ));
        }
        Ok(Self { index: 0, total })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// One-based position for display.
    pub fn position(&self) -> usize {
        self.index + 1
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total
    }

    /// Advance by one. Returns `false` and leaves the cursor untouched at the last index.
    pub fn next(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.index += 1;
        true
    }

    /// Retreat by one. Returns `false` and leaves the cursor untouched at index zero.
    pub fn previous(&mut self) -> bool {
        if !self.has_previous() {
            return false;
        }
        self.index -= 1;
        true
    }
}

/// A cursor bound to the post sequence it walks.
#[derive(Debug, Clone)]
pub struct PostViewer {
    posts: &'static [Post],
    cursor: PostCursor,
}

impl PostViewer {
    pub fn new(posts: &'static [Post]) -> Result<Self, DomainError> {
        let cursor = PostCursor::new(posts.len())?;
        Ok(Self { posts, cursor })
    }

    pub fn current(&self) -> &'static Post {
        &self.posts[self.cursor.index()]
    }

    pub fn cursor(&self) -> PostCursor {
        self.cursor
    }

    pub fn next(&mut self) -> bool {
        self.cursor.next()
    }

    pub fn previous(&mut self) -> bool {
        self.cursor.previous()
    }
}
