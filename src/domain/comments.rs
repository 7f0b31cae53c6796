//! Visitor comments attached to posts.

use serde::{Deserialize, Serialize};
use time::{
    OffsetDateTime, format_description::FormatItem, format_description::well_known::Rfc3339,
    macros::format_description,
};

use super::error::DomainError;

pub const DISPLAY_TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period] UTC"
);

pub const STORED_TIMESTAMP_FORMAT: &[FormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
);

/// A stored comment. Field names match the documents in the `comments` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: String,
    pub name: String,
    pub text: String,
    /// RFC 3339 timestamp string, written as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    pub date: String,
}

impl Comment {
    /// Build a comment from raw form input, trimming both fields.
    pub fn compose(
        post_id: &str,
        name: &str,
        text: &str,
        at: OffsetDateTime,
    ) -> Result<Self, DomainError> {
        let name = name.trim();
        let text = text.trim();
        if name.is_empty() {
            return Err(DomainError::validation("comment name must not be empty"));
        }
        if text.is_empty() {
            return Err(DomainError::validation("comment text must not be empty"));
        }

        Ok(Self {
            post_id: post_id.to_string(),
            name: name.to_string(),
            text: text.to_string(),
            date: format_timestamp(at),
        })
    }

    pub fn timestamp(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.date, &Rfc3339).ok()
    }

    /// Human readable timestamp; falls back to the stored string when it does not parse.
    pub fn display_date(&self) -> String {
        self.timestamp()
            .and_then(|at| {
                at.to_offset(time::UtcOffset::UTC)
                    .format(DISPLAY_TIMESTAMP_FORMAT)
                    .ok()
            })
            .unwrap_or_else(|| self.date.clone())
    }
}

/// UTC timestamp with exactly three fraction digits, e.g. `2025-04-17T09:30:00.120Z`.
/// The fixed width keeps stored `date` strings ordered the same way as the instants.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let at = at.to_offset(time::UtcOffset::UTC);
    at.format(STORED_TIMESTAMP_FORMAT)
        .or_else(|_| at.format(&Rfc3339))
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

/// Oldest first. Comments whose date does not parse sort last, keeping store order among themselves.
pub fn sort_by_date(comments: &mut [Comment]) {
    comments.sort_by_key(|comment| {
        let at = comment.timestamp();
        (at.is_none(), at)
    });
}

/// Text typed into the comment form but not yet stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentDraft {
    pub name: String,
    pub text: String,
}

impl CommentDraft {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    pub fn clear(&mut self) {
        self.name.clear();
        self.text.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.text.is_empty()
    }
}
