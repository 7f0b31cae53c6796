mod data;

use time::{Date, format_description::FormatItem, macros::format_description};

pub use data::POSTS;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
pub const ISO_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month padding:zero]-[day padding:zero]");

/// A node of a post body. Bodies are flat sequences of blocks; the renderer decides markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostBlock {
    Paragraph(&'static str),
    Heading { level: u8, text: &'static str },
    List(&'static [&'static str]),
}

#[derive(Debug, Clone)]
pub struct Post {
    pub id: &'static str,
    pub title: &'static str,
    pub date: Date,
    /// Path relative to the configured image root.
    pub image: &'static str,
    pub content: &'static [PostBlock],
}

pub fn all() -> &'static [Post] {
    &POSTS
}

pub fn find_by_id(id: &str) -> Option<&'static Post> {
    POSTS.iter().find(|post| post.id == id)
}

pub fn format_human_date(date: Date) -> String {
    date.format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub fn format_iso_date(date: Date) -> String {
    date.format(ISO_DATE_FORMAT).unwrap_or_else(|_| date.to_string())
}
