use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Direct replies, never stored. Filled one level deep when a post is
    /// fetched together with its comments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Comment>,
}

impl Comment {
    pub fn new(post_id: Uuid, parent_id: Option<Uuid>, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            post_id,
            parent_id,
            content,
            created_at: super::now_utc(),
            children: Vec::new(),
        }
    }
}

/// Length is counted in characters, not bytes.
pub fn content_within_limit(content: &str) -> bool {
    content.chars().count() <= MAX_COMMENT_CHARS
}
