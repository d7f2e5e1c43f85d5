use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::comment::Comment;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub comments_disabled: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Top-level comments, filled in at response time; never stored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn new(title: String, content: String, comments_disabled: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            comments_disabled,
            created_at: super::now_utc(),
            comments: Vec::new(),
        }
    }
}
