//! The storage contract shared by both backends.
//!
//! Callers hold an `Arc<dyn CommentStore>` and cannot observe which backend
//! sits behind it, apart from durability and latency.

pub mod error;
pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::comment::Comment;
use crate::domain::post::Post;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// All posts. Ordering is not part of the contract.
    async fn get_posts(&self) -> StoreResult<Vec<Post>>;

    async fn get_post(&self, id: Uuid) -> StoreResult<Post>;

    async fn create_post(
        &self,
        title: String,
        content: String,
        comments_disabled: bool,
    ) -> StoreResult<Post>;

    /// Checks run in order: content length, post exists, comments enabled,
    /// parent exists and belongs to the same post.
    async fn create_comment(
        &self,
        post_id: Uuid,
        parent_id: Option<Uuid>,
        content: String,
    ) -> StoreResult<Comment>;

    /// Top-level comments of a post, oldest first. An unknown post yields an
    /// empty page.
    async fn get_comments_by_post_id(
        &self,
        post_id: Uuid,
        first: usize,
        after: Option<Uuid>,
    ) -> StoreResult<Vec<Comment>>;

    /// Direct replies to a comment, oldest first. Fails with `NotFound` when
    /// the parent comment does not exist.
    async fn get_comments_by_parent_id(
        &self,
        parent_id: Uuid,
        first: usize,
        after: Option<Uuid>,
    ) -> StoreResult<Vec<Comment>>;

    /// Removes the post and every comment on it, atomically.
    async fn delete_post(&self, id: Uuid) -> StoreResult<()>;

    /// Removes the comment and its whole subtree, atomically.
    async fn delete_comment(&self, id: Uuid) -> StoreResult<()>;
}

/// Postgres text columns cannot hold NUL, so neither backend accepts it.
fn reject_nul(field: &str, value: &str) -> StoreResult<()> {
    if value.contains('\0') {
        return Err(StoreError::Validation(format!(
            "{} must not contain NUL characters",
            field
        )));
    }
    Ok(())
}

pub(crate) fn validate_post(title: &str, content: &str) -> StoreResult<()> {
    reject_nul("title", title)?;
    reject_nul("content", content)
}

pub(crate) fn validate_content(content: &str) -> StoreResult<()> {
    if !crate::domain::comment::content_within_limit(content) {
        return Err(StoreError::Validation(format!(
            "comment must be at most {} characters",
            crate::domain::comment::MAX_COMMENT_CHARS
        )));
    }
    reject_nul("comment", content)
}
