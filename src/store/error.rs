/// Failures surfaced by every [`CommentStore`](super::CommentStore) operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A post or comment id did not resolve.
    #[error("{0} not found")]
    NotFound(String),

    /// Input was rejected before touching the store.
    #[error("validation error: {0}")]
    Validation(String),

    /// The owning post does not accept comments.
    #[error("comments are disabled on this post")]
    CommentsDisabled,

    /// The durable backend failed; the transaction was rolled back.
    #[error("store failure: {0}")]
    StoreFailure(String),
}

impl StoreError {
    pub fn post_not_found() -> Self {
        Self::NotFound("post".to_string())
    }

    pub fn comment_not_found() -> Self {
        Self::NotFound("comment".to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::StoreFailure(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
