use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::comment::Comment;
use crate::domain::page::Page;
use crate::domain::post::Post;
use crate::http::AppError;
use crate::store::StoreError;
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct PageQuery {
    pub first: Option<usize>,
    pub after: Option<String>,
}

impl PageQuery {
    fn first(&self, state: &AppState) -> usize {
        self.first
            .unwrap_or(state.default_page_size)
            .min(state.max_page_size)
    }

    /// A cursor that is not a comment id cannot match anything, so it is
    /// treated like any other unknown cursor.
    fn after(&self) -> Option<Uuid> {
        self.after
            .as_deref()
            .and_then(|raw| Uuid::parse_str(raw).ok())
    }
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

impl From<Page> for ListResponse<Comment> {
    fn from(page: Page) -> Self {
        let next_cursor = page.next_cursor().map(|id| id.to_string());
        Self {
            items: page.items,
            next_cursor,
        }
    }
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<Post>>, AppError> {
    let posts = state.store.get_posts().await?;
    Ok(Json(posts))
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub comments_disabled: bool,
}

pub async fn create_post(
    State(state): State<AppState>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<Post>, AppError> {
    if payload.title.trim().is_empty() {
        return Err(AppError::bad_request("title is required"));
    }

    let post = state
        .store
        .create_post(payload.title, payload.content, payload.comments_disabled)
        .await?;
    tracing::info!(post_id = %post.id, "post created");

    Ok(Json(post))
}

/// The post together with its first page of top-level comments, each carrying
/// the first page of its direct replies.
pub async fn get_post(
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<Post>, AppError> {
    let mut post = state.store.get_post(id).await?;
    post.comments = state
        .store
        .get_comments_by_post_id(id, query.first(&state), query.after())
        .await?;

    for comment in post.comments.iter_mut() {
        comment.children = match state
            .store
            .get_comments_by_parent_id(comment.id, state.default_page_size, None)
            .await
        {
            Ok(children) => children,
            // deleted since the top-level page was read
            Err(StoreError::NotFound(_)) => Vec::new(),
            Err(err) => return Err(err.into()),
        };
    }

    Ok(Json(post))
}

pub async fn delete_post(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.store.delete_post(id).await?;
    tracing::info!(post_id = %id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_post_comments(
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<Comment>>, AppError> {
    let first = query.first(&state);
    let items = state
        .store
        .get_comments_by_post_id(id, first, query.after())
        .await?;

    Ok(Json(Page::new(items, first).into()))
}

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub parent_id: Option<Uuid>,
    pub content: String,
}

pub async fn create_comment(
    Path(post_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, AppError> {
    let comment = state
        .store
        .create_comment(post_id, payload.parent_id, payload.content)
        .await?;
    tracing::info!(comment_id = %comment.id, post_id = %post_id, "comment created");

    Ok(Json(comment))
}

pub async fn list_comment_children(
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
    State(state): State<AppState>,
) -> Result<Json<ListResponse<Comment>>, AppError> {
    let first = query.first(&state);
    let items = state
        .store
        .get_comments_by_parent_id(id, first, query.after())
        .await?;

    Ok(Json(Page::new(items, first).into()))
}

pub async fn delete_comment(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    state.store.delete_comment(id).await?;
    tracing::info!(comment_id = %id, "comment subtree deleted");
    Ok(StatusCode::NO_CONTENT)
}
