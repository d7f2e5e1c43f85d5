//! Volatile backend: everything lives in one process behind a single lock.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::comment::Comment;
use crate::domain::page;
use crate::domain::post::Post;
use crate::store::{validate_content, validate_post, CommentStore, StoreError, StoreResult};

#[derive(Default)]
struct Inner {
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    // post id -> top-level comment ids, in insertion order
    top_level: HashMap<Uuid, Vec<Uuid>>,
    // parent comment id -> child ids, in insertion order
    children: HashMap<Uuid, Vec<Uuid>>,
}

impl Inner {
    /// Comments for the given ids, oldest first. The sort is stable, so
    /// equal timestamps keep insertion order.
    fn ordered(&self, ids: &[Uuid]) -> Vec<Comment> {
        let mut comments: Vec<Comment> = ids
            .iter()
            .filter_map(|id| self.comments.get(id).cloned())
            .collect();
        comments.sort_by_key(|comment| comment.created_at);
        comments
    }

    /// Every comment reachable from `roots` through the children index,
    /// roots included. Walks with an explicit stack, so thread depth is
    /// unbounded.
    fn subtree(&self, roots: &[Uuid]) -> Vec<Uuid> {
        let mut stack: Vec<Uuid> = roots.to_vec();
        let mut found = Vec::new();
        while let Some(id) = stack.pop() {
            if let Some(kids) = self.children.get(&id) {
                stack.extend(kids.iter().copied());
            }
            found.push(id);
        }
        found
    }

    fn remove_comments(&mut self, ids: &[Uuid]) {
        for id in ids {
            self.comments.remove(id);
            self.children.remove(id);
        }
    }
}

/// In-memory [`CommentStore`]. Each instance owns its own maps.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn get_posts(&self) -> StoreResult<Vec<Post>> {
        let inner = self.inner.lock().await;
        let mut posts: Vec<Post> = inner.posts.values().cloned().collect();
        posts.sort_by_key(|post| post.created_at);
        Ok(posts)
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Post> {
        let inner = self.inner.lock().await;
        inner
            .posts
            .get(&id)
            .cloned()
            .ok_or_else(StoreError::post_not_found)
    }

    async fn create_post(
        &self,
        title: String,
        content: String,
        comments_disabled: bool,
    ) -> StoreResult<Post> {
        validate_post(&title, &content)?;
        let post = Post::new(title, content, comments_disabled);
        let mut inner = self.inner.lock().await;
        inner.posts.insert(post.id, post.clone());
        tracing::debug!(post_id = %post.id, "created post");
        Ok(post)
    }

    async fn create_comment(
        &self,
        post_id: Uuid,
        parent_id: Option<Uuid>,
        content: String,
    ) -> StoreResult<Comment> {
        validate_content(&content)?;

        let mut inner = self.inner.lock().await;
        let post = inner
            .posts
            .get(&post_id)
            .ok_or_else(StoreError::post_not_found)?;
        if post.comments_disabled {
            return Err(StoreError::CommentsDisabled);
        }
        if let Some(parent_id) = parent_id {
            let parent = inner
                .comments
                .get(&parent_id)
                .ok_or_else(StoreError::comment_not_found)?;
            if parent.post_id != post_id {
                return Err(StoreError::Validation(
                    "parent comment belongs to another post".to_string(),
                ));
            }
        }

        let comment = Comment::new(post_id, parent_id, content);
        match parent_id {
            Some(parent_id) => inner.children.entry(parent_id).or_default().push(comment.id),
            None => inner.top_level.entry(post_id).or_default().push(comment.id),
        }
        inner.comments.insert(comment.id, comment.clone());
        tracing::debug!(comment_id = %comment.id, post_id = %post_id, "created comment");
        Ok(comment)
    }

    async fn get_comments_by_post_id(
        &self,
        post_id: Uuid,
        first: usize,
        after: Option<Uuid>,
    ) -> StoreResult<Vec<Comment>> {
        let inner = self.inner.lock().await;
        let ids = inner.top_level.get(&post_id).map(Vec::as_slice).unwrap_or(&[]);
        let ordered = inner.ordered(ids);
        Ok(page::window(ordered, first, after, |comment| comment.id))
    }

    async fn get_comments_by_parent_id(
        &self,
        parent_id: Uuid,
        first: usize,
        after: Option<Uuid>,
    ) -> StoreResult<Vec<Comment>> {
        let inner = self.inner.lock().await;
        if !inner.comments.contains_key(&parent_id) {
            return Err(StoreError::comment_not_found());
        }
        let ids = inner.children.get(&parent_id).map(Vec::as_slice).unwrap_or(&[]);
        let ordered = inner.ordered(ids);
        Ok(page::window(ordered, first, after, |comment| comment.id))
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.posts.contains_key(&id) {
            return Err(StoreError::post_not_found());
        }

        let roots = inner.top_level.remove(&id).unwrap_or_default();
        let doomed = inner.subtree(&roots);
        inner.remove_comments(&doomed);
        inner.posts.remove(&id);

        tracing::debug!(post_id = %id, comments = doomed.len(), "deleted post");
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        let (post_id, parent_id) = match inner.comments.get(&id) {
            Some(comment) => (comment.post_id, comment.parent_id),
            None => return Err(StoreError::comment_not_found()),
        };

        let doomed = inner.subtree(&[id]);
        inner.remove_comments(&doomed);

        let siblings = match parent_id {
            Some(parent_id) => inner.children.get_mut(&parent_id),
            None => inner.top_level.get_mut(&post_id),
        };
        if let Some(siblings) = siblings {
            siblings.retain(|sibling| *sibling != id);
        }

        tracing::debug!(comment_id = %id, removed = doomed.len(), "deleted comment subtree");
        Ok(())
    }
}
