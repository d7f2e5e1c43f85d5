//! Durable backend on Postgres.
//!
//! Multi-statement operations run in one transaction. Returning early with an
//! error drops the transaction, which rolls it back.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use uuid::Uuid;

use crate::domain::comment::Comment;
use crate::domain::post::Post;
use crate::infra::db::Db;
use crate::store::{validate_content, validate_post, CommentStore, StoreError, StoreResult};

#[derive(Clone)]
pub struct PgStore {
    db: Db,
}

impl PgStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        comments_disabled: row.get("comments_disabled"),
        created_at: row.get("created_at"),
        comments: Vec::new(),
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        post_id: row.get("post_id"),
        parent_id: row.get("parent_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        children: Vec::new(),
    }
}

fn limit(first: usize) -> i64 {
    i64::try_from(first).unwrap_or(i64::MAX)
}

#[async_trait]
impl CommentStore for PgStore {
    async fn get_posts(&self) -> StoreResult<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT id, title, content, comments_disabled, created_at \
             FROM posts \
             ORDER BY created_at, id",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    async fn get_post(&self, id: Uuid) -> StoreResult<Post> {
        let row = sqlx::query(
            "SELECT id, title, content, comments_disabled, created_at \
             FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.as_ref()
            .map(post_from_row)
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
        sqlx::query(
            "INSERT INTO posts (id, title, content, comments_disabled, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.comments_disabled)
        .bind(post.created_at)
        .execute(self.db.pool())
        .await?;

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

        let mut tx = self.db.pool().begin().await?;

        let comments_disabled: Option<bool> = sqlx::query_scalar(
            "SELECT comments_disabled FROM posts WHERE id = $1 FOR SHARE",
        )
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        match comments_disabled {
            None => {
                tx.rollback().await?;
                return Err(StoreError::post_not_found());
            }
            Some(true) => {
                tx.rollback().await?;
                return Err(StoreError::CommentsDisabled);
            }
            Some(false) => {}
        }

        if let Some(parent_id) = parent_id {
            let parent_post: Option<Uuid> = sqlx::query_scalar(
                "SELECT post_id FROM comments WHERE id = $1 FOR SHARE",
            )
            .bind(parent_id)
            .fetch_optional(&mut *tx)
            .await?;

            match parent_post {
                None => {
                    tx.rollback().await?;
                    return Err(StoreError::comment_not_found());
                }
                Some(owner) if owner != post_id => {
                    tx.rollback().await?;
                    return Err(StoreError::Validation(
                        "parent comment belongs to another post".to_string(),
                    ));
                }
                Some(_) => {}
            }
        }

        let comment = Comment::new(post_id, parent_id, content);
        sqlx::query(
            "INSERT INTO comments (id, post_id, parent_id, content, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id)
        .bind(comment.post_id)
        .bind(comment.parent_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(parent_id) = parent_id {
            sqlx::query("INSERT INTO pairs (parent_id, child_id) VALUES ($1, $2)")
                .bind(parent_id)
                .bind(comment.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(comment_id = %comment.id, post_id = %post_id, "created comment");
        Ok(comment)
    }

    async fn get_comments_by_post_id(
        &self,
        post_id: Uuid,
        first: usize,
        after: Option<Uuid>,
    ) -> StoreResult<Vec<Comment>> {
        let rows = sqlx::query(
            "WITH ordered AS ( \
                SELECT id, post_id, parent_id, content, created_at, \
                       row_number() OVER (ORDER BY created_at, seq) AS position \
                FROM comments \
                WHERE post_id = $1 AND parent_id IS NULL \
             ) \
             SELECT id, post_id, parent_id, content, created_at \
             FROM ordered \
             WHERE position > COALESCE((SELECT position FROM ordered WHERE id = $2), 0) \
             ORDER BY position \
             LIMIT $3",
        )
        .bind(post_id)
        .bind(after)
        .bind(limit(first))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn get_comments_by_parent_id(
        &self,
        parent_id: Uuid,
        first: usize,
        after: Option<Uuid>,
    ) -> StoreResult<Vec<Comment>> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)")
                .bind(parent_id)
                .fetch_one(self.db.pool())
                .await?;
        if !exists {
            return Err(StoreError::comment_not_found());
        }

        let rows = sqlx::query(
            "WITH ordered AS ( \
                SELECT c.id, c.post_id, c.parent_id, c.content, c.created_at, \
                       row_number() OVER (ORDER BY c.created_at, c.seq) AS position \
                FROM pairs p \
                JOIN comments c ON c.id = p.child_id \
                WHERE p.parent_id = $1 \
             ) \
             SELECT id, post_id, parent_id, content, created_at \
             FROM ordered \
             WHERE position > COALESCE((SELECT position FROM ordered WHERE id = $2), 0) \
             ORDER BY position \
             LIMIT $3",
        )
        .bind(parent_id)
        .bind(after)
        .bind(limit(first))
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(comment_from_row).collect())
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.db.pool().begin().await?;

        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if found.is_none() {
            tx.rollback().await?;
            return Err(StoreError::post_not_found());
        }

        sqlx::query(
            "DELETE FROM pairs \
             WHERE child_id IN (SELECT id FROM comments WHERE post_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let removed = sqlx::query("DELETE FROM comments WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(post_id = %id, comments = removed.rows_affected(), "deleted post");
        Ok(())
    }

    async fn delete_comment(&self, id: Uuid) -> StoreResult<()> {
        let mut tx = self.db.pool().begin().await?;

        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM comments WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            tx.rollback().await?;
            return Err(StoreError::comment_not_found());
        }

        // Collect the subtree with an explicit stack, locking each row so no
        // reply can be attached to a node that is about to disappear.
        let mut stack = vec![id];
        let mut doomed = Vec::new();
        while let Some(current) = stack.pop() {
            let children: Vec<Uuid> = sqlx::query_scalar(
                "SELECT c.id FROM pairs p \
                 JOIN comments c ON c.id = p.child_id \
                 WHERE p.parent_id = $1 \
                 FOR UPDATE OF c",
            )
            .bind(current)
            .fetch_all(&mut *tx)
            .await?;
            stack.extend(children);
            doomed.push(current);
        }

        // Also drops the (parent, id) edge, which repairs the parent's child list.
        sqlx::query("DELETE FROM pairs WHERE parent_id = ANY($1) OR child_id = ANY($1)")
            .bind(&doomed)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM comments WHERE id = ANY($1)")
            .bind(&doomed)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(comment_id = %id, removed = doomed.len(), "deleted comment subtree");
        Ok(())
    }
}
