//! Cursor windowing over an ordered comment collection.
//!
//! The cursor is a comment id. It is resolved by identity against the ordered
//! collection: the window starts right after the matching element, or at the
//! beginning when the cursor is absent or names no element.

use uuid::Uuid;

use crate::domain::comment::Comment;

/// Index at which a page starts, given the ordered ids and an optional cursor.
pub fn start_index<I>(ids: I, after: Option<Uuid>) -> usize
where
    I: IntoIterator<Item = Uuid>,
{
    let Some(after) = after else {
        return 0;
    };
    ids.into_iter()
        .position(|id| id == after)
        .map(|pos| pos + 1)
        .unwrap_or(0)
}

/// Cut a window of at most `first` items out of an already ordered collection.
pub fn window<T, F>(ordered: Vec<T>, first: usize, after: Option<Uuid>, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> Uuid,
{
    let start = start_index(ordered.iter().map(&id_of), after);
    ordered.into_iter().skip(start).take(first).collect()
}

/// A page of comments together with the request that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Comment>,
    pub requested: usize,
}

impl Page {
    pub fn new(items: Vec<Comment>, requested: usize) -> Self {
        Self { items, requested }
    }

    /// A full page means there may be more; a short page is the end.
    pub fn has_next_page(&self) -> bool {
        self.requested > 0 && self.items.len() == self.requested
    }

    pub fn end_cursor(&self) -> Option<Uuid> {
        self.items.last().map(|comment| comment.id)
    }

    pub fn next_cursor(&self) -> Option<Uuid> {
        if self.has_next_page() {
            self.end_cursor()
        } else {
            None
        }
    }
}
