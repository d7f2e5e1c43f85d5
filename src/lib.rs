pub mod config;
pub mod domain;
pub mod http;
pub mod infra;
pub mod store;

use std::sync::Arc;

use crate::store::CommentStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CommentStore>,
    pub default_page_size: usize,
    pub max_page_size: usize,
}
