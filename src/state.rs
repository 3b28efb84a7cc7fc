use sqlx::SqlitePool;
use std::sync::Arc;

use crate::{
    models::{SnippetModel, UserModel},
    template::{Renderer, TemplateFuncs},
};

#[derive(Clone)]
pub struct AppState {
    pub snippets: SnippetModel,
    pub users: UserModel,
    pub renderer: Arc<Renderer>,
}

impl AppState {
    pub fn new(pool: SqlitePool, funcs: TemplateFuncs) -> Self {
        Self {
            snippets: SnippetModel::new(pool.clone()),
            users: UserModel::new(pool),
            renderer: Arc::new(Renderer::new(funcs)),
        }
    }
}
