//! Application state shared across handlers

use std::sync::Arc;

use crate::{repositories::RecipeRepository, upload::ImageStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn RecipeRepository>,
    pub images: Arc<ImageStore>,
}

impl AppState {
    pub fn new(repository: Arc<dyn RecipeRepository>, images: ImageStore) -> Self {
        Self {
            repository,
            images: Arc::new(images),
        }
    }
}
