//! Repositories for recipe storage
//!
//! Handlers only see [`RecipeRepository`]; the in-memory and PostgreSQL
//! backends are interchangeable behind it.

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ListOrder, Recipe, RecipeFields, ReplacedRecipe};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRecipeRepository;
pub use postgres::PgRecipeRepository;

/// Storage operations for recipes
///
/// Identifiers are assigned by the backend, strictly increase and are
/// never reused, even after deletions.
#[async_trait]
pub trait RecipeRepository: Send + Sync {
    /// All recipes in the requested order
    async fn list(&self, order: ListOrder) -> Result<Vec<Recipe>>;

    /// A recipe by id, `None` if absent
    async fn get(&self, id: i64) -> Result<Option<Recipe>>;

    /// Insert a recipe and return it with its new id
    async fn create(&self, fields: &RecipeFields, img_name: Option<&str>) -> Result<Recipe>;

    /// Replace the mutable fields of a recipe
    ///
    /// `img_name` replaces the stored managed image when `Some` and keeps it
    /// otherwise. Returns `None` if the recipe does not exist.
    async fn update(
        &self,
        id: i64,
        fields: &RecipeFields,
        img_name: Option<&str>,
    ) -> Result<Option<ReplacedRecipe>>;

    /// Remove a recipe and return it, `None` if absent
    async fn delete(&self, id: i64) -> Result<Option<Recipe>>;

    /// Short label for the health endpoint
    async fn connection_state(&self) -> &'static str;
}
