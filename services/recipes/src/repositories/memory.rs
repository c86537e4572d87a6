//! Process-lifetime recipe storage

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::RecipeRepository;
use crate::models::{ListOrder, Recipe, RecipeFields, ReplacedRecipe};

#[derive(Debug, Default)]
struct RecipeTable {
    /// Highest id handed out so far
    last_id: i64,
    /// Kept in insertion order
    recipes: Vec<Recipe>,
}

/// In-memory recipe repository
///
/// Id assignment and every mutation happen under one lock.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecipeRepository {
    table: Arc<Mutex<RecipeTable>>,
}

impl InMemoryRecipeRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecipeRepository for InMemoryRecipeRepository {
    async fn list(&self, order: ListOrder) -> Result<Vec<Recipe>> {
        let table = self.table.lock().await;
        let mut recipes = table.recipes.clone();
        if order == ListOrder::Newest {
            recipes.reverse();
        }
        Ok(recipes)
    }

    async fn get(&self, id: i64) -> Result<Option<Recipe>> {
        let table = self.table.lock().await;
        Ok(table.recipes.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, fields: &RecipeFields, img_name: Option<&str>) -> Result<Recipe> {
        let mut table = self.table.lock().await;
        table.last_id += 1;

        let now = Utc::now();
        let recipe = Recipe {
            id: table.last_id,
            title: fields.title.clone(),
            description: fields.description.clone(),
            prep_time: fields.prep_time,
            rating: fields.rating,
            img_name: img_name.map(str::to_string),
            img_url: fields.img_url.clone(),
            created_at: now,
            updated_at: now,
        };
        table.recipes.push(recipe.clone());

        Ok(recipe)
    }

    async fn update(
        &self,
        id: i64,
        fields: &RecipeFields,
        img_name: Option<&str>,
    ) -> Result<Option<ReplacedRecipe>> {
        let mut table = self.table.lock().await;
        let Some(recipe) = table.recipes.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        let previous_img_name = recipe.img_name.clone();
        recipe.title = fields.title.clone();
        recipe.description = fields.description.clone();
        recipe.prep_time = fields.prep_time;
        recipe.rating = fields.rating;
        recipe.img_url = fields.img_url.clone();
        if let Some(img_name) = img_name {
            recipe.img_name = Some(img_name.to_string());
        }
        recipe.updated_at = Utc::now();

        Ok(Some(ReplacedRecipe {
            recipe: recipe.clone(),
            previous_img_name,
        }))
    }

    async fn delete(&self, id: i64) -> Result<Option<Recipe>> {
        let mut table = self.table.lock().await;
        let position = table.recipes.iter().position(|r| r.id == id);
        Ok(position.map(|index| table.recipes.remove(index)))
    }

    async fn connection_state(&self) -> &'static str {
        "in-memory"
    }
}
