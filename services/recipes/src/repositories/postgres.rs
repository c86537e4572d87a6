//! PostgreSQL recipe repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{error, info};

use super::RecipeRepository;
use crate::models::{ListOrder, Recipe, RecipeFields, ReplacedRecipe};

/// Statements that bring an empty database up to date
pub const SCHEMA: [&str; 1] = [r#"
    CREATE TABLE IF NOT EXISTS recipes (
        id BIGSERIAL PRIMARY KEY,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        prep_time INTEGER NOT NULL CHECK (prep_time > 0),
        rating DOUBLE PRECISION NOT NULL CHECK (rating >= 0 AND rating <= 5),
        img_name TEXT,
        img_url TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#];

fn recipe_from_row(row: &PgRow) -> Recipe {
    Recipe {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        prep_time: row.get("prep_time"),
        rating: row.get("rating"),
        img_name: row.get("img_name"),
        img_url: row.get("img_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Recipe repository backed by the `recipes` table
#[derive(Clone)]
pub struct PgRecipeRepository {
    pool: PgPool,
}

impl PgRecipeRepository {
    /// Create a new recipe repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `recipes` table if it is missing
    pub async fn ensure_schema(&self) -> Result<()> {
        common::database::apply_schema(&self.pool, &SCHEMA).await?;
        info!("Recipe schema ready");
        Ok(())
    }
}

#[async_trait]
impl RecipeRepository for PgRecipeRepository {
    async fn list(&self, order: ListOrder) -> Result<Vec<Recipe>> {
        let query = match order {
            ListOrder::Oldest => {
                r#"
                SELECT id, title, description, prep_time, rating, img_name, img_url,
                       created_at, updated_at
                FROM recipes
                ORDER BY id ASC
                "#
            }
            ListOrder::Newest => {
                r#"
                SELECT id, title, description, prep_time, rating, img_name, img_url,
                       created_at, updated_at
                FROM recipes
                ORDER BY id DESC
                "#
            }
        };

        let rows = sqlx::query(query).fetch_all(&self.pool).await?;

        Ok(rows.iter().map(recipe_from_row).collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Recipe>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, prep_time, rating, img_name, img_url,
                   created_at, updated_at
            FROM recipes
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(recipe_from_row))
    }

    async fn create(&self, fields: &RecipeFields, img_name: Option<&str>) -> Result<Recipe> {
        let row = sqlx::query(
            r#"
            INSERT INTO recipes (title, description, prep_time, rating, img_name, img_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, prep_time, rating, img_name, img_url,
                      created_at, updated_at
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.prep_time)
        .bind(fields.rating)
        .bind(img_name)
        .bind(&fields.img_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(recipe_from_row(&row))
    }

    async fn update(
        &self,
        id: i64,
        fields: &RecipeFields,
        img_name: Option<&str>,
    ) -> Result<Option<ReplacedRecipe>> {
        // The CTE reads the old image under the same row lock as the update
        let row = sqlx::query(
            r#"
            WITH previous AS (
                SELECT id, img_name FROM recipes WHERE id = $1 FOR UPDATE
            )
            UPDATE recipes r
            SET title = $2,
                description = $3,
                prep_time = $4,
                rating = $5,
                img_url = $6,
                img_name = COALESCE($7, r.img_name),
                updated_at = NOW()
            FROM previous
            WHERE r.id = previous.id
            RETURNING r.id, r.title, r.description, r.prep_time, r.rating, r.img_name,
                      r.img_url, r.created_at, r.updated_at,
                      previous.img_name AS previous_img_name
            "#,
        )
        .bind(id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.prep_time)
        .bind(fields.rating)
        .bind(&fields.img_url)
        .bind(img_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ReplacedRecipe {
            recipe: recipe_from_row(&row),
            previous_img_name: row.get("previous_img_name"),
        }))
    }

    async fn delete(&self, id: i64) -> Result<Option<Recipe>> {
        let row = sqlx::query(
            r#"
            DELETE FROM recipes
            WHERE id = $1
            RETURNING id, title, description, prep_time, rating, img_name, img_url,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(recipe_from_row))
    }

    async fn connection_state(&self) -> &'static str {
        match common::database::health_check(&self.pool).await {
            Ok(_) => "connected",
            Err(e) if e.is_unavailable() => {
                error!("Database unreachable: {}", e);
                "disconnected"
            }
            Err(e) => {
                error!("Database health check failed: {}", e);
                "degraded"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::database::{DatabaseConfig, init_pool};

    fn fields(title: &str) -> RecipeFields {
        RecipeFields {
            title: title.to_string(),
            description: "stored in postgres".to_string(),
            prep_time: 30,
            rating: 4.5,
            img_url: Some("https://example.com/dish.jpg".to_string()),
        }
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn test_postgres_roundtrip() -> Result<()> {
        let pool = init_pool(&DatabaseConfig::from_env()?).await?;
        let repo = PgRecipeRepository::new(pool);
        repo.ensure_schema().await?;
        assert_eq!(repo.connection_state().await, "connected");

        let created = repo
            .create(&fields("Lasagne"), Some("images/1-000000001.jpg"))
            .await?;
        assert_eq!(repo.get(created.id).await?, Some(created.clone()));

        let replaced = repo
            .update(created.id, &fields("Lasagne al forno"), Some("images/2-000000002.jpg"))
            .await?
            .expect("recipe exists");
        assert_eq!(replaced.recipe.id, created.id);
        assert_eq!(
            replaced.previous_img_name.as_deref(),
            Some("images/1-000000001.jpg")
        );

        let deleted = repo.delete(created.id).await?.expect("recipe exists");
        assert_eq!(deleted.title, "Lasagne al forno");
        assert!(repo.get(created.id).await?.is_none());

        let next = repo.create(&fields("Risotto"), None).await?;
        assert!(next.id > created.id);
        repo.delete(next.id).await?;
        Ok(())
    }
}
