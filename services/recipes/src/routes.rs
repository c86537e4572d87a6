//! Recipe service routes

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde_json::json;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::{
    error::{ApiError, ApiResult, internal},
    models::{ListQuery, Recipe, RecipeInput, ReplacedRecipe},
    state::AppState,
    submission::RecipeSubmission,
    validation::validate_recipe,
};

/// Room for the text fields and multipart framing around an image
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the router for the recipe service
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.images.max_bytes() + FORM_OVERHEAD_BYTES;
    let images_dir = state.images.root().to_path_buf();

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/api/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .nest_service("/images", ServeDir::new(images_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::MalformedId(raw.to_string()))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "database": state.repository.connection_state().await,
    }))
}

/// List all recipes
pub async fn list_recipes(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let order = query.order().map_err(ApiError::Validation)?;
    let recipes = state
        .repository
        .list(order)
        .await
        .map_err(internal("Failed to list recipes"))?;

    Ok(Json(recipes))
}

/// Get a recipe by ID
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let recipe = state
        .repository
        .get(id)
        .await
        .map_err(internal("Failed to get recipe"))?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(recipe))
}

/// Create a new recipe, optionally with an uploaded image
pub async fn create_recipe(
    State(state): State<AppState>,
    submission: RecipeSubmission,
) -> ApiResult<impl IntoResponse> {
    let RecipeSubmission { input, image } = submission;
    let img_name = image.as_ref().map(|image| image.img_name.as_str());

    let result = insert(&state, &input, img_name).await;
    let recipe = state.images.settle(image.as_ref(), result).await?;

    info!("Created recipe {}", recipe.id);
    Ok((StatusCode::CREATED, Json(recipe)))
}

async fn insert(
    state: &AppState,
    input: &RecipeInput,
    img_name: Option<&str>,
) -> ApiResult<Recipe> {
    let fields = validate_recipe(input).map_err(ApiError::Validation)?;

    state
        .repository
        .create(&fields, img_name)
        .await
        .map_err(internal("Failed to create recipe"))
}

/// Replace the mutable fields of a recipe
///
/// A new image replaces the old one, whose file is removed once the
/// update is stored.
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    submission: RecipeSubmission,
) -> ApiResult<impl IntoResponse> {
    let RecipeSubmission { input, image } = submission;
    let img_name = image.as_ref().map(|image| image.img_name.as_str());

    let result = replace(&state, &id, &input, img_name).await;
    let replaced = state.images.settle(image.as_ref(), result).await?;

    if image.is_some() {
        if let Some(previous) = replaced.previous_img_name.as_deref() {
            state.images.remove(previous).await;
        }
    }

    info!("Updated recipe {}", replaced.recipe.id);
    Ok(Json(replaced.recipe))
}

async fn replace(
    state: &AppState,
    raw_id: &str,
    input: &RecipeInput,
    img_name: Option<&str>,
) -> ApiResult<ReplacedRecipe> {
    let id = parse_id(raw_id)?;
    let fields = validate_recipe(input).map_err(ApiError::Validation)?;

    state
        .repository
        .update(id, &fields, img_name)
        .await
        .map_err(internal("Failed to update recipe"))?
        .ok_or(ApiError::NotFound)
}

/// Delete a recipe and its managed image
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_id(&id)?;
    let recipe = state
        .repository
        .delete(id)
        .await
        .map_err(internal("Failed to delete recipe"))?
        .ok_or(ApiError::NotFound)?;

    if let Some(img_name) = recipe.img_name.as_deref() {
        state.images.remove(img_name).await;
    }

    info!("Deleted recipe {}", recipe.id);
    Ok(Json(recipe))
}
