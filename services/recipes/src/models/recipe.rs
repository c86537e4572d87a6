//! Recipe models for the recipe service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recipe entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Minutes
    pub prep_time: i32,
    pub rating: f64,
    /// Managed upload, relative to the public directory (`images/<key>`)
    pub img_name: Option<String>,
    /// Externally hosted image
    pub img_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A raw scalar as it arrives in a request body
///
/// JSON clients send numbers, form clients send strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FormValue {
    Number(serde_json::Number),
    Text(String),
}

/// Unvalidated recipe payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub prep_time: Option<FormValue>,
    pub rating: Option<FormValue>,
    pub img_url: Option<String>,
}

/// Validated mutable fields of a recipe
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeFields {
    pub title: String,
    pub description: String,
    pub prep_time: i32,
    pub rating: f64,
    pub img_url: Option<String>,
}

/// Outcome of an update: the new record and the image it displaced
#[derive(Debug, Clone)]
pub struct ReplacedRecipe {
    pub recipe: Recipe,
    pub previous_img_name: Option<String>,
}

/// Listing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListOrder {
    /// Insertion order
    #[default]
    Oldest,
    Newest,
}

/// Query parameters for recipe listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// `newest` or `oldest`
    pub sort: Option<String>,
}

impl ListQuery {
    /// Resolve the requested order
    pub fn order(&self) -> Result<ListOrder, String> {
        match self.sort.as_deref().map(str::trim) {
            None | Some("") | Some("oldest") => Ok(ListOrder::Oldest),
            Some("newest") => Ok(ListOrder::Newest),
            Some(other) => Err(format!(
                "Unknown sort order \"{}\"; expected \"newest\" or \"oldest\"",
                other
            )),
        }
    }
}
