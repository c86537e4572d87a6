//! API models for request and response payloads

pub mod recipe;

pub use recipe::{
    FormValue, ListOrder, ListQuery, Recipe, RecipeFields, RecipeInput, ReplacedRecipe,
};
