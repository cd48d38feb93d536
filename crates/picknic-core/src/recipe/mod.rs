//! Recipes: draft parsing and validation, and the transactional service
//! that stores a recipe with its ingredients and steps.

pub mod draft;
pub mod service;

pub use draft::{
    IngredientDraft, NewIngredient, NewRecipe, NewStep, RecipeDraft, RecipeDraftError,
    parse_recipe_toml,
};
pub use service::{RecipeWithDetails, create_recipe, delete_recipe, get_recipe_with_details, list_recipes};
