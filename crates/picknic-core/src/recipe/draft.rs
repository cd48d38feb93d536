//! Recipe drafts as submitted by people (TOML files, JSON bodies) and their
//! normalization into something that can be stored.
//!
//! Drafts are forgiving: blank tags, ingredients and steps are dropped,
//! quantities may be numbers or numeric strings, and a missing serving count
//! defaults to one. Only a missing title is rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading a recipe draft.
#[derive(Debug, Error)]
pub enum RecipeDraftError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("title is required")]
    MissingTitle,
}

/// A quantity as typed: `2`, `1.5` or `"1.5"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(f64),
    Text(String),
}

impl QuantityInput {
    /// The numeric value, if it is a finite number.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientDraft {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<QuantityInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A recipe as submitted.
///
/// ```toml
/// title = "Veggie pasta"
/// servings = 4
/// tags = ["quick", "vegetarian"]
/// steps = ["Boil pasta.", "Stir in sauce."]
///
/// [[ingredients]]
/// name = "Pasta"
/// quantity = 500
/// unit = "g"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<IngredientDraft>,
    #[serde(default)]
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewIngredient {
    /// 1-based position among the kept ingredients.
    pub position: i32,
    pub name: String,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStep {
    /// 1-based position among the kept steps.
    pub position: i32,
    pub instruction: String,
}

/// A validated recipe ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecipe {
    pub title: String,
    pub description: Option<String>,
    pub servings: i32,
    pub tags: Vec<String>,
    pub ingredients: Vec<NewIngredient>,
    pub steps: Vec<NewStep>,
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn positions<T>(items: impl Iterator<Item = T>) -> impl Iterator<Item = (i32, T)> {
    (1..).zip(items)
}

impl RecipeDraft {
    /// Validate and clean up the draft.
    pub fn normalize(&self) -> Result<NewRecipe, RecipeDraftError> {
        let title = non_blank(&self.title).ok_or(RecipeDraftError::MissingTitle)?;

        let servings = match self.servings {
            Some(s) if s.is_finite() && s > 0.0 => (s.floor() as i32).max(1),
            _ => 1,
        };

        let tags = self.tags.iter().filter_map(|t| non_blank(t)).collect();

        let ingredients = positions(self.ingredients.iter().filter_map(|ingredient| {
            let name = non_blank(&ingredient.name)?;
            Some((
                name,
                ingredient.quantity.as_ref().and_then(QuantityInput::value),
                ingredient.unit.as_deref().and_then(non_blank),
            ))
        }))
        .map(|(position, (name, quantity, unit))| NewIngredient {
            position,
            name,
            quantity,
            unit,
        })
        .collect();

        let steps = positions(self.steps.iter().filter_map(|s| non_blank(s)))
            .map(|(position, instruction)| NewStep {
                position,
                instruction,
            })
            .collect();

        Ok(NewRecipe {
            title,
            description: self.description.as_deref().and_then(non_blank),
            servings,
            tags,
            ingredients,
            steps,
        })
    }
}

/// Parse and validate a recipe TOML file.
pub fn parse_recipe_toml(content: &str) -> Result<NewRecipe, RecipeDraftError> {
    let draft: RecipeDraft = toml::from_str(content)?;
    draft.normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASTA: &str = r#"
title = "  Veggie pasta "
description = "A quick pasta."
servings = 4
tags = ["quick", "  ", " vegetarian "]
steps = ["Boil pasta.", "   ", "Stir in sauce."]

[[ingredients]]
name = "Pasta"
quantity = 500
unit = "g"

[[ingredients]]
name = "   "
quantity = 1

[[ingredients]]
name = "Tomato sauce"
quantity = "2"
unit = "cup"

[[ingredients]]
name = "Salt"
unit = "  "
"#;

    #[test]
    fn parses_and_normalizes_a_recipe_file() {
        let recipe = parse_recipe_toml(PASTA).unwrap();

        assert_eq!(recipe.title, "Veggie pasta");
        assert_eq!(recipe.description.as_deref(), Some("A quick pasta."));
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.tags, vec!["quick", "vegetarian"]);

        assert_eq!(
            recipe.ingredients,
            vec![
                NewIngredient {
                    position: 1,
                    name: "Pasta".into(),
                    quantity: Some(500.0),
                    unit: Some("g".into()),
                },
                NewIngredient {
                    position: 2,
                    name: "Tomato sauce".into(),
                    quantity: Some(2.0),
                    unit: Some("cup".into()),
                },
                NewIngredient {
                    position: 3,
                    name: "Salt".into(),
                    quantity: None,
                    unit: None,
                },
            ]
        );

        let steps: Vec<(i32, &str)> = recipe
            .steps
            .iter()
            .map(|s| (s.position, s.instruction.as_str()))
            .collect();
        assert_eq!(steps, vec![(1, "Boil pasta."), (2, "Stir in sauce.")]);
    }

    #[test]
    fn missing_title_is_rejected() {
        let err = parse_recipe_toml("title = '   '").unwrap_err();
        assert!(matches!(err, RecipeDraftError::MissingTitle));

        let err = RecipeDraft::default().normalize().unwrap_err();
        assert!(matches!(err, RecipeDraftError::MissingTitle));
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = parse_recipe_toml("title = ").unwrap_err();
        assert!(matches!(err, RecipeDraftError::TomlError(_)));
    }

    #[test]
    fn servings_default_and_floor() {
        let mut draft = RecipeDraft {
            title: "Soup".into(),
            ..Default::default()
        };
        assert_eq!(draft.normalize().unwrap().servings, 1);

        draft.servings = Some(3.7);
        assert_eq!(draft.normalize().unwrap().servings, 3);

        draft.servings = Some(-2.0);
        assert_eq!(draft.normalize().unwrap().servings, 1);

        draft.servings = Some(0.5);
        assert_eq!(draft.normalize().unwrap().servings, 1);
    }

    #[test]
    fn unparseable_quantities_become_unknown() {
        assert_eq!(QuantityInput::Text("a pinch".into()).value(), None);
        assert_eq!(QuantityInput::Text(" 1.25 ".into()).value(), Some(1.25));
        assert_eq!(QuantityInput::Text("inf".into()).value(), None);
        assert_eq!(QuantityInput::Number(f64::NAN).value(), None);
    }

    #[test]
    fn json_drafts_accept_mixed_quantity_types() {
        let draft: RecipeDraft = serde_json::from_value(serde_json::json!({
            "title": "Pancakes",
            "ingredients": [
                { "name": "Flour", "quantity": 200, "unit": "g" },
                { "name": "Milk", "quantity": "0.5", "unit": "l" },
                { "name": "Sugar", "quantity": null }
            ]
        }))
        .unwrap();

        let recipe = draft.normalize().unwrap();
        let quantities: Vec<Option<f64>> = recipe.ingredients.iter().map(|i| i.quantity).collect();
        assert_eq!(quantities, vec![Some(200.0), Some(0.5), None]);
    }
}
