//! Meal plan submissions (JSON bodies, TOML files) and their validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use picknic_db::models::MealType;

use super::MealPlanError;
use crate::week::{parse_date, week_start};

/// One scheduled meal as submitted. Fields stay loosely typed so a single
/// bad entry can be skipped instead of failing the whole submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub meal_type: String,
    #[serde(default)]
    pub recipe_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings_override: Option<f64>,
}

/// A week's plan as submitted.
///
/// ```toml
/// week_start = "2026-02-16"
///
/// [[entries]]
/// date = "2026-02-16"
/// meal_type = "dinner"
/// recipe_id = "6f1c0e7e-..."
/// servings_override = 4
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealPlanDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start: Option<String>,
    #[serde(default)]
    pub entries: Vec<EntryDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub meal_type: MealType,
    pub recipe_id: Uuid,
    pub servings_override: Option<i32>,
}

/// A validated plan: its week's Monday plus the entries to upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMealPlan {
    pub week_start: NaiveDate,
    pub entries: Vec<NewEntry>,
}

impl NewMealPlan {
    /// Distinct recipe IDs referenced by the entries, in first-seen order.
    pub fn recipe_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::new();
        for entry in &self.entries {
            if !ids.contains(&entry.recipe_id) {
                ids.push(entry.recipe_id);
            }
        }
        ids
    }
}

impl EntryDraft {
    /// Validate one entry. Returns `None` for an unparseable date, unknown
    /// meal type or malformed recipe ID. Overrides are floored; anything
    /// below one serving means "no override".
    pub fn normalize(&self) -> Option<NewEntry> {
        let date = parse_date(&self.date)?;
        let meal_type = self.meal_type.parse::<MealType>().ok()?;
        let recipe_id = Uuid::parse_str(self.recipe_id.trim()).ok()?;
        let servings_override = self
            .servings_override
            .filter(|s| s.is_finite() && *s >= 1.0)
            .map(|s| s.floor() as i32);

        Some(NewEntry {
            date,
            meal_type,
            recipe_id,
            servings_override,
        })
    }
}

impl MealPlanDraft {
    /// Keep the valid entries and settle the week.
    ///
    /// The week is the one containing `week_start` when it parses, otherwise
    /// the one containing the first valid entry.
    pub fn normalize(&self) -> Result<NewMealPlan, MealPlanError> {
        let entries: Vec<NewEntry> = self.entries.iter().filter_map(EntryDraft::normalize).collect();
        let first = entries.first().ok_or(MealPlanError::NoEntries)?;

        let anchor = self
            .week_start
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(first.date);

        Ok(NewMealPlan {
            week_start: week_start(anchor),
            entries,
        })
    }
}

/// Parse a meal plan TOML file.
pub fn parse_meal_plan_toml(content: &str) -> Result<MealPlanDraft, toml::de::Error> {
    toml::from_str(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECIPE: &str = "0b6f0f64-7f0e-4a8e-9a52-1f0e9f1c2d3a";

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn draft_entry(date: &str, meal_type: &str, servings: Option<f64>) -> EntryDraft {
        EntryDraft {
            date: date.into(),
            meal_type: meal_type.into(),
            recipe_id: RECIPE.into(),
            servings_override: servings,
        }
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let draft = MealPlanDraft {
            week_start: None,
            entries: vec![
                draft_entry("2026-02-18", "dinner", Some(4.0)),
                draft_entry("not a date", "dinner", None),
                draft_entry("2026-02-19", "elevenses", None),
                EntryDraft {
                    recipe_id: "".into(),
                    ..draft_entry("2026-02-19", "lunch", None)
                },
            ],
        };

        let plan = draft.normalize().unwrap();
        assert_eq!(plan.entries.len(), 1);
        assert_eq!(plan.entries[0].meal_type, MealType::Dinner);
        assert_eq!(plan.entries[0].servings_override, Some(4));
    }

    #[test]
    fn no_valid_entries_is_an_error() {
        let draft = MealPlanDraft {
            week_start: Some("2026-02-16".into()),
            entries: vec![draft_entry("2026-02-18", "brunch", None)],
        };
        assert_eq!(draft.normalize().unwrap_err(), MealPlanError::NoEntries);
    }

    #[test]
    fn week_comes_from_week_start_or_first_entry() {
        let mut draft = MealPlanDraft {
            week_start: None,
            entries: vec![draft_entry("2026-02-22", "LUNCH", None)],
        };
        assert_eq!(draft.normalize().unwrap().week_start, date("2026-02-16"));

        draft.week_start = Some("2026-03-04".into());
        assert_eq!(draft.normalize().unwrap().week_start, date("2026-03-02"));

        draft.week_start = Some("whenever".into());
        assert_eq!(draft.normalize().unwrap().week_start, date("2026-02-16"));
    }

    #[test]
    fn overrides_are_floored_and_small_ones_dropped() {
        let entry = |s| draft_entry("2026-02-18", "dinner", Some(s)).normalize().unwrap();
        assert_eq!(entry(2.9).servings_override, Some(2));
        assert_eq!(entry(0.5).servings_override, None);
        assert_eq!(entry(-1.0).servings_override, None);
    }

    #[test]
    fn recipe_ids_are_distinct() {
        let draft = MealPlanDraft {
            week_start: None,
            entries: vec![
                draft_entry("2026-02-16", "dinner", None),
                draft_entry("2026-02-17", "dinner", None),
            ],
        };
        let plan = draft.normalize().unwrap();
        assert_eq!(plan.recipe_ids(), vec![Uuid::parse_str(RECIPE).unwrap()]);
    }

    #[test]
    fn parses_toml_plan_files() {
        let content = format!(
            r#"
week_start = "2026-02-16"

[[entries]]
date = "2026-02-16"
meal_type = "dinner"
recipe_id = "{RECIPE}"
servings_override = 4
"#
        );
        let draft = parse_meal_plan_toml(&content).unwrap();
        assert_eq!(draft.entries.len(), 1);
        assert_eq!(draft.entries[0].servings_override, Some(4.0));
    }
}
