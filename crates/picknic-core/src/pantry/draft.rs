//! Pantry submissions and their validation.
//!
//! Creating stock is strict (name, unit and a positive quantity are all
//! required); editing stock is lenient and simply ignores fields that do
//! not make sense.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::recipe::draft::QuantityInput;
use crate::week::parse_date;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PantryDraftError {
    #[error("ingredient_name is required")]
    MissingName,

    #[error("unit is required")]
    MissingUnit,

    #[error("quantity must be a number greater than 0")]
    InvalidQuantity,
}

/// New or replacement stock for one ingredient and unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PantryDraft {
    #[serde(default)]
    pub ingredient_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<QuantityInput>,
    #[serde(default)]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPantryItem {
    pub ingredient_name: String,
    pub quantity: f64,
    pub unit: String,
    pub expires_at: Option<NaiveDate>,
}

impl PantryDraft {
    /// Check the draft. An unparseable expiry date is dropped, not rejected.
    pub fn validate(&self) -> Result<NewPantryItem, PantryDraftError> {
        let ingredient_name = self.ingredient_name.trim();
        if ingredient_name.is_empty() {
            return Err(PantryDraftError::MissingName);
        }
        let unit = self.unit.trim();
        if unit.is_empty() {
            return Err(PantryDraftError::MissingUnit);
        }
        let quantity = self
            .quantity
            .as_ref()
            .and_then(QuantityInput::value)
            .filter(|q| *q > 0.0)
            .ok_or(PantryDraftError::InvalidQuantity)?;

        Ok(NewPantryItem {
            ingredient_name: ingredient_name.to_owned(),
            quantity,
            unit: unit.to_owned(),
            expires_at: self.expires_at.as_deref().and_then(parse_date),
        })
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`).
fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A partial edit of an existing pantry item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PantryUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<QuantityInput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// `null` clears the expiry; absent leaves it alone.
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub expires_at: Option<Option<String>>,
}

/// The columns a [`PantryUpdate`] actually changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PantryChanges {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub expires_at: Option<Option<NaiveDate>>,
}

impl PantryUpdate {
    /// Keep only the meaningful changes: positive finite quantities,
    /// non-blank units, and parseable (or explicitly cleared) expiry dates.
    pub fn changes(&self) -> PantryChanges {
        PantryChanges {
            quantity: self
                .quantity
                .as_ref()
                .and_then(QuantityInput::value)
                .filter(|q| *q > 0.0),
            unit: self
                .unit
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_owned),
            expires_at: match &self.expires_at {
                None => None,
                Some(None) => Some(None),
                Some(Some(raw)) => parse_date(raw).map(Some),
            },
        }
    }
}
