//! Household pantry: validation of submitted stock and the service calls
//! that keep it up to date.

pub mod draft;
pub mod service;

pub use draft::{NewPantryItem, PantryChanges, PantryDraft, PantryDraftError, PantryUpdate};
pub use service::{delete_pantry_item, list_pantry_items, update_pantry_item, upsert_pantry_item};
