//! Aggregation of planned meals into `AUTO` shopping rows.

use std::collections::HashMap;

use tracing::debug;

use picknic_db::models::{ShoppingItemSource, ShoppingItemStatus};

use super::normalize::{
    AggregationKey, known_quantity, locale_cmp, normalize_name, normalize_unit, round2,
};
use super::{PlannedEntry, ShoppingAggregate};

/// Factor applied to a recipe's quantities for one planned meal.
///
/// A positive override scales relative to the recipe's base servings (taken
/// as 1 when non-positive); anything else leaves quantities as written.
pub fn serving_multiplier(entry: &PlannedEntry) -> f64 {
    let servings = if entry.recipe.servings > 0 {
        entry.recipe.servings
    } else {
        1
    };
    match entry.servings_override {
        Some(wanted) if wanted > 0 => f64::from(wanted) / f64::from(servings),
        _ => 1.0,
    }
}

/// Sum two contributions to the same row. An unknown amount on either side
/// makes the total unknown.
pub fn merge_quantities(existing: Option<f64>, incoming: Option<f64>) -> Option<f64> {
    match (existing, incoming) {
        (Some(a), Some(b)) => Some(round2(a + b)),
        _ => None,
    }
}

/// Build the week's `AUTO` shopping rows from its planned meals.
///
/// Lines sharing an [`AggregationKey`] are summed after scaling; the first
/// line seen for a key supplies the display name and unit. Lines with a
/// blank name are skipped. The result is sorted by display name; rows whose
/// names collate equal keep first-seen order.
pub fn build_auto_shopping_items(entries: &[PlannedEntry]) -> Vec<ShoppingAggregate> {
    let mut items: Vec<ShoppingAggregate> = Vec::new();
    let mut index: HashMap<AggregationKey, usize> = HashMap::new();

    for entry in entries {
        let multiplier = serving_multiplier(entry);

        for line in &entry.recipe.ingredients {
            let Some(name) = normalize_name(&line.name) else {
                continue;
            };
            let unit = normalize_unit(line.unit.as_deref());
            let scaled = known_quantity(line.quantity).map(|q| round2(q * multiplier));

            let key = AggregationKey::new(name, unit);
            if let Some(&at) = index.get(&key) {
                let row = &mut items[at];
                row.quantity = merge_quantities(row.quantity, scaled);
            } else {
                index.insert(key, items.len());
                items.push(ShoppingAggregate {
                    ingredient_name: name.to_owned(),
                    unit: unit.map(str::to_owned),
                    quantity: scaled,
                    source: ShoppingItemSource::Auto,
                    status: ShoppingItemStatus::Pending,
                });
            }
        }
    }

    // Stable, so same-name rows stay in first-seen order.
    items.sort_by(|a, b| locale_cmp(&a.ingredient_name, &b.ingredient_name));

    debug!(
        entries = entries.len(),
        rows = items.len(),
        "aggregated planned meals into shopping rows"
    );
    items
}
