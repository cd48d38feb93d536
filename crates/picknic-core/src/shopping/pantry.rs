//! Pantry-aware reduction of shopping rows.

use std::collections::HashMap;

use tracing::debug;

use super::normalize::{AggregationKey, known_quantity, normalize_name, normalize_unit, round2};
use super::{PantryHolding, ShoppingAggregate};

/// Total on-hand quantity per [`AggregationKey`].
///
/// Holdings without a name or unit, or without a positive finite quantity,
/// are skipped.
pub fn pantry_totals(pantry: &[PantryHolding]) -> HashMap<AggregationKey, f64> {
    let mut totals: HashMap<AggregationKey, f64> = HashMap::new();

    for holding in pantry {
        let (Some(name), Some(unit)) = (
            normalize_name(&holding.ingredient_name),
            normalize_name(&holding.unit),
        ) else {
            continue;
        };
        let Some(quantity) = known_quantity(holding.quantity).filter(|q| *q > 0.0) else {
            continue;
        };

        let total = totals.entry(AggregationKey::new(name, Some(unit))).or_insert(0.0);
        *total = round2(*total + quantity);
    }

    totals
}

/// Subtract pantry stock from shopping rows.
///
/// Rows without a quantity or unit pass through untouched: a pantry holding
/// always has a unit, and nothing is matched across that gap. A row whose
/// remaining demand drops to zero or below is removed. Surviving rows keep
/// their input order.
pub fn subtract_pantry_from_shopping_items(
    items: &[ShoppingAggregate],
    pantry: &[PantryHolding],
) -> Vec<ShoppingAggregate> {
    let totals = pantry_totals(pantry);

    let reduced: Vec<ShoppingAggregate> = items
        .iter()
        .filter_map(|item| {
            let (Some(quantity), Some(unit)) = (item.quantity, normalize_unit(item.unit.as_deref()))
            else {
                return Some(item.clone());
            };

            let key = AggregationKey::new(&item.ingredient_name, Some(unit));
            let on_hand = totals.get(&key).copied().unwrap_or(0.0);
            if on_hand <= 0.0 {
                return Some(item.clone());
            }

            let remaining = round2(quantity - on_hand);
            (remaining > 0.0).then(|| ShoppingAggregate {
                quantity: Some(remaining),
                ..item.clone()
            })
        })
        .collect();

    debug!(
        rows_in = items.len(),
        rows_out = reduced.len(),
        pantry_keys = totals.len(),
        "applied pantry to shopping rows"
    );
    reduced
}

#[cfg(test)]
mod tests {
    use super::*;
    use picknic_db::models::{ShoppingItemSource, ShoppingItemStatus};

    fn auto(name: &str, quantity: Option<f64>, unit: Option<&str>) -> ShoppingAggregate {
        ShoppingAggregate {
            ingredient_name: name.to_owned(),
            unit: unit.map(str::to_owned),
            quantity,
            source: ShoppingItemSource::Auto,
            status: ShoppingItemStatus::Pending,
        }
    }

    fn holding(name: &str, quantity: Option<f64>, unit: &str) -> PantryHolding {
        PantryHolding {
            ingredient_name: name.to_owned(),
            unit: unit.to_owned(),
            quantity,
        }
    }

    #[test]
    fn subtracts_and_removes_fully_covered_rows() {
        let adjusted = subtract_pantry_from_shopping_items(
            &[
                auto("Rice", Some(300.0), Some("g")),
                auto("Salt", Some(3.0), Some("tsp")),
            ],
            &[
                holding("Rice", Some(150.0), "g"),
                holding("Salt", Some(5.0), "tsp"),
            ],
        );

        assert_eq!(adjusted, vec![auto("Rice", Some(150.0), Some("g"))]);
    }

    #[test]
    fn exact_coverage_removes_the_row() {
        let adjusted = subtract_pantry_from_shopping_items(
            &[auto("Rice", Some(150.0), Some("g"))],
            &[holding("Rice", Some(150.0), "g")],
        );
        assert!(adjusted.is_empty());
    }

    #[test]
    fn rows_without_unit_or_quantity_pass_through() {
        let items = vec![
            auto("Salt", None, Some("tsp")),
            auto("Eggs", Some(6.0), None),
            auto("Parsley", None, None),
        ];
        let adjusted = subtract_pantry_from_shopping_items(
            &items,
            &[
                holding("Salt", Some(100.0), "tsp"),
                holding("Eggs", Some(12.0), "each"),
                holding("Parsley", Some(1.0), "bunch"),
            ],
        );
        assert_eq!(adjusted, items);
    }

    #[test]
    fn pantry_matches_case_insensitively_on_name_and_unit() {
        let adjusted = subtract_pantry_from_shopping_items(
            &[auto("Olive oil", Some(5.0), Some("Tbsp"))],
            &[holding(" olive OIL ", Some(2.0), "tbsp ")],
        );
        assert_eq!(adjusted, vec![auto("Olive oil", Some(3.0), Some("Tbsp"))]);
    }

    #[test]
    fn different_units_do_not_match() {
        let items = vec![auto("Flour", Some(500.0), Some("g"))];
        let adjusted =
            subtract_pantry_from_shopping_items(&items, &[holding("Flour", Some(2.0), "cup")]);
        assert_eq!(adjusted, items);
    }

    #[test]
    fn invalid_holdings_are_ignored() {
        let items = vec![auto("Rice", Some(300.0), Some("g"))];
        let adjusted = subtract_pantry_from_shopping_items(
            &items,
            &[
                holding("Rice", Some(0.0), "g"),
                holding("Rice", Some(-50.0), "g"),
                holding("Rice", Some(f64::NAN), "g"),
                holding("Rice", Some(f64::INFINITY), "g"),
                holding("Rice", None, "g"),
                holding("Rice", Some(100.0), "  "),
                holding("  ", Some(100.0), "g"),
            ],
        );
        assert_eq!(adjusted, items);
    }

    #[test]
    fn holdings_with_the_same_key_are_summed() {
        let totals = pantry_totals(&[
            holding("Rice", Some(100.0), "g"),
            holding("rice", Some(50.25), "G"),
            holding("Rice", Some(1.0), "kg"),
        ]);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&AggregationKey::new("rice", Some("g"))], 150.25);
        assert_eq!(totals[&AggregationKey::new("rice", Some("kg"))], 1.0);
    }

    #[test]
    fn order_of_survivors_is_preserved() {
        let adjusted = subtract_pantry_from_shopping_items(
            &[
                auto("Zucchini", Some(2.0), Some("each")),
                auto("Apple", Some(4.0), Some("each")),
                auto("Milk", Some(1.0), Some("l")),
            ],
            &[holding("Milk", Some(2.0), "l"), holding("Apple", Some(1.0), "each")],
        );
        let names: Vec<&str> = adjusted.iter().map(|i| i.ingredient_name.as_str()).collect();
        assert_eq!(names, vec!["Zucchini", "Apple"]);
        assert_eq!(adjusted[1].quantity, Some(3.0));
    }

    #[test]
    fn remainder_is_rounded() {
        let adjusted = subtract_pantry_from_shopping_items(
            &[auto("Sugar", Some(0.3), Some("cup"))],
            &[holding("Sugar", Some(0.1), "cup")],
        );
        assert_eq!(adjusted[0].quantity, Some(0.2));
    }

    #[test]
    fn manual_rows_are_reduced_too() {
        let manual = ShoppingAggregate {
            source: ShoppingItemSource::Manual,
            ..auto("Coffee", Some(2.0), Some("bag"))
        };
        let adjusted =
            subtract_pantry_from_shopping_items(&[manual], &[holding("Coffee", Some(1.0), "bag")]);
        assert_eq!(adjusted[0].quantity, Some(1.0));
        assert_eq!(adjusted[0].source, ShoppingItemSource::Manual);
    }

    #[test]
    fn empty_pantry_is_a_no_op() {
        let items = vec![auto("Rice", Some(300.0), Some("g"))];
        assert_eq!(subtract_pantry_from_shopping_items(&items, &[]), items);
    }
}
