//! Normalization shared by the aggregator and the pantry reducer: the
//! aggregation key, two-decimal rounding and display-name ordering.

use std::cmp::Ordering;
use std::fmt;

use icu_collator::{Collator, CollatorOptions};

/// Round to two decimal places, halves toward positive infinity.
///
/// Applied after every scaling, addition and subtraction so drift cannot
/// accumulate across many entries. `-0.005` rounds to zero, not `-0.01`.
pub fn round2(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

/// Trim a name, returning `None` when nothing is left.
pub fn normalize_name(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Trim a unit, treating absent, empty and whitespace-only units alike.
pub fn normalize_unit(raw: Option<&str>) -> Option<&str> {
    raw.and_then(normalize_name)
}

/// Keep a quantity only if it is a finite number.
pub fn known_quantity(raw: Option<f64>) -> Option<f64> {
    raw.filter(|q| q.is_finite())
}

/// Identity of a shopping row: case-insensitive trimmed name plus
/// case-insensitive trimmed unit. No unit conversion happens, so `g` and
/// `kg` are distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    name: String,
    unit: String,
}

impl AggregationKey {
    pub fn new(name: &str, unit: Option<&str>) -> Self {
        Self {
            name: name.trim().to_lowercase(),
            unit: unit.map(|u| u.trim().to_lowercase()).unwrap_or_default(),
        }
    }
}

/// Renders as `name::unit` (empty unit after the separator when absent).
impl fmt::Display for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.name, self.unit)
    }
}

thread_local! {
    static COLLATOR: Option<Collator> =
        Collator::try_new(&Default::default(), CollatorOptions::new()).ok();
}

/// Locale-aware ordering for display names, using root-locale collation:
/// accents and case only break ties between otherwise equal names, and on a
/// case-only difference the lowercase form sorts first.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    COLLATOR.with(|collator| match collator {
        Some(collator) => collator.compare(a, b),
        None => case_folded_cmp(a, b),
    })
}

/// Used only when collation data cannot be loaded.
fn case_folded_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}
