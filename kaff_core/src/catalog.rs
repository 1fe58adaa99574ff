//! Default catalog of drinks and serving sizes.
//!
//! Static reference data for the presentation layer; the kinetics engine
//! never reads it. Callers may inject their own catalog instead.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<DrinkCatalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static DrinkCatalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog of common drinks
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns
/// a cached reference. This function is retained for testing and custom
/// catalog creation.
pub fn build_default_catalog() -> DrinkCatalog {
    build_default_catalog_internal()
}

fn drink(id: &str, name: &str, caffeine_mg: f64, icon: &str, sizes: Vec<ServingSize>) -> (String, Drink) {
    (
        id.to_string(),
        Drink {
            id: id.to_string(),
            name: name.to_string(),
            caffeine_mg,
            icon: icon.to_string(),
            sizes,
        },
    )
}

fn size(name: &str, caffeine_mg: f64) -> ServingSize {
    ServingSize {
        name: name.to_string(),
        caffeine_mg,
    }
}

fn build_default_catalog_internal() -> DrinkCatalog {
    let drinks: HashMap<String, Drink> = [
        drink(
            "espresso",
            "Espresso",
            63.0,
            "☕",
            vec![size("single", 63.0), size("double", 126.0)],
        ),
        drink("cappuccino", "Cappuccino", 80.0, "☕", vec![]),
        drink(
            "drip_coffee",
            "Drip Coffee",
            95.0,
            "☕",
            vec![size("small", 95.0), size("medium", 145.0), size("large", 190.0)],
        ),
        drink("instant_coffee", "Instant Coffee", 62.0, "☕", vec![]),
        drink("latte", "Latte", 75.0, "☕", vec![]),
        drink(
            "cold_brew",
            "Cold Brew",
            200.0,
            "🧊",
            vec![size("small", 200.0), size("large", 300.0)],
        ),
        drink("green_tea", "Green Tea", 30.0, "🍵", vec![]),
        drink("black_tea", "Black Tea", 47.0, "🍵", vec![]),
        drink("cola", "Coca-Cola", 34.0, "🥤", vec![]),
        drink(
            "red_bull",
            "Red Bull",
            80.0,
            "⚡",
            vec![size("8.4oz", 80.0), size("12oz", 114.0)],
        ),
        drink("monster", "Monster", 160.0, "⚡", vec![]),
    ]
    .into_iter()
    .collect();

    DrinkCatalog { drinks }
}

impl DrinkCatalog {
    /// Look up a drink by id or (case-insensitive) display name
    pub fn find(&self, name_or_id: &str) -> Option<&Drink> {
        self.drinks.get(name_or_id).or_else(|| {
            self.drinks
                .values()
                .find(|d| d.name.eq_ignore_ascii_case(name_or_id))
        })
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (id, drink) in &self.drinks {
            if id.is_empty() || drink.id.is_empty() {
                errors.push("Drink has empty ID".to_string());
            }
            if id != &drink.id {
                errors.push(format!(
                    "Drink key '{}' doesn't match drink.id '{}'",
                    id, drink.id
                ));
            }
            if drink.name.is_empty() {
                errors.push(format!("Drink '{}' has empty name", id));
            }
            if drink.caffeine_mg <= 0.0 {
                errors.push(format!(
                    "Drink '{}' has non-positive caffeine amount {}",
                    id, drink.caffeine_mg
                ));
            }

            for s in &drink.sizes {
                if s.name.is_empty() {
                    errors.push(format!("Drink '{}' has a serving size with empty name", id));
                }
                if s.caffeine_mg <= 0.0 {
                    errors.push(format!(
                        "Drink '{}' size '{}' has non-positive caffeine amount {}",
                        id, s.name, s.caffeine_mg
                    ));
                }
            }
        }

        if self.drinks.is_empty() {
            errors.push("Catalog has no drinks".to_string());
        }

        errors
    }
}
