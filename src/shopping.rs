//! Shopping list aggregation.
//!
//! The cart holds whole recipes; the downloadable list is the sum of their
//! ingredient rows, merged per ingredient name and measurement unit so the
//! same product bought for two recipes appears once.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::RecipeIngredient;

pub const SHOPPING_LIST_FILENAME: &str = "shopping_list.txt";
const HEADER: &str = "Shopping list";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub amount: f64,
}

/// Sums amounts per (name, unit), ordered by name then unit.
///
/// Rows with the same name but different units stay separate: "200 g" and
/// "1 cup" of flour cannot be added.
#[must_use]
pub fn aggregate(rows: &[RecipeIngredient]) -> Vec<ShoppingItem> {
    let mut totals: BTreeMap<(&str, &str), f64> = BTreeMap::new();

    for row in rows {
        *totals
            .entry((row.name.as_str(), row.measurement_unit.as_str()))
            .or_insert(0.0) += row.amount;
    }

    totals
        .into_iter()
        .map(|((name, unit), amount)| ShoppingItem {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        })
        .collect()
}

/// Renders the plain-text attachment body, one `name (unit) - amount` line per item.
#[must_use]
pub fn render(items: &[ShoppingItem]) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');

    for item in items {
        out.push_str(&format!(
            "{} ({}) - {}\n",
            item.name,
            item.measurement_unit,
            format_amount(item.amount)
        ));
    }

    out
}

/// Prints at most three decimals and drops trailing zeros (`3.0` → `3`).
fn format_amount(amount: f64) -> String {
    let rounded = (amount * 1000.0).round() / 1000.0;
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(recipe_id: i64, name: &str, unit: &str, amount: f64) -> RecipeIngredient {
        RecipeIngredient {
            recipe_id,
            ingredient_id: 0,
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_sums_same_ingredient_across_recipes() {
        let rows = vec![
            row(1, "flour", "g", 200.0),
            row(1, "milk", "ml", 300.0),
            row(2, "flour", "g", 150.0),
        ];

        let items = aggregate(&rows);
        assert_eq!(
            items,
            vec![
                ShoppingItem {
                    name: "flour".to_string(),
                    measurement_unit: "g".to_string(),
                    amount: 350.0,
                },
                ShoppingItem {
                    name: "milk".to_string(),
                    measurement_unit: "ml".to_string(),
                    amount: 300.0,
                },
            ]
        );
    }

    #[test]
    fn test_different_units_stay_separate() {
        let rows = vec![row(1, "flour", "g", 200.0), row(2, "flour", "cup", 1.0)];

        let items = aggregate(&rows);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].measurement_unit, "cup");
        assert_eq!(items[1].measurement_unit, "g");
    }

    #[test]
    fn test_render() {
        let items = aggregate(&[row(1, "eggs", "pcs", 2.0), row(2, "sugar", "g", 12.5)]);

        assert_eq!(
            render(&items),
            "Shopping list\neggs (pcs) - 2\nsugar (g) - 12.5\n"
        );
    }

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render(&aggregate(&[])), "Shopping list\n");
    }

    #[test]
    fn test_format_amount_rounds_float_noise() {
        assert_eq!(format_amount(0.1 + 0.2), "0.3");
        assert_eq!(format_amount(3.0), "3");
    }
}
