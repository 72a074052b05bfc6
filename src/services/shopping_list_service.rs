use std::collections::BTreeMap;

use crate::{
    db::DbPool,
    dto::shopping_list::{AggregatedLine, IngredientRow},
    error::AppResult,
    middleware::auth::AuthUser,
};

/// Collect every (ingredient, amount) pair reachable through the user's
/// cart entries and sum them per distinct (name, measurement unit).
pub async fn aggregate(pool: &DbPool, user: &AuthUser) -> AppResult<Vec<AggregatedLine>> {
    let rows = sqlx::query_as::<_, IngredientRow>(
        r#"
        SELECT i.name, i.measurement_unit, ri.amount
        FROM cart_entries ce
        JOIN recipe_ingredients ri ON ri.recipe_id = ce.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ce.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_all(pool)
    .await?;

    Ok(sum_ingredients(rows))
}

/// Group-by-sum over raw ingredient rows. The BTreeMap key gives the output
/// its ordering: alphabetical by name, ties broken by unit.
pub fn sum_ingredients(rows: impl IntoIterator<Item = IngredientRow>) -> Vec<AggregatedLine> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals
            .entry((row.name, row.measurement_unit))
            .or_insert(0) += i64::from(row.amount);
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), amount)| AggregatedLine {
            name,
            amount,
            measurement_unit,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, unit: &str, amount: i32) -> IngredientRow {
        IngredientRow {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn sums_amounts_across_recipes() {
        // Recipe A: flour 200g, sugar 50g. Recipe B: flour 100g.
        let lines = sum_ingredients(vec![
            row("flour", "g", 200),
            row("sugar", "g", 50),
            row("flour", "g", 100),
        ]);
        assert_eq!(
            lines,
            vec![
                AggregatedLine {
                    name: "flour".into(),
                    amount: 300,
                    measurement_unit: "g".into()
                },
                AggregatedLine {
                    name: "sugar".into(),
                    amount: 50,
                    measurement_unit: "g".into()
                },
            ]
        );
    }

    #[test]
    fn same_name_different_unit_stays_separate() {
        let lines = sum_ingredients(vec![
            row("milk", "ml", 500),
            row("milk", "g", 30),
            row("milk", "ml", 200),
        ]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].measurement_unit, "g");
        assert_eq!(lines[0].amount, 30);
        assert_eq!(lines[1].measurement_unit, "ml");
        assert_eq!(lines[1].amount, 700);
    }

    #[test]
    fn orders_alphabetically_by_name() {
        let lines = sum_ingredients(vec![
            row("sugar", "g", 1),
            row("butter", "g", 1),
            row("flour", "g", 1),
        ]);
        let names: Vec<&str> = lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["butter", "flour", "sugar"]);
    }

    #[test]
    fn empty_cart_yields_empty_sequence() {
        assert!(sum_ingredients(Vec::new()).is_empty());
    }

    #[test]
    fn aggregation_is_idempotent() {
        let rows = vec![
            row("flour", "g", 200),
            row("sugar", "g", 50),
            row("flour", "g", 100),
        ];
        assert_eq!(sum_ingredients(rows.clone()), sum_ingredients(rows));
    }
}
