//! Nutrition totals for the recipes on the shopping list.
//!
//! Sums each selected recipe's authored nutrition at its current scale.
//! Recipes without nutrition data, or missing from the catalog, contribute
//! nothing.

use std::ops::AddAssign;

use serde::Serialize;

use crate::recipe_model::{Catalog, Nutrition};
use crate::scale::normalize_scale_opt;
use crate::shopping_list::ShoppingListState;

/// Scaled nutrient sums across selected recipes
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct NutritionTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub salt: f64,
}

impl NutritionTotals {
    pub fn empty() -> Self {
        Self::default()
    }

    /// One recipe's authored nutrition multiplied by a scale
    pub fn scaled(nutrition: &Nutrition, scale: f64) -> Self {
        macro_rules! scale_field {
            ($field:ident) => {
                finite_or_zero(nutrition.$field) * scale
            };
        }
        Self {
            calories: scale_field!(calories),
            protein: scale_field!(protein),
            carbs: scale_field!(carbs),
            fat: scale_field!(fat),
            salt: scale_field!(salt),
        }
    }
}

impl AddAssign for NutritionTotals {
    fn add_assign(&mut self, other: Self) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.carbs += other.carbs;
        self.fat += other.fat;
        self.salt += other.salt;
    }
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Sum nutrition over the selected recipes at their current scales
pub fn sum_nutrition<C>(state: &ShoppingListState, catalog: &C) -> NutritionTotals
where
    C: Catalog + ?Sized,
{
    let mut totals = NutritionTotals::empty();

    for &recipe_id in &state.selected_recipe_ids {
        let Some(nutrition) = catalog
            .find_recipe_by_id(recipe_id)
            .and_then(|recipe| recipe.nutrition.as_ref())
        else {
            continue;
        };
        let scale = normalize_scale_opt(state.scale_of(recipe_id));
        totals += NutritionTotals::scaled(nutrition, scale);
    }

    totals
}
