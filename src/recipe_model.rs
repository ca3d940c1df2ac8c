//! # Recipe Data Model
//!
//! This module defines the read-only recipe catalog consumed by the shopping
//! list engine. Recipes are loaded once from a static JSON array and looked
//! up by their stable integer identifier.
//!
//! ## Core Concepts
//!
//! - **Recipe**: a titled dish with ordered raw ingredients and optional nutrition
//! - **RawIngredient**: an ingredient exactly as authored, for a scale of 1
//! - **Instruction**: a preparation step, either plain text or text with an image
//! - **Catalog**: anything that can resolve a recipe id
//!
//! ## Usage
//!
//! ```rust
//! use shopping_list::recipe_model::{Catalog, RecipeCatalog};
//!
//! let json = r#"[{"id": 1, "title": "番茄炒蛋",
//!                 "ingredients": [{"name": "鸡蛋", "quantity": 2, "unit": "个"}]}]"#;
//! let catalog = RecipeCatalog::from_json_str(json)?;
//! assert_eq!(catalog.find_recipe_by_id(1).map(|r| r.title.as_str()), Some("番茄炒蛋"));
//! # Ok::<(), shopping_list::errors::ShoppingListError>(())
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, warn};

use crate::errors::{Result, ShoppingListError};
use crate::scale::coerce_number;

/// Stable recipe identifier
pub type RecipeId = i64;

/// A recipe as authored in the static catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Unique, stable identifier
    pub id: RecipeId,

    /// Display title
    pub title: String,

    /// Optional short description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Browse categories (not the shopping categories of ingredients)
    #[serde(default)]
    pub category: Vec<String>,

    /// Optional cover image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Ingredients in authored order, quantities for one portion set
    #[serde(default)]
    pub ingredients: Vec<RawIngredient>,

    /// Preparation steps
    #[serde(default)]
    pub instructions: Vec<Instruction>,

    /// Per-recipe nutrition totals as authored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
}

/// An ingredient exactly as authored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawIngredient {
    /// Name, possibly decorated with pictographs
    #[serde(default)]
    pub name: String,

    /// Amount for a scale of 1. Missing or non-numeric values read as 0.
    #[serde(default, deserialize_with = "lenient_number")]
    pub quantity: f64,

    /// Unit as authored (e.g. "g", "克", "ml", "个")
    #[serde(default)]
    pub unit: String,
}

/// A preparation step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instruction {
    /// Plain text step
    Text(String),
    /// Step with an optional illustration
    Illustrated {
        text: String,
        #[serde(default, rename = "imageUrl", skip_serializing_if = "Option::is_none")]
        image_url: Option<String>,
    },
}

impl Instruction {
    /// The step text regardless of shape
    pub fn text(&self) -> &str {
        match self {
            Instruction::Text(text) => text,
            Instruction::Illustrated { text, .. } => text,
        }
    }

    /// The illustration, if any
    pub fn image_url(&self) -> Option<&str> {
        match self {
            Instruction::Text(_) => None,
            Instruction::Illustrated { image_url, .. } => image_url.as_deref(),
        }
    }
}

/// Nutrition totals for one authored batch of a recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    /// Kilocalories
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: f64,
    /// Protein in grams
    #[serde(default, deserialize_with = "lenient_number")]
    pub protein: f64,
    /// Carbohydrates in grams
    #[serde(default, deserialize_with = "lenient_number")]
    pub carbs: f64,
    /// Fat in grams
    #[serde(default, deserialize_with = "lenient_number")]
    pub fat: f64,
    /// Salt in grams
    #[serde(default, deserialize_with = "lenient_number")]
    pub salt: f64,
}

/// Numbers in authored data are sometimes strings or null; those read as
/// their numeric value or 0.
fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    let number = coerce_number(&value);
    Ok(if number.is_finite() { number } else { 0.0 })
}

/// Read-only recipe lookup
pub trait Catalog {
    /// Look up a recipe by id
    fn find_recipe_by_id(&self, id: RecipeId) -> Option<&Recipe>;

    /// Every recipe id in catalog order
    fn all_ids(&self) -> Vec<RecipeId>;

    /// Whether the catalog currently holds a recipe
    fn contains(&self, id: RecipeId) -> bool {
        self.find_recipe_by_id(id).is_some()
    }
}

/// In-memory catalog loaded from the static recipe JSON
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    index: HashMap<RecipeId, usize>,
}

impl RecipeCatalog {
    /// Build a catalog from recipes. On duplicate ids the first recipe wins.
    pub fn new(recipes: Vec<Recipe>) -> Self {
        let mut index = HashMap::with_capacity(recipes.len());
        for (position, recipe) in recipes.iter().enumerate() {
            if index.contains_key(&recipe.id) {
                warn!(recipe_id = recipe.id, "Duplicate recipe id in catalog, keeping first");
                continue;
            }
            index.insert(recipe.id, position);
        }
        Self { recipes, index }
    }

    /// Parse a JSON array of recipes
    pub fn from_json_str(json: &str) -> Result<Self> {
        let recipes: Vec<Recipe> = serde_json::from_str(json)
            .map_err(|e| ShoppingListError::Catalog(format!("invalid recipe JSON: {e}")))?;
        info!(recipe_count = recipes.len(), "Loaded recipe catalog");
        Ok(Self::new(recipes))
    }

    /// Load a JSON array of recipes from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ShoppingListError::Catalog(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// All recipes in catalog order
    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl Catalog for RecipeCatalog {
    fn find_recipe_by_id(&self, id: RecipeId) -> Option<&Recipe> {
        self.index.get(&id).map(|&position| &self.recipes[position])
    }

    fn all_ids(&self) -> Vec<RecipeId> {
        self.recipes
            .iter()
            .enumerate()
            .filter(|(position, recipe)| self.index.get(&recipe.id) == Some(position))
            .map(|(_, recipe)| recipe.id)
            .collect()
    }
}

impl Recipe {
    /// Create a recipe with just an id and title
    pub fn new(id: RecipeId, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: None,
            category: Vec::new(),
            image_url: None,
            ingredients: Vec::new(),
            instructions: Vec::new(),
            nutrition: None,
        }
    }

    /// Add an authored ingredient
    pub fn with_ingredient(mut self, name: &str, quantity: f64, unit: &str) -> Self {
        self.ingredients.push(RawIngredient {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
        });
        self
    }

    /// Attach nutrition totals
    pub fn with_nutrition(mut self, nutrition: Nutrition) -> Self {
        self.nutrition = Some(nutrition);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "id": 1,
            "title": "番茄炒蛋",
            "category": ["家常菜"],
            "imageUrl": "images/1.jpg",
            "ingredients": [
                {"name": "🍅番茄", "quantity": 2, "unit": "个"},
                {"name": "鸡蛋", "quantity": "3", "unit": "个"},
                {"name": "盐", "unit": "克"}
            ],
            "instructions": [
                "番茄切块",
                {"text": "炒蛋", "imageUrl": "images/1-2.jpg"}
            ],
            "nutrition": {"calories": 320, "protein": 18.5, "carbs": 12, "fat": 20}
        },
        {"id": 2, "title": "白米饭", "futureField": true}
    ]"#;

    #[test]
    fn test_catalog_parsing() {
        let catalog = RecipeCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.all_ids(), vec![1, 2]);

        let recipe = catalog.find_recipe_by_id(1).unwrap();
        assert_eq!(recipe.ingredients.len(), 3);
        assert_eq!(recipe.ingredients[1].quantity, 3.0);
        assert_eq!(recipe.ingredients[2].quantity, 0.0);
        assert_eq!(recipe.image_url.as_deref(), Some("images/1.jpg"));

        let nutrition = recipe.nutrition.as_ref().unwrap();
        assert_eq!(nutrition.calories, 320.0);
        assert_eq!(nutrition.salt, 0.0);

        let plain = catalog.find_recipe_by_id(2).unwrap();
        assert!(plain.ingredients.is_empty());
        assert!(plain.nutrition.is_none());
    }

    #[test]
    fn test_instruction_shapes() {
        let catalog = RecipeCatalog::from_json_str(SAMPLE).unwrap();
        let steps = &catalog.find_recipe_by_id(1).unwrap().instructions;

        assert_eq!(steps[0], Instruction::Text("番茄切块".to_string()));
        assert_eq!(steps[0].image_url(), None);
        assert_eq!(steps[1].text(), "炒蛋");
        assert_eq!(steps[1].image_url(), Some("images/1-2.jpg"));
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let catalog = RecipeCatalog::new(vec![Recipe::new(7, "first"), Recipe::new(7, "second")]);
        assert_eq!(catalog.find_recipe_by_id(7).unwrap().title, "first");
        assert_eq!(catalog.all_ids(), vec![7]);
        assert!(!catalog.contains(8));
    }

    #[test]
    fn test_invalid_catalog_json() {
        let result = RecipeCatalog::from_json_str("{not json");
        assert!(matches!(result, Err(ShoppingListError::Catalog(_))));
    }
}
