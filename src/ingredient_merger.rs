//! # Ingredient Merger
//!
//! Combines flat ingredient lists from several recipes into one deduplicated,
//! categorized shopping list.
//!
//! ## Core Concepts
//!
//! - **CanonicalKey**: the normalized `(name, unit)` pair used for grouping
//! - **IngredientItem**: one scaled ingredient contribution from one recipe
//! - **MergedIngredient**: one shopping list line, summed over all contributions
//!
//! [`merge`] normalizes its input itself, so callers may pass raw authored
//! names and units. It is stateless: carrying `purchased` flags over from a
//! previous list is the caller's job (see [`carry_over`]).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ingredient_normalizer::{sanitize_quantity, Normalizer};
use crate::recipe_model::{Catalog, RecipeId};
use crate::scale::normalize_scale_opt;

/// Normalized `(name, unit)` grouping key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalKey {
    pub name: String,
    pub unit: String,
}

impl CanonicalKey {
    /// Wrap an already-normalized pair
    pub fn new(name: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            unit: unit.to_string(),
        }
    }

    /// Build a key from raw authored text, applying full normalization
    pub fn normalized(normalizer: &Normalizer, name: &str, unit: &str) -> Self {
        let amount = normalizer.normalize_quantity_by_name(name, 0.0, unit);
        Self {
            name: normalizer.normalize_name(name),
            unit: amount.unit,
        }
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.name, self.unit)
    }
}

/// One scaled ingredient contribution, the merger's input
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientItem {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    /// Contributing recipe, if known
    pub recipe_id: Option<RecipeId>,
}

impl IngredientItem {
    pub fn new(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: unit.to_string(),
            recipe_id: None,
        }
    }

    pub fn from_recipe(mut self, recipe_id: RecipeId) -> Self {
        self.recipe_id = Some(recipe_id);
        self
    }
}

/// One line of the shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedIngredient {
    /// Normalized name
    pub name: String,
    /// Normalized unit
    pub unit: String,
    /// Sum of all contributing scaled quantities
    pub quantity: f64,
    /// Shopping category derived from the name
    pub category: String,
    /// Whether the user has ticked this line off
    #[serde(default)]
    pub purchased: bool,
    /// Recipes contributing to this line
    #[serde(default)]
    pub recipe_ids: BTreeSet<RecipeId>,
}

impl MergedIngredient {
    pub fn key(&self) -> CanonicalKey {
        CanonicalKey::new(&self.name, &self.unit)
    }

    pub fn matches(&self, key: &CanonicalKey) -> bool {
        self.name == key.name && self.unit == key.unit
    }
}

/// Internal merge input shared by fresh merges and stored-list repair
struct MergeEntry {
    name: String,
    quantity: f64,
    unit: String,
    recipe_ids: BTreeSet<RecipeId>,
    purchased: bool,
}

/// Group items by [`CanonicalKey`] and sum their quantities.
///
/// Output keeps first-appearance order. Every line starts unpurchased.
///
/// ```rust
/// use shopping_list::ingredient_merger::{merge, IngredientItem};
/// use shopping_list::ingredient_normalizer::Normalizer;
///
/// let items = vec![
///     IngredientItem::new("盐", 5.0, "g").from_recipe(1),
///     IngredientItem::new("盐", 3.0, "克").from_recipe(2),
/// ];
/// let merged = merge(&Normalizer::default(), items);
/// assert_eq!(merged.len(), 1);
/// assert_eq!(merged[0].quantity, 8.0);
/// ```
pub fn merge<I>(normalizer: &Normalizer, items: I) -> Vec<MergedIngredient>
where
    I: IntoIterator<Item = IngredientItem>,
{
    merge_entries(
        normalizer,
        items.into_iter().map(|item| MergeEntry {
            name: item.name,
            quantity: item.quantity,
            unit: item.unit,
            recipe_ids: item.recipe_id.into_iter().collect(),
            purchased: false,
        }),
    )
}

/// Re-normalize and re-merge a previously stored list.
///
/// Repairs lists written with older normalization rules that may hold
/// duplicate keys. Recipe sources are unioned; the first duplicate's
/// `purchased` flag wins.
pub fn heal(normalizer: &Normalizer, stored: Vec<MergedIngredient>) -> Vec<MergedIngredient> {
    let before = stored.len();
    let healed = merge_entries(
        normalizer,
        stored.into_iter().map(|line| MergeEntry {
            name: line.name,
            quantity: line.quantity,
            unit: line.unit,
            recipe_ids: line.recipe_ids,
            purchased: line.purchased,
        }),
    );
    if healed.len() != before {
        debug!(before, after = healed.len(), "Collapsed duplicate stored ingredients");
    }
    healed
}

fn merge_entries<I>(normalizer: &Normalizer, entries: I) -> Vec<MergedIngredient>
where
    I: Iterator<Item = MergeEntry>,
{
    let mut merged: Vec<MergedIngredient> = Vec::new();
    let mut positions: HashMap<CanonicalKey, usize> = HashMap::new();

    for entry in entries {
        let name = normalizer.normalize_name(&entry.name);
        let unit = normalizer.normalize_unit(&entry.unit);
        let converted = normalizer.convert(&name, sanitize_quantity(entry.quantity), &unit);
        let quantity = converted.quantity;
        let key = CanonicalKey::new(&name, converted.unit);

        match positions.get(&key) {
            Some(&position) => {
                let line = &mut merged[position];
                line.quantity += quantity;
                line.recipe_ids.extend(entry.recipe_ids);
            }
            None => {
                positions.insert(key.clone(), merged.len());
                merged.push(MergedIngredient {
                    category: normalizer.category(&key.name).to_string(),
                    name: key.name,
                    unit: key.unit,
                    quantity,
                    purchased: entry.purchased,
                    recipe_ids: entry.recipe_ids,
                });
            }
        }
    }

    merged
}

/// Flatten the selected recipes into scaled, normalized contributions.
///
/// Ids missing from the catalog are skipped. A missing scale counts as 1.
pub fn collect<C>(
    normalizer: &Normalizer,
    recipe_ids: &[RecipeId],
    catalog: &C,
    scales: &BTreeMap<RecipeId, f64>,
) -> Vec<IngredientItem>
where
    C: Catalog + ?Sized,
{
    let mut items = Vec::new();

    for &recipe_id in recipe_ids {
        let Some(recipe) = catalog.find_recipe_by_id(recipe_id) else {
            debug!(recipe_id, "Selected recipe not in catalog, skipping");
            continue;
        };
        let scale = normalize_scale_opt(scales.get(&recipe_id).copied());

        for raw in &recipe.ingredients {
            let name = normalizer.normalize_name(&raw.name);
            let amount =
                normalizer.normalize_quantity_by_name(&name, sanitize_quantity(raw.quantity) * scale, &raw.unit);
            items.push(IngredientItem {
                name,
                quantity: amount.quantity,
                unit: amount.unit,
                recipe_id: Some(recipe_id),
            });
        }
    }

    items
}

/// Copy state from the previous list onto a freshly merged one.
///
/// For every fresh line whose key existed before, the `purchased` flag is
/// copied and the previous recipe sources are unioned in, restricted to
/// recipes that are still selected. Keys that vanished drop their state.
pub fn carry_over(previous: &[MergedIngredient], fresh: &mut [MergedIngredient], selected: &[RecipeId]) {
    let by_key: HashMap<CanonicalKey, &MergedIngredient> =
        previous.iter().map(|line| (line.key(), line)).collect();

    for line in fresh.iter_mut() {
        if let Some(existing) = by_key.get(&line.key()) {
            line.purchased = existing.purchased;
            line.recipe_ids.extend(
                existing
                    .recipe_ids
                    .iter()
                    .copied()
                    .filter(|id| selected.contains(id)),
            );
        }
    }
}

/// Lines of one shopping category
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup<'a> {
    pub category: &'a str,
    pub items: Vec<&'a MergedIngredient>,
}

/// Group lines by category, categories sorted by name
pub fn group_by_category(ingredients: &[MergedIngredient]) -> Vec<CategoryGroup<'_>> {
    let mut grouped: BTreeMap<&str, Vec<&MergedIngredient>> = BTreeMap::new();
    for line in ingredients {
        grouped.entry(line.category.as_str()).or_default().push(line);
    }
    grouped
        .into_iter()
        .map(|(category, items)| CategoryGroup { category, items })
        .collect()
}

/// Purchase progress within one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub purchased: usize,
    pub total: usize,
}

/// Per-category purchase progress, categories sorted by name
pub fn category_stats(ingredients: &[MergedIngredient]) -> Vec<CategoryStats> {
    group_by_category(ingredients)
        .into_iter()
        .map(|group| CategoryStats {
            category: group.category.to_string(),
            purchased: group.items.iter().filter(|line| line.purchased).count(),
            total: group.items.len(),
        })
        .collect()
}
