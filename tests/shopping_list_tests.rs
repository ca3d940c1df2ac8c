//! # Shopping List Store Tests
//!
//! Order independence, reversibility and purchase-state behavior of the
//! store, exercised through the public API over in-memory storage.

use std::collections::BTreeSet;

use shopping_list::errors::Result;
use shopping_list::ingredient_merger::{CanonicalKey, MergedIngredient};
use shopping_list::recipe_model::{Recipe, RecipeCatalog};
use shopping_list::scale::normalize_scale_opt;
use shopping_list::shopping_list::{ShoppingListState, ShoppingListStore, DEFAULT_STORAGE_KEY};
use shopping_list::storage::{MemoryStorage, Storage};

fn sample_catalog() -> RecipeCatalog {
    RecipeCatalog::new(vec![
        Recipe::new(1, "番茄炒蛋")
            .with_ingredient("🍅番茄", 2.0, "个")
            .with_ingredient("鸡蛋", 3.0, "个")
            .with_ingredient("盐", 2.0, "g")
            .with_ingredient("食用油", 15.0, "ml"),
        Recipe::new(2, "牛奶炖蛋")
            .with_ingredient("纯牛奶", 200.0, "毫升")
            .with_ingredient("🥚鸡蛋", 2.0, "个")
            .with_ingredient("糖", 10.0, "克"),
        Recipe::new(3, "葱油拌面")
            .with_ingredient("面条", 200.0, "g")
            .with_ingredient("小葱", 3.0, "根")
            .with_ingredient("盐", 1.0, "克"),
    ])
}

fn new_store() -> ShoppingListStore<MemoryStorage> {
    ShoppingListStore::new(MemoryStorage::new())
}

/// Lines as a comparable set, ignoring order
fn line_set(ingredients: &[MergedIngredient]) -> BTreeSet<(String, String, String, bool, Vec<i64>)> {
    ingredients
        .iter()
        .map(|line| {
            (
                line.name.clone(),
                line.unit.clone(),
                format!("{:.6}", line.quantity),
                line.purchased,
                line.recipe_ids.iter().copied().collect(),
            )
        })
        .collect()
}

fn quantity_of(state: &ShoppingListState, name: &str, unit: &str) -> Option<f64> {
    state.find(&CanonicalKey::new(name, unit)).map(|line| line.quantity)
}

#[test]
fn test_add_order_does_not_matter() -> Result<()> {
    let catalog = sample_catalog();

    let mut forward = new_store();
    forward.add_recipe(1, &catalog, 1.5)?;
    let forward_state = forward.add_recipe(2, &catalog, 1.0)?;

    let mut backward = new_store();
    backward.add_recipe(2, &catalog, 1.0)?;
    let backward_state = backward.add_recipe(1, &catalog, 1.5)?;

    assert_eq!(line_set(&forward_state.ingredients), line_set(&backward_state.ingredients));
    assert_eq!(quantity_of(&forward_state, "鸡蛋", "个"), Some(6.5));
    Ok(())
}

#[test]
fn test_remove_reverses_add() -> Result<()> {
    let catalog = sample_catalog();
    let mut store = new_store();

    store.add_recipe(3, &catalog, 2.5)?;
    let state = store.remove_recipe(3, &catalog)?;

    assert!(state.selected_recipe_ids.is_empty());
    assert!(state.recipe_scales.is_empty());
    assert!(state.ingredients.is_empty());
    assert_eq!(store.stats().total, 0);
    Ok(())
}

#[test]
fn test_remove_keeps_shared_ingredients() -> Result<()> {
    let catalog = sample_catalog();
    let mut store = new_store();

    store.add_recipe(1, &catalog, 1.0)?;
    store.add_recipe(3, &catalog, 1.0)?;
    let state = store.remove_recipe(1, &catalog)?;

    assert_eq!(quantity_of(&state, "盐", "g"), Some(1.0));
    assert_eq!(quantity_of(&state, "番茄", "个"), None);
    let salt = state.find(&CanonicalKey::new("盐", "g")).unwrap();
    assert_eq!(salt.recipe_ids, BTreeSet::from([3]));
    Ok(())
}

#[test]
fn test_rescale_matches_fresh_add() -> Result<()> {
    let catalog = sample_catalog();

    let mut direct = new_store();
    let direct_state = direct.add_recipe(1, &catalog, 2.0)?;

    let mut rescaled = new_store();
    rescaled.add_recipe(1, &catalog, 1.0)?;
    let rescaled_state = rescaled.update_recipe_scale(1, 2.0, &catalog)?;

    assert_eq!(line_set(&direct_state.ingredients), line_set(&rescaled_state.ingredients));
    assert_eq!(rescaled_state.scale_of(1), Some(2.0));
    Ok(())
}

#[test]
fn test_rescale_clamps_out_of_range_input() -> Result<()> {
    let catalog = sample_catalog();
    let mut store = new_store();
    store.add_recipe(3, &catalog, 1.0)?;

    let state = store.update_recipe_scale(3, f64::NAN, &catalog)?;
    assert_eq!(state.scale_of(3), Some(1.0));
    let state = store.update_recipe_scale(3, 0.01, &catalog)?;
    assert_eq!(state.scale_of(3), Some(0.1));
    assert_eq!(normalize_scale_opt(None), 1.0);
    Ok(())
}

#[test]
fn test_salt_with_synonymous_units_merges() -> Result<()> {
    let catalog = RecipeCatalog::new(vec![
        Recipe::new(1, "r1").with_ingredient("盐", 5.0, "g"),
        Recipe::new(2, "r2").with_ingredient("盐", 3.0, "克"),
    ]);
    let mut store = new_store();

    store.add_recipe(1, &catalog, 1.0)?;
    let state = store.add_recipe(2, &catalog, 1.0)?;

    assert_eq!(state.ingredients.len(), 1);
    let salt = state.find(&CanonicalKey::new("盐", "g")).unwrap();
    assert_eq!(salt.quantity, 8.0);
    assert_eq!(salt.recipe_ids, BTreeSet::from([1, 2]));
    Ok(())
}

#[test]
fn test_egg_scenario() -> Result<()> {
    let catalog = RecipeCatalog::new(vec![
        Recipe::new(1, "r1").with_ingredient("鸡蛋", 2.0, "个"),
        Recipe::new(2, "r2").with_ingredient("鸡蛋", 1.0, "个"),
    ]);
    let mut store = new_store();

    store.add_recipe(1, &catalog, 1.0)?;
    let state = store.add_recipe(2, &catalog, 3.0)?;
    assert_eq!(quantity_of(&state, "鸡蛋", "个"), Some(5.0));

    let state = store.remove_recipe(1, &catalog)?;
    assert_eq!(quantity_of(&state, "鸡蛋", "个"), Some(3.0));

    let state = store.update_recipe_scale(2, 0.5, &catalog)?;
    assert_eq!(quantity_of(&state, "鸡蛋", "个"), Some(0.5));
    Ok(())
}

#[test]
fn test_purchased_flag_survives_recompute() -> Result<()> {
    let catalog = sample_catalog();
    let mut store = new_store();

    store.add_recipe(1, &catalog, 1.0)?;
    let eggs = CanonicalKey::new("鸡蛋", "个");
    assert!(store.toggle_purchased(&eggs, true)?);

    let state = store.add_recipe(2, &catalog, 1.0)?;
    let line = state.find(&eggs).unwrap();
    assert!(line.purchased);
    assert_eq!(line.quantity, 5.0);
    assert_eq!(line.recipe_ids, BTreeSet::from([1, 2]));

    // A key that disappears loses its state
    let state = store.remove_recipe(1, &catalog)?;
    assert!(state.find(&eggs).unwrap().purchased);
    let state = store.remove_recipe(2, &catalog)?;
    assert!(state.find(&eggs).is_none());
    let state = store.add_recipe(2, &catalog, 1.0)?;
    assert!(!state.find(&eggs).unwrap().purchased);
    Ok(())
}

#[test]
fn test_removed_ingredient_returns_on_recompute() -> Result<()> {
    let catalog = sample_catalog();
    let mut store = new_store();
    store.add_recipe(1, &catalog, 1.0)?;

    let salt = CanonicalKey::new("盐", "g");
    assert!(store.remove_ingredient(&salt)?);
    let state = store.load();
    assert!(state.find(&salt).is_none());
    assert_eq!(state.selected_recipe_ids, vec![1]);

    let state = store.update_recipe_scale(1, 1.0, &catalog)?;
    assert_eq!(quantity_of(&state, "盐", "g"), Some(2.0));
    Ok(())
}

#[test]
fn test_milk_volume_merges_with_mass() -> Result<()> {
    let catalog = RecipeCatalog::new(vec![
        Recipe::new(1, "r1").with_ingredient("纯牛奶", 200.0, "毫升"),
        Recipe::new(2, "r2").with_ingredient("牛奶", 50.0, "g"),
    ]);
    let mut store = new_store();

    store.add_recipe(1, &catalog, 1.0)?;
    let state = store.add_recipe(2, &catalog, 2.0)?;
    assert_eq!(state.ingredients.len(), 1);
    assert_eq!(quantity_of(&state, "牛奶", "g"), Some(300.0));
    Ok(())
}

#[test]
fn test_corrupt_storage_loads_empty() -> Result<()> {
    let catalog = sample_catalog();
    let storage = MemoryStorage::new().with_item(DEFAULT_STORAGE_KEY, "{\"selectedRecipeIds\": [1,");
    let mut store = ShoppingListStore::new(storage);

    assert_eq!(store.load(), ShoppingListState::default());

    let state = store.add_recipe(1, &catalog, 1.0)?;
    assert_eq!(state.selected_recipe_ids, vec![1]);
    Ok(())
}

#[test]
fn test_legacy_document_without_scales() -> Result<()> {
    let catalog = sample_catalog();
    let stored = r#"{"selectedRecipeIds":[1,3],"ingredients":[
        {"name":"盐","quantity":2,"unit":"g","purchased":true},
        {"name":"盐","quantity":1,"unit":"克","purchased":false}
    ]}"#;
    let mut store = ShoppingListStore::new(MemoryStorage::new().with_item(DEFAULT_STORAGE_KEY, stored));

    let state = store.load();
    assert_eq!(state.scale_of(1), Some(1.0));
    assert_eq!(state.scale_of(3), Some(1.0));
    assert_eq!(state.ingredients.len(), 1);
    assert_eq!(quantity_of(&state, "盐", "g"), Some(3.0));

    let state = store.update_recipe_scale(3, 2.0, &catalog)?;
    let salt = state.find(&CanonicalKey::new("盐", "g")).unwrap();
    assert_eq!(salt.quantity, 4.0);
    assert!(salt.purchased);
    Ok(())
}

#[test]
fn test_every_mutation_rereads_storage() -> Result<()> {
    let catalog = sample_catalog();
    let mut store = new_store();
    store.add_recipe(1, &catalog, 1.0)?;

    // Another writer replaces the document between operations
    let mut storage = store.into_storage();
    storage.set_item(DEFAULT_STORAGE_KEY, r#"{"selectedRecipeIds":[3],"recipeScales":{"3":2}}"#)?;
    let mut store = ShoppingListStore::new(storage);

    let state = store.add_recipe(2, &catalog, 1.0)?;
    assert_eq!(state.selected_recipe_ids, vec![3, 2]);
    assert_eq!(quantity_of(&state, "面条", "g"), Some(400.0));
    assert_eq!(quantity_of(&state, "番茄", "个"), None);
    Ok(())
}
