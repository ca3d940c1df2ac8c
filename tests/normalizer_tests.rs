//! # Normalizer Tests
//!
//! Name, unit and category normalization through the public API.

use shopping_list::ingredient_normalizer::{get_category, normalize_name, normalize_unit, Normalizer};

#[test]
fn test_normalize_name_is_idempotent() {
    let inputs = [
        "  鸡蛋 ",
        "🍅番茄",
        "🥚鸡蛋🥚",
        "纯牛奶",
        "牛奶🥛",
        "纯牛奶🥛",
        "🌶\u{FE0F}小米辣",
        "",
        "   ",
        "unknown ingredient",
    ];

    for input in inputs {
        let once = normalize_name(input);
        assert_eq!(normalize_name(&once), once, "input: {input:?}");
    }
}

#[test]
fn test_normalize_name_strips_symbols_and_aliases() {
    assert_eq!(normalize_name("🍅番茄"), "番茄");
    assert_eq!(normalize_name(" 🥚 鸡蛋 "), "鸡蛋");
    assert_eq!(normalize_name("纯牛奶"), "牛奶");
    assert_eq!(normalize_name("牛奶🥛"), "牛奶");
    assert_eq!(normalize_name(""), "");
}

#[test]
fn test_normalize_unit() {
    assert_eq!(normalize_unit("克"), "g");
    assert_eq!(normalize_unit(" g "), "g");
    assert_eq!(normalize_unit("毫升"), "ml");
    assert_eq!(normalize_unit("个"), "个");
    assert_eq!(normalize_unit("勺"), "勺");
}

#[test]
fn test_density_rule_applies_to_one_ingredient_only() {
    let normalizer = Normalizer::default();

    let milk = normalizer.normalize_quantity_by_name("纯牛奶", 250.0, "毫升");
    assert_eq!((milk.quantity, milk.unit.as_str()), (250.0, "g"));

    let water = normalizer.normalize_quantity_by_name("水", 250.0, "毫升");
    assert_eq!((water.quantity, water.unit.as_str()), (250.0, "ml"));

    let eggs = normalizer.normalize_quantity_by_name("鸡蛋", f64::NAN, "个");
    assert_eq!(eggs.quantity, 0.0);
}

#[test]
fn test_categories() {
    assert_eq!(get_category("盐"), "调味品");
    assert_eq!(get_category("鸡蛋"), "蛋奶");
    assert_eq!(get_category("五花猪肉"), "肉类");
    assert_eq!(get_category("香蕉"), "水果");
    assert_eq!(get_category("花生油"), "食用油");
    assert_eq!(get_category("龙虾"), "海鲜");
    // Listed under both vegetables and seafood; the earlier category wins
    assert_eq!(get_category("海带"), "蔬菜");
    assert_eq!(get_category("不知名的东西"), "其他");
    assert_eq!(get_category(""), "其他");
}

#[test]
fn test_custom_tables() {
    let normalizer = Normalizer::new()
        .with_name_alias("西红柿", "番茄")
        .with_unit_synonym("公克", "g");

    assert_eq!(normalizer.normalize_name("西红柿"), "番茄");
    assert_eq!(normalizer.normalize_unit("公克"), "g");
    assert!(normalizer.categories().any(|category| category == "其他"));
}
