use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shopping_list::config::AppConfig;
use shopping_list::db::SqliteStorage;
use shopping_list::ingredient_merger::{group_by_category, CanonicalKey};
use shopping_list::localization::{detect_language, LocalizationManager};
use shopping_list::nutrition::sum_nutrition;
use shopping_list::recipe_model::{Catalog, RecipeCatalog, RecipeId};
use shopping_list::scale::parse_scale;
use shopping_list::shopping_list::ShoppingListStore;

/// Build a shopping list from selected recipes
#[derive(Parser, Debug)]
#[command(name = "shopping-list")]
#[command(version, about = "Recipe shopping list builder", long_about = None)]
struct Cli {
    /// Recipe catalog JSON file (overrides SHOPPING_LIST_CATALOG)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// SQLite database file (overrides SHOPPING_LIST_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Message language, "en" or "zh" (overrides SHOPPING_LIST_LANG)
    #[arg(long, global = true)]
    lang: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a recipe to the shopping list
    Add {
        recipe_id: RecipeId,
        /// Portion multiplier, clamped to 0.1..=20
        #[arg(short, long, default_value = "1")]
        scale: String,
    },

    /// Remove a recipe from the shopping list
    Remove { recipe_id: RecipeId },

    /// Change the portion multiplier of a selected recipe
    Scale { recipe_id: RecipeId, scale: String },

    /// Flip the purchased flag of an ingredient
    Toggle { name: String, unit: String },

    /// Delete an ingredient line until the list is next recomputed
    RemoveItem { name: String, unit: String },

    /// Mark every ingredient as purchased
    MarkAll {
        /// Mark every ingredient as not purchased instead
        #[arg(long)]
        undo: bool,
    },

    /// Empty the shopping list
    Clear,

    /// Print the list grouped by category
    Show,

    /// Print purchase progress
    Stats,

    /// Print nutrition totals of the selected recipes
    Nutrition,

    /// Print a share link for the current list
    Share {
        /// Also share which ingredients are already purchased
        #[arg(long)]
        include_purchased: bool,

        /// Page the link points to (overrides SHOPPING_LIST_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Load a shared list from a page URL
    Open { url: String },

    /// Print the stored document as JSON
    Export,
}

struct App {
    config: AppConfig,
    store: ShoppingListStore<SqliteStorage>,
    messages: LocalizationManager,
}

impl App {
    fn say(&self, key: &str, args: &[(&str, &str)]) {
        let args: HashMap<&str, &str> = args.iter().cloned().collect();
        println!(
            "{}",
            self.messages
                .get_message_in_language(key, &self.config.language, Some(&args))
        );
    }

    fn catalog(&self) -> Result<RecipeCatalog> {
        RecipeCatalog::from_path(&self.config.catalog_path)
            .with_context(|| format!("Failed to load recipes from {}", self.config.catalog_path.display()))
    }

    fn key(&self, name: &str, unit: &str) -> CanonicalKey {
        CanonicalKey::normalized(self.store.normalizer(), name, unit)
    }
}

fn title_of(catalog: &RecipeCatalog, recipe_id: RecipeId) -> String {
    catalog
        .find_recipe_by_id(recipe_id)
        .map(|recipe| recipe.title.clone())
        .unwrap_or_else(|| recipe_id.to_string())
}

/// Two decimals at most, trailing zeros dropped
fn format_number(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    formatted.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn init_tracing(json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(catalog) = cli.catalog {
        config.catalog_path = catalog;
    }
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(lang) = cli.lang.as_deref() {
        config.language = detect_language(Some(lang));
    }

    init_tracing(config.log_json);
    info!(database = %config.database_path.display(), "Starting shopping list");

    let storage = SqliteStorage::open(&config.database_path)
        .with_context(|| format!("Failed to open database at {}", config.database_path.display()))?;
    let app = App {
        store: config.store(storage),
        messages: LocalizationManager::new().context("Failed to load messages")?,
        config,
    };

    run(app, cli.command)
}

fn run(mut app: App, command: Commands) -> Result<()> {
    match command {
        Commands::Add { recipe_id, scale } => {
            let catalog = app.catalog()?;
            let title = title_of(&catalog, recipe_id);
            if !catalog.contains(recipe_id) {
                app.say("recipe-unknown", &[("id", &recipe_id.to_string())]);
            } else if app.store.contains_recipe(recipe_id) {
                app.say("recipe-already-added", &[("title", &title)]);
            } else {
                let state = app.store.add_recipe(recipe_id, &catalog, parse_scale(&scale))?;
                let scale = format_number(state.scale_of(recipe_id).unwrap_or(1.0));
                app.say("recipe-added", &[("title", &title), ("scale", &scale)]);
            }
        }
        Commands::Remove { recipe_id } => {
            let catalog = app.catalog()?;
            if app.store.contains_recipe(recipe_id) {
                app.store.remove_recipe(recipe_id, &catalog)?;
                app.say("recipe-removed", &[("title", &title_of(&catalog, recipe_id))]);
            } else {
                app.say("recipe-not-selected", &[("id", &recipe_id.to_string())]);
            }
        }
        Commands::Scale { recipe_id, scale } => {
            let catalog = app.catalog()?;
            if app.store.contains_recipe(recipe_id) {
                let state = app.store.update_recipe_scale(recipe_id, parse_scale(&scale), &catalog)?;
                let scale = format_number(state.scale_of(recipe_id).unwrap_or(1.0));
                app.say(
                    "scale-updated",
                    &[("title", &title_of(&catalog, recipe_id)), ("scale", &scale)],
                );
            } else {
                app.say("recipe-not-selected", &[("id", &recipe_id.to_string())]);
            }
        }
        Commands::Toggle { name, unit } => {
            let key = app.key(&name, &unit);
            let item = key.to_string();
            match app.store.load().find(&key).map(|line| line.purchased) {
                Some(was_purchased) => {
                    app.store.toggle_purchased(&key, !was_purchased)?;
                    let message = if was_purchased { "item-unpurchased" } else { "item-purchased" };
                    app.say(message, &[("item", &item)]);
                }
                None => app.say("item-not-found", &[("item", &item)]),
            }
        }
        Commands::RemoveItem { name, unit } => {
            let key = app.key(&name, &unit);
            let item = key.to_string();
            if app.store.remove_ingredient(&key)? {
                app.say("item-removed", &[("item", &item)]);
            } else {
                app.say("item-not-found", &[("item", &item)]);
            }
        }
        Commands::MarkAll { undo } => {
            app.store.mark_all_purchased(!undo)?;
            app.say(if undo { "all-unpurchased" } else { "all-purchased" }, &[]);
        }
        Commands::Clear => {
            app.store.clear()?;
            app.say("list-cleared", &[]);
        }
        Commands::Show => show(&app),
        Commands::Stats => {
            let stats = app.store.stats();
            app.say(
                "stats-summary",
                &[
                    ("purchased", &stats.purchased.to_string()),
                    ("total", &stats.total.to_string()),
                    ("remaining", &stats.remaining.to_string()),
                    ("recipes", &stats.selected_recipes.to_string()),
                ],
            );
            for category in app.store.category_stats() {
                let label = app
                    .messages
                    .category_label(&category.category, &app.config.language);
                app.say(
                    "category-progress",
                    &[
                        ("category", &label),
                        ("purchased", &category.purchased.to_string()),
                        ("total", &category.total.to_string()),
                    ],
                );
            }
        }
        Commands::Nutrition => {
            let catalog = app.catalog()?;
            let totals = sum_nutrition(&app.store.load(), &catalog);
            app.say(
                "nutrition-summary",
                &[
                    ("calories", &format_number(totals.calories)),
                    ("protein", &format_number(totals.protein)),
                    ("carbs", &format_number(totals.carbs)),
                    ("fat", &format_number(totals.fat)),
                    ("salt", &format_number(totals.salt)),
                ],
            );
        }
        Commands::Share {
            include_purchased,
            base_url,
        } => {
            let base_url = base_url.unwrap_or_else(|| app.config.base_url.clone());
            match app.store.generate_share_link(&base_url, include_purchased)? {
                Some(url) => app.say("share-link-ready", &[("url", &url)]),
                None => app.say("share-empty", &[]),
            }
        }
        Commands::Open { url } => {
            let catalog = app.catalog()?;
            let result = app
                .store
                .apply_shared_link(&url, &catalog)
                .with_context(|| format!("Failed to open {}", url))?;
            if let Some(message) = app
                .messages
                .share_outcome_message(&result.outcome, &app.config.language)
            {
                println!("{}", message);
            }
            info!(url = %result.clean_url, "Share parameter consumed");
        }
        Commands::Export => println!("{}", app.store.export_json()?),
    }

    Ok(())
}

fn show(app: &App) {
    let state = app.store.load();
    if state.ingredients.is_empty() {
        app.say("list-empty", &[]);
        return;
    }

    app.say(
        "list-header",
        &[("recipes", &state.selected_recipe_ids.len().to_string())],
    );
    for group in group_by_category(&state.ingredients) {
        println!();
        println!(
            "{}",
            app.messages.category_label(group.category, &app.config.language)
        );
        for line in group.items {
            let mark = if line.purchased { "x" } else { " " };
            println!("  [{}] {} {} {}", mark, line.name, format_number(line.quantity), line.unit);
        }
    }
}
