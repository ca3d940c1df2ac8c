use anyhow::{anyhow, Result};
use fluent_bundle::{FluentArgs, FluentBundle, FluentResource, FluentValue};
use std::collections::HashMap;
use unic_langid::LanguageIdentifier;

use crate::shopping_list::SharedLinkOutcome;

pub const DEFAULT_LANGUAGE: &str = "en";

/// Languages with a bundled message file
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "zh"];

const MESSAGE_SOURCES: &[(&str, &str)] = &[
    ("en", include_str!("../locales/en/main.ftl")),
    ("zh", include_str!("../locales/zh/main.ftl")),
];

/// Shopping category to message id
const CATEGORY_MESSAGES: &[(&str, &str)] = &[
    ("蔬菜", "category-vegetables"),
    ("水果", "category-fruits"),
    ("肉类", "category-meat"),
    ("海鲜", "category-seafood"),
    ("蛋奶", "category-eggs-dairy"),
    ("主食", "category-staples"),
    ("调味品", "category-seasonings"),
    ("食用油", "category-oils"),
    ("其他", "category-other"),
];

/// Localization manager for shopping list messages
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Create a manager with every supported language loaded
    pub fn new() -> Result<Self> {
        let mut bundles = HashMap::new();

        for (language, source) in MESSAGE_SOURCES {
            let bundle = Self::create_bundle(language, source)?;
            bundles.insert(language.to_string(), bundle);
        }

        Ok(Self { bundles })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(language: &str, source: &str) -> Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = language.parse()?;
        let mut bundle = FluentBundle::new(vec![locale]);
        // Plain terminal output, no bidi isolation marks around arguments
        bundle.set_use_isolating(false);

        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid {} messages: {:?}", language, errors))?;
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate {} messages: {:?}", language, errors))?;

        Ok(bundle)
    }

    /// Get a localized message in the default language
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        self.get_message_in_language(key, DEFAULT_LANGUAGE, args)
    }

    /// Get a localized message in a specific language.
    ///
    /// Unsupported languages and keys missing from a translation fall back
    /// to English. Numeric argument values are formatted as numbers.
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let bundle = [language, DEFAULT_LANGUAGE]
            .iter()
            .filter_map(|lang| self.bundles.get(*lang))
            .find(|bundle| bundle.has_message(key));

        let Some(bundle) = bundle else {
            return format!("Missing translation: {}", key);
        };
        let Some(pattern) = bundle.get_message(key).and_then(|msg| msg.value()) else {
            return format!("Missing value for key: {}", key);
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                let value = match value.parse::<f64>() {
                    Ok(number) => FluentValue::from(number),
                    Err(_) => FluentValue::from(*value),
                };
                fluent_args.set(*name, value);
            }
            fluent_args
        });

        let mut errors = vec![];
        bundle
            .format_pattern(pattern, fluent_args.as_ref(), &mut errors)
            .into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, language: &str, args: &[(&str, &str)]) -> String {
        let args_map: HashMap<&str, &str> = args.iter().cloned().collect();
        self.get_message_in_language(key, language, Some(&args_map))
    }

    /// Display name of a shopping category; unknown categories pass through
    pub fn category_label(&self, category: &str, language: &str) -> String {
        CATEGORY_MESSAGES
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, key)| self.get_message_in_language(key, language, None))
            .unwrap_or_else(|| category.to_string())
    }

    /// User notification for a share link outcome, `None` when nothing was shared
    pub fn share_outcome_message(&self, outcome: &SharedLinkOutcome, language: &str) -> Option<String> {
        let message = match outcome {
            SharedLinkOutcome::NotShared => return None,
            SharedLinkOutcome::Invalid => self.get_message_in_language("share-invalid", language, None),
            SharedLinkOutcome::NoValidRecipes => {
                self.get_message_in_language("share-no-recipes", language, None)
            }
            SharedLinkOutcome::Applied { loaded, dropped } => {
                let loaded = loaded.to_string();
                let mut message =
                    self.get_message_with_args("share-loaded", language, &[("count", loaded.as_str())]);
                if *dropped > 0 {
                    let dropped = dropped.to_string();
                    message.push(' ');
                    message.push_str(&self.get_message_with_args(
                        "share-dropped",
                        language,
                        &[("count", dropped.as_str())],
                    ));
                }
                message
            }
        };
        Some(message)
    }
}

/// Pick a supported language from a locale string such as `zh-CN` or
/// `zh_CN.UTF-8`, falling back to English
pub fn detect_language(locale: Option<&str>) -> String {
    locale
        .and_then(|locale| {
            locale
                .split(['-', '_', '.'])
                .next()
                .map(|primary| primary.trim().to_ascii_lowercase())
        })
        .filter(|primary| SUPPORTED_LANGUAGES.contains(&primary.as_str()))
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
}
