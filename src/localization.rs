//! # Localization Module
//!
//! Fluent-based message catalogs loaded from `<locales_dir>/<lang>/main.ftl`.
//! Unsupported languages and missing keys fall back to English.

use anyhow::{Context, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use unic_langid::LanguageIdentifier;

use crate::config::DEFAULT_LOCALES_DIR;

pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "fr"];
pub const DEFAULT_LANGUAGE: &str = "en";

/// Localization manager for the EasyCook bot
pub struct LocalizationManager {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
}

impl LocalizationManager {
    /// Load every supported language from `./locales`
    pub fn new() -> Result<Self> {
        Self::with_locales_dir(DEFAULT_LOCALES_DIR)
    }

    /// Load every supported language from the given directory
    ///
    /// English is mandatory; other languages are skipped with a warning when missing.
    pub fn with_locales_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut bundles = HashMap::new();

        for lang in SUPPORTED_LANGUAGES {
            match Self::create_bundle(dir, lang) {
                Ok(bundle) => {
                    bundles.insert(lang.to_string(), bundle);
                }
                Err(e) if *lang == DEFAULT_LANGUAGE => return Err(e),
                Err(e) => warn!(language = %lang, error = %e, "Skipping locale"),
            }
        }

        debug!(languages = bundles.len(), dir = %dir.display(), "Localization loaded");
        Ok(Self { bundles })
    }

    fn create_bundle(dir: &Path, lang: &str) -> Result<FluentBundle<FluentResource>> {
        let locale: LanguageIdentifier = lang.parse().context("Invalid language identifier")?;
        let path: PathBuf = dir.join(lang).join("main.ftl");
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let resource = FluentResource::try_new(content)
            .map_err(|(_, errors)| anyhow::anyhow!("Invalid Fluent syntax in {}: {:?}", path.display(), errors))?;

        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow::anyhow!("Duplicate messages in {}: {:?}", path.display(), errors))?;
        Ok(bundle)
    }

    fn empty() -> Self {
        Self {
            bundles: HashMap::new(),
        }
    }

    /// Get a message in a language, falling back to English
    pub fn get_message_in_language(
        &self,
        key: &str,
        language: &str,
        args: Option<&HashMap<&str, &str>>,
    ) -> String {
        let language = detect_language(Some(language));

        let found = [language, DEFAULT_LANGUAGE].iter().find_map(|lang| {
            let bundle = self.bundles.get(*lang)?;
            let pattern = bundle.get_message(key)?.value()?;
            Some((bundle, pattern))
        });

        let Some((bundle, pattern)) = found else {
            return format!("Missing translation: {key}");
        };

        let fluent_args = args.map(|args| {
            let mut fluent_args = FluentArgs::new();
            for (name, value) in args {
                fluent_args.set(*name, FluentValue::from(*value));
            }
            fluent_args
        });

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, fluent_args.as_ref(), &mut errors);
        if !errors.is_empty() {
            debug!(key, errors = ?errors, "Fluent formatting errors");
        }
        value.into_owned()
    }

    /// Message in the default language
    pub fn get_message(&self, key: &str, args: Option<&HashMap<&str, &str>>) -> String {
        self.get_message_in_language(key, DEFAULT_LANGUAGE, args)
    }
}

/// Map a Telegram language code ("fr-CA") to a supported language
pub fn detect_language(language_code: Option<&str>) -> &'static str {
    let Some(code) = language_code else {
        return DEFAULT_LANGUAGE;
    };
    let primary = code.split(['-', '_']).next().unwrap_or_default().to_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .copied()
        .find(|lang| *lang == primary)
        .unwrap_or(DEFAULT_LANGUAGE)
}

static LOCALIZATION_MANAGER: OnceLock<LocalizationManager> = OnceLock::new();

/// Initialize the global localization manager from `./locales`
pub fn init_localization() -> Result<()> {
    init_localization_from(DEFAULT_LOCALES_DIR)
}

/// Initialize the global localization manager from a directory; later calls are no-ops
pub fn init_localization_from(dir: impl AsRef<Path>) -> Result<()> {
    if LOCALIZATION_MANAGER.get().is_some() {
        return Ok(());
    }
    let manager = LocalizationManager::with_locales_dir(dir)?;
    let _ = LOCALIZATION_MANAGER.set(manager);
    Ok(())
}

/// Get the global localization manager, loading the default directory on first use
pub fn get_localization_manager() -> &'static LocalizationManager {
    LOCALIZATION_MANAGER.get_or_init(|| {
        LocalizationManager::new().unwrap_or_else(|e| {
            warn!(error = %e, "Localization unavailable, messages will show their keys");
            LocalizationManager::empty()
        })
    })
}

/// Localized message for a Telegram language code
pub fn t_lang(key: &str, language_code: Option<&str>) -> String {
    get_localization_manager().get_message_in_language(key, detect_language(language_code), None)
}

/// Localized message with arguments for a Telegram language code
pub fn t_args_lang(key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
    let args_map: HashMap<&str, &str> = args.iter().copied().collect();
    get_localization_manager().get_message_in_language(key, detect_language(language_code), Some(&args_map))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Some("fr_FR")), "fr");
        assert_eq!(detect_language(Some("EN")), "en");
        assert_eq!(detect_language(Some("")), "en");
    }

    #[test]
    fn test_empty_manager_reports_missing_keys() {
        let manager = LocalizationManager::empty();
        assert_eq!(manager.get_message("welcome-title", None), "Missing translation: welcome-title");
    }
}
