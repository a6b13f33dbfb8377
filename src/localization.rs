use anyhow::{anyhow, Result};
use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource};
use std::collections::HashMap;
use tracing::warn;
use unic_langid::LanguageIdentifier;

const RESOURCES: &[(&str, &str)] = &[
    ("ru", include_str!("../locales/ru/main.ftl")),
    ("en", include_str!("../locales/en/main.ftl")),
];

/// Localization manager for the bot's user-facing texts
pub struct Localizer {
    bundles: HashMap<String, FluentBundle<FluentResource>>,
    default_language: String,
}

impl Localizer {
    /// Create a new localization manager with every bundled language
    pub fn new(default_language: &str) -> Result<Self> {
        let mut bundles = HashMap::new();

        for (code, source) in RESOURCES {
            let locale: LanguageIdentifier = code.parse()?;
            bundles.insert(code.to_string(), Self::create_bundle(locale, source)?);
        }

        let default_language = if bundles.contains_key(default_language) {
            default_language.to_string()
        } else {
            warn!(language = default_language, "Unsupported default language, using ru");
            "ru".to_string()
        };

        Ok(Self {
            bundles,
            default_language,
        })
    }

    /// Create a fluent bundle for a specific locale
    fn create_bundle(locale: LanguageIdentifier, source: &str) -> Result<FluentBundle<FluentResource>> {
        let resource = FluentResource::try_new(source.to_string())
            .map_err(|(_, errors)| anyhow!("Invalid {locale} resource: {errors:?}"))?;

        let mut bundle = FluentBundle::new_concurrent(vec![locale.clone()]);
        bundle.set_use_isolating(false);
        bundle
            .add_resource(resource)
            .map_err(|errors| anyhow!("Duplicate messages in {locale} resource: {errors:?}"))?;

        Ok(bundle)
    }

    /// Bundle key for a Telegram language code such as `en-US`
    pub fn resolve_language(&self, language_code: Option<&str>) -> &str {
        language_code
            .and_then(|code| code.split(|c: char| c == '-' || c == '_').next())
            .map(str::to_lowercase)
            .and_then(|code| self.bundles.get_key_value(code.as_str()).map(|(k, _)| k.as_str()))
            .unwrap_or(self.default_language.as_str())
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, language_code: Option<&str>, args: Option<&FluentArgs>) -> String {
        let language = self.resolve_language(language_code);
        let Some(bundle) = self.bundles.get(language) else {
            return format!("Missing translation: {key}");
        };

        let Some(msg) = bundle.get_message(key) else {
            return format!("Missing translation: {key}");
        };

        let Some(pattern) = msg.value() else {
            return format!("Missing value for key: {key}");
        };

        let mut errors = vec![];
        let value = bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(key, language, ?errors, "Fluent formatting errors");
        }

        value.into_owned()
    }

    /// Localized message without arguments
    pub fn t(&self, key: &str, language_code: Option<&str>) -> String {
        self.get_message(key, language_code, None)
    }

    /// Localized message with simple string arguments
    pub fn t_args(&self, key: &str, args: &[(&str, &str)], language_code: Option<&str>) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, *value);
        }
        self.get_message(key, language_code, Some(&fluent_args))
    }

    pub fn has_message(&self, key: &str, language: &str) -> bool {
        self.bundles
            .get(language)
            .is_some_and(|bundle| bundle.has_message(key))
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }
}
