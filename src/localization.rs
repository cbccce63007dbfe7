use fluent_bundle::concurrent::FluentBundle;
use fluent_bundle::{FluentArgs, FluentResource, FluentValue};
use std::sync::LazyLock;
use tracing::warn;
use unic_langid::LanguageIdentifier;

const EN_RESOURCE: &str = include_str!("../locales/en/main.ftl");

/// Localization manager for the shopping list bot
pub struct LocalizationManager {
    bundle: FluentBundle<FluentResource>,
}

impl LocalizationManager {
    /// Create a new localization manager with the embedded English resource
    pub fn new() -> Self {
        let locale: LanguageIdentifier = "en".parse().unwrap_or_default();
        let mut bundle = FluentBundle::new_concurrent(vec![locale]);
        // Replies are HTML, Unicode isolation marks would only get in the way
        bundle.set_use_isolating(false);

        let resource = match FluentResource::try_new(EN_RESOURCE.to_string()) {
            Ok(resource) => resource,
            Err((resource, errors)) => {
                warn!(errors = ?errors, "Localization resource has syntax errors");
                resource
            }
        };
        if let Err(errors) = bundle.add_resource(resource) {
            warn!(errors = ?errors, "Failed to add localization resource");
        }

        Self { bundle }
    }

    /// Get a localized message
    pub fn get_message(&self, key: &str, args: Option<&FluentArgs>) -> String {
        let msg = match self.bundle.get_message(key) {
            Some(msg) => msg,
            None => return format!("Missing translation: {key}"),
        };

        let pattern = match msg.value() {
            Some(pattern) => pattern,
            None => return format!("Missing value for key: {key}"),
        };

        let mut errors = vec![];
        let value = self.bundle.format_pattern(pattern, args, &mut errors);
        if !errors.is_empty() {
            warn!(key, errors = ?errors, "Errors while formatting localized message");
        }
        value.into_owned()
    }

    /// Get a localized message with simple string arguments
    pub fn get_message_with_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        let mut fluent_args = FluentArgs::new();
        for (name, value) in args {
            fluent_args.set(*name, FluentValue::from(*value));
        }
        self.get_message(key, Some(&fluent_args))
    }
}

impl Default for LocalizationManager {
    fn default() -> Self {
        Self::new()
    }
}

static LOCALIZATION_MANAGER: LazyLock<LocalizationManager> = LazyLock::new(LocalizationManager::new);

/// Convenience function to get a localized message
pub fn t(key: &str) -> String {
    LOCALIZATION_MANAGER.get_message(key, None)
}

/// Convenience function to get a localized message with arguments
pub fn t_args(key: &str, args: &[(&str, &str)]) -> String {
    LOCALIZATION_MANAGER.get_message_with_args(key, args)
}
