use modelstack_types::Language;
use std::collections::BTreeMap;

/// Languages consulted, in order, when resolving a localized description.
///
/// Resolution tries the user language, then the system language, then `EN`.
/// Callers fall back to the model identifier when none of them has a value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LanguagePreference {
    pub user: Language,
    pub system: Language,
}

impl LanguagePreference {
    pub fn new(user: Language, system: Language) -> Self {
        Self { user, system }
    }

    /// Returns the first value `lookup` yields for the preferred languages.
    pub fn resolve<'a, F>(&self, lookup: F) -> Option<&'a str>
    where
        F: Fn(&Language) -> Option<&'a str>,
    {
        lookup(&self.user)
            .or_else(|| lookup(&self.system))
            .or_else(|| lookup(&Language::fallback()))
    }

    /// Resolves a label map, falling back to `id`.
    pub fn describe(&self, labels: &BTreeMap<Language, String>, id: &str) -> String {
        self.resolve(|language| {
            labels
                .get(language)
                .map(String::as_str)
                .filter(|label| !label.is_empty())
        })
        .unwrap_or(id)
        .to_string()
    }
}
