//! Port for localized error messages.

use crate::domain::Locale;

/// Looks up localized text by key.
pub trait Translator: Send + Sync {
    /// Text for `key` in `locale`, or `None` when the catalogue has no entry.
    fn translate(&self, key: &str, locale: &Locale) -> Option<String>;
}

/// Translator with no catalogue; every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTranslator;

impl Translator for NoopTranslator {
    fn translate(&self, _key: &str, _locale: &Locale) -> Option<String> {
        None
    }
}
