//! UI locale selected from the `i18next` cookie.

/// Cookie carrying the client's locale hint.
pub const LOCALE_COOKIE: &str = "i18next";

/// Locales the translator has catalogues for.
pub const SUPPORTED_LOCALES: [&str; 2] = ["zh-CN", "en-US"];

/// Locale applied when the hint is missing or unsupported.
pub const DEFAULT_LOCALE: &str = "en-US";

/// Locale tag as the client sent it.
///
/// Matching is case-insensitive but the original spelling is kept; the
/// translator lowercases with [`Locale::catalogue_key`].
///
/// # Examples
/// ```
/// use foundation::domain::Locale;
///
/// assert_eq!(Locale::resolve(Some("ZH-cn")).as_str(), "ZH-cn");
/// assert_eq!(Locale::resolve(Some("fr-FR")).as_str(), "en-US");
/// assert_eq!(Locale::resolve(None).catalogue_key(), "en-us");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    /// Pick the locale for a raw cookie value.
    #[must_use]
    pub fn resolve(hint: Option<&str>) -> Self {
        hint.map(str::trim)
            .filter(|value| {
                SUPPORTED_LOCALES
                    .iter()
                    .any(|supported| supported.eq_ignore_ascii_case(value))
            })
            .map_or_else(Self::default, |value| Self(value.to_owned()))
    }

    /// Tag in the client's spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased tag used to address translation catalogues.
    #[must_use]
    pub fn catalogue_key(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl Default for Locale {
    fn default() -> Self {
        Self(DEFAULT_LOCALE.to_owned())
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
