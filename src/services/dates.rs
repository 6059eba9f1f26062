use chrono::{
    format::{Item, StrftimeItems},
    DateTime, Locale, Utc,
};

use crate::error::AppError;

/// Long-form, locale-aware date rendering used in notification copy.
#[derive(Debug, Clone)]
pub struct DateFormatter {
    locale: Locale,
    pattern: String,
}

impl DateFormatter {
    /// Fails on an unknown locale name (e.g. `pt_BR`, `en_US`) or a pattern
    /// chrono cannot parse, so a bad setting is caught at startup rather than
    /// when the first mail is rendered.
    pub fn new(locale: &str, pattern: impl Into<String>) -> Result<Self, AppError> {
        let locale = Locale::try_from(locale)
            .map_err(|err| AppError::Config(format!("invalid DATE_LOCALE {locale:?}: {err:?}")))?;
        let pattern = pattern.into();
        if StrftimeItems::new_with_locale(&pattern, locale).any(|item| matches!(item, Item::Error))
        {
            return Err(AppError::Config(format!("invalid DATE_PATTERN {pattern:?}")));
        }
        Ok(Self { locale, pattern })
    }

    pub fn long_date(&self, timestamp: DateTime<Utc>) -> String {
        timestamp
            .format_localized(&self.pattern, self.locale)
            .to_string()
    }
}
