//! Port onto the text-localization collaborator.

use std::borrow::Cow;
use std::collections::HashMap;

use lectern_model::Document;

/// Translates stable keys (`categories.armoplit`, `docs.manual.title`)
/// into display text for the active locale.
pub trait Localizer: Send + Sync {
    fn lookup(&self, key: &str) -> Option<String>;
}

/// Localizer with no entries; every lookup misses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTranslations;

impl Localizer for NoTranslations {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Fixed key→text table, e.g. loaded from a locale bundle.
#[derive(Debug, Clone, Default)]
pub struct StaticTranslations {
    entries: HashMap<String, String>,
}

impl StaticTranslations {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Localizer for StaticTranslations {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Title shown for a document: the translated title key, else the literal
/// title, else the raw title key, else empty.
pub fn display_title<'a>(
    document: &'a Document,
    localizer: &dyn Localizer,
) -> Cow<'a, str> {
    if let Some(key) = document.title_key.as_deref()
        && let Some(text) = localizer.lookup(key)
    {
        return Cow::Owned(text);
    }
    match (document.title.as_deref(), document.title_key.as_deref()) {
        (Some(title), _) => Cow::Borrowed(title),
        (None, Some(key)) => Cow::Borrowed(key),
        (None, None) => Cow::Borrowed(""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lectern_model::DocumentId;

    #[test]
    fn translated_key_wins_over_literal_title() {
        let translations =
            StaticTranslations::new([("docs.manual", "Betriebsanleitung")]);
        let doc = Document::new(DocumentId::new("d1").unwrap(), "a")
            .with_title("Manual")
            .with_title_key("docs.manual");
        assert_eq!(display_title(&doc, &translations), "Betriebsanleitung");
        assert_eq!(display_title(&doc, &NoTranslations), "Manual");
    }

    #[test]
    fn falls_back_to_key_then_empty() {
        let keyed = Document::new(DocumentId::new("d1").unwrap(), "a")
            .with_title_key("docs.untranslated");
        let bare = Document::new(DocumentId::new("d2").unwrap(), "a");
        assert_eq!(display_title(&keyed, &NoTranslations), "docs.untranslated");
        assert_eq!(display_title(&bare, &NoTranslations), "");
    }
}
