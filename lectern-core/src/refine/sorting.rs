use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};
use icu_collator::options::{CollatorOptions, Strength};
use icu_collator::{Collator, CollatorBorrowed};
use lectern_model::{Document, SortBy};
use tracing::warn;

use crate::localize::{Localizer, display_title};

/// Sort refined documents in place.
///
/// `Recent` is newest first with undated documents last. `Alpha` orders by
/// the resolved display title under [`TitleCollator`]. Both sorts are
/// stable, so equal keys keep the window order the store delivered.
pub fn sort_documents(
    documents: &mut Vec<&Document>,
    sort_by: SortBy,
    localizer: &dyn Localizer,
) {
    match sort_by {
        SortBy::Recent => documents.sort_by(|a, b| {
            compare_recent(a.updated_at.as_ref(), b.updated_at.as_ref())
        }),
        SortBy::Alpha => {
            let collator = TitleCollator::new();
            let mut keyed: Vec<(Cow<'_, str>, &Document)> = documents
                .drain(..)
                .map(|doc| (display_title(doc, localizer), doc))
                .collect();
            keyed.sort_by(|(a, _), (b, _)| collator.compare(a, b));
            documents.extend(keyed.into_iter().map(|(_, doc)| doc));
        }
    }
}

/// Descending by timestamp; a missing timestamp is the oldest possible.
pub fn compare_recent(
    a: Option<&DateTime<Utc>>,
    b: Option<&DateTime<Utc>>,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Locale-aware title order.
///
/// CLDR root collation at secondary strength: case is ignored, accents are
/// not. Ties fall back to the raw (trimmed) title so the order is total.
pub struct TitleCollator {
    collator: Option<CollatorBorrowed<'static>>,
}

impl TitleCollator {
    pub fn new() -> Self {
        let mut options = CollatorOptions::default();
        options.strength = Some(Strength::Secondary);
        let collator = match Collator::try_new(Default::default(), options) {
            Ok(collator) => Some(collator),
            Err(err) => {
                warn!(
                    error = %err,
                    "root collation unavailable; folding case instead"
                );
                None
            }
        };
        Self { collator }
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let (a, b) = (a.trim(), b.trim());
        let primary = match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.to_lowercase().cmp(&b.to_lowercase()),
        };
        primary.then_with(|| a.cmp(b))
    }
}

impl Default for TitleCollator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TitleCollator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TitleCollator")
            .field("collating", &self.collator.is_some())
            .finish()
    }
}

pub fn compare_titles(a: &str, b: &str) -> Ordering {
    TitleCollator::new().compare(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localize::{NoTranslations, StaticTranslations};
    use chrono::TimeZone;
    use lectern_model::DocumentId;

    fn dated(id: &str, secs: Option<i64>) -> Document {
        let mut doc = Document::new(DocumentId::new(id).unwrap(), "a");
        doc.updated_at = secs.map(|s| Utc.timestamp_opt(s, 0).unwrap());
        doc
    }

    fn titled(id: &str, title: &str) -> Document {
        Document::new(DocumentId::new(id).unwrap(), "a").with_title(title)
    }

    fn alpha_titles(titles: &[&str]) -> Vec<String> {
        let docs: Vec<Document> = titles
            .iter()
            .enumerate()
            .map(|(i, title)| titled(&i.to_string(), title))
            .collect();
        let mut refs: Vec<&Document> = docs.iter().collect();
        sort_documents(&mut refs, SortBy::Alpha, &NoTranslations);
        refs.iter()
            .map(|d| d.title.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn recent_puts_missing_timestamps_last() {
        let docs = vec![
            dated("five", Some(5)),
            dated("three", Some(3)),
            dated("nine", Some(9)),
            dated("none", None),
        ];
        let mut refs: Vec<&Document> = docs.iter().collect();
        sort_documents(&mut refs, SortBy::Recent, &NoTranslations);
        let order: Vec<_> = refs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(order, vec!["nine", "five", "three", "none"]);
    }

    #[test]
    fn alpha_ignores_case_and_uses_translations() {
        let translations = StaticTranslations::new([("docs.z", "aardvark")]);
        let docs = vec![
            titled("1", "beta"),
            titled("2", "Alpha"),
            Document::new(DocumentId::new("3").unwrap(), "a")
                .with_title("Zulu")
                .with_title_key("docs.z"),
            titled("4", "alpha"),
        ];
        let mut refs: Vec<&Document> = docs.iter().collect();
        sort_documents(&mut refs, SortBy::Alpha, &translations);
        let order: Vec<_> = refs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(order, vec!["3", "2", "4", "1"]);
    }

    #[test]
    fn alpha_collates_accented_and_cyrillic_titles() {
        let sorted = alpha_titles(&[
            "zebra", "éclair", "fig", "Ёлка", "Яблоко", "ель",
        ]);
        assert_eq!(
            sorted,
            vec!["éclair", "fig", "zebra", "Ёлка", "ель", "Яблоко"]
        );
    }

    #[test]
    fn accents_only_break_ties_between_equal_letters() {
        let sorted = alpha_titles(&["resume", "résumé", "Resumes"]);
        assert_eq!(sorted, vec!["resume", "résumé", "Resumes"]);
    }

    #[test]
    fn title_comparison_is_total() {
        assert_eq!(compare_titles("Alpha", "alpha"), Ordering::Less);
        assert_eq!(compare_titles("alpha", "Beta"), Ordering::Less);
        assert_eq!(compare_titles("ёж", "Жук"), Ordering::Less);
        assert_eq!(compare_titles(" x ", "x"), Ordering::Equal);
    }
}
