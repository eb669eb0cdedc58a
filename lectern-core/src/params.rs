//! Shareable catalog state, as carried in a URL query string.
//!
//! Only the filter selection and the page travel; sort order and view mode
//! are per-session and never serialized here.

use std::collections::BTreeSet;

use lectern_model::{Role, TagId};
use tracing::debug;

use crate::error::{CatalogError, Result};

pub const KEY_SEARCH: &str = "q";
pub const KEY_CATEGORY: &str = "category";
pub const KEY_ROLE: &str = "role";
pub const KEY_TAG: &str = "tag";
pub const KEY_PAGE: &str = "page";

/// Typed view of the shareable parameters.
///
/// Multi-valued keys keep selection order so a round trip through the query
/// string reproduces the same URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogParams {
    search: String,
    categories: Vec<String>,
    roles: Vec<Role>,
    tags: Vec<TagId>,
    page: u32,
}

impl Default for CatalogParams {
    fn default() -> Self {
        Self {
            search: String::new(),
            categories: Vec::new(),
            roles: Vec::new(),
            tags: Vec::new(),
            page: 1,
        }
    }
}

fn toggle<T: PartialEq>(selection: &mut Vec<T>, value: T) -> bool {
    if let Some(pos) = selection.iter().position(|v| *v == value) {
        selection.remove(pos);
        false
    } else {
        selection.push(value);
        true
    }
}

fn push_unique<T: PartialEq>(selection: &mut Vec<T>, value: T) {
    if !selection.contains(&value) {
        selection.push(value);
    }
}

impl CatalogParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn tags(&self) -> &[TagId] {
        &self.tags
    }

    /// 1-based; never zero.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn category_set(&self) -> BTreeSet<String> {
        self.categories.iter().cloned().collect()
    }

    pub fn role_set(&self) -> BTreeSet<Role> {
        self.roles.iter().copied().collect()
    }

    pub fn tag_set(&self) -> BTreeSet<TagId> {
        self.tags.iter().cloned().collect()
    }

    /// True when no filter key is set, regardless of page.
    pub fn has_no_filters(&self) -> bool {
        self.search.is_empty()
            && self.categories.is_empty()
            && self.roles.is_empty()
            && self.tags.is_empty()
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 1;
    }

    /// Adds the category if absent, removes it if present. Returns whether
    /// it is selected afterwards.
    pub fn toggle_category(&mut self, key: impl Into<String>) -> bool {
        self.page = 1;
        toggle(&mut self.categories, key.into())
    }

    pub fn toggle_role(&mut self, role: Role) -> bool {
        self.page = 1;
        toggle(&mut self.roles, role)
    }

    pub fn toggle_tag(&mut self, tag: TagId) -> bool {
        self.page = 1;
        toggle(&mut self.tags, tag)
    }

    /// Explicit navigation; leaves every filter key alone. Zero reads as 1.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Clears every shareable key and returns to the first page.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Flat key/value pairs in serialization order. `page` is omitted on
    /// the first page and `q` when empty.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.search.is_empty() {
            pairs.push((KEY_SEARCH, self.search.clone()));
        }
        pairs.extend(self.categories.iter().map(|c| (KEY_CATEGORY, c.clone())));
        pairs.extend(
            self.roles
                .iter()
                .map(|r| (KEY_ROLE, r.as_str().to_string())),
        );
        pairs.extend(self.tags.iter().map(|t| (KEY_TAG, t.to_string())));
        if self.page > 1 {
            pairs.push((KEY_PAGE, self.page.to_string()));
        }
        pairs
    }

    pub fn to_query_string(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.to_pairs() {
            serializer.append_pair(key, &value);
        }
        serializer.finish()
    }

    /// Lenient parse: malformed values are dropped with a debug log, an
    /// unparsable page reads as 1, unknown keys are ignored.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            if let Err(error) = params.apply_pair(key.as_ref(), value.as_ref()) {
                debug!(%error, "ignoring shareable parameter");
            }
        }
        params
    }

    /// Strict parse: the first malformed value is an error.
    pub fn try_from_pairs<K, V>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            params.apply_pair(key.as_ref(), value.as_ref())?;
        }
        Ok(params)
    }

    /// Lenient parse of a query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Self {
        Self::from_pairs(Self::decode(query))
    }

    pub fn parse_strict(query: &str) -> Result<Self> {
        Self::try_from_pairs(Self::decode(query))
    }

    fn decode(query: &str) -> Vec<(String, String)> {
        let query = query.strip_prefix('?').unwrap_or(query);
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    fn apply_pair(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || CatalogError::InvalidParam {
            key: key.to_string(),
            value: value.to_string(),
        };
        match key {
            KEY_SEARCH => self.search = value.to_string(),
            KEY_CATEGORY => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                push_unique(&mut self.categories, value.to_string());
            }
            KEY_ROLE => {
                let role = value.parse::<Role>()?;
                push_unique(&mut self.roles, role);
            }
            KEY_TAG => {
                let tag = TagId::new(value)?;
                push_unique(&mut self.tags, tag);
            }
            KEY_PAGE => {
                let page = value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|page| *page >= 1)
                    .ok_or_else(invalid)?;
                self.page = page;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(id: &str) -> TagId {
        TagId::new(id).unwrap()
    }

    #[test]
    fn toggling_twice_restores_selection() {
        let mut params = CatalogParams::new();
        params.toggle_tag(tag("t1"));
        let before = params.clone();

        assert!(params.toggle_tag(tag("t2")));
        assert!(!params.toggle_tag(tag("t2")));
        assert_eq!(params, before);
    }

    #[test]
    fn filter_changes_reset_page_but_navigation_does_not() {
        let mut params = CatalogParams::new();
        params.toggle_category("categories.armoplit");
        params.set_page(4);
        assert_eq!(params.page(), 4);
        assert_eq!(params.categories(), ["categories.armoplit"]);

        params.toggle_role(Role::Worker);
        assert_eq!(params.page(), 1);

        params.set_page(2);
        params.set_search("rebar");
        assert_eq!(params.page(), 1);

        params.set_page(0);
        assert_eq!(params.page(), 1);
    }

    #[test]
    fn query_string_round_trip() {
        let mut params = CatalogParams::new();
        params.set_search("site plan");
        params.toggle_category("b");
        params.toggle_category("a");
        params.toggle_role(Role::Foreman);
        params.toggle_tag(tag("t1"));
        params.set_page(3);

        let query = params.to_query_string();
        assert_eq!(
            query,
            "q=site+plan&category=b&category=a&role=foreman&tag=t1&page=3"
        );
        assert_eq!(CatalogParams::parse(&query), params);
        assert_eq!(CatalogParams::parse(&format!("?{query}")), params);
    }

    #[test]
    fn first_page_and_empty_search_are_omitted() {
        let mut params = CatalogParams::new();
        assert_eq!(params.to_query_string(), "");
        params.toggle_tag(tag("t1"));
        assert_eq!(params.to_query_string(), "tag=t1");
    }

    #[test]
    fn lenient_parse_drops_bad_values() {
        let params =
            CatalogParams::parse("role=wizard&role=hr&page=zero&category=&x=1");
        assert_eq!(params.roles(), [Role::Hr]);
        assert_eq!(params.page(), 1);
        assert!(params.categories().is_empty());
    }

    #[test]
    fn strict_parse_reports_the_offending_pair() {
        let err = CatalogParams::parse_strict("page=0").unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidParam { ref key, .. } if key == "page"
        ));
        assert!(matches!(
            CatalogParams::parse_strict("role=wizard"),
            Err(CatalogError::Model(_))
        ));
    }

    #[test]
    fn reset_clears_everything() {
        let mut params = CatalogParams::parse("q=x&tag=t1&page=2");
        params.reset();
        assert_eq!(params, CatalogParams::default());
        assert!(params.has_no_filters());
    }
}
