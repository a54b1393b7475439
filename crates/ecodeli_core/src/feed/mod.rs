//! In-memory notification feed shared by every role notification page.
//!
//! # Responsibility
//! - Own one notification collection and its mutation actions.
//! - Derive the filtered view from filter, visibility and search inputs.
//!
//! # Invariants
//! - `filtered_items` is the conjunction of the three predicates.
//! - Every operation is total; unknown ids are no-ops.
//! - No I/O: the collection is seeded by the caller and lost with the feed.

use crate::model::notification::{NotificationFeedItem, Severity};
use log::debug;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Visibility toggle of the feed list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    #[default]
    All,
    Unread,
}

impl Visibility {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("unread") {
            Self::Unread
        } else {
            Self::All
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Unread => "unread",
        }
    }
}

/// Active category/criticality filter.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedFilter {
    #[default]
    All,
    /// Items with `Severity::Error`.
    Critical,
    /// Items whose `source` or `category` equals the value.
    Value(String),
}

impl FeedFilter {
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "all",
            Self::Critical => "critical",
            Self::Value(value) => value,
        }
    }
}

impl From<&str> for FeedFilter {
    fn from(value: &str) -> Self {
        match value {
            "all" => Self::All,
            "critical" => Self::Critical,
            other => Self::Value(other.to_string()),
        }
    }
}

/// Text field matched by the search term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKey {
    Title,
    Message,
}

impl SearchKey {
    fn read(self, item: &NotificationFeedItem) -> &str {
        match self {
            Self::Title => &item.title,
            Self::Message => &item.message,
        }
    }
}

pub const DEFAULT_SEARCH_KEYS: [SearchKey; 2] = [SearchKey::Title, SearchKey::Message];

/// Replaceable filter rule `(item, active_filter) -> matches`.
pub type FilterPredicate = Arc<dyn Fn(&NotificationFeedItem, &FeedFilter) -> bool + Send + Sync>;

/// Default rule: `all` matches everything, `critical` matches error
/// severity, any other value matches `source` or `category`.
pub fn default_filter_predicate(item: &NotificationFeedItem, filter: &FeedFilter) -> bool {
    match filter {
        FeedFilter::All => true,
        FeedFilter::Critical => item.severity == Some(Severity::Error),
        FeedFilter::Value(value) => {
            item.source.as_deref() == Some(value.as_str())
                || item.category.as_deref() == Some(value.as_str())
        }
    }
}

/// Notification collection plus its view inputs.
#[derive(Clone)]
pub struct NotificationFeed {
    items: Vec<NotificationFeedItem>,
    filter: FeedFilter,
    visibility: Visibility,
    search_term: String,
    search_keys: Vec<SearchKey>,
    predicate: FilterPredicate,
}

impl Debug for NotificationFeed {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationFeed")
            .field("items", &self.items.len())
            .field("filter", &self.filter)
            .field("visibility", &self.visibility)
            .field("search_term", &self.search_term)
            .field("search_keys", &self.search_keys)
            .finish()
    }
}

impl NotificationFeed {
    /// Creates a feed over `seed` with the given initial filter.
    pub fn new(seed: Vec<NotificationFeedItem>, initial_filter: impl Into<FeedFilter>) -> Self {
        Self {
            items: seed,
            filter: initial_filter.into(),
            visibility: Visibility::All,
            search_term: String::new(),
            search_keys: DEFAULT_SEARCH_KEYS.to_vec(),
            predicate: Arc::new(default_filter_predicate),
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Restricts search matching to `keys`; an empty set matches nothing
    /// once a non-blank term is active.
    pub fn with_search_keys(mut self, keys: &[SearchKey]) -> Self {
        self.search_keys = keys.to_vec();
        self
    }

    pub fn with_filter_predicate(
        mut self,
        predicate: impl Fn(&NotificationFeedItem, &FeedFilter) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Replaces the working collection; duplicate ids are kept.
    pub fn initialize(&mut self, seed: Vec<NotificationFeedItem>) {
        debug!(
            "event=feed_initialize module=feed status=ok count={}",
            seed.len()
        );
        self.items = seed;
    }

    pub fn set_filter(&mut self, value: impl Into<FeedFilter>) {
        self.filter = value.into();
    }

    pub fn set_visibility(&mut self, value: Visibility) {
        self.visibility = value;
    }

    pub fn set_search_term(&mut self, value: impl Into<String>) {
        self.search_term = value.into();
    }

    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn items(&self) -> &[NotificationFeedItem] {
        &self.items
    }

    /// Items satisfying filter AND visibility AND search.
    pub fn filtered_items(&self) -> Vec<&NotificationFeedItem> {
        let needle = self.search_term.trim().to_lowercase();
        self.items
            .iter()
            .filter(|item| (self.predicate)(*item, &self.filter))
            .filter(|item| self.visibility == Visibility::All || item.is_unread())
            .filter(|item| {
                needle.is_empty()
                    || self
                        .search_keys
                        .iter()
                        .any(|key| key.read(*item).to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Clears severity on every item carrying `id`.
    pub fn mark_as_read(&mut self, id: &str) {
        let mut touched = 0_usize;
        for item in self.items.iter_mut().filter(|item| item.id == id) {
            item.severity = None;
            touched += 1;
        }
        debug!(
            "event=feed_mark_read module=feed status=ok matched={}",
            touched
        );
    }

    /// Removes every item carrying `id`.
    pub fn dismiss(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        debug!(
            "event=feed_dismiss module=feed status=ok removed={}",
            before - self.items.len()
        );
    }

    pub fn mark_all_as_read(&mut self) {
        for item in &mut self.items {
            item.severity = None;
        }
        debug!(
            "event=feed_mark_all_read module=feed status=ok count={}",
            self.items.len()
        );
    }

    pub fn clear_all(&mut self) {
        debug!(
            "event=feed_clear module=feed status=ok removed={}",
            self.items.len()
        );
        self.items.clear();
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|item| item.is_unread()).count()
    }

    pub fn total_count(&self) -> usize {
        self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{FeedFilter, NotificationFeed, SearchKey, Visibility};
    use crate::model::notification::{NotificationFeedItem, Severity};

    fn item(id: &str, source: &str, severity: Option<Severity>) -> NotificationFeedItem {
        let mut item = NotificationFeedItem::new(id, format!("Titre {id}"), "Message", "—")
            .with_source(source);
        item.severity = severity;
        item
    }

    fn seed() -> Vec<NotificationFeedItem> {
        vec![
            item("a", "Missions", Some(Severity::Error)),
            item("b", "Finance", None),
            item("c", "Missions", Some(Severity::Warning)),
        ]
    }

    fn ids(feed: &NotificationFeed) -> Vec<String> {
        feed.filtered_items()
            .into_iter()
            .map(|item| item.id.clone())
            .collect()
    }

    #[test]
    fn filter_parses_reserved_words() {
        assert_eq!(FeedFilter::from("all"), FeedFilter::All);
        assert_eq!(FeedFilter::from("critical"), FeedFilter::Critical);
        assert_eq!(
            FeedFilter::from("Finance"),
            FeedFilter::Value("Finance".to_string())
        );
        assert_eq!(Visibility::parse("UNREAD"), Visibility::Unread);
        assert_eq!(Visibility::parse("whatever"), Visibility::All);
    }

    #[test]
    fn critical_filter_keeps_error_severity_only() {
        let feed = NotificationFeed::new(seed(), "critical");
        assert_eq!(ids(&feed), vec!["a"]);
    }

    #[test]
    fn value_filter_matches_category_as_well_as_source() {
        let items = vec![
            item("a", "Missions", None).with_category("Urgent"),
            item("b", "Urgent", None),
            item("c", "Finance", None),
        ];
        let feed = NotificationFeed::new(items, "Urgent");
        assert_eq!(ids(&feed), vec!["a", "b"]);
    }

    #[test]
    fn search_is_case_insensitive_and_blank_matches_all() {
        let mut feed = NotificationFeed::new(seed(), "all");
        feed.set_search_term("   ");
        assert_eq!(feed.filtered_items().len(), 3);
        feed.set_search_term("TITRE C");
        assert_eq!(ids(&feed), vec!["c"]);
    }

    #[test]
    fn search_keys_restrict_matched_fields() {
        let mut feed = NotificationFeed::new(seed(), "all").with_search_keys(&[SearchKey::Message]);
        feed.set_search_term("titre");
        assert!(feed.filtered_items().is_empty());
        feed.set_search_term("message");
        assert_eq!(feed.filtered_items().len(), 3);
    }

    #[test]
    fn custom_predicate_replaces_default_rule() {
        let feed = NotificationFeed::new(seed(), "Finance")
            .with_filter_predicate(|item, filter| item.source.as_deref() != Some(filter.as_str()));
        assert_eq!(ids(&feed), vec!["a", "c"]);
    }

    #[test]
    fn duplicate_ids_are_tolerated_by_mutations() {
        let mut feed = NotificationFeed::new(
            vec![
                item("dup", "Missions", Some(Severity::Info)),
                item("dup", "Finance", Some(Severity::Error)),
                item("other", "Finance", Some(Severity::Error)),
            ],
            "all",
        );
        feed.mark_as_read("dup");
        assert_eq!(feed.unread_count(), 1);
        feed.dismiss("dup");
        assert_eq!(feed.total_count(), 1);
    }

    #[test]
    fn with_visibility_sets_initial_toggle() {
        let feed = NotificationFeed::new(seed(), "all").with_visibility(Visibility::Unread);
        assert_eq!(ids(&feed), vec!["a", "c"]);
        assert_eq!(feed.visibility(), Visibility::Unread);
    }
}
