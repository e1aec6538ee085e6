//! Search and pagination shared by every catalog listing.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Quiet period after the last search input before a query runs.
pub const DEFAULT_SEARCH_QUIESCENCE: Duration = Duration::from_millis(300);

/// Accessor returning one searchable text field of a catalog item.
pub type FieldAccessor<T> = fn(&T) -> &str;

/// Keeps items where any field contains `search_term`, ignoring case.
///
/// A blank term keeps everything. Input order is preserved.
#[must_use]
pub fn search_items<T>(items: Vec<T>, search_term: &str, fields: &[FieldAccessor<T>]) -> Vec<T> {
    let needle = search_term.trim().to_lowercase();
    if needle.is_empty() {
        return items;
    }

    items
        .into_iter()
        .filter(|item| {
            fields
                .iter()
                .any(|field| field(item).to_lowercase().contains(needle.as_str()))
        })
        .collect()
}

/// One page of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Items on the page.
    pub items: Vec<T>,
    /// Clamped one-based page number.
    pub page: usize,
    /// Effective page size.
    pub page_size: usize,
    /// Number of items across all pages.
    pub total_items: usize,
    /// Number of pages; zero when there are no items.
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Converts every item while keeping pagination metadata.
    #[must_use]
    pub fn map<U>(self, convert: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(convert).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Slices `items` into the requested page.
///
/// `page` is clamped into `[1, max(1, total_pages)]` and `page_size` into
/// `[1, MAX_PAGE_SIZE]`. An empty input yields zero pages and no items.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = clamp_page_size(page_size);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);
    let page = page.clamp(1, total_pages.max(1));

    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();

    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(1, MAX_PAGE_SIZE)
}

/// Search and paging state of one catalog listing.
///
/// Pagination is derived from the filter: changing the search term always
/// resets the page to 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    search: String,
    page: usize,
    page_size: usize,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl CatalogQuery {
    /// Builds a query from optional transport parameters.
    #[must_use]
    pub fn new(search: Option<String>, page: Option<usize>, page_size: Option<usize>) -> Self {
        Self {
            search: search.unwrap_or_default().trim().to_owned(),
            page: page.unwrap_or(1).max(1),
            page_size: clamp_page_size(page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
        }
    }

    /// Returns the search term.
    #[must_use]
    pub fn search(&self) -> &str {
        self.search.as_str()
    }

    /// Returns the requested one-based page.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Returns the page size.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Updates the search term and returns whether it changed.
    ///
    /// Any change resets the page to 1.
    pub fn set_search(&mut self, search: impl AsRef<str>) -> bool {
        let search = search.as_ref().trim();
        if search == self.search {
            return false;
        }

        self.search = search.to_owned();
        self.page = 1;
        true
    }

    /// Moves to another page without touching the filter.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Filters and paginates `items` with this query.
    #[must_use]
    pub fn apply<T>(&self, items: Vec<T>, fields: &[FieldAccessor<T>]) -> Page<T> {
        paginate(
            search_items(items, self.search.as_str(), fields),
            self.page,
            self.page_size,
        )
    }
}

/// Coalesces a burst of inputs into one value after a quiet period.
///
/// Time is supplied by the caller so the gate stays deterministic.
#[derive(Debug, Clone)]
pub struct QuiescenceGate<V> {
    window: Duration,
    pending: Option<(V, Instant)>,
}

impl<V> QuiescenceGate<V> {
    /// Creates a gate with the given quiet period.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Records an input, replacing any pending one and restarting the window.
    pub fn push(&mut self, value: V, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Returns the instant at which the pending input settles.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|(_, received_at)| *received_at + self.window)
    }

    /// Releases the pending input once the window has elapsed.
    pub fn settle(&mut self, now: Instant) -> Option<V> {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }
}

/// Programmatic search driver: coalesced search input over a [`CatalogQuery`].
#[derive(Debug, Clone)]
pub struct SearchSession {
    query: CatalogQuery,
    gate: QuiescenceGate<String>,
}

impl SearchSession {
    /// Creates a session starting from `query`.
    #[must_use]
    pub fn new(query: CatalogQuery, window: Duration) -> Self {
        Self {
            query,
            gate: QuiescenceGate::new(window),
        }
    }

    /// Returns the query currently in effect.
    #[must_use]
    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    /// Records a search input; nothing runs until the input settles.
    pub fn input(&mut self, search: impl Into<String>, now: Instant) {
        self.gate.push(search.into(), now);
    }

    /// Returns when the pending input settles, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.gate.deadline()
    }

    /// Applies a settled input and returns the query to run if the term changed.
    pub fn poll(&mut self, now: Instant) -> Option<CatalogQuery> {
        let search = self.gate.settle(now)?;
        self.query.set_search(search).then(|| self.query.clone())
    }

    /// Moves to another page; page moves are never coalesced.
    pub fn set_page(&mut self, page: usize) -> CatalogQuery {
        self.query.set_page(page);
        self.query.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use proptest::prelude::*;

    use super::{CatalogQuery, FieldAccessor, QuiescenceGate, SearchSession, paginate, search_items};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        code: &'static str,
        description: &'static str,
    }

    fn code(row: &Row) -> &str {
        row.code
    }

    fn description(row: &Row) -> &str {
        row.description
    }

    const FIELDS: &[FieldAccessor<Row>] = &[code, description];

    fn rows() -> Vec<Row> {
        vec![
            Row {
                code: "USER_READ",
                description: "Read users",
            },
            Row {
                code: "USER_WRITE",
                description: "Edit users",
            },
            Row {
                code: "LEAVE_APPROVE",
                description: "Approve leave requests",
            },
        ]
    }

    #[test]
    fn search_matches_any_field_case_insensitively() {
        let matched = search_items(rows(), "users", FIELDS);
        assert_eq!(matched.len(), 2);

        let matched = search_items(rows(), "approve", FIELDS);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].code, "LEAVE_APPROVE");
    }

    #[test]
    fn blank_search_keeps_natural_order() {
        assert_eq!(search_items(rows(), "  ", FIELDS), rows());
    }

    #[test]
    fn empty_items_yield_zero_pages() {
        let page = paginate(Vec::<Row>::new(), 4, 10);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn page_past_the_end_is_clamped_to_last_page() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 9, 10);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
    }

    #[test]
    fn changing_search_resets_page() {
        let mut query = CatalogQuery::new(None, Some(3), Some(5));
        assert!(!query.set_search(""));
        assert_eq!(query.page(), 3);

        assert!(query.set_search("user"));
        assert_eq!(query.page(), 1);
    }

    #[test]
    fn query_page_size_is_clamped() {
        assert_eq!(CatalogQuery::new(None, None, Some(0)).page_size(), 1);
        assert_eq!(CatalogQuery::new(None, None, Some(10_000)).page_size(), 100);
    }

    #[test]
    fn gate_releases_only_the_last_input_after_quiet_period() {
        let start = Instant::now();
        let mut gate = QuiescenceGate::new(Duration::from_millis(300));

        gate.push("u", start);
        gate.push("us", start + Duration::from_millis(100));
        assert_eq!(gate.settle(start + Duration::from_millis(350)), None);
        assert_eq!(gate.settle(start + Duration::from_millis(400)), Some("us"));
        assert_eq!(gate.settle(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn settled_search_change_resets_page_to_one() {
        let start = Instant::now();
        let mut session =
            SearchSession::new(CatalogQuery::default(), Duration::from_millis(300));
        session.set_page(4);

        session.input("user", start);
        assert_eq!(session.poll(start), None);
        assert_eq!(session.query().page(), 4);

        let query = session.poll(start + Duration::from_millis(300));
        assert_eq!(
            query.map(|query| (query.search().to_owned(), query.page())),
            Some(("user".to_owned(), 1))
        );
    }

    #[test]
    fn settling_on_same_term_does_not_requery() {
        let start = Instant::now();
        let mut session = SearchSession::new(
            CatalogQuery::new(Some("user".to_owned()), Some(2), None),
            Duration::from_millis(300),
        );

        session.input("user ", start);
        assert_eq!(session.poll(start + Duration::from_secs(1)), None);
        assert_eq!(session.query().page(), 2);
    }

    proptest! {
        #[test]
        fn clamped_page_stays_in_bounds(len in 0usize..200, page in 0usize..50, page_size in 0usize..150) {
            let result = paginate((0..len).collect::<Vec<_>>(), page, page_size);
            prop_assert!(result.page >= 1);
            prop_assert!(result.page <= result.total_pages.max(1));
            prop_assert!(result.items.len() <= result.page_size);
            prop_assert_eq!(result.total_items, len);
            if len == 0 {
                prop_assert_eq!(result.total_pages, 0);
            } else {
                prop_assert!(!result.items.is_empty());
            }
        }
    }
}
