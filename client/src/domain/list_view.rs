//! Search, field filters, and pagination over a collection snapshot.
//!
//! The controller owns the query state and nothing else: records come in as
//! a snapshot, and the page of rows to render comes out. The one invariant
//! that matters is that changing the search term or any filter resets the
//! page index to one synchronously, before the next paginate, so a filter
//! can never leave the user stranded on an out-of-range page.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use chrono::NaiveDate;
use pagination::{PageEnvelope, PageSize, PageWindowItem, page_window, paginate};

use super::collection::CollectionSnapshot;
use super::resource::Resource;

/// One field-level predicate. Predicates across fields are AND-ed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPredicate {
    /// The record's canonical field text equals this value.
    Equals(String),
    /// The record's field parses as a date on or after this bound.
    OnOrAfter(NaiveDate),
    /// The record's field parses as a date on or before this bound.
    OnOrBefore(NaiveDate),
}

/// Query state for one list view: search term, field filters, page index,
/// and page size. Never persisted; owned exclusively by its controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    search_term: String,
    filters: BTreeMap<String, FieldPredicate>,
    page_index: usize,
    page_size: PageSize,
}

impl ListQuery {
    /// A blank query on page one.
    #[must_use]
    pub fn new(page_size: PageSize) -> Self {
        Self {
            search_term: String::new(),
            filters: BTreeMap::new(),
            page_index: 1,
            page_size,
        }
    }

    /// Current search term.
    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Current one-based page index.
    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page_index
    }

    /// Rows per page.
    #[must_use]
    pub const fn page_size(&self) -> PageSize {
        self.page_size
    }

    /// Replace the search term. Any actual change resets to page one.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.search_term {
            self.search_term = term;
            self.page_index = 1;
        }
    }

    /// Set or replace one field filter, resetting to page one.
    pub fn set_filter(&mut self, field: impl Into<String>, predicate: FieldPredicate) {
        self.filters.insert(field.into(), predicate);
        self.page_index = 1;
    }

    /// Drop one field filter; resets to page one if it was present.
    pub fn clear_filter(&mut self, field: &str) {
        if self.filters.remove(field).is_some() {
            self.page_index = 1;
        }
    }

    /// Jump to a page. Indexes below one clamp to one.
    pub fn set_page(&mut self, page_index: usize) {
        self.page_index = page_index.max(1);
    }

    /// Whether a record survives the search term and every field filter.
    #[must_use]
    pub fn matches<R: Resource>(&self, record: &R) -> bool {
        self.matches_search(record) && self.matches_filters(record)
    }

    fn matches_search<R: Resource>(&self, record: &R) -> bool {
        let needle = self.search_term.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        record
            .search_haystacks()
            .iter()
            .any(|haystack| haystack.to_lowercase().contains(&needle))
    }

    fn matches_filters<R: Resource>(&self, record: &R) -> bool {
        self.filters.iter().all(|(field, predicate)| {
            let Some(text) = record.filter_text(field) else {
                return false;
            };
            match predicate {
                FieldPredicate::Equals(expected) => text == *expected,
                FieldPredicate::OnOrAfter(bound) => {
                    field_date(&text).is_some_and(|date| date >= *bound)
                }
                FieldPredicate::OnOrBefore(bound) => {
                    field_date(&text).is_some_and(|date| date <= *bound)
                }
            }
        })
    }
}

/// Parse the leading date out of the upstream's date strings, which arrive
/// both as bare dates and as full timestamps.
fn field_date(text: &str) -> Option<NaiveDate> {
    let head: String = text.chars().take(10).collect();
    NaiveDate::parse_from_str(&head, "%Y-%m-%d").ok()
}

/// Records that survive the query, in snapshot order.
#[must_use]
pub fn apply_filter<R: Resource>(records: &[R], query: &ListQuery) -> Vec<R> {
    records
        .iter()
        .filter(|record| query.matches(*record))
        .cloned()
        .collect()
}

/// The first `limit` records of a snapshot, for top-N strips.
#[must_use]
pub fn head<R: Clone>(records: &[R], limit: usize) -> Vec<R> {
    records.iter().take(limit).cloned().collect()
}

/// Query state plus the render pipeline for one management screen.
pub struct ListController<R: Resource> {
    query: ListQuery,
    _marker: PhantomData<fn() -> R>,
}

impl<R: Resource> ListController<R> {
    /// A controller with a blank query.
    #[must_use]
    pub fn new(page_size: PageSize) -> Self {
        Self {
            query: ListQuery::new(page_size),
            _marker: PhantomData,
        }
    }

    /// Read-only view of the query state.
    #[must_use]
    pub const fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Replace the search term (resets to page one on change).
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.query.set_search_term(term);
    }

    /// Set one field filter (resets to page one).
    pub fn set_filter(&mut self, field: impl Into<String>, predicate: FieldPredicate) {
        self.query.set_filter(field, predicate);
    }

    /// Drop one field filter.
    pub fn clear_filter(&mut self, field: &str) {
        self.query.clear_filter(field);
    }

    /// Jump to a page.
    pub fn set_page(&mut self, page_index: usize) {
        self.query.set_page(page_index);
    }

    /// Filter and paginate a snapshot into the page of rows to render.
    #[must_use]
    pub fn page(&self, snapshot: &CollectionSnapshot<R>) -> PageEnvelope<R> {
        let filtered = apply_filter(&snapshot.records, &self.query);
        paginate(&filtered, self.query.page_index(), self.query.page_size())
    }

    /// The abbreviated page window for the current page of an envelope.
    #[must_use]
    pub fn window(&self, page: &PageEnvelope<R>) -> Vec<PageWindowItem> {
        page_window(page.page_index, page.total_pages)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pagination::PageSize;
    use rstest::rstest;

    use super::{FieldPredicate, ListController, ListQuery, apply_filter, head};
    use crate::domain::booking::Booking;
    use crate::domain::resource::{RecordId, Resource};
    use crate::domain::user::User;

    fn user(id: i64, name: &str, email: &str, role: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": name,
            "email": email,
            "phone": "0123",
            "gender": true,
            "role": role,
        }))
        .expect("user decodes")
    }

    fn booking(id: i64, check_in: &str, check_out: &str) -> Booking {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "maPhong": 7,
            "ngayDen": check_in,
            "ngayDi": check_out,
            "soLuongKhach": 2,
            "maNguoiDung": 12,
        }))
        .expect("booking decodes")
    }

    fn page_size(raw: usize) -> PageSize {
        PageSize::new(raw).expect("positive page size")
    }

    #[rstest]
    #[case("ada", vec![1])]
    #[case("EXAMPLE.COM", vec![1, 2])]
    #[case("0123", vec![1, 2])]
    #[case("nobody", vec![])]
    #[case("", vec![1, 2])]
    fn search_matches_any_haystack_case_insensitively(
        #[case] term: &str,
        #[case] expected_ids: Vec<i64>,
    ) {
        let users = vec![
            user(1, "Ada Lovelace", "ada@example.com", "ADMIN"),
            user(2, "Grace Hopper", "grace@example.com", "USER"),
        ];
        let mut query = ListQuery::new(page_size(10));
        query.set_search_term(term);

        let ids: Vec<i64> = apply_filter(&users, &query)
            .iter()
            .map(|u| u.id().get())
            .collect();
        assert_eq!(ids, expected_ids);
    }

    #[test]
    fn filters_and_search_are_anded() {
        let users = vec![
            user(1, "Ada Lovelace", "ada@example.com", "ADMIN"),
            user(2, "Ada Bell", "bell@example.com", "USER"),
        ];
        let mut query = ListQuery::new(page_size(10));
        query.set_search_term("ada");
        query.set_filter("role", FieldPredicate::Equals("ADMIN".to_owned()));

        let matched = apply_filter(&users, &query);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched.first().map(|u| u.id().get()), Some(1));
    }

    #[test]
    fn unknown_filter_fields_match_nothing() {
        let users = vec![user(1, "Ada", "ada@example.com", "ADMIN")];
        let mut query = ListQuery::new(page_size(10));
        query.set_filter("nonexistent", FieldPredicate::Equals("x".to_owned()));

        assert!(apply_filter(&users, &query).is_empty());
    }

    #[test]
    fn booking_date_bounds_filter_inclusively() {
        let bookings = vec![
            booking(1, "2026-09-01T00:00:00", "2026-09-05T00:00:00"),
            booking(2, "2026-09-10T00:00:00", "2026-09-12T00:00:00"),
            booking(3, "not-a-date", "2026-09-03T00:00:00"),
        ];
        let mut query = ListQuery::new(page_size(10));
        query.set_filter(
            "check_in",
            FieldPredicate::OnOrAfter(
                NaiveDate::from_ymd_opt(2026, 9, 1).expect("valid date"),
            ),
        );
        query.set_filter(
            "check_out",
            FieldPredicate::OnOrBefore(
                NaiveDate::from_ymd_opt(2026, 9, 5).expect("valid date"),
            ),
        );

        let ids: Vec<i64> = apply_filter(&bookings, &query)
            .iter()
            .map(|b| b.id().get())
            .collect();
        assert_eq!(ids, vec![1], "unparseable dates fail the filter");
    }

    #[test]
    fn search_change_resets_the_page_index() {
        let mut query = ListQuery::new(page_size(10));
        query.set_page(4);
        query.set_search_term("demo");
        assert_eq!(query.page_index(), 1);
    }

    #[test]
    fn unchanged_search_term_keeps_the_page_index() {
        let mut query = ListQuery::new(page_size(10));
        query.set_search_term("demo");
        query.set_page(3);
        query.set_search_term("demo");
        assert_eq!(query.page_index(), 3);
    }

    #[test]
    fn filter_changes_reset_the_page_index() {
        let mut query = ListQuery::new(page_size(10));
        query.set_page(5);
        query.set_filter("role", FieldPredicate::Equals("ADMIN".to_owned()));
        assert_eq!(query.page_index(), 1);

        query.set_page(2);
        query.clear_filter("role");
        assert_eq!(query.page_index(), 1);

        query.set_page(2);
        query.clear_filter("role");
        assert_eq!(query.page_index(), 2, "clearing an absent filter is not a change");
    }

    #[test]
    fn page_zero_clamps_to_one() {
        let mut query = ListQuery::new(page_size(10));
        query.set_page(0);
        assert_eq!(query.page_index(), 1);
    }

    #[test]
    fn head_takes_the_leading_records() {
        let users = vec![
            user(1, "A", "a@example.com", "USER"),
            user(2, "B", "b@example.com", "USER"),
            user(3, "C", "c@example.com", "USER"),
        ];
        let top: Vec<i64> = head(&users, 2).iter().map(|u| u.id().get()).collect();
        assert_eq!(top, vec![1, 2]);
        assert_eq!(head(&users, 8).len(), 3);
    }

    #[test]
    fn controller_pipeline_filters_then_paginates() {
        use crate::domain::collection::CollectionSnapshot;

        let users: Vec<User> = (1..=25)
            .map(|id| user(id, &format!("User {id}"), "u@example.com", "USER"))
            .collect();
        let snapshot = CollectionSnapshot::merged(users, &[], chrono::Utc::now());

        let mut controller = ListController::<User>::new(page_size(10));
        controller.set_page(3);
        let page = controller.page(&snapshot);
        assert_eq!(page.rows.len(), 5);
        assert_eq!(page.total_pages, 3);

        controller.set_search_term("user 2");
        let page = controller.page(&snapshot);
        // "User 2", "User 20" .. "User 25": the reset invariant means page
        // one is shown, not the stale page three.
        assert_eq!(page.page_index, 1);
        assert_eq!(page.rows.len(), 7);
        assert_eq!(controller.window(&page), pagination::page_window(1, 1));
    }
}
