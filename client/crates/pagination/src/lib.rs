//! Client-side pagination primitives shared by booking admin list views.
//!
//! List screens page an already-filtered, in-memory collection, so the
//! arithmetic here is deliberately total: an empty collection still has one
//! page, an out-of-range index yields an empty page rather than a panic, and
//! the abbreviated page window is exact and symmetric around the current
//! page. Keeping these rules in one crate stops each management screen from
//! growing its own slightly different pagination.

use serde::Serialize;
use thiserror::Error;

/// Largest page count rendered without abbreviation.
///
/// Windows over collections of up to this many pages list every page; longer
/// runs collapse to first, last, and the current page's neighbours.
pub const FULL_WINDOW_LIMIT: usize = 7;

/// Number of rows shown per page. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PageSize(usize);

impl PageSize {
    /// Construct a page size, rejecting zero.
    ///
    /// # Errors
    ///
    /// Returns [`PageSizeError::Zero`] when `raw` is `0`.
    pub const fn new(raw: usize) -> Result<Self, PageSizeError> {
        if raw == 0 {
            return Err(PageSizeError::Zero);
        }
        Ok(Self(raw))
    }

    /// The underlying number of rows per page.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors returned when constructing [`PageSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageSizeError {
    /// A page must hold at least one row.
    #[error("page size must be greater than zero")]
    Zero,
}

/// Total number of pages needed for `total_rows` rows.
///
/// Floored at one so pagination controls never divide by zero or render a
/// page zero, even for an empty result set.
#[must_use]
pub const fn total_pages(total_rows: usize, page_size: PageSize) -> usize {
    let pages = total_rows.div_ceil(page_size.get());
    if pages == 0 { 1 } else { pages }
}

/// One rendered page of a filtered collection, with the figures the
/// surrounding pagination controls need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEnvelope<T> {
    /// Rows visible on this page, in collection order.
    pub rows: Vec<T>,
    /// One-based index of this page.
    pub page_index: usize,
    /// Rows per page used to cut the collection.
    pub page_size: PageSize,
    /// Length of the filtered collection before paging.
    pub total_rows: usize,
    /// Total page count, never less than one.
    pub total_pages: usize,
}

impl<T> PageEnvelope<T> {
    /// Whether a later page exists.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page_index < self.total_pages
    }

    /// Whether an earlier page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page_index > 1
    }
}

/// Cut one page out of an already-filtered collection.
///
/// `page_index` is one-based; zero is treated as the first page. An index
/// past the final page yields an empty row set with the counts intact, so a
/// caller that failed to reset its page after filtering still renders sane
/// controls.
#[must_use]
pub fn paginate<T: Clone>(rows: &[T], page_index: usize, page_size: PageSize) -> PageEnvelope<T> {
    let clamped_index = page_index.max(1);
    let skip = clamped_index
        .saturating_sub(1)
        .saturating_mul(page_size.get());
    PageEnvelope {
        rows: rows.iter().skip(skip).take(page_size.get()).cloned().collect(),
        page_index: clamped_index,
        page_size,
        total_rows: rows.len(),
        total_pages: total_pages(rows.len(), page_size),
    }
}

/// One slot in an abbreviated page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "page")]
pub enum PageWindowItem {
    /// A concrete, clickable page number.
    Page(usize),
    /// A collapsed run of pages.
    Ellipsis,
}

/// Build the abbreviated page window for pagination controls.
///
/// The window always contains the first and last pages and the current page
/// with both neighbours. A gap of exactly one page is shown as that page
/// (an ellipsis standing in for a single number reads worse than the
/// number); larger gaps collapse to a single ellipsis. Windows over
/// [`FULL_WINDOW_LIMIT`] or fewer pages list every page.
///
/// # Examples
///
/// ```
/// use pagination::{PageWindowItem, page_window};
///
/// let window = page_window(5, 10);
/// assert_eq!(
///     window,
///     [
///         PageWindowItem::Page(1),
///         PageWindowItem::Ellipsis,
///         PageWindowItem::Page(4),
///         PageWindowItem::Page(5),
///         PageWindowItem::Page(6),
///         PageWindowItem::Ellipsis,
///         PageWindowItem::Page(10),
///     ]
/// );
/// ```
#[must_use]
pub fn page_window(current_page: usize, total_pages: usize) -> Vec<PageWindowItem> {
    let total = total_pages.max(1);
    if total <= FULL_WINDOW_LIMIT {
        return (1..=total).map(PageWindowItem::Page).collect();
    }

    let current = current_page.clamp(1, total);
    let mut window = Vec::new();
    let mut gap_open = false;
    for page in 1..=total {
        if is_anchor(page, current, total) || fills_single_gap(page, current, total) {
            window.push(PageWindowItem::Page(page));
            gap_open = false;
        } else if !gap_open {
            window.push(PageWindowItem::Ellipsis);
            gap_open = true;
        }
    }
    window
}

/// Pages that must always appear: first, last, and current with neighbours.
const fn is_anchor(page: usize, current: usize, total: usize) -> bool {
    page == 1 || page == total || (page + 1 >= current && page <= current + 1)
}

/// A non-anchor page flanked by anchors on both sides: rendering the number
/// beats rendering an ellipsis that hides exactly one page.
const fn fills_single_gap(page: usize, current: usize, total: usize) -> bool {
    page > 1
        && page < total
        && is_anchor(page - 1, current, total)
        && is_anchor(page + 1, current, total)
}
