//! Client-side listing pipeline.
//!
//! ```text
//! snapshot -> exclusion -> filter (text AND criterion) -> stable sort -> visible list
//! ```
//!
//! [`compute_visible_list`] is a pure function of the snapshot and the
//! [`ListParams`]; nothing is patched in place, so the output always reflects
//! the latest parameters applied to the latest snapshot. Filtering only ever
//! removes items, and sorting is stable: items the active key considers equal
//! keep their snapshot order.

mod listable;
mod normalize;
mod search;
mod sort;

use core::fmt;

use deal_core::Viewer;

pub use listable::{Listable, tier_admits};
pub use normalize::{into_payload, payload_or_empty};
pub use search::SearchText;
pub use sort::{CategorySort, ParseSortError, ProductSort, SortDirection, UserSort, collate};

/// The user-controlled inputs of a listing.
///
/// Ephemeral: owned by the page, never persisted.
pub struct ListParams<T: Listable> {
    /// Free-text search; inactive when blank.
    pub search: SearchText,
    /// Single-select filter; `None` disables it.
    pub criterion: Option<T::Criterion>,
    /// Order; `None` keeps snapshot order.
    pub sort: Option<T::SortKey>,
    /// Who is looking, for ownership exclusion.
    pub viewer: Option<Viewer>,
}

impl<T: Listable> ListParams<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            search: SearchText::default(),
            criterion: None,
            sort: None,
            viewer: None,
        }
    }

    #[must_use]
    pub fn with_search(mut self, text: &str) -> Self {
        self.search = SearchText::new(text);
        self
    }

    #[must_use]
    pub fn with_criterion(mut self, criterion: T::Criterion) -> Self {
        self.criterion = Some(criterion);
        self
    }

    #[must_use]
    pub fn with_sort(mut self, key: T::SortKey) -> Self {
        self.sort = Some(key);
        self
    }

    #[must_use]
    pub fn with_viewer(mut self, viewer: Viewer) -> Self {
        self.viewer = Some(viewer);
        self
    }

    /// The same parameters with search and criterion removed.
    #[must_use]
    pub fn cleared(&self) -> Self {
        Self {
            search: SearchText::default(),
            criterion: None,
            sort: self.sort,
            viewer: self.viewer.clone(),
        }
    }

    /// Whether `item` passes every active predicate.
    pub fn admits(&self, item: &T) -> bool {
        if self.viewer.as_ref().is_some_and(|viewer| item.hidden_from(viewer)) {
            return false;
        }
        if self.search.is_active() && !item.matches_text(&self.search) {
            return false;
        }
        self.criterion
            .as_ref()
            .is_none_or(|criterion| item.admits(criterion))
    }
}

impl<T: Listable> Default for ListParams<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Listable> Clone for ListParams<T>
where
    T::Criterion: Clone,
{
    fn clone(&self) -> Self {
        Self {
            search: self.search.clone(),
            criterion: self.criterion.clone(),
            sort: self.sort,
            viewer: self.viewer.clone(),
        }
    }
}

impl<T: Listable> PartialEq for ListParams<T>
where
    T::Criterion: PartialEq,
    T::SortKey: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.search == other.search
            && self.criterion == other.criterion
            && self.sort == other.sort
            && self.viewer == other.viewer
    }
}

impl<T: Listable> fmt::Debug for ListParams<T>
where
    T::Criterion: fmt::Debug,
    T::SortKey: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListParams")
            .field("search", &self.search)
            .field("criterion", &self.criterion)
            .field("sort", &self.sort)
            .field("viewer", &self.viewer)
            .finish()
    }
}

/// Positions in `snapshot` of the visible items, in display order.
#[must_use]
pub fn visible_indices<T: Listable>(snapshot: &[T], params: &ListParams<T>) -> Vec<usize> {
    let mut visible: Vec<(usize, &T)> = snapshot
        .iter()
        .enumerate()
        .filter(|(_, item)| params.admits(item))
        .collect();

    if let Some(key) = params.sort {
        // `sort_by` is stable; ties keep snapshot order.
        visible.sort_by(|(_, a), (_, b)| a.compare_by(b, key));
    }

    visible.into_iter().map(|(index, _)| index).collect()
}

/// The items of `snapshot` a view should render for `params`, in order.
///
/// Never fails: an empty snapshot or a filter nothing satisfies yields an
/// empty list.
#[must_use]
pub fn compute_visible_list<'a, T: Listable>(
    snapshot: &'a [T],
    params: &ListParams<T>,
) -> Vec<&'a T> {
    visible_indices(snapshot, params)
        .into_iter()
        .filter_map(|index| snapshot.get(index))
        .collect()
}
