//! Per-page listing state: fetch lifecycle plus filter parameters.
//!
//! A [`ListingPage`] tracks the Catalog Data Source request lifecycle
//! (`Idle -> Loading -> Ready | Failed`) independently of its
//! [`ListParams`]. Parameters can change in any state; the visible list is
//! recomputed on demand from the latest snapshot and the current parameters.
//!
//! While a refetch is in flight the previous snapshot keeps being filtered,
//! so the list does not flash empty. A failure hides the snapshot and
//! surfaces the [`FetchFailure`] instead, but keeps the parameters.

use std::cell::OnceCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::FetchFailure;
use crate::pipeline::{ListParams, Listable, SearchText, visible_indices};

/// A fully materialized, read-only collection shared between views.
pub type Snapshot<T> = Arc<[T]>;

/// Identifies one fetch started by [`ListingPage::begin_fetch`].
///
/// A ticket is only accepted by the page that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchTicket {
    page: u64,
    seq: u64,
}

static NEXT_PAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Request lifecycle of a listing.
#[derive(Debug)]
pub enum ListingState<T> {
    /// Nothing requested yet.
    Idle,
    /// A request is in flight; `stale` is the last good snapshot, if any.
    Loading { stale: Option<Snapshot<T>> },
    /// The latest request succeeded.
    Ready(Snapshot<T>),
    /// The latest request failed.
    Failed {
        failure: FetchFailure,
        stale: Option<Snapshot<T>>,
    },
}

/// Coarse state without payloads, for rendering spinners and banners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl<T> ListingState<T> {
    #[must_use]
    pub const fn status(&self) -> ListingStatus {
        match self {
            Self::Idle => ListingStatus::Idle,
            Self::Loading { .. } => ListingStatus::Loading,
            Self::Ready(_) => ListingStatus::Ready,
            Self::Failed { .. } => ListingStatus::Failed,
        }
    }

    /// The most recent successful snapshot, whatever the current state.
    fn last_good(&self) -> Option<Snapshot<T>> {
        match self {
            Self::Idle => None,
            Self::Ready(snapshot) => Some(Arc::clone(snapshot)),
            Self::Loading { stale } | Self::Failed { stale, .. } => stale.clone(),
        }
    }
}

/// One listing page: its parameters, its fetch state and a memoized view.
pub struct ListingPage<T: Listable> {
    id: u64,
    params: ListParams<T>,
    state: ListingState<T>,
    issued: u64,
    visible: OnceCell<Vec<usize>>,
}

impl<T: Listable> Default for ListingPage<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Listable> ListingPage<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_params(ListParams::new())
    }

    #[must_use]
    pub fn with_params(params: ListParams<T>) -> Self {
        Self {
            id: NEXT_PAGE_ID.fetch_add(1, Ordering::Relaxed),
            params,
            state: ListingState::Idle,
            issued: 0,
            visible: OnceCell::new(),
        }
    }

    #[must_use]
    pub const fn params(&self) -> &ListParams<T> {
        &self.params
    }

    #[must_use]
    pub const fn state(&self) -> &ListingState<T> {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> ListingStatus {
        self.state.status()
    }

    pub fn set_search(&mut self, text: &str) {
        self.params.search = SearchText::new(text);
        self.visible.take();
    }

    pub fn set_criterion(&mut self, criterion: Option<T::Criterion>) {
        self.params.criterion = criterion;
        self.visible.take();
    }

    pub fn set_sort(&mut self, key: Option<T::SortKey>) {
        self.params.sort = key;
        self.visible.take();
    }

    pub fn set_viewer(&mut self, viewer: Option<deal_core::Viewer>) {
        self.params.viewer = viewer;
        self.visible.take();
    }

    /// Forget search, criterion and sort (navigating away). The viewer stays.
    pub fn reset_params(&mut self) {
        let viewer = self.params.viewer.take();
        self.params = ListParams::new();
        self.params.viewer = viewer;
        self.visible.take();
    }

    /// Mark a request as started. Only the newest ticket can complete.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        let stale = self.state.last_good();
        self.state = ListingState::Loading { stale };
        self.visible.take();
        FetchTicket {
            page: self.id,
            seq: self.issued,
        }
    }

    /// Start a new request after a failure. No-op in any other state.
    pub fn retry(&mut self) -> Option<FetchTicket> {
        matches!(self.state, ListingState::Failed { .. }).then(|| self.begin_fetch())
    }

    /// Record the outcome of the request identified by `ticket`.
    ///
    /// Returns `false` and changes nothing when a newer request has been
    /// started since, so a slow response can never overwrite a fresher one,
    /// or when `ticket` was issued by another page.
    pub fn finish_fetch<S, E>(&mut self, ticket: FetchTicket, result: Result<S, E>) -> bool
    where
        S: Into<Snapshot<T>>,
        E: Into<FetchFailure>,
    {
        if ticket.page != self.id {
            debug!(page = self.id, issuer = ticket.page, "Discarding another page's fetch");
            return false;
        }
        if ticket.seq != self.issued {
            debug!(ticket = ticket.seq, latest = self.issued, "Discarding superseded fetch");
            return false;
        }

        self.state = match result {
            Ok(snapshot) => ListingState::Ready(snapshot.into()),
            Err(err) => ListingState::Failed {
                failure: err.into(),
                stale: self.state.last_good(),
            },
        };
        self.visible.take();
        true
    }

    /// The snapshot the visible list is computed from, if any.
    ///
    /// `None` while idle, while loading for the first time, and after a
    /// failure (a failed fetch means "no data", not "empty data").
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot<T>> {
        match &self.state {
            ListingState::Ready(snapshot) => Some(snapshot),
            ListingState::Loading { stale } => stale.as_ref(),
            ListingState::Idle | ListingState::Failed { .. } => None,
        }
    }

    /// The items to render, in order, or the failure to show instead.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchFailure`] of the latest request when it failed.
    pub fn visible(&self) -> Result<Vec<&T>, &FetchFailure> {
        if let ListingState::Failed { failure, .. } = &self.state {
            return Err(failure);
        }

        let Some(snapshot) = self.snapshot() else {
            return Ok(Vec::new());
        };

        let indices = self
            .visible
            .get_or_init(|| visible_indices(snapshot, &self.params));

        Ok(indices.iter().filter_map(|&i| snapshot.get(i)).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use deal_core::{CategoryId, Product};

    use super::*;
    use crate::error::CatalogError;
    use crate::pipeline::{ProductSort, SortDirection};
    use crate::test_support::product;

    fn titles(page: &ListingPage<Product>) -> Vec<String> {
        page.visible()
            .unwrap()
            .iter()
            .map(|p| p.title.clone())
            .collect()
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Phone", 50_000, &["smartphones"], "s1"),
            product("2", "Blender", 9_000, &["kitchen"], "s2"),
            product("3", "Earbuds", 12_000, &["audio", "accessories"], "s2"),
        ]
    }

    fn unavailable() -> CatalogError {
        CatalogError::Server {
            status: 503,
            message: "Service Unavailable".to_string(),
            errors: Vec::new(),
        }
    }

    #[test]
    fn test_idle_and_first_load_are_empty() {
        let mut page = ListingPage::<Product>::new();
        assert_eq!(page.status(), ListingStatus::Idle);
        assert!(page.visible().unwrap().is_empty());

        page.begin_fetch();
        assert_eq!(page.status(), ListingStatus::Loading);
        assert!(page.visible().unwrap().is_empty());
    }

    #[test]
    fn test_params_apply_once_ready() {
        let mut page = ListingPage::<Product>::new();
        page.set_sort(Some(ProductSort::Price(SortDirection::Ascending)));
        let ticket = page.begin_fetch();
        assert!(page.finish_fetch(ticket, Ok::<_, CatalogError>(catalog())));

        assert_eq!(titles(&page), ["Blender", "Earbuds", "Phone"]);

        page.set_criterion(Some(CategoryId::new("audio")));
        assert_eq!(titles(&page), ["Earbuds"]);
    }

    #[test]
    fn test_refetch_keeps_filtering_previous_snapshot() {
        let mut page = ListingPage::<Product>::new();
        let first = page.begin_fetch();
        page.finish_fetch(first, Ok::<_, CatalogError>(catalog()));

        page.begin_fetch();
        page.set_search("phone");
        assert_eq!(page.status(), ListingStatus::Loading);
        assert_eq!(titles(&page), ["Phone"]);
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let mut page = ListingPage::<Product>::new();
        let slow = page.begin_fetch();
        let fast = page.begin_fetch();

        assert!(page.finish_fetch(fast, Ok::<_, CatalogError>(catalog())));
        assert!(!page.finish_fetch(slow, Ok::<_, CatalogError>(Vec::new())));
        assert_eq!(page.visible().unwrap().len(), 3);
    }

    #[test]
    fn test_ticket_from_another_page_is_rejected() {
        let mut grid = ListingPage::<Product>::new();
        let mut widget = ListingPage::<Product>::new();
        let from_grid = grid.begin_fetch();
        widget.begin_fetch();

        assert!(!widget.finish_fetch(from_grid, Ok::<_, CatalogError>(catalog())));
        assert_eq!(widget.status(), ListingStatus::Loading);

        assert!(grid.finish_fetch(from_grid, Ok::<_, CatalogError>(catalog())));
        assert_eq!(grid.status(), ListingStatus::Ready);
    }

    #[test]
    fn test_failure_surfaces_error_and_keeps_params() {
        let mut page = ListingPage::<Product>::new();
        page.set_search("blend");
        let first = page.begin_fetch();
        page.finish_fetch(first, Ok::<_, CatalogError>(catalog()));

        let second = page.begin_fetch();
        page.finish_fetch(second, Err::<Vec<Product>, _>(unavailable()));

        let failure = page.visible().unwrap_err();
        assert_eq!(failure.status, Some(503));
        assert!(failure.retryable);
        assert!(page.snapshot().is_none());
        assert_eq!(page.params().search.as_str(), "blend");

        // Retrying shows the last good snapshot again while loading.
        assert!(page.retry().is_some());
        assert_eq!(titles(&page), ["Blender"]);
    }

    #[test]
    fn test_retry_only_after_failure() {
        let mut page = ListingPage::<Product>::new();
        assert!(page.retry().is_none());
    }

    #[test]
    fn test_snapshot_can_be_shared_between_pages() {
        let shared: Snapshot<Product> = Arc::from(catalog());

        let mut grid = ListingPage::<Product>::new();
        let mut widget = ListingPage::with_params(
            ListParams::new().with_criterion(CategoryId::new("kitchen")),
        );
        let t1 = grid.begin_fetch();
        let t2 = widget.begin_fetch();
        grid.finish_fetch(t1, Ok::<_, CatalogError>(Arc::clone(&shared)));
        widget.finish_fetch(t2, Ok::<_, CatalogError>(Arc::clone(&shared)));

        assert_eq!(grid.visible().unwrap().len(), 3);
        assert_eq!(titles(&widget), ["Blender"]);
        assert_eq!(Arc::strong_count(&shared), 3);
    }

    #[test]
    fn test_reset_params_keeps_viewer() {
        let mut page = ListingPage::<Product>::new();
        page.set_viewer(Some(deal_core::Viewer::new("s1", deal_core::UserRole::User)));
        page.set_search("x");
        page.reset_params();
        assert!(!page.params().search.is_active());
        assert!(page.params().viewer.is_some());
    }
}
