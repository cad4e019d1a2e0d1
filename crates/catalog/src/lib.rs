//! Deal catalog: listing pipeline and Catalog Data Source client.
//!
//! The [`pipeline`] module turns a snapshot of products, users or categories
//! plus the user's [`ListParams`] into the list a view renders. The
//! [`CatalogClient`] fetches and caches those snapshots, and [`ListingPage`]
//! tracks one page's fetch lifecycle and parameters.
//!
//! ```rust
//! use deal_catalog::{ListParams, ProductSort, SortDirection, compute_visible_list};
//! use deal_core::Product;
//!
//! let snapshot: Vec<Product> = Vec::new();
//! let params = ListParams::<Product>::new()
//!     .with_search("phone")
//!     .with_sort(ProductSort::Price(SortDirection::Ascending));
//! assert!(compute_visible_list(&snapshot, &params).is_empty());
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod client;
pub mod config;
pub mod error;
pub mod listing;
pub mod pipeline;
pub mod remote;

#[cfg(test)]
mod test_support;

pub use client::{CacheKey, CacheTag, CatalogClient, DEFAULT_RECOMMENDATION_LIMIT};
pub use config::{CatalogConfig, ConfigError};
pub use error::{CatalogError, FetchFailure};
pub use listing::{FetchTicket, ListingPage, ListingState, ListingStatus, Snapshot};
pub use pipeline::{
    CategorySort, ListParams, Listable, ParseSortError, ProductSort, SearchText, SortDirection,
    UserSort, compute_visible_list, tier_admits, visible_indices,
};
pub use remote::{Evaluation, PageRequest, RemoteListable, query_pairs};
