//! Server-side evaluation of listing parameters.
//!
//! The Catalog Data Source can filter, sort and page products itself. A
//! [`RemoteListable`] entity knows how to spell its criterion and sort key as
//! query parameters; [`Evaluation`] picks which side does the work.
//!
//! Ownership exclusion depends on who is looking, which the server does not
//! know from these parameters, so it always runs locally.

use deal_core::Product;

use crate::pipeline::{ListParams, Listable, ProductSort, SortDirection};

/// Where listing parameters are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Evaluation {
    /// Fetch the full snapshot and run the pipeline in process.
    #[default]
    Local,
    /// Send the parameters and trust the server's filtering and order.
    Remote { page: Option<PageRequest> },
}

/// Zero-based page selection for remote evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    #[must_use]
    pub const fn new(page: u32, size: u32) -> Self {
        Self { page, size }
    }
}

/// An entity whose listing parameters the catalog understands.
pub trait RemoteListable: Listable {
    /// Query parameter name and value for a criterion.
    fn criterion_param(criterion: &Self::Criterion) -> (&'static str, String);

    /// Sort property name and direction for a key.
    fn sort_param(key: Self::SortKey) -> (&'static str, SortDirection);
}

impl RemoteListable for Product {
    fn criterion_param(category_id: &Self::Criterion) -> (&'static str, String) {
        ("categoryId", category_id.to_string())
    }

    fn sort_param(key: ProductSort) -> (&'static str, SortDirection) {
        match key {
            ProductSort::Title(direction) => ("title", direction),
            ProductSort::Price(direction) => ("price", direction),
        }
    }
}

const fn direction_param(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Ascending => "ASC",
        SortDirection::Descending => "DESC",
    }
}

/// Encode `params` as catalog query parameters, in a fixed order.
///
/// Inactive parameters are omitted rather than sent empty.
#[must_use]
pub fn query_pairs<T: RemoteListable>(
    params: &ListParams<T>,
    page: Option<PageRequest>,
) -> Vec<(&'static str, String)> {
    let mut pairs = Vec::new();

    if params.search.is_active() {
        pairs.push(("search", params.search.as_str().to_owned()));
    }
    if let Some(criterion) = &params.criterion {
        pairs.push(T::criterion_param(criterion));
    }
    if let Some(key) = params.sort {
        let (property, direction) = T::sort_param(key);
        pairs.push(("property", property.to_owned()));
        pairs.push(("sort", direction_param(direction).to_owned()));
    }
    if let Some(PageRequest { page, size }) = page {
        pairs.push(("page", page.to_string()));
        pairs.push(("size", size.to_string()));
    }

    pairs
}

#[cfg(test)]
mod tests {
    use deal_core::CategoryId;

    use super::*;

    #[test]
    fn test_default_params_send_nothing() {
        assert!(query_pairs(&ListParams::<Product>::new(), None).is_empty());
    }

    #[test]
    fn test_all_params_in_order() {
        let params = ListParams::<Product>::new()
            .with_search("  Phone ")
            .with_criterion(CategoryId::new("c-9"))
            .with_sort(ProductSort::Price(SortDirection::Descending));

        assert_eq!(
            query_pairs(&params, Some(PageRequest::new(2, 20))),
            vec![
                ("search", "Phone".to_string()),
                ("categoryId", "c-9".to_string()),
                ("property", "price".to_string()),
                ("sort", "DESC".to_string()),
                ("page", "2".to_string()),
                ("size", "20".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_search_is_omitted() {
        let params = ListParams::<Product>::new()
            .with_search("   ")
            .with_sort(ProductSort::Title(SortDirection::Ascending));
        assert_eq!(
            query_pairs(&params, None),
            vec![("property", "title".to_string()), ("sort", "ASC".to_string())]
        );
    }
}
