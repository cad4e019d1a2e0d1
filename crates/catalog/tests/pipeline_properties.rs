//! Property-based tests for the listing pipeline.
//!
//! For any snapshot and parameters:
//! 1. The visible list is a sub-multiset of the snapshot (filtering only removes).
//! 2. Running the pipeline twice gives the same list.
//! 3. Items that compare equal under the sort key keep snapshot order.
//! 4. Every visible item passes every active predicate; nothing that passes is dropped.
//! 5. Clearing search and criterion only adds items: the narrowed list appears
//!    inside the widened one in the same relative order.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use proptest::prelude::*;

use deal_catalog::{ListParams, Listable, ProductSort, SortDirection, visible_indices};
use deal_core::{CategoryId, Price, Product, ProductCategory, UserId, UserRole, Viewer};

// =============================================================================
// Strategy helpers
// =============================================================================

const CATEGORIES: &[&str] = &["audio", "kitchen", "smartphones", "toys"];
const SELLERS: &[&str] = &["s1", "s2", "s3"];

fn product_strategy() -> impl Strategy<Value = Product> {
    (
        "[A-Za-z ]{0,8}",
        0i64..5_000,
        prop::sample::subsequence(CATEGORIES, 0..=2),
        prop::sample::select(SELLERS),
    )
        .prop_map(|(title, cents, categories, seller)| Product {
            id: format!("p-{title}-{cents}").into(),
            title,
            description: String::new(),
            price: Price::from_cents(cents).unwrap(),
            stock: 1,
            image_url: String::new(),
            categories: categories
                .into_iter()
                .map(|c| ProductCategory::new(c, c.to_uppercase()))
                .collect(),
            seller_id: UserId::new(seller),
        })
}

fn sort_strategy() -> impl Strategy<Value = Option<ProductSort>> {
    let direction = prop_oneof![Just(SortDirection::Ascending), Just(SortDirection::Descending)];
    prop::option::of(direction.prop_flat_map(|d| {
        prop_oneof![Just(ProductSort::Title(d)), Just(ProductSort::Price(d))]
    }))
}

fn params_strategy() -> impl Strategy<Value = ListParams<Product>> {
    (
        prop::option::of("[a-z ]{0,3}"),
        prop::option::of(prop::sample::select(CATEGORIES)),
        sort_strategy(),
        prop::option::of((prop::sample::select(SELLERS), any::<bool>())),
    )
        .prop_map(|(search, category, sort, viewer)| {
            let mut params = ListParams::<Product>::new();
            if let Some(text) = search {
                params = params.with_search(&text);
            }
            params.criterion = category.map(CategoryId::new);
            params.sort = sort;
            params.viewer = viewer.map(|(id, is_admin)| {
                Viewer::new(id, if is_admin { UserRole::Admin } else { UserRole::User })
            });
            params
        })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn visible_list_is_a_subset_without_duplicates(
        snapshot in prop::collection::vec(product_strategy(), 0..20),
        params in params_strategy(),
    ) {
        let indices = visible_indices(&snapshot, &params);
        let mut seen = indices.clone();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), indices.len());
        prop_assert!(indices.iter().all(|&i| i < snapshot.len()));
    }

    #[test]
    fn pipeline_is_deterministic(
        snapshot in prop::collection::vec(product_strategy(), 0..20),
        params in params_strategy(),
    ) {
        prop_assert_eq!(visible_indices(&snapshot, &params), visible_indices(&snapshot, &params));
    }

    #[test]
    fn filter_is_exact(
        snapshot in prop::collection::vec(product_strategy(), 0..20),
        params in params_strategy(),
    ) {
        let indices = visible_indices(&snapshot, &params);
        let expected = snapshot.iter().filter(|p| params.admits(p)).count();
        prop_assert_eq!(indices.len(), expected);
        prop_assert!(indices.iter().all(|&i| params.admits(&snapshot[i])));
    }

    #[test]
    fn sort_is_ordered_and_stable(
        snapshot in prop::collection::vec(product_strategy(), 0..20),
        params in params_strategy(),
    ) {
        let Some(key) = params.sort else {
            // No sort: snapshot order.
            let indices = visible_indices(&snapshot, &params);
            prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
            return Ok(());
        };

        let indices = visible_indices(&snapshot, &params);
        for pair in indices.windows(2) {
            let (a, b) = (&snapshot[pair[0]], &snapshot[pair[1]]);
            let ordering = a.compare_by(b, key);
            prop_assert!(ordering.is_le());
            if ordering.is_eq() {
                prop_assert!(pair[0] < pair[1]);
            }
        }
    }

    #[test]
    fn narrowed_list_is_an_ordered_subsequence_of_the_cleared_list(
        snapshot in prop::collection::vec(product_strategy(), 0..20),
        params in params_strategy(),
    ) {
        let narrowed = visible_indices(&snapshot, &params);
        let widened = visible_indices(&snapshot, &params.cleared());
        prop_assert!(widened.len() >= narrowed.len());

        // Each narrowed index must be found after the previous one's match.
        let mut rest = widened.iter();
        for index in &narrowed {
            prop_assert!(
                rest.any(|w| w == index),
                "index {} missing or out of order in {:?}",
                index,
                widened
            );
        }
    }
}
