//! Per-entity predicates and comparators.

use core::cmp::Ordering;
use core::convert::Infallible;

use deal_core::{CategoryId, MainUser, Product, ProductCategory, RoleTier, UserRole, Viewer};

use super::search::SearchText;
use super::sort::{CategorySort, ProductSort, UserSort, collate};

/// A record type that can be shown in a filtered, sorted listing.
///
/// The criterion and sort key are chosen per entity, so each view accepts
/// exactly the filters and orders that make sense for it.
pub trait Listable {
    /// The single-select filter of the view (category, role tier, ...).
    type Criterion;
    /// The named orders the view supports.
    type SortKey: Copy;

    /// Whether the search text hits any of the entity's display fields.
    fn matches_text(&self, search: &SearchText) -> bool;

    /// Whether the entity passes the view's criterion.
    fn admits(&self, criterion: &Self::Criterion) -> bool;

    /// Ascending comparison under `key`, oriented by the key's direction.
    fn compare_by(&self, other: &Self, key: Self::SortKey) -> Ordering;

    /// Whether the entity must never be shown to `viewer`.
    fn hidden_from(&self, _viewer: &Viewer) -> bool {
        false
    }
}

impl Listable for Product {
    type Criterion = CategoryId;
    type SortKey = ProductSort;

    fn matches_text(&self, search: &SearchText) -> bool {
        search.matches(&self.title)
    }

    fn admits(&self, category_id: &CategoryId) -> bool {
        self.in_category(category_id)
    }

    fn compare_by(&self, other: &Self, key: ProductSort) -> Ordering {
        match key {
            ProductSort::Title(direction) => direction.apply(collate(&self.title, &other.title)),
            ProductSort::Price(direction) => direction.apply(self.price.cmp(&other.price)),
        }
    }

    /// Sellers do not see their own inventory in the marketplace feed.
    fn hidden_from(&self, viewer: &Viewer) -> bool {
        !viewer.is_admin() && self.seller_id == viewer.user_id
    }
}

impl Listable for MainUser {
    type Criterion = RoleTier;
    type SortKey = UserSort;

    fn matches_text(&self, search: &SearchText) -> bool {
        search.matches_any([
            Some(self.username.as_str()),
            self.full_name.as_deref(),
            Some(self.email.as_str()),
            self.store_address.as_deref(),
        ])
    }

    fn admits(&self, tier: &RoleTier) -> bool {
        tier_admits(*tier, self)
    }

    fn compare_by(&self, other: &Self, key: UserSort) -> Ordering {
        match key {
            UserSort::Name(direction) => {
                direction.apply(collate(self.display_name(), other.display_name()))
            }
            UserSort::CreatedAt(direction) => {
                direction.apply(self.created_at.cmp(&other.created_at))
            }
        }
    }
}

impl Listable for ProductCategory {
    type Criterion = Infallible;
    type SortKey = CategorySort;

    fn matches_text(&self, search: &SearchText) -> bool {
        search.matches(&self.category_name)
    }

    fn admits(&self, criterion: &Infallible) -> bool {
        match *criterion {}
    }

    fn compare_by(&self, other: &Self, key: CategorySort) -> Ordering {
        match key {
            CategorySort::Name(direction) => {
                direction.apply(collate(&self.category_name, &other.category_name))
            }
        }
    }
}

/// Role-tier membership.
///
/// `SellerBuyer` admits exactly the users `Seller` admits; see
/// [`RoleTier`] for why both exist.
#[must_use]
pub fn tier_admits(tier: RoleTier, user: &MainUser) -> bool {
    match tier {
        RoleTier::Admin => user.role == UserRole::Admin,
        RoleTier::Buyer => user.role == UserRole::User,
        RoleTier::Seller | RoleTier::SellerBuyer => {
            user.role == UserRole::User && user.is_seller()
        }
    }
}
