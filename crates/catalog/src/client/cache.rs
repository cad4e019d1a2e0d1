//! Tag-grouped response cache.
//!
//! Entries stay valid until a mutation invalidates their tag (or an optional
//! TTL expires). Snapshots are stored behind `Arc`, so every reader of a tag
//! shares one allocation.
//!
//! Each tag carries a generation counter that `invalidate` bumps. A fetch
//! reads the generation before its request and stores the result only if no
//! invalidation happened in between, so a response that was already in
//! flight when a mutation landed can never repopulate the tag.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use deal_core::{
    CategoryId, MainUser, Product, ProductCategory, ProductDetails, ProductId, Recommendation,
    UserId,
};
use moka::future::Cache;
use tracing::debug;

use crate::listing::Snapshot;

/// Resource groups that are invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Products,
    ProductCategories,
    Users,
}

/// Cache key for catalog queries.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Products,
    Product(ProductId),
    ProductDetails(ProductId),
    SellerProducts(UserId),
    UserRecommendations { user_id: UserId, limit: u32 },
    PopularProducts { limit: u32 },
    ProductCategories,
    ProductCategory(CategoryId),
    Users,
}

impl CacheKey {
    #[must_use]
    pub const fn tag(&self) -> CacheTag {
        match self {
            Self::Products
            | Self::Product(_)
            | Self::ProductDetails(_)
            | Self::SellerProducts(_)
            | Self::UserRecommendations { .. }
            | Self::PopularProducts { .. } => CacheTag::Products,
            Self::ProductCategories | Self::ProductCategory(_) => CacheTag::ProductCategories,
            Self::Users => CacheTag::Users,
        }
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(Snapshot<Product>),
    Product(Box<Product>),
    ProductDetails(Box<ProductDetails>),
    Recommendation(Arc<Recommendation>),
    ProductCategories(Snapshot<ProductCategory>),
    ProductCategory(ProductCategory),
    Users(Snapshot<MainUser>),
}

/// Invalidation count of one tag, read before a fetch starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

/// One `moka` cache per [`CacheTag`].
pub struct TaggedCache {
    products: Shard,
    categories: Shard,
    users: Shard,
}

struct Shard {
    entries: Cache<CacheKey, CacheValue>,
    generation: AtomicU64,
}

impl TaggedCache {
    pub fn new(capacity: u64, ttl: Option<Duration>) -> Self {
        let build = || {
            let builder = Cache::builder().max_capacity(capacity);
            let entries = match ttl {
                Some(ttl) => builder.time_to_live(ttl).build(),
                None => builder.build(),
            };
            Shard {
                entries,
                generation: AtomicU64::new(0),
            }
        };
        Self {
            products: build(),
            categories: build(),
            users: build(),
        }
    }

    const fn shard(&self, tag: CacheTag) -> &Shard {
        match tag {
            CacheTag::Products => &self.products,
            CacheTag::ProductCategories => &self.categories,
            CacheTag::Users => &self.users,
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<CacheValue> {
        self.shard(key.tag()).entries.get(key).await
    }

    /// Current generation of `tag`. Read it before sending the request whose
    /// response will be stored.
    pub fn generation(&self, tag: CacheTag) -> Generation {
        Generation(self.shard(tag).generation.load(Ordering::Acquire))
    }

    /// Store `value` unless `key`'s tag was invalidated since `seen`.
    ///
    /// An invalidation racing the insert itself is caught by re-reading the
    /// generation afterwards and dropping the entry again.
    pub async fn insert(&self, key: CacheKey, value: CacheValue, seen: Generation) {
        let tag = key.tag();
        let shard = self.shard(tag);
        if self.generation(tag) != seen {
            debug!(?tag, "Not caching a response fetched before invalidation");
            return;
        }

        shard.entries.insert(key.clone(), value).await;

        if self.generation(tag) != seen {
            debug!(?tag, "Invalidated while caching; dropping entry");
            shard.entries.invalidate(&key).await;
        }
    }

    /// Drop every entry under `tag`; the next read refetches.
    pub async fn invalidate(&self, tag: CacheTag) {
        let shard = self.shard(tag);
        shard.generation.fetch_add(1, Ordering::AcqRel);
        shard.entries.invalidate_all();
        shard.entries.run_pending_tasks().await;
    }
}
