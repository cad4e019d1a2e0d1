//! Product and category records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, UserId};
use super::price::Price;
use super::user::MainUser;

/// A product category (e.g. "Smartphones").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCategory {
    pub id: CategoryId,
    /// Display label, non-empty.
    pub category_name: String,
}

impl ProductCategory {
    #[must_use]
    pub fn new(id: impl Into<CategoryId>, category_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category_name: category_name.into(),
        }
    }
}

/// A product listed on the marketplace.
///
/// Older payloads call the display field `name`; it is accepted as an alias
/// of `title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub stock: u32,
    #[serde(default)]
    pub image_url: String,
    /// Categories in the order the catalog lists them; may be empty.
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    pub seller_id: UserId,
}

impl Product {
    /// Whether the product belongs to the category with the given id.
    #[must_use]
    pub fn in_category(&self, category_id: &CategoryId) -> bool {
        self.categories.iter().any(|c| &c.id == category_id)
    }

    /// Whether any stock is left.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        self.stock > 0
    }
}

/// A product together with its seller's account, from `GET /products/details/{id}`.
///
/// The seller is embedded instead of referenced, so there is no `sellerId`
/// on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub id: ProductId,
    #[serde(alias = "name")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub stock: u32,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub categories: Vec<ProductCategory>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "sellerDTO")]
    pub seller: MainUser,
}

impl ProductDetails {
    /// The listing record, with the seller reduced to its id.
    #[must_use]
    pub fn product(&self) -> Product {
        Product {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            price: self.price,
            stock: self.stock,
            image_url: self.image_url.clone(),
            categories: self.categories.clone(),
            seller_id: self.seller.id.clone(),
        }
    }
}
