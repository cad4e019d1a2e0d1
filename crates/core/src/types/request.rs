//! Request bodies for catalog mutations.
//!
//! Products reference their categories by name on create and update; the
//! catalog resolves names to records.

use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId, UserId};
use super::price::Price;

/// Body of `POST /products`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub stock: u32,
    #[serde(default)]
    pub image_url: String,
    /// Category names.
    #[serde(default)]
    pub categories: Vec<String>,
    pub seller_id: UserId,
}

/// Body of `PATCH /products`. Absent fields are left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub id: ProductId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Replaces the whole category set when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
}

impl UpdateProductRequest {
    #[must_use]
    pub fn new(id: impl Into<ProductId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            price: None,
            stock: None,
            image_url: None,
            categories: None,
        }
    }
}

/// Body of `POST /product-categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductCategoryRequest {
    pub category_name: String,
}

/// Body of `PATCH /product-categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductCategoryRequest {
    pub id: CategoryId,
    pub category_name: String,
}

/// Body of `POST /users/{id}/categories`: the full set of categories a
/// seller may list under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignProductCategoryRequest {
    pub user_id: UserId,
    pub product_category_ids: Vec<CategoryId>,
}
