//! Core types for the Deal catalog.

pub mod envelope;
pub mod id;
pub mod price;
pub mod product;
pub mod recommendation;
pub mod request;
pub mod role;
pub mod user;

pub use envelope::{DealError, DealResponse, PaginationDetails};
pub use id::*;
pub use price::{Price, PriceError};
pub use product::{Product, ProductCategory, ProductDetails};
pub use recommendation::{Recommendation, RecommendationKind};
pub use request::{
    AssignProductCategoryRequest, CreateProductCategoryRequest, CreateProductRequest,
    UpdateProductCategoryRequest, UpdateProductRequest,
};
pub use role::{ParseTierError, RoleTier, UserRole};
pub use user::{MainUser, Viewer};
