//! Deal Core - Shared domain types.
//!
//! This crate provides the types exchanged with the Deal Catalog Data Source
//! and consumed by the listing pipeline in `deal-catalog`:
//! - [`Product`], [`ProductCategory`], [`ProductDetails`] and [`MainUser`] records
//! - [`Recommendation`] payloads for the recommendation widget
//! - the [`DealResponse`] envelope every endpoint wraps its payload in
//! - type-safe ids, [`Price`], roles and admin role tiers
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. Records are
//! read-only snapshots from the pipeline's point of view.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
