//! User roles and admin role tiers.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account role as stored by the identity service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// Admin-view bucket a [`MainUser`](crate::MainUser) can be filtered into.
///
/// Every `USER` can buy, so `Buyer` admits all of them. `Seller` and
/// `SellerBuyer` currently admit the same users (role `USER` with a store
/// address); whether `SellerBuyer` should mean something narrower is
/// unresolved upstream, so the two stay separate variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleTier {
    Admin,
    Seller,
    Buyer,
    SellerBuyer,
}

impl RoleTier {
    /// All tiers in display order.
    pub const ALL: [Self; 4] = [Self::Admin, Self::Seller, Self::Buyer, Self::SellerBuyer];

    /// Wire/URL form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::Seller => "SELLER",
            Self::Buyer => "BUYER",
            Self::SellerBuyer => "SELLER_BUYER",
        }
    }
}

impl fmt::Display for RoleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no [`RoleTier`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role tier '{0}' (expected ADMIN, SELLER, BUYER or SELLER_BUYER)")]
pub struct ParseTierError(pub String);

impl FromStr for RoleTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|tier| tier.as_str() == normalized)
            .ok_or_else(|| ParseTierError(s.to_owned()))
    }
}
