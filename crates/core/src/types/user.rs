//! Users as seen by the admin console, and the active viewer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;
use super::product::ProductCategory;
use super::role::UserRole;

/// A marketplace account as returned by `GET /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainUser {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub email: String,
    pub role: UserRole,
    /// Presence implies the account can sell.
    #[serde(default)]
    pub store_address: Option<String>,
    /// Categories assigned by an admin.
    #[serde(default)]
    pub product_categories: Vec<ProductCategory>,
    pub created_at: DateTime<Utc>,
}

impl MainUser {
    /// Whether the account has a (non-blank) store address.
    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.store_address
            .as_deref()
            .is_some_and(|address| !address.trim().is_empty())
    }

    /// Full name when set, username otherwise.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

/// The user a listing is rendered for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub role: UserRole,
}

impl Viewer {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(full_name: Option<&str>, store_address: Option<&str>) -> MainUser {
        MainUser {
            id: UserId::new("u-1"),
            username: "shopowner22".to_string(),
            full_name: full_name.map(str::to_string),
            email: "owner@example.com".to_string(),
            role: UserRole::User,
            store_address: store_address.map(str::to_string),
            product_categories: Vec::new(),
            created_at: "2023-06-12T11:45:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn test_blank_store_address_is_not_a_seller() {
        assert!(!user(None, Some("   ")).is_seller());
        assert!(!user(None, None).is_seller());
        assert!(user(None, Some("456 Business Ave")).is_seller());
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(user(None, None).display_name(), "shopowner22");
        assert_eq!(user(Some(""), None).display_name(), "shopowner22");
        assert_eq!(user(Some("Ana Pop"), None).display_name(), "Ana Pop");
    }

    #[test]
    fn test_user_from_catalog_json() {
        let json = r#"{
            "id": "u-9",
            "username": "artisan44",
            "email": "a@example.com",
            "role": "USER",
            "storeAddress": "Cluj-Napoca",
            "createdAt": "2023-06-11T09:15:00Z"
        }"#;
        let parsed: MainUser = serde_json::from_str(json).unwrap();
        assert!(parsed.is_seller());
        assert!(parsed.product_categories.is_empty());
    }
}
