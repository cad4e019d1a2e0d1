//! Record builders shared by unit tests.

#![allow(clippy::unwrap_used)]

use deal_core::{MainUser, Price, Product, ProductCategory, UserId, UserRole};

pub fn product(id: &str, title: &str, cents: i64, categories: &[&str], seller: &str) -> Product {
    Product {
        id: id.into(),
        title: title.to_string(),
        description: String::new(),
        price: Price::from_cents(cents).unwrap(),
        stock: 1,
        image_url: String::new(),
        categories: categories
            .iter()
            .map(|c| ProductCategory::new(*c, c.to_uppercase()))
            .collect(),
        seller_id: UserId::new(seller),
    }
}

pub fn user_at(
    id: &str,
    username: &str,
    store_address: Option<&str>,
    created_at: &str,
) -> MainUser {
    MainUser {
        id: id.into(),
        username: username.to_string(),
        full_name: None,
        email: format!("{username}@example.com"),
        role: UserRole::User,
        store_address: store_address.map(str::to_string),
        product_categories: Vec::new(),
        created_at: created_at.parse().unwrap(),
    }
}

pub fn admin(id: &str, username: &str, created_at: &str) -> MainUser {
    MainUser {
        role: UserRole::Admin,
        ..user_at(id, username, None, created_at)
    }
}
