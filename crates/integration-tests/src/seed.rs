//! Seed data for the fake catalog.

use chrono::{DateTime, Utc};
use deal_core::{MainUser, Price, Product, ProductCategory, UserId, UserRole};

/// Initial contents of a [`FakeCatalog`](crate::FakeCatalog).
#[derive(Debug, Clone, Default)]
pub struct Seed {
    pub products: Vec<Product>,
    pub categories: Vec<ProductCategory>,
    pub users: Vec<MainUser>,
}

fn at(timestamp: &str) -> DateTime<Utc> {
    timestamp.parse().unwrap()
}

fn category(id: &str, name: &str) -> ProductCategory {
    ProductCategory::new(id, name)
}

fn product(
    id: &str,
    title: &str,
    cents: i64,
    categories: &[&ProductCategory],
    seller: &str,
) -> Product {
    Product {
        id: id.into(),
        title: title.to_string(),
        description: format!("{title} from the Deal marketplace"),
        price: Price::from_cents(cents).unwrap(),
        stock: 5,
        image_url: format!("https://cdn.deal.test/{id}.jpg"),
        categories: categories.iter().map(|c| (*c).clone()).collect(),
        seller_id: UserId::new(seller),
    }
}

fn user(
    id: &str,
    username: &str,
    role: UserRole,
    store_address: Option<&str>,
    created_at: &str,
) -> MainUser {
    MainUser {
        id: id.into(),
        username: username.to_string(),
        full_name: None,
        email: format!("{username}@deal.test"),
        role,
        store_address: store_address.map(str::to_string),
        product_categories: Vec::new(),
        created_at: at(created_at),
    }
}

impl Seed {
    /// Empty catalog.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A small marketplace: three categories, five products from two
    /// sellers, four users. The buyer follows the audio category.
    pub fn marketplace() -> Self {
        let audio = category("c-audio", "Audio");
        let kitchen = category("c-kitchen", "Kitchen");
        let phones = category("c-phones", "Smartphones");

        let products = vec![
            product("p-1", "Phone X", 79_900, &[&phones], "u-seller-1"),
            product("p-2", "blender", 4_999, &[&kitchen], "u-seller-2"),
            product("p-3", "Earbuds", 12_900, &[&audio, &phones], "u-seller-2"),
            product("p-4", "Kettle", 2_499, &[&kitchen], "u-seller-1"),
            product("p-5", "Phone Case", 1_999, &[&phones], "u-seller-2"),
        ];

        let users = vec![
            user("u-admin", "root", UserRole::Admin, None, "2024-01-01T00:00:00Z"),
            user(
                "u-seller-1",
                "marketbob",
                UserRole::User,
                Some("1 Market Street"),
                "2024-03-01T00:00:00Z",
            ),
            user(
                "u-seller-2",
                "alice",
                UserRole::User,
                Some("22 Harbour Road"),
                "2024-02-01T00:00:00Z",
            ),
            MainUser {
                product_categories: vec![audio.clone()],
                ..user("u-buyer", "carol", UserRole::User, None, "2024-04-01T00:00:00Z")
            },
        ];

        Self {
            products,
            categories: vec![audio, kitchen, phones],
            users,
        }
    }
}
