//! Integration test harness for the Deal catalog client.
//!
//! [`FakeCatalog`] is an in-process `axum` server speaking the Catalog Data
//! Source's envelope protocol under `/api`. It records every request (method,
//! path, query, `Authorization` header), can be told to fail the next
//! request, and can hold a response back until the test releases it, so
//! tests can observe caching, invalidation, races and error mapping through
//! a real HTTP round trip.
//!
//! ```rust,ignore
//! let catalog = FakeCatalog::spawn(Seed::marketplace()).await;
//! let client = catalog.client();
//! let products = client.get_products().await.unwrap();
//! assert_eq!(catalog.hits("GET /api/products"), 1);
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

mod seed;

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use deal_catalog::{CatalogClient, CatalogConfig};
use deal_core::{
    AssignProductCategoryRequest, CreateProductCategoryRequest, CreateProductRequest,
    DealResponse, MainUser, Product, ProductCategory, ProductDetails, Recommendation,
    RecommendationKind, UpdateProductCategoryRequest, UpdateProductRequest,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;
use url::Url;

pub use seed::Seed;

/// A request as the fake catalog saw it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
}

/// A failure to serve instead of the next request.
#[derive(Debug, Clone)]
pub enum Injected {
    /// Non-success HTTP status with a failure envelope body.
    Status { status: u16, errors: Vec<String> },
    /// HTTP 200 carrying a failure envelope.
    Envelope { status: u16, errors: Vec<String> },
    /// 429 with a `Retry-After` header.
    RateLimited { retry_after: u64 },
    /// HTTP 200 with a body that is not an envelope.
    Garbage,
}

/// A response the fake has produced but not yet sent.
///
/// Returned by [`FakeCatalog::hold_next`]. The handler runs against the data
/// as it is when the request arrives; the response then waits for
/// [`release`](Self::release).
pub struct HeldRequest {
    served: oneshot::Receiver<()>,
    release: oneshot::Sender<()>,
}

impl HeldRequest {
    /// Wait until the held request has been handled.
    pub async fn served(&mut self) {
        let _ = (&mut self.served).await;
    }

    /// Let the response go out.
    pub fn release(self) {
        let _ = self.release.send(());
    }
}

struct Hold {
    route: String,
    served: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

#[derive(Default)]
struct Store {
    products: Vec<Product>,
    categories: Vec<ProductCategory>,
    users: Vec<MainUser>,
    next_id: u64,
}

#[derive(Default)]
struct FakeState {
    store: Mutex<Store>,
    requests: Mutex<Vec<Recorded>>,
    injected: Mutex<Option<Injected>>,
    hold: Mutex<Option<Hold>>,
}

type Shared = Arc<FakeState>;

/// Poisoning only happens after a panic in a handler, which already fails the test.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// A running fake catalog.
pub struct FakeCatalog {
    addr: SocketAddr,
    state: Shared,
}

impl FakeCatalog {
    /// Start the server on an ephemeral port.
    pub async fn spawn(seed: Seed) -> Self {
        let state: Shared = Arc::new(FakeState {
            store: Mutex::new(Store {
                products: seed.products,
                categories: seed.categories,
                users: seed.users,
                next_id: 1,
            }),
            ..FakeState::default()
        });

        let app = Router::new().nest("/api", api_routes()).layer(
            middleware::from_fn_with_state(Arc::clone(&state), record_and_inject),
        );
        let app = app.with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL a client should be configured with.
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).unwrap()
    }

    /// A client with default configuration and no token.
    pub fn client(&self) -> CatalogClient {
        CatalogClient::new(&CatalogConfig::new(self.base_url())).unwrap()
    }

    /// A client that sends `token` as a bearer token.
    pub fn client_with_token(&self, token: &str) -> CatalogClient {
        CatalogClient::new(&CatalogConfig::new(self.base_url()).with_token(token)).unwrap()
    }

    /// Number of requests seen for `"METHOD /path"`.
    pub fn hits(&self, route: &str) -> usize {
        lock(&self.state.requests)
            .iter()
            .filter(|r| format!("{} {}", r.method, r.path) == route)
            .count()
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<Recorded> {
        lock(&self.state.requests).clone()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<Recorded> {
        lock(&self.state.requests).last().cloned()
    }

    /// Serve `failure` instead of the next request.
    pub fn fail_next(&self, failure: Injected) {
        *lock(&self.state.injected) = Some(failure);
    }

    /// Hold back the response to the next `"METHOD /path"` request.
    pub fn hold_next(&self, route: &str) -> HeldRequest {
        let (served_tx, served_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *lock(&self.state.hold) = Some(Hold {
            route: route.to_string(),
            served: served_tx,
            release: release_rx,
        });
        HeldRequest {
            served: served_rx,
            release: release_tx,
        }
    }

    /// Change a product behind the client's back (another session's edit).
    pub fn rename_product_remotely(&self, id: &str, title: &str) {
        let mut store = lock(&self.state.store);
        if let Some(product) = store.products.iter_mut().find(|p| p.id.as_str() == id) {
            product.title = title.to_string();
        }
    }
}

fn api_routes() -> Router<Shared> {
    Router::new()
        .route(
            "/products",
            get(list_products).post(create_product).patch(update_product),
        )
        .route("/products/seller", get(seller_products))
        .route("/products/details/{id}", get(product_details))
        .route("/products/{id}", get(get_product).delete(delete_product))
        .route(
            "/product-categories",
            get(list_categories)
                .post(create_category)
                .patch(update_category),
        )
        .route(
            "/product-categories/{id}",
            get(get_category).delete(delete_category),
        )
        .route("/users", get(list_users))
        .route("/users/{id}/categories", post(assign_categories))
        .route("/recommendations/user/{id}", get(user_recommendations))
        .route("/recommendations/popular", get(popular_products))
}

// =============================================================================
// Middleware
// =============================================================================

async fn record_and_inject(
    State(state): State<Shared>,
    request: Request,
    next: Next,
) -> Response {
    let route = format!("{} {}", request.method(), request.uri().path());
    let hold = {
        let mut slot = lock(&state.hold);
        if slot.as_ref().is_some_and(|h| h.route == route) {
            slot.take()
        } else {
            None
        }
    };

    lock(&state.requests).push(Recorded {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        query: request.uri().query().map(str::to_string),
        authorization: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    });

    let injected = lock(&state.injected).take();
    let response = match injected {
        None => next.run(request).await,
        Some(Injected::Status { status, errors }) => {
            let code = StatusCode::from_u16(status).unwrap();
            (code, Json(failure_body(status, &errors))).into_response()
        }
        Some(Injected::Envelope { status, errors }) => {
            Json(failure_body(status, &errors)).into_response()
        }
        Some(Injected::RateLimited { retry_after }) => {
            let mut headers = HeaderMap::new();
            headers.insert(header::RETRY_AFTER, retry_after.into());
            (StatusCode::TOO_MANY_REQUESTS, headers, "slow down").into_response()
        }
        Some(Injected::Garbage) => (StatusCode::OK, "<html>maintenance</html>").into_response(),
    };

    if let Some(hold) = hold {
        let _ = hold.served.send(());
        let _ = hold.release.await;
    }
    response
}

fn failure_body(status: u16, errors: &[String]) -> serde_json::Value {
    json!({
        "status": status,
        "message": "Error",
        "errors": errors.iter().map(|m| json!({ "message": m })).collect::<Vec<_>>(),
        "payload": null,
    })
}

fn ok<T: serde::Serialize>(payload: T) -> Response {
    Json(DealResponse::ok(payload)).into_response()
}

fn not_found(what: &str) -> Response {
    let status = StatusCode::NOT_FOUND;
    (
        status,
        Json(failure_body(status.as_u16(), &[format!("{what} not found")])),
    )
        .into_response()
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(State(state): State<Shared>) -> Response {
    // Query parameters are recorded by the middleware; order is the stored order.
    ok(lock(&state.store).products.clone())
}

#[derive(Deserialize)]
struct SellerQuery {
    id: String,
}

async fn seller_products(
    State(state): State<Shared>,
    Query(query): Query<SellerQuery>,
) -> Response {
    let products: Vec<Product> = lock(&state.store)
        .products
        .iter()
        .filter(|p| p.seller_id.as_str() == query.id)
        .cloned()
        .collect();
    ok(products)
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let store = lock(&state.store);
    store
        .products
        .iter()
        .find(|p| p.id.as_str() == id)
        .map_or_else(|| not_found("Product"), |p| ok(p.clone()))
}

async fn product_details(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let store = lock(&state.store);
    let Some(product) = store.products.iter().find(|p| p.id.as_str() == id) else {
        return not_found("Product");
    };
    let Some(seller) = store.users.iter().find(|u| u.id == product.seller_id) else {
        return not_found("Seller");
    };
    ok(ProductDetails {
        id: product.id.clone(),
        title: product.title.clone(),
        description: product.description.clone(),
        price: product.price,
        stock: product.stock,
        image_url: product.image_url.clone(),
        categories: product.categories.clone(),
        created_at: None,
        seller: seller.clone(),
    })
}

async fn create_product(
    State(state): State<Shared>,
    Json(request): Json<CreateProductRequest>,
) -> Response {
    let mut store = lock(&state.store);
    let id = format!("p-new-{}", store.next_id);
    store.next_id += 1;

    let categories = store
        .categories
        .iter()
        .filter(|c| request.categories.contains(&c.category_name))
        .cloned()
        .collect();
    let product = Product {
        id: id.into(),
        title: request.title,
        description: request.description,
        price: request.price,
        stock: request.stock,
        image_url: request.image_url,
        categories,
        seller_id: request.seller_id,
    };
    store.products.push(product.clone());
    ok(product)
}

async fn update_product(
    State(state): State<Shared>,
    Json(request): Json<UpdateProductRequest>,
) -> Response {
    let mut store = lock(&state.store);
    let known: Vec<ProductCategory> = store.categories.clone();
    let Some(product) = store.products.iter_mut().find(|p| p.id == request.id) else {
        return not_found("Product");
    };

    if let Some(title) = request.title {
        product.title = title;
    }
    if let Some(description) = request.description {
        product.description = description;
    }
    if let Some(price) = request.price {
        product.price = price;
    }
    if let Some(stock) = request.stock {
        product.stock = stock;
    }
    if let Some(image_url) = request.image_url {
        product.image_url = image_url;
    }
    if let Some(names) = request.categories {
        product.categories = known
            .into_iter()
            .filter(|c| names.contains(&c.category_name))
            .collect();
    }
    ok(product.clone())
}

async fn delete_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut store = lock(&state.store);
    match store.products.iter().position(|p| p.id.as_str() == id) {
        Some(index) => ok(store.products.remove(index)),
        None => not_found("Product"),
    }
}

// =============================================================================
// Categories
// =============================================================================

async fn list_categories(State(state): State<Shared>) -> Response {
    ok(lock(&state.store).categories.clone())
}

async fn get_category(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let store = lock(&state.store);
    store
        .categories
        .iter()
        .find(|c| c.id.as_str() == id)
        .map_or_else(|| not_found("Product category"), |c| ok(c.clone()))
}

async fn create_category(
    State(state): State<Shared>,
    Json(request): Json<CreateProductCategoryRequest>,
) -> Response {
    let mut store = lock(&state.store);
    if request.category_name.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(failure_body(400, &["Category name is required".to_string()])),
        )
            .into_response();
    }
    let category = ProductCategory::new(format!("c-new-{}", store.next_id), request.category_name);
    store.next_id += 1;
    store.categories.push(category.clone());
    ok(category)
}

/// Renames cascade into embedded copies on products and users.
async fn update_category(
    State(state): State<Shared>,
    Json(request): Json<UpdateProductCategoryRequest>,
) -> Response {
    let mut guard = lock(&state.store);
    let store = &mut *guard;
    let Some(category) = store.categories.iter_mut().find(|c| c.id == request.id) else {
        return not_found("Product category");
    };
    category.category_name.clone_from(&request.category_name);
    let renamed = category.clone();

    let embedded = store
        .products
        .iter_mut()
        .flat_map(|p| p.categories.iter_mut())
        .chain(
            store
                .users
                .iter_mut()
                .flat_map(|u| u.product_categories.iter_mut()),
        );
    for copy in embedded.filter(|c| c.id == renamed.id) {
        copy.category_name.clone_from(&renamed.category_name);
    }
    ok(renamed)
}

async fn delete_category(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut store = lock(&state.store);
    let Some(index) = store.categories.iter().position(|c| c.id.as_str() == id) else {
        return not_found("Product category");
    };
    let removed = store.categories.remove(index);
    for product in &mut store.products {
        product.categories.retain(|c| c.id != removed.id);
    }
    for user in &mut store.users {
        user.product_categories.retain(|c| c.id != removed.id);
    }
    ok(removed)
}

// =============================================================================
// Users
// =============================================================================

async fn list_users(State(state): State<Shared>) -> Response {
    ok(lock(&state.store).users.clone())
}

async fn assign_categories(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(request): Json<AssignProductCategoryRequest>,
) -> Response {
    let mut store = lock(&state.store);
    let assigned: Vec<ProductCategory> = store
        .categories
        .iter()
        .filter(|c| request.product_category_ids.contains(&c.id))
        .cloned()
        .collect();
    let Some(user) = store.users.iter_mut().find(|u| u.id.as_str() == id) else {
        return not_found("User");
    };
    user.product_categories = assigned;
    ok(user.clone())
}

// =============================================================================
// Recommendations
// =============================================================================

#[derive(Deserialize)]
struct LimitQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

const fn default_limit() -> usize {
    10
}

/// Products in the user's assigned categories that someone else sells.
async fn user_recommendations(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let store = lock(&state.store);
    let Some(user) = store.users.iter().find(|u| u.id.as_str() == id) else {
        return not_found("User");
    };

    let mut preferred = BTreeMap::new();
    for category in &user.product_categories {
        let count = store
            .products
            .iter()
            .filter(|p| p.in_category(&category.id))
            .count();
        preferred.insert(
            category.category_name.clone(),
            u32::try_from(count).unwrap_or(u32::MAX),
        );
    }
    let products: Vec<Product> = store
        .products
        .iter()
        .filter(|p| p.seller_id != user.id)
        .filter(|p| user.product_categories.iter().any(|c| p.in_category(&c.id)))
        .take(query.limit)
        .cloned()
        .collect();

    ok(recommendation(products, preferred, RecommendationKind::Personalized))
}

/// The first `limit` products in stored order.
async fn popular_products(
    State(state): State<Shared>,
    Query(query): Query<LimitQuery>,
) -> Response {
    let products: Vec<Product> = lock(&state.store)
        .products
        .iter()
        .take(query.limit)
        .cloned()
        .collect();
    ok(recommendation(products, BTreeMap::new(), RecommendationKind::Popular))
}

fn recommendation(
    products: Vec<Product>,
    preferred_categories: BTreeMap<String, u32>,
    kind: RecommendationKind,
) -> Recommendation {
    Recommendation {
        total_recommendations: u32::try_from(products.len()).unwrap_or(u32::MAX),
        recommended_products: products,
        preferred_categories,
        kind,
    }
}
