//! HTTP client for the Catalog Data Source.
//!
//! Every endpoint answers with a [`DealResponse`] envelope. List queries are
//! cached per resource tag and stay cached until a mutation through this
//! client invalidates the tag; nothing is ever patched into a cached
//! snapshot.

mod cache;

use std::sync::Arc;

use deal_core::{
    AssignProductCategoryRequest, CategoryId, CreateProductCategoryRequest, CreateProductRequest,
    DealError, DealResponse, MainUser, Product, ProductCategory, ProductDetails, ProductId,
    Recommendation, UpdateProductCategoryRequest, UpdateProductRequest, UserId,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::listing::Snapshot;
use crate::pipeline::{ListParams, Listable, compute_visible_list, into_payload};
use crate::remote::{Evaluation, query_pairs};

pub use cache::{CacheKey, CacheTag};
use cache::{CacheValue, TaggedCache};

const PRODUCTS: &str = "products";
const PRODUCT_CATEGORIES: &str = "product-categories";
const USERS: &str = "users";
const RECOMMENDATIONS: &str = "recommendations";

/// Number of recommendations asked for when the caller has no preference.
pub const DEFAULT_RECOMMENDATION_LIMIT: u32 = 10;

// =============================================================================
// CatalogClient
// =============================================================================

/// Client for the Catalog Data Source.
///
/// Cheap to clone; clones share the connection pool and the cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: Url,
    api_token: Option<SecretString>,
    cache: TaggedCache,
}

impl CatalogClient {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry path segments or the
    /// HTTP client fails to build.
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        if config.base_url.cannot_be_a_base() {
            return Err(CatalogError::InvalidBaseUrl(config.base_url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(CatalogClientInner {
                client,
                base_url: config.base_url.clone(),
                api_token: config.api_token.clone(),
                cache: TaggedCache::new(config.cache_capacity, config.cache_ttl),
            }),
        })
    }

    /// Resolve a resource path below the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogError::InvalidBaseUrl(self.inner.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match &self.inner.api_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and unwrap the response envelope.
    ///
    /// `resource` names what was asked for, for `NotFound` messages.
    async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        resource: &str,
    ) -> Result<DealResponse<T>, CatalogError> {
        let response = builder.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(CatalogError::RateLimited(retry_after));
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Catalog returned non-success status"
            );
            return Err(failure_from_body(status.as_u16(), &response_text, resource));
        }

        let envelope: DealResponse<T> = match serde_json::from_str(&response_text) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse catalog response"
                );
                return Err(CatalogError::Parse(e));
            }
        };

        // Some endpoints answer 200 with a failure envelope.
        if envelope.status >= 400 {
            debug!(status = envelope.status, errors = ?envelope.errors, "Failure envelope");
            return Err(failure(
                envelope.status,
                envelope.message,
                envelope.errors.unwrap_or_default(),
                resource,
            ));
        }

        Ok(envelope)
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        resource: &str,
    ) -> Result<Vec<T>, CatalogError> {
        let envelope = self.send::<Vec<T>>(builder, resource).await?;
        Ok(into_payload(Some(envelope)))
    }

    async fn fetch_one<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        resource: &str,
    ) -> Result<T, CatalogError> {
        self.send::<T>(builder, resource)
            .await?
            .payload
            .ok_or_else(|| CatalogError::MissingPayload(resource.to_string()))
    }

    async fn mutate<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&B>,
        resource: &str,
    ) -> Result<T, CatalogError> {
        let url = self.endpoint(segments)?;
        let builder = self.request(method, url);
        let builder = match body {
            Some(body) => builder.json(body),
            None => builder,
        };
        self.fetch_one(builder, resource).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// The full product snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails or the payload is malformed.
    #[instrument(skip(self))]
    pub async fn get_products(&self) -> Result<Snapshot<Product>, CatalogError> {
        let cached = self.inner.cache.get(&CacheKey::Products).await;
        if let Some(CacheValue::Products(products)) = cached {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let generation = self.inner.cache.generation(CacheTag::Products);
        let url = self.endpoint(&[PRODUCTS])?;
        let products: Snapshot<Product> = self
            .fetch_list::<Product>(self.request(Method::GET, url), PRODUCTS)
            .await?
            .into();

        debug!(count = products.len(), "Fetched products");
        self.inner
            .cache
            .insert(
                CacheKey::Products,
                CacheValue::Products(Arc::clone(&products)),
                generation,
            )
            .await;

        Ok(products)
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the catalog has no such product.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let generation = self.inner.cache.generation(CacheTag::Products);
        let url = self.endpoint(&[PRODUCTS, id.as_str()])?;
        let product: Product = self
            .fetch_one(self.request(Method::GET, url), &format!("product {id}"))
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())), generation)
            .await;

        Ok(product)
    }

    /// Products listed by one seller.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(seller = %seller_id))]
    pub async fn get_seller_products(
        &self,
        seller_id: &UserId,
    ) -> Result<Snapshot<Product>, CatalogError> {
        let key = CacheKey::SellerProducts(seller_id.clone());
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for seller products");
            return Ok(products);
        }

        let generation = self.inner.cache.generation(CacheTag::Products);
        let mut url = self.endpoint(&[PRODUCTS, "seller"])?;
        url.query_pairs_mut().append_pair("id", seller_id.as_str());
        let products: Snapshot<Product> = self
            .fetch_list::<Product>(self.request(Method::GET, url), "seller products")
            .await?
            .into();

        self.inner
            .cache
            .insert(key, CacheValue::Products(Arc::clone(&products)), generation)
            .await;

        Ok(products)
    }

    /// A product with its seller's account embedded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the catalog has no such product.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product_details(
        &self,
        id: &ProductId,
    ) -> Result<ProductDetails, CatalogError> {
        let key = CacheKey::ProductDetails(id.clone());
        if let Some(CacheValue::ProductDetails(details)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product details");
            return Ok(*details);
        }

        let generation = self.inner.cache.generation(CacheTag::Products);
        let url = self.endpoint(&[PRODUCTS, "details", id.as_str()])?;
        let details: ProductDetails = self
            .fetch_one(self.request(Method::GET, url), &format!("product {id}"))
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::ProductDetails(Box::new(details.clone())), generation)
            .await;

        Ok(details)
    }

    /// The products a view should show for `params`.
    ///
    /// With [`Evaluation::Local`] the cached snapshot is filtered and sorted
    /// in process. With [`Evaluation::Remote`] the parameters are sent to the
    /// catalog and its order is kept; those responses are not cached. The
    /// viewer's own products are excluded either way.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, params), fields(search = %params.search.as_str()))]
    pub async fn list_products(
        &self,
        params: &ListParams<Product>,
        evaluation: Evaluation,
    ) -> Result<Vec<Product>, CatalogError> {
        match evaluation {
            Evaluation::Local => {
                let snapshot = self.get_products().await?;
                Ok(compute_visible_list(&snapshot, params)
                    .into_iter()
                    .cloned()
                    .collect())
            }
            Evaluation::Remote { page } => {
                let mut url = self.endpoint(&[PRODUCTS])?;
                {
                    let mut query = url.query_pairs_mut();
                    for (name, value) in query_pairs(params, page) {
                        query.append_pair(name, &value);
                    }
                }
                let mut products: Vec<Product> = self
                    .fetch_list(self.request(Method::GET, url), PRODUCTS)
                    .await?;
                if let Some(viewer) = &params.viewer {
                    products.retain(|p| !p.hidden_from(viewer));
                }
                Ok(products)
            }
        }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns the catalog's validation errors as `Server`.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create_product(
        &self,
        request: &CreateProductRequest,
    ) -> Result<Product, CatalogError> {
        let product = self
            .mutate(Method::POST, &[PRODUCTS], Some(request), "product")
            .await?;
        self.inner.cache.invalidate(CacheTag::Products).await;
        Ok(product)
    }

    /// Update a product. Fields left `None` are unchanged.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn update_product(
        &self,
        request: &UpdateProductRequest,
    ) -> Result<Product, CatalogError> {
        let product = self
            .mutate(
                Method::PATCH,
                &[PRODUCTS],
                Some(request),
                &format!("product {}", request.id),
            )
            .await?;
        self.inner.cache.invalidate(CacheTag::Products).await;
        Ok(product)
    }

    /// Delete a product, returning the removed record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the product does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let product = self
            .mutate::<(), _>(
                Method::DELETE,
                &[PRODUCTS, id.as_str()],
                None,
                &format!("product {id}"),
            )
            .await?;
        self.inner.cache.invalidate(CacheTag::Products).await;
        Ok(product)
    }

    // =========================================================================
    // Recommendation Methods
    // =========================================================================

    /// Recommendations for one user, possibly empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(user = %user_id))]
    pub async fn get_user_recommendations(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Arc<Recommendation>, CatalogError> {
        self.fetch_recommendation(
            CacheKey::UserRecommendations {
                user_id: user_id.clone(),
                limit,
            },
            &[RECOMMENDATIONS, "user", user_id.as_str()],
            limit,
        )
        .await
    }

    /// Marketplace-wide popular products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_popular_products(
        &self,
        limit: u32,
    ) -> Result<Arc<Recommendation>, CatalogError> {
        self.fetch_recommendation(
            CacheKey::PopularProducts { limit },
            &[RECOMMENDATIONS, "popular"],
            limit,
        )
        .await
    }

    /// What a recommendation widget shows: the user's personalized list, or
    /// popular products when there is no user or the personalized list is
    /// empty.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error.
    #[instrument(skip(self), fields(user = ?user_id.map(UserId::as_str)))]
    pub async fn recommend(
        &self,
        user_id: Option<&UserId>,
        limit: u32,
    ) -> Result<Arc<Recommendation>, CatalogError> {
        if let Some(user_id) = user_id {
            let personal = self.get_user_recommendations(user_id, limit).await?;
            if !personal.is_empty() {
                return Ok(personal);
            }
            debug!("No personalized recommendations, falling back to popular");
        }
        self.get_popular_products(limit).await
    }

    async fn fetch_recommendation(
        &self,
        key: CacheKey,
        segments: &[&str],
        limit: u32,
    ) -> Result<Arc<Recommendation>, CatalogError> {
        if let Some(CacheValue::Recommendation(recommendation)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for recommendations");
            return Ok(recommendation);
        }

        let generation = self.inner.cache.generation(CacheTag::Products);
        let mut url = self.endpoint(segments)?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let recommendation: Arc<Recommendation> = Arc::new(
            self.fetch_one(self.request(Method::GET, url), RECOMMENDATIONS)
                .await?,
        );

        debug!(
            count = recommendation.recommended_products.len(),
            kind = ?recommendation.kind,
            "Fetched recommendations"
        );
        self.inner
            .cache
            .insert(
                key,
                CacheValue::Recommendation(Arc::clone(&recommendation)),
                generation,
            )
            .await;

        Ok(recommendation)
    }

    // =========================================================================
    // Category Methods
    // =========================================================================

    /// All product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_product_categories(
        &self,
    ) -> Result<Snapshot<ProductCategory>, CatalogError> {
        if let Some(CacheValue::ProductCategories(categories)) =
            self.inner.cache.get(&CacheKey::ProductCategories).await
        {
            debug!("Cache hit for product categories");
            return Ok(categories);
        }

        let generation = self.inner.cache.generation(CacheTag::ProductCategories);
        let url = self.endpoint(&[PRODUCT_CATEGORIES])?;
        let categories: Snapshot<ProductCategory> = self
            .fetch_list::<ProductCategory>(self.request(Method::GET, url), PRODUCT_CATEGORIES)
            .await?
            .into();

        self.inner
            .cache
            .insert(
                CacheKey::ProductCategories,
                CacheValue::ProductCategories(Arc::clone(&categories)),
                generation,
            )
            .await;

        Ok(categories)
    }

    /// A single product category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the catalog has no such category.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_product_category(
        &self,
        id: &CategoryId,
    ) -> Result<ProductCategory, CatalogError> {
        let key = CacheKey::ProductCategory(id.clone());
        if let Some(CacheValue::ProductCategory(category)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product category");
            return Ok(category);
        }

        let generation = self.inner.cache.generation(CacheTag::ProductCategories);
        let url = self.endpoint(&[PRODUCT_CATEGORIES, id.as_str()])?;
        let category: ProductCategory = self
            .fetch_one(self.request(Method::GET, url), &format!("category {id}"))
            .await?;

        self.inner
            .cache
            .insert(key, CacheValue::ProductCategory(category.clone()), generation)
            .await;

        Ok(category)
    }

    /// Create a product category.
    ///
    /// # Errors
    ///
    /// Returns the catalog's validation errors as `Server`.
    #[instrument(skip(self, request), fields(name = %request.category_name))]
    pub async fn create_product_category(
        &self,
        request: &CreateProductCategoryRequest,
    ) -> Result<ProductCategory, CatalogError> {
        let category = self
            .mutate(Method::POST, &[PRODUCT_CATEGORIES], Some(request), "category")
            .await?;
        self.invalidate_categories().await;
        Ok(category)
    }

    /// Rename a product category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn update_product_category(
        &self,
        request: &UpdateProductCategoryRequest,
    ) -> Result<ProductCategory, CatalogError> {
        let category = self
            .mutate(
                Method::PATCH,
                &[PRODUCT_CATEGORIES],
                Some(request),
                &format!("category {}", request.id),
            )
            .await?;
        self.invalidate_categories().await;
        Ok(category)
    }

    /// Delete a product category, returning the removed record.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the category does not exist.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn delete_product_category(
        &self,
        id: &CategoryId,
    ) -> Result<ProductCategory, CatalogError> {
        let category = self
            .mutate::<(), _>(
                Method::DELETE,
                &[PRODUCT_CATEGORIES, id.as_str()],
                None,
                &format!("category {id}"),
            )
            .await?;
        self.invalidate_categories().await;
        Ok(category)
    }

    /// Products and users embed category records, so they go stale too.
    async fn invalidate_categories(&self) {
        self.inner.cache.invalidate(CacheTag::ProductCategories).await;
        self.inner.cache.invalidate(CacheTag::Products).await;
        self.inner.cache.invalidate(CacheTag::Users).await;
    }

    // =========================================================================
    // User Methods
    // =========================================================================

    /// All users (admin view).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_users(&self) -> Result<Snapshot<MainUser>, CatalogError> {
        if let Some(CacheValue::Users(users)) = self.inner.cache.get(&CacheKey::Users).await {
            debug!("Cache hit for users");
            return Ok(users);
        }

        let generation = self.inner.cache.generation(CacheTag::Users);
        let url = self.endpoint(&[USERS])?;
        let users: Snapshot<MainUser> = self
            .fetch_list::<MainUser>(self.request(Method::GET, url), USERS)
            .await?
            .into();

        self.inner
            .cache
            .insert(
                CacheKey::Users,
                CacheValue::Users(Arc::clone(&users)),
                generation,
            )
            .await;

        Ok(users)
    }

    /// Replace the categories a seller may list under.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user does not exist.
    #[instrument(skip(self, category_ids), fields(user = %user_id, count = category_ids.len()))]
    pub async fn assign_user_categories(
        &self,
        user_id: &UserId,
        category_ids: &[CategoryId],
    ) -> Result<MainUser, CatalogError> {
        let request = AssignProductCategoryRequest {
            user_id: user_id.clone(),
            product_category_ids: category_ids.to_vec(),
        };
        let user = self
            .mutate(
                Method::POST,
                &[USERS, user_id.as_str(), "categories"],
                Some(&request),
                &format!("user {user_id}"),
            )
            .await?;
        // Seller details and personalized recommendations embed assignments.
        self.inner.cache.invalidate(CacheTag::Users).await;
        self.inner.cache.invalidate(CacheTag::Products).await;
        Ok(user)
    }

    /// Drop cached data for `tag` so the next query refetches.
    pub async fn invalidate(&self, tag: CacheTag) {
        self.inner.cache.invalidate(tag).await;
    }
}

/// Build the error for a non-success HTTP response.
fn failure_from_body(status: u16, body: &str, resource: &str) -> CatalogError {
    match serde_json::from_str::<DealResponse<serde_json::Value>>(body) {
        Ok(envelope) => failure(
            status,
            envelope.message,
            envelope.errors.unwrap_or_default(),
            resource,
        ),
        Err(_) => failure(
            status,
            body.chars().take(200).collect(),
            Vec::new(),
            resource,
        ),
    }
}

fn failure(status: u16, message: String, errors: Vec<DealError>, resource: &str) -> CatalogError {
    if status == 404 {
        return CatalogError::NotFound(resource.to_string());
    }
    CatalogError::Server {
        status,
        message,
        errors,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> CatalogClient {
        CatalogClient::new(&CatalogConfig::new(Url::parse(base).unwrap())).unwrap()
    }

    #[test]
    fn test_endpoint_appends_segments() {
        let client = client("http://localhost:8080/api/");
        let url = client.endpoint(&[PRODUCTS, "p 1"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/products/p%201");
    }

    #[test]
    fn test_endpoint_without_trailing_slash() {
        let client = client("http://localhost:8080/api");
        let url = client.endpoint(&[USERS, "u-1", "categories"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/users/u-1/categories");
    }

    #[test]
    fn test_error_envelope_is_decoded() {
        let body = concat!(
            r#"{"status":400,"message":"Bad Request","#,
            r#""errors":[{"message":"Title is required"}]}"#
        );
        let err = failure_from_body(400, body, "product");
        assert_eq!(err.to_string(), "Catalog error (400): Title is required");
    }

    #[test]
    fn test_plain_text_error_body() {
        let err = failure_from_body(502, "Bad Gateway", PRODUCTS);
        assert!(matches!(
            err,
            CatalogError::Server { status: 502, ref message, .. } if message == "Bad Gateway"
        ));
    }

    #[test]
    fn test_not_found_names_resource() {
        let err = failure_from_body(404, "", "product p-9");
        assert_eq!(err.to_string(), "Not found: product p-9");
    }
}
