//! Product listing commands.

use deal_catalog::{CatalogClient, Evaluation, ListParams, PageRequest, ProductSort};
use deal_core::{CategoryId, Product, ProductId, UserId, UserRole, Viewer};
use tracing::info;

use super::{CommandError, Output};

/// Parsed `deal products` arguments.
pub struct ProductQuery {
    pub search: Option<String>,
    pub category: Option<CategoryId>,
    pub sort: Option<ProductSort>,
    pub viewer: Option<UserId>,
    pub viewer_is_admin: bool,
    pub remote: bool,
    /// `(page, size)`.
    pub page: Option<(u32, u32)>,
}

impl ProductQuery {
    fn params(&self) -> ListParams<Product> {
        let mut params = ListParams::new().with_search(self.search.as_deref().unwrap_or_default());
        params.criterion.clone_from(&self.category);
        params.sort = self.sort;
        params.viewer = self.viewer.as_ref().map(|id| {
            let role = if self.viewer_is_admin {
                UserRole::Admin
            } else {
                UserRole::User
            };
            Viewer::new(id.clone(), role)
        });
        params
    }

    fn evaluation(&self) -> Evaluation {
        if self.remote {
            Evaluation::Remote {
                page: self.page.map(|(page, size)| PageRequest::new(page, size)),
            }
        } else {
            Evaluation::Local
        }
    }
}

fn row(product: &Product) -> String {
    let categories = product
        .categories
        .iter()
        .map(|c| c.category_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{:<38} {:<32} {:>10} {:>5}  {}",
        product.id.as_str(),
        product.title,
        product.price.to_string(),
        product.stock,
        categories
    )
}

/// List products for the given query.
///
/// # Errors
///
/// Returns an error if the catalog request fails.
pub async fn list(
    client: &CatalogClient,
    query: ProductQuery,
    output: Output,
) -> Result<(), CommandError> {
    let params = query.params();
    let products = client.list_products(&params, query.evaluation()).await?;
    info!(count = products.len(), "Listed products");

    let records: Vec<&Product> = products.iter().collect();
    output.list(&records, row)
}

/// Show one product.
///
/// # Errors
///
/// Returns `NotFound` if the product does not exist.
pub async fn show(
    client: &CatalogClient,
    id: &ProductId,
    output: Output,
) -> Result<(), CommandError> {
    let product = client.get_product(id).await?;
    output.one(&product, |p| {
        format!(
            "{}\n  id:          {}\n  price:       {}\n  stock:       {}\n  \
             seller:      {}\n  categories:  {}\n\n{}",
            p.title,
            p.id,
            p.price,
            p.stock,
            p.seller_id,
            p.categories
                .iter()
                .map(|c| c.category_name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            p.description
        )
    })
}

/// Recommendations for a user, or popular products when `user` is `None`.
///
/// # Errors
///
/// Returns `NotFound` if the user does not exist.
pub async fn recommend(
    client: &CatalogClient,
    user: Option<&UserId>,
    limit: u32,
    output: Output,
) -> Result<(), CommandError> {
    let recommendation = client.recommend(user, limit).await?;
    info!(
        kind = ?recommendation.kind,
        count = recommendation.recommended_products.len(),
        "Fetched recommendations"
    );

    if output.is_json() {
        return output.one(recommendation.as_ref(), |_| String::new());
    }
    if let Some(category) = recommendation.top_category() {
        info!(category, "Top category");
    }
    let records: Vec<&Product> = recommendation.recommended_products.iter().collect();
    output.list(&records, row)
}
