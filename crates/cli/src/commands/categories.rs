//! Category listing command.

use deal_catalog::{CatalogClient, CategorySort, ListingPage};
use deal_core::ProductCategory;
use tracing::info;

use super::{CommandError, Output, report};

/// List product categories.
///
/// # Errors
///
/// Returns an error if the catalog request fails.
pub async fn list(
    client: &CatalogClient,
    search: Option<String>,
    sort: Option<CategorySort>,
    output: Output,
) -> Result<(), CommandError> {
    let mut page = ListingPage::<ProductCategory>::new();
    page.set_search(search.as_deref().unwrap_or_default());
    page.set_sort(sort);

    let ticket = page.begin_fetch();
    page.finish_fetch(ticket, client.get_product_categories().await);

    match page.visible() {
        Ok(categories) => {
            info!(count = categories.len(), "Listed categories");
            output.list(&categories, |c| format!("{:<38} {}", c.id.as_str(), c.category_name))
        }
        Err(failure) => {
            report(failure);
            Err(CommandError::Fetch(failure.clone()))
        }
    }
}
