//! User listing and category assignment (admin console).

use deal_catalog::{CatalogClient, ListingPage, UserSort};
use deal_core::{CategoryId, MainUser, RoleTier, UserId};
use tracing::info;

use super::{CommandError, Output, report};

fn row(user: &MainUser) -> String {
    format!(
        "{:<38} {:<20} {:<28} {:<6} {:<30} {}",
        user.id.as_str(),
        user.display_name(),
        user.email,
        if user.is_seller() { "seller" } else { "" },
        user.store_address.as_deref().unwrap_or("-"),
        user.created_at.format("%Y-%m-%d")
    )
}

/// List users filtered by search text and role tier.
///
/// # Errors
///
/// Returns an error if the catalog request fails.
pub async fn list(
    client: &CatalogClient,
    search: Option<String>,
    tier: Option<RoleTier>,
    sort: Option<UserSort>,
    output: Output,
) -> Result<(), CommandError> {
    let mut page = ListingPage::<MainUser>::new();
    page.set_search(search.as_deref().unwrap_or_default());
    page.set_criterion(tier);
    page.set_sort(sort);

    let ticket = page.begin_fetch();
    page.finish_fetch(ticket, client.get_users().await);

    match page.visible() {
        Ok(users) => {
            info!(count = users.len(), "Listed users");
            output.list(&users, row)
        }
        Err(failure) => {
            report(failure);
            Err(CommandError::Fetch(failure.clone()))
        }
    }
}

/// Replace a user's assigned categories and print the updated user.
///
/// # Errors
///
/// Returns an error if the user does not exist or the request fails.
pub async fn assign(
    client: &CatalogClient,
    user_id: &UserId,
    category_ids: &[CategoryId],
    output: Output,
) -> Result<(), CommandError> {
    let user = client.assign_user_categories(user_id, category_ids).await?;
    info!(user = %user.id, count = user.product_categories.len(), "Assigned categories");

    output.one(&user, |u| {
        let names = u
            .product_categories
            .iter()
            .map(|c| c.category_name.as_str())
            .collect::<Vec<_>>();
        format!(
            "{} now lists under: {}",
            u.display_name(),
            if names.is_empty() {
                "(none)".to_string()
            } else {
                names.join(", ")
            }
        )
    })
}
