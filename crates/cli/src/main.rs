//! Deal CLI - browse the marketplace catalog from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Products in a category, cheapest first, hiding the viewer's own listings
//! deal products --category 6f1c... --sort price-asc --viewer 0b7e...
//!
//! # Let the catalog do the filtering and paging
//! deal products --search phone --sort title-desc --remote --page 0 --size 20
//!
//! # Sellers whose name, email or store address mentions "market"
//! deal users --tier seller --search market --sort created-desc
//!
//! # Categories A to Z
//! deal categories --sort name-asc
//!
//! # What a user might like next (popular products without --user)
//! deal recommend --user 0b7e... --limit 5
//!
//! # Replace a seller's assigned categories
//! deal assign 0b7e... 6f1c... 9a2d...
//! ```
//!
//! # Environment Variables
//!
//! - `DEAL_API_BASE_URL` - Catalog Data Source base URL (required)
//! - `DEAL_API_TOKEN` - Bearer token
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `RUST_LOG` - Log filter (default: `deal_cli=info,deal_catalog=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Args, Parser, Subcommand};
use deal_catalog::{
    CatalogClient, CatalogConfig, CategorySort, DEFAULT_RECOMMENDATION_LIMIT, ProductSort,
    UserSort,
};
use deal_core::{CategoryId, ProductId, RoleTier, UserId};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "deal")]
#[command(author, version, about = "Deal catalog CLI")]
struct Cli {
    /// Print records as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, filter and sort products
    Products(ProductsArgs),
    /// Show one product
    Product {
        /// Product id
        id: ProductId,
    },
    /// Search, filter and sort users (admin view)
    Users(UsersArgs),
    /// Search and sort product categories
    Categories(CategoriesArgs),
    /// Recommended products, falling back to popular ones
    Recommend {
        /// Personalize for this user
        #[arg(long)]
        user: Option<UserId>,
        /// Maximum number of products
        #[arg(long, default_value_t = DEFAULT_RECOMMENDATION_LIMIT)]
        limit: u32,
    },
    /// Replace the categories a seller may list under
    Assign {
        /// User id
        user_id: UserId,
        /// Category ids; none clears the assignment
        category_ids: Vec<CategoryId>,
    },
}

#[derive(Args)]
struct ProductsArgs {
    /// Case-insensitive title search
    #[arg(short, long)]
    search: Option<String>,

    /// Only products in this category id
    #[arg(short, long)]
    category: Option<CategoryId>,

    /// Order (`title-asc`, `title-desc`, `price-asc`, `price-desc`)
    #[arg(long)]
    sort: Option<ProductSort>,

    /// Hide products listed by this user
    #[arg(long)]
    viewer: Option<UserId>,

    /// Treat the viewer as an admin (admins see everything)
    #[arg(long, requires = "viewer")]
    admin: bool,

    /// Send the parameters to the catalog instead of filtering locally
    #[arg(long)]
    remote: bool,

    /// Zero-based page (remote only)
    #[arg(long, requires_all = ["remote", "size"])]
    page: Option<u32>,

    /// Page size (remote only)
    #[arg(long, requires_all = ["remote", "page"])]
    size: Option<u32>,
}

#[derive(Args)]
struct UsersArgs {
    /// Matches username, full name, email or store address
    #[arg(short, long)]
    search: Option<String>,

    /// Role tier (`admin`, `seller`, `buyer`, `seller_buyer`)
    #[arg(short, long)]
    tier: Option<RoleTier>,

    /// Order (`name-asc`, `name-desc`, `created-asc`, `created-desc`)
    #[arg(long)]
    sort: Option<UserSort>,
}

#[derive(Args)]
struct CategoriesArgs {
    /// Case-insensitive name search
    #[arg(short, long)]
    search: Option<String>,

    /// Order (`name-asc`, `name-desc`)
    #[arg(long)]
    sort: Option<CategorySort>,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN").ok().filter(|d| !d.is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Errors become Sentry events, info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deal_cli=info,deal_catalog=info".into());

    // Logs go to stderr so `--json` output stays machine-readable.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = CatalogConfig::from_env()?;
    tracing::debug!(?config, "Loaded configuration");
    let client = CatalogClient::new(&config)?;
    let output = commands::Output::new(cli.json);

    match cli.command {
        Commands::Products(args) => commands::products::list(&client, args.into(), output).await?,
        Commands::Product { id } => commands::products::show(&client, &id, output).await?,
        Commands::Users(args) => {
            commands::users::list(&client, args.search, args.tier, args.sort, output).await?;
        }
        Commands::Categories(args) => {
            commands::categories::list(&client, args.search, args.sort, output).await?;
        }
        Commands::Recommend { user, limit } => {
            commands::products::recommend(&client, user.as_ref(), limit, output).await?;
        }
        Commands::Assign {
            user_id,
            category_ids,
        } => commands::users::assign(&client, &user_id, &category_ids, output).await?,
    }
    Ok(())
}

impl From<ProductsArgs> for commands::products::ProductQuery {
    fn from(args: ProductsArgs) -> Self {
        Self {
            search: args.search,
            category: args.category,
            sort: args.sort,
            viewer: args.viewer,
            viewer_is_admin: args.admin,
            remote: args.remote,
            page: args.page.zip(args.size),
        }
    }
}
