//! Aixel CLI - shop the demo storefront from the terminal.
//!
//! Each command performs one shopper action and sends the same tracking
//! events the web storefront would. Session, user, and cart state persist in
//! a JSON file between runs.
//!
//! # Usage
//!
//! ```bash
//! # Sign up, browse from a campaign link, and buy
//! aixel login -e jane@example.com -n "Jane Doe" --signup
//! aixel products --utm-source google --utm-medium cpc
//! aixel view 1
//! aixel add 1
//! aixel cart
//! aixel checkout
//! aixel pay
//!
//! # Point at a different backend and state file
//! aixel --api-base http://analytics.local:8000 --state /tmp/shopper.json session
//! ```
//!
//! # Environment Variables
//!
//! - `AIXEL_API_BASE` - Ingestion backend base URL
//! - `AIXEL_SITE_URL` - Storefront origin used for page URLs
//! - `AIXEL_STATE_PATH` - Client state file
//! - `AIXEL_USER_AGENT` - User agent reported for device detection
//! - `AIXEL_DEDUP_WINDOW_MS` - Duplicate suppression window
//! - `SENTRY_DSN` / `SENTRY_ENVIRONMENT` - Error tracking
//! - `RUST_LOG` - Log filter

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aixel_core::ProductId;
use aixel_tracker::TrackerConfig;
use aixel_tracker::context::{DEFAULT_UTM_OTHER, Utm};

use commands::{CliError, session, shop};

mod commands;

#[derive(Parser)]
#[command(name = "aixel")]
#[command(author, version, about = "Aixel Store shopper CLI")]
struct Cli {
    /// Client state file (overrides `AIXEL_STATE_PATH`)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Ingestion backend base URL (overrides `AIXEL_API_BASE`)
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in (or sign up) with an email address
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Display name (defaults to the email's local part)
        #[arg(short, long)]
        name: Option<String>,

        /// Submit the sign-up form instead of the login form
        #[arg(long)]
        signup: bool,
    },
    /// Log out and empty the cart
    Logout,
    /// View the dashboard
    Dashboard,
    /// Click a dashboard campaign banner
    AdClick {
        /// Campaign tag (e.g. `summer_sale`)
        campaign: String,
    },
    /// Browse the product catalog
    Products {
        /// Campaign source tag
        #[arg(long)]
        utm_source: Option<String>,

        /// Campaign medium tag
        #[arg(long, requires = "utm_source")]
        utm_medium: Option<String>,

        /// Campaign name tag
        #[arg(long, requires = "utm_source")]
        utm_campaign: Option<String>,
    },
    /// View a product's details
    View {
        /// Product id
        id: i32,
    },
    /// Add a product to the cart
    Add {
        /// Product id
        id: i32,
    },
    /// Remove a cart entry by position
    Remove {
        /// Zero-based position as listed by `cart`
        index: usize,
    },
    /// View the cart
    Cart,
    /// Start checkout
    Checkout,
    /// Submit payment and complete the purchase
    Pay,
    /// Show session, user and cart state
    Session,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &TrackerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn load_config(cli: &Cli) -> Result<TrackerConfig, CliError> {
    let mut config = TrackerConfig::from_env()?;
    if let Some(api_base) = &cli.api_base {
        config = config.with_api_base(api_base)?;
    }
    if let Some(state) = &cli.state {
        config.state_path.clone_from(state);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Sentry must be initialized before the tracing subscriber
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "aixel_tracker=info,aixel_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: &TrackerConfig) -> Result<(), CliError> {
    let mut storefront = shop::open(config)?;

    match command {
        Commands::Login {
            email,
            name,
            signup,
        } => shop::login(&storefront, &email, name.as_deref(), signup).await?,
        Commands::Logout => shop::logout(&mut storefront),
        Commands::Dashboard => shop::dashboard(&storefront).await,
        Commands::AdClick { campaign } => shop::ad_click(&storefront, &campaign).await,
        Commands::Products {
            utm_source,
            utm_medium,
            utm_campaign,
        } => {
            let utm = utm_source.map(|source| Utm {
                source,
                medium: utm_medium.unwrap_or_else(|| DEFAULT_UTM_OTHER.to_string()),
                campaign: utm_campaign.unwrap_or_else(|| DEFAULT_UTM_OTHER.to_string()),
            });
            shop::products(&storefront, utm).await;
        }
        Commands::View { id } => shop::view(&storefront, ProductId::new(id)).await?,
        Commands::Add { id } => shop::add(&mut storefront, ProductId::new(id)).await?,
        Commands::Remove { index } => shop::remove(&mut storefront, index)?,
        Commands::Cart => shop::cart(&storefront).await,
        Commands::Checkout => shop::checkout(&storefront).await?,
        Commands::Pay => shop::pay(&mut storefront).await?,
        Commands::Session => session::show(&storefront, config),
    }
    Ok(())
}
