//! `bills-sync` refreshes the local bill catalog from one provider.
//!
//! ```text
//! bills-sync --driver flutterwave --scope data
//! bills-sync --driver interswitch
//! ```
//!
//! Progress goes to stdout, structured logs to stderr.

use anyhow::Context;
use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

use bill_gateway::catalog::{PgStore, SyncProgress, SyncScope};
use bill_gateway::configuration::get_configuration;
use bill_gateway::connectors::auth::{InMemoryTokenCache, RedisTokenCache, TokenCache};
use bill_gateway::gateway::BillGateway;
use bill_gateway::telemetry::{get_subscriber, init_subscriber};

#[derive(Parser, Debug)]
#[command(
    name = "bills-sync",
    version,
    about = "Sync bill categories, billers and products from a provider"
)]
struct Cli {
    /// Provider to sync: interswitch, flutterwave, paystack_bills (default: configured provider)
    #[arg(long, value_name = "NAME", env = "BILLING_PROVIDER")]
    driver: Option<String>,
    /// Catalog scope: all, data, cable, electricity
    #[arg(long, value_name = "SCOPE", default_value = "all")]
    scope: SyncScope,
}

struct ConsoleProgress;

impl SyncProgress for ConsoleProgress {
    fn line(&self, message: &str) {
        println!("{}", message);
    }

    fn warn(&self, message: &str) {
        eprintln!("warning: {}", message);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = get_subscriber("bills-sync".into(), "info".into(), std::io::stderr);
    init_subscriber(subscriber);

    let settings = get_configuration().context("Failed to read configuration")?;

    tracing::info!(
        db_host = %settings.database.host,
        db_port = settings.database.port,
        db_name = %settings.database.database_name,
        "Connecting to PostgreSQL"
    );
    let pg_pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(settings.database.connect_options())
        .await
        .context("Failed to connect to database")?;

    let store = Arc::new(PgStore::new(pg_pool));
    store.migrate().await.context("Failed to run migrations")?;

    let token_cache: Arc<dyn TokenCache> = match settings.redis_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Arc::new(RedisTokenCache::new(url).await?),
        _ => Arc::new(InMemoryTokenCache::new()),
    };

    let gateway = BillGateway::from_config(
        settings.default_provider.clone(),
        &settings.providers,
        token_cache,
        store,
    )?;
    let provider = gateway.resolve_provider(cli.driver.as_deref())?;

    println!("Syncing {} catalog [{}]", provider.name(), cli.scope);
    let report = provider
        .sync_catalog_scoped(cli.scope, &ConsoleProgress)
        .await
        .with_context(|| format!("{} catalog sync failed", provider.name()))?;

    println!(
        "Sync complete: categories={}, billers={}, products={}",
        report.categories, report.billers, report.products
    );
    if report.degraded {
        println!("Scope [{}] was served by a full sync", cli.scope);
    }

    Ok(())
}
