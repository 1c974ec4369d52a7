use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use panel_addons::AddonHost;
use panel_addons_github::{AddonStoreClient, AddonStoreConfig};
use panel_addons_http::{AppState, router};
use panel_addons_pipeline::{GitCloneFetcher, Installer, NoopHost};
use panel_addons_store::AddonRegistry;

#[derive(Parser)]
#[command(name = "panel-addons")]
#[command(about = "Admin API for installing and managing panel addons")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8085")]
    listen: SocketAddr,

    /// Directory holding installed addons
    #[arg(long, default_value = "addons")]
    addons_root: PathBuf,

    /// Path to the addon registry database
    #[arg(long, default_value = "addons.db")]
    database: PathBuf,

    /// GitHub owner of the addon store repository
    #[arg(long, default_value = "panel-addons")]
    store_owner: String,

    /// Addon store repository name
    #[arg(long, default_value = "registry")]
    store_repo: String,

    /// Branch of the store repository to read
    #[arg(long, default_value = "main")]
    store_branch: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let registry = Arc::new(
        AddonRegistry::open(&cli.database)
            .with_context(|| format!("opening registry at {}", cli.database.display()))?,
    );

    let client = Arc::new(AddonStoreClient::new(AddonStoreConfig {
        owner: cli.store_owner,
        repo: cli.store_repo,
        branch: cli.store_branch,
        // Optional; without it the discussions route degrades to empty.
        token: std::env::var("GITHUB_TOKEN").ok(),
        api_base_url: None,
        raw_base_url: None,
    }));

    let host: Arc<dyn AddonHost> = Arc::new(NoopHost);

    let installer = Arc::new(Installer::new(
        &cli.addons_root,
        client.clone(),
        Arc::new(GitCloneFetcher),
        registry.clone(),
        host.clone(),
    ));

    let state = AppState {
        addons_root: cli.addons_root,
        registry,
        client,
        host,
        installer,
    };

    let listener = tokio::net::TcpListener::bind(cli.listen)
        .await
        .with_context(|| format!("binding {}", cli.listen))?;

    tracing::info!(listen = %cli.listen, "admin API listening");

    axum::serve(listener, router(state))
        .await
        .context("server error")?;

    Ok(())
}
