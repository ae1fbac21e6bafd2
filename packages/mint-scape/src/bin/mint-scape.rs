//! Mint Scape service binary.

use mint_scape::key_store::KeyStore;
use mint_scape::middleware::API_KEY_ENV;
use mint_scape::wallet::LocalWallet;
use mint_scape::{create_router, AppState, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config: Config = config::Config::builder()
        .add_source(config::File::with_name("mint-scape").required(false))
        .add_source(config::Environment::with_prefix("MINT_SCAPE"))
        .build()
        .and_then(|c| c.try_deserialize())
        .unwrap_or_else(|e| {
            // Fall back only when no config exists; parsing errors fail hard.
            let err_str = format!("{e}");
            if err_str.contains("not found") || err_str.contains("missing field") {
                warn!(error = %e, "No config file found, using defaults");
                Config::default()
            } else {
                error!(error = %e, "FATAL: Config error, fix env vars or mint-scape.toml");
                std::process::exit(1);
            }
        });

    if std::env::args().nth(1).as_deref() == Some("init-wallet") {
        let store = KeyStore::from_env(PathBuf::from(&config.wallet_keys_path))?;
        let address = LocalWallet::init(&store)?;
        info!(
            %address,
            path = %store.path().display(),
            "Wallet created, fund this address before minting"
        );
        return Ok(());
    }

    info!("Starting Mint Scape");

    if let Err(e) = config.validate() {
        error!(error = %e, "FATAL: Invalid configuration");
        std::process::exit(1);
    }

    if std::env::var(API_KEY_ENV).map(|k| !k.is_empty()).unwrap_or(false) {
        info!("API key auth enabled for admin routes");
    } else {
        warn!("{API_KEY_ENV} not set, admin routes are unprotected (dev mode)");
    }

    info!(
        contract = ?config.contract_address,
        rpc = %config.rpc_url,
        default_collection = %config.default_collection,
        "Configuration loaded"
    );

    let bind_address = config.bind_address.clone();
    let state = Arc::new(AppState::new(config)?);

    let snapshot = state.orchestrator.mount().await;
    info!(state = ?snapshot.state, address = ?snapshot.address, "Mint flow mounted");

    let app = create_router(state);

    info!(address = %bind_address, "Listening");

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Mint Scape shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
