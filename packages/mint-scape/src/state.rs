//! Application state shared across handlers.

use crate::config::Config;
use crate::contract::AlloyBinder;
use crate::image::{HttpImageSource, ImageSize};
use crate::key_store::KeyStore;
use crate::orchestrator::{FlowSettings, Orchestrator};
use crate::pinning::PinataClient;
use crate::wallet::LocalWallet;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

pub struct AppState {
    pub config: Config,
    pub orchestrator: Orchestrator,
    pub start_time: Instant,
    pub request_count: AtomicU64,
}

impl AppState {
    /// Wire the production collaborators from configuration.
    pub fn new(config: Config) -> Result<Self, crate::Error> {
        let store = KeyStore::from_env(PathBuf::from(&config.wallet_keys_path))?;
        info!(path = %store.path().display(), present = store.exists(), "Wallet key store");

        let binder = AlloyBinder::new(
            &config.rpc_url,
            config.contract_address()?,
            config.gas_limit,
            config.admin_gas_limit,
        )?;
        let images = HttpImageSource::new(
            &config.stability_api_url,
            &config.stability_engine,
            config.stability_api_key.clone(),
        )?;
        let pinner = PinataClient::new(
            &config.pinata_api_url,
            config.pinata_api_key.clone(),
            config.pinata_secret_key.clone(),
        )?;
        let settings = FlowSettings {
            default_collection: config.default_collection.clone(),
            collection_symbol: config.collection_symbol.clone(),
            collection_price: config.collection_price()?,
            image_size: ImageSize::square(config.image_size),
            gateway_url: config.gateway_url.clone(),
        };

        let orchestrator = Orchestrator::new(
            Arc::new(LocalWallet::new(store)),
            Arc::new(binder),
            Arc::new(images),
            Arc::new(pinner),
            settings,
        );
        Ok(Self::with_orchestrator(config, orchestrator))
    }

    pub fn with_orchestrator(config: Config, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }
}
