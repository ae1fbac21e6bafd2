//! Service configuration.

use alloy::primitives::utils::parse_ether;
use alloy::primitives::{Address, U256};
use serde::Deserialize;

/// Configuration for the mint service.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "defaults::rpc_url")]
    pub rpc_url: String,

    /// Deployed NFT contract. Required; startup aborts without it.
    #[serde(default)]
    pub contract_address: Option<String>,

    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    #[serde(default = "defaults::wallet_keys_path")]
    pub wallet_keys_path: String,

    #[serde(default = "defaults::stability_api_url")]
    pub stability_api_url: String,

    #[serde(default = "defaults::stability_engine")]
    pub stability_engine: String,

    #[serde(default)]
    pub stability_api_key: Option<String>,

    #[serde(default = "defaults::pinata_api_url")]
    pub pinata_api_url: String,

    #[serde(default)]
    pub pinata_api_key: Option<String>,

    #[serde(default)]
    pub pinata_secret_key: Option<String>,

    #[serde(default = "defaults::gateway_url")]
    pub gateway_url: String,

    #[serde(default = "defaults::default_collection")]
    pub default_collection: String,

    /// Symbol used when a missing collection is created on the fly.
    #[serde(default = "defaults::collection_symbol")]
    pub collection_symbol: String,

    /// Mint price (ether) for collections created on the fly.
    #[serde(default = "defaults::collection_mint_price")]
    pub collection_mint_price: String,

    #[serde(default = "defaults::gas_limit")]
    pub gas_limit: u64,

    #[serde(default = "defaults::admin_gas_limit")]
    pub admin_gas_limit: u64,

    /// Square edge length (pixels) of generated images.
    #[serde(default = "defaults::image_size")]
    pub image_size: u32,

    /// Comma-separated browser origins allowed by CORS.
    #[serde(default = "defaults::cors_origins")]
    pub cors_origins: String,

    #[serde(default = "defaults::max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: defaults::rpc_url(),
            contract_address: None,
            bind_address: defaults::bind_address(),
            wallet_keys_path: defaults::wallet_keys_path(),
            stability_api_url: defaults::stability_api_url(),
            stability_engine: defaults::stability_engine(),
            stability_api_key: None,
            pinata_api_url: defaults::pinata_api_url(),
            pinata_api_key: None,
            pinata_secret_key: None,
            gateway_url: defaults::gateway_url(),
            default_collection: defaults::default_collection(),
            collection_symbol: defaults::collection_symbol(),
            collection_mint_price: defaults::collection_mint_price(),
            gas_limit: defaults::gas_limit(),
            admin_gas_limit: defaults::admin_gas_limit(),
            image_size: defaults::image_size(),
            cors_origins: defaults::cors_origins(),
            max_upload_bytes: defaults::max_upload_bytes(),
        }
    }
}

impl Config {
    /// Fails when the contract address is missing or malformed.
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.contract_address()?;
        self.collection_price()?;
        if self.gas_limit == 0 || self.admin_gas_limit == 0 {
            return Err(crate::Error::Config("gas limits must be non-zero".into()));
        }
        Ok(())
    }

    pub fn contract_address(&self) -> Result<Address, crate::Error> {
        let raw = self
            .contract_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                crate::Error::Config("MINT_SCAPE_CONTRACT_ADDRESS is not set".into())
            })?;
        raw.parse()
            .map_err(|e| crate::Error::Config(format!("Invalid contract address {raw}: {e}")))
    }

    pub fn cors_origins(&self) -> Vec<&str> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .collect()
    }

    pub fn collection_price(&self) -> Result<U256, crate::Error> {
        parse_ether(self.collection_mint_price.trim()).map_err(|e| {
            crate::Error::Config(format!(
                "Invalid collection_mint_price {}: {e}",
                self.collection_mint_price
            ))
        })
    }
}

mod defaults {
    pub fn rpc_url() -> String {
        "http://127.0.0.1:8545".into()
    }

    pub fn bind_address() -> String {
        "127.0.0.1:3050".into()
    }

    pub fn wallet_keys_path() -> String {
        "./keys/wallet.json".into()
    }

    pub fn stability_api_url() -> String {
        "https://api.stability.ai".into()
    }

    pub fn stability_engine() -> String {
        "stable-diffusion-v1-6".into()
    }

    pub fn pinata_api_url() -> String {
        "https://api.pinata.cloud".into()
    }

    pub fn gateway_url() -> String {
        "https://gateway.pinata.cloud/ipfs/".into()
    }

    pub fn default_collection() -> String {
        mint_scape_types::DEFAULT_COLLECTION.into()
    }

    pub fn collection_symbol() -> String {
        "MSCAPE".into()
    }

    pub fn collection_mint_price() -> String {
        "0.001".into()
    }

    pub fn gas_limit() -> u64 {
        500_000
    }

    pub fn admin_gas_limit() -> u64 {
        300_000
    }

    pub fn image_size() -> u32 {
        1024
    }

    pub fn cors_origins() -> String {
        "http://localhost:3000".into()
    }

    pub fn max_upload_bytes() -> usize {
        10 * 1024 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_contract_address_is_fatal() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[test]
    fn test_valid_config() {
        let config = Config {
            contract_address: Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".into()),
            ..Config::default()
        };
        config.validate().unwrap();
        assert_eq!(config.collection_price().unwrap(), U256::from(1_000_000_000_000_000u64));
    }

    #[test]
    fn test_garbage_contract_address() {
        let config = Config {
            contract_address: Some("core.onsocial.testnet".into()),
            ..Config::default()
        };
        assert!(config.contract_address().is_err());
    }

    #[test]
    fn test_cors_origin_list() {
        let config = Config {
            cors_origins: " http://localhost:3000, ,https://mint.example ".into(),
            ..Config::default()
        };
        assert_eq!(
            config.cors_origins(),
            vec!["http://localhost:3000", "https://mint.example"]
        );
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "contract_address": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "gas_limit": 600000
        }))
        .unwrap();
        assert_eq!(config.gas_limit, 600_000);
        assert_eq!(config.admin_gas_limit, 300_000);
        assert_eq!(config.default_collection, "Default");
        assert_eq!(config.image_size, 1024);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }
}
