//! Contract client for the deployed Mint Scape NFT contract.
//!
//! Writes carry a fixed manual gas ceiling instead of an estimate.

use crate::wallet::Session;
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{
    DynProvider, PendingTransactionBuilder, PendingTransactionError, Provider, ProviderBuilder,
    WatchTxError,
};
use alloy::sol;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

sol! {
    #[sol(rpc)]
    interface IMintScape {
        function collectionExists(string collectionName) external view returns (bool);
        function createCollection(string collectionName, string symbol, uint256 mintPrice) external;
        function getMintPrice(string collectionName) external view returns (uint256);
        function mintNFT(
            string collectionName,
            string nftName,
            string description,
            string imageUrl
        ) external payable returns (uint256);
        function getCollection(string collectionName) external view returns (
            string name,
            string symbol,
            uint256 mintPrice,
            uint256 createdAt,
            bool isActive
        );
        function getNFTMetadata(uint256 tokenId) external view returns (
            string name,
            string description,
            string imageUrl,
            uint256 createdAt,
            string collectionName
        );
        function getNFTsByOwner(address owner) external view returns (uint256[]);
        function canAffordMint(string collectionName) external view returns (bool);
        function updateMintPrice(string collectionName, uint256 newPrice) external;
        function toggleCollection(string collectionName) external;
        function withdraw() external;
    }
}

/// A submitted transaction, identified by its hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: B256,
}

/// Network confirmation of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Content fields of a mint call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRequest {
    pub collection: String,
    pub name: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub symbol: String,
    /// Ether, decimal string.
    pub mint_price: String,
    pub created_at: u64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenInfo {
    pub token_id: u64,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub created_at: u64,
    pub collection_name: String,
}

#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Unreliable: callers fall back to creation when this fails.
    async fn collection_exists(&self, name: &str) -> Result<bool, crate::Error>;
    async fn create_collection(
        &self,
        name: &str,
        symbol: &str,
        price: U256,
    ) -> Result<TxHandle, crate::Error>;
    async fn get_mint_price(&self, collection: &str) -> Result<U256, crate::Error>;
    /// `value` is attached as payment.
    async fn mint(&self, request: &MintRequest, value: U256) -> Result<TxHandle, crate::Error>;
    async fn await_tx(&self, tx: &TxHandle) -> Result<TxReceipt, crate::Error>;

    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, crate::Error>;
    async fn get_token(&self, token_id: u64) -> Result<TokenInfo, crate::Error>;
    async fn tokens_of(&self, owner: Address) -> Result<Vec<u64>, crate::Error>;
    async fn can_afford_mint(&self, collection: &str) -> Result<bool, crate::Error>;
    async fn update_mint_price(&self, collection: &str, price: U256)
        -> Result<TxHandle, crate::Error>;
    async fn toggle_collection(&self, collection: &str) -> Result<TxHandle, crate::Error>;
    async fn withdraw(&self) -> Result<TxHandle, crate::Error>;
}

/// Binds a connected session's signer to a contract client.
pub trait ContractBinder: Send + Sync {
    fn bind(&self, session: &Session) -> Result<Arc<dyn ContractClient>, crate::Error>;
}

/// Produces alloy HTTP clients for one deployed contract.
pub struct AlloyBinder {
    rpc_url: Url,
    contract: Address,
    gas_limit: u64,
    admin_gas_limit: u64,
}

impl AlloyBinder {
    pub fn new(
        rpc_url: &str,
        contract: Address,
        gas_limit: u64,
        admin_gas_limit: u64,
    ) -> Result<Self, crate::Error> {
        let rpc_url = rpc_url
            .parse()
            .map_err(|e| crate::Error::Config(format!("Invalid RPC URL {rpc_url}: {e}")))?;
        Ok(Self {
            rpc_url,
            contract,
            gas_limit,
            admin_gas_limit,
        })
    }
}

impl ContractBinder for AlloyBinder {
    fn bind(&self, session: &Session) -> Result<Arc<dyn ContractClient>, crate::Error> {
        let provider = ProviderBuilder::new()
            .wallet(session.signer.clone())
            .connect_http(self.rpc_url.clone())
            .erased();
        info!(
            contract = %self.contract,
            from = %session.address,
            rpc = %self.rpc_url,
            "Contract client bound"
        );
        Ok(Arc::new(AlloyContractClient {
            contract: IMintScape::new(self.contract, provider.clone()),
            provider,
            from: session.address,
            gas_limit: self.gas_limit,
            admin_gas_limit: self.admin_gas_limit,
        }))
    }
}

pub struct AlloyContractClient {
    provider: DynProvider,
    contract: IMintScape::IMintScapeInstance<DynProvider>,
    from: Address,
    gas_limit: u64,
    admin_gas_limit: u64,
}

fn read_err(e: alloy::contract::Error) -> crate::Error {
    crate::Error::ContractRead(e.to_string())
}

fn send_err(e: alloy::contract::Error) -> crate::Error {
    crate::Error::TxFailed(e.to_string())
}

fn to_u64(value: U256, what: &str) -> Result<u64, crate::Error> {
    u64::try_from(value)
        .map_err(|_| crate::Error::ContractRead(format!("{what} out of range: {value}")))
}

#[async_trait]
impl ContractClient for AlloyContractClient {
    async fn collection_exists(&self, name: &str) -> Result<bool, crate::Error> {
        self.contract
            .collectionExists(name.to_string())
            .call()
            .await
            .map_err(read_err)
    }

    async fn create_collection(
        &self,
        name: &str,
        symbol: &str,
        price: U256,
    ) -> Result<TxHandle, crate::Error> {
        let pending = self
            .contract
            .createCollection(name.to_string(), symbol.to_string(), price)
            .gas(self.gas_limit)
            .send()
            .await
            .map_err(send_err)?;
        let hash = *pending.tx_hash();
        info!(collection = name, tx_hash = %hash, "createCollection submitted");
        Ok(TxHandle { hash })
    }

    async fn get_mint_price(&self, collection: &str) -> Result<U256, crate::Error> {
        self.contract
            .getMintPrice(collection.to_string())
            .call()
            .await
            .map_err(read_err)
    }

    async fn mint(&self, request: &MintRequest, value: U256) -> Result<TxHandle, crate::Error> {
        let pending = self
            .contract
            .mintNFT(
                request.collection.clone(),
                request.name.clone(),
                request.description.clone(),
                request.image_url.clone(),
            )
            .value(value)
            .gas(self.gas_limit)
            .send()
            .await
            .map_err(send_err)?;
        let hash = *pending.tx_hash();
        info!(
            collection = %request.collection,
            value = %value,
            tx_hash = %hash,
            "mintNFT submitted"
        );
        Ok(TxHandle { hash })
    }

    async fn await_tx(&self, tx: &TxHandle) -> Result<TxReceipt, crate::Error> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx.hash)
            .get_receipt()
            .await
            .map_err(|e| match e {
                PendingTransactionError::TxWatcher(WatchTxError::Timeout) => {
                    crate::Error::TxTimeout(format!("no receipt for {}", tx.hash))
                }
                other => crate::Error::TxFailed(other.to_string()),
            })?;

        if !receipt.status() {
            warn!(tx_hash = %tx.hash, "Transaction reverted");
            return Err(crate::Error::TxReverted(format!(
                "transaction {} reverted",
                tx.hash
            )));
        }

        Ok(TxReceipt {
            tx_hash: tx.hash.to_string(),
            block_number: receipt.block_number(),
            gas_used: receipt.gas_used(),
        })
    }

    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, crate::Error> {
        let c = self
            .contract
            .getCollection(name.to_string())
            .call()
            .await
            .map_err(read_err)?;
        Ok(CollectionInfo {
            name: c.name,
            symbol: c.symbol,
            mint_price: alloy::primitives::utils::format_ether(c.mintPrice),
            created_at: to_u64(c.createdAt, "createdAt")?,
            is_active: c.isActive,
        })
    }

    async fn get_token(&self, token_id: u64) -> Result<TokenInfo, crate::Error> {
        let m = self
            .contract
            .getNFTMetadata(U256::from(token_id))
            .call()
            .await
            .map_err(read_err)?;
        Ok(TokenInfo {
            token_id,
            name: m.name,
            description: m.description,
            image_url: m.imageUrl,
            created_at: to_u64(m.createdAt, "createdAt")?,
            collection_name: m.collectionName,
        })
    }

    async fn tokens_of(&self, owner: Address) -> Result<Vec<u64>, crate::Error> {
        let ids = self
            .contract
            .getNFTsByOwner(owner)
            .call()
            .await
            .map_err(read_err)?;
        ids.into_iter().map(|id| to_u64(id, "tokenId")).collect()
    }

    async fn can_afford_mint(&self, collection: &str) -> Result<bool, crate::Error> {
        self.contract
            .canAffordMint(collection.to_string())
            .from(self.from)
            .call()
            .await
            .map_err(read_err)
    }

    async fn update_mint_price(
        &self,
        collection: &str,
        price: U256,
    ) -> Result<TxHandle, crate::Error> {
        let pending = self
            .contract
            .updateMintPrice(collection.to_string(), price)
            .gas(self.admin_gas_limit)
            .send()
            .await
            .map_err(send_err)?;
        Ok(TxHandle {
            hash: *pending.tx_hash(),
        })
    }

    async fn toggle_collection(&self, collection: &str) -> Result<TxHandle, crate::Error> {
        let pending = self
            .contract
            .toggleCollection(collection.to_string())
            .gas(self.admin_gas_limit)
            .send()
            .await
            .map_err(send_err)?;
        Ok(TxHandle {
            hash: *pending.tx_hash(),
        })
    }

    async fn withdraw(&self) -> Result<TxHandle, crate::Error> {
        let pending = self
            .contract
            .withdraw()
            .gas(self.admin_gas_limit)
            .send()
            .await
            .map_err(send_err)?;
        Ok(TxHandle {
            hash: *pending.tx_hash(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::local::PrivateKeySigner;

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn binder() -> AlloyBinder {
        AlloyBinder::new("http://127.0.0.1:1", CONTRACT.parse().unwrap(), 500_000, 300_000)
            .unwrap()
    }

    #[test]
    fn test_invalid_rpc_url() {
        let err = AlloyBinder::new("not a url", Address::ZERO, 1, 1).err().unwrap();
        assert!(matches!(err, crate::Error::Config(_)));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_read_error() {
        let session = Session::from_signer(PrivateKeySigner::random());
        let client = binder().bind(&session).unwrap();
        let err = client.collection_exists("Default").await.unwrap_err();
        assert!(matches!(err, crate::Error::ContractRead(_)));
    }

    #[test]
    fn test_to_u64_bounds() {
        assert_eq!(to_u64(U256::from(7u64), "x").unwrap(), 7);
        assert!(to_u64(U256::MAX, "x").is_err());
    }
}
