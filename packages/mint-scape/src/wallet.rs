//! Wallet connector backed by the local key store.

use crate::key_store::KeyStore;
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{debug, info};

/// A connected account and the signer bound to it.
#[derive(Clone)]
pub struct Session {
    pub address: Address,
    pub signer: EthereumWallet,
}

impl Session {
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            signer: EthereumWallet::from(signer),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait WalletConnector: Send + Sync {
    /// Provider presence check.
    fn is_available(&self) -> bool;

    /// Fails with `ProviderMissing` or `UserRejected`; never retried here.
    async fn connect(&self) -> Result<Session, crate::Error>;

    async fn disconnect(&self, session: &Session);
}

pub struct LocalWallet {
    store: KeyStore,
}

impl LocalWallet {
    pub fn new(store: KeyStore) -> Self {
        Self { store }
    }

    /// Create a fresh key in the store. Refuses to overwrite an existing wallet.
    pub fn init(store: &KeyStore) -> Result<Address, crate::Error> {
        if store.exists() {
            return Err(crate::Error::Config(format!(
                "wallet already exists at {}",
                store.path().display()
            )));
        }
        let signer = PrivateKeySigner::random();
        store.save(&signer)?;
        Ok(signer.address())
    }
}

#[async_trait]
impl WalletConnector for LocalWallet {
    fn is_available(&self) -> bool {
        self.store.exists()
    }

    async fn connect(&self) -> Result<Session, crate::Error> {
        let signer = self.store.load()?;
        let session = Session::from_signer(signer);
        debug!(
            address = %session.address,
            path = %self.store.path().display(),
            "Key store unlocked"
        );
        Ok(session)
    }

    async fn disconnect(&self, session: &Session) {
        info!(address = %session.address, "Wallet disconnected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scratch_path;

    #[tokio::test]
    async fn test_local_wallet_connect() {
        let path = scratch_path("wallet_connect", "json");
        let store = KeyStore::new_plaintext(path.clone());
        let address = LocalWallet::init(&store).unwrap();
        assert!(LocalWallet::init(&store).is_err());

        let wallet = LocalWallet::new(KeyStore::new_plaintext(path.clone()));
        assert!(wallet.is_available());
        let session = wallet.connect().await.unwrap();
        assert_eq!(session.address, address);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_unavailable_wallet() {
        let path = scratch_path("wallet_absent", "json");
        let wallet = LocalWallet::new(KeyStore::new_plaintext(path));
        assert!(!wallet.is_available());
        let err = wallet.connect().await.unwrap_err();
        assert_eq!(err.kind(), mint_scape_types::ErrorKind::ProviderMissing);
    }
}
