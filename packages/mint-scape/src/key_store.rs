//! Wallet key persistence on local disk.
//!
//! File layout when sealed: 12-byte nonce followed by the AES-256-GCM
//! ciphertext of the JSON record.

use aes_gcm::aead::{Aead, AeadCore, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use alloy::signers::local::PrivateKeySigner;
use base64::{engine::general_purpose::STANDARD as B64, Engine};
use std::path::{Path, PathBuf};
use tracing::info;

pub const KEYSTORE_SECRET_ENV: &str = "MINT_SCAPE_KEYSTORE_SECRET";
const NONCE_LEN: usize = 12;

pub struct KeyStore {
    path: PathBuf,
    /// `None` = plaintext (dev).
    sealer: Option<Sealer>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct WalletRecord {
    address: String,
    secret_key: String,
}

fn store_err(action: &'static str) -> impl Fn(std::io::Error) -> crate::Error {
    move |e| crate::Error::Config(format!("Failed to {action} wallet key store: {e}"))
}

impl KeyStore {
    pub fn new_plaintext(path: PathBuf) -> Self {
        Self { path, sealer: None }
    }

    /// `secret_b64` must decode to exactly 32 bytes.
    pub fn new_encrypted(path: PathBuf, secret_b64: &str) -> Result<Self, crate::Error> {
        let secret = B64
            .decode(secret_b64.trim())
            .map_err(|e| {
                crate::Error::Config(format!("{KEYSTORE_SECRET_ENV} is not base64: {e}"))
            })?;
        let cipher = Aes256Gcm::new_from_slice(&secret).map_err(|_| {
            crate::Error::Config(format!(
                "{KEYSTORE_SECRET_ENV} must be 32 bytes, got {}",
                secret.len()
            ))
        })?;
        Ok(Self {
            path,
            sealer: Some(Sealer(cipher)),
        })
    }

    /// Sealed when `MINT_SCAPE_KEYSTORE_SECRET` is set, plaintext otherwise.
    pub fn from_env(path: PathBuf) -> Result<Self, crate::Error> {
        match std::env::var(KEYSTORE_SECRET_ENV) {
            Ok(secret) if !secret.is_empty() => Self::new_encrypted(path, &secret),
            _ => Ok(Self::new_plaintext(path)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Written to a sibling temp file, then renamed into place.
    pub fn save(&self, signer: &PrivateKeySigner) -> Result<(), crate::Error> {
        let record = WalletRecord {
            address: signer.address().to_string(),
            secret_key: alloy::primitives::hex::encode_prefixed(signer.to_bytes()),
        };
        let mut bytes = serde_json::to_vec_pretty(&record)
            .map_err(|e| crate::Error::Config(format!("Failed to encode wallet record: {e}")))?;
        if let Some(sealer) = &self.sealer {
            bytes = sealer.seal(&bytes)?;
        }

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(store_err("create directory for"))?;
        }
        let staging = self.path.with_extension("tmp");
        std::fs::write(&staging, &bytes).map_err(store_err("write"))?;
        std::fs::rename(&staging, &self.path).map_err(store_err("replace"))?;

        info!(path = %self.path.display(), address = %record.address, "Wallet key saved");
        Ok(())
    }

    /// A missing file is `ProviderMissing`; a file that does not unseal is
    /// `UserRejected`.
    pub fn load(&self) -> Result<PrivateKeySigner, crate::Error> {
        if !self.exists() {
            return Err(crate::Error::ProviderMissing(format!(
                "no wallet at {}",
                self.path.display()
            )));
        }
        let mut bytes = std::fs::read(&self.path).map_err(store_err("read"))?;
        if let Some(sealer) = &self.sealer {
            bytes = sealer.open(&bytes)?;
        }
        let record: WalletRecord = serde_json::from_slice(&bytes)
            .map_err(|e| crate::Error::Config(format!("Corrupt wallet record: {e}")))?;
        record
            .secret_key
            .parse()
            .map_err(|e| crate::Error::Config(format!("Invalid wallet secret key: {e}")))
    }
}

struct Sealer(Aes256Gcm);

impl Sealer {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, crate::Error> {
        let nonce = Aes256Gcm::generate_nonce(&mut rand::thread_rng());
        let ciphertext = self
            .0
            .encrypt(&nonce, plaintext)
            .map_err(|e| crate::Error::Config(format!("Wallet encryption failed: {e}")))?;
        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, crate::Error> {
        if sealed.len() < NONCE_LEN {
            return Err(crate::Error::Config("Wallet file truncated".into()));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.0
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                crate::Error::UserRejected("wallet key did not unseal (wrong secret?)".into())
            })
    }
}
