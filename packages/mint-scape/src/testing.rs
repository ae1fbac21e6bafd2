//! In-memory collaborators that record every call in order.

use crate::contract::{
    CollectionInfo, ContractBinder, ContractClient, MintRequest, TokenInfo, TxHandle, TxReceipt,
};
use crate::image::{ImagePayload, ImageSize, ImageSource};
use crate::orchestrator::{FlowSettings, Orchestrator};
use crate::pinning::ContentPinner;
use crate::wallet::{Session, WalletConnector};
use crate::Error;
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::{Address, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use mint_scape_types::{Locator, MintDetails, NftMetadata};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::oneshot;

pub(crate) const GATEWAY: &str = "https://gateway.example/ipfs/";

/// A temp-dir path unique to this process and call.
pub(crate) fn scratch_path(tag: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "mint_scape_{tag}_{}_{:016x}.{ext}",
        std::process::id(),
        rand::random::<u64>()
    ))
}

/// Ordered record of collaborator calls shared by all fakes.
#[derive(Default)]
pub(crate) struct CallLog(StdMutex<Vec<String>>);

impl CallLog {
    pub(crate) fn push(&self, call: impl Into<String>) {
        self.0.lock().unwrap().push(call.into());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub(crate) fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }
}

pub(crate) struct FakeWallet {
    pub(crate) available: bool,
    pub(crate) reject: bool,
    pub(crate) signer: PrivateKeySigner,
    pub(crate) log: Arc<CallLog>,
}

#[async_trait]
impl WalletConnector for FakeWallet {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn connect(&self) -> Result<Session, Error> {
        self.log.push("connect");
        if self.reject {
            return Err(Error::UserRejected("user denied account access".into()));
        }
        Ok(Session::from_signer(self.signer.clone()))
    }

    async fn disconnect(&self, _session: &Session) {
        self.log.push("disconnect");
    }
}

#[derive(Default)]
pub(crate) struct ContractState {
    /// Collection name to mint price.
    pub(crate) collections: HashMap<String, U256>,
    pub(crate) exists_fails: bool,
    pub(crate) create_error: Option<String>,
    pub(crate) revert_mint: bool,
    pub(crate) mints: Vec<(MintRequest, U256)>,
    pub(crate) tx_count: u8,
}

pub(crate) struct FakeContract {
    pub(crate) state: StdMutex<ContractState>,
    /// When set, the next await_tx call waits for this before reading the receipt.
    pub(crate) hold_await: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    pub(crate) log: Arc<CallLog>,
}

impl FakeContract {
    fn next_tx(&self) -> TxHandle {
        let mut state = self.state.lock().unwrap();
        state.tx_count += 1;
        TxHandle {
            hash: B256::with_last_byte(state.tx_count),
        }
    }

    pub(crate) fn mints(&self) -> Vec<(MintRequest, U256)> {
        self.state.lock().unwrap().mints.clone()
    }
}

#[async_trait]
impl ContractClient for FakeContract {
    async fn collection_exists(&self, name: &str) -> Result<bool, Error> {
        self.log.push(format!("collection_exists:{name}"));
        let state = self.state.lock().unwrap();
        if state.exists_fails {
            return Err(Error::ContractRead("execution reverted".into()));
        }
        Ok(state.collections.contains_key(name))
    }

    async fn create_collection(
        &self,
        name: &str,
        _symbol: &str,
        price: U256,
    ) -> Result<TxHandle, Error> {
        self.log.push(format!("create_collection:{name}"));
        {
            let mut state = self.state.lock().unwrap();
            if let Some(msg) = &state.create_error {
                return Err(Error::TxFailed(msg.clone()));
            }
            state.collections.insert(name.to_string(), price);
        }
        Ok(self.next_tx())
    }

    async fn get_mint_price(&self, collection: &str) -> Result<U256, Error> {
        self.log.push(format!("get_mint_price:{collection}"));
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection)
            .copied()
            .ok_or_else(|| Error::ContractRead("collection does not exist".into()))
    }

    async fn mint(&self, request: &MintRequest, value: U256) -> Result<TxHandle, Error> {
        self.log.push(format!("mint:{}", request.collection));
        self.state.lock().unwrap().mints.push((request.clone(), value));
        Ok(self.next_tx())
    }

    async fn await_tx(&self, tx: &TxHandle) -> Result<TxReceipt, Error> {
        let gate = self.hold_await.lock().await.take();
        self.log.push("await_tx");
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        let state = self.state.lock().unwrap();
        if state.revert_mint && !state.mints.is_empty() {
            return Err(Error::TxReverted(format!("{} reverted", tx.hash)));
        }
        Ok(TxReceipt {
            tx_hash: tx.hash.to_string(),
            block_number: Some(7),
            gas_used: 21_000,
        })
    }

    async fn get_collection(&self, name: &str) -> Result<CollectionInfo, Error> {
        let price = self.get_mint_price(name).await?;
        Ok(CollectionInfo {
            name: name.to_string(),
            symbol: "MSCAPE".into(),
            mint_price: format_ether(price),
            created_at: 0,
            is_active: true,
        })
    }

    async fn get_token(&self, token_id: u64) -> Result<TokenInfo, Error> {
        Err(Error::ContractRead(format!("token {token_id} not found")))
    }

    async fn tokens_of(&self, _owner: Address) -> Result<Vec<u64>, Error> {
        Ok(Vec::new())
    }

    async fn can_afford_mint(&self, _collection: &str) -> Result<bool, Error> {
        Ok(true)
    }

    async fn update_mint_price(&self, collection: &str, price: U256) -> Result<TxHandle, Error> {
        self.state
            .lock()
            .unwrap()
            .collections
            .insert(collection.to_string(), price);
        Ok(self.next_tx())
    }

    async fn toggle_collection(&self, _collection: &str) -> Result<TxHandle, Error> {
        Ok(self.next_tx())
    }

    async fn withdraw(&self) -> Result<TxHandle, Error> {
        Ok(self.next_tx())
    }
}

pub(crate) struct FakeBinder(pub(crate) Arc<FakeContract>);

impl ContractBinder for FakeBinder {
    fn bind(&self, _session: &Session) -> Result<Arc<dyn ContractClient>, Error> {
        Ok(self.0.clone())
    }
}

pub(crate) struct FakeImages {
    pub(crate) generate_result: StdMutex<Result<(), Error>>,
    /// When set, the next generate call waits for this before returning.
    pub(crate) hold: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    pub(crate) generate_calls: AtomicUsize,
    pub(crate) log: Arc<CallLog>,
}

#[async_trait]
impl ImageSource for FakeImages {
    async fn generate(&self, prompt: &str, _size: ImageSize) -> Result<ImagePayload, Error> {
        let gate = self.hold.lock().await.take();
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        self.log.push(format!("generate:{prompt}"));
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        self.generate_result.lock().unwrap().clone()?;
        Ok(ImagePayload {
            bytes: prompt.as_bytes().to_vec(),
            file_name: "image.png".into(),
            content_type: "image/png".into(),
        })
    }
}

#[derive(Default)]
pub(crate) struct PinState {
    pub(crate) fail_json: bool,
    pub(crate) files: usize,
    pub(crate) documents: Vec<NftMetadata>,
}

pub(crate) struct FakePinner {
    pub(crate) state: StdMutex<PinState>,
    pub(crate) log: Arc<CallLog>,
}

#[async_trait]
impl ContentPinner for FakePinner {
    async fn pin_file(
        &self,
        _bytes: Vec<u8>,
        file_name: &str,
        _content_type: &str,
    ) -> Result<Locator, Error> {
        self.log.push(format!("pin_file:{file_name}"));
        let mut state = self.state.lock().unwrap();
        state.files += 1;
        Ok(Locator::new(format!("QmImage{}", state.files)))
    }

    async fn pin_json(&self, document: &NftMetadata) -> Result<Locator, Error> {
        self.log.push("pin_json");
        let mut state = self.state.lock().unwrap();
        if state.fail_json {
            return Err(Error::Pinning("HTTP 401 Unauthorized".into()));
        }
        state.documents.push(document.clone());
        Ok(Locator::new(format!("QmMeta{}", state.documents.len())))
    }
}

pub(crate) struct Harness {
    pub(crate) orchestrator: Orchestrator,
    pub(crate) contract: Arc<FakeContract>,
    pub(crate) images: Arc<FakeImages>,
    pub(crate) pinner: Arc<FakePinner>,
    pub(crate) log: Arc<CallLog>,
}

impl Harness {
    pub(crate) fn documents(&self) -> Vec<NftMetadata> {
        self.pinner.state.lock().unwrap().documents.clone()
    }
}

pub(crate) fn harness(available: bool, reject: bool) -> Harness {
    let log = Arc::new(CallLog::default());
    let wallet = Arc::new(FakeWallet {
        available,
        reject,
        signer: PrivateKeySigner::random(),
        log: log.clone(),
    });
    let contract = Arc::new(FakeContract {
        state: StdMutex::new(ContractState::default()),
        hold_await: tokio::sync::Mutex::new(None),
        log: log.clone(),
    });
    let images = Arc::new(FakeImages {
        generate_result: StdMutex::new(Ok(())),
        hold: tokio::sync::Mutex::new(None),
        generate_calls: AtomicUsize::new(0),
        log: log.clone(),
    });
    let pinner = Arc::new(FakePinner {
        state: StdMutex::new(PinState::default()),
        log: log.clone(),
    });
    let settings = FlowSettings {
        default_collection: "Default".into(),
        collection_symbol: "MSCAPE".into(),
        collection_price: parse_ether("0.001").unwrap(),
        image_size: ImageSize::square(1024),
        gateway_url: GATEWAY.into(),
    };
    let orchestrator = Orchestrator::new(
        wallet,
        Arc::new(FakeBinder(contract.clone())),
        images.clone(),
        pinner.clone(),
        settings,
    );
    Harness {
        orchestrator,
        contract,
        images,
        pinner,
        log,
    }
}

pub(crate) async fn connected() -> Harness {
    let h = harness(true, false);
    h.orchestrator.connect().await.unwrap();
    h
}

pub(crate) fn details(name: &str, collection: &str) -> MintDetails {
    MintDetails {
        name: name.into(),
        description: "A quiet harbour at dusk".into(),
        collection_name: collection.into(),
    }
}
