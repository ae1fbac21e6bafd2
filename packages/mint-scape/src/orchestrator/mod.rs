//! Connect → capture → describe → pin → ensure collection → mint.
//!
//! All flow state lives behind one async mutex that is never held across a
//! collaborator call. Each user action starts a new attempt; a stage result
//! is applied only if no newer attempt has started since (last stage wins).

mod collection;
mod flow;

pub use collection::{ensure_collection, CollectionStatus};
pub use flow::{
    Confirmation, DraftView, FlowSnapshot, FlowState, Notice, NoticeLevel, PinResult,
};

use crate::contract::{ContractBinder, ContractClient, MintRequest};
use crate::image::{ImagePayload, ImageSize, ImageSource};
use crate::metrics::METRICS;
use crate::pinning::ContentPinner;
use crate::wallet::WalletConnector;
use crate::Error;
use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;
use flow::{ActiveSession, DraftAsset, Flow, Ticket};
use mint_scape_types::{build_metadata_document, require_non_empty, MintDetails, SourceMode};
use std::future::Future;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone)]
pub struct FlowSettings {
    pub default_collection: String,
    /// Symbol used when a collection is created on the fly.
    pub collection_symbol: String,
    /// Mint price (wei) used when a collection is created on the fly.
    pub collection_price: U256,
    pub image_size: ImageSize,
    pub gateway_url: String,
}

pub struct Orchestrator {
    wallet: Arc<dyn WalletConnector>,
    binder: Arc<dyn ContractBinder>,
    images: Arc<dyn ImageSource>,
    pinner: Arc<dyn ContentPinner>,
    settings: FlowSettings,
    flow: Mutex<Flow>,
}

struct MintJob {
    contract: Arc<dyn ContractClient>,
    draft: DraftAsset,
    details: MintDetails,
}

impl Orchestrator {
    pub fn new(
        wallet: Arc<dyn WalletConnector>,
        binder: Arc<dyn ContractBinder>,
        images: Arc<dyn ImageSource>,
        pinner: Arc<dyn ContentPinner>,
        settings: FlowSettings,
    ) -> Self {
        let flow = Mutex::new(Flow::new(&settings.default_collection));
        Self {
            wallet,
            binder,
            images,
            pinner,
            settings,
            flow,
        }
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    pub async fn snapshot(&self) -> FlowSnapshot {
        self.flow.lock().await.snapshot()
    }

    /// Startup hook: connect automatically when a wallet is present,
    /// otherwise surface `ProviderMissing` and stay usable for retries.
    pub async fn mount(&self) -> FlowSnapshot {
        if let Err(e) = self.connect().await {
            warn!(error = %e, "Automatic wallet connection failed");
        }
        self.snapshot().await
    }

    pub async fn connect(&self) -> Result<FlowSnapshot, Error> {
        let ticket = {
            let mut flow = self.flow.lock().await;
            if flow.session.is_some() {
                return Ok(flow.snapshot());
            }
            if !self.wallet.is_available() {
                let err =
                    Error::ProviderMissing("no wallet found; run `mint-scape init-wallet`".into());
                flow.supersede();
                flow.fail(FlowState::Error, &err);
                return Err(err);
            }
            flow.begin(FlowState::Connecting)
        };

        let result = match self.wallet.connect().await {
            Ok(session) => self
                .binder
                .bind(&session)
                .map(|contract| ActiveSession { session, contract }),
            Err(e) => Err(e),
        };

        let mut flow = self.flow.lock().await;
        if !flow.is_current(ticket) {
            debug!("Dropping superseded connect result");
            return result.map(|_| flow.snapshot());
        }
        match result {
            Ok(active) => {
                METRICS.connects.fetch_add(1, Ordering::Relaxed);
                info!(address = %active.session.address, "Wallet connected");
                flow.session = Some(active);
                flow.state = if flow.draft.is_some() {
                    FlowState::AwaitingMintDetails
                } else {
                    FlowState::Ready
                };
                Ok(flow.snapshot())
            }
            Err(e @ Error::UserRejected(_)) => {
                info!(error = %e, "Wallet connection rejected");
                flow.state = FlowState::Idle;
                flow.warn(&e);
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "Wallet connection failed");
                flow.fail(FlowState::Error, &e);
                Err(e)
            }
        }
    }

    /// Drops the session. The draft and details survive for the next connect.
    pub async fn disconnect(&self) -> FlowSnapshot {
        let (session, snapshot) = {
            let mut flow = self.flow.lock().await;
            flow.supersede();
            let session = flow.session.take();
            flow.state = FlowState::Idle;
            flow.notice = None;
            (session, flow.snapshot())
        };
        if let Some(active) = session {
            self.wallet.disconnect(&active.session).await;
        }
        snapshot
    }

    /// `read` yields the uploaded bytes; it runs as the capture stage.
    pub async fn upload<F>(&self, read: F) -> Result<FlowSnapshot, Error>
    where
        F: Future<Output = Result<ImagePayload, Error>> + Send,
    {
        self.capture(SourceMode::Upload, None, read).await
    }

    /// An empty prompt is rejected before the image service is called.
    pub async fn generate(&self, prompt: &str) -> Result<FlowSnapshot, Error> {
        let prompt = match require_non_empty("prompt", prompt) {
            Ok(p) => p.to_string(),
            Err(e) => {
                let err = Error::from(e);
                self.flow.lock().await.warn(&err);
                return Err(err);
            }
        };
        let images = Arc::clone(&self.images);
        let size = self.settings.image_size;
        let request = prompt.clone();
        self.capture(SourceMode::Generated, Some(prompt), async move {
            images.generate(&request, size).await
        })
        .await
    }

    async fn capture<F>(
        &self,
        mode: SourceMode,
        prompt: Option<String>,
        read: F,
    ) -> Result<FlowSnapshot, Error>
    where
        F: Future<Output = Result<ImagePayload, Error>> + Send,
    {
        let ticket = {
            let mut flow = self.flow.lock().await;
            if flow.session.is_none() {
                return Err(Error::InvalidState("connect a wallet first".into()));
            }
            if flow.state.is_busy() {
                return Err(busy(flow.state));
            }
            flow.begin(FlowState::CapturingImage)
        };
        match mode {
            SourceMode::Upload => METRICS.uploads.fetch_add(1, Ordering::Relaxed),
            SourceMode::Generated => METRICS.generations.fetch_add(1, Ordering::Relaxed),
        };

        let result = read.await;

        let mut flow = self.flow.lock().await;
        if !flow.is_current(ticket) {
            debug!(?mode, "Dropping superseded image result");
            return result.map(|_| flow.snapshot());
        }
        match result {
            Ok(image) => {
                info!(
                    ?mode,
                    file_name = %image.file_name,
                    size = image.bytes.len(),
                    "Image captured"
                );
                flow.draft = Some(DraftAsset { image, mode, prompt });
                flow.pin = None;
                flow.confirmation = None;
                flow.state = FlowState::AwaitingMintDetails;
                Ok(flow.snapshot())
            }
            Err(e) => {
                if mode == SourceMode::Generated {
                    METRICS.generation_errors.fetch_add(1, Ordering::Relaxed);
                }
                warn!(?mode, error = %e, "Image capture failed");
                flow.fail(FlowState::Ready, &e);
                Err(e)
            }
        }
    }

    /// A blank collection name falls back to the configured default.
    pub async fn update_details(&self, mut details: MintDetails) -> Result<FlowSnapshot, Error> {
        let mut flow = self.flow.lock().await;
        if flow.draft.is_none() {
            return Err(Error::InvalidState("upload or generate an image first".into()));
        }
        if details.collection_name.trim().is_empty() {
            details.collection_name = self.settings.default_collection.clone();
        }
        flow.details = details;
        if flow.session.is_some() && !flow.state.is_busy() {
            flow.state = FlowState::AwaitingMintDetails;
        }
        Ok(flow.snapshot())
    }

    /// Every attempt pins afresh; pins from an earlier failed attempt are
    /// never reused.
    pub async fn mint(&self) -> Result<FlowSnapshot, Error> {
        let (ticket, job) = {
            let mut flow = self.flow.lock().await;
            let Some(active) = flow.session.clone() else {
                return Err(Error::InvalidState("connect a wallet first".into()));
            };
            let Some(draft) = flow.draft.clone() else {
                return Err(Error::InvalidState("upload or generate an image first".into()));
            };
            if flow.state.is_busy() {
                return Err(busy(flow.state));
            }
            if let Err(e) = require_non_empty("name", &flow.details.name) {
                let err = Error::from(e);
                flow.warn(&err);
                return Err(err);
            }
            let ticket = flow.begin(FlowState::Pinning);
            flow.pin = None;
            flow.confirmation = None;
            let job = MintJob {
                contract: active.contract,
                draft,
                details: flow.details.clone(),
            };
            (ticket, job)
        };

        METRICS.mint_attempts.fetch_add(1, Ordering::Relaxed);
        let start = Instant::now();
        let result = self.run_mint(ticket, job).await;
        METRICS.record_mint_duration(start);

        if let Ok(Some(_)) = &result {
            METRICS.mint_success.fetch_add(1, Ordering::Relaxed);
        }
        let mut flow = self.flow.lock().await;
        match result {
            Ok(Some(confirmation)) if flow.is_current(ticket) => {
                info!(
                    collection = %confirmation.collection,
                    tx_hash = %confirmation.tx_hash,
                    "NFT minted"
                );
                flow.notice = Some(Notice::info(format!(
                    "Minted into {} ({})",
                    confirmation.collection, confirmation.tx_hash
                )));
                flow.confirmation = Some(confirmation);
                flow.details.reset_form();
                flow.state = FlowState::Confirmed;
                Ok(flow.snapshot())
            }
            Ok(Some(confirmation)) => {
                info!(
                    collection = %confirmation.collection,
                    tx_hash = %confirmation.tx_hash,
                    "NFT minted after the flow moved on"
                );
                Ok(flow.snapshot())
            }
            Ok(None) => {
                debug!("Dropping superseded mint result");
                Ok(flow.snapshot())
            }
            Err(e) => {
                METRICS.mint_errors.fetch_add(1, Ordering::Relaxed);
                error!(kind = %e.kind(), error = %e, "Mint failed");
                if flow.is_current(ticket) {
                    flow.fail(FlowState::Error, &e);
                }
                Err(e)
            }
        }
    }

    /// `Ok(None)` when a newer attempt took over mid-way.
    async fn run_mint(&self, ticket: Ticket, job: MintJob) -> Result<Option<Confirmation>, Error> {
        let MintJob {
            contract,
            draft,
            details,
        } = job;

        let image = self
            .pinner
            .pin_file(
                draft.image.bytes.clone(),
                &draft.image.file_name,
                &draft.image.content_type,
            )
            .await
            .map_err(pin_error)?;
        METRICS.pins.fetch_add(1, Ordering::Relaxed);
        if !self.advance(ticket, FlowState::Pinning, |_| {}).await {
            return Ok(None);
        }

        let document =
            build_metadata_document(&details, draft.mode, draft.prompt.as_deref(), &image);
        let metadata = self
            .pinner
            .pin_json(&document)
            .await
            .map_err(pin_error)?;
        METRICS.pins.fetch_add(1, Ordering::Relaxed);

        let pin = PinResult::new(&image, &metadata, &self.settings.gateway_url);
        let image_url = pin.image_url.clone();
        info!(image = %pin.image, metadata = %pin.metadata, "Content pinned");
        let stored = |flow: &mut Flow| flow.pin = Some(pin);
        if !self.advance(ticket, FlowState::EnsuringCollection, stored).await {
            return Ok(None);
        }

        let collection = details.collection().to_string();
        ensure_collection(
            contract.as_ref(),
            &collection,
            &self.settings.collection_symbol,
            self.settings.collection_price,
        )
        .await?;
        if !self.advance(ticket, FlowState::Minting, |_| {}).await {
            return Ok(None);
        }

        // Price is read for this exact collection on every attempt.
        let price = contract.get_mint_price(&collection).await?;
        let request = MintRequest {
            collection: collection.clone(),
            name: details.name.trim().to_string(),
            description: details.description.clone(),
            image_url,
        };
        let tx = contract.mint(&request, price).await?;
        debug!(tx_hash = %tx.hash, "Mint submitted");
        let receipt = contract.await_tx(&tx).await?;

        Ok(Some(Confirmation {
            collection,
            price: format_ether(price),
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
        }))
    }

    /// Apply `update` and move to `next` if `ticket` is still current.
    async fn advance(
        &self,
        ticket: Ticket,
        next: FlowState,
        update: impl FnOnce(&mut Flow),
    ) -> bool {
        let mut flow = self.flow.lock().await;
        if !flow.is_current(ticket) {
            debug!(?next, "Attempt superseded");
            return false;
        }
        update(&mut *flow);
        flow.state = next;
        true
    }

    /// Contract client of the connected session, for read and admin routes.
    pub async fn contract(&self) -> Result<Arc<dyn ContractClient>, Error> {
        self.flow
            .lock()
            .await
            .session
            .as_ref()
            .map(|s| Arc::clone(&s.contract))
            .ok_or_else(|| Error::InvalidState("connect a wallet first".into()))
    }
}

fn busy(state: FlowState) -> Error {
    let what = match state {
        FlowState::Connecting => "wallet connection",
        FlowState::CapturingImage => "image capture",
        _ => "mint",
    };
    Error::InvalidState(format!("a {what} is already in progress"))
}

fn pin_error(e: Error) -> Error {
    METRICS.pin_errors.fetch_add(1, Ordering::Relaxed);
    match e {
        Error::Pinning(_) => e,
        other => Error::Pinning(other.to_string()),
    }
}
