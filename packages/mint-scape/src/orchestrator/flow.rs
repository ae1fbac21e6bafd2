//! UI-visible flow state and its snapshot.

use crate::contract::ContractClient;
use crate::image::ImagePayload;
use crate::wallet::Session;
use mint_scape_types::{ErrorKind, Locator, MintDetails, SourceMode};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowState {
    Idle,
    Connecting,
    Ready,
    CapturingImage,
    AwaitingMintDetails,
    Pinning,
    EnsuringCollection,
    Minting,
    Confirmed,
    Error,
}

impl FlowState {
    /// A network operation is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Connecting
                | Self::CapturingImage
                | Self::Pinning
                | Self::EnsuringCollection
                | Self::Minting
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Non-blocking notification for the UI (a toast).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            kind: None,
            message: message.into(),
        }
    }

    pub fn from_error(level: NoticeLevel, err: &crate::Error) -> Self {
        Self {
            level,
            kind: Some(err.kind()),
            message: err.to_string(),
        }
    }
}

/// Identifies one user-triggered attempt. Results carrying an older ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ticket(u64);

#[derive(Clone)]
pub(crate) struct ActiveSession {
    pub session: Session,
    pub contract: Arc<dyn ContractClient>,
}

/// Replaced wholesale on every successful upload or generation.
#[derive(Debug, Clone)]
pub(crate) struct DraftAsset {
    pub image: ImagePayload,
    pub mode: SourceMode,
    pub prompt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinResult {
    pub image: String,
    pub metadata: String,
    pub image_url: String,
    pub metadata_url: String,
}

impl PinResult {
    pub fn new(image: &Locator, metadata: &Locator, gateway: &str) -> Self {
        Self {
            image: image.uri(),
            metadata: metadata.uri(),
            image_url: image.gateway_url(gateway),
            metadata_url: metadata.gateway_url(gateway),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub collection: String,
    /// Ether paid, decimal string.
    pub price: String,
    pub tx_hash: String,
    pub block_number: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftView {
    pub mode: SourceMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
    pub data_uri: String,
}

/// What the UI renders.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSnapshot {
    pub state: FlowState,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draft: Option<DraftView>,
    pub details: MintDetails,
    pub mint_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<Notice>,
}

pub(crate) struct Flow {
    pub state: FlowState,
    epoch: u64,
    pub session: Option<ActiveSession>,
    pub draft: Option<DraftAsset>,
    pub details: MintDetails,
    pub pin: Option<PinResult>,
    pub confirmation: Option<Confirmation>,
    pub notice: Option<Notice>,
}

impl Flow {
    pub fn new(default_collection: &str) -> Self {
        Self {
            state: FlowState::Idle,
            epoch: 0,
            session: None,
            draft: None,
            details: MintDetails {
                collection_name: default_collection.to_string(),
                ..MintDetails::default()
            },
            pin: None,
            confirmation: None,
            notice: None,
        }
    }

    /// Start a new attempt, superseding whatever is in flight.
    pub fn begin(&mut self, state: FlowState) -> Ticket {
        self.epoch += 1;
        self.state = state;
        self.notice = None;
        Ticket(self.epoch)
    }

    /// Invalidate in-flight attempts without entering a new stage.
    pub fn supersede(&mut self) {
        self.epoch += 1;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.epoch == ticket.0
    }

    /// Surface an error and move to `state`.
    pub fn fail(&mut self, state: FlowState, err: &crate::Error) {
        self.state = state;
        self.notice = Some(Notice::from_error(NoticeLevel::Error, err));
    }

    /// Surface a warning without a state change.
    pub fn warn(&mut self, err: &crate::Error) {
        self.notice = Some(Notice::from_error(NoticeLevel::Warning, err));
    }

    pub fn snapshot(&self) -> FlowSnapshot {
        let connected = self.session.is_some();
        FlowSnapshot {
            state: self.state,
            connected,
            address: self
                .session
                .as_ref()
                .map(|s| s.session.address.to_string()),
            draft: self.draft.as_ref().map(|d| DraftView {
                mode: d.mode,
                prompt: d.prompt.clone(),
                file_name: d.image.file_name.clone(),
                content_type: d.image.content_type.clone(),
                size: d.image.bytes.len(),
                data_uri: d.image.data_uri(),
            }),
            details: self.details.clone(),
            mint_enabled: connected
                && self.draft.is_some()
                && !self.state.is_busy()
                && !self.details.name.trim().is_empty(),
            pin: self.pin.clone(),
            confirmation: self.confirmation.clone(),
            notice: self.notice.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_supersedes_previous_ticket() {
        let mut flow = Flow::new("Default");
        let first = flow.begin(FlowState::CapturingImage);
        let second = flow.begin(FlowState::CapturingImage);
        assert!(!flow.is_current(first));
        assert!(flow.is_current(second));
        flow.supersede();
        assert!(!flow.is_current(second));
    }

    #[test]
    fn test_begin_clears_notice() {
        let mut flow = Flow::new("Default");
        flow.warn(&crate::Error::Validation("prompt must not be empty".into()));
        assert!(flow.notice.is_some());
        flow.begin(FlowState::Connecting);
        assert!(flow.notice.is_none());
    }

    #[test]
    fn test_snapshot_serializes_kebab_state() {
        let mut flow = Flow::new("Gallery");
        flow.state = FlowState::AwaitingMintDetails;
        let v = serde_json::to_value(flow.snapshot()).unwrap();
        assert_eq!(v["state"], "awaiting-mint-details");
        assert_eq!(v["details"]["collection_name"], "Gallery");
        assert_eq!(v["mint_enabled"], false);
        assert!(v.get("address").is_none());
    }

    #[test]
    fn test_pin_result_urls() {
        let pin = PinResult::new(
            &Locator::new("QmA"),
            &Locator::new("QmB"),
            "https://gateway.pinata.cloud/ipfs/",
        );
        assert_eq!(pin.image, "ipfs://QmA");
        assert_eq!(pin.image_url, "https://gateway.pinata.cloud/ipfs/QmA");
        assert_eq!(pin.metadata_url, "https://gateway.pinata.cloud/ipfs/QmB");
    }
}
