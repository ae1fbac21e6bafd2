use serde::{Deserialize, Serialize};

/// Failure taxonomy surfaced to the user as a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No wallet is available to connect.
    ProviderMissing,
    /// The wallet refused the connection request.
    UserRejected,
    /// Empty prompt or empty NFT name.
    ValidationFailed,
    GenerationFailed,
    /// The generation API answered without an image artifact.
    GenerationEmpty,
    /// A local file could not be read.
    ReadError,
    PinningFailed,
    /// A contract view call failed.
    ContractReadError,
    TxFailed,
    TxReverted,
    TxTimeout,
    /// An action was requested before its inputs exist (no session, no image).
    InvalidState,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProviderMissing => "provider_missing",
            Self::UserRejected => "user_rejected",
            Self::ValidationFailed => "validation_failed",
            Self::GenerationFailed => "generation_failed",
            Self::GenerationEmpty => "generation_empty",
            Self::ReadError => "read_error",
            Self::PinningFailed => "pinning_failed",
            Self::ContractReadError => "contract_read_error",
            Self::TxFailed => "tx_failed",
            Self::TxReverted => "tx_reverted",
            Self::TxTimeout => "tx_timeout",
            Self::InvalidState => "invalid_state",
            Self::Config => "config",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
