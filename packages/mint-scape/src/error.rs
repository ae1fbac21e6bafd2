//! Error types for the mint service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mint_scape_types::{ErrorKind, ValidationError};
use std::fmt;

/// Mint service error type. Every variant carries the collaborator's message.
#[derive(Debug, Clone)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// No wallet available to connect.
    ProviderMissing(String),
    /// The wallet refused to unlock.
    UserRejected(String),
    /// Empty prompt or empty name.
    Validation(String),
    /// Image generation request failed.
    Generation(String),
    /// Generation succeeded but returned no artifact.
    GenerationEmpty,
    /// Local file read failed.
    FileRead(String),
    /// Pinning service error.
    Pinning(String),
    /// Contract view call failed.
    ContractRead(String),
    /// Transaction could not be submitted.
    TxFailed(String),
    /// Transaction was mined with a failed status.
    TxReverted(String),
    /// Gave up waiting for a receipt.
    TxTimeout(String),
    /// Action requested before its inputs exist.
    InvalidState(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::ProviderMissing(_) => ErrorKind::ProviderMissing,
            Error::UserRejected(_) => ErrorKind::UserRejected,
            Error::Validation(_) => ErrorKind::ValidationFailed,
            Error::Generation(_) => ErrorKind::GenerationFailed,
            Error::GenerationEmpty => ErrorKind::GenerationEmpty,
            Error::FileRead(_) => ErrorKind::ReadError,
            Error::Pinning(_) => ErrorKind::PinningFailed,
            Error::ContractRead(_) => ErrorKind::ContractReadError,
            Error::TxFailed(_) => ErrorKind::TxFailed,
            Error::TxReverted(_) => ErrorKind::TxReverted,
            Error::TxTimeout(_) => ErrorKind::TxTimeout,
            Error::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// Provider-reported "collection already exists". There is no distinct
    /// error code, so this matches on the message text.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Error::TxFailed(msg) | Error::TxReverted(msg) | Error::ContractRead(msg) => {
                msg.to_ascii_lowercase().contains("already exists")
            }
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::ProviderMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::UserRejected(_) => StatusCode::FORBIDDEN,
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::FileRead(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidState(_) => StatusCode::CONFLICT,
            Error::Generation(_)
            | Error::GenerationEmpty
            | Error::Pinning(_)
            | Error::ContractRead(_)
            | Error::TxFailed(_)
            | Error::TxReverted(_) => StatusCode::BAD_GATEWAY,
            Error::TxTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::ProviderMissing(msg) => write!(f, "wallet unavailable: {msg}"),
            Error::UserRejected(msg) => write!(f, "wallet connection rejected: {msg}"),
            Error::Validation(msg) => write!(f, "{msg}"),
            Error::Generation(msg) => write!(f, "image generation failed: {msg}"),
            Error::GenerationEmpty => write!(f, "image generation returned no image"),
            Error::FileRead(msg) => write!(f, "could not read file: {msg}"),
            Error::Pinning(msg) => write!(f, "pinning failed: {msg}"),
            Error::ContractRead(msg) => write!(f, "contract read failed: {msg}"),
            Error::TxFailed(msg) => write!(f, "transaction failed: {msg}"),
            Error::TxReverted(msg) => write!(f, "transaction reverted: {msg}"),
            Error::TxTimeout(msg) => write!(f, "transaction timed out: {msg}"),
            Error::InvalidState(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "success": false,
            "kind": self.kind(),
            "error": self.to_string()
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_pattern() {
        let err = Error::TxFailed("execution reverted: Collection already exists".into());
        assert!(err.is_already_exists());
        let err = Error::TxFailed("execution reverted: Collection Already Exists".into());
        assert!(err.is_already_exists());
        assert!(!Error::TxFailed("insufficient funds".into()).is_already_exists());
        assert!(!Error::Pinning("already exists".into()).is_already_exists());
    }

    #[test]
    fn test_validation_maps_to_kind() {
        let err: Error = mint_scape_types::require_non_empty("name", " ")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(err.to_string(), "name must not be empty");
    }
}
