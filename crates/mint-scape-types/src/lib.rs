//! Shared types and pure-logic utilities for Mint Scape.
//! No network dependency; usable by every adapter and by tests.

mod details;
mod error;
mod locator;
mod metadata;
mod validation;

pub use details::{DEFAULT_COLLECTION, MintDetails, SourceMode};
pub use error::ErrorKind;
pub use locator::Locator;
pub use metadata::{
    Attribute, NOT_APPLICABLE, NftMetadata, PROMPT_TRAIT, PROVENANCE_TRAIT,
    build_metadata_document,
};
pub use validation::{ValidationError, require_non_empty};
