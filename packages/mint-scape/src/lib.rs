//! # Mint Scape
//!
//! Turns an uploaded or AI-generated image into an NFT: the image and its
//! metadata are pinned to IPFS, the target collection is created on demand,
//! and the token is minted through the connected wallet.
//!
//! ## Quick Start
//! ```bash
//! cargo run --bin mint-scape -- init-wallet
//! MINT_SCAPE_CONTRACT_ADDRESS=0x... cargo run --bin mint-scape
//! ```
//!
//! ## Endpoints
//! - `GET /state` - Current flow snapshot
//! - `POST /connect`, `POST /image/generate`, `PUT /details`, `POST /mint`
//! - `GET /collections/{name}/price` and other contract reads
//! - `/admin/*` - Owner-only contract writes, guarded by `MINT_SCAPE_API_KEY`

pub mod config;
pub mod contract;
mod error;
mod handlers;
pub mod image;
pub mod key_store;
pub mod metrics;
pub mod middleware;
pub mod orchestrator;
pub mod pinning;
mod response;
mod router;
mod state;
#[cfg(test)]
mod testing;
pub mod wallet;

pub use config::Config;
pub use error::Error;
pub use router::create as create_router;
pub use state::AppState;
