//! Response types for the mint API.

use crate::orchestrator::FlowState;
use serde::Serialize;

/// Success envelope. Errors are rendered by [`crate::Error`].
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Response from the health endpoint.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub flow_state: FlowState,
    pub uptime_secs: u64,
    pub requests: u64,
}

#[derive(Serialize)]
pub struct PriceResponse {
    pub collection: String,
    /// Ether, decimal string.
    pub mint_price: String,
    pub mint_price_wei: String,
}

#[derive(Serialize)]
pub struct AffordResponse {
    pub collection: String,
    pub can_afford: bool,
}

#[derive(Serialize)]
pub struct OwnerTokensResponse<T: Serialize> {
    pub owner: String,
    pub tokens: Vec<T>,
}
