//! HTTP request handlers.

use crate::contract::{CollectionInfo, ContractClient, TokenInfo, TxHandle, TxReceipt};
use crate::image::read_upload;
use crate::metrics::METRICS;
use crate::middleware::RequestId;
use crate::orchestrator::FlowSnapshot;
use crate::response::{
    AffordResponse, ApiResponse, HealthResponse, OwnerTokensResponse, PriceResponse,
};
use crate::state::AppState;
use crate::Error;
use alloy::primitives::utils::{format_ether, parse_ether};
use alloy::primitives::Address;
use axum::extract::{Multipart, Path, State};
use axum::response::IntoResponse;
use axum::{Extension, Json};
use mint_scape_types::{require_non_empty, MintDetails};
use serde::Deserialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

type FlowResult = Result<Json<ApiResponse<FlowSnapshot>>, Error>;

fn flow_ok(snapshot: FlowSnapshot) -> FlowResult {
    Ok(Json(ApiResponse::ok(snapshot)))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.orchestrator.snapshot().await;
    let status = if snapshot.connected { "ok" } else { "degraded" };
    Json(HealthResponse {
        status,
        wallet_address: snapshot.address,
        contract_address: state.config.contract_address.clone(),
        flow_state: snapshot.state,
        uptime_secs: state.start_time.elapsed().as_secs(),
        requests: state.request_count.load(Ordering::Relaxed),
    })
}

/// Prometheus metrics in text exposition format.
pub async fn metrics() -> impl IntoResponse {
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        METRICS.render(),
    )
}

pub async fn flow_state(State(state): State<Arc<AppState>>) -> FlowResult {
    flow_ok(state.orchestrator.snapshot().await)
}

pub async fn connect(State(state): State<Arc<AppState>>) -> FlowResult {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    flow_ok(state.orchestrator.connect().await?)
}

pub async fn disconnect(State(state): State<Arc<AppState>>) -> FlowResult {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    flow_ok(state.orchestrator.disconnect().await)
}

/// The image arrives as the `file` part of a multipart body.
pub async fn upload_image(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> FlowResult {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    flow_ok(state.orchestrator.upload(read_upload(multipart)).await?)
}

#[derive(Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
}

pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> FlowResult {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    flow_ok(state.orchestrator.generate(&request.prompt).await?)
}

pub async fn update_details(
    State(state): State<Arc<AppState>>,
    Json(details): Json<MintDetails>,
) -> FlowResult {
    flow_ok(state.orchestrator.update_details(details).await?)
}

pub async fn mint(
    State(state): State<Arc<AppState>>,
    Extension(req_id): Extension<RequestId>,
) -> FlowResult {
    state.request_count.fetch_add(1, Ordering::Relaxed);
    info!(req_id = %req_id.0, "Mint requested");
    flow_ok(state.orchestrator.mint().await?)
}

// --- Contract reads ---

pub async fn collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<CollectionInfo>>, Error> {
    let contract = state.orchestrator.contract().await?;
    Ok(Json(ApiResponse::ok(contract.get_collection(&name).await?)))
}

pub async fn collection_price(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<PriceResponse>>, Error> {
    let contract = state.orchestrator.contract().await?;
    let price = contract.get_mint_price(&name).await?;
    Ok(Json(ApiResponse::ok(PriceResponse {
        collection: name,
        mint_price: format_ether(price),
        mint_price_wei: price.to_string(),
    })))
}

pub async fn can_afford(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<AffordResponse>>, Error> {
    let contract = state.orchestrator.contract().await?;
    let can_afford = contract.can_afford_mint(&name).await?;
    Ok(Json(ApiResponse::ok(AffordResponse {
        collection: name,
        can_afford,
    })))
}

pub async fn token(
    State(state): State<Arc<AppState>>,
    Path(token_id): Path<u64>,
) -> Result<Json<ApiResponse<TokenInfo>>, Error> {
    let contract = state.orchestrator.contract().await?;
    Ok(Json(ApiResponse::ok(contract.get_token(token_id).await?)))
}

/// Token details are fetched one at a time.
pub async fn owner_tokens(
    State(state): State<Arc<AppState>>,
    Path(owner): Path<String>,
) -> Result<Json<ApiResponse<OwnerTokensResponse<TokenInfo>>>, Error> {
    let address: Address = owner
        .parse()
        .map_err(|e| Error::Validation(format!("invalid address {owner}: {e}")))?;
    let contract = state.orchestrator.contract().await?;
    let ids = contract.tokens_of(address).await?;
    let mut tokens = Vec::with_capacity(ids.len());
    for id in ids {
        tokens.push(contract.get_token(id).await?);
    }
    Ok(Json(ApiResponse::ok(OwnerTokensResponse {
        owner: address.to_string(),
        tokens,
    })))
}

// --- Admin writes ---

async fn confirm(
    contract: &dyn ContractClient,
    tx: TxHandle,
) -> Result<Json<ApiResponse<TxReceipt>>, Error> {
    let receipt = contract.await_tx(&tx).await?;
    Ok(Json(ApiResponse::ok(receipt)))
}

#[derive(Deserialize)]
pub struct PriceUpdate {
    /// Ether, decimal string.
    #[serde(default)]
    pub price: String,
}

pub async fn update_price(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Json(update): Json<PriceUpdate>,
) -> Result<Json<ApiResponse<TxReceipt>>, Error> {
    let raw = require_non_empty("price", &update.price)?;
    let price =
        parse_ether(raw).map_err(|e| Error::Validation(format!("invalid price {raw}: {e}")))?;
    let contract = state.orchestrator.contract().await?;
    info!(collection = %name, price = %raw, "Updating mint price");
    let tx = contract.update_mint_price(&name, price).await?;
    confirm(contract.as_ref(), tx).await
}

pub async fn toggle_collection(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<TxReceipt>>, Error> {
    let contract = state.orchestrator.contract().await?;
    info!(collection = %name, "Toggling collection");
    let tx = contract.toggle_collection(&name).await?;
    confirm(contract.as_ref(), tx).await
}

pub async fn withdraw(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<TxReceipt>>, Error> {
    let contract = state.orchestrator.contract().await?;
    info!("Withdrawing contract balance");
    let tx = contract.withdraw().await?;
    confirm(contract.as_ref(), tx).await
}
