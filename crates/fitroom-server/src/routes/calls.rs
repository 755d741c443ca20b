//! REST handlers for the call lifecycle.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use fitroom_core::call::{
    BrowseUpdate, BrowsingState, Call, CartAction, ControlRequest, Controller, SortBy, SortOrder,
};
use fitroom_core::ports::Product;

use crate::error::{ApiError, Json};
use crate::state::{AppState, UserId};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartCallResponse {
    pub call_id: String,
    pub host_id: String,
    pub participants: usize,
}

pub async fn start_call(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    UserId(user_id): UserId,
) -> Result<(StatusCode, Json<StartCallResponse>), ApiError> {
    let call = state.calls.start_call(&room_id, &user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(StartCallResponse {
            call_id: call.id.clone(),
            host_id: call.host_id.clone(),
            participants: call.active_participant_count(),
        }),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCallResponse {
    pub participant_count: usize,
    pub current_controller: Controller,
}

pub async fn join_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
) -> Result<Json<JoinCallResponse>, ApiError> {
    let call = state.calls.join_call(&call_id, &user_id).await?;
    Ok(Json(JoinCallResponse {
        participant_count: call.active_participant_count(),
        current_controller: call.current_controller.clone(),
    }))
}

#[derive(Serialize)]
pub struct CallResponse {
    pub call: Call,
}

pub async fn leave_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
) -> Result<Json<CallResponse>, ApiError> {
    let call = state.calls.leave_call(&call_id, &user_id).await?;
    Ok(Json(CallResponse { call }))
}

pub async fn end_call(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
) -> Result<Json<CallResponse>, ApiError> {
    let call = state.calls.end_call(&call_id, &user_id).await?;
    Ok(Json(CallResponse { call }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub is_muted: Option<bool>,
    pub is_speaking: Option<bool>,
}

pub async fn update_participant_status(
    State(state): State<AppState>,
    Path((call_id, target_user_id)): Path<(String, String)>,
    UserId(user_id): UserId,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<CallResponse>, ApiError> {
    let call = state
        .calls
        .update_participant_status(
            &call_id,
            &user_id,
            &target_user_id,
            payload.is_muted,
            payload.is_speaking,
        )
        .await?;
    Ok(Json(CallResponse { call }))
}

#[derive(Deserialize)]
pub struct RequestControlRequest {
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestControlResponse {
    pub pending_requests: Vec<ControlRequest>,
}

pub async fn request_control(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
    Json(payload): Json<RequestControlRequest>,
) -> Result<Json<RequestControlResponse>, ApiError> {
    let message = payload.message.unwrap_or_default();
    let call = state
        .calls
        .request_control(&call_id, &user_id, &message)
        .await?;
    Ok(Json(RequestControlResponse {
        pending_requests: call.pending_requests().into_iter().cloned().collect(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveControlRequest {
    pub request_user_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveControlResponse {
    pub current_controller: Controller,
}

pub async fn approve_control(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
    Json(payload): Json<ResolveControlRequest>,
) -> Result<Json<ResolveControlResponse>, ApiError> {
    let call = state
        .calls
        .approve_control(&call_id, &payload.request_user_id, &user_id)
        .await?;
    Ok(Json(ResolveControlResponse {
        current_controller: call.current_controller.clone(),
    }))
}

pub async fn deny_control(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
    Json(payload): Json<ResolveControlRequest>,
) -> Result<Json<ResolveControlResponse>, ApiError> {
    let call = state
        .calls
        .deny_control(&call_id, &payload.request_user_id, &user_id)
        .await?;
    Ok(Json(ResolveControlResponse {
        current_controller: call.current_controller.clone(),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncBrowseRequest {
    pub product_id: Option<String>,
    pub scroll_position: Option<f64>,
    pub search_query: Option<String>,
    pub filters: Option<serde_json::Map<String, serde_json::Value>>,
    pub sort_by: Option<SortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<u32>,
    pub total_pages: Option<u32>,
    pub total_products: Option<u64>,
}

impl From<SyncBrowseRequest> for BrowseUpdate {
    fn from(payload: SyncBrowseRequest) -> Self {
        BrowseUpdate {
            product_id: payload.product_id,
            scroll_position: payload.scroll_position,
            search_query: payload.search_query,
            filters: payload.filters,
            sort_by: payload.sort_by,
            sort_order: payload.sort_order,
            page: payload.page,
            total_pages: payload.total_pages,
            total_products: payload.total_products,
        }
    }
}

/// The shared cursor without its logs, returned after a sync.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsingSummary {
    pub current_product_id: Option<String>,
    pub search_query: String,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_products: u64,
    pub scroll_position: f64,
    pub active_browsers: Vec<String>,
}

impl From<&BrowsingState> for BrowsingSummary {
    fn from(data: &BrowsingState) -> Self {
        Self {
            current_product_id: data.current_product_id.clone(),
            search_query: data.search_query.clone(),
            sort_by: data.sort_by,
            sort_order: data.sort_order,
            current_page: data.current_page,
            total_pages: data.total_pages,
            total_products: data.total_products,
            scroll_position: data.scroll_position,
            active_browsers: data.active_browsers.clone(),
        }
    }
}

pub async fn sync_browse(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
    Json(payload): Json<SyncBrowseRequest>,
) -> Result<Json<BrowsingSummary>, ApiError> {
    let call = state
        .calls
        .sync_browse(&call_id, &user_id, payload.into())
        .await?;
    Ok(Json(BrowsingSummary::from(&call.session_data)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub action: Option<CartAction>,
}

#[derive(Serialize)]
pub struct AddToCartResponse {
    pub product: Product,
    pub action: CartAction,
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
    Json(payload): Json<AddToCartRequest>,
) -> Result<Json<AddToCartResponse>, ApiError> {
    let action = payload.action.unwrap_or(CartAction::Added);
    let (_, product) = state
        .calls
        .add_to_cart(&call_id, &user_id, &payload.product_id, action)
        .await?;
    Ok(Json(AddToCartResponse { product, action }))
}

pub async fn browsing_state(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
) -> Result<Json<BrowsingState>, ApiError> {
    let data = state.calls.browsing_state(&call_id, &user_id).await?;
    Ok(Json(data))
}

#[derive(Serialize)]
pub struct RoomCallsResponse {
    pub calls: Vec<Call>,
}

pub async fn room_calls(
    State(state): State<AppState>,
    Path(room_id): Path<String>,
    UserId(user_id): UserId,
) -> Result<Json<RoomCallsResponse>, ApiError> {
    let calls = state.calls.room_calls(&room_id, &user_id).await?;
    Ok(Json(RoomCallsResponse { calls }))
}

pub async fn call_status(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
    UserId(user_id): UserId,
) -> Result<Json<CallResponse>, ApiError> {
    let call = state.calls.call_status(&call_id, &user_id).await?;
    Ok(Json(CallResponse { call }))
}
