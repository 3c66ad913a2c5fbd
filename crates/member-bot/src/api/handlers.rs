//! HTTP request handlers.

use super::middleware::secrets_match;
use super::types::{
    AdjustPointsRequest, AdjustPointsResponse, ExclusionRequest, HealthResponse, MemberResponse,
    PointsOperation, WebhookResponse,
};
use super::AppState;
use crate::error::AppError;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use member_store::{LedgerMemo, Member, MemberCode};
use telegram_client::{BotMessage, Update};
use tracing::{debug, error, info, warn};

/// Header Telegram uses to echo the webhook secret.
pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Ledger reference for adjustments made from the admin API.
pub const ADMIN_ADJUSTMENT_REFERENCE: &str = "admin_qr_adjustment";

/// Ledger log line for adjustments made from the admin API.
pub const ADMIN_ADJUSTMENT_ENTRY: &str = "Adjusted by Admin via QR Code Scan";

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        members: state.store.count().await,
        telegram_configured: state.telegram_configured,
    })
}

/// Telegram webhook.
///
/// Authenticates the request, extracts and sanitizes the message, and runs
/// the dispatcher to completion before answering.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<WebhookResponse>) {
    if !state.telegram_configured {
        error!("Telegram bot token is not set; webhook processing halted");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(WebhookResponse::error("Configuration error on server")),
        );
    }

    if let Some(expected) = state.webhook_secret.as_deref() {
        let received = headers
            .get(SECRET_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok());
        if !secrets_match(expected, received) {
            warn!("Invalid webhook secret token; request denied");
            return (
                StatusCode::FORBIDDEN,
                Json(WebhookResponse::error("Forbidden")),
            );
        }
    }

    let message = serde_json::from_slice::<Update>(&body)
        .ok()
        .and_then(|update| {
            debug!(update_id = update.update_id, "Webhook update received");
            BotMessage::from_update(&update)
        });

    let Some(message) = message else {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookResponse::error("Invalid message format")),
        );
    };

    state.dispatcher.dispatch(&message).await;

    (StatusCode::OK, Json(WebhookResponse::ok()))
}

async fn find_member(state: &AppState, code: &str) -> Result<Member, AppError> {
    let code: MemberCode = code.parse().map_err(|_| AppError::InvalidMember)?;
    state
        .store
        .find_by_telegram_id(code.telegram_id())
        .await
        .ok_or_else(|| AppError::MemberNotFound(code.to_string()))
}

/// Look up the member behind a scanned card.
pub async fn get_member(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<MemberResponse>, AppError> {
    let member = find_member(&state, &code).await?;
    Ok(Json(member.into()))
}

/// Include or exclude a member from the points ledger.
pub async fn set_exclusion(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<ExclusionRequest>,
) -> Result<Json<MemberResponse>, AppError> {
    let member = find_member(&state, &code).await?;
    let updated = state.store.set_excluded(member.id, request.excluded).await?;

    info!(
        member_id = updated.id,
        excluded = updated.excluded,
        "Member exclusion changed by admin"
    );
    Ok(Json(updated.into()))
}

/// Credit or debit points for a scanned member.
pub async fn adjust_points(
    State(state): State<AppState>,
    Json(request): Json<AdjustPointsRequest>,
) -> Result<Json<AdjustPointsResponse>, AppError> {
    let code: MemberCode = request
        .member
        .as_deref()
        .ok_or(AppError::InvalidMember)?
        .parse()
        .map_err(|_| AppError::InvalidMember)?;

    let operation = request
        .operation
        .as_deref()
        .and_then(PointsOperation::parse)
        .ok_or(AppError::InvalidOperation)?;

    let points = request
        .points
        .map(i64::saturating_abs)
        .filter(|p| *p > 0)
        .ok_or(AppError::InvalidPoints)?;

    let member = state
        .store
        .find_by_telegram_id(code.telegram_id())
        .await
        .ok_or_else(|| AppError::MemberNotFound(code.to_string()))?;

    let memo =
        LedgerMemo::new(ADMIN_ADJUSTMENT_REFERENCE, ADMIN_ADJUSTMENT_ENTRY).with_actor("admin");
    let entry = match operation {
        PointsOperation::Add => state.store.credit(member.id, points, memo).await,
        PointsOperation::Deduct => state.store.debit(member.id, points, memo).await,
    }
    .map_err(|e| {
        warn!(
            member_id = member.id,
            ?operation,
            points,
            "Points adjustment rejected: {}",
            e
        );
        AppError::from(e)
    })?;

    let message = format!(
        "Success! {} points were {} for user ID {}.",
        points,
        operation.past_tense(),
        member.telegram_id
    );
    info!(
        member_id = member.id,
        delta = entry.delta,
        balance = entry.balance_after,
        "Points adjusted by admin"
    );

    Ok(Json(AdjustPointsResponse {
        message,
        balance: entry.balance_after,
    }))
}
