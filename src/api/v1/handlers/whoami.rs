/*
 * Responsibility
 * - GET /api/v1/whoami
 * - echo the identity the handler chain attached (unset / denied / identity)
 */
use axum::{Extension, Json};

use crate::api::v1::dto::whoami::WhoAmIResponse;
use crate::request::IdentitySlot;

pub async fn whoami(slot: Option<Extension<IdentitySlot>>) -> Json<WhoAmIResponse> {
    let slot = slot.map(|Extension(slot)| slot).unwrap_or_default();

    Json(WhoAmIResponse {
        caller_id: slot.caller_id().map(str::to_string),
        access_token: slot,
    })
}
