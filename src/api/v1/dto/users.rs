/*
 * Responsibility
 * - Users response DTO
 */
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    /// Whether `id` is the authenticated caller.
    pub is_caller: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
}
