use serde::Serialize;

use crate::request::IdentitySlot;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoAmIResponse {
    pub access_token: IdentitySlot,
    pub caller_id: Option<String>,
}
