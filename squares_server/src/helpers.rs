use actix_web::HttpRequest;
use log::*;
use serde::de::DeserializeOwned;

use crate::{config::AdminToken, errors::ServerError};

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

/// Checks the `X-Admin-Token` header against the configured admin token.
pub fn check_admin_token(req: &HttpRequest, token: &AdminToken) -> Result<(), ServerError> {
    let candidate = req.headers().get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok()).unwrap_or_default();
    if token.accepts(candidate) {
        Ok(())
    } else {
        let peer = req.connection_info().peer_addr().map(|a| a.to_string()).unwrap_or_else(|| "unknown".into());
        warn!("💻️ Rejected admin request to {} from {peer}", req.path());
        Err(ServerError::AdminTokenRequired)
    }
}

/// Parses an optional JSON body. An empty body is `None`; anything else must be valid.
pub fn optional_json<T: DeserializeOwned>(body: &[u8]) -> Result<Option<T>, ServerError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(|e| {
        debug!("💻️ Could not deserialize request body. {e}");
        ServerError::InvalidRequestBody(e.to_string())
    })
}
