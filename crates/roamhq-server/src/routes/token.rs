//! DNS client token routes: `/api/token`
//!
//! Issues a token for a client name, or resolves a token back to the client
//! it was issued for.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api/token` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(exchange))
}

// ── Request / Response types ─────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenRequest {
    pub client_name: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TokenResponse {
    Issued {
        token: String,
    },
    #[serde(rename_all = "camelCase")]
    Resolved {
        client_name: String,
    },
}

// ── Handlers ─────────────────────────────────────────────────────────

/// Encode a client name or decode a token, whichever was sent.
async fn exchange(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let client_name = body.client_name.filter(|s| !s.is_empty());
    let token = body.token.filter(|s| !s.is_empty());

    match (client_name, token) {
        (Some(client_name), None) => {
            let token = state.token_codec()?.encode(&client_name)?;
            info!(client = %client_name, "issued DNS client token");
            Ok(Json(TokenResponse::Issued { token }))
        }
        (None, Some(token)) => {
            let client_name = state.token_codec()?.decode(&token)?;
            Ok(Json(TokenResponse::Resolved { client_name }))
        }
        _ => Err(AppError::BadRequest("Invalid request".to_owned())),
    }
}
