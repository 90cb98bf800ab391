//! Admin console login: `/api/admin`

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::AdminCredentials;
use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api/admin` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", post(login))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Check a login against the configured admin pair.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<&'static str, AppError> {
    let granted = state
        .admin
        .as_ref()
        .is_some_and(|admin| credentials_match(admin, &body));

    if granted {
        info!(username = %body.username, "admin login granted");
        Ok("Granted")
    } else {
        warn!(username = %body.username, "admin login denied");
        Err(AppError::Unauthorized("invalid credentials".to_owned()))
    }
}

fn credentials_match(admin: &AdminCredentials, attempt: &LoginRequest) -> bool {
    let user_ok = admin.username.as_bytes().ct_eq(attempt.username.as_bytes());
    let pass_ok = admin.password.as_bytes().ct_eq(attempt.password.as_bytes());
    bool::from(user_ok & pass_ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> AdminCredentials {
        AdminCredentials {
            username: "ops".to_owned(),
            password: "correct horse".to_owned(),
        }
    }

    fn attempt(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    #[test]
    fn exact_pair_matches() {
        assert!(credentials_match(&admin(), &attempt("ops", "correct horse")));
    }

    #[test]
    fn either_half_wrong_fails() {
        assert!(!credentials_match(&admin(), &attempt("ops", "wrong")));
        assert!(!credentials_match(&admin(), &attempt("root", "correct horse")));
        assert!(!credentials_match(&admin(), &attempt("", "")));
        assert!(!credentials_match(&admin(), &attempt("ops", "correct horse ")));
    }
}
