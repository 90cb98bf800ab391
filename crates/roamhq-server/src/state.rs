//! Shared application state for the RoamHQ console server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`.

use std::sync::Arc;

use roamhq_core::token::TokenCodec;
use tracing::{info, warn};

use crate::config::{AdminCredentials, EcsPlacement, ServerConfig};
use crate::ecs::{AwsEcsGateway, EcsGateway};
use crate::error::AppError;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// DNS client token codec (None if `DNS_SECRET_KEY` is unset).
    pub token_codec: Option<TokenCodec>,
    /// Admin console login (None if not configured).
    pub admin: Option<AdminCredentials>,
    /// ECS API access (None if AWS credentials are unset).
    pub ecs: Option<Arc<dyn EcsGateway>>,
    /// Network placement attached to catalog entries.
    pub placement: EcsPlacement,
}

impl AppState {
    /// Build state from configuration, wiring the AWS-backed ECS gateway.
    #[must_use]
    pub fn from_config(config: &ServerConfig) -> Self {
        let token_codec = config
            .token_secret
            .as_deref()
            .map(TokenCodec::new);
        if token_codec.is_none() {
            warn!("DNS_SECRET_KEY not set; token routes disabled");
        }

        if config.admin.is_none() {
            warn!("admin credentials not set; admin login disabled");
        }

        let ecs = config.aws.as_ref().map(|aws| {
            info!(region = %config.placement.region, "ECS gateway enabled");
            Arc::new(AwsEcsGateway::new(&aws.access_key_id, &aws.secret_access_key))
                as Arc<dyn EcsGateway>
        });
        if ecs.is_none() {
            warn!("AWS credentials not set; ECS routes disabled");
        }

        Self {
            token_codec,
            admin: config.admin.clone(),
            ecs,
            placement: config.placement.clone(),
        }
    }

    /// The token codec, or `NotConfigured` if there is no secret.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotConfigured`] when `DNS_SECRET_KEY` is unset.
    pub fn token_codec(&self) -> Result<&TokenCodec, AppError> {
        self.token_codec
            .as_ref()
            .ok_or(AppError::NotConfigured("token secret not configured"))
    }

    /// The ECS gateway, or `NotConfigured` if there are no AWS credentials.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotConfigured`] when AWS credentials are unset.
    pub fn ecs_gateway(&self) -> Result<Arc<dyn EcsGateway>, AppError> {
        self.ecs
            .clone()
            .ok_or(AppError::NotConfigured("AWS credentials not configured"))
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
