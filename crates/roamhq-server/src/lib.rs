//! RoamHQ console HTTP server.
//!
//! Wires the core token codec and task catalog into an Axum API under
//! `/api/*`, backed by the AWS ECS API for listing and launching scheduled
//! tasks.

pub mod config;
pub mod ecs;
pub mod error;
pub mod routes;
pub mod state;
