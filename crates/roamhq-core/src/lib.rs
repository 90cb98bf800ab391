//! Core library for the RoamHQ console.
//!
//! Contains the DNS client token codec and the ECS task-definition catalog
//! parser. Both are pure and synchronous: this crate performs no I/O and
//! knows nothing about HTTP, databases, or the AWS SDK.

pub mod error;
pub mod tasks;
pub mod token;
