//! Server configuration for the RoamHQ console.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Missing credentials never abort startup; the routes that need them answer
//! `503` instead.

use std::fmt;
use std::net::SocketAddr;

use serde::Serialize;

/// Region the scheduled-task cluster lives in.
const DEFAULT_REGION: &str = "ap-southeast-2";

const DEFAULT_CLUSTER: &str = "roamhq-cronus-cluster";

const DEFAULT_SUBNETS: &[&str] = &[
    "subnet-06397f45767bd8d3a",
    "subnet-0812950e351bcce27",
    "subnet-02efc7196b23129a6",
];

const DEFAULT_SECURITY_GROUPS: &[&str] = &["sg-0068aaf1f29f83c24"];

/// Server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Shared secret for DNS client tokens.
    pub token_secret: Option<String>,
    /// Console administrator login.
    pub admin: Option<AdminCredentials>,
    /// Static AWS credentials for the ECS API.
    pub aws: Option<AwsCredentials>,
    /// Where scheduled tasks run.
    pub placement: EcsPlacement,
}

/// Username and password for the admin console.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    pub password: String,
}

/// An AWS access key pair.
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Network placement attached to every catalog entry, so the console can
/// send it back unchanged when launching a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcsPlacement {
    pub cluster: String,
    pub region: String,
    pub subnets: Vec<String>,
    pub security_groups: Vec<String>,
    pub assign_public_ip: bool,
}

impl Default for EcsPlacement {
    fn default() -> Self {
        Self {
            cluster: DEFAULT_CLUSTER.to_owned(),
            region: DEFAULT_REGION.to_owned(),
            subnets: DEFAULT_SUBNETS.iter().map(|s| (*s).to_owned()).collect(),
            security_groups: DEFAULT_SECURITY_GROUPS
                .iter()
                .map(|s| (*s).to_owned())
                .collect(),
            assign_public_ip: true,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on (binds to `0.0.0.0`)
    /// - `ROAMHQ_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:8788`)
    /// - `ROAMHQ_LOG_LEVEL` — log filter (default: `info`)
    /// - `DNS_SECRET_KEY` — token secret (token routes disabled when unset)
    /// - `ADMIN_USERNAME` / `ADMIN_PASSWORD` — admin login (login disabled when unset)
    /// - `AWS_ACCESS_KEY_ID` / `AWS_SECRET_ACCESS_KEY` — ECS credentials
    /// - `ROAMHQ_ECS_CLUSTER` — cluster for catalog entries (default: `roamhq-cronus-cluster`)
    /// - `ROAMHQ_ECS_REGION` — region to list and run in (default: `ap-southeast-2`)
    /// - `ROAMHQ_ECS_SUBNETS` — comma-separated subnet IDs
    /// - `ROAMHQ_ECS_SECURITY_GROUPS` — comma-separated security group IDs
    /// - `ROAMHQ_ECS_ASSIGN_PUBLIC_IP` — assign a public IP (default: `true`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        // Priority: ROAMHQ_BIND_ADDR > PORT > default 127.0.0.1:8788
        let bind_addr = if let Some(addr) = var("ROAMHQ_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8788)))
        } else if let Some(port_str) = var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(8788);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 8788))
        };

        let log_level = var("ROAMHQ_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let token_secret = var("DNS_SECRET_KEY");

        let admin = match (var("ADMIN_USERNAME"), var("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminCredentials { username, password }),
            _ => None,
        };

        let aws = match (var("AWS_ACCESS_KEY_ID"), var("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
                access_key_id,
                secret_access_key,
            }),
            _ => None,
        };

        let defaults = EcsPlacement::default();
        let placement = EcsPlacement {
            cluster: var("ROAMHQ_ECS_CLUSTER").unwrap_or(defaults.cluster),
            region: var("ROAMHQ_ECS_REGION").unwrap_or(defaults.region),
            subnets: var("ROAMHQ_ECS_SUBNETS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.subnets),
            security_groups: var("ROAMHQ_ECS_SECURITY_GROUPS")
                .map(|v| split_list(&v))
                .unwrap_or(defaults.security_groups),
            assign_public_ip: var("ROAMHQ_ECS_ASSIGN_PUBLIC_IP")
                .map_or(defaults.assign_public_ip, |v| v != "false" && v != "0"),
        };

        Self {
            bind_addr,
            log_level,
            token_secret,
            admin,
            aws,
            placement,
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "[REDACTED]"))
            .field("admin", &self.admin)
            .field("aws", &self.aws)
            .field("placement", &self.placement)
            .finish()
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}
