//! Configuration for Archway
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Archway - identity and access gateway for the community artifact archive
#[derive(Parser, Debug, Clone)]
#[command(name = "archway")]
#[command(about = "Identity and access gateway for the community artifact archive")]
pub struct Args {
    /// Unique node identifier for this gateway instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "archway")]
    pub mongodb_db: String,

    /// Base URL of the blob storage service
    /// (e.g., "http://localhost:8091")
    #[arg(long, env = "STORAGE_URL")]
    pub storage_url: Option<String>,

    /// Storage bucket for uploaded artifacts
    #[arg(long, env = "STORAGE_BUCKET", default_value = "uploads")]
    pub storage_bucket: String,

    /// Comma-separated wallet addresses of privileged operators
    /// Loaded once at startup; membership is immutable for the process lifetime
    #[arg(long, env = "OPERATOR_WALLETS", default_value = "")]
    pub operator_wallets: String,

    /// Comma-separated social-login subject ids of privileged operators
    #[arg(long, env = "OPERATOR_SOCIAL_IDS", default_value = "")]
    pub operator_social_ids: String,

    /// Enable development mode (MongoDB and storage become optional)
    #[arg(long, env = "DEV_MODE", default_value = "false", action = clap::ArgAction::Set)]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Request timeout in milliseconds for outbound storage calls
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Maximum attempts for a registry fetch before reporting unavailability
    #[arg(long, env = "REGISTRY_MAX_ATTEMPTS", default_value = "2")]
    pub registry_max_attempts: u32,

    /// Delay between registry retry attempts, in milliseconds
    #[arg(long, env = "REGISTRY_RETRY_DELAY_MS", default_value = "250")]
    pub registry_retry_delay_ms: u64,
}

impl Args {
    /// Parse a comma-separated list argument into trimmed, non-empty entries
    fn split_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Operator wallet addresses from config (not yet case-normalized)
    pub fn operator_wallet_list(&self) -> Vec<String> {
        Self::split_list(&self.operator_wallets)
    }

    /// Operator social-login subject ids from config
    pub fn operator_social_list(&self) -> Vec<String> {
        Self::split_list(&self.operator_social_ids)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.storage_url.is_none() {
            return Err("STORAGE_URL is required in production mode".to_string());
        }

        for wallet in self.operator_wallet_list() {
            if !wallet.starts_with("0x") {
                return Err(format!(
                    "OPERATOR_WALLETS entry '{}' is not a 0x-prefixed address",
                    wallet
                ));
            }
        }

        if self.registry_max_attempts == 0 {
            return Err("REGISTRY_MAX_ATTEMPTS must be at least 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_from(wallets: &str, socials: &str) -> Args {
        Args::parse_from([
            "archway",
            "--dev-mode",
            "true",
            "--operator-wallets",
            wallets,
            "--operator-social-ids",
            socials,
        ])
    }

    #[test]
    fn test_list_parsing() {
        let args = args_from("0xAbC, 0xDeF ,", "123,  456");
        assert_eq!(args.operator_wallet_list(), vec!["0xAbC", "0xDeF"]);
        assert_eq!(args.operator_social_list(), vec!["123", "456"]);
    }

    #[test]
    fn test_empty_lists() {
        let args = args_from("", "");
        assert!(args.operator_wallet_list().is_empty());
        assert!(args.operator_social_list().is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_wallet() {
        let args = args_from("not-a-wallet", "");
        assert!(args.validate().is_err());
    }
}
