//! Server configuration loaded from environment variables.
//!
//! All settings have sensible defaults so the server can start with zero
//! configuration for local development.

use std::net::SocketAddr;
use std::path::PathBuf;

use manch_shared::constants::MAX_OBJECT_SIZE;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address for the HTTP (axum) API server.
    /// Env: `HTTP_ADDR`
    /// Default: `0.0.0.0:8080`
    pub http_addr: SocketAddr,

    /// Filesystem path of the document database.
    /// Env: `DATABASE_PATH`
    /// Default: none (platform data directory).
    pub database_path: Option<PathBuf>,

    /// Filesystem path where uploaded assets are stored.
    /// Env: `ASSET_STORAGE_PATH`
    /// Default: `./assets`
    pub asset_storage_path: PathBuf,

    /// Public address prefix under which assets are served.
    /// Env: `PUBLIC_BASE_URL`
    /// Default: `http://localhost:8080/assets`
    pub public_base_url: String,

    /// Email of the single admin principal.
    /// Env: `ADMIN_EMAIL`
    /// Default: `admin@manch.local`
    pub admin_email: String,

    /// Admin password (hashed at startup).
    /// Env: `ADMIN_PASSWORD`
    /// Default: `"manch-dev"` (development only).
    pub admin_password: String,

    /// Pre-hashed admin password (blake3, 64 hex chars).  Takes
    /// precedence over `ADMIN_PASSWORD` so production deployments never
    /// put the plaintext in the environment.
    /// Env: `ADMIN_PASSWORD_DIGEST`
    pub admin_password_digest: Option<[u8; 32]>,

    /// Human-readable name for this instance.
    /// Env: `INSTANCE_NAME`
    /// Default: `"Manch Admin"`
    pub instance_name: String,

    /// Maximum asset upload size in bytes (50 MiB).
    pub max_asset_size: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: ([0, 0, 0, 0], 8080).into(),
            database_path: None,
            asset_storage_path: PathBuf::from("./assets"),
            public_base_url: "http://localhost:8080/assets".to_string(),
            admin_email: "admin@manch.local".to_string(),
            admin_password: "manch-dev".to_string(),
            admin_password_digest: None,
            instance_name: "Manch Admin".to_string(),
            max_asset_size: MAX_OBJECT_SIZE,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("HTTP_ADDR") {
            if let Ok(parsed) = addr.parse::<SocketAddr>() {
                config.http_addr = parsed;
            } else {
                tracing::warn!(value = %addr, "Invalid HTTP_ADDR, using default");
            }
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("ASSET_STORAGE_PATH") {
            config.asset_storage_path = PathBuf::from(path);
        }

        if let Ok(url) = std::env::var("PUBLIC_BASE_URL") {
            config.public_base_url = url;
        }

        if let Ok(email) = std::env::var("ADMIN_EMAIL") {
            config.admin_email = email;
        }

        if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
            config.admin_password = password;
        }

        if let Ok(hex_digest) = std::env::var("ADMIN_PASSWORD_DIGEST") {
            match parse_hex_digest(&hex_digest) {
                Ok(digest) => config.admin_password_digest = Some(digest),
                Err(e) => {
                    tracing::warn!(error = %e, "Invalid ADMIN_PASSWORD_DIGEST, ignoring");
                }
            }
        }

        if let Ok(name) = std::env::var("INSTANCE_NAME") {
            config.instance_name = name;
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter,
        // so we do not store it here.

        config
    }
}

/// Parse a 64-character hex string into a 32-byte digest.
fn parse_hex_digest(hex_str: &str) -> Result<[u8; 32], String> {
    let hex_str = hex_str.trim();
    if hex_str.len() != 64 {
        return Err(format!("expected 64 hex chars, got {}", hex_str.len()));
    }

    let bytes = hex::decode(hex_str).map_err(|e| format!("invalid hex: {e}"))?;
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&bytes);
    Ok(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr, ([0, 0, 0, 0], 8080).into());
        assert_eq!(config.max_asset_size, 50 * 1024 * 1024);
        assert!(config.admin_password_digest.is_none());
    }

    #[test]
    fn test_parse_hex_digest() {
        let hex_str = "ab".repeat(32);
        let digest = parse_hex_digest(&hex_str).unwrap();
        assert_eq!(digest, [0xab; 32]);
    }

    #[test]
    fn test_parse_hex_digest_wrong_length() {
        assert!(parse_hex_digest("abcd").is_err());
    }
}
