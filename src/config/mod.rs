//! Configuration management for LeadScout Core

use anyhow::{Context, Result};
use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server host
    pub http_host: String,
    /// HTTP server port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Superadmin provisioning configuration
    pub superadmin: SuperadminConfig,
    /// Scraper engine configuration
    pub engine: EngineConfig,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

/// Provisioning identity for the bootstrap procedure. The password is a
/// deployment secret and is only consumed when the superadmin account does
/// not exist yet.
#[derive(Debug, Clone)]
pub struct SuperadminConfig {
    pub email: String,
    pub password: String,
}

/// Remote lead-scraper service
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            http_host: env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("Invalid HTTP_PORT")?,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .unwrap_or(10),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .unwrap_or_else(|_| "2".to_string())
                    .parse()
                    .unwrap_or(2),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").context("JWT_SECRET is required")?,
                issuer: env::var("JWT_ISSUER")
                    .unwrap_or_else(|_| "https://leadscout.local".to_string()),
                // Access tokens live for a day, refresh tokens for 30 days.
                access_token_ttl_secs: env::var("JWT_ACCESS_TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "86400".to_string())
                    .parse()
                    .unwrap_or(86400),
                refresh_token_ttl_secs: env::var("JWT_REFRESH_TOKEN_TTL_SECS")
                    .unwrap_or_else(|_| "2592000".to_string())
                    .parse()
                    .unwrap_or(2592000),
            },
            superadmin: SuperadminConfig {
                email: env::var("SUPERADMIN_EMAIL")
                    .unwrap_or_else(|_| "admin@leadscout.local".to_string()),
                password: env::var("SUPERADMIN_PASSWORD")
                    .context("SUPERADMIN_PASSWORD is required")?,
            },
            engine: EngineConfig {
                base_url: env::var("ENGINE_URL")
                    .unwrap_or_else(|_| "http://localhost:8090".to_string()),
                timeout_secs: env::var("ENGINE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .unwrap_or(300),
            },
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        })
    }

    /// HTTP bind address
    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.http_host, self.http_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            database: DatabaseConfig {
                url: "postgresql://localhost/leadscout_test".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                issuer: "https://leadscout.test".to_string(),
                access_token_ttl_secs: 86400,
                refresh_token_ttl_secs: 2592000,
            },
            superadmin: SuperadminConfig {
                email: "admin@leadscout.test".to_string(),
                password: "provisioning-secret".to_string(),
            },
            engine: EngineConfig {
                base_url: "http://localhost:8090".to_string(),
                timeout_secs: 300,
            },
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }

    #[test]
    fn test_http_addr() {
        let config = test_config();
        assert_eq!(config.http_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_default_ttls_cover_design_windows() {
        let config = test_config();
        assert_eq!(config.jwt.access_token_ttl_secs, 86400); // 24h
        assert_eq!(config.jwt.refresh_token_ttl_secs, 2592000); // 30d
    }
}
