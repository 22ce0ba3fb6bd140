//! Process-wide configuration, read once from the environment at startup and
//! never mutated afterwards.

use std::path::PathBuf;

use argon2::PasswordHash;
use thiserror::Error;
use tracing::warn;

use crate::auth::hash_password;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "your-default-secret-key-change-this",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("FOLIO_JWT_SECRET is unset")]
    MissingSecret,
    #[error("FOLIO_JWT_SECRET is still a placeholder value")]
    PlaceholderSecret,
    #[error("neither FOLIO_ADMIN_PASSWORD_HASH nor FOLIO_ADMIN_PASSWORD is set")]
    MissingAdminPassword,
    #[error("FOLIO_ADMIN_PASSWORD_HASH is not a valid PHC string: {0}")]
    InvalidPasswordHash(String),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub folder: String,
}

#[derive(Clone)]
pub enum StorageConfig {
    /// Write into `Config::upload_dir`, served under `/uploads`.
    Local,
    Cloudinary(CloudinaryConfig),
}

#[derive(Clone)]
pub struct Config {
    pub jwt_secret: String,
    /// Argon2 PHC string of the single admin password.
    pub admin_password_hash: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Prefix for URLs of locally stored uploads, without trailing slash.
    pub public_base_url: String,
    pub upload_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    pub storage: StorageConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("FOLIO_JWT_SECRET").ok_or(ConfigError::MissingSecret)?;
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::PlaceholderSecret);
        }

        let admin_password_hash = match (var("FOLIO_ADMIN_PASSWORD_HASH"), var("FOLIO_ADMIN_PASSWORD")) {
            (Some(hash), _) => {
                PasswordHash::new(&hash)
                    .map_err(|e| ConfigError::InvalidPasswordHash(e.to_string()))?;
                hash
            }
            (None, Some(plain)) => {
                hash_password(&plain).map_err(|e| ConfigError::InvalidPasswordHash(e.to_string()))?
            }
            (None, None) => return Err(ConfigError::MissingAdminPassword),
        };

        let port = match var("FOLIO_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "FOLIO_PORT",
                value: raw,
            })?,
            None => 8000,
        };

        let public_base_url = var("FOLIO_PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port))
            .trim_end_matches('/')
            .to_string();

        let mut allowed_origins =
            vec![var("FRONTEND_URL").unwrap_or_else(|| "http://localhost:5173".into())];
        if let Some(extra) = var("ALLOWED_ORIGINS") {
            allowed_origins.extend(
                extra
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty()),
            );
        }

        let storage = match (
            var("CLOUDINARY_CLOUD_NAME"),
            var("CLOUDINARY_API_KEY"),
            var("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => {
                StorageConfig::Cloudinary(CloudinaryConfig {
                    cloud_name,
                    api_key,
                    api_secret,
                    folder: var("CLOUDINARY_FOLDER").unwrap_or_else(|| "portfolio".into()),
                })
            }
            (None, None, None) => StorageConfig::Local,
            (cloud_name, api_key, api_secret) => {
                warn!(
                    cloud_name = cloud_name.is_some(),
                    api_key = api_key.is_some(),
                    api_secret = api_secret.is_some(),
                    "Cloudinary credentials incomplete, falling back to local uploads"
                );
                StorageConfig::Local
            }
        };

        Ok(Self {
            jwt_secret,
            admin_password_hash,
            db_path: var("FOLIO_DB_PATH").unwrap_or_else(|| "folio.db".into()).into(),
            host: var("FOLIO_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            public_base_url,
            upload_dir: var("FOLIO_UPLOAD_DIR").unwrap_or_else(|| "uploads".into()).into(),
            allowed_origins,
            storage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = Config::from_lookup(lookup(&[("FOLIO_ADMIN_PASSWORD", "pw")])).err().unwrap();
        assert!(matches!(err, ConfigError::MissingSecret));
    }

    #[test]
    fn placeholder_secret_is_fatal() {
        let err = Config::from_lookup(lookup(&[
            ("FOLIO_JWT_SECRET", "dev-secret-change-me"),
            ("FOLIO_ADMIN_PASSWORD", "pw"),
        ]))
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::PlaceholderSecret));
    }

    #[test]
    fn admin_password_is_required() {
        let err = Config::from_lookup(lookup(&[("FOLIO_JWT_SECRET", "s3cret")])).err().unwrap();
        assert!(matches!(err, ConfigError::MissingAdminPassword));
    }

    #[test]
    fn malformed_password_hash_is_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("FOLIO_JWT_SECRET", "s3cret"),
            ("FOLIO_ADMIN_PASSWORD_HASH", "not-a-phc-string"),
        ]))
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidPasswordHash(_)));
    }

    #[test]
    fn defaults_and_origins() {
        let config = Config::from_lookup(lookup(&[
            ("FOLIO_JWT_SECRET", "s3cret"),
            ("FOLIO_ADMIN_PASSWORD", "pw"),
            ("FOLIO_PUBLIC_BASE_URL", "https://api.example.com/"),
            ("ALLOWED_ORIGINS", "https://a.example.com, ,https://b.example.com"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.public_base_url, "https://api.example.com");
        assert_eq!(
            config.allowed_origins,
            vec!["http://localhost:5173", "https://a.example.com", "https://b.example.com"]
        );
        assert!(config.admin_password_hash.starts_with("$argon2"));
        assert!(matches!(config.storage, StorageConfig::Local));
    }

    #[test]
    fn partial_cloudinary_falls_back_to_local() {
        let config = Config::from_lookup(lookup(&[
            ("FOLIO_JWT_SECRET", "s3cret"),
            ("FOLIO_ADMIN_PASSWORD", "pw"),
            ("CLOUDINARY_CLOUD_NAME", "demo"),
        ]))
        .unwrap();
        assert!(matches!(config.storage, StorageConfig::Local));
    }

    #[test]
    fn invalid_port_is_reported() {
        let err = Config::from_lookup(lookup(&[
            ("FOLIO_JWT_SECRET", "s3cret"),
            ("FOLIO_ADMIN_PASSWORD", "pw"),
            ("FOLIO_PORT", "eighty"),
        ]))
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::Invalid { name: "FOLIO_PORT", .. }));
    }
}
