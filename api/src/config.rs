//! API configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use microcred_auth::{DEFAULT_NONCE_TTL_SECS, MIN_SECRET_LEN};
use microcred_utils::LogFormat;
use microcred_worldid::{WorldIdConfig, DEFAULT_BASE_URL};

use crate::ServerError;

/// Deployment mode. Cookies carry `Secure` everywhere except development.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => f.write_str("development"),
            Self::Production => f.write_str("production"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_environment")]
    pub environment: Environment,

    /// World ID application id (`app_...`).
    #[serde(default)]
    pub world_id_app_id: String,

    /// Action that creates a user on first verification.
    #[serde(default)]
    pub access_action: String,

    /// Action loan requests must be verified for.
    #[serde(default)]
    pub loan_action: String,

    #[serde(default = "default_world_id_base_url")]
    pub world_id_base_url: String,

    /// Timeout for every call to the developer portal.
    #[serde(default = "default_verify_timeout_secs")]
    pub verify_timeout_secs: u64,

    /// Developer portal API key, required to confirm survey deposits.
    #[serde(default)]
    pub dev_portal_api_key: Option<String>,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Name of the LMDB environment directory under `data_dir`.
    #[serde(default = "default_db_name")]
    pub db_name: String,

    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// HMAC key for session tokens, at least 32 bytes.
    #[serde(default)]
    pub session_secret: Option<String>,

    #[serde(default = "default_nonce_ttl_secs")]
    pub nonce_ttl_secs: u64,

    /// Origins allowed to call the API with credentials. Empty disables CORS.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_listen_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_environment() -> Environment {
    Environment::Development
}

fn default_world_id_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_verify_timeout_secs() -> u64 {
    10
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./microcred_data")
}

fn default_db_name() -> String {
    "microcred".to_string()
}

fn default_map_size_mb() -> usize {
    64
}

fn default_nonce_ttl_secs() -> u64 {
    DEFAULT_NONCE_TTL_SECS
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ApiConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, ServerError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ServerError> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }

    pub fn secure_cookies(&self) -> bool {
        !self.is_development()
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_name)
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn world_id(&self) -> WorldIdConfig {
        WorldIdConfig {
            base_url: self.world_id_base_url.clone(),
            app_id: self.world_id_app_id.clone(),
            api_key: self.dev_portal_api_key.clone().filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(self.verify_timeout_secs),
        }
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.world_id_app_id.trim().is_empty() {
            return Err(ServerError::Config("World ID app id is not set".into()));
        }
        if self.access_action.trim().is_empty() {
            return Err(ServerError::Config("access action is not set".into()));
        }
        if self.loan_action.trim().is_empty() {
            return Err(ServerError::Config("loan action is not set".into()));
        }
        if self.verify_timeout_secs == 0 {
            return Err(ServerError::Config("verify_timeout_secs must be positive".into()));
        }
        match self.session_secret.as_deref() {
            Some(s) if s.len() >= MIN_SECRET_LEN => {}
            Some(s) if !s.is_empty() || !self.is_development() => {
                return Err(ServerError::Config(format!(
                    "session secret must be at least {MIN_SECRET_LEN} bytes"
                )))
            }
            None if !self.is_development() => {
                return Err(ServerError::Config(
                    "session secret is required outside development".into(),
                ))
            }
            _ => {}
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            environment: default_environment(),
            world_id_app_id: String::new(),
            access_action: String::new(),
            loan_action: String::new(),
            world_id_base_url: default_world_id_base_url(),
            verify_timeout_secs: default_verify_timeout_secs(),
            dev_portal_api_key: None,
            data_dir: default_data_dir(),
            db_name: default_db_name(),
            map_size_mb: default_map_size_mb(),
            session_secret: None,
            nonce_ttl_secs: default_nonce_ttl_secs(),
            cors_allowed_origins: Vec::new(),
            log_format: LogFormat::Human,
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ApiConfig {
        ApiConfig {
            world_id_app_id: "app_123".into(),
            access_action: "access".into(),
            loan_action: "request-loan".into(),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ApiConfig::from_toml_str("").unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.verify_timeout_secs, 10);
        assert_eq!(config.nonce_ttl_secs, 600);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.db_path(), PathBuf::from("./microcred_data/microcred"));
    }

    #[test]
    fn partial_toml_overrides() {
        let config = ApiConfig::from_toml_str(
            r#"
            environment = "production"
            world_id_app_id = "app_x"
            log_format = "json"
            cors_allowed_origins = ["https://app.example"]
        "#,
        )
        .unwrap();
        assert!(config.secure_cookies());
        assert_eq!(config.world_id_app_id, "app_x");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.cors_allowed_origins.len(), 1);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let err = ApiConfig::from_toml_file(Path::new("/nonexistent/microcred.toml")).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn to_and_from_toml() {
        let config = valid();
        let text = toml::to_string(&config).unwrap();
        let parsed = ApiConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed.loan_action, "request-loan");
        assert_eq!(parsed.map_size_mb, config.map_size_mb);
    }

    #[test]
    fn development_allows_missing_secret() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn production_requires_strong_secret() {
        let mut config = valid();
        config.environment = Environment::Production;
        assert!(config.validate().is_err());
        config.session_secret = Some("short".into());
        assert!(config.validate().is_err());
        config.session_secret = Some("x".repeat(32));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_identity_settings_are_rejected() {
        let mut config = valid();
        config.loan_action.clear();
        assert!(matches!(config.validate(), Err(ServerError::Config(_))));
        assert!(ApiConfig::default().validate().is_err());
    }

    #[test]
    fn empty_api_key_counts_as_absent() {
        let mut config = valid();
        config.dev_portal_api_key = Some(String::new());
        assert_eq!(config.world_id().api_key, None);
    }
}
