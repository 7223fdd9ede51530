use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;
use uuid::Uuid;

use backend_domain::{DbConfig, ModelConfig, RuntimeConfig};

pub const STORAGE_CLICKHOUSE: &str = "clickhouse";
pub const STORAGE_MEMORY: &str = "memory";
/// One year.
pub const MAX_TOKEN_EXPIRE_MINUTES: u64 = 525_600;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub storage_backend: String,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub jwt_secret: Option<String>,
    pub token_expire_minutes: u64,
    pub admin_username: String,
    pub admin_password: Option<String>,
    pub bot_api_key: Option<String>,
    pub api_base_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_fallback_model: Option<String>,
    pub gemini_base_url: String,
    pub model_timeout_seconds: u64,
    pub store_timeout_seconds: u64,
    pub delivery_timeout_seconds: u64,
    pub request_timeout_seconds: u64,
    pub max_body_bytes: u64,
    pub discord_token: Option<String>,
    pub discord_guild_ids: Vec<String>,
    pub discord_gateway_url: String,
    pub discord_api_base: String,
    pub legacy_detector_enabled: bool,
    pub ingest_queue_capacity: usize,
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            cors_origins: Vec::new(),
            storage_backend: STORAGE_CLICKHOUSE.to_string(),
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "eventory".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            jwt_secret: None,
            token_expire_minutes: 60,
            admin_username: "admin".to_string(),
            admin_password: None,
            bot_api_key: None,
            api_base_url: None,
            gemini_api_key: None,
            gemini_model: "gemini-1.5-pro".to_string(),
            gemini_fallback_model: Some("gemini-1.0-pro".to_string()),
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            model_timeout_seconds: 30,
            store_timeout_seconds: 10,
            delivery_timeout_seconds: 10,
            request_timeout_seconds: 15,
            max_body_bytes: 1024 * 1024,
            discord_token: None,
            discord_guild_ids: Vec::new(),
            discord_gateway_url: "wss://gateway.discord.gg/?v=10&encoding=json".to_string(),
            discord_api_base: "https://discord.com/api/v10".to_string(),
            legacy_detector_enabled: false,
            ingest_queue_capacity: 256,
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("EVENTORY_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        Self::load_from(&path).await
    }

    pub async fn load_from(path: &str) -> Result<Self> {
        let file_path = Path::new(path);
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path).await?;
            toml::from_str::<AppConfig>(&content)?
        } else {
            warn!("{} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.resolve_paths(file_path.parent());
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        for value in [
            &mut self.clickhouse_user,
            &mut self.clickhouse_password,
            &mut self.jwt_secret,
            &mut self.admin_password,
            &mut self.bot_api_key,
            &mut self.api_base_url,
            &mut self.gemini_api_key,
            &mut self.gemini_fallback_model,
            &mut self.discord_token,
            &mut self.log_dir,
        ] {
            if value.as_deref().map(|text| text.trim().is_empty()).unwrap_or(false) {
                *value = None;
            }
        }
        if let Some(url) = &mut self.api_base_url {
            *url = url.trim().trim_end_matches('/').to_string();
        }
        self.gemini_base_url = self.gemini_base_url.trim().trim_end_matches('/').to_string();
        self.discord_api_base = self.discord_api_base.trim().trim_end_matches('/').to_string();
        self.storage_backend = self.storage_backend.trim().to_lowercase();
        self.cors_origins = normalize_id_list(std::mem::take(&mut self.cors_origins));
        self.discord_guild_ids = normalize_id_list(std::mem::take(&mut self.discord_guild_ids));
    }

    fn resolve_paths(&mut self, base_dir: Option<&Path>) {
        let Some(base) = base_dir else {
            return;
        };
        if let Some(log_dir) = &self.log_dir {
            self.log_dir = Some(resolve_path(base, log_dir));
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.storage_backend != STORAGE_CLICKHOUSE && self.storage_backend != STORAGE_MEMORY {
            return Err(anyhow!(
                "storage_backend must be '{}' or '{}', got '{}'",
                STORAGE_CLICKHOUSE,
                STORAGE_MEMORY,
                self.storage_backend
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        if self.ingest_queue_capacity == 0 {
            return Err(anyhow!("ingest_queue_capacity must be greater than 0"));
        }
        if self.token_expire_minutes == 0 || self.token_expire_minutes > MAX_TOKEN_EXPIRE_MINUTES {
            return Err(anyhow!(
                "token_expire_minutes must be between 1 and {}",
                MAX_TOKEN_EXPIRE_MINUTES
            ));
        }
        for (name, value) in [
            ("model_timeout_seconds", self.model_timeout_seconds),
            ("store_timeout_seconds", self.store_timeout_seconds),
            ("delivery_timeout_seconds", self.delivery_timeout_seconds),
            ("request_timeout_seconds", self.request_timeout_seconds),
        ] {
            if value == 0 {
                return Err(anyhow!("{} must be greater than 0", name));
            }
        }
        if self.gemini_model.trim().is_empty() {
            return Err(anyhow!("gemini_model must not be empty"));
        }
        Ok(())
    }

    /// Resolves the signing secret; a missing one is replaced by a random
    /// per-process secret, which invalidates tokens on restart.
    pub fn to_runtime_config(&self) -> RuntimeConfig {
        let jwt_secret = match &self.jwt_secret {
            Some(secret) => secret.clone(),
            None => {
                warn!("jwt_secret not configured, generating a per-process secret");
                format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
            }
        };
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            cors_origins: self.cors_origins.clone(),
            jwt_secret,
            token_expire_minutes: self.token_expire_minutes,
            admin_username: self.admin_username.clone(),
            admin_password: self.admin_password.clone(),
            bot_api_key: self.bot_api_key.clone(),
            api_base_url: self.api_base_url.clone(),
            model_timeout_seconds: self.model_timeout_seconds,
            store_timeout_seconds: self.store_timeout_seconds,
            delivery_timeout_seconds: self.delivery_timeout_seconds,
            request_timeout_seconds: self.request_timeout_seconds,
            max_body_bytes: self.max_body_bytes,
            discord_token: self.discord_token.clone(),
            discord_guild_ids: self.discord_guild_ids.clone(),
            discord_gateway_url: self.discord_gateway_url.clone(),
            discord_api_base: self.discord_api_base.clone(),
            legacy_detector_enabled: self.legacy_detector_enabled,
            ingest_queue_capacity: self.ingest_queue_capacity,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            storage_backend: self.storage_backend.clone(),
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    pub fn to_model_config(&self) -> ModelConfig {
        ModelConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            fallback_model: self
                .gemini_fallback_model
                .clone()
                .filter(|fallback| fallback != &self.gemini_model),
            base_url: self.gemini_base_url.clone(),
        }
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("EVENTORY_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("EVENTORY_CORS_ORIGINS") {
            self.cors_origins = parse_env_id_list(&value);
        }
        if let Some(value) = lookup("EVENTORY_STORAGE_BACKEND") {
            self.storage_backend = value;
        }
        if let Some(value) = lookup("EVENTORY_CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Some(value) = lookup("EVENTORY_CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Some(value) = lookup("EVENTORY_CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_JWT_SECRET") {
            self.jwt_secret = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_TOKEN_EXPIRE_MINUTES") {
            self.token_expire_minutes = value.parse().unwrap_or(self.token_expire_minutes);
        }
        if let Some(value) = lookup("EVENTORY_ADMIN_USERNAME") {
            self.admin_username = value;
        }
        if let Some(value) = lookup("EVENTORY_ADMIN_PASSWORD") {
            self.admin_password = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_BOT_API_KEY") {
            self.bot_api_key = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_API_BASE_URL") {
            self.api_base_url = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_GEMINI_API_KEY") {
            self.gemini_api_key = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_GEMINI_MODEL") {
            self.gemini_model = value;
        }
        if let Some(value) = lookup("EVENTORY_GEMINI_FALLBACK_MODEL") {
            self.gemini_fallback_model = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_GEMINI_BASE_URL") {
            self.gemini_base_url = value;
        }
        if let Some(value) = lookup("EVENTORY_MODEL_TIMEOUT_SECONDS") {
            self.model_timeout_seconds = value.parse().unwrap_or(self.model_timeout_seconds);
        }
        if let Some(value) = lookup("EVENTORY_STORE_TIMEOUT_SECONDS") {
            self.store_timeout_seconds = value.parse().unwrap_or(self.store_timeout_seconds);
        }
        if let Some(value) = lookup("EVENTORY_DELIVERY_TIMEOUT_SECONDS") {
            self.delivery_timeout_seconds = value.parse().unwrap_or(self.delivery_timeout_seconds);
        }
        if let Some(value) = lookup("EVENTORY_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
        if let Some(value) = lookup("EVENTORY_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Some(value) = lookup("EVENTORY_DISCORD_TOKEN") {
            self.discord_token = Some(value);
        }
        if let Some(value) = lookup("EVENTORY_DISCORD_GUILD_IDS") {
            self.discord_guild_ids = parse_env_id_list(&value);
        }
        if let Some(value) = lookup("EVENTORY_DISCORD_GATEWAY_URL") {
            self.discord_gateway_url = value;
        }
        if let Some(value) = lookup("EVENTORY_DISCORD_API_BASE") {
            self.discord_api_base = value;
        }
        if let Some(value) = lookup("EVENTORY_LEGACY_DETECTOR_ENABLED") {
            self.legacy_detector_enabled = value.parse().unwrap_or(self.legacy_detector_enabled);
        }
        if let Some(value) = lookup("EVENTORY_INGEST_QUEUE_CAPACITY") {
            self.ingest_queue_capacity = value.parse().unwrap_or(self.ingest_queue_capacity);
        }
        if let Some(value) = lookup("EVENTORY_LOG_DIR") {
            self.log_dir = Some(value);
        }
    }
}

fn resolve_path(base: &Path, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return trimmed.to_string();
    }
    let path = Path::new(trimmed);
    if path.is_absolute() {
        trimmed.to_string()
    } else {
        base.join(path).to_string_lossy().to_string()
    }
}

fn parse_env_id_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn normalize_id_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = values
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().expect("defaults validate");
        let runtime = config.to_runtime_config();
        assert_eq!(runtime.token_expire_minutes, 60);
        assert_eq!(runtime.jwt_secret.len(), 64);
    }

    #[test]
    fn token_lifetime_is_bounded() {
        let mut config = AppConfig {
            token_expire_minutes: MAX_TOKEN_EXPIRE_MINUTES + 1,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
        config.token_expire_minutes = MAX_TOKEN_EXPIRE_MINUTES;
        config.validate().expect("one year is allowed");
    }

    #[test]
    fn toml_fields_override_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
bind_addr = "0.0.0.0:9000"
storage_backend = "memory"
discord_guild_ids = ["2", " 1 ", "2"]
gemini_model = "gemini-1.5-flash"
"#,
        )
        .expect("parse toml");
        let mut config = config;
        config.normalize();
        config.validate().expect("valid");
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.discord_guild_ids, vec!["1".to_string(), "2".to_string()]);
        assert_eq!(config.to_db_config().storage_backend, STORAGE_MEMORY);
        assert_eq!(config.to_model_config().model, "gemini-1.5-flash");
        assert_eq!(config.to_model_config().fallback_model.as_deref(), Some("gemini-1.0-pro"));
    }

    #[test]
    fn env_overrides_apply_and_blank_secrets_are_dropped() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("EVENTORY_BOT_API_KEY", "  "),
            ("EVENTORY_DISCORD_GUILD_IDS", "10, 20,,"),
            ("EVENTORY_STORE_TIMEOUT_SECONDS", "3"),
            ("EVENTORY_LEGACY_DETECTOR_ENABLED", "true"),
            ("EVENTORY_API_BASE_URL", "http://api.local/"),
        ]);
        let mut config = AppConfig::default();
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));
        config.normalize();

        assert_eq!(config.bot_api_key, None);
        assert_eq!(config.discord_guild_ids, vec!["10".to_string(), "20".to_string()]);
        assert_eq!(config.store_timeout_seconds, 3);
        assert!(config.legacy_detector_enabled);
        assert_eq!(config.api_base_url.as_deref(), Some("http://api.local"));
    }

    #[test]
    fn unknown_storage_backend_is_rejected() {
        let mut config = AppConfig {
            storage_backend: "mongodb".to_string(),
            ..AppConfig::default()
        };
        config.normalize();
        assert!(config.validate().is_err());
    }

    #[test]
    fn fallback_equal_to_primary_is_dropped() {
        let config = AppConfig {
            gemini_fallback_model: Some("gemini-1.5-pro".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(config.to_model_config().fallback_model, None);
    }
}
