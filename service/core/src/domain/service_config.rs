// Copyright (c) 2026 Expensa Contributors
// SPDX-License-Identifier: AGPL-3.0

// Service Configuration Types
//
// Defines the configuration schema for an Expensa service node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP server binding
// - NLU provider selection (Dialogflow or the offline keyword matcher)
// - Conversation session lifetime
// - Storage backend and push channel sizing
// - Timeouts around every suspension point
// - Observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "expensa.dev/v1";
pub const KIND: &str = "ServiceConfig";

/// Top-level Kubernetes-style service configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfigManifest {
    /// API version (must be "expensa.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "ServiceConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: ServiceConfigSpec,
}

pub type ServiceConfig = ServiceConfigManifest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub nlu: NluConfig,

    #[serde(default)]
    pub sessions: SessionSettings,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub push: PushConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub seed: SeedConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NluProviderType {
    /// Google Dialogflow ES `detectIntent` REST API
    Dialogflow,
    /// Built-in keyword matcher, for development without network access
    Keyword,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NluConfig {
    #[serde(rename = "type", default = "default_nlu_type")]
    pub provider_type: NluProviderType,

    /// Google Cloud project that owns the agent (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    /// API endpoint URL
    #[serde(default = "default_nlu_endpoint")]
    pub endpoint: String,

    /// OAuth access token (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default = "default_language_code")]
    pub language_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Idle time after which a caller's conversation session is dropped
    #[serde(default = "default_session_idle")]
    pub idle_timeout_seconds: u64,

    /// How often the sweeper looks for idle sessions
    #[serde(default = "default_session_sweep")]
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackendType {
    InMemory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackendType,

    /// Database URL (supports "env:VAR_NAME")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_string: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Broadcast buffer; slow subscribers lose the oldest events beyond it
    #[serde(default = "default_push_capacity")]
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_nlu_timeout")]
    pub nlu_ms: u64,

    #[serde(default = "default_persistence_timeout")]
    pub persistence_ms: u64,
}

impl TimeoutConfig {
    pub fn nlu(&self) -> Duration {
        Duration::from_millis(self.nlu_ms)
    }

    pub fn persistence(&self) -> Duration {
        Duration::from_millis(self.persistence_ms)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedConfig {
    /// External-auth id given to users created by a seed import.
    /// A random one is generated when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth0_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prometheus scrape port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8000
}

fn default_nlu_type() -> NluProviderType {
    NluProviderType::Keyword
}

fn default_nlu_endpoint() -> String {
    "https://dialogflow.googleapis.com".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_session_idle() -> u64 {
    1800
}

fn default_session_sweep() -> u64 {
    60
}

fn default_storage_backend() -> StorageBackendType {
    StorageBackendType::InMemory
}

fn default_max_connections() -> u32 {
    5
}

fn default_push_capacity() -> usize {
    1000
}

fn default_nlu_timeout() -> u64 {
    10_000
}

fn default_persistence_timeout() -> u64 {
    5_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            provider_type: default_nlu_type(),
            project_id: None,
            endpoint: default_nlu_endpoint(),
            access_token: None,
            language_code: default_language_code(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            idle_timeout_seconds: default_session_idle(),
            sweep_interval_seconds: default_session_sweep(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            connection_string: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            capacity: default_push_capacity(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            nlu_ms: default_nlu_timeout(),
            persistence_ms: default_persistence_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            port: default_metrics_port(),
        }
    }
}

impl Default for ServiceConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "expensa".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: ServiceConfigSpec::default(),
        }
    }
}

impl ServiceConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. EXPENSA_CONFIG_PATH environment variable
    /// 2. ./expensa-config.yaml (working directory)
    /// 3. ~/.expensa/config.yaml (user home)
    /// 4. /etc/expensa/config.yaml
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("EXPENSA_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./expensa-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".expensa").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        let system_config = PathBuf::from("/etc/expensa/config.yaml");
        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // An explicit path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = match Self::discover_config() {
            Some(config_path) => {
                tracing::info!("Loading configuration from discovered path: {:?}", config_path);
                Self::from_yaml_file(config_path)?
            }
            None => {
                tracing::warn!("No configuration file found in standard locations. Using defaults.");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("EXPENSA_HOST") {
            tracing::info!("Environment override: EXPENSA_HOST={}", host);
            self.spec.server.bind_address = host;
        }

        if let Ok(val) = std::env::var("EXPENSA_PORT") {
            match val.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: EXPENSA_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => tracing::warn!("Invalid value for EXPENSA_PORT: '{}'. Ignoring.", val),
            }
        }

        if let Ok(val) = std::env::var("EXPENSA_STORAGE_BACKEND") {
            match val.to_lowercase().as_str() {
                "in-memory" | "memory" => self.spec.storage.backend = StorageBackendType::InMemory,
                "postgres" | "postgresql" => self.spec.storage.backend = StorageBackendType::Postgres,
                _ => tracing::warn!(
                    "Invalid value for EXPENSA_STORAGE_BACKEND: '{}'. Expected in-memory/postgres. Ignoring.",
                    val
                ),
            }
        }

        if let Ok(project) = std::env::var("GOOGLE_PROJECT_ID") {
            if self.spec.nlu.project_id.is_none() {
                self.spec.nlu.project_id = Some(project);
            }
        }

        if let Ok(auth0_id) = std::env::var("AUTH0_ID") {
            if !auth0_id.is_empty() {
                self.spec.seed.auth0_id = Some(auth0_id);
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.port == 0 {
            anyhow::bail!("spec.server.port must be greater than 0");
        }

        if self.spec.nlu.provider_type == NluProviderType::Dialogflow {
            let missing = self
                .spec
                .nlu
                .project_id
                .as_deref()
                .map(str::is_empty)
                .unwrap_or(true);
            if missing {
                anyhow::bail!("spec.nlu.project_id is required for the dialogflow provider");
            }
            if self.spec.nlu.endpoint.is_empty() {
                anyhow::bail!("spec.nlu.endpoint cannot be empty");
            }
        }

        if self.spec.sessions.idle_timeout_seconds == 0 {
            anyhow::bail!("spec.sessions.idle_timeout_seconds must be greater than 0");
        }

        if self.spec.sessions.sweep_interval_seconds == 0 {
            anyhow::bail!("spec.sessions.sweep_interval_seconds must be greater than 0");
        }

        if self.spec.timeouts.nlu_ms == 0 || self.spec.timeouts.persistence_ms == 0 {
            anyhow::bail!("spec.timeouts values must be greater than 0");
        }

        if self.spec.push.capacity == 0 {
            anyhow::bail!("spec.push.capacity must be greater than 0");
        }

        if self.spec.storage.backend == StorageBackendType::Postgres
            && self.spec.storage.connection_string.is_none()
        {
            anyhow::bail!("spec.storage.connection_string is required for the postgres backend");
        }

        Ok(())
    }

    /// Resolve the configured storage backend, expanding secrets
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match self.spec.storage.backend {
            StorageBackendType::InMemory => Ok(StorageBackend::InMemory),
            StorageBackendType::Postgres => {
                let connection_string = resolve_secret(&self.spec.storage.connection_string)?
                    .ok_or_else(|| anyhow::anyhow!("No connection string configured"))?;
                Ok(StorageBackend::PostgreSQL(PostgresConfig {
                    connection_string,
                    max_connections: self.spec.storage.max_connections,
                }))
            }
        }
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.spec.server.bind_address, self.spec.server.port)
    }
}

/// Resolve a secret value (supports "env:VAR_NAME" syntax)
pub fn resolve_secret(value: &Option<String>) -> anyhow::Result<Option<String>> {
    match value {
        Some(v) => match v.strip_prefix("env:") {
            Some(var_name) => std::env::var(var_name)
                .map(Some)
                .map_err(|_| anyhow::anyhow!("Environment variable not set: {}", var_name)),
            None => Ok(Some(v.clone())),
        },
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = ServiceConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert_eq!(manifest.spec.nlu.provider_type, NluProviderType::Keyword);
        assert_eq!(manifest.spec.storage.backend, StorageBackendType::InMemory);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_parsing_fills_defaults() {
        let yaml = r#"
apiVersion: expensa.dev/v1
kind: ServiceConfig
metadata:
  name: test-node
spec:
  server:
    port: 8100
  nlu:
    type: dialogflow
    project_id: expenses-bot
    access_token: env:DIALOGFLOW_TOKEN
"#;
        let parsed = ServiceConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(parsed.metadata.name, "test-node");
        assert_eq!(parsed.spec.server.port, 8100);
        assert_eq!(parsed.spec.server.bind_address, "127.0.0.1");
        assert_eq!(parsed.spec.nlu.provider_type, NluProviderType::Dialogflow);
        assert_eq!(parsed.spec.nlu.language_code, "en-US");
        assert_eq!(parsed.spec.timeouts.nlu_ms, 10_000);
        assert_eq!(parsed.spec.sessions.idle_timeout_seconds, 1800);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut manifest = ServiceConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.server.port = 0;
        assert!(manifest.validate().is_err());
        manifest.spec.server.port = 8000;

        manifest.spec.nlu.provider_type = NluProviderType::Dialogflow;
        assert!(manifest.validate().is_err());
        manifest.spec.nlu.project_id = Some("expenses-bot".to_string());
        assert!(manifest.validate().is_ok());

        manifest.spec.storage.backend = StorageBackendType::Postgres;
        assert!(manifest.validate().is_err());
        manifest.spec.storage.connection_string = Some("postgres://localhost/expensa".into());
        assert!(manifest.validate().is_ok());

        manifest.spec.timeouts.persistence_ms = 0;
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("expensa-config.yaml");

        let mut manifest = ServiceConfigManifest::default();
        manifest.spec.server.port = 9100;
        manifest.to_yaml_file(&path).unwrap();

        let loaded = ServiceConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.api_version, API_VERSION);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let result = ServiceConfigManifest::load_or_default(Some(PathBuf::from(
            "/definitely/not/here/expensa.yaml",
        )));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_plain_secret() {
        assert_eq!(
            resolve_secret(&Some("literal".to_string())).unwrap(),
            Some("literal".to_string())
        );
        assert_eq!(resolve_secret(&None).unwrap(), None);
        assert!(resolve_secret(&Some("env:EXPENSA_TEST_SURELY_UNSET_VAR".to_string())).is_err());
    }
}
