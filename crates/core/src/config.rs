use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub oracle: OracleConfig,
    pub embeddings: EmbeddingsConfig,
    pub catalog: CatalogConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Connection settings for the language-model oracle (Azure-OpenAI-shaped
/// REST endpoint). All four identity fields are required at startup.
#[derive(Clone, Debug)]
pub struct OracleConfig {
    pub endpoint: String,
    pub api_key: SecretString,
    pub api_version: String,
    pub deployment: String,
    pub timeout_secs: u64,
}

/// Embedding backend selection. Exactly one family must be configured:
/// a remote embeddings deployment, or a local model identifier.
#[derive(Clone, Debug)]
pub struct EmbeddingsConfig {
    pub deployment: Option<String>,
    pub local_model: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub data_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub oracle_endpoint: Option<String>,
    pub oracle_api_key: Option<String>,
    pub oracle_api_version: Option<String>,
    pub oracle_deployment: Option<String>,
    pub embeddings_deployment: Option<String>,
    pub embeddings_local_model: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://redress.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            oracle: OracleConfig {
                endpoint: String::new(),
                api_key: String::new().into(),
                api_version: String::new(),
                deployment: String::new(),
                timeout_secs: 120,
            },
            embeddings: EmbeddingsConfig { deployment: None, local_model: None, timeout_secs: 60 },
            catalog: CatalogConfig { data_dir: PathBuf::from("data") },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 8000 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Layered load: defaults, then `redress.toml` (with `${ENV}`
    /// interpolation), then `REDRESS_*` environment variables, then
    /// programmatic overrides. Validation runs last and fails fast.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("redress.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(oracle) = patch.oracle {
            if let Some(endpoint) = oracle.endpoint {
                self.oracle.endpoint = endpoint;
            }
            if let Some(api_key_value) = oracle.api_key {
                self.oracle.api_key = api_key_value.into();
            }
            if let Some(api_version) = oracle.api_version {
                self.oracle.api_version = api_version;
            }
            if let Some(deployment) = oracle.deployment {
                self.oracle.deployment = deployment;
            }
            if let Some(timeout_secs) = oracle.timeout_secs {
                self.oracle.timeout_secs = timeout_secs;
            }
        }

        if let Some(embeddings) = patch.embeddings {
            if let Some(deployment) = embeddings.deployment {
                self.embeddings.deployment = Some(deployment);
            }
            if let Some(local_model) = embeddings.local_model {
                self.embeddings.local_model = Some(local_model);
            }
            if let Some(timeout_secs) = embeddings.timeout_secs {
                self.embeddings.timeout_secs = timeout_secs;
            }
        }

        if let Some(catalog) = patch.catalog {
            if let Some(data_dir) = catalog.data_dir {
                self.catalog.data_dir = data_dir;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("REDRESS_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("REDRESS_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("REDRESS_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("REDRESS_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("REDRESS_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("REDRESS_ORACLE_ENDPOINT") {
            self.oracle.endpoint = value;
        }
        if let Some(value) = read_env("REDRESS_ORACLE_API_KEY") {
            self.oracle.api_key = value.into();
        }
        if let Some(value) = read_env("REDRESS_ORACLE_API_VERSION") {
            self.oracle.api_version = value;
        }
        if let Some(value) = read_env("REDRESS_ORACLE_DEPLOYMENT") {
            self.oracle.deployment = value;
        }
        if let Some(value) = read_env("REDRESS_ORACLE_TIMEOUT_SECS") {
            self.oracle.timeout_secs = parse_u64("REDRESS_ORACLE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("REDRESS_EMBEDDINGS_DEPLOYMENT") {
            self.embeddings.deployment = Some(value);
        }
        if let Some(value) = read_env("REDRESS_EMBEDDINGS_LOCAL_MODEL") {
            self.embeddings.local_model = Some(value);
        }
        if let Some(value) = read_env("REDRESS_EMBEDDINGS_TIMEOUT_SECS") {
            self.embeddings.timeout_secs = parse_u64("REDRESS_EMBEDDINGS_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("REDRESS_DATA_DIR") {
            self.catalog.data_dir = PathBuf::from(value);
        }

        if let Some(value) = read_env("REDRESS_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("REDRESS_SERVER_PORT") {
            self.server.port = parse_u16("REDRESS_SERVER_PORT", &value)?;
        }

        let log_level = read_env("REDRESS_LOGGING_LEVEL").or_else(|| read_env("REDRESS_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REDRESS_LOGGING_FORMAT").or_else(|| read_env("REDRESS_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(endpoint) = overrides.oracle_endpoint {
            self.oracle.endpoint = endpoint;
        }
        if let Some(api_key) = overrides.oracle_api_key {
            self.oracle.api_key = api_key.into();
        }
        if let Some(api_version) = overrides.oracle_api_version {
            self.oracle.api_version = api_version;
        }
        if let Some(deployment) = overrides.oracle_deployment {
            self.oracle.deployment = deployment;
        }
        if let Some(deployment) = overrides.embeddings_deployment {
            self.embeddings.deployment = Some(deployment);
        }
        if let Some(local_model) = overrides.embeddings_local_model {
            self.embeddings.local_model = Some(local_model);
        }
        if let Some(data_dir) = overrides.data_dir {
            self.catalog.data_dir = data_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_oracle(&self.oracle)?;
        validate_embeddings(&self.embeddings)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("redress.toml"), PathBuf::from("config/redress.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_oracle(oracle: &OracleConfig) -> Result<(), ConfigError> {
    let endpoint = oracle.endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::Validation(
            "oracle.endpoint is required (set REDRESS_ORACLE_ENDPOINT)".to_string(),
        ));
    }
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::Validation(
            "oracle.endpoint must start with http:// or https://".to_string(),
        ));
    }

    if oracle.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "oracle.api_key is required (set REDRESS_ORACLE_API_KEY)".to_string(),
        ));
    }
    if oracle.api_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "oracle.api_version is required (set REDRESS_ORACLE_API_VERSION)".to_string(),
        ));
    }
    if oracle.deployment.trim().is_empty() {
        return Err(ConfigError::Validation(
            "oracle.deployment is required (set REDRESS_ORACLE_DEPLOYMENT)".to_string(),
        ));
    }

    if oracle.timeout_secs == 0 || oracle.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "oracle.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_embeddings(embeddings: &EmbeddingsConfig) -> Result<(), ConfigError> {
    let has_deployment =
        embeddings.deployment.as_ref().is_some_and(|value| !value.trim().is_empty());
    let has_local_model =
        embeddings.local_model.as_ref().is_some_and(|value| !value.trim().is_empty());

    match (has_deployment, has_local_model) {
        (false, false) => Err(ConfigError::Validation(
            "embeddings configuration is required: set embeddings.deployment or embeddings.local_model"
                .to_string(),
        )),
        (true, true) => Err(ConfigError::Validation(
            "embeddings.deployment and embeddings.local_model are mutually exclusive; configure exactly one"
                .to_string(),
        )),
        _ => {
            if embeddings.timeout_secs == 0 || embeddings.timeout_secs > 300 {
                return Err(ConfigError::Validation(
                    "embeddings.timeout_secs must be in range 1..=300".to_string(),
                ));
            }
            Ok(())
        }
    }
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    oracle: Option<OraclePatch>,
    embeddings: Option<EmbeddingsPatch>,
    catalog: Option<CatalogPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct OraclePatch {
    endpoint: Option<String>,
    api_key: Option<String>,
    api_version: Option<String>,
    deployment: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EmbeddingsPatch {
    deployment: Option<String>,
    local_model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
