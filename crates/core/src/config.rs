use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub sources: SourcesConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Most offers requested from any single source.
    pub max_offers_per_source: u32,
    /// Flights shown to the user after ranking.
    pub display_results: usize,
    /// Budget for one upstream source before its results are dropped.
    pub source_timeout_secs: u64,
    /// Overall HTTP client timeout for source requests.
    pub http_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SourcesConfig {
    /// Trust weight per source name, each in [0.0, 1.0].
    pub reliability: BTreeMap<String, f64>,
    pub amadeus: AmadeusConfig,
}

#[derive(Clone, Debug)]
pub struct AmadeusConfig {
    pub api_key: Option<SecretString>,
    pub api_secret: Option<SecretString>,
    pub base_url: String,
}

impl AmadeusConfig {
    /// Live credentials present; otherwise the demo source is used.
    pub fn is_configured(&self) -> bool {
        let filled = |secret: &Option<SecretString>| {
            secret.as_ref().is_some_and(|value| !value.expose_secret().trim().is_empty())
        };
        filled(&self.api_key) && filled(&self.api_secret)
    }
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub display_results: Option<usize>,
    pub session_ttl_secs: Option<u64>,
    pub amadeus_api_key: Option<String>,
    pub amadeus_api_secret: Option<String>,
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

fn default_reliability() -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("Amadeus".to_string(), 0.9),
        ("Skyscanner".to_string(), 0.8),
        ("Cleartrip".to_string(), 0.7),
        ("MakeMyTrip".to_string(), 0.7),
        ("Mock".to_string(), 0.1),
    ])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://fareflow.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            search: SearchConfig {
                max_offers_per_source: 7,
                display_results: 3,
                source_timeout_secs: 10,
                http_timeout_secs: 30,
            },
            sources: SourcesConfig {
                reliability: default_reliability(),
                amadeus: AmadeusConfig {
                    api_key: None,
                    api_secret: None,
                    base_url: "https://test.api.amadeus.com".to_string(),
                },
            },
            session: SessionConfig { ttl_secs: 86_400 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("fareflow.toml"));
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

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(search) = patch.search {
            if let Some(max_offers_per_source) = search.max_offers_per_source {
                self.search.max_offers_per_source = max_offers_per_source;
            }
            if let Some(display_results) = search.display_results {
                self.search.display_results = display_results;
            }
            if let Some(source_timeout_secs) = search.source_timeout_secs {
                self.search.source_timeout_secs = source_timeout_secs;
            }
            if let Some(http_timeout_secs) = search.http_timeout_secs {
                self.search.http_timeout_secs = http_timeout_secs;
            }
        }

        if let Some(sources) = patch.sources {
            if let Some(reliability) = sources.reliability {
                // A configured table replaces the default one outright.
                self.sources.reliability = reliability;
            }
            if let Some(amadeus) = sources.amadeus {
                if let Some(api_key_value) = amadeus.api_key {
                    self.sources.amadeus.api_key = Some(secret_value(api_key_value));
                }
                if let Some(api_secret_value) = amadeus.api_secret {
                    self.sources.amadeus.api_secret = Some(secret_value(api_secret_value));
                }
                if let Some(base_url) = amadeus.base_url {
                    self.sources.amadeus.base_url = base_url;
                }
            }
        }

        if let Some(session) = patch.session {
            if let Some(ttl_secs) = session.ttl_secs {
                self.session.ttl_secs = ttl_secs;
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
        if let Some(value) = read_env("FAREFLOW_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FAREFLOW_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("FAREFLOW_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FAREFLOW_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("FAREFLOW_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FAREFLOW_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("FAREFLOW_SERVER_PORT") {
            self.server.port = parse_u16("FAREFLOW_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("FAREFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("FAREFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("FAREFLOW_SEARCH_MAX_OFFERS_PER_SOURCE") {
            self.search.max_offers_per_source =
                parse_u32("FAREFLOW_SEARCH_MAX_OFFERS_PER_SOURCE", &value)?;
        }
        if let Some(value) = read_env("FAREFLOW_SEARCH_DISPLAY_RESULTS") {
            self.search.display_results =
                parse_u32("FAREFLOW_SEARCH_DISPLAY_RESULTS", &value)? as usize;
        }
        if let Some(value) = read_env("FAREFLOW_SEARCH_SOURCE_TIMEOUT_SECS") {
            self.search.source_timeout_secs =
                parse_u64("FAREFLOW_SEARCH_SOURCE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("FAREFLOW_SEARCH_HTTP_TIMEOUT_SECS") {
            self.search.http_timeout_secs =
                parse_u64("FAREFLOW_SEARCH_HTTP_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FAREFLOW_AMADEUS_API_KEY") {
            self.sources.amadeus.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("FAREFLOW_AMADEUS_API_SECRET") {
            self.sources.amadeus.api_secret = Some(secret_value(value));
        }
        if let Some(value) = read_env("FAREFLOW_AMADEUS_BASE_URL") {
            self.sources.amadeus.base_url = value;
        }

        if let Some(value) = read_env("FAREFLOW_SESSION_TTL_SECS") {
            self.session.ttl_secs = parse_u64("FAREFLOW_SESSION_TTL_SECS", &value)?;
        }

        let log_level =
            read_env("FAREFLOW_LOGGING_LEVEL").or_else(|| read_env("FAREFLOW_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FAREFLOW_LOGGING_FORMAT").or_else(|| read_env("FAREFLOW_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(display_results) = overrides.display_results {
            self.search.display_results = display_results;
        }
        if let Some(session_ttl_secs) = overrides.session_ttl_secs {
            self.session.ttl_secs = session_ttl_secs;
        }
        if let Some(amadeus_api_key) = overrides.amadeus_api_key {
            self.sources.amadeus.api_key = Some(secret_value(amadeus_api_key));
        }
        if let Some(amadeus_api_secret) = overrides.amadeus_api_secret {
            self.sources.amadeus.api_secret = Some(secret_value(amadeus_api_secret));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_search(&self.search)?;
        validate_sources(&self.sources)?;
        validate_session(&self.session)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("fareflow.toml"), PathBuf::from("config/fareflow.toml")]
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

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigError> {
    if search.max_offers_per_source == 0 || search.max_offers_per_source > 50 {
        return Err(ConfigError::Validation(
            "search.max_offers_per_source must be in range 1..=50".to_string(),
        ));
    }

    if search.display_results == 0 {
        return Err(ConfigError::Validation(
            "search.display_results must be greater than zero".to_string(),
        ));
    }

    if search.source_timeout_secs == 0 || search.source_timeout_secs > 120 {
        return Err(ConfigError::Validation(
            "search.source_timeout_secs must be in range 1..=120".to_string(),
        ));
    }

    if search.http_timeout_secs == 0 || search.http_timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "search.http_timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_sources(sources: &SourcesConfig) -> Result<(), ConfigError> {
    for (source, weight) in &sources.reliability {
        if !(0.0..=1.0).contains(weight) {
            return Err(ConfigError::Validation(format!(
                "sources.reliability weight for `{source}` must be in range 0.0..=1.0"
            )));
        }
    }

    let amadeus = &sources.amadeus;
    let has_key = amadeus.api_key.is_some();
    let has_secret = amadeus.api_secret.is_some();
    if has_key != has_secret {
        return Err(ConfigError::Validation(
            "sources.amadeus requires both api_key and api_secret or neither".to_string(),
        ));
    }

    if !amadeus.base_url.starts_with("http://") && !amadeus.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "sources.amadeus.base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.ttl_secs == 0 {
        return Err(ConfigError::Validation(
            "session.ttl_secs must be greater than zero".to_string(),
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
    server: Option<ServerPatch>,
    search: Option<SearchPatch>,
    sources: Option<SourcesPatch>,
    session: Option<SessionPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchPatch {
    max_offers_per_source: Option<u32>,
    display_results: Option<usize>,
    source_timeout_secs: Option<u64>,
    http_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SourcesPatch {
    reliability: Option<BTreeMap<String, f64>>,
    amadeus: Option<AmadeusPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct AmadeusPatch {
    api_key: Option<String>,
    api_secret: Option<String>,
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    ttl_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
