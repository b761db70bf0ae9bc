use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::pipeline::ranking::DEFAULT_TOP_N;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
    pub features: FeaturesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub base_url: String,
    pub access_token: SecretString,
    pub page_size: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub url: String,
    pub table_name: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub top_n: usize,
    pub sku_group_token_index: usize,
}

/// Attribute codes that feed the feature composer.
#[derive(Clone, Debug)]
pub struct FeaturesConfig {
    pub description: String,
    pub manufacturer: String,
    pub product_group: String,
    pub colors: String,
    pub product_line: String,
    pub keywords: String,
    pub keyword_separator: String,
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
    pub catalog_base_url: Option<String>,
    pub catalog_access_token: Option<String>,
    pub store_url: Option<String>,
    pub store_table_name: Option<String>,
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
            catalog: CatalogConfig {
                base_url: String::new(),
                access_token: String::new().into(),
                page_size: 500,
                timeout_secs: 30,
            },
            store: StoreConfig {
                url: "sqlite://reccy.db".to_string(),
                table_name: "product_recommendations".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            pipeline: PipelineConfig { top_n: DEFAULT_TOP_N, sku_group_token_index: 2 },
            features: FeaturesConfig {
                description: "short_description".to_string(),
                manufacturer: "manufacturer".to_string(),
                product_group: "product_group".to_string(),
                colors: "colors".to_string(),
                product_line: "product_line".to_string(),
                keywords: "name_keywords".to_string(),
                keyword_separator: "|".to_string(),
            },
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
    /// Loads the effective configuration: defaults, then the config file,
    /// then `RECCY_*` environment overrides, then programmatic overrides.
    ///
    /// A required-but-missing file is fatal. A file that exists but fails to
    /// parse is logged as a warning and the run continues on the remaining
    /// layers; this mirrors the long-standing behavior operators rely on.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            match read_patch(&path)? {
                Ok(patch) => config.apply_patch(patch),
                Err(parse_error) => warn!(
                    event_name = "config.parse_failed",
                    path = %path.display(),
                    error = %parse_error,
                    "config file could not be parsed; continuing with defaults and overrides"
                ),
            }
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("reccy.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(base_url) = catalog.base_url {
                self.catalog.base_url = base_url;
            }
            if let Some(token) = catalog.access_token {
                self.catalog.access_token = token.into();
            }
            if let Some(page_size) = catalog.page_size {
                self.catalog.page_size = page_size;
            }
            if let Some(timeout_secs) = catalog.timeout_secs {
                self.catalog.timeout_secs = timeout_secs;
            }
        }

        if let Some(store) = patch.store {
            if let Some(url) = store.url {
                self.store.url = url;
            }
            if let Some(table_name) = store.table_name {
                self.store.table_name = table_name;
            }
            if let Some(max_connections) = store.max_connections {
                self.store.max_connections = max_connections;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
        }

        if let Some(pipeline) = patch.pipeline {
            if let Some(top_n) = pipeline.top_n {
                self.pipeline.top_n = top_n;
            }
            if let Some(index) = pipeline.sku_group_token_index {
                self.pipeline.sku_group_token_index = index;
            }
        }

        if let Some(features) = patch.features {
            if let Some(description) = features.description {
                self.features.description = description;
            }
            if let Some(manufacturer) = features.manufacturer {
                self.features.manufacturer = manufacturer;
            }
            if let Some(product_group) = features.product_group {
                self.features.product_group = product_group;
            }
            if let Some(colors) = features.colors {
                self.features.colors = colors;
            }
            if let Some(product_line) = features.product_line {
                self.features.product_line = product_line;
            }
            if let Some(keywords) = features.keywords {
                self.features.keywords = keywords;
            }
            if let Some(separator) = features.keyword_separator {
                self.features.keyword_separator = separator;
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
        if let Some(value) = read_env("RECCY_CATALOG_BASE_URL") {
            self.catalog.base_url = value;
        }
        if let Some(value) = read_env("RECCY_CATALOG_ACCESS_TOKEN") {
            self.catalog.access_token = value.into();
        }
        if let Some(value) = read_env("RECCY_CATALOG_PAGE_SIZE") {
            self.catalog.page_size = parse_u32("RECCY_CATALOG_PAGE_SIZE", &value)?;
        }
        if let Some(value) = read_env("RECCY_CATALOG_TIMEOUT_SECS") {
            self.catalog.timeout_secs = parse_u64("RECCY_CATALOG_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RECCY_STORE_URL") {
            self.store.url = value;
        }
        if let Some(value) = read_env("RECCY_STORE_TABLE_NAME") {
            self.store.table_name = value;
        }
        if let Some(value) = read_env("RECCY_STORE_MAX_CONNECTIONS") {
            self.store.max_connections = parse_u32("RECCY_STORE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("RECCY_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_u64("RECCY_STORE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("RECCY_PIPELINE_TOP_N") {
            self.pipeline.top_n = parse_usize("RECCY_PIPELINE_TOP_N", &value)?;
        }
        if let Some(value) = read_env("RECCY_PIPELINE_SKU_GROUP_TOKEN_INDEX") {
            self.pipeline.sku_group_token_index =
                parse_usize("RECCY_PIPELINE_SKU_GROUP_TOKEN_INDEX", &value)?;
        }

        if let Some(value) = read_env("RECCY_LOGGING_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("RECCY_LOGGING_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(base_url) = overrides.catalog_base_url {
            self.catalog.base_url = base_url;
        }
        if let Some(token) = overrides.catalog_access_token {
            self.catalog.access_token = token.into();
        }
        if let Some(url) = overrides.store_url {
            self.store.url = url;
        }
        if let Some(table_name) = overrides.store_table_name {
            self.store.table_name = table_name;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_store(&self.store)?;
        validate_pipeline(&self.pipeline)?;
        validate_features(&self.features)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("reccy.toml"), PathBuf::from("config/reccy.toml")]
        .into_iter()
        .find(|path| path.exists())
}

/// Outer error: unreadable file or broken interpolation. Inner error: the
/// file was read but is not valid TOML, which the caller downgrades to a
/// warning.
fn read_patch(path: &Path) -> Result<Result<ConfigPatch, toml::de::Error>, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    Ok(toml::from_str::<ConfigPatch>(&interpolated))
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

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    let base_url = catalog.base_url.trim();
    if base_url.is_empty() {
        return Err(ConfigError::Validation(
            "catalog.base_url is required (the catalog source's REST endpoint)".to_string(),
        ));
    }
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "catalog.base_url must start with http:// or https://".to_string(),
        ));
    }

    if catalog.access_token.expose_secret().is_empty() {
        return Err(ConfigError::Validation(
            "catalog.access_token is required (integration access token)".to_string(),
        ));
    }

    if catalog.page_size == 0 {
        return Err(ConfigError::Validation(
            "catalog.page_size must be greater than zero".to_string(),
        ));
    }

    if catalog.timeout_secs == 0 || catalog.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "catalog.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    let url = store.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "store.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if !is_valid_table_name(&store.table_name) {
        return Err(ConfigError::Validation(format!(
            "store.table_name `{}` must be a plain identifier (letters, digits, underscores, \
             not starting with a digit)",
            store.table_name
        )));
    }

    if store.max_connections == 0 {
        return Err(ConfigError::Validation(
            "store.max_connections must be greater than zero".to_string(),
        ));
    }

    if store.timeout_secs == 0 || store.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "store.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

/// The table name is interpolated into SQL (identifiers cannot be bound), so
/// it is restricted to a plain identifier.
pub fn is_valid_table_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

fn validate_pipeline(pipeline: &PipelineConfig) -> Result<(), ConfigError> {
    if pipeline.top_n == 0 {
        return Err(ConfigError::Validation(
            "pipeline.top_n must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_features(features: &FeaturesConfig) -> Result<(), ConfigError> {
    if features.keyword_separator.chars().count() != 1 {
        return Err(ConfigError::Validation(
            "features.keyword_separator must be a single character".to_string(),
        ));
    }

    for (field, code) in [
        ("features.description", &features.description),
        ("features.manufacturer", &features.manufacturer),
        ("features.product_group", &features.product_group),
        ("features.colors", &features.colors),
        ("features.product_line", &features.product_line),
        ("features.keywords", &features.keywords),
    ] {
        if code.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{field} must not be empty")));
        }
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

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    store: Option<StorePatch>,
    pipeline: Option<PipelinePatch>,
    features: Option<FeaturesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    base_url: Option<String>,
    access_token: Option<String>,
    page_size: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    url: Option<String>,
    table_name: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelinePatch {
    top_n: Option<usize>,
    sku_group_token_index: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct FeaturesPatch {
    description: Option<String>,
    manufacturer: Option<String>,
    product_group: Option<String>,
    colors: Option<String>,
    product_line: Option<String>,
    keywords: Option<String>,
    keyword_separator: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
