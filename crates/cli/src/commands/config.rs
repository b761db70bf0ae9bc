//! The `config` command: renders the effective configuration with the source
//! of each value and secrets redacted.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use reccy_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run(config_path: Option<PathBuf>) -> String {
    let require_file = config_path.is_some();
    let config = match AppConfig::load(LoadOptions {
        config_path: config_path.clone(),
        require_file,
        overrides: Default::default(),
    }) {
        Ok(config) => config,
        Err(config_error) => return format!("config validation failed: {config_error}"),
    };

    let config_file_path = config_path.or_else(detect_config_path);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "catalog.base_url",
        &config.catalog.base_url,
        source("catalog.base_url", "RECCY_CATALOG_BASE_URL"),
    ));
    lines.push(render_line(
        "catalog.access_token",
        &redact_token(config.catalog.access_token.expose_secret()),
        source("catalog.access_token", "RECCY_CATALOG_ACCESS_TOKEN"),
    ));
    lines.push(render_line(
        "catalog.page_size",
        &config.catalog.page_size.to_string(),
        source("catalog.page_size", "RECCY_CATALOG_PAGE_SIZE"),
    ));
    lines.push(render_line(
        "catalog.timeout_secs",
        &config.catalog.timeout_secs.to_string(),
        source("catalog.timeout_secs", "RECCY_CATALOG_TIMEOUT_SECS"),
    ));

    lines.push(render_line("store.url", &config.store.url, source("store.url", "RECCY_STORE_URL")));
    lines.push(render_line(
        "store.table_name",
        &config.store.table_name,
        source("store.table_name", "RECCY_STORE_TABLE_NAME"),
    ));
    lines.push(render_line(
        "store.max_connections",
        &config.store.max_connections.to_string(),
        source("store.max_connections", "RECCY_STORE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "store.timeout_secs",
        &config.store.timeout_secs.to_string(),
        source("store.timeout_secs", "RECCY_STORE_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "pipeline.top_n",
        &config.pipeline.top_n.to_string(),
        source("pipeline.top_n", "RECCY_PIPELINE_TOP_N"),
    ));
    lines.push(render_line(
        "pipeline.sku_group_token_index",
        &config.pipeline.sku_group_token_index.to_string(),
        source("pipeline.sku_group_token_index", "RECCY_PIPELINE_SKU_GROUP_TOKEN_INDEX"),
    ));

    for (key, value) in [
        ("features.description", &config.features.description),
        ("features.manufacturer", &config.features.manufacturer),
        ("features.product_group", &config.features.product_group),
        ("features.colors", &config.features.colors),
        ("features.product_line", &config.features.product_line),
        ("features.keywords", &config.features.keywords),
        ("features.keyword_separator", &config.features.keyword_separator),
    ] {
        lines.push(render_line(
            key,
            value,
            field_source(key, "", config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "RECCY_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "RECCY_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("reccy.toml"), PathBuf::from("config/reccy.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if !env_key.is_empty() && env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_token(token: &str) -> String {
    if token.is_empty() {
        return "<unset>".to_string();
    }
    if token.len() <= 4 {
        return "****".to_string();
    }
    format!("{}****", &token[..4])
}
