//! The `run` command: one full fetch → compute → reconcile cycle.

use std::path::PathBuf;

use tracing::{error, info};
use uuid::Uuid;

use reccy_catalog::{fetch_snapshot, CatalogClient};
use reccy_core::config::{AppConfig, LoadOptions, LogFormat};
use reccy_core::pipeline::features::FeatureSchema;
use reccy_core::pipeline::grouping::HyphenTokenExtractor;
use reccy_core::reconcile::diff;
use reccy_core::Pipeline;
use reccy_db::store::StoreError;
use reccy_db::{apply_plan, connect_with_settings, RecommendationStore, SqlRecommendationStore};

use super::{CommandResult, EXIT_FATAL, EXIT_STORE_CONNECTION};

pub fn run(config_path: Option<PathBuf>, dry_run: bool) -> CommandResult {
    let require_file = config_path.is_some();
    let config = match AppConfig::load(LoadOptions {
        config_path,
        require_file,
        overrides: Default::default(),
    }) {
        Ok(config) => config,
        Err(config_error) => {
            return CommandResult::failure(
                "run",
                "config",
                config_error.to_string(),
                EXIT_FATAL,
            )
        }
    };

    init_logging(&config);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(io_error) => {
            return CommandResult::failure(
                "run",
                "runtime",
                format!("failed to start async runtime: {io_error}"),
                EXIT_FATAL,
            )
        }
    };

    match runtime.block_on(execute(&config, dry_run)) {
        Ok(message) => CommandResult::success("run", message),
        Err(failure) => {
            error!(
                event_name = "run.failed",
                error_class = failure.class,
                error = %failure.message,
                "run aborted"
            );
            CommandResult::failure("run", failure.class, failure.message, failure.exit_code)
        }
    }
}

struct RunFailure {
    class: &'static str,
    exit_code: u8,
    message: String,
}

impl RunFailure {
    fn fatal(class: &'static str, message: impl Into<String>) -> Self {
        Self { class, exit_code: EXIT_FATAL, message: message.into() }
    }
}

impl From<StoreError> for RunFailure {
    fn from(store_error: StoreError) -> Self {
        match store_error {
            StoreError::Connect { .. } => Self {
                class: "store_connection",
                exit_code: EXIT_STORE_CONNECTION,
                message: store_error.to_string(),
            },
            other => Self::fatal("store", other.to_string()),
        }
    }
}

async fn execute(config: &AppConfig, dry_run: bool) -> Result<String, RunFailure> {
    let run_id = Uuid::new_v4();
    info!(event_name = "run.started", run_id = %run_id, dry_run, "recommendation run started");

    let client = CatalogClient::new(&config.catalog)
        .map_err(|catalog_error| RunFailure::fatal("catalog", catalog_error.to_string()))?;
    let snapshot = fetch_snapshot(&client)
        .await
        .map_err(|catalog_error| RunFailure::fatal("catalog", catalog_error.to_string()))?;

    let pipeline = Pipeline::new(
        Box::new(HyphenTokenExtractor::new(config.pipeline.sku_group_token_index)),
        feature_schema(config),
        config.pipeline.top_n,
    );
    let recommendations = pipeline
        .run(&snapshot)
        .map_err(|pipeline_error| RunFailure::fatal("pipeline", pipeline_error.to_string()))?;
    let fresh = recommendations.serialized();

    let pool = connect_with_settings(
        &config.store.url,
        config.store.max_connections,
        config.store.timeout_secs,
    )
    .await?;
    let store = SqlRecommendationStore::new(pool, &config.store.table_name)?;
    store.ensure_schema().await?;

    let remote = store.load_all().await?;
    let plan = diff(&remote, &fresh);

    if dry_run {
        let message = format!(
            "dry run: {} upserts and {} deletes pending against {} remote rows",
            plan.upserts.len(),
            plan.deletes.len(),
            remote.len()
        );
        info!(event_name = "run.dry_run", run_id = %run_id, "{message}");
        return Ok(message);
    }

    let outcome = apply_plan(&store, &plan, remote.len()).await?;
    let message = format!(
        "run complete: {} products, {} upserted, {} deleted, {} unchanged",
        fresh.len(),
        outcome.upserted,
        outcome.deleted,
        outcome.unchanged
    );
    info!(event_name = "run.completed", run_id = %run_id, "{message}");

    Ok(message)
}

fn feature_schema(config: &AppConfig) -> FeatureSchema {
    FeatureSchema {
        description: config.features.description.clone(),
        manufacturer: config.features.manufacturer.clone(),
        product_group: config.features.product_group.clone(),
        colors: config.features.colors.clone(),
        product_line: config.features.product_line.clone(),
        keywords: config.features.keywords.clone(),
        keyword_separator: config.features.keyword_separator.chars().next().unwrap_or('|'),
    }
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    // A second init in one process is harmless; ignore the error.
    let result = match config.logging.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .compact()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .pretty()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_target(false)
            .with_max_level(log_level)
            .json()
            .try_init(),
    };
    let _ = result;
}
