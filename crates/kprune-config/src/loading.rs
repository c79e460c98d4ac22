//! Layered configuration loading.
//!
//! Precedence, lowest to highest: built-in defaults, the user config
//! (`~/.kprune/config.toml`), the project config (`./.kprune/config.toml`),
//! an explicit `--config` file, then environment overrides.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::types::{KpruneConfig, MAX_LIST_RETRIES, MAX_LIST_RETRY_BACKOFF_MS};

pub const DRY_RUN_ENV: &str = "KPRUNE_DRY_RUN";
pub const NAMESPACE_ENV: &str = "KPRUNE_NAMESPACE";

const CONFIG_DIR: &str = ".kprune";
const CONFIG_FILE: &str = "config.toml";

pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn project_config_path() -> PathBuf {
    PathBuf::from(CONFIG_DIR).join(CONFIG_FILE)
}

/// Load the full configuration hierarchy for the current user and directory.
pub fn load_hierarchy(explicit: Option<&Path>) -> Result<KpruneConfig, ConfigError> {
    let user = user_config_path();
    let project = project_config_path();
    load_layers(user.as_deref(), Some(&project), explicit)
}

/// Load configuration from the given layers.
///
/// Implicit layers (`user`, `project`) are skipped when absent. An explicit
/// path that does not exist is an error.
pub fn load_layers(
    user: Option<&Path>,
    project: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<KpruneConfig, ConfigError> {
    let mut merged = toml::Value::Table(toml::value::Table::new());

    for path in [user, project].into_iter().flatten() {
        if !path.exists() {
            debug!(
                event = "config.load.layer_skipped",
                path = %path.display()
            );
            continue;
        }
        merge_values(&mut merged, read_layer(path)?);
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        merge_values(&mut merged, read_layer(path)?);
    }

    let mut config: KpruneConfig = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::ConfigParseError {
            message: e.to_string(),
        })?;

    apply_env_overrides(&mut config)?;
    validate(&config)?;

    info!(
        event = "config.load.completed",
        dry_run = config.prune.dry_run,
        namespace = %config.prune.namespace,
        custom_catalog = config.catalog.is_some()
    );

    Ok(config)
}

fn read_layer(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let value = content
        .parse::<toml::Table>()
        .map_err(|e| ConfigError::ConfigParseError {
            message: format!("{}: {}", path.display(), e),
        })?;
    debug!(event = "config.load.layer_read", path = %path.display());
    Ok(toml::Value::Table(value))
}

/// Overlay `overlay` onto `base`, recursing into tables.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

pub fn apply_env_overrides(config: &mut KpruneConfig) -> Result<(), ConfigError> {
    if let Ok(value) = std::env::var(DRY_RUN_ENV) {
        config.prune.dry_run = parse_bool(&value).ok_or_else(|| {
            ConfigError::InvalidConfiguration {
                message: format!("{} must be a boolean, got '{}'", DRY_RUN_ENV, value),
            }
        })?;
    }

    if let Ok(value) = std::env::var(NAMESPACE_ENV)
        && !value.is_empty()
    {
        config.prune.namespace = value;
    }

    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn validate(config: &KpruneConfig) -> Result<(), ConfigError> {
    if config.prune.namespace.trim().is_empty() {
        return Err(ConfigError::InvalidConfiguration {
            message: "prune.namespace must not be empty".to_string(),
        });
    }

    if config.prune.metadata_domain.trim().is_empty() {
        return Err(ConfigError::InvalidConfiguration {
            message: "prune.metadata_domain must not be empty".to_string(),
        });
    }

    if config.prune.list_retries > MAX_LIST_RETRIES {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "prune.list_retries must be at most {}, got {}",
                MAX_LIST_RETRIES, config.prune.list_retries
            ),
        });
    }

    if config.prune.list_retry_backoff_ms > MAX_LIST_RETRY_BACKOFF_MS {
        return Err(ConfigError::InvalidConfiguration {
            message: format!(
                "prune.list_retry_backoff_ms must be at most {}, got {}",
                MAX_LIST_RETRY_BACKOFF_MS, config.prune.list_retry_backoff_ms
            ),
        });
    }

    if let Some(owner) = &config.owner
        && (owner.name.is_empty() || owner.namespace.is_empty())
    {
        return Err(ConfigError::InvalidConfiguration {
            message: "owner.name and owner.namespace must both be set".to_string(),
        });
    }

    if let Some(catalog) = &config.catalog
        && catalog.namespaced.is_empty()
        && catalog.cluster_scoped.is_empty()
    {
        return Err(ConfigError::InvalidConfiguration {
            message: "catalog must list at least one kind".to_string(),
        });
    }

    Ok(())
}
