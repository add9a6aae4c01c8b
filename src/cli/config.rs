//! Building the parameter store from a TOML file and CLI overrides.

use super::Args;
use crate::{
    bundler::{ParamStore, Value, params::standard::BUILD_ROOT},
    error::{CliError, Result},
};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    params: toml::Table,
}

/// Parses the `[params]` table of a config file into a store.
///
/// Strings stay raw text so descriptor converters see them exactly as an
/// override would; tables become nested stores.
pub fn parse_params(text: &str) -> Result<ParamStore> {
    let file: ConfigFile = toml::from_str(text)?;
    Ok(file
        .params
        .into_iter()
        .map(|(key, value)| (key, Value::from(value)))
        .collect())
}

/// Reads `path` and parses its `[params]` table.
pub async fn load_params(path: &Path) -> Result<ParamStore> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    log::debug!("Loaded parameters from {}", path.display());
    parse_params(&text)
}

/// Config file first, then `--build-root`, `--set` and `--unset`, later
/// sources overriding earlier ones.
pub async fn build_store(args: &Args) -> Result<ParamStore> {
    let conflicts = args.conflicting_keys();
    if !conflicts.is_empty() {
        return Err(CliError::ConflictingArguments {
            arguments: conflicts,
        }
        .into());
    }

    let mut store = match &args.config {
        Some(path) => load_params(path).await?,
        None => ParamStore::new(),
    };

    if let Some(root) = &args.build_root {
        store.insert(BUILD_ROOT.id(), root.clone());
    }
    for (key, value) in &args.set {
        store.insert(key.clone(), value.as_str());
    }
    for key in &args.unset {
        store.insert_null(key.clone());
    }
    Ok(store)
}
