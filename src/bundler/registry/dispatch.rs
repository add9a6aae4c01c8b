//! Running several bundlers against one parameter store.

use super::{BundlerRegistry, FormatSelection, checksum::calculate_sha256};
use crate::bundler::{
    contract::{Bundler, BundlerContext},
    error::{Error, ErrorExt, Result},
    params::ParamStore,
    pipeline::prepare_output_dir,
};
use serde::{Serialize, Serializer, ser::SerializeStruct};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// One batch: a store, where artifacts go and which formats to build.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub store: ParamStore,
    pub output_dir: PathBuf,
    pub selection: FormatSelection,
}

/// A produced distributable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundledArtifact {
    /// Format id of the bundler that produced it.
    pub format: String,
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Hex-encoded SHA-256.
    pub checksum: String,
}

/// What happened to one requested format.
#[derive(Debug)]
pub struct BundleOutcome {
    pub format: String,
    pub result: Result<BundledArtifact>,
}

impl Serialize for BundleOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Failure<'a> {
            kind: crate::bundler::ErrorKind,
            message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            advice: Option<&'a str>,
        }

        let mut state = serializer.serialize_struct("BundleOutcome", 3)?;
        state.serialize_field("format", &self.format)?;
        match &self.result {
            Ok(artifact) => {
                state.serialize_field("status", "success")?;
                state.serialize_field("artifact", artifact)?;
            }
            Err(error) => {
                state.serialize_field("status", "failed")?;
                state.serialize_field(
                    "error",
                    &Failure {
                        kind: error.kind(),
                        message: error.to_string(),
                        advice: error.advice(),
                    },
                )?;
            }
        }
        state.end()
    }
}

/// Per-format outcomes of a batch, in request order.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<BundleOutcome>,
}

impl BatchReport {
    /// True when at least one format ran and none failed.
    pub fn all_succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.result.is_ok())
    }

    /// Artifacts of the successful formats, in request order.
    pub fn artifacts(&self) -> Vec<&BundledArtifact> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .collect()
    }

    /// Failed formats with their errors, in request order.
    pub fn failures(&self) -> Vec<(&str, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.format.as_str(), e)))
            .collect()
    }

    /// The outcome for `format`, if it was requested.
    pub fn outcome(&self, format: &str) -> Option<&BundleOutcome> {
        self.outcomes.iter().find(|o| o.format == format)
    }

    /// Pretty-printed JSON report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs a selection of bundlers.
///
/// Every selected bundler validates before any of them stages. Each works on
/// its own copy of the request store, and a failure only ends that format.
#[derive(Debug)]
pub struct Dispatcher<'a> {
    registry: &'a BundlerRegistry,
    ctx: BundlerContext,
}

impl<'a> Dispatcher<'a> {
    pub fn new(registry: &'a BundlerRegistry, ctx: BundlerContext) -> Self {
        Self { registry, ctx }
    }

    pub async fn run(&self, request: BundleRequest) -> BatchReport {
        let selected = self.registry.select(&request.selection);
        let mut slots: Vec<(String, Option<Result<BundledArtifact>>)> = Vec::new();

        for id in &selected.unknown {
            slots.push((
                id.clone(),
                Some(Err(Error::config(
                    format!("Unknown bundle format: {id}"),
                    format!(
                        "Choose one of: {}.",
                        self.registry.ids().join(", ")
                    ),
                ))),
            ));
        }

        if selected.bundlers.is_empty() {
            if slots.is_empty() {
                log::warn!("No bundler can run on this host");
            }
            return finish(slots);
        }

        let output_dir = match prepare_output_dir(&request.output_dir).await {
            Ok(dir) => dir,
            Err(e) => {
                log::error!("{e}");
                for bundler in &selected.bundlers {
                    slots.push((
                        bundler.id().to_string(),
                        Some(Err(Error::config(
                            e.to_string(),
                            e.advice().unwrap_or_default(),
                        ))),
                    ));
                }
                return finish(slots);
            }
        };

        let mut pending: Vec<(usize, Arc<dyn Bundler>, ParamStore)> = Vec::new();
        for bundler in &selected.bundlers {
            let store = request.store.clone();
            log::info!("Validating {} parameters", bundler.id());
            let slot = match bundler.validate(&store, &self.ctx).await {
                Ok(()) => {
                    pending.push((slots.len(), Arc::clone(bundler), store));
                    None
                }
                Err(e) => {
                    log::error!("{} validation failed: {}", bundler.id(), e);
                    Some(Err(e))
                }
            };
            slots.push((bundler.id().to_string(), slot));
        }

        for (index, bundler, mut store) in pending {
            log::info!("Bundling {}", bundler.name());
            let result = match bundler.bundle(&mut store, &output_dir, &self.ctx).await {
                Ok(path) => describe_artifact(bundler.id(), path).await,
                Err(e) => Err(e),
            };
            match &result {
                Ok(artifact) => log::info!(
                    "{} finished: {} ({} bytes)",
                    bundler.id(),
                    artifact.path.display(),
                    artifact.size
                ),
                Err(e) => log::error!("{} failed: {}", bundler.id(), e),
            }
            slots[index].1 = Some(result);
        }

        finish(slots)
    }
}

async fn describe_artifact(format: &str, path: PathBuf) -> Result<BundledArtifact> {
    let size = artifact_size(&path).await?;
    let checksum = calculate_sha256(&path).await?;
    Ok(BundledArtifact {
        format: format.to_string(),
        path,
        size,
        checksum,
    })
}

async fn artifact_size(path: &Path) -> Result<u64> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading artifact metadata", path)?;
    Ok(metadata.len())
}

fn finish(slots: Vec<(String, Option<Result<BundledArtifact>>)>) -> BatchReport {
    BatchReport {
        outcomes: slots
            .into_iter()
            .map(|(format, result)| BundleOutcome {
                result: result.unwrap_or_else(|| {
                    Err(Error::GenericError(format!("{format} never ran")))
                }),
                format,
            })
            .collect(),
    }
}
