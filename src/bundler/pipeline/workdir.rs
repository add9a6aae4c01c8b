//! Per-operation working directories.

use crate::bundler::{
    contract::BundlerContext,
    error::{ErrorExt, Result},
    params::{ParamStore, standard::BUILD_ROOT},
};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A transient directory owned by one bundling operation.
///
/// Created under the `buildRoot` parameter. [`WorkDir::release`] deletes it,
/// or hands it over to the caller when the context asks to retain working
/// directories. Dropping an unreleased `WorkDir` also deletes it.
#[derive(Debug)]
pub struct WorkDir {
    dir: TempDir,
    build_root: PathBuf,
    format: &'static str,
    config_files: Vec<PathBuf>,
}

impl WorkDir {
    /// Creates a fresh directory `<buildRoot>/<format>-XXXXXX`.
    pub async fn create(store: &ParamStore, format: &'static str) -> Result<Self> {
        let build_root = BUILD_ROOT.require(store)?;
        let build_root = build_root
            .absolutize()
            .fs_context("resolving build root", &build_root)?
            .into_owned();
        tokio::fs::create_dir_all(&build_root)
            .await
            .fs_context("creating build root", &build_root)?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{format}-"))
            .tempdir_in(&build_root)
            .fs_context("creating working directory in", &build_root)?;

        log::debug!("Working directory: {}", dir.path().display());

        Ok(Self {
            dir,
            build_root,
            format,
            config_files: Vec::new(),
        })
    }

    /// Root of the working directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remembers a rendered configuration file, saved on release in verbose
    /// mode.
    pub fn record_config(&mut self, path: impl Into<PathBuf>) {
        self.config_files.push(path.into());
    }

    /// Directory receiving saved configuration files in verbose mode.
    pub fn config_root(&self) -> PathBuf {
        self.build_root.join(format!("{}-config", self.format))
    }

    /// Releases the directory.
    ///
    /// Runs after the pipeline result is known, whether it succeeded or not.
    /// Failures here are logged, never returned, so they cannot mask the
    /// pipeline result.
    pub async fn release(self, store: &ParamStore, ctx: &BundlerContext) {
        if ctx.is_verbose(store) && !self.config_files.is_empty() {
            let config_root = self.config_root();
            match save_configs(&self.config_files, &config_root).await {
                Ok(()) => log::info!(
                    "Config files are saved to {}. Use them to customize the package.",
                    config_root.display()
                ),
                Err(e) => log::warn!("Could not save config files: {e}"),
            }
        }

        if ctx.retain_working_dir() {
            let kept = self.dir.keep();
            log::info!("Kept working directory for debug: {}", kept.display());
            return;
        }

        let path = self.dir.path().to_path_buf();
        if let Err(e) = self.dir.close() {
            log::warn!(
                "Failed to remove working directory {}: {}",
                path.display(),
                e
            );
        }
    }
}

async fn save_configs(files: &[PathBuf], config_root: &Path) -> Result<()> {
    tokio::fs::create_dir_all(config_root)
        .await
        .fs_context("creating config directory", config_root)?;
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        if file.exists() {
            let target = config_root.join(name);
            tokio::fs::copy(file, &target)
                .await
                .fs_context("saving config file", &target)?;
        }
    }
    Ok(())
}
