//! Template lookup and rendering.
//!
//! Each template has a built-in default compiled into the binary. When the
//! `dropinResourcesRoot` parameter is set, a file with the same name as the
//! rendered output found there replaces the default.
//!
//! Templates use handlebars syntax (`{{APPLICATION_NAME}}`) in strict mode
//! without HTML escaping: a token with no value is a rendering error, never
//! silently empty.

use super::{replacement::ReplacementData, workdir::WorkDir};
use crate::bundler::{
    error::{Error, ErrorExt, Result},
    params::{ParamStore, standard::DROP_IN_RESOURCES_ROOT},
};
use handlebars::Handlebars;
use std::path::{Path, PathBuf};

/// A template family: its built-in text and the tokens it requires.
#[derive(Debug, Clone, Copy)]
pub struct Template {
    /// What the rendered file is, for logs.
    pub description: &'static str,
    /// Built-in default text.
    pub builtin: &'static str,
    /// Tokens that must be populated before rendering.
    pub tokens: &'static [&'static str],
}

impl Template {
    /// Returns the override for `file_name` from the drop-in root, or the
    /// built-in text.
    pub async fn load(&self, store: &ParamStore, file_name: &str) -> Result<String> {
        if let Some(root) = DROP_IN_RESOURCES_ROOT.fetch_from(store)? {
            let candidate = root.join(file_name);
            if candidate.is_file() {
                log::info!(
                    "Using custom package resource {} (loaded from {})",
                    self.description,
                    candidate.display()
                );
                return tokio::fs::read_to_string(&candidate)
                    .await
                    .fs_context("reading template override", &candidate);
            }
        }
        log::debug!(
            "Using default package resource {} [{}] (add {} to the drop-in resources root to customize)",
            self.description,
            file_name,
            file_name
        );
        Ok(self.builtin.to_string())
    }

    /// Substitutes `data` into `text`.
    pub fn render(&self, file_name: &str, text: &str, data: &ReplacementData) -> Result<String> {
        let missing = data.missing(self.tokens);
        if !missing.is_empty() {
            return Err(Error::Template {
                name: file_name.to_string(),
                reason: format!("unpopulated tokens: {}", missing.join(", ")),
            });
        }

        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);

        handlebars
            .render_template(text, data)
            .map_err(|e| Error::Template {
                name: file_name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Loads, renders and writes the template to `target`, recording it as a
    /// configuration file of `workdir`.
    pub async fn render_to(
        &self,
        workdir: &mut WorkDir,
        store: &ParamStore,
        target: &Path,
        data: &ReplacementData,
    ) -> Result<PathBuf> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let text = self.load(store, &file_name).await?;
        let rendered = self.render(&file_name, &text, data)?;

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating directory", parent)?;
        }
        tokio::fs::write(target, rendered)
            .await
            .fs_context("writing", target)?;

        workdir.record_config(target);
        Ok(target.to_path_buf())
    }
}
