//! Bundler lookup and batch dispatch.
//!
//! [`BundlerRegistry`] maps format ids to [`Bundler`] implementations;
//! [`Dispatcher`] runs a selection of them against one parameter store and
//! reports every format's outcome independently.

pub mod checksum;
mod dispatch;

pub use dispatch::{BatchReport, BundleOutcome, BundleRequest, BundledArtifact, Dispatcher};

use crate::bundler::{
    contract::{BundleType, Bundler},
    params::DescriptorSummary,
    platform::{
        linux::{deb::DebBundler, rpm::RpmBundler},
        macos::dmg::DmgBundler,
        windows::nsis::NsisBundler,
    },
};
use serde::Serialize;
use std::sync::Arc;

/// Which formats a batch should produce.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormatSelection {
    /// Every registered format supported on this host.
    #[default]
    All,
    /// The listed format ids, in order.
    Only(Vec<String>),
}

impl FormatSelection {
    /// Builds a selection from CLI-style ids, where an empty list or `all`
    /// means every host format.
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        if ids.is_empty() || ids.iter().any(|id| id == "all") {
            Self::All
        } else {
            Self::Only(ids)
        }
    }
}

/// Result of resolving a [`FormatSelection`].
#[derive(Debug, Default)]
pub struct Selected {
    /// Bundlers to run, in request order, without duplicates.
    pub bundlers: Vec<Arc<dyn Bundler>>,
    /// Requested ids with no registered bundler.
    pub unknown: Vec<String>,
}

/// Registered bundlers, in registration order.
#[derive(Debug, Default, Clone)]
pub struct BundlerRegistry {
    bundlers: Vec<Arc<dyn Bundler>>,
}

impl BundlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in format: rpm, deb, dmg and exe.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(RpmBundler)
            .register(DebBundler)
            .register(DmgBundler)
            .register(NsisBundler);
        registry
    }

    /// Adds a bundler. A later registration with the same id replaces the
    /// earlier one.
    pub fn register(&mut self, bundler: impl Bundler + 'static) -> &mut Self {
        let bundler: Arc<dyn Bundler> = Arc::new(bundler);
        match self.bundlers.iter().position(|b| b.id() == bundler.id()) {
            Some(index) => self.bundlers[index] = bundler,
            None => self.bundlers.push(bundler),
        }
        self
    }

    /// Looks up a bundler by id.
    pub fn find(&self, id: &str) -> Option<Arc<dyn Bundler>> {
        self.bundlers.iter().find(|b| b.id() == id).cloned()
    }

    /// Registered ids, in registration order.
    pub fn ids(&self) -> Vec<&'static str> {
        self.bundlers.iter().map(|b| b.id()).collect()
    }

    /// Bundlers that can run on the current host.
    pub fn for_host(&self) -> Vec<Arc<dyn Bundler>> {
        self.bundlers
            .iter()
            .filter(|b| b.supported_on_host())
            .cloned()
            .collect()
    }

    /// Resolves a selection into bundlers plus the ids nothing matched.
    pub fn select(&self, selection: &FormatSelection) -> Selected {
        match selection {
            FormatSelection::All => Selected {
                bundlers: self.for_host(),
                unknown: Vec::new(),
            },
            FormatSelection::Only(ids) => {
                let mut selected = Selected::default();
                for id in ids {
                    match self.find(id) {
                        Some(bundler) => {
                            if !selected.bundlers.iter().any(|b| b.id() == bundler.id()) {
                                selected.bundlers.push(bundler);
                            }
                        }
                        None => {
                            if !selected.unknown.contains(id) {
                                selected.unknown.push(id.clone());
                            }
                        }
                    }
                }
                selected
            }
        }
    }

    /// Describes every registered bundler and the parameters it reads.
    pub fn describe(&self) -> Vec<BundlerSummary> {
        self.bundlers
            .iter()
            .map(|b| BundlerSummary {
                id: b.id(),
                name: b.name(),
                description: b.description(),
                bundle_type: b.bundle_type(),
                extension: b.artifact_extension(),
                supported_on_host: b.supported_on_host(),
                parameters: b.parameters().iter().map(|p| p.summary()).collect(),
            })
            .collect()
    }
}

/// Listing entry for one bundler.
#[derive(Debug, Clone, Serialize)]
pub struct BundlerSummary {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub bundle_type: BundleType,
    pub extension: &'static str,
    pub supported_on_host: bool,
    pub parameters: Vec<DescriptorSummary>,
}
