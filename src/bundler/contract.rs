//! The interface every packaging format implements.

use crate::bundler::{
    error::Result,
    params::{ParamDescriptor, ParamStore, standard::VERBOSE},
    pipeline::toolchain::{SystemToolchain, Toolchain},
};
use async_trait::async_trait;
use std::{
    fmt::{self, Display},
    path::{Path, PathBuf},
    sync::Arc,
};

/// What kind of distributable a bundler produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    /// Installs the application through the system package manager or an
    /// installer wizard.
    Installer,
    /// A standalone, self-contained application image.
    Image,
}

impl Display for BundleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleType::Installer => write!(f, "installer"),
            BundleType::Image => write!(f, "image"),
        }
    }
}

/// Process-wide settings threaded through every bundler call.
///
/// Built once at startup. Carries the verbosity and retention flags and the
/// service used to locate and run native tools.
#[derive(Clone)]
pub struct BundlerContext {
    verbose: bool,
    retain_working_dir: bool,
    toolchain: Arc<dyn Toolchain>,
}

impl BundlerContext {
    /// Creates a context around the given toolchain.
    pub fn new(toolchain: Arc<dyn Toolchain>) -> Self {
        Self {
            verbose: false,
            retain_working_dir: false,
            toolchain,
        }
    }

    /// Creates a context that runs tools found on `PATH`.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemToolchain))
    }

    /// Forces verbose output regardless of the store.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Keeps working directories after bundling instead of deleting them.
    pub fn with_retain_working_dir(mut self, retain: bool) -> Self {
        self.retain_working_dir = retain;
        self
    }

    /// Verbose if either the context or the store asks for it.
    pub fn is_verbose(&self, store: &ParamStore) -> bool {
        self.verbose || VERBOSE.value_or(store, false).unwrap_or(false)
    }

    /// Whether working directories are kept.
    pub fn retain_working_dir(&self) -> bool {
        self.retain_working_dir
    }

    /// The toolchain native tools are located and run through.
    pub fn toolchain(&self) -> &dyn Toolchain {
        self.toolchain.as_ref()
    }

    /// Logs at `info` in verbose mode, `debug` otherwise.
    pub fn verbose(&self, store: &ParamStore, message: impl Display) {
        if self.is_verbose(store) {
            log::info!("{message}");
        } else {
            log::debug!("{message}");
        }
    }
}

impl fmt::Debug for BundlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundlerContext")
            .field("verbose", &self.verbose)
            .field("retain_working_dir", &self.retain_working_dir)
            .finish_non_exhaustive()
    }
}

/// A packaging format.
///
/// Implementations are stateless apart from their descriptor declarations,
/// so one instance can serve many independent stores. Each call to
/// [`Bundler::bundle`] owns the working directory it creates.
///
/// Lifecycle: `validate` runs to completion first and has no side effects on
/// the filesystem. `bundle` then stages, renders, invokes the native tool and
/// collects the artifact, releasing its working directory whatever happens.
#[async_trait]
pub trait Bundler: Send + Sync {
    /// Stable, machine-facing format id, e.g. `rpm`.
    fn id(&self) -> &'static str;

    /// Human readable name.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// The kind of distributable produced.
    fn bundle_type(&self) -> BundleType;

    /// Extension of the produced artifact, without the dot.
    fn artifact_extension(&self) -> &'static str;

    /// Descriptors this bundler consumes.
    fn parameters(&self) -> Vec<&'static dyn ParamDescriptor>;

    /// Whether this format can be produced on the current host at all.
    fn supported_on_host(&self) -> bool {
        true
    }

    /// Checks the store and the native toolchain.
    ///
    /// Fails with a configuration error for bad or contradictory values and
    /// with an unsupported-platform error when the toolchain is missing or
    /// too old. Never creates files or runs the packaging tool.
    async fn validate(&self, store: &ParamStore, ctx: &BundlerContext) -> Result<()>;

    /// Produces the artifact in `output_dir` and returns its path.
    ///
    /// Stages may write derived values back into `store`.
    async fn bundle(
        &self,
        store: &mut ParamStore,
        output_dir: &Path,
        ctx: &BundlerContext,
    ) -> Result<PathBuf>;
}

impl fmt::Debug for dyn Bundler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundler").field("id", &self.id()).finish()
    }
}
