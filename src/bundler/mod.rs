//! Parameter resolution and the bundling pipeline.
//!
//! - [`params`]: typed descriptors over a flat parameter store
//! - [`contract`]: the [`Bundler`] trait every format implements
//! - [`pipeline`]: shared stages (working directory, staging, templates,
//!   native tools, artifact collection)
//! - [`platform`]: the rpm, deb, dmg and exe bundlers
//! - [`registry`]: format lookup and batch dispatch

pub mod contract;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod platform;
pub mod registry;
pub mod utils;

pub use contract::{BundleType, Bundler, BundlerContext};
pub use error::{Error, ErrorKind, Result};
pub use params::{BundleParams, EnumeratedParam, ParamDescriptor, ParamInfo, ParamStore, Value};
pub use pipeline::{Toolchain, ToolCommand, ToolOutput};
pub use registry::{
    BatchReport, BundleOutcome, BundleRequest, BundledArtifact, BundlerRegistry, Dispatcher,
    FormatSelection,
};
