//! Parameter-driven bundler library for creating native installers
//!
//! This library resolves typed packaging parameters and runs them through a
//! shared pipeline to produce:
//! - Linux packages (.rpm, .deb)
//! - macOS disk images (.dmg)
//! - Windows installers (.exe via NSIS)
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod bundler;
pub mod cli;
pub mod error;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
