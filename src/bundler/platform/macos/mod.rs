//! macOS distribution formats.

pub mod dmg;
