//! Windows installers.

pub mod nsis;
