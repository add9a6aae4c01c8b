//! Concrete packaging formats, grouped by the platform they target.

pub mod linux;
pub mod macos;
pub mod windows;
