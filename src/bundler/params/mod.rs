//! Parameter model: descriptors, the value store and the standard catalogue.
//!
//! A bundling operation is configured through a flat [`ParamStore`]. Typed
//! access goes through [`ParamInfo`] descriptors, which resolve themselves
//! against the store on demand:
//!
//! 1. a stored value of the descriptor type is returned
//! 2. an explicit null returns nothing and suppresses the default
//! 3. raw text is passed through the descriptor's string converter
//! 4. otherwise the default function computes a value from the same store
//!
//! Resolution never writes to the store.

mod enumerated;
mod facade;
pub mod info;
pub mod standard;
mod store;
mod value;

pub use enumerated::EnumeratedParam;
pub use facade::BundleParams;
pub use info::{DescriptorSummary, ParamDescriptor, ParamInfo};
pub use store::ParamStore;
pub use value::{FromValue, Value};
