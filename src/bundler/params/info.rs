//! Typed, self-describing parameter descriptors.

use super::{FromValue, ParamStore, Value};
use crate::bundler::error::{Error, Result};
use std::path::PathBuf;

/// Computes a default value from the current store.
///
/// Must be a pure function of the store: no captured state, no writes. It
/// may resolve sibling descriptors, in any order.
pub type DefaultFn<T> = fn(&ParamStore) -> Result<Option<T>>;

/// Converts unparsed text (CLI flag, config override) into a typed value.
pub type ConverterFn<T> = fn(&str, &ParamStore) -> Result<T>;

/// Object-safe view of a descriptor, used for bundler parameter listings.
pub trait ParamDescriptor: Send + Sync {
    /// Stable store key.
    fn id(&self) -> &'static str;
    /// Display name.
    fn name(&self) -> &'static str;
    /// Human description.
    fn description(&self) -> &'static str;
    /// Rust type of the resolved value.
    fn value_type(&self) -> &'static str;
    /// Whether raw text can be converted for this descriptor.
    fn accepts_text(&self) -> bool;
    /// Displayable choices, for enumerated descriptors.
    fn choices(&self) -> Option<Vec<String>> {
        None
    }
    /// Resolves against `store` and discards the value, surfacing
    /// conversion failures.
    fn check(&self, store: &ParamStore) -> Result<()>;

    /// Serializable summary of this descriptor.
    fn summary(&self) -> DescriptorSummary {
        DescriptorSummary {
            id: self.id(),
            name: self.name(),
            description: self.description(),
            value_type: self.value_type(),
            choices: self.choices(),
        }
    }
}

/// Serializable description of a parameter.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DescriptorSummary {
    /// Stable store key.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Human description.
    pub description: &'static str,
    /// Rust type of the resolved value.
    #[serde(rename = "type")]
    pub value_type: &'static str,
    /// Displayable choices for enumerated parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
}

/// A named, typed configuration slot.
///
/// Descriptors are immutable and shared across invocations. They are never
/// stored in a [`ParamStore`]; only their resolved values are.
pub struct ParamInfo<T: 'static> {
    name: &'static str,
    description: &'static str,
    id: &'static str,
    default: DefaultFn<T>,
    converter: Option<ConverterFn<T>>,
}

impl<T: 'static> ParamInfo<T> {
    /// Creates a descriptor.
    pub const fn new(
        name: &'static str,
        description: &'static str,
        id: &'static str,
        default: DefaultFn<T>,
        converter: Option<ConverterFn<T>>,
    ) -> Self {
        Self {
            name,
            description,
            id,
            default,
            converter,
        }
    }

    /// Stable store key.
    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Human description.
    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Returns the string converter, if any.
    pub fn string_converter(&self) -> Option<ConverterFn<T>> {
        self.converter
    }
}

impl<T: FromValue + 'static> ParamInfo<T> {
    /// Resolves this descriptor against a store.
    ///
    /// 1. a stored explicit null yields `None`
    /// 2. stored text is run through the string converter, when there is one,
    ///    so grammar checks and label lookups apply to every textual value
    /// 3. any other stored value of type `T` is returned as-is
    /// 4. otherwise the default function is evaluated against the same store
    ///
    /// The store is never written. Only a failing string conversion (or a
    /// failing conversion inside a dependent default) is an error.
    pub fn fetch_from(&self, store: &ParamStore) -> Result<Option<T>> {
        match store.get(self.id) {
            Some(Value::Null) => Ok(None),
            Some(value) => {
                if let (Some(raw), Some(convert)) = (value.as_raw_str(), self.converter) {
                    return convert(raw, store).map(Some);
                }
                if let Some(typed) = T::from_value(value) {
                    return Ok(Some(typed));
                }
                log::debug!(
                    "Parameter '{}' holds a {} value, expected {}; using default",
                    self.id,
                    value.type_name(),
                    std::any::type_name::<T>()
                );
                (self.default)(store)
            }
            None => (self.default)(store),
        }
    }

    /// Resolves the descriptor, substituting `fallback` for an absent value.
    pub fn value_or(&self, store: &ParamStore, fallback: T) -> Result<T> {
        Ok(self.fetch_from(store)?.unwrap_or(fallback))
    }

    /// Resolves the descriptor, failing with a configuration error when no
    /// value and no default exist.
    pub fn require(&self, store: &ParamStore) -> Result<T> {
        self.fetch_from(store)?.ok_or_else(|| {
            Error::config(
                format!("Missing required parameter \"{}\" ({}).", self.id, self.name),
                format!("Set the \"{}\" parameter.", self.id),
            )
        })
    }

    /// Applies the string converter to `raw`.
    pub fn convert(&self, raw: &str, store: &ParamStore) -> Result<T> {
        match self.converter {
            Some(convert) => convert(raw, store),
            None => Err(Error::config(
                format!("Parameter \"{}\" cannot be set from text.", self.id),
                "Provide this parameter through a configuration file or the library API.",
            )),
        }
    }
}

impl<T: FromValue + 'static> ParamDescriptor for ParamInfo<T> {
    fn id(&self) -> &'static str {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn value_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn accepts_text(&self) -> bool {
        self.converter.is_some()
    }

    fn check(&self, store: &ParamStore) -> Result<()> {
        self.fetch_from(store).map(drop)
    }
}

impl<T> std::fmt::Debug for ParamInfo<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamInfo").field("id", &self.id).finish()
    }
}

/// No default value.
pub fn no_default<T>(_: &ParamStore) -> Result<Option<T>> {
    Ok(None)
}

/// Converter for text parameters.
pub fn text(raw: &str, _: &ParamStore) -> Result<String> {
    Ok(raw.to_string())
}

/// Converter for boolean flags: `true/false`, `yes/no`, `1/0`, `on/off`.
pub fn boolean(raw: &str, _: &ParamStore) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(Error::config(
            format!("Invalid boolean value \"{raw}\"."),
            "Use one of: true, false, yes, no, 1, 0.",
        )),
    }
}

/// Converter for paths.
pub fn path(raw: &str, _: &ParamStore) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        return Err(Error::config(
            "Empty path value.",
            "Provide a file or directory path.",
        ));
    }
    Ok(PathBuf::from(raw))
}

/// Converter for comma separated lists. Order is preserved.
pub fn text_list(raw: &str, _: &ParamStore) -> Result<Vec<String>> {
    Ok(raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}
