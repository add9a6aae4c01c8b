//! Descriptors restricted to a closed vocabulary.

use super::{FromValue, ParamDescriptor, ParamInfo, ParamStore};
use crate::bundler::error::Result;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;

/// A descriptor whose legal values form a closed, displayable set.
///
/// Maps human labels (e.g. "Audio & Video") to the identifiers a native
/// format accepts (e.g. `AudioVideo`). Unknown labels never fall through to
/// a default identifier.
pub struct EnumeratedParam<T: 'static> {
    info: ParamInfo<T>,
    elements: BTreeMap<String, T>,
}

impl<T: 'static> EnumeratedParam<T> {
    /// Wraps a descriptor with its label to identifier mapping.
    pub fn new<'a>(info: ParamInfo<T>, elements: impl IntoIterator<Item = (&'a str, T)>) -> Self {
        Self {
            info,
            elements: elements
                .into_iter()
                .map(|(label, value)| (label.to_string(), value))
                .collect(),
        }
    }

    /// The displayable labels.
    pub fn displayable_keys(&self) -> BTreeSet<&str> {
        self.elements.keys().map(String::as_str).collect()
    }

    /// Looks up the identifier for a label. Unknown labels yield `None`.
    pub fn value_for(&self, label: &str) -> Option<&T> {
        self.elements.get(label)
    }

    /// Returns the underlying descriptor.
    pub fn info(&self) -> &ParamInfo<T> {
        &self.info
    }
}

impl<T: PartialEq + 'static> EnumeratedParam<T> {
    /// Returns `true` if `value` is one of the known identifiers.
    pub fn is_known_value(&self, value: &T) -> bool {
        self.elements.values().any(|v| v == value)
    }
}

impl<T: 'static> Deref for EnumeratedParam<T> {
    type Target = ParamInfo<T>;

    fn deref(&self) -> &Self::Target {
        &self.info
    }
}

impl<T: FromValue + Send + Sync + 'static> ParamDescriptor for EnumeratedParam<T> {
    fn id(&self) -> &'static str {
        self.info.id()
    }

    fn name(&self) -> &'static str {
        self.info.name()
    }

    fn description(&self) -> &'static str {
        self.info.description()
    }

    fn value_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn accepts_text(&self) -> bool {
        self.info.string_converter().is_some()
    }

    fn choices(&self) -> Option<Vec<String>> {
        Some(self.elements.keys().cloned().collect())
    }

    fn check(&self, store: &ParamStore) -> Result<()> {
        self.info.fetch_from(store).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::params::{ParamStore, info};

    fn sample() -> EnumeratedParam<String> {
        EnumeratedParam::new(
            ParamInfo::new("Kind", "kind", "kind", info::no_default, Some(info::text)),
            [("Audio & Video", "AudioVideo"), ("Game", "Game")]
                .map(|(label, id)| (label, id.to_string())),
        )
    }

    #[test]
    fn unknown_labels_have_no_value() {
        let param = sample();
        assert_eq!(param.value_for("Game").map(String::as_str), Some("Game"));
        assert_eq!(param.value_for("game"), None);
        assert_eq!(param.value_for("Office"), None);
    }

    #[test]
    fn keys_are_the_labels() {
        let param = sample();
        let keys: Vec<_> = param.displayable_keys().into_iter().collect();
        assert_eq!(keys, vec!["Audio & Video", "Game"]);
        assert!(param.is_known_value(&"AudioVideo".to_string()));
        assert!(!param.is_known_value(&"Audio & Video".to_string()));
    }

    #[test]
    fn resolves_through_wrapped_descriptor() {
        let param = sample();
        let mut store = ParamStore::new();
        store.insert("kind", "Game");
        assert_eq!(param.fetch_from(&store).unwrap().as_deref(), Some("Game"));
        assert_eq!(param.choices().map(|c| c.len()), Some(2));
    }
}
