//! The untyped key/value bag backing one bundling operation.

use super::{FromValue, Value};
use std::collections::HashMap;

/// Flat mapping from parameter id to [`Value`].
///
/// Keys are unique and the last write wins. A key holding [`Value::Null`] is
/// distinct from an absent key: it tells descriptors not to compute their
/// default.
///
/// A store is owned by one in-flight operation. Reads never mutate it;
/// pipeline stages may write derived values back explicitly.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct ParamStore {
    values: HashMap<String, Value>,
}

impl ParamStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Inserts an explicit null, suppressing the descriptor default.
    pub fn insert_null(&mut self, key: impl Into<String>) {
        self.values.insert(key.into(), Value::Null);
    }

    /// Writes the value only when it is `Some`, keeping any previous or
    /// default value otherwise.
    pub fn put_unless_none<V: Into<Value>>(&mut self, key: impl Into<String>, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Writes the value only when it carries content (non-null, non-empty).
    pub fn put_unless_empty(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let value = value.into();
        if !value.is_empty() {
            self.insert(key, value);
        }
    }

    /// Returns the raw stored value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns `true` if the key is present, including explicit nulls.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes a key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Number of keys in the store.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over all entries in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copies every entry of `other` into this store.
    pub fn extend(&mut self, other: &ParamStore) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Returns a new store with `overlay` written on top of this one.
    ///
    /// Used to scope secondary launchers: their own identity fields win,
    /// everything else resolves against the primary store.
    pub fn overlay(&self, overlay: &ParamStore) -> ParamStore {
        let mut merged = self.clone();
        merged.extend(overlay);
        merged
    }

    /// Fetches a typed value, falling back instead of failing.
    ///
    /// - stored value of the right type: returned as-is
    /// - stored explicit null: `None`
    /// - absent or mistyped: `fallback`
    pub fn fetch_typed_or_default<T: FromValue>(&self, key: &str, fallback: Option<T>) -> Option<T> {
        match self.values.get(key) {
            Some(Value::Null) => None,
            Some(value) => match T::from_value(value) {
                Some(typed) => Some(typed),
                None => {
                    log::debug!(
                        "Parameter '{}' holds a {} value of unexpected type; using fallback",
                        key,
                        value.type_name()
                    );
                    fallback
                }
            },
            None => fallback,
        }
    }
}

impl FromIterator<(String, Value)> for ParamStore {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_unless_helpers_preserve_previous_values() {
        let mut store = ParamStore::new();
        store.insert("vendor", "Acme");
        store.put_unless_none::<String>("vendor", None);
        store.put_unless_empty("vendor", "");
        store.put_unless_empty("licenseFile", Vec::<String>::new());

        assert_eq!(store.get("vendor"), Some(&Value::from("Acme")));
        assert!(!store.contains_key("licenseFile"));

        store.put_unless_none("vendor", Some("Globex"));
        assert_eq!(store.get("vendor"), Some(&Value::from("Globex")));
    }

    #[test]
    fn fetch_typed_or_default_falls_back_on_type_mismatch() {
        let mut store = ParamStore::new();
        store.insert("systemWide", "not-a-bool");
        assert_eq!(store.fetch_typed_or_default("systemWide", Some(true)), Some(true));

        store.insert("systemWide", false);
        assert_eq!(store.fetch_typed_or_default("systemWide", Some(true)), Some(false));

        store.insert_null("systemWide");
        assert_eq!(store.fetch_typed_or_default::<bool>("systemWide", Some(true)), None);
    }

    #[test]
    fn overlay_prefers_overlay_entries() {
        let mut base = ParamStore::new();
        base.insert("appName", "Main");
        base.insert("vendor", "Acme");

        let mut launcher = ParamStore::new();
        launcher.insert("appName", "Helper");

        let scoped = base.overlay(&launcher);
        assert_eq!(scoped.get("appName"), Some(&Value::from("Helper")));
        assert_eq!(scoped.get("vendor"), Some(&Value::from("Acme")));
        assert_eq!(base.get("appName"), Some(&Value::from("Main")));
    }
}
