//! Flat token maps consumed by templates.

use std::{collections::BTreeMap, fmt::Display};

/// Token to text substitutions for one template family.
///
/// Every value is already a string: booleans render as `true`/`false`,
/// collections are joined by the caller in the format the template expects.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct ReplacementData {
    values: BTreeMap<String, String>,
}

impl ReplacementData {
    /// An empty token map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a token.
    pub fn insert(&mut self, token: impl Into<String>, value: impl Display) -> &mut Self {
        self.values.insert(token.into(), value.to_string());
        self
    }

    /// Inserts `items` joined by `separator`.
    pub fn insert_joined<I, S>(&mut self, token: impl Into<String>, items: I, separator: &str) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = items
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(separator);
        self.values.insert(token.into(), joined);
        self
    }

    /// Populates each token not yet present with the empty string.
    pub fn default_empty(&mut self, tokens: &[&str]) -> &mut Self {
        for token in tokens {
            self.values.entry((*token).to_string()).or_default();
        }
        self
    }

    /// The value of `token`, if set.
    pub fn get(&self, token: &str) -> Option<&str> {
        self.values.get(token).map(String::as_str)
    }

    /// Whether `token` has a value, empty or not.
    pub fn contains(&self, token: &str) -> bool {
        self.values.contains_key(token)
    }

    /// Tokens of `required` that have no value.
    pub fn missing<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|token| !self.values.contains_key(*token))
            .collect()
    }

    /// A copy with `overrides` written on top.
    pub fn scoped(&self, overrides: &ReplacementData) -> ReplacementData {
        let mut merged = self.clone();
        for (token, value) in &overrides.values {
            merged.values.insert(token.clone(), value.clone());
        }
        merged
    }
}

/// Escapes text for XML element and attribute content.
pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_and_lists_render_as_text() {
        let mut data = ReplacementData::new();
        data.insert("SERVICE_HINT", true)
            .insert_joined("DESKTOP_MIMES", ["text/a", "text/b"], ";");
        assert_eq!(data.get("SERVICE_HINT"), Some("true"));
        assert_eq!(data.get("DESKTOP_MIMES"), Some("text/a;text/b"));
    }

    #[test]
    fn empty_defaults_fill_only_missing_tokens() {
        let mut data = ReplacementData::new();
        data.insert("A", "set");
        assert_eq!(data.missing(&["A", "B"]), vec!["B"]);

        data.default_empty(&["A", "B"]);
        assert_eq!(data.get("A"), Some("set"));
        assert_eq!(data.get("B"), Some(""));
        assert!(data.missing(&["A", "B"]).is_empty());
    }
}
