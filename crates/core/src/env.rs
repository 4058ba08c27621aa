//! Published environment
//!
//! The key/value state a fixture exposes to the test process. Keys are stored
//! unprefixed in insertion order; the caller decides on a prefix when the
//! values are merged into a real process environment.

use indexmap::IndexMap;
use serde::Serialize;

pub const IMAGE: &str = "IMAGE";
pub const CONTAINER_ID: &str = "CONTAINER_ID";
pub const CONTAINER_PORTS: &str = "CONTAINER_PORTS";
pub const URL: &str = "URL";

/// Insertion-ordered string map of published variables
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PublishedEnv {
    vars: IndexMap<String, String>,
}

impl PublishedEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `key`. Re-publishing a key replaces its value in place.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Copy of the variables with `prefix` prepended to every key
    pub fn prefixed(&self, prefix: &str) -> IndexMap<String, String> {
        self.vars
            .iter()
            .map(|(k, v)| (format!("{}{}", prefix, k), v.clone()))
            .collect()
    }

    /// Render as POSIX `export KEY=value` lines suitable for `eval`
    pub fn to_exports(&self, prefix: &str) -> String {
        self.vars
            .iter()
            .map(|(k, v)| format!("export {}{}={}\n", prefix, k, shell_words::quote(v)))
            .collect()
    }

    /// Render the prefixed variables as a JSON object
    pub fn to_json(&self, prefix: &str) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.prefixed(prefix))
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for PublishedEnv {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.put(k, v);
        }
    }
}
