//! Multi-valued query parameters.

use std::collections::BTreeMap;

use crate::Result;

/// String-keyed, multi-valued query parameters.
///
/// Keys are kept sorted so the encoded form is stable; values keep their
/// insertion order.
///
/// # Example
///
/// ```
/// use courier_core::QueryValues;
///
/// let mut query = QueryValues::new();
/// query.set("q", "Athens");
/// query.add("tag", "a");
/// query.add("tag", "b");
/// assert_eq!(query.encode(), "q=Athens&tag=a&tag=b");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues(BTreeMap<String, Vec<String>>);

impl QueryValues {
    /// Creates an empty set of query values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw (already encoded) query string.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        url::form_urlencoded::parse(raw.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Serializes a struct (or map) into query values.
    ///
    /// Sequences become repeated keys (`tags=a&tags=b`).
    pub fn from_serialize<T: serde::Serialize>(value: &T) -> Result<Self> {
        let raw = serde_html_form::to_string(value)?;
        Ok(Self::parse(&raw))
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// Replaces every value of `key`; an empty iterator removes the key.
    pub fn set_all<V: Into<String>>(
        &mut self,
        key: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) {
        let key = key.into();
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            self.0.remove(&key);
        } else {
            self.0.insert(key, values);
        }
    }

    /// Appends a value to `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|values| values.first()).map(String::as_str)
    }

    /// All values of `key`, empty when absent.
    #[must_use]
    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map_or(&[], Vec::as_slice)
    }

    /// Removes `key`, returning its values.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.remove(key)
    }

    /// Copies every key of `other` into `self`, replacing existing values for
    /// the same key.
    pub fn merge(&mut self, other: &Self) {
        for (key, values) in &other.0 {
            self.set_all(key.clone(), values.iter().cloned());
        }
    }

    /// Whether there are no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(key, value)` pairs, keys sorted.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(key, values)| values.iter().map(move |v| (key.as_str(), v.as_str())))
    }

    /// Encodes as `application/x-www-form-urlencoded`.
    #[must_use]
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.add(key, value);
        }
        query
    }
}
