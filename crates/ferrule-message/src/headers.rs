//! Ordered, case-insensitive, multi-valued header map with copy-on-write storage.

use indexmap::IndexMap;
use std::sync::Arc;

/// One or more header values.
///
/// Lets mutators accept either a single value or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderValues(Vec<String>);

impl HeaderValues {
    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl From<&str> for HeaderValues {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for HeaderValues {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<&String> for HeaderValues {
    fn from(value: &String) -> Self {
        Self(vec![value.clone()])
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(values: Vec<String>) -> Self {
        Self(values)
    }
}

impl From<Vec<&str>> for HeaderValues {
    fn from(values: Vec<&str>) -> Self {
        Self(values.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for HeaderValues {
    fn from(values: &[&str]) -> Self {
        Self(values.iter().map(|v| v.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderValues {
    fn from(values: [&str; N]) -> Self {
        Self(values.iter().map(|v| v.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    name: String,
    values: Vec<String>,
}

/// Header map keyed by the lower-cased name.
///
/// Distinct names keep their insertion order and the spelling they were first
/// set with. Cloning is cheap: storage is shared until one side writes, and a
/// write always detaches the writer first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Arc<IndexMap<String, HeaderEntry>>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values for `name`, or an empty slice.
    pub fn get(&self, name: &str) -> &[String] {
        self.entries
            .get(&key(name))
            .map(|entry| entry.values.as_slice())
            .unwrap_or(&[])
    }

    /// Values for `name` joined with `", "`.
    pub fn line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&key(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(name, values)` pairs in insertion order, names as first set.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .values()
            .map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Replace every value of `name`.
    pub fn insert(&mut self, name: &str, values: impl Into<HeaderValues>) {
        let values = values.into().into_vec();
        let entries = Arc::make_mut(&mut self.entries);
        match entries.get_mut(&key(name)) {
            Some(entry) => entry.values = values,
            None => {
                entries.insert(
                    key(name),
                    HeaderEntry {
                        name: name.to_string(),
                        values,
                    },
                );
            }
        }
    }

    /// Append to the values of `name`, creating it when absent.
    pub fn append(&mut self, name: &str, values: impl Into<HeaderValues>) {
        let values = values.into().into_vec();
        Arc::make_mut(&mut self.entries)
            .entry(key(name))
            .or_insert_with(|| HeaderEntry {
                name: name.to_string(),
                values: Vec::new(),
            })
            .values
            .extend(values);
    }

    /// Drop `name` entirely. Absent names are ignored.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let name = key(name);
        if !self.entries.contains_key(&name) {
            return None;
        }
        Arc::make_mut(&mut self.entries)
            .shift_remove(&name)
            .map(|entry| entry.values)
    }

    /// Whether both maps currently share the same storage.
    pub fn shares_storage(&self, other: &Headers) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: AsRef<str>,
    V: Into<HeaderValues>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, values) in iter {
            headers.append(name.as_ref(), values);
        }
        headers
    }
}
