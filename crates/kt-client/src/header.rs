//! Request header model and the credential/caller header merge.

use std::collections::HashMap;

/// Header key whose values accumulate instead of overwriting.
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// A single header entry.
///
/// Entries are kept as an ordered sequence; two entries with the same key are
/// allowed and resolved by [`merge_headers`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpHeader {
    key: String,
    value: String,
}

impl HttpHeader {
    /// Create a header entry.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Header name.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Header value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Merge credential headers with caller headers into one key/value mapping.
///
/// The mapping is seeded from `credentials`. Every caller header then
/// overwrites an existing key, except [`USER_AGENT_HEADER`]: when that key is
/// already present the new value is appended after a single space.
pub fn merge_headers<'a, I>(credentials: &[HttpHeader], caller: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = &'a HttpHeader>,
{
    let mut merged: HashMap<String, String> = credentials
        .iter()
        .map(|h| (h.key.clone(), h.value.clone()))
        .collect();

    for header in caller {
        if header.key == USER_AGENT_HEADER {
            if let Some(existing) = merged.get_mut(&header.key) {
                existing.push(' ');
                existing.push_str(&header.value);
                continue;
            }
        }
        merged.insert(header.key.clone(), header.value.clone());
    }

    merged
}
