use std::collections::HashMap;

/// Request header fields.
///
/// Names keep the spelling the client sent, but lookups ignore ASCII case.
/// A repeated name replaces the earlier value (no multi-value support).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    // lowercased name -> (name as received, value)
    entries: HashMap<String, (String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only the parser and the request builder populate headers; once a
    /// `Request` is handed out its map is read-only.
    pub(crate) fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries
            .insert(name.to_ascii_lowercase(), (name, value.into()));
    }

    /// Looks up a header value by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .map(|(_, value)| value.as_str())
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_duplicate_wins_regardless_of_case() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Token", "first");
        headers.insert("x-token", "second");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-TOKEN"), Some("second"));
        assert_eq!(headers.iter().next(), Some(("x-token", "second")));
    }
}
