//! The `@context` CURIE-expansion map (§3 "Context map").

use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct ContextMap {
    entries: IndexMap<String, String>,
}

impl ContextMap {
    pub fn empty() -> Self {
        ContextMap { entries: IndexMap::new() }
    }

    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        let mut entries = IndexMap::new();
        if let Some(serde_json::Value::Object(map)) = value {
            for (k, v) in map {
                if let Some(base) = v.as_str() {
                    entries.insert(k.clone(), base.to_string());
                }
            }
        }
        ContextMap { entries }
    }

    /// Expands a plain key or CURIE to an absolute IRI (§3). The reserved
    /// `a` shorthand (§4.9) always expands to `rdf:type`, regardless of
    /// position — harmless since `a` is not a realistic property key.
    /// A `prefix:local` key expands via the map; an unknown prefix (or a
    /// key that's already an absolute IRI, e.g. `https://...`) passes
    /// through unchanged. A bare key with no `:` expands against the
    /// context's first entry, insertion-ordered.
    pub fn expand(&self, key: &str) -> String {
        if key == "a" {
            return "rdf:type".to_string();
        }
        if let Some((prefix, local)) = key.split_once(':') {
            if let Some(base) = self.entries.get(prefix) {
                return format!("{base}{local}");
            }
            return key.to_string();
        }
        match self.entries.first() {
            Some((_, base)) => format!("{base}{key}"),
            None => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_curie_via_named_prefix() {
        let ctx = ContextMap::from_json(Some(&json!({"ex": "https://ex/"})));
        assert_eq!(ctx.expand("ex:a"), "https://ex/a");
    }

    #[test]
    fn bare_key_uses_first_entry_as_default_base() {
        let ctx = ContextMap::from_json(Some(&json!({"ex": "https://ex/", "other": "https://other/"})));
        assert_eq!(ctx.expand("revenue"), "https://ex/revenue");
    }

    #[test]
    fn unknown_prefix_passes_through() {
        let ctx = ContextMap::from_json(Some(&json!({"ex": "https://ex/"})));
        assert_eq!(ctx.expand("https://already/absolute"), "https://already/absolute");
    }

    #[test]
    fn reserved_a_expands_to_rdf_type() {
        let ctx = ContextMap::empty();
        assert_eq!(ctx.expand("a"), "rdf:type");
    }

    #[test]
    fn empty_context_passes_bare_keys_through() {
        let ctx = ContextMap::empty();
        assert_eq!(ctx.expand("revenue"), "revenue");
    }
}
