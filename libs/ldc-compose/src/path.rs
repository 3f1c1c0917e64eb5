//! Dotted-path resolution with optional `[n]` array indexing (§4.10),
//! used by both `@ref` and `@rollup`'s `property`/`select` fields.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// Splits `"items[0].budget"` into `[Key("items"), Index(0), Key("budget")]`.
/// Unparsable `[...]` contents are dropped silently — they'll simply fail
/// to resolve, which is the same "missing segment" outcome as any other
/// absent path component (§4.10: "missing segments yield undefined").
pub fn parse_segments(path: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    for dotted in path.split('.') {
        let mut rest = dotted;
        while let Some(open) = rest.find('[') {
            let (head, tail) = rest.split_at(open);
            if !head.is_empty() {
                segments.push(Segment::Key(head.to_string()));
            }
            let close = tail.find(']').unwrap_or(tail.len());
            if let Ok(index) = tail[1..close.min(tail.len())].parse::<usize>() {
                segments.push(Segment::Index(index));
            }
            rest = &tail[close.saturating_add(1).min(tail.len())..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Key(rest.to_string()));
        }
    }
    segments
}

/// Walks `segments` against `root`, stopping at the first missing key,
/// wrong-shaped container, or out-of-range index.
pub fn resolve<'a>(root: &'a serde_json::Value, segments: &[Segment]) -> Option<&'a serde_json::Value> {
    let mut current = root;
    for segment in segments {
        current = match (segment, current) {
            (Segment::Key(k), serde_json::Value::Object(map)) => map.get(k)?,
            (Segment::Index(i), serde_json::Value::Array(items)) => items.get(*i)?,
            _ => return None,
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn splits_dotted_and_bracketed_segments() {
        assert_eq!(
            parse_segments("items[0].budget"),
            vec![Segment::Key("items".into()), Segment::Index(0), Segment::Key("budget".into())]
        );
    }

    #[test]
    fn bare_dotted_path_has_no_index_segments() {
        assert_eq!(
            parse_segments("projects.items.budget"),
            vec![Segment::Key("projects".into()), Segment::Key("items".into()), Segment::Key("budget".into())]
        );
    }

    #[test]
    fn resolves_through_nested_arrays_and_objects() {
        let doc = json!({"items": [{"budget": 100}, {"budget": 50}]});
        let segments = parse_segments("items[1].budget");
        assert_eq!(resolve(&doc, &segments), Some(&json!(50)));
    }

    #[test]
    fn missing_segment_resolves_to_none() {
        let doc = json!({"items": []});
        let segments = parse_segments("items[0].budget");
        assert_eq!(resolve(&doc, &segments), None);
    }
}
