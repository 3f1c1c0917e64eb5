//! Walks a raw document, resolving `@relations`, `@ref` and `@rollup`
//! into inert values (§4.10) before the indexer ever sees it.

use crate::loader::DocumentLoader;
use crate::path::{self, Segment};
use crate::rollup::{self, RollupAgg};
use crate::Document;
use ldc_index::{Diagnostic, DiagnosticCode};
use std::collections::HashMap;

/// The result of composing one document: a working copy with every
/// `@ref`/`@rollup` replaced by its resolved literal, plus whatever
/// diagnostics resolution produced.
#[derive(Debug, Clone)]
pub struct Composed {
    pub document: Document,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn compose(doc: &Document, loader: &dyn DocumentLoader) -> Composed {
    let mut diagnostics = Vec::new();

    let Some(obj) = doc.as_object() else {
        // Not composer's failure to report — the indexer will flag the
        // malformed top level as a schema_error of its own.
        return Composed { document: doc.clone(), diagnostics };
    };

    let relations = load_relations(obj, loader, &mut diagnostics);

    let mut out = serde_json::Map::new();
    for (key, raw) in obj {
        if key == "@relations" {
            continue;
        }
        out.insert(key.clone(), resolve_value(key, raw, &relations, &mut diagnostics));
    }

    Composed { document: serde_json::Value::Object(out), diagnostics }
}

fn load_relations(
    obj: &serde_json::Map<String, serde_json::Value>,
    loader: &dyn DocumentLoader,
    diagnostics: &mut Vec<Diagnostic>,
) -> HashMap<String, Document> {
    let mut relations = HashMap::new();
    let Some(serde_json::Value::Object(declared)) = obj.get("@relations") else {
        return relations;
    };
    for (alias, path_value) in declared {
        let Some(path_str) = path_value.as_str() else {
            diagnostics.push(
                Diagnostic::new(DiagnosticCode::SchemaError)
                    .with_path(format!("@relations.{alias}"))
                    .with_message("relation path must be a string"),
            );
            continue;
        };
        match loader.load(alias, path_str) {
            Ok(document) => {
                relations.insert(alias.clone(), document);
            }
            Err(e) => {
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::BadRef)
                        .with_path(format!("@relations.{alias}"))
                        .with_message(e.to_string()),
                );
            }
        }
    }
    relations
}

fn is_other_directive(map: &serde_json::Map<String, serde_json::Value>) -> bool {
    ["@expr", "@view", "@constraint", "@query"].iter().any(|k| map.contains_key(*k))
}

fn resolve_value(
    key: &str,
    raw: &serde_json::Value,
    relations: &HashMap<String, Document>,
    diagnostics: &mut Vec<Diagnostic>,
) -> serde_json::Value {
    if let serde_json::Value::Object(map) = raw {
        let has_ref = map.contains_key("@ref");
        let has_rollup = map.contains_key("@rollup");

        if has_ref && has_rollup {
            diagnostics.push(
                Diagnostic::new(DiagnosticCode::SchemaError)
                    .with_path(key.to_string())
                    .with_message(format!("property \"{key}\" has both @ref and @rollup; using @ref")),
            );
        }
        if has_ref {
            return resolve_ref(key, &map["@ref"], relations, diagnostics);
        }
        if has_rollup {
            return resolve_rollup(key, map, relations, diagnostics);
        }
        if is_other_directive(map) {
            return raw.clone();
        }

        let mut out = serde_json::Map::new();
        for (child_key, child_raw) in map {
            out.insert(child_key.clone(), resolve_value(child_key, child_raw, relations, diagnostics));
        }
        return serde_json::Value::Object(out);
    }

    if let serde_json::Value::Array(items) = raw {
        return serde_json::Value::Array(
            items.iter().map(|item| resolve_value(key, item, relations, diagnostics)).collect(),
        );
    }

    raw.clone()
}

fn resolve_ref(
    key: &str,
    ref_value: &serde_json::Value,
    relations: &HashMap<String, Document>,
    diagnostics: &mut Vec<Diagnostic>,
) -> serde_json::Value {
    let Some(path_str) = ref_value.as_str() else {
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::SchemaError)
                .with_path(key.to_string())
                .with_message("@ref value must be a string path"),
        );
        return serde_json::Value::Null;
    };

    let segments = path::parse_segments(path_str);
    let Some(Segment::Key(alias)) = segments.first() else {
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::BadRef)
                .with_path(key.to_string())
                .with_message(format!("@ref path \"{path_str}\" has no relation alias")),
        );
        return serde_json::Value::Null;
    };

    let Some(relation_doc) = relations.get(alias) else {
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::BadRef)
                .with_path(key.to_string())
                .with_message(format!("@ref \"{path_str}\" names an undeclared relation \"{alias}\"")),
        );
        return serde_json::Value::Null;
    };

    // A missing segment mid-path yields undefined, not an error (§4.10) —
    // only an unresolvable alias above is a genuine bad reference.
    path::resolve(relation_doc, &segments[1..]).cloned().unwrap_or(serde_json::Value::Null)
}

fn parse_rollup_shorthand(shorthand: &str) -> Option<(String, String, Option<String>, String)> {
    let (path_part, agg) = shorthand.rsplit_once(':')?;
    match path_part.split('.').collect::<Vec<_>>().as_slice() {
        [relation, property] => Some((relation.to_string(), property.to_string(), None, agg.to_string())),
        [relation, property, select] => {
            Some((relation.to_string(), property.to_string(), Some(select.to_string()), agg.to_string()))
        }
        _ => None,
    }
}

fn resolve_rollup(
    key: &str,
    container: &serde_json::Map<String, serde_json::Value>,
    relations: &HashMap<String, Document>,
    diagnostics: &mut Vec<Diagnostic>,
) -> serde_json::Value {
    let rollup_value = &container["@rollup"];

    let (relation, property, select, agg_name) = match rollup_value {
        serde_json::Value::String(shorthand) => match parse_rollup_shorthand(shorthand) {
            Some(parts) => parts,
            None => {
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::BadRollup)
                        .with_path(key.to_string())
                        .with_message(format!("malformed @rollup shorthand \"{shorthand}\"")),
                );
                return serde_json::Value::Null;
            }
        },
        serde_json::Value::Object(fields) => {
            let relation = fields.get("relation").and_then(|v| v.as_str()).map(str::to_string);
            let property = fields.get("property").and_then(|v| v.as_str()).map(str::to_string);
            let select = fields.get("select").and_then(|v| v.as_str()).map(str::to_string);
            let agg_name = fields.get("aggregate").and_then(|v| v.as_str()).map(str::to_string);
            match (relation, property, agg_name) {
                (Some(r), Some(p), Some(a)) => (r, p, select, a),
                _ => {
                    diagnostics.push(
                        Diagnostic::new(DiagnosticCode::BadRollup)
                            .with_path(key.to_string())
                            .with_message("@rollup object form requires relation, property and aggregate"),
                    );
                    return serde_json::Value::Null;
                }
            }
        }
        _ => {
            diagnostics.push(
                Diagnostic::new(DiagnosticCode::BadRollup)
                    .with_path(key.to_string())
                    .with_message("@rollup value must be a string or object"),
            );
            return serde_json::Value::Null;
        }
    };

    let Some(agg) = RollupAgg::parse(&agg_name) else {
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::BadRollup)
                .with_path(key.to_string())
                .with_message(format!("unknown rollup aggregate \"{agg_name}\"")),
        );
        return serde_json::Value::Null;
    };

    let Some(relation_doc) = relations.get(&relation) else {
        diagnostics.push(
            Diagnostic::new(DiagnosticCode::BadRollup)
                .with_path(key.to_string())
                .with_message(format!("@rollup names an undeclared relation \"{relation}\"")),
        );
        return serde_json::Value::Null;
    };

    let property_segments = path::parse_segments(&property);
    let items = match path::resolve(relation_doc, &property_segments) {
        Some(serde_json::Value::Array(items)) => items.clone(),
        _ => {
            diagnostics.push(
                Diagnostic::new(DiagnosticCode::BadRollup)
                    .with_path(key.to_string())
                    .with_message(format!(
                        "@rollup property \"{property}\" is not an array on relation \"{relation}\""
                    )),
            );
            return serde_json::Value::Null;
        }
    };

    // The shorthand form carries `filter` as a sibling of `@rollup`; the
    // object form may carry it inline instead.
    let filter_source = container.get("filter").and_then(|v| v.as_str()).or_else(|| match rollup_value {
        serde_json::Value::Object(fields) => fields.get("filter").and_then(|v| v.as_str()),
        _ => None,
    });
    let filter_ast = match filter_source {
        Some(expr) => match ldc_expr::parse(expr) {
            Ok(ast) => Some(ast),
            Err(e) => {
                diagnostics.push(
                    Diagnostic::new(DiagnosticCode::BadRollup)
                        .with_path(key.to_string())
                        .with_message(format!("@rollup filter \"{expr}\": {e}")),
                );
                return serde_json::Value::Null;
            }
        },
        None => None,
    };

    let select_segments = select.as_deref().map(path::parse_segments);

    match rollup::evaluate(&items, filter_ast.as_ref(), select_segments.as_deref(), agg) {
        Ok(value) => value.to_json(),
        Err(e) => {
            diagnostics.push(
                Diagnostic::new(DiagnosticCode::BadRollup)
                    .with_path(key.to_string())
                    .with_message(e.to_string()),
            );
            serde_json::Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ComposeError, Result};
    use serde_json::json;

    struct FixedLoader(HashMap<&'static str, serde_json::Value>);

    impl DocumentLoader for FixedLoader {
        fn load(&self, alias: &str, _path: &str) -> Result<Document> {
            self.0
                .get(alias)
                .cloned()
                .ok_or_else(|| ComposeError::UnknownAlias(alias.to_string()))
        }
    }

    fn projects_loader() -> FixedLoader {
        let mut docs = HashMap::new();
        docs.insert(
            "projects",
            json!({
                "@id": "ex:projects",
                "items": [
                    {"budget": 100, "status": "active"},
                    {"budget": 50, "status": "archived"}
                ]
            }),
        );
        FixedLoader(docs)
    }

    #[test]
    fn rollup_shorthand_sums_a_filtered_field() {
        let doc = json!({
            "@id": "ex:main",
            "@relations": {"projects": "projects.json"},
            "totalActive": {"@rollup": "projects.items.budget:sum", "filter": "status == 'active'"}
        });
        let composed = compose(&doc, &projects_loader());
        assert!(composed.diagnostics.is_empty());
        assert_eq!(composed.document["totalActive"], json!(100));
    }

    #[test]
    fn ref_resolves_a_dotted_path_into_a_relation() {
        let doc = json!({
            "@id": "ex:main",
            "@relations": {"projects": "projects.json"},
            "firstBudget": {"@ref": "projects.items[0].budget"}
        });
        let composed = compose(&doc, &projects_loader());
        assert!(composed.diagnostics.is_empty());
        assert_eq!(composed.document["firstBudget"], json!(100));
    }

    #[test]
    fn ref_to_an_undeclared_relation_is_a_bad_ref_diagnostic() {
        let doc = json!({
            "@id": "ex:main",
            "missing": {"@ref": "nope.items[0].budget"}
        });
        let composed = compose(&doc, &projects_loader());
        assert_eq!(composed.diagnostics.len(), 1);
        assert_eq!(composed.diagnostics[0].code, DiagnosticCode::BadRef);
        assert_eq!(composed.document["missing"], serde_json::Value::Null);
    }

    #[test]
    fn ref_missing_mid_path_segment_is_undefined_not_an_error() {
        let doc = json!({
            "@id": "ex:main",
            "@relations": {"projects": "projects.json"},
            "thirdBudget": {"@ref": "projects.items[5].budget"}
        });
        let composed = compose(&doc, &projects_loader());
        assert!(composed.diagnostics.is_empty());
        assert_eq!(composed.document["thirdBudget"], serde_json::Value::Null);
    }

    #[test]
    fn directive_objects_pass_through_untouched() {
        let doc = json!({
            "@id": "ex:main",
            "next": {"@expr": "1+1"}
        });
        let composed = compose(&doc, &projects_loader());
        assert!(composed.diagnostics.is_empty());
        assert_eq!(composed.document["next"], json!({"@expr": "1+1"}));
    }

    #[test]
    fn relations_key_is_stripped_from_the_composed_document() {
        let doc = json!({
            "@id": "ex:main",
            "@relations": {"projects": "projects.json"}
        });
        let composed = compose(&doc, &projects_loader());
        assert!(!composed.document.as_object().unwrap().contains_key("@relations"));
    }
}
