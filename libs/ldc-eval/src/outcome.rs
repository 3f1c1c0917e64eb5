//! The result of one [`crate::evaluate`] call (§6): triples, diagnostics,
//! the host-facing value map and provenance trail, plus the canonical
//! payload the host signs.

use crate::provenance::ProvenanceOp;
use ldc_index::Diagnostic;
use ldc_store::TripleStore;

#[derive(Debug, Clone)]
pub struct EvalOutcome {
    pub subject: String,
    pub triples: TripleStore,
    pub diagnostics: Vec<Diagnostic>,
    /// The root subject's property map, including `@expr`/`@view`
    /// results and materialized `@ref`/`@rollup` values (§6).
    pub value: serde_json::Value,
    pub provenance: Vec<ProvenanceOp>,
    /// Set when the evaluation stopped early on a timeout or the host's
    /// cancellation closure (§5). The value/triples/diagnostics reflect
    /// whatever layers completed before the stop.
    pub aborted: bool,
}

impl EvalOutcome {
    /// The document-shaped payload the canonicalizer signs (§4.11):
    /// subject, computed value and a sorted triple listing. `EvalOptions`
    /// (timeout included) never enters this payload, so how long a caller
    /// was willing to wait never changes what gets signed.
    pub fn signable_payload(&self) -> serde_json::Value {
        let mut triples: Vec<serde_json::Value> = self
            .triples
            .iter()
            .map(|t| serde_json::json!({"s": t.subject, "p": t.predicate, "o": t.object}))
            .collect();
        triples.sort_by(|a, b| a.to_string().cmp(&b.to_string()));
        serde_json::json!({
            "subject": self.subject,
            "value": self.value,
            "triples": triples,
        })
    }

    pub fn canonical_payload(&self) -> String {
        ldc_canon::canonicalize(&self.signable_payload())
    }

    /// Signs this outcome's canonical payload under `secret`/`kid` (§4.11).
    pub fn sign(&self, secret: &[u8], kid: &str) -> String {
        ldc_canon::sign(&self.canonical_payload(), secret, kid)
    }
}
