//! The shared diagnostic type (§7). Every document-local failure in the
//! workspace — expression errors, constraint failures, query errors,
//! ref/rollup resolution, unit mismatches, fixpoint overruns, schema
//! shape failures — is reported through this type rather than an `Err`.
//! It lives here, the lowest crate with a `serde_json`/document-shaped
//! view of the world, so `ldc-schedule`, `ldc-compose` and `ldc-eval`
//! can all depend on it without a cycle.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// The closed set of diagnostic codes (§6 "Diagnostic codes").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    ExprErr,
    ConstraintFailed,
    QueryErr,
    BadRef,
    BadRollup,
    UnitMismatch,
    DivByZero,
    FixpointLimit,
    Timeout,
    SchemaError,
}

impl DiagnosticCode {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::ExprErr => "LDC_EXPR_ERR",
            DiagnosticCode::ConstraintFailed => "LDC_CONSTRAINT_FAILED",
            DiagnosticCode::QueryErr => "LDC_QUERY_ERR",
            DiagnosticCode::BadRef => "LDC_BAD_REF",
            DiagnosticCode::BadRollup => "LDC_BAD_ROLLUP",
            DiagnosticCode::UnitMismatch => "LDC_UNIT_MISMATCH",
            DiagnosticCode::DivByZero => "LDC_DIV_BY_ZERO",
            DiagnosticCode::FixpointLimit => "LDC_FIXPOINT_LIMIT",
            DiagnosticCode::Timeout => "timeout",
            DiagnosticCode::SchemaError => "schema_error",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub path: Option<String>,
    pub severity: Option<Severity>,
    pub message: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode) -> Self {
        Diagnostic {
            code,
            path: None,
            severity: None,
            message: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_renders_its_wire_name() {
        assert_eq!(DiagnosticCode::ConstraintFailed.to_string(), "LDC_CONSTRAINT_FAILED");
        assert_eq!(DiagnosticCode::Timeout.to_string(), "timeout");
    }

    #[test]
    fn builder_sets_optional_fields() {
        let d = Diagnostic::new(DiagnosticCode::SchemaError)
            .with_path("https://ex/a")
            .with_message("missing @id");
        assert_eq!(d.path.as_deref(), Some("https://ex/a"));
        assert_eq!(d.severity, None);
    }
}
