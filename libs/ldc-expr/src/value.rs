//! The runtime value type (§3 "Value").

use crate::ast::AstNode;
use crate::scope::Scope;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use ldc_units::{Decimal, Quantity};
use std::fmt;
use std::rc::Rc;

/// A tagged union covering every shape a property value or expression
/// result can take.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Decimal(Decimal),
    Str(Rc<str>),
    Timestamp(DateTime<Utc>),
    Array(Rc<Vec<Value>>),
    Object(Rc<IndexMap<String, Value>>),
    Quantity(Quantity),
    Function(FunctionValue),
}

#[derive(Clone)]
pub enum FunctionValue {
    /// One of the `$`-prefixed built-ins (§4.5), resolved by name at call time.
    Builtin(Rc<str>),
    /// A lambda, capturing the scope active at the point of its definition.
    Closure {
        params: Rc<Vec<String>>,
        body: Rc<AstNode>,
        captured: Scope,
    },
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    pub fn object(map: IndexMap<String, Value>) -> Self {
        Value::Object(Rc::new(map))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Truthiness used by `@constraint` and boolean coercions: `null`,
    /// `false`, `0`, empty string and empty array/object are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Decimal(d) => !d.is_zero(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(a) => !a.is_empty(),
            Value::Object(o) => !o.is_empty(),
            Value::Timestamp(_) => true,
            Value::Quantity(q) => !q.magnitude.is_zero(),
            Value::Function(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "string",
            Value::Timestamp(_) => "timestamp",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Quantity(_) => "quantity",
            Value::Function(_) => "function",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Serializes a value to its canonical triple-object string per §6,
    /// or `None` for array/object/function values, which never produce
    /// triples. Quantities with a single currency dimension truncate to
    /// 5 decimal places and use `primary_currency` in place of the unit's
    /// own name if that name was synthesized by arithmetic rather than
    /// parsed from a currency literal; other quantities keep their full
    /// magnitude and their own unit name untouched.
    pub fn to_triple_object(&self, primary_currency: Option<&str>) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Int(i) => Some(i.to_string()),
            Value::Decimal(d) => Some(d.to_canonical_string()),
            Value::Str(s) => Some(s.to_string()),
            Value::Timestamp(t) => Some(t.to_rfc3339()),
            Value::Quantity(q) if q.is_single_currency_dimension() => {
                let code = if q.is_synthetic_unit() {
                    primary_currency.unwrap_or(q.unit.name.as_str())
                } else {
                    q.unit.name.as_str()
                };
                Some(format!("{} {code}", q.magnitude.trunc_dp(5).to_canonical_string()))
            }
            Value::Quantity(q) => Some(format!("{} {}", q.magnitude.to_canonical_string(), q.unit.name)),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => None,
        }
    }

    /// Convert an inert `serde_json::Value` (no directive keys) into a
    /// runtime `Value`. Directive objects must be handled by the indexer
    /// before reaching this conversion.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Decimal::from_f64(f).map(Value::Decimal).unwrap_or(Value::Null)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::array(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => {
                let mut out = IndexMap::new();
                for (k, v) in map {
                    out.insert(k.clone(), Value::from_json(v));
                }
                Value::object(out)
            }
        }
    }

    /// Convert to a `serde_json::Value` for canonicalization (§4.11).
    /// Functions have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Decimal(d) => serde_json::Value::String(d.to_canonical_string()),
            Value::Str(s) => serde_json::Value::String(s.to_string()),
            Value::Timestamp(t) => serde_json::Value::String(t.to_rfc3339()),
            Value::Array(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(map) => {
                let mut out = serde_json::Map::new();
                for (k, v) in map.iter() {
                    out.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Quantity(q) => serde_json::Value::String(format!(
                "{} {}",
                q.magnitude.to_canonical_string(),
                q.unit.name
            )),
            Value::Function(_) => serde_json::Value::Null,
        }
    }
}

/// Orders two scalar values for sorting/grouping outside the interpreter
/// (e.g. the query engine's `orderBy`). Mirrors the interpreter's
/// `compare` dispatch but is exposed standalone since callers here have
/// no AST node to evaluate against.
pub fn compare_values(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Int(_) | Value::Decimal(_), Value::Int(_) | Value::Decimal(_)) => {
            let x = as_decimal(a)?;
            let y = as_decimal(b)?;
            Some(x.compare(y))
        }
        _ => None,
    }
}

fn as_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Int(i) => Some(Decimal::from_i64(*i)),
        Value::Decimal(d) => Some(*d),
        _ => None,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::Int(a), Value::Decimal(b)) | (Value::Decimal(b), Value::Int(a)) => {
                Decimal::from_i64(*a) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Quantity(a), Value::Quantity(b)) => a == b,
            (Value::Function(FunctionValue::Builtin(a)), Value::Function(FunctionValue::Builtin(b))) => {
                a == b
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Array(a) => f.debug_list().entries(a.iter()).finish(),
            Value::Object(o) => f.debug_map().entries(o.iter()).finish(),
            Value::Quantity(q) => write!(f, "{} {}", q.magnitude, q.unit.name),
            Value::Function(FunctionValue::Builtin(name)) => write!(f, "<builtin {name}>"),
            Value::Function(FunctionValue::Closure { params, .. }) => {
                write!(f, "<closure ({})>", params.join(", "))
            }
        }
    }
}
