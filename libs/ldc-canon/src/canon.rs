//! Canonical JSON (§4.11): sorted keys at every level, no insignificant
//! whitespace, integers as-is, finite non-integers up to 15 significant
//! digits and never exponential, NaN/Infinity collapse to `null`.
//!
//! `serde_json::Map` in this workspace has no `preserve_order` feature
//! enabled, so it's `BTreeMap`-backed and already iterates key-sorted —
//! the "sorted lexicographically" rule falls out of that for free.
//! Dates reach this module already as RFC 3339 strings (`Value::to_json`
//! in `ldc-expr` renders timestamps that way), so no special date case
//! is needed here.

/// Serializes `value` to its canonical byte-for-byte form.
pub fn canonicalize(value: &serde_json::Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::Null | serde_json::Value::Bool(_) | serde_json::Value::String(_) => {
            out.push_str(&serde_json::to_string(value).expect("a JSON leaf value always serializes"));
        }
        serde_json::Value::Number(n) => out.push_str(&format_number(n)),
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            out.push('{');
            for (i, (key, val)) in map.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).expect("a string key always serializes"));
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
    }
}

fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => format_finite_f64(f),
        _ => "null".to_string(),
    }
}

/// Formats a finite `f64` with up to 15 significant digits in plain
/// (never exponential) notation, by rendering through scientific form
/// and expanding the exponent back out.
fn format_finite_f64(f: f64) -> String {
    if f == 0.0 {
        return if f.is_sign_negative() { "-0".to_string() } else { "0".to_string() };
    }
    expand_scientific(&format!("{f:.14e}"))
}

fn expand_scientific(sci: &str) -> String {
    let (mantissa, exp) = sci.split_once('e').expect("Rust's {:e} formatting always includes 'e'");
    let exp: i32 = exp.parse().expect("the exponent is always a valid integer");
    let negative = mantissa.starts_with('-');
    let mantissa = mantissa.trim_start_matches('-');
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{int_part}{frac_part}");
    let point = int_part.len() as i32 + exp;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if point <= 0 {
        out.push_str("0.");
        out.push_str(&"0".repeat((-point) as usize));
        out.push_str(&digits);
    } else if point as usize >= digits.len() {
        out.push_str(&digits);
        out.push_str(&"0".repeat(point as usize - digits.len()));
    } else {
        out.push_str(&digits[..point as usize]);
        out.push('.');
        out.push_str(&digits[point as usize..]);
    }
    trim_trailing_zeros(&out)
}

fn trim_trailing_zeros(s: &str) -> String {
    if !s.contains('.') {
        return s.to_string();
    }
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() || trimmed == "-" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_come_out_sorted_regardless_of_insertion_order() {
        let a = canonicalize(&json!({"b": 1, "a": 2}));
        let b = canonicalize(&json!({"a": 2, "b": 1}));
        assert_eq!(a, b);
        assert_eq!(a, r#"{"a":2,"b":1}"#);
    }

    #[test]
    fn integers_are_emitted_as_is() {
        assert_eq!(canonicalize(&json!(115000)), "115000");
    }

    #[test]
    fn a_plain_fraction_is_never_exponential() {
        assert_eq!(canonicalize(&json!(0.15)), "0.15");
    }

    #[test]
    fn an_integral_float_drops_its_trailing_zeros() {
        assert_eq!(canonicalize(&json!(100.0)), "100");
    }

    #[test]
    fn non_finite_numbers_become_null() {
        assert_eq!(canonicalize(&serde_json::Value::from(f64::NAN)), "null");
    }

    #[test]
    fn nested_arrays_and_objects_have_no_whitespace() {
        assert_eq!(canonicalize(&json!({"xs": [1, 2, 3]})), r#"{"xs":[1,2,3]}"#);
    }

    #[test]
    fn round_tripping_a_canonical_payload_is_stable() {
        let value = json!({"z": 1, "a": [0.1, 0.2], "m": {"y": true, "x": null}});
        let once = canonicalize(&value);
        let reparsed: serde_json::Value = serde_json::from_str(&once).unwrap();
        let twice = canonicalize(&reparsed);
        assert_eq!(once, twice);
    }
}
