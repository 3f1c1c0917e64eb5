//! String built-ins (§4.5).

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;

pub const NAMES: &[&str] = &[
    "lower",
    "upper",
    "trim",
    "len",
    "substr",
    "replace",
    "split",
    "join",
    "startsWith",
    "endsWith",
    "contains",
    "padStart",
    "padEnd",
];

pub fn call(name: &str, args: &[Value], _interp: &Interpreter) -> Option<Result<Value>> {
    Some(match name {
        "lower" => lower(args),
        "upper" => upper(args),
        "trim" => trim(args),
        "len" => len(args),
        "substr" => substr(args),
        "replace" => replace(args),
        "split" => split(args),
        "join" => join(args),
        "startsWith" => starts_with(args),
        "endsWith" => ends_with(args),
        "contains" => contains(args),
        "padStart" => pad_start(args),
        "padEnd" => pad_end(args),
        _ => return None,
    })
}

fn str_arg(args: &[Value], i: usize, name: &str) -> Result<std::rc::Rc<str>> {
    match args.get(i) {
        Some(Value::Str(s)) => Ok(s.clone()),
        Some(other) => Err(Error::Type(format!(
            "{name}: expected a string argument, found {}",
            other.type_name()
        ))),
        None => Err(Error::Arity {
            name: name.to_string(),
            expected: format!("{}", i + 1),
            got: args.len(),
        }),
    }
}

fn int_arg(args: &[Value], i: usize, name: &str) -> Result<i64> {
    match args.get(i) {
        Some(Value::Int(n)) => Ok(*n),
        Some(other) => Err(Error::Type(format!(
            "{name}: expected an integer argument, found {}",
            other.type_name()
        ))),
        None => Err(Error::Arity {
            name: name.to_string(),
            expected: format!("{}", i + 1),
            got: args.len(),
        }),
    }
}

fn lower(args: &[Value]) -> Result<Value> {
    Ok(Value::str(str_arg(args, 0, "lower")?.to_lowercase()))
}

fn upper(args: &[Value]) -> Result<Value> {
    Ok(Value::str(str_arg(args, 0, "upper")?.to_uppercase()))
}

fn trim(args: &[Value]) -> Result<Value> {
    Ok(Value::str(str_arg(args, 0, "trim")?.trim().to_string()))
}

fn len(args: &[Value]) -> Result<Value> {
    Ok(Value::Int(str_arg(args, 0, "len")?.chars().count() as i64))
}

/// `$substr(s, start[, len])`: `len` is a character count, not an end
/// index; omitted, it runs to the end of the string.
fn substr(args: &[Value]) -> Result<Value> {
    let s = str_arg(args, 0, "substr")?;
    let chars: Vec<char> = s.chars().collect();
    let start = int_arg(args, 1, "substr")?.max(0) as usize;
    if start >= chars.len() {
        return Ok(Value::str(""));
    }
    let take = match args.get(2) {
        Some(Value::Int(n)) => (*n).max(0) as usize,
        Some(other) => {
            return Err(Error::Type(format!(
                "substr: expected an integer length, found {}",
                other.type_name()
            )))
        }
        None => chars.len() - start,
    };
    let end = (start + take).min(chars.len());
    Ok(Value::str(chars[start..end].iter().collect::<String>()))
}

fn replace(args: &[Value]) -> Result<Value> {
    let s = str_arg(args, 0, "replace")?;
    let from = str_arg(args, 1, "replace")?;
    let to = str_arg(args, 2, "replace")?;
    Ok(Value::str(s.replace(&*from, &to)))
}

fn split(args: &[Value]) -> Result<Value> {
    let s = str_arg(args, 0, "split")?;
    let sep = str_arg(args, 1, "split")?;
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::str(c.to_string())).collect()
    } else {
        s.split(&*sep).map(Value::str).collect()
    };
    Ok(Value::array(parts))
}

fn join(args: &[Value]) -> Result<Value> {
    let items = match args.first() {
        Some(Value::Array(items)) => items.clone(),
        Some(other) => {
            return Err(Error::Type(format!(
                "join: expected an array, found {}",
                other.type_name()
            )))
        }
        None => return Err(Error::Arity { name: "join".into(), expected: "2".into(), got: 0 }),
    };
    let sep = str_arg(args, 1, "join")?;
    let parts: Result<Vec<String>> = items
        .iter()
        .map(|v| {
            v.to_triple_object(None)
                .ok_or_else(|| Error::Type(format!("join: element of type {} is not joinable", v.type_name())))
        })
        .collect();
    Ok(Value::str(parts?.join(&sep)))
}

fn starts_with(args: &[Value]) -> Result<Value> {
    let s = str_arg(args, 0, "startsWith")?;
    let prefix = str_arg(args, 1, "startsWith")?;
    Ok(Value::Bool(s.starts_with(&*prefix)))
}

fn ends_with(args: &[Value]) -> Result<Value> {
    let s = str_arg(args, 0, "endsWith")?;
    let suffix = str_arg(args, 1, "endsWith")?;
    Ok(Value::Bool(s.ends_with(&*suffix)))
}

fn contains(args: &[Value]) -> Result<Value> {
    let s = str_arg(args, 0, "contains")?;
    let needle = str_arg(args, 1, "contains")?;
    Ok(Value::Bool(s.contains(&*needle)))
}

fn pad_start(args: &[Value]) -> Result<Value> {
    pad(args, "padStart", true)
}

fn pad_end(args: &[Value]) -> Result<Value> {
    pad(args, "padEnd", false)
}

fn pad(args: &[Value], name: &str, start: bool) -> Result<Value> {
    let s = str_arg(args, 0, name)?;
    let target_len = int_arg(args, 1, name)?.max(0) as usize;
    let fill = match args.get(2) {
        Some(Value::Str(f)) if !f.is_empty() => f.clone(),
        Some(_) => return Err(Error::Type(format!("{name}: fill must be a non-empty string"))),
        None => std::rc::Rc::from(" "),
    };
    let current_len = s.chars().count();
    if current_len >= target_len {
        return Ok(Value::str(s.to_string()));
    }
    let pad_chars: Vec<char> = fill.chars().cycle().take(target_len - current_len).collect();
    let pad_str: String = pad_chars.into_iter().collect();
    Ok(Value::str(if start {
        format!("{pad_str}{s}")
    } else {
        format!("{s}{pad_str}")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_and_lower() {
        assert_eq!(upper(&[Value::str("abc")]).unwrap(), Value::str("ABC"));
        assert_eq!(lower(&[Value::str("ABC")]).unwrap(), Value::str("abc"));
    }

    #[test]
    fn split_and_join_roundtrip() {
        let parts = split(&[Value::str("a,b,c"), Value::str(",")]).unwrap();
        let joined = join(&[parts, Value::str("-")]).unwrap();
        assert_eq!(joined, Value::str("a-b-c"));
    }

    #[test]
    fn substr_takes_a_length_not_an_end_index() {
        assert_eq!(
            substr(&[Value::str("hello world"), Value::Int(6), Value::Int(5)]).unwrap(),
            Value::str("world")
        );
    }

    #[test]
    fn substr_without_length_runs_to_end() {
        assert_eq!(
            substr(&[Value::str("hello"), Value::Int(1)]).unwrap(),
            Value::str("ello")
        );
    }

    #[test]
    fn pad_start_fills_with_custom_char() {
        assert_eq!(
            pad_start(&[Value::str("7"), Value::Int(3), Value::str("0")]).unwrap(),
            Value::str("007")
        );
    }
}
