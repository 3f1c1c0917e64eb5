//! The `$`-prefixed built-in function table (§4.5), organized one module
//! per category, mirroring the teacher's `vm/functions/*.rs` split.

mod array;
mod convert;
mod date;
mod format;
mod math;
mod string;
mod util;

use crate::error::{Error, Result};
use crate::interpreter::Interpreter;
use crate::value::Value;

pub fn is_builtin(name: &str) -> bool {
    math::NAMES.contains(&name)
        || string::NAMES.contains(&name)
        || format::NAMES.contains(&name)
        || convert::NAMES.contains(&name)
        || date::NAMES.contains(&name)
        || util::NAMES.contains(&name)
        || array::NAMES.contains(&name)
}

pub fn call_builtin(name: &str, args: &[Value], interp: &Interpreter) -> Result<Value> {
    if let Some(result) = math::call(name, args, interp) {
        return result;
    }
    if let Some(result) = string::call(name, args, interp) {
        return result;
    }
    if let Some(result) = format::call(name, args, interp) {
        return result;
    }
    if let Some(result) = convert::call(name, args, interp) {
        return result;
    }
    if let Some(result) = date::call(name, args, interp) {
        return result;
    }
    if let Some(result) = util::call(name, args, interp) {
        return result;
    }
    if let Some(result) = array::call(name, args, interp) {
        return result;
    }
    Err(Error::UnknownFunction(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_is_registered() {
        assert!(is_builtin("abs"));
        assert!(is_builtin("upper"));
        assert!(is_builtin("toString"));
        assert!(is_builtin("convert"));
        assert!(is_builtin("year"));
        assert!(is_builtin("type"));
        assert!(is_builtin("sort"));
        assert!(!is_builtin("doesNotExist"));
    }
}
