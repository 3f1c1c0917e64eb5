//! The expression language: lexer, parser, tree-walking interpreter and
//! `$`-prefixed built-ins (§3, §4.3-4.5), plus the `Value` type shared by
//! every other crate in the workspace.

#![forbid(unsafe_code)]

mod ast;
mod builtins;
mod error;
mod interpreter;
mod lexer;
mod parser;
mod scope;
mod token;
mod value;

pub use ast::{AstNode, BinaryOp, UnaryOp};
pub use builtins::{call_builtin, is_builtin};
pub use error::{Error, Result};
pub use interpreter::Interpreter;
pub use lexer::Lexer;
pub use parser::parse;
pub use scope::Scope;
pub use token::{Token, TokenType};
pub use value::{compare_values, FunctionValue, Value};

/// Parses and evaluates `source` in one step, the common case for
/// `@expr`/`@view`/`@constraint` bodies once the indexer has built their
/// scope (§4.6).
pub fn eval(source: &str, scope: &Scope) -> Result<Value> {
    let ast = parse(source)?;
    Interpreter::new().eval(&ast, scope)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_end_to_end() {
        let scope = Scope::root();
        scope.define("x", Value::Int(4));
        assert_eq!(eval("x * x", &scope).unwrap(), Value::Int(16));
    }

    #[test]
    fn eval_with_builtin_and_unit_quantity() {
        let scope = Scope::root();
        assert_eq!(eval("$sqrt(16)", &scope).unwrap(), Value::Decimal(ldc_units::Decimal::from_i64(4)));
    }
}
