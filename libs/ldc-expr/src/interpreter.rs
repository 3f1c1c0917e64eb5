//! Tree-walking evaluator over the AST, producing `Value` (§4.4).

use crate::ast::{AstNode, BinaryOp, UnaryOp};
use crate::builtins;
use crate::error::{Error, Result};
use crate::scope::Scope;
use crate::value::{FunctionValue, Value};
use ldc_units::{Decimal, Quantity};
use std::rc::Rc;

/// Bare identifiers that resolve to an aggregate built-in even without the
/// `$` sigil, so `@rollup` shorthand like `sum` reads naturally (§4.4).
const AGGREGATE_NAMES: &[&str] = &["sum", "avg", "count", "min", "max", "first", "last"];

pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Interpreter
    }

    pub fn eval(&self, node: &AstNode, scope: &Scope) -> Result<Value> {
        match node {
            AstNode::NullLiteral => Ok(Value::Null),
            AstNode::BoolLiteral(b) => Ok(Value::Bool(*b)),
            AstNode::IntLiteral(i) => Ok(Value::Int(*i)),
            AstNode::NumberLiteral(d) => Ok(Value::Decimal(*d)),
            AstNode::StringLiteral(s) => Ok(Value::Str(s.clone())),
            AstNode::Identifier(name) => self.resolve_identifier(name, scope),
            AstNode::Unary { op, expr } => self.eval_unary(*op, expr, scope),
            AstNode::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),
            AstNode::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond, scope)?.is_truthy() {
                    self.eval(then_branch, scope)
                } else {
                    self.eval(else_branch, scope)
                }
            }
            AstNode::Member { receiver, property } => {
                let base = self.eval(receiver, scope)?;
                self.eval_member(&base, property)
            }
            AstNode::Index { receiver, index } => {
                let base = self.eval(receiver, scope)?;
                let idx = self.eval(index, scope)?;
                self.eval_index(&base, &idx)
            }
            AstNode::Call { callee, args } => self.eval_call(callee, args, scope),
            AstNode::Lambda { params, body } => Ok(Value::Function(FunctionValue::Closure {
                params: params.clone(),
                body: Rc::new((**body).clone()),
                captured: scope.clone(),
            })),
            AstNode::ArrayLiteral(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.eval(item, scope)?);
                }
                Ok(Value::array(out))
            }
            AstNode::ObjectLiteral(entries) => {
                let mut out = indexmap::IndexMap::new();
                for (k, v) in entries {
                    out.insert(k.clone(), self.eval(v, scope)?);
                }
                Ok(Value::object(out))
            }
        }
    }

    /// Name resolution order (§4.4): scope chain, then `$this` property
    /// fallback, then bare aggregate names, then the `$`-prefixed builtin
    /// table, finally undefined.
    fn resolve_identifier(&self, name: &str, scope: &Scope) -> Result<Value> {
        if let Some(stripped) = name.strip_prefix('?') {
            return scope
                .get_local_chain(name)
                .or_else(|| scope.get_local_chain(stripped))
                .ok_or_else(|| Error::Undefined(name.to_string()));
        }

        if let Some(stripped) = name.strip_prefix('$') {
            if let Some(v) = scope.get_local_chain(name) {
                return Ok(v);
            }
            if builtins::is_builtin(stripped) {
                return Ok(Value::Function(FunctionValue::Builtin(Rc::from(stripped))));
            }
            return Err(Error::UnknownFunction(stripped.to_string()));
        }

        if let Some(v) = scope.get_local_chain(name) {
            return Ok(v);
        }
        if let Some(Value::Object(obj)) = scope.this() {
            if let Some(v) = obj.get(name) {
                return Ok(v.clone());
            }
        }
        if AGGREGATE_NAMES.contains(&name) && builtins::is_builtin(name) {
            return Ok(Value::Function(FunctionValue::Builtin(Rc::from(name))));
        }
        if builtins::is_builtin(name) {
            return Ok(Value::Function(FunctionValue::Builtin(Rc::from(name))));
        }
        Err(Error::Undefined(name.to_string()))
    }

    fn eval_unary(&self, op: UnaryOp, expr: &AstNode, scope: &Scope) -> Result<Value> {
        let v = self.eval(expr, scope)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!v.is_truthy())),
            UnaryOp::Plus => match v {
                Value::Int(_) | Value::Decimal(_) | Value::Quantity(_) => Ok(v),
                other => Err(Error::Type(format!(
                    "unary '+' not defined for {}",
                    other.type_name()
                ))),
            },
            UnaryOp::Neg => match v {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Decimal(d) => Ok(Value::Decimal(d.neg())),
                Value::Quantity(q) => Ok(Value::Quantity(Quantity::new(q.magnitude.neg(), q.unit))),
                other => Err(Error::Type(format!(
                    "unary '-' not defined for {}",
                    other.type_name()
                ))),
            },
        }
    }

    fn eval_binary(&self, op: BinaryOp, left: &AstNode, right: &AstNode, scope: &Scope) -> Result<Value> {
        match op {
            BinaryOp::And => {
                let l = self.eval(left, scope)?;
                if !l.is_truthy() {
                    return Ok(l);
                }
                self.eval(right, scope)
            }
            BinaryOp::Or => {
                let l = self.eval(left, scope)?;
                if l.is_truthy() {
                    return Ok(l);
                }
                self.eval(right, scope)
            }
            BinaryOp::Coalesce => {
                let l = self.eval(left, scope)?;
                if l.is_null() {
                    self.eval(right, scope)
                } else {
                    Ok(l)
                }
            }
            _ => {
                let l = self.eval(left, scope)?;
                let r = self.eval(right, scope)?;
                self.apply_binary(op, l, r)
            }
        }
    }

    fn apply_binary(&self, op: BinaryOp, l: Value, r: Value) -> Result<Value> {
        match op {
            BinaryOp::Add => self.add(l, r),
            BinaryOp::Sub => self.arith(op, l, r),
            BinaryOp::Mul => self.arith(op, l, r),
            BinaryOp::Div => self.arith(op, l, r),
            BinaryOp::Mod => self.arith(op, l, r),
            BinaryOp::Pow => self.arith(op, l, r),
            BinaryOp::Eq => Ok(Value::Bool(l == r)),
            BinaryOp::Ne => Ok(Value::Bool(l != r)),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => self.compare(op, l, r),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Coalesce => unreachable!("handled above"),
        }
    }

    /// `+` is string concatenation if either operand is a string, else
    /// numeric/quantity addition (§4.3 arithmetic dispatch).
    fn add(&self, l: Value, r: Value) -> Result<Value> {
        if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
            let ls = display_value(&l);
            let rs = display_value(&r);
            return Ok(Value::str(format!("{ls}{rs}")));
        }
        self.arith(BinaryOp::Add, l, r)
    }

    fn arith(&self, op: BinaryOp, l: Value, r: Value) -> Result<Value> {
        if let (Value::Quantity(_), _) | (_, Value::Quantity(_)) = (&l, &r) {
            return self.arith_quantity(op, l, r);
        }
        let ld = as_decimal(&l)?;
        let rd = as_decimal(&r)?;
        let both_int = matches!(l, Value::Int(_)) && matches!(r, Value::Int(_));
        let result = match op {
            BinaryOp::Add => ld.add(rd),
            BinaryOp::Sub => ld.sub(rd),
            BinaryOp::Mul => ld.mul(rd),
            BinaryOp::Div => ld.div(rd).map_err(|_| Error::DivByZero)?,
            BinaryOp::Mod => ld.rem(rd).map_err(|_| Error::DivByZero)?,
            BinaryOp::Pow => ld.pow(rd).map_err(Error::from)?,
            _ => unreachable!(),
        };
        // Integer operands keep an exact integer result for the operators
        // that can stay exact; division and exponentiation always widen to
        // decimal (§4.3 mixed numeric promotion).
        if both_int && matches!(op, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Mod) {
            if let Some(i) = result.to_i64() {
                return Ok(Value::Int(i));
            }
        }
        Ok(Value::Decimal(result))
    }

    fn arith_quantity(&self, op: BinaryOp, l: Value, r: Value) -> Result<Value> {
        match (op, l, r) {
            (BinaryOp::Add, Value::Quantity(a), Value::Quantity(b)) => {
                Ok(Value::Quantity(a.add(&b).map_err(Error::from)?))
            }
            (BinaryOp::Sub, Value::Quantity(a), Value::Quantity(b)) => {
                Ok(Value::Quantity(a.sub(&b).map_err(Error::from)?))
            }
            (BinaryOp::Mul, Value::Quantity(a), Value::Quantity(b)) => {
                Ok(Value::Quantity(a.mul(&b).map_err(Error::from)?))
            }
            (BinaryOp::Div, Value::Quantity(a), Value::Quantity(b)) => {
                Ok(Value::Quantity(a.div(&b).map_err(Error::from)?))
            }
            (BinaryOp::Mul, Value::Quantity(q), scalar) => {
                Ok(Value::Quantity(q.scale(as_decimal(&scalar)?)))
            }
            (BinaryOp::Mul, scalar, Value::Quantity(q)) => {
                Ok(Value::Quantity(q.scale(as_decimal(&scalar)?)))
            }
            (BinaryOp::Div, Value::Quantity(q), scalar) => {
                let s = as_decimal(&scalar)?;
                let inv = Decimal::ONE.div(s).map_err(|_| Error::DivByZero)?;
                Ok(Value::Quantity(q.scale(inv)))
            }
            (other, _, _) => Err(Error::Type(format!(
                "operator {other:?} is not defined between a quantity and a scalar"
            ))),
        }
    }

    fn compare(&self, op: BinaryOp, l: Value, r: Value) -> Result<Value> {
        use std::cmp::Ordering;
        let ordering = match (&l, &r) {
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
            (Value::Quantity(a), Value::Quantity(b)) => {
                let converted = b.convert_to(&a.unit).map_err(Error::from)?;
                a.magnitude.compare(converted.magnitude)
            }
            _ => {
                let ld = as_decimal(&l)?;
                let rd = as_decimal(&r)?;
                ld.compare(rd)
            }
        };
        let result = match op {
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::Gt => ordering == Ordering::Greater,
            BinaryOp::Le => ordering != Ordering::Greater,
            BinaryOp::Ge => ordering != Ordering::Less,
            _ => unreachable!(),
        };
        Ok(Value::Bool(result))
    }

    fn eval_member(&self, base: &Value, property: &str) -> Result<Value> {
        match base {
            Value::Null => Ok(Value::Null),
            Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Null)),
            Value::Array(items) if property == "length" => Ok(Value::Int(items.len() as i64)),
            Value::Str(s) if property == "length" => Ok(Value::Int(s.chars().count() as i64)),
            Value::Quantity(q) if property == "magnitude" => Ok(Value::Decimal(q.magnitude)),
            Value::Quantity(q) if property == "unit" => Ok(Value::str(q.unit.name.clone())),
            other => Err(Error::Type(format!(
                "cannot access property '{property}' of {}",
                other.type_name()
            ))),
        }
    }

    fn eval_index(&self, base: &Value, index: &Value) -> Result<Value> {
        match (base, index) {
            (Value::Null, _) => Ok(Value::Null),
            (Value::Array(items), Value::Int(i)) => {
                if *i < 0 {
                    return Ok(Value::Null);
                }
                Ok(items.get(*i as usize).cloned().unwrap_or(Value::Null))
            }
            (Value::Object(map), Value::Str(key)) => Ok(map.get(&**key).cloned().unwrap_or(Value::Null)),
            (other, _) => Err(Error::Type(format!("cannot index into {}", other.type_name()))),
        }
    }

    fn eval_call(&self, callee: &AstNode, args: &[AstNode], scope: &Scope) -> Result<Value> {
        let mut evaluated_args = Vec::with_capacity(args.len());
        for a in args {
            evaluated_args.push(self.eval(a, scope)?);
        }

        if let AstNode::Member { receiver, property } = callee {
            let this_val = self.eval(receiver, scope)?;
            if let Value::Object(map) = &this_val {
                if let Some(f @ Value::Function(_)) = map.get(&**property) {
                    return self.call_function(f.clone(), Some(this_val.clone()), evaluated_args);
                }
            }
            let func = self.resolve_identifier(&format!("${property}"), scope).or_else(|_| {
                if builtins::is_builtin(property) {
                    Ok(Value::Function(FunctionValue::Builtin(Rc::from(&**property))))
                } else {
                    Err(Error::UnknownFunction(property.to_string()))
                }
            })?;
            return self.call_function(func, Some(this_val), evaluated_args);
        }

        let func = self.eval(callee, scope)?;
        self.call_function(func, None, evaluated_args)
    }

    pub fn call_function(&self, func: Value, this: Option<Value>, mut args: Vec<Value>) -> Result<Value> {
        match func {
            Value::Function(FunctionValue::Builtin(name)) => {
                if let Some(t) = this {
                    args.insert(0, t);
                }
                builtins::call_builtin(&name, &args, self)
            }
            Value::Function(FunctionValue::Closure { params, body, captured }) => {
                if params.len() != args.len() {
                    return Err(Error::Arity {
                        name: "<closure>".to_string(),
                        expected: params.len().to_string(),
                        got: args.len(),
                    });
                }
                let call_scope = match this {
                    Some(t) => captured.child_with_this(t),
                    None => captured.child(),
                };
                for (p, v) in params.iter().zip(args.into_iter()) {
                    call_scope.define(p.clone(), v);
                }
                self.eval(&body, &call_scope)
            }
            other => Err(Error::NotCallable(other.type_name().to_string())),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn as_decimal(v: &Value) -> Result<Decimal> {
    match v {
        Value::Int(i) => Ok(Decimal::from_i64(*i)),
        Value::Decimal(d) => Ok(*d),
        other => Err(Error::Type(format!("expected a number, found {}", other.type_name()))),
    }
}

fn display_value(v: &Value) -> String {
    match v {
        Value::Str(s) => s.to_string(),
        other => other.to_triple_object(None).unwrap_or_else(|| format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn run(src: &str) -> Value {
        let ast = parse(src).unwrap();
        Interpreter::new().eval(&ast, &Scope::root()).unwrap()
    }

    #[test]
    fn integer_arithmetic_stays_integer() {
        assert_eq!(run("1 + 2 * 3"), Value::Int(7));
    }

    #[test]
    fn string_concatenation_via_plus() {
        assert_eq!(run("'a' + 'b'"), Value::str("ab"));
    }

    #[test]
    fn mixed_string_number_concatenation() {
        assert_eq!(run("'x=' + 3"), Value::str("x=3"));
    }

    #[test]
    fn ternary_and_coalesce() {
        assert_eq!(run("null ?? 5"), Value::Int(5));
        assert_eq!(run("1 > 0 ? 'yes' : 'no'"), Value::str("yes"));
    }

    #[test]
    fn division_by_zero_errors() {
        let ast = parse("1 / 0").unwrap();
        let err = Interpreter::new().eval(&ast, &Scope::root()).unwrap_err();
        assert!(matches!(err, Error::DivByZero));
    }

    #[test]
    fn lambda_invocation() {
        let ast = parse("(x => x + 1)(41)").unwrap();
        assert_eq!(Interpreter::new().eval(&ast, &Scope::root()).unwrap(), Value::Int(42));
    }

    #[test]
    fn member_access_on_this() {
        let scope = Scope::root();
        let mut obj = indexmap::IndexMap::new();
        obj.insert("a".to_string(), Value::Int(9));
        let child = scope.child_with_this(Value::object(obj));
        let ast = parse("a").unwrap();
        assert_eq!(Interpreter::new().eval(&ast, &child).unwrap(), Value::Int(9));
    }

    #[test]
    fn undefined_identifier_errors() {
        let ast = parse("nope").unwrap();
        let err = Interpreter::new().eval(&ast, &Scope::root()).unwrap_err();
        assert!(matches!(err, Error::Undefined(_)));
    }
}
