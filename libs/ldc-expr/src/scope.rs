//! Lexical scopes with prototypal parent chains (§4.4).

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

struct ScopeInner {
    parent: Option<Scope>,
    vars: RefCell<HashMap<String, Value>>,
    /// The hidden `$this` binding, consulted after the scope chain and
    /// before the aggregate/builtin fallbacks (§4.4 name resolution order).
    this: Option<Value>,
}

/// A cheaply-cloneable handle to a lexical scope. Lambdas capture the scope
/// active at their definition site by cloning this handle (§3 "AST node"
/// lambda variant: "closure over enclosing scope").
#[derive(Clone)]
pub struct Scope(Rc<ScopeInner>);

impl Scope {
    pub fn root() -> Self {
        Scope(Rc::new(ScopeInner {
            parent: None,
            vars: RefCell::new(HashMap::new()),
            this: None,
        }))
    }

    pub fn child(&self) -> Self {
        Scope(Rc::new(ScopeInner {
            parent: Some(self.clone()),
            vars: RefCell::new(HashMap::new()),
            this: None,
        }))
    }

    /// A child scope with a `$this` binding, used to evaluate property
    /// expressions and lambda bodies invoked over a receiver object.
    pub fn child_with_this(&self, this: Value) -> Self {
        Scope(Rc::new(ScopeInner {
            parent: Some(self.clone()),
            vars: RefCell::new(HashMap::new()),
            this: Some(this),
        }))
    }

    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.0.vars.borrow_mut().insert(name.into(), value);
    }

    /// Looks up `name` in the scope chain only (no `$this`/builtin
    /// fallback); used by the interpreter to distinguish "bound identifier"
    /// from "must fall through to `$this`".
    pub fn get_local_chain(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.0.vars.borrow().get(name) {
            return Some(v.clone());
        }
        self.0.parent.as_ref().and_then(|p| p.get_local_chain(name))
    }

    /// The nearest `$this` binding in the chain, if any.
    pub fn this(&self) -> Option<Value> {
        if let Some(t) = &self.0.this {
            return Some(t.clone());
        }
        self.0.parent.as_ref().and_then(|p| p.this())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_sees_parent_bindings() {
        let root = Scope::root();
        root.define("x", Value::Int(1));
        let child = root.child();
        assert_eq!(child.get_local_chain("x"), Some(Value::Int(1)));
    }

    #[test]
    fn child_binding_shadows_parent() {
        let root = Scope::root();
        root.define("x", Value::Int(1));
        let child = root.child();
        child.define("x", Value::Int(2));
        assert_eq!(child.get_local_chain("x"), Some(Value::Int(2)));
        assert_eq!(root.get_local_chain("x"), Some(Value::Int(1)));
    }

    #[test]
    fn this_propagates_through_plain_children() {
        let root = Scope::root();
        let with_this = root.child_with_this(Value::Int(7));
        let nested = with_this.child();
        assert_eq!(nested.this(), Some(Value::Int(7)));
    }
}
