//! Abstract syntax tree for the expression language (§3 "AST node").

use ldc_units::Decimal;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Coalesce,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    NullLiteral,
    BoolLiteral(bool),
    IntLiteral(i64),
    NumberLiteral(Decimal),
    StringLiteral(Rc<str>),

    /// A plain identifier or a `?`-prefixed query variable; the leading
    /// sigil (if any) is preserved in `name` so later stages can tell them
    /// apart without re-inspecting source text.
    Identifier(Rc<str>),

    Unary {
        op: UnaryOp,
        expr: Box<AstNode>,
    },
    Binary {
        op: BinaryOp,
        left: Box<AstNode>,
        right: Box<AstNode>,
    },
    Ternary {
        cond: Box<AstNode>,
        then_branch: Box<AstNode>,
        else_branch: Box<AstNode>,
    },
    Member {
        receiver: Box<AstNode>,
        property: Rc<str>,
    },
    Index {
        receiver: Box<AstNode>,
        index: Box<AstNode>,
    },
    Call {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
    },
    Lambda {
        params: Rc<Vec<String>>,
        body: Box<AstNode>,
    },
    ArrayLiteral(Vec<AstNode>),
    ObjectLiteral(Vec<(String, AstNode)>),
}

impl AstNode {
    /// Free identifiers read by this expression, excluding lambda
    /// parameters bound within it (§4.6 `reads`).
    pub fn free_identifiers(&self, out: &mut Vec<String>) {
        self.free_identifiers_with_bound(&mut Vec::new(), out);
    }

    fn free_identifiers_with_bound(&self, bound: &mut Vec<String>, out: &mut Vec<String>) {
        match self {
            AstNode::NullLiteral
            | AstNode::BoolLiteral(_)
            | AstNode::IntLiteral(_)
            | AstNode::NumberLiteral(_)
            | AstNode::StringLiteral(_) => {}
            AstNode::Identifier(name) => {
                let plain = name.trim_start_matches(['?']);
                if !bound.iter().any(|b| b == plain) {
                    out.push(plain.to_string());
                }
            }
            AstNode::Unary { expr, .. } => expr.free_identifiers_with_bound(bound, out),
            AstNode::Binary { left, right, .. } => {
                left.free_identifiers_with_bound(bound, out);
                right.free_identifiers_with_bound(bound, out);
            }
            AstNode::Ternary {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.free_identifiers_with_bound(bound, out);
                then_branch.free_identifiers_with_bound(bound, out);
                else_branch.free_identifiers_with_bound(bound, out);
            }
            AstNode::Member { receiver, .. } => receiver.free_identifiers_with_bound(bound, out),
            AstNode::Index { receiver, index } => {
                receiver.free_identifiers_with_bound(bound, out);
                index.free_identifiers_with_bound(bound, out);
            }
            AstNode::Call { callee, args } => {
                callee.free_identifiers_with_bound(bound, out);
                for a in args {
                    a.free_identifiers_with_bound(bound, out);
                }
            }
            AstNode::Lambda { params, body } => {
                let added = params.len();
                bound.extend(params.iter().cloned());
                body.free_identifiers_with_bound(bound, out);
                bound.truncate(bound.len() - added);
            }
            AstNode::ArrayLiteral(items) => {
                for i in items {
                    i.free_identifiers_with_bound(bound, out);
                }
            }
            AstNode::ObjectLiteral(entries) => {
                for (_, v) in entries {
                    v.free_identifiers_with_bound(bound, out);
                }
            }
        }
    }
}
