//! Precedence-climbing parser for the expression language (§4.3).

use crate::ast::{AstNode, BinaryOp, UnaryOp};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::token::{Token, TokenType};
use ldc_units::Decimal;
use std::rc::Rc;

pub fn parse(source: &str) -> Result<AstNode> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let node = parser.parse_expression()?;
    let trailing = parser.peek();
    if trailing.kind != TokenType::Eof {
        return Err(Error::Parse {
            message: format!("unexpected trailing token '{}'", trailing.text),
            line: trailing.line,
            column: trailing.column,
        });
    }
    Ok(node)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .unwrap_or_else(|| self.tokens.last().unwrap())
    }

    fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: TokenType) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenType) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenType, what: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek();
            Err(Error::Parse {
                message: format!("expected {what}, found '{}'", tok.text),
                line: tok.line,
                column: tok.column,
            })
        }
    }

    // expression := ternary
    fn parse_expression(&mut self) -> Result<AstNode> {
        self.parse_ternary()
    }

    // ternary := or ('?' expression ':' expression)?
    fn parse_ternary(&mut self) -> Result<AstNode> {
        let cond = self.parse_or()?;
        if self.eat(TokenType::Question) {
            let then_branch = self.parse_expression()?;
            self.expect(TokenType::Colon, "':' in ternary expression")?;
            let else_branch = self.parse_expression()?;
            return Ok(AstNode::Ternary {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            });
        }
        Ok(cond)
    }

    // or := and (('or' | '||') and)*
    fn parse_or(&mut self) -> Result<AstNode> {
        let mut left = self.parse_and()?;
        loop {
            if self.check(TokenType::KwOr) || self.check(TokenType::OrOr) {
                self.advance();
                let right = self.parse_and()?;
                left = AstNode::Binary {
                    op: BinaryOp::Or,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            } else {
                break;
            }
        }
        Ok(left)
    }

    // and := coalesce (('and' | '&&') coalesce)*
    fn parse_and(&mut self) -> Result<AstNode> {
        let mut left = self.parse_coalesce()?;
        loop {
            if self.check(TokenType::KwAnd) || self.check(TokenType::AndAnd) {
                self.advance();
                let right = self.parse_coalesce()?;
                left = AstNode::Binary {
                    op: BinaryOp::And,
                    left: Box::new(left),
                    right: Box::new(right),
                };
            } else {
                break;
            }
        }
        Ok(left)
    }

    // coalesce := equality ('??' equality)*
    fn parse_coalesce(&mut self) -> Result<AstNode> {
        let mut left = self.parse_equality()?;
        while self.eat(TokenType::Coalesce) {
            let right = self.parse_equality()?;
            left = AstNode::Binary {
                op: BinaryOp::Coalesce,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // equality := relational (('==' | '!=') relational)*
    fn parse_equality(&mut self) -> Result<AstNode> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek().kind {
                TokenType::EqEq => BinaryOp::Eq,
                TokenType::NotEq => BinaryOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.parse_relational()?;
            left = AstNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // relational := additive (('<' | '>' | '<=' | '>=') additive)*
    fn parse_relational(&mut self) -> Result<AstNode> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenType::Lt => BinaryOp::Lt,
                TokenType::Gt => BinaryOp::Gt,
                TokenType::Le => BinaryOp::Le,
                TokenType::Ge => BinaryOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = AstNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // additive := multiplicative (('+' | '-') multiplicative)*
    fn parse_additive(&mut self) -> Result<AstNode> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenType::Plus => BinaryOp::Add,
                TokenType::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = AstNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // multiplicative := power (('*' | '/' | '%') power)*
    fn parse_multiplicative(&mut self) -> Result<AstNode> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek().kind {
                TokenType::Star => BinaryOp::Mul,
                TokenType::Slash => BinaryOp::Div,
                TokenType::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = AstNode::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    // power := unary ('**' power)?  (right-associative)
    fn parse_power(&mut self) -> Result<AstNode> {
        let base = self.parse_unary()?;
        if self.eat(TokenType::StarStar) {
            let exp = self.parse_power()?;
            return Ok(AstNode::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exp),
            });
        }
        Ok(base)
    }

    // unary := ('+' | '-' | '!' | 'not') unary | postfix
    fn parse_unary(&mut self) -> Result<AstNode> {
        let op = match self.peek().kind {
            TokenType::Plus => Some(UnaryOp::Plus),
            TokenType::Minus => Some(UnaryOp::Neg),
            TokenType::Bang | TokenType::KwNot => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary()?;
            return Ok(AstNode::Unary {
                op,
                expr: Box::new(expr),
            });
        }
        self.parse_postfix()
    }

    // postfix := primary ('.' identifier | '[' expression ']' | '(' args ')')*
    fn parse_postfix(&mut self) -> Result<AstNode> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(TokenType::Dot) {
                let name = self.expect(TokenType::Identifier, "property name after '.'")?;
                expr = AstNode::Member {
                    receiver: Box::new(expr),
                    property: Rc::from(name.text.as_str()),
                };
            } else if self.eat(TokenType::OpenBracket) {
                let index = self.parse_expression()?;
                self.expect(TokenType::CloseBracket, "']'")?;
                expr = AstNode::Index {
                    receiver: Box::new(expr),
                    index: Box::new(index),
                };
            } else if self.check(TokenType::OpenParen) {
                let args = self.parse_call_args()?;
                expr = AstNode::Call {
                    callee: Box::new(expr),
                    args,
                };
            } else {
                break;
            }
        }
        Ok(expr)
    }

    fn parse_call_args(&mut self) -> Result<Vec<AstNode>> {
        self.expect(TokenType::OpenParen, "'('")?;
        let mut args = Vec::new();
        if !self.check(TokenType::CloseParen) {
            loop {
                args.push(self.parse_expression()?);
                if !self.eat(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::CloseParen, "')'")?;
        Ok(args)
    }

    // primary also absorbs lambda forms, which require lookahead/backtracking
    // to disambiguate from parenthesized expressions and call argument lists.
    fn parse_primary(&mut self) -> Result<AstNode> {
        // `ident => expr`
        if self.check(TokenType::Identifier) && self.peek_at(1).kind == TokenType::FatArrow {
            let name = self.advance().text;
            self.advance(); // =>
            let body = self.parse_expression()?;
            return Ok(AstNode::Lambda {
                params: Rc::new(vec![name]),
                body: Box::new(body),
            });
        }

        // `(p1, p2, ...) => expr`, tried before a generic parenthesized
        // expression; backtrack on failure.
        if self.check(TokenType::OpenParen) {
            if let Some(lambda) = self.try_parse_parenthesized_lambda()? {
                return Ok(lambda);
            }
        }

        let tok = self.peek().clone();
        match tok.kind {
            TokenType::Number => {
                self.advance();
                if tok.text.contains('.') || tok.text.contains(['e', 'E']) {
                    let d = Decimal::from_str_exact(&tok.text).map_err(|e| Error::Parse {
                        message: e.to_string(),
                        line: tok.line,
                        column: tok.column,
                    })?;
                    Ok(AstNode::NumberLiteral(d))
                } else {
                    tok.text.parse::<i64>().map(AstNode::IntLiteral).map_err(|_| Error::Parse {
                        message: format!("invalid integer literal '{}'", tok.text),
                        line: tok.line,
                        column: tok.column,
                    })
                }
            }
            TokenType::String => {
                self.advance();
                Ok(AstNode::StringLiteral(Rc::from(tok.text.as_str())))
            }
            TokenType::Boolean => {
                self.advance();
                Ok(AstNode::BoolLiteral(tok.text == "true"))
            }
            TokenType::Null => {
                self.advance();
                Ok(AstNode::NullLiteral)
            }
            TokenType::Identifier => {
                self.advance();
                Ok(AstNode::Identifier(Rc::from(tok.text.as_str())))
            }
            TokenType::OpenParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenType::CloseParen, "')'")?;
                Ok(expr)
            }
            TokenType::OpenBracket => self.parse_array_literal(),
            TokenType::OpenBrace => self.parse_object_literal(),
            _ => Err(Error::Parse {
                message: format!("unexpected token '{}'", tok.text),
                line: tok.line,
                column: tok.column,
            }),
        }
    }

    /// Attempts `'(' (identifier (',' identifier)*)? ')' '=>'`. Returns
    /// `Ok(None)` (rewinding fully) if the shape doesn't match, so the
    /// caller falls back to parsing a parenthesized expression.
    fn try_parse_parenthesized_lambda(&mut self) -> Result<Option<AstNode>> {
        let checkpoint = self.pos;
        self.advance(); // '('
        let mut params = Vec::new();
        if !self.check(TokenType::CloseParen) {
            loop {
                if !self.check(TokenType::Identifier) {
                    self.pos = checkpoint;
                    return Ok(None);
                }
                params.push(self.advance().text);
                if self.eat(TokenType::Comma) {
                    continue;
                }
                break;
            }
        }
        if !self.eat(TokenType::CloseParen) || !self.eat(TokenType::FatArrow) {
            self.pos = checkpoint;
            return Ok(None);
        }
        let body = self.parse_expression()?;
        Ok(Some(AstNode::Lambda {
            params: Rc::new(params),
            body: Box::new(body),
        }))
    }

    fn parse_array_literal(&mut self) -> Result<AstNode> {
        self.expect(TokenType::OpenBracket, "'['")?;
        let mut items = Vec::new();
        if !self.check(TokenType::CloseBracket) {
            loop {
                items.push(self.parse_expression()?);
                if !self.eat(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::CloseBracket, "']'")?;
        Ok(AstNode::ArrayLiteral(items))
    }

    fn parse_object_literal(&mut self) -> Result<AstNode> {
        self.expect(TokenType::OpenBrace, "'{'")?;
        let mut entries = Vec::new();
        if !self.check(TokenType::CloseBrace) {
            loop {
                let key_tok = if self.check(TokenType::Identifier) || self.check(TokenType::String)
                {
                    self.advance()
                } else {
                    return Err(Error::Parse {
                        message: "expected object key".into(),
                        line: self.peek().line,
                        column: self.peek().column,
                    });
                };
                self.expect(TokenType::Colon, "':' after object key")?;
                let value = self.parse_expression()?;
                entries.push((key_tok.text, value));
                if !self.eat(TokenType::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenType::CloseBrace, "'}'")?;
        Ok(AstNode::ObjectLiteral(entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_precedence() {
        let ast = parse("1 + 2 * 3").unwrap();
        match ast {
            AstNode::Binary { op: BinaryOp::Add, right, .. } => {
                assert!(matches!(*right, AstNode::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn power_is_right_associative() {
        // 2 ** 3 ** 2 == 2 ** (3 ** 2)
        let ast = parse("2 ** 3 ** 2").unwrap();
        match ast {
            AstNode::Binary { op: BinaryOp::Pow, right, .. } => {
                assert!(matches!(*right, AstNode::Binary { op: BinaryOp::Pow, .. }));
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn parses_ternary() {
        let ast = parse("a > 0 ? 'pos' : 'neg'").unwrap();
        assert!(matches!(ast, AstNode::Ternary { .. }));
    }

    #[test]
    fn parses_member_index_and_call() {
        let ast = parse("a.b[0]($x)").unwrap();
        assert!(matches!(ast, AstNode::Call { .. }));
    }

    #[test]
    fn parses_single_param_lambda() {
        let ast = parse("x => x + 1").unwrap();
        match ast {
            AstNode::Lambda { params, .. } => assert_eq!(*params, vec!["x".to_string()]),
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn parses_multi_param_lambda_vs_parenthesized_expr() {
        let lambda = parse("(a, b) => a + b").unwrap();
        assert!(matches!(lambda, AstNode::Lambda { .. }));

        let grouped = parse("(1 + 2) * 3").unwrap();
        assert!(matches!(grouped, AstNode::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn parses_array_and_object_literals() {
        let arr = parse("[1, 2, 3]").unwrap();
        assert!(matches!(arr, AstNode::ArrayLiteral(items) if items.len() == 3));

        let obj = parse("{a: 1, b: 2}").unwrap();
        assert!(matches!(obj, AstNode::ObjectLiteral(entries) if entries.len() == 2));
    }

    #[test]
    fn trailing_tokens_are_a_parse_error() {
        assert!(parse("1 + 2 3").is_err());
    }

    #[test]
    fn query_variable_identifier() {
        let ast = parse("?x == 1").unwrap();
        match ast {
            AstNode::Binary { left, .. } => {
                assert!(matches!(*left, AstNode::Identifier(ref n) if &**n == "?x"));
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }
}
