//! Tokenizer for the expression language (§4.3).

use crate::error::{Error, Result};
use crate::token::{Token, TokenType};

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.kind == TokenType::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while let Some(c) = self.peek() {
                if c.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }
            if self.peek() == Some('/') && self.peek_at(1) == Some('/') {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }
            break;
        }
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();
        let (line, column) = (self.line, self.column);
        let Some(c) = self.peek() else {
            return Ok(Token::new(TokenType::Eof, "", line, column));
        };

        if c.is_ascii_digit() {
            return self.read_number(line, column);
        }
        if c == '\'' || c == '"' {
            return self.read_string(c, line, column);
        }
        if c.is_alphabetic() || c == '_' || c == '$' || c == '?' {
            return self.read_identifier_like(line, column);
        }

        self.advance();
        let two = self.peek();
        macro_rules! tok {
            ($kind:expr, $text:expr) => {
                Ok(Token::new($kind, $text, line, column))
            };
        }
        match c {
            '.' => tok!(TokenType::Dot, "."),
            ',' => tok!(TokenType::Comma, ","),
            ':' => tok!(TokenType::Colon, ":"),
            '(' => tok!(TokenType::OpenParen, "("),
            ')' => tok!(TokenType::CloseParen, ")"),
            '[' => tok!(TokenType::OpenBracket, "["),
            ']' => tok!(TokenType::CloseBracket, "]"),
            '{' => tok!(TokenType::OpenBrace, "{"),
            '}' => tok!(TokenType::CloseBrace, "}"),
            '+' => tok!(TokenType::Plus, "+"),
            '-' => tok!(TokenType::Minus, "-"),
            '%' => tok!(TokenType::Percent, "%"),
            '*' => {
                if two == Some('*') {
                    self.advance();
                    tok!(TokenType::StarStar, "**")
                } else {
                    tok!(TokenType::Star, "*")
                }
            }
            '/' => tok!(TokenType::Slash, "/"),
            '<' => {
                if two == Some('=') {
                    self.advance();
                    tok!(TokenType::Le, "<=")
                } else {
                    tok!(TokenType::Lt, "<")
                }
            }
            '>' => {
                if two == Some('=') {
                    self.advance();
                    tok!(TokenType::Ge, ">=")
                } else {
                    tok!(TokenType::Gt, ">")
                }
            }
            '=' => {
                if two == Some('=') {
                    self.advance();
                    tok!(TokenType::EqEq, "==")
                } else if two == Some('>') {
                    self.advance();
                    tok!(TokenType::FatArrow, "=>")
                } else {
                    Err(Error::Lex {
                        message: "unexpected '='; did you mean '==' or '=>'?".into(),
                        line,
                        column,
                    })
                }
            }
            '!' => {
                if two == Some('=') {
                    self.advance();
                    tok!(TokenType::NotEq, "!=")
                } else {
                    tok!(TokenType::Bang, "!")
                }
            }
            '?' => {
                if two == Some('?') {
                    self.advance();
                    tok!(TokenType::Coalesce, "??")
                } else {
                    tok!(TokenType::Question, "?")
                }
            }
            '&' => {
                if two == Some('&') {
                    self.advance();
                    tok!(TokenType::AndAnd, "&&")
                } else {
                    Err(Error::Lex {
                        message: "unexpected '&'".into(),
                        line,
                        column,
                    })
                }
            }
            '|' => {
                if two == Some('|') {
                    self.advance();
                    tok!(TokenType::OrOr, "||")
                } else {
                    Err(Error::Lex {
                        message: "unexpected '|'".into(),
                        line,
                        column,
                    })
                }
            }
            other => Err(Error::Lex {
                message: format!("unexpected character '{other}'"),
                line,
                column,
            }),
        }
    }

    fn read_number(&mut self, line: usize, column: usize) -> Result<Token> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let mut lookahead = 1;
            if matches!(self.peek_at(lookahead), Some('+') | Some('-')) {
                lookahead += 1;
            }
            if self.peek_at(lookahead).is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        Ok(Token::new(TokenType::Number, text, line, column))
    }

    fn read_string(&mut self, quote: char, line: usize, column: usize) -> Result<Token> {
        self.advance();
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(Error::Lex {
                        message: "unterminated string literal".into(),
                        line,
                        column,
                    })
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.advance() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some(q) if q == quote => value.push(q),
                        Some(other) => value.push(other),
                        None => {
                            return Err(Error::Lex {
                                message: "unterminated escape sequence".into(),
                                line,
                                column,
                            })
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.advance();
                }
            }
        }
        Ok(Token::new(TokenType::String, value, line, column))
    }

    fn read_identifier_like(&mut self, line: usize, column: usize) -> Result<Token> {
        let start = self.pos;
        if matches!(self.peek(), Some('$') | Some('?')) {
            self.advance();
        }
        while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
            self.advance();
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        if text.is_empty() || text == "$" || text == "?" {
            return Err(Error::Lex {
                message: format!("invalid identifier '{text}'"),
                line,
                column,
            });
        }
        let kind = match text.as_str() {
            "true" | "false" => TokenType::Boolean,
            "null" => TokenType::Null,
            "and" => TokenType::KwAnd,
            "or" => TokenType::KwOr,
            "not" => TokenType::KwNot,
            _ => TokenType::Identifier,
        };
        Ok(Token::new(kind, text, line, column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenType> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_arithmetic() {
        assert_eq!(
            kinds("1 + 2 * 3"),
            vec![
                TokenType::Number,
                TokenType::Plus,
                TokenType::Number,
                TokenType::Star,
                TokenType::Number,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn tokenizes_builtin_and_query_vars() {
        let toks = Lexer::new("$sqrt(?x)").tokenize().unwrap();
        assert_eq!(toks[0].text, "$sqrt");
        assert_eq!(toks[2].text, "?x");
    }

    #[test]
    fn tokenizes_lambda_arrow() {
        assert_eq!(
            kinds("x => x + 1"),
            vec![
                TokenType::Identifier,
                TokenType::FatArrow,
                TokenType::Identifier,
                TokenType::Plus,
                TokenType::Number,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(
            kinds("1 // comment\n+ 2"),
            vec![TokenType::Number, TokenType::Plus, TokenType::Number, TokenType::Eof]
        );
    }

    #[test]
    fn string_escapes() {
        let toks = Lexer::new(r"'a\'b'").tokenize().unwrap();
        assert_eq!(toks[0].text, "a'b");
    }

    #[test]
    fn coalesce_and_logical_ops() {
        assert_eq!(
            kinds("a ?? b && c || d"),
            vec![
                TokenType::Identifier,
                TokenType::Coalesce,
                TokenType::Identifier,
                TokenType::AndAnd,
                TokenType::Identifier,
                TokenType::OrOr,
                TokenType::Identifier,
                TokenType::Eof,
            ]
        );
    }
}
