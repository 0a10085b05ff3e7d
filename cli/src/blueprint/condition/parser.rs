//! Parser: recursive descent over condition tokens
//!
//! Grammar (lowest precedence first):
//!
//! ```text
//! expr    := and ( "||" and )*
//! and     := unary ( "&&" unary )*
//! unary   := "!" unary | primary
//! primary := "(" expr ")" | IDENT ( ("==" | "!=") literal )?
//! literal := STRING | NUMBER | "true" | "false"
//! ```

use super::lexer::{Lexer, Spanned, Token};
use super::{CompareOp, ConditionError, Expr, Literal};

pub(crate) struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    pub fn parse(input: &str) -> Result<Expr, ConditionError> {
        let tokens = Lexer::new(input).tokenize()?;
        let mut parser = Self { tokens, pos: 0 };
        if parser.check(&Token::Eof) {
            return Err(ConditionError::new(0, "empty condition"));
        }
        let expr = parser.parse_or()?;
        if !parser.check(&Token::Eof) {
            return Err(parser.unexpected());
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<Expr, ConditionError> {
        let mut left = self.parse_and()?;
        while self.check(&Token::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ConditionError> {
        let mut left = self.parse_unary()?;
        while self.check(&Token::And) {
            self.advance();
            let right = self.parse_unary()?;
            left = Expr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ConditionError> {
        if self.check(&Token::Not) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ConditionError> {
        match self.peek().clone() {
            Token::OpenParen => {
                self.advance();
                let inner = self.parse_or()?;
                if !self.check(&Token::CloseParen) {
                    return Err(self.unexpected());
                }
                self.advance();
                Ok(inner)
            }
            Token::Ident(variable) => {
                self.advance();
                let op = match self.peek() {
                    Token::Eq => CompareOp::Eq,
                    Token::Ne => CompareOp::Ne,
                    _ => return Ok(Expr::Truthy(variable)),
                };
                self.advance();
                let literal = self.parse_literal()?;
                Ok(Expr::Compare {
                    variable,
                    op,
                    literal,
                })
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ConditionError> {
        let literal = match self.peek() {
            Token::Str(s) => Literal::Str(s.clone()),
            Token::Number(n) => Literal::Number(*n),
            Token::Bool(b) => Literal::Bool(*b),
            _ => return Err(self.unexpected()),
        };
        self.advance();
        Ok(literal)
    }

    fn peek(&self) -> &Token {
        // The token stream always ends with Eof, and `advance` never moves past it.
        &self.tokens[self.pos].token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn unexpected(&self) -> ConditionError {
        let spanned = &self.tokens[self.pos];
        ConditionError::new(spanned.pos, format!("unexpected {}", spanned.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truthy(name: &str) -> Box<Expr> {
        Box::new(Expr::Truthy(name.to_string()))
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = Parser::parse("A || B && C").unwrap();
        assert_eq!(
            expr,
            Expr::Or(truthy("A"), Box::new(Expr::And(truthy("B"), truthy("C"))))
        );
    }

    #[test]
    fn test_parentheses_and_negation() {
        let expr = Parser::parse("!(A || B) && Db != 'none'").unwrap();
        assert_eq!(
            expr,
            Expr::And(
                Box::new(Expr::Not(Box::new(Expr::Or(truthy("A"), truthy("B"))))),
                Box::new(Expr::Compare {
                    variable: "Db".into(),
                    op: CompareOp::Ne,
                    literal: Literal::Str("none".into()),
                })
            )
        );
    }

    #[test]
    fn test_malformed_inputs() {
        for input in ["", "A &&", "(A", "A == ", "A == B", "'x' == A", "A B", ")"] {
            assert!(Parser::parse(input).is_err(), "expected error for {:?}", input);
        }
    }
}
