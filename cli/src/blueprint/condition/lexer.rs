//! Lexer: tokenizes condition expressions
//!
//! Accepts both symbolic (`&&`, `||`, `!`) and word (`and`, `or`, `not`)
//! operators, single- or double-quoted strings, numbers, `true`/`false`
//! and identifiers.

use super::ConditionError;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Number(f64),
    Bool(bool),
    And,
    Or,
    Not,
    Eq,
    Ne,
    OpenParen,
    CloseParen,
    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "identifier '{}'", name),
            Self::Str(s) => write!(f, "string '{}'", s),
            Self::Number(n) => write!(f, "number {}", n),
            Self::Bool(b) => write!(f, "{}", b),
            Self::And => write!(f, "'&&'"),
            Self::Or => write!(f, "'||'"),
            Self::Not => write!(f, "'!'"),
            Self::Eq => write!(f, "'=='"),
            Self::Ne => write!(f, "'!='"),
            Self::OpenParen => write!(f, "'('"),
            Self::CloseParen => write!(f, "')'"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// A token and the character offset it starts at.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: usize,
}

pub(crate) struct Lexer {
    input: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, ConditionError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let pos = self.pos;
            if pos >= self.input.len() {
                tokens.push(Spanned {
                    token: Token::Eof,
                    pos,
                });
                return Ok(tokens);
            }
            let token = self.next_token()?;
            tokens.push(Spanned { token, pos });
        }
    }

    fn next_token(&mut self) -> Result<Token, ConditionError> {
        let start = self.pos;
        let ch = self.input[self.pos];
        match ch {
            '(' => {
                self.pos += 1;
                Ok(Token::OpenParen)
            }
            ')' => {
                self.pos += 1;
                Ok(Token::CloseParen)
            }
            '&' => self.expect_pair('&', Token::And),
            '|' => self.expect_pair('|', Token::Or),
            '=' => self.expect_pair('=', Token::Eq),
            '!' => {
                self.pos += 1;
                if self.peek() == Some('=') {
                    self.pos += 1;
                    Ok(Token::Ne)
                } else {
                    Ok(Token::Not)
                }
            }
            '\'' | '"' => self.read_string(ch),
            c if c.is_ascii_digit() || (c == '-' && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) => {
                self.read_number()
            }
            c if c.is_alphabetic() || c == '_' => Ok(self.read_word()),
            other => Err(ConditionError::new(
                start,
                format!("unexpected character '{}'", other),
            )),
        }
    }

    fn expect_pair(&mut self, second: char, token: Token) -> Result<Token, ConditionError> {
        let start = self.pos;
        let first = self.input[start];
        if self.peek_at(1) == Some(second) {
            self.pos += 2;
            Ok(token)
        } else {
            Err(ConditionError::new(
                start,
                format!("expected '{}{}'", first, second),
            ))
        }
    }

    fn read_string(&mut self, quote: char) -> Result<Token, ConditionError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        while let Some(c) = self.peek() {
            self.pos += 1;
            match c {
                '\\' => match self.peek() {
                    Some(escaped) => {
                        value.push(escaped);
                        self.pos += 1;
                    }
                    None => break,
                },
                c if c == quote => return Ok(Token::Str(value)),
                c => value.push(c),
            }
        }
        Err(ConditionError::new(start, "unterminated string literal"))
    }

    fn read_number(&mut self) -> Result<Token, ConditionError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == '.')
        {
            self.pos += 1;
        }
        let text: String = self.input[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map(Token::Number)
            .map_err(|_| ConditionError::new(start, format!("invalid number '{}'", text)))
    }

    fn read_word(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.pos += 1;
        }
        let word: String = self.input[start..self.pos].iter().collect();
        match word.as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "true" => Token::Bool(true),
            "false" => Token::Bool(false),
            _ => Token::Ident(word),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.input.get(self.pos + offset).copied()
    }
}
