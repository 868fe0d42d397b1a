// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Huang Rui <vowstar@gmail.com>

//! Token source for LEF files
//!
//! Splits raw LEF text into typed tokens with source positions. Keyword
//! classification can be suspended for a single upcoming token ("name mode")
//! so that block names which spell like keywords still lex as plain
//! identifiers. The block tracker drives name mode through the
//! [`TokenSource`] trait.

use nom::{
    bytes::complete::{take_until, take_while1},
    character::complete::char,
    sequence::delimited,
    IResult, Parser,
};

use super::error::{LefError, LefResult};

/// Token vocabulary of the LEF lexical grammar
///
/// Only tokens the block tracker or the statement grammar dispatch on get a
/// dedicated keyword kind; every other word lexes as `Ident` or `Number` and
/// is matched by text where needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    End,
    Version,
    BusBitChars,
    DividerChar,
    Units,
    PropertyDefinitions,
    Layer,
    Site,
    Via,
    ViaRule,
    Macro,
    Pin,
    Port,
    Obs,
    Foreign,
    Property,
    Ident,
    Number,
    QuotedString,
    Semi,
}

/// A single token with its literal text and source position
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
}

/// Contract between a tokenizer and the block-structure tracker
pub trait TokenSource {
    /// Produce the next token, or `None` at end of input
    fn next_token(&mut self) -> LefResult<Option<Token>>;

    /// Lex the next raw span as a plain identifier regardless of spelling
    fn push_name_mode(&mut self);
}

fn keyword(word: &str) -> Option<TokenKind> {
    let kind = match word {
        "END" => TokenKind::End,
        "VERSION" => TokenKind::Version,
        "BUSBITCHARS" => TokenKind::BusBitChars,
        "DIVIDERCHAR" => TokenKind::DividerChar,
        "UNITS" => TokenKind::Units,
        "PROPERTYDEFINITIONS" => TokenKind::PropertyDefinitions,
        "LAYER" => TokenKind::Layer,
        "SITE" => TokenKind::Site,
        "VIA" => TokenKind::Via,
        "VIARULE" => TokenKind::ViaRule,
        "MACRO" => TokenKind::Macro,
        "PIN" => TokenKind::Pin,
        "PORT" => TokenKind::Port,
        "OBS" => TokenKind::Obs,
        "FOREIGN" => TokenKind::Foreign,
        "PROPERTY" => TokenKind::Property,
        _ => return None,
    };
    Some(kind)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != ';' && c != '"' && c != '#').parse(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_until("\""), char('"')).parse(input)
}

/// Tokenizer over in-memory LEF text
pub struct Lexer<'a> {
    rest: &'a str,
    file: String,
    line: u32,
    column: u32,
    name_mode: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str, file: &str) -> Self {
        Self {
            rest: text,
            file: file.to_string(),
            line: 1,
            column: 1,
            name_mode: false,
        }
    }

    fn advance(&mut self, len: usize) {
        let (consumed, rest) = self.rest.split_at(len);
        for c in consumed.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        self.rest = rest;
    }

    /// Skip whitespace and `#` comments running to end of line
    fn skip_trivia(&mut self) {
        loop {
            let stripped = self.rest.trim_start();
            let ws = self.rest.len() - stripped.len();
            if ws > 0 {
                self.advance(ws);
            }
            if self.rest.starts_with('#') {
                let len = self.rest.find('\n').unwrap_or(self.rest.len());
                self.advance(len);
                continue;
            }
            break;
        }
    }
}

impl TokenSource for Lexer<'_> {
    fn next_token(&mut self) -> LefResult<Option<Token>> {
        self.skip_trivia();
        let Some(first) = self.rest.chars().next() else {
            return Ok(None);
        };
        let (line, column) = (self.line, self.column);

        if first == ';' {
            self.advance(1);
            return Ok(Some(Token {
                kind: TokenKind::Semi,
                text: ";".to_string(),
                line,
                column,
            }));
        }

        if first == '"' {
            return match quoted(self.rest) {
                Ok((after, inner)) => {
                    let text = inner.to_string();
                    let len = self.rest.len() - after.len();
                    self.advance(len);
                    Ok(Some(Token {
                        kind: TokenKind::QuotedString,
                        text,
                        line,
                        column,
                    }))
                }
                Err(_) => Err(LefError::syntax(
                    &self.file,
                    line,
                    column,
                    "unterminated string literal",
                )),
            };
        }

        match word(self.rest) {
            Ok((after, span)) => {
                let kind = if self.name_mode {
                    self.name_mode = false;
                    TokenKind::Ident
                } else if let Some(kw) = keyword(span) {
                    kw
                } else if span.parse::<f64>().is_ok() {
                    TokenKind::Number
                } else {
                    TokenKind::Ident
                };
                let text = span.to_string();
                let len = self.rest.len() - after.len();
                self.advance(len);
                Ok(Some(Token {
                    kind,
                    text,
                    line,
                    column,
                }))
            }
            Err(_) => Err(LefError::syntax(
                &self.file,
                line,
                column,
                format!("unexpected character {first:?}"),
            )),
        }
    }

    fn push_name_mode(&mut self) {
        self.name_mode = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_tokens(text: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(text, "<test>");
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token().expect("lexing failed") {
            tokens.push(token);
        }
        tokens
    }

    #[test]
    fn test_basic_tokens() {
        let tokens = all_tokens("VERSION 5.8 ;");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Version, TokenKind::Number, TokenKind::Semi]
        );
        assert_eq!(tokens[1].text, "5.8");
    }

    #[test]
    fn test_positions_and_comments() {
        let tokens = all_tokens("# header comment\nMACRO and2\n");
        assert_eq!(tokens[0].kind, TokenKind::Macro);
        assert_eq!((tokens[0].line, tokens[0].column), (2, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (2, 7));
    }

    #[test]
    fn test_quoted_string_strips_quotes() {
        let tokens = all_tokens("BUSBITCHARS \"[]\" ;");
        assert_eq!(tokens[1].kind, TokenKind::QuotedString);
        assert_eq!(tokens[1].text, "[]");
    }

    #[test]
    fn test_bus_pin_name_is_one_token() {
        let tokens = all_tokens("x[31]");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "x[31]");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
    }

    #[test]
    fn test_name_mode_suppresses_keywords() {
        let mut lexer = Lexer::new("MACRO MACRO", "<test>");
        let first = lexer.next_token().unwrap().unwrap();
        assert_eq!(first.kind, TokenKind::Macro);
        lexer.push_name_mode();
        let second = lexer.next_token().unwrap().unwrap();
        assert_eq!(second.kind, TokenKind::Ident);
        assert_eq!(second.text, "MACRO");
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("\"oops", "<test>");
        assert!(lexer.next_token().is_err());
    }
}
