// ABOUTME: Tokenizer — splits source text into lexical tokens with one token of look-ahead

use crate::error::ReaderError;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::value,
    IResult, Parser,
};

/// A lexical token. Punctuation the reader dispatches on by identity is
/// represented directly as enum variants rather than round-tripped through
/// the symbol table — the dotted-pair marker `.` is the one exception: it
/// is never special-cased here, so it surfaces as an ordinary
/// [`Token::Atom`] and the reader recognizes it by spelling after interning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    LParen,
    RParen,
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplice,
    Str(String),
    Atom(String),
}

/// Consumes characters from an in-memory source string. Callers read their
/// whole input into a `String` up front and hand it to [`Tokenizer::new`].
pub struct Tokenizer<'a> {
    rest: &'a str,
}

fn skip_ws_and_comments(mut input: &str) -> &str {
    loop {
        let trimmed = input.trim_start_matches([' ', '\n', '\t', '\r']);
        if let Some(after_semi) = trimmed.strip_prefix(';') {
            input = match after_semi.find('\n') {
                Some(nl) => &after_semi[nl..],
                None => "",
            };
            continue;
        }
        if trimmed.len() == input.len() {
            return trimmed;
        }
        input = trimmed;
    }
}

fn punctuation(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::UnquoteSplice, tag(",@")),
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
        value(Token::Quote, char('\'')),
        value(Token::Quasiquote, char('`')),
        value(Token::Unquote, char(',')),
    ))
    .parse(input)
}

fn is_atom_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '(' | ')' | '\'' | '`' | ',' | ';' | '"')
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Tokenizer { rest: src }
    }

    /// The unconsumed remainder of the source, as of the last returned
    /// token. Lets a caller re-create a fresh `Tokenizer`/`Reader` pair
    /// positioned where this one left off, without the two sharing a
    /// lifetime-entangled mutable borrow of the heap across reads.
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    /// Returns the next token, `None` on clean end-of-input, or a lexical
    /// error (unterminated string literal).
    pub fn next_token(&mut self) -> Result<Option<Token>, ReaderError> {
        self.rest = skip_ws_and_comments(self.rest);
        if self.rest.is_empty() {
            return Ok(None);
        }
        if self.rest.starts_with('"') {
            return self.read_string().map(Some);
        }
        if let Ok((rest, tok)) = punctuation(self.rest) {
            self.rest = rest;
            return Ok(Some(tok));
        }
        let end = self
            .rest
            .find(|c: char| !is_atom_char(c))
            .unwrap_or(self.rest.len());
        let (atom, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(Some(Token::Atom(atom.to_string())))
    }

    fn read_string(&mut self) -> Result<Token, ReaderError> {
        let mut chars = self.rest.char_indices();
        let (_, quote) = chars.next().expect("caller checked leading '\"'");
        debug_assert_eq!(quote, '"');
        let mut out = String::new();
        let mut escaping = false;
        loop {
            match chars.next() {
                None => return Err(ReaderError::UnterminatedString),
                Some((byte_pos, c)) => {
                    if escaping {
                        escaping = false;
                        match c {
                            'n' => out.push('\n'),
                            'r' => out.push('\r'),
                            other => out.push(other),
                        }
                    } else if c == '\\' {
                        escaping = true;
                    } else if c == '"' {
                        self.rest = &self.rest[byte_pos + 1..];
                        return Ok(Token::Str(out));
                    } else {
                        out.push(c);
                    }
                }
            }
        }
    }
}
