//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use super::SyntaxKind;
use rowan::TextSize;
use std::iter::Peekable;
use std::str::CharIndices;

/// A single token of makefile text.
///
/// Tokens borrow their text from the input, so joining the text of every
/// token reproduces the input exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: SyntaxKind,
    pub text: &'a str,
    pub offset: TextSize,
}

impl Token<'_> {
    pub fn end(&self) -> TextSize {
        self.offset + TextSize::of(self.text)
    }
}

pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Characters that end an identifier run. Everything else, including
    /// `,`, `-`, `/` and `.`, is part of an identifier.
    fn is_identifier_char(c: char) -> bool {
        !matches!(
            c,
            ':' | '#'
                | '='
                | '+'
                | '?'
                | '$'
                | '\\'
                | '('
                | ')'
                | '{'
                | '}'
                | ';'
                | '|'
                | ' '
                | '\t'
                | '\n'
                | '\r'
        )
    }

    fn offset(&mut self) -> usize {
        self.chars
            .peek()
            .map_or(self.input.len(), |&(offset, _)| offset)
    }

    fn read_while<F>(&mut self, predicate: F)
    where
        F: Fn(char) -> bool,
    {
        while let Some(&(_, c)) = self.chars.peek() {
            if !predicate(c) {
                break;
            }
            self.chars.next();
        }
    }

    /// Consumes a line break, treating `\r\n` as one break. Returns false if
    /// the next character is not a line break.
    fn eat_newline(&mut self) -> bool {
        match self.chars.peek() {
            Some(&(_, '\n')) => {
                self.chars.next();
                true
            }
            Some(&(offset, '\r')) if self.input[offset..].starts_with("\r\n") => {
                self.chars.next();
                self.chars.next();
                true
            }
            _ => false,
        }
    }

    /// Retrieves the next token from the input stream, identifying its type
    ///
    /// # Returns
    ///
    /// - `Some(Token)` for the next token if available.
    /// - `None` if the input is exhausted.
    fn next_token(&mut self) -> Option<Token<'a>> {
        let start = self.offset();
        let &(_, c) = self.chars.peek()?;

        let kind = if self.eat_newline() {
            SyntaxKind::NEWLINE
        } else {
            self.chars.next();
            match c {
                ' ' | '\r' => SyntaxKind::WHITESPACE,
                '\t' => SyntaxKind::TAB,
                '\\' => {
                    // An escape covers the backslash and the escaped character;
                    // a backslash at the very end of input stands alone.
                    if self.eat_newline() {
                        SyntaxKind::ESCAPE
                    } else if self.chars.next().is_some() {
                        SyntaxKind::ESCAPE
                    } else {
                        SyntaxKind::BACKSLASH
                    }
                }
                '$' => SyntaxKind::DOLLAR,
                '(' => SyntaxKind::LPAREN,
                ')' => SyntaxKind::RPAREN,
                '{' => SyntaxKind::LBRACE,
                '}' => SyntaxKind::RBRACE,
                ':' => SyntaxKind::COLON,
                '=' => SyntaxKind::EQUALS,
                '+' => SyntaxKind::PLUS,
                '?' => SyntaxKind::QUESTION,
                '#' => SyntaxKind::HASH,
                ';' => SyntaxKind::SEMICOLON,
                '|' => SyntaxKind::PIPE,
                _ => {
                    self.read_while(Self::is_identifier_char);
                    SyntaxKind::IDENTIFIER
                }
            }
        };

        let end = self.offset();
        Some(Token {
            kind,
            text: &self.input[start..end],
            offset: TextSize::new(start as u32),
        })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

pub fn lex(input: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(input);
    lexer.by_ref().collect::<Vec<_>>()
}
