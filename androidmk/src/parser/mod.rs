// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

pub mod ast;
pub mod lex;
pub mod make_string;
pub mod parse;
pub mod scope;

pub use ast::{AssignOp, Assignment, Comment, Directive, Rule, Statement, StatementKind};
pub use make_string::{MakeString, Variable};
pub use parse::{parse, Makefile, Parse, ParseError, ParseErrors};
pub use scope::Scope;

/// The kinds of tokens the lexer produces.
///
/// Everything that is not punctuation or whitespace is lumped into
/// `IDENTIFIER` runs; the parser decides what the text means from context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(non_camel_case_types)]
#[repr(u16)]
pub enum SyntaxKind {
    // Single-char tokens
    WHITESPACE = 0,
    TAB,
    NEWLINE,
    DOLLAR,
    LPAREN,
    RPAREN,
    LBRACE,
    RBRACE,
    COLON,
    EQUALS,
    PLUS,
    QUESTION,
    HASH,
    SEMICOLON,
    PIPE,
    /// A backslash at the end of input with nothing to escape
    BACKSLASH,

    /// A backslash together with the character it escapes
    ESCAPE,
    IDENTIFIER,
}
