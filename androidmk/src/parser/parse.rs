// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use rowan::{TextRange, TextSize};

use super::ast::{AssignOp, Assignment, Comment, Directive, Rule, Statement, StatementKind};
use super::lex::{lex, Token};
use super::make_string::{Delimiter, MakeString, Variable, BUILTIN_DOLLAR};
use super::SyntaxKind::{self, *};

/// The parser gives up after this many errors.
pub const MAX_ERRORS: usize = 100;

static DIRECTIVES: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    HashSet::from_iter([
        "-include", "define", "else", "endef", "endif", "ifdef", "ifeq", "ifndef", "ifneq",
        "include", "sinclude",
    ])
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: TextSize,
    /// 1-based
    pub line: usize,
    /// 1-based, in bytes
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseErrors(pub Vec<ParseError>);

impl fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for err in &self.0 {
            writeln!(f, "{}", err)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseErrors {}

/// Byte offsets of line starts, for turning offsets into line numbers.
#[derive(Debug, Clone)]
struct LineIndex(Vec<usize>);

impl LineIndex {
    fn new(text: &str) -> Self {
        let starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self(starts)
    }

    /// 1-based line and column of `offset`.
    fn line_col(&self, offset: TextSize) -> (usize, usize) {
        let offset = usize::from(offset);
        let line = self.0.partition_point(|&start| start <= offset);
        let column = offset - self.0[line - 1] + 1;
        (line, column)
    }
}

/// Everything the parser produced, errors included.
#[derive(Debug)]
pub struct Parse {
    /// Statements ordered by source position, comments included.
    pub statements: Vec<Statement>,
    pub errors: Vec<ParseError>,
}

pub fn parse(text: &str) -> Parse {
    struct Parser<'a> {
        source: &'a str,
        /// input tokens, including whitespace,
        /// in *reverse* order.
        tokens: Vec<Token<'a>>,
        lines: LineIndex,
        /// End offset of the last consumed token.
        last_end: TextSize,
        statements: Vec<Statement>,
        /// Comments are collected on the side and merged back in at the end.
        comments: Vec<Statement>,
        errors: Vec<ParseError>,
    }

    impl<'a> Parser<'a> {
        fn error_at(&mut self, offset: TextSize, message: String) {
            if self.errors.len() >= MAX_ERRORS {
                return;
            }
            let (line, column) = self.lines.line_col(offset);
            log::debug!("parse error at {line}:{column}: {message}");
            self.errors.push(ParseError {
                message,
                offset,
                line,
                column,
            });
            if self.errors.len() >= MAX_ERRORS {
                log::warn!("too many parse errors, giving up");
                self.tokens.clear();
            }
        }

        fn error(&mut self, message: String) {
            self.error_at(self.offset(), message);
        }

        fn statement(&self, kind: StatementKind, start: TextSize) -> Statement {
            let end = self.last_end.max(start);
            let (start_line, _) = self.lines.line_col(start);
            let (end_line, _) = if end > start {
                self.lines.line_col(end - TextSize::new(1))
            } else {
                (start_line, 0)
            };
            Statement {
                kind,
                span: TextRange::new(start, end),
                start_line,
                end_line,
            }
        }

        fn push(&mut self, kind: StatementKind, start: TextSize) {
            let statement = self.statement(kind, start);
            self.statements.push(statement);
        }

        fn parse_lines(&mut self) {
            loop {
                self.skip_whitespace();
                if self.current().is_none() {
                    return;
                }

                if self.parse_directive() {
                    continue;
                }

                let ident = self.parse_expression(&[EQUALS, QUESTION, COLON, HASH, NEWLINE]);
                self.skip_spaces();

                match self.current() {
                    Some(QUESTION) => {
                        self.bump();
                        if self.current() == Some(EQUALS) {
                            self.parse_assignment(AssignOp::QuestionEquals, None, ident);
                        } else {
                            self.error("expected = after ?".to_string());
                            self.skip_line();
                        }
                    }
                    Some(COLON) => {
                        self.bump();
                        match (self.current(), self.nth(1)) {
                            (Some(EQUALS), _) => {
                                self.parse_assignment(AssignOp::ColonEquals, None, ident)
                            }
                            (Some(COLON), Some(EQUALS)) => {
                                // `::=`
                                self.bump();
                                self.parse_assignment(AssignOp::ColonEquals, None, ident);
                            }
                            (Some(COLON), _) => {
                                // double-colon rule
                                self.bump();
                                self.parse_rule(ident);
                            }
                            _ => self.parse_rule(ident),
                        }
                    }
                    Some(EQUALS) => self.parse_assignment(AssignOp::Equals, None, ident),
                    Some(HASH) | Some(NEWLINE) | None => {
                        if let Some(variable) = ident.as_variable() {
                            let kind = StatementKind::Variable(variable.clone());
                            self.push(kind, ident.pos);
                        } else if !ident.is_empty() {
                            self.error_at(
                                ident.pos,
                                format!(
                                    "expected directive, rule, or assignment after ident {}",
                                    ident.dump()
                                ),
                            );
                        }
                        match self.current() {
                            Some(HASH) => self.parse_comment(),
                            Some(NEWLINE) => {
                                self.bump();
                            }
                            _ => return,
                        }
                    }
                    Some(kind) => {
                        self.error(format!("unexpected {kind:?}"));
                        self.skip_line();
                    }
                }
            }
        }

        /// Skips the rest of the line, the newline included.
        fn skip_line(&mut self) {
            while let Some(token) = self.bump() {
                if token.kind == NEWLINE {
                    break;
                }
            }
        }

        /// Parses a directive if the current token is one.
        ///
        /// # Returns
        ///
        /// - true if a directive was consumed.
        /// - false if the line is something else; nothing is consumed.
        fn parse_directive(&mut self) -> bool {
            let Some(token) = self.tokens.last().copied() else {
                return false;
            };
            if token.kind != IDENTIFIER || !DIRECTIVES.contains(token.text) {
                return false;
            }

            // `include := foo` assigns to a variable that happens to be named
            // like a directive
            let mut n = 1;
            while matches!(self.nth(n), Some(WHITESPACE | TAB)) {
                n += 1;
            }
            if matches!(self.nth(n), Some(EQUALS | COLON | PLUS | QUESTION)) {
                return false;
            }

            self.bump();
            let name = token.text.to_string();
            let args = match name.as_str() {
                "else" | "endif" | "endef" => MakeString::new("", self.offset()),
                "define" => self.parse_define(),
                _ => {
                    self.skip_spaces();
                    let mut args = self.parse_expression(&[]);
                    args.trim_right_spaces();
                    args
                }
            };

            self.push(
                StatementKind::Directive(Directive { name, args }),
                token.offset,
            );
            true
        }

        /// Captures a `define` block verbatim up to its `endef` line.
        fn parse_define(&mut self) -> MakeString {
            self.skip_spaces();
            let start = self.offset();
            let from = usize::from(start);
            let rest = &self.source[from..];

            let mut offset = from;
            let mut end = None;
            for (i, line) in rest.split_inclusive('\n').enumerate() {
                if i > 0 && is_endef(line) {
                    let line_end = offset + line.trim_end_matches(['\n', '\r']).len();
                    end = Some((offset, line_end));
                    break;
                }
                offset += line.len();
            }

            let (body_end, block_end) = match end {
                Some(end) => end,
                None => {
                    self.error("unexpected EOF while looking for endef".to_string());
                    (self.source.len(), self.source.len())
                }
            };

            while self
                .tokens
                .last()
                .is_some_and(|token| usize::from(token.offset) < block_end)
            {
                self.bump();
            }

            let body = &self.source[from..body_end];
            let body = body
                .strip_suffix('\n')
                .map(|body| body.strip_suffix('\r').unwrap_or(body))
                .unwrap_or(body);
            MakeString::new(body, start)
        }

        /// Parses text up to the first of `end`, a newline, or a comment.
        ///
        /// When `end` holds a closing bracket, opening brackets of the same
        /// kind nest, so `$(subst (,x,y))` stops at the right `)`.
        fn parse_expression(&mut self, end: &[SyntaxKind]) -> MakeString {
            let mut value = MakeString::new("", self.offset());
            let close = end.iter().copied().find(|&k| k == RPAREN || k == RBRACE);
            let open = match close {
                Some(RPAREN) => Some(LPAREN),
                Some(RBRACE) => Some(LBRACE),
                _ => None,
            };
            let mut depth = 0usize;

            loop {
                let Some(kind) = self.current() else {
                    break;
                };

                if depth > 0 && Some(kind) == close {
                    depth -= 1;
                    value.append_str(self.bump_text());
                    continue;
                }
                if end.contains(&kind) {
                    break;
                }

                match kind {
                    NEWLINE => break,
                    ESCAPE => {
                        let text = self.bump_text();
                        if text[1..].starts_with(['\n', '\r']) {
                            value.append_str(" ");
                        } else {
                            value.append_str(text);
                        }
                    }
                    BACKSLASH => {
                        self.error("expected escaped character, found end of input".to_string());
                        self.bump();
                        break;
                    }
                    HASH => {
                        self.parse_comment();
                        break;
                    }
                    DOLLAR => {
                        let variable = self.parse_variable();
                        value.append_variable(variable);
                    }
                    kind if Some(kind) == open => {
                        depth += 1;
                        value.append_str(self.bump_text());
                    }
                    _ => value.append_str(self.bump_text()),
                }
            }

            value
        }

        fn parse_variable(&mut self) -> Variable {
            let pos = self.offset();
            self.bump();

            match self.current() {
                Some(LPAREN) => self.parse_bracketed_variable(RPAREN, Delimiter::Paren, pos),
                Some(LBRACE) => self.parse_bracketed_variable(RBRACE, Delimiter::Brace, pos),
                Some(DOLLAR) => {
                    self.bump();
                    Variable::new(MakeString::new(BUILTIN_DOLLAR, pos), pos, Delimiter::Bare)
                }
                None | Some(NEWLINE) => {
                    self.error("expected variable name, found end of line".to_string());
                    Variable::new(MakeString::new("", pos), pos, Delimiter::Bare)
                }
                Some(_) => {
                    let name_pos = self.offset();
                    let name = self.bump_char();
                    Variable::new(MakeString::new(name, name_pos), pos, Delimiter::Bare)
                }
            }
        }

        fn parse_bracketed_variable(
            &mut self,
            close: SyntaxKind,
            delimiter: Delimiter,
            pos: TextSize,
        ) -> Variable {
            self.bump();
            let name = self.parse_expression(&[close]);
            if self.current() == Some(close) {
                self.bump();
            } else {
                let bracket = if close == RPAREN { ')' } else { '}' };
                self.error(format!(
                    "expected closing '{bracket}' for variable reference {}",
                    name.dump()
                ));
            }
            Variable::new(name, pos, delimiter)
        }

        fn parse_comment(&mut self) {
            let start = self.offset();
            self.bump();
            let mut text = String::new();
            loop {
                match self.current() {
                    None => break,
                    Some(NEWLINE) => {
                        self.bump();
                        break;
                    }
                    Some(ESCAPE) => {
                        let escaped = self.bump_text();
                        if escaped[1..].starts_with(['\n', '\r']) {
                            text.push('\n');
                        } else {
                            text.push_str(escaped);
                        }
                    }
                    Some(_) => text.push_str(self.bump_text()),
                }
            }
            let comment = self.statement(StatementKind::Comment(Comment { text }), start);
            self.comments.push(comment);
        }

        fn parse_assignment(
            &mut self,
            mut op: AssignOp,
            target: Option<MakeString>,
            mut name: MakeString,
        ) {
            let start = target.as_ref().map_or(name.pos, |target| target.pos);
            self.bump();

            // The value is everything after the operator to the end of the
            // logical line, without surrounding blanks.
            let mut value = self.parse_expression(&[]);
            value.trim_left_spaces();
            value.trim_right_spaces();

            if op == AssignOp::Equals {
                if name.ends_with('+') {
                    name.trim_right_one();
                    op = AssignOp::PlusEquals;
                } else if name.ends_with('?') {
                    name.trim_right_one();
                    op = AssignOp::QuestionEquals;
                }
            }
            name.trim_right_spaces();

            if name.is_empty() {
                self.error_at(start, "empty variable name".to_string());
                return;
            }

            self.push(
                StatementKind::Assignment(Assignment {
                    name,
                    value,
                    op,
                    target,
                }),
                start,
            );
        }

        fn parse_rule(&mut self, mut target: MakeString) {
            target.trim_right_spaces();
            let start = target.pos;
            // Directives inside the recipe land in `statements` first; the
            // rule goes in front of them once it is complete.
            let index = self.statements.len();

            let Some((prerequisites, mut new_line)) = self.parse_rule_prerequisites(&target)
            else {
                return;
            };

            let mut recipe = String::new();
            loop {
                if new_line {
                    // blank lines between recipe lines are ignored
                    let mut blank = 0;
                    while self.nth(blank) == Some(NEWLINE) {
                        blank += 1;
                    }

                    if self.nth(blank) == Some(TAB) {
                        for _ in 0..=blank {
                            self.bump();
                        }
                        new_line = false;
                        continue;
                    } else if blank == 0 && self.parse_directive() {
                        if self.current() == Some(NEWLINE) {
                            self.bump();
                        }
                        continue;
                    } else {
                        break;
                    }
                }

                match self.current() {
                    None => break,
                    Some(NEWLINE) => {
                        self.bump();
                        recipe.push('\n');
                        new_line = true;
                    }
                    Some(_) => recipe.push_str(self.bump_text()),
                }
            }

            let recipe = recipe.trim_end_matches('\n').to_string();
            let rule = self.statement(
                StatementKind::Rule(Rule {
                    target,
                    prerequisites,
                    recipe,
                }),
                start,
            );
            self.statements.insert(index, rule);
        }

        /// Parses the prerequisites of a rule.
        ///
        /// # Returns
        ///
        /// - `Some((prerequisites, new_line))`, `new_line` being true when
        ///   the recipe starts on the following line.
        /// - `None` if the line turned out to be a target-specific
        ///   assignment, which has been pushed already.
        fn parse_rule_prerequisites(&mut self, target: &MakeString) -> Option<(MakeString, bool)> {
            const END: [SyntaxKind; 5] = [HASH, NEWLINE, SEMICOLON, COLON, EQUALS];

            self.skip_spaces();
            let mut prerequisites = self.parse_expression(&END);

            // static pattern rules: `targets: pattern: prerequisites`
            while self.current() == Some(COLON) && self.nth(1) != Some(EQUALS) {
                self.bump();
                prerequisites.append_str(":");
                prerequisites.append(self.parse_expression(&END));
            }
            prerequisites.trim_right_spaces();

            match self.current() {
                Some(EQUALS) => {
                    self.parse_assignment(AssignOp::Equals, Some(target.clone()), prerequisites);
                    None
                }
                Some(COLON) => {
                    self.bump();
                    self.parse_assignment(
                        AssignOp::ColonEquals,
                        Some(target.clone()),
                        prerequisites,
                    );
                    None
                }
                Some(SEMICOLON) => {
                    self.bump();
                    self.skip_spaces();
                    Some((prerequisites, false))
                }
                Some(NEWLINE) => {
                    self.bump();
                    Some((prerequisites, true))
                }
                Some(HASH) => {
                    self.parse_comment();
                    Some((prerequisites, true))
                }
                None => Some((prerequisites, false)),
                Some(kind) => {
                    self.error(format!("unexpected {kind:?} after rule prerequisites"));
                    Some((prerequisites, false))
                }
            }
        }

        /// Advance one token.
        fn bump(&mut self) -> Option<Token<'a>> {
            let token = self.tokens.pop()?;
            self.last_end = token.end();
            Some(token)
        }

        fn bump_text(&mut self) -> &'a str {
            self.bump().map_or("", |token| token.text)
        }

        /// Consumes a single character of the current token, splitting the
        /// token if it is longer.
        fn bump_char(&mut self) -> &'a str {
            let Some(token) = self.tokens.last_mut() else {
                return "";
            };
            let len = token.text.chars().next().map_or(0, char::len_utf8);
            if token.kind != IDENTIFIER || len == token.text.len() {
                return self.bump_text();
            }

            let (head, tail) = token.text.split_at(len);
            token.text = tail;
            token.offset += TextSize::of(head);
            self.last_end = token.offset;
            head
        }

        /// Peek at the first unprocessed token
        fn current(&self) -> Option<SyntaxKind> {
            self.nth(0)
        }

        fn nth(&self, n: usize) -> Option<SyntaxKind> {
            self.tokens
                .len()
                .checked_sub(n + 1)
                .map(|index| self.tokens[index].kind)
        }

        fn offset(&self) -> TextSize {
            self.tokens
                .last()
                .map_or(TextSize::of(self.source), |token| token.offset)
        }

        fn skip_spaces(&mut self) {
            while matches!(self.current(), Some(WHITESPACE | TAB)) {
                self.bump();
            }
        }

        fn skip_whitespace(&mut self) {
            while matches!(self.current(), Some(WHITESPACE | TAB | NEWLINE)) {
                self.bump();
            }
        }
    }

    let mut tokens = lex(text);
    tokens.reverse();

    let mut parser = Parser {
        source: text,
        tokens,
        lines: LineIndex::new(text),
        last_end: TextSize::new(0),
        statements: Vec::new(),
        comments: Vec::new(),
        errors: Vec::new(),
    };
    parser.parse_lines();

    log::debug!(
        "parsed {} statements and {} comments with {} errors",
        parser.statements.len(),
        parser.comments.len(),
        parser.errors.len()
    );

    Parse {
        statements: merge_by_offset(parser.statements, parser.comments),
        errors: parser.errors,
    }
}

/// True for an `endef` line, optionally followed by blanks or a comment.
fn is_endef(line: &str) -> bool {
    let line = line.trim();
    match line.strip_prefix("endef") {
        Some(rest) => rest.is_empty() || rest.starts_with([' ', '\t', '#']),
        None => false,
    }
}

/// Merges two lists that are each ordered by start offset into one.
fn merge_by_offset(statements: Vec<Statement>, comments: Vec<Statement>) -> Vec<Statement> {
    let mut merged = Vec::with_capacity(statements.len() + comments.len());
    let mut comments = comments.into_iter().peekable();

    for statement in statements {
        while let Some(comment) =
            comments.next_if(|comment| comment.span.start() < statement.span.start())
        {
            merged.push(comment);
        }
        merged.push(statement);
    }
    merged.extend(comments);
    merged
}

/// A parsed makefile. Only created from input that parsed without errors;
/// use [`parse`] to get at statements of input that did not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Makefile {
    statements: Vec<Statement>,
}

impl Makefile {
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.statements.iter().filter_map(Statement::as_assignment)
    }

    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.statements.iter().filter_map(Statement::as_directive)
    }

    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.statements.iter().filter_map(Statement::as_rule)
    }

    pub fn comments(&self) -> impl Iterator<Item = &Comment> {
        self.statements.iter().filter_map(Statement::as_comment)
    }
}

impl FromStr for Makefile {
    type Err = ParseErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Parse { statements, errors } = parse(s);
        if errors.is_empty() {
            Ok(Makefile { statements })
        } else {
            Err(ParseErrors(errors))
        }
    }
}
