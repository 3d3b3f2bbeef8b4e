//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use core::fmt;

use rowan::TextRange;

use super::make_string::{MakeString, Variable};

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`, recursively expanded
    Equals,
    /// `:=` and `::=`, simply expanded
    ColonEquals,
    /// `+=`
    PlusEquals,
    /// `?=`
    QuestionEquals,
}

impl AsRef<str> for AssignOp {
    fn as_ref(&self) -> &'static str {
        match self {
            AssignOp::Equals => "=",
            AssignOp::ColonEquals => ":=",
            AssignOp::PlusEquals => "+=",
            AssignOp::QuestionEquals => "?=",
        }
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: MakeString,
    pub value: MakeString,
    pub op: AssignOp,
    /// Set for target-specific assignments such as `foo.o: CFLAGS := -O2`.
    pub target: Option<MakeString>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Text after the `#`. Escaped newlines are kept as `\n`.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    /// The argument text. For `define` this is the variable name followed by
    /// the raw body, separated by a newline.
    pub args: MakeString,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub target: MakeString,
    pub prerequisites: MakeString,
    /// Recipe lines with their leading tabs removed.
    pub recipe: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Assignment(Assignment),
    Comment(Comment),
    Directive(Directive),
    Rule(Rule),
    /// A reference alone on a line, usually `$(call ...)` or `$(eval ...)`.
    Variable(Variable),
}

/// A parsed makefile statement and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: TextRange,
    /// 1-based line of the first character
    pub start_line: usize,
    /// 1-based line of the last character
    pub end_line: usize,
}

impl Statement {
    /// The statement as written in `source`, the text it was parsed from.
    ///
    /// Falls back to [`Statement::dump`] if the span does not lie in
    /// `source`.
    pub fn text(&self, source: &str) -> String {
        let range = usize::from(self.span.start())..usize::from(self.span.end());
        match source.get(range) {
            Some(text) => text.trim_end().to_string(),
            None => self.dump(),
        }
    }

    /// Reconstructs makefile text for the statement.
    pub fn dump(&self) -> String {
        match &self.kind {
            StatementKind::Assignment(assignment) => {
                let mut text = String::new();
                if let Some(target) = &assignment.target {
                    text.push_str(&target.dump());
                    text.push_str(": ");
                }
                text.push_str(&format!(
                    "{} {} {}",
                    assignment.name.dump(),
                    assignment.op,
                    assignment.value.dump()
                ));
                text
            }
            StatementKind::Comment(comment) => format!("#{}", comment.text),
            StatementKind::Directive(directive) if directive.name == "define" => {
                format!("define {}\nendef", directive.args.dump())
            }
            StatementKind::Directive(directive) => {
                if directive.args.is_empty() {
                    directive.name.clone()
                } else {
                    format!("{} {}", directive.name, directive.args.dump())
                }
            }
            StatementKind::Rule(rule) => {
                let mut text = format!("{}: {}", rule.target.dump(), rule.prerequisites.dump());
                for line in rule.recipe.lines() {
                    text.push_str("\n\t");
                    text.push_str(line);
                }
                text
            }
            StatementKind::Variable(variable) => variable.dump(),
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match &self.kind {
            StatementKind::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn as_assignment(&self) -> Option<&Assignment> {
        match &self.kind {
            StatementKind::Assignment(assignment) => Some(assignment),
            _ => None,
        }
    }

    pub fn as_directive(&self) -> Option<&Directive> {
        match &self.kind {
            StatementKind::Directive(directive) => Some(directive),
            _ => None,
        }
    }

    pub fn as_rule(&self) -> Option<&Rule> {
        match &self.kind {
            StatementKind::Rule(rule) => Some(rule),
            _ => None,
        }
    }
}
