//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::mem;

use rowan::TextSize;

use super::scope::{self, Scope};

/// Name given to the `$$` escape. The built-in variable table resolves it to
/// a literal `$`.
pub const BUILTIN_DOLLAR: &str = "__builtin_dollar";

/// How a variable reference was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// `$(name)`
    Paren,
    /// `${name}`
    Brace,
    /// `$X` and `$$`
    Bare,
}

/// A `$(...)` reference. The name is itself a [`MakeString`], so computed
/// names such as `$($(ARCH)_FLAGS)` are representable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: MakeString,
    /// Offset of the `$`
    pub pos: TextSize,
    pub delimiter: Delimiter,
}

impl Variable {
    pub fn new(name: MakeString, pos: TextSize, delimiter: Delimiter) -> Self {
        Self {
            name,
            pos,
            delimiter,
        }
    }

    /// Evaluates the reference as a function call, if it is one.
    ///
    /// A reference is a call when its name splits on whitespace into a
    /// constant head that is a known make function, followed by arguments.
    ///
    /// # Returns
    ///
    /// - `Some(result)` if the reference is a function call.
    /// - `None` if it is a plain variable reference.
    pub fn eval_function(&self, scope: &Scope) -> Option<String> {
        let pieces = self.name.split_n(" \t", Some(2));
        let [head, args] = pieces.as_slice() else {
            return None;
        };
        let name = head.as_const()?;
        if !scope::is_function_name(name) {
            return None;
        }

        let args = args
            .split(",")
            .iter()
            .map(|arg| arg.value(scope))
            .collect::<Vec<_>>();
        log::trace!("evaluating function {name} with {args:?}");
        Some(scope.call_builtin(name, &args))
    }

    /// Best-effort value of the reference in `scope`.
    pub fn value(&self, scope: &Scope) -> String {
        if let Some(result) = self.eval_function(scope) {
            return result;
        }
        scope.get(&self.name.value(scope))
    }

    pub fn dump(&self) -> String {
        match self.delimiter {
            Delimiter::Paren => format!("$({})", self.name.dump()),
            Delimiter::Brace => format!("${{{}}}", self.name.dump()),
            Delimiter::Bare if self.name.as_const() == Some(BUILTIN_DOLLAR) => "$$".to_string(),
            Delimiter::Bare => format!("${}", self.name.dump()),
        }
    }
}

/// Text that may contain variable references.
///
/// Stored as literal fragments interleaved with references:
/// `strings[0] variables[0] strings[1] ... strings[n]`. There is always
/// exactly one more fragment than there are references.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MakeString {
    pub pos: TextSize,
    strings: Vec<String>,
    variables: Vec<Variable>,
}

impl MakeString {
    pub fn new(s: impl Into<String>, pos: TextSize) -> Self {
        Self {
            pos,
            strings: vec![s.into()],
            variables: vec![],
        }
    }

    pub fn strings(&self) -> &[String] {
        &self.strings
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn append_str(&mut self, s: &str) {
        if let Some(last) = self.strings.last_mut() {
            last.push_str(s);
        }
    }

    pub fn append_variable(&mut self, variable: Variable) {
        self.variables.push(variable);
        self.strings.push(String::new());
    }

    /// Concatenates `other` onto the end of this text.
    pub fn append(&mut self, other: MakeString) {
        let mut strings = other.strings.into_iter();
        if let Some(first) = strings.next() {
            self.append_str(&first);
        }
        self.strings.extend(strings);
        self.variables.extend(other.variables);
    }

    /// True if the text contains no references at all.
    pub fn is_const(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn as_const(&self) -> Option<&str> {
        if self.is_const() {
            self.strings.first().map(String::as_str)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_const().is_some_and(str::is_empty)
    }

    /// Returns the reference if the text is exactly one reference with no
    /// surrounding text.
    pub fn as_variable(&self) -> Option<&Variable> {
        match (self.strings.as_slice(), self.variables.as_slice()) {
            ([before, after], [variable]) if before.is_empty() && after.is_empty() => {
                Some(variable)
            }
            _ => None,
        }
    }

    /// Reconstructs the source text.
    pub fn dump(&self) -> String {
        self.join(Variable::dump)
    }

    /// Best-effort evaluation of the text against `scope`.
    pub fn value(&self, scope: &Scope) -> String {
        self.join(|variable| variable.value(scope))
    }

    fn join(&self, mut f: impl FnMut(&Variable) -> String) -> String {
        let mut result = String::new();
        for (i, s) in self.strings.iter().enumerate() {
            result.push_str(s);
            if let Some(variable) = self.variables.get(i) {
                result.push_str(&f(variable));
            }
        }
        result
    }

    /// Splits on any of the characters in `separators`. Only literal text is
    /// split; a reference always stays whole inside one piece.
    pub fn split(&self, separators: &str) -> Vec<MakeString> {
        self.split_n(separators, None)
    }

    /// Like [`MakeString::split`], but produces at most `n` pieces when `n`
    /// is given; the last piece holds the unsplit remainder.
    pub fn split_n(&self, separators: &str, n: Option<usize>) -> Vec<MakeString> {
        let mut pieces = Vec::new();
        let mut current = MakeString::new("", self.pos);

        for (i, s) in self.strings.iter().enumerate() {
            let mut rest = s.as_str();
            while n.is_none_or(|n| pieces.len() + 1 < n) {
                let Some((index, separator)) =
                    rest.char_indices().find(|&(_, c)| separators.contains(c))
                else {
                    break;
                };
                current.append_str(&rest[..index]);
                pieces.push(mem::replace(&mut current, MakeString::new("", self.pos)));
                rest = &rest[index + separator.len_utf8()..];
            }
            current.append_str(rest);

            if let Some(variable) = self.variables.get(i) {
                current.append_variable(variable.clone());
            }
        }

        pieces.push(current);
        pieces
    }

    pub fn trim_left_spaces(&mut self) {
        if let Some(first) = self.strings.first_mut() {
            let removed = first.len() - first.trim_start().len();
            first.drain(..removed);
            self.pos += TextSize::new(removed as u32);
        }
    }

    pub fn trim_right_spaces(&mut self) {
        if let Some(last) = self.strings.last_mut() {
            let trimmed = last.trim_end().len();
            last.truncate(trimmed);
        }
    }

    /// Drops the last character of the trailing literal, used to move the
    /// `+` of `+=` out of a variable name.
    pub fn trim_right_one(&mut self) {
        if let Some(last) = self.strings.last_mut() {
            last.pop();
        }
    }

    pub fn ends_with(&self, c: char) -> bool {
        self.strings.last().is_some_and(|last| last.ends_with(c))
    }
}
