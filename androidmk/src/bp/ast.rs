//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use core::fmt;

/// The type a blueprint value evaluates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    List,
    Bool,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Bool => "bool",
            ValueKind::Map => "map",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    String(String),
    List(Vec<Value>),
    Bool(bool),
    /// Properties in insertion order
    Map(Vec<Property>),
    Expression(Box<Expression>),
    /// A reference to a blueprint variable, assigned elsewhere.
    Variable { name: String, kind: ValueKind },
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Bool(_) => ValueKind::Bool,
            Value::Map(_) => ValueKind::Map,
            Value::Expression(expression) => expression.kind,
            Value::Variable { kind, .. } => *kind,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[Property]> {
        match self {
            Value::Map(properties) => Some(properties),
            _ => None,
        }
    }
}

/// A binary expression. Blueprint only has `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub operator: char,
    pub args: [Value; 2],
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: Value,
    pub line: usize,
}

impl Property {
    pub fn new(name: impl Into<String>, value: Value, line: usize) -> Self {
        Self {
            name: name.into(),
            value,
            line,
        }
    }
}

/// Looks up a property by dotted path, `arch.arm.cflags` being the `cflags`
/// property of the `arm` map inside the `arch` map.
pub fn find_property<'a>(properties: &'a [Property], path: &str) -> Option<&'a Property> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let property = properties.iter().find(|property| property.name == head)?;
    match rest {
        None => Some(property),
        Some(rest) => find_property(property.value.as_map()?, rest),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// The module type, `cc_binary` and so on.
    pub typ: String,
    pub properties: Vec<Property>,
    /// Line of the opening brace
    pub line: usize,
    /// Line of the closing brace
    pub end_line: usize,
}

impl Module {
    /// The value at a dotted property path.
    pub fn property(&self, path: &str) -> Option<&Value> {
        find_property(&self.properties, path).map(|property| &property.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Assigner {
    Equals,
    PlusEquals,
}

impl fmt::Display for Assigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assigner::Equals => write!(f, "="),
            Assigner::PlusEquals => write!(f, "+="),
        }
    }
}

/// A top-level variable assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: Value,
    pub assigner: Assigner,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Assignment(Assignment),
    Module(Module),
}

impl Definition {
    pub fn line(&self) -> usize {
        match self {
            Definition::Assignment(assignment) => assignment.line,
            Definition::Module(module) => module.line,
        }
    }

    pub fn end_line(&self) -> usize {
        match self {
            Definition::Assignment(assignment) => assignment.line,
            Definition::Module(module) => module.end_line,
        }
    }
}

/// A block of `//` comment lines, printed as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub lines: Vec<String>,
    pub line: usize,
}

impl Comment {
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct File {
    /// Definitions in the order they were finished.
    pub defs: Vec<Definition>,
    pub comments: Vec<Comment>,
}

impl File {
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.defs.iter().filter_map(|def| match def {
            Definition::Module(module) => Some(module),
            _ => None,
        })
    }

    pub fn assignments(&self) -> impl Iterator<Item = &Assignment> {
        self.defs.iter().filter_map(|def| match def {
            Definition::Assignment(assignment) => Some(assignment),
            _ => None,
        })
    }
}
