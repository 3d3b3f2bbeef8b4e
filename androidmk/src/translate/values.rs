//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Coercion of makefile text into typed blueprint values.

use std::mem;

use super::TranslateError;
use crate::bp::{Expression, Value, ValueKind};
use crate::parser::make_string::BUILTIN_DOLLAR;
use crate::parser::{MakeString, Scope, Variable};

fn variable_name(variable: &Variable) -> Result<&str, TranslateError> {
    variable
        .name
        .as_const()
        .ok_or_else(|| TranslateError::NonConstVariableName(variable.name.dump()))
}

fn concat(acc: Option<Value>, next: Value) -> Result<Option<Value>, TranslateError> {
    Ok(Some(match acc {
        None => next,
        Some(acc) => add_values(acc, next)?,
    }))
}

/// Coerces text into a string value. References that are not function
/// calls become blueprint variables joined with `+`.
pub fn make_to_string(ms: &MakeString, scope: &Scope) -> Result<Value, TranslateError> {
    let strings = ms.strings();
    let mut value = None;
    if let Some(first) = strings.first().filter(|s| !s.is_empty()) {
        value = Some(Value::string(first.as_str()));
    }

    for (variable, s) in ms.variables().iter().zip(strings.iter().skip(1)) {
        let next = match variable.eval_function(scope) {
            Some(result) => Value::String(result),
            None => match variable_name(variable)? {
                BUILTIN_DOLLAR => Value::string("$"),
                name => Value::Variable {
                    name: name.to_string(),
                    kind: ValueKind::String,
                },
            },
        };
        value = concat(value, next)?;
        if !s.is_empty() {
            value = concat(value, Value::string(s.as_str()))?;
        }
    }

    Ok(value.unwrap_or_else(|| Value::string("")))
}

/// Coerces whitespace separated text into a list value.
///
/// A field that is a single reference to a variable is taken to hold a list
/// already and is kept as a list variable, so `a $(B) c` becomes
/// `["a"] + B + ["c"]`.
pub fn make_to_list(ms: &MakeString, scope: &Scope) -> Result<Value, TranslateError> {
    let mut lists = Vec::new();
    let mut current = Vec::new();

    for field in ms.split(" \t") {
        if field.is_empty() {
            continue;
        }

        let Some(variable) = field.as_variable() else {
            current.push(make_to_string(&field, scope)?);
            continue;
        };

        if let Some(result) = variable.eval_function(scope) {
            current.push(Value::String(result));
            continue;
        }

        match variable_name(variable)? {
            "TOP" => current.push(Value::string(".")),
            BUILTIN_DOLLAR => current.push(Value::string("$")),
            name => {
                if !current.is_empty() {
                    lists.push(Value::List(mem::take(&mut current)));
                }
                lists.push(Value::Variable {
                    name: name.to_string(),
                    kind: ValueKind::List,
                });
            }
        }
    }

    if !current.is_empty() {
        lists.push(Value::List(current));
    }

    let mut lists = lists.into_iter();
    match lists.next() {
        Some(first) => lists.try_fold(first, add_values),
        None => Ok(Value::List(vec![])),
    }
}

pub fn make_to_bool(ms: &MakeString, _scope: &Scope) -> Result<Value, TranslateError> {
    if let Some(s) = ms.as_const() {
        return match s.trim().to_ascii_lowercase().as_str() {
            "true" | "-frtti" => Ok(Value::Bool(true)),
            "false" | "" | "-fno-rtti" => Ok(Value::Bool(false)),
            _ => Err(TranslateError::UnexpectedBool(ms.dump())),
        };
    }

    let mut trimmed = ms.clone();
    trimmed.trim_left_spaces();
    trimmed.trim_right_spaces();
    match trimmed.as_variable() {
        Some(variable) => Ok(Value::Variable {
            name: variable_name(variable)?.to_string(),
            kind: ValueKind::Bool,
        }),
        None => Err(TranslateError::NonConstBool(ms.dump())),
    }
}

fn to_list(value: Value) -> Value {
    match value {
        Value::List(_) => value,
        value => Value::List(vec![value]),
    }
}

/// `left + right`, folded when both sides are literals.
///
/// A string added to a list is promoted to a one element list first.
pub fn add_values(left: Value, right: Value) -> Result<Value, TranslateError> {
    let (left, right) = match (left.kind(), right.kind()) {
        (ValueKind::String, ValueKind::List) => (to_list(left), right),
        (ValueKind::List, ValueKind::String) => (left, to_list(right)),
        _ => (left, right),
    };

    let kind = left.kind();
    if kind != right.kind() {
        return Err(TranslateError::MismatchedTypes {
            left: kind,
            right: right.kind(),
        });
    }
    if kind == ValueKind::Bool {
        return Err(TranslateError::UnsupportedAdd(kind));
    }

    match (left, right) {
        (Value::String(mut a), Value::String(b)) => {
            a.push_str(&b);
            Ok(Value::String(a))
        }
        (Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (left, right) => Ok(Value::Expression(Box::new(Expression {
            operator: '+',
            args: [left, right],
            kind,
        }))),
    }
}
