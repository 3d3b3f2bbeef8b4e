//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Variables whose translation is more than a rename.

use super::tables::Rewrite;
use super::values::{add_values, make_to_list, make_to_string};
use super::{BpFile, TranslateError};
use crate::bp::Value;
use crate::parser::MakeString;

pub(super) fn apply(
    file: &mut BpFile,
    rewrite: Rewrite,
    prefix: Option<&str>,
    value: &MakeString,
    append: bool,
) -> Result<(), TranslateError> {
    match rewrite {
        Rewrite::LocalIncludeDirs => local_include_dirs(file, prefix, value, append),
        Rewrite::ExportIncludeDirs => export_include_dirs(file, prefix, value, append),
        Rewrite::Stem => stem(file, prefix, value, append),
        Rewrite::HostOs => host_os(file, value),
    }
}

fn is_empty_list(value: &Value) -> bool {
    matches!(value, Value::List(values) if values.is_empty())
}

fn is_local_path(value: &Value) -> bool {
    matches!(value, Value::Variable { name, .. } if name == "LOCAL_PATH")
}

/// The module relative form of a `$(LOCAL_PATH)` based path, if `value`
/// is one.
fn local_abs_path(value: &Value) -> Option<Value> {
    match value {
        _ if is_local_path(value) => Some(Value::string(".")),
        Value::Expression(expression) if expression.operator == '+' => {
            let [left, right] = &expression.args;
            if !is_local_path(left) {
                return None;
            }
            let path = right.as_str()?.trim_start_matches('/');
            Some(Value::string(if path.is_empty() { "." } else { path }))
        }
        _ => None,
    }
}

fn combine(left: Value, right: Value) -> Result<Value, TranslateError> {
    if is_empty_list(&left) {
        Ok(right)
    } else if is_empty_list(&right) {
        Ok(left)
    } else {
        add_values(left, right)
    }
}

/// Partitions a list into module relative paths and everything else.
fn split_local_global(value: Value) -> Result<(Value, Value), TranslateError> {
    match value {
        Value::Expression(expression) => {
            let [left, right] = expression.args;
            let (left_local, left_global) = split_local_global(left)?;
            let (right_local, right_global) = split_local_global(right)?;
            Ok((
                combine(left_local, right_local)?,
                combine(left_global, right_global)?,
            ))
        }
        value @ Value::Variable { .. } if is_local_path(&value) => {
            Ok((Value::List(vec![Value::string(".")]), Value::List(vec![])))
        }
        value @ Value::Variable { .. } => Ok((Value::List(vec![]), value)),
        Value::List(values) => {
            let mut local = Vec::new();
            let mut global = Vec::new();
            for value in values {
                match local_abs_path(&value) {
                    Some(path) => local.push(path),
                    None => global.push(value),
                }
            }
            Ok((Value::List(local), Value::List(global)))
        }
        value => Ok((Value::List(vec![]), value)),
    }
}

fn local_include_dirs(
    file: &mut BpFile,
    prefix: Option<&str>,
    value: &MakeString,
    append: bool,
) -> Result<(), TranslateError> {
    let value = make_to_list(value, &file.scope)?;
    let (local, global) = split_local_global(value)?;

    if !is_empty_list(&local) {
        file.set_variable(prefix, "local_include_dirs", local, append, true)?;
    }
    if !is_empty_list(&global) {
        file.set_variable(prefix, "include_dirs", global, append, true)?;
    }
    Ok(())
}

fn export_include_dirs(
    file: &mut BpFile,
    prefix: Option<&str>,
    value: &MakeString,
    mut append: bool,
) -> Result<(), TranslateError> {
    let value = make_to_list(value, &file.scope)?;
    let (local, global) = split_local_global(value)?;

    if !is_empty_list(&local) {
        file.set_variable(prefix, "export_include_dirs", local, append, true)?;
        append = true;
    }
    if !is_empty_list(&global) {
        file.set_variable(prefix, "export_include_dirs", global, append, true)?;
    }
    Ok(())
}

/// `$(LOCAL_MODULE)_foo` only changes the suffix of the output name.
fn stem(
    file: &mut BpFile,
    prefix: Option<&str>,
    value: &MakeString,
    append: bool,
) -> Result<(), TranslateError> {
    let value = make_to_string(value, &file.scope)?;
    let (property, value) = match value {
        Value::Expression(expression)
            if expression.operator == '+'
                && matches!(&expression.args[0], Value::Variable { name, .. } if name == "LOCAL_MODULE") =>
        {
            let [_, suffix] = expression.args;
            ("suffix", suffix)
        }
        value => ("stem", value),
    };
    file.set_variable(prefix, property, value, append, true)
}

fn host_os(file: &mut BpFile, value: &MakeString) -> Result<(), TranslateError> {
    let list = make_to_list(value, &file.scope)?;
    let Some(values) = list.as_list() else {
        return Err(TranslateError::UnsupportedHostOs(value.dump()));
    };
    let listed = |os: &str| values.iter().any(|value| value.as_str() == Some(os));

    let windows = listed("windows");
    let linux = listed("linux");
    let darwin = listed("darwin");

    if windows {
        file.set_variable(Some("target.windows"), "enabled", Value::Bool(true), false, true)?;
    }
    if !linux {
        file.set_variable(Some("target.linux"), "enabled", Value::Bool(false), false, true)?;
    }
    if !darwin {
        file.set_variable(Some("target.darwin"), "enabled", Value::Bool(false), false, true)?;
    }
    Ok(())
}
