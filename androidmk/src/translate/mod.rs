//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Translation of parsed makefile statements into a blueprint file.
//!
//! The translation is a single pass over the statements. Module variables
//! (`LOCAL_*`) are collected between `include $(CLEAR_VARS)` and an
//! `include $(BUILD_*)`, which emits them as one module. Anything that can't
//! be expressed becomes a diagnostic comment in the output instead of
//! aborting the run.

pub mod rewrite;
pub mod tables;
pub mod values;

use core::fmt;
use std::collections::HashMap;

use self::tables::{
    ConditionalTranslation, PropertyKind, ANDROID_SCOPE, CLEAR_VARS,
    CONDITIONAL_TRANSLATIONS, DELETE_PROPERTIES, IGNORED_VARIABLES, REWRITE_PROPERTIES,
    STANDARD_PROPERTIES,
};
use self::values::{add_values, make_to_bool, make_to_list, make_to_string};
use crate::bp::{self, Assigner, Comment, Definition, Module, Property, Value, ValueKind};
use crate::config::Config;
use crate::parser::{AssignOp, Assignment, Directive, MakeString, Scope, Statement, StatementKind};

/// Marker that starts every diagnostic comment.
pub const ERROR_MARKER: &str = "// ANDROIDMK TRANSLATION ERROR: ";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TranslateError {
    #[error("unsupported non-const variable name {0}")]
    NonConstVariableName(String),

    #[error("non-const bool expression {0}")]
    NonConstBool(String),

    #[error("unexpected bool value {0}")]
    UnexpectedBool(String),

    #[error("cannot add mismatched types {left} and {right}")]
    MismatchedTypes { left: ValueKind, right: ValueKind },

    #[error("cannot add {0} values")]
    UnsupportedAdd(ValueKind),

    #[error("unsupported addition: {0}")]
    UnsupportedAddition(Box<TranslateError>),

    #[error("unsupported assignment to {0}")]
    UnsupportedAssignment(String),

    #[error("assignment to {0} outside of a module")]
    OutsideModule(String),

    #[error("property {0} is not a map")]
    NotAMap(String),

    #[error("unsupported LOCAL_MODULE_HOST_OS value {0}")]
    UnsupportedHostOs(String),
}

/// An active `ifeq` style conditional that has a translation.
#[derive(Debug, Clone, Copy)]
struct Conditional {
    translation: &'static ConditionalTranslation,
    /// Whether the branch being read is the one taken when the condition
    /// holds. Flipped by `else`.
    eq: bool,
}

impl Conditional {
    fn prefix(&self) -> Option<&'static str> {
        if self.eq {
            self.translation.true_prefix
        } else {
            self.translation.false_prefix
        }
    }

    fn untaken_prefix(&self) -> Option<&'static str> {
        if self.eq {
            self.translation.false_prefix
        } else {
            self.translation.true_prefix
        }
    }
}

#[derive(Debug)]
struct OpenModule {
    properties: Vec<Property>,
    line: usize,
    /// The `include $(CLEAR_VARS)` text, for diagnostics.
    opened_by: String,
}

/// Translation state.
pub struct BpFile<'a> {
    /// The makefile text, quoted in diagnostics.
    source: &'a str,
    file: bp::File,
    /// Kinds of the global variables assigned so far.
    global_assignments: HashMap<String, ValueKind>,
    scope: Scope<'static>,
    module: Option<OpenModule>,
    /// Synthetic output line, used to order and space definitions and
    /// comments.
    line: usize,
    /// Source line the previous statement ended on.
    prev_line: usize,
    /// `None` frames are conditionals with no translation.
    conds: Vec<Option<Conditional>>,
    /// Index into `conds` of the conditional that prefixes module
    /// properties.
    assignment_cond: Option<usize>,
    config: &'a Config,
}

impl<'a> BpFile<'a> {
    pub fn new(source: &'a str, config: &'a Config) -> Self {
        Self {
            source,
            file: bp::File::default(),
            global_assignments: HashMap::new(),
            scope: Scope::with_parent(&ANDROID_SCOPE),
            module: None,
            line: 0,
            prev_line: 0,
            conds: Vec::new(),
            assignment_cond: None,
            config,
        }
    }

    fn set_pos(&mut self, statement: &Statement) {
        self.line += 1;
        // keep paragraph breaks
        if statement.start_line > self.prev_line + 1 {
            self.line += 1;
        }
        self.prev_line = statement.end_line;
    }

    fn quote(&self, statement: &Statement) -> String {
        statement.text(self.source)
    }

    /// Adds a diagnostic comment quoting `source` at the current line.
    fn errorf(&mut self, source: &str, message: impl fmt::Display) {
        log::warn!("line {}: {message}", self.prev_line);

        let mut lines = vec![format!("{ERROR_MARKER}{message}")];
        lines.extend(source.lines().map(|line| format!("// {line}")));
        self.file.comments.push(Comment {
            lines,
            line: self.line,
        });
    }

    pub fn handle_statement(&mut self, statement: &Statement) {
        self.set_pos(statement);
        log::trace!("{}: {}", statement.start_line, statement.dump());

        match &statement.kind {
            StatementKind::Comment(comment) => {
                let lines = comment
                    .text
                    .split('\n')
                    .map(|line| format!("//{line}"))
                    .collect();
                self.file.comments.push(Comment {
                    lines,
                    line: self.line,
                });
            }
            StatementKind::Assignment(assignment) => self.handle_assignment(statement, assignment),
            StatementKind::Directive(directive) => self.handle_directive(statement, directive),
            StatementKind::Rule(_) | StatementKind::Variable(_) => {
                self.errorf(&self.quote(statement), "unsupported line")
            }
        }
    }

    fn handle_assignment(&mut self, statement: &Statement, assignment: &Assignment) {
        if assignment.target.is_some() {
            return self.errorf(&self.quote(statement), "unsupported target assignment");
        }
        let Some(name) = assignment.name.as_const() else {
            return self.errorf(&self.quote(statement), "unsupported non-const variable name");
        };
        if name.contains(char::is_whitespace) {
            return self.errorf(&self.quote(statement), "unsupported variable name");
        }

        let append = assignment.op == AssignOp::PlusEquals;
        let (name, mut prefix) = if name.starts_with("LOCAL_") {
            tables::split_suffix(name)
        } else {
            (name, None)
        };

        if name.starts_with("LOCAL_") {
            let cond = self
                .assignment_cond
                .and_then(|index| self.conds.get(index).copied().flatten());
            if let Some(cond) = cond {
                if prefix.is_some() {
                    self.errorf(
                        &self.quote(statement),
                        "prefix assignment inside conditional, skipping conditional",
                    );
                } else {
                    match cond.prefix() {
                        Some(cond_prefix) => prefix = Some(cond_prefix),
                        None => {
                            return self
                                .errorf(&self.quote(statement), "unsupported conditional branch");
                        }
                    }
                }
            }
        }

        if let Err(err) = self.dispatch(name, prefix, &assignment.value, append) {
            self.errorf(&self.quote(statement), err);
        }
    }

    fn dispatch(
        &mut self,
        name: &str,
        prefix: Option<&str>,
        value: &MakeString,
        append: bool,
    ) -> Result<(), TranslateError> {
        if IGNORED_VARIABLES.contains(&name) || DELETE_PROPERTIES.contains(&name) {
            log::debug!("dropping {name}");
            return Ok(());
        }

        // The mode only matters for arm, so it goes under arch.arm.
        if name == "LOCAL_ARM_MODE" {
            return self.dispatch("LOCAL_ARM_MODE_HACK", Some("arch.arm"), value, append);
        }

        if let Some(&(property, kind)) = STANDARD_PROPERTIES.get(name) {
            let value = match kind {
                PropertyKind::String => make_to_string(value, &self.scope)?,
                PropertyKind::List => make_to_list(value, &self.scope)?,
                PropertyKind::Bool => make_to_bool(value, &self.scope)?,
            };
            return self.set_variable(prefix, property, value, append, true);
        }

        if let Some(&rewrite) = REWRITE_PROPERTIES.get(name) {
            return rewrite::apply(self, rewrite, prefix, value, append);
        }

        if name.starts_with("LOCAL_") {
            return Err(TranslateError::UnsupportedAssignment(name.to_string()));
        }

        let evaluated = if append && self.global_assignments.contains_key(name) {
            format!("{} {}", self.scope.get(name), value.value(&self.scope))
        } else {
            value.value(&self.scope)
        };
        let list = make_to_list(value, &self.scope)?;
        self.set_variable(None, name, list, append, false)?;
        self.scope.set(name, evaluated);
        Ok(())
    }

    /// Stores a value under `prefix.name`, in the open module when `local`,
    /// as a global variable otherwise.
    pub(crate) fn set_variable(
        &mut self,
        prefix: Option<&str>,
        name: &str,
        value: Value,
        append: bool,
        local: bool,
    ) -> Result<(), TranslateError> {
        if local {
            let path = match prefix {
                Some(prefix) => format!("{prefix}.{name}"),
                None => name.to_string(),
            };
            self.set_local(&path, value, append)
        } else {
            self.set_global(name, value, append)
        }
    }

    fn set_local(&mut self, path: &str, value: Value, append: bool) -> Result<(), TranslateError> {
        let line = self.line;
        let Some(module) = &mut self.module else {
            return Err(TranslateError::OutsideModule(path.to_string()));
        };

        let (parents, name) = match path.rsplit_once('.') {
            Some((parents, name)) => (Some(parents), name),
            None => (None, path),
        };

        let mut properties = &mut module.properties;
        for segment in parents.into_iter().flat_map(|parents| parents.split('.')) {
            let index = match properties.iter().position(|p| p.name == segment) {
                Some(index) => index,
                None => {
                    properties.push(Property::new(segment, Value::Map(vec![]), line));
                    properties.len() - 1
                }
            };
            properties = match &mut properties[index].value {
                Value::Map(map) => map,
                _ => return Err(TranslateError::NotAMap(segment.to_string())),
            };
        }

        match properties.iter_mut().find(|p| p.name == name) {
            Some(existing) if append => {
                existing.value = add_values(existing.value.clone(), value)
                    .map_err(|err| TranslateError::UnsupportedAddition(Box::new(err)))?;
            }
            Some(existing) => existing.value = value,
            None => properties.push(Property::new(name, value, line)),
        }
        Ok(())
    }

    fn set_global(&mut self, name: &str, value: Value, append: bool) -> Result<(), TranslateError> {
        let assigner = match self.global_assignments.get(name) {
            Some(&kind) if append => {
                let old = Value::Variable {
                    name: name.to_string(),
                    kind,
                };
                let sum = add_values(old, value.clone())
                    .map_err(|err| TranslateError::UnsupportedAddition(Box::new(err)))?;
                self.global_assignments.insert(name.to_string(), sum.kind());
                Assigner::PlusEquals
            }
            _ => {
                self.global_assignments
                    .insert(name.to_string(), value.kind());
                Assigner::Equals
            }
        };

        self.file.defs.push(Definition::Assignment(bp::Assignment {
            name: name.to_string(),
            value,
            assigner,
            line: self.line,
        }));
        Ok(())
    }

    fn handle_directive(&mut self, statement: &Statement, directive: &Directive) {
        match directive.name.as_str() {
            "include" | "-include" | "sinclude" => self.handle_include(statement, &directive.args),
            name @ ("ifeq" | "ifneq" | "ifdef" | "ifndef") => {
                let eq = matches!(name, "ifeq" | "ifdef");
                let args = directive.args.dump();
                match CONDITIONAL_TRANSLATIONS.get(args.as_str()) {
                    Some(translation) => {
                        self.conds.push(Some(Conditional { translation, eq }));
                        if self.module.is_some() {
                            if self.assignment_cond.is_some() {
                                self.errorf(
                                    &self.quote(statement),
                                    "unsupported nested conditional in module",
                                );
                            } else {
                                self.assignment_cond = Some(self.conds.len() - 1);
                            }
                        }
                    }
                    None => {
                        self.errorf(&self.quote(statement), "unsupported conditional");
                        self.conds.push(None);
                    }
                }
            }
            "else" => match self.conds.last_mut() {
                Some(Some(cond)) => cond.eq = !cond.eq,
                // already reported at the if
                Some(None) => {}
                None => self.errorf(&self.quote(statement), "missing if before else"),
            },
            "endif" => match self.conds.pop() {
                Some(Some(_)) => {
                    if self.assignment_cond == Some(self.conds.len()) {
                        self.assignment_cond = None;
                    }
                }
                Some(None) => {}
                None => self.errorf(&self.quote(statement), "missing if before endif"),
            },
            _ => self.errorf(&self.quote(statement), "unsupported directive"),
        }
    }

    fn handle_include(&mut self, statement: &Statement, args: &MakeString) {
        let target = args.value(&self.scope);
        let target = target.trim();

        if target == CLEAR_VARS {
            self.reset_module(statement);
        } else if tables::is_module_type(target) {
            self.handle_module(statement, target);
        } else {
            self.errorf(&self.quote(statement), "unsupported include");
        }
    }

    fn reset_module(&mut self, statement: &Statement) {
        self.report_unclosed_module();
        log::debug!("opening module at line {}", statement.start_line);
        self.module = Some(OpenModule {
            properties: Vec::new(),
            line: self.line,
            opened_by: self.quote(statement),
        });
    }

    fn report_unclosed_module(&mut self) {
        let Some(module) = self.module.take() else {
            return;
        };
        if self.config.report_unclosed_module {
            self.errorf(
                &module.opened_by,
                "module opened with CLEAR_VARS was never closed",
            );
        } else {
            log::debug!("dropping unclosed module from line {}", module.line);
        }
    }

    fn handle_module(&mut self, statement: &Statement, typ: &str) {
        if self.module.is_none() {
            return self.errorf(
                &self.quote(statement),
                "module type include without a preceding CLEAR_VARS",
            );
        }

        self.handle_module_conditionals(statement);

        let Some(module) = self.module.take() else {
            return;
        };
        log::debug!(
            "closing {typ} module with {} properties",
            module.properties.len()
        );
        self.file.defs.push(Definition::Module(Module {
            typ: typ.to_string(),
            properties: module.properties,
            line: module.line,
            end_line: self.line,
        }));
    }

    /// A module closed under a conditional only exists in the branch being
    /// read, so it is disabled for the other one.
    fn handle_module_conditionals(&mut self, statement: &Statement) {
        let disabled: Vec<&'static str> = self
            .conds
            .iter()
            .flatten()
            .filter_map(Conditional::untaken_prefix)
            .collect();

        for prefix in disabled {
            if let Err(err) = self.set_variable(Some(prefix), "enabled", Value::Bool(false), false, true)
            {
                self.errorf(&self.quote(statement), err);
            }
        }
    }

    pub fn finish(mut self) -> bp::File {
        if self.module.is_some() {
            self.line += 1;
            self.report_unclosed_module();
        }
        if !self.conds.is_empty() {
            log::warn!("{} conditionals still open at end of input", self.conds.len());
        }
        self.file
    }
}

/// Translates statements parsed from `source` with the default [`Config`].
pub fn translate(source: &str, statements: &[Statement]) -> bp::File {
    translate_with(source, statements, &Config::default())
}

pub fn translate_with(source: &str, statements: &[Statement], config: &Config) -> bp::File {
    let mut file = BpFile::new(source, config);
    for statement in statements {
        file.handle_statement(statement);
    }
    file.finish()
}
