//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::collections::HashMap;
use std::sync::LazyLock;

use super::make_string::BUILTIN_DOLLAR;

/// A built-in function: receives the evaluated arguments, returns the
/// expansion.
pub type Function = fn(&[String]) -> String;

/// Names of the functions make knows about. Must stay sorted, it is
/// searched with a binary search.
pub const FUNCTION_NAMES: [&str; 35] = [
    "abspath",
    "addprefix",
    "addsuffix",
    "and",
    "basename",
    "call",
    "dir",
    "error",
    "eval",
    "filter",
    "filter-out",
    "findstring",
    "firstword",
    "flavor",
    "foreach",
    "if",
    "info",
    "join",
    "lastword",
    "notdir",
    "or",
    "origin",
    "patsubst",
    "realpath",
    "shell",
    "sort",
    "strip",
    "subst",
    "suffix",
    "value",
    "warning",
    "wildcard",
    "word",
    "wordlist",
    "words",
];

/// Variables every scope chain falls back to.
static BUILTIN_VARIABLES: LazyLock<HashMap<&'static str, &'static str>> =
    LazyLock::new(|| HashMap::from_iter([(BUILTIN_DOLLAR, "$")]));

pub fn is_function_name(name: &str) -> bool {
    FUNCTION_NAMES.binary_search(&name).is_ok()
}

/// A symbol table for partial evaluation.
///
/// Lookups that miss fall through to the parent scope, then to the built-in
/// variables. Nothing here ever fails: unknown names evaluate to a visible
/// placeholder so they stand out in the output.
#[derive(Debug, Default, Clone)]
pub struct Scope<'p> {
    variables: HashMap<String, String>,
    functions: HashMap<String, Function>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: &'p Scope<'p>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn get(&self, name: &str) -> String {
        if let Some(value) = self.variables.get(name) {
            value.clone()
        } else if let Some(parent) = self.parent {
            parent.get(name)
        } else if let Some(value) = BUILTIN_VARIABLES.get(name) {
            value.to_string()
        } else {
            format!("<'{name}' unset>")
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn set_func(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), function);
    }

    fn function(&self, name: &str) -> Option<Function> {
        self.functions
            .get(name)
            .copied()
            .or_else(|| self.parent.and_then(|parent| parent.function(name)))
    }

    pub fn call(&self, name: &str, args: &[String]) -> String {
        match self.function(name) {
            Some(function) => function(args),
            None => format!("<func:'{name}' unset>"),
        }
    }

    /// Evaluates one of the make functions in [`FUNCTION_NAMES`].
    ///
    /// `call` dispatches to the function named by its first argument. Other
    /// functions only evaluate if a function of the same name is registered;
    /// the rest expand to a `__builtin_func:` marker.
    pub fn call_builtin(&self, name: &str, args: &[String]) -> String {
        if name == "call" {
            return match args.split_first() {
                Some((function, args)) => self.call(function.trim(), args),
                None => self.call("", args),
            };
        }

        match self.function(name) {
            Some(function) => function(args),
            None => format!("__builtin_func:{name} {}", args.join(" ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_names_sorted() {
        let mut sorted = FUNCTION_NAMES;
        sorted.sort();
        assert_eq!(sorted, FUNCTION_NAMES);
        assert!(is_function_name("call"));
        assert!(is_function_name("filter-out"));
        assert!(!is_function_name("my-dir"));
    }

    #[test]
    fn test_chained_lookup() {
        let mut parent = Scope::new();
        parent.set("A", "parent");
        parent.set("B", "parent");
        let mut child = Scope::with_parent(&parent);
        child.set("B", "child");

        assert_eq!(child.get("A"), "parent");
        assert_eq!(child.get("B"), "child");
        assert_eq!(child.get(BUILTIN_DOLLAR), "$");
        assert_eq!(child.get("MISSING"), "<'MISSING' unset>");
    }

    #[test]
    fn test_call() {
        let mut scope = Scope::new();
        scope.set_func("twice", |args| format!("{0}{0}", args.join("")));
        let child = Scope::with_parent(&scope);

        assert_eq!(child.call("twice", &["ab".to_string()]), "abab");
        assert_eq!(child.call("nope", &[]), "<func:'nope' unset>");
        assert_eq!(
            child.call_builtin("call", &[" twice".to_string(), "x".to_string()]),
            "xx"
        );
        assert_eq!(
            child.call_builtin("wildcard", &["*.c".to_string()]),
            "__builtin_func:wildcard *.c"
        );
    }
}
