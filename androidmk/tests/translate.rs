// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use androidmk::bp::{File, Module, Value};
use androidmk::config::Config;
use androidmk::convert;
use androidmk::error_code::ErrorCode;
use androidmk::parser::Makefile;
use androidmk::translate::{translate, translate_with, ERROR_MARKER};
use similar_asserts::assert_eq;
use test_log::test;

fn translate_str(input: &str) -> File {
    let makefile: Makefile = match input.parse() {
        Ok(makefile) => makefile,
        Err(errors) => panic!("unexpected parse errors:\n{errors}"),
    };
    translate(input, makefile.statements())
}

fn convert_str(input: &str) -> String {
    match convert(input, &Config::default()) {
        Ok(conversion) => {
            assert!(conversion.errors.0.is_empty(), "{}", conversion.errors);
            conversion.output
        }
        Err(err) => panic!("conversion failed: {err}"),
    }
}

/// Messages of the diagnostic comments, in output order.
fn diagnostics(file: &File) -> Vec<String> {
    let mut comments: Vec<_> = file.comments.iter().collect();
    comments.sort_by_key(|comment| comment.line);
    comments
        .iter()
        .filter_map(|comment| comment.lines.first())
        .filter_map(|line| line.strip_prefix(ERROR_MARKER))
        .map(str::to_string)
        .collect()
}

fn only_module(file: &File) -> &Module {
    let modules: Vec<_> = file.modules().collect();
    assert_eq!(modules.len(), 1, "expected exactly one module");
    modules[0]
}

fn strings(values: &[&str]) -> Value {
    Value::List(values.iter().map(|s| Value::string(*s)).collect())
}

fn property_names(module: &Module) -> Vec<&str> {
    module.properties.iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn test_simple_executable() {
    let output = convert_str(
        "LOCAL_PATH := $(call my-dir)
include $(CLEAR_VARS)
LOCAL_MODULE := foo
LOCAL_SRC_FILES := a.c b.c
include $(BUILD_EXECUTABLE)
",
    );
    assert_eq!(
        output,
        "cc_binary {
    name: \"foo\",
    srcs: [
        \"a.c\",
        \"b.c\",
    ],
}
"
    );
}

#[test]
fn test_append_to_unset_property() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_SHARED_LIBRARIES += libc
include $(BUILD_SHARED_LIBRARY)
",
    );
    let module = only_module(&file);
    assert_eq!(module.typ, "cc_library_shared");
    assert_eq!(module.property("shared_libs"), Some(&strings(&["libc"])));
    assert!(diagnostics(&file).is_empty());
}

#[test]
fn test_include_dirs_split() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_C_INCLUDES := $(LOCAL_PATH)/include /usr/include
include $(BUILD_STATIC_LIBRARY)
",
    );
    let module = only_module(&file);
    assert_eq!(module.property("local_include_dirs"), Some(&strings(&["include"])));
    assert_eq!(module.property("include_dirs"), Some(&strings(&["/usr/include"])));
}

#[test]
fn test_export_include_dirs() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_EXPORT_C_INCLUDE_DIRS := external/foo $(LOCAL_PATH)/include $(LOCAL_PATH)
include $(BUILD_STATIC_LIBRARY)
",
    );
    let module = only_module(&file);
    assert_eq!(
        module.property("export_include_dirs"),
        Some(&strings(&["include", ".", "external/foo"]))
    );
}

#[test]
fn test_unknown_conditional() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_MODULE := foo
ifeq ($(TARGET_ARCH),arm)
LOCAL_CFLAGS := -DARM
endif
include $(BUILD_SHARED_LIBRARY)
",
    );
    assert_eq!(diagnostics(&file), vec!["unsupported conditional"]);
    let module = only_module(&file);
    assert_eq!(property_names(module), vec!["name", "cflags"]);
    assert_eq!(module.property("cflags"), Some(&strings(&["-DARM"])));
}

#[test]
fn test_module_keeps_property_order() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_SRC_FILES := a.c
LOCAL_MODULE := foo
LOCAL_CFLAGS := -Wall
LOCAL_CLANG := true
LOCAL_MODULE_TAGS := optional
include $(BUILD_EXECUTABLE)
",
    );
    let module = only_module(&file);
    assert_eq!(module.typ, "cc_binary");
    assert_eq!(
        property_names(module),
        vec!["srcs", "name", "cflags", "clang", "tags"]
    );
    assert_eq!(module.property("clang"), Some(&Value::Bool(true)));
}

#[test]
fn test_multiple_modules() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_MODULE := libfoo
include $(BUILD_STATIC_LIBRARY)

include $(CLEAR_VARS)
LOCAL_PACKAGE_NAME := FooApp
LOCAL_SRC_FILES := $(call all-java-files-under, src)
include $(BUILD_PACKAGE)
",
    );
    let modules: Vec<_> = file.modules().collect();
    assert_eq!(modules.len(), 2);
    assert_eq!(modules[0].typ, "cc_library_static");
    assert_eq!(modules[1].typ, "android_app");
    assert_eq!(modules[1].property("name"), Some(&Value::string("FooApp")));
    assert_eq!(
        modules[1].property("srcs"),
        Some(&strings(&["src/**/*.java"]))
    );
}

#[test]
fn test_unclosed_module() {
    let input = "include $(CLEAR_VARS)
LOCAL_MODULE := foo
";
    let file = translate_str(input);
    assert_eq!(file.modules().count(), 0);
    assert_eq!(
        diagnostics(&file),
        vec!["module opened with CLEAR_VARS was never closed"]
    );

    let makefile: Makefile = input.parse().unwrap();
    let config = Config {
        report_unclosed_module: false,
    };
    let file = translate_with(input, makefile.statements(), &config);
    assert_eq!(file.modules().count(), 0);
    assert!(diagnostics(&file).is_empty());
}

#[test]
fn test_reopened_module() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_MODULE := lost
include $(CLEAR_VARS)
LOCAL_MODULE := kept
include $(BUILD_EXECUTABLE)
",
    );
    let module = only_module(&file);
    assert_eq!(module.property("name"), Some(&Value::string("kept")));
    assert_eq!(
        diagnostics(&file),
        vec!["module opened with CLEAR_VARS was never closed"]
    );
}

#[test]
fn test_build_without_clear_vars() {
    let file = translate_str("include $(BUILD_EXECUTABLE)\n");
    assert_eq!(file.modules().count(), 0);
    assert_eq!(
        diagnostics(&file),
        vec!["module type include without a preceding CLEAR_VARS"]
    );
}

#[test]
fn test_module_inside_conditional_is_disabled_elsewhere() {
    let file = translate_str(
        "ifeq ($(HOST_OS),linux)
include $(CLEAR_VARS)
LOCAL_MODULE := linux_only
include $(BUILD_HOST_EXECUTABLE)
endif
",
    );
    let module = only_module(&file);
    assert_eq!(module.typ, "cc_binary_host");
    assert_eq!(module.property("name"), Some(&Value::string("linux_only")));
    assert_eq!(
        module.property("target.not_linux.enabled"),
        Some(&Value::Bool(false))
    );
    assert!(module.property("target.linux").is_none());
    assert!(diagnostics(&file).is_empty());
}

#[test]
fn test_module_in_else_branch() {
    let file = translate_str(
        "ifneq ($(HOST_OS),darwin)
else
include $(CLEAR_VARS)
LOCAL_MODULE := mac_only
include $(BUILD_HOST_EXECUTABLE)
endif
",
    );
    let module = only_module(&file);
    // ifneq starts on the false side, else flips it back to darwin
    assert_eq!(
        module.property("target.not_darwin.enabled"),
        Some(&Value::Bool(false))
    );
}

#[test]
fn test_conditional_properties() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_MODULE := foo
ifeq ($(HOST_OS), darwin)
LOCAL_CFLAGS := -DDARWIN
LOCAL_LDLIBS := -framework CoreFoundation
else
LOCAL_CFLAGS := -DOTHER
endif
LOCAL_SRC_FILES := foo.c
include $(BUILD_HOST_SHARED_LIBRARY)
",
    );
    assert!(diagnostics(&file).is_empty());
    let module = only_module(&file);
    assert_eq!(property_names(module), vec!["name", "target", "srcs"]);
    assert_eq!(
        module.property("target.darwin.cflags"),
        Some(&strings(&["-DDARWIN"]))
    );
    assert_eq!(
        module.property("target.darwin.host_ldlibs"),
        Some(&strings(&["-framework", "CoreFoundation"]))
    );
    assert_eq!(
        module.property("target.not_darwin.cflags"),
        Some(&strings(&["-DOTHER"]))
    );
    assert!(module.property("target.darwin.enabled").is_none());
    assert!(module.property("target.not_darwin.enabled").is_none());
}

#[test]
fn test_one_sided_conditional() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_MODULE := foo
ifeq (,$(TARGET_BUILD_APPS))
LOCAL_CFLAGS := -DFULL
else
LOCAL_CFLAGS := -DUNBUNDLED
endif
include $(BUILD_SHARED_LIBRARY)
",
    );
    assert_eq!(diagnostics(&file), vec!["unsupported conditional branch"]);
    let module = only_module(&file);
    assert_eq!(
        module.property("product_variables.unbundled_build.cflags"),
        Some(&strings(&["-DUNBUNDLED"]))
    );
    assert!(module.property("cflags").is_none());
}

#[test]
fn test_suffix_wins_over_conditional() {
    let file = translate_str(
        "include $(CLEAR_VARS)
ifeq ($(HOST_OS),linux)
LOCAL_CFLAGS_x86 := -DX86
endif
include $(BUILD_HOST_STATIC_LIBRARY)
",
    );
    assert_eq!(
        diagnostics(&file),
        vec!["prefix assignment inside conditional, skipping conditional"]
    );
    let module = only_module(&file);
    assert_eq!(module.property("arch.x86.cflags"), Some(&strings(&["-DX86"])));
    assert!(module.property("target.linux").is_none());
}

#[test]
fn test_nested_conditional_in_module() {
    let file = translate_str(
        "include $(CLEAR_VARS)
ifeq ($(HOST_OS),linux)
ifeq ($(TARGET_BUILD_PDK),true)
LOCAL_CFLAGS := -DPDK
endif
endif
include $(BUILD_HOST_STATIC_LIBRARY)
",
    );
    assert_eq!(
        diagnostics(&file),
        vec!["unsupported nested conditional in module"]
    );
    let module = only_module(&file);
    assert_eq!(
        module.property("target.linux.cflags"),
        Some(&strings(&["-DPDK"]))
    );
}

#[test]
fn test_unbalanced_conditionals() {
    let file = translate_str("else\nendif\n");
    assert_eq!(
        diagnostics(&file),
        vec!["missing if before else", "missing if before endif"]
    );
}

#[test]
fn test_arch_suffixes() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_SRC_FILES_arm := arm.S
LOCAL_SRC_FILES_x86_64 := x86_64.S
LOCAL_CFLAGS_64 := -DLP64
LOCAL_ARM_MODE := arm
include $(BUILD_SHARED_LIBRARY)
",
    );
    let module = only_module(&file);
    assert_eq!(module.property("arch.arm.srcs"), Some(&strings(&["arm.S"])));
    assert_eq!(
        module.property("arch.x86_64.srcs"),
        Some(&strings(&["x86_64.S"]))
    );
    assert_eq!(
        module.property("multilib.lib64.cflags"),
        Some(&strings(&["-DLP64"]))
    );
    assert_eq!(
        module.property("arch.arm.instruction_set"),
        Some(&Value::string("arm"))
    );
    assert_eq!(property_names(module), vec!["arch", "multilib"]);
}

#[test]
fn test_append_law() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_CFLAGS := -Wall
LOCAL_CFLAGS += -Werror -O2
LOCAL_MODULE := foo
LOCAL_MODULE += _bar
LOCAL_CLANG := true
LOCAL_CLANG += false
include $(BUILD_EXECUTABLE)
",
    );
    let module = only_module(&file);
    assert_eq!(
        module.property("cflags"),
        Some(&strings(&["-Wall", "-Werror", "-O2"]))
    );
    assert_eq!(module.property("name"), Some(&Value::string("foo_bar")));
    // the failed addition leaves the old value alone
    assert_eq!(module.property("clang").and_then(Value::as_bool), Some(true));
    assert_eq!(
        diagnostics(&file),
        vec!["unsupported addition: cannot add bool values"]
    );
}

#[test]
fn test_plain_assignment_replaces() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_CFLAGS := -Wall
LOCAL_CFLAGS := -O2
include $(BUILD_EXECUTABLE)
",
    );
    let module = only_module(&file);
    assert_eq!(module.properties.len(), 1);
    assert_eq!(module.property("cflags"), Some(&strings(&["-O2"])));
}

#[test]
fn test_rewriters() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_MODULE := foo
LOCAL_MODULE_STEM := $(LOCAL_MODULE)_test
LOCAL_MODULE_HOST_OS := windows linux
LOCAL_CPP_EXTENSION := .cc
include $(BUILD_HOST_EXECUTABLE)

include $(CLEAR_VARS)
LOCAL_MODULE_STEM := bar
include $(BUILD_HOST_EXECUTABLE)
",
    );
    assert!(diagnostics(&file).is_empty());
    let modules: Vec<_> = file.modules().collect();
    assert_eq!(modules[0].property("suffix"), Some(&Value::string("_test")));
    assert_eq!(
        modules[0].property("target.windows.enabled"),
        Some(&Value::Bool(true))
    );
    assert_eq!(
        modules[0].property("target.darwin.enabled"),
        Some(&Value::Bool(false))
    );
    assert!(modules[0].property("target.linux").is_none());
    assert_eq!(modules[1].property("stem"), Some(&Value::string("bar")));
}

#[test]
fn test_unsupported_statements() {
    let file = translate_str(
        "LOCAL_MODULE := early
include $(CLEAR_VARS)
LOCAL_UNKNOWN_THING := 1
$(my_var) := 2
foo: LOCAL_CFLAGS := 3
include $(LOCAL_PATH)/other.mk
define nothing
endef
gen.h: gen.py
\tpython gen.py
$(call inherit-product, foo.mk)
include $(BUILD_EXECUTABLE)
",
    );
    assert_eq!(
        diagnostics(&file),
        vec![
            "assignment to name outside of a module",
            "unsupported assignment to LOCAL_UNKNOWN_THING",
            "unsupported non-const variable name",
            "unsupported target assignment",
            "unsupported include",
            "unsupported directive",
            "unsupported line",
            "unsupported line",
        ]
    );
    let module = only_module(&file);
    assert!(module.properties.is_empty());
}

#[test]
fn test_global_variables() {
    let output = convert_str(
        "common_cflags := -Wall -Werror
common_cflags += -O2

include $(CLEAR_VARS)
LOCAL_MODULE := foo
LOCAL_CFLAGS := $(common_cflags) -DFOO
include $(BUILD_SHARED_LIBRARY)
",
    );
    assert_eq!(
        output,
        "common_cflags = [
    \"-Wall\",
    \"-Werror\",
]
common_cflags += [\"-O2\"]

cc_library_shared {
    name: \"foo\",
    cflags: common_cflags + [\"-DFOO\"],
}
"
    );
}

#[test]
fn test_comments_are_kept() {
    let output = convert_str(
        "# libfoo
include $(CLEAR_VARS)
LOCAL_MODULE := libfoo
# sources
LOCAL_SRC_FILES := foo.c
include $(BUILD_STATIC_LIBRARY)
",
    );
    assert_eq!(
        output,
        "// libfoo
cc_library_static {
    name: \"libfoo\",
    // sources
    srcs: [\"foo.c\"],
}
"
    );
}

#[test]
fn test_diagnostic_text() {
    let output = convert_str(
        "include $(CLEAR_VARS)
LOCAL_MODULE := foo
LOCAL_FOO := bar
include $(BUILD_EXECUTABLE)

$(OUT)/gen.h: gen.py
\tpython gen.py > $@
",
    );
    assert_eq!(
        output,
        "cc_binary {
    name: \"foo\",
    // ANDROIDMK TRANSLATION ERROR: unsupported assignment to LOCAL_FOO
    // LOCAL_FOO := bar
}

// ANDROIDMK TRANSLATION ERROR: unsupported line
// $(OUT)/gen.h: gen.py
// \tpython gen.py > $@
"
    );
}

#[test]
fn test_module_closed_inside_conditional_branch() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_MODULE := foo
ifeq ($(HOST_OS),darwin)
LOCAL_CFLAGS := -DDARWIN
LOCAL_SRC_FILES := mac.c
else
LOCAL_CFLAGS := -DOTHER
include $(BUILD_HOST_EXECUTABLE)
endif
",
    );
    assert!(diagnostics(&file).is_empty());
    let module = only_module(&file);
    assert_eq!(
        module.property("target.darwin.cflags"),
        Some(&strings(&["-DDARWIN"]))
    );
    assert_eq!(
        module.property("target.darwin.srcs"),
        Some(&strings(&["mac.c"]))
    );
    assert_eq!(
        module.property("target.not_darwin.cflags"),
        Some(&strings(&["-DOTHER"]))
    );
    // built on the not_darwin side only
    assert_eq!(
        module
            .property("target.darwin.enabled")
            .and_then(Value::as_bool),
        Some(false)
    );
    assert!(module.property("target.not_darwin.enabled").is_none());
}

#[test]
fn test_global_assigned_inside_module_comes_first() {
    let output = convert_str(
        "include $(CLEAR_VARS)
my_flags := -O2
LOCAL_MODULE := x
LOCAL_CFLAGS := $(my_flags)
include $(BUILD_EXECUTABLE)
",
    );
    assert_eq!(
        output,
        "my_flags = [\"-O2\"]

cc_binary {
    name: \"x\",
    cflags: my_flags,
}
"
    );
}

#[test]
fn test_diagnostics_quote_source_verbatim() {
    let file = translate_str(
        "include $(CLEAR_VARS)
LOCAL_BOGUS:=1
LOCAL_OTHER := a \\
\tb
include $(BUILD_EXECUTABLE)
foo:: bar
",
    );
    let mut comments: Vec<_> = file.comments.iter().collect();
    comments.sort_by_key(|comment| comment.line);
    let texts: Vec<String> = comments.iter().map(|comment| comment.text()).collect();
    assert_eq!(
        texts,
        vec![
            format!("{ERROR_MARKER}unsupported assignment to LOCAL_BOGUS\n// LOCAL_BOGUS:=1"),
            format!(
                "{ERROR_MARKER}unsupported assignment to LOCAL_OTHER\n// LOCAL_OTHER := a \\\n// \tb"
            ),
            format!("{ERROR_MARKER}unsupported line\n// foo:: bar"),
        ]
    );
}

#[test]
fn test_parse_errors_are_skipped() {
    let conversion = convert(
        "include $(CLEAR_VARS)
LOCAL_MODULE := foo
bogus line
LOCAL_SRC_FILES := a.c
include $(BUILD_EXECUTABLE)
",
        &Config::default(),
    )
    .unwrap();
    assert_eq!(conversion.errors.0.len(), 1);
    assert_eq!(conversion.errors.0[0].line, 3);
    assert_eq!(
        conversion.output,
        "cc_binary {
    name: \"foo\",
    srcs: [\"a.c\"],
}
"
    );
}

#[test]
fn test_too_many_parse_errors() {
    let input = "?\n".repeat(150);
    match convert(&input, &Config::default()) {
        Err(ErrorCode::ParserError { constraint }) => assert_eq!(constraint.0.len(), 100),
        other => panic!("expected the parser to give up, got {other:?}"),
    }
}
