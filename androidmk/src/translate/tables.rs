//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Fixed mapping tables from make variables to blueprint properties.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::parser::Scope;

/// Value `$(CLEAR_VARS)` evaluates to.
pub const CLEAR_VARS: &str = "__android_mk_clear_vars";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    String,
    List,
    Bool,
}

/// Variables that need more than a rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rewrite {
    /// `LOCAL_C_INCLUDES`
    LocalIncludeDirs,
    /// `LOCAL_EXPORT_C_INCLUDE_DIRS`
    ExportIncludeDirs,
    /// `LOCAL_MODULE_STEM`
    Stem,
    /// `LOCAL_MODULE_HOST_OS`
    HostOs,
}

pub static STANDARD_PROPERTIES: LazyLock<HashMap<&'static str, (&'static str, PropertyKind)>> =
    LazyLock::new(|| {
        use PropertyKind::*;

        HashMap::from_iter([
            // String properties
            ("LOCAL_MODULE", ("name", String)),
            ("LOCAL_MODULE_CLASS", ("class", String)),
            ("LOCAL_CXX_STL", ("stl", String)),
            ("LOCAL_STRIP_MODULE", ("strip", String)),
            ("LOCAL_MULTILIB", ("compile_multilib", String)),
            ("LOCAL_ARM_MODE_HACK", ("instruction_set", String)),
            ("LOCAL_SDK_VERSION", ("sdk_version", String)),
            ("LOCAL_NDK_STL_VARIANT", ("stl", String)),
            ("LOCAL_JAR_MANIFEST", ("manifest", String)),
            ("LOCAL_JARJAR_RULES", ("jarjar_rules", String)),
            ("LOCAL_CERTIFICATE", ("certificate", String)),
            ("LOCAL_PACKAGE_NAME", ("name", String)),
            ("LOCAL_MODULE_RELATIVE_PATH", ("relative_install_path", String)),
            // List properties
            ("LOCAL_SRC_FILES", ("srcs", List)),
            ("LOCAL_SRC_FILES_EXCLUDE", ("exclude_srcs", List)),
            ("LOCAL_SHARED_LIBRARIES", ("shared_libs", List)),
            ("LOCAL_STATIC_LIBRARIES", ("static_libs", List)),
            ("LOCAL_WHOLE_STATIC_LIBRARIES", ("whole_static_libs", List)),
            ("LOCAL_SYSTEM_SHARED_LIBRARIES", ("system_shared_libs", List)),
            ("LOCAL_ASFLAGS", ("asflags", List)),
            ("LOCAL_CLANG_ASFLAGS", ("clang_asflags", List)),
            ("LOCAL_CFLAGS", ("cflags", List)),
            ("LOCAL_CONLYFLAGS", ("conlyflags", List)),
            ("LOCAL_CPPFLAGS", ("cppflags", List)),
            ("LOCAL_LDFLAGS", ("ldflags", List)),
            ("LOCAL_REQUIRED_MODULES", ("required", List)),
            ("LOCAL_MODULE_TAGS", ("tags", List)),
            ("LOCAL_LDLIBS", ("host_ldlibs", List)),
            ("LOCAL_CLANG_CFLAGS", ("clang_cflags", List)),
            ("LOCAL_YACCFLAGS", ("yaccflags", List)),
            ("LOCAL_SANITIZE", ("sanitize", List)),
            ("LOCAL_SANITIZE_RECOVER", ("sanitize_recover", List)),
            ("LOCAL_LOGTAGS_FILES", ("logtags", List)),
            ("LOCAL_EXPORT_SHARED_LIBRARY_HEADERS", ("export_shared_lib_headers", List)),
            ("LOCAL_EXPORT_STATIC_LIBRARY_HEADERS", ("export_static_lib_headers", List)),
            ("LOCAL_INIT_RC", ("init_rc", List)),
            ("LOCAL_TIDY_FLAGS", ("tidy_flags", List)),
            ("LOCAL_TIDY_CHECKS", ("tidy_checks", List)),
            ("LOCAL_JAVA_RESOURCE_DIRS", ("java_resource_dirs", List)),
            ("LOCAL_JAVACFLAGS", ("javacflags", List)),
            ("LOCAL_DX_FLAGS", ("dxflags", List)),
            ("LOCAL_JAVA_LIBRARIES", ("java_libs", List)),
            ("LOCAL_STATIC_JAVA_LIBRARIES", ("java_static_libs", List)),
            ("LOCAL_AIDL_INCLUDES", ("aidl_includes", List)),
            ("LOCAL_AAPT_FLAGS", ("aaptflags", List)),
            ("LOCAL_PACKAGE_SPLITS", ("package_splits", List)),
            // Bool properties
            ("LOCAL_IS_HOST_MODULE", ("host", Bool)),
            ("LOCAL_CLANG", ("clang", Bool)),
            ("LOCAL_FORCE_STATIC_EXECUTABLE", ("static", Bool)),
            ("LOCAL_NATIVE_COVERAGE", ("native_coverage", Bool)),
            ("LOCAL_NO_CRT", ("nocrt", Bool)),
            ("LOCAL_ALLOW_UNDEFINED_SYMBOLS", ("allow_undefined_symbols", Bool)),
            ("LOCAL_RTTI_FLAG", ("rtti", Bool)),
            ("LOCAL_NO_STANDARD_LIBRARIES", ("no_standard_libraries", Bool)),
            ("LOCAL_EXPORT_PACKAGE_RESOURCES", ("export_package_resources", Bool)),
        ])
    });

pub static REWRITE_PROPERTIES: LazyLock<HashMap<&'static str, Rewrite>> = LazyLock::new(|| {
    HashMap::from_iter([
        ("LOCAL_C_INCLUDES", Rewrite::LocalIncludeDirs),
        ("LOCAL_EXPORT_C_INCLUDE_DIRS", Rewrite::ExportIncludeDirs),
        ("LOCAL_MODULE_STEM", Rewrite::Stem),
        ("LOCAL_MODULE_HOST_OS", Rewrite::HostOs),
    ])
});

/// Variables with no blueprint equivalent, dropped without a diagnostic.
pub const DELETE_PROPERTIES: [&str; 1] = ["LOCAL_CPP_EXTENSION"];

/// Variables that only matter to make itself.
pub const IGNORED_VARIABLES: [&str; 2] = ["LOCAL_PATH", "LOCAL_ADDITIONAL_DEPENDENCIES"];

/// Variable name suffixes and the property prefix they select. Longest
/// first, `_x86_64` must win over `_64`.
pub const PROPERTY_SUFFIXES: [(&str, &str); 8] = [
    ("x86_64", "arch.x86_64"),
    ("mips64", "arch.mips64"),
    ("arm64", "arch.arm64"),
    ("mips", "arch.mips"),
    ("x86", "arch.x86"),
    ("arm", "arch.arm"),
    ("32", "multilib.lib32"),
    ("64", "multilib.lib64"),
];

/// Splits an architecture or bitness suffix off a variable name.
///
/// `LOCAL_CFLAGS_arm64` becomes `("LOCAL_CFLAGS", Some("arch.arm64"))`.
pub fn split_suffix(name: &str) -> (&str, Option<&'static str>) {
    for (suffix, prefix) in PROPERTY_SUFFIXES {
        if let Some(base) = name
            .strip_suffix(suffix)
            .and_then(|rest| rest.strip_suffix('_'))
        {
            return (base, Some(prefix));
        }
    }
    (name, None)
}

/// Property prefixes for the two branches of a conditional. A branch
/// without one can't be expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalTranslation {
    pub true_prefix: Option<&'static str>,
    pub false_prefix: Option<&'static str>,
}

/// Keyed by the `ifeq` argument text as written, e.g. `($(HOST_OS),darwin)`.
/// Every key is also present with a space after the comma.
pub static CONDITIONAL_TRANSLATIONS: LazyLock<HashMap<String, ConditionalTranslation>> =
    LazyLock::new(|| {
        let both = |t, f| ConditionalTranslation {
            true_prefix: Some(t),
            false_prefix: Some(f),
        };
        let entries = [
            ("($(HOST_OS),darwin)", both("target.darwin", "target.not_darwin")),
            ("($(HOST_OS),windows)", both("target.windows", "target.not_windows")),
            ("($(HOST_OS),linux)", both("target.linux", "target.not_linux")),
            ("($(BUILD_OS),darwin)", both("target.darwin", "target.not_darwin")),
            ("($(BUILD_OS),linux)", both("target.linux", "target.not_linux")),
            (
                "(,$(TARGET_BUILD_APPS))",
                ConditionalTranslation {
                    true_prefix: None,
                    false_prefix: Some("product_variables.unbundled_build"),
                },
            ),
            (
                "($(TARGET_BUILD_PDK),true)",
                ConditionalTranslation {
                    true_prefix: Some("product_variables.pdk"),
                    false_prefix: None,
                },
            ),
        ];

        let mut translations = HashMap::new();
        for (args, translation) in entries {
            translations.insert(args.replacen(',', ", ", 1), translation);
            translations.insert(args.to_string(), translation);
        }
        translations
    });

pub static MODULE_TYPES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from_iter([
        ("BUILD_SHARED_LIBRARY", "cc_library_shared"),
        ("BUILD_STATIC_LIBRARY", "cc_library_static"),
        ("BUILD_HOST_SHARED_LIBRARY", "cc_library_host_shared"),
        ("BUILD_HOST_STATIC_LIBRARY", "cc_library_host_static"),
        ("BUILD_EXECUTABLE", "cc_binary"),
        ("BUILD_HOST_EXECUTABLE", "cc_binary_host"),
        ("BUILD_NATIVE_TEST", "cc_test"),
        ("BUILD_HOST_NATIVE_TEST", "cc_test_host"),
        ("BUILD_NATIVE_BENCHMARK", "cc_benchmark"),
        ("BUILD_HOST_NATIVE_BENCHMARK", "cc_benchmark_host"),
        ("BUILD_JAVA_LIBRARY", "java_library"),
        ("BUILD_STATIC_JAVA_LIBRARY", "java_library_static"),
        ("BUILD_HOST_JAVA_LIBRARY", "java_library_host"),
        ("BUILD_HOST_DALVIK_JAVA_LIBRARY", "java_library_host_dalvik"),
        ("BUILD_PACKAGE", "android_app"),
        ("BUILD_PREBUILT", "prebuilt"),
    ])
});

/// True if `name` is what one of the `BUILD_*` variables evaluates to.
pub fn is_module_type(name: &str) -> bool {
    MODULE_TYPES.values().any(|typ| *typ == name)
}

/// The root scope every translation evaluates in.
pub static ANDROID_SCOPE: LazyLock<Scope<'static>> = LazyLock::new(|| {
    let mut scope = Scope::new();
    scope.set("CLEAR_VARS", CLEAR_VARS);
    for (variable, typ) in MODULE_TYPES.iter() {
        scope.set(*variable, *typ);
    }

    scope.set_func("my-dir", |_| ".".to_string());
    scope.set_func("all-java-files-under", |args| {
        let dir = args.first().map_or("", |dir| dir.trim());
        format!("{dir}/**/*.java")
    });
    scope.set_func("all-subdir-java-files", |_| "**/*.java".to_string());
    scope
});
