//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

/// Represents the configuration of a translation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Whether a module that is opened with `CLEAR_VARS` and never built
    /// gets a diagnostic comment, instead of being dropped silently
    pub report_unclosed_module: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            report_unclosed_module: true,
        }
    }
}
