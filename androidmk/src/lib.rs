//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! Converts `Android.mk` makefiles into `Android.bp` blueprint files.
//!
//! The makefile is parsed into statements ([`parser`]), translated into a
//! blueprint syntax tree ([`translate`], [`bp`]) and printed. Translation is
//! best effort: whatever can't be converted is kept in the output as a
//! comment.

pub mod bp;
pub mod config;
pub mod error_code;
pub mod parser;
pub mod translate;

use config::Config;
use error_code::ErrorCode;
use parser::{Parse, ParseErrors};

/// A finished conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Blueprint text.
    pub output: String,
    /// Parse errors that were recovered from. The statements around them
    /// are still in the output.
    pub errors: ParseErrors,
}

/// Converts makefile text into blueprint text.
///
/// Malformed lines are skipped and listed in [`Conversion::errors`]. The
/// conversion only fails once the parser gives up after
/// [`parser::parse::MAX_ERRORS`] errors.
pub fn convert(source: &str, config: &Config) -> Result<Conversion, ErrorCode> {
    let Parse { statements, errors } = parser::parse(source);
    if errors.len() >= parser::parse::MAX_ERRORS {
        return Err(ParseErrors(errors).into());
    }

    let file = translate::translate_with(source, &statements, config);
    Ok(Conversion {
        output: bp::print(&file),
        errors: ParseErrors(errors),
    })
}
