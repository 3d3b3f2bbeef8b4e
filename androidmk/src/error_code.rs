//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use core::fmt;
use std::io;

use crate::parser::ParseErrors;

/// Represents the error codes that can be returned by androidmk
///
/// Problems with single statements never end up here; they are written
/// into the output as comments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ParserError { constraint: ParseErrors },
    IoError(io::ErrorKind),
}

impl From<ErrorCode> for i32 {
    fn from(err: ErrorCode) -> i32 {
        (&err).into()
    }
}

impl From<&ErrorCode> for i32 {
    fn from(err: &ErrorCode) -> i32 {
        use ErrorCode::*;

        match err {
            ParserError { .. } => 1,
            IoError(_) => 2,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use ErrorCode::*;

        match self {
            ParserError { constraint } => write!(f, "parse error: {}", constraint),
            IoError(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ErrorCode {}

impl From<io::Error> for ErrorCode {
    fn from(err: io::Error) -> Self {
        Self::IoError(err.kind())
    }
}

impl From<ParseErrors> for ErrorCode {
    fn from(constraint: ParseErrors) -> Self {
        Self::ParserError { constraint }
    }
}
