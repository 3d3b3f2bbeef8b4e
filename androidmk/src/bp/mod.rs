//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

//! The blueprint (`Android.bp`) side: the output syntax tree and its printer.

pub mod ast;
pub mod printer;

pub use ast::{
    Assigner, Assignment, Comment, Definition, Expression, File, Module, Property, Value,
    ValueKind,
};
pub use printer::print;
