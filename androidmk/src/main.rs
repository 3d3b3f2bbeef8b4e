//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::Parser;

use androidmk::{
    config::Config,
    convert,
    error_code::ErrorCode::{self, *},
    parser::ParseErrors,
    Conversion,
};

/// androidmk - convert an Android.mk file to Android.bp
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    #[arg(
        long,
        help = "Drop a module that is never built instead of reporting it in the output"
    )]
    allow_unclosed_module: bool,

    #[arg(help = "Path to the Android.mk to convert, or - for standard input")]
    file: PathBuf,
}

fn main() {
    env_logger::init();

    let Args {
        allow_unclosed_module,
        file,
    } = Args::parse();

    let config = Config {
        report_unclosed_module: !allow_unclosed_module,
    };

    match read_source(&file).and_then(|source| convert(&source, &config)) {
        Ok(Conversion { output, errors }) => {
            print!("{output}");
            print_parse_errors(&file, &errors);
        }
        Err(err) => {
            match &err {
                ParserError { constraint } => print_parse_errors(&file, constraint),
                IoError(_) => eprintln!("ERROR: {}: {}", file.display(), err),
            }
            process::exit(err.into());
        }
    }
}

fn print_parse_errors(file: &Path, errors: &ParseErrors) {
    for error in &errors.0 {
        eprintln!("ERROR: {}:{}", file.display(), error);
    }
}

/// Reads the makefile at `path`, or `stdin` for `-`.
fn read_source(path: &Path) -> Result<String, ErrorCode> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}
