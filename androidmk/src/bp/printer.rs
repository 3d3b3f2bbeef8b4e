//
// Copyright (c) 2024 Hemi Labs, Inc.
//
// This file is part of the posixutils-rs project covered under
// the MIT License.  For the full license text, please see the LICENSE
// file in the root directory of this project.
// SPDX-License-Identifier: MIT
//

use super::ast::{Comment, Definition, File, Module, Property, Value};

const INDENT: &str = "    ";

enum Item<'a> {
    Comment(&'a Comment),
    /// A definition with the comments that fall inside it.
    Definition(&'a Definition, Vec<&'a Comment>),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Printed {
    Comment,
    Assignment,
    Module,
}

/// Renders a blueprint file.
///
/// Definitions print in the order they were finished, so a variable
/// assigned while a module was open comes out ahead of that module. Comments
/// are interleaved by line, going first when they sit on the same line as a
/// definition. Comments whose line lies inside a module are printed inside
/// that module.
pub fn print(file: &File) -> String {
    let mut comments: Vec<&Comment> = file.comments.iter().collect();
    comments.sort_by_key(|comment| comment.line);
    let mut comments = comments.into_iter().peekable();

    let mut items = Vec::new();
    for def in &file.defs {
        while let Some(comment) = comments.next_if(|comment| comment.line <= def.line()) {
            items.push(Item::Comment(comment));
        }
        let mut inner = Vec::new();
        if let Definition::Module(module) = def {
            while let Some(comment) = comments.next_if(|comment| comment.line < module.end_line) {
                inner.push(comment);
            }
        }
        items.push(Item::Definition(def, inner));
    }
    items.extend(comments.map(Item::Comment));

    let mut out = String::new();
    let mut prev: Option<(usize, Printed)> = None;
    for item in items {
        let (line, end_line, printed) = match &item {
            Item::Comment(comment) => (comment.line, comment.line, Printed::Comment),
            Item::Definition(def @ Definition::Assignment(_), _) => {
                (def.line(), def.end_line(), Printed::Assignment)
            }
            Item::Definition(def, _) => (def.line(), def.end_line(), Printed::Module),
        };

        if let Some((prev_end, prev_printed)) = prev {
            let blank = line > prev_end + 1
                || prev_printed == Printed::Module
                || (printed == Printed::Module && prev_printed == Printed::Assignment);
            if blank {
                out.push('\n');
            }
        }

        match item {
            Item::Comment(comment) => print_comment(&mut out, comment, 0),
            Item::Definition(Definition::Assignment(assignment), _) => {
                out.push_str(&format!("{} {} ", assignment.name, assignment.assigner));
                print_value(&mut out, &assignment.value, 0);
                out.push('\n');
            }
            Item::Definition(Definition::Module(module), inner) => {
                print_module(&mut out, module, &inner)
            }
        }
        prev = Some((end_line, printed));
    }

    out
}

fn print_comment(out: &mut String, comment: &Comment, indent: usize) {
    for line in &comment.lines {
        out.push_str(&INDENT.repeat(indent));
        out.push_str(line);
        out.push('\n');
    }
}

fn print_module(out: &mut String, module: &Module, comments: &[&Comment]) {
    out.push_str(&module.typ);
    out.push_str(" {\n");

    let mut comments = comments.iter().peekable();
    for property in &module.properties {
        while let Some(comment) = comments.next_if(|comment| comment.line <= property.line) {
            print_comment(out, comment, 1);
        }
        print_property(out, property, 1);
    }
    for comment in comments {
        print_comment(out, comment, 1);
    }

    out.push_str("}\n");
}

fn print_property(out: &mut String, property: &Property, indent: usize) {
    out.push_str(&INDENT.repeat(indent));
    out.push_str(&property.name);
    out.push_str(": ");
    print_value(out, &property.value, indent);
    out.push_str(",\n");
}

fn print_value(out: &mut String, value: &Value, indent: usize) {
    match value {
        Value::String(s) => out.push_str(&quote(s)),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Variable { name, .. } => out.push_str(name),
        Value::Expression(expression) => {
            let [left, right] = &expression.args;
            print_value(out, left, indent);
            out.push_str(&format!(" {} ", expression.operator));
            print_value(out, right, indent);
        }
        Value::List(values) => match values.as_slice() {
            [] => out.push_str("[]"),
            [value] => {
                out.push('[');
                print_value(out, value, indent);
                out.push(']');
            }
            values => {
                out.push_str("[\n");
                for value in values {
                    out.push_str(&INDENT.repeat(indent + 1));
                    print_value(out, value, indent + 1);
                    out.push_str(",\n");
                }
                out.push_str(&INDENT.repeat(indent));
                out.push(']');
            }
        },
        Value::Map(properties) if properties.is_empty() => out.push_str("{}"),
        Value::Map(properties) => {
            out.push_str("{\n");
            for property in properties {
                print_property(out, property, indent + 1);
            }
            out.push_str(&INDENT.repeat(indent));
            out.push('}');
        }
    }
}

fn quote(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('"');
    for c in s.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bp::ast::{Assigner, Assignment, Expression, ValueKind};
    use similar_asserts::assert_eq;

    fn strings(values: &[&str]) -> Value {
        Value::List(values.iter().map(|s| Value::string(*s)).collect())
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
    }

    #[test]
    fn test_print_module() {
        let module = Module {
            typ: "cc_library_shared".to_string(),
            properties: vec![
                Property::new("name", Value::string("libfoo"), 2),
                Property::new("srcs", strings(&["a.c", "b.c"]), 3),
                Property::new("cflags", strings(&["-Wall"]), 4),
                Property::new("shared_libs", strings(&[]), 5),
                Property::new(
                    "target",
                    Value::Map(vec![Property::new(
                        "darwin",
                        Value::Map(vec![Property::new("enabled", Value::Bool(false), 6)]),
                        6,
                    )]),
                    6,
                ),
            ],
            line: 1,
            end_line: 7,
        };
        let file = File {
            defs: vec![Definition::Module(module)],
            comments: vec![Comment {
                lines: vec!["// sources".to_string()],
                line: 3,
            }],
        };

        assert_eq!(
            print(&file),
            "cc_library_shared {
    name: \"libfoo\",
    // sources
    srcs: [
        \"a.c\",
        \"b.c\",
    ],
    cflags: [\"-Wall\"],
    shared_libs: [],
    target: {
        darwin: {
            enabled: false,
        },
    },
}
"
        );
    }

    #[test]
    fn test_print_assignments_and_spacing() {
        let file = File {
            defs: vec![
                Definition::Assignment(Assignment {
                    name: "FLAGS".to_string(),
                    value: strings(&["-O2"]),
                    assigner: Assigner::Equals,
                    line: 2,
                }),
                Definition::Assignment(Assignment {
                    name: "FLAGS".to_string(),
                    value: strings(&["-g"]),
                    assigner: Assigner::PlusEquals,
                    line: 3,
                }),
                Definition::Module(Module {
                    typ: "cc_binary".to_string(),
                    properties: vec![Property::new(
                        "cflags",
                        Value::Expression(Box::new(Expression {
                            operator: '+',
                            args: [
                                Value::Variable {
                                    name: "FLAGS".to_string(),
                                    kind: ValueKind::List,
                                },
                                strings(&["-Werror"]),
                            ],
                            kind: ValueKind::List,
                        })),
                        5,
                    )],
                    line: 4,
                    end_line: 6,
                }),
            ],
            comments: vec![
                Comment {
                    lines: vec!["// header".to_string()],
                    line: 1,
                },
                Comment {
                    lines: vec!["// trailer".to_string()],
                    line: 9,
                },
            ],
        };

        assert_eq!(
            print(&file),
            "// header
FLAGS = [\"-O2\"]
FLAGS += [\"-g\"]

cc_binary {
    cflags: FLAGS + [\"-Werror\"],
}

// trailer
"
        );
    }

    #[test]
    fn test_definitions_print_in_finish_order() {
        // FLAGS was assigned between the module's first and last line
        let file = File {
            defs: vec![
                Definition::Assignment(Assignment {
                    name: "FLAGS".to_string(),
                    value: strings(&["-O2"]),
                    assigner: Assigner::Equals,
                    line: 2,
                }),
                Definition::Module(Module {
                    typ: "cc_binary".to_string(),
                    properties: vec![Property::new(
                        "cflags",
                        Value::Variable {
                            name: "FLAGS".to_string(),
                            kind: ValueKind::List,
                        },
                        3,
                    )],
                    line: 1,
                    end_line: 4,
                }),
            ],
            comments: vec![],
        };

        assert_eq!(
            print(&file),
            "FLAGS = [\"-O2\"]

cc_binary {
    cflags: FLAGS,
}
"
        );
    }
}
