//! Reader for preprocessed declaration files: compact listings of externally
//! declared types shared between independent compilations.
//!
//! Each non-empty, non-comment line is `parcelable <fqn>;` or
//! `interface <fqn>;`. Entries are registered directly in the type namespace;
//! no bodies or methods are involved.

use std::path::Path;

use crate::diagnostics::DiagnosticSink;
use crate::frontend::ast::{Interface, Parcelable};
use crate::io_delegate::IoDelegate;
use crate::types::{Language, TypeNamespace};

/// Register every declaration listed in `path`. Returns the error count; the
/// first malformed line or duplicate registration stops the read.
pub fn parse_preprocessed_file<L: Language>(
    path: &Path,
    io: &dyn IoDelegate,
    types: &mut TypeNamespace<L>,
    sink: &mut DiagnosticSink,
) -> usize {
    let text = match io.read_text(path) {
        Ok(text) => text,
        Err(_) => {
            sink.push_error(
                format!("can't open preprocessed file: {}", path.display()),
                None,
            );
            return 1;
        }
    };

    for (number, raw_line) in text.lines().enumerate() {
        let line_number = number + 1;
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        let Some((kind, qualified_name)) = split_declaration_line(line) else {
            sink.push_error(
                format!("{}:{}: bad type in line: {}", path.display(), line_number, line),
                None,
            );
            return 1;
        };

        let (package, name) = split_qualified_name(qualified_name);
        let registered = match kind {
            "parcelable" => types.add_parcelable(
                &Parcelable {
                    name,
                    package,
                    line: line_number,
                    span: None,
                },
                path,
            ),
            "interface" => types.add_binder(
                &Interface {
                    name,
                    package,
                    line: line_number,
                    span: None,
                    oneway: false,
                    methods: Vec::new(),
                },
                path,
            ),
            _ => {
                sink.push_error(
                    format!("{}:{}: bad type in line: {}", path.display(), line_number, line),
                    None,
                );
                return 1;
            }
        };

        if let Err(diagnostic) = registered {
            sink.push(diagnostic);
            return 1;
        }
    }

    0
}

fn split_declaration_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_suffix(';')?;
    let mut parts = rest.split_whitespace();
    let kind = parts.next()?;
    let qualified_name = parts.next()?;
    if parts.next().is_some() || qualified_name.is_empty() {
        return None;
    }
    Some((kind, qualified_name))
}

fn split_qualified_name(qualified: &str) -> (Vec<String>, String) {
    match qualified.rsplit_once('.') {
        Some((package, name)) => (
            package.split('.').map(str::to_string).collect(),
            name.to_string(),
        ),
        None => (Vec::new(), qualified.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_delegate::FakeIoDelegate;
    use crate::types::java::JavaTypeNamespace;

    fn namespace() -> JavaTypeNamespace {
        let mut ns = JavaTypeNamespace::new();
        ns.init();
        ns
    }

    #[test]
    fn registers_parcelables_and_interfaces() {
        let io = FakeIoDelegate::default();
        io.set_file_contents(
            "pre.txt",
            "// shared types\nparcelable com.x.Foo;\ninterface com.y.IBar;\n",
        );
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        let errors =
            parse_preprocessed_file(Path::new("pre.txt"), &io, &mut types, &mut sink);
        assert_eq!(errors, 0);
        assert!(types.has_type("com.x.Foo"));
        assert!(types.has_type("com.y.IBar"));
    }

    #[test]
    fn tolerates_blank_lines_and_trailing_whitespace() {
        let io = FakeIoDelegate::default();
        io.set_file_contents("pre.txt", "\nparcelable com.x.Foo;   \n\n");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        assert_eq!(
            parse_preprocessed_file(Path::new("pre.txt"), &io, &mut types, &mut sink),
            0
        );
        assert!(types.has_type("com.x.Foo"));
    }

    #[test]
    fn malformed_lines_fail_with_location() {
        let io = FakeIoDelegate::default();
        io.set_file_contents("pre.txt", "parcelable com.x.Foo;\nstruct com.x.Bad;\n");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        assert_eq!(
            parse_preprocessed_file(Path::new("pre.txt"), &io, &mut types, &mut sink),
            1
        );
        let diagnostics = sink.into_vec();
        assert!(diagnostics[0].message.contains("pre.txt:2"));
        assert!(diagnostics[0].message.contains("bad type in line"));
    }

    #[test]
    fn missing_semicolon_is_malformed() {
        let io = FakeIoDelegate::default();
        io.set_file_contents("pre.txt", "parcelable com.x.Foo\n");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        assert_eq!(
            parse_preprocessed_file(Path::new("pre.txt"), &io, &mut types, &mut sink),
            1
        );
    }

    #[test]
    fn unreadable_file_is_reported() {
        let io = FakeIoDelegate::default();
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        assert_eq!(
            parse_preprocessed_file(Path::new("missing.txt"), &io, &mut types, &mut sink),
            1
        );
        let diagnostics = sink.into_vec();
        assert!(diagnostics[0].message.contains("can't open preprocessed file"));
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let io = FakeIoDelegate::default();
        io.set_file_contents("pre.txt", "parcelable com.x.Foo;\nparcelable com.x.Foo;\n");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        assert_eq!(
            parse_preprocessed_file(Path::new("pre.txt"), &io, &mut types, &mut sink),
            1
        );
    }

    #[test]
    fn unpackaged_names_register_bare() {
        let io = FakeIoDelegate::default();
        io.set_file_contents("pre.txt", "parcelable Foo;\n");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        assert_eq!(
            parse_preprocessed_file(Path::new("pre.txt"), &io, &mut types, &mut sink),
            0
        );
        assert!(types.has_type("Foo"));
    }
}
