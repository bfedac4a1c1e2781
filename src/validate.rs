//! Semantic checks run between parsing and code generation: filename/package
//! agreement, method signature validity, and transaction id assignment.

use std::collections::{HashMap, HashSet};
use std::path::{Path, MAIN_SEPARATOR};

use crate::diagnostics::{Diagnostic, DiagnosticSink, Span};
use crate::frontend::ast::{Declaration, Interface, Method};
use crate::types::{Language, TypeNamespace};

/// User-assignable transaction ids are zero-based offsets into the window
/// between the transport's first and last call transaction codes
/// (1 and 16 777 215).
pub const MIN_USER_SET_METHOD_ID: i64 = 0;
pub const MAX_USER_SET_METHOD_ID: i64 = 16_777_214;

/// Path comparison with the host platform's case policy. Filenames are
/// matched case-insensitively everywhere except Linux.
#[must_use]
pub fn path_equal(a: &str, b: &str) -> bool {
    if cfg!(target_os = "linux") {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

/// Verify that a declaration named `name` in `package` lives in the file the
/// qualified name demands. A mismatch is reported but does not stop later
/// checks.
pub fn check_filename(
    filename: &Path,
    package: &[String],
    name: &str,
    span: Option<Span>,
    sink: &mut DiagnosticSink,
) -> bool {
    let mut full_path = filename.display().to_string();
    if filename.is_relative() {
        if let Ok(cwd) = std::env::current_dir() {
            full_path = cwd.join(filename).display().to_string();
        }
    }
    if cfg!(windows) {
        full_path = full_path.replace('/', "\\");
    }

    let mut expected = String::new();
    for component in package {
        expected.push_str(component);
        expected.push(MAIN_SEPARATOR);
    }
    expected.push_str(name_root(name));
    expected.push_str(".aidl");

    let tail_start = full_path.len().saturating_sub(expected.len());
    let valid = full_path.len() >= expected.len()
        && full_path.is_char_boundary(tail_start)
        && path_equal(&full_path[tail_start..], &expected);

    if !valid {
        sink.push_error(
            format!("interface {name} should be declared in a file called {expected}."),
            span,
        );
    }
    valid
}

/// Filename check for a whole document, whichever declaration kind it holds.
pub fn check_filenames(filename: &Path, document: &Declaration, sink: &mut DiagnosticSink) -> bool {
    match document {
        Declaration::Interface(interface) => check_filename(
            filename,
            &interface.package,
            &interface.name,
            interface.span,
            sink,
        ),
        Declaration::Parcelable(parcelable) => check_filename(
            filename,
            &parcelable.package,
            &parcelable.name,
            parcelable.span,
            sink,
        ),
    }
}

/// Type-check every method of `interface` against the namespace. All problems
/// are reported; nothing short-circuits, so one run surfaces everything.
pub fn check_types<L: Language>(
    file: &Path,
    interface: &mut Interface,
    types: &mut TypeNamespace<L>,
    sink: &mut DiagnosticSink,
) -> usize {
    let mut errors = 0;
    let interface_oneway = interface.oneway;
    let mut method_locations: HashMap<String, Option<Span>> = HashMap::new();

    for method in &mut interface.methods {
        let oneway = method.oneway || interface_oneway;

        match types.maybe_add_container(&method.return_type.name) {
            Err(diagnostic) => {
                sink.push(diagnostic);
                errors += 1;
            }
            Ok(()) => {
                if let Err(diagnostic) = types.is_valid_return_type(&mut method.return_type, file) {
                    sink.push(diagnostic);
                    errors += 1;
                }
            }
        }

        if oneway && method.return_type.name != "void" {
            sink.push_error(
                format!("oneway method '{}' cannot return a value", method.name),
                method.span,
            );
            errors += 1;
        }

        for (position, argument) in method.arguments.iter_mut().enumerate() {
            let index = position + 1;
            match types.maybe_add_container(&argument.ty.name) {
                Err(diagnostic) => {
                    sink.push(diagnostic);
                    errors += 1;
                }
                Ok(()) => {
                    if let Err(diagnostic) = types.is_valid_arg(argument, index, file) {
                        sink.push(diagnostic);
                        errors += 1;
                    }
                }
            }

            if oneway && argument.direction.is_out() {
                sink.push_error(
                    format!("oneway method '{}' cannot have out parameters", method.name),
                    method.span,
                );
                errors += 1;
            }
        }

        match method_locations.get(&method.name).copied() {
            None => {
                method_locations.insert(method.name.clone(), method.span);
            }
            Some(previous) => {
                let mut diagnostic = Diagnostic::error(
                    format!("attempt to redefine method {}", method.name),
                    method.span,
                );
                if let Some(previous_span) = previous {
                    diagnostic =
                        diagnostic.with_related(previous_span, "previously defined here");
                }
                sink.push(diagnostic);
                errors += 1;
            }
        }
    }
    errors
}

/// Validate explicit transaction ids, or assign 0, 1, 2, … in declaration
/// order when none are given. Mixing assigned and unassigned ids is an error.
pub fn check_and_assign_method_ids(
    file: &Path,
    methods: &mut [Method],
    sink: &mut DiagnosticSink,
) -> usize {
    let mut used_ids = HashSet::new();
    let mut has_unassigned = false;
    let mut has_assigned = false;

    for method in methods.iter() {
        if let Some(id) = method.id {
            has_assigned = true;
            if used_ids.contains(&id) {
                sink.push_error(
                    format!("Found duplicate method id ({id}) for method: {}", method.name),
                    method.span,
                );
                return 1;
            }
            if !(MIN_USER_SET_METHOD_ID..=MAX_USER_SET_METHOD_ID).contains(&id) {
                let mut diagnostic = Diagnostic::error(
                    format!(
                        "Found out of bounds id ({id}) for method: {}",
                        method.name
                    ),
                    method.span,
                );
                diagnostic.add_note(format!(
                    "Value for id must be between {MIN_USER_SET_METHOD_ID} and \
                     {MAX_USER_SET_METHOD_ID} inclusive."
                ));
                sink.push(diagnostic);
                return 1;
            }
            used_ids.insert(id);
        } else {
            has_unassigned = true;
        }
        if has_assigned && has_unassigned {
            sink.push_error(
                format!(
                    "{}: You must either assign id's to all methods or to none of them.",
                    file.display()
                ),
                None,
            );
            return 1;
        }
    }

    if has_unassigned {
        for (index, method) in methods.iter_mut().enumerate() {
            method.id = Some(index as i64);
        }
    }

    0
}

fn name_root(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::FileCache;
    use crate::frontend::ast::Declaration;
    use crate::frontend::parser::parse_source;
    use crate::types::java::JavaTypeNamespace;

    fn parse_interface(source: &str) -> Interface {
        let mut files = FileCache::default();
        let result = parse_source(Path::new("test.aidl"), source, &mut files);
        match result.document.expect("document parsed") {
            Declaration::Interface(interface) => interface,
            Declaration::Parcelable(_) => panic!("expected interface"),
        }
    }

    fn namespace() -> JavaTypeNamespace {
        let mut ns = JavaTypeNamespace::new();
        ns.init();
        ns
    }

    #[test]
    fn filename_must_match_package_and_name() {
        let mut sink = DiagnosticSink::default();
        let package = vec!["com".to_string(), "x".to_string()];
        assert!(check_filename(
            Path::new("com/x/IEcho.aidl"),
            &package,
            "IEcho",
            None,
            &mut sink,
        ));
        assert!(sink.is_empty());

        assert!(!check_filename(
            Path::new("wrong/Path.aidl"),
            &package,
            "IEcho",
            None,
            &mut sink,
        ));
        let diagnostics = sink.into_vec();
        assert!(diagnostics[0].message.contains("com/x/IEcho.aidl"));
        assert!(diagnostics[0].message.contains("IEcho"));
    }

    #[test]
    fn filename_check_accepts_empty_package() {
        let mut sink = DiagnosticSink::default();
        assert!(check_filename(
            Path::new("IEcho.aidl"),
            &[],
            "IEcho",
            None,
            &mut sink,
        ));
    }

    #[test]
    fn valid_interface_passes_type_check() {
        let mut interface =
            parse_interface("interface IEcho { String echo(String s); int add(int a, int b); }");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        let errors = check_types(Path::new("test.aidl"), &mut interface, &mut types, &mut sink);
        assert_eq!(errors, 0);
        assert!(sink.is_empty());
        assert!(interface.methods[0].return_type.resolved_entry().is_some());
    }

    #[test]
    fn oneway_methods_cannot_return_or_write_back() {
        let mut interface =
            parse_interface("interface IBad { oneway int doit(); oneway void put(out int x); }");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        let errors = check_types(Path::new("test.aidl"), &mut interface, &mut types, &mut sink);
        assert!(errors >= 2);
        let diagnostics = sink.into_vec();
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message.contains("oneway method 'doit' cannot return a value"))
        );
        assert!(
            diagnostics
                .iter()
                .any(|d| d.message.contains("oneway method 'put' cannot have out parameters"))
        );
    }

    #[test]
    fn interface_oneway_applies_to_every_method() {
        let mut interface = parse_interface("oneway interface IAll { int bad(); }");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        let errors = check_types(Path::new("test.aidl"), &mut interface, &mut types, &mut sink);
        assert_eq!(errors, 1);
    }

    #[test]
    fn duplicate_methods_report_both_locations() {
        let mut interface = parse_interface("interface IDup { void a(); void a(); }");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        let errors = check_types(Path::new("test.aidl"), &mut interface, &mut types, &mut sink);
        assert_eq!(errors, 1);
        let diagnostics = sink.into_vec();
        let diagnostic = &diagnostics[0];
        assert!(diagnostic.message.contains("attempt to redefine method a"));
        assert_eq!(diagnostic.related.len(), 1);
        assert!(diagnostic.related[0]
            .message
            .contains("previously defined here"));
    }

    #[test]
    fn all_type_errors_surface_in_one_pass() {
        let mut interface =
            parse_interface("interface IMany { Missing a(); void b(Unknown u); void c(out int x); }");
        let mut types = namespace();
        let mut sink = DiagnosticSink::default();
        let errors = check_types(Path::new("test.aidl"), &mut interface, &mut types, &mut sink);
        assert_eq!(errors, 3);
    }

    #[test]
    fn implicit_ids_are_assigned_in_order() {
        let mut interface = parse_interface("interface ISeq { void a(); void b(); void c(); }");
        let mut sink = DiagnosticSink::default();
        let errors =
            check_and_assign_method_ids(Path::new("test.aidl"), &mut interface.methods, &mut sink);
        assert_eq!(errors, 0);
        let ids: Vec<i64> = interface
            .methods
            .iter()
            .map(|method| method.assigned_id())
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn explicit_ids_are_preserved() {
        let mut interface = parse_interface("interface IExp { void a() = 7; void b() = 3; }");
        let mut sink = DiagnosticSink::default();
        let errors =
            check_and_assign_method_ids(Path::new("test.aidl"), &mut interface.methods, &mut sink);
        assert_eq!(errors, 0);
        assert_eq!(interface.methods[0].assigned_id(), 7);
        assert_eq!(interface.methods[1].assigned_id(), 3);
    }

    #[test]
    fn mixed_id_assignment_is_rejected() {
        let mut interface = parse_interface("interface IMix { void a() = 3; void b(); }");
        let mut sink = DiagnosticSink::default();
        let errors =
            check_and_assign_method_ids(Path::new("test.aidl"), &mut interface.methods, &mut sink);
        assert_eq!(errors, 1);
        let diagnostics = sink.into_vec();
        assert!(diagnostics[0]
            .message
            .contains("You must either assign id's to all methods or to none of them."));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut interface = parse_interface("interface IDup { void a()=1; void b()=1; }");
        let mut sink = DiagnosticSink::default();
        let errors =
            check_and_assign_method_ids(Path::new("test.aidl"), &mut interface.methods, &mut sink);
        assert_eq!(errors, 1);
        let diagnostics = sink.into_vec();
        assert!(diagnostics[0]
            .message
            .contains("Found duplicate method id (1) for method: b"));
    }

    #[test]
    fn out_of_bounds_ids_are_rejected() {
        for source in [
            "interface IOob { void a() = -1; }",
            "interface IOob { void a() = 16777215; }",
        ] {
            let mut interface = parse_interface(source);
            let mut sink = DiagnosticSink::default();
            let errors = check_and_assign_method_ids(
                Path::new("test.aidl"),
                &mut interface.methods,
                &mut sink,
            );
            assert_eq!(errors, 1);
            let diagnostics = sink.into_vec();
            assert!(diagnostics[0].message.contains("Found out of bounds id"));
            assert!(diagnostics[0].notes[0].contains("between 0 and 16777214 inclusive"));
        }
    }

    #[test]
    fn max_id_is_accepted() {
        let mut interface = parse_interface("interface IMax { void a() = 16777214; void b() = 0; }");
        let mut sink = DiagnosticSink::default();
        let errors =
            check_and_assign_method_ids(Path::new("test.aidl"), &mut interface.methods, &mut sink);
        assert_eq!(errors, 0);
    }
}
