//! Orchestration of a compilation: preprocessed declarations, primary parse,
//! import resolution, type registration, validation, and the hand-off to a
//! generator.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::codegen;
use crate::diagnostics::{Diagnostic, DiagnosticSink, FileCache};
use crate::frontend::ast::{Declaration, Import, Interface};
use crate::frontend::import_resolver::ImportResolver;
use crate::frontend::parser;
use crate::io_delegate::IoDelegate;
use crate::types::cpp::CppTypeNamespace;
use crate::types::java::JavaTypeNamespace;
use crate::types::{Language, TypeNamespace};
use crate::validate;

mod deps;
pub mod options;
mod preprocessed;

pub use options::{CppOptions, JavaOptions};
pub use preprocessed::parse_preprocessed_file;

/// Outcome of one driver task: accumulated diagnostics plus the sources they
/// point into.
#[derive(Debug)]
pub struct CompileReport {
    pub diagnostics: Vec<Diagnostic>,
    pub files: FileCache,
    pub errors: usize,
}

impl CompileReport {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.errors == 0
    }
}

/// Entry point for the three compiler tasks.
pub struct CompilerDriver;

impl Default for CompilerDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerDriver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Compile one interface to Java proxy/stub source.
    pub fn compile_java(&self, options: &JavaOptions, io: &dyn IoDelegate) -> CompileReport {
        let mut files = FileCache::default();
        let mut sink = DiagnosticSink::new("COMPILE");
        let mut types = JavaTypeNamespace::new();
        types.init();

        let loaded = load_and_validate(
            &options.preprocessed_files,
            &options.import_paths,
            &options.input_file_name,
            io,
            &mut types,
            &mut files,
            &mut sink,
            options.fail_on_parcelable,
        );
        let Some((interface, imports)) = loaded else {
            return finish(files, sink);
        };

        let output_file = match options.output_file_name.clone() {
            Some(path) => path,
            None => match options.output_base_folder.as_deref() {
                Some(base) => deps::generate_output_file_name(base, &interface),
                None => {
                    sink.push_error("no output file or output folder specified", None);
                    return finish(files, sink);
                }
            },
        };

        if io.ensure_parent_dirs(&output_file).is_err() {
            sink.push_error(
                format!("couldn't create path to {}", output_file.display()),
                None,
            );
            return finish(files, sink);
        }

        if options.auto_dep_file || options.dep_file_name.is_some() {
            deps::generate_dep_file(options, &output_file, &imports, io, &mut sink);
        }

        if codegen::java::generate(&output_file, &options.input_file_name, &interface, &types, io) {
            info!(target: "pipeline", stage = "emitted", output = %output_file.display());
        } else {
            sink.push_error(format!("failed to write {}", output_file.display()), None);
        }
        finish(files, sink)
    }

    /// Compile one interface to C++ proxy/stub source.
    pub fn compile_cpp(&self, options: &CppOptions, io: &dyn IoDelegate) -> CompileReport {
        let mut files = FileCache::default();
        let mut sink = DiagnosticSink::new("COMPILE");
        let mut types = CppTypeNamespace::new();
        types.init();

        let loaded = load_and_validate(
            &options.preprocessed_files,
            &options.import_paths,
            &options.input_file_name,
            io,
            &mut types,
            &mut files,
            &mut sink,
            false,
        );
        let Some((interface, _imports)) = loaded else {
            return finish(files, sink);
        };

        // TODO: emit a dependency file for the C++ path once the build system
        // consumes one there.

        if io.ensure_parent_dirs(&options.output_file_name).is_err() {
            sink.push_error(
                format!("couldn't create path to {}", options.output_file_name.display()),
                None,
            );
            return finish(files, sink);
        }

        if codegen::cpp::generate(
            &options.output_file_name,
            &options.input_file_name,
            &interface,
            &types,
            io,
        ) {
            info!(target: "pipeline", stage = "emitted", output = %options.output_file_name.display());
        } else {
            sink.push_error(
                format!("failed to write {}", options.output_file_name.display()),
                None,
            );
        }
        finish(files, sink)
    }

    /// Parse each input and emit one declaration line per file.
    pub fn preprocess(&self, options: &JavaOptions, io: &dyn IoDelegate) -> CompileReport {
        let mut files = FileCache::default();
        let mut sink = DiagnosticSink::new("PREPROCESS");

        let mut lines = Vec::new();
        for input in &options.files_to_preprocess {
            let result = match parser::parse_file(input, io, &mut files) {
                Ok(result) => result,
                Err(err) => {
                    sink.push_error(format!("couldn't open {}: {err}", input.display()), None);
                    return finish(files, sink);
                }
            };
            let has_errors = result.has_errors();
            sink.extend(result.diagnostics);
            let Some(document) = result.document else {
                return finish(files, sink);
            };
            if has_errors {
                return finish(files, sink);
            }
            let line = match &document {
                Declaration::Parcelable(parcelable) => {
                    format!("parcelable {};\n", parcelable.qualified_name())
                }
                Declaration::Interface(interface) => {
                    format!("interface {};\n", interface.qualified_name())
                }
            };
            lines.push(line);
        }

        let Some(output_file) = options.output_file_name.as_deref() else {
            sink.push_error("no output file specified", None);
            return finish(files, sink);
        };
        let mut writer = match io.get_writer(output_file) {
            Ok(writer) => writer,
            Err(_) => {
                sink.push_error(
                    format!("could not open file for write: {}", output_file.display()),
                    None,
                );
                return finish(files, sink);
            }
        };
        for line in &lines {
            if writer.write(line).is_err() {
                sink.push_error(
                    format!("error writing to file {}", output_file.display()),
                    None,
                );
                // Drop the partial output so later builds cannot pick it up.
                let _ = writer.close();
                let _ = io.remove(output_file);
                return finish(files, sink);
            }
        }
        if writer.close().is_err() {
            sink.push_error(
                format!("error writing to file {}", output_file.display()),
                None,
            );
            let _ = io.remove(output_file);
        }
        finish(files, sink)
    }
}

/// Run the shared front half of a compilation: load preprocessed types, parse
/// the primary file and its imports, populate the namespace, and validate the
/// interface. Returns `None` when the accumulated errors make code generation
/// meaningless.
#[allow(clippy::too_many_arguments)]
fn load_and_validate<L: Language>(
    preprocessed_files: &[PathBuf],
    import_paths: &[PathBuf],
    input_file_name: &Path,
    io: &dyn IoDelegate,
    types: &mut TypeNamespace<L>,
    files: &mut FileCache,
    sink: &mut DiagnosticSink,
    fail_on_parcelable: bool,
) -> Option<(Interface, Vec<Import>)> {
    for path in preprocessed_files {
        if parse_preprocessed_file(path, io, types, sink) != 0 {
            return None;
        }
    }
    debug!(target: "pipeline", stage = "preprocessed.loaded", count = preprocessed_files.len());

    let result = match parser::parse_file(input_file_name, io, files) {
        Ok(result) => result,
        Err(err) => {
            sink.push_error(
                format!("couldn't open {}: {err}", input_file_name.display()),
                None,
            );
            return None;
        }
    };
    let parse_failed = result.has_errors();
    sink.extend(result.diagnostics);
    let document = result.document;
    let mut imports = result.imports;
    if parse_failed {
        return None;
    }
    debug!(target: "pipeline", stage = "primary.parsed", input = %input_file_name.display());

    let mut interface = match document {
        Some(Declaration::Interface(interface)) => interface,
        Some(Declaration::Parcelable(parcelable)) => {
            if fail_on_parcelable {
                sink.push_error(
                    format!(
                        "refusing to generate code from file defining parcelable {}",
                        parcelable.qualified_name()
                    ),
                    parcelable.span,
                );
            } else {
                sink.push_error("expected exactly one interface per input file", None);
            }
            return None;
        }
        None => return None,
    };

    let clean_errors = sink.error_count();
    validate::check_filename(
        input_file_name,
        &interface.package,
        &interface.name,
        interface.span,
        sink,
    );
    let filename_errors = sink.error_count() - clean_errors;

    let resolver = ImportResolver::new(io, import_paths);
    let mut import_documents: Vec<Option<Declaration>> = Vec::new();
    for import in &mut imports {
        if types.has_type(&import.needed_class) {
            // Preprocessed declarations already satisfy this import. The
            // search path might hold a conflicting definition we never look
            // at, so say something rather than silently preferring the
            // preprocessed one.
            sink.push_warning(
                format!(
                    "import {} is already declared by a preprocessed file; skipping search path resolution",
                    import.needed_class
                ),
                import.span,
            );
            import_documents.push(None);
            continue;
        }
        let Some(path) = resolver.find_import_file(&import.needed_class) else {
            sink.push_error(
                format!("couldn't find import for class {}", import.needed_class),
                import.span,
            );
            import_documents.push(None);
            continue;
        };
        import.resolved_path = Some(path.clone());

        match parser::parse_file(&path, io, files) {
            Ok(result) => {
                let failed = result.has_errors();
                sink.extend(result.diagnostics);
                match result.document {
                    Some(document) if !failed => {
                        validate::check_filenames(&path, &document, sink);
                        import_documents.push(Some(document));
                    }
                    _ => {
                        sink.push_error(
                            format!(
                                "error while parsing import for class {}",
                                import.needed_class
                            ),
                            import.span,
                        );
                        import_documents.push(None);
                    }
                }
            }
            Err(err) => {
                sink.push_error(
                    format!("couldn't open import {}: {err}", path.display()),
                    import.span,
                );
                import_documents.push(None);
            }
        }
    }
    // A broken import graph would only produce cascading unknown-type noise
    // below; stop here. Filename mismatches alone do not gate validation.
    if sink.error_count() - filename_errors > clean_errors {
        return None;
    }
    debug!(target: "pipeline", stage = "imports.resolved", count = imports.len());

    if let Err(diagnostic) = types.add_binder(&interface, input_file_name) {
        sink.push(diagnostic);
    }
    for (import, document) in imports.iter().zip(&import_documents) {
        let Some(document) = document else { continue };
        let file = import
            .resolved_path
            .as_deref()
            .unwrap_or(input_file_name);
        gather_types(file, document, types, sink);
    }
    debug!(target: "pipeline", stage = "types.registered");

    let package = interface.package_string();
    if !types.is_valid_package(&package) {
        sink.push_error(
            format!("Invalid package declaration '{package}'"),
            interface.span,
        );
    }
    validate::check_types(input_file_name, &mut interface, types, sink);
    validate::check_and_assign_method_ids(input_file_name, &mut interface.methods, sink);

    if sink.error_count() > 0 {
        return None;
    }
    debug!(target: "pipeline", stage = "validated", interface = %interface.qualified_name());
    Some((interface, imports))
}

fn gather_types<L: Language>(
    file: &Path,
    document: &Declaration,
    types: &mut TypeNamespace<L>,
    sink: &mut DiagnosticSink,
) {
    let registered = match document {
        Declaration::Interface(interface) => types.add_binder(interface, file),
        Declaration::Parcelable(parcelable) => types.add_parcelable(parcelable, file),
    };
    if let Err(diagnostic) = registered {
        sink.push(diagnostic);
    }
}

fn finish(files: FileCache, sink: DiagnosticSink) -> CompileReport {
    let errors = sink.error_count();
    CompileReport {
        diagnostics: sink.into_vec(),
        files,
        errors,
    }
}
