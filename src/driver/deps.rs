//! Build-system integration: make-style dependency files and output path
//! derivation.

use std::io;
use std::path::{Path, PathBuf};

use crate::diagnostics::DiagnosticSink;
use crate::driver::options::JavaOptions;
use crate::frontend::ast::{Import, Interface};
use crate::io_delegate::IoDelegate;

/// Emit a make fragment declaring the output's dependency on the input and
/// every resolved import.
///
/// Each input also gets an empty rule of its own so make does not fail when a
/// file is renamed or deleted between incremental builds.
pub fn generate_dep_file(
    options: &JavaOptions,
    output_file: &Path,
    imports: &[Import],
    io: &dyn IoDelegate,
    sink: &mut DiagnosticSink,
) {
    let dep_file = if options.auto_dep_file {
        PathBuf::from(format!("{}.d", output_file.display()))
    } else {
        match options.dep_file_name.as_ref() {
            Some(name) => name.clone(),
            None => return,
        }
    };

    let resolved: Vec<&Path> = imports
        .iter()
        .filter_map(|import| import.resolved_path.as_deref())
        .collect();

    let mut writer = match io.get_writer(&dep_file) {
        Ok(writer) => writer,
        Err(_) => {
            // A missing dependency file degrades incremental builds but the
            // generated code is still valid.
            sink.push_warning(format!("Could not open {}", dep_file.display()), None);
            return;
        }
    };

    let result = write_rules(writer.as_mut(), options, output_file, &resolved);
    let result = result.and_then(|()| writer.close());
    if result.is_err() {
        sink.push_warning(format!("error writing {}", dep_file.display()), None);
    }
}

fn write_rules(
    writer: &mut dyn crate::io_delegate::CodeWriter,
    options: &JavaOptions,
    output_file: &Path,
    resolved: &[&Path],
) -> io::Result<()> {
    let input = options.input_file_name.display();
    writer.write(&format!("{}: \\\n", output_file.display()))?;
    writer.write(&format!(
        "  {} {}\n",
        input,
        if resolved.is_empty() { "" } else { "\\" }
    ))?;

    let mut first = true;
    for path in resolved {
        if !first {
            writer.write(" \\\n")?;
        }
        first = false;
        writer.write(&format!("  {}", path.display()))?;
    }
    writer.write(if first { "\n" } else { "\n\n" })?;

    writer.write(&format!("{} :\n", input))?;
    for path in resolved {
        writer.write(&format!("{} :\n", path.display()))?;
    }
    Ok(())
}

/// Derive `<base>/<package-as-path>/<Name>.java` for an interface when no
/// explicit output file was requested.
#[must_use]
pub fn generate_output_file_name(base_folder: &Path, interface: &Interface) -> PathBuf {
    let mut path = base_folder.to_path_buf();
    for component in &interface.package {
        path.push(component);
    }
    let name_root = interface.name.split('.').next().unwrap_or(&interface.name);
    path.push(format!("{name_root}.java"));
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io_delegate::FakeIoDelegate;

    fn import(class: &str, resolved: Option<&str>) -> Import {
        Import {
            needed_class: class.to_string(),
            file_from: PathBuf::from("com/x/IEcho.aidl"),
            line: 1,
            span: None,
            resolved_path: resolved.map(PathBuf::from),
        }
    }

    #[test]
    fn dep_file_lists_input_and_imports_with_empty_rules() {
        let io = FakeIoDelegate::default();
        let options = JavaOptions {
            input_file_name: PathBuf::from("com/x/IEcho.aidl"),
            dep_file_name: Some(PathBuf::from("deps.d")),
            ..JavaOptions::default()
        };
        let imports = vec![
            import("com.a.Foo", Some("search/com/a/Foo.aidl")),
            import("com.b.Bar", Some("search/com/b/Bar.aidl")),
        ];
        let mut sink = DiagnosticSink::default();
        generate_dep_file(
            &options,
            Path::new("out/IEcho.java"),
            &imports,
            &io,
            &mut sink,
        );
        let contents = io
            .written_contents(Path::new("deps.d"))
            .expect("dep file written");
        assert_eq!(
            contents,
            "out/IEcho.java: \\\n  com/x/IEcho.aidl \\\n  search/com/a/Foo.aidl \\\n  \
             search/com/b/Bar.aidl\n\ncom/x/IEcho.aidl :\nsearch/com/a/Foo.aidl :\n\
             search/com/b/Bar.aidl :\n"
        );
    }

    #[test]
    fn dep_file_without_imports_has_single_rule() {
        let io = FakeIoDelegate::default();
        let options = JavaOptions {
            input_file_name: PathBuf::from("com/x/IEcho.aidl"),
            dep_file_name: Some(PathBuf::from("deps.d")),
            ..JavaOptions::default()
        };
        let mut sink = DiagnosticSink::default();
        generate_dep_file(&options, Path::new("out/IEcho.java"), &[], &io, &mut sink);
        let contents = io
            .written_contents(Path::new("deps.d"))
            .expect("dep file written");
        assert_eq!(
            contents,
            "out/IEcho.java: \\\n  com/x/IEcho.aidl \n\ncom/x/IEcho.aidl :\n"
        );
    }

    #[test]
    fn auto_dep_file_lands_next_to_output() {
        let io = FakeIoDelegate::default();
        let options = JavaOptions {
            input_file_name: PathBuf::from("com/x/IEcho.aidl"),
            auto_dep_file: true,
            ..JavaOptions::default()
        };
        let mut sink = DiagnosticSink::default();
        generate_dep_file(&options, Path::new("out/IEcho.java"), &[], &io, &mut sink);
        assert!(io.written_contents(Path::new("out/IEcho.java.d")).is_some());
    }

    #[test]
    fn output_path_derives_from_package() {
        let interface = Interface {
            name: "IEcho".into(),
            package: vec!["com".into(), "x".into()],
            line: 1,
            span: None,
            oneway: false,
            methods: Vec::new(),
        };
        assert_eq!(
            generate_output_file_name(Path::new("gen"), &interface),
            PathBuf::from("gen").join("com").join("x").join("IEcho.java")
        );
    }
}
