use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write_file(root: &Path, relative: &str, contents: &str) -> std::io::Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn aidlc() -> Command {
    Command::cargo_bin("aidlc").expect("binary builds")
}

#[test]
fn emits_one_declaration_line_per_input() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    write_file(temp.path(), "com/x/Foo.aidl", "package com.x;\nparcelable Foo;\n")?;
    write_file(
        temp.path(),
        "com/y/IBar.aidl",
        "package com.y;\ninterface IBar { void f(); }\n",
    )?;

    aidlc()
        .current_dir(temp.path())
        .args(["preprocess", "pre.txt", "com/x/Foo.aidl", "com/y/IBar.aidl"])
        .assert()
        .success();

    let preprocessed = fs::read_to_string(temp.path().join("pre.txt"))?;
    assert_eq!(preprocessed, "parcelable com.x.Foo;\ninterface com.y.IBar;\n");
    Ok(())
}

#[test]
fn preprocessed_declarations_satisfy_imports_without_source() -> Result<(), Box<dyn std::error::Error>>
{
    let temp = tempfile::tempdir()?;
    write_file(temp.path(), "com/x/Foo.aidl", "package com.x;\nparcelable Foo;\n")?;

    aidlc()
        .current_dir(temp.path())
        .args(["preprocess", "pre.txt", "com/x/Foo.aidl"])
        .assert()
        .success();

    // The declaring source is gone; only the preprocessed listing remains.
    fs::remove_file(temp.path().join("com/x/Foo.aidl"))?;

    write_file(
        temp.path(),
        "com/y/IUsesFoo.aidl",
        "package com.y;\nimport com.x.Foo;\ninterface IUsesFoo { void store(in com.x.Foo foo); }\n",
    )?;

    aidlc()
        .current_dir(temp.path())
        .args([
            "compile-java",
            "-p",
            "pre.txt",
            "com/y/IUsesFoo.aidl",
            "IUsesFoo.java",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "already declared by a preprocessed file",
        ));

    assert!(temp.path().join("IUsesFoo.java").exists());
    Ok(())
}

#[test]
fn malformed_preprocessed_lines_fail_compilation() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    write_file(temp.path(), "pre.txt", "parcelable com.x.Foo;\nstruct Bad;\n")?;
    write_file(
        temp.path(),
        "com/y/IBar.aidl",
        "package com.y;\ninterface IBar { void f(); }\n",
    )?;

    aidlc()
        .current_dir(temp.path())
        .args([
            "compile-java",
            "-p",
            "pre.txt",
            "com/y/IBar.aidl",
            "IBar.java",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("pre.txt:2"))
        .stderr(predicate::str::contains("bad type in line"));
    Ok(())
}

#[test]
fn parcelable_primary_input_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let temp = tempfile::tempdir()?;
    write_file(temp.path(), "com/x/Foo.aidl", "package com.x;\nparcelable Foo;\n")?;

    aidlc()
        .current_dir(temp.path())
        .args(["compile-java", "com/x/Foo.aidl", "Foo.java"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one interface"));
    Ok(())
}
