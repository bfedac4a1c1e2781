//! Code generation backends.
//!
//! Both generators consume an already-validated interface together with the
//! type namespace decorated for their language; neither mutates the
//! namespace.

pub mod cpp;
pub mod java;

use std::path::Path;

use crate::io_delegate::IoDelegate;

/// Write `contents` to `path` through the delegate, reporting success.
pub(crate) fn write_output(path: &Path, contents: &str, io: &dyn IoDelegate) -> bool {
    let Ok(mut writer) = io.get_writer(path) else {
        return false;
    };
    if writer.write(contents).is_err() {
        return false;
    }
    writer.close().is_ok()
}

/// Banner stamped at the top of every generated file.
pub(crate) fn auto_generated_header(input_file: &Path) -> String {
    format!(
        "/*\n * This file is auto-generated.  DO NOT MODIFY.\n * Original file: {}\n */\n",
        input_file.display()
    )
}
