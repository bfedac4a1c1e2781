//! Filesystem access for the compiler, behind a delegate so the pipeline can
//! run against an in-memory tree in tests.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

/// Line-oriented output sink created by [`IoDelegate::get_writer`].
///
/// Writers buffer internally; `close` flushes. Dropping an unclosed writer
/// discards any buffering guarantees, so the driver always closes explicitly
/// on success paths.
pub trait CodeWriter {
    fn write(&mut self, text: &str) -> io::Result<()>;
    fn close(&mut self) -> io::Result<()>;
}

/// Abstraction over the file operations the compiler performs.
pub trait IoDelegate {
    fn read_text(&self, path: &Path) -> io::Result<String>;
    fn get_writer(&self, path: &Path) -> io::Result<Box<dyn CodeWriter>>;
    fn file_exists(&self, path: &Path) -> bool;
    fn ensure_parent_dirs(&self, path: &Path) -> io::Result<()>;
    fn remove(&self, path: &Path) -> io::Result<()>;
}

/// Delegate backed by the real filesystem.
#[derive(Debug, Default)]
pub struct RealIoDelegate;

impl IoDelegate for RealIoDelegate {
    fn read_text(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn get_writer(&self, path: &Path) -> io::Result<Box<dyn CodeWriter>> {
        let file = fs::File::create(path)?;
        Ok(Box::new(FileWriter {
            inner: io::BufWriter::new(file),
        }))
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn ensure_parent_dirs(&self, path: &Path) -> io::Result<()> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

struct FileWriter {
    inner: io::BufWriter<fs::File>,
}

impl CodeWriter for FileWriter {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes())
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
pub use fake::FakeIoDelegate;
