use std::path::PathBuf;

use crate::io_delegate::IoDelegate;

/// Maps fully qualified class names onto `.aidl` files under a search path.
///
/// Resolution is a pure existence probe: the qualified name is projected onto
/// the filesystem (dots become separators, `.aidl` appended) and each search
/// directory is tried in order. The first hit wins, so resolution is
/// idempotent and independent of any earlier lookups.
pub struct ImportResolver<'a> {
    io: &'a dyn IoDelegate,
    import_paths: Vec<PathBuf>,
}

impl<'a> ImportResolver<'a> {
    #[must_use]
    pub fn new(io: &'a dyn IoDelegate, import_paths: &[PathBuf]) -> Self {
        Self {
            io,
            import_paths: import_paths.to_vec(),
        }
    }

    /// Find the file declaring `class_name`, or `None` when no search path
    /// contains it.
    #[must_use]
    pub fn find_import_file(&self, class_name: &str) -> Option<PathBuf> {
        let relative = class_to_relative_path(class_name);
        for dir in &self.import_paths {
            let candidate = dir.join(&relative);
            if self.io.file_exists(&candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Filesystem projection of a qualified name: `com.x.IFoo` becomes
/// `com/x/IFoo.aidl` (with the host separator).
#[must_use]
pub fn class_to_relative_path(class_name: &str) -> PathBuf {
    let mut path: PathBuf = class_name.split('.').collect();
    path.set_extension("aidl");
    path
}
