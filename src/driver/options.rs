use std::path::PathBuf;

/// Options for the Java compile and preprocess tasks.
#[derive(Debug, Clone, Default)]
pub struct JavaOptions {
    pub input_file_name: PathBuf,
    pub output_file_name: Option<PathBuf>,
    /// When set and no output file is given, the output path is derived from
    /// the interface's package under this folder.
    pub output_base_folder: Option<PathBuf>,
    pub import_paths: Vec<PathBuf>,
    pub preprocessed_files: Vec<PathBuf>,
    pub dep_file_name: Option<PathBuf>,
    /// `-a`: write the dependency file next to the output as `<output>.d`.
    pub auto_dep_file: bool,
    /// `-b`: report parcelable inputs with an explicit refusal.
    pub fail_on_parcelable: bool,
    pub files_to_preprocess: Vec<PathBuf>,
}

/// Options for the C++ compile task.
#[derive(Debug, Clone, Default)]
pub struct CppOptions {
    pub input_file_name: PathBuf,
    pub output_file_name: PathBuf,
    pub import_paths: Vec<PathBuf>,
    pub preprocessed_files: Vec<PathBuf>,
}
