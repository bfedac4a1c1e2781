//! Source text bookkeeping: every file a compilation reads is registered
//! here so spans can be turned into line/column locations and caret
//! snippets when diagnostics are rendered.

use std::path::PathBuf;

use super::Span;

/// Identifier for source files used when formatting diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileId(pub usize);

impl FileId {
    pub const UNKNOWN: Self = FileId(usize::MAX);
}

impl Default for FileId {
    fn default() -> Self {
        FileId::UNKNOWN
    }
}

/// 1-based line and column. Columns count characters, not bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
}

/// One source line prepared for caret rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snippet {
    pub line: usize,
    /// Line text without its terminator.
    pub text: String,
    /// 1-based character column where the caret run starts.
    pub caret_column: usize,
    pub caret_len: usize,
}

/// A registered source file.
///
/// `.aidl` sources are a few hundred bytes, so locations are computed by
/// scanning on demand rather than keeping offset tables alive for the whole
/// compilation.
#[derive(Clone, Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
}

impl SourceFile {
    #[must_use]
    pub fn line_col(&self, offset: usize) -> Option<LineCol> {
        if offset > self.source.len() {
            return None;
        }
        let before = &self.source.as_bytes()[..offset];
        let line = before.iter().filter(|byte| **byte == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|byte| *byte == b'\n')
            .map_or(0, |pos| pos + 1);
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count())
            + 1;
        Some(LineCol { line, column })
    }

    /// The text of a 1-based line, without its terminator.
    #[must_use]
    pub fn line_text(&self, line: usize) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.source.lines().nth(line - 1)
    }

    /// Prepare the line containing `span` for caret rendering. The caret run
    /// covers the span's overlap with that line and never collapses to zero
    /// width.
    #[must_use]
    pub fn snippet(&self, span: Span) -> Option<Snippet> {
        let loc = self.line_col(span.start)?;
        let text = self.line_text(loc.line)?;
        let line_start = self.source.as_bytes()[..span.start]
            .iter()
            .rposition(|byte| *byte == b'\n')
            .map_or(0, |pos| pos + 1);
        let rel_start = (span.start - line_start).min(text.len());
        let rel_end = span
            .end
            .saturating_sub(line_start)
            .clamp(rel_start, text.len());
        let caret_column = text
            .get(..rel_start)
            .map_or(rel_start, |prefix| prefix.chars().count())
            + 1;
        let caret_len = text
            .get(rel_start..rel_end)
            .map_or(rel_end - rel_start, |covered| covered.chars().count())
            .max(1);
        Some(Snippet {
            line: loc.line,
            text: text.to_string(),
            caret_column,
            caret_len,
        })
    }
}

/// The files one compilation has read, addressed by [`FileId`].
#[derive(Clone, Debug, Default)]
pub struct FileCache {
    files: Vec<SourceFile>,
}

impl FileCache {
    pub fn add_file(&mut self, path: impl Into<PathBuf>, source: impl Into<String>) -> FileId {
        let id = FileId(self.files.len());
        self.files.push(SourceFile {
            path: path.into(),
            source: source.into(),
        });
        id
    }

    #[must_use]
    pub fn get(&self, file_id: FileId) -> Option<&SourceFile> {
        self.files.get(file_id.0)
    }

    #[must_use]
    pub fn line_col(&self, file_id: FileId, offset: usize) -> Option<LineCol> {
        self.get(file_id).and_then(|file| file.line_col(offset))
    }
}
