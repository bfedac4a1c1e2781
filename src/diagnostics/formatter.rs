use serde::Serialize;

use super::{Diagnostic, FileCache, LineCol, Severity, Snippet, Span};

/// Rendering style for user-facing diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorFormat {
    Human,
    Short,
    Json,
}

impl ErrorFormat {
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.to_ascii_lowercase().as_str() {
            "human" => Some(Self::Human),
            "short" => Some(Self::Short),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FormatOptions {
    pub format: ErrorFormat,
    pub color: ColorMode,
    pub is_terminal: bool,
}

impl FormatOptions {
    #[must_use]
    pub fn use_color(self) -> bool {
        match self.color {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => self.is_terminal,
        }
    }
}

/// Render a collection of diagnostics to a single string.
#[must_use]
pub fn format_diagnostics(
    diagnostics: &[Diagnostic],
    files: &FileCache,
    options: FormatOptions,
) -> String {
    let mut rendered = String::new();
    let use_color = options.use_color();
    for (index, diagnostic) in diagnostics.iter().enumerate() {
        if index > 0 {
            rendered.push('\n');
        }
        let chunk = match options.format {
            ErrorFormat::Human => render_human(diagnostic, files, use_color),
            ErrorFormat::Short => render_short(diagnostic, files),
            ErrorFormat::Json => render_json(diagnostic, files),
        };
        rendered.push_str(&chunk);
    }
    rendered
}

fn render_human(diagnostic: &Diagnostic, files: &FileCache, color: bool) -> String {
    let mut out = String::new();
    let (path, location) = locate(diagnostic.span, files);
    out.push_str(&format_header(diagnostic, color));
    out.push('\n');
    out.push_str(&format_location_arrow(&path, location.as_ref()));
    if let Some(span) = diagnostic.span {
        out.push_str(&render_snippet(span, "", diagnostic.severity, files, color));
    }
    for related in &diagnostic.related {
        out.push_str(&render_snippet(
            related.span,
            &related.message,
            diagnostic.severity,
            files,
            color,
        ));
    }
    for note in &diagnostic.notes {
        out.push_str(&format!("\nnote: {note}"));
    }
    out
}

fn render_short(diagnostic: &Diagnostic, files: &FileCache) -> String {
    let (path, location) = locate(diagnostic.span, files);
    let severity = diagnostic.severity.as_str();
    let mut out = match location {
        Some(loc) => format!(
            "{}:{}:{}: {}: {}",
            path, loc.line, loc.column, severity, diagnostic.message
        ),
        None => format!("{}: {}", severity, diagnostic.message),
    };
    for related in &diagnostic.related {
        let (related_path, related_location) = locate(Some(related.span), files);
        if let Some(loc) = related_location {
            out.push_str(&format!(
                "\n{}:{}:{}: note: {}",
                related_path, loc.line, loc.column, related.message
            ));
        }
    }
    for note in &diagnostic.notes {
        out.push_str(&format!("\n    {note}"));
    }
    out
}

fn render_json(diagnostic: &Diagnostic, files: &FileCache) -> String {
    let payload = JsonDiagnostic {
        severity: diagnostic.severity.as_str().to_string(),
        code: diagnostic.code.clone(),
        message: diagnostic.message.clone(),
        span: diagnostic
            .span
            .and_then(|span| JsonSpan::from_span(span, files)),
        related: diagnostic
            .related
            .iter()
            .map(|related| JsonRelated {
                message: related.message.clone(),
                span: JsonSpan::from_span(related.span, files),
            })
            .collect(),
        notes: diagnostic.notes.clone(),
    };
    serde_json::to_string(&payload).unwrap_or_else(|_| "{}".into())
}

fn format_header(diagnostic: &Diagnostic, color: bool) -> String {
    let severity = diagnostic.severity.as_str();
    let prefix = if color {
        colorize(severity, severity_color(diagnostic.severity))
    } else {
        severity.to_string()
    };
    match diagnostic.code.as_deref() {
        Some(code) => format!("{prefix}[{code}]: {}", diagnostic.message),
        None => format!("{prefix}: {}", diagnostic.message),
    }
}

fn format_location_arrow(path: &str, loc: Option<&LineCol>) -> String {
    match loc {
        Some(loc) => format!("  --> {path}:{}:{}\n   |\n", loc.line, loc.column),
        None => format!("  --> {path}:?:?\n   |\n"),
    }
}

fn render_snippet(
    span: Span,
    message: &str,
    severity: Severity,
    files: &FileCache,
    color: bool,
) -> String {
    let Some(snippet) = files.get(span.file_id).and_then(|file| file.snippet(span)) else {
        return String::new();
    };
    let Snippet {
        line,
        text,
        caret_column,
        caret_len,
    } = snippet;
    let mut out = format!("{line:>4} | {text}\n");
    let mut caret_line = format!(
        "{:>4} | {}{}",
        "",
        " ".repeat(caret_column.saturating_sub(1)),
        "^".repeat(caret_len)
    );
    if !message.is_empty() {
        caret_line.push(' ');
        caret_line.push_str(message);
    }
    if color {
        out.push_str(&caret_line.replace('^', &colorize("^", severity_color(severity))));
        out.push('\n');
    } else {
        out.push_str(&caret_line);
        out.push('\n');
    }
    out
}

fn locate(span: Option<Span>, files: &FileCache) -> (String, Option<LineCol>) {
    if let Some(span) = span {
        if let Some(file) = files.get(span.file_id) {
            return (file.path.display().to_string(), file.line_col(span.start));
        }
    }
    ("<unknown>".into(), None)
}

fn colorize(value: &str, code: &str) -> String {
    format!("\u{1b}[{code}m{value}\u{1b}[0m")
}

fn severity_color(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "1;31",
        Severity::Warning => "1;33",
    }
}

#[derive(Serialize)]
struct JsonDiagnostic {
    severity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    span: Option<JsonSpan>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    related: Vec<JsonRelated>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
}

#[derive(Serialize)]
struct JsonSpan {
    file: String,
    start: usize,
    end: usize,
    line: usize,
    column: usize,
}

impl JsonSpan {
    fn from_span(span: Span, files: &FileCache) -> Option<Self> {
        let file = files.get(span.file_id)?;
        let loc = file.line_col(span.start)?;
        Some(Self {
            file: file.path.display().to_string(),
            start: span.start,
            end: span.end,
            line: loc.line,
            column: loc.column,
        })
    }
}

#[derive(Serialize)]
struct JsonRelated {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    span: Option<JsonSpan>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Diagnostic, FileId};
    use serde_json::Value;

    fn sample_file() -> (FileCache, Span) {
        let mut files = FileCache::default();
        let source = "package demo;\ninterface IBad { oneway int doit(); }\n";
        let file_id = files.add_file("IBad.aidl", source);
        let start = source.find("doit").expect("sample contains method name");
        let span = Span::new(file_id, start, start + 4);
        (files, span)
    }

    fn options(format: ErrorFormat) -> FormatOptions {
        FormatOptions {
            format,
            color: ColorMode::Never,
            is_terminal: false,
        }
    }

    #[test]
    fn short_format_prefixes_path_line_column() {
        let (files, span) = sample_file();
        let diagnostic =
            Diagnostic::error("oneway method 'doit' cannot return a value", Some(span));
        let rendered = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Short));
        let loc = files.line_col(span.file_id, span.start).expect("line/col");
        assert!(rendered.starts_with(&format!("IBad.aidl:{}:{}: error:", loc.line, loc.column)));
        assert!(rendered.contains("oneway method 'doit'"));
    }

    #[test]
    fn short_format_renders_related_locations_as_notes() {
        let (files, span) = sample_file();
        let diagnostic = Diagnostic::error("attempt to redefine method doit", Some(span))
            .with_related(span, "previously defined here");
        let rendered = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Short));
        assert!(rendered.contains("note: previously defined here"));
    }

    #[test]
    fn human_format_includes_snippet_and_caret() {
        let (files, span) = sample_file();
        let diagnostic = Diagnostic::error("method line", Some(span));
        let rendered = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Human));
        assert!(rendered.contains("--> IBad.aidl:2:"));
        assert!(rendered.contains("oneway int doit();"));
        assert!(rendered.contains("^^^^"));
    }

    #[test]
    fn missing_files_render_without_locations() {
        let files = FileCache::default();
        let span = Span::new(FileId::UNKNOWN, 0, 1);
        let diagnostic = Diagnostic::error("can't open preprocessed file: pre.txt", Some(span));
        let rendered = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Short));
        assert_eq!(
            rendered,
            "error: can't open preprocessed file: pre.txt"
        );
    }

    #[test]
    fn json_format_emits_structured_payload() {
        let (files, span) = sample_file();
        let mut diagnostic = Diagnostic::error("unknown type Foo", Some(span));
        diagnostic.add_note("did you forget an import?");
        let rendered = format_diagnostics(&[diagnostic], &files, options(ErrorFormat::Json));
        let value: Value = serde_json::from_str(&rendered).expect("valid json diagnostic");
        assert_eq!(value["severity"], "error");
        assert_eq!(value["message"], "unknown type Foo");
        assert_eq!(value["span"]["file"], "IBad.aidl");
        assert_eq!(value["span"]["line"], 2);
        assert_eq!(value["notes"][0], "did you forget an import?");
    }
}
