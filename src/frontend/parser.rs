use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::Path;

use crate::diagnostics::{Diagnostic, DiagnosticSink, FileCache, FileId, SourceFile, Span};
use crate::frontend::ast::{
    Argument, Declaration, Direction, Import, Interface, Method, Parcelable, TypeRef,
    TypeResolution,
};
use crate::frontend::lexer::{Keyword, Token, TokenKind, lex_with_file};
use crate::io_delegate::IoDelegate;

/// Resulting declaration and diagnostics from parsing one source file.
///
/// Imports are surfaced even when the declaration body fails to parse, so the
/// driver can still reason about the build graph.
#[derive(Debug)]
pub struct ParseResult {
    pub document: Option<Declaration>,
    pub imports: Vec<Import>,
    pub diagnostics: Vec<Diagnostic>,
    pub file_id: FileId,
}

impl ParseResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.document.is_none()
            || self
                .diagnostics
                .iter()
                .any(|diagnostic| diagnostic.severity.is_error())
    }
}

/// Fatal parse error preventing further compilation.
#[derive(Debug)]
pub struct ParseError {
    message: String,
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            message: message.into(),
            diagnostics,
        }
    }

    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for ParseError {}

/// Read and parse a source file through the I/O delegate.
///
/// # Errors
/// Returns the underlying I/O error when the file cannot be read; syntax
/// problems are reported through the result's diagnostics instead.
pub fn parse_file(
    path: &Path,
    io: &dyn IoDelegate,
    files: &mut FileCache,
) -> io::Result<ParseResult> {
    let source = io.read_text(path)?;
    Ok(parse_source(path, &source, files))
}

/// Parse an in-memory source string, registering it with the file cache.
pub fn parse_source(path: &Path, source: &str, files: &mut FileCache) -> ParseResult {
    let file_id = files.add_file(path, source);
    let lex_output = lex_with_file(source, file_id);
    let Some(file) = files.get(file_id) else {
        // The file was just registered; this only guards cache misuse.
        return ParseResult {
            document: None,
            imports: Vec::new(),
            diagnostics: lex_output.diagnostics,
            file_id,
        };
    };
    let mut parser = Parser::new(file, lex_output.tokens, file_id);
    parser.diagnostics.extend(lex_output.diagnostics);
    let document = parser.parse_document();
    let Parser {
        imports,
        diagnostics,
        ..
    } = parser;
    ParseResult {
        document,
        imports,
        diagnostics: diagnostics.into_vec(),
        file_id,
    }
}

struct Parser<'s> {
    file: &'s SourceFile,
    file_id: FileId,
    tokens: Vec<Token>,
    index: usize,
    imports: Vec<Import>,
    diagnostics: DiagnosticSink,
}

impl<'s> Parser<'s> {
    fn new(file: &'s SourceFile, tokens: Vec<Token>, file_id: FileId) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|token| !matches!(token.kind, TokenKind::Whitespace | TokenKind::Comment))
            .collect();
        Self {
            file,
            file_id,
            tokens,
            index: 0,
            imports: Vec::new(),
            diagnostics: DiagnosticSink::new("PARSE"),
        }
    }

    fn parse_document(&mut self) -> Option<Declaration> {
        let package = self.parse_package_clause();
        self.parse_import_clauses();
        let declaration = self.parse_declaration(package)?;
        if !self.is_at_end() {
            let span = self.peek().map(|token| token.span);
            self.push_error(
                "expected end of file after the top-level declaration",
                span,
            );
        }
        Some(declaration)
    }

    fn parse_package_clause(&mut self) -> Vec<String> {
        if !self.match_keyword(Keyword::Package) {
            return Vec::new();
        }
        let Some((name, _)) = self.parse_qualified_name("expected package name") else {
            return Vec::new();
        };
        self.expect_punctuation(';');
        name.split('.').map(str::to_string).collect()
    }

    fn parse_import_clauses(&mut self) {
        while self.match_keyword(Keyword::Import) {
            let Some((needed_class, span)) =
                self.parse_qualified_name("expected class name after 'import'")
            else {
                self.recover_past(';');
                continue;
            };
            self.expect_punctuation(';');
            self.imports.push(Import {
                needed_class,
                file_from: self.file.path.clone(),
                line: self.line_at(span.start),
                span: Some(span),
                resolved_path: None,
            });
        }
    }

    fn parse_declaration(&mut self, package: Vec<String>) -> Option<Declaration> {
        let oneway = self.match_keyword(Keyword::Oneway);
        if self.match_keyword(Keyword::Interface) {
            return self
                .parse_interface(package, oneway)
                .map(Declaration::Interface);
        }
        if self.match_keyword(Keyword::Parcelable) {
            if oneway {
                let span = self.peek().map(|token| token.span);
                self.push_error("'oneway' is only valid on interfaces", span);
            }
            return self.parse_parcelable(package).map(Declaration::Parcelable);
        }
        let span = self.peek().map(|token| token.span);
        self.push_error("expected 'interface' or 'parcelable' declaration", span);
        None
    }

    fn parse_parcelable(&mut self, package: Vec<String>) -> Option<Parcelable> {
        let (name, span) = self.consume_identifier("expected parcelable name")?;
        self.expect_punctuation(';');
        Some(Parcelable {
            name,
            package,
            line: self.line_at(span.start),
            span: Some(span),
        })
    }

    fn parse_interface(&mut self, package: Vec<String>, oneway: bool) -> Option<Interface> {
        let (name, span) = self.consume_identifier("expected interface name")?;
        if !self.expect_punctuation('{') {
            return None;
        }
        let mut methods = Vec::new();
        while !self.is_at_end() && !self.check_punctuation('}') {
            match self.parse_method() {
                Some(method) => methods.push(method),
                None => self.recover_past(';'),
            }
        }
        self.expect_punctuation('}');
        Some(Interface {
            name,
            package,
            line: self.line_at(span.start),
            span: Some(span),
            oneway,
            methods,
        })
    }

    fn parse_method(&mut self) -> Option<Method> {
        let oneway = self.match_keyword(Keyword::Oneway);
        let return_type = self.parse_type()?;
        let (name, span) = self.consume_identifier("expected method name")?;
        if !self.expect_punctuation('(') {
            return None;
        }
        let mut arguments = Vec::new();
        if !self.check_punctuation(')') {
            loop {
                arguments.push(self.parse_argument()?);
                if !self.consume_punctuation(',') {
                    break;
                }
            }
        }
        if !self.expect_punctuation(')') {
            return None;
        }
        let id = if self.consume_punctuation('=') {
            Some(self.parse_method_id()?)
        } else {
            None
        };
        self.expect_punctuation(';');
        Some(Method {
            name,
            return_type,
            arguments,
            id,
            oneway,
            line: self.line_at(span.start),
            span: Some(span),
        })
    }

    fn parse_method_id(&mut self) -> Option<i64> {
        let negative = self.consume_punctuation('-');
        match self.peek().cloned() {
            Some(token) if token.kind == TokenKind::Integer => {
                self.advance();
                match token.lexeme.parse::<i64>() {
                    Ok(value) => Some(if negative { -value } else { value }),
                    Err(_) => {
                        self.push_error("method id literal is too large", Some(token.span));
                        None
                    }
                }
            }
            other => {
                let span = other.map(|token| token.span);
                self.push_error("expected integer method id after '='", span);
                None
            }
        }
    }

    fn parse_argument(&mut self) -> Option<Argument> {
        let direction = if self.match_keyword(Keyword::In) {
            Direction::In
        } else if self.match_keyword(Keyword::Out) {
            Direction::Out
        } else if self.match_keyword(Keyword::Inout) {
            Direction::Inout
        } else {
            Direction::In
        };
        let ty = self.parse_type()?;
        let (name, span) = self.consume_identifier("expected argument name")?;
        Some(Argument {
            name,
            ty,
            direction,
            line: self.line_at(span.start),
            span: Some(span),
        })
    }

    fn parse_type(&mut self) -> Option<TypeRef> {
        let (name, span) = self.parse_type_name()?;
        let mut is_array = false;
        let mut end = span.end;
        if self.consume_punctuation('[') {
            if self.expect_punctuation(']') {
                is_array = true;
                end += 2;
            } else {
                return None;
            }
        }
        Some(TypeRef {
            name,
            is_array,
            line: self.line_at(span.start),
            span: Some(Span::new(self.file_id, span.start, end)),
            resolution: TypeResolution::Unresolved,
        })
    }

    /// Parse a possibly generic type name into its canonical spelling,
    /// e.g. `Map<String,int>`.
    fn parse_type_name(&mut self) -> Option<(String, Span)> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::Keyword(Keyword::Void) {
                let span = token.span;
                self.advance();
                return Some(("void".to_string(), span));
            }
        }
        let (base, span) = self.parse_qualified_name("expected type name")?;
        if !self.check_punctuation('<') {
            return Some((base, span));
        }
        self.advance();
        let mut parameters = Vec::new();
        loop {
            let (parameter, _) = self.parse_type_name()?;
            parameters.push(parameter);
            if !self.consume_punctuation(',') {
                break;
            }
        }
        let end = self
            .peek()
            .map(|token| token.span.end)
            .unwrap_or(span.end);
        if !self.expect_punctuation('>') {
            return None;
        }
        Some((
            format!("{}<{}>", base, parameters.join(",")),
            Span::new(self.file_id, span.start, end),
        ))
    }

    fn parse_qualified_name(&mut self, message: &str) -> Option<(String, Span)> {
        let (first, mut span) = self.consume_identifier(message)?;
        let mut parts = vec![first];
        while self.check_punctuation('.') {
            self.advance();
            let (part, part_span) = self.consume_identifier("expected identifier after '.'")?;
            parts.push(part);
            span = Span::new(self.file_id, span.start, part_span.end);
        }
        Some((parts.join("."), span))
    }

    fn consume_identifier(&mut self, message: &str) -> Option<(String, Span)> {
        match self.peek() {
            Some(token) if matches!(token.kind, TokenKind::Identifier) => {
                let lexeme = token.lexeme.clone();
                let span = token.span;
                self.advance();
                Some((lexeme, span))
            }
            Some(token) => {
                let span = token.span;
                self.push_error(message, Some(span));
                None
            }
            None => {
                self.push_error(message, None);
                None
            }
        }
    }

    fn expect_punctuation(&mut self, expected: char) -> bool {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Punctuation(expected) => {
                self.advance();
                true
            }
            Some(token) => {
                let span = token.span;
                self.push_error(format!("expected '{expected}'"), Some(span));
                false
            }
            None => {
                self.push_error(format!("expected '{expected}'"), None);
                false
            }
        }
    }

    fn consume_punctuation(&mut self, expected: char) -> bool {
        if self.check_punctuation(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check_punctuation(&self, expected: char) -> bool {
        self.peek()
            .is_some_and(|token| token.kind == TokenKind::Punctuation(expected))
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek()
            .is_some_and(|token| token.kind == TokenKind::Keyword(keyword))
    }

    fn match_keyword(&mut self, keyword: Keyword) -> bool {
        if self.check_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip tokens until just past the next `terminator`, stopping early at a
    /// closing brace so an unterminated method cannot swallow the interface.
    fn recover_past(&mut self, terminator: char) {
        while let Some(token) = self.peek() {
            if token.kind == TokenKind::Punctuation('}') {
                return;
            }
            let done = token.kind == TokenKind::Punctuation(terminator);
            self.advance();
            if done {
                return;
            }
        }
    }

    fn is_at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.index);
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn line_at(&self, offset: usize) -> usize {
        self.file.line_col(offset).map_or(1, |loc| loc.line)
    }

    fn push_error(&mut self, message: impl Into<String>, span: Option<Span>) {
        self.diagnostics.push_error(message, span);
    }
}
