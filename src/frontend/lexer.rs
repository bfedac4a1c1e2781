use crate::diagnostics::{Diagnostic, DiagnosticSink, FileId, Span};

/// Reserved keywords recognised by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Package,
    Import,
    Interface,
    Parcelable,
    Oneway,
    In,
    Out,
    Inout,
    Void,
}

impl Keyword {
    #[must_use]
    pub fn from_ident(ident: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find_map(|(name, keyword)| (*name == ident).then_some(*keyword))
    }
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("package", Keyword::Package),
    ("import", Keyword::Import),
    ("interface", Keyword::Interface),
    ("parcelable", Keyword::Parcelable),
    ("oneway", Keyword::Oneway),
    ("in", Keyword::In),
    ("out", Keyword::Out),
    ("inout", Keyword::Inout),
    ("void", Keyword::Void),
];

/// Token emitted by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

/// Token categories understood by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Integer,
    Keyword(Keyword),
    Punctuation(char),
    Comment,
    Whitespace,
    Unknown(char),
}

/// Result of lexing a source string.
#[derive(Debug, Default)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
    pub file_id: FileId,
}

/// Lex an entire source string.
#[must_use]
pub fn lex(source: &str) -> LexOutput {
    lex_with_file(source, FileId::UNKNOWN)
}

/// Lex an entire source string with a known file id.
#[must_use]
pub fn lex_with_file(source: &str, file_id: FileId) -> LexOutput {
    let mut lexer = Lexer::new(source, file_id);
    lexer.lex_all();
    lexer.finish()
}

struct Lexer<'a> {
    source: &'a str,
    iter: core::str::CharIndices<'a>,
    lookahead: Option<(usize, char)>,
    tokens: Vec<Token>,
    diagnostics: DiagnosticSink,
    file_id: FileId,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str, file_id: FileId) -> Self {
        let mut iter = source.char_indices();
        let lookahead = iter.next();
        Self {
            source,
            iter,
            lookahead,
            tokens: Vec::new(),
            diagnostics: DiagnosticSink::new("LEX"),
            file_id,
        }
    }

    fn finish(self) -> LexOutput {
        let Lexer {
            tokens,
            diagnostics,
            file_id,
            ..
        } = self;
        LexOutput {
            tokens,
            diagnostics: diagnostics.into_vec(),
            file_id,
        }
    }

    fn lex_all(&mut self) {
        while let Some((start, ch)) = self.lookahead {
            match ch {
                c if c.is_ascii_whitespace() => {
                    self.consume_whitespace(start);
                }
                c if is_identifier_start(c) => {
                    self.consume_identifier(start);
                }
                c if c.is_ascii_digit() => {
                    self.consume_integer(start);
                }
                '/' => {
                    self.consume_slash(start);
                }
                ';' | '{' | '}' | '(' | ')' | ',' | '<' | '>' | '=' | '[' | ']' | '.' | '-' => {
                    self.emit_single_char_token(start, ch, TokenKind::Punctuation(ch));
                    self.bump();
                }
                _ => {
                    self.diagnostics.push_error(
                        format!("unexpected character '{ch}'"),
                        Some(Span::new(self.file_id, start, start + ch.len_utf8())),
                    );
                    self.emit_single_char_token(start, ch, TokenKind::Unknown(ch));
                    self.bump();
                }
            }
        }
    }

    fn bump(&mut self) {
        self.lookahead = self.iter.next();
    }

    fn slice(&self, start: usize, end: usize) -> &str {
        &self.source[start..end]
    }

    fn emit(&mut self, start: usize, end: usize, kind: TokenKind) {
        self.tokens.push(Token {
            kind,
            lexeme: self.slice(start, end).to_string(),
            span: Span::new(self.file_id, start, end),
        });
    }

    fn emit_single_char_token(&mut self, start: usize, ch: char, kind: TokenKind) {
        let end = start + ch.len_utf8();
        self.tokens.push(Token {
            kind,
            lexeme: ch.to_string(),
            span: Span::new(self.file_id, start, end),
        });
    }

    fn consume_whitespace(&mut self, start: usize) {
        let mut end = start;
        while let Some((idx, ch)) = self.lookahead {
            if ch.is_ascii_whitespace() {
                end = idx + ch.len_utf8();
                self.bump();
            } else {
                break;
            }
        }
        self.emit(start, end, TokenKind::Whitespace);
    }

    fn consume_identifier(&mut self, start: usize) {
        let mut end = start;
        while let Some((idx, ch)) = self.lookahead {
            if is_identifier_continue(ch) {
                end = idx + ch.len_utf8();
                self.bump();
            } else {
                break;
            }
        }
        let ident = self.slice(start, end);
        let kind = match Keyword::from_ident(ident) {
            Some(keyword) => TokenKind::Keyword(keyword),
            None => TokenKind::Identifier,
        };
        self.emit(start, end, kind);
    }

    fn consume_integer(&mut self, start: usize) {
        let mut end = start;
        while let Some((idx, ch)) = self.lookahead {
            if ch.is_ascii_digit() {
                end = idx + ch.len_utf8();
                self.bump();
            } else {
                break;
            }
        }
        self.emit(start, end, TokenKind::Integer);
    }

    fn consume_slash(&mut self, start: usize) {
        self.bump();
        match self.lookahead {
            Some((_, '/')) => {
                let mut end = start + 2;
                self.bump();
                while let Some((idx, ch)) = self.lookahead {
                    if ch == '\n' {
                        break;
                    }
                    end = idx + ch.len_utf8();
                    self.bump();
                }
                self.emit(start, end, TokenKind::Comment);
            }
            Some((_, '*')) => {
                // Block comments do not nest; the first `*/` closes.
                self.bump();
                let mut end = start + 2;
                let mut last_char = '\0';
                while let Some((idx, ch)) = self.lookahead {
                    end = idx + ch.len_utf8();
                    self.bump();
                    if last_char == '*' && ch == '/' {
                        self.emit(start, end, TokenKind::Comment);
                        return;
                    }
                    last_char = ch;
                }
                self.diagnostics.push_error(
                    "unterminated block comment",
                    Some(Span::new(self.file_id, start, end)),
                );
                self.emit(start, end, TokenKind::Comment);
            }
            _ => {
                self.diagnostics.push_error(
                    "unexpected character '/'",
                    Some(Span::new(self.file_id, start, start + 1)),
                );
                self.emit_single_char_token(start, '/', TokenKind::Unknown('/'));
            }
        }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn significant(output: &LexOutput) -> Vec<&Token> {
        output
            .tokens
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Whitespace | TokenKind::Comment))
            .collect()
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let output = lex("package com.x; interface IEcho");
        let tokens = significant(&output);
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Package));
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].lexeme, "com");
        assert_eq!(tokens[2].kind, TokenKind::Punctuation('.'));
        assert_eq!(tokens[5].kind, TokenKind::Keyword(Keyword::Interface));
        assert_eq!(tokens[6].lexeme, "IEcho");
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn keywords_are_case_sensitive() {
        let output = lex("Interface Oneway");
        assert!(
            significant(&output)
                .iter()
                .all(|t| matches!(t.kind, TokenKind::Identifier))
        );
    }

    #[test]
    fn lexes_integer_literals() {
        let output = lex("void a() = 16777214;");
        let literal = output
            .tokens
            .iter()
            .find(|t| matches!(t.kind, TokenKind::Integer))
            .expect("integer token");
        assert_eq!(literal.lexeme, "16777214");
    }

    #[test]
    fn line_comments_run_to_end_of_line() {
        let output = lex("// header\ninterface IFoo");
        let tokens = significant(&output);
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Interface));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn block_comments_do_not_nest() {
        let output = lex("/* outer /* inner */ interface IFoo");
        let tokens = significant(&output);
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Interface));
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn unterminated_block_comment_is_reported() {
        let output = lex("/* never closed");
        assert_eq!(output.diagnostics.len(), 1);
        assert!(output.diagnostics[0].message.contains("unterminated"));
    }

    #[test]
    fn unexpected_characters_are_reported() {
        let output = lex("interface I$Bad");
        assert!(
            output
                .diagnostics
                .iter()
                .any(|d| d.message.contains("unexpected character '$'"))
        );
    }
}
