//! Shared error plumbing for the compiler pipeline.
//!
//! Each stage owns a narrow error type (`LexError`, `ParseError`,
//! `SemanticError`, `CodeGenError`); this module ties them together into one
//! `CompileError` that the driver can match on and report uniformly.

use std::fmt;

/// A source position, 1-indexed for user-facing display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        SourceLocation { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub loc: SourceLocation,
    pub message: String,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl std::error::Error for LexError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub loc: SourceLocation,
    pub message: String,
}

impl ParseError {
    pub fn new(loc: SourceLocation, message: impl Into<String>) -> Self {
        ParseError {
            loc,
            message: message.into(),
        }
    }

    pub fn expected(loc: SourceLocation, expected: &str, found: &str) -> Self {
        ParseError::new(loc, format!("expected {expected}, found '{found}'"))
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl std::error::Error for ParseError {}

#[derive(Debug, Clone, PartialEq)]
pub struct SemanticError {
    pub loc: SourceLocation,
    pub message: String,
}

impl SemanticError {
    pub fn new(loc: SourceLocation, message: impl Into<String>) -> Self {
        SemanticError {
            loc,
            message: message.into(),
        }
    }
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
impl std::error::Error for SemanticError {}

/// Error raised during assembly emission. This is the only stage that also
/// has a legitimate non-fatal path (see `CodeGen::emit_instruction`'s
/// handling of an unrecognized TAC op), so this type exists mostly to
/// propagate genuine internal-compiler-error conditions (a TAC shape the
/// assembler was not built to expect) and `std::fmt::Write` failures.
#[derive(Debug)]
pub enum CodeGenError {
    Logic(String),
    Format(std::fmt::Error),
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::Logic(s) => write!(f, "{}", s),
            CodeGenError::Format(e) => write!(f, "assembly emission error: {}", e),
        }
    }
}
impl std::error::Error for CodeGenError {}

impl From<String> for CodeGenError {
    fn from(s: String) -> Self {
        CodeGenError::Logic(s)
    }
}
impl From<std::fmt::Error> for CodeGenError {
    fn from(e: std::fmt::Error) -> Self {
        CodeGenError::Format(e)
    }
}

/// The stage a `CompileError` originated in, used only for the
/// `Error at line L, column C: <Stage>: <message>` rendering in §7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lexer,
    Parser,
    Semantic,
    CodeGen,
    Io,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Lexer => "Lexer",
            Stage::Parser => "Parser",
            Stage::Semantic => "Semantic",
            Stage::CodeGen => "CodeGen",
            Stage::Io => "IO",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug)]
pub enum CompileError {
    Lex(LexError),
    Parse(ParseError),
    Semantic(SemanticError),
    CodeGen(CodeGenError),
    Io(std::io::Error),
}

impl CompileError {
    pub fn stage(&self) -> Stage {
        match self {
            CompileError::Lex(_) => Stage::Lexer,
            CompileError::Parse(_) => Stage::Parser,
            CompileError::Semantic(_) => Stage::Semantic,
            CompileError::CodeGen(_) => Stage::CodeGen,
            CompileError::Io(_) => Stage::Io,
        }
    }

    pub fn location(&self) -> Option<SourceLocation> {
        match self {
            CompileError::Lex(e) => Some(e.loc),
            CompileError::Parse(e) => Some(e.loc),
            CompileError::Semantic(e) => Some(e.loc),
            CompileError::CodeGen(_) | CompileError::Io(_) => None,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location() {
            Some(loc) => write!(f, "Error at {}: {}: {}", loc, self.stage(), self.inner_message()),
            None => write!(f, "Error: {}: {}", self.stage(), self.inner_message()),
        }
    }
}

impl CompileError {
    fn inner_message(&self) -> String {
        match self {
            CompileError::Lex(e) => e.message.clone(),
            CompileError::Parse(e) => e.message.clone(),
            CompileError::Semantic(e) => e.message.clone(),
            CompileError::CodeGen(e) => e.to_string(),
            CompileError::Io(e) => e.to_string(),
        }
    }
}

impl std::error::Error for CompileError {}

impl From<LexError> for CompileError {
    fn from(e: LexError) -> Self {
        CompileError::Lex(e)
    }
}
impl From<ParseError> for CompileError {
    fn from(e: ParseError) -> Self {
        CompileError::Parse(e)
    }
}
impl From<SemanticError> for CompileError {
    fn from(e: SemanticError) -> Self {
        CompileError::Semantic(e)
    }
}
impl From<CodeGenError> for CompileError {
    fn from(e: CodeGenError) -> Self {
        CompileError::CodeGen(e)
    }
}
impl From<std::io::Error> for CompileError {
    fn from(e: std::io::Error) -> Self {
        CompileError::Io(e)
    }
}
