//! Whole-program compiler for a small statically-typed C-like language,
//! emitting x86-64 assembly text for the macOS System V ABI.
//!
//! The pipeline is a straight line through the modules below: source text
//! in, assembly text out, one stage's output feeding the next's input with
//! no back-edges.

pub mod ast;
pub mod codegen;
pub mod config;
pub mod error;
pub mod global_symtab;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod symtab;
pub mod tac;
pub mod types;

pub use codegen::{CodeGenError, assemble};
pub use config::{CompilerConfig, Target};
pub use error::{CompileError, LexError, ParseError, SemanticError, SourceLocation, Stage};
pub use lexer::{Lexer, Token};
pub use parser::Parser;
pub use semantic::SemanticAnalyzer;
pub use tac::{TacGenerator, TacInstruction};
pub use types::Type;

use std::fs;
use std::path::Path;

/// Run the full pipeline over source text already in memory: parse, analyze,
/// lower to three-address code, assemble. Returns the generated assembly
/// text (spec.md §6).
pub fn compile_source(source: &str) -> Result<String, CompileError> {
    let mut program = Parser::parse(source)?;
    let mut globals = SemanticAnalyzer::new().analyze(&mut program)?;
    let instructions = TacGenerator::new(&mut globals).generate(&program)?;
    let asm = codegen::assemble(&instructions)?;
    Ok(asm)
}

/// Read `input`, compile it, and write the resulting assembly text to
/// `output` (spec.md §6).
pub fn compile_file(input: &Path, output: &Path) -> Result<(), CompileError> {
    compile_file_with_config(input, output, &CompilerConfig::new())
}

/// Same as [`compile_file`], but threaded through a [`CompilerConfig`]. This
/// is the entry point `main.rs` actually calls, the way `crates/compiler`'s
/// CLI calls `compile_file_with_config` instead of the config-free wrapper.
pub fn compile_file_with_config(
    input: &Path,
    output: &Path,
    config: &CompilerConfig,
) -> Result<(), CompileError> {
    match config.target {
        Target::MacosX86_64 => {}
    }
    let source = fs::read_to_string(input)?;
    let asm = compile_source(&source)?;
    fs::write(output, &asm)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_trivial_program_to_assembly_text() {
        let asm = compile_source("fn main() -> int { return 0; }").expect("compilation should succeed");
        assert!(asm.contains("_main:"));
        assert!(asm.contains("retq"));
    }

    #[test]
    fn reports_a_parse_error_with_its_source_location() {
        let err = compile_source("fn main() -> int { return \"unterminated; }").unwrap_err();
        assert!(matches!(err, CompileError::Parse(_)));
        assert!(err.location().is_some());
    }

    #[test]
    fn reports_a_semantic_error_for_an_undeclared_name() {
        let err = compile_source("fn main() -> int { return undeclared; }").unwrap_err();
        assert!(matches!(err, CompileError::Semantic(_)));
    }

    #[test]
    fn compile_file_defaults_to_a_quiet_macos_config() {
        let dir = tempfile::tempdir().expect("tempdir should be creatable");
        let input_path = dir.path().join("prog.mc");
        let output_path = dir.path().join("prog.s");
        fs::write(&input_path, "fn main() -> int { return 0; }").unwrap();

        compile_file(&input_path, &output_path).expect("file compilation should succeed");

        let asm = fs::read_to_string(&output_path).unwrap();
        assert!(asm.contains("_main:"));
    }
}
