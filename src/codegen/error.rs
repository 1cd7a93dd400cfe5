//! Code generation error type — re-exported from the shared top-level
//! error module so `CompileError::CodeGen` and this module speak of the
//! exact same type.

pub use crate::error::CodeGenError;
