//! Frame layout and the `FUNC_BEGIN`/`FUNC_END` prologue/epilogue (spec.md
//! §4.7, testable property "stack frame alignment").

use crate::tac::{Operand, TacInstruction};

use super::error::CodeGenError;
use super::state::{Local, asmln};
use super::state::Assembler;

impl Assembler {
    /// Scan one function's body (the slice strictly between `FuncBegin` and
    /// its matching `FuncEnd`) for every local name, assigning each a stack
    /// slot sized by the type carried at its first appearance. Parameters
    /// are discovered the same way, via `BindParam`; a `Nop` with the
    /// declared type is emitted ahead of every `VarDecl` so array locals
    /// get their full size even though later element stores only carry the
    /// element type.
    pub(super) fn layout_function(&mut self, body: &[TacInstruction]) {
        self.locals.clear();
        let mut offset: i64 = 0;
        for instr in body {
            for operand in [&instr.arg1, &instr.arg2, &instr.result] {
                let Operand::Name(name) = operand else { continue };
                if self.globals.contains_key(name) || is_quoted_string(name) {
                    continue;
                }
                if self.locals.contains_key(name) {
                    continue;
                }
                let size = instr.ty.size().max(1) as i64;
                let align = size.clamp(1, 8);
                offset -= size;
                offset -= offset.rem_euclid(align);
                self.locals.insert(name.clone(), Local { offset, ty: instr.ty.clone() });
            }
        }
        let raw = -offset;
        self.frame_size = (raw + 15) & !15;
    }

    pub(super) fn emit_func_begin(
        &mut self,
        name: &str,
        is_global: bool,
        body: &[TacInstruction],
    ) -> Result<(), CodeGenError> {
        self.current_function = name.to_string();
        self.layout_function(body);
        if is_global {
            asmln!(self, ".globl _{name}")?;
        }
        asmln!(self, "_{name}:")?;
        asmln!(self, "\tpushq %rbp")?;
        asmln!(self, "\tmovq %rsp, %rbp")?;
        if self.frame_size > 0 {
            asmln!(self, "\tsubq ${}, %rsp", self.frame_size)?;
        }
        Ok(())
    }

    pub(super) fn emit_func_end(&mut self, name: &str) -> Result<(), CodeGenError> {
        asmln!(self, ".L{name}_end:")?;
        if self.frame_size > 0 {
            asmln!(self, "\taddq ${}, %rsp", self.frame_size)?;
        }
        asmln!(self, "\tpopq %rbp")?;
        asmln!(self, "\tretq")?;
        Ok(())
    }
}

pub(super) fn is_quoted_string(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('"') && name.ends_with('"')
}

/// Strip the marker quotes `tac.rs` wraps a string literal's text in.
pub(super) fn unquote(name: &str) -> &str {
    &name[1..name.len() - 1]
}
