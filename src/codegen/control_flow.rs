//! `IF`/`IFNOT`/`GOTO`/`LABEL` lowering and `Return` (spec.md §4.7).
//!
//! Truthiness is uniform regardless of an integer's signedness: compare
//! against zero and branch on `jne`. Doubles go through `ucomisd` against
//! zero instead of an integer `cmp`, since `cmp` doesn't operate on `%xmm`
//! registers.

use crate::tac::{Operand, TacInstruction};
use crate::types::{BaseType, Type};

use super::error::CodeGenError;
use super::state::{Assembler, asmln};

impl Assembler {
    pub(super) fn emit_label(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let Operand::Label(label) = &instr.result else {
            return Err(CodeGenError::Logic("label instruction without a label".into()));
        };
        asmln!(self, "{label}:")
    }

    pub(super) fn emit_goto(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let Operand::Label(label) = &instr.result else {
            return Err(CodeGenError::Logic("goto without a target label".into()));
        };
        asmln!(self, "\tjmp {label}")
    }

    /// `If`/`IfNot` don't carry a reliable `ty` for their condition operand
    /// (tac.rs emits `Type::void()`), since the condition is evaluated deep
    /// inside expression codegen where the branch itself isn't built yet.
    /// The true type is recovered from the locals/globals tables instead of
    /// assumed, since loading a narrower stored value at a wider width would
    /// read uninitialized stack bytes above it.
    pub(super) fn emit_branch(&mut self, instr: &TacInstruction, jump_if_true: bool) -> Result<(), CodeGenError> {
        let Operand::Label(label) = &instr.result else {
            return Err(CodeGenError::Logic("conditional branch without a target label".into()));
        };
        let fallback = if matches!(instr.arg1, Operand::ImmFloat(_)) {
            Type::new(BaseType::Double)
        } else {
            Type::new(BaseType::Int)
        };
        let cond_ty = self.operand_type(&instr.arg1, &fallback);
        if cond_ty.is_floating() {
            self.load_double(&instr.arg1, "xmm0")?;
            asmln!(self, "\txorpd %xmm1, %xmm1")?;
            asmln!(self, "\tucomisd %xmm1, %xmm0")?;
        } else {
            let size = cond_ty.size().max(1);
            self.load_int(&instr.arg1, &cond_ty, "rax")?;
            asmln!(self, "\tcmp{} $0, {}", super::arithmetic::size_suffix(size), Self::int_reg("rax", size))?;
        }
        let mnemonic = if jump_if_true { "jne" } else { "je" };
        asmln!(self, "\t{mnemonic} {label}")
    }

    pub(super) fn emit_return(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        match &instr.arg1 {
            Operand::None => {}
            operand @ Operand::ImmFloat(_) => {
                self.load_double(operand, "xmm0")?;
            }
            operand => {
                let ty = self.operand_type(operand, &Type::new(BaseType::Int));
                if ty.is_floating() {
                    self.load_double(operand, "xmm0")?;
                } else {
                    self.load_int(operand, &ty, "rax")?;
                }
            }
        }
        let function = self.current_function.clone();
        asmln!(self, "\tjmp .L{function}_end")
    }
}
