//! Function calls and parameter binding (spec.md §4.7): the System V
//! six-integer/eight-SSE register calling convention, with overflow
//! arguments pushed on the stack, and the consumer side of `BindParam` at
//! function entry.
//!
//! Integer and SSE arguments are classified and numbered independently —
//! a `double` parameter doesn't consume an integer register slot. `tac.rs`
//! already counts parameters this way when it emits `BindParam`; `emit_call`
//! counts pushed arguments the same way so the two line up.

use crate::tac::{Operand, TacInstruction};

use super::error::CodeGenError;
use super::state::{Assembler, asmln};

const INT_REGS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];
const SSE_REGS: [&str; 8] = ["xmm0", "xmm1", "xmm2", "xmm3", "xmm4", "xmm5", "xmm6", "xmm7"];

impl Assembler {
    pub(super) fn emit_push(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        self.pending_args.push((instr.arg1.clone(), instr.ty.clone()));
        Ok(())
    }

    pub(super) fn emit_call(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let Operand::Name(func_name) = &instr.arg1 else {
            return Err(CodeGenError::Logic("call without a callee name".into()));
        };
        let Operand::ImmInt(argc) = instr.arg2 else {
            return Err(CodeGenError::Logic("call without an argument count".into()));
        };
        let argc = argc as usize;
        if self.pending_args.len() < argc {
            return Err(CodeGenError::Logic(format!(
                "call to {func_name} expected {argc} pushed argument(s), found {}",
                self.pending_args.len()
            )));
        }
        let split_at = self.pending_args.len() - argc;
        let args = self.pending_args.split_off(split_at);

        let mut stack_args = Vec::new();
        let mut int_slot = 0usize;
        let mut sse_slot = 0usize;
        for (operand, ty) in &args {
            if ty.is_floating() {
                if sse_slot < SSE_REGS.len() { sse_slot += 1 } else { stack_args.push((operand.clone(), ty.clone())) }
            } else if int_slot < INT_REGS.len() {
                int_slot += 1
            } else {
                stack_args.push((operand.clone(), ty.clone()))
            }
        }

        // Overflow arguments go on the stack, right-to-left, padded to keep
        // `%rsp` 16-byte aligned at the `call` instruction.
        let pad = stack_args.len() % 2 != 0;
        if pad {
            asmln!(self, "\tsubq $8, %rsp")?;
        }
        for (operand, ty) in stack_args.iter().rev() {
            if ty.is_floating() {
                self.load_double(operand, "xmm0")?;
                asmln!(self, "\tsubq $8, %rsp")?;
                asmln!(self, "\tmovsd %xmm0, (%rsp)")?;
            } else {
                self.load_int(operand, ty, "rax")?;
                asmln!(self, "\tpushq %rax")?;
            }
        }

        let mut int_slot = 0usize;
        let mut sse_slot = 0usize;
        for (operand, ty) in &args {
            if ty.is_floating() {
                if sse_slot < SSE_REGS.len() {
                    self.load_double(operand, SSE_REGS[sse_slot])?;
                    sse_slot += 1;
                }
            } else if int_slot < INT_REGS.len() {
                self.load_int(operand, ty, INT_REGS[int_slot])?;
                int_slot += 1;
            }
        }

        asmln!(self, "\tcall _{func_name}")?;

        let cleanup = stack_args.len() * 8 + if pad { 8 } else { 0 };
        if cleanup > 0 {
            asmln!(self, "\taddq ${cleanup}, %rsp")?;
        }

        if instr.ty.is_floating() {
            self.store_double("xmm0", &instr.result)
        } else if instr.ty.size() > 0 {
            self.store_int("rax", &instr.ty, &instr.result)
        } else {
            Ok(())
        }
    }

    /// Move an incoming argument register into its parameter's stack slot,
    /// right after the function prologue.
    pub(super) fn emit_bind_param(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let Operand::ImmInt(index) = instr.arg1 else {
            return Err(CodeGenError::Logic("parameter binding without a register index".into()));
        };
        let index = index as usize;
        if instr.ty.is_floating() {
            let reg = SSE_REGS.get(index).ok_or_else(|| {
                CodeGenError::Logic(format!("function takes more than {} double parameters", SSE_REGS.len()))
            })?;
            self.store_double(reg, &instr.result)
        } else {
            let reg = INT_REGS.get(index).ok_or_else(|| {
                CodeGenError::Logic(format!("function takes more than {} integer parameters", INT_REGS.len()))
            })?;
            self.store_int(reg, &instr.ty, &instr.result)
        }
    }
}
