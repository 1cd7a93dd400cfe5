//! Comparisons (spec.md §4.7): `cmp`+`set{cc}` for integers, with the
//! condition-code suffix chosen by the operand type's signedness;
//! `ucomisd`+`set{cc}` for doubles, using the same suffixes SSE's unordered
//! compare sets flags for (unsigned-style, since `ucomisd` is not a signed
//! comparison).
//!
//! The comparison's own `ty` field carries the promoted operand type, not
//! the bool result type, so the destination is always stored as a single
//! byte regardless of that field's size.

use crate::tac::{TacInstruction, TacOp};

use super::arithmetic::size_suffix;
use super::error::CodeGenError;
use super::state::{Assembler, asmln};

impl Assembler {
    pub(super) fn emit_compare(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let cc = if instr.ty.is_floating() {
            self.load_double(&instr.arg1, "xmm0")?;
            self.load_double(&instr.arg2, "xmm1")?;
            asmln!(self, "\tucomisd %xmm1, %xmm0")?;
            unordered_cc(instr.op)
        } else {
            self.load_int(&instr.arg1, &instr.ty, "rax")?;
            self.load_int(&instr.arg2, &instr.ty, "r10")?;
            let size = instr.ty.size().max(1);
            let rax = Self::int_reg("rax", size);
            let r10 = Self::int_reg("r10", size);
            asmln!(self, "\tcmp{} {r10}, {rax}", size_suffix(size))?;
            if instr.ty.is_signed() { signed_cc(instr.op) } else { unordered_cc(instr.op) }
        };
        asmln!(self, "\tset{cc} %al")?;
        asmln!(self, "\tmovzbl %al, %eax")?;
        let dst = self.operand_text(&instr.result);
        asmln!(self, "\tmovb %al, {dst}")
    }
}

fn signed_cc(op: TacOp) -> &'static str {
    match op {
        TacOp::Eq => "e",
        TacOp::Ne => "ne",
        TacOp::Lt => "l",
        TacOp::Le => "le",
        TacOp::Gt => "g",
        TacOp::Ge => "ge",
        _ => unreachable!("emit_compare only handles Eq/Ne/Lt/Le/Gt/Ge"),
    }
}

/// Unsigned integer comparisons and `ucomisd`-based double comparisons
/// share the same condition codes: both set flags the same way a carry-based
/// (rather than sign-based) comparison would.
fn unordered_cc(op: TacOp) -> &'static str {
    match op {
        TacOp::Eq => "e",
        TacOp::Ne => "ne",
        TacOp::Lt => "b",
        TacOp::Le => "be",
        TacOp::Gt => "a",
        TacOp::Ge => "ae",
        _ => unreachable!("emit_compare only handles Eq/Ne/Lt/Le/Gt/Ge"),
    }
}
