//! Type conversions (spec.md §4.7): widen/truncate between the integral
//! types, and convert to/from `double`.
//!
//! `ConvertType`'s `ty` field is the destination type; the source type
//! isn't carried on the instruction itself, so it's recovered from the
//! source operand via [`Assembler::operand_type`] (the locals/globals
//! tables for a named operand, a reasonable default for a bare immediate).

use crate::tac::{Operand, TacInstruction};
use crate::types::{BaseType, Type};

use super::error::CodeGenError;
use super::state::{Assembler, asmln};

impl Assembler {
    pub(super) fn emit_convert(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let dest_ty = instr.ty.clone();
        let fallback_src = match &instr.arg1 {
            Operand::ImmFloat(_) => Type::new(BaseType::Double),
            _ => Type::new(BaseType::Int),
        };
        let src_ty = self.operand_type(&instr.arg1, &fallback_src);

        match (src_ty.is_floating(), dest_ty.is_floating()) {
            (false, true) => self.convert_int_to_double(instr, &src_ty),
            (true, false) => self.convert_double_to_int(instr, &dest_ty),
            (true, true) => {
                self.load_double(&instr.arg1, "xmm0")?;
                self.store_double("xmm0", &instr.result)
            }
            (false, false) => self.convert_int_to_int(instr, &src_ty, &dest_ty),
        }
    }

    /// Widen or truncate between the integral types. Widening a signed
    /// source sign-extends (`movsbl`/`movsbq`/`movslq`); widening an
    /// unsigned byte zero-extends (`movzbl`). Widening an unsigned 4-byte
    /// source needs no extra instruction: the 32-bit load that brought it
    /// into `%eax` already zeroed the upper half of `%rax`. Truncation is
    /// just storing the low bytes of the same register.
    fn convert_int_to_int(
        &mut self,
        instr: &TacInstruction,
        src_ty: &Type,
        dest_ty: &Type,
    ) -> Result<(), CodeGenError> {
        let src_size = src_ty.size().max(1);
        let dest_size = dest_ty.size().max(1);
        self.load_int(&instr.arg1, src_ty, "rax")?;
        if dest_size > src_size {
            if src_ty.is_signed() {
                match (src_size, dest_size) {
                    (1, 4) => asmln!(self, "\tmovsbl %al, %eax")?,
                    (1, 8) => asmln!(self, "\tmovsbq %al, %rax")?,
                    (4, 8) => asmln!(self, "\tmovslq %eax, %rax")?,
                    _ => {}
                }
            } else if src_size == 1 {
                asmln!(self, "\tmovzbl %al, %eax")?;
            }
        }
        self.store_int("rax", dest_ty, &instr.result)
    }

    /// `int`/`long` -> `double` via `cvtsi2sd`. An unsigned 4-byte source
    /// is widened into `%rax` first so the 64-bit conversion doesn't
    /// misread a value with the sign bit set as negative.
    fn convert_int_to_double(&mut self, instr: &TacInstruction, src_ty: &Type) -> Result<(), CodeGenError> {
        let src_size = src_ty.size().max(1);
        self.load_int(&instr.arg1, src_ty, "rax")?;
        if src_size == 8 || !src_ty.is_signed() {
            asmln!(self, "\tcvtsi2sd %rax, %xmm0")?;
        } else {
            asmln!(self, "\tcvtsi2sd %eax, %xmm0")?;
        }
        self.store_double("xmm0", &instr.result)
    }

    /// `double` -> `int`/`long` via the truncating `cvttsd2si`.
    fn convert_double_to_int(&mut self, instr: &TacInstruction, dest_ty: &Type) -> Result<(), CodeGenError> {
        self.load_double(&instr.arg1, "xmm0")?;
        let size = dest_ty.size().max(1);
        if size == 8 {
            asmln!(self, "\tcvttsd2si %xmm0, %rax")?;
        } else {
            asmln!(self, "\tcvttsd2si %xmm0, %eax")?;
        }
        self.store_int("rax", dest_ty, &instr.result)
    }
}
