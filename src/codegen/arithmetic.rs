//! Integer and double arithmetic (spec.md §4.7): integers via
//! `%rax`/`%r10`, doubles via `%xmm0`/`%xmm1`, signed/unsigned `imul`/`mul`
//! and `idiv`/`div` selection, testable by the "signedness of division"
//! property (spec.md §8).

use crate::tac::{TacInstruction, TacOp};

use super::error::CodeGenError;
use super::state::{Assembler, asmln};

impl Assembler {
    pub(super) fn emit_binary(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        if instr.ty.is_floating() {
            return self.emit_double_binary(instr);
        }
        match instr.op {
            TacOp::Div | TacOp::Mod => self.emit_int_divmod(instr),
            _ => self.emit_int_binary(instr),
        }
    }

    fn emit_int_binary(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        self.load_int(&instr.arg1, &instr.ty, "rax")?;
        self.load_int(&instr.arg2, &instr.ty, "r10")?;
        let size = instr.ty.size().max(1);
        let rax = Self::int_reg("rax", size);
        let r10 = Self::int_reg("r10", size);
        let suffix = size_suffix(size);
        let base = match instr.op {
            TacOp::Add => "add",
            TacOp::Sub => "sub",
            TacOp::Mul if instr.ty.is_signed() => "imul",
            TacOp::Mul => "mul",
            _ => unreachable!("covered by emit_binary's dispatch"),
        };
        asmln!(self, "\t{base}{suffix} {r10}, {rax}")?;
        self.store_int("rax", &instr.ty, &instr.result)
    }

    fn emit_int_divmod(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let size = instr.ty.size().max(4);
        self.load_int(&instr.arg1, &instr.ty, "rax")?;
        self.load_int(&instr.arg2, &instr.ty, "r10")?;
        if instr.ty.is_signed() {
            if size == 8 {
                asmln!(self, "\tcqto")?;
            } else {
                asmln!(self, "\tcdq")?;
            }
        } else {
            let rdx = Self::int_reg("rdx", size);
            asmln!(self, "\txor {rdx}, {rdx}")?;
        }
        let divisor = Self::int_reg("r10", size);
        let mnemonic = if instr.ty.is_signed() { "idiv" } else { "div" };
        asmln!(self, "\t{mnemonic} {divisor}")?;
        let result_reg = if instr.op == TacOp::Div { "rax" } else { "rdx" };
        self.store_int(result_reg, &instr.ty, &instr.result)
    }

    fn emit_double_binary(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        self.load_double(&instr.arg1, "xmm0")?;
        self.load_double(&instr.arg2, "xmm1")?;
        let mnemonic = match instr.op {
            TacOp::Add => "addsd",
            TacOp::Sub => "subsd",
            TacOp::Mul => "mulsd",
            TacOp::Div => "divsd",
            _ => return Err(CodeGenError::Logic(format!("unsupported double op {:?}", instr.op))),
        };
        asmln!(self, "\t{mnemonic} %xmm1, %xmm0")?;
        self.store_double("xmm0", &instr.result)
    }

    pub(super) fn emit_unary(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        match instr.op {
            TacOp::Negate if instr.ty.is_floating() => {
                self.load_double(&instr.arg1, "xmm0")?;
                asmln!(self, "\txorpd %xmm1, %xmm1")?;
                asmln!(self, "\tsubsd %xmm0, %xmm1")?;
                self.store_double("xmm1", &instr.result)
            }
            TacOp::Negate => {
                self.load_int(&instr.arg1, &instr.ty, "rax")?;
                let size = instr.ty.size().max(1);
                asmln!(self, "\tneg{} {}", size_suffix(size), Self::int_reg("rax", size))?;
                self.store_int("rax", &instr.ty, &instr.result)
            }
            TacOp::Complement => {
                self.load_int(&instr.arg1, &instr.ty, "rax")?;
                let size = instr.ty.size().max(1);
                asmln!(self, "\tnot{} {}", size_suffix(size), Self::int_reg("rax", size))?;
                self.store_int("rax", &instr.ty, &instr.result)
            }
            TacOp::Not => {
                self.load_int(&instr.arg1, &instr.ty, "rax")?;
                asmln!(self, "\tcmpl $0, %eax")?;
                asmln!(self, "\tsete %al")?;
                asmln!(self, "\tmovzbl %al, %eax")?;
                self.store_int("rax", &instr.ty, &instr.result)
            }
            _ => unreachable!("emit_unary only handles Negate/Complement/Not"),
        }
    }

    /// `++x` / `x++` / `--x` / `x--`, all lowered the same way at this
    /// stage: load, adjust by one, store back to the same location.
    pub(super) fn emit_incr_decr(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        if instr.ty.is_floating() {
            self.load_double(&instr.result, "xmm0")?;
            let one = self.literal8_ref(1.0);
            let mnemonic = if instr.op == TacOp::Increment { "addsd" } else { "subsd" };
            asmln!(self, "\tmovsd {one}, %xmm1")?;
            asmln!(self, "\t{mnemonic} %xmm1, %xmm0")?;
            return self.store_double("xmm0", &instr.result);
        }
        self.load_int(&instr.result, &instr.ty, "rax")?;
        let size = instr.ty.size().max(1);
        let reg = Self::int_reg("rax", size);
        let mnemonic = if instr.op == TacOp::Increment { "inc" } else { "dec" };
        asmln!(self, "\t{mnemonic}{} {reg}", size_suffix(size))?;
        self.store_int("rax", &instr.ty, &instr.result)
    }
}

pub(super) fn size_suffix(size: usize) -> &'static str {
    match size {
        1 => "b",
        4 => "l",
        _ => "q",
    }
}
