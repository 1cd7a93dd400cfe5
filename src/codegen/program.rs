//! Mach-O assembly text generation: the file preamble, the top-level
//! instruction-stream driver, and the section-scoped dispatch for the
//! overloaded `TacOp::Assign` (a plain copy in `.text`, an initializer in
//! `.data`, a zero-fill declaration in `.bss` — spec.md §4.6/§4.7).

use crate::tac::{Operand, TacInstruction, TacOp};

use super::error::CodeGenError;
use super::frame::{is_quoted_string, unquote};
use super::state::{Assembler, Section, asmln};

/// Assemble a complete TAC instruction stream into Mach-O assembly text.
pub fn assemble(instructions: &[TacInstruction]) -> Result<String, CodeGenError> {
    let mut asm = Assembler::new();
    asm.emit_preamble()?;

    let mut i = 0;
    while i < instructions.len() {
        let instr = &instructions[i];
        match instr.op {
            TacOp::EnterText => asm.switch_section(Section::Text)?,
            TacOp::EnterData => asm.switch_section(Section::Data)?,
            TacOp::EnterBss => asm.switch_section(Section::Bss)?,
            TacOp::EnterLiteral8 => {
                asm.switch_section(Section::Literal8)?;
                asm.flush_literal8()?;
            }
            TacOp::EnterCstring => {
                asm.switch_section(Section::Cstring)?;
                asm.flush_cstrings()?;
            }
            TacOp::FuncBegin => {
                let Operand::Name(name) = &instr.arg1 else {
                    return Err(CodeGenError::Logic("function begin without a name".into()));
                };
                let is_global = matches!(instr.arg2, Operand::ImmInt(1));
                let end = find_func_end(instructions, i, name)?;
                asm.emit_func_begin(name, is_global, &instructions[i + 1..end])?;
            }
            TacOp::FuncEnd => {
                let Operand::Name(name) = &instr.arg1 else {
                    return Err(CodeGenError::Logic("function end without a name".into()));
                };
                asm.emit_func_end(name)?;
            }
            TacOp::BindParam => asm.emit_bind_param(instr)?,
            TacOp::Assign => match asm.current_section() {
                Section::Data => asm.emit_data_def(instr)?,
                Section::Bss => asm.emit_bss_def(instr)?,
                _ => asm.emit_assign(instr)?,
            },
            TacOp::Add | TacOp::Sub | TacOp::Mul | TacOp::Div | TacOp::Mod => asm.emit_binary(instr)?,
            TacOp::Eq | TacOp::Ne | TacOp::Lt | TacOp::Le | TacOp::Gt | TacOp::Ge => asm.emit_compare(instr)?,
            TacOp::Negate | TacOp::Complement | TacOp::Not => asm.emit_unary(instr)?,
            TacOp::Increment | TacOp::Decrement => asm.emit_incr_decr(instr)?,
            TacOp::ConvertType => asm.emit_convert(instr)?,
            TacOp::Mov => asm.emit_mov(instr)?,
            TacOp::AddrOf => asm.emit_addrof(instr)?,
            TacOp::Deref => asm.emit_deref(instr)?,
            TacOp::StoreIndirect => asm.emit_store_indirect(instr)?,
            TacOp::Push => asm.emit_push(instr)?,
            TacOp::Call => asm.emit_call(instr)?,
            TacOp::If => asm.emit_branch(instr, true)?,
            TacOp::IfNot => asm.emit_branch(instr, false)?,
            TacOp::Goto => asm.emit_goto(instr)?,
            TacOp::Label => asm.emit_label(instr)?,
            TacOp::Return => asm.emit_return(instr)?,
            TacOp::Nop => {}
        }
        i += 1;
    }
    Ok(asm.into_output())
}

fn find_func_end(instructions: &[TacInstruction], start: usize, name: &str) -> Result<usize, CodeGenError> {
    instructions[start + 1..]
        .iter()
        .position(|i| matches!(&i.op, TacOp::FuncEnd) && matches!(&i.arg1, Operand::Name(n) if n == name))
        .map(|offset| start + 1 + offset)
        .ok_or_else(|| CodeGenError::Logic(format!("function '{name}' has no matching end marker")))
}

impl Assembler {
    pub(super) fn current_section(&self) -> Section {
        self.section
    }

    pub(super) fn into_output(self) -> String {
        self.out
    }

    fn emit_preamble(&mut self) -> Result<(), CodeGenError> {
        asmln!(self, ".section __TEXT,__text,regular,pure_instructions")?;
        asmln!(self, ".build_version macos, 11, 0")?;
        asmln!(self, "\t.p2align 4, 0x90")
    }

    /// A plain value copy in `.text` (`TacOp::Assign` with `arg1 = None`),
    /// except when `arg2` carries a quoted string-literal marker — the one
    /// point where a string's text reaches assembly, via the `__cstring`
    /// pool — or `arg1` carries an array-initializer element index, which
    /// `tac.rs` overloads `Assign` with instead of giving it its own op.
    pub(super) fn emit_assign(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        if !matches!(instr.arg1, Operand::None) {
            return self.emit_array_element_init(instr);
        }
        if let Operand::Name(name) = &instr.arg2 {
            if is_quoted_string(name) {
                let text = unquote(name).to_string();
                return self.emit_string_assign(&text, &instr.result, &instr.ty);
            }
        }
        if instr.ty.is_floating() {
            self.load_double(&instr.arg2, "xmm0")?;
            self.store_double("xmm0", &instr.result)
        } else {
            self.load_int(&instr.arg2, &instr.ty, "rax")?;
            self.store_int("rax", &instr.ty, &instr.result)
        }
    }
}
