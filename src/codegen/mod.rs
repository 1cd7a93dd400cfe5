//! x86-64 assembly generation (spec.md §4.7): turns the flat TAC instruction
//! list into Mach-O assembly text for the macOS System V ABI.
//!
//! Split by concern rather than by `TacOp` variant:
//! - [`state`] — the `Assembler` struct and its output buffer.
//! - [`frame`] — per-function stack layout and the prologue/epilogue.
//! - [`operands`] — size-polymorphic load/store and address arithmetic.
//! - [`data`] — `.data`/`.bss`/`.literal8`/`.cstring` emission.
//! - [`arithmetic`] / [`compare`] / [`convert`] — integer and double ops.
//! - [`control_flow`] — branches, labels, and `return`.
//! - [`call`] — the calling convention and parameter binding.
//! - [`program`] — the preamble and the top-level instruction-stream driver.
//!
//! The assembler never consults the symbol tables built during semantic
//! analysis — everything it needs is recoverable from the TAC stream itself
//! (spec.md §4.7: "Consumes the TAC list and produces textual assembly").

mod arithmetic;
mod call;
mod compare;
mod control_flow;
mod convert;
mod data;
mod error;
mod frame;
mod operands;
mod program;
mod state;

pub use error::CodeGenError;
pub use program::assemble;

#[cfg(test)]
mod tests {
    use super::assemble;
    use crate::tac::{Operand, TacInstruction, TacOp};
    use crate::types::{BaseType, Type};

    fn instr(op: TacOp, arg1: Operand, arg2: Operand, result: Operand, ty: Type) -> TacInstruction {
        TacInstruction { op, arg1, arg2, result, ty }
    }

    /// `int main() { return 2 + 3 * 4; }`, lowered by hand into the shape
    /// `tac.rs` would produce, exercising the full section ordering
    /// (text, data, bss, literal8, cstring) even though this program uses
    /// only the first.
    fn sample_program() -> Vec<TacInstruction> {
        let int = Type::new(BaseType::Int);
        vec![
            instr(TacOp::EnterText, Operand::None, Operand::None, Operand::None, Type::void()),
            instr(TacOp::FuncBegin, Operand::Name("main".into()), Operand::ImmInt(1), Operand::None, int.clone()),
            instr(TacOp::Mul, Operand::ImmInt(3), Operand::ImmInt(4), Operand::Name("t0".into()), int.clone()),
            instr(TacOp::Add, Operand::ImmInt(2), Operand::Name("t0".into()), Operand::Name("t1".into()), int.clone()),
            instr(TacOp::Return, Operand::Name("t1".into()), Operand::None, Operand::None, Type::void()),
            instr(TacOp::FuncEnd, Operand::Name("main".into()), Operand::None, Operand::None, Type::void()),
            instr(TacOp::EnterData, Operand::None, Operand::None, Operand::None, Type::void()),
            instr(TacOp::EnterBss, Operand::None, Operand::None, Operand::None, Type::void()),
            instr(TacOp::EnterLiteral8, Operand::None, Operand::None, Operand::None, Type::void()),
            instr(TacOp::EnterCstring, Operand::None, Operand::None, Operand::None, Type::void()),
        ]
    }

    #[test]
    fn sections_appear_in_spec_order() {
        let asm = assemble(&sample_program()).expect("assembly generation should succeed");
        let text_pos = asm.find(".section __TEXT,__text").unwrap();
        let data_pos = asm.find("\n.data").unwrap();
        let bss_pos = asm.find("\n.bss").unwrap();
        let lit8_pos = asm.find("__literal8").unwrap();
        let cstr_pos = asm.find("__cstring").unwrap();
        assert!(text_pos < data_pos);
        assert!(data_pos < bss_pos);
        assert!(bss_pos < lit8_pos);
        assert!(lit8_pos < cstr_pos);
    }

    #[test]
    fn function_prologue_and_epilogue_bracket_the_body() {
        let asm = assemble(&sample_program()).expect("assembly generation should succeed");
        assert!(asm.contains("_main:"));
        assert!(asm.contains("pushq %rbp"));
        assert!(asm.contains("movq %rsp, %rbp"));
        assert!(asm.contains(".Lmain_end:"));
        assert!(asm.contains("popq %rbp"));
        assert!(asm.contains("retq"));
    }

    #[test]
    fn division_picks_signed_or_unsigned_mnemonic() {
        let long = Type::new(BaseType::Long);
        let ulong = Type::new(BaseType::ULong);
        let signed_div = vec![
            instr(TacOp::EnterText, Operand::None, Operand::None, Operand::None, Type::void()),
            instr(TacOp::FuncBegin, Operand::Name("f".into()), Operand::ImmInt(1), Operand::None, long.clone()),
            instr(TacOp::Div, Operand::Name("a".into()), Operand::Name("b".into()), Operand::Name("t0".into()), long),
            instr(TacOp::Return, Operand::Name("t0".into()), Operand::None, Operand::None, Type::void()),
            instr(TacOp::FuncEnd, Operand::Name("f".into()), Operand::None, Operand::None, Type::void()),
        ];
        let unsigned_div = vec![
            instr(TacOp::EnterText, Operand::None, Operand::None, Operand::None, Type::void()),
            instr(TacOp::FuncBegin, Operand::Name("f".into()), Operand::ImmInt(1), Operand::None, ulong.clone()),
            instr(TacOp::Div, Operand::Name("a".into()), Operand::Name("b".into()), Operand::Name("t0".into()), ulong),
            instr(TacOp::Return, Operand::Name("t0".into()), Operand::None, Operand::None, Type::void()),
            instr(TacOp::FuncEnd, Operand::Name("f".into()), Operand::None, Operand::None, Type::void()),
        ];
        assert!(assemble(&signed_div).unwrap().contains("\tidiv "));
        assert!(assemble(&unsigned_div).unwrap().contains("\tdiv "));
    }

    #[test]
    fn double_literal_is_encoded_as_a_quad_bit_pattern() {
        let double = Type::new(BaseType::Double);
        let body = vec![
            instr(TacOp::EnterText, Operand::None, Operand::None, Operand::None, Type::void()),
            instr(TacOp::FuncBegin, Operand::Name("f".into()), Operand::ImmInt(1), Operand::None, double.clone()),
            instr(TacOp::Return, Operand::ImmFloat(1.5), Operand::None, Operand::None, Type::void()),
            instr(TacOp::FuncEnd, Operand::Name("f".into()), Operand::None, Operand::None, Type::void()),
            instr(TacOp::EnterLiteral8, Operand::None, Operand::None, Operand::None, Type::void()),
        ];
        let asm = assemble(&body).unwrap();
        assert!(asm.contains(&format!("0x{:016X}", 1.5f64.to_bits())));
    }
}
