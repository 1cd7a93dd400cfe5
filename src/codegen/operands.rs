//! Size-polymorphic load/store and operand-to-assembly-text resolution
//! (spec.md §4.7): `movb`/`movl`/`movq` selection by type size,
//! `_name(%rip)` for statics and literals, `off(%rbp)` for locals.

use crate::tac::{Operand, TacInstruction};
use crate::types::{BaseType, Type};

use super::error::CodeGenError;
use super::state::{Assembler, asmln};

/// A pointer's bit pattern doesn't depend on its pointee; this stands in for
/// "some pointer type" wherever only `size()`/`is_floating()` matter.
fn any_pointer() -> Type {
    Type::new(BaseType::Int).pointer_to()
}

impl Assembler {
    pub(super) fn mov_mnemonic(size: usize) -> &'static str {
        match size {
            1 => "movb",
            4 => "movl",
            _ => "movq",
        }
    }

    /// The size-appropriate spelling of one of the handful of general
    /// registers the arithmetic/call/compare stages route values through.
    pub(super) fn int_reg(base: &str, size: usize) -> &'static str {
        match (base, size) {
            ("rax", 8) => "%rax",
            ("rax", 4) => "%eax",
            ("rax", 1) => "%al",
            ("rdx", 8) => "%rdx",
            ("rdx", 4) => "%edx",
            ("rdx", 1) => "%dl",
            ("r10", 8) => "%r10",
            ("r10", 4) => "%r10d",
            ("r10", 1) => "%r10b",
            ("r11", 8) => "%r11",
            ("r11", 4) => "%r11d",
            ("r11", 1) => "%r11b",
            ("rdi", 8) => "%rdi",
            ("rdi", 4) => "%edi",
            ("rdi", 1) => "%dil",
            ("rsi", 8) => "%rsi",
            ("rsi", 4) => "%esi",
            ("rsi", 1) => "%sil",
            ("rcx", 8) => "%rcx",
            ("rcx", 4) => "%ecx",
            ("rcx", 1) => "%cl",
            ("r8", 8) => "%r8",
            ("r8", 4) => "%r8d",
            ("r8", 1) => "%r8b",
            ("r9", 8) => "%r9",
            ("r9", 4) => "%r9d",
            ("r9", 1) => "%r9b",
            _ => unreachable!("unsupported register/size combination: {base}/{size}"),
        }
    }

    /// The assembly text for a `Name`/`ImmInt`/`Label` operand. Floats and
    /// `None` must go through the float-specific / control-flow-specific
    /// paths instead.
    pub(super) fn operand_text(&self, operand: &Operand) -> String {
        match operand {
            Operand::Name(name) if self.globals.contains_key(name) => format!("_{name}(%rip)"),
            Operand::Name(name) => {
                let local = self
                    .locals
                    .get(name)
                    .unwrap_or_else(|| panic!("local '{name}' was not discovered during frame layout"));
                format!("{}(%rbp)", local.offset)
            }
            Operand::ImmInt(n) => format!("${n}"),
            Operand::Label(l) => l.clone(),
            Operand::ImmFloat(_) | Operand::None => {
                unreachable!("float/none operands are resolved by their own helpers")
            }
        }
    }

    /// Load an integer- or pointer-typed operand into `reg`, at `ty`'s size.
    pub(super) fn load_int(&mut self, operand: &Operand, ty: &Type, reg: &str) -> Result<(), CodeGenError> {
        let size = ty.size().max(1);
        let mnemonic = Self::mov_mnemonic(size);
        let dst = Self::int_reg(reg, size);
        let src = self.operand_text(operand);
        asmln!(self, "\t{mnemonic} {src}, {dst}")
    }

    /// Store `reg` into an integer- or pointer-typed destination operand.
    pub(super) fn store_int(&mut self, reg: &str, ty: &Type, dest: &Operand) -> Result<(), CodeGenError> {
        let size = ty.size().max(1);
        let mnemonic = Self::mov_mnemonic(size);
        let src = Self::int_reg(reg, size);
        let dst = self.operand_text(dest);
        asmln!(self, "\t{mnemonic} {src}, {dst}")
    }

    /// Load a double-typed operand into an `%xmm` register. Immediates are
    /// routed through the `__literal8` pool first.
    pub(super) fn load_double(&mut self, operand: &Operand, xmm: &str) -> Result<(), CodeGenError> {
        let src = match operand {
            Operand::ImmFloat(f) => self.literal8_ref(*f),
            _ => self.operand_text(operand),
        };
        asmln!(self, "\tmovsd {src}, %{xmm}")
    }

    pub(super) fn store_double(&mut self, xmm: &str, dest: &Operand) -> Result<(), CodeGenError> {
        let dst = self.operand_text(dest);
        asmln!(self, "\tmovsd %{xmm}, {dst}")
    }

    /// Load the address of a local/global name into a general register
    /// (`leaq`), used for string-pointer assignment and address-of.
    pub(super) fn load_address(&mut self, name: &str, reg: &str) -> Result<(), CodeGenError> {
        let src = if self.globals.contains_key(name) {
            format!("_{name}(%rip)")
        } else {
            let local = self
                .locals
                .get(name)
                .unwrap_or_else(|| panic!("local '{name}' was not discovered during frame layout"));
            format!("{}(%rbp)", local.offset)
        };
        let dst = Self::int_reg(reg, 8);
        asmln!(self, "\tleaq {src}, {dst}")
    }

    /// Plain value copy (`TacOp::Mov`): used where a "base" in address
    /// arithmetic is already a pointer value rather than a named location
    /// whose address needs taking.
    pub(super) fn emit_mov(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        self.load_int(&instr.arg1, &instr.ty, "rax")?;
        self.store_int("rax", &instr.ty, &instr.result)
    }

    /// `&name` (`TacOp::AddrOf`): `arg1` is always the name of a declared
    /// location here, never an already-computed address — `gen_field_address`
    /// and `gen_index_address` route the already-a-pointer-value case
    /// through `Mov` instead.
    pub(super) fn emit_addrof(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let Operand::Name(name) = &instr.arg1 else {
            return Err(CodeGenError::Logic("address-of a non-named location".into()));
        };
        self.load_address(name, "r10")?;
        self.store_int("r10", &instr.ty, &instr.result)
    }

    /// `*ptr` as an rvalue (`TacOp::Deref`): `arg1` holds a pointer value,
    /// not a name to take the address of.
    pub(super) fn emit_deref(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        self.load_int(&instr.arg1, &any_pointer(), "r10")?;
        if instr.ty.is_floating() {
            asmln!(self, "\tmovsd (%r10), %xmm0")?;
            self.store_double("xmm0", &instr.result)
        } else {
            let size = instr.ty.size().max(1);
            let reg = Self::int_reg("rax", size);
            asmln!(self, "\t{} (%r10), {reg}", Self::mov_mnemonic(size))?;
            self.store_int("rax", &instr.ty, &instr.result)
        }
    }

    /// An array's compound-initializer element store (`TacOp::Assign` with
    /// `arg1 = ImmInt(index)`, distinct from the plain `arg1 = None` copy
    /// `emit_assign` otherwise handles): stores into `result`'s full-array
    /// stack slot at `index * ty.size()`, since `tac.rs` emits one such
    /// instruction per initializer element, all sharing the array's name.
    pub(super) fn emit_array_element_init(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let Operand::ImmInt(index) = instr.arg1 else {
            return Err(CodeGenError::Logic("array element initializer without an index".into()));
        };
        let Operand::Name(name) = &instr.result else {
            return Err(CodeGenError::Logic("array element initializer without a destination array".into()));
        };
        let elem_size = instr.ty.size().max(1) as i64;
        let base = self
            .locals
            .get(name)
            .unwrap_or_else(|| panic!("local '{name}' was not discovered during frame layout"))
            .offset;
        let offset = base + index * elem_size;
        if instr.ty.is_floating() {
            self.load_double(&instr.arg2, "xmm0")?;
            asmln!(self, "\tmovsd %xmm0, {offset}(%rbp)")
        } else {
            let size = elem_size as usize;
            self.load_int(&instr.arg2, &instr.ty, "rax")?;
            asmln!(self, "\t{} {}, {offset}(%rbp)", Self::mov_mnemonic(size), Self::int_reg("rax", size))
        }
    }

    /// `*ptr = value` / `a[i] = value` / `s.f = value` (`TacOp::StoreIndirect`):
    /// `arg1` holds the target address, `arg2` the value to store.
    pub(super) fn emit_store_indirect(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        self.load_int(&instr.arg1, &any_pointer(), "r10")?;
        if instr.ty.is_floating() {
            self.load_double(&instr.arg2, "xmm0")?;
            asmln!(self, "\tmovsd %xmm0, (%r10)")
        } else {
            let size = instr.ty.size().max(1);
            self.load_int(&instr.arg2, &instr.ty, "rax")?;
            asmln!(self, "\t{} {}, (%r10)", Self::mov_mnemonic(size), Self::int_reg("rax", size))
        }
    }
}
