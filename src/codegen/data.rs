//! `.data`/`.bss`/`.literal8`/`.cstring` section emission, and the two
//! constant pools (doubles, strings) the assembler fills in lazily as it
//! walks the text section (spec.md §4.7, §6).

use crate::tac::{Operand, TacInstruction};
use crate::types::Type;

use super::error::CodeGenError;
use super::state::{Assembler, Section, asmln};

impl Assembler {
    pub(super) fn switch_section(&mut self, section: Section) -> Result<(), CodeGenError> {
        if self.section == section {
            return Ok(());
        }
        self.section = section;
        match section {
            Section::Text => asmln!(self, ".text"),
            Section::Data => {
                asmln!(self, ".data")?;
                asmln!(self, "\t.balign 8")
            }
            Section::Bss => {
                asmln!(self, ".bss")?;
                asmln!(self, "\t.balign 8")
            }
            Section::Literal8 => asmln!(self, ".section __TEXT,__literal8,8byte_literals"),
            Section::Cstring => asmln!(self, ".section __TEXT,__cstring,cstring_literals"),
        }
    }

    /// One initialized global (`.data`): `_name: .long/.quad value`.
    pub(super) fn emit_data_def(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let Operand::Name(name) = &instr.result else {
            return Err(CodeGenError::Logic("data definition without a name".into()));
        };
        self.globals.insert(name.clone(), instr.ty.clone());
        asmln!(self, ".globl _{name}")?;
        asmln!(self, "_{name}:")?;
        if instr.ty.is_floating() {
            let Operand::ImmFloat(f) = &instr.arg2 else {
                return Err(CodeGenError::Logic("double global without a float initializer".into()));
            };
            asmln!(self, "\t.quad {}", double_bits(*f))
        } else {
            let value = match &instr.arg2 {
                Operand::ImmInt(n) => *n,
                _ => return Err(CodeGenError::Logic("integer global without an int initializer".into())),
            };
            let directive = if instr.ty.size() == 8 { ".quad" } else { ".long" };
            asmln!(self, "\t{directive} {value}")
        }
    }

    /// One zero-initialized global (`.bss`): `_name: .zero size`.
    pub(super) fn emit_bss_def(&mut self, instr: &TacInstruction) -> Result<(), CodeGenError> {
        let Operand::Name(name) = &instr.result else {
            return Err(CodeGenError::Logic("bss definition without a name".into()));
        };
        self.globals.insert(name.clone(), instr.ty.clone());
        asmln!(self, ".globl _{name}")?;
        asmln!(self, "_{name}:")?;
        asmln!(self, "\t.zero {}", instr.ty.size().max(1))
    }

    /// Register a double constant in the `__literal8` pool (deduplicated by
    /// bit pattern) and return its `label(%rip)` reference.
    pub(super) fn literal8_ref(&mut self, value: f64) -> String {
        let bits = value.to_bits();
        if let Some(label) = self.literal8_labels.get(&bits) {
            return format!("{label}(%rip)");
        }
        let label = format!("L.literal8.{}", self.literal8_counter);
        self.literal8_counter += 1;
        self.literal8_labels.insert(bits, label.clone());
        self.literal8_pool.push((label.clone(), value));
        format!("{label}(%rip)")
    }

    /// Register a string constant in the `__cstring` pool and return its
    /// bare label (the caller still needs to `leaq` it).
    pub(super) fn cstring_ref(&mut self, text: &str) -> String {
        if let Some(label) = self.cstring_labels.get(text) {
            return label.clone();
        }
        let label = format!("L.str.{}", self.cstring_counter);
        self.cstring_counter += 1;
        self.cstring_labels.insert(text.to_string(), label.clone());
        self.cstring_pool.push((label.clone(), text.to_string()));
        label
    }

    /// Flush the accumulated literal pools once the TAC stream reaches the
    /// corresponding `Enter*` marker.
    pub(super) fn flush_literal8(&mut self) -> Result<(), CodeGenError> {
        for (label, value) in std::mem::take(&mut self.literal8_pool) {
            asmln!(self, "{label}:")?;
            asmln!(self, "\t.quad {}", double_bits(value))?;
        }
        Ok(())
    }

    pub(super) fn flush_cstrings(&mut self) -> Result<(), CodeGenError> {
        for (label, text) in std::mem::take(&mut self.cstring_pool) {
            asmln!(self, "{label}:")?;
            asmln!(self, "\t.asciz {}", escape_cstring(&text))?;
        }
        Ok(())
    }

    /// `leaq <label>(%rip), reg; movq reg, dest` — the one place a string
    /// literal's text reaches assembly: a quoted `Assign` in the text
    /// section, recognized by `program.rs` before generic dispatch.
    pub(super) fn emit_string_assign(
        &mut self,
        text: &str,
        dest: &Operand,
        ty: &Type,
    ) -> Result<(), CodeGenError> {
        let label = self.cstring_ref(text);
        asmln!(self, "\tleaq {label}(%rip), %r10")?;
        self.store_int("r10", ty, dest)
    }
}

/// The IEEE-754 bit pattern for a double literal, as the hex `.quad` operand
/// spec.md §8 calls out (`1.5` -> `0x3FF8000000000000`).
fn double_bits(value: f64) -> String {
    format!("0x{:016X}", value.to_bits())
}

fn escape_cstring(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('"');
    for c in text.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped.push('"');
    escaped
}
