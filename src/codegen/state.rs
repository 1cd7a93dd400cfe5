//! Assembler state: the output buffer, the current section, and the
//! per-function frame bookkeeping derived from the TAC stream (spec.md
//! §4.7).
//!
//! The assembler takes the TAC instruction list as its only input (spec.md
//! §4.7: "Consumes the TAC list and produces textual assembly"); it never
//! consults the symbol tables built during semantic analysis. Stack offsets
//! for locals and temporaries are instead derived here, from the first
//! appearance of each name in a function's instruction slice.

use crate::tac::Operand;
use crate::types::Type;
use std::collections::HashMap;

/// The five sections the assembler ever emits into, in the fixed order
/// spec.md §5 requires (text, data, bss, literal8, cstring).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Section {
    Text,
    Data,
    Bss,
    Literal8,
    Cstring,
}

/// Where one function-local name lives: a byte offset from `%rbp`, and the
/// type the assembler last saw it declared with (for size-polymorphic
/// load/store selection).
#[derive(Debug, Clone)]
pub(super) struct Local {
    pub offset: i64,
    pub ty: Type,
}

pub struct Assembler {
    pub(super) out: String,
    pub(super) section: Section,
    /// Every name defined in `.data`/`.bss`, with its declared type —
    /// referenced from inside a function body via `_name(%rip)` rather than
    /// a stack slot. The type is kept so operands with no reliable `ty` of
    /// their own (loop/branch conditions) can still be sized correctly.
    pub(super) globals: HashMap<String, Type>,
    pub(super) current_function: String,
    pub(super) frame_size: i64,
    pub(super) locals: HashMap<String, Local>,
    /// Arguments accumulated from `Push` instructions since the last `Call`.
    pub(super) pending_args: Vec<(Operand, Type)>,
    /// Deduplicated `__literal8` pool: bit pattern -> label.
    pub(super) literal8_labels: HashMap<u64, String>,
    pub(super) literal8_pool: Vec<(String, f64)>,
    pub(super) literal8_counter: usize,
    /// Deduplicated `__cstring` pool: decoded text -> label.
    pub(super) cstring_labels: HashMap<String, String>,
    pub(super) cstring_pool: Vec<(String, String)>,
    pub(super) cstring_counter: usize,
}

impl Assembler {
    pub(super) fn new() -> Self {
        Assembler {
            out: String::new(),
            section: Section::Text,
            globals: HashMap::new(),
            current_function: String::new(),
            frame_size: 0,
            locals: HashMap::new(),
            pending_args: Vec::new(),
            literal8_labels: HashMap::new(),
            literal8_pool: Vec::new(),
            literal8_counter: 0,
            cstring_labels: HashMap::new(),
            cstring_pool: Vec::new(),
            cstring_counter: 0,
        }
    }

    /// The authoritative type of a `Name` operand, consulting the globals
    /// table and then the locals table discovered during frame layout.
    /// Falls back to `fallback` for non-`Name` operands, where the caller's
    /// own instruction carries a usable `ty` already (or none is needed).
    ///
    /// Some TAC instructions (`If`/`IfNot`) don't carry a reliable `ty` for
    /// their condition operand. Loading a condition at the wrong width would
    /// read uninitialized bytes above a narrower stored value, so branch
    /// codegen looks the true type up here instead of guessing a width.
    pub(super) fn operand_type(&self, operand: &Operand, fallback: &Type) -> Type {
        if let Operand::Name(name) = operand {
            if let Some(ty) = self.globals.get(name) {
                return ty.clone();
            }
            if let Some(local) = self.locals.get(name) {
                return local.ty.clone();
            }
        }
        fallback.clone()
    }
}

/// `writeln!` into the assembler's output buffer, converting the formatting
/// error into `CodeGenError` via `?`.
macro_rules! asmln {
    ($asm:expr, $($arg:tt)*) => {{
        use std::fmt::Write as _;
        writeln!($asm.out, $($arg)*).map_err($crate::codegen::error::CodeGenError::from)
    }};
}
pub(super) use asmln;
