//! Per-function symbol tables: a stack of lexical scopes tracking declared
//! variables, compiler-generated temporaries, and stack layout (spec.md
//! §4.4).
//!
//! Grounded on `original_source/include/symbolTable.h`'s scope-stack shape
//! (a stack of name-to-`Symbol` maps pushed and popped around block
//! entry/exit), restated as a `Vec` of `HashMap`s and retyped for this
//! compiler's `Symbol`/`Type` model.

use crate::types::Type;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    Automatic,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    None,
    Internal,
    External,
}

/// One declared name: its type, where it lives (stack offset, negative from
/// `%rbp`, for automatics; a static label for statics), and how it was
/// introduced.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub unique_name: String,
    pub ty: Type,
    pub storage: Storage,
    pub linkage: Linkage,
    pub stack_offset: i64,
    pub is_temporary: bool,
    pub is_literal8: bool,
    pub is_string: bool,
}

impl Symbol {
    pub fn local(name: impl Into<String>, unique_name: impl Into<String>, ty: Type, offset: i64) -> Self {
        Symbol {
            name: name.into(),
            unique_name: unique_name.into(),
            ty,
            storage: Storage::Automatic,
            linkage: Linkage::None,
            stack_offset: offset,
            is_temporary: false,
            is_literal8: false,
            is_string: false,
        }
    }
}

/// One lexical block: a flat map of names declared directly in it, plus the
/// running stack-size counter inherited from the enclosing function (not
/// reset per-scope, since all automatics in a function share one frame).
#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, Symbol>,
}

/// The scope stack for a single function: entered at the function's opening
/// brace, with nested scopes pushed for each block and popped on exit.
/// Shadowing is resolved by renaming: a name that shadows an outer
/// declaration gets a unique suffixed `unique_name`, so TAC/codegen never
/// need to reason about scoping again.
pub struct FunctionSymbolTable {
    scopes: Vec<Scope>,
    next_stack_offset: i64,
    next_unique_id: usize,
    next_temp_id: usize,
    next_literal8_id: usize,
    next_string_id: usize,
    func_name: String,
}

impl FunctionSymbolTable {
    pub fn new(func_name: impl Into<String>) -> Self {
        let mut table = FunctionSymbolTable {
            scopes: Vec::new(),
            next_stack_offset: 0,
            next_unique_id: 0,
            next_temp_id: 0,
            next_literal8_id: 0,
            next_string_id: 0,
            func_name: func_name.into(),
        };
        table.enter_scope();
        table
    }

    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    fn alloc_slot(&mut self, size: usize) -> i64 {
        let size = size.max(1) as i64;
        self.next_stack_offset -= size;
        // Keep every slot naturally aligned (a size-8 value never straddles
        // a less-than-8-aligned address); cheap and simple since we never
        // reclaim freed slots.
        let align = (size.min(8)).max(1);
        self.next_stack_offset -= self.next_stack_offset.rem_euclid(align);
        self.next_stack_offset
    }

    /// Declare a user-written automatic variable, producing a fresh unique
    /// name (`name.<id>`) so shadowed declarations never collide downstream.
    pub fn declare_var(&mut self, name: &str, ty: Type) -> Symbol {
        let id = self.next_unique_id;
        self.next_unique_id += 1;
        let unique_name = format!("{name}.{id}");
        let offset = self.alloc_slot(ty.size());
        let symbol = Symbol::local(name, unique_name, ty, offset);
        self.scopes
            .last_mut()
            .expect("at least one scope is always active")
            .symbols
            .insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Declare a static-storage local (`static int x;` inside a function):
    /// internal linkage, named after the enclosing function so two functions
    /// can each have their own `static` of the same source name.
    pub fn declare_static_var(&mut self, name: &str, ty: Type) -> Symbol {
        let unique_name = format!("{}.{}.static", self.func_name, name);
        let mut symbol = Symbol::local(name, unique_name, ty, 0);
        symbol.storage = Storage::Static;
        symbol.linkage = Linkage::Internal;
        self.scopes
            .last_mut()
            .expect("at least one scope is always active")
            .symbols
            .insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Allocate a fresh compiler-generated temporary, not visible to
    /// `lookup` by source name (TAC addresses it directly by unique name).
    pub fn declare_temp(&mut self, ty: Type) -> Symbol {
        let id = self.next_temp_id;
        self.next_temp_id += 1;
        let unique_name = format!("tmp.{id}");
        let offset = self.alloc_slot(ty.size());
        Symbol::local(unique_name.clone(), unique_name, ty, offset)
    }

    /// Allocate an 8-byte-aligned constant slot in `__TEXT,__literal8`,
    /// used for double-literal operands (spec.md §4.7).
    pub fn declare_literal8(&mut self, value: f64) -> String {
        let id = self.next_literal8_id;
        self.next_literal8_id += 1;
        let _ = value;
        format!("L.literal8.{}.{id}", self.func_name)
    }

    /// Allocate a `__TEXT,__cstring` entry for a string literal.
    pub fn declare_string(&mut self) -> String {
        let id = self.next_string_id;
        self.next_string_id += 1;
        format!("L.str.{}.{id}", self.func_name)
    }

    /// Resolve a source name against the innermost-to-outermost scope
    /// chain, matching ordinary lexical shadowing.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
    }

    /// Total automatic-storage frame size needed, rounded up to 16 bytes
    /// (spec.md §4.7's stack-alignment invariant).
    pub fn stack_size(&self) -> i64 {
        let raw = -self.next_stack_offset;
        (raw + 15) & !15
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BaseType;

    #[test]
    fn shadowing_renames_instead_of_overwriting() {
        let mut table = FunctionSymbolTable::new("f");
        let outer = table.declare_var("x", Type::new(BaseType::Int));
        table.enter_scope();
        let inner = table.declare_var("x", Type::new(BaseType::Int));
        assert_ne!(outer.unique_name, inner.unique_name);
        assert_eq!(table.lookup("x").unwrap().unique_name, inner.unique_name);
        table.exit_scope();
        assert_eq!(table.lookup("x").unwrap().unique_name, outer.unique_name);
    }

    #[test]
    fn scope_isolation_after_exit() {
        let mut table = FunctionSymbolTable::new("f");
        table.enter_scope();
        table.declare_var("y", Type::new(BaseType::Int));
        table.exit_scope();
        assert!(table.lookup("y").is_none());
    }

    #[test]
    fn stack_size_is_sixteen_byte_aligned() {
        let mut table = FunctionSymbolTable::new("f");
        table.declare_var("a", Type::new(BaseType::Char)); // 1 byte
        assert_eq!(table.stack_size() % 16, 0);
    }

    #[test]
    fn temporaries_are_not_visible_to_lookup() {
        let mut table = FunctionSymbolTable::new("f");
        let t = table.declare_temp(Type::new(BaseType::Int));
        assert!(table.lookup(&t.unique_name).is_none());
    }
}
