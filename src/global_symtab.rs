//! Program-wide symbol table: function signatures, globals, and each
//! function's private scope stack (spec.md §4.4).

use crate::error::{SemanticError, SourceLocation};
use crate::symtab::{FunctionSymbolTable, Linkage, Storage, Symbol};
use crate::types::Type;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct FuncSymbol {
    pub name: String,
    pub param_types: Vec<Type>,
    pub return_ty: Type,
    pub linkage: Linkage,
    pub defined: bool,
}

/// Holds every function's signature, every global variable, and one
/// [`FunctionSymbolTable`] per function body, plus a cursor tracking which
/// function is currently being analyzed (so nested lookups know where to
/// look first).
pub struct GlobalSymbolTable {
    pub functions: HashMap<String, FuncSymbol>,
    pub function_scopes: HashMap<String, FunctionSymbolTable>,
    pub globals: HashMap<String, Symbol>,
    current_function: Option<String>,
}

impl GlobalSymbolTable {
    pub fn new() -> Self {
        GlobalSymbolTable {
            functions: HashMap::new(),
            function_scopes: HashMap::new(),
            globals: HashMap::new(),
            current_function: None,
        }
    }

    pub fn declare_function(
        &mut self,
        name: &str,
        param_types: Vec<Type>,
        return_ty: Type,
        linkage: Linkage,
        defined: bool,
        loc: SourceLocation,
    ) -> Result<(), SemanticError> {
        if let Some(existing) = self.functions.get(name) {
            if existing.param_types.len() != param_types.len() || existing.return_ty != return_ty {
                return Err(SemanticError::new(
                    loc,
                    format!("conflicting declarations of function '{name}'"),
                ));
            }
            if existing.defined && defined {
                return Err(SemanticError::new(
                    loc,
                    format!("redefinition of function '{name}'"),
                ));
            }
        }
        let merged_defined = self.functions.get(name).map(|f| f.defined).unwrap_or(false) || defined;
        self.functions.insert(
            name.to_string(),
            FuncSymbol {
                name: name.to_string(),
                param_types,
                return_ty,
                linkage,
                defined: merged_defined,
            },
        );
        self.function_scopes
            .entry(name.to_string())
            .or_insert_with(|| FunctionSymbolTable::new(name));
        Ok(())
    }

    /// Declare a file-scope variable, checking linkage against any prior
    /// declaration of the same name (spec.md §4.4/§4.5: `static` then
    /// non-`static`, or vice versa, is a conflict; repeated `extern` is not).
    pub fn declare_global(
        &mut self,
        name: &str,
        ty: Type,
        storage: Storage,
        specifier_is_extern: bool,
        loc: SourceLocation,
    ) -> Result<(), SemanticError> {
        let linkage = if specifier_is_extern {
            Linkage::External
        } else if storage == Storage::Static {
            Linkage::Internal
        } else {
            Linkage::External
        };

        if let Some(existing) = self.globals.get(name) {
            if existing.ty != ty {
                return Err(SemanticError::new(
                    loc,
                    format!("conflicting types for global '{name}'"),
                ));
            }
            if existing.linkage != linkage && !specifier_is_extern {
                return Err(SemanticError::new(
                    loc,
                    format!("conflicting linkage for global '{name}'"),
                ));
            }
            return Ok(());
        }

        let symbol = Symbol {
            name: name.to_string(),
            unique_name: name.to_string(),
            ty,
            storage,
            linkage,
            stack_offset: 0,
            is_temporary: false,
            is_literal8: false,
            is_string: false,
        };
        self.globals.insert(name.to_string(), symbol);
        Ok(())
    }

    pub fn set_current_function(&mut self, name: Option<&str>) {
        self.current_function = name.map(|s| s.to_string());
    }

    pub fn current_scope(&mut self) -> &mut FunctionSymbolTable {
        let name = self
            .current_function
            .clone()
            .expect("current_scope called outside a function body");
        self.function_scopes.get_mut(&name).expect("function scope registered at declaration")
    }

    /// Resolve a name: the current function's scope stack first, then file
    /// scope.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        if let Some(func) = &self.current_function {
            if let Some(table) = self.function_scopes.get(func) {
                if let Some(sym) = table.lookup(name) {
                    return Some(sym);
                }
            }
        }
        self.globals.get(name)
    }
}

impl Default for GlobalSymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceLocation;
    use crate::types::BaseType;

    fn loc() -> SourceLocation {
        SourceLocation::new(1, 1)
    }

    #[test]
    fn redeclaring_function_with_different_signature_is_an_error() {
        let mut table = GlobalSymbolTable::new();
        table
            .declare_function("f", vec![], Type::new(BaseType::Int), Linkage::External, true, loc())
            .unwrap();
        let err = table
            .declare_function(
                "f",
                vec![Type::new(BaseType::Int)],
                Type::new(BaseType::Int),
                Linkage::External,
                true,
                loc(),
            )
            .unwrap_err();
        assert!(err.message.contains("conflicting"));
    }

    #[test]
    fn redefining_function_body_twice_is_an_error() {
        let mut table = GlobalSymbolTable::new();
        table
            .declare_function("f", vec![], Type::new(BaseType::Int), Linkage::External, true, loc())
            .unwrap();
        let err = table
            .declare_function("f", vec![], Type::new(BaseType::Int), Linkage::External, true, loc())
            .unwrap_err();
        assert!(err.message.contains("redefinition"));
    }

    #[test]
    fn global_lookup_falls_back_from_function_scope() {
        let mut table = GlobalSymbolTable::new();
        table
            .declare_global("g", Type::new(BaseType::Int), Storage::Static, false, loc())
            .unwrap();
        table
            .declare_function("f", vec![], Type::new(BaseType::Int), Linkage::External, true, loc())
            .unwrap();
        table.set_current_function(Some("f"));
        assert!(table.lookup("g").is_some());
    }
}
