//! Post-order AST walk: name resolution, type inference, implicit-cast
//! insertion, loop labelling, and the validation rules of spec.md §4.5.

use crate::ast::*;
use crate::error::{SemanticError, SourceLocation};
use crate::global_symtab::GlobalSymbolTable;
use crate::symtab::{Linkage, Storage};
use crate::types::{promote_numeric, BaseType, Type};

pub struct SemanticAnalyzer {
    pub globals: GlobalSymbolTable,
    loop_labels: Vec<String>,
    next_loop_id: usize,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        SemanticAnalyzer {
            globals: GlobalSymbolTable::new(),
            loop_labels: Vec::new(),
            next_loop_id: 0,
        }
    }

    pub fn analyze(mut self, program: &mut Program) -> Result<GlobalSymbolTable, SemanticError> {
        // Pass 1: register every top-level signature/global up front so
        // forward references (a function calling one declared later in the
        // file) resolve correctly.
        for item in &program.items {
            self.predeclare(item)?;
        }
        for item in &mut program.items {
            self.analyze_item(item)?;
        }
        Ok(self.globals)
    }

    fn predeclare(&mut self, item: &TopLevel) -> Result<(), SemanticError> {
        match item {
            TopLevel::Func(f) => {
                let param_types = f.params.iter().map(|p| p.ty.clone()).collect();
                let linkage = if f.specifier == Specifier::Static {
                    Linkage::Internal
                } else {
                    Linkage::External
                };
                self.globals.declare_function(
                    &f.name,
                    param_types,
                    f.return_ty.clone(),
                    linkage,
                    f.body.is_some(),
                    f.loc,
                )?;
            }
            TopLevel::Var(v) => {
                let storage = if v.specifier == Specifier::Static {
                    Storage::Static
                } else {
                    Storage::Static // file-scope automatics don't exist; all globals are static storage
                };
                self.globals.declare_global(
                    &v.name,
                    v.ty.clone(),
                    storage,
                    v.specifier == Specifier::Extern,
                    v.loc,
                )?;
            }
            TopLevel::Struct(_) => {}
        }
        Ok(())
    }

    fn analyze_item(&mut self, item: &mut TopLevel) -> Result<(), SemanticError> {
        match item {
            TopLevel::Func(f) => self.analyze_function(f),
            TopLevel::Var(v) => {
                if let Some(init) = &mut v.init {
                    self.analyze_expr(init)?;
                }
                Ok(())
            }
            TopLevel::Struct(_) => Ok(()),
        }
    }

    fn analyze_function(&mut self, f: &mut FuncDecl) -> Result<(), SemanticError> {
        self.globals.set_current_function(Some(&f.name));
        for param in &mut f.params {
            let sym = self.globals.current_scope().declare_var(&param.name, param.ty.clone());
            param.resolved_name = Some(sym.unique_name);
        }
        if let Some(body) = &mut f.body {
            for stmt in body {
                self.analyze_stmt(stmt, &f.return_ty)?;
            }
        }
        self.globals.set_current_function(None);
        Ok(())
    }

    fn analyze_stmt(&mut self, stmt: &mut Stmt, return_ty: &Type) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Return { value, loc } => {
                match value {
                    Some(expr) => {
                        self.analyze_expr(expr)?;
                        self.require_assignable(return_ty, expr, *loc, "return value")?;
                    }
                    None => {
                        if !matches!(return_ty.base, BaseType::Void) {
                            return Err(SemanticError::new(*loc, "missing return value in non-void function"));
                        }
                    }
                }
                Ok(())
            }
            Stmt::VarDecl(decl) => self.analyze_var_decl(decl),
            Stmt::ExprStmt(expr) => self.analyze_expr(expr),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
                loc,
            } => {
                self.analyze_expr(cond)?;
                self.require_integral_condition(cond, *loc)?;
                self.globals.current_scope().enter_scope();
                for s in then_branch.iter_mut() {
                    self.analyze_stmt(s, return_ty)?;
                }
                self.globals.current_scope().exit_scope();
                if let Some(else_stmts) = else_branch {
                    self.globals.current_scope().enter_scope();
                    for s in else_stmts.iter_mut() {
                        self.analyze_stmt(s, return_ty)?;
                    }
                    self.globals.current_scope().exit_scope();
                }
                Ok(())
            }
            Stmt::While { cond, body, label, loc } => {
                self.analyze_expr(cond)?;
                self.require_integral_condition(cond, *loc)?;
                let lbl = self.push_loop_label();
                *label = Some(lbl);
                self.globals.current_scope().enter_scope();
                for s in body.iter_mut() {
                    self.analyze_stmt(s, return_ty)?;
                }
                self.globals.current_scope().exit_scope();
                self.pop_loop_label();
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                post,
                body,
                label,
                loc,
            } => {
                self.globals.current_scope().enter_scope();
                if let Some(init_stmt) = init {
                    self.analyze_stmt(init_stmt, return_ty)?;
                }
                if let Some(cond_expr) = cond {
                    self.analyze_expr(cond_expr)?;
                    self.require_integral_condition(cond_expr, *loc)?;
                }
                if let Some(post_expr) = post {
                    self.analyze_expr(post_expr)?;
                }
                let lbl = self.push_loop_label();
                *label = Some(lbl);
                for s in body.iter_mut() {
                    self.analyze_stmt(s, return_ty)?;
                }
                self.pop_loop_label();
                self.globals.current_scope().exit_scope();
                Ok(())
            }
            Stmt::LoopControl { label, loc, .. } => {
                let current = self
                    .loop_labels
                    .last()
                    .cloned()
                    .ok_or_else(|| SemanticError::new(*loc, "break/continue outside a loop"))?;
                *label = Some(current);
                Ok(())
            }
            Stmt::Block(stmts) => {
                self.globals.current_scope().enter_scope();
                for s in stmts.iter_mut() {
                    self.analyze_stmt(s, return_ty)?;
                }
                self.globals.current_scope().exit_scope();
                Ok(())
            }
        }
    }

    fn analyze_var_decl(&mut self, decl: &mut VarDecl) -> Result<(), SemanticError> {
        if let Some(init) = &mut decl.init {
            self.analyze_expr(init)?;
        }
        let sym = if decl.specifier == Specifier::Static {
            self.globals.current_scope().declare_static_var(&decl.name, decl.ty.clone())
        } else {
            self.globals.current_scope().declare_var(&decl.name, decl.ty.clone())
        };
        decl.resolved_name = Some(sym.unique_name);
        Ok(())
    }

    fn push_loop_label(&mut self) -> String {
        let id = self.next_loop_id;
        self.next_loop_id += 1;
        let label = format!("Lloop{id}");
        self.loop_labels.push(label.clone());
        label
    }

    fn pop_loop_label(&mut self) {
        self.loop_labels.pop();
    }

    fn require_integral_condition(&self, expr: &Expr, loc: SourceLocation) -> Result<(), SemanticError> {
        if expr.ty.is_integral() || expr.ty.is_pointer() {
            Ok(())
        } else {
            Err(SemanticError::new(loc, "condition must be an integral expression"))
        }
    }

    fn require_assignable(
        &self,
        target_ty: &Type,
        expr: &mut Expr,
        loc: SourceLocation,
        what: &str,
    ) -> Result<(), SemanticError> {
        let rhs_is_zero = matches!(&expr.kind, ExprKind::IntLiteral(0));
        if target_ty.assign_compatible(&expr.ty, rhs_is_zero) {
            if *target_ty != expr.ty {
                self.insert_cast(expr, target_ty.clone());
            }
            Ok(())
        } else {
            Err(SemanticError::new(
                loc,
                format!("cannot assign '{}' to {what} of type '{target_ty}'", expr.ty),
            ))
        }
    }

    fn insert_cast(&self, expr: &mut Expr, target_ty: Type) {
        let loc = expr.loc;
        let inner = std::mem::replace(expr, Expr::new(ExprKind::BoolLiteral(false), loc));
        *expr = Expr::new(
            ExprKind::Cast {
                target_ty: target_ty.clone(),
                expr: Box::new(inner),
            },
            loc,
        );
        expr.ty = target_ty;
    }

    fn analyze_expr(&mut self, expr: &mut Expr) -> Result<(), SemanticError> {
        let loc = expr.loc;
        match &mut expr.kind {
            ExprKind::IntLiteral(_) => expr.ty = Type::new(BaseType::Int),
            ExprKind::LongLiteral(_) => expr.ty = Type::new(BaseType::Long),
            ExprKind::UIntLiteral(_) => expr.ty = Type::new(BaseType::UInt),
            ExprKind::ULongLiteral(_) => expr.ty = Type::new(BaseType::ULong),
            ExprKind::DoubleLiteral(_) => expr.ty = Type::new(BaseType::Double),
            ExprKind::CharLiteral(_) => expr.ty = Type::new(BaseType::Char),
            ExprKind::BoolLiteral(_) => expr.ty = Type::new(BaseType::Bool),
            ExprKind::StringLiteral(_) => {
                // String literals decay to char* at every use site (spec.md
                // §4.2), routed to the cstring pool by the TAC generator
                // via the symbol's `is_string` flag.
                expr.ty = Type::new(BaseType::Char).pointer_to();
            }
            ExprKind::CompoundInit(elems) => {
                for e in elems.iter_mut() {
                    self.analyze_expr(e)?;
                }
                // The element type is resolved against the declared
                // variable type by `analyze_var_decl`'s caller context; as
                // a standalone expression its type is simply the first
                // element's (compound inits only appear in decl position).
                expr.ty = elems.first().map(|e| e.ty.clone()).unwrap_or_else(Type::void);
            }
            ExprKind::Var { name, resolved_name } => {
                let sym = self
                    .globals
                    .lookup(name)
                    .ok_or_else(|| SemanticError::new(loc, format!("use of undeclared identifier '{name}'")))?;
                *resolved_name = Some(sym.unique_name.clone());
                expr.ty = sym.ty.clone();
            }
            ExprKind::Assign { target, value } => {
                self.analyze_lvalue(target)?;
                self.analyze_expr(value)?;
                let target_ty = target.ty.clone();
                self.require_assignable(&target_ty, value, loc, "variable")?;
                expr.ty = target_ty;
            }
            ExprKind::Unary { op, operand } => {
                self.analyze_expr(operand)?;
                match op {
                    UnaryOp::Not => expr.ty = Type::new(BaseType::Bool),
                    UnaryOp::PreIncrement | UnaryOp::PreDecrement => {
                        self.require_lvalue(operand, loc)?;
                        expr.ty = operand.ty.clone();
                    }
                    UnaryOp::Negate | UnaryOp::Complement => expr.ty = operand.ty.clone(),
                }
            }
            ExprKind::Postfix { operand, .. } => {
                self.analyze_expr(operand)?;
                self.require_lvalue(operand, loc)?;
                expr.ty = operand.ty.clone();
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.analyze_expr(lhs)?;
                self.analyze_expr(rhs)?;
                expr.ty = self.infer_binary(*op, lhs, rhs, loc)?;
            }
            ExprKind::FieldAccess { base, field, via_pointer } => {
                self.analyze_expr(base)?;
                let struct_ty = if *via_pointer {
                    if !base.ty.is_pointer() {
                        return Err(SemanticError::new(loc, "'->' requires a pointer-to-struct operand"));
                    }
                    base.ty.pointee()
                } else {
                    if !base.ty.is_struct() {
                        return Err(SemanticError::new(loc, "'.' requires a struct lvalue"));
                    }
                    base.ty.clone()
                };
                let f = struct_ty
                    .field(field)
                    .ok_or_else(|| SemanticError::new(loc, format!("no field named '{field}'")))?;
                expr.ty = f.ty.clone();
            }
            ExprKind::Cast { target_ty, expr: inner } => {
                self.analyze_expr(inner)?;
                if !target_ty.convert_compatible(&inner.ty, is_zero_literal(inner)) {
                    return Err(SemanticError::new(
                        loc,
                        format!("cannot cast '{}' to '{target_ty}'", inner.ty),
                    ));
                }
                expr.ty = target_ty.clone();
            }
            ExprKind::Deref(inner) => {
                self.analyze_expr(inner)?;
                if !inner.ty.is_pointer() {
                    return Err(SemanticError::new(loc, "'*' requires a pointer operand"));
                }
                expr.ty = inner.ty.pointee();
            }
            ExprKind::AddrOf(inner) => {
                self.analyze_expr(inner)?;
                self.require_lvalue(inner, loc)?;
                expr.ty = if inner.ty.is_array() {
                    inner.ty.element_type().pointer_to()
                } else {
                    inner.ty.clone().pointer_to()
                };
            }
            ExprKind::Index { base, index } => {
                self.analyze_expr(base)?;
                self.analyze_expr(index)?;
                if !base.ty.is_array() && !base.ty.is_pointer() {
                    return Err(SemanticError::new(loc, "indexed expression must be an array or pointer"));
                }
                if !index.ty.is_integral() {
                    return Err(SemanticError::new(loc, "array index must be an integral expression"));
                }
                expr.ty = if base.ty.is_array() {
                    base.ty.element_type()
                } else {
                    base.ty.pointee()
                };
            }
            ExprKind::Call { name, args } => {
                for a in args.iter_mut() {
                    self.analyze_expr(a)?;
                }
                let func = self
                    .globals
                    .functions
                    .get(name)
                    .cloned()
                    .ok_or_else(|| SemanticError::new(loc, format!("call to undeclared function '{name}'")))?;
                if func.param_types.len() != args.len() {
                    return Err(SemanticError::new(
                        loc,
                        format!(
                            "'{name}' expects {} argument(s), got {}",
                            func.param_types.len(),
                            args.len()
                        ),
                    ));
                }
                for (param_ty, arg) in func.param_types.iter().zip(args.iter_mut()) {
                    self.require_assignable(param_ty, arg, loc, "argument")?;
                }
                expr.ty = func.return_ty.clone();
            }
        }
        Ok(())
    }

    /// Validates `&`'s operand and pre/post-increment targets: must be a
    /// variable, dereference, index, or field access (spec.md §4.5).
    fn require_lvalue(&self, expr: &Expr, loc: SourceLocation) -> Result<(), SemanticError> {
        match &expr.kind {
            ExprKind::Var { .. } | ExprKind::Deref(_) | ExprKind::Index { .. } | ExprKind::FieldAccess { .. } => Ok(()),
            _ => Err(SemanticError::new(loc, "expression is not an lvalue")),
        }
    }

    fn analyze_lvalue(&mut self, expr: &mut Expr) -> Result<(), SemanticError> {
        self.analyze_expr(expr)?;
        self.require_lvalue(expr, expr.loc)
    }

    fn infer_binary(&self, op: BinOp, lhs: &Expr, rhs: &Expr, loc: SourceLocation) -> Result<Type, SemanticError> {
        use BinOp::*;
        match op {
            And | Or => Ok(Type::new(BaseType::Bool)),
            Eq | NotEq | Lt | Gt | Le | Ge => Ok(Type::new(BaseType::Bool)),
            Add | Sub if lhs.ty.is_pointer() || rhs.ty.is_pointer() => {
                let ptr_ty = if lhs.ty.is_pointer() { &lhs.ty } else { &rhs.ty };
                Ok(ptr_ty.clone())
            }
            Add | Sub | Mul | Div | Mod => {
                if !lhs.ty.is_integral() && !lhs.ty.is_floating() {
                    return Err(SemanticError::new(loc, "left operand of arithmetic must be numeric"));
                }
                if !rhs.ty.is_integral() && !rhs.ty.is_floating() {
                    return Err(SemanticError::new(loc, "right operand of arithmetic must be numeric"));
                }
                Ok(promote_numeric(&lhs.ty, &rhs.ty))
            }
        }
    }
}

impl Default for SemanticAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_zero_literal(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::IntLiteral(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn analyze(src: &str) -> Result<GlobalSymbolTable, SemanticError> {
        let mut program = Parser::parse(src).expect("parse");
        SemanticAnalyzer::new().analyze(&mut program)
    }

    #[test]
    fn resolves_simple_function() {
        assert!(analyze("fn main() -> int { return 2 + 3 * 4; }").is_ok());
    }

    #[test]
    fn use_before_declare_is_an_error() {
        let err = analyze("fn main() -> int { return x; }").unwrap_err();
        assert!(err.message.contains("undeclared"));
    }

    #[test]
    fn every_expression_gets_a_non_void_type() {
        let mut program = Parser::parse("fn main() -> int { int a = 2 + 3; return a; }").unwrap();
        SemanticAnalyzer::new().analyze(&mut program).unwrap();
        let TopLevel::Func(f) = &program.items[0] else { unreachable!() };
        let Stmt::VarDecl(decl) = &f.body.as_ref().unwrap()[0] else { unreachable!() };
        assert_ne!(decl.init.as_ref().unwrap().ty, Type::void());
    }

    #[test]
    fn assigning_double_to_int_without_cast_is_rejected() {
        let err = analyze("fn main() -> int { int a; double d = 1.5; a = d; return a; }").unwrap_err();
        assert!(err.message.contains("cannot assign"));
    }

    #[test]
    fn break_outside_loop_is_an_error() {
        let err = analyze("fn main() -> int { break; return 0; }").unwrap_err();
        assert!(err.message.contains("outside a loop"));
    }

    #[test]
    fn loop_labels_are_distinct_per_loop() {
        let mut program = Parser::parse(
            "fn main() -> int { while (1) { break; } while (1) { break; } return 0; }",
        )
        .unwrap();
        SemanticAnalyzer::new().analyze(&mut program).unwrap();
        let TopLevel::Func(f) = &program.items[0] else { unreachable!() };
        let body = f.body.as_ref().unwrap();
        let Stmt::While { label: l1, .. } = &body[0] else { unreachable!() };
        let Stmt::While { label: l2, .. } = &body[1] else { unreachable!() };
        assert_ne!(l1, l2);
    }

    #[test]
    fn call_argument_count_mismatch_is_an_error() {
        let err = analyze(
            "fn add(int a, int b) -> int { return a + b; } fn main() -> int { return add(1); }",
        )
        .unwrap_err();
        assert!(err.message.contains("expects"));
    }

    #[test]
    fn field_access_on_non_struct_is_an_error() {
        let err = analyze("fn main() -> int { int a; return a.x; }").unwrap_err();
        assert!(err.message.contains("struct lvalue"));
    }
}
