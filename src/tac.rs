//! Three-address code: AST → a flat instruction list over named temporaries
//! (spec.md §4.6).
//!
//! Operands are the typed form spec.md §9's design notes recommend over raw
//! strings (`Operand::Name | ImmInt | ImmFloat | Label | None`), so the
//! assembler never re-parses operand text.

use crate::ast::*;
use crate::error::SemanticError;
use crate::global_symtab::GlobalSymbolTable;
use crate::symtab::Linkage;
use crate::types::{BaseType, Type};

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Name(String),
    ImmInt(i64),
    ImmFloat(f64),
    Label(String),
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TacOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    FuncBegin,
    FuncEnd,
    Return,
    Assign,
    Goto,
    If,
    IfNot,
    Label,
    Negate,
    Complement,
    Not,
    Increment,
    Decrement,
    Nop,
    Mov,
    Push,
    Call,
    EnterText,
    EnterData,
    EnterBss,
    EnterLiteral8,
    EnterCstring,
    ConvertType,
    AddrOf,
    Deref,
    /// Bind incoming argument `arg1` (an `ImmInt` register index) to the
    /// parameter named by `result`. Emitted once per parameter, right after
    /// `FuncBegin`; the assembler is the only consumer.
    BindParam,
    /// Store `arg2` through the address held in `arg1` — used for
    /// assignment through a computed lvalue (`*p = v`, `a[i] = v`,
    /// `s.f = v`), where `result` alone couldn't carry "this name denotes
    /// an address, not a location".
    StoreIndirect,
}

#[derive(Debug, Clone)]
pub struct TacInstruction {
    pub op: TacOp,
    pub arg1: Operand,
    pub arg2: Operand,
    pub result: Operand,
    pub ty: Type,
}

impl TacInstruction {
    fn new(op: TacOp, arg1: Operand, arg2: Operand, result: Operand, ty: Type) -> Self {
        TacInstruction { op, arg1, arg2, result, ty }
    }
}

/// Monotonic, module-wide counters for temporaries and labels (spec.md
/// §4.6: "counters are monotonic within the whole module").
pub struct TacGenerator<'a> {
    globals: &'a mut GlobalSymbolTable,
    instructions: Vec<TacInstruction>,
    temp_counter: usize,
    label_counter: usize,
    current_function: String,
}

impl<'a> TacGenerator<'a> {
    pub fn new(globals: &'a mut GlobalSymbolTable) -> Self {
        TacGenerator {
            globals,
            instructions: Vec::new(),
            temp_counter: 0,
            label_counter: 0,
            current_function: String::new(),
        }
    }

    pub fn generate(mut self, program: &Program) -> Result<Vec<TacInstruction>, SemanticError> {
        // Section ordering per spec.md §4.6/§5: text, data, bss, literal8,
        // cstring. Globals are partitioned up front so functions (already
        // naturally "text") don't need to interleave with data emission.
        self.emit(TacOp::EnterText, Operand::None, Operand::None, Operand::None, Type::void());
        for item in &program.items {
            if let TopLevel::Func(f) = item {
                if f.body.is_some() {
                    self.gen_function(f)?;
                }
            }
        }

        let mut initialized = Vec::new();
        let mut zeroed = Vec::new();
        for item in &program.items {
            if let TopLevel::Var(v) = item {
                if v.specifier == Specifier::Extern {
                    continue;
                }
                if v.init.is_some() {
                    initialized.push(v);
                } else {
                    zeroed.push(v);
                }
            }
        }
        // Function-local `static` variables get the same file-scope storage
        // as a global, under their mangled `<func>.<name>.static` name
        // (spec.md §4.4); their initializer runs once, at load time, not on
        // every call, so `gen_var_decl` skips them entirely.
        for item in &program.items {
            if let TopLevel::Func(f) = item {
                if let Some(body) = &f.body {
                    collect_static_locals(body, &mut initialized, &mut zeroed);
                }
            }
        }

        self.emit(TacOp::EnterData, Operand::None, Operand::None, Operand::None, Type::void());
        for v in initialized {
            self.gen_global_init_named(v, v.resolved_name.as_deref().unwrap_or(&v.name))?;
        }

        self.emit(TacOp::EnterBss, Operand::None, Operand::None, Operand::None, Type::void());
        for v in zeroed {
            self.emit(
                TacOp::Assign,
                Operand::None,
                Operand::None,
                Operand::Name(v.resolved_name.clone().unwrap_or_else(|| v.name.clone())),
                v.ty.clone(),
            );
        }

        self.emit(TacOp::EnterLiteral8, Operand::None, Operand::None, Operand::None, Type::void());
        self.emit(TacOp::EnterCstring, Operand::None, Operand::None, Operand::None, Type::void());

        Ok(self.instructions)
    }

    fn emit(&mut self, op: TacOp, arg1: Operand, arg2: Operand, result: Operand, ty: Type) {
        self.instructions.push(TacInstruction::new(op, arg1, arg2, result, ty));
    }

    fn new_temp(&mut self, ty: Type) -> Operand {
        let name = format!("t{}", self.temp_counter);
        self.temp_counter += 1;
        self.globals.current_scope().declare_temp(ty);
        Operand::Name(name)
    }

    fn new_label(&mut self, tag: &str) -> String {
        let id = self.label_counter;
        self.label_counter += 1;
        format!("L{tag}{id}")
    }

    fn gen_global_init_named(&mut self, v: &VarDecl, name: &str) -> Result<(), SemanticError> {
        // Global initializers must already be constant per this language's
        // scope (no runtime code executes before `main`); emit the literal
        // value directly rather than routing through a temp. Compound
        // (array) initializers aren't supported on globals/statics yet —
        // reject rather than silently emit a wrongly-sized `.data` entry.
        let value = match &v.init.as_ref().unwrap().kind {
            ExprKind::IntLiteral(n) | ExprKind::LongLiteral(n) => Operand::ImmInt(*n),
            ExprKind::UIntLiteral(n) | ExprKind::ULongLiteral(n) => Operand::ImmInt(*n as i64),
            ExprKind::DoubleLiteral(f) => Operand::ImmFloat(*f),
            ExprKind::BoolLiteral(b) => Operand::ImmInt(*b as i64),
            ExprKind::CharLiteral(c) => Operand::ImmInt(*c as i64),
            _ => {
                return Err(SemanticError::new(
                    v.loc,
                    format!("'{name}' has an initializer too complex for a global/static constant"),
                ));
            }
        };
        self.emit(TacOp::Assign, Operand::None, value, Operand::Name(name.to_string()), v.ty.clone());
        Ok(())
    }

    fn gen_function(&mut self, f: &FuncDecl) -> Result<(), SemanticError> {
        self.current_function = f.name.clone();
        self.globals.set_current_function(Some(&f.name));
        let linkage = if f.specifier == Specifier::Static {
            Linkage::Internal
        } else {
            Linkage::External
        };
        self.emit(
            TacOp::FuncBegin,
            Operand::Name(f.name.clone()),
            Operand::ImmInt(matches!(linkage, Linkage::External) as i64),
            Operand::None,
            f.return_ty.clone(),
        );
        // `arg1` is a per-class register index, not the raw parameter
        // position: the x86-64 System V ABI hands out integer and SSE
        // argument registers from two independent counters, so a `double`
        // parameter doesn't consume an integer slot and vice versa. `call.rs`
        // counts call-site arguments the same way.
        let mut int_idx = 0i64;
        let mut sse_idx = 0i64;
        for param in &f.params {
            let name = param.resolved_name.clone().unwrap_or_else(|| param.name.clone());
            let index = if param.ty.is_floating() {
                let i = sse_idx;
                sse_idx += 1;
                i
            } else {
                let i = int_idx;
                int_idx += 1;
                i
            };
            self.emit(
                TacOp::BindParam,
                Operand::ImmInt(index),
                Operand::None,
                Operand::Name(name),
                param.ty.clone(),
            );
        }
        for stmt in f.body.as_ref().unwrap() {
            self.gen_stmt(stmt)?;
        }
        self.emit(TacOp::FuncEnd, Operand::Name(f.name.clone()), Operand::None, Operand::None, Type::void());
        self.globals.set_current_function(None);
        Ok(())
    }

    fn gen_stmt(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Return { value, .. } => {
                let operand = match value {
                    Some(expr) => self.gen_expr(expr)?,
                    None => Operand::None,
                };
                self.emit(TacOp::Return, operand, Operand::None, Operand::None, Type::void());
                Ok(())
            }
            Stmt::VarDecl(decl) => self.gen_var_decl(decl),
            Stmt::ExprStmt(expr) => {
                self.gen_expr(expr)?;
                Ok(())
            }
            Stmt::If { cond, then_branch, else_branch, .. } => {
                let cond_operand = self.gen_expr(cond)?;
                let else_label = self.new_label("else");
                let end_label = self.new_label("endif");
                self.emit(
                    TacOp::IfNot,
                    cond_operand,
                    Operand::None,
                    Operand::Label(else_label.clone()),
                    Type::void(),
                );
                for s in then_branch {
                    self.gen_stmt(s)?;
                }
                self.emit(TacOp::Goto, Operand::None, Operand::None, Operand::Label(end_label.clone()), Type::void());
                self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(else_label), Type::void());
                if let Some(else_stmts) = else_branch {
                    for s in else_stmts {
                        self.gen_stmt(s)?;
                    }
                }
                self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(end_label), Type::void());
                Ok(())
            }
            Stmt::While { cond, body, label, .. } => {
                let label = label.as_ref().expect("loop label assigned by semantic analysis");
                let start = format!("{label}_start");
                let end = format!("{label}_end");
                self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(start.clone()), Type::void());
                let cond_operand = self.gen_expr(cond)?;
                self.emit(TacOp::IfNot, cond_operand, Operand::None, Operand::Label(end.clone()), Type::void());
                for s in body {
                    self.gen_stmt(s)?;
                }
                self.emit(TacOp::Goto, Operand::None, Operand::None, Operand::Label(start), Type::void());
                self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(end), Type::void());
                Ok(())
            }
            Stmt::For { init, cond, post, body, label, .. } => {
                if let Some(init_stmt) = init {
                    self.gen_stmt(init_stmt)?;
                }
                let label = label.as_ref().expect("loop label assigned by semantic analysis");
                let start = format!("{label}_start");
                let end = format!("{label}_end");
                self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(start.clone()), Type::void());
                if let Some(cond_expr) = cond {
                    let cond_operand = self.gen_expr(cond_expr)?;
                    self.emit(TacOp::IfNot, cond_operand, Operand::None, Operand::Label(end.clone()), Type::void());
                }
                for s in body {
                    self.gen_stmt(s)?;
                }
                if let Some(post_expr) = post {
                    self.gen_expr(post_expr)?;
                }
                self.emit(TacOp::Goto, Operand::None, Operand::None, Operand::Label(start), Type::void());
                self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(end), Type::void());
                Ok(())
            }
            Stmt::LoopControl { kind, label, .. } => {
                let label = label.as_ref().expect("loop label resolved by semantic analysis");
                let target = match kind {
                    LoopKind::Break => format!("{label}_end"),
                    LoopKind::Continue => format!("{label}_start"),
                };
                self.emit(TacOp::Goto, Operand::None, Operand::None, Operand::Label(target), Type::void());
                Ok(())
            }
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.gen_stmt(s)?;
                }
                Ok(())
            }
        }
    }

    fn gen_var_decl(&mut self, decl: &VarDecl) -> Result<(), SemanticError> {
        if decl.specifier == Specifier::Static {
            // Already emitted once in the data/bss section by `generate`.
            return Ok(());
        }
        let name = decl.resolved_name.clone().unwrap_or_else(|| decl.name.clone());
        // A `Nop` carrying the full declared type, so the assembler's frame
        // layout sees the real size even when the value-bearing instructions
        // below only carry an element type (array initializers).
        self.emit(TacOp::Nop, Operand::None, Operand::None, Operand::Name(name.clone()), decl.ty.clone());
        match &decl.init {
            None => Ok(()),
            Some(Expr { kind: ExprKind::CompoundInit(elems), .. }) => {
                let elem_ty = decl.ty.element_type();
                for (i, elem) in elems.iter().enumerate() {
                    let value = self.gen_expr(elem)?;
                    self.emit(
                        TacOp::Assign,
                        Operand::ImmInt(i as i64),
                        value,
                        Operand::Name(name.clone()),
                        elem_ty.clone(),
                    );
                }
                Ok(())
            }
            Some(init) => {
                let value = self.gen_expr(init)?;
                self.emit(TacOp::Assign, Operand::None, value, Operand::Name(name), decl.ty.clone());
                Ok(())
            }
        }
    }

    fn gen_expr(&mut self, expr: &Expr) -> Result<Operand, SemanticError> {
        match &expr.kind {
            ExprKind::IntLiteral(n) | ExprKind::LongLiteral(n) => Ok(Operand::ImmInt(*n)),
            ExprKind::UIntLiteral(n) | ExprKind::ULongLiteral(n) => Ok(Operand::ImmInt(*n as i64)),
            ExprKind::DoubleLiteral(f) => Ok(Operand::ImmFloat(*f)),
            ExprKind::BoolLiteral(b) => Ok(Operand::ImmInt(*b as i64)),
            ExprKind::CharLiteral(c) => Ok(Operand::ImmInt(*c as i64)),
            ExprKind::StringLiteral(s) => {
                let label = self.globals.current_scope().declare_string();
                self.emit(
                    TacOp::Assign,
                    Operand::None,
                    Operand::Name(format!("\"{s}\"")),
                    Operand::Name(label.clone()),
                    expr.ty.clone(),
                );
                Ok(Operand::Name(label))
            }
            ExprKind::Var { resolved_name, name } => {
                Ok(Operand::Name(resolved_name.clone().unwrap_or_else(|| name.clone())))
            }
            ExprKind::CompoundInit(_) => {
                unreachable!("compound initializers only occur in variable-declaration position")
            }
            ExprKind::Assign { target, value } => {
                let rhs = self.gen_expr(value)?;
                match &target.kind {
                    ExprKind::Var { .. } => {
                        let dst = self.gen_lvalue_target(target)?;
                        self.emit(TacOp::Assign, Operand::None, rhs.clone(), dst, expr.ty.clone());
                    }
                    _ => {
                        // Assignment through a computed address (`*p`, `a[i]`,
                        // `s.f`): the lvalue helper returns the address, not
                        // a nameable location, so this stores indirectly
                        // rather than through a plain `Assign`.
                        let addr = self.gen_lvalue_target(target)?;
                        self.emit(TacOp::StoreIndirect, addr, rhs.clone(), Operand::None, expr.ty.clone());
                    }
                }
                Ok(rhs)
            }
            ExprKind::Unary { op, operand } => self.gen_unary(*op, operand, &expr.ty),
            ExprKind::Postfix { op, operand } => self.gen_postfix(*op, operand, &expr.ty),
            ExprKind::Binary { op, lhs, rhs } => self.gen_binary(*op, lhs, rhs, &expr.ty),
            ExprKind::FieldAccess { .. } => self.gen_field_access(expr),
            ExprKind::Cast { target_ty, expr: inner } => {
                let src = self.gen_expr(inner)?;
                let dst = self.new_temp(target_ty.clone());
                // `ty` carries the target type; the source type isn't
                // carried here at all — the assembler recovers it from
                // `src` itself via the locals/globals tables (or, for a
                // bare immediate, infers it from the operand's own kind).
                self.emit(TacOp::ConvertType, src, Operand::None, dst.clone(), target_ty.clone());
                Ok(dst)
            }
            ExprKind::Deref(inner) => {
                let ptr = self.gen_expr(inner)?;
                let dst = self.new_temp(expr.ty.clone());
                self.emit(TacOp::Deref, ptr, Operand::None, dst.clone(), expr.ty.clone());
                Ok(dst)
            }
            ExprKind::AddrOf(inner) => {
                let operand = self.gen_lvalue_target(inner)?;
                let dst = self.new_temp(expr.ty.clone());
                self.emit(TacOp::AddrOf, operand, Operand::None, dst.clone(), expr.ty.clone());
                Ok(dst)
            }
            ExprKind::Index { base, index } => self.gen_index(base, index, &expr.ty),
            ExprKind::Call { name, args } => {
                let mut arg_operands = Vec::with_capacity(args.len());
                for a in args {
                    let value = self.gen_expr(a)?;
                    arg_operands.push((value, a.ty.clone()));
                }
                for (value, ty) in &arg_operands {
                    self.emit(TacOp::Push, value.clone(), Operand::None, Operand::None, ty.clone());
                }
                let dst = self.new_temp(expr.ty.clone());
                self.emit(
                    TacOp::Call,
                    Operand::Name(name.clone()),
                    Operand::ImmInt(args.len() as i64),
                    dst.clone(),
                    expr.ty.clone(),
                );
                Ok(dst)
            }
        }
    }

    /// Resolve an lvalue expression to the operand TAC should write into —
    /// a plain name for a variable, or a temp holding the computed address
    /// for `*p`/`a[i]`/`s.f` (the assembler dereferences it on store).
    fn gen_lvalue_target(&mut self, expr: &Expr) -> Result<Operand, SemanticError> {
        match &expr.kind {
            ExprKind::Var { resolved_name, name } => {
                Ok(Operand::Name(resolved_name.clone().unwrap_or_else(|| name.clone())))
            }
            ExprKind::Deref(inner) => self.gen_expr(inner),
            ExprKind::Index { base, index } => self.gen_index_address(base, index),
            ExprKind::FieldAccess { .. } => self.gen_field_address(expr),
            _ => unreachable!("semantic analysis already rejected non-lvalue assignment targets"),
        }
    }

    fn gen_unary(&mut self, op: UnaryOp, operand: &Expr, ty: &Type) -> Result<Operand, SemanticError> {
        let src = self.gen_expr(operand)?;
        match op {
            UnaryOp::Negate => {
                let dst = self.new_temp(ty.clone());
                self.emit(TacOp::Negate, src, Operand::None, dst.clone(), ty.clone());
                Ok(dst)
            }
            UnaryOp::Complement => {
                let dst = self.new_temp(ty.clone());
                self.emit(TacOp::Complement, src, Operand::None, dst.clone(), ty.clone());
                Ok(dst)
            }
            UnaryOp::Not => {
                let dst = self.new_temp(ty.clone());
                self.emit(TacOp::Not, src, Operand::None, dst.clone(), ty.clone());
                Ok(dst)
            }
            UnaryOp::PreIncrement | UnaryOp::PreDecrement => {
                let tac_op = if op == UnaryOp::PreIncrement { TacOp::Increment } else { TacOp::Decrement };
                let target = self.gen_lvalue_target(operand)?;
                self.emit(tac_op, src, Operand::None, target.clone(), ty.clone());
                Ok(target)
            }
        }
    }

    fn gen_postfix(&mut self, op: PostfixOp, operand: &Expr, ty: &Type) -> Result<Operand, SemanticError> {
        let old_value = self.gen_expr(operand)?;
        let saved = self.new_temp(ty.clone());
        self.emit(TacOp::Assign, Operand::None, old_value.clone(), saved.clone(), ty.clone());
        let tac_op = if op == PostfixOp::PostIncrement { TacOp::Increment } else { TacOp::Decrement };
        let target = self.gen_lvalue_target(operand)?;
        self.emit(tac_op, old_value, Operand::None, target, ty.clone());
        Ok(saved)
    }

    fn gen_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, ty: &Type) -> Result<Operand, SemanticError> {
        match op {
            BinOp::And => self.gen_short_circuit_and(lhs, rhs, ty),
            BinOp::Or => self.gen_short_circuit_or(lhs, rhs, ty),
            _ => {
                let l = self.gen_expr(lhs)?;
                let r = self.gen_expr(rhs)?;
                let tac_op = match op {
                    BinOp::Add => TacOp::Add,
                    BinOp::Sub => TacOp::Sub,
                    BinOp::Mul => TacOp::Mul,
                    BinOp::Div => TacOp::Div,
                    BinOp::Mod => TacOp::Mod,
                    BinOp::Eq => TacOp::Eq,
                    BinOp::NotEq => TacOp::Ne,
                    BinOp::Lt => TacOp::Lt,
                    BinOp::Le => TacOp::Le,
                    BinOp::Gt => TacOp::Gt,
                    BinOp::Ge => TacOp::Ge,
                    BinOp::And | BinOp::Or => unreachable!(),
                };
                // The operand type actually carried by the op is the
                // promoted operand type (for arithmetic) or the promoted
                // type of the comparands (comparisons still compare at full
                // width even though the *result* is bool).
                let operand_ty = if matches!(
                    op,
                    BinOp::Eq | BinOp::NotEq | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
                ) {
                    crate::types::promote_numeric(&lhs.ty, &rhs.ty)
                } else {
                    ty.clone()
                };
                let dst = self.new_temp(ty.clone());
                self.emit(tac_op, l, r, dst.clone(), operand_ty);
                Ok(dst)
            }
        }
    }

    /// `a && b`: if `a` is false, short-circuit to `false`; else the result
    /// is `b`'s truthiness (spec.md §4.6).
    fn gen_short_circuit_and(&mut self, lhs: &Expr, rhs: &Expr, ty: &Type) -> Result<Operand, SemanticError> {
        let result = self.new_temp(ty.clone());
        let false_label = self.new_label("andfalse");
        let end_label = self.new_label("andend");
        let l = self.gen_expr(lhs)?;
        self.emit(TacOp::IfNot, l, Operand::None, Operand::Label(false_label.clone()), Type::void());
        let r = self.gen_expr(rhs)?;
        self.emit(TacOp::Assign, Operand::None, r, result.clone(), ty.clone());
        self.emit(TacOp::Goto, Operand::None, Operand::None, Operand::Label(end_label.clone()), Type::void());
        self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(false_label), Type::void());
        self.emit(TacOp::Assign, Operand::None, Operand::ImmInt(0), result.clone(), ty.clone());
        self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(end_label), Type::void());
        Ok(result)
    }

    /// `a || b`: if `a` is true, short-circuit to `true`; else the result
    /// is `b`'s truthiness.
    fn gen_short_circuit_or(&mut self, lhs: &Expr, rhs: &Expr, ty: &Type) -> Result<Operand, SemanticError> {
        let result = self.new_temp(ty.clone());
        let true_label = self.new_label("ortrue");
        let end_label = self.new_label("orend");
        let l = self.gen_expr(lhs)?;
        self.emit(TacOp::If, l, Operand::None, Operand::Label(true_label.clone()), Type::void());
        let r = self.gen_expr(rhs)?;
        self.emit(TacOp::Assign, Operand::None, r, result.clone(), ty.clone());
        self.emit(TacOp::Goto, Operand::None, Operand::None, Operand::Label(end_label.clone()), Type::void());
        self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(true_label), Type::void());
        self.emit(TacOp::Assign, Operand::None, Operand::ImmInt(1), result.clone(), ty.clone());
        self.emit(TacOp::Label, Operand::None, Operand::None, Operand::Label(end_label), Type::void());
        Ok(result)
    }

    /// `a[i]` as an rvalue: load through the computed address, with the
    /// constant-index-on-stack-array shortcut spec.md §4.6 calls out
    /// encoded as a plain `Mul`/`Add` pair the assembler can fold when it
    /// sees a `Name` base and an `ImmInt` index.
    fn gen_index(&mut self, base: &Expr, index: &Expr, elem_ty: &Type) -> Result<Operand, SemanticError> {
        let addr = self.gen_index_address(base, index)?;
        let dst = self.new_temp(elem_ty.clone());
        self.emit(TacOp::Deref, addr, Operand::None, dst.clone(), elem_ty.clone());
        Ok(dst)
    }

    fn gen_index_address(&mut self, base: &Expr, index: &Expr) -> Result<Operand, SemanticError> {
        let elem_size = if base.ty.is_array() {
            base.ty.element_type().size()
        } else {
            base.ty.pointee().size()
        } as i64;
        let base_operand = if base.ty.is_array() {
            self.gen_lvalue_target(base)?
        } else {
            self.gen_expr(base)?
        };
        let index_operand = self.gen_expr(index)?;
        let scaled = self.new_temp(Type::new(BaseType::Long));
        self.emit(TacOp::Mul, index_operand, Operand::ImmInt(elem_size), scaled.clone(), Type::new(BaseType::Long));
        let addr = self.new_temp(Type::new(BaseType::Long).pointer_to());
        self.emit(
            if base.ty.is_array() { TacOp::AddrOf } else { TacOp::Mov },
            base_operand,
            Operand::None,
            addr.clone(),
            Type::new(BaseType::Long).pointer_to(),
        );
        let final_addr = self.new_temp(Type::new(BaseType::Long).pointer_to());
        self.emit(TacOp::Add, addr, scaled, final_addr.clone(), Type::new(BaseType::Long).pointer_to());
        Ok(final_addr)
    }

    fn gen_field_access(&mut self, expr: &Expr) -> Result<Operand, SemanticError> {
        let addr = self.gen_field_address(expr)?;
        let dst = self.new_temp(expr.ty.clone());
        self.emit(TacOp::Deref, addr, Operand::None, dst.clone(), expr.ty.clone());
        Ok(dst)
    }

    fn gen_field_address(&mut self, expr: &Expr) -> Result<Operand, SemanticError> {
        let ExprKind::FieldAccess { base, field, via_pointer } = &expr.kind else {
            unreachable!()
        };
        let struct_ty = if *via_pointer { base.ty.pointee() } else { base.ty.clone() };
        let offset = struct_ty.field(field).map(|f| f.offset).unwrap_or(0) as i64;
        let base_addr = if *via_pointer {
            self.gen_expr(base)?
        } else {
            self.gen_lvalue_target(base)?
        };
        let addr = self.new_temp(expr.ty.clone().pointer_to());
        // `base_addr` is already a pointer value when reached through `->`
        // (a plain copy into `addr`); reached through `.` it's the struct
        // variable's name, and needs its address taken instead — the same
        // distinction `gen_index_address` makes for array vs. pointer bases.
        let base_op = if *via_pointer { TacOp::Mov } else { TacOp::AddrOf };
        self.emit(base_op, base_addr, Operand::None, addr.clone(), expr.ty.clone().pointer_to());
        let final_addr = self.new_temp(expr.ty.clone().pointer_to());
        self.emit(
            TacOp::Add,
            addr,
            Operand::ImmInt(offset),
            final_addr.clone(),
            expr.ty.clone().pointer_to(),
        );
        Ok(final_addr)
    }
}

/// Recursively find function-local `static` variable declarations so they
/// can be placed in the data/bss section exactly once, under their mangled
/// name, instead of re-running their initializer on every call.
fn collect_static_locals<'a>(stmts: &'a [Stmt], initialized: &mut Vec<&'a VarDecl>, zeroed: &mut Vec<&'a VarDecl>) {
    for stmt in stmts {
        match stmt {
            Stmt::VarDecl(decl) if decl.specifier == Specifier::Static => {
                if decl.init.is_some() {
                    initialized.push(decl);
                } else {
                    zeroed.push(decl);
                }
            }
            Stmt::VarDecl(_) | Stmt::Return { .. } | Stmt::ExprStmt(_) | Stmt::LoopControl { .. } => {}
            Stmt::If { then_branch, else_branch, .. } => {
                collect_static_locals(then_branch, initialized, zeroed);
                if let Some(else_stmts) = else_branch {
                    collect_static_locals(else_stmts, initialized, zeroed);
                }
            }
            Stmt::While { body, .. } => collect_static_locals(body, initialized, zeroed),
            Stmt::For { body, .. } => collect_static_locals(body, initialized, zeroed),
            Stmt::Block(stmts) => collect_static_locals(stmts, initialized, zeroed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::semantic::SemanticAnalyzer;

    fn gen(src: &str) -> Vec<TacInstruction> {
        let mut program = Parser::parse(src).unwrap();
        let mut globals = SemanticAnalyzer::new().analyze(&mut program).unwrap();
        TacGenerator::new(&mut globals).generate(&program).unwrap()
    }

    #[test]
    fn section_markers_appear_in_order() {
        let instrs = gen("static int g = 1; fn main() -> int { return g; }");
        let order: Vec<TacOp> = instrs
            .iter()
            .map(|i| i.op)
            .filter(|op| {
                matches!(
                    op,
                    TacOp::EnterText | TacOp::EnterData | TacOp::EnterBss | TacOp::EnterLiteral8 | TacOp::EnterCstring
                )
            })
            .collect();
        assert_eq!(
            order,
            vec![TacOp::EnterText, TacOp::EnterData, TacOp::EnterBss, TacOp::EnterLiteral8, TacOp::EnterCstring]
        );
    }

    #[test]
    fn function_wrapped_in_begin_end_markers() {
        let instrs = gen("fn main() -> int { return 0; }");
        assert_eq!(instrs[1].op, TacOp::FuncBegin);
        assert!(instrs.iter().any(|i| i.op == TacOp::FuncEnd));
    }

    #[test]
    fn if_else_emits_ifnot_and_two_labels() {
        let instrs = gen("fn main() -> int { if (1) return 1; else return 0; }");
        assert!(instrs.iter().any(|i| i.op == TacOp::IfNot));
        assert_eq!(instrs.iter().filter(|i| i.op == TacOp::Label).count(), 2);
    }

    #[test]
    fn for_loop_has_one_back_edge_goto() {
        let instrs = gen("fn main() -> int { int s = 0; for (int i = 0; i < 10; i = i + 1) { s = s + i; } return s; }");
        assert_eq!(instrs.iter().filter(|i| i.op == TacOp::Goto).count(), 1);
    }

    #[test]
    fn short_circuit_and_uses_ifnot_to_skip_rhs() {
        let instrs = gen("fn main() -> int { int a = 1; int b = 0; return a && b; }");
        assert!(instrs.iter().any(|i| i.op == TacOp::IfNot));
    }
}
