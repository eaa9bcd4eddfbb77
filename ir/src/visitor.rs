//! Read-only traversal.
//!
//! [`IrVisitor`] has one method per node kind; the defaults recurse into
//! every child, so a visitor overrides only the kinds it cares about.
//! Child recursion goes through the [`IrVisitor::include_expr`] /
//! [`IrVisitor::include_stmt`] hooks: a *graph* visitor overrides those to
//! consult a [`GraphVisitMemo`], so each shared subterm of a DAG is entered
//! exactly once.

use std::collections::HashSet;

use crate::expr::{Expr, Stmt};
use crate::nodes::*;

/// Identity memo for graph visitors. Node ids are never reused, so the set
/// stays valid for the visitor's lifetime.
#[derive(Default)]
pub struct GraphVisitMemo {
    seen: HashSet<u64>,
}

impl GraphVisitMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// True the first time a node is offered, false on re-visits.
    pub fn first_visit_expr(&mut self, e: &Expr) -> bool {
        self.seen.insert(e.id())
    }

    pub fn first_visit_stmt(&mut self, s: &Stmt) -> bool {
        self.seen.insert(s.id())
    }
}

pub trait IrVisitor {
    /// Dispatch on an expression's kind.
    fn visit_expr(&mut self, e: &Expr) {
        match e.kind() {
            ExprKind::IntImm(op) => self.visit_int_imm(op, e),
            ExprKind::UIntImm(op) => self.visit_uint_imm(op, e),
            ExprKind::FloatImm(op) => self.visit_float_imm(op, e),
            ExprKind::StringImm(op) => self.visit_string_imm(op, e),
            ExprKind::Cast(op) => self.visit_cast(op, e),
            ExprKind::Variable(op) => self.visit_variable(op, e),
            ExprKind::Add(op) => self.visit_add(op, e),
            ExprKind::Sub(op) => self.visit_sub(op, e),
            ExprKind::Mul(op) => self.visit_mul(op, e),
            ExprKind::Div(op) => self.visit_div(op, e),
            ExprKind::Mod(op) => self.visit_mod(op, e),
            ExprKind::Min(op) => self.visit_min(op, e),
            ExprKind::Max(op) => self.visit_max(op, e),
            ExprKind::EQ(op) => self.visit_eq(op, e),
            ExprKind::NE(op) => self.visit_ne(op, e),
            ExprKind::LT(op) => self.visit_lt(op, e),
            ExprKind::LE(op) => self.visit_le(op, e),
            ExprKind::GT(op) => self.visit_gt(op, e),
            ExprKind::GE(op) => self.visit_ge(op, e),
            ExprKind::And(op) => self.visit_and(op, e),
            ExprKind::Or(op) => self.visit_or(op, e),
            ExprKind::Not(op) => self.visit_not(op, e),
            ExprKind::Select(op) => self.visit_select(op, e),
            ExprKind::Load(op) => self.visit_load(op, e),
            ExprKind::Ramp(op) => self.visit_ramp(op, e),
            ExprKind::Broadcast(op) => self.visit_broadcast(op, e),
            ExprKind::Call(op) => self.visit_call(op, e),
            ExprKind::Let(op) => self.visit_let(op, e),
            ExprKind::Shuffle(op) => self.visit_shuffle(op, e),
        }
    }

    /// Dispatch on a statement's kind.
    fn visit_stmt(&mut self, s: &Stmt) {
        match s.kind() {
            StmtKind::LetStmt(op) => self.visit_let_stmt(op, s),
            StmtKind::AttrStmt(op) => self.visit_attr_stmt(op, s),
            StmtKind::AssertStmt(op) => self.visit_assert_stmt(op, s),
            StmtKind::ProducerConsumer(op) => {
                self.visit_producer_consumer(op, s)
            }
            StmtKind::For(op) => self.visit_for(op, s),
            StmtKind::Store(op) => self.visit_store(op, s),
            StmtKind::Provide(op) => self.visit_provide(op, s),
            StmtKind::Allocate(op) => self.visit_allocate(op, s),
            StmtKind::Free(op) => self.visit_free(op, s),
            StmtKind::Realize(op) => self.visit_realize(op, s),
            StmtKind::Prefetch(op) => self.visit_prefetch(op, s),
            StmtKind::Block(op) => self.visit_block(op, s),
            StmtKind::IfThenElse(op) => self.visit_if_then_else(op, s),
            StmtKind::Evaluate(op) => self.visit_evaluate(op, s),
        }
    }

    /// Hook the default recursion routes child expressions through.
    /// Override to memoise (graph traversal) or to filter.
    fn include_expr(&mut self, e: &Expr) {
        self.visit_expr(e);
    }

    /// Hook the default recursion routes child statements through.
    fn include_stmt(&mut self, s: &Stmt) {
        self.visit_stmt(s);
    }

    fn visit_int_imm(&mut self, _op: &IntImm, _e: &Expr) {}

    fn visit_uint_imm(&mut self, _op: &UIntImm, _e: &Expr) {}

    fn visit_float_imm(&mut self, _op: &FloatImm, _e: &Expr) {}

    fn visit_string_imm(&mut self, _op: &StringImm, _e: &Expr) {}

    fn visit_variable(&mut self, _op: &Variable, _e: &Expr) {}

    fn visit_cast(&mut self, op: &Cast, _e: &Expr) {
        self.include_expr(&op.value);
    }

    fn visit_add(&mut self, op: &Add, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_sub(&mut self, op: &Sub, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_mul(&mut self, op: &Mul, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_div(&mut self, op: &Div, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_mod(&mut self, op: &Mod, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_min(&mut self, op: &Min, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_max(&mut self, op: &Max, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_eq(&mut self, op: &EQ, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_ne(&mut self, op: &NE, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_lt(&mut self, op: &LT, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_le(&mut self, op: &LE, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_gt(&mut self, op: &GT, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_ge(&mut self, op: &GE, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_and(&mut self, op: &And, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_or(&mut self, op: &Or, _e: &Expr) {
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }

    fn visit_not(&mut self, op: &Not, _e: &Expr) {
        self.include_expr(&op.a);
    }

    fn visit_select(&mut self, op: &Select, _e: &Expr) {
        self.include_expr(&op.condition);
        self.include_expr(&op.true_value);
        self.include_expr(&op.false_value);
    }

    fn visit_load(&mut self, op: &Load, _e: &Expr) {
        self.include_expr(&op.index);
        self.include_expr(&op.predicate);
    }

    fn visit_ramp(&mut self, op: &Ramp, _e: &Expr) {
        self.include_expr(&op.base);
        self.include_expr(&op.stride);
    }

    fn visit_broadcast(&mut self, op: &Broadcast, _e: &Expr) {
        self.include_expr(&op.value);
    }

    fn visit_call(&mut self, op: &Call, _e: &Expr) {
        for arg in &op.args {
            self.include_expr(arg);
        }
    }

    fn visit_let(&mut self, op: &Let, _e: &Expr) {
        self.include_expr(&op.value);
        self.include_expr(&op.body);
    }

    fn visit_shuffle(&mut self, op: &Shuffle, _e: &Expr) {
        for vector in &op.vectors {
            self.include_expr(vector);
        }
    }

    fn visit_let_stmt(&mut self, op: &LetStmt, _s: &Stmt) {
        self.include_expr(&op.value);
        self.include_stmt(&op.body);
    }

    fn visit_attr_stmt(&mut self, op: &AttrStmt, _s: &Stmt) {
        self.include_expr(&op.value);
        self.include_stmt(&op.body);
    }

    fn visit_assert_stmt(&mut self, op: &AssertStmt, _s: &Stmt) {
        self.include_expr(&op.condition);
        self.include_expr(&op.message);
    }

    fn visit_producer_consumer(&mut self, op: &ProducerConsumer, _s: &Stmt) {
        self.include_stmt(&op.body);
    }

    fn visit_for(&mut self, op: &For, _s: &Stmt) {
        self.include_expr(&op.min);
        self.include_expr(&op.extent);
        self.include_stmt(&op.body);
    }

    fn visit_store(&mut self, op: &Store, _s: &Stmt) {
        self.include_expr(&op.value);
        self.include_expr(&op.index);
        self.include_expr(&op.predicate);
    }

    fn visit_provide(&mut self, op: &Provide, _s: &Stmt) {
        for value in &op.values {
            self.include_expr(value);
        }
        for arg in &op.args {
            self.include_expr(arg);
        }
    }

    fn visit_allocate(&mut self, op: &Allocate, _s: &Stmt) {
        for extent in &op.extents {
            self.include_expr(extent);
        }
        self.include_expr(&op.condition);
        if let Some(new_expr) = &op.new_expr {
            self.include_expr(new_expr);
        }
        self.include_stmt(&op.body);
    }

    fn visit_free(&mut self, _op: &Free, _s: &Stmt) {}

    fn visit_realize(&mut self, op: &Realize, _s: &Stmt) {
        for range in &op.bounds {
            self.include_expr(&range.min);
            self.include_expr(&range.extent);
        }
        self.include_expr(&op.condition);
        self.include_stmt(&op.body);
    }

    fn visit_prefetch(&mut self, op: &Prefetch, _s: &Stmt) {
        for range in &op.bounds {
            self.include_expr(&range.min);
            self.include_expr(&range.extent);
        }
    }

    fn visit_block(&mut self, op: &Block, _s: &Stmt) {
        self.include_stmt(&op.first);
        self.include_stmt(&op.rest);
    }

    fn visit_if_then_else(&mut self, op: &IfThenElse, _s: &Stmt) {
        self.include_expr(&op.condition);
        self.include_stmt(&op.then_case);
        if let Some(else_case) = &op.else_case {
            self.include_stmt(else_case);
        }
    }

    fn visit_evaluate(&mut self, op: &Evaluate, _s: &Stmt) {
        self.include_expr(&op.value);
    }
}
