//! Rewriting traversal.
//!
//! [`IrMutator`] has one method per node kind. Every default mutates the
//! children and rebuilds the node only if some child came back different by
//! identity; otherwise it returns the original handle. Passes rely on that
//! contract for fixed-point detection, and graph mutators rely on it to keep
//! shared subtrees shared.
//!
//! [`mutate_expr`](IrMutator::mutate_expr) / [`mutate_stmt`](IrMutator::mutate_stmt)
//! are the entry points; [`dispatch_expr`](IrMutator::dispatch_expr) /
//! [`dispatch_stmt`](IrMutator::dispatch_stmt) expose the raw kind switch so
//! an override of the entry point can still reach the per-kind defaults.
//! A graph mutator is a mutator whose entry points run through
//! [`graph_mutate_expr`] / [`graph_mutate_stmt`], which memoise results by
//! node identity in a [`GraphMutMemo`].

use std::collections::HashMap;

use crate::expr::{Expr, Stmt};
use crate::nodes::*;

pub trait IrMutator {
    /// Rewrite an expression. Returns the original handle when nothing
    /// changed.
    fn mutate_expr(&mut self, e: &Expr) -> Expr {
        self.dispatch_expr(e)
    }

    /// Rewrite a statement. Returns the original handle when nothing
    /// changed.
    fn mutate_stmt(&mut self, s: &Stmt) -> Stmt {
        self.dispatch_stmt(s)
    }

    /// The kind switch behind `mutate_expr`. Rarely overridden.
    fn dispatch_expr(&mut self, e: &Expr) -> Expr {
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

    /// The kind switch behind `mutate_stmt`. Rarely overridden.
    fn dispatch_stmt(&mut self, s: &Stmt) -> Stmt {
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

    fn visit_int_imm(&mut self, _op: &IntImm, e: &Expr) -> Expr {
        e.clone()
    }

    fn visit_uint_imm(&mut self, _op: &UIntImm, e: &Expr) -> Expr {
        e.clone()
    }

    fn visit_float_imm(&mut self, _op: &FloatImm, e: &Expr) -> Expr {
        e.clone()
    }

    fn visit_string_imm(&mut self, _op: &StringImm, e: &Expr) -> Expr {
        e.clone()
    }

    fn visit_variable(&mut self, _op: &Variable, e: &Expr) -> Expr {
        e.clone()
    }

    fn visit_cast(&mut self, op: &Cast, e: &Expr) -> Expr {
        let value = self.mutate_expr(&op.value);
        if value.same_as(&op.value) {
            e.clone()
        } else {
            Cast::make(e.ty(), value)
        }
    }

    fn visit_add(&mut self, op: &Add, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Add::make(a, b)
        }
    }

    fn visit_sub(&mut self, op: &Sub, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Sub::make(a, b)
        }
    }

    fn visit_mul(&mut self, op: &Mul, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Mul::make(a, b)
        }
    }

    fn visit_div(&mut self, op: &Div, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Div::make(a, b)
        }
    }

    fn visit_mod(&mut self, op: &Mod, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Mod::make(a, b)
        }
    }

    fn visit_min(&mut self, op: &Min, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Min::make(a, b)
        }
    }

    fn visit_max(&mut self, op: &Max, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Max::make(a, b)
        }
    }

    fn visit_eq(&mut self, op: &EQ, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            EQ::make(a, b)
        }
    }

    fn visit_ne(&mut self, op: &NE, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            NE::make(a, b)
        }
    }

    fn visit_lt(&mut self, op: &LT, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            LT::make(a, b)
        }
    }

    fn visit_le(&mut self, op: &LE, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            LE::make(a, b)
        }
    }

    fn visit_gt(&mut self, op: &GT, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            GT::make(a, b)
        }
    }

    fn visit_ge(&mut self, op: &GE, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            GE::make(a, b)
        }
    }

    fn visit_and(&mut self, op: &And, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            And::make(a, b)
        }
    }

    fn visit_or(&mut self, op: &Or, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Or::make(a, b)
        }
    }

    fn visit_not(&mut self, op: &Not, e: &Expr) -> Expr {
        let a = self.mutate_expr(&op.a);
        if a.same_as(&op.a) {
            e.clone()
        } else {
            Not::make(a)
        }
    }

    fn visit_select(&mut self, op: &Select, e: &Expr) -> Expr {
        let condition = self.mutate_expr(&op.condition);
        let true_value = self.mutate_expr(&op.true_value);
        let false_value = self.mutate_expr(&op.false_value);
        if condition.same_as(&op.condition)
            && true_value.same_as(&op.true_value)
            && false_value.same_as(&op.false_value)
        {
            e.clone()
        } else {
            Select::make(condition, true_value, false_value)
        }
    }

    fn visit_load(&mut self, op: &Load, e: &Expr) -> Expr {
        let index = self.mutate_expr(&op.index);
        let predicate = self.mutate_expr(&op.predicate);
        if index.same_as(&op.index) && predicate.same_as(&op.predicate) {
            e.clone()
        } else {
            Load::make(e.ty(), op.buffer_var.clone(), index, Some(predicate))
        }
    }

    fn visit_ramp(&mut self, op: &Ramp, e: &Expr) -> Expr {
        let base = self.mutate_expr(&op.base);
        let stride = self.mutate_expr(&op.stride);
        if base.same_as(&op.base) && stride.same_as(&op.stride) {
            e.clone()
        } else {
            Ramp::make(base, stride, op.lanes)
        }
    }

    fn visit_broadcast(&mut self, op: &Broadcast, e: &Expr) -> Expr {
        let value = self.mutate_expr(&op.value);
        if value.same_as(&op.value) {
            e.clone()
        } else {
            Broadcast::make(value, op.lanes)
        }
    }

    fn visit_call(&mut self, op: &Call, e: &Expr) -> Expr {
        let mut changed = false;
        let mut new_args = Vec::with_capacity(op.args.len());
        for arg in &op.args {
            let new_arg = self.mutate_expr(arg);
            if !new_arg.same_as(arg) {
                changed = true;
            }
            new_args.push(new_arg);
        }
        if !changed {
            e.clone()
        } else {
            Call::make(
                e.ty(),
                &op.name,
                new_args,
                op.call_type,
                op.func().as_ref(),
                op.value_index,
            )
        }
    }

    fn visit_let(&mut self, op: &Let, e: &Expr) -> Expr {
        let value = self.mutate_expr(&op.value);
        let body = self.mutate_expr(&op.body);
        if value.same_as(&op.value) && body.same_as(&op.body) {
            e.clone()
        } else {
            Let::make(op.var.clone(), value, body)
        }
    }

    fn visit_shuffle(&mut self, op: &Shuffle, e: &Expr) -> Expr {
        let mut changed = false;
        let mut new_vectors = Vec::with_capacity(op.vectors.len());
        for vector in &op.vectors {
            let new_vector = self.mutate_expr(vector);
            if !new_vector.same_as(vector) {
                changed = true;
            }
            new_vectors.push(new_vector);
        }
        if !changed {
            e.clone()
        } else {
            Shuffle::make(new_vectors, op.indices.clone())
        }
    }

    fn visit_let_stmt(&mut self, op: &LetStmt, s: &Stmt) -> Stmt {
        let value = self.mutate_expr(&op.value);
        let body = self.mutate_stmt(&op.body);
        if value.same_as(&op.value) && body.same_as(&op.body) {
            s.clone()
        } else {
            LetStmt::make(op.var.clone(), value, body)
        }
    }

    fn visit_attr_stmt(&mut self, op: &AttrStmt, s: &Stmt) -> Stmt {
        let value = self.mutate_expr(&op.value);
        let body = self.mutate_stmt(&op.body);
        if value.same_as(&op.value) && body.same_as(&op.body) {
            s.clone()
        } else {
            AttrStmt::make(op.node.clone(), &op.attr_key, value, body)
        }
    }

    fn visit_assert_stmt(&mut self, op: &AssertStmt, s: &Stmt) -> Stmt {
        let condition = self.mutate_expr(&op.condition);
        let message = self.mutate_expr(&op.message);
        if condition.same_as(&op.condition) && message.same_as(&op.message) {
            s.clone()
        } else {
            AssertStmt::make(condition, message)
        }
    }

    fn visit_producer_consumer(
        &mut self,
        op: &ProducerConsumer,
        s: &Stmt,
    ) -> Stmt {
        let body = self.mutate_stmt(&op.body);
        if body.same_as(&op.body) {
            s.clone()
        } else {
            ProducerConsumer::make(&op.name, op.is_producer, body)
        }
    }

    fn visit_for(&mut self, op: &For, s: &Stmt) -> Stmt {
        let min = self.mutate_expr(&op.min);
        let extent = self.mutate_expr(&op.extent);
        let body = self.mutate_stmt(&op.body);
        if min.same_as(&op.min)
            && extent.same_as(&op.extent)
            && body.same_as(&op.body)
        {
            s.clone()
        } else {
            For::make(
                op.loop_var.clone(),
                min,
                extent,
                op.for_type,
                op.device_api,
                body,
            )
        }
    }

    fn visit_store(&mut self, op: &Store, s: &Stmt) -> Stmt {
        let value = self.mutate_expr(&op.value);
        let index = self.mutate_expr(&op.index);
        let predicate = self.mutate_expr(&op.predicate);
        if value.same_as(&op.value)
            && index.same_as(&op.index)
            && predicate.same_as(&op.predicate)
        {
            s.clone()
        } else {
            Store::make(op.buffer_var.clone(), value, index, Some(predicate))
        }
    }

    fn visit_provide(&mut self, op: &Provide, s: &Stmt) -> Stmt {
        let mut changed = false;
        let mut new_values = Vec::with_capacity(op.values.len());
        for value in &op.values {
            let new_value = self.mutate_expr(value);
            if !new_value.same_as(value) {
                changed = true;
            }
            new_values.push(new_value);
        }
        let mut new_args = Vec::with_capacity(op.args.len());
        for arg in &op.args {
            let new_arg = self.mutate_expr(arg);
            if !new_arg.same_as(arg) {
                changed = true;
            }
            new_args.push(new_arg);
        }
        if !changed {
            s.clone()
        } else {
            Provide::make(&op.name, new_values, new_args)
        }
    }

    fn visit_allocate(&mut self, op: &Allocate, s: &Stmt) -> Stmt {
        let mut all_extents_unmodified = true;
        let mut new_extents = Vec::with_capacity(op.extents.len());
        for extent in &op.extents {
            let new_extent = self.mutate_expr(extent);
            all_extents_unmodified &= new_extent.same_as(extent);
            new_extents.push(new_extent);
        }
        let body = self.mutate_stmt(&op.body);
        let condition = self.mutate_expr(&op.condition);
        let new_expr =
            op.new_expr.as_ref().map(|new_expr| self.mutate_expr(new_expr));
        let new_expr_unmodified = match (&new_expr, &op.new_expr) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_as(b),
            _ => false,
        };
        if all_extents_unmodified
            && body.same_as(&op.body)
            && condition.same_as(&op.condition)
            && new_expr_unmodified
        {
            s.clone()
        } else {
            Allocate::make(
                op.buffer_var.clone(),
                op.ty,
                new_extents,
                condition,
                body,
                new_expr,
                &op.free_function,
            )
        }
    }

    fn visit_free(&mut self, _op: &Free, s: &Stmt) -> Stmt {
        s.clone()
    }

    fn visit_realize(&mut self, op: &Realize, s: &Stmt) -> Stmt {
        let mut bounds_changed = false;
        let mut new_bounds = Region::with_capacity(op.bounds.len());
        for range in &op.bounds {
            let new_min = self.mutate_expr(&range.min);
            let new_extent = self.mutate_expr(&range.extent);
            if !new_min.same_as(&range.min)
                || !new_extent.same_as(&range.extent)
            {
                bounds_changed = true;
            }
            new_bounds.push(Range::new(new_min, new_extent));
        }
        let body = self.mutate_stmt(&op.body);
        let condition = self.mutate_expr(&op.condition);
        if !bounds_changed
            && body.same_as(&op.body)
            && condition.same_as(&op.condition)
        {
            s.clone()
        } else {
            Realize::make(
                &op.name,
                op.types.clone(),
                new_bounds,
                condition,
                body,
            )
        }
    }

    fn visit_prefetch(&mut self, op: &Prefetch, s: &Stmt) -> Stmt {
        let mut bounds_changed = false;
        let mut new_bounds = Region::with_capacity(op.bounds.len());
        for range in &op.bounds {
            let new_min = self.mutate_expr(&range.min);
            let new_extent = self.mutate_expr(&range.extent);
            if !new_min.same_as(&range.min)
                || !new_extent.same_as(&range.extent)
            {
                bounds_changed = true;
            }
            new_bounds.push(Range::new(new_min, new_extent));
        }
        if !bounds_changed {
            s.clone()
        } else {
            Prefetch::make(&op.name, op.types.clone(), new_bounds)
        }
    }

    fn visit_block(&mut self, op: &Block, s: &Stmt) -> Stmt {
        let first = self.mutate_stmt(&op.first);
        let rest = self.mutate_stmt(&op.rest);
        if first.same_as(&op.first) && rest.same_as(&op.rest) {
            s.clone()
        } else {
            Block::make(first, rest)
        }
    }

    fn visit_if_then_else(&mut self, op: &IfThenElse, s: &Stmt) -> Stmt {
        let condition = self.mutate_expr(&op.condition);
        let then_case = self.mutate_stmt(&op.then_case);
        let else_case =
            op.else_case.as_ref().map(|else_case| self.mutate_stmt(else_case));
        let else_unmodified = match (&else_case, &op.else_case) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_as(b),
            _ => false,
        };
        if condition.same_as(&op.condition)
            && then_case.same_as(&op.then_case)
            && else_unmodified
        {
            s.clone()
        } else {
            IfThenElse::make(condition, then_case, else_case)
        }
    }

    fn visit_evaluate(&mut self, op: &Evaluate, s: &Stmt) -> Stmt {
        let value = self.mutate_expr(&op.value);
        if value.same_as(&op.value) {
            s.clone()
        } else {
            Evaluate::make(value)
        }
    }
}

/// Identity-keyed result tables for graph mutators: one for expressions,
/// one for statements, so a shared subterm is rewritten exactly once and
/// sharing survives in the output.
#[derive(Default)]
pub struct GraphMutMemo {
    exprs: HashMap<u64, Expr>,
    stmts: HashMap<u64, Stmt>,
}

impl GraphMutMemo {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Access to the memo a graph mutator carries.
pub trait HasGraphMemo {
    fn graph_memo(&mut self) -> &mut GraphMutMemo;
}

/// Memoising entry point for expressions. A graph mutator's `mutate_expr`
/// override is one line: `graph_mutate_expr(self, e)`.
pub fn graph_mutate_expr<M>(m: &mut M, e: &Expr) -> Expr
where
    M: IrMutator + HasGraphMemo,
{
    if let Some(hit) = m.graph_memo().exprs.get(&e.id()) {
        return hit.clone();
    }
    let result = m.dispatch_expr(e);
    m.graph_memo().exprs.insert(e.id(), result.clone());
    result
}

/// Memoising entry point for statements.
pub fn graph_mutate_stmt<M>(m: &mut M, s: &Stmt) -> Stmt
where
    M: IrMutator + HasGraphMemo,
{
    if let Some(hit) = m.graph_memo().stmts.get(&s.id()) {
        return hit.clone();
    }
    let result = m.dispatch_stmt(s);
    m.graph_memo().stmts.insert(s.id(), result.clone());
    result
}
