//! Common-subexpression elimination.
//!
//! `common_subexpression_elimination` rewrites an expression so that every
//! repeated subterm worth naming appears once, bound by a `Let`. The
//! pipeline: global value numbering (which also inlines existing lets),
//! a use-count pass over the numbered DAG, then substitution and let
//! emission for every entry used more than once. Semantics are preserved;
//! the pass never fails.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use mirage_base::{internal_assert, internal_error, unique_name_char};

use crate::compare::{CompareContext, ExprWithCompareCache};
use crate::expr::{Expr, Stmt, VarExpr};
use crate::helpers::is_const;
use crate::mutator::IrMutator;
use crate::nodes::{ExprKind, Let, Variable};
use crate::pass::scope::Scope;
use crate::visitor::IrVisitor;

/// Is a subterm worth lifting into a let? Some expressions are not, even
/// when they occur many times: the simplifier re-absorbs such lets, and the
/// two passes would fight each other pointlessly, so the list here mirrors
/// the simplifier's.
fn should_extract(e: &Expr) -> bool {
    if is_const(e) {
        return false;
    }
    match e.kind() {
        ExprKind::Variable(_) => false,
        ExprKind::Broadcast(op) => should_extract(&op.value),
        ExprKind::Cast(op) => should_extract(&op.value),
        ExprKind::Add(op) => !(is_const(&op.a) || is_const(&op.b)),
        ExprKind::Sub(op) => !(is_const(&op.a) || is_const(&op.b)),
        ExprKind::Mul(op) => !(is_const(&op.a) || is_const(&op.b)),
        ExprKind::Div(op) => !(is_const(&op.a) || is_const(&op.b)),
        ExprKind::Ramp(op) => !is_const(&op.stride),
        _ => true,
    }
}

/// Entry in the global value numbering.
struct Entry {
    expr: Expr,
    use_count: usize,
}

/// A global value numbering of expressions. Mutating returns the canonical
/// form of the input and fills in the numbering as a side effect. `Let`s
/// are inlined on the way: the bound variable is redirected to its value's
/// number and the body's canonical form replaces the let.
struct Gvn {
    entries: Vec<Entry>,
    /// Structural numbering, with cached deep compares and memoised hashes.
    numbering: HashMap<ExprWithCompareCache, usize>,
    /// Identity fast path: node id to number.
    shallow_numbering: HashMap<u64, usize>,
    /// Bound variable id to the number of its value.
    let_substitutions: Scope<u64, usize>,
    /// Number of the most recently mutated expression.
    number: usize,
    ctx: Rc<RefCell<CompareContext>>,
}

impl Gvn {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            numbering: HashMap::new(),
            shallow_numbering: HashMap::new(),
            let_substitutions: Scope::new(),
            number: 0,
            ctx: Rc::new(RefCell::new(CompareContext::new(8))),
        }
    }

    fn with_cache(&self, e: Expr) -> ExprWithCompareCache {
        ExprWithCompareCache::new(e, self.ctx.clone())
    }
}

impl IrMutator for Gvn {
    fn mutate_expr(&mut self, e: &Expr) -> Expr {
        // Early out if we've already seen this exact node.
        if let Some(&number) = self.shallow_numbering.get(&e.id()) {
            self.number = number;
            let entry = &self.entries[number];
            internal_assert!(entry.expr.ty() == e.ty());
            return entry.expr.clone();
        }

        // A variable may have been redirected to an existing numbering by
        // an enclosing let.
        if matches!(e.kind(), ExprKind::Variable(_)) {
            if let Some(&number) = self.let_substitutions.get(&e.id()) {
                self.number = number;
                let entry = &self.entries[number];
                internal_assert!(entry.expr.ty() == e.ty());
                return entry.expr.clone();
            }
        }

        // Already numbered in another form?
        if let Some(&number) = self.numbering.get(&self.with_cache(e.clone()))
        {
            self.number = number;
            self.shallow_numbering.insert(e.id(), number);
            let entry = &self.entries[number];
            internal_assert!(entry.expr.ty() == e.ty());
            return entry.expr.clone();
        }

        // Rebuild using things already in the numbering.
        let old = e.clone();
        let e = self.dispatch_expr(e);

        // The rebuilt form may already be numbered (e.g. because the input
        // was a let variable).
        if let Some(&number) = self.numbering.get(&self.with_cache(e.clone()))
        {
            self.number = number;
            self.shallow_numbering.insert(old.id(), number);
            let entry = &self.entries[number];
            internal_assert!(entry.expr.ty() == old.ty());
            return entry.expr.clone();
        }

        // A new entry.
        let number = self.entries.len();
        self.number = number;
        let key = self.with_cache(e.clone());
        self.numbering.insert(key, number);
        self.shallow_numbering.insert(e.id(), number);
        self.entries.push(Entry { expr: e.clone(), use_count: 0 });
        internal_assert!(e.ty() == old.ty());
        e
    }

    fn mutate_stmt(&mut self, s: &Stmt) -> Stmt {
        internal_error!("can't apply GVN to a Stmt: {s}")
    }

    fn visit_let(&mut self, op: &Let, _e: &Expr) -> Expr {
        // Number the value, redirect the variable to it, then number the
        // body. The let itself disappears.
        let _ = self.mutate_expr(&op.value);
        let value_number = self.number;

        self.let_substitutions.push(op.var.id(), value_number);
        let body = self.mutate_expr(&op.body);
        self.let_substitutions.pop(op.var.id());

        body
    }
}

/// Fill in the use counts of a numbering: one increment per occurrence of
/// each extractable subterm, children of a shared node visited once.
struct ComputeUseCounts<'g> {
    gvn: &'g mut Gvn,
    visited: HashSet<u64>,
}

impl<'g> ComputeUseCounts<'g> {
    fn new(gvn: &'g mut Gvn) -> Self {
        Self { gvn, visited: HashSet::new() }
    }
}

impl IrVisitor for ComputeUseCounts<'_> {
    fn include_expr(&mut self, e: &Expr) {
        // For things we don't want as lets, just count the children.
        if !should_extract(e) {
            self.visit_expr(e);
            return;
        }

        if let Some(&number) = self.gvn.shallow_numbering.get(&e.id()) {
            self.gvn.entries[number].use_count += 1;
        }

        if self.visited.insert(e.id()) {
            self.visit_expr(e);
        }
    }
}

/// Rebuild an expression through a replacement map, memoising every rewrite
/// by identity so shared structure is processed once.
struct Replacer {
    replacements: HashMap<u64, Expr>,
}

impl Replacer {
    fn new(replacements: HashMap<u64, Expr>) -> Self {
        Self { replacements }
    }
}

impl IrMutator for Replacer {
    fn mutate_expr(&mut self, e: &Expr) -> Expr {
        if let Some(replacement) = self.replacements.get(&e.id()) {
            return replacement.clone();
        }

        let new_e = self.dispatch_expr(e);

        // In case we encounter this expr again.
        self.replacements.insert(e.id(), new_e.clone());
        new_e
    }
}

/// Rewrite `e` into an equivalent let-nested form where every extractable
/// subterm used more than once is bound exactly once.
pub fn common_subexpression_elimination(e: &Expr) -> Expr {
    // Early out for trivial cases.
    if is_const(e) || matches!(e.kind(), ExprKind::Variable(_)) {
        return e.clone();
    }

    tracing::debug!(input = %e, "letify input");

    let mut gvn = Gvn::new();
    let mut e = gvn.mutate_expr(e);

    {
        let mut count_uses = ComputeUseCounts::new(&mut gvn);
        count_uses.include_expr(&e);
    }

    tracing::debug!(canonical = %e, "canonical form without lets");

    // Decide which entries become lets and variables.
    let mut lets: Vec<(VarExpr, Expr)> = Vec::new();
    let mut replacements: HashMap<u64, Expr> = HashMap::new();
    for (number, entry) in gvn.entries.iter().enumerate() {
        if entry.use_count > 1 {
            let name = unique_name_char('t');
            let var = Variable::make(entry.expr.ty(), &name);
            lets.push((var.clone(), entry.expr.clone()));
            // Point references to this expr at the variable instead.
            replacements.insert(entry.expr.id(), var.into());
        }
        tracing::debug!(number, uses = entry.use_count, expr = %entry.expr);
    }

    // Rebuild the expression to reference the variables.
    let mut replacer = Replacer::new(replacements);
    e = replacer.mutate_expr(&e);

    // Wrap the final expression in the lets, innermost (highest-numbered)
    // first.
    for (var, value) in lets.iter().rev() {
        // Drop the variable as an acceptable replacement for this value so
        // the binding doesn't replace itself, then rewrite the value with
        // the remaining (containing) lets.
        replacer.replacements.remove(&value.id());
        let value = replacer.mutate_expr(value);
        e = Let::make(var.clone(), value, e);
    }

    tracing::debug!(output = %e, "letify output");

    e
}

struct CseEveryExprInStmt;

impl IrMutator for CseEveryExprInStmt {
    fn mutate_expr(&mut self, e: &Expr) -> Expr {
        common_subexpression_elimination(e)
    }
}

/// Apply expression CSE to every expression inside a statement.
pub fn common_subexpression_elimination_stmt(s: &Stmt) -> Stmt {
    CseEveryExprInStmt.mutate_stmt(s)
}
