//! Structural equality, ordering and hashing.
//!
//! Handles are structurally equal when kind, type and children agree
//! recursively; variables compare by node identity, never by name. To keep
//! deep DAG comparisons affordable, an [`IrCompareCache`] of identity pairs
//! already proven equal is consulted before descending into children.
//!
//! [`compare_exprs`] is a total order (kind tag first, then type, then
//! fields), so expressions can also key ordered containers deterministically
//! within a process. [`ExprWithCompareCache`] packages an expression with a
//! shared [`CompareContext`] so hash maps get cached equality plus an
//! identity-memoised structural hash.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use mirage_dtype::Type;

use crate::expr::{Expr, Stmt};
use crate::nodes::*;

/// Fixed-size hashed table of expression pairs known to be equal. The table
/// has `2^bits` slots; a colliding insert simply overwrites. Entries hold
/// real handles, so a cached pair can never be confused with recycled
/// storage.
pub struct IrCompareCache {
    entries: Vec<Option<(Expr, Expr)>>,
}

impl IrCompareCache {
    /// A cache with `2^bits` slots.
    pub fn new(bits: u32) -> Self {
        Self { entries: (0..(1usize << bits)).map(|_| None).collect() }
    }

    fn slot(&self, a: &Expr, b: &Expr) -> usize {
        let mut hasher = DefaultHasher::new();
        a.id().hash(&mut hasher);
        b.id().hash(&mut hasher);
        (hasher.finish() as usize) & (self.entries.len() - 1)
    }

    /// Record a pair proven equal.
    pub fn insert(&mut self, a: &Expr, b: &Expr) {
        let slot = self.slot(a, b);
        self.entries[slot] = Some((a.clone(), b.clone()));
    }

    /// Has this exact pair been proven equal?
    pub fn contains(&self, a: &Expr, b: &Expr) -> bool {
        match &self.entries[self.slot(a, b)] {
            Some((ca, cb)) => ca.same_as(a) && cb.same_as(b),
            None => false,
        }
    }

    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            *entry = None;
        }
    }
}

impl Default for IrCompareCache {
    fn default() -> Self {
        Self::new(8)
    }
}

fn compare_types(a: Type, b: Type) -> Ordering {
    (a.code() as u8, a.bits(), a.lanes()).cmp(&(
        b.code() as u8,
        b.bits(),
        b.lanes(),
    ))
}

fn compare_opt_exprs(
    a: &Option<Expr>,
    b: &Option<Expr>,
    cache: &mut IrCompareCache,
) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare_exprs(a, b, cache),
    }
}

fn compare_expr_lists(
    a: &[Expr],
    b: &[Expr],
    cache: &mut IrCompareCache,
) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        for (ea, eb) in a.iter().zip(b) {
            let order = compare_exprs(ea, eb, cache);
            if order != Ordering::Equal {
                return order;
            }
        }
        Ordering::Equal
    })
}

fn compare_regions(
    a: &Region,
    b: &Region,
    cache: &mut IrCompareCache,
) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| {
        for (ra, rb) in a.iter().zip(b) {
            let order = compare_exprs(&ra.min, &rb.min, cache)
                .then_with(|| compare_exprs(&ra.extent, &rb.extent, cache));
            if order != Ordering::Equal {
                return order;
            }
        }
        Ordering::Equal
    })
}

/// Total structural order over expressions.
pub fn compare_exprs(
    a: &Expr,
    b: &Expr,
    cache: &mut IrCompareCache,
) -> Ordering {
    if a.same_as(b) {
        return Ordering::Equal;
    }

    // Kind tags first. Type indices are assigned in first-use order, so the
    // ordering is arbitrary but stable for the process, which is all an
    // ordered container needs.
    let order = a.type_index().cmp(&b.type_index());
    if order != Ordering::Equal {
        return order;
    }

    let order = compare_types(a.ty(), b.ty());
    if order != Ordering::Equal {
        return order;
    }

    if cache.contains(a, b) {
        return Ordering::Equal;
    }

    let order = match (a.kind(), b.kind()) {
        (ExprKind::IntImm(x), ExprKind::IntImm(y)) => x.value.cmp(&y.value),
        (ExprKind::UIntImm(x), ExprKind::UIntImm(y)) => x.value.cmp(&y.value),
        (ExprKind::FloatImm(x), ExprKind::FloatImm(y)) => {
            x.value.total_cmp(&y.value)
        }
        (ExprKind::StringImm(x), ExprKind::StringImm(y)) => {
            x.value.cmp(&y.value)
        }
        (ExprKind::Cast(x), ExprKind::Cast(y)) => {
            compare_exprs(&x.value, &y.value, cache)
        }
        // Variables are identified by node, and same_as already said no.
        (ExprKind::Variable(_), ExprKind::Variable(_)) => a.id().cmp(&b.id()),
        (ExprKind::Add(x), ExprKind::Add(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::Sub(x), ExprKind::Sub(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::Mul(x), ExprKind::Mul(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::Div(x), ExprKind::Div(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::Mod(x), ExprKind::Mod(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::Min(x), ExprKind::Min(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::Max(x), ExprKind::Max(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::EQ(x), ExprKind::EQ(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::NE(x), ExprKind::NE(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::LT(x), ExprKind::LT(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::LE(x), ExprKind::LE(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::GT(x), ExprKind::GT(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::GE(x), ExprKind::GE(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::And(x), ExprKind::And(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::Or(x), ExprKind::Or(y)) => {
            compare_exprs(&x.a, &y.a, cache)
                .then_with(|| compare_exprs(&x.b, &y.b, cache))
        }
        (ExprKind::Not(x), ExprKind::Not(y)) => {
            compare_exprs(&x.a, &y.a, cache)
        }
        (ExprKind::Select(x), ExprKind::Select(y)) => {
            compare_exprs(&x.condition, &y.condition, cache)
                .then_with(|| {
                    compare_exprs(&x.true_value, &y.true_value, cache)
                })
                .then_with(|| {
                    compare_exprs(&x.false_value, &y.false_value, cache)
                })
        }
        (ExprKind::Load(x), ExprKind::Load(y)) => {
            compare_exprs(&x.buffer_var, &y.buffer_var, cache)
                .then_with(|| compare_exprs(&x.index, &y.index, cache))
                .then_with(|| {
                    compare_exprs(&x.predicate, &y.predicate, cache)
                })
        }
        (ExprKind::Ramp(x), ExprKind::Ramp(y)) => {
            compare_exprs(&x.base, &y.base, cache)
                .then_with(|| compare_exprs(&x.stride, &y.stride, cache))
        }
        (ExprKind::Broadcast(x), ExprKind::Broadcast(y)) => {
            compare_exprs(&x.value, &y.value, cache)
        }
        (ExprKind::Call(x), ExprKind::Call(y)) => x
            .name
            .cmp(&y.name)
            .then_with(|| (x.call_type as u8).cmp(&(y.call_type as u8)))
            .then_with(|| x.value_index.cmp(&y.value_index))
            .then_with(|| compare_expr_lists(&x.args, &y.args, cache)),
        (ExprKind::Let(x), ExprKind::Let(y)) => {
            compare_exprs(&x.var, &y.var, cache)
                .then_with(|| compare_exprs(&x.value, &y.value, cache))
                .then_with(|| compare_exprs(&x.body, &y.body, cache))
        }
        (ExprKind::Shuffle(x), ExprKind::Shuffle(y)) => x
            .indices
            .cmp(&y.indices)
            .then_with(|| compare_expr_lists(&x.vectors, &y.vectors, cache)),
        // Same type index means same kind; anything else is a registry bug.
        _ => unreachable!("type index agreed but kinds differ"),
    };

    if order == Ordering::Equal {
        cache.insert(a, b);
    }
    order
}

/// Total structural order over statements. Expression children share the
/// same compare cache.
pub fn compare_stmts(
    a: &Stmt,
    b: &Stmt,
    cache: &mut IrCompareCache,
) -> Ordering {
    if a.same_as(b) {
        return Ordering::Equal;
    }

    let order = a.type_index().cmp(&b.type_index());
    if order != Ordering::Equal {
        return order;
    }

    match (a.kind(), b.kind()) {
        (StmtKind::LetStmt(x), StmtKind::LetStmt(y)) => {
            compare_exprs(&x.var, &y.var, cache)
                .then_with(|| compare_exprs(&x.value, &y.value, cache))
                .then_with(|| compare_stmts(&x.body, &y.body, cache))
        }
        (StmtKind::AttrStmt(x), StmtKind::AttrStmt(y)) => x
            .attr_key
            .cmp(&y.attr_key)
            .then_with(|| compare_exprs(&x.node, &y.node, cache))
            .then_with(|| compare_exprs(&x.value, &y.value, cache))
            .then_with(|| compare_stmts(&x.body, &y.body, cache)),
        (StmtKind::AssertStmt(x), StmtKind::AssertStmt(y)) => {
            compare_exprs(&x.condition, &y.condition, cache)
                .then_with(|| compare_exprs(&x.message, &y.message, cache))
        }
        (StmtKind::ProducerConsumer(x), StmtKind::ProducerConsumer(y)) => x
            .name
            .cmp(&y.name)
            .then_with(|| x.is_producer.cmp(&y.is_producer))
            .then_with(|| compare_stmts(&x.body, &y.body, cache)),
        (StmtKind::For(x), StmtKind::For(y)) => {
            compare_exprs(&x.loop_var, &y.loop_var, cache)
                .then_with(|| compare_exprs(&x.min, &y.min, cache))
                .then_with(|| compare_exprs(&x.extent, &y.extent, cache))
                .then_with(|| (x.for_type as u8).cmp(&(y.for_type as u8)))
                .then_with(|| {
                    (x.device_api as u8).cmp(&(y.device_api as u8))
                })
                .then_with(|| compare_stmts(&x.body, &y.body, cache))
        }
        (StmtKind::Store(x), StmtKind::Store(y)) => {
            compare_exprs(&x.buffer_var, &y.buffer_var, cache)
                .then_with(|| compare_exprs(&x.value, &y.value, cache))
                .then_with(|| compare_exprs(&x.index, &y.index, cache))
                .then_with(|| {
                    compare_exprs(&x.predicate, &y.predicate, cache)
                })
        }
        (StmtKind::Provide(x), StmtKind::Provide(y)) => x
            .name
            .cmp(&y.name)
            .then_with(|| compare_expr_lists(&x.values, &y.values, cache))
            .then_with(|| compare_expr_lists(&x.args, &y.args, cache)),
        (StmtKind::Allocate(x), StmtKind::Allocate(y)) => {
            compare_exprs(&x.buffer_var, &y.buffer_var, cache)
                .then_with(|| compare_types(x.ty, y.ty))
                .then_with(|| {
                    compare_expr_lists(&x.extents, &y.extents, cache)
                })
                .then_with(|| {
                    compare_exprs(&x.condition, &y.condition, cache)
                })
                .then_with(|| {
                    compare_opt_exprs(&x.new_expr, &y.new_expr, cache)
                })
                .then_with(|| x.free_function.cmp(&y.free_function))
                .then_with(|| compare_stmts(&x.body, &y.body, cache))
        }
        (StmtKind::Free(x), StmtKind::Free(y)) => {
            compare_exprs(&x.buffer_var, &y.buffer_var, cache)
        }
        (StmtKind::Realize(x), StmtKind::Realize(y)) => x
            .name
            .cmp(&y.name)
            .then_with(|| {
                x.types.len().cmp(&y.types.len()).then_with(|| {
                    for (ta, tb) in x.types.iter().zip(&y.types) {
                        let order = compare_types(*ta, *tb);
                        if order != Ordering::Equal {
                            return order;
                        }
                    }
                    Ordering::Equal
                })
            })
            .then_with(|| compare_regions(&x.bounds, &y.bounds, cache))
            .then_with(|| compare_exprs(&x.condition, &y.condition, cache))
            .then_with(|| compare_stmts(&x.body, &y.body, cache)),
        (StmtKind::Prefetch(x), StmtKind::Prefetch(y)) => x
            .name
            .cmp(&y.name)
            .then_with(|| {
                x.types.len().cmp(&y.types.len()).then_with(|| {
                    for (ta, tb) in x.types.iter().zip(&y.types) {
                        let order = compare_types(*ta, *tb);
                        if order != Ordering::Equal {
                            return order;
                        }
                    }
                    Ordering::Equal
                })
            })
            .then_with(|| compare_regions(&x.bounds, &y.bounds, cache)),
        (StmtKind::Block(x), StmtKind::Block(y)) => {
            compare_stmts(&x.first, &y.first, cache)
                .then_with(|| compare_stmts(&x.rest, &y.rest, cache))
        }
        (StmtKind::IfThenElse(x), StmtKind::IfThenElse(y)) => {
            compare_exprs(&x.condition, &y.condition, cache)
                .then_with(|| {
                    compare_stmts(&x.then_case, &y.then_case, cache)
                })
                .then_with(|| match (&x.else_case, &y.else_case) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(a), Some(b)) => compare_stmts(a, b, cache),
                })
        }
        (StmtKind::Evaluate(x), StmtKind::Evaluate(y)) => {
            compare_exprs(&x.value, &y.value, cache)
        }
        _ => unreachable!("type index agreed but kinds differ"),
    }
}

/// Structural equality with a fresh default-size cache.
pub fn equal(a: &Expr, b: &Expr) -> bool {
    compare_exprs(a, b, &mut IrCompareCache::default()) == Ordering::Equal
}

/// Structural equality over statements.
pub fn equal_stmts(a: &Stmt, b: &Stmt) -> bool {
    compare_stmts(a, b, &mut IrCompareCache::default()) == Ordering::Equal
}

/// Shared state for map keys: a compare cache plus an identity-keyed hash
/// memo, so hashing a DAG costs its node count, not its unshared tree size.
pub struct CompareContext {
    pub cache: IrCompareCache,
    hash_memo: HashMap<u64, u64>,
}

impl CompareContext {
    pub fn new(bits: u32) -> Self {
        Self { cache: IrCompareCache::new(bits), hash_memo: HashMap::new() }
    }

    /// Structural hash, memoised by node identity. Consistent with
    /// [`compare_exprs`]: structurally equal expressions hash alike.
    pub fn hash_of(&mut self, e: &Expr) -> u64 {
        if let Some(&h) = self.hash_memo.get(&e.id()) {
            return h;
        }
        let mut hasher = DefaultHasher::new();
        e.type_index().hash(&mut hasher);
        hash_type(e.ty(), &mut hasher);
        match e.kind() {
            ExprKind::IntImm(op) => op.value.hash(&mut hasher),
            ExprKind::UIntImm(op) => op.value.hash(&mut hasher),
            ExprKind::FloatImm(op) => op.value.to_bits().hash(&mut hasher),
            ExprKind::StringImm(op) => op.value.hash(&mut hasher),
            ExprKind::Cast(op) => {
                self.hash_of(&op.value).hash(&mut hasher);
            }
            // Identity, never the name hint.
            ExprKind::Variable(_) => e.id().hash(&mut hasher),
            ExprKind::Add(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::Sub(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::Mul(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::Div(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::Mod(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::Min(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::Max(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::EQ(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::NE(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::LT(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::LE(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::GT(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::GE(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::And(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::Or(op) => self.hash_pair(&op.a, &op.b, &mut hasher),
            ExprKind::Not(op) => {
                self.hash_of(&op.a).hash(&mut hasher);
            }
            ExprKind::Select(op) => {
                self.hash_of(&op.condition).hash(&mut hasher);
                self.hash_of(&op.true_value).hash(&mut hasher);
                self.hash_of(&op.false_value).hash(&mut hasher);
            }
            ExprKind::Load(op) => {
                self.hash_of(&op.buffer_var).hash(&mut hasher);
                self.hash_of(&op.index).hash(&mut hasher);
                self.hash_of(&op.predicate).hash(&mut hasher);
            }
            ExprKind::Ramp(op) => {
                self.hash_of(&op.base).hash(&mut hasher);
                self.hash_of(&op.stride).hash(&mut hasher);
            }
            ExprKind::Broadcast(op) => {
                self.hash_of(&op.value).hash(&mut hasher);
            }
            ExprKind::Call(op) => {
                op.name.hash(&mut hasher);
                (op.call_type as u8).hash(&mut hasher);
                op.value_index.hash(&mut hasher);
                for arg in &op.args {
                    self.hash_of(arg).hash(&mut hasher);
                }
            }
            ExprKind::Let(op) => {
                self.hash_of(&op.var).hash(&mut hasher);
                self.hash_of(&op.value).hash(&mut hasher);
                self.hash_of(&op.body).hash(&mut hasher);
            }
            ExprKind::Shuffle(op) => {
                op.indices.hash(&mut hasher);
                for vector in &op.vectors {
                    self.hash_of(vector).hash(&mut hasher);
                }
            }
        }
        let h = hasher.finish();
        self.hash_memo.insert(e.id(), h);
        h
    }

    fn hash_pair(&mut self, a: &Expr, b: &Expr, hasher: &mut DefaultHasher) {
        self.hash_of(a).hash(hasher);
        self.hash_of(b).hash(hasher);
    }
}

impl Default for CompareContext {
    fn default() -> Self {
        Self::new(8)
    }
}

fn hash_type(ty: Type, hasher: &mut DefaultHasher) {
    (ty.code() as u8).hash(hasher);
    ty.bits().hash(hasher);
    ty.lanes().hash(hasher);
}

/// One-off structural hash of an expression.
pub fn ir_hash(e: &Expr) -> u64 {
    CompareContext::default().hash_of(e)
}

/// An expression bundled with a shared [`CompareContext`], usable as a hash
/// map key with cached structural equality.
#[derive(Clone)]
pub struct ExprWithCompareCache {
    pub expr: Expr,
    ctx: Rc<RefCell<CompareContext>>,
}

impl ExprWithCompareCache {
    pub fn new(expr: Expr, ctx: Rc<RefCell<CompareContext>>) -> Self {
        Self { expr, ctx }
    }
}

impl PartialEq for ExprWithCompareCache {
    fn eq(&self, other: &Self) -> bool {
        let mut ctx = self.ctx.borrow_mut();
        compare_exprs(&self.expr, &other.expr, &mut ctx.cache)
            == Ordering::Equal
    }
}

impl Eq for ExprWithCompareCache {}

impl Hash for ExprWithCompareCache {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ctx.borrow_mut().hash_of(&self.expr).hash(state);
    }
}
