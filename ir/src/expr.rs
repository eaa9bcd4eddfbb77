//! Node base, reference handles and identity.
//!
//! Every IR object is an immutable node behind an `Rc`. [`Expr`] wraps an
//! expression node and exposes its [`Type`]; [`Stmt`] wraps a statement
//! node; [`VarExpr`] is an `Expr` guaranteed to hold a
//! [`crate::nodes::Variable`].
//!
//! Identity, not structure, is what caches key on. Each node gets a
//! monotonically increasing id from a thread-local counter; ids are never
//! reused, so identity maps stay valid even after nodes die (no pointer ABA).
//!
//! Nodes own their children, so a deep graph would tear itself down with one
//! stack frame per level if destruction were left to the default recursive
//! drop. Instead, dropping a node drains its children into a worklist and
//! releases them iteratively.

use std::cell::Cell;
use std::rc::Rc;

use mirage_dtype::Type;
use smallvec::SmallVec;

use crate::nodes::{self, ExprKind, StmtKind};
use crate::registry;

thread_local! {
    static NODE_ID_COUNTER: Cell<u64> = const { Cell::new(0) };
}

fn next_node_id() -> u64 {
    NODE_ID_COUNTER.with(|counter| {
        let id = counter.get();
        counter.set(id + 1);
        id
    })
}

/// Marker carried by every node kind struct: its stable type key.
pub trait IrNodeKind {
    const TYPE_KEY: &'static str;
}

/// An expression node kind, extractable from an [`ExprKind`].
pub trait ExprNodeKind: IrNodeKind {
    fn from_kind(kind: &ExprKind) -> Option<&Self>;
}

/// A statement node kind, extractable from a [`StmtKind`].
pub trait StmtNodeKind: IrNodeKind {
    fn from_kind(kind: &StmtKind) -> Option<&Self>;
}

/// Heap representation of an expression. `kind` is `None` only transiently
/// while the iterative teardown is hollowing the node out.
pub struct ExprNode {
    id: u64,
    type_index: u32,
    ty: Type,
    kind: Option<ExprKind>,
}

/// Heap representation of a statement. Statements have no type.
pub struct StmtNode {
    id: u64,
    type_index: u32,
    kind: Option<StmtKind>,
}

/// A reference-counted handle to an expression node.
#[derive(Clone)]
pub struct Expr {
    node: Rc<ExprNode>,
}

/// A reference-counted handle to a statement node.
#[derive(Clone)]
pub struct Stmt {
    node: Rc<StmtNode>,
}

impl Expr {
    pub(crate) fn new(ty: Type, kind: ExprKind) -> Self {
        let type_index = registry::type_key_to_index(kind.type_key());
        Self {
            node: Rc::new(ExprNode {
                id: next_node_id(),
                type_index,
                ty,
                kind: Some(kind),
            }),
        }
    }

    /// The expression's type.
    pub fn ty(&self) -> Type {
        self.node.ty
    }

    /// The node's kind payload.
    pub fn kind(&self) -> &ExprKind {
        self.node.kind.as_ref().expect("IR node emptied during teardown")
    }

    /// Runtime type index of this node's kind.
    pub fn type_index(&self) -> u32 {
        self.node.type_index
    }

    /// Stable type key of this node's kind.
    pub fn type_key(&self) -> &'static str {
        registry::type_index_to_key(self.node.type_index)
    }

    /// Stable identity of the underlying node. Never reused.
    pub fn id(&self) -> u64 {
        self.node.id
    }

    /// Do the two handles point at the same node?
    pub fn same_as(&self, other: &Expr) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Downcast to a concrete kind, like `expr.as_node::<Add>()`.
    pub fn as_node<T: ExprNodeKind>(&self) -> Option<&T> {
        T::from_kind(self.kind())
    }
}

impl Stmt {
    pub(crate) fn new(kind: StmtKind) -> Self {
        let type_index = registry::type_key_to_index(kind.type_key());
        Self {
            node: Rc::new(StmtNode {
                id: next_node_id(),
                type_index,
                kind: Some(kind),
            }),
        }
    }

    pub fn kind(&self) -> &StmtKind {
        self.node.kind.as_ref().expect("IR node emptied during teardown")
    }

    pub fn type_index(&self) -> u32 {
        self.node.type_index
    }

    pub fn type_key(&self) -> &'static str {
        registry::type_index_to_key(self.node.type_index)
    }

    pub fn id(&self) -> u64 {
        self.node.id
    }

    pub fn same_as(&self, other: &Stmt) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    pub fn as_node<T: StmtNodeKind>(&self) -> Option<&T> {
        T::from_kind(self.kind())
    }
}

/// An [`Expr`] that is known to wrap a [`crate::nodes::Variable`].
///
/// The handle itself is the variable's identity; the name is a hint for
/// humans. Two `VarExpr`s with the same name are different variables unless
/// they are the same node.
#[derive(Clone)]
pub struct VarExpr {
    expr: Expr,
}

impl VarExpr {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        debug_assert!(
            matches!(expr.kind(), ExprKind::Variable(_)),
            "VarExpr must wrap a Variable node"
        );
        Self { expr }
    }

    pub fn as_expr(&self) -> &Expr {
        &self.expr
    }

    /// The variable's name hint.
    pub fn name(&self) -> &str {
        match self.expr.kind() {
            ExprKind::Variable(var) => &var.name_hint,
            _ => unreachable!("VarExpr must wrap a Variable node"),
        }
    }
}

impl std::ops::Deref for VarExpr {
    type Target = Expr;

    fn deref(&self) -> &Expr {
        &self.expr
    }
}

impl From<VarExpr> for Expr {
    fn from(var: VarExpr) -> Expr {
        var.expr
    }
}

/// A borrowed either-handle, what dispatch families operate on.
#[derive(Clone, Copy)]
pub enum IrRef<'a> {
    Expr(&'a Expr),
    Stmt(&'a Stmt),
}

impl IrRef<'_> {
    pub fn type_index(self) -> u32 {
        match self {
            IrRef::Expr(e) => e.type_index(),
            IrRef::Stmt(s) => s.type_index(),
        }
    }

    pub fn type_key(self) -> &'static str {
        match self {
            IrRef::Expr(e) => e.type_key(),
            IrRef::Stmt(s) => s.type_key(),
        }
    }
}

// ---------------------------------------------------------------------------
// Iterative teardown.

/// An owned child pulled out of a dying node.
pub(crate) enum OwnedNode {
    Expr(Expr),
    Stmt(Stmt),
}

pub(crate) type Worklist = SmallVec<[OwnedNode; 8]>;

fn iterative_teardown(mut pending: Worklist) {
    while let Some(child) = pending.pop() {
        match child {
            OwnedNode::Expr(e) => {
                if let Ok(mut node) = Rc::try_unwrap(e.node) {
                    if let Some(kind) = node.kind.take() {
                        nodes::drain_expr_kind(kind, &mut pending);
                    }
                }
            }
            OwnedNode::Stmt(s) => {
                if let Ok(mut node) = Rc::try_unwrap(s.node) {
                    if let Some(kind) = node.kind.take() {
                        nodes::drain_stmt_kind(kind, &mut pending);
                    }
                }
            }
        }
    }
}

impl Drop for ExprNode {
    fn drop(&mut self) {
        if let Some(kind) = self.kind.take() {
            let mut pending = Worklist::new();
            nodes::drain_expr_kind(kind, &mut pending);
            iterative_teardown(pending);
        }
    }
}

impl Drop for StmtNode {
    fn drop(&mut self) {
        if let Some(kind) = self.kind.take() {
            let mut pending = Worklist::new();
            nodes::drain_stmt_kind(kind, &mut pending);
            iterative_teardown(pending);
        }
    }
}

// ---------------------------------------------------------------------------
// Literal conversions, one per scalar literal type the IR admits.

macro_rules! literal_from {
    ($($from:ty => $make:expr),+ $(,)?) => {$(
        impl From<$from> for Expr {
            fn from(value: $from) -> Expr {
                $make(value)
            }
        }
    )+};
}

literal_from! {
    i8  => |v| nodes::IntImm::make(Type::int(8), v as i64),
    i16 => |v| nodes::IntImm::make(Type::int(16), v as i64),
    i32 => |v| nodes::IntImm::make(Type::int(32), v as i64),
    i64 => |v| nodes::IntImm::make(Type::int(64), v),
    u8  => |v| nodes::UIntImm::make(Type::uint(8), v as u64),
    u16 => |v| nodes::UIntImm::make(Type::uint(16), v as u64),
    u32 => |v| nodes::UIntImm::make(Type::uint(32), v as u64),
    u64 => |v| nodes::UIntImm::make(Type::uint(64), v),
    f32 => |v| nodes::FloatImm::make(Type::float(32), v as f64),
    f64 => |v| nodes::FloatImm::make(Type::float(64), v),
}

impl From<&str> for Expr {
    fn from(value: &str) -> Expr {
        nodes::StringImm::make(value)
    }
}
