//! The IR node kinds.
//!
//! Construction goes through each kind's `make`: it validates the kind's
//! invariants (violations are internal errors), fixes the node's type, and
//! hands back the wrapping handle. There is no way to mutate a node after
//! construction.
//!
//! Two historical profiles contributed to this node set; the superset is
//! canonical. `AttrStmt`, `Prefetch` and `Shuffle` come from the later
//! profile, while the earlier profile's vector reshuffling survives as
//! `Call` intrinsic names (`interleave_vectors`, `slice_vector`, ...).

#![allow(clippy::upper_case_acronyms)]

mod arith;
mod call;
mod scalar;
mod stmt;
mod vector;

pub use arith::{
    Add, And, Div, Max, Min, Mod, Mul, Not, Or, Select, Sub, EQ, GE, GT, LE,
    LT, NE,
};
pub use call::{Call, CallType, Function, FunctionRef, Load};
pub use scalar::{Cast, FloatImm, IntImm, Let, StringImm, UIntImm, Variable};
pub use stmt::{
    Allocate, AssertStmt, AttrStmt, Block, DeviceApi, Evaluate, For, ForType,
    Free, IfThenElse, LetStmt, Prefetch, ProducerConsumer, Provide, Range,
    Realize, Region, Store,
};
pub use vector::{Broadcast, Ramp, Shuffle};

use crate::expr::{
    ExprNodeKind, IrNodeKind, OwnedNode, StmtNodeKind, Worklist,
};

/// Payload of an expression node.
pub enum ExprKind {
    IntImm(IntImm),
    UIntImm(UIntImm),
    FloatImm(FloatImm),
    StringImm(StringImm),
    Cast(Cast),
    Variable(Variable),
    Add(Add),
    Sub(Sub),
    Mul(Mul),
    Div(Div),
    Mod(Mod),
    Min(Min),
    Max(Max),
    EQ(EQ),
    NE(NE),
    LT(LT),
    LE(LE),
    GT(GT),
    GE(GE),
    And(And),
    Or(Or),
    Not(Not),
    Select(Select),
    Load(Load),
    Ramp(Ramp),
    Broadcast(Broadcast),
    Call(Call),
    Let(Let),
    Shuffle(Shuffle),
}

/// Payload of a statement node.
pub enum StmtKind {
    LetStmt(LetStmt),
    AttrStmt(AttrStmt),
    AssertStmt(AssertStmt),
    ProducerConsumer(ProducerConsumer),
    For(For),
    Store(Store),
    Provide(Provide),
    Allocate(Allocate),
    Free(Free),
    Realize(Realize),
    Prefetch(Prefetch),
    Block(Block),
    IfThenElse(IfThenElse),
    Evaluate(Evaluate),
}

macro_rules! expr_kinds {
    ($($variant:ident),+ $(,)?) => {
        impl ExprKind {
            /// The stable type key of this kind.
            pub fn type_key(&self) -> &'static str {
                match self {
                    $(ExprKind::$variant(_) => $variant::TYPE_KEY,)+
                }
            }
        }

        $(
            impl IrNodeKind for $variant {
                const TYPE_KEY: &'static str = stringify!($variant);
            }

            impl ExprNodeKind for $variant {
                fn from_kind(kind: &ExprKind) -> Option<&Self> {
                    match kind {
                        ExprKind::$variant(op) => Some(op),
                        _ => None,
                    }
                }
            }
        )+
    };
}

macro_rules! stmt_kinds {
    ($($variant:ident),+ $(,)?) => {
        impl StmtKind {
            /// The stable type key of this kind.
            pub fn type_key(&self) -> &'static str {
                match self {
                    $(StmtKind::$variant(_) => $variant::TYPE_KEY,)+
                }
            }
        }

        $(
            impl IrNodeKind for $variant {
                const TYPE_KEY: &'static str = stringify!($variant);
            }

            impl StmtNodeKind for $variant {
                fn from_kind(kind: &StmtKind) -> Option<&Self> {
                    match kind {
                        StmtKind::$variant(op) => Some(op),
                        _ => None,
                    }
                }
            }
        )+
    };
}

expr_kinds! {
    IntImm, UIntImm, FloatImm, StringImm, Cast, Variable,
    Add, Sub, Mul, Div, Mod, Min, Max,
    EQ, NE, LT, LE, GT, GE,
    And, Or, Not, Select,
    Load, Ramp, Broadcast, Call, Let, Shuffle,
}

stmt_kinds! {
    LetStmt, AttrStmt, AssertStmt, ProducerConsumer, For, Store, Provide,
    Allocate, Free, Realize, Prefetch, Block, IfThenElse, Evaluate,
}

/// Move a dying expression kind's children onto the teardown worklist.
pub(crate) fn drain_expr_kind(kind: ExprKind, sink: &mut Worklist) {
    match kind {
        ExprKind::IntImm(_)
        | ExprKind::UIntImm(_)
        | ExprKind::FloatImm(_)
        | ExprKind::StringImm(_)
        | ExprKind::Variable(_) => {}
        ExprKind::Cast(op) => sink.push(OwnedNode::Expr(op.value)),
        ExprKind::Add(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::Sub(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::Mul(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::Div(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::Mod(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::Min(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::Max(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::EQ(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::NE(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::LT(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::LE(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::GT(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::GE(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::And(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::Or(op) => {
            sink.push(OwnedNode::Expr(op.a));
            sink.push(OwnedNode::Expr(op.b));
        }
        ExprKind::Not(op) => sink.push(OwnedNode::Expr(op.a)),
        ExprKind::Select(op) => {
            sink.push(OwnedNode::Expr(op.condition));
            sink.push(OwnedNode::Expr(op.true_value));
            sink.push(OwnedNode::Expr(op.false_value));
        }
        ExprKind::Load(op) => {
            sink.push(OwnedNode::Expr(op.buffer_var.into()));
            sink.push(OwnedNode::Expr(op.index));
            sink.push(OwnedNode::Expr(op.predicate));
        }
        ExprKind::Ramp(op) => {
            sink.push(OwnedNode::Expr(op.base));
            sink.push(OwnedNode::Expr(op.stride));
        }
        ExprKind::Broadcast(op) => sink.push(OwnedNode::Expr(op.value)),
        ExprKind::Call(op) => {
            for arg in op.args {
                sink.push(OwnedNode::Expr(arg));
            }
        }
        ExprKind::Let(op) => {
            sink.push(OwnedNode::Expr(op.var.into()));
            sink.push(OwnedNode::Expr(op.value));
            sink.push(OwnedNode::Expr(op.body));
        }
        ExprKind::Shuffle(op) => {
            for vector in op.vectors {
                sink.push(OwnedNode::Expr(vector));
            }
        }
    }
}

/// Move a dying statement kind's children onto the teardown worklist.
pub(crate) fn drain_stmt_kind(kind: StmtKind, sink: &mut Worklist) {
    match kind {
        StmtKind::LetStmt(op) => {
            sink.push(OwnedNode::Expr(op.var.into()));
            sink.push(OwnedNode::Expr(op.value));
            sink.push(OwnedNode::Stmt(op.body));
        }
        StmtKind::AttrStmt(op) => {
            sink.push(OwnedNode::Expr(op.node));
            sink.push(OwnedNode::Expr(op.value));
            sink.push(OwnedNode::Stmt(op.body));
        }
        StmtKind::AssertStmt(op) => {
            sink.push(OwnedNode::Expr(op.condition));
            sink.push(OwnedNode::Expr(op.message));
        }
        StmtKind::ProducerConsumer(op) => sink.push(OwnedNode::Stmt(op.body)),
        StmtKind::For(op) => {
            sink.push(OwnedNode::Expr(op.loop_var.into()));
            sink.push(OwnedNode::Expr(op.min));
            sink.push(OwnedNode::Expr(op.extent));
            sink.push(OwnedNode::Stmt(op.body));
        }
        StmtKind::Store(op) => {
            sink.push(OwnedNode::Expr(op.buffer_var.into()));
            sink.push(OwnedNode::Expr(op.value));
            sink.push(OwnedNode::Expr(op.index));
            sink.push(OwnedNode::Expr(op.predicate));
        }
        StmtKind::Provide(op) => {
            for value in op.values {
                sink.push(OwnedNode::Expr(value));
            }
            for arg in op.args {
                sink.push(OwnedNode::Expr(arg));
            }
        }
        StmtKind::Allocate(op) => {
            sink.push(OwnedNode::Expr(op.buffer_var.into()));
            for extent in op.extents {
                sink.push(OwnedNode::Expr(extent));
            }
            sink.push(OwnedNode::Expr(op.condition));
            if let Some(new_expr) = op.new_expr {
                sink.push(OwnedNode::Expr(new_expr));
            }
            sink.push(OwnedNode::Stmt(op.body));
        }
        StmtKind::Free(op) => sink.push(OwnedNode::Expr(op.buffer_var.into())),
        StmtKind::Realize(op) => {
            for range in op.bounds {
                sink.push(OwnedNode::Expr(range.min));
                sink.push(OwnedNode::Expr(range.extent));
            }
            sink.push(OwnedNode::Expr(op.condition));
            sink.push(OwnedNode::Stmt(op.body));
        }
        StmtKind::Prefetch(op) => {
            for range in op.bounds {
                sink.push(OwnedNode::Expr(range.min));
                sink.push(OwnedNode::Expr(range.extent));
            }
        }
        StmtKind::Block(op) => {
            sink.push(OwnedNode::Stmt(op.first));
            sink.push(OwnedNode::Stmt(op.rest));
        }
        StmtKind::IfThenElse(op) => {
            sink.push(OwnedNode::Expr(op.condition));
            sink.push(OwnedNode::Stmt(op.then_case));
            if let Some(else_case) = op.else_case {
                sink.push(OwnedNode::Stmt(else_case));
            }
        }
        StmtKind::Evaluate(op) => sink.push(OwnedNode::Expr(op.value)),
    }
}
