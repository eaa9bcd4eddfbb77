//! Convenience re-exports for building and transforming IR.

pub use mirage_dtype::{Type, TypeCode};

pub use crate::compare::{equal, equal_stmts, ir_hash, IrCompareCache};
pub use crate::expr::{Expr, IrRef, Stmt, VarExpr};
pub use crate::functor::{DispatchGuard, IrFunctor};
pub use crate::helpers::{
    const_false, const_true, is_const, is_const_value, is_one, is_zero,
};
pub use crate::mutator::{
    graph_mutate_expr, graph_mutate_stmt, GraphMutMemo, HasGraphMemo,
    IrMutator,
};
pub use crate::nodes::*;
pub use crate::pass::{
    common_subexpression_elimination, common_subexpression_elimination_stmt,
};
pub use crate::printer::IrPrinter;
pub use crate::visitor::{GraphVisitMemo, IrVisitor};
