//! The mirage intermediate representation.
//!
//! A typed, immutable expression/statement DAG with reference-counted
//! sharing, plus the machinery passes are built from:
//!
//! - [`Expr`] / [`Stmt`] / [`VarExpr`] handles over ~45 node kinds, each with
//!   a validating `make` constructor ([`nodes`]);
//! - [`visitor::IrVisitor`] and [`mutator::IrMutator`] with
//!   identity-preserving defaults, and graph (memoised) variants of both;
//! - an open dispatch table keyed by runtime type index
//!   ([`functor::IrFunctor`]) that the pretty-printer is built on;
//! - structural equality and hashing with a bounded compare cache
//!   ([`compare`]);
//! - common-subexpression elimination ([`pass::cse`]).
//!
//! Graphs are DAGs, never cyclic: the one back edge in the data model
//! (`Call` to its owning [`nodes::Function`]) is a weak reference. Handles
//! may be shared freely within a thread; distinct graphs may live on
//! distinct threads.

pub mod compare;
pub mod expr;
pub mod functor;
pub mod helpers;
pub mod mutator;
pub mod nodes;
pub mod pass;
pub mod prelude;
pub mod printer;
pub mod registry;
pub mod visitor;

#[cfg(test)]
mod test;

pub use mirage_dtype::{Type, TypeCode};

pub use expr::{Expr, ExprNodeKind, IrNodeKind, IrRef, Stmt, StmtNodeKind, VarExpr};
pub use nodes::{ExprKind, StmtKind};
