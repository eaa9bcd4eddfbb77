//! Statement node kinds.

use mirage_base::{internal_assert, user_error};
use mirage_dtype::Type;

use crate::expr::{Expr, Stmt, VarExpr};
use crate::helpers::const_true;
use crate::nodes::{ExprKind, IntImm, StmtKind};

/// A single-dimensional span covering `min .. min + extent - 1`.
#[derive(Clone)]
pub struct Range {
    pub min: Expr,
    pub extent: Expr,
}

impl Range {
    pub fn new(min: Expr, extent: Expr) -> Self {
        internal_assert!(
            min.ty() == extent.ty(),
            "Region min and extent must have same type"
        );
        Self { min, extent }
    }
}

/// A multi-dimensional box; the outer product of its ranges.
pub type Region = Vec<Range>;

/// The statement form of a let: within `body`, `var` refers to `value`.
pub struct LetStmt {
    pub var: VarExpr,
    pub value: Expr,
    pub body: Stmt,
}

impl LetStmt {
    pub fn make(var: VarExpr, value: Expr, body: Stmt) -> Stmt {
        internal_assert!(
            value.ty() == var.ty(),
            "LetStmt variable of type {} bound to value of type {}",
            var.ty(),
            value.ty()
        );
        Stmt::new(StmtKind::LetStmt(LetStmt { var, value, body }))
    }
}

/// An informative annotation on `node`: within `body`, attribute `attr_key`
/// of the annotated entity has the given value. Carries scheduling facts
/// (thread extents, storage scopes, ...) that have no dedicated node kind.
pub struct AttrStmt {
    pub node: Expr,
    pub attr_key: String,
    pub value: Expr,
    pub body: Stmt,
}

impl AttrStmt {
    pub fn make(node: Expr, attr_key: &str, value: Expr, body: Stmt) -> Stmt {
        Stmt::new(StmtKind::AttrStmt(AttrStmt {
            node,
            attr_key: attr_key.to_string(),
            value,
            body,
        }))
    }
}

/// If `condition` is false, evaluate and return `message`, which is an error
/// code fed to the error handler.
pub struct AssertStmt {
    pub condition: Expr,
    pub message: Expr,
}

impl AssertStmt {
    pub fn make(condition: Expr, message: Expr) -> Stmt {
        internal_assert!(
            message.ty() == Type::int(32),
            "AssertStmt message must be an int"
        );
        Stmt::new(StmtKind::AssertStmt(AssertStmt { condition, message }))
    }
}

/// Annotation marking `body` as the production or consumption of the named
/// stage's buffer. Purely informative; every producer has an associated
/// `Realize` of the same name that creates the buffer.
pub struct ProducerConsumer {
    pub name: String,
    pub is_producer: bool,
    pub body: Stmt,
}

impl ProducerConsumer {
    pub fn make(name: &str, is_producer: bool, body: Stmt) -> Stmt {
        Stmt::new(StmtKind::ProducerConsumer(ProducerConsumer {
            name: name.to_string(),
            is_producer,
            body,
        }))
    }
}

/// How a loop's iterations execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ForType {
    /// A conventional loop.
    Serial,
    /// Iterations run in parallel or in some unspecified order.
    Parallel,
    /// Each iteration maps to one SIMD lane; the extent must be a small
    /// constant.
    Vectorized,
    /// Compiled to a fully unrolled loop; the extent must be a small
    /// constant.
    Unrolled,
}

/// Which device a loop nest runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceApi {
    None,
    Host,
    DefaultGpu,
    Cuda,
    OpenCl,
    Metal,
    Hexagon,
}

/// Execute `body` for every value of `loop_var` in `[min, min + extent)`.
pub struct For {
    pub loop_var: VarExpr,
    pub min: Expr,
    pub extent: Expr,
    pub for_type: ForType,
    pub device_api: DeviceApi,
    pub body: Stmt,
}

impl For {
    pub fn make(
        loop_var: VarExpr,
        min: Expr,
        extent: Expr,
        for_type: ForType,
        device_api: DeviceApi,
        body: Stmt,
    ) -> Stmt {
        internal_assert!(min.ty().is_scalar(), "For with vector min");
        internal_assert!(extent.ty().is_scalar(), "For with vector extent");
        internal_assert!(
            loop_var.ty().is_scalar(),
            "For with vector loop_var"
        );
        Stmt::new(StmtKind::For(For {
            loop_var,
            min,
            extent,
            for_type,
            device_api,
            body,
        }))
    }
}

/// Write `value` to a buffer at `index`, lanes masked by `predicate`. The
/// buffer is treated as an array of the value's type.
pub struct Store {
    pub buffer_var: VarExpr,
    pub value: Expr,
    pub index: Expr,
    pub predicate: Expr,
}

impl Store {
    /// `predicate` defaults to an all-true mask of the matching lane count.
    pub fn make(
        buffer_var: VarExpr,
        value: Expr,
        index: Expr,
        predicate: Option<Expr>,
    ) -> Stmt {
        let predicate =
            predicate.unwrap_or_else(|| const_true(value.ty().lanes()));
        internal_assert!(
            value.ty().lanes() == index.ty().lanes(),
            "Vector lanes of Store must match vector lanes of index"
        );
        internal_assert!(
            predicate.ty().is_bool(),
            "Store predicate is not boolean: {}",
            predicate.ty()
        );
        internal_assert!(
            value.ty().lanes() == predicate.ty().lanes(),
            "Vector lanes of Store must match vector lanes of predicate"
        );
        Stmt::new(StmtKind::Store(Store {
            buffer_var,
            value,
            index,
            predicate,
        }))
    }
}

/// Define the values of a stage at a multi-dimensional location; a store to
/// a multi-dimensional array, lowered to a conventional `Store` later.
pub struct Provide {
    pub name: String,
    pub values: Vec<Expr>,
    pub args: Vec<Expr>,
}

impl Provide {
    pub fn make(name: &str, values: Vec<Expr>, args: Vec<Expr>) -> Stmt {
        internal_assert!(
            !values.is_empty(),
            "Provide of no values to {name}"
        );
        Stmt::new(StmtKind::Provide(Provide {
            name: name.to_string(),
            values,
            args,
        }))
    }
}

/// Allocate scratch memory that lives for at most the duration of `body`.
/// Allocation only happens if `condition` is true.
pub struct Allocate {
    pub buffer_var: VarExpr,
    pub ty: Type,
    pub extents: Vec<Expr>,
    pub condition: Expr,
    /// Overrides the code-generator's malloc equivalent when set; pairs
    /// with `free_function`.
    pub new_expr: Option<Expr>,
    pub free_function: String,
    pub body: Stmt,
}

impl Allocate {
    pub fn make(
        buffer_var: VarExpr,
        ty: Type,
        extents: Vec<Expr>,
        condition: Expr,
        body: Stmt,
        new_expr: Option<Expr>,
        free_function: &str,
    ) -> Stmt {
        for extent in &extents {
            internal_assert!(
                extent.ty().is_scalar(),
                "Allocate of vector extent"
            );
        }
        internal_assert!(
            condition.ty().is_bool(),
            "Allocate condition is not boolean"
        );
        Stmt::new(StmtKind::Allocate(Allocate {
            buffer_var,
            ty,
            extents,
            condition,
            new_expr,
            free_function: free_function.to_string(),
            body,
        }))
    }

    /// If every extent is an integer literal, the total element count as an
    /// i32; otherwise 0. A constant total above 2^31 - 1 is a user error —
    /// the total is the sole overflow gate, individual dimensions are not
    /// checked.
    pub fn constant_allocation_size_of(extents: &[Expr], name: &str) -> i32 {
        let mut result: i64 = 1;
        for extent in extents {
            if let ExprKind::IntImm(IntImm { value }) = extent.kind() {
                result *= value;
                if result > i64::from(i32::MAX) {
                    user_error!(
                        "Total size for allocation {name} is constant but \
                         exceeds 2^31 - 1."
                    );
                }
            } else {
                return 0;
            }
        }
        result as i32
    }

    pub fn constant_allocation_size(&self) -> i32 {
        Self::constant_allocation_size_of(
            &self.extents,
            self.buffer_var.name(),
        )
    }
}

/// Release the scratch memory backing a buffer.
pub struct Free {
    pub buffer_var: VarExpr,
}

impl Free {
    pub fn make(buffer_var: VarExpr) -> Stmt {
        Stmt::new(StmtKind::Free(Free { buffer_var }))
    }
}

/// Create scratch memory backing the named stage over `bounds` for the
/// duration of `body`, if `condition` holds.
pub struct Realize {
    pub name: String,
    pub types: Vec<Type>,
    pub bounds: Region,
    pub condition: Expr,
    pub body: Stmt,
}

impl Realize {
    pub fn make(
        name: &str,
        types: Vec<Type>,
        bounds: Region,
        condition: Expr,
        body: Stmt,
    ) -> Stmt {
        for range in &bounds {
            internal_assert!(
                range.min.ty().is_scalar(),
                "Realize of vector size"
            );
            internal_assert!(
                range.extent.ty().is_scalar(),
                "Realize of vector size"
            );
        }
        internal_assert!(!types.is_empty(), "Realize has empty type list");
        internal_assert!(
            condition.ty().is_bool(),
            "Realize condition is not boolean"
        );
        Stmt::new(StmtKind::Realize(Realize {
            name: name.to_string(),
            types,
            bounds,
            condition,
            body,
        }))
    }
}

/// Hint that the named stage's buffer will be read over `bounds` soon.
pub struct Prefetch {
    pub name: String,
    pub types: Vec<Type>,
    pub bounds: Region,
}

impl Prefetch {
    pub fn make(name: &str, types: Vec<Type>, bounds: Region) -> Stmt {
        for range in &bounds {
            internal_assert!(
                range.min.ty().is_scalar(),
                "Prefetch of vector size"
            );
            internal_assert!(
                range.extent.ty().is_scalar(),
                "Prefetch of vector size"
            );
        }
        internal_assert!(!types.is_empty(), "Prefetch has empty type list");
        Stmt::new(StmtKind::Prefetch(Prefetch {
            name: name.to_string(),
            types,
            bounds,
        }))
    }
}

/// Two statements executed in order. Chains are kept right-leaning: the
/// first child of a block is never itself a block.
pub struct Block {
    pub first: Stmt,
    pub rest: Stmt,
}

impl Block {
    pub fn make(first: Stmt, rest: Stmt) -> Stmt {
        if let StmtKind::Block(b) = first.kind() {
            // Re-nest into the canonical right-leaning order.
            let first = b.first.clone();
            let rest = Block::make(b.rest.clone(), rest);
            return Stmt::new(StmtKind::Block(Block { first, rest }));
        }
        Stmt::new(StmtKind::Block(Block { first, rest }))
    }

    /// Fold a sequence into a right-leaning chain. Empty input has no
    /// statement to represent.
    pub fn make_seq(stmts: Vec<Stmt>) -> Option<Stmt> {
        let mut result: Option<Stmt> = None;
        for stmt in stmts.into_iter().rev() {
            result = Some(match result {
                None => stmt,
                Some(rest) => Block::make(stmt, rest),
            });
        }
        result
    }
}

/// An if-then-else block; `else_case` may be absent.
pub struct IfThenElse {
    pub condition: Expr,
    pub then_case: Stmt,
    pub else_case: Option<Stmt>,
}

impl IfThenElse {
    pub fn make(
        condition: Expr,
        then_case: Stmt,
        else_case: Option<Stmt>,
    ) -> Stmt {
        Stmt::new(StmtKind::IfThenElse(IfThenElse {
            condition,
            then_case,
            else_case,
        }))
    }
}

/// Evaluate and discard an expression, presumably for its side effect.
pub struct Evaluate {
    pub value: Expr,
}

impl Evaluate {
    pub fn make(value: Expr) -> Stmt {
        Stmt::new(StmtKind::Evaluate(Evaluate { value }))
    }
}
