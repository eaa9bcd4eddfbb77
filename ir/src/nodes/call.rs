//! Calls and buffer loads.
//!
//! A `Call` is also the multi-dimensional cousin of `Load`: a call to
//! another pipeline stage reads that stage's buffer, and lowering turns it
//! into a `Load`. Neither survives to code generation in its high-level
//! form.

use std::rc::{Rc, Weak};

use mirage_base::internal_assert;
use mirage_dtype::Type;

use crate::expr::{Expr, VarExpr};
use crate::helpers::const_true;
use crate::nodes::ExprKind;

/// Read a value from a buffer at `index`, lanes masked by `predicate`. The
/// buffer has no inherent type; it is treated as an array of this node's
/// type.
pub struct Load {
    pub buffer_var: VarExpr,
    pub index: Expr,
    pub predicate: Expr,
}

impl Load {
    /// `predicate` defaults to an all-true mask of the matching lane count.
    pub fn make(
        ty: Type,
        buffer_var: VarExpr,
        index: Expr,
        predicate: Option<Expr>,
    ) -> Expr {
        let predicate =
            predicate.unwrap_or_else(|| const_true(ty.lanes()));
        internal_assert!(
            ty.lanes() == index.ty().lanes(),
            "Vector lanes of Load must match vector lanes of index"
        );
        internal_assert!(
            predicate.ty().is_bool(),
            "Load predicate is not boolean: {}",
            predicate.ty()
        );
        internal_assert!(
            ty.lanes() == predicate.ty().lanes(),
            "Vector lanes of Load must match vector lanes of predicate"
        );
        Expr::new(ty, ExprKind::Load(Load { buffer_var, index, predicate }))
    }
}

/// How a call is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CallType {
    /// A call to an external C-ABI function, possibly with side effects.
    Extern,
    /// A call to an external C++-ABI function, possibly with side effects.
    ExternCPlusPlus,
    /// A call to a guaranteed-side-effect-free external function.
    PureExtern,
    /// A call to another pipeline stage.
    Halide,
    /// A possibly-side-effecty compiler intrinsic with special handling
    /// during codegen.
    Intrinsic,
    /// A side-effect-free intrinsic.
    PureIntrinsic,
}

/// The pipeline-stage entity a `Halide` call refers back to. Owned by the
/// front end; calls only hold weak references to it, which is what keeps
/// the function-to-call-to-function loop from owning itself.
pub struct Function {
    name: String,
}

impl Function {
    pub fn new(name: &str) -> FunctionRef {
        FunctionRef(Rc::new(Function { name: name.to_string() }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Owning handle to a [`Function`].
#[derive(Clone)]
pub struct FunctionRef(Rc<Function>);

impl FunctionRef {
    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn downgrade(&self) -> Weak<Function> {
        Rc::downgrade(&self.0)
    }
}

impl std::ops::Deref for FunctionRef {
    type Target = Function;

    fn deref(&self) -> &Function {
        &self.0
    }
}

/// A function call: an extern function like `sin`, a compiler intrinsic, or
/// a read of another pipeline stage (`CallType::Halide`).
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub call_type: CallType,
    /// Weak back reference to the called stage, for `Halide` calls only.
    /// Self-references in update definitions leave this unset to avoid
    /// cycles.
    pub func: Option<Weak<Function>>,
    /// Which of the called function's values this call reads.
    pub value_index: i32,
}

impl Call {
    pub fn make(
        ty: Type,
        name: &str,
        args: Vec<Expr>,
        call_type: CallType,
        func: Option<&FunctionRef>,
        value_index: i32,
    ) -> Expr {
        if call_type == CallType::Halide {
            for arg in &args {
                internal_assert!(
                    arg.ty() == Type::int(32),
                    "Args to call to halide function must be type int32"
                );
            }
        }
        Expr::new(
            ty,
            ExprKind::Call(Call {
                name: name.to_string(),
                args,
                call_type,
                func: func.map(FunctionRef::downgrade),
                value_index,
            }),
        )
    }

    /// The called function, if it is still alive.
    pub fn func(&self) -> Option<FunctionRef> {
        self.func.as_ref()?.upgrade().map(FunctionRef)
    }

    /// Pure within a pipeline: same args always give the same result, and
    /// calls can be reordered, duplicated or unified freely. Not transitive;
    /// says nothing about the args. If in doubt, a call is not pure.
    pub fn is_pure(&self) -> bool {
        matches!(
            self.call_type,
            CallType::PureExtern | CallType::PureIntrinsic
        )
    }

    pub fn is_intrinsic(&self, name: &str) -> bool {
        matches!(
            self.call_type,
            CallType::Intrinsic | CallType::PureIntrinsic
        ) && self.name == name
    }
}

/// Intrinsic names matched by string during lowering and printing. The set
/// spans both historical profiles; `interleave_vectors`, `slice_vector` and
/// `trace` predate the `Shuffle` node and remain for front ends that still
/// emit them.
impl Call {
    pub const DEBUG_TO_FILE: &'static str = "debug_to_file";
    pub const SHUFFLE_VECTOR: &'static str = "shuffle_vector";
    pub const INTERLEAVE_VECTORS: &'static str = "interleave_vectors";
    pub const CONCAT_VECTORS: &'static str = "concat_vectors";
    pub const SLICE_VECTOR: &'static str = "slice_vector";
    pub const REINTERPRET: &'static str = "reinterpret";
    pub const BITWISE_AND: &'static str = "bitwise_and";
    pub const BITWISE_NOT: &'static str = "bitwise_not";
    pub const BITWISE_XOR: &'static str = "bitwise_xor";
    pub const BITWISE_OR: &'static str = "bitwise_or";
    pub const SHIFT_LEFT: &'static str = "shift_left";
    pub const SHIFT_RIGHT: &'static str = "shift_right";
    pub const ABS: &'static str = "abs";
    pub const ABSD: &'static str = "absd";
    pub const LERP: &'static str = "lerp";
    pub const RANDOM: &'static str = "random";
    pub const EXTRACT_BUFFER_HOST: &'static str = "extract_buffer_host";
    pub const EXTRACT_BUFFER_MIN: &'static str = "extract_buffer_min";
    pub const EXTRACT_BUFFER_MAX: &'static str = "extract_buffer_max";
    pub const POPCOUNT: &'static str = "popcount";
    pub const COUNT_LEADING_ZEROS: &'static str = "count_leading_zeros";
    pub const COUNT_TRAILING_ZEROS: &'static str = "count_trailing_zeros";
    pub const UNDEF: &'static str = "undef";
    pub const NULL_HANDLE: &'static str = "null_handle";
    pub const ADDRESS_OF: &'static str = "address_of";
    pub const RETURN_SECOND: &'static str = "return_second";
    pub const IF_THEN_ELSE: &'static str = "if_then_else";
    pub const TRACE: &'static str = "trace";
    pub const TRACE_EXPR: &'static str = "trace_expr";
    pub const MAKE_STRUCT: &'static str = "make_struct";
    pub const STRINGIFY: &'static str = "stringify";
    pub const MEMOIZE_EXPR: &'static str = "memoize_expr";
    pub const COPY_MEMORY: &'static str = "copy_memory";
    pub const LIKELY: &'static str = "likely";
    pub const LIKELY_IF_INNERMOST: &'static str = "likely_if_innermost";
    pub const DIV_ROUND_TO_ZERO: &'static str = "div_round_to_zero";
    pub const MOD_ROUND_TO_ZERO: &'static str = "mod_round_to_zero";
    pub const PREFETCH: &'static str = "prefetch";
    pub const SIGNED_INTEGER_OVERFLOW: &'static str =
        "signed_integer_overflow";
    pub const INDETERMINATE_EXPRESSION: &'static str =
        "indeterminate_expression";
    pub const BOOL_TO_MASK: &'static str = "bool_to_mask";
    pub const CAST_MASK: &'static str = "cast_mask";
    pub const SELECT_MASK: &'static str = "select_mask";
}
