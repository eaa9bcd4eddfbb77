//! Literals, variables, casts and let expressions.

use mirage_base::internal_assert;
use mirage_dtype::{fp16, Type};

use crate::expr::{Expr, VarExpr};
use crate::nodes::ExprKind;

/// Signed integer literal. The stored value is normalised by sign-extending
/// modulo the declared bit width, so equal values under the declared type
/// have identical representations.
pub struct IntImm {
    pub value: i64,
}

impl IntImm {
    pub fn make(ty: Type, value: i64) -> Expr {
        internal_assert!(
            ty.is_int() && ty.is_scalar(),
            "IntImm must be a scalar Int, not {ty}"
        );
        internal_assert!(
            matches!(ty.bits(), 8 | 16 | 32 | 64),
            "IntImm must be 8, 16, 32, or 64-bit"
        );

        // Drop the high bits, then sign-extend them back.
        let shift = 64 - u32::from(ty.bits());
        let value = (value << shift) >> shift;

        Expr::new(ty, ExprKind::IntImm(IntImm { value }))
    }
}

/// Unsigned integer literal, zero-extended modulo the declared bit width.
/// `UIntImm(uint1, 1)` is the canonical `true`.
pub struct UIntImm {
    pub value: u64,
}

impl UIntImm {
    pub fn make(ty: Type, value: u64) -> Expr {
        internal_assert!(
            ty.is_uint() && ty.is_scalar(),
            "UIntImm must be a scalar UInt, not {ty}"
        );
        internal_assert!(
            matches!(ty.bits(), 1 | 8 | 16 | 32 | 64),
            "UIntImm must be 1, 8, 16, 32, or 64-bit"
        );

        let shift = 64 - u32::from(ty.bits());
        let value = (value << shift) >> shift;

        Expr::new(ty, ExprKind::UIntImm(UIntImm { value }))
    }
}

/// Floating-point literal. 32- and 16-bit values are rounded to their
/// declared precision before being stored as an f64.
pub struct FloatImm {
    pub value: f64,
}

impl FloatImm {
    pub fn make(ty: Type, value: f64) -> Expr {
        internal_assert!(
            ty.is_float() && ty.is_scalar(),
            "FloatImm must be a scalar Float, not {ty}"
        );
        let value = match ty.bits() {
            16 => fp16::round_trip(value),
            32 => value as f32 as f64,
            64 => value,
            _ => unreachable!("Type admits only 16/32/64-bit floats"),
        };

        Expr::new(ty, ExprKind::FloatImm(FloatImm { value }))
    }
}

/// String literal. Typed as an opaque handle.
pub struct StringImm {
    pub value: String,
}

impl StringImm {
    pub fn make(value: &str) -> Expr {
        Expr::new(
            Type::handle(),
            ExprKind::StringImm(StringImm { value: value.to_string() }),
        )
    }
}

/// Reinterpret a value as another type of the same lane count.
pub struct Cast {
    pub value: Expr,
}

impl Cast {
    pub fn make(ty: Type, value: Expr) -> Expr {
        internal_assert!(
            ty.lanes() == value.ty().lanes(),
            "Cast may not change vector widths: {} to {ty}",
            value.ty()
        );
        Expr::new(ty, ExprKind::Cast(Cast { value }))
    }
}

/// A named variable: a loop variable, a function argument, or something
/// bound by a `Let`/`LetStmt`. Identified by the node, not the name; the
/// name is a hint.
pub struct Variable {
    pub name_hint: String,
}

impl Variable {
    pub fn make(ty: Type, name_hint: &str) -> VarExpr {
        VarExpr::from_expr(Expr::new(
            ty,
            ExprKind::Variable(Variable { name_hint: name_hint.to_string() }),
        ))
    }
}

/// A let expression. Within `body`, the variable `var` refers to `value`.
pub struct Let {
    pub var: VarExpr,
    pub value: Expr,
    pub body: Expr,
}

impl Let {
    pub fn make(var: VarExpr, value: Expr, body: Expr) -> Expr {
        internal_assert!(
            value.ty() == var.ty(),
            "Let variable of type {} bound to value of type {}",
            var.ty(),
            value.ty()
        );
        let ty = body.ty();
        Expr::new(ty, ExprKind::Let(Let { var, value, body }))
    }
}
