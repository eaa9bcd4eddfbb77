//! Small expression utilities shared by the printer, the passes and tests.

use mirage_dtype::Type;

use crate::expr::Expr;
use crate::nodes::{
    Add, Broadcast, Div, Mod, Mul, Sub, ExprKind, UIntImm,
};

/// Is this expression a literal, a broadcast of a literal, or a ramp of
/// literals?
pub fn is_const(e: &Expr) -> bool {
    match e.kind() {
        ExprKind::IntImm(_)
        | ExprKind::UIntImm(_)
        | ExprKind::FloatImm(_)
        | ExprKind::StringImm(_) => true,
        ExprKind::Broadcast(op) => is_const(&op.value),
        ExprKind::Ramp(op) => is_const(&op.base) && is_const(&op.stride),
        _ => false,
    }
}

/// Does this expression evaluate to the given constant, in every lane?
/// Unsigned and float literals compare against the value's widened form.
pub fn is_const_value(e: &Expr, value: i64) -> bool {
    match e.kind() {
        ExprKind::IntImm(op) => op.value == value,
        ExprKind::UIntImm(op) => op.value as i64 == value,
        ExprKind::FloatImm(op) => op.value == value as f64,
        ExprKind::Broadcast(op) => is_const_value(&op.value, value),
        _ => false,
    }
}

/// Is this expression the constant one (in every lane)?
pub fn is_one(e: &Expr) -> bool {
    is_const_value(e, 1)
}

/// Is this expression the constant zero (in every lane)?
pub fn is_zero(e: &Expr) -> bool {
    is_const_value(e, 0)
}

/// An all-true boolean of the given lane count.
pub fn const_true(lanes: u16) -> Expr {
    let one = UIntImm::make(Type::boolean(), 1);
    if lanes == 1 { one } else { Broadcast::make(one, lanes) }
}

/// An all-false boolean of the given lane count.
pub fn const_false(lanes: u16) -> Expr {
    let zero = UIntImm::make(Type::boolean(), 0);
    if lanes == 1 { zero } else { Broadcast::make(zero, lanes) }
}

// Arithmetic sugar; operands must already have matching types, exactly as
// with the underlying constructors.

macro_rules! expr_binop {
    ($($trait:ident :: $method:ident => $node:ident),+ $(,)?) => {$(
        impl std::ops::$trait for Expr {
            type Output = Expr;

            fn $method(self, rhs: Expr) -> Expr {
                $node::make(self, rhs)
            }
        }

        impl<'a, 'b> std::ops::$trait<&'b Expr> for &'a Expr {
            type Output = Expr;

            fn $method(self, rhs: &'b Expr) -> Expr {
                $node::make(self.clone(), rhs.clone())
            }
        }
    )+};
}

expr_binop! {
    Add::add => Add,
    Sub::sub => Sub,
    Mul::mul => Mul,
    Div::div => Div,
    Rem::rem => Mod,
}
