//! Binary arithmetic, comparisons, logical operators and select.

use mirage_base::internal_assert;
use mirage_dtype::Type;

use crate::expr::Expr;
use crate::nodes::ExprKind;

/// Binary arithmetic nodes share one contract: both operands have the same
/// type, which is also the node's type.
macro_rules! binary_op {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$doc])*
        pub struct $name {
            pub a: Expr,
            pub b: Expr,
        }

        impl $name {
            pub fn make(a: Expr, b: Expr) -> Expr {
                internal_assert!(
                    a.ty() == b.ty(),
                    "{} of mismatched types: {} vs {}",
                    stringify!($name),
                    a.ty(),
                    b.ty()
                );
                let ty = a.ty();
                Expr::new(ty, ExprKind::$name($name { a, b }))
            }
        }
    )+};
}

binary_op! {
    /// The sum of two expressions.
    Add,
    /// The difference of two expressions.
    Sub,
    /// The product of two expressions.
    Mul,
    /// The ratio of two expressions.
    Div,
    /// The remainder of a / b.
    Mod,
    /// The lesser of two values.
    Min,
    /// The greater of two values.
    Max,
}

/// Comparison nodes require equal operand types and produce a boolean of
/// the operands' lane count.
macro_rules! cmp_op {
    ($($(#[$doc:meta])* $name:ident),+ $(,)?) => {$(
        $(#[$doc])*
        pub struct $name {
            pub a: Expr,
            pub b: Expr,
        }

        impl $name {
            pub fn make(a: Expr, b: Expr) -> Expr {
                internal_assert!(
                    a.ty() == b.ty(),
                    "{} of mismatched types: {} vs {}",
                    stringify!($name),
                    a.ty(),
                    b.ty()
                );
                let ty = Type::boolean().with_lanes(a.ty().lanes());
                Expr::new(ty, ExprKind::$name($name { a, b }))
            }
        }
    )+};
}

cmp_op! {
    /// Is the first expression equal to the second.
    EQ,
    /// Is the first expression not equal to the second.
    NE,
    /// Is the first expression less than the second.
    LT,
    /// Is the first expression less than or equal to the second.
    LE,
    /// Is the first expression greater than the second.
    GT,
    /// Is the first expression greater than or equal to the second.
    GE,
}

/// Logical and.
pub struct And {
    pub a: Expr,
    pub b: Expr,
}

impl And {
    pub fn make(a: Expr, b: Expr) -> Expr {
        internal_assert!(a.ty().is_bool(), "lhs of And is not a bool");
        internal_assert!(b.ty().is_bool(), "rhs of And is not a bool");
        internal_assert!(a.ty() == b.ty(), "And of mismatched types");
        let ty = Type::boolean().with_lanes(a.ty().lanes());
        Expr::new(ty, ExprKind::And(And { a, b }))
    }
}

/// Logical or.
pub struct Or {
    pub a: Expr,
    pub b: Expr,
}

impl Or {
    pub fn make(a: Expr, b: Expr) -> Expr {
        internal_assert!(a.ty().is_bool(), "lhs of Or is not a bool");
        internal_assert!(b.ty().is_bool(), "rhs of Or is not a bool");
        internal_assert!(a.ty() == b.ty(), "Or of mismatched types");
        let ty = Type::boolean().with_lanes(a.ty().lanes());
        Expr::new(ty, ExprKind::Or(Or { a, b }))
    }
}

/// Logical not.
pub struct Not {
    pub a: Expr,
}

impl Not {
    pub fn make(a: Expr) -> Expr {
        internal_assert!(a.ty().is_bool(), "argument of Not is not a bool");
        let ty = Type::boolean().with_lanes(a.ty().lanes());
        Expr::new(ty, ExprKind::Not(Not { a }))
    }
}

/// Evaluate `true_value` or `false_value` depending on `condition`, like the
/// C ternary operator. A scalar condition selects between whole vectors; a
/// vector condition selects lane-wise and must match the branches' lanes.
pub struct Select {
    pub condition: Expr,
    pub true_value: Expr,
    pub false_value: Expr,
}

impl Select {
    pub fn make(condition: Expr, true_value: Expr, false_value: Expr) -> Expr {
        internal_assert!(
            condition.ty().is_bool(),
            "First argument to Select is not a bool: {}",
            condition.ty()
        );
        internal_assert!(
            true_value.ty() == false_value.ty(),
            "Select of mismatched types: {} vs {}",
            true_value.ty(),
            false_value.ty()
        );
        internal_assert!(
            condition.ty().is_scalar()
                || condition.ty().lanes() == true_value.ty().lanes(),
            "In Select, vector lanes of condition must either be 1, or equal \
             to vector lanes of arguments"
        );
        let ty = true_value.ty();
        Expr::new(
            ty,
            ExprKind::Select(Select { condition, true_value, false_value }),
        )
    }
}
