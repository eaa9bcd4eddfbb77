//! Shared helpers for the IR test suite.

use proptest::prelude::*;

use crate::nodes::{Add, Div, IntImm, Max, Min, Mul, Sub};
use crate::{Expr, Type};

/// A variable-free description of an int32 expression shape. Materialise it
/// against a concrete variable with [`build`]; building the same recipe
/// twice gives distinct nodes with identical structure.
#[derive(Debug, Clone)]
pub enum ExprRecipe {
    X,
    Const(i8),
    Add(Box<ExprRecipe>, Box<ExprRecipe>),
    Sub(Box<ExprRecipe>, Box<ExprRecipe>),
    Mul(Box<ExprRecipe>, Box<ExprRecipe>),
    Div(Box<ExprRecipe>, Box<ExprRecipe>),
    Min(Box<ExprRecipe>, Box<ExprRecipe>),
    Max(Box<ExprRecipe>, Box<ExprRecipe>),
}

pub fn build(recipe: &ExprRecipe, x: &Expr) -> Expr {
    match recipe {
        ExprRecipe::X => x.clone(),
        ExprRecipe::Const(v) => IntImm::make(Type::int(32), i64::from(*v)),
        ExprRecipe::Add(a, b) => Add::make(build(a, x), build(b, x)),
        ExprRecipe::Sub(a, b) => Sub::make(build(a, x), build(b, x)),
        ExprRecipe::Mul(a, b) => Mul::make(build(a, x), build(b, x)),
        ExprRecipe::Div(a, b) => Div::make(build(a, x), build(b, x)),
        ExprRecipe::Min(a, b) => Min::make(build(a, x), build(b, x)),
        ExprRecipe::Max(a, b) => Max::make(build(a, x), build(b, x)),
    }
}

pub fn recipe_strategy() -> impl Strategy<Value = ExprRecipe> {
    let leaf = prop_oneof![
        Just(ExprRecipe::X),
        any::<i8>().prop_map(ExprRecipe::Const),
    ];
    leaf.prop_recursive(5, 48, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| {
                ExprRecipe::Add(Box::new(a), Box::new(b))
            }),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| {
                ExprRecipe::Sub(Box::new(a), Box::new(b))
            }),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| {
                ExprRecipe::Mul(Box::new(a), Box::new(b))
            }),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| {
                ExprRecipe::Div(Box::new(a), Box::new(b))
            }),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| {
                ExprRecipe::Min(Box::new(a), Box::new(b))
            }),
            (inner.clone(), inner).prop_map(|(a, b)| {
                ExprRecipe::Max(Box::new(a), Box::new(b))
            }),
        ]
    })
}
