use std::collections::HashMap;

use proptest::prelude::*;

use crate::compare::equal;
use crate::mutator::IrMutator;
use crate::nodes::{Cast, Call, CallType, IntImm, Let, Variable};
use crate::pass::common_subexpression_elimination as cse;
use crate::pass::common_subexpression_elimination_stmt as cse_stmt;
use crate::test::support::{build, recipe_strategy};
use crate::{Expr, ExprKind, Type, VarExpr};

fn int32(v: i64) -> Expr {
    IntImm::make(Type::int(32), v)
}

/// Rewrite all let-bound variables to `t0, t1, ...` in declaration order so
/// results can be compared without caring which nodes the pass allocated.
/// Mutate the result, reset, then mutate the expectation: both sides end up
/// over the same replacement variables.
struct NormalizeVarExprs {
    counter: usize,
    replacement_vars: Vec<VarExpr>,
    renumbered: HashMap<u64, usize>,
}

impl NormalizeVarExprs {
    fn new() -> Self {
        Self {
            counter: 0,
            replacement_vars: Vec::new(),
            renumbered: HashMap::new(),
        }
    }

    fn reset_counter(&mut self) {
        self.counter = 0;
        self.renumbered.clear();
    }
}

impl IrMutator for NormalizeVarExprs {
    fn visit_variable(
        &mut self,
        _op: &crate::nodes::Variable,
        e: &Expr,
    ) -> Expr {
        match self.renumbered.get(&e.id()) {
            Some(&index) => self.replacement_vars[index].clone().into(),
            None => e.clone(),
        }
    }

    fn visit_let(&mut self, op: &Let, _e: &Expr) -> Expr {
        let new_var = if self.counter == self.replacement_vars.len() {
            // First pass over the pair: mint the normalised variable.
            let var = Variable::make(
                op.var.ty(),
                &format!("t{}", self.counter),
            );
            self.replacement_vars.push(var.clone());
            var
        } else {
            // Second pass: reuse the one the first pass minted.
            self.replacement_vars[self.counter].clone()
        };
        self.renumbered.insert(op.var.id(), self.counter);
        self.counter += 1;

        let value = self.mutate_expr(&op.value);
        let body = self.mutate_expr(&op.body);
        Let::make(new_var, value, body)
    }
}

fn check(input: &Expr, correct: &Expr) {
    let result = cse(input);
    let mut normalizer = NormalizeVarExprs::new();
    let result = normalizer.mutate_expr(&result);
    normalizer.reset_counter();
    let correct = normalizer.mutate_expr(correct);
    assert!(
        equal(&result, &correct),
        "incorrect CSE:\n{input}\nbecame:\n{result}\ninstead of:\n{correct}"
    );
}

/// A nested block of lets. Variables `t[n]` refer to expression n of the
/// vector.
fn ssa_block(exprs: Vec<Expr>, t: &[VarExpr]) -> Expr {
    let mut e = exprs.last().expect("ssa_block of nothing").clone();
    for i in (1..exprs.len()).rev() {
        e = Let::make(t[i - 1].clone(), exprs[i - 1].clone(), e);
    }
    e
}

fn test_vars() -> (Expr, Vec<VarExpr>, Vec<VarExpr>) {
    let x: Expr = Variable::make(Type::int(32), "x").into();
    let t: Vec<VarExpr> = (0..32)
        .map(|i| Variable::make(Type::int(32), &format!("t{i}")))
        .collect();
    let tf: Vec<VarExpr> = (0..32)
        .map(|i| Variable::make(Type::float(32), &format!("t{i}")))
        .collect();
    (x, t, tf)
}

#[test]
fn trivial_inputs_come_back_unchanged() {
    let (x, _, _) = test_vars();
    assert!(cse(&x).same_as(&x));

    let five = int32(5);
    assert!(cse(&five).same_as(&five));
}

#[test]
fn already_minimal_let_survives() {
    let (x, _, tf) = test_vars();
    let sin_x = Call::make(
        Type::float(32),
        "sin",
        vec![Cast::make(Type::float(32), x)],
        CallType::PureExtern,
        None,
        0,
    );
    let tf0: Expr = tf[0].clone().into();
    let e = ssa_block(vec![sin_x, &tf0 * &tf0], &tf);
    check(&e, &e);
}

#[test]
fn basic_sharing_is_extracted() {
    let (x, t, _) = test_vars();

    // ((x*x + x) * (x*x + x)) + x*x, doubled.
    let xx_plus_x = &(&x * &x) + &x;
    let mut e = &(&xx_plus_x * &xx_plus_x) + &(&x * &x);
    e = &e + &e;

    let t0: Expr = t[0].clone().into();
    let t1: Expr = t[1].clone().into();
    let t2: Expr = t[2].clone().into();
    let correct = ssa_block(
        vec![
            &x * &x,            // t0 = x*x
            &t0 + &x,           // t1 = t0 + x
            &(&t1 * &t1) + &t0, // t2 = t1*t1 + t0
            &t2 + &t2,
        ],
        &t,
    );
    check(&e, &correct);

    // Idempotence: the output is a fixed point (also tests lets on input).
    check(&correct, &correct);
}

#[test]
fn redundant_lets_collapse() {
    let (x, t, _) = test_vars();
    let t0: Expr = t[0].clone().into();
    let t1: Expr = t[1].clone().into();
    let t2: Expr = t[2].clone().into();
    let t3: Expr = t[3].clone().into();
    let t4: Expr = t[4].clone().into();

    let e = ssa_block(
        vec![
            &x * &x,
            &x * &x,
            &t0 / &t1,
            &t1 / &t1,
            &t2 % &t3,
            &(&t4 + &(&x * &x)) + &(&x * &x),
        ],
        &t,
    );
    let correct = ssa_block(
        vec![
            &x * &x,
            &t0 / &t0,
            &(&(&t1 % &t1) + &t0) + &t0,
        ],
        &t,
    );
    check(&e, &correct);
}

#[test]
fn nested_lets_with_shared_values() {
    let (x, t, _) = test_vars();
    let t0: Expr = t[0].clone().into();
    let t1: Expr = t[1].clone().into();
    let t2: Expr = t[2].clone().into();
    let t3: Expr = t[3].clone().into();
    let t4: Expr = t[4].clone().into();

    // Nested lets with shared subexpressions between the lets, and
    // re-bound variable identities.
    let e1 = ssa_block(
        vec![
            &x * &x,            // a = x*x
            &t0 + &x,           // b = a + x
            &(&t1 * &t1) * &t0, // c = b * b * a
        ],
        &t,
    );
    let e2 = ssa_block(
        vec![
            &x * &x,            // a again
            &t0 - &x,           // d = a - x
            &(&t1 * &t1) * &t0, // e = d * d * a
        ],
        &t,
    );
    let e = ssa_block(
        vec![
            &e1 + &(&x * &x),      // f = c + a
            &e1 + &e2,             // g = c + e
            &t0 + &(&t0 * &t1),    // h = f + f * g
        ],
        &t,
    );

    let correct = ssa_block(
        vec![
            &x * &x,                 // t0 = x*x
            &t0 + &x,                // t1 = t0 + x
            &(&t1 * &t1) * &t0,      // t2 = t1*t1*t0
            &t2 + &t0,               // t3 = t2 + t0
            &t0 - &x,                // t4 = t0 - x
            &t3 + &(&t3 * &(&t2 + &(&(&t4 * &t4) * &t0))),
        ],
        &t,
    );
    check(&e, &correct);
}

#[test]
fn cse_scales_on_shared_towers() {
    let (x, _, _) = test_vars();
    // Unshared, this is an astronomically large tree; numbered as a DAG it
    // is tiny. The pass must run in DAG size.
    let mut e = x;
    for i in 0..100 {
        let i = int32(i);
        e = &(&(&e * &e) + &e) + &i;
        e = &(&e * &e) - &(&e * &i);
    }
    let result = cse(&e);
    // The result must start with a let over the innermost shared term.
    assert!(matches!(result.kind(), ExprKind::Let(_)));
}

#[test]
fn statement_cse_rewrites_each_expression() {
    use crate::helpers::const_true;
    use crate::nodes::{Block, Evaluate, Store};

    let (x, _, _) = test_vars();
    let buf = Variable::make(Type::handle(), "out");
    let squared_twice = &(&x * &x) + &(&x * &x);

    let s = Block::make(
        Store::make(buf, squared_twice.clone(), x.clone(), None),
        Evaluate::make(squared_twice.clone()),
    );
    let rewritten = cse_stmt(&s);

    // Each expression position is let-wrapped independently.
    match rewritten.kind() {
        crate::StmtKind::Block(op) => {
            match op.first.kind() {
                crate::StmtKind::Store(store) => {
                    assert!(matches!(store.value.kind(), ExprKind::Let(_)));
                    assert!(store.index.same_as(&x));
                    assert!(equal(&store.predicate, &const_true(1)));
                }
                _ => panic!("expected Store"),
            }
            match op.rest.kind() {
                crate::StmtKind::Evaluate(eval) => {
                    assert!(matches!(eval.value.kind(), ExprKind::Let(_)));
                }
                _ => panic!("expected Evaluate"),
            }
        }
        _ => panic!("expected Block"),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn cse_is_idempotent(recipe in recipe_strategy()) {
        let x: Expr = Variable::make(Type::int(32), "x").into();
        let e = build(&recipe, &x);
        let once = cse(&e);
        check(&once, &once);
    }
}
