use proptest::prelude::*;

use crate::compare::equal;
use crate::mutator::{
    graph_mutate_expr, graph_mutate_stmt, GraphMutMemo, HasGraphMemo,
    IrMutator,
};
use crate::nodes::{
    Add, Block, Evaluate, IntImm, Mul, Store, Sub, Variable,
};
use crate::test::support::{build, recipe_strategy};
use crate::visitor::{GraphVisitMemo, IrVisitor};
use crate::{Expr, Stmt, Type};

fn x() -> Expr {
    Variable::make(Type::int(32), "x").into()
}

fn int32(v: i64) -> Expr {
    IntImm::make(Type::int(32), v)
}

/// Every visit falls through to the defaults; nothing changes.
struct NoOp;

impl IrMutator for NoOp {}

#[test]
fn no_op_mutation_returns_the_original_node() {
    let x = x();
    let e = Add::make(Mul::make(x.clone(), x.clone()), int32(7));
    let out = NoOp.mutate_expr(&e);
    assert!(out.same_as(&e), "unchanged children must not rebuild");

    let buf = Variable::make(Type::handle(), "buf");
    let s = Block::make(
        Store::make(buf, e.clone(), int32(0), None),
        Evaluate::make(x),
    );
    let out = NoOp.mutate_stmt(&s);
    assert!(out.same_as(&s));
}

proptest! {
    #[test]
    fn no_op_mutation_preserves_identity(recipe in recipe_strategy()) {
        let x = x();
        let e = build(&recipe, &x);
        prop_assert!(NoOp.mutate_expr(&e).same_as(&e));
    }
}

/// Replaces one specific node, forcing every ancestor to rebuild.
struct Replace {
    target: Expr,
    with: Expr,
}

impl IrMutator for Replace {
    fn mutate_expr(&mut self, e: &Expr) -> Expr {
        if e.same_as(&self.target) {
            return self.with.clone();
        }
        self.dispatch_expr(e)
    }
}

#[test]
fn a_real_rewrite_rebuilds_only_the_spine() {
    let x = x();
    let target = Mul::make(x.clone(), x.clone());
    let untouched = Sub::make(x.clone(), int32(1));
    let e = Add::make(target.clone(), untouched.clone());

    let out =
        Replace { target, with: int32(9) }.mutate_expr(&e);
    assert!(!out.same_as(&e));
    assert!(equal(&out, &Add::make(int32(9), untouched.clone())));

    // The untouched branch is shared, not copied.
    match out.kind() {
        crate::ExprKind::Add(op) => assert!(op.b.same_as(&untouched)),
        _ => panic!("expected Add"),
    }
}

/// Graph mutator that counts how many times the Mul visit runs.
struct CountingMuls {
    memo: GraphMutMemo,
    mul_visits: usize,
}

impl HasGraphMemo for CountingMuls {
    fn graph_memo(&mut self) -> &mut GraphMutMemo {
        &mut self.memo
    }
}

impl IrMutator for CountingMuls {
    fn mutate_expr(&mut self, e: &Expr) -> Expr {
        graph_mutate_expr(self, e)
    }

    fn mutate_stmt(&mut self, s: &Stmt) -> Stmt {
        graph_mutate_stmt(self, s)
    }

    fn visit_mul(&mut self, op: &Mul, e: &Expr) -> Expr {
        self.mul_visits += 1;
        let a = self.mutate_expr(&op.a);
        let b = self.mutate_expr(&op.b);
        if a.same_as(&op.a) && b.same_as(&op.b) {
            e.clone()
        } else {
            Mul::make(a, b)
        }
    }
}

#[test]
fn graph_mutator_visits_shared_nodes_once() {
    let x = x();
    let shared = Mul::make(x.clone(), x.clone());
    // `shared` appears four times in the expression DAG.
    let e = Add::make(
        Add::make(shared.clone(), shared.clone()),
        Add::make(shared.clone(), shared.clone()),
    );

    let mut m = CountingMuls { memo: GraphMutMemo::new(), mul_visits: 0 };
    let out = m.mutate_expr(&e);
    assert!(out.same_as(&e));
    assert_eq!(m.mul_visits, 1, "shared node must be rewritten once");
}

#[test]
fn graph_mutator_keeps_the_output_a_dag() {
    let x = x();
    let shared = Mul::make(x.clone(), int32(2));
    let e = Add::make(shared.clone(), shared.clone());

    // Rewrite x so the shared node must rebuild, then check the rebuilt
    // node is shared in the output too.
    struct SwapX {
        memo: GraphMutMemo,
        x: Expr,
    }
    impl HasGraphMemo for SwapX {
        fn graph_memo(&mut self) -> &mut GraphMutMemo {
            &mut self.memo
        }
    }
    impl IrMutator for SwapX {
        fn mutate_expr(&mut self, e: &Expr) -> Expr {
            if e.same_as(&self.x) {
                return IntImm::make(Type::int(32), 5);
            }
            graph_mutate_expr(self, e)
        }
    }

    let out =
        SwapX { memo: GraphMutMemo::new(), x: x.clone() }.mutate_expr(&e);
    match out.kind() {
        crate::ExprKind::Add(op) => {
            assert!(
                op.a.same_as(&op.b),
                "both arms must share the rewritten node"
            );
        }
        _ => panic!("expected Add"),
    }
}

/// Visitor that tallies every Mul it enters, memoising by identity.
struct CountMulVisits {
    memo: GraphVisitMemo,
    muls: usize,
}

impl IrVisitor for CountMulVisits {
    fn include_expr(&mut self, e: &Expr) {
        if self.memo.first_visit_expr(e) {
            self.visit_expr(e);
        }
    }

    fn visit_mul(&mut self, op: &Mul, _e: &Expr) {
        self.muls += 1;
        self.include_expr(&op.a);
        self.include_expr(&op.b);
    }
}

#[test]
fn graph_visitor_enters_shared_subterms_once() {
    let x = x();
    let shared = Mul::make(x.clone(), x.clone());
    let e = Add::make(
        Mul::make(shared.clone(), shared.clone()),
        shared.clone(),
    );

    let mut v = CountMulVisits { memo: GraphVisitMemo::new(), muls: 0 };
    v.include_expr(&e);
    // The outer product plus the shared square: two distinct Mul nodes.
    assert_eq!(v.muls, 2);
}
