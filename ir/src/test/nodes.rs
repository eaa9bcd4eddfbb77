use test_case::test_case;

use crate::compare::equal;
use crate::helpers::{const_true, is_one};
use crate::nodes::*;
use crate::{Expr, ExprKind, Stmt, StmtKind, Type};

fn int32(v: i64) -> Expr {
    IntImm::make(Type::int(32), v)
}

fn no_op() -> Stmt {
    Evaluate::make(int32(0))
}

#[test_case(8, 257, 1; "i8 wraps past the top")]
#[test_case(8, 128, -128; "i8 sign bit extends")]
#[test_case(8, -1, -1; "i8 negative survives")]
#[test_case(16, 0x1_8000, -0x8000; "i16 sign bit extends")]
#[test_case(32, 0x1_0000_0001, 1; "i32 drops high word")]
#[test_case(64, -42, -42; "i64 untouched")]
fn int_literals_normalise(bits: u8, value: i64, expected: i64) {
    let e = IntImm::make(Type::int(bits), value);
    match e.kind() {
        ExprKind::IntImm(op) => assert_eq!(op.value, expected),
        _ => panic!("expected IntImm"),
    }
    // Equal values under the declared type are structurally identical.
    assert!(equal(&e, &IntImm::make(Type::int(bits), expected)));
}

#[test_case(1, 3, 1; "bool keeps the low bit")]
#[test_case(8, 256, 0; "u8 wraps to zero")]
#[test_case(8, 255, 255; "u8 max survives")]
#[test_case(16, 0x1_0001, 1; "u16 drops high bits")]
fn uint_literals_normalise(bits: u8, value: u64, expected: u64) {
    let e = UIntImm::make(Type::uint(bits), value);
    match e.kind() {
        ExprKind::UIntImm(op) => assert_eq!(op.value, expected),
        _ => panic!("expected UIntImm"),
    }
}

#[test]
fn float_literals_round_to_declared_precision() {
    let exact64 = FloatImm::make(Type::float(64), 0.1);
    match exact64.kind() {
        ExprKind::FloatImm(op) => assert_eq!(op.value, 0.1),
        _ => panic!("expected FloatImm"),
    }
    let rounded32 = FloatImm::make(Type::float(32), 0.1);
    match rounded32.kind() {
        ExprKind::FloatImm(op) => assert_eq!(op.value, 0.1f32 as f64),
        _ => panic!("expected FloatImm"),
    }
    let rounded16 = FloatImm::make(Type::float(16), 0.1);
    match rounded16.kind() {
        // 0.1 is inexact in binary16; the nearest value is 0.0999755859375.
        ExprKind::FloatImm(op) => assert_eq!(op.value, 0.0999755859375),
        _ => panic!("expected FloatImm"),
    }
}

#[test]
fn binary_ops_take_the_common_type() {
    let a = int32(1);
    let b = int32(2);
    let sum = Add::make(a, b);
    assert_eq!(sum.ty(), Type::int(32));

    let cmp = LT::make(sum.clone(), int32(5));
    assert_eq!(cmp.ty(), Type::boolean());

    let vec_a = Broadcast::make(int32(1), 4);
    let vec_b = Broadcast::make(int32(2), 4);
    let vec_cmp = EQ::make(vec_a, vec_b);
    assert_eq!(vec_cmp.ty(), Type::boolean().with_lanes(4));
}

#[test]
#[should_panic(expected = "Add of mismatched types")]
fn add_rejects_mismatched_types() {
    Add::make(int32(1), IntImm::make(Type::int(16), 1));
}

#[test]
#[should_panic(expected = "First argument to Select is not a bool")]
fn select_rejects_non_bool_condition() {
    Select::make(int32(1), int32(2), int32(3));
}

#[test]
#[should_panic(expected = "Select of mismatched types")]
fn select_rejects_mismatched_branches() {
    let cond = EQ::make(int32(1), int32(1));
    Select::make(cond, int32(2), FloatImm::make(Type::float(32), 2.0));
}

#[test]
#[should_panic(expected = "lhs of And is not a bool")]
fn and_rejects_non_bool() {
    And::make(int32(1), int32(1));
}

#[test]
#[should_panic(expected = "Cast may not change vector widths")]
fn cast_rejects_lane_change() {
    Cast::make(Type::int(16).with_lanes(4), int32(1));
}

#[test]
#[should_panic(expected = "Ramp of lanes <= 1")]
fn ramp_rejects_single_lane() {
    Ramp::make(int32(0), int32(1), 1);
}

#[test]
#[should_panic(expected = "Ramp of mismatched types")]
fn ramp_rejects_mismatched_stride() {
    Ramp::make(int32(0), IntImm::make(Type::int(64), 1), 4);
}

#[test]
#[should_panic(expected = "Broadcast of lanes 1")]
fn broadcast_rejects_single_lane() {
    Broadcast::make(int32(0), 1);
}

#[test]
#[should_panic(expected = "Broadcast of vector")]
fn broadcast_rejects_vector_value() {
    Broadcast::make(Broadcast::make(int32(0), 4), 8);
}

#[test]
#[should_panic(expected = "Let variable of type")]
fn let_rejects_type_mismatch() {
    let var = Variable::make(Type::int(32), "v");
    Let::make(var.clone(), IntImm::make(Type::int(64), 1), var.into());
}

#[test]
#[should_panic(expected = "must be type int32")]
fn halide_call_rejects_wide_args() {
    Call::make(
        Type::float(32),
        "blur",
        vec![IntImm::make(Type::int(64), 0)],
        CallType::Halide,
        None,
        0,
    );
}

#[test]
#[should_panic(expected = "Vector lanes of Load must match")]
fn load_rejects_lane_mismatch() {
    let buf = Variable::make(Type::handle(), "buf");
    Load::make(Type::float(32).with_lanes(4), buf, int32(0), None);
}

#[test]
fn load_predicate_defaults_to_all_true() {
    let buf = Variable::make(Type::handle(), "buf");
    let index = Ramp::make(int32(0), int32(1), 4);
    let load =
        Load::make(Type::float(32).with_lanes(4), buf.clone(), index, None);
    match load.kind() {
        ExprKind::Load(op) => {
            assert!(is_one(&op.predicate));
            assert_eq!(op.predicate.ty(), Type::boolean().with_lanes(4));
        }
        _ => panic!("expected Load"),
    }

    let store = Store::make(buf, int32(1), int32(0), None);
    match store.kind() {
        StmtKind::Store(op) => {
            assert!(equal(&op.predicate, &const_true(1)));
        }
        _ => panic!("expected Store"),
    }
}

#[test]
fn call_func_reference_is_weak() {
    let func = Function::new("luma");
    let call = Call::make(
        Type::float(32),
        "luma",
        vec![int32(0)],
        CallType::Halide,
        Some(&func),
        0,
    );
    let op = call.as_node::<Call>().expect("expected Call");
    assert_eq!(op.func().expect("func should be alive").name(), "luma");

    drop(func);
    assert!(op.func().is_none(), "dropping the owner must kill the ref");
}

#[test]
fn variables_are_identified_by_node() {
    let a = Variable::make(Type::int(32), "x");
    let b = Variable::make(Type::int(32), "x");
    assert!(!a.same_as(&b));
    assert!(!equal(&a, &b), "same name is not same variable");
    assert!(equal(&a, &a.clone()));
}

#[test]
fn type_keys_and_indices_are_stable() {
    let sum = Add::make(int32(1), int32(2));
    assert_eq!(sum.type_key(), "Add");
    let again = Add::make(int32(3), int32(4));
    assert_eq!(sum.type_index(), again.type_index());

    let product = Mul::make(int32(1), int32(2));
    assert_ne!(sum.type_index(), product.type_index());
    assert_eq!(
        crate::registry::type_index_to_key(product.type_index()),
        "Mul"
    );
}

#[test]
fn block_make_canonicalises_to_right_leaning() {
    let a = no_op();
    let b = no_op();
    let c = no_op();
    let nested = Block::make(Block::make(a.clone(), b), c);
    match nested.kind() {
        StmtKind::Block(op) => {
            assert!(op.first.same_as(&a), "left child must be the leaf");
            assert!(matches!(op.rest.kind(), StmtKind::Block(_)));
        }
        _ => panic!("expected Block"),
    }
}

#[test]
fn block_make_seq_folds_from_the_right() {
    assert!(Block::make_seq(vec![]).is_none());

    let only = no_op();
    let single =
        Block::make_seq(vec![only.clone()]).expect("one statement in");
    assert!(single.same_as(&only));

    let stmts: Vec<Stmt> = (0..5).map(|_| no_op()).collect();
    let mut walk = Block::make_seq(stmts).expect("five statements in");
    let mut leaves = 0;
    loop {
        let next = match walk.kind() {
            StmtKind::Block(op) => {
                // The spine leans right: no block on the left, ever.
                assert!(!matches!(op.first.kind(), StmtKind::Block(_)));
                leaves += 1;
                Some(op.rest.clone())
            }
            _ => {
                leaves += 1;
                None
            }
        };
        match next {
            Some(rest) => walk = rest,
            None => break,
        }
    }
    assert_eq!(leaves, 5);
}

#[test]
fn shuffle_factories_compute_index_patterns() {
    let a = Ramp::make(int32(0), int32(1), 4);
    let b = Ramp::make(int32(8), int32(1), 4);

    let interleaved = Shuffle::make_interleave(vec![a.clone(), b.clone()]);
    let op = interleaved.as_node::<Shuffle>().expect("expected Shuffle");
    assert_eq!(op.indices, vec![0, 4, 1, 5, 2, 6, 3, 7]);
    assert!(op.is_interleave());
    assert!(!op.is_concat());
    assert_eq!(interleaved.ty(), Type::int(32).with_lanes(8));

    let concatenated = Shuffle::make_concat(vec![a.clone(), b.clone()]);
    let op = concatenated.as_node::<Shuffle>().expect("expected Shuffle");
    assert_eq!(op.indices, (0..8).collect::<Vec<i32>>());
    assert!(op.is_concat());
    assert!(
        !op.is_slice(),
        "a full-length ramp is a concat, never a slice"
    );

    let sliced = Shuffle::make_slice(a.clone(), 1, 2, 2);
    let op = sliced.as_node::<Shuffle>().expect("expected Shuffle");
    assert_eq!(op.indices, vec![1, 3]);
    assert!(op.is_slice());
    assert_eq!(op.slice_begin(), 1);
    assert_eq!(op.slice_stride(), 2);
    assert!(!op.is_interleave());

    let extracted = Shuffle::make_extract_element(a.clone(), 2);
    assert!(extracted.ty().is_scalar());
    let op = extracted.as_node::<Shuffle>().expect("expected Shuffle");
    assert!(op.is_extract_element());
}

#[test]
fn degenerate_shuffles_return_their_input() {
    let a = Ramp::make(int32(0), int32(1), 4);
    assert!(Shuffle::make_interleave(vec![a.clone()]).same_as(&a));
    assert!(Shuffle::make_concat(vec![a.clone()]).same_as(&a));
    assert!(Shuffle::make_slice(a.clone(), 0, 1, 4).same_as(&a));
}

#[test]
#[should_panic(expected = "out of range")]
fn shuffle_rejects_out_of_range_indices() {
    let a = Ramp::make(int32(0), int32(1), 4);
    Shuffle::make(vec![a], vec![4]);
}

#[test]
#[should_panic(expected = "mismatched element types")]
fn shuffle_rejects_mixed_element_types() {
    let a = Ramp::make(int32(0), int32(1), 4);
    let b = Broadcast::make(FloatImm::make(Type::float(32), 0.0), 4);
    Shuffle::make(vec![a, b], vec![0]);
}

#[test]
fn constant_allocation_size_multiplies_extents() {
    let extents = vec![int32(1024), int32(64), int32(3)];
    assert_eq!(
        Allocate::constant_allocation_size_of(&extents, "scratch"),
        1024 * 64 * 3
    );

    let x = Variable::make(Type::int(32), "x");
    let symbolic = vec![int32(1024), x.into()];
    assert_eq!(
        Allocate::constant_allocation_size_of(&symbolic, "scratch"),
        0
    );
}

#[test]
#[should_panic(expected = "exceeds 2^31 - 1")]
fn constant_allocation_size_overflow_is_a_user_error() {
    let extents = vec![int32(1 << 16), int32(1 << 16)];
    Allocate::constant_allocation_size_of(&extents, "scratch");
}

#[test]
#[should_panic(expected = "AssertStmt message must be an int")]
fn assert_stmt_message_must_be_int32() {
    let cond = EQ::make(int32(1), int32(1));
    AssertStmt::make(cond, IntImm::make(Type::int(64), 1));
}

#[test]
fn deep_graphs_tear_down_iteratively() {
    // Deep enough that a recursive drop would blow the stack.
    let mut e = int32(0);
    for _ in 0..200_000 {
        e = Add::make(e, int32(1));
    }
    drop(e);

    let mut s = no_op();
    for _ in 0..100_000 {
        s = Block::make(no_op(), s);
    }
    drop(s);
}

#[test]
fn const_value_helpers_see_through_broadcasts() {
    use crate::helpers::{is_const_value, is_zero};

    assert!(is_const_value(&int32(3), 3));
    assert!(!is_const_value(&int32(3), 4));
    assert!(is_const_value(&UIntImm::make(Type::uint(8), 200), 200));
    assert!(is_const_value(&FloatImm::make(Type::float(32), 2.0), 2));
    assert!(!is_const_value(&FloatImm::make(Type::float(32), 2.5), 2));
    assert!(is_one(&Broadcast::make(int32(1), 4)));
    assert!(is_zero(&Broadcast::make(
        FloatImm::make(Type::float(64), 0.0),
        8
    )));

    let x: Expr = Variable::make(Type::int(32), "x").into();
    assert!(!is_const_value(&x, 0));
}

#[test]
fn literal_conversions_pick_the_matching_type() {
    assert_eq!(Expr::from(1i32).ty(), Type::int(32));
    assert_eq!(Expr::from(1i64).ty(), Type::int(64));
    assert_eq!(Expr::from(1u8).ty(), Type::uint(8));
    assert_eq!(Expr::from(1.5f32).ty(), Type::float(32));
    assert_eq!(Expr::from("interleaved").ty(), Type::handle());
}
