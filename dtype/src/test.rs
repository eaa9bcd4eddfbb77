use test_case::test_case;

use crate::{fp16, Type, TypeCode};

#[test]
fn every_code_admits_some_scalar() {
    use strum::IntoEnumIterator;
    for code in TypeCode::iter() {
        let bits = match code {
            TypeCode::Handle => 64,
            _ => 32,
        };
        let t = Type::new(code, bits, 1);
        assert!(t.is_scalar());
        assert_eq!(t.code(), code);
    }
}

#[test]
fn accessors_round_trip() {
    let t = Type::new(TypeCode::Int, 32, 4);
    assert_eq!(t.code(), TypeCode::Int);
    assert_eq!(t.bits(), 32);
    assert_eq!(t.lanes(), 4);
    assert_eq!(t.bytes(), 4);
}

#[test]
fn boolean_is_uint1() {
    let b = Type::boolean();
    assert!(b.is_bool());
    assert!(b.is_uint());
    assert!(b.is_scalar());
    assert_eq!(b.bits(), 1);
    // Vector predicates keep the boolean property.
    assert!(b.with_lanes(8).is_bool());
}

#[test]
fn with_lanes_preserves_element() {
    let t = Type::float(32).with_lanes(8);
    assert!(t.is_vector());
    assert_eq!(t.element_of(), Type::float(32));
}

#[test_case(Type::int(32), "int32")]
#[test_case(Type::uint(1), "uint1")]
#[test_case(Type::float(32).with_lanes(8), "float32x8")]
#[test_case(Type::handle(), "handle64")]
#[test_case(Type::int(8).with_lanes(16), "int8x16")]
fn display_forms(t: Type, expected: &str) {
    assert_eq!(t.to_string(), expected);
}

#[test]
#[should_panic(expected = "1-bit types must be unsigned")]
fn one_bit_int_is_rejected() {
    Type::new(TypeCode::Int, 1, 1);
}

#[test]
#[should_panic(expected = "Float types must be 16, 32, or 64-bit")]
fn eight_bit_float_is_rejected() {
    Type::new(TypeCode::Float, 8, 1);
}

#[test]
#[should_panic(expected = "Type with zero lanes")]
fn zero_lanes_is_rejected() {
    Type::new(TypeCode::Int, 32, 0);
}

#[test]
#[should_panic(expected = "invalid bit width")]
fn odd_bit_width_is_rejected() {
    Type::new(TypeCode::Int, 24, 1);
}

#[test]
fn fp16_exact_values_survive() {
    let exact = [
        0.0,
        1.0,
        -2.5,
        65504.0,                  // max finite half
        f64::powi(2.0, -14),      // min normal half
        f64::powi(2.0, -24),      // min subnormal half
        1023.0 * f64::powi(2.0, -24), // max subnormal half
    ];
    for v in exact {
        assert_eq!(fp16::round_trip(v), v, "{v} must survive the round trip");
    }
}

#[test]
fn fp16_rounds_to_nearest() {
    // 1 + 2^-11 is exactly between 1.0 and the next half (1 + 2^-10);
    // ties-to-even picks 1.0.
    assert_eq!(fp16::round_trip(1.0 + f64::powi(2.0, -11)), 1.0);
    // Anything past the midpoint rounds up.
    let up = fp16::round_trip(1.0 + 1.5 * f64::powi(2.0, -11));
    assert_eq!(up, 1.0 + f64::powi(2.0, -10));
}

#[test]
fn fp16_overflow_and_specials() {
    assert_eq!(fp16::round_trip(1.0e6), f64::INFINITY);
    assert_eq!(fp16::round_trip(-1.0e6), f64::NEG_INFINITY);
    assert_eq!(fp16::round_trip(f64::INFINITY), f64::INFINITY);
    assert!(fp16::round_trip(f64::NAN).is_nan());
    assert_eq!(fp16::round_trip(1.0e-12), 0.0);
}

mod props {
    use proptest::prelude::*;

    use crate::{fp16, Type};

    proptest! {
        #[test]
        fn fp16_round_trip_is_idempotent(v in -1.0e5f64..1.0e5) {
            let once = fp16::round_trip(v);
            prop_assert_eq!(fp16::round_trip(once), once);
        }

        #[test]
        fn lane_rewrites_commute(bits in prop_oneof![Just(8u8), Just(16), Just(32), Just(64)],
                                 lanes in 1u16..=32) {
            let t = Type::int(bits).with_lanes(lanes);
            prop_assert_eq!(t.element_of().with_lanes(lanes), t);
            prop_assert_eq!(t.bits(), bits);
        }
    }
}
