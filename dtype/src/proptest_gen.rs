//! Proptest generators for [`Type`], behind the `proptest` feature.

use proptest::prelude::*;

use crate::{Type, TypeCode};

impl Type {
    /// Any valid scalar type.
    pub fn scalar_generator() -> impl Strategy<Value = Self> {
        prop_oneof![
            prop_oneof![Just(8u8), Just(16), Just(32), Just(64)]
                .prop_map(Type::int),
            prop_oneof![Just(1u8), Just(8), Just(16), Just(32), Just(64)]
                .prop_map(Type::uint),
            prop_oneof![Just(16u8), Just(32), Just(64)].prop_map(Type::float),
            Just(Type::handle()),
        ]
    }

    /// Any valid type, scalar or vector (lane counts up to 16).
    pub fn generator() -> impl Strategy<Value = Self> {
        (Self::scalar_generator(), 1u16..=16)
            .prop_map(|(t, lanes)| t.with_lanes(lanes))
    }
}

impl TypeCode {
    pub fn generator() -> impl Strategy<Value = Self> {
        any::<TypeCode>()
    }
}
