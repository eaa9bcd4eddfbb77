//! Type descriptors for the mirage IR.
//!
//! A [`Type`] is an immutable 32-bit-sized value describing a scalar or
//! vector numeric type: a [`TypeCode`], a bit width, and a lane count.
//! `lanes == 1` means scalar. Booleans are `uint1`; there is deliberately no
//! separate boolean code, so vector predicates are just `uint1xN`.

use mirage_base::internal_assert;

pub mod fp16;

#[cfg(feature = "proptest")]
pub mod proptest_gen;

#[cfg(test)]
mod test;

/// The fundamental scalar category of a [`Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(strum::EnumCount, strum::EnumIter, strum::VariantArray)]
#[cfg_attr(feature = "proptest", derive(proptest_derive::Arbitrary))]
#[repr(u8)]
pub enum TypeCode {
    /// Signed integers.
    Int = 0,
    /// Unsigned integers. 1-bit unsigned is the boolean type.
    UInt = 1,
    /// IEEE floating point, 16/32/64-bit.
    Float = 2,
    /// Opaque pointer-sized handle.
    Handle = 3,
}

/// A scalar or vector numeric type: code, bit width, lane count.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Type {
    code: TypeCode,
    bits: u8,
    lanes: u16,
}

impl Type {
    /// Build a type, validating the code/bits/lanes contract.
    pub fn new(code: TypeCode, bits: u8, lanes: u16) -> Self {
        internal_assert!(lanes >= 1, "Type with zero lanes");
        internal_assert!(
            matches!(bits, 1 | 8 | 16 | 32 | 64),
            "Type with invalid bit width {bits}"
        );
        internal_assert!(
            bits != 1 || code == TypeCode::UInt,
            "1-bit types must be unsigned (boolean)"
        );
        internal_assert!(
            code != TypeCode::Float || matches!(bits, 16 | 32 | 64),
            "Float types must be 16, 32, or 64-bit, not {bits}"
        );
        internal_assert!(
            code != TypeCode::Handle || bits == 64,
            "Handle types are 64-bit"
        );
        Self { code, bits, lanes }
    }

    /// Scalar signed integer of the given width.
    pub fn int(bits: u8) -> Self {
        Self::new(TypeCode::Int, bits, 1)
    }

    /// Scalar unsigned integer of the given width.
    pub fn uint(bits: u8) -> Self {
        Self::new(TypeCode::UInt, bits, 1)
    }

    /// Scalar float of the given width.
    pub fn float(bits: u8) -> Self {
        Self::new(TypeCode::Float, bits, 1)
    }

    /// Scalar opaque handle.
    pub fn handle() -> Self {
        Self::new(TypeCode::Handle, 64, 1)
    }

    /// The boolean type, `uint1`.
    pub fn boolean() -> Self {
        Self::new(TypeCode::UInt, 1, 1)
    }

    pub const fn code(&self) -> TypeCode {
        self.code
    }

    pub const fn bits(&self) -> u8 {
        self.bits
    }

    pub const fn lanes(&self) -> u16 {
        self.lanes
    }

    /// Same code and bits, different lane count.
    pub fn with_lanes(&self, lanes: u16) -> Self {
        Self::new(self.code, self.bits, lanes)
    }

    /// Same code and lanes, different bit width.
    pub fn with_bits(&self, bits: u8) -> Self {
        Self::new(self.code, bits, self.lanes)
    }

    /// The scalar element type of a vector (identity on scalars).
    pub fn element_of(&self) -> Self {
        self.with_lanes(1)
    }

    pub const fn is_scalar(&self) -> bool {
        self.lanes == 1
    }

    pub const fn is_vector(&self) -> bool {
        self.lanes != 1
    }

    pub const fn is_bool(&self) -> bool {
        matches!(self.code, TypeCode::UInt) && self.bits == 1
    }

    pub const fn is_int(&self) -> bool {
        matches!(self.code, TypeCode::Int)
    }

    pub const fn is_uint(&self) -> bool {
        matches!(self.code, TypeCode::UInt)
    }

    pub const fn is_float(&self) -> bool {
        matches!(self.code, TypeCode::Float)
    }

    pub const fn is_handle(&self) -> bool {
        matches!(self.code, TypeCode::Handle)
    }

    /// Size in bytes of a single element.
    pub const fn bytes(&self) -> usize {
        (self.bits as usize + 7) / 8
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            TypeCode::Int => write!(f, "int")?,
            TypeCode::UInt => write!(f, "uint")?,
            TypeCode::Float => write!(f, "float")?,
            TypeCode::Handle => write!(f, "handle")?,
        }
        write!(f, "{}", self.bits)?;
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
