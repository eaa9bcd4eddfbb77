//! Vector-shaped expressions: ramps, broadcasts and shuffles.

use mirage_base::internal_assert;

use crate::expr::Expr;
use crate::nodes::ExprKind;

/// A linear vector: element i is `base + i * stride`. A dense vector load
/// from a buffer is a load whose index is a ramp with stride 1.
pub struct Ramp {
    pub base: Expr,
    pub stride: Expr,
    pub lanes: u16,
}

impl Ramp {
    pub fn make(base: Expr, stride: Expr, lanes: u16) -> Expr {
        internal_assert!(base.ty().is_scalar(), "Ramp with vector base");
        internal_assert!(stride.ty().is_scalar(), "Ramp with vector stride");
        internal_assert!(lanes > 1, "Ramp of lanes <= 1");
        internal_assert!(
            stride.ty() == base.ty(),
            "Ramp of mismatched types: {} vs {}",
            base.ty(),
            stride.ty()
        );
        let ty = base.ty().with_lanes(lanes);
        Expr::new(ty, ExprKind::Ramp(Ramp { base, stride, lanes }))
    }
}

/// A vector whose every lane is `value`; a ramp with stride zero.
pub struct Broadcast {
    pub value: Expr,
    pub lanes: u16,
}

impl Broadcast {
    pub fn make(value: Expr, lanes: u16) -> Expr {
        internal_assert!(value.ty().is_scalar(), "Broadcast of vector");
        internal_assert!(lanes != 1, "Broadcast of lanes 1");
        let ty = value.ty().with_lanes(lanes);
        Expr::new(ty, ExprKind::Broadcast(Broadcast { value, lanes }))
    }
}

/// Rearrange lanes of one or more vectors. Lane i of the result is lane
/// `indices[i]` of the concatenation of the inputs. Interleaves, concats,
/// slices and single-element extracts are all just index patterns.
pub struct Shuffle {
    pub vectors: Vec<Expr>,
    pub indices: Vec<i32>,
}

impl Shuffle {
    pub fn make(vectors: Vec<Expr>, indices: Vec<i32>) -> Expr {
        internal_assert!(!vectors.is_empty(), "Shuffle of zero vectors");
        internal_assert!(!indices.is_empty(), "Shuffle with no indices");
        let element_ty = vectors[0].ty().element_of();
        let mut input_lanes: i32 = 0;
        for vector in &vectors {
            internal_assert!(
                vector.ty().element_of() == element_ty,
                "Shuffle of vectors of mismatched element types: {} vs {}",
                element_ty,
                vector.ty().element_of()
            );
            input_lanes += i32::from(vector.ty().lanes());
        }
        for &index in &indices {
            internal_assert!(
                (0..input_lanes).contains(&index),
                "Shuffle vector index {index} out of range [0, {input_lanes})"
            );
        }
        let ty = element_ty.with_lanes(indices.len() as u16);
        Expr::new(ty, ExprKind::Shuffle(Shuffle { vectors, indices }))
    }

    /// Interleave the lanes of equally-sized vectors:
    /// `a0 b0 a1 b1 ...`. A single input is returned unchanged.
    pub fn make_interleave(vectors: Vec<Expr>) -> Expr {
        internal_assert!(!vectors.is_empty(), "Interleave of zero vectors");
        if vectors.len() == 1 {
            return vectors.into_iter().next().expect("len checked");
        }
        let lanes = vectors[0].ty().lanes();
        for vector in &vectors {
            internal_assert!(
                vector.ty().lanes() == lanes,
                "Interleave of vectors with mismatched lane counts"
            );
        }
        let count = vectors.len() as i32;
        let mut indices = Vec::with_capacity(vectors.len() * lanes as usize);
        for lane in 0..i32::from(lanes) {
            for vector in 0..count {
                indices.push(vector * i32::from(lanes) + lane);
            }
        }
        Self::make(vectors, indices)
    }

    /// Concatenate vectors end to end. A single input is returned unchanged.
    pub fn make_concat(vectors: Vec<Expr>) -> Expr {
        internal_assert!(!vectors.is_empty(), "Concat of zero vectors");
        if vectors.len() == 1 {
            return vectors.into_iter().next().expect("len checked");
        }
        let total: i32 =
            vectors.iter().map(|v| i32::from(v.ty().lanes())).sum();
        Self::make(vectors, (0..total).collect())
    }

    /// Take `size` lanes starting at `begin` with the given stride. The
    /// full-range identity slice returns the input unchanged.
    pub fn make_slice(vector: Expr, begin: i32, stride: i32, size: i32) -> Expr {
        internal_assert!(size > 0, "Slice of non-positive size");
        internal_assert!(stride > 0, "Slice of non-positive stride");
        if begin == 0
            && size == i32::from(vector.ty().lanes())
            && stride == 1
        {
            return vector;
        }
        let indices = (0..size).map(|i| begin + i * stride).collect();
        Self::make(vec![vector], indices)
    }

    /// Extract a single lane as a scalar.
    pub fn make_extract_element(vector: Expr, index: i32) -> Expr {
        Self::make_slice(vector, index, 1, 1)
    }

    /// Is this shuffle a complete transpose of equally-sized inputs?
    pub fn is_interleave(&self) -> bool {
        if self.vectors.len() < 2 {
            return false;
        }
        let lanes = self.vectors[0].ty().lanes();
        for vector in &self.vectors {
            if vector.ty().lanes() != lanes {
                return false;
            }
        }
        let count = self.vectors.len();
        if self.indices.len() != count * lanes as usize {
            return false;
        }
        for lane in 0..lanes as usize {
            for vector in 0..count {
                let expected = vector * lanes as usize + lane;
                if self.indices[lane * count + vector] != expected as i32 {
                    return false;
                }
            }
        }
        true
    }

    /// Is this shuffle a strictly ascending ramp covering every input lane?
    pub fn is_concat(&self) -> bool {
        let total: usize =
            self.vectors.iter().map(|v| v.ty().lanes() as usize).sum();
        self.indices.len() == total
            && self.indices.iter().enumerate().all(|(i, &idx)| idx == i as i32)
    }

    /// Is this shuffle an arithmetic ramp shorter than its input? The
    /// full-length stride-1 ramp is a concat, not a slice.
    pub fn is_slice(&self) -> bool {
        let total: usize =
            self.vectors.iter().map(|v| v.ty().lanes() as usize).sum();
        if self.indices.len() >= total {
            return false;
        }
        let stride = self.slice_stride();
        self.indices
            .iter()
            .enumerate()
            .all(|(i, &idx)| idx == self.indices[0] + i as i32 * stride)
    }

    /// First index of a slice.
    pub fn slice_begin(&self) -> i32 {
        self.indices[0]
    }

    /// Index spacing of a slice; 1 for single-index shuffles.
    pub fn slice_stride(&self) -> i32 {
        if self.indices.len() >= 2 {
            self.indices[1] - self.indices[0]
        } else {
            1
        }
    }

    /// Does this shuffle pick out exactly one lane?
    pub fn is_extract_element(&self) -> bool {
        self.indices.len() == 1
    }
}
