//! Fixed-length numeric vectors
//!
//! Vectors are immutable value types backed by shared storage. Every
//! producing operation allocates a new result; no lane of an existing vector
//! is ever modified, so clones are cheap and safe to share across threads.
//!
//! Binary lane-wise operations require operands of identical length.
//! A mismatch is a contract violation of the calling program and panics;
//! it is never reported as a recoverable error.

use std::fmt;
use std::sync::Arc;

use num_traits::Float;

/// Fixed-length homogeneous vector
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T> {
    lanes: Arc<[T]>,
}

impl<T: Copy> Vector<T> {
    /// Create a vector owning the given lanes
    pub fn new(lanes: Vec<T>) -> Self {
        Vector {
            lanes: lanes.into(),
        }
    }

    /// Create a vector by copying a slice
    pub fn from_slice(lanes: &[T]) -> Self {
        Vector {
            lanes: Arc::from(lanes),
        }
    }

    /// Number of lanes
    #[inline]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Lane `index`; panics when out of range
    #[inline]
    pub fn get_value(&self, index: usize) -> T {
        self.lanes[index]
    }

    /// All lanes in order
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.lanes
    }

    /// Copy of this vector with lane `index` replaced by `value`
    ///
    /// The receiver is left untouched. Panics when `index` is out of range.
    pub fn insert(&self, value: T, index: usize) -> Self {
        let mut copy = self.lanes.to_vec();
        copy[index] = value;
        Vector::new(copy)
    }

    /// Apply `f` to every lane independently
    pub fn apply<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Vector::new(self.lanes.iter().map(|&x| f(x)).collect())
    }

    /// Lane-wise comparison producing a boolean vector
    pub fn compare<F>(&self, other: &Self, predicate: F) -> Vector<bool>
    where
        F: Fn(T, T) -> bool,
    {
        assert_lengths_match(self.len(), other.len());
        Vector::new(
            self.lanes
                .iter()
                .zip(other.lanes.iter())
                .map(|(&a, &b)| predicate(a, b))
                .collect(),
        )
    }

    /// Lane-wise binary operation
    pub fn zip_with<F>(&self, other: &Self, op: F) -> Self
    where
        F: Fn(T, T) -> T,
    {
        assert_lengths_match(self.len(), other.len());
        Vector::new(
            self.lanes
                .iter()
                .zip(other.lanes.iter())
                .map(|(&a, &b)| op(a, b))
                .collect(),
        )
    }
}

impl<T: Float> Vector<T> {
    pub fn add(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }

    pub fn mul(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a * b)
    }

    pub fn div(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a / b)
    }

    /// Truncating floating remainder per lane
    pub fn rem(&self, rhs: &Self) -> Self {
        self.zip_with(rhs, |a, b| a % b)
    }
}

#[inline]
#[track_caller]
fn assert_lengths_match(lhs: usize, rhs: usize) {
    assert_eq!(
        lhs, rhs,
        "vector operands must have identical length ({} vs {})",
        lhs, rhs
    );
}

impl<T: Copy> From<Vec<T>> for Vector<T> {
    fn from(lanes: Vec<T>) -> Self {
        Vector::new(lanes)
    }
}

impl<T: Copy + fmt::Display> fmt::Display for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<")?;
        for (i, v) in self.lanes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, ">")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_wise_arithmetic() {
        let a = Vector::new(vec![1.0f32, 2.0, 3.0, 4.0]);
        let b = Vector::new(vec![0.5f32, 0.25, 2.0, 3.0]);
        assert_eq!(a.add(&b).values(), &[1.5, 2.25, 5.0, 7.0]);
        assert_eq!(a.sub(&b).values(), &[0.5, 1.75, 1.0, 1.0]);
        assert_eq!(a.mul(&b).values(), &[0.5, 0.5, 6.0, 12.0]);
        assert_eq!(a.div(&b).values(), &[2.0, 8.0, 1.5, 4.0 / 3.0]);
        assert_eq!(a.rem(&b).values(), &[0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_rem_keeps_dividend_sign() {
        let a = Vector::new(vec![-7.5f64, 7.5]);
        let b = Vector::new(vec![2.0f64, -2.0]);
        assert_eq!(a.rem(&b).values(), &[-1.5, 1.5]);
    }

    #[test]
    fn test_insert_is_copy_on_write() {
        let original = Vector::new(vec![1.0f64, 2.0, 3.0]);
        let updated = original.insert(9.0, 1);
        assert_eq!(updated.values(), &[1.0, 9.0, 3.0]);
        assert_eq!(original.values(), &[1.0, 2.0, 3.0]);
        assert_eq!(updated.len(), original.len());
    }

    #[test]
    fn test_apply_and_compare() {
        let v = Vector::new(vec![1.5f32, -2.5, 0.0]);
        assert_eq!(v.apply(|x| x.floor()).values(), &[1.0, -3.0, 0.0]);
        let w = Vector::new(vec![1.0f32, -2.5, 1.0]);
        let mask = v.compare(&w, |a, b| a > b);
        assert_eq!(mask.values(), &[true, false, false]);
        assert!(mask.get_value(0));
    }

    #[test]
    #[should_panic(expected = "identical length")]
    fn test_length_mismatch_panics() {
        let a = Vector::new(vec![1.0f64, 2.0]);
        let b = Vector::new(vec![1.0f64, 2.0, 3.0]);
        let _ = a.add(&b);
    }

    #[test]
    #[should_panic]
    fn test_insert_out_of_range_panics() {
        let v = Vector::new(vec![1.0f32]);
        let _ = v.insert(2.0, 1);
    }

    #[test]
    fn test_display() {
        let v = Vector::new(vec![true, false]);
        assert_eq!(format!("{}", v), "<true, false>");
    }
}
