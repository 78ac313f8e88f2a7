//! Dense linear-algebra kernels
//!
//! Kernels work on plain column-major [`Buffer`]s and know nothing about
//! variants or copy-on-write; the matrix types convert to and from buffers at
//! the boundary. Everything is generic over [`Field`], implemented for reals
//! and complex numbers.

pub mod eigen;
pub mod lu;
pub mod qr;
pub mod svd;
pub mod transform;

use num_traits::{One, Zero};
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::scalar::{Complex, Real};

/// Machine epsilon used for singularity and convergence thresholds
pub const EPSILON: Real = f64::EPSILON;

/// Sweep limit for the Jacobi SVD
pub const MAX_SVD_SWEEPS: usize = 80;

/// QR iterations allowed per eigenvalue before the Schur kernel gives up
pub const MAX_SCHUR_ITERATIONS: usize = 100;

/// Coefficient field the kernels are generic over
pub trait Field:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + 'static
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + AddAssign
    + SubAssign
    + MulAssign
    + DivAssign
{
    fn conjugate(self) -> Self;
    fn modulus(self) -> Real;
    fn modulus_sqr(self) -> Real;
    fn from_real(value: Real) -> Self;
    fn real_part(self) -> Real;
    fn imag_part(self) -> Real;
    fn square_root(self) -> Self;
    fn finite(self) -> bool;
    fn to_complex(self) -> Complex;

    fn scaled(self, factor: Real) -> Self {
        self * Self::from_real(factor)
    }

    /// `self / |self|`, or one for zero
    fn phase(self) -> Self {
        let modulus = self.modulus();
        if modulus == 0.0 {
            Self::one()
        } else {
            self.scaled(1.0 / modulus)
        }
    }
}

impl Field for Real {
    fn conjugate(self) -> Self {
        self
    }

    fn modulus(self) -> Real {
        self.abs()
    }

    fn modulus_sqr(self) -> Real {
        self * self
    }

    fn from_real(value: Real) -> Self {
        value
    }

    fn real_part(self) -> Real {
        self
    }

    fn imag_part(self) -> Real {
        0.0
    }

    fn square_root(self) -> Self {
        f64::sqrt(self)
    }

    fn finite(self) -> bool {
        self.is_finite()
    }

    fn to_complex(self) -> Complex {
        Complex::new(self, 0.0)
    }
}

impl Field for Complex {
    fn conjugate(self) -> Self {
        Complex::new(self.re, -self.im)
    }

    fn modulus(self) -> Real {
        self.re.hypot(self.im)
    }

    fn modulus_sqr(self) -> Real {
        self.re * self.re + self.im * self.im
    }

    fn from_real(value: Real) -> Self {
        Complex::new(value, 0.0)
    }

    fn real_part(self) -> Real {
        self.re
    }

    fn imag_part(self) -> Real {
        self.im
    }

    fn square_root(self) -> Self {
        Complex::sqrt(self)
    }

    fn finite(self) -> bool {
        self.re.is_finite() && self.im.is_finite()
    }

    fn to_complex(self) -> Complex {
        self
    }
}

/// Column-major dense buffer exchanged with the kernels
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer<T> {
    pub rows: usize,
    pub columns: usize,
    pub data: Vec<T>,
}

impl<T: Field> Buffer<T> {
    pub fn new(rows: usize, columns: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), rows * columns);
        Self {
            rows,
            columns,
            data,
        }
    }

    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self::new(rows, columns, vec![T::zero(); rows * columns])
    }

    pub fn identity(size: usize) -> Self {
        let mut buffer = Self::zeros(size, size);
        for i in 0..size {
            buffer.set(i, i, T::one());
        }
        buffer
    }

    /// Zero-sized result used by kernels to report failure
    pub fn empty() -> Self {
        Self::zeros(0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.columns
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> T {
        self.data[row + column * self.rows]
    }

    #[inline]
    pub fn set(&mut self, row: usize, column: usize, value: T) {
        self.data[row + column * self.rows] = value;
    }

    #[inline]
    pub fn at_mut(&mut self, row: usize, column: usize) -> &mut T {
        &mut self.data[row + column * self.rows]
    }

    pub fn column(&self, column: usize) -> &[T] {
        &self.data[column * self.rows..(column + 1) * self.rows]
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for column in 0..self.columns {
            self.data.swap(a + column * self.rows, b + column * self.rows);
        }
    }

    pub fn swap_columns(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for row in 0..self.rows {
            self.data.swap(row + a * self.rows, row + b * self.rows);
        }
    }

    /// Conjugate transpose
    pub fn adjoint(&self) -> Self {
        let mut result = Self::zeros(self.columns, self.rows);
        for column in 0..self.columns {
            for row in 0..self.rows {
                result.set(column, row, self.get(row, column).conjugate());
            }
        }
        result
    }

    pub fn multiply(&self, other: &Self) -> Self {
        debug_assert_eq!(self.columns, other.rows);
        let mut result = Self::zeros(self.rows, other.columns);
        for column in 0..other.columns {
            for k in 0..self.columns {
                let factor = other.get(k, column);
                if factor == T::zero() {
                    continue;
                }
                for row in 0..self.rows {
                    *result.at_mut(row, column) += self.get(row, k) * factor;
                }
            }
        }
        result
    }

    pub fn max_modulus(&self) -> Real {
        self.data
            .iter()
            .fold(0.0, |acc: Real, value| acc.max(value.modulus()))
    }

    pub fn all_finite(&self) -> bool {
        self.data.iter().all(|value| value.finite())
    }

    pub fn map<U: Field>(&self, f: impl Fn(T) -> U) -> Buffer<U> {
        Buffer::new(self.rows, self.columns, self.data.iter().map(|&v| f(v)).collect())
    }
}

/// Euclidean norm of a slice
pub fn vector_norm<T: Field>(values: &[T]) -> Real {
    values
        .iter()
        .map(|value| value.modulus_sqr())
        .sum::<Real>()
        .sqrt()
}

/// Householder reflector `I - 2 v v^H / (v^H v)` mapping `x` onto a multiple
/// of the first unit vector. Returns `None` when `x` is already zero.
pub(crate) fn householder_vector<T: Field>(x: &[T]) -> Option<(Vec<T>, Real)> {
    let norm = vector_norm(x);
    if norm == 0.0 {
        return None;
    }
    let mut v = x.to_vec();
    v[0] += x[0].phase().scaled(norm);
    let v_norm_sqr = v.iter().map(|value| value.modulus_sqr()).sum::<Real>();
    if v_norm_sqr == 0.0 {
        return None;
    }
    Some((v, v_norm_sqr))
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn multiply_and_adjoint() {
        let a = complex(2, 2, &[(1.0, 1.0), (2.0, 0.0), (0.0, -1.0), (3.0, 0.0)]);
        let adjoint = a.adjoint();
        assert_eq!(adjoint.get(0, 1), Complex::new(0.0, 1.0));
        assert_eq!(adjoint.get(1, 0), Complex::new(2.0, 0.0));

        let identity = Buffer::<Complex>::identity(2);
        assert_eq!(a.multiply(&identity), a);
    }

    #[test]
    fn householder_annihilates_tail() {
        let x = [3.0, 4.0];
        let (v, v_norm_sqr) = householder_vector(&x).unwrap();
        let dot: Real = v.iter().zip(&x).map(|(v, x)| v * x).sum();
        let reflected: Vec<Real> = x
            .iter()
            .zip(&v)
            .map(|(x, v)| x - 2.0 * dot / v_norm_sqr * v)
            .collect();
        assert!((reflected[0].abs() - 5.0).abs() < 1e-12);
        assert!(reflected[1].abs() < 1e-12);
    }

    #[test]
    fn complex_field_ops() {
        let z = Complex::new(3.0, 4.0);
        assert_eq!(z.modulus(), 5.0);
        assert_eq!(z.conjugate(), Complex::new(3.0, -4.0));
        assert!((z.phase() - Complex::new(0.6, 0.8)).modulus() < 1e-15);
    }
}
