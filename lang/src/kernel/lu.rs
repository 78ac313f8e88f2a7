//! LU with partial pivoting, triangular solves and Cholesky

use tracing::debug;

use super::{Buffer, EPSILON, Field};

/// Packed LU factors of `P * A = L * U`
#[derive(Debug, Clone)]
pub struct LuFactors<T> {
    /// Unit-lower part below the diagonal, `U` on and above it
    pub packed: Buffer<T>,
    /// `permutation[i]` is the row of `A` that ended up in row `i`
    pub permutation: Vec<usize>,
    /// +1 or -1 depending on the parity of the row swaps
    pub sign: f64,
    pub singular: bool,
}

pub fn lu_decompose<T: Field>(a: &Buffer<T>) -> LuFactors<T> {
    let rows = a.rows;
    let columns = a.columns;
    let steps = rows.min(columns);
    let mut packed = a.clone();
    let mut permutation: Vec<usize> = (0..rows).collect();
    let mut sign = 1.0;
    let mut singular = false;

    let scale = a.max_modulus();
    let threshold = EPSILON * if scale > 0.0 { scale } else { 1.0 };

    for step in 0..steps {
        let mut pivot_row = step;
        let mut pivot_modulus = packed.get(step, step).modulus();
        for row in step + 1..rows {
            let candidate = packed.get(row, step).modulus();
            if candidate > pivot_modulus {
                pivot_row = row;
                pivot_modulus = candidate;
            }
        }
        if pivot_row != step {
            packed.swap_rows(pivot_row, step);
            permutation.swap(pivot_row, step);
            sign = -sign;
        }

        if pivot_modulus <= threshold {
            singular = true;
        }

        let pivot = packed.get(step, step);
        if pivot == T::zero() {
            continue;
        }

        for row in step + 1..rows {
            let multiplier = packed.get(row, step) / pivot;
            packed.set(row, step, multiplier);
        }
        for column in step + 1..columns {
            let top = packed.get(step, column);
            if top == T::zero() {
                continue;
            }
            for row in step + 1..rows {
                let multiplier = packed.get(row, step);
                *packed.at_mut(row, column) -= multiplier * top;
            }
        }
    }

    LuFactors {
        packed,
        permutation,
        sign,
        singular,
    }
}

impl<T: Field> LuFactors<T> {
    pub fn permutation_matrix(&self) -> Buffer<T> {
        let size = self.permutation.len();
        let mut p = Buffer::zeros(size, size);
        for (row, &source) in self.permutation.iter().enumerate() {
            p.set(row, source, T::one());
        }
        p
    }

    pub fn lower(&self) -> Buffer<T> {
        let rows = self.packed.rows;
        let steps = rows.min(self.packed.columns);
        let mut l = Buffer::zeros(rows, steps);
        for column in 0..steps {
            l.set(column, column, T::one());
            for row in column + 1..rows {
                l.set(row, column, self.packed.get(row, column));
            }
        }
        l
    }

    pub fn upper(&self) -> Buffer<T> {
        let columns = self.packed.columns;
        let steps = self.packed.rows.min(columns);
        let mut u = Buffer::zeros(steps, columns);
        for column in 0..columns {
            for row in 0..steps.min(column + 1) {
                u.set(row, column, self.packed.get(row, column));
            }
        }
        u
    }

    pub fn determinant(&self) -> T {
        let size = self.packed.rows;
        let mut product = T::from_real(self.sign);
        for i in 0..size {
            product *= self.packed.get(i, i);
        }
        product
    }

    /// Solve `A X = Y` for square `A`; `None` when `A` is singular
    pub fn solve(&self, y: &Buffer<T>) -> Option<Buffer<T>> {
        let size = self.packed.rows;
        if self.singular || size != self.packed.columns || y.rows != size {
            return None;
        }

        let mut x = Buffer::zeros(size, y.columns);
        for column in 0..y.columns {
            for (row, &source) in self.permutation.iter().enumerate() {
                x.set(row, column, y.get(source, column));
            }
            // forward substitution with unit-lower L
            for row in 0..size {
                let mut sum = x.get(row, column);
                for k in 0..row {
                    sum -= self.packed.get(row, k) * x.get(k, column);
                }
                x.set(row, column, sum);
            }
            // back substitution with U
            for row in (0..size).rev() {
                let mut sum = x.get(row, column);
                for k in row + 1..size {
                    sum -= self.packed.get(row, k) * x.get(k, column);
                }
                x.set(row, column, sum / self.packed.get(row, row));
            }
        }
        Some(x)
    }
}

pub fn determinant<T: Field>(a: &Buffer<T>) -> T {
    lu_decompose(a).determinant()
}

/// Solve `A X = Y`; the empty buffer signals a singular or mismatched system
pub fn solve<T: Field>(a: &Buffer<T>, y: &Buffer<T>) -> Buffer<T> {
    match lu_decompose(a).solve(y) {
        Some(x) => x,
        None => {
            debug!(rows = a.rows, columns = a.columns, "solve on singular system");
            Buffer::empty()
        }
    }
}

pub fn inverse<T: Field>(a: &Buffer<T>) -> Option<Buffer<T>> {
    lu_decompose(a).solve(&Buffer::identity(a.rows))
}

/// Lower Cholesky factor `L` with `A = L L^H`; `None` when `A` is not
/// Hermitian positive definite
pub fn cholesky<T: Field>(a: &Buffer<T>, tolerance: f64) -> Option<Buffer<T>> {
    if !a.is_square() || !is_hermitian(a, tolerance) {
        return None;
    }
    let size = a.rows;
    let mut l = Buffer::<T>::zeros(size, size);
    for column in 0..size {
        let mut diagonal = a.get(column, column).real_part();
        for k in 0..column {
            diagonal -= l.get(column, k).modulus_sqr();
        }
        if diagonal <= 0.0 || !diagonal.is_finite() {
            debug!(column, "cholesky: matrix is not positive definite");
            return None;
        }
        let pivot = diagonal.sqrt();
        l.set(column, column, T::from_real(pivot));
        for row in column + 1..size {
            let mut sum = a.get(row, column);
            for k in 0..column {
                sum -= l.get(row, k) * l.get(column, k).conjugate();
            }
            l.set(row, column, sum.scaled(1.0 / pivot));
        }
    }
    Some(l)
}

/// Entry-wise comparison of `a[i][j]` against `transform(a[j][i])` relative to
/// the largest coefficient
pub fn is_transposed_match<T: Field>(
    a: &Buffer<T>,
    tolerance: f64,
    transform: impl Fn(T) -> T,
) -> bool {
    if !a.is_square() {
        return false;
    }
    let scale = a.max_modulus();
    for column in 0..a.columns {
        for row in 0..=column {
            let difference = (a.get(row, column) - transform(a.get(column, row))).modulus();
            if difference > tolerance * scale {
                return false;
            }
        }
    }
    true
}

pub fn is_hermitian<T: Field>(a: &Buffer<T>, tolerance: f64) -> bool {
    is_transposed_match(a, tolerance, |value| value.conjugate())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::scalar::Complex;

    #[test]
    fn plu_reconstructs() {
        let a = real(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0]);
        let lu = lu_decompose(&a);
        assert!(!lu.singular);

        let pa = lu.permutation_matrix().multiply(&a);
        let l_u = lu.lower().multiply(&lu.upper());
        assert_close(&pa, &l_u, 1e-12);
    }

    #[test]
    fn rectangular_plu_reconstructs() {
        let a = real(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let lu = lu_decompose(&a);
        let pa = lu.permutation_matrix().multiply(&a);
        let l_u = lu.lower().multiply(&lu.upper());
        assert_eq!((lu.lower().rows, lu.lower().columns), (3, 2));
        assert_eq!((lu.upper().rows, lu.upper().columns), (2, 2));
        assert_close(&pa, &l_u, 1e-12);
    }

    #[test]
    fn singular_matrix_is_flagged() {
        let a = real(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let lu = lu_decompose(&a);
        assert!(lu.singular);
        assert!(solve(&a, &real(2, 1, &[1.0, 1.0])).is_empty());
        assert!(inverse(&a).is_none());
    }

    #[test]
    fn determinant_tracks_swaps() {
        let a = real(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        assert!((determinant(&a) + 1.0).abs() < 1e-15);

        let b = real(3, 3, &[2.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0, 0.0, 4.0]);
        assert!((determinant(&b) - 24.0).abs() < 1e-12);
    }

    #[test]
    fn solve_round_trip() {
        let a = real(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let x = real(2, 1, &[1.0, 1.0]);
        let y = a.multiply(&x);
        assert_close(&solve(&a, &y), &x, 1e-10);
    }

    #[test]
    fn complex_inverse() {
        let a = complex(2, 2, &[(1.0, 1.0), (2.0, 0.0), (0.0, 0.0), (1.0, -1.0)]);
        let inverse = inverse(&a).unwrap();
        assert_close(&a.multiply(&inverse), &Buffer::identity(2), 1e-12);
    }

    #[test]
    fn cholesky_factors_positive_definite() {
        let a = real(3, 3, &[4.0, 12.0, -16.0, 12.0, 37.0, -43.0, -16.0, -43.0, 98.0]);
        let l = cholesky(&a, 1e-8).unwrap();
        let expected = real(3, 3, &[2.0, 0.0, 0.0, 6.0, 1.0, 0.0, -8.0, 5.0, 3.0]);
        assert_close(&l, &expected, 1e-12);
    }

    #[test]
    fn cholesky_complex_hermitian() {
        let a = complex(2, 2, &[(4.0, 0.0), (2.0, 2.0), (2.0, -2.0), (6.0, 0.0)]);
        let l = cholesky(&a, 1e-8).unwrap();
        assert_close(&l.multiply(&l.adjoint()), &a, 1e-12);
        assert_eq!(l.get(0, 1), Complex::new(0.0, 0.0));
    }

    #[test]
    fn cholesky_rejects_indefinite_and_asymmetric() {
        assert!(cholesky(&real(2, 2, &[1.0, 2.0, 2.0, 1.0]), 1e-8).is_none());
        assert!(cholesky(&real(2, 2, &[2.0, 1.0, 0.0, 2.0]), 1e-8).is_none());
    }
}
