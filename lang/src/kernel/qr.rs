//! Householder QR and LQ factorizations and least squares

use tracing::debug;

use super::{Buffer, EPSILON, Field, householder_vector};

/// Apply `I - 2 v v^H / |v|^2` from the left to rows `offset..` of columns
/// `first_column..` of `target`
pub(crate) fn reflect_rows<T: Field>(
    target: &mut Buffer<T>,
    v: &[T],
    v_norm_sqr: f64,
    offset: usize,
    first_column: usize,
) {
    for column in first_column..target.columns {
        let mut dot = T::zero();
        for (i, vi) in v.iter().enumerate() {
            dot += vi.conjugate() * target.get(offset + i, column);
        }
        if dot == T::zero() {
            continue;
        }
        let factor = dot.scaled(2.0 / v_norm_sqr);
        for (i, vi) in v.iter().enumerate() {
            *target.at_mut(offset + i, column) -= factor * *vi;
        }
    }
}

/// Apply `I - 2 v v^H / |v|^2` from the right to columns `offset..` of all
/// rows of `target`
pub(crate) fn reflect_columns<T: Field>(
    target: &mut Buffer<T>,
    v: &[T],
    v_norm_sqr: f64,
    offset: usize,
) {
    for row in 0..target.rows {
        let mut dot = T::zero();
        for (i, vi) in v.iter().enumerate() {
            dot += target.get(row, offset + i) * *vi;
        }
        if dot == T::zero() {
            continue;
        }
        let factor = dot.scaled(2.0 / v_norm_sqr);
        for (i, vi) in v.iter().enumerate() {
            *target.at_mut(row, offset + i) -= factor * vi.conjugate();
        }
    }
}

#[derive(Debug, Clone)]
pub struct QrFactors<T> {
    /// Unitary, rows x rows
    pub q: Buffer<T>,
    /// Upper trapezoidal, rows x columns
    pub r: Buffer<T>,
    pub ok: bool,
}

#[derive(Debug, Clone)]
pub struct LqFactors<T> {
    /// Lower trapezoidal, rows x columns
    pub l: Buffer<T>,
    /// Unitary, columns x columns
    pub q: Buffer<T>,
    pub ok: bool,
}

/// `A = Q R`
pub fn qr<T: Field>(a: &Buffer<T>) -> QrFactors<T> {
    let rows = a.rows;
    let mut r = a.clone();
    let mut q = Buffer::identity(rows);

    for step in 0..rows.min(a.columns) {
        let x: Vec<T> = (step..rows).map(|row| r.get(row, step)).collect();
        let Some((v, v_norm_sqr)) = householder_vector(&x) else {
            continue;
        };
        reflect_rows(&mut r, &v, v_norm_sqr, step, step);
        reflect_columns(&mut q, &v, v_norm_sqr, step);
        for row in step + 1..rows {
            r.set(row, step, T::zero());
        }
    }

    let ok = r.all_finite() && q.all_finite();
    QrFactors { q, r, ok }
}

/// `A = L Q`, computed from the QR factorization of `A^H`
pub fn lq<T: Field>(a: &Buffer<T>) -> LqFactors<T> {
    let QrFactors { q, r, ok } = qr(&a.adjoint());
    LqFactors {
        l: r.adjoint(),
        q: q.adjoint(),
        ok,
    }
}

fn rank_threshold<T: Field>(triangular: &Buffer<T>, size: usize) -> f64 {
    let largest = (0..size).fold(0.0f64, |acc, i| acc.max(triangular.get(i, i).modulus()));
    largest * EPSILON * triangular.rows.max(triangular.columns) as f64
}

/// Least-squares solution of `A x = b` (minimum norm when `A` is wide).
/// The empty buffer signals that `A` is not of full rank.
pub fn least_squares<T: Field>(a: &Buffer<T>, b: &Buffer<T>) -> Buffer<T> {
    if b.rows != a.rows {
        return Buffer::empty();
    }
    let rows = a.rows;
    let columns = a.columns;

    if rows >= columns {
        let QrFactors { q, r, .. } = qr(a);
        let threshold = rank_threshold(&r, columns);
        if (0..columns).any(|i| r.get(i, i).modulus() <= threshold) {
            debug!(rows, columns, "least squares: rank deficient system");
            return Buffer::empty();
        }
        let qhb = q.adjoint().multiply(b);
        let mut x = Buffer::zeros(columns, b.columns);
        for column in 0..b.columns {
            for row in (0..columns).rev() {
                let mut sum = qhb.get(row, column);
                for k in row + 1..columns {
                    sum -= r.get(row, k) * x.get(k, column);
                }
                x.set(row, column, sum / r.get(row, row));
            }
        }
        x
    } else {
        let LqFactors { l, q, .. } = lq(a);
        let threshold = rank_threshold(&l, rows);
        if (0..rows).any(|i| l.get(i, i).modulus() <= threshold) {
            debug!(rows, columns, "least squares: rank deficient system");
            return Buffer::empty();
        }
        let mut y = Buffer::zeros(columns, b.columns);
        for column in 0..b.columns {
            for row in 0..rows {
                let mut sum = b.get(row, column);
                for k in 0..row {
                    sum -= l.get(row, k) * y.get(k, column);
                }
                y.set(row, column, sum / l.get(row, row));
            }
        }
        q.adjoint().multiply(&y)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn qr_reconstructs_tall_matrix() {
        let a = real(3, 2, &[12.0, -51.0, 6.0, 167.0, -4.0, 24.0]);
        let QrFactors { q, r, ok } = qr(&a);
        assert!(ok);
        assert!(is_unitary(&q, 1e-12));
        assert_close(&q.multiply(&r), &a, 1e-10);
        assert!(r.get(1, 0).abs() < 1e-15);
        assert!(r.get(2, 1).abs() < 1e-15);
    }

    #[test]
    fn qr_complex() {
        let a = complex(2, 2, &[(1.0, 2.0), (0.0, 1.0), (3.0, -1.0), (2.0, 2.0)]);
        let QrFactors { q, r, .. } = qr(&a);
        assert!(is_unitary(&q, 1e-12));
        assert_close(&q.multiply(&r), &a, 1e-12);
        assert!(r.get(1, 0).modulus() < 1e-15);
    }

    #[test]
    fn lq_reconstructs_wide_matrix() {
        let a = real(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let LqFactors { l, q, ok } = lq(&a);
        assert!(ok);
        assert_eq!((l.rows, l.columns), (2, 3));
        assert!(is_unitary(&q, 1e-12));
        assert!(l.get(0, 1).abs() < 1e-12);
        assert_close(&l.multiply(&q), &a, 1e-12);
    }

    #[test]
    fn least_squares_fits_line() {
        // y = 1 + 2x sampled exactly
        let a = real(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = real(4, 1, &[1.0, 3.0, 5.0, 7.0]);
        let x = least_squares(&a, &b);
        assert_close(&x, &real(2, 1, &[1.0, 2.0]), 1e-12);
    }

    #[test]
    fn least_squares_minimum_norm() {
        let a = real(1, 2, &[1.0, 1.0]);
        let b = real(1, 1, &[2.0]);
        let x = least_squares(&a, &b);
        assert_close(&x, &real(2, 1, &[1.0, 1.0]), 1e-12);
    }

    #[test]
    fn least_squares_rejects_rank_deficient() {
        let a = real(3, 2, &[1.0, 2.0, 2.0, 4.0, 3.0, 6.0]);
        let b = real(3, 1, &[1.0, 2.0, 3.0]);
        assert!(least_squares(&a, &b).is_empty());
    }
}
