//! One-sided Jacobi singular value decomposition and the quantities derived
//! from it (rank, condition number, null space)

use tracing::{debug, warn};

use super::{Buffer, EPSILON, Field, MAX_SVD_SWEEPS, vector_norm};
use crate::scalar::Real;

/// `A = U * diag(singular_values) * V^H`
#[derive(Debug, Clone)]
pub struct SvdFactors<T> {
    /// Unitary, rows x rows
    pub u: Buffer<T>,
    /// Non-negative, sorted in descending order; `min(rows, columns)` long
    pub singular_values: Vec<Real>,
    /// Unitary, columns x columns
    pub v_star: Buffer<T>,
    pub ok: bool,
}

impl<T: Field> SvdFactors<T> {
    /// The rows x columns diagonal factor
    pub fn sigma(&self) -> Buffer<T> {
        let mut sigma = Buffer::zeros(self.u.columns, self.v_star.rows);
        for (i, &value) in self.singular_values.iter().enumerate() {
            sigma.set(i, i, T::from_real(value));
        }
        sigma
    }
}

pub fn svd<T: Field>(a: &Buffer<T>) -> SvdFactors<T> {
    if a.rows < a.columns {
        // A^H = U' S V'^H  gives  A = V' S U'^H
        let SvdFactors {
            u,
            singular_values,
            v_star,
            ok,
        } = svd(&a.adjoint());
        return SvdFactors {
            u: v_star.adjoint(),
            singular_values,
            v_star: u.adjoint(),
            ok,
        };
    }

    let rows = a.rows;
    let columns = a.columns;
    let mut work = a.clone();
    let mut v = Buffer::<T>::identity(columns);
    let mut converged = columns < 2;

    for sweep in 0..MAX_SVD_SWEEPS {
        let mut rotated = false;
        for p in 0..columns {
            for q in p + 1..columns {
                if rotate_pair(&mut work, &mut v, p, q) {
                    rotated = true;
                }
            }
        }
        if !rotated {
            debug!(sweep, rows, columns, "jacobi svd converged");
            converged = true;
            break;
        }
    }
    if !converged {
        warn!(rows, columns, "jacobi svd hit the sweep limit");
    }

    let mut order: Vec<(usize, Real)> = (0..columns)
        .map(|column| (column, vector_norm(work.column(column))))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let largest = order.first().map_or(0.0, |&(_, sigma)| sigma);
    let negligible = negligible_threshold(largest, rows, columns);

    let mut u = Buffer::zeros(rows, rows);
    let mut v_sorted = Buffer::zeros(columns, columns);
    let mut singular_values = Vec::with_capacity(columns);
    let mut filled = Vec::with_capacity(rows);
    for (target, &(source, sigma)) in order.iter().enumerate() {
        singular_values.push(sigma);
        for row in 0..columns {
            v_sorted.set(row, target, v.get(row, source));
        }
        if sigma > negligible && sigma > 0.0 {
            for row in 0..rows {
                u.set(row, target, work.get(row, source).scaled(1.0 / sigma));
            }
            filled.push(target);
        }
    }
    complete_orthonormal_basis(&mut u, &filled);

    let ok = converged && u.all_finite() && v_sorted.all_finite();
    SvdFactors {
        u,
        singular_values,
        v_star: v_sorted.adjoint(),
        ok,
    }
}

/// Singular values at or below this are treated as zero
fn negligible_threshold(largest: Real, rows: usize, columns: usize) -> Real {
    8.0 * largest * EPSILON * rows.max(columns) as Real
}

/// Orthogonalize columns `p` and `q` of `work`, applying the same rotation
/// to `v`. Returns false when the pair was already orthogonal.
fn rotate_pair<T: Field>(work: &mut Buffer<T>, v: &mut Buffer<T>, p: usize, q: usize) -> bool {
    let mut alpha = 0.0;
    let mut beta = 0.0;
    let mut gamma = T::zero();
    for row in 0..work.rows {
        let wp = work.get(row, p);
        let wq = work.get(row, q);
        alpha += wp.modulus_sqr();
        beta += wq.modulus_sqr();
        gamma += wp.conjugate() * wq;
    }
    let gamma_modulus = gamma.modulus();
    let tolerance = EPSILON * work.rows as Real;
    if gamma_modulus == 0.0 || gamma_modulus <= tolerance * (alpha * beta).sqrt() {
        return false;
    }

    let phase = gamma.scaled(1.0 / gamma_modulus).conjugate();
    let zeta = (beta - alpha) / (2.0 * gamma_modulus);
    let sign = if zeta >= 0.0 { 1.0 } else { -1.0 };
    let t = sign / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
    let c = 1.0 / (1.0 + t * t).sqrt();
    let s = c * t;

    for target in [work, v] {
        for row in 0..target.rows {
            let xp = target.get(row, p);
            let xq = target.get(row, q) * phase;
            target.set(row, p, xp.scaled(c) - xq.scaled(s));
            target.set(row, q, xp.scaled(s) + xq.scaled(c));
        }
    }
    true
}

/// Fill the columns of `u` not listed in `filled` with unit vectors
/// orthogonal to every other column
fn complete_orthonormal_basis<T: Field>(u: &mut Buffer<T>, filled: &[usize]) {
    let size = u.rows;
    let mut basis: Vec<usize> = filled.to_vec();
    let missing: Vec<usize> = (0..u.columns).filter(|c| !filled.contains(c)).collect();
    let mut candidate = 0;

    for column in missing {
        while candidate < size {
            let mut vector = vec![T::zero(); size];
            vector[candidate] = T::one();
            candidate += 1;

            // two passes of Gram-Schmidt keep the result orthogonal
            for _ in 0..2 {
                for &existing in &basis {
                    let mut dot = T::zero();
                    for (row, value) in vector.iter().enumerate() {
                        dot += u.get(row, existing).conjugate() * *value;
                    }
                    for (row, value) in vector.iter_mut().enumerate() {
                        *value -= dot * u.get(row, existing);
                    }
                }
            }
            let norm = vector_norm(&vector);
            if norm > 1e-6 {
                for (row, value) in vector.into_iter().enumerate() {
                    u.set(row, column, value.scaled(1.0 / norm));
                }
                basis.push(column);
                break;
            }
        }
    }
}

/// Number of singular values above `tolerance * largest`
pub fn rank<T: Field>(a: &Buffer<T>, tolerance: Real) -> usize {
    let values = svd(a).singular_values;
    let Some(&largest) = values.first() else {
        return 0;
    };
    values
        .iter()
        .filter(|&&sigma| sigma > tolerance * largest)
        .count()
}

/// Ratio of the largest to the smallest singular value; infinite when the
/// smallest one is negligible
pub fn condition_number<T: Field>(a: &Buffer<T>) -> Real {
    let values = svd(a).singular_values;
    let (Some(&largest), Some(&smallest)) = (values.first(), values.last()) else {
        return 0.0;
    };
    if smallest <= negligible_threshold(largest, a.rows, a.columns) {
        Real::INFINITY
    } else {
        largest / smallest
    }
}

/// Orthonormal basis of the null space of `A`, one vector per column
pub fn null_space<T: Field>(a: &Buffer<T>) -> Buffer<T> {
    let factors = svd(a);
    let columns = a.columns;
    let largest = factors.singular_values.first().copied().unwrap_or(0.0);
    let threshold = negligible_threshold(largest, a.rows, columns);

    let v = factors.v_star.adjoint();
    let null_columns: Vec<usize> = (0..columns)
        .filter(|&i| factors.singular_values.get(i).is_none_or(|&sigma| sigma <= threshold))
        .collect();

    let mut basis = Buffer::zeros(columns, null_columns.len());
    for (target, &source) in null_columns.iter().enumerate() {
        for row in 0..columns {
            basis.set(row, target, v.get(row, source));
        }
    }
    basis
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn reconstruct<T: Field>(factors: &SvdFactors<T>) -> Buffer<T> {
        factors
            .u
            .multiply(&factors.sigma())
            .multiply(&factors.v_star)
    }

    #[test]
    fn svd_of_diagonal_is_sorted() {
        let a = real(2, 2, &[1.0, 0.0, 0.0, 3.0]);
        let factors = svd(&a);
        assert!(factors.ok);
        assert!((factors.singular_values[0] - 3.0).abs() < 1e-12);
        assert!((factors.singular_values[1] - 1.0).abs() < 1e-12);
        assert_close(&reconstruct(&factors), &a, 1e-12);
    }

    #[test]
    fn svd_reconstructs_tall_and_wide() {
        let tall = real(3, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let factors = svd(&tall);
        assert!(is_unitary(&factors.u, 1e-10));
        assert!(is_unitary(&factors.v_star, 1e-10));
        assert_close(&reconstruct(&factors), &tall, 1e-10);

        let wide = real(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let factors = svd(&wide);
        assert_eq!((factors.u.rows, factors.v_star.rows), (2, 3));
        assert_close(&reconstruct(&factors), &wide, 1e-10);
    }

    #[test]
    fn svd_complex() {
        let a = complex(2, 2, &[(1.0, 1.0), (0.0, 2.0), (3.0, 0.0), (1.0, -1.0)]);
        let factors = svd(&a);
        assert!(factors.ok);
        assert!(is_unitary(&factors.u, 1e-10));
        assert!(is_unitary(&factors.v_star, 1e-10));
        assert_close(&reconstruct(&factors), &a, 1e-10);
    }

    #[test]
    fn rank_and_condition() {
        let singular = real(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 1.0, 0.0, 1.0]);
        assert_eq!(rank(&singular, 1e-10), 2);
        assert_eq!(condition_number(&singular), Real::INFINITY);

        let scaled = real(2, 2, &[4.0, 0.0, 0.0, 2.0]);
        assert_eq!(rank(&scaled, 1e-10), 2);
        assert!((condition_number(&scaled) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn null_space_is_annihilated() {
        let a = real(2, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0]);
        let kernel = null_space(&a);
        assert_eq!((kernel.rows, kernel.columns), (3, 2));
        assert_close(&a.multiply(&kernel), &Buffer::zeros(2, 2), 1e-10);
        assert!(is_unitary(&kernel, 1e-10));
    }
}
