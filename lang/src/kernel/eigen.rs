//! Hessenberg reduction, complex Schur form and eigenvectors

use tracing::{debug, warn};

use super::qr::{reflect_columns, reflect_rows};
use super::{Buffer, EPSILON, Field, MAX_SCHUR_ITERATIONS, householder_vector};
use crate::scalar::{Complex, Real};

/// `A = Q H Q^H` with `H` upper Hessenberg
#[derive(Debug, Clone)]
pub struct HessenbergFactors<T> {
    pub q: Buffer<T>,
    pub h: Buffer<T>,
}

/// `A = Q U Q^H` with `U` upper triangular
#[derive(Debug, Clone)]
pub struct SchurFactors {
    pub q: Buffer<Complex>,
    pub u: Buffer<Complex>,
    /// Diagonal of `U`
    pub eigenvalues: Vec<Complex>,
    pub ok: bool,
}

#[derive(Debug, Clone)]
pub struct EigenFactors {
    pub eigenvalues: Vec<Complex>,
    pub q: Buffer<Complex>,
    pub u: Buffer<Complex>,
    /// Unit-norm eigenvectors, column `k` belongs to `eigenvalues[k]`
    pub vectors: Buffer<Complex>,
    pub ok: bool,
}

pub fn hessenberg<T: Field>(a: &Buffer<T>) -> HessenbergFactors<T> {
    let size = a.rows;
    let mut h = a.clone();
    let mut q = Buffer::identity(size);

    for step in 0..size.saturating_sub(2) {
        let x: Vec<T> = (step + 1..size).map(|row| h.get(row, step)).collect();
        let Some((v, v_norm_sqr)) = householder_vector(&x) else {
            continue;
        };
        reflect_rows(&mut h, &v, v_norm_sqr, step + 1, step);
        reflect_columns(&mut h, &v, v_norm_sqr, step + 1);
        reflect_columns(&mut q, &v, v_norm_sqr, step + 1);
        for row in step + 2..size {
            h.set(row, step, T::zero());
        }
    }

    HessenbergFactors { q, h }
}

/// Unitary rotation `G = [[conj c, conj s], [-s, c]]` with `G [x; y] = [r; 0]`
#[derive(Debug, Clone, Copy)]
struct Givens {
    c: Complex,
    s: Complex,
}

impl Givens {
    fn zeroing(x: Complex, y: Complex) -> Self {
        let r = x.norm().hypot(y.norm());
        if r == 0.0 {
            return Givens {
                c: Complex::new(1.0, 0.0),
                s: Complex::new(0.0, 0.0),
            };
        }
        Givens { c: x / r, s: y / r }
    }

    /// Rows `k` and `k + 1`, columns `from..`
    fn apply_left(&self, m: &mut Buffer<Complex>, k: usize, from: usize) {
        for column in from..m.columns {
            let a = m.get(k, column);
            let b = m.get(k + 1, column);
            m.set(k, column, self.c.conj() * a + self.s.conj() * b);
            m.set(k + 1, column, -self.s * a + self.c * b);
        }
    }

    /// `G^H` on columns `k` and `k + 1`, rows `..rows`
    fn apply_right_adjoint(&self, m: &mut Buffer<Complex>, k: usize, rows: usize) {
        for row in 0..rows {
            let a = m.get(row, k);
            let b = m.get(row, k + 1);
            m.set(row, k, a * self.c + b * self.s);
            m.set(row, k + 1, -a * self.s.conj() + b * self.c.conj());
        }
    }
}

/// Eigenvalue of the trailing 2x2 block `[[a, b], [c, d]]` closest to `d`
fn wilkinson_shift(a: Complex, b: Complex, c: Complex, d: Complex) -> Complex {
    let half_trace = (a + d) * 0.5;
    let discriminant = ((a - d) * 0.5 * ((a - d) * 0.5) + b * c).sqrt();
    let first = half_trace + discriminant;
    let second = half_trace - discriminant;
    if (first - d).norm() <= (second - d).norm() {
        first
    } else {
        second
    }
}

/// Complex Schur decomposition by shifted QR iteration on the Hessenberg form
pub fn schur(a: &Buffer<Complex>) -> SchurFactors {
    let size = a.rows;
    let HessenbergFactors { q: mut z, h: mut t } = hessenberg(a);
    let scale = t.max_modulus();
    let mut ok = t.all_finite();
    let mut hi = size.saturating_sub(1);
    let mut iterations = 0;

    while ok && hi > 0 {
        let mut lo = hi;
        while lo > 0 {
            let mut neighbourhood = t.get(lo - 1, lo - 1).norm() + t.get(lo, lo).norm();
            if neighbourhood == 0.0 {
                neighbourhood = scale;
            }
            if t.get(lo, lo - 1).norm() <= EPSILON * neighbourhood {
                t.set(lo, lo - 1, Complex::new(0.0, 0.0));
                break;
            }
            lo -= 1;
        }
        if lo == hi {
            hi -= 1;
            iterations = 0;
            continue;
        }

        iterations += 1;
        if iterations > MAX_SCHUR_ITERATIONS {
            warn!(size, row = hi, "schur iteration did not converge");
            ok = false;
            break;
        }

        let shift = if iterations % 10 == 0 {
            // exceptional shift to break cycles
            t.get(hi, hi) + Complex::new(t.get(hi, hi - 1).norm(), 0.0)
        } else {
            wilkinson_shift(
                t.get(hi - 1, hi - 1),
                t.get(hi - 1, hi),
                t.get(hi, hi - 1),
                t.get(hi, hi),
            )
        };

        for i in lo..=hi {
            *t.at_mut(i, i) -= shift;
        }
        let mut rotations = Vec::with_capacity(hi - lo);
        for k in lo..hi {
            let rotation = Givens::zeroing(t.get(k, k), t.get(k + 1, k));
            rotation.apply_left(&mut t, k, k);
            rotations.push((k, rotation));
        }
        for (k, rotation) in rotations {
            rotation.apply_right_adjoint(&mut t, k, k + 2);
            rotation.apply_right_adjoint(&mut z, k, size);
        }
        for i in lo..=hi {
            *t.at_mut(i, i) += shift;
        }
    }

    if ok {
        for column in 0..size {
            for row in column + 1..size {
                t.set(row, column, Complex::new(0.0, 0.0));
            }
        }
        debug!(size, "schur decomposition converged");
    }
    ok = ok && t.all_finite() && z.all_finite();

    let eigenvalues = (0..size).map(|i| t.get(i, i)).collect();
    SchurFactors {
        q: z,
        u: t,
        eigenvalues,
        ok,
    }
}

/// Eigenvalues and eigenvectors via the Schur form: each vector is found by
/// back substitution on `U` and mapped back through `Q`
pub fn eigen(a: &Buffer<Complex>) -> EigenFactors {
    let SchurFactors {
        q,
        u,
        eigenvalues,
        ok,
    } = schur(a);
    let size = u.rows;
    let floor = EPSILON * u.max_modulus().max(Real::MIN_POSITIVE);

    let mut triangular_vectors = Buffer::<Complex>::zeros(size, size);
    for (k, &lambda) in eigenvalues.iter().enumerate() {
        triangular_vectors.set(k, k, Complex::new(1.0, 0.0));
        for row in (0..k).rev() {
            let mut sum = Complex::new(0.0, 0.0);
            for j in row + 1..=k {
                sum += u.get(row, j) * triangular_vectors.get(j, k);
            }
            let mut pivot = u.get(row, row) - lambda;
            if pivot.norm() < floor {
                pivot = Complex::new(floor, 0.0);
            }
            triangular_vectors.set(row, k, -sum / pivot);
        }
    }

    let mut vectors = q.multiply(&triangular_vectors);
    for column in 0..size {
        let norm = super::vector_norm(vectors.column(column));
        if norm > 0.0 {
            for row in 0..size {
                let value = vectors.get(row, column);
                vectors.set(row, column, value / norm);
            }
        }
    }

    EigenFactors {
        eigenvalues,
        q,
        u,
        vectors,
        ok,
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[test]
    fn hessenberg_reduces_and_reconstructs() {
        let a = real(
            4,
            4,
            &[
                4.0, 1.0, -2.0, 2.0, 1.0, 2.0, 0.0, 1.0, -2.0, 0.0, 3.0, -2.0, 2.0, 1.0, -2.0, -1.0,
            ],
        );
        let HessenbergFactors { q, h } = hessenberg(&a);
        assert!(is_unitary(&q, 1e-12));
        for column in 0..4 {
            for row in column + 2..4 {
                assert_eq!(h.get(row, column), 0.0);
            }
        }
        assert_close(&q.multiply(&h).multiply(&q.adjoint()), &a, 1e-12);
    }

    #[test]
    fn schur_of_rotation_has_imaginary_eigenvalues() {
        let a = complex(2, 2, &[(0.0, 0.0), (-1.0, 0.0), (1.0, 0.0), (0.0, 0.0)]);
        let factors = schur(&a);
        assert!(factors.ok);
        assert!(is_unitary(&factors.q, 1e-12));
        assert_close(
            &factors.q.multiply(&factors.u).multiply(&factors.q.adjoint()),
            &a,
            1e-12,
        );
        let mut imaginary: Vec<Real> = factors.eigenvalues.iter().map(|z| z.im).collect();
        imaginary.sort_by(|a, b| a.total_cmp(b));
        assert!((imaginary[0] + 1.0).abs() < 1e-12);
        assert!((imaginary[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn schur_is_triangular_and_reconstructs() {
        let a = complex(
            3,
            3,
            &[
                (1.0, 0.0),
                (2.0, 1.0),
                (0.0, 0.0),
                (0.5, 0.0),
                (3.0, 0.0),
                (1.0, -1.0),
                (0.0, 2.0),
                (1.0, 0.0),
                (-1.0, 0.0),
            ],
        );
        let factors = schur(&a);
        assert!(factors.ok);
        for column in 0..3 {
            for row in column + 1..3 {
                assert_eq!(factors.u.get(row, column), Complex::new(0.0, 0.0));
            }
        }
        assert_close(
            &factors.q.multiply(&factors.u).multiply(&factors.q.adjoint()),
            &a,
            1e-10,
        );
    }

    #[test]
    fn eigenvectors_satisfy_definition() {
        let a = complex(2, 2, &[(2.0, 0.0), (1.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let factors = eigen(&a);
        assert!(factors.ok);
        for (k, &lambda) in factors.eigenvalues.iter().enumerate() {
            let v = Buffer::new(2, 1, factors.vectors.column(k).to_vec());
            let expected = v.map(|x| x * lambda);
            assert_close(&a.multiply(&v), &expected, 1e-10);
        }
        let mut values: Vec<Real> = factors.eigenvalues.iter().map(|z| z.re).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        assert!((values[0] - 1.0).abs() < 1e-12);
        assert!((values[1] - 3.0).abs() < 1e-12);
    }
}
