//! Linear algebra on real and complex matrices
//!
//! These methods convert to a kernel [`Buffer`], run the kernel and wrap the
//! results back into matrices. Decompositions come back as plain structs;
//! each converts into the tuple the value layer hands to users.

use super::ops::Arithmetic;
use super::{Coefficient, Matrix, MatrixComplex, MatrixReal};
use crate::error::{ValueError, ValueResult};
use crate::kernel::{Buffer, Field, eigen, lu, qr, svd, transform};
use crate::scalar::{Integer, Real};
use crate::tuple::Tuple;
use crate::variant::Variant;

/// Tolerance used by the structural predicates when none is given
pub const DEFAULT_RELATIVE_TOLERANCE: Real = 1e-8;

/// `P * A = L * U`
#[derive(Debug, Clone, PartialEq)]
pub struct PluDecomposition<T: Coefficient> {
    pub p: Matrix<T>,
    pub l: Matrix<T>,
    pub u: Matrix<T>,
    pub singular: bool,
}

/// `A = U * S * V^H`
#[derive(Debug, Clone, PartialEq)]
pub struct SvdDecomposition<T: Coefficient> {
    pub u: Matrix<T>,
    pub s: Matrix<T>,
    pub v_star: Matrix<T>,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QrDecomposition<T: Coefficient> {
    pub q: Matrix<T>,
    pub r: Matrix<T>,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LqDecomposition<T: Coefficient> {
    pub l: Matrix<T>,
    pub q: Matrix<T>,
    pub ok: bool,
}

/// `A = Q * H * Q^H`
#[derive(Debug, Clone, PartialEq)]
pub struct HessenbergDecomposition<T: Coefficient> {
    pub q: Matrix<T>,
    pub h: Matrix<T>,
}

/// `A = Q * U * Q^H` with `U` upper triangular
#[derive(Debug, Clone, PartialEq)]
pub struct SchurDecomposition {
    pub q: MatrixComplex,
    pub u: MatrixComplex,
    pub eigenvalues: MatrixComplex,
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    pub eigenvalues: MatrixComplex,
    pub q: MatrixComplex,
    pub u: MatrixComplex,
    /// One unit-norm eigenvector per column
    pub eigenvectors: MatrixComplex,
    pub ok: bool,
}

/// Diagonal scalings with `row_scale * A * column_scale` balanced
#[derive(Debug, Clone, PartialEq)]
pub struct Equilibration<T: Coefficient> {
    pub row_scale: Matrix<T>,
    pub column_scale: Matrix<T>,
    pub ok: bool,
}

fn matrix_variant<T: Coefficient>(matrix: Matrix<T>) -> Variant {
    T::into_matrix_variant(matrix)
}

impl<T: Coefficient> From<PluDecomposition<T>> for Tuple {
    fn from(value: PluDecomposition<T>) -> Self {
        Tuple::from(vec![
            matrix_variant(value.p),
            matrix_variant(value.l),
            matrix_variant(value.u),
            Variant::Boolean(value.singular),
        ])
    }
}

impl<T: Coefficient> From<SvdDecomposition<T>> for Tuple {
    fn from(value: SvdDecomposition<T>) -> Self {
        Tuple::from(vec![
            matrix_variant(value.u),
            matrix_variant(value.s),
            matrix_variant(value.v_star),
            Variant::Boolean(value.ok),
        ])
    }
}

impl<T: Coefficient> From<QrDecomposition<T>> for Tuple {
    fn from(value: QrDecomposition<T>) -> Self {
        Tuple::from(vec![
            matrix_variant(value.q),
            matrix_variant(value.r),
            Variant::Boolean(value.ok),
        ])
    }
}

impl<T: Coefficient> From<LqDecomposition<T>> for Tuple {
    fn from(value: LqDecomposition<T>) -> Self {
        Tuple::from(vec![
            matrix_variant(value.l),
            matrix_variant(value.q),
            Variant::Boolean(value.ok),
        ])
    }
}

impl<T: Coefficient> From<HessenbergDecomposition<T>> for Tuple {
    fn from(value: HessenbergDecomposition<T>) -> Self {
        Tuple::from(vec![matrix_variant(value.q), matrix_variant(value.h)])
    }
}

impl From<SchurDecomposition> for Tuple {
    fn from(value: SchurDecomposition) -> Self {
        Tuple::from(vec![
            Variant::MatrixComplex(value.q),
            Variant::MatrixComplex(value.u),
            Variant::MatrixComplex(value.eigenvalues),
            Variant::Boolean(value.ok),
        ])
    }
}

/// `(eigenvalues, Q, U, v1, v2, ...)`
impl From<EigenDecomposition> for Tuple {
    fn from(value: EigenDecomposition) -> Self {
        let mut elements = vec![
            Variant::MatrixComplex(value.eigenvalues),
            Variant::MatrixComplex(value.q),
            Variant::MatrixComplex(value.u),
        ];
        let vectors = &value.eigenvectors;
        for column in 0..vectors.columns() {
            let start = column * vectors.rows();
            let data = vectors.data()[start..start + vectors.rows()].to_vec();
            elements.push(Variant::MatrixComplex(Matrix::column_vector(data)));
        }
        Tuple::from(elements)
    }
}

impl<T: Coefficient> From<Equilibration<T>> for Tuple {
    fn from(value: Equilibration<T>) -> Self {
        Tuple::from(vec![
            matrix_variant(value.row_scale),
            matrix_variant(value.column_scale),
            Variant::Boolean(value.ok),
        ])
    }
}

impl<T: Arithmetic + Field> Matrix<T> {
    pub(crate) fn to_buffer(&self) -> Buffer<T> {
        Buffer::new(self.rows(), self.columns(), self.data().to_vec())
    }

    pub(crate) fn from_buffer(buffer: Buffer<T>) -> Self {
        Matrix::from_parts(buffer.rows, buffer.columns, buffer.data)
    }

    fn require_square(&self) -> ValueResult<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(ValueError::InvalidMatrixDimensions {
                rows: self.rows(),
                columns: self.columns(),
            })
        }
    }

    pub fn determinant(&self) -> ValueResult<T> {
        self.require_square()?;
        Ok(lu::determinant(&self.to_buffer()))
    }

    pub fn inverse(&self) -> ValueResult<Self> {
        self.require_square()?;
        lu::inverse(&self.to_buffer())
            .map(Self::from_buffer)
            .ok_or(ValueError::MatrixIsSingular)
    }

    pub fn plu(&self) -> PluDecomposition<T> {
        let factors = lu::lu_decompose(&self.to_buffer());
        PluDecomposition {
            p: Self::from_buffer(factors.permutation_matrix()),
            l: Self::from_buffer(factors.lower()),
            u: Self::from_buffer(factors.upper()),
            singular: factors.singular,
        }
    }

    pub fn svd(&self) -> SvdDecomposition<T> {
        let factors = svd::svd(&self.to_buffer());
        SvdDecomposition {
            s: Self::from_buffer(factors.sigma()),
            u: Self::from_buffer(factors.u),
            v_star: Self::from_buffer(factors.v_star),
            ok: factors.ok,
        }
    }

    pub fn qr(&self) -> QrDecomposition<T> {
        let factors = qr::qr(&self.to_buffer());
        QrDecomposition {
            q: Self::from_buffer(factors.q),
            r: Self::from_buffer(factors.r),
            ok: factors.ok,
        }
    }

    pub fn lq(&self) -> LqDecomposition<T> {
        let factors = qr::lq(&self.to_buffer());
        LqDecomposition {
            l: Self::from_buffer(factors.l),
            q: Self::from_buffer(factors.q),
            ok: factors.ok,
        }
    }

    /// Lower factor `L` with `A = L L^H`; empty when `A` is not Hermitian
    /// positive definite
    pub fn cholesky(&self) -> Self {
        lu::cholesky(&self.to_buffer(), DEFAULT_RELATIVE_TOLERANCE)
            .map_or_else(|| Self::new(0, 0), Self::from_buffer)
    }

    /// Upper factor `U` with `A = U^H U`
    pub fn upper_cholesky(&self) -> Self {
        lu::cholesky(&self.to_buffer(), DEFAULT_RELATIVE_TOLERANCE)
            .map_or_else(|| Self::new(0, 0), |l| Self::from_buffer(l.adjoint()))
    }

    pub fn hessenberg(&self) -> ValueResult<HessenbergDecomposition<T>> {
        self.require_square()?;
        let factors = eigen::hessenberg(&self.to_buffer());
        Ok(HessenbergDecomposition {
            q: Self::from_buffer(factors.q),
            h: Self::from_buffer(factors.h),
        })
    }

    /// Number of singular values above `epsilon` times the largest one
    pub fn rank(&self, epsilon: Real) -> Integer {
        svd::rank(&self.to_buffer(), epsilon) as Integer
    }

    pub fn condition_number(&self) -> Real {
        svd::condition_number(&self.to_buffer())
    }

    /// Entry-wise p-norm; `p` may be infinite
    pub fn p_norm(&self, p: Real) -> ValueResult<Real> {
        if p.is_nan() || p <= 0.0 {
            return Err(ValueError::InvalidNumericValue { value: p });
        }
        if p.is_infinite() {
            return Ok(self.iter().fold(0.0, |acc, v| acc.max(v.modulus())));
        }
        let sum: Real = self.iter().map(|v| v.modulus().powf(p)).sum();
        Ok(sum.powf(1.0 / p))
    }

    pub fn euclidean_norm(&self) -> Real {
        self.iter().map(|v| v.modulus_sqr()).sum::<Real>().sqrt()
    }

    /// Largest absolute column sum
    pub fn one_norm(&self) -> Real {
        (0..self.columns())
            .map(|column| {
                (0..self.rows())
                    .map(|row| self.get(row, column).modulus())
                    .sum::<Real>()
            })
            .fold(0.0, Real::max)
    }

    /// Largest absolute row sum
    pub fn infinity_norm(&self) -> Real {
        (0..self.rows())
            .map(|row| {
                (0..self.columns())
                    .map(|column| self.get(row, column).modulus())
                    .sum::<Real>()
            })
            .fold(0.0, Real::max)
    }

    /// Row then column scaling so every row and column peaks at one
    pub fn equilibrate(&self) -> Equilibration<T> {
        let rows = self.rows();
        let columns = self.columns();
        let mut ok = true;

        let row_factors: Vec<Real> = (0..rows)
            .map(|row| {
                let peak = (0..columns).fold(0.0, |acc: Real, c| acc.max(self.get(row, c).modulus()));
                if peak > 0.0 {
                    1.0 / peak
                } else {
                    ok = false;
                    1.0
                }
            })
            .collect();
        let column_factors: Vec<Real> = (0..columns)
            .map(|column| {
                let peak = (0..rows).fold(0.0, |acc: Real, r| {
                    acc.max(self.get(r, column).modulus() * row_factors[r])
                });
                if peak > 0.0 {
                    1.0 / peak
                } else {
                    ok = false;
                    1.0
                }
            })
            .collect();

        let diagonal = |factors: Vec<Real>| {
            let values = factors.into_iter().map(T::from_real).collect();
            Matrix::column_vector(values)
                .diagonal()
                .unwrap_or_else(|_| Matrix::new(0, 0))
        };
        Equilibration {
            row_scale: diagonal(row_factors),
            column_scale: diagonal(column_factors),
            ok,
        }
    }

    /// Solve `A X = Y`; the result is empty when `A` is singular
    pub fn solve(&self, y: &Self) -> ValueResult<Self> {
        self.require_square()?;
        if y.rows() != self.rows() {
            return Err(ValueError::incompatible_dimensions(self.shape(), y.shape()));
        }
        Ok(Self::from_buffer(lu::solve(&self.to_buffer(), &y.to_buffer())))
    }

    /// Least-squares solution of `A x = b`; empty when `A` is rank deficient
    pub fn least_squares(&self, b: &Self) -> ValueResult<Self> {
        if b.rows() != self.rows() {
            return Err(ValueError::incompatible_dimensions(self.shape(), b.shape()));
        }
        Ok(Self::from_buffer(qr::least_squares(
            &self.to_buffer(),
            &b.to_buffer(),
        )))
    }

    /// Orthonormal basis of the null space, one vector per column
    pub fn kernel(&self) -> Self {
        Self::from_buffer(svd::null_space(&self.to_buffer()))
    }

    pub fn is_symmetric(&self, tolerance: Real) -> bool {
        lu::is_transposed_match(&self.to_buffer(), tolerance, |v| v)
    }

    pub fn is_hermitian(&self, tolerance: Real) -> bool {
        lu::is_hermitian(&self.to_buffer(), tolerance)
    }

    pub fn is_skew_symmetric(&self, tolerance: Real) -> bool {
        lu::is_transposed_match(&self.to_buffer(), tolerance, |v| -v)
    }

    pub fn is_skew_hermitian(&self, tolerance: Real) -> bool {
        lu::is_transposed_match(&self.to_buffer(), tolerance, |v| -<T as Field>::conjugate(v))
    }

    /// `A A^H == A^H A` within `tolerance` relative to the largest product
    /// coefficient
    pub fn is_normal(&self, tolerance: Real) -> bool {
        if !self.is_square() {
            return false;
        }
        let a = self.to_buffer();
        let a_h = a.adjoint();
        let left = a.multiply(&a_h);
        let right = a_h.multiply(&a);
        let scale = left.max_modulus().max(right.max_modulus());
        left.data
            .iter()
            .zip(&right.data)
            .all(|(&l, &r)| (l - r).modulus() <= tolerance * scale)
    }
}

impl MatrixComplex {
    pub fn schur(&self) -> ValueResult<SchurDecomposition> {
        self.require_square()?;
        let factors = eigen::schur(&self.to_buffer());
        Ok(SchurDecomposition {
            q: Self::from_buffer(factors.q),
            u: Self::from_buffer(factors.u),
            eigenvalues: Matrix::column_vector(factors.eigenvalues),
            ok: factors.ok,
        })
    }

    pub fn eigenvectors(&self) -> ValueResult<EigenDecomposition> {
        self.require_square()?;
        let factors = eigen::eigen(&self.to_buffer());
        Ok(EigenDecomposition {
            eigenvalues: Matrix::column_vector(factors.eigenvalues),
            q: Self::from_buffer(factors.q),
            u: Self::from_buffer(factors.u),
            eigenvectors: Self::from_buffer(factors.vectors),
            ok: factors.ok,
        })
    }

    /// Forward DFT, one-dimensional for vectors and two-dimensional otherwise
    pub fn dft(&self) -> Self {
        Self::from_buffer(transform::dft(&self.to_buffer()))
    }

    pub fn idft(&self) -> Self {
        Self::from_buffer(transform::idft(&self.to_buffer()))
    }
}

impl MatrixReal {
    /// Type-II DCT, one-dimensional for vectors and two-dimensional otherwise
    pub fn dct(&self) -> Self {
        Self::from_buffer(transform::dct(&self.to_buffer()))
    }

    pub fn idct(&self) -> Self {
        Self::from_buffer(transform::idct(&self.to_buffer()))
    }

    /// Analytic signal of a real vector, same shape as the input
    pub fn hilbert_transform(&self) -> ValueResult<MatrixComplex> {
        if !self.is_vector() && !self.is_empty() {
            return Err(ValueError::InvalidMatrixDimensions {
                rows: self.rows(),
                columns: self.columns(),
            });
        }
        let analytic = transform::hilbert(self.data());
        Ok(Matrix::from_parts(self.rows(), self.columns(), analytic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Complex;

    fn reals(rows: usize, columns: usize, row_major: &[Real]) -> MatrixReal {
        Matrix::from_row_major(rows, columns, row_major).unwrap()
    }

    fn assert_near(actual: &MatrixReal, expected: &MatrixReal, tolerance: Real) {
        assert_eq!(actual.shape(), expected.shape());
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() <= tolerance, "{actual} != {expected}");
        }
    }

    #[test]
    fn determinant_and_inverse() {
        let a = reals(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        assert!((a.determinant().unwrap() - 10.0).abs() < 1e-12);
        let inverse = a.inverse().unwrap();
        assert_near(&a.checked_mul(&inverse).unwrap(), &MatrixReal::identity(2, 2), 1e-12);

        assert_eq!(
            reals(2, 2, &[1.0, 2.0, 2.0, 4.0]).inverse(),
            Err(ValueError::MatrixIsSingular)
        );
        assert!(matches!(
            reals(1, 2, &[1.0, 2.0]).determinant(),
            Err(ValueError::InvalidMatrixDimensions { .. })
        ));
    }

    #[test]
    fn plu_satisfies_pa_equals_lu() {
        let a = reals(3, 3, &[0.0, 2.0, 1.0, 1.0, 1.0, 0.0, 3.0, 0.0, 1.0]);
        let PluDecomposition { p, l, u, singular } = a.plu();
        assert!(!singular);
        assert_near(
            &p.checked_mul(&a).unwrap(),
            &l.checked_mul(&u).unwrap(),
            1e-12,
        );
        let tuple = Tuple::from(a.plu());
        assert_eq!(tuple.len(), 4);
        assert_eq!(tuple.at(4), Ok(&Variant::Boolean(false)));
    }

    #[test]
    fn decompositions_compare_by_value() {
        let a = reals(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        assert_eq!(a.plu(), a.plu());
        assert_eq!(a.qr(), a.qr());
        assert_eq!(a.equilibrate(), a.equilibrate());
        assert_ne!(a.plu(), reals(2, 2, &[1.0, 0.0, 0.0, 1.0]).plu());
    }

    #[test]
    fn svd_reconstructs() {
        let a = reals(3, 2, &[3.0, 0.0, 4.0, 5.0, 0.0, 1.0]);
        let SvdDecomposition { u, s, v_star, ok } = a.svd();
        assert!(ok);
        assert_eq!(s.shape(), (3, 2));
        let product = u.checked_mul(&s).unwrap().checked_mul(&v_star).unwrap();
        assert_near(&product, &a, 1e-10);
    }

    #[test]
    fn cholesky_factors() {
        let a = reals(2, 2, &[4.0, 2.0, 2.0, 3.0]);
        let l = a.cholesky();
        assert_near(&l.checked_mul(&l.adjoint()).unwrap(), &a, 1e-12);
        let u = a.upper_cholesky();
        assert_near(&u.adjoint().checked_mul(&u).unwrap(), &a, 1e-12);
        assert!(reals(2, 2, &[1.0, 2.0, 3.0, 4.0]).cholesky().is_empty());
    }

    #[test]
    fn norms() {
        let a = reals(2, 2, &[1.0, -2.0, 3.0, 4.0]);
        assert_eq!(a.one_norm(), 6.0);
        assert_eq!(a.infinity_norm(), 7.0);
        assert!((a.euclidean_norm() - 30.0f64.sqrt()).abs() < 1e-12);
        assert!((a.p_norm(2.0).unwrap() - a.euclidean_norm()).abs() < 1e-12);
        assert_eq!(a.p_norm(1.0), Ok(10.0));
        assert_eq!(a.p_norm(Real::INFINITY), Ok(4.0));
        assert!(a.p_norm(0.0).is_err());
    }

    #[test]
    fn rank_and_condition() {
        let a = reals(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(a.rank(1e-10), 1);
        assert_eq!(a.condition_number(), Real::INFINITY);
        assert_eq!(MatrixReal::identity(3, 3).rank(1e-10), 3);
    }

    #[test]
    fn equilibrate_balances_rows_and_columns() {
        let a = reals(2, 2, &[100.0, 1.0, 2.0, 0.5]);
        let Equilibration {
            row_scale,
            column_scale,
            ok,
        } = a.equilibrate();
        assert!(ok);
        let balanced = row_scale
            .checked_mul(&a)
            .unwrap()
            .checked_mul(&column_scale)
            .unwrap();
        assert!(balanced.iter().all(|v| v.abs() <= 1.0 + 1e-12));
        for row in 1..=2 {
            let peak = balanced.row(row).unwrap().iter().fold(0.0, |acc: Real, v| acc.max(v.abs()));
            assert!(peak > 0.0);
        }

        assert!(!reals(2, 2, &[1.0, 0.0, 0.0, 0.0]).equilibrate().ok);
    }

    #[test]
    fn solve_and_least_squares() {
        let a = reals(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let x = reals(2, 1, &[1.0, 1.0]);
        let y = a.checked_mul(&x).unwrap();
        assert_near(&a.solve(&y).unwrap(), &x, 1e-10);

        let singular = reals(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(singular.solve(&y).unwrap().is_empty());
        assert!(a.solve(&reals(3, 1, &[1.0, 2.0, 3.0])).is_err());

        let tall = reals(3, 1, &[1.0, 1.0, 1.0]);
        let b = reals(3, 1, &[1.0, 2.0, 3.0]);
        assert_near(&tall.least_squares(&b).unwrap(), &reals(1, 1, &[2.0]), 1e-12);
    }

    #[test]
    fn structural_predicates() {
        let symmetric = reals(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert!(symmetric.is_symmetric(DEFAULT_RELATIVE_TOLERANCE));
        assert!(!symmetric.is_skew_symmetric(DEFAULT_RELATIVE_TOLERANCE));
        assert!(symmetric.is_normal(DEFAULT_RELATIVE_TOLERANCE));

        let skew = reals(2, 2, &[0.0, 3.0, -3.0, 0.0]);
        assert!(skew.is_skew_symmetric(DEFAULT_RELATIVE_TOLERANCE));

        let hermitian = MatrixComplex::from_row_major(
            2,
            2,
            &[
                Complex::new(2.0, 0.0),
                Complex::new(1.0, 1.0),
                Complex::new(1.0, -1.0),
                Complex::new(3.0, 0.0),
            ],
        )
        .unwrap();
        assert!(hermitian.is_hermitian(DEFAULT_RELATIVE_TOLERANCE));
        assert!(!hermitian.is_symmetric(DEFAULT_RELATIVE_TOLERANCE));
        assert!(
            hermitian
                .scale(Complex::new(0.0, 1.0))
                .is_skew_hermitian(DEFAULT_RELATIVE_TOLERANCE)
        );

        let shear = reals(2, 2, &[1.0, 1.0, 0.0, 1.0]);
        assert!(!shear.is_normal(DEFAULT_RELATIVE_TOLERANCE));
    }

    #[test]
    fn schur_and_eigenvectors() {
        let a = reals(2, 2, &[2.0, 0.0, 0.0, 5.0]).to_matrix_complex().unwrap();
        let schur = a.schur().unwrap();
        assert!(schur.ok);
        let mut values: Vec<Real> = schur.eigenvalues.iter().map(|z| z.re).collect();
        values.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(values, vec![2.0, 5.0]);

        let eigen = a.eigenvectors().unwrap();
        let tuple = Tuple::from(eigen);
        assert_eq!(tuple.len(), 5);
    }

    #[test]
    fn transforms_round_trip() {
        let v = reals(1, 4, &[1.0, 0.0, -1.0, 2.0]);
        assert_near(&v.dct().idct(), &v, 1e-12);

        let c = v.to_matrix_complex().unwrap();
        let back = c.dft().idft();
        for (a, e) in back.iter().zip(c.iter()) {
            assert!((a - e).norm() < 1e-12);
        }

        let analytic = v.hilbert_transform().unwrap();
        assert_eq!(analytic.shape(), (1, 4));
        for (z, x) in analytic.iter().zip(v.iter()) {
            assert!((z.re - x).abs() < 1e-12);
        }
        assert!(reals(2, 2, &[1.0; 4]).hilbert_transform().is_err());
    }

    #[test]
    fn kernel_spans_null_space() {
        let a = reals(1, 2, &[1.0, 1.0]);
        let k = a.kernel();
        assert_eq!(k.shape(), (2, 1));
        assert!(a.checked_mul(&k).unwrap().at(1, 1).unwrap().abs() < 1e-12);
    }
}
