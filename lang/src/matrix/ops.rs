use std::ops::{Add, Mul, Neg, Sub};

use super::{Coefficient, Matrix};
use crate::error::{ValueError, ValueResult};
use crate::kernel::Field;
use crate::scalar::{Complex, Integer, Real};

/// Coefficients with a ring structure. Integer operations wrap on overflow.
pub trait Arithmetic: Coefficient {
    fn plus(self, other: Self) -> Self;
    fn minus(self, other: Self) -> Self;
    fn times(self, other: Self) -> Self;
    fn negated(self) -> Self;
}

impl Arithmetic for Integer {
    fn plus(self, other: Self) -> Self {
        self.wrapping_add(other)
    }

    fn minus(self, other: Self) -> Self {
        self.wrapping_sub(other)
    }

    fn times(self, other: Self) -> Self {
        self.wrapping_mul(other)
    }

    fn negated(self) -> Self {
        self.wrapping_neg()
    }
}

impl Arithmetic for Real {
    fn plus(self, other: Self) -> Self {
        self + other
    }

    fn minus(self, other: Self) -> Self {
        self - other
    }

    fn times(self, other: Self) -> Self {
        self * other
    }

    fn negated(self) -> Self {
        -self
    }
}

impl Arithmetic for Complex {
    fn plus(self, other: Self) -> Self {
        self + other
    }

    fn minus(self, other: Self) -> Self {
        self - other
    }

    fn times(self, other: Self) -> Self {
        self * other
    }

    fn negated(self) -> Self {
        -self
    }
}

impl<T: Arithmetic> Matrix<T> {
    pub fn checked_add(&self, other: &Self) -> ValueResult<Self> {
        self.zip_with(other, T::plus)
    }

    pub fn checked_sub(&self, other: &Self) -> ValueResult<Self> {
        self.zip_with(other, T::minus)
    }

    /// Matrix product; the inner dimensions must agree
    pub fn checked_mul(&self, other: &Self) -> ValueResult<Self> {
        if self.columns() != other.rows() {
            return Err(ValueError::incompatible_dimensions(
                self.shape(),
                other.shape(),
            ));
        }
        let rows = self.rows();
        let columns = other.columns();
        let mut data = vec![T::ZERO; rows * columns];
        for column in 0..columns {
            for k in 0..self.columns() {
                let factor = other.get(k, column);
                if factor == T::ZERO {
                    continue;
                }
                for row in 0..rows {
                    let target = &mut data[row + column * rows];
                    *target = target.plus(self.get(row, k).times(factor));
                }
            }
        }
        Ok(Matrix::from_parts(rows, columns, data))
    }

    pub fn scale(&self, factor: T) -> Self {
        self.map(|value| value.times(factor))
    }

    pub fn negate(&self) -> Self {
        self.map(T::negated)
    }

    /// `self += other`, detaching first
    pub fn add_in_place(&mut self, other: &Self) -> ValueResult<()> {
        if self.shape() != other.shape() {
            return Err(ValueError::incompatible_dimensions(
                self.shape(),
                other.shape(),
            ));
        }
        for (target, &value) in self.data_mut().iter_mut().zip(other.iter()) {
            *target = target.plus(value);
        }
        Ok(())
    }

    /// `self *= factor`, detaching first
    pub fn scale_in_place(&mut self, factor: T) {
        for target in self.data_mut().iter_mut() {
            *target = target.times(factor);
        }
    }
}

impl<T: Arithmetic + Field> Matrix<T> {
    pub fn divide_scalar(&self, divisor: T) -> Self {
        self.map(|value| value / divisor)
    }
}

impl<T: Arithmetic> Add for &Matrix<T> {
    type Output = ValueResult<Matrix<T>>;

    fn add(self, rhs: Self) -> Self::Output {
        self.checked_add(rhs)
    }
}

impl<T: Arithmetic> Sub for &Matrix<T> {
    type Output = ValueResult<Matrix<T>>;

    fn sub(self, rhs: Self) -> Self::Output {
        self.checked_sub(rhs)
    }
}

impl<T: Arithmetic> Mul for &Matrix<T> {
    type Output = ValueResult<Matrix<T>>;

    fn mul(self, rhs: Self) -> Self::Output {
        self.checked_mul(rhs)
    }
}

impl<T: Arithmetic> Neg for &Matrix<T> {
    type Output = Matrix<T>;

    fn neg(self) -> Self::Output {
        self.negate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{MatrixComplex, MatrixInteger, MatrixReal};

    #[test]
    fn elementwise_arithmetic() {
        let a = MatrixInteger::from_row_major(2, 2, &[1, 2, 3, 4]).unwrap();
        let b = MatrixInteger::ones(2, 2);
        assert_eq!(
            (&a + &b).unwrap(),
            MatrixInteger::from_row_major(2, 2, &[2, 3, 4, 5]).unwrap()
        );
        assert_eq!(
            (&a - &b).unwrap(),
            MatrixInteger::from_row_major(2, 2, &[0, 1, 2, 3]).unwrap()
        );
        assert_eq!(-&a, a.scale(-1));
        assert!(matches!(
            &a + &MatrixInteger::ones(1, 2),
            Err(ValueError::IncompatibleMatrixDimensions { .. })
        ));
    }

    #[test]
    fn matrix_product() {
        let a = MatrixReal::from_row_major(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let b = MatrixReal::from_row_major(3, 1, &[1.0, 0.0, -1.0]).unwrap();
        assert_eq!(
            a.checked_mul(&b).unwrap(),
            MatrixReal::column_vector(vec![-2.0, -2.0])
        );
        assert_eq!(
            b.checked_mul(&a),
            Err(ValueError::incompatible_dimensions((3, 1), (2, 3)))
        );
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let a = MatrixInteger::filled(1, 1, i64::MAX);
        let b = MatrixInteger::ones(1, 1);
        assert_eq!((&a + &b).unwrap().at(1, 1), Ok(i64::MIN));
    }

    #[test]
    fn in_place_ops_detach() {
        let original = MatrixComplex::ones(1, 2);
        let mut copy = original.clone();
        copy.scale_in_place(Complex::new(0.0, 1.0));
        copy.add_in_place(&MatrixComplex::ones(1, 2)).unwrap();
        assert_eq!(original, MatrixComplex::ones(1, 2));
        assert_eq!(copy.at(1, 2), Ok(Complex::new(1.0, 1.0)));
        assert!(copy.add_in_place(&MatrixComplex::ones(2, 2)).is_err());
    }

    #[test]
    fn division_by_scalar() {
        let m = MatrixReal::column_vector(vec![2.0, 4.0]);
        assert_eq!(m.divide_scalar(2.0), MatrixReal::column_vector(vec![1.0, 2.0]));
        assert_eq!(m.divide_scalar(0.0).at(1, 1), Ok(f64::INFINITY));
    }
}
