//! Conversions between the four matrix kinds
//!
//! Widening is always lossless. Narrowing applies the scalar conversion rules
//! to each coefficient and fails for the whole matrix when any one of them
//! does not convert.

use std::any::Any;

use super::{Coefficient, Matrix, MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal};
use crate::error::{ValueError, ValueResult};

impl<T: Coefficient> Matrix<T> {
    /// Coefficient-wise coercion to another matrix kind. Converting to the
    /// same kind shares the buffer.
    pub fn convert<U: Coefficient>(&self) -> Option<Matrix<U>> {
        if let Some(same) = (self as &dyn Any).downcast_ref::<Matrix<U>>() {
            return Some(same.clone());
        }
        let data = self
            .iter()
            .map(|&value| U::from_variant(&value.to_variant()))
            .collect::<Option<Vec<U>>>()?;
        Some(Matrix::from_parts(self.rows(), self.columns(), data))
    }

    /// Like [`Matrix::convert`], reporting a failed coercion as an error
    pub fn try_convert<U: Coefficient>(&self) -> ValueResult<Matrix<U>> {
        self.convert()
            .ok_or_else(|| ValueError::conversion(T::MATRIX_KIND, U::MATRIX_KIND))
    }

    pub fn to_matrix_boolean(&self) -> Option<MatrixBoolean> {
        self.convert()
    }

    pub fn to_matrix_integer(&self) -> Option<MatrixInteger> {
        self.convert()
    }

    pub fn to_matrix_real(&self) -> Option<MatrixReal> {
        self.convert()
    }

    pub fn to_matrix_complex(&self) -> Option<MatrixComplex> {
        self.convert()
    }
}
