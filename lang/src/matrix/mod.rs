//! Dense column-major matrices with copy-on-write storage
//!
//! The four matrix kinds are one generic [`Matrix`] over a [`Coefficient`].
//! Clones share the coefficient buffer through an `Arc`; every mutating
//! method validates its arguments first and then detaches with
//! `Arc::make_mut`, so a failed mutation never leaves a half-written matrix
//! and writes never leak into other sharers.

pub mod convert;
pub mod io;
pub mod linalg;
pub mod ops;

use ordered_float::OrderedFloat;
use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;
use tracing::trace;

use crate::error::{ValueError, ValueResult};
use crate::hash::FnvHasher;
use crate::kind::Kind;
use crate::range::Range;
use crate::scalar::{Boolean, Complex, Integer, Real, format_complex, format_real};
use crate::variant::Variant;

pub type MatrixBoolean = Matrix<Boolean>;
pub type MatrixInteger = Matrix<Integer>;
pub type MatrixReal = Matrix<Real>;
pub type MatrixComplex = Matrix<Complex>;

/// Storage layout tag. Only dense storage is implemented; the sparse tag is
/// reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageLayout {
    Dense,
    Sparse,
}

/// A scalar kind that can be stored in a matrix
pub trait Coefficient: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    const COEFFICIENT_KIND: Kind;
    const MATRIX_KIND: Kind;
    const ZERO: Self;
    const ONE: Self;

    /// Multiplication as used by the Hadamard and Kronecker products;
    /// logical and for booleans
    fn product(self, other: Self) -> Self;

    fn conjugate(self) -> Self {
        self
    }

    fn to_variant(self) -> Variant;

    /// Lossless coercion of a scalar variant to this coefficient kind
    fn from_variant(value: &Variant) -> Option<Self>;

    /// Total equality: NaN equals NaN and the two zeros are equal
    fn coefficient_eq(self, other: Self) -> bool;

    fn write_hash(self, hasher: &mut FnvHasher);

    fn fmt_coefficient(self, f: &mut fmt::Formatter<'_>) -> fmt::Result;

    fn into_matrix_variant(matrix: Matrix<Self>) -> Variant;

    /// Coerce any matrix variant to a matrix of this coefficient kind
    fn matrix_from_variant(value: &Variant) -> Option<Matrix<Self>>;
}

impl Coefficient for Boolean {
    const COEFFICIENT_KIND: Kind = Kind::Boolean;
    const MATRIX_KIND: Kind = Kind::MatrixBoolean;
    const ZERO: Self = false;
    const ONE: Self = true;

    fn product(self, other: Self) -> Self {
        self && other
    }

    fn to_variant(self) -> Variant {
        Variant::Boolean(self)
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.to_boolean()
    }

    fn coefficient_eq(self, other: Self) -> bool {
        self == other
    }

    fn write_hash(self, hasher: &mut FnvHasher) {
        hasher.write_u8(u8::from(self));
    }

    fn fmt_coefficient(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }

    fn into_matrix_variant(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixBoolean(matrix)
    }

    fn matrix_from_variant(value: &Variant) -> Option<Matrix<Self>> {
        value.to_matrix_boolean()
    }
}

impl Coefficient for Integer {
    const COEFFICIENT_KIND: Kind = Kind::Integer;
    const MATRIX_KIND: Kind = Kind::MatrixInteger;
    const ZERO: Self = 0;
    const ONE: Self = 1;

    fn product(self, other: Self) -> Self {
        self.wrapping_mul(other)
    }

    fn to_variant(self) -> Variant {
        Variant::Integer(self)
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.to_integer()
    }

    fn coefficient_eq(self, other: Self) -> bool {
        self == other
    }

    fn write_hash(self, hasher: &mut FnvHasher) {
        hasher.write_u64(self as u64);
    }

    fn fmt_coefficient(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }

    fn into_matrix_variant(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixInteger(matrix)
    }

    fn matrix_from_variant(value: &Variant) -> Option<Matrix<Self>> {
        value.to_matrix_integer()
    }
}

impl Coefficient for Real {
    const COEFFICIENT_KIND: Kind = Kind::Real;
    const MATRIX_KIND: Kind = Kind::MatrixReal;
    const ZERO: Self = 0.0;
    const ONE: Self = 1.0;

    fn product(self, other: Self) -> Self {
        self * other
    }

    fn to_variant(self) -> Variant {
        Variant::Real(self)
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.to_real()
    }

    fn coefficient_eq(self, other: Self) -> bool {
        OrderedFloat(self) == OrderedFloat(other)
    }

    fn write_hash(self, hasher: &mut FnvHasher) {
        hasher.write_real(self);
    }

    fn fmt_coefficient(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_real(self))
    }

    fn into_matrix_variant(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixReal(matrix)
    }

    fn matrix_from_variant(value: &Variant) -> Option<Matrix<Self>> {
        value.to_matrix_real()
    }
}

impl Coefficient for Complex {
    const COEFFICIENT_KIND: Kind = Kind::Complex;
    const MATRIX_KIND: Kind = Kind::MatrixComplex;
    const ZERO: Self = Complex::new(0.0, 0.0);
    const ONE: Self = Complex::new(1.0, 0.0);

    fn product(self, other: Self) -> Self {
        self * other
    }

    fn conjugate(self) -> Self {
        self.conj()
    }

    fn to_variant(self) -> Variant {
        Variant::Complex(self)
    }

    fn from_variant(value: &Variant) -> Option<Self> {
        value.to_complex()
    }

    fn coefficient_eq(self, other: Self) -> bool {
        OrderedFloat(self.re) == OrderedFloat(other.re)
            && OrderedFloat(self.im) == OrderedFloat(other.im)
    }

    fn write_hash(self, hasher: &mut FnvHasher) {
        hasher.write_complex(self);
    }

    fn fmt_coefficient(self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_complex(self))
    }

    fn into_matrix_variant(matrix: Matrix<Self>) -> Variant {
        Variant::MatrixComplex(matrix)
    }

    fn matrix_from_variant(value: &Variant) -> Option<Matrix<Self>> {
        value.to_matrix_complex()
    }
}

/// Dense column-major matrix with 1-based public indexing
#[derive(Clone, Debug)]
pub struct Matrix<T> {
    rows: usize,
    columns: usize,
    data: Arc<Vec<T>>,
}

impl<T: Coefficient> Matrix<T> {
    /// Zero-filled `rows x columns` matrix
    pub fn new(rows: usize, columns: usize) -> Self {
        Self::filled(rows, columns, T::ZERO)
    }

    pub fn zero(rows: usize, columns: usize) -> Self {
        Self::new(rows, columns)
    }

    pub fn ones(rows: usize, columns: usize) -> Self {
        Self::filled(rows, columns, T::ONE)
    }

    pub fn filled(rows: usize, columns: usize, value: T) -> Self {
        Self {
            rows,
            columns,
            data: Arc::new(vec![value; rows * columns]),
        }
    }

    /// Ones on the `min(rows, columns)` leading diagonal positions
    pub fn identity(rows: usize, columns: usize) -> Self {
        let mut data = vec![T::ZERO; rows * columns];
        for i in 0..rows.min(columns) {
            data[i + i * rows] = T::ONE;
        }
        Self::from_parts(rows, columns, data)
    }

    /// Wrap a caller buffer laid out column by column
    pub fn from_column_major(rows: usize, columns: usize, data: Vec<T>) -> ValueResult<Self> {
        if data.len() != rows * columns {
            return Err(ValueError::InvalidMatrixDimensions { rows, columns });
        }
        Ok(Self::from_parts(rows, columns, data))
    }

    /// Build from coefficients listed row by row, as matrices are written
    pub fn from_row_major(rows: usize, columns: usize, values: &[T]) -> ValueResult<Self> {
        if values.len() != rows * columns {
            return Err(ValueError::InvalidMatrixDimensions { rows, columns });
        }
        let mut data = Vec::with_capacity(values.len());
        for column in 0..columns {
            for row in 0..rows {
                data.push(values[row * columns + column]);
            }
        }
        Ok(Self::from_parts(rows, columns, data))
    }

    /// Column vector holding `values`
    pub fn column_vector(values: Vec<T>) -> Self {
        let rows = values.len();
        Self::from_parts(rows, 1, values)
    }

    pub(crate) fn from_parts(rows: usize, columns: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), rows * columns);
        Self {
            rows,
            columns,
            data: Arc::new(data),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Number of coefficients
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.columns
    }

    /// A single row or a single column
    pub fn is_vector(&self) -> bool {
        self.rows == 1 || self.columns == 1
    }

    pub fn layout(&self) -> StorageLayout {
        StorageLayout::Dense
    }

    /// Coefficients in column-major order
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Number of matrices currently sharing this coefficient buffer
    pub fn sharer_count(&self) -> usize {
        Arc::strong_count(&self.data)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.data.iter()
    }

    #[inline]
    pub(crate) fn get(&self, row: usize, column: usize) -> T {
        self.data[row + column * self.rows]
    }

    /// Unique access to the coefficients, copying them first when shared
    fn data_mut(&mut self) -> &mut Vec<T> {
        if Arc::strong_count(&self.data) > 1 {
            trace!(
                rows = self.rows,
                columns = self.columns,
                "detaching shared matrix buffer"
            );
        }
        Arc::make_mut(&mut self.data)
    }

    fn row_offset(&self, row: i64) -> ValueResult<usize> {
        if row < 1 || row as u64 > self.rows as u64 {
            return Err(ValueError::InvalidRow {
                row,
                rows: self.rows,
            });
        }
        Ok((row - 1) as usize)
    }

    fn column_offset(&self, column: i64) -> ValueResult<usize> {
        if column < 1 || column as u64 > self.columns as u64 {
            return Err(ValueError::InvalidColumn {
                column,
                columns: self.columns,
            });
        }
        Ok((column - 1) as usize)
    }

    /// Single 1-based index walking down each column in turn
    fn index_offset(&self, index: i64) -> ValueResult<usize> {
        if index < 1 || index as u64 > self.len() as u64 {
            return Err(ValueError::InvalidIndex {
                index,
                length: self.len(),
            });
        }
        Ok((index - 1) as usize)
    }

    pub fn at(&self, row: i64, column: i64) -> ValueResult<T> {
        let row = self.row_offset(row)?;
        let column = self.column_offset(column)?;
        Ok(self.get(row, column))
    }

    /// Single-index access: 1 is (1, 1), 2 is (2, 1), and so on down each
    /// column
    pub fn at_index(&self, index: i64) -> ValueResult<T> {
        let offset = self.index_offset(index)?;
        Ok(self.data[offset])
    }

    /// Write a coefficient, growing the matrix to cover `(row, column)`
    pub fn update(&mut self, row: i64, column: i64, value: T) -> ValueResult<()> {
        if row < 1 {
            return Err(ValueError::InvalidRow {
                row,
                rows: self.rows,
            });
        }
        if column < 1 {
            return Err(ValueError::InvalidColumn {
                column,
                columns: self.columns,
            });
        }
        let row = (row - 1) as usize;
        let column = (column - 1) as usize;
        if row >= self.rows || column >= self.columns {
            let rows = self.rows.max(row.saturating_add(1));
            let columns = self.columns.max(column.saturating_add(1));
            self.resize(rows, columns)?;
        }
        let rows = self.rows;
        self.data_mut()[row + column * rows] = value;
        Ok(())
    }

    /// Single-index write. An index past the end grows a column vector (or
    /// an empty matrix) downwards and a row vector to the right.
    pub fn update_index(&mut self, index: i64, value: T) -> ValueResult<()> {
        if index < 1 {
            return Err(ValueError::InvalidIndex {
                index,
                length: self.len(),
            });
        }
        let offset = (index - 1) as usize;
        if offset < self.len() {
            self.data_mut()[offset] = value;
            return Ok(());
        }
        if self.columns == 1 || self.is_empty() {
            self.resize(offset.saturating_add(1), 1)?;
            self.data_mut()[offset] = value;
            Ok(())
        } else if self.rows == 1 {
            self.resize(1, offset.saturating_add(1))?;
            self.data_mut()[offset] = value;
            Ok(())
        } else {
            Err(ValueError::InvalidIndex {
                index,
                length: self.len(),
            })
        }
    }

    /// Bounds-checked write that never resizes
    pub fn set_value(&mut self, row: i64, column: i64, value: T) -> ValueResult<()> {
        let row = self.row_offset(row)?;
        let column = self.column_offset(column)?;
        let rows = self.rows;
        self.data_mut()[row + column * rows] = value;
        Ok(())
    }

    /// Change the dimensions, keeping coefficients at their (row, column)
    /// positions and zero-filling new ones. The matrix is left untouched
    /// when the new buffer can not be allocated.
    pub fn resize(&mut self, rows: usize, columns: usize) -> ValueResult<()> {
        if (rows, columns) == self.shape() {
            return Ok(());
        }
        let length = rows
            .checked_mul(columns)
            .ok_or(ValueError::InsufficientMemory)?;
        let bytes = length
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(ValueError::InsufficientMemory)?;
        let mut data = Vec::new();
        data.try_reserve_exact(length)
            .map_err(|_| ValueError::MemoryAllocationError { bytes })?;
        data.resize(length, T::ZERO);
        for column in 0..columns.min(self.columns) {
            for row in 0..rows.min(self.rows) {
                data[row + column * rows] = self.get(row, column);
            }
        }
        self.rows = rows;
        self.columns = columns;
        self.data = Arc::new(data);
        Ok(())
    }

    /// Coefficients selected by a row range and a column range
    pub fn submatrix(&self, rows: &Range, columns: &Range) -> ValueResult<Self> {
        let row_offsets = rows
            .iter()
            .map(|row| self.row_offset(row))
            .collect::<ValueResult<Vec<_>>>()?;
        let column_offsets = columns
            .iter()
            .map(|column| self.column_offset(column))
            .collect::<ValueResult<Vec<_>>>()?;

        let mut data = Vec::with_capacity(row_offsets.len() * column_offsets.len());
        for &column in &column_offsets {
            for &row in &row_offsets {
                data.push(self.get(row, column));
            }
        }
        Ok(Self::from_parts(row_offsets.len(), column_offsets.len(), data))
    }

    /// Row `row` as a 1 x C matrix
    pub fn row(&self, row: i64) -> ValueResult<Self> {
        let row = self.row_offset(row)?;
        let data = (0..self.columns).map(|column| self.get(row, column)).collect();
        Ok(Self::from_parts(1, self.columns, data))
    }

    /// Column `column` as an R x 1 matrix
    pub fn column(&self, column: i64) -> ValueResult<Self> {
        let column = self.column_offset(column)?;
        let start = column * self.rows;
        let data = self.data[start..start + self.rows].to_vec();
        Ok(Self::from_parts(self.rows, 1, data))
    }

    /// Column vector of the `min(R, C)` diagonal coefficients
    pub fn diagonal_entries(&self) -> Self {
        let size = self.rows.min(self.columns);
        Self::column_vector((0..size).map(|i| self.get(i, i)).collect())
    }

    /// Square matrix with this vector on its diagonal
    pub fn diagonal(&self) -> ValueResult<Self> {
        if !self.is_vector() {
            return Err(ValueError::InvalidMatrixDimensions {
                rows: self.rows,
                columns: self.columns,
            });
        }
        let size = self.len();
        let mut data = vec![T::ZERO; size * size];
        for (i, &value) in self.data.iter().enumerate() {
            data[i + i * size] = value;
        }
        Ok(Self::from_parts(size, size, data))
    }

    /// `[self other]`
    pub fn combine_left_to_right(&self, other: &Self) -> ValueResult<Self> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.rows != other.rows {
            return Err(ValueError::incompatible_dimensions(
                self.shape(),
                other.shape(),
            ));
        }
        let mut data = Vec::with_capacity(self.len() + other.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(Self::from_parts(self.rows, self.columns + other.columns, data))
    }

    /// `[self; other]`
    pub fn combine_top_to_bottom(&self, other: &Self) -> ValueResult<Self> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.columns != other.columns {
            return Err(ValueError::incompatible_dimensions(
                self.shape(),
                other.shape(),
            ));
        }
        let rows = self.rows + other.rows;
        let mut data = Vec::with_capacity(self.len() + other.len());
        for column in 0..self.columns {
            data.extend_from_slice(&self.data[column * self.rows..(column + 1) * self.rows]);
            data.extend_from_slice(&other.data[column * other.rows..(column + 1) * other.rows]);
        }
        Ok(Self::from_parts(rows, self.columns, data))
    }

    /// Rows in reverse order
    pub fn row_reverse(&self) -> Self {
        let mut data = Vec::with_capacity(self.len());
        for column in 0..self.columns {
            for row in (0..self.rows).rev() {
                data.push(self.get(row, column));
            }
        }
        Self::from_parts(self.rows, self.columns, data)
    }

    /// Columns in reverse order
    pub fn column_reverse(&self) -> Self {
        let mut data = Vec::with_capacity(self.len());
        for column in (0..self.columns).rev() {
            data.extend_from_slice(&self.data[column * self.rows..(column + 1) * self.rows]);
        }
        Self::from_parts(self.rows, self.columns, data)
    }

    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.len());
        for row in 0..self.rows {
            for column in 0..self.columns {
                data.push(self.get(row, column));
            }
        }
        Self::from_parts(self.columns, self.rows, data)
    }

    /// Coefficient-wise conjugate; the identity except for complex matrices
    pub fn conj(&self) -> Self {
        self.map(T::conjugate)
    }

    /// Conjugate transpose
    pub fn adjoint(&self) -> Self {
        self.transpose().conj()
    }

    pub fn map<U: Coefficient>(&self, f: impl Fn(T) -> U) -> Matrix<U> {
        Matrix::from_parts(self.rows, self.columns, self.data.iter().map(|&v| f(v)).collect())
    }

    /// Combine two equally shaped matrices coefficient by coefficient
    pub fn zip_with(&self, other: &Self, f: impl Fn(T, T) -> T) -> ValueResult<Self> {
        if self.shape() != other.shape() {
            return Err(ValueError::incompatible_dimensions(
                self.shape(),
                other.shape(),
            ));
        }
        let data = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self::from_parts(self.rows, self.columns, data))
    }

    /// Element-wise product
    pub fn hadamard(&self, other: &Self) -> ValueResult<Self> {
        self.zip_with(other, T::product)
    }

    /// Block product: block `(i, j)` is `self[i, j] * other`
    pub fn kronecker(&self, other: &Self) -> Self {
        let rows = self.rows * other.rows;
        let columns = self.columns * other.columns;
        let mut data = vec![T::ZERO; rows * columns];
        for a_column in 0..self.columns {
            for a_row in 0..self.rows {
                let factor = self.get(a_row, a_column);
                for b_column in 0..other.columns {
                    let column = a_column * other.columns + b_column;
                    for b_row in 0..other.rows {
                        let row = a_row * other.rows + b_row;
                        data[row + column * rows] = factor.product(other.get(b_row, b_column));
                    }
                }
            }
        }
        Self::from_parts(rows, columns, data)
    }

    /// Seeded hash: kind tag, dimensions, then coefficients column by column
    pub fn hash_with_seed(&self, seed: u64) -> u64 {
        let mut hasher = FnvHasher::with_seed(seed);
        hasher.write_u8(T::MATRIX_KIND.tag());
        hasher.write_u64(self.rows as u64);
        hasher.write_u64(self.columns as u64);
        for &value in self.data.iter() {
            value.write_hash(&mut hasher);
        }
        hasher.finish()
    }
}

impl<T: Coefficient> PartialEq for Matrix<T> {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && (Arc::ptr_eq(&self.data, &other.data)
                || self
                    .data
                    .iter()
                    .zip(other.data.iter())
                    .all(|(&a, &b)| a.coefficient_eq(b)))
    }
}

impl<T: Coefficient> Eq for Matrix<T> {}

impl<T: Coefficient> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for row in 0..self.rows {
            if row > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for column in 0..self.columns {
                if column > 0 {
                    write!(f, ", ")?;
                }
                self.get(row, column).fmt_coefficient(f)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}
