//! Runtime value layer for a numerical modeling language
//!
//! A [`Variant`] holds one value of a closed set of kinds: none, the four
//! scalars (boolean, integer, real, complex), [`Set`], [`Tuple`] and the four
//! matrix kinds. Mixed-kind operations promote through the join table in
//! [`kind`] and are dispatched by [`dispatch`]. Containers are shared between
//! clones and copied on write.

pub mod dispatch;
pub mod error;
pub mod hash;
pub mod kernel;
pub mod kind;
pub mod matrix;
pub mod range;
pub mod scalar;
pub mod set;
pub mod tuple;
pub mod variant;


pub use dispatch::{BinaryOperator, UnaryOperator, binary, unary};
pub use error::{ErrorCategory, ValueError, ValueResult};
pub use hash::DEFAULT_HASH_SEED;
pub use kind::{Kind, join};
pub use matrix::io::{MATRIX_FILE_MAGIC, MatrixFileFormat, read_matrix_file};
pub use matrix::linalg::DEFAULT_RELATIVE_TOLERANCE;
pub use matrix::{
    Coefficient, Matrix, MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal, StorageLayout,
};
pub use range::Range;
pub use scalar::{Boolean, Complex, Integer, Real};
pub use set::Set;
pub use tuple::Tuple;
pub use variant::Variant;
