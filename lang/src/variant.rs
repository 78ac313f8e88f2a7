use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{ValueError, ValueResult};
use crate::hash::{
    FnvHasher, canonical_real_bits, hash_boolean, hash_complex, hash_integer, hash_real,
};
use crate::kind::{Kind, join};
use crate::matrix::{Coefficient, Matrix, MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal};
use crate::scalar::{
    Boolean, Complex, Integer, Real, boolean_to_integer, complex_to_boolean, complex_to_integer,
    complex_to_real, format_complex, format_real, integer_to_real, real_to_boolean,
    real_to_complex, real_to_integer,
};
use crate::set::Set;
use crate::tuple::Tuple;

/// A value of any kind in the closed kind set
///
/// Containers share their payload with clones and detach on write, so
/// cloning a `Variant` is cheap regardless of kind.
#[derive(Clone, Debug, Default)]
pub enum Variant {
    #[default]
    None,
    Boolean(Boolean),
    Integer(Integer),
    Real(Real),
    Complex(Complex),
    Set(Set),
    Tuple(Tuple),
    MatrixBoolean(MatrixBoolean),
    MatrixInteger(MatrixInteger),
    MatrixReal(MatrixReal),
    MatrixComplex(MatrixComplex),
}

impl Variant {
    pub fn kind(&self) -> Kind {
        match self {
            Variant::None => Kind::None,
            Variant::Boolean(_) => Kind::Boolean,
            Variant::Integer(_) => Kind::Integer,
            Variant::Real(_) => Kind::Real,
            Variant::Complex(_) => Kind::Complex,
            Variant::Set(_) => Kind::Set,
            Variant::Tuple(_) => Kind::Tuple,
            Variant::MatrixBoolean(_) => Kind::MatrixBoolean,
            Variant::MatrixInteger(_) => Kind::MatrixInteger,
            Variant::MatrixReal(_) => Kind::MatrixReal,
            Variant::MatrixComplex(_) => Kind::MatrixComplex,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Variant::None)
    }

    // Coercions. These never fail loudly: `None` means the value has no
    // lossless representation in the target kind.

    pub fn to_boolean(&self) -> Option<Boolean> {
        match self {
            Variant::Boolean(b) => Some(*b),
            Variant::Integer(i) => Some(*i != 0),
            Variant::Real(r) => Some(real_to_boolean(*r)),
            Variant::Complex(c) => Some(complex_to_boolean(*c)),
            Variant::Set(s) => Some(!s.is_empty()),
            Variant::Tuple(t) => Some(!t.is_empty()),
            _ => None,
        }
    }

    pub fn to_integer(&self) -> Option<Integer> {
        match self {
            Variant::Boolean(b) => Some(boolean_to_integer(*b)),
            Variant::Integer(i) => Some(*i),
            Variant::Real(r) => real_to_integer(*r),
            Variant::Complex(c) => complex_to_integer(*c),
            _ => None,
        }
    }

    pub fn to_real(&self) -> Option<Real> {
        match self {
            Variant::Boolean(b) => Some(integer_to_real(boolean_to_integer(*b))),
            Variant::Integer(i) => Some(integer_to_real(*i)),
            Variant::Real(r) => Some(*r),
            Variant::Complex(c) => complex_to_real(*c),
            _ => None,
        }
    }

    pub fn to_complex(&self) -> Option<Complex> {
        match self {
            Variant::Complex(c) => Some(*c),
            other => other.to_real().map(real_to_complex),
        }
    }

    pub fn to_set(&self) -> Option<Set> {
        match self {
            Variant::Set(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn to_tuple(&self) -> Option<Tuple> {
        match self {
            Variant::Tuple(t) => Some(t.clone()),
            _ => None,
        }
    }

    /// Any matrix kind, coefficient by coefficient; scalars never convert
    fn to_matrix<T: Coefficient>(&self) -> Option<Matrix<T>> {
        match self {
            Variant::MatrixBoolean(m) => m.convert(),
            Variant::MatrixInteger(m) => m.convert(),
            Variant::MatrixReal(m) => m.convert(),
            Variant::MatrixComplex(m) => m.convert(),
            _ => None,
        }
    }

    pub fn to_matrix_boolean(&self) -> Option<MatrixBoolean> {
        self.to_matrix()
    }

    pub fn to_matrix_integer(&self) -> Option<MatrixInteger> {
        self.to_matrix()
    }

    pub fn to_matrix_real(&self) -> Option<MatrixReal> {
        self.to_matrix()
    }

    pub fn to_matrix_complex(&self) -> Option<MatrixComplex> {
        self.to_matrix()
    }

    /// The value re-expressed in `target`, if that is lossless
    pub fn convert_to(&self, target: Kind) -> Option<Variant> {
        match target {
            Kind::None => self.is_none().then_some(Variant::None),
            Kind::Variant => Some(self.clone()),
            Kind::Boolean => self.to_boolean().map(Variant::Boolean),
            Kind::Integer => self.to_integer().map(Variant::Integer),
            Kind::Real => self.to_real().map(Variant::Real),
            Kind::Complex => self.to_complex().map(Variant::Complex),
            Kind::Set => self.to_set().map(Variant::Set),
            Kind::Tuple => self.to_tuple().map(Variant::Tuple),
            Kind::MatrixBoolean => self.to_matrix_boolean().map(Variant::MatrixBoolean),
            Kind::MatrixInteger => self.to_matrix_integer().map(Variant::MatrixInteger),
            Kind::MatrixReal => self.to_matrix_real().map(Variant::MatrixReal),
            Kind::MatrixComplex => self.to_matrix_complex().map(Variant::MatrixComplex),
        }
    }

    pub fn can_translate_to(&self, target: Kind) -> bool {
        self.convert_to(target).is_some()
    }

    fn conversion_error(&self, target: Kind) -> ValueError {
        ValueError::conversion(self.kind(), target)
    }

    pub fn as_boolean(&self) -> ValueResult<Boolean> {
        self.to_boolean()
            .ok_or_else(|| self.conversion_error(Kind::Boolean))
    }

    pub fn as_integer(&self) -> ValueResult<Integer> {
        self.to_integer()
            .ok_or_else(|| self.conversion_error(Kind::Integer))
    }

    pub fn as_real(&self) -> ValueResult<Real> {
        self.to_real().ok_or_else(|| self.conversion_error(Kind::Real))
    }

    pub fn as_complex(&self) -> ValueResult<Complex> {
        self.to_complex()
            .ok_or_else(|| self.conversion_error(Kind::Complex))
    }

    pub fn as_set(&self) -> ValueResult<Set> {
        self.to_set().ok_or_else(|| self.conversion_error(Kind::Set))
    }

    pub fn as_tuple(&self) -> ValueResult<Tuple> {
        self.to_tuple().ok_or_else(|| self.conversion_error(Kind::Tuple))
    }

    pub fn as_matrix_boolean(&self) -> ValueResult<MatrixBoolean> {
        self.to_matrix_boolean()
            .ok_or_else(|| self.conversion_error(Kind::MatrixBoolean))
    }

    pub fn as_matrix_integer(&self) -> ValueResult<MatrixInteger> {
        self.to_matrix_integer()
            .ok_or_else(|| self.conversion_error(Kind::MatrixInteger))
    }

    pub fn as_matrix_real(&self) -> ValueResult<MatrixReal> {
        self.to_matrix_real()
            .ok_or_else(|| self.conversion_error(Kind::MatrixReal))
    }

    pub fn as_matrix_complex(&self) -> ValueResult<MatrixComplex> {
        self.to_matrix_complex()
            .ok_or_else(|| self.conversion_error(Kind::MatrixComplex))
    }

    /// Throwing form of [`Variant::convert_to`]
    pub fn coerce_to(&self, target: Kind) -> ValueResult<Variant> {
        self.convert_to(target)
            .ok_or_else(|| self.conversion_error(target))
    }

    fn no_subscripts(&self) -> ValueError {
        ValueError::TypeDoesNotSupportSubscripts { kind: self.kind() }
    }

    /// Element at `(row, column)`; a tuple is a single row
    pub fn at(&self, row: i64, column: i64) -> ValueResult<Variant> {
        match self {
            Variant::MatrixBoolean(m) => m.at(row, column).map(Variant::Boolean),
            Variant::MatrixInteger(m) => m.at(row, column).map(Variant::Integer),
            Variant::MatrixReal(m) => m.at(row, column).map(Variant::Real),
            Variant::MatrixComplex(m) => m.at(row, column).map(Variant::Complex),
            Variant::Tuple(t) if row == 1 => t.at(column).cloned(),
            Variant::Tuple(_) => Err(ValueError::InvalidRow { row, rows: 1 }),
            _ => Err(self.no_subscripts()),
        }
    }

    /// Single-index element: position in a tuple, column-major in a matrix
    pub fn at_index(&self, index: i64) -> ValueResult<Variant> {
        match self {
            Variant::MatrixBoolean(m) => m.at_index(index).map(Variant::Boolean),
            Variant::MatrixInteger(m) => m.at_index(index).map(Variant::Integer),
            Variant::MatrixReal(m) => m.at_index(index).map(Variant::Real),
            Variant::MatrixComplex(m) => m.at_index(index).map(Variant::Complex),
            Variant::Tuple(t) => t.at(index).cloned(),
            _ => Err(self.no_subscripts()),
        }
    }

    /// Write one element in place. Matrices grow to cover the position and
    /// the new value is converted to the coefficient kind before anything is
    /// written.
    pub fn update(&mut self, row: i64, column: i64, value: Variant) -> ValueResult<()> {
        match self {
            Variant::MatrixBoolean(m) => m.update(row, column, coefficient(&value)?),
            Variant::MatrixInteger(m) => m.update(row, column, coefficient(&value)?),
            Variant::MatrixReal(m) => m.update(row, column, coefficient(&value)?),
            Variant::MatrixComplex(m) => m.update(row, column, coefficient(&value)?),
            Variant::Tuple(t) if row == 1 => t.update(column, value),
            Variant::Tuple(_) => Err(ValueError::InvalidRow { row, rows: 1 }),
            _ => Err(self.no_subscripts()),
        }
    }

    pub fn update_index(&mut self, index: i64, value: Variant) -> ValueResult<()> {
        match self {
            Variant::MatrixBoolean(m) => m.update_index(index, coefficient(&value)?),
            Variant::MatrixInteger(m) => m.update_index(index, coefficient(&value)?),
            Variant::MatrixReal(m) => m.update_index(index, coefficient(&value)?),
            Variant::MatrixComplex(m) => m.update_index(index, coefficient(&value)?),
            Variant::Tuple(t) => t.update(index, value),
            _ => Err(self.no_subscripts()),
        }
    }

    /// Ordering after promotion; only defined when both sides join at a
    /// scalar kind, and complex values must have zero imaginary parts.
    pub fn compare(&self, other: &Variant) -> ValueResult<Ordering> {
        let joined = join(self.kind(), other.kind())
            .filter(|kind| kind.is_scalar())
            .ok_or_else(|| {
                ValueError::invalid_parameter(format!(
                    "{} and {} can not be ordered",
                    self.kind(),
                    other.kind()
                ))
            })?;
        match joined {
            Kind::Boolean => Ok(self.as_boolean()?.cmp(&other.as_boolean()?)),
            Kind::Integer => Ok(self.as_integer()?.cmp(&other.as_integer()?)),
            Kind::Real => Ok(OrderedFloat(self.as_real()?).cmp(&OrderedFloat(other.as_real()?))),
            _ => {
                let lhs = self.as_complex()?;
                let rhs = other.as_complex()?;
                if lhs.im != 0.0 || rhs.im != 0.0 {
                    return Err(ValueError::invalid_parameter(
                        "complex values with an imaginary part can not be ordered",
                    ));
                }
                Ok(OrderedFloat(lhs.re).cmp(&OrderedFloat(rhs.re)))
            }
        }
    }

    /// Seeded hash that stirs in the stored kind, so `1` and `1.0` may
    /// differ; containers hash their members with the same seed
    pub fn hash_with_seed(&self, seed: u64) -> u64 {
        let scalar = match self {
            Variant::None => 0,
            Variant::Boolean(b) => hash_boolean(*b, seed),
            Variant::Integer(i) => hash_integer(*i, seed),
            Variant::Real(r) => hash_real(*r, seed),
            Variant::Complex(c) => hash_complex(*c, seed),
            Variant::Set(s) => return s.hash_with_seed(seed),
            Variant::Tuple(t) => return t.hash_with_seed(seed),
            Variant::MatrixBoolean(m) => return m.hash_with_seed(seed),
            Variant::MatrixInteger(m) => return m.hash_with_seed(seed),
            Variant::MatrixReal(m) => return m.hash_with_seed(seed),
            Variant::MatrixComplex(m) => return m.hash_with_seed(seed),
        };
        let mut hasher = FnvHasher::with_seed(seed);
        hasher.write_u8(self.kind().tag());
        hasher.write_u64(scalar);
        hasher.finish()
    }

    /// Seeded hash of the kind-canonical form. Values that are equal after
    /// promotion agree here even when their kinds differ, which makes it the
    /// member hash for sets and tuples.
    pub fn canonical_hash(&self, seed: u64) -> u64 {
        let mut hasher = FnvHasher::with_seed(seed);
        self.hash(&mut hasher);
        hasher.finish()
    }
}

fn coefficient<T: Coefficient>(value: &Variant) -> ValueResult<T> {
    T::from_variant(value).ok_or_else(|| ValueError::conversion(value.kind(), T::COEFFICIENT_KIND))
}

/// Equality after promotion to the join kind. Containers and matrices only
/// equal values of their own kind.
impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        fn both<T: PartialEq>(lhs: Option<T>, rhs: Option<T>) -> bool {
            matches!((lhs, rhs), (Some(a), Some(b)) if a == b)
        }

        match (self, other) {
            (Variant::None, Variant::None) => true,
            (Variant::Set(a), Variant::Set(b)) => a == b,
            (Variant::Tuple(a), Variant::Tuple(b)) => a == b,
            (Variant::MatrixBoolean(a), Variant::MatrixBoolean(b)) => a == b,
            (Variant::MatrixInteger(a), Variant::MatrixInteger(b)) => a == b,
            (Variant::MatrixReal(a), Variant::MatrixReal(b)) => a == b,
            (Variant::MatrixComplex(a), Variant::MatrixComplex(b)) => a == b,
            _ if !(self.kind().is_scalar() && other.kind().is_scalar()) => false,
            _ => match join(self.kind(), other.kind()) {
                Some(Kind::Boolean) => both(self.to_boolean(), other.to_boolean()),
                Some(Kind::Integer) => both(self.to_integer(), other.to_integer()),
                Some(Kind::Real) => both(
                    self.to_real().map(OrderedFloat),
                    other.to_real().map(OrderedFloat),
                ),
                Some(Kind::Complex) => match (self.to_complex(), other.to_complex()) {
                    (Some(a), Some(b)) => a.coefficient_eq(b),
                    _ => false,
                },
                _ => false,
            },
        }
    }
}

impl Eq for Variant {}

/// Past 2^53 an integer can equal a real it does not round-trip through,
/// so such integers hash as the real they promote to
const MAX_EXACT_INTEGER: u64 = 1 << 53;

fn hash_canonical_real<H: Hasher>(value: Real, state: &mut H) {
    match real_to_integer(value) {
        Some(integer) => {
            state.write_u8(Kind::Integer.tag());
            state.write_i64(integer);
        }
        None => {
            state.write_u8(Kind::Real.tag());
            state.write_u64(canonical_real_bits(value));
        }
    }
}

fn hash_matrix<T: Coefficient, H: Hasher>(matrix: &Matrix<T>, state: &mut H) {
    state.write_u8(T::MATRIX_KIND.tag());
    state.write_usize(matrix.rows());
    state.write_usize(matrix.columns());
    for &value in matrix.iter() {
        value.to_variant().hash(state);
    }
}

/// Hashes the kind-canonical form so that values equal under promotion
/// land in the same bucket
impl Hash for Variant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Variant::None => state.write_u8(Kind::None.tag()),
            Variant::Boolean(b) => {
                state.write_u8(Kind::Integer.tag());
                state.write_i64(boolean_to_integer(*b));
            }
            Variant::Integer(i) if i.unsigned_abs() > MAX_EXACT_INTEGER => {
                hash_canonical_real(*i as Real, state)
            }
            Variant::Integer(i) => {
                state.write_u8(Kind::Integer.tag());
                state.write_i64(*i);
            }
            Variant::Real(r) => hash_canonical_real(*r, state),
            Variant::Complex(c) if c.im == 0.0 => hash_canonical_real(c.re, state),
            Variant::Complex(c) => {
                state.write_u8(Kind::Complex.tag());
                state.write_u64(canonical_real_bits(c.re));
                state.write_u64(canonical_real_bits(c.im));
            }
            Variant::Set(s) => {
                state.write_u8(Kind::Set.tag());
                s.hash(state);
            }
            Variant::Tuple(t) => {
                state.write_u8(Kind::Tuple.tag());
                t.hash(state);
            }
            Variant::MatrixBoolean(m) => hash_matrix(m, state),
            Variant::MatrixInteger(m) => hash_matrix(m, state),
            Variant::MatrixReal(m) => hash_matrix(m, state),
            Variant::MatrixComplex(m) => hash_matrix(m, state),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::None => write!(f, "none"),
            Variant::Boolean(b) => write!(f, "{b}"),
            Variant::Integer(i) => write!(f, "{i}"),
            Variant::Real(r) => f.write_str(&format_real(*r)),
            Variant::Complex(c) => f.write_str(&format_complex(*c)),
            Variant::Set(s) => write!(f, "{s}"),
            Variant::Tuple(t) => write!(f, "{t}"),
            Variant::MatrixBoolean(m) => write!(f, "{m}"),
            Variant::MatrixInteger(m) => write!(f, "{m}"),
            Variant::MatrixReal(m) => write!(f, "{m}"),
            Variant::MatrixComplex(m) => write!(f, "{m}"),
        }
    }
}

impl From<Boolean> for Variant {
    fn from(value: Boolean) -> Self {
        Variant::Boolean(value)
    }
}

impl From<Integer> for Variant {
    fn from(value: Integer) -> Self {
        Variant::Integer(value)
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Variant::Integer(Integer::from(value))
    }
}

impl From<Real> for Variant {
    fn from(value: Real) -> Self {
        Variant::Real(value)
    }
}

impl From<Complex> for Variant {
    fn from(value: Complex) -> Self {
        Variant::Complex(value)
    }
}

impl From<Set> for Variant {
    fn from(value: Set) -> Self {
        Variant::Set(value)
    }
}

impl From<Tuple> for Variant {
    fn from(value: Tuple) -> Self {
        Variant::Tuple(value)
    }
}

/// Strings are tuples of code points
impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::Tuple(Tuple::from_text(value))
    }
}

impl<T: Coefficient> From<Matrix<T>> for Variant {
    fn from(value: Matrix<T>) -> Self {
        T::into_matrix_variant(value)
    }
}
