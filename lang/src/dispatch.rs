//! Operator dispatch
//!
//! Every binary operator follows the same path: join the two kinds, coerce
//! both operands to the join, run the typed implementation, and wrap the
//! result. Arithmetic runs one level above the join when the join is
//! boolean (and two levels for division on integers), see
//! [`Kind::arithmetic_kind`] and [`Kind::division_kind`].

use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Not, Sub};
use tracing::trace;

use crate::error::{ValueError, ValueResult};
use crate::kernel::Field;
use crate::kind::{Kind, join};
use crate::matrix::ops::Arithmetic;
use crate::matrix::{Coefficient, Matrix};
use crate::scalar::{Complex, Integer, Real};
use crate::variant::Variant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Less => "<",
            BinaryOperator::Greater => ">",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
            UnaryOperator::Not => "!",
        })
    }
}

fn undefined(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ValueError {
    ValueError::invalid_parameter(format!(
        "{} {op} {} is not defined",
        lhs.kind(),
        rhs.kind()
    ))
}

/// Apply a binary operator to two values of any kinds
pub fn binary(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ValueResult<Variant> {
    trace!(%op, lhs = %lhs.kind(), rhs = %rhs.kind(), "dispatching binary operator");
    match op {
        BinaryOperator::Equal => Ok(Variant::Boolean(lhs == rhs)),
        BinaryOperator::NotEqual => Ok(Variant::Boolean(lhs != rhs)),
        BinaryOperator::Less => lhs.compare(rhs).map(|o| Variant::Boolean(o.is_lt())),
        BinaryOperator::Greater => lhs.compare(rhs).map(|o| Variant::Boolean(o.is_gt())),
        BinaryOperator::LessEqual => lhs.compare(rhs).map(|o| Variant::Boolean(o.is_le())),
        BinaryOperator::GreaterEqual => lhs.compare(rhs).map(|o| Variant::Boolean(o.is_ge())),
        BinaryOperator::And | BinaryOperator::Or => logical(op, lhs, rhs),
        BinaryOperator::Add
        | BinaryOperator::Subtract
        | BinaryOperator::Multiply
        | BinaryOperator::Divide => arithmetic(op, lhs, rhs),
    }
}

/// Truth value of a logical operand; matrices and `none` have none
fn truth(op: BinaryOperator, value: &Variant, other: &Variant) -> ValueResult<bool> {
    if value.kind().is_matrix() || value.is_none() {
        return Err(undefined(op, value, other));
    }
    value.as_boolean()
}

fn logical(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ValueResult<Variant> {
    let a = truth(op, lhs, rhs)?;
    let b = truth(op, rhs, lhs)?;
    Ok(Variant::Boolean(match op {
        BinaryOperator::And => a && b,
        _ => a || b,
    }))
}

fn arithmetic(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ValueResult<Variant> {
    let joined = join(lhs.kind(), rhs.kind()).ok_or_else(|| undefined(op, lhs, rhs))?;
    match joined {
        Kind::Set => set_arithmetic(op, lhs, rhs),
        Kind::Tuple => tuple_arithmetic(op, lhs, rhs),
        kind if kind.is_scalar() => scalar_arithmetic(op, kind, lhs, rhs),
        kind if kind.is_matrix() => matrix_arithmetic(op, kind, lhs, rhs),
        _ => Err(undefined(op, lhs, rhs)),
    }
}

fn set_arithmetic(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ValueResult<Variant> {
    let a = lhs.as_set()?;
    let b = rhs.as_set()?;
    match op {
        BinaryOperator::Add => Ok(Variant::Set(a.union(&b))),
        BinaryOperator::Subtract => Ok(Variant::Set(a.difference(&b))),
        BinaryOperator::Multiply => Ok(Variant::Set(a.intersection(&b))),
        _ => Err(undefined(op, lhs, rhs)),
    }
}

fn tuple_arithmetic(op: BinaryOperator, lhs: &Variant, rhs: &Variant) -> ValueResult<Variant> {
    let a = lhs.as_tuple()?;
    let b = rhs.as_tuple()?;
    match op {
        BinaryOperator::Multiply => Ok(Variant::Tuple(a.concat(&b))),
        BinaryOperator::Divide => a.split(&b).map(Variant::Tuple),
        _ => Err(undefined(op, lhs, rhs)),
    }
}

/// `+ - *` on one coefficient kind
fn ring<T: Arithmetic>(op: BinaryOperator, a: T, b: T) -> ValueResult<T> {
    match op {
        BinaryOperator::Add => Ok(a.plus(b)),
        BinaryOperator::Subtract => Ok(a.minus(b)),
        BinaryOperator::Multiply => Ok(a.times(b)),
        _ => Err(ValueError::InternalError(format!(
            "{op} is not a ring operator"
        ))),
    }
}

fn scalar_arithmetic(
    op: BinaryOperator,
    joined: Kind,
    lhs: &Variant,
    rhs: &Variant,
) -> ValueResult<Variant> {
    let divide = op == BinaryOperator::Divide;
    let kind = if divide {
        joined.division_kind()
    } else {
        joined.arithmetic_kind()
    };
    match kind {
        Kind::Real if divide => Ok(Variant::Real(lhs.as_real()? / rhs.as_real()?)),
        Kind::Complex if divide => Ok(Variant::Complex(lhs.as_complex()? / rhs.as_complex()?)),
        Kind::Integer => ring::<Integer>(op, lhs.as_integer()?, rhs.as_integer()?).map(Variant::Integer),
        Kind::Real => ring::<Real>(op, lhs.as_real()?, rhs.as_real()?).map(Variant::Real),
        Kind::Complex => {
            ring::<Complex>(op, lhs.as_complex()?, rhs.as_complex()?).map(Variant::Complex)
        }
        _ => Err(undefined(op, lhs, rhs)),
    }
}

/// One side of a mixed scalar/matrix operation, coerced to coefficient `T`
enum Operand<T> {
    Scalar(T),
    Matrix(Matrix<T>),
}

impl<T: Coefficient> Operand<T> {
    fn coerce(value: &Variant) -> ValueResult<Self> {
        if value.kind().is_matrix() {
            T::matrix_from_variant(value)
                .map(Operand::Matrix)
                .ok_or_else(|| ValueError::conversion(value.kind(), T::MATRIX_KIND))
        } else {
            T::from_variant(value)
                .map(Operand::Scalar)
                .ok_or_else(|| ValueError::conversion(value.kind(), T::COEFFICIENT_KIND))
        }
    }
}

fn matrix_ring<T: Arithmetic>(
    op: BinaryOperator,
    lhs: &Variant,
    rhs: &Variant,
) -> ValueResult<Matrix<T>> {
    match (op, Operand::<T>::coerce(lhs)?, Operand::<T>::coerce(rhs)?) {
        (BinaryOperator::Add, Operand::Matrix(a), Operand::Matrix(b)) => a.checked_add(&b),
        (BinaryOperator::Subtract, Operand::Matrix(a), Operand::Matrix(b)) => a.checked_sub(&b),
        (BinaryOperator::Multiply, Operand::Matrix(a), Operand::Matrix(b)) => a.checked_mul(&b),
        (BinaryOperator::Multiply, Operand::Scalar(s), Operand::Matrix(m)) => {
            Ok(m.map(|value| s.times(value)))
        }
        (BinaryOperator::Multiply, Operand::Matrix(m), Operand::Scalar(s)) => Ok(m.scale(s)),
        _ => Err(undefined(op, lhs, rhs)),
    }
}

fn matrix_division<T: Arithmetic + Field>(lhs: &Variant, rhs: &Variant) -> ValueResult<Matrix<T>> {
    match (Operand::<T>::coerce(lhs)?, Operand::<T>::coerce(rhs)?) {
        (Operand::Matrix(m), Operand::Scalar(s)) => Ok(m.divide_scalar(s)),
        _ => Err(undefined(BinaryOperator::Divide, lhs, rhs)),
    }
}

fn matrix_arithmetic(
    op: BinaryOperator,
    joined: Kind,
    lhs: &Variant,
    rhs: &Variant,
) -> ValueResult<Variant> {
    if op == BinaryOperator::Divide {
        return match joined.division_kind() {
            Kind::MatrixReal => matrix_division::<Real>(lhs, rhs).map(Variant::from),
            Kind::MatrixComplex => matrix_division::<Complex>(lhs, rhs).map(Variant::from),
            _ => Err(undefined(op, lhs, rhs)),
        };
    }
    match joined.arithmetic_kind() {
        Kind::MatrixInteger => matrix_ring::<Integer>(op, lhs, rhs).map(Variant::from),
        Kind::MatrixReal => matrix_ring::<Real>(op, lhs, rhs).map(Variant::from),
        Kind::MatrixComplex => matrix_ring::<Complex>(op, lhs, rhs).map(Variant::from),
        _ => Err(undefined(op, lhs, rhs)),
    }
}

fn not_defined(op: UnaryOperator, operand: &Variant) -> ValueError {
    ValueError::invalid_parameter(format!("{op}{} is not defined", operand.kind()))
}

fn is_zero<T: Coefficient>(matrix: &Matrix<T>) -> Matrix<bool> {
    matrix.map(|value| value == T::ZERO)
}

/// Apply a unary operator; `!` on a matrix is element-wise
pub fn unary(op: UnaryOperator, operand: &Variant) -> ValueResult<Variant> {
    trace!(%op, operand = %operand.kind(), "dispatching unary operator");
    match (op, operand) {
        (UnaryOperator::Not, Variant::MatrixBoolean(m)) => Ok(Variant::from(is_zero(m))),
        (UnaryOperator::Not, Variant::MatrixInteger(m)) => Ok(Variant::from(is_zero(m))),
        (UnaryOperator::Not, Variant::MatrixReal(m)) => Ok(Variant::from(is_zero(m))),
        (UnaryOperator::Not, Variant::MatrixComplex(m)) => Ok(Variant::from(is_zero(m))),
        (UnaryOperator::Not, Variant::None) => Err(not_defined(op, operand)),
        (UnaryOperator::Not, value) => value.as_boolean().map(|b| Variant::Boolean(!b)),

        (_, Variant::Boolean(b)) => {
            let value = Integer::from(*b);
            Ok(Variant::Integer(if op == UnaryOperator::Minus {
                value.wrapping_neg()
            } else {
                value
            }))
        }
        (_, Variant::MatrixBoolean(m)) => {
            let m = m.map(Integer::from);
            Ok(Variant::from(if op == UnaryOperator::Minus {
                m.negate()
            } else {
                m
            }))
        }
        (UnaryOperator::Plus, value) if value.kind().is_scalar() || value.kind().is_matrix() => {
            Ok(value.clone())
        }
        (UnaryOperator::Minus, Variant::Integer(i)) => Ok(Variant::Integer(i.wrapping_neg())),
        (UnaryOperator::Minus, Variant::Real(r)) => Ok(Variant::Real(-r)),
        (UnaryOperator::Minus, Variant::Complex(c)) => Ok(Variant::Complex(-c)),
        (UnaryOperator::Minus, Variant::MatrixInteger(m)) => Ok(Variant::from(m.negate())),
        (UnaryOperator::Minus, Variant::MatrixReal(m)) => Ok(Variant::from(m.negate())),
        (UnaryOperator::Minus, Variant::MatrixComplex(m)) => Ok(Variant::from(m.negate())),
        _ => Err(not_defined(op, operand)),
    }
}

impl Add for &Variant {
    type Output = ValueResult<Variant>;

    fn add(self, rhs: Self) -> Self::Output {
        binary(BinaryOperator::Add, self, rhs)
    }
}

impl Sub for &Variant {
    type Output = ValueResult<Variant>;

    fn sub(self, rhs: Self) -> Self::Output {
        binary(BinaryOperator::Subtract, self, rhs)
    }
}

impl Mul for &Variant {
    type Output = ValueResult<Variant>;

    fn mul(self, rhs: Self) -> Self::Output {
        binary(BinaryOperator::Multiply, self, rhs)
    }
}

impl Div for &Variant {
    type Output = ValueResult<Variant>;

    fn div(self, rhs: Self) -> Self::Output {
        binary(BinaryOperator::Divide, self, rhs)
    }
}

impl Neg for &Variant {
    type Output = ValueResult<Variant>;

    fn neg(self) -> Self::Output {
        unary(UnaryOperator::Minus, self)
    }
}

impl Not for &Variant {
    type Output = ValueResult<Variant>;

    fn not(self) -> Self::Output {
        unary(UnaryOperator::Not, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{MatrixBoolean, MatrixComplex, MatrixInteger, MatrixReal};
    use crate::set::Set;
    use crate::tuple::Tuple;

    fn ints(values: &[i64]) -> Variant {
        Variant::Set(values.iter().map(|&v| Variant::Integer(v)).collect())
    }

    fn tuple(values: &[i64]) -> Variant {
        Variant::Tuple(values.iter().map(|&v| Variant::Integer(v)).collect::<Tuple>())
    }

    fn invalid(result: ValueResult<Variant>) -> bool {
        matches!(result, Err(ValueError::InvalidParameterValue { .. }))
    }

    #[test]
    fn scalar_promotion() {
        let sum = (&Variant::Integer(2) + &Variant::Real(3.5)).unwrap();
        assert_eq!(sum.kind(), Kind::Real);
        assert_eq!(sum.to_real(), Some(5.5));

        let product = (&Variant::Boolean(true) * &Variant::Boolean(true)).unwrap();
        assert_eq!(product, Variant::Integer(1));
        assert_eq!(product.kind(), Kind::Integer);

        let c = (&Variant::Complex(Complex::new(0.0, 1.0)) * &Variant::Integer(2)).unwrap();
        assert_eq!(c, Variant::Complex(Complex::new(0.0, 2.0)));
    }

    #[test]
    fn division_never_traps() {
        let q = (&Variant::Integer(1) / &Variant::Integer(0)).unwrap();
        assert_eq!(q.kind(), Kind::Real);
        assert_eq!(q.to_real(), Some(f64::INFINITY));

        let half = (&Variant::Integer(1) / &Variant::Integer(2)).unwrap();
        assert_eq!(half, Variant::Real(0.5));

        let b = (&Variant::Boolean(true) / &Variant::Boolean(false)).unwrap();
        assert_eq!(b.kind(), Kind::Real);

        let nan = (&Variant::Complex(Complex::new(0.0, 0.0)) / &Variant::Complex(Complex::new(0.0, 0.0)))
            .unwrap()
            .to_complex()
            .unwrap();
        assert!(nan.re.is_nan() && nan.im.is_nan());
    }

    #[test]
    fn integer_arithmetic_wraps() {
        assert_eq!(
            &Variant::Integer(i64::MAX) + &Variant::Integer(1),
            Ok(Variant::Integer(i64::MIN))
        );
        assert_eq!(-&Variant::Integer(i64::MIN), Ok(Variant::Integer(i64::MIN)));
    }

    #[test]
    fn comparisons() {
        let lt = binary(BinaryOperator::Less, &Variant::Integer(1), &Variant::Real(1.5));
        assert_eq!(lt, Ok(Variant::Boolean(true)));
        let ge = binary(BinaryOperator::GreaterEqual, &Variant::Boolean(true), &Variant::Integer(1));
        assert_eq!(ge, Ok(Variant::Boolean(true)));
        assert!(invalid(binary(
            BinaryOperator::Less,
            &Variant::from(MatrixReal::ones(1, 1)),
            &Variant::from(MatrixReal::ones(1, 1)),
        )));
        assert_eq!(
            binary(BinaryOperator::Equal, &Variant::Integer(2), &Variant::Real(2.0)),
            Ok(Variant::Boolean(true))
        );
        assert_eq!(
            binary(BinaryOperator::NotEqual, &ints(&[1]), &tuple(&[1])),
            Ok(Variant::Boolean(true))
        );
    }

    #[test]
    fn logical_operators() {
        assert_eq!(
            binary(BinaryOperator::And, &Variant::Boolean(true), &Variant::Boolean(false)),
            Ok(Variant::Boolean(false))
        );
        assert_eq!(
            binary(BinaryOperator::Or, &Variant::Integer(0), &Variant::Real(0.5)),
            Ok(Variant::Boolean(true))
        );
        assert!(invalid(binary(
            BinaryOperator::And,
            &Variant::Boolean(true),
            &Variant::from(MatrixBoolean::ones(1, 1)),
        )));
        assert!(invalid(binary(BinaryOperator::Or, &Variant::None, &Variant::Boolean(true))));
    }

    #[test]
    fn set_algebra() {
        let a = ints(&[1, 2, 3]);
        let b = ints(&[2, 3, 4]);
        assert_eq!(&a + &b, Ok(ints(&[1, 2, 3, 4])));
        assert_eq!(&a - &b, Ok(ints(&[1])));
        assert_eq!(&a * &b, Ok(ints(&[2, 3])));
        assert!(invalid(&a / &b));
        assert!(invalid(&a + &tuple(&[1])));
        assert!(invalid(&a + &Variant::Integer(1)));
    }

    #[test]
    fn tuple_concatenation_and_division() {
        let a = tuple(&[1, 2, 3]);
        let b = tuple(&[1, 2]);
        let joined = (&a * &b).unwrap();
        assert_eq!(joined, tuple(&[1, 2, 3, 1, 2]));
        assert_eq!(&joined / &b, Ok(a.clone()));
        assert!(invalid(&a / &b));
        assert!(invalid(&a + &b));
    }

    #[test]
    fn scalar_lifts_over_matrices() {
        let m = Variant::from(
            MatrixComplex::from_row_major(
                2,
                2,
                &[
                    Complex::new(1.0, 0.0),
                    Complex::new(2.0, 0.0),
                    Complex::new(3.0, 0.0),
                    Complex::new(4.0, 0.0),
                ],
            )
            .unwrap(),
        );
        let scaled = (&Variant::Boolean(true) * &m).unwrap();
        assert_eq!(scaled.kind(), Kind::MatrixComplex);
        assert_eq!(scaled, m);

        let r = Variant::from(MatrixInteger::from_row_major(1, 2, &[2, 4]).unwrap());
        let halved = (&r / &Variant::Integer(2)).unwrap();
        assert_eq!(
            halved,
            Variant::from(MatrixReal::from_row_major(1, 2, &[1.0, 2.0]).unwrap())
        );
        assert!(invalid(&Variant::Integer(2) / &r));
        assert!(invalid(&r / &r));
        assert!(invalid(&r + &Variant::Integer(1)));
    }

    #[test]
    fn boolean_matrices_lift_to_integer() {
        let b = Variant::from(MatrixBoolean::identity(2, 2));
        let sum = (&b + &b).unwrap();
        assert_eq!(sum.kind(), Kind::MatrixInteger);
        assert_eq!(sum.at(1, 1), Ok(Variant::Integer(2)));

        let product = (&Variant::Boolean(true) * &b).unwrap();
        assert_eq!(product.kind(), Kind::MatrixInteger);
    }

    #[test]
    fn matrix_products_check_shapes() {
        let a = Variant::from(MatrixReal::ones(2, 3));
        let b = Variant::from(MatrixInteger::ones(3, 1));
        let product = (&a * &b).unwrap();
        assert_eq!(product, Variant::from(MatrixReal::filled(2, 1, 3.0)));
        assert!(matches!(
            &b * &a,
            Err(ValueError::IncompatibleMatrixDimensions { .. })
        ));
    }

    #[test]
    fn unary_operators() {
        assert_eq!(-&Variant::Boolean(true), Ok(Variant::Integer(-1)));
        assert_eq!(unary(UnaryOperator::Plus, &Variant::Real(2.0)), Ok(Variant::Real(2.0)));
        assert_eq!(!&Variant::Integer(0), Ok(Variant::Boolean(true)));
        assert_eq!(!&Variant::Set(Set::new()), Ok(Variant::Boolean(true)));
        assert!(invalid(-&ints(&[1])));
        assert!(invalid(!&Variant::None));

        let m = Variant::from(MatrixReal::identity(2, 2));
        assert_eq!(
            !&m,
            Ok(Variant::from(
                MatrixBoolean::from_row_major(2, 2, &[false, true, true, false]).unwrap()
            ))
        );
        assert_eq!(-&m, Ok(Variant::from(MatrixReal::identity(2, 2).scale(-1.0))));
        assert_eq!(
            (-&Variant::from(MatrixBoolean::identity(1, 1))).map(|v| v.kind()),
            Ok(Kind::MatrixInteger)
        );
    }

    #[test]
    fn none_joins_but_does_not_convert() {
        assert_eq!(
            &Variant::None + &Variant::Integer(1),
            Err(ValueError::conversion(Kind::None, Kind::Integer))
        );
    }
}
