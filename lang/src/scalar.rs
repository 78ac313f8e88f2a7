//! Scalar payloads and the primitive conversions between them
//!
//! Integer arithmetic wraps on overflow; real and complex arithmetic follow
//! IEEE 754 and never signal. The named functions at the bottom of this
//! module are the ones that opt in to reporting domain errors and non-finite
//! results.

use crate::error::{ValueError, ValueResult};

pub type Boolean = bool;
pub type Integer = i64;
pub type Real = f64;
pub type Complex = num_complex::Complex64;

/// 2^63 as a real; the first real that no longer fits an `Integer`
const INTEGER_LIMIT: Real = 9_223_372_036_854_775_808.0;

/// Exact real to integer conversion: the value must have no fractional part
/// and fit in 64 bits
pub fn real_to_integer(value: Real) -> Option<Integer> {
    if value.is_finite() && value.fract() == 0.0 && (-INTEGER_LIMIT..INTEGER_LIMIT).contains(&value)
    {
        Some(value as Integer)
    } else {
        None
    }
}

/// Exact complex to real conversion: the imaginary part must be zero
pub fn complex_to_real(value: Complex) -> Option<Real> {
    if value.im == 0.0 { Some(value.re) } else { None }
}

pub fn complex_to_integer(value: Complex) -> Option<Integer> {
    complex_to_real(value).and_then(real_to_integer)
}

pub fn real_to_boolean(value: Real) -> Boolean {
    value != 0.0
}

pub fn complex_to_boolean(value: Complex) -> Boolean {
    value.re != 0.0 || value.im != 0.0
}

pub fn boolean_to_integer(value: Boolean) -> Integer {
    Integer::from(value)
}

pub fn integer_to_real(value: Integer) -> Real {
    value as Real
}

pub fn real_to_complex(value: Real) -> Complex {
    Complex::new(value, 0.0)
}

/// Reals always carry a decimal point or exponent so they read back as reals
pub fn format_real(value: Real) -> String {
    format!("{value:?}")
}

/// `re+imi` with an explicit sign on the imaginary part
pub fn format_complex(value: Complex) -> String {
    let sign = if value.im.is_sign_negative() && !value.im.is_nan() {
        '-'
    } else {
        '+'
    };
    format!("{}{}{}i", value.re, sign, value.im.abs())
}

/// Inverse of [`format_complex`]; also accepts a bare real
pub fn parse_complex(text: &str) -> Option<Complex> {
    let text = text.trim();
    let Some(body) = text.strip_suffix('i') else {
        return text.parse::<Real>().ok().map(real_to_complex);
    };
    let split = body
        .char_indices()
        .skip(1)
        .filter(|&(i, c)| (c == '+' || c == '-') && !body[..i].ends_with(['e', 'E']))
        .map(|(i, _)| i)
        .last();
    match split {
        Some(at) => {
            let re = body[..at].parse::<Real>().ok()?;
            let im = body[at..].parse::<Real>().ok()?;
            Some(Complex::new(re, im))
        }
        None => body.parse::<Real>().ok().map(|im| Complex::new(0.0, im)),
    }
}

/// Rejects NaN and infinite results of an opted-in numeric operation
pub fn check_finite(value: Real) -> ValueResult<Real> {
    if value.is_nan() {
        Err(ValueError::ResultIsNaN)
    } else if value.is_infinite() {
        Err(ValueError::ResultIsInfinite)
    } else {
        Ok(value)
    }
}

/// Natural logarithm; non-positive arguments are out of domain
pub fn ln(value: Real) -> ValueResult<Real> {
    if value.is_nan() {
        return Err(ValueError::ResultIsNaN);
    }
    if value <= 0.0 {
        return Err(ValueError::InvalidNumericValue { value });
    }
    check_finite(value.ln())
}

pub fn sqrt(value: Real) -> ValueResult<Real> {
    if value < 0.0 {
        return Err(ValueError::InvalidNumericValue { value });
    }
    check_finite(value.sqrt())
}

pub fn exp(value: Real) -> ValueResult<Real> {
    check_finite(value.exp())
}

pub fn power(base: Real, exponent: Real) -> ValueResult<Real> {
    if base == 0.0 && exponent < 0.0 {
        return Err(ValueError::ResultIsInfinite);
    }
    check_finite(base.powf(exponent))
}

/// Validates a probability argument in `[0, 1]`
pub fn probability(value: Real) -> ValueResult<Real> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ValueError::InvalidNumericValue { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn real_to_integer_requires_exact_value() {
        assert_eq!(real_to_integer(42.0), Some(42));
        assert_eq!(real_to_integer(-7.0), Some(-7));
        assert_eq!(real_to_integer(1.5), None);
        assert_eq!(real_to_integer(1e30), None);
        assert_eq!(real_to_integer(f64::NAN), None);
        assert_eq!(real_to_integer(f64::INFINITY), None);
    }

    #[test]
    fn real_to_integer_range_edges() {
        assert_eq!(real_to_integer(-INTEGER_LIMIT), Some(i64::MIN));
        assert_eq!(real_to_integer(INTEGER_LIMIT), None);
    }

    #[test]
    fn complex_conversions() {
        assert_eq!(complex_to_real(Complex::new(2.5, 0.0)), Some(2.5));
        assert_eq!(complex_to_real(Complex::new(2.5, 1.0)), None);
        assert_eq!(complex_to_integer(Complex::new(3.0, 0.0)), Some(3));
        assert_eq!(complex_to_integer(Complex::new(3.5, 0.0)), None);
        assert!(complex_to_boolean(Complex::new(0.0, 1.0)));
        assert!(!complex_to_boolean(Complex::new(0.0, 0.0)));
    }

    #[test]
    fn complex_zero_division_is_nan() {
        let q = Complex::new(0.0, 0.0) / Complex::new(0.0, 0.0);
        assert!(q.re.is_nan());
        assert!(q.im.is_nan());
    }

    #[test]
    fn complex_text_round_trip() {
        for value in [
            Complex::new(1.0, 2.0),
            Complex::new(-1.5, -0.25),
            Complex::new(0.0, -0.0),
            Complex::new(1e-300, f64::INFINITY),
        ] {
            let text = format_complex(value);
            assert_eq!(parse_complex(&text), Some(value), "{text}");
        }
        assert_eq!(format_complex(Complex::new(1.0, -2.0)), "1-2i");
        assert_eq!(parse_complex("3.5"), Some(Complex::new(3.5, 0.0)));
        assert_eq!(parse_complex("-2i"), Some(Complex::new(0.0, -2.0)));
        assert_eq!(parse_complex("1+x"), None);
    }

    #[test]
    fn reals_format_with_a_point() {
        assert_eq!(format_real(1.0), "1.0");
        assert_eq!(format_real(-0.5), "-0.5");
        assert_eq!(format_real(1e30), "1e30");
    }

    #[test]
    fn named_ops_signal_domain_errors() {
        assert_eq!(ln(0.0), Err(ValueError::InvalidNumericValue { value: 0.0 }));
        assert_eq!(ln(f64::NAN), Err(ValueError::ResultIsNaN));
        assert!((ln(std::f64::consts::E).unwrap() - 1.0).abs() < 1e-15);
        assert_eq!(sqrt(-1.0), Err(ValueError::InvalidNumericValue { value: -1.0 }));
        assert_eq!(exp(1000.0), Err(ValueError::ResultIsInfinite));
        assert_eq!(power(0.0, -1.0), Err(ValueError::ResultIsInfinite));
        assert_eq!(power(2.0, 10.0), Ok(1024.0));
        assert!(probability(1.5).is_err());
        assert_eq!(probability(0.25), Ok(0.25));
    }
}
