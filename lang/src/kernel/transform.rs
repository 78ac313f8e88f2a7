//! Discrete Fourier and cosine transforms and the Hilbert transform
//!
//! A buffer with a single row or column is transformed as one sequence;
//! anything else is transformed along its columns and then along its rows.

use std::f64::consts::PI;

use rustfft::FftPlanner;

use super::Buffer;
use crate::scalar::{Complex, Real};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Inverse,
}

fn is_vector<T>(buffer: &Buffer<T>) -> bool {
    buffer.rows == 1 || buffer.columns == 1
}

/// Run `transform` over every line of `buffer`: the whole buffer for a
/// vector, each column and then each row otherwise
fn separable<T: Copy>(buffer: &mut Buffer<T>, mut transform: impl FnMut(&mut [T])) {
    if buffer.data.is_empty() {
        return;
    }
    if is_vector(buffer) {
        transform(&mut buffer.data);
        return;
    }

    let rows = buffer.rows;
    for column in buffer.data.chunks_mut(rows) {
        transform(column);
    }

    let mut line = Vec::with_capacity(buffer.columns);
    for row in 0..rows {
        line.clear();
        line.extend((0..buffer.columns).map(|column| buffer.data[row + column * rows]));
        transform(&mut line);
        for (column, &value) in line.iter().enumerate() {
            buffer.data[row + column * rows] = value;
        }
    }
}

fn fft(buffer: &Buffer<Complex>, direction: Direction) -> Buffer<Complex> {
    let mut result = buffer.clone();
    let mut planner = FftPlanner::<Real>::new();
    separable(&mut result, |line| {
        let plan = match direction {
            Direction::Forward => planner.plan_fft_forward(line.len()),
            Direction::Inverse => planner.plan_fft_inverse(line.len()),
        };
        plan.process(line);
    });
    if direction == Direction::Inverse && !result.data.is_empty() {
        let scale = 1.0 / result.data.len() as Real;
        for value in result.data.iter_mut() {
            *value *= scale;
        }
    }
    result
}

/// Unnormalised forward DFT
pub fn dft(buffer: &Buffer<Complex>) -> Buffer<Complex> {
    fft(buffer, Direction::Forward)
}

/// Inverse DFT, scaled so that `idft(dft(x)) == x`
pub fn idft(buffer: &Buffer<Complex>) -> Buffer<Complex> {
    fft(buffer, Direction::Inverse)
}

/// `X[k] = sum x[n] cos(pi / N (n + 1/2) k)`
fn dct_line(line: &mut [Real]) {
    let n = line.len();
    let input = line.to_vec();
    for (k, output) in line.iter_mut().enumerate() {
        *output = input
            .iter()
            .enumerate()
            .map(|(i, x)| x * (PI / n as Real * (i as Real + 0.5) * k as Real).cos())
            .sum();
    }
}

/// `x[n] = 2/N (X[0]/2 + sum_{k>0} X[k] cos(pi / N (n + 1/2) k))`
fn idct_line(line: &mut [Real]) {
    let n = line.len();
    let input = line.to_vec();
    for (i, output) in line.iter_mut().enumerate() {
        let tail: Real = input
            .iter()
            .enumerate()
            .skip(1)
            .map(|(k, x)| x * (PI / n as Real * (i as Real + 0.5) * k as Real).cos())
            .sum();
        *output = 2.0 / n as Real * (input[0] / 2.0 + tail);
    }
}

/// Type-II discrete cosine transform
pub fn dct(buffer: &Buffer<Real>) -> Buffer<Real> {
    let mut result = buffer.clone();
    separable(&mut result, dct_line);
    result
}

/// Type-III discrete cosine transform scaled to invert [`dct`]
pub fn idct(buffer: &Buffer<Real>) -> Buffer<Real> {
    let mut result = buffer.clone();
    separable(&mut result, idct_line);
    result
}

/// Analytic signal `x + i H(x)` of a real sequence
pub fn hilbert(values: &[Real]) -> Vec<Complex> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mut spectrum: Vec<Complex> = values.iter().map(|&x| Complex::new(x, 0.0)).collect();
    let mut planner = FftPlanner::<Real>::new();
    planner.plan_fft_forward(n).process(&mut spectrum);

    // keep DC and Nyquist, double positive frequencies, drop negative ones
    let positive_end = n.div_ceil(2);
    for (k, value) in spectrum.iter_mut().enumerate() {
        let weight = if k == 0 || (n % 2 == 0 && k == n / 2) {
            1.0
        } else if k < positive_end {
            2.0
        } else {
            0.0
        };
        *value *= weight;
    }

    planner.plan_fft_inverse(n).process(&mut spectrum);
    let scale = 1.0 / n as Real;
    spectrum.into_iter().map(|value| value * scale).collect()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::Field;
    use super::*;

    #[test]
    fn dft_of_impulse_is_flat() {
        let impulse = complex(1, 4, &[(1.0, 0.0), (0.0, 0.0), (0.0, 0.0), (0.0, 0.0)]);
        let spectrum = dft(&impulse);
        assert_close(
            &spectrum,
            &complex(1, 4, &[(1.0, 0.0), (1.0, 0.0), (1.0, 0.0), (1.0, 0.0)]),
            1e-12,
        );
    }

    #[test]
    fn dft_round_trip_two_dimensional() {
        let a = complex(
            2,
            3,
            &[(1.0, 0.0), (2.0, 1.0), (0.0, -1.0), (3.0, 0.0), (-1.0, 0.5), (4.0, 0.0)],
        );
        let spectrum = dft(&a);
        // DC term is the sum of every coefficient
        let sum = a.data.iter().fold(Complex::new(0.0, 0.0), |acc, &x| acc + x);
        assert!((spectrum.get(0, 0) - sum).modulus() < 1e-12);
        assert_close(&idft(&spectrum), &a, 1e-12);
    }

    #[test]
    fn dct_round_trip() {
        let v = real(4, 1, &[1.0, 2.0, 3.0, 4.0]);
        let forward = dct(&v);
        assert!((forward.get(0, 0) - 10.0).abs() < 1e-12);
        assert_close(&idct(&forward), &v, 1e-12);

        let m = real(2, 2, &[1.0, -2.0, 0.5, 3.0]);
        assert_close(&idct(&dct(&m)), &m, 1e-12);
    }

    #[test]
    fn hilbert_of_cosine_is_sine() {
        let n = 8;
        let signal: Vec<Real> = (0..n)
            .map(|i| (2.0 * PI * i as Real / n as Real).cos())
            .collect();
        let analytic = hilbert(&signal);
        for (i, value) in analytic.iter().enumerate() {
            let angle = 2.0 * PI * i as Real / n as Real;
            assert!((value.re - angle.cos()).abs() < 1e-12);
            assert!((value.im - angle.sin()).abs() < 1e-12);
        }
    }
}
