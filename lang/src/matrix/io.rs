//! Matrix files
//!
//! Binary layout, all integers little-endian:
//!
//! ```text
//! MATRIX01 | kind tag: u8 | rows: u64 | columns: u64 | coefficients
//! ```
//!
//! Coefficients follow in column-major order: booleans as one byte, integers
//! as `i64`, reals as `f64`, complex numbers as two `f64` (real, imaginary).
//!
//! CSV is one matrix row per line with comma-separated coefficients;
//! booleans are written as `0`/`1` and complex numbers as `re+imi`.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs;
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use tracing::debug;

use super::{Coefficient, Matrix};
use crate::error::{ValueError, ValueResult};
use crate::kind::Kind;
use crate::scalar::{Boolean, Complex, Integer, Real, format_complex, format_real, parse_complex};
use crate::variant::Variant;

/// Leading bytes of every binary matrix file
pub const MATRIX_FILE_MAGIC: &[u8; 8] = b"MATRIX01";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixFileFormat {
    Csv,
    Binary,
}

/// Per-coefficient encodings for the two file formats
pub trait FileCoefficient: Coefficient {
    fn write_binary<W: Write>(self, writer: &mut W) -> io::Result<()>;
    fn read_binary<R: Read>(reader: &mut R) -> io::Result<Self>;
    fn write_csv(self, out: &mut String);
}

impl FileCoefficient for Boolean {
    fn write_binary<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_u8(u8::from(self))
    }

    fn read_binary<R: Read>(reader: &mut R) -> io::Result<Self> {
        match reader.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("boolean coefficient {other}"),
            )),
        }
    }

    fn write_csv(self, out: &mut String) {
        out.push(if self { '1' } else { '0' });
    }
}

impl FileCoefficient for Integer {
    fn write_binary<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_i64::<LittleEndian>(self)
    }

    fn read_binary<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_i64::<LittleEndian>()
    }

    fn write_csv(self, out: &mut String) {
        out.push_str(&self.to_string());
    }
}

impl FileCoefficient for Real {
    fn write_binary<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_f64::<LittleEndian>(self)
    }

    fn read_binary<R: Read>(reader: &mut R) -> io::Result<Self> {
        reader.read_f64::<LittleEndian>()
    }

    fn write_csv(self, out: &mut String) {
        out.push_str(&format_real(self));
    }
}

impl FileCoefficient for Complex {
    fn write_binary<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_f64::<LittleEndian>(self.re)?;
        writer.write_f64::<LittleEndian>(self.im)
    }

    fn read_binary<R: Read>(reader: &mut R) -> io::Result<Self> {
        let re = reader.read_f64::<LittleEndian>()?;
        let im = reader.read_f64::<LittleEndian>()?;
        Ok(Complex::new(re, im))
    }

    fn write_csv(self, out: &mut String) {
        out.push_str(&format_complex(self));
    }
}

fn path_text(path: &Path) -> String {
    path.display().to_string()
}

impl<T: FileCoefficient> Matrix<T> {
    /// Binary encoding, header included
    pub fn write_binary<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(MATRIX_FILE_MAGIC)?;
        writer.write_u8(T::MATRIX_KIND.tag())?;
        writer.write_u64::<LittleEndian>(self.rows() as u64)?;
        writer.write_u64::<LittleEndian>(self.columns() as u64)?;
        for &value in self.iter() {
            value.write_binary(writer)?;
        }
        Ok(())
    }

    /// Coefficients after the header has been consumed
    fn read_body<R: Read>(reader: &mut R, rows: usize, columns: usize) -> io::Result<Self> {
        let count = rows.checked_mul(columns).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidData, "matrix dimensions overflow")
        })?;
        let mut data = Vec::new();
        for _ in 0..count {
            data.push(T::read_binary(reader)?);
        }
        Ok(Matrix::from_parts(rows, columns, data))
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in 0..self.rows() {
            for column in 0..self.columns() {
                if column > 0 {
                    out.push(',');
                }
                self.get(row, column).write_csv(&mut out);
            }
            out.push('\n');
        }
        out
    }

    pub fn to_file(&self, path: impl AsRef<Path>, format: MatrixFileFormat) -> ValueResult<()> {
        let path = path.as_ref();
        debug!(path = %path.display(), ?format, rows = self.rows(), columns = self.columns(), "writing matrix");
        let mut file = fs::File::create(path).map_err(|e| ValueError::FileOpenError {
            path: path_text(path),
            reason: e.to_string(),
        })?;
        let written = match format {
            MatrixFileFormat::Binary => {
                let mut bytes = Vec::with_capacity(25 + self.len() * 8);
                self.write_binary(&mut bytes)
                    .and_then(|()| file.write_all(&bytes))
            }
            MatrixFileFormat::Csv => file.write_all(self.to_csv().as_bytes()),
        };
        written.map_err(|e| ValueError::FileWriteError {
            path: path_text(path),
            reason: e.to_string(),
        })?;
        file.sync_all().map_err(|e| ValueError::FileCloseError {
            path: path_text(path),
            reason: e.to_string(),
        })
    }

    /// Read a matrix file of any kind and convert it to this coefficient kind
    pub fn from_file(path: impl AsRef<Path>) -> ValueResult<Self> {
        let value = read_matrix_file(path)?;
        T::matrix_from_variant(&value)
            .ok_or_else(|| ValueError::conversion(value.kind(), T::MATRIX_KIND))
    }
}

/// Decode a binary matrix image into the matrix variant its kind tag names
pub fn decode_binary(bytes: &[u8]) -> io::Result<Variant> {
    let mut reader = Cursor::new(bytes);
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;
    if &magic != MATRIX_FILE_MAGIC {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "missing matrix magic"));
    }
    let tag = reader.read_u8()?;
    let rows = reader.read_u64::<LittleEndian>()? as usize;
    let columns = reader.read_u64::<LittleEndian>()? as usize;
    let value = match Kind::from_tag(tag) {
        Some(Kind::MatrixBoolean) => {
            Variant::MatrixBoolean(Matrix::read_body(&mut reader, rows, columns)?)
        }
        Some(Kind::MatrixInteger) => {
            Variant::MatrixInteger(Matrix::read_body(&mut reader, rows, columns)?)
        }
        Some(Kind::MatrixReal) => Variant::MatrixReal(Matrix::read_body(&mut reader, rows, columns)?),
        Some(Kind::MatrixComplex) => {
            Variant::MatrixComplex(Matrix::read_body(&mut reader, rows, columns)?)
        }
        _ => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("kind tag {tag} is not a matrix kind"),
            ));
        }
    };
    if (reader.position() as usize) != bytes.len() {
        return Err(io::Error::new(io::ErrorKind::InvalidData, "trailing bytes"));
    }
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CsvKind {
    Integer,
    Real,
    Complex,
}

fn classify_field(field: &str) -> CsvKind {
    let lower = field.to_ascii_lowercase();
    if lower.ends_with('i') && !lower.ends_with("inf") {
        CsvKind::Complex
    } else if lower.contains(['.', 'e', 'n']) {
        // `n` catches `inf` and `nan`
        CsvKind::Real
    } else {
        CsvKind::Integer
    }
}

#[derive(Debug)]
enum CsvError {
    /// Content is not a CSV matrix at all
    NotCsv,
    /// Rows of different lengths
    Ragged { line: usize },
}

/// Parse CSV text into the narrowest matrix kind that holds every field
fn parse_csv(text: &str) -> Result<Variant, CsvError> {
    let lines: Vec<Vec<&str>> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split(',').map(str::trim).collect())
        .collect();

    let rows = lines.len();
    let columns = lines.first().map_or(0, Vec::len);
    if let Some(line) = lines.iter().position(|fields| fields.len() != columns) {
        return Err(CsvError::Ragged { line: line + 1 });
    }

    let kind = lines
        .iter()
        .flatten()
        .map(|field| classify_field(field))
        .max()
        .unwrap_or(CsvKind::Integer);

    fn gather<T: Coefficient>(
        lines: &[Vec<&str>],
        rows: usize,
        columns: usize,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Matrix<T>, CsvError> {
        let mut data = Vec::with_capacity(rows * columns);
        for column in 0..columns {
            for line in lines {
                data.push(parse(line[column]).ok_or(CsvError::NotCsv)?);
            }
        }
        Ok(Matrix::from_parts(rows, columns, data))
    }

    Ok(match kind {
        CsvKind::Integer => Variant::MatrixInteger(gather::<Integer>(&lines, rows, columns, |f| {
            f.parse().ok()
        })?),
        CsvKind::Real => Variant::MatrixReal(gather::<Real>(&lines, rows, columns, |f| {
            f.parse().ok()
        })?),
        CsvKind::Complex => {
            Variant::MatrixComplex(gather::<Complex>(&lines, rows, columns, parse_complex)?)
        }
    })
}

/// Read a matrix file, detecting the format from its first bytes
pub fn read_matrix_file(path: impl AsRef<Path>) -> ValueResult<Variant> {
    let path = path.as_ref();
    let mut file = fs::File::open(path).map_err(|e| ValueError::FileOpenError {
        path: path_text(path),
        reason: e.to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|e| ValueError::FileReadError {
            path: path_text(path),
            reason: e.to_string(),
        })?;
    debug!(path = %path.display(), bytes = bytes.len(), "reading matrix");

    if bytes.starts_with(MATRIX_FILE_MAGIC) {
        return decode_binary(&bytes).map_err(|e| ValueError::FileReadError {
            path: path_text(path),
            reason: e.to_string(),
        });
    }

    let unknown = || ValueError::UnknownFileType {
        path: path_text(path),
    };
    let text = std::str::from_utf8(&bytes).map_err(|_| unknown())?;
    parse_csv(text).map_err(|error| match error {
        CsvError::NotCsv => unknown(),
        CsvError::Ragged { line } => ValueError::FileReadError {
            path: path_text(path),
            reason: format!("line {line} has a different number of fields"),
        },
    })
}

impl Variant {
    /// Load a matrix file as the matrix variant whose kind the file records
    pub fn from_matrix_file(path: impl AsRef<Path>) -> ValueResult<Variant> {
        read_matrix_file(path)
    }

    /// Write a matrix variant; other kinds can not be stored in a matrix file
    pub fn to_matrix_file(&self, path: impl AsRef<Path>, format: MatrixFileFormat) -> ValueResult<()> {
        match self {
            Variant::MatrixBoolean(m) => m.to_file(path, format),
            Variant::MatrixInteger(m) => m.to_file(path, format),
            Variant::MatrixReal(m) => m.to_file(path, format),
            Variant::MatrixComplex(m) => m.to_file(path, format),
            other => Err(ValueError::conversion(other.kind(), Kind::MatrixReal)),
        }
    }
}
