//! Value kinds and the promotion lattice
//!
//! The join table is the single source of truth for mixed-kind operations:
//! the dispatcher, equality and ordering all ask [`join`] which kind two
//! operands meet at before coercing them.

use std::fmt;

/// The closed set of runtime kinds a [`Variant`](crate::Variant) can hold.
///
/// The discriminant doubles as the coefficient tag in the binary matrix file
/// format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Kind {
    None = 0,
    Boolean = 1,
    Integer = 2,
    Real = 3,
    Complex = 4,
    Set = 5,
    Tuple = 6,
    /// Placeholder for "resolved at runtime"; never the kind of a stored value.
    Variant = 7,
    MatrixBoolean = 8,
    MatrixInteger = 9,
    MatrixReal = 10,
    MatrixComplex = 11,
}

/// Number of kinds, including the `Variant` sentinel
pub const NUMBER_KINDS: usize = 12;

impl Kind {
    pub const ALL: [Kind; NUMBER_KINDS] = [
        Kind::None,
        Kind::Boolean,
        Kind::Integer,
        Kind::Real,
        Kind::Complex,
        Kind::Set,
        Kind::Tuple,
        Kind::Variant,
        Kind::MatrixBoolean,
        Kind::MatrixInteger,
        Kind::MatrixReal,
        Kind::MatrixComplex,
    ];

    /// Every kind a stored value can actually have
    pub const STORED: [Kind; 11] = [
        Kind::None,
        Kind::Boolean,
        Kind::Integer,
        Kind::Real,
        Kind::Complex,
        Kind::Set,
        Kind::Tuple,
        Kind::MatrixBoolean,
        Kind::MatrixInteger,
        Kind::MatrixReal,
        Kind::MatrixComplex,
    ];

    pub fn from_tag(tag: u8) -> Option<Kind> {
        Kind::ALL.get(tag as usize).copied()
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::None => "none",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Real => "real",
            Kind::Complex => "complex",
            Kind::Set => "set",
            Kind::Tuple => "tuple",
            Kind::Variant => "variant",
            Kind::MatrixBoolean => "matrix_boolean",
            Kind::MatrixInteger => "matrix_integer",
            Kind::MatrixReal => "matrix_real",
            Kind::MatrixComplex => "matrix_complex",
        }
    }

    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Kind::Boolean | Kind::Integer | Kind::Real | Kind::Complex
        )
    }

    pub fn is_matrix(self) -> bool {
        matches!(
            self,
            Kind::MatrixBoolean | Kind::MatrixInteger | Kind::MatrixReal | Kind::MatrixComplex
        )
    }

    /// Position in the boolean < integer < real < complex order, shared by
    /// the scalar and matrix sublattices
    fn numeric_rank(self) -> Option<usize> {
        match self {
            Kind::Boolean | Kind::MatrixBoolean => Some(0),
            Kind::Integer | Kind::MatrixInteger => Some(1),
            Kind::Real | Kind::MatrixReal => Some(2),
            Kind::Complex | Kind::MatrixComplex => Some(3),
            _ => None,
        }
    }

    /// The scalar kind of a matrix's coefficients; scalars map to themselves
    pub fn coefficient_kind(self) -> Option<Kind> {
        self.numeric_rank().map(|rank| SCALAR_ORDER[rank])
    }

    /// The matrix kind whose coefficients have this scalar kind
    pub fn matrix_kind(self) -> Option<Kind> {
        self.numeric_rank().map(|rank| MATRIX_ORDER[rank])
    }

    /// Kind an arithmetic operator runs at when operands join at `self`:
    /// the boolean level has no arithmetic of its own and lifts to integer.
    pub fn arithmetic_kind(self) -> Kind {
        match self {
            Kind::Boolean => Kind::Integer,
            Kind::MatrixBoolean => Kind::MatrixInteger,
            other => other,
        }
    }

    /// Kind division runs at. Integer operands are divided as reals rather
    /// than at their integer join, so `1 / 2` is `0.5` and an integer zero
    /// divisor yields an infinity instead of a truncated quotient or a trap.
    pub fn division_kind(self) -> Kind {
        match self.arithmetic_kind() {
            Kind::Integer => Kind::Real,
            Kind::MatrixInteger => Kind::MatrixReal,
            other => other,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const SCALAR_ORDER: [Kind; 4] = [Kind::Boolean, Kind::Integer, Kind::Real, Kind::Complex];
const MATRIX_ORDER: [Kind; 4] = [
    Kind::MatrixBoolean,
    Kind::MatrixInteger,
    Kind::MatrixReal,
    Kind::MatrixComplex,
];

const fn join_entry(lhs: Kind, rhs: Kind) -> Option<Kind> {
    const fn rank(kind: Kind) -> i32 {
        match kind {
            Kind::Boolean | Kind::MatrixBoolean => 0,
            Kind::Integer | Kind::MatrixInteger => 1,
            Kind::Real | Kind::MatrixReal => 2,
            Kind::Complex | Kind::MatrixComplex => 3,
            _ => -1,
        }
    }
    const fn is_matrix(kind: Kind) -> bool {
        (kind as u8) >= (Kind::MatrixBoolean as u8)
    }

    match (lhs, rhs) {
        (Kind::Variant, _) | (_, Kind::Variant) => Some(Kind::Variant),
        (Kind::None, other) | (other, Kind::None) => Some(other),
        (Kind::Set, Kind::Set) => Some(Kind::Set),
        (Kind::Tuple, Kind::Tuple) => Some(Kind::Tuple),
        (Kind::Set, _) | (_, Kind::Set) | (Kind::Tuple, _) | (_, Kind::Tuple) => None,
        _ => {
            let l = rank(lhs);
            let r = rank(rhs);
            let top = if l > r { l } else { r };
            let order = if is_matrix(lhs) || is_matrix(rhs) {
                MATRIX_ORDER
            } else {
                SCALAR_ORDER
            };
            Some(order[top as usize])
        }
    }
}

const fn build_join_table() -> [[Option<Kind>; NUMBER_KINDS]; NUMBER_KINDS] {
    let mut table = [[None; NUMBER_KINDS]; NUMBER_KINDS];
    let mut i = 0;
    while i < NUMBER_KINDS {
        let mut j = 0;
        while j < NUMBER_KINDS {
            table[i][j] = join_entry(Kind::ALL[i], Kind::ALL[j]);
            j += 1;
        }
        i += 1;
    }
    table
}

/// Join table indexed by two kind tags; `None` marks an undefined join.
pub static JOIN_TABLE: [[Option<Kind>; NUMBER_KINDS]; NUMBER_KINDS] = build_join_table();

/// Least upper bound of two kinds, or `None` when they have no join
pub fn join(lhs: Kind, rhs: Kind) -> Option<Kind> {
    JOIN_TABLE[lhs as usize][rhs as usize]
}
