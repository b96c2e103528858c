//! Scalar element kinds of the generated types.

use std::fmt;

/// The element type stored in a generated vector or matrix.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Single-precision `float`.
    Float,
    /// `int`.
    Int,
    /// Double-precision `double`.
    Double,
}

impl ScalarKind {
    /// All scalar kinds, in the order the reference vector registry lists them.
    pub const ALL: [Self; 3] = [Self::Float, Self::Int, Self::Double];

    /// Returns the C spelling of this type.
    pub fn c_type(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Int => "int",
            Self::Double => "double",
        }
    }

    /// Returns the one-letter suffix used in type and function names (`f`, `i` or `d`).
    pub fn suffix(self) -> char {
        match self {
            Self::Float => 'f',
            Self::Int => 'i',
            Self::Double => 'd',
        }
    }

    #[inline]
    pub fn is_integer(self) -> bool {
        self == Self::Int
    }

    /// Returns whether a literal `1` of this type can be blended with a fractional weight without
    /// truncating the weight.
    ///
    /// This decides whether interpolation (and normalization) can be offered for vectors of this
    /// kind.
    #[inline]
    pub fn has_fractional_unit(self) -> bool {
        !self.is_integer()
    }

    /// The type a magnitude of a vector with elements of this kind is computed in.
    ///
    /// Integer vectors compute their magnitude as `float`.
    pub fn magnitude_kind(self) -> Self {
        match self {
            Self::Float | Self::Int => Self::Float,
            Self::Double => Self::Double,
        }
    }

    /// Returns the name of the C square root function for values of this type.
    ///
    /// The function operates on [`ScalarKind::magnitude_kind`], so `int` arguments go through
    /// `sqrtf`.
    pub fn sqrt_function(self) -> &'static str {
        match self.magnitude_kind() {
            Self::Double => "sqrt",
            _ => "sqrtf",
        }
    }

    /// Formats `value` as a C literal of this type.
    ///
    /// `float` literals use the `1.f` spelling, `double` literals always carry a decimal point,
    /// `int` literals truncate `value`.
    pub fn literal(self, value: f64) -> String {
        match self {
            Self::Float if value.fract() == 0.0 => format!("{}.f", value as i64),
            Self::Float => format!("{value}f"),
            Self::Double => format!("{value:?}"),
            Self::Int => format!("{}", value as i64),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.c_type())
    }
}

impl fmt::Debug for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
