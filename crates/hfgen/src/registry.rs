//! The configured sets of supported vector kinds and matrix shapes.
//!
//! A [`Registry`] is fixed for the duration of a generation run. Its order is the order in which
//! types are declared and functions are emitted, so it directly determines the byte layout of the
//! generated files.

use std::fmt;

use crate::ScalarKind;

/// Shape of a generated matrix type, `float name[width][height]`.
///
/// The first array index (bounded by `width`) is the *row* index, the second (bounded by `height`)
/// the *column* index.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    width: usize,
    height: usize,
}

impl Shape {
    /// Creates a new [`Shape`].
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    pub const fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "matrix dimensions must be non-zero");
        Self { width, height }
    }

    /// Creates the square shape `n x n`.
    pub const fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of elements in a matrix of this shape.
    #[inline]
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Returns the size `n` if this is an `n x n` shape.
    pub fn square_size(&self) -> Option<usize> {
        self.is_square().then_some(self.width)
    }

    /// Returns the shape with width and height swapped.
    pub fn transposed(&self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }

    /// Returns the square shape one size smaller, which determinants and minors of this shape are
    /// expanded into.
    ///
    /// Returns [`None`] for non-square shapes and for `1x1`.
    pub fn reduced(&self) -> Option<Self> {
        match self.square_size() {
            Some(n) if n > 1 => Some(Self::square(n - 1)),
            _ => None,
        }
    }

    /// Returns the shape of `self * rhs`, or [`None`] if the inner dimensions do not match.
    pub fn product(&self, rhs: Shape) -> Option<Self> {
        (self.height == rhs.width).then(|| Self::new(self.width, rhs.height))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Element kind and component count of a generated vector type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorKind {
    scalar: ScalarKind,
    count: usize,
}

impl VectorKind {
    /// Creates a new [`VectorKind`].
    ///
    /// # Panics
    ///
    /// Panics if `count` is zero.
    pub const fn new(scalar: ScalarKind, count: usize) -> Self {
        assert!(count > 0, "vectors must have at least one component");
        Self { scalar, count }
    }

    #[inline]
    pub fn scalar(&self) -> ScalarKind {
        self.scalar
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }
}

impl fmt::Display for VectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.scalar, self.count)
    }
}

impl fmt::Debug for VectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// An ordered set of descriptors.
#[derive(Clone, PartialEq, Eq)]
pub struct Registry<D> {
    entries: Vec<D>,
}

impl<D: Copy + PartialEq + fmt::Debug> Registry<D> {
    /// Creates a registry containing `entries` in iteration order.
    ///
    /// Duplicate entries are dropped, keeping the first occurrence.
    pub fn new<I: IntoIterator<Item = D>>(entries: I) -> Self {
        let mut this = Self {
            entries: Vec::new(),
        };
        for entry in entries {
            if this.contains(entry) {
                log::warn!("ignoring duplicate registry entry {:?}", entry);
                continue;
            }
            this.entries.push(entry);
        }
        this
    }

    /// Returns whether `entry` is part of this registry (exact match).
    pub fn contains(&self, entry: D) -> bool {
        self.entries.contains(&entry)
    }

    /// Iterates over all entries in registry order.
    pub fn iter(&self) -> impl Iterator<Item = D> + '_ {
        self.entries.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Registry<Shape> {
    /// Every shape from `1x2` up to `4x4`, excluding `1x1`.
    pub fn reference() -> Self {
        Self::new(
            (1..=4)
                .flat_map(|w| (1..=4).map(move |h| Shape::new(w, h)))
                .filter(|shape| *shape != Shape::square(1)),
        )
    }
}

impl Registry<VectorKind> {
    /// `float` and `int` vectors with 2 and 3 components.
    pub fn minimal() -> Self {
        Self::new(
            (2..=3).flat_map(|n| {
                [ScalarKind::Float, ScalarKind::Int].map(|scalar| VectorKind::new(scalar, n))
            }),
        )
    }

    /// `float`, `int` and `double` vectors with 2 to 4 components.
    pub fn reference() -> Self {
        Self::new((2..=4).flat_map(|n| ScalarKind::ALL.map(|scalar| VectorKind::new(scalar, n))))
    }
}

impl<D: fmt::Debug> fmt::Debug for Registry<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}
