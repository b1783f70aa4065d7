//! Voxel coordinates and volume shapes
//!
//! [`Coord3`] addresses a single voxel, either in absolute dataset space or
//! relative to the origin of a [`Volume`](crate::Volume). [`Shape3`] is the
//! extent of a rectangular block of voxels.
//!
//! Both parse from the loose triple notation operators type into
//! configuration fields: `"10 20 30"`, `"10,20,30"` or `"(10, 20, 30)"`.

use crate::error::{Error, Result};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A voxel coordinate
///
/// Ordering is lexicographic on `(x, y, z)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coord3 {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Coord3 {
    /// Placeholder position for objects that have no single canonical voxel
    pub const SENTINEL: Coord3 = Coord3::new(-1, -1, -1);

    /// Create a new coordinate
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate with the same value on every axis
    pub const fn splat(v: i64) -> Self {
        Self::new(v, v, v)
    }

    /// Whether this is [`Coord3::SENTINEL`]
    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// One-based coordinate as shown to operators
    pub fn to_display(self) -> Coord3 {
        self + Coord3::splat(1)
    }

    /// Zero-based coordinate from an operator-facing one-based coordinate
    pub fn from_display(display: Coord3) -> Coord3 {
        display - Coord3::splat(1)
    }

    /// Component-wise midpoint (rounded towards negative infinity)
    pub fn midpoint(self, other: Coord3) -> Coord3 {
        Coord3::new(
            (self.x + other.x).div_euclid(2),
            (self.y + other.y).div_euclid(2),
            (self.z + other.z).div_euclid(2),
        )
    }

    /// Offset of this coordinate by a shape, minus one (inclusive end)
    pub fn last_of(self, shape: Shape3) -> Coord3 {
        self + shape.to_coord() - Coord3::splat(1)
    }
}

impl Add for Coord3 {
    type Output = Coord3;

    fn add(self, rhs: Coord3) -> Coord3 {
        Coord3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Coord3 {
    type Output = Coord3;

    fn sub(self, rhs: Coord3) -> Coord3 {
        Coord3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl fmt::Display for Coord3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl From<(i64, i64, i64)> for Coord3 {
    fn from((x, y, z): (i64, i64, i64)) -> Self {
        Coord3::new(x, y, z)
    }
}

impl FromStr for Coord3 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let [x, y, z] = parse_triple(s)?;
        Ok(Coord3::new(x, y, z))
    }
}

/// Extent of a rectangular voxel block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape3 {
    pub nx: usize,
    pub ny: usize,
    pub nz: usize,
}

impl Shape3 {
    /// Create a new shape
    pub const fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Cube with edge length `n`
    pub const fn cube(n: usize) -> Self {
        Self::new(n, n, n)
    }

    /// Number of voxels
    #[inline]
    pub fn len(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Whether any axis has zero extent
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a local coordinate lies inside this shape
    #[inline]
    pub fn contains(&self, c: Coord3) -> bool {
        c.x >= 0
            && c.y >= 0
            && c.z >= 0
            && (c.x as usize) < self.nx
            && (c.y as usize) < self.ny
            && (c.z as usize) < self.nz
    }

    /// Linear index of a local coordinate (x fastest, then y, then z)
    #[inline]
    pub fn index_of(&self, c: Coord3) -> Option<usize> {
        if !self.contains(c) {
            return None;
        }
        Some(c.x as usize + self.nx * (c.y as usize + self.ny * c.z as usize))
    }

    /// Local coordinate of a linear index
    #[inline]
    pub fn coord_of(&self, index: usize) -> Coord3 {
        let x = index % self.nx;
        let y = (index / self.nx) % self.ny;
        let z = index / (self.nx * self.ny);
        Coord3::new(x as i64, y as i64, z as i64)
    }

    /// Shape grown by `margin` voxels on both sides of every axis
    pub fn padded(&self, margin: usize) -> Shape3 {
        Shape3::new(
            self.nx + 2 * margin,
            self.ny + 2 * margin,
            self.nz + 2 * margin,
        )
    }

    /// The shape as a coordinate offset
    pub fn to_coord(self) -> Coord3 {
        Coord3::new(self.nx as i64, self.ny as i64, self.nz as i64)
    }

    /// The shape as a tuple, for error reporting
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.nx, self.ny, self.nz)
    }
}

impl fmt::Display for Shape3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

impl FromStr for Shape3 {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let [nx, ny, nz] = parse_triple(s)?;
        if nx < 0 || ny < 0 || nz < 0 {
            return Err(Error::ParseCoord(s.to_string()));
        }
        Ok(Shape3::new(nx as usize, ny as usize, nz as usize))
    }
}

fn parse_triple(s: &str) -> Result<[i64; 3]> {
    let values = s
        .split(|c: char| c.is_whitespace() || matches!(c, ',' | '(' | ')' | '[' | ']'))
        .filter(|tok| !tok.is_empty())
        .map(str::parse::<i64>)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| Error::ParseCoord(s.to_string()))?;

    match values.as_slice() {
        [x, y, z] => Ok([*x, *y, *z]),
        _ => Err(Error::ParseCoord(s.to_string())),
    }
}
