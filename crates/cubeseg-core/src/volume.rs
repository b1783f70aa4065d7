//! Volume - Dense 3-D voxel grid
//!
//! `Volume<T>` is the 3-D counterpart of a raster image: one `T` per voxel,
//! stored contiguously. It is used for label volumes (`Volume<u64>`),
//! boolean masks (`Volume<bool>`), cost fields (`Volume<f64>`) and raw
//! predictions (`Volume<u8>`).
//!
//! # Examples
//!
//! ```
//! use cubeseg_core::{Coord3, Shape3, Volume};
//!
//! let mut labels = Volume::new(Shape3::cube(10), 0u64).unwrap();
//! labels.set(Coord3::new(1, 2, 3), 42).unwrap();
//! assert_eq!(labels.get(Coord3::new(1, 2, 3)).unwrap(), 42);
//! assert_eq!(labels.count(|&v| v == 42), 1);
//! ```

use crate::coord::{Coord3, Shape3};
use crate::error::{Error, Result};

/// Dense 3-D voxel grid
///
/// # Memory Layout
///
/// Data is stored with x varying fastest, then y, then z, with no padding.
/// The voxel at (x, y, z) is at index `x + nx * (y + ny * z)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    shape: Shape3,
    data: Vec<T>,
}

impl<T: Copy> Volume<T> {
    /// Create a new volume with every voxel set to `fill`
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if any axis is 0.
    pub fn new(shape: Shape3, fill: T) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::InvalidDimension {
                nx: shape.nx,
                ny: shape.ny,
                nz: shape.nz,
            });
        }

        Ok(Volume {
            shape,
            data: vec![fill; shape.len()],
        })
    }

    /// Create a volume from raw data in x-fastest order
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or data length doesn't match.
    pub fn from_data(shape: Shape3, data: Vec<T>) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::InvalidDimension {
                nx: shape.nx,
                ny: shape.ny,
                nz: shape.nz,
            });
        }

        if data.len() != shape.len() {
            return Err(Error::InvalidParameter(format!(
                "data length {} doesn't match {} = {}",
                data.len(),
                shape,
                shape.len()
            )));
        }

        Ok(Volume { shape, data })
    }

    /// Get the volume shape
    #[inline]
    pub fn shape(&self) -> Shape3 {
        self.shape
    }

    /// Number of voxels
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false for a constructed volume; provided for API symmetry
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether a local coordinate lies inside the volume
    #[inline]
    pub fn contains(&self, c: Coord3) -> bool {
        self.shape.contains(c)
    }

    /// Get the voxel value at a local coordinate
    ///
    /// # Errors
    ///
    /// Returns `Error::CoordOutOfBounds` if the coordinate is outside.
    #[inline]
    pub fn get(&self, c: Coord3) -> Result<T> {
        let idx = self.checked_index(c)?;
        Ok(self.data[idx])
    }

    /// Set the voxel value at a local coordinate
    ///
    /// # Errors
    ///
    /// Returns `Error::CoordOutOfBounds` if the coordinate is outside.
    #[inline]
    pub fn set(&mut self, c: Coord3, value: T) -> Result<()> {
        let idx = self.checked_index(c)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Get the voxel value at a linear index
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn get_index(&self, index: usize) -> T {
        self.data[index]
    }

    /// Set the voxel value at a linear index
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    #[inline]
    pub fn set_index(&mut self, index: usize, value: T) {
        self.data[index] = value;
    }

    /// Get raw access to the voxel data
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Get mutable access to the voxel data
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the volume and return its voxel data
    pub fn into_data(self) -> Vec<T> {
        self.data
    }

    /// Set all voxels to the specified value
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Number of voxels satisfying a predicate
    pub fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&T) -> bool,
    {
        self.data.iter().filter(|v| pred(v)).count()
    }

    /// Apply a function to every voxel, producing a new volume
    pub fn map<U: Copy, F>(&self, f: F) -> Volume<U>
    where
        F: Fn(T) -> U,
    {
        Volume {
            shape: self.shape,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two equally shaped volumes voxel by voxel
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if the shapes differ.
    pub fn zip_map<U: Copy, V: Copy, F>(&self, other: &Volume<U>, f: F) -> Result<Volume<V>>
    where
        F: Fn(T, U) -> V,
    {
        self.check_same_shape(other.shape)?;
        Ok(Volume {
            shape: self.shape,
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Copy a sub-block starting at `origin`
    ///
    /// # Errors
    ///
    /// Returns an error if the block does not fit inside this volume.
    pub fn crop(&self, origin: Coord3, shape: Shape3) -> Result<Volume<T>> {
        let last = origin.last_of(shape);
        if !self.contains(origin) || !self.contains(last) {
            return Err(Error::InvalidParameter(format!(
                "crop {} at {} exceeds volume {}",
                shape, origin, self.shape
            )));
        }

        let mut data = Vec::with_capacity(shape.len());
        for z in 0..shape.nz as i64 {
            for y in 0..shape.ny as i64 {
                let start = self.index(origin + Coord3::new(0, y, z));
                data.extend_from_slice(&self.data[start..start + shape.nx]);
            }
        }
        Volume::from_data(shape, data)
    }

    /// New volume grown by `pad` voxels of `fill` on every side
    pub fn pad(&self, pad: usize, fill: T) -> Volume<T> {
        let shape = self.shape.padded(pad);
        let mut out = Volume {
            shape,
            data: vec![fill; shape.len()],
        };
        out.paste_unchecked(Coord3::splat(pad as i64), self);
        out
    }

    /// Overwrite a sub-block starting at `origin` with `src`
    ///
    /// # Errors
    ///
    /// Returns an error if `src` does not fit inside this volume at `origin`.
    pub fn paste(&mut self, origin: Coord3, src: &Volume<T>) -> Result<()> {
        let last = origin.last_of(src.shape);
        if !self.contains(origin) || !self.contains(last) {
            return Err(Error::InvalidParameter(format!(
                "paste {} at {} exceeds volume {}",
                src.shape, origin, self.shape
            )));
        }
        self.paste_unchecked(origin, src);
        Ok(())
    }

    /// Verify that `other` has the same shape as this volume
    pub fn check_same_shape(&self, other: Shape3) -> Result<()> {
        if self.shape != other {
            return Err(Error::DimensionMismatch {
                expected: self.shape.dims(),
                actual: other.dims(),
            });
        }
        Ok(())
    }

    fn paste_unchecked(&mut self, origin: Coord3, src: &Volume<T>) {
        let nx = src.shape.nx;
        for z in 0..src.shape.nz as i64 {
            for y in 0..src.shape.ny as i64 {
                let dst = self.index(origin + Coord3::new(0, y, z));
                let from = src.index(Coord3::new(0, y, z));
                self.data[dst..dst + nx].copy_from_slice(&src.data[from..from + nx]);
            }
        }
    }

    #[inline]
    fn index(&self, c: Coord3) -> usize {
        c.x as usize + self.shape.nx * (c.y as usize + self.shape.ny * c.z as usize)
    }

    #[inline]
    fn checked_index(&self, c: Coord3) -> Result<usize> {
        self.shape.index_of(c).ok_or(Error::CoordOutOfBounds {
            x: c.x,
            y: c.y,
            z: c.z,
        })
    }
}

impl Volume<bool> {
    /// Number of `true` voxels
    pub fn count_true(&self) -> usize {
        self.count(|&v| v)
    }

    /// Voxel-wise negation
    pub fn inverted(&self) -> Volume<bool> {
        self.map(|v| !v)
    }
}
