//! Distance transforms
//!
//! Exact Euclidean distance transform of a binary volume, computed with the
//! separable lower-envelope-of-parabolas method: one 1-D squared-distance
//! pass along x, then y, then z.

use cubeseg_core::{Coord3, Volume};

/// Stand-in for "no background on this line yet"; finite so that
/// parabola intersections stay well defined
const FAR: f64 = 1e20;

/// Euclidean distance of every `true` voxel to the nearest `false` voxel
///
/// `false` voxels get distance 0. Voxels outside the volume do not count as
/// background. If the volume contains no `false` voxel at all, every
/// distance is 0.
///
/// # Examples
///
/// ```
/// use cubeseg_core::{Coord3, Shape3, Volume};
/// use cubeseg_region::distance_transform_edt;
///
/// let mut cells = Volume::new(Shape3::new(5, 1, 1), true).unwrap();
/// cells.set(Coord3::new(0, 0, 0), false).unwrap();
/// let dist = distance_transform_edt(&cells);
/// assert_eq!(dist.get(Coord3::new(4, 0, 0)).unwrap(), 4.0);
/// ```
pub fn distance_transform_edt(input: &Volume<bool>) -> Volume<f64> {
    let shape = input.shape();
    let mut dist = input.map(|inside| if inside { FAR } else { 0.0 });

    if input.count_true() == input.len() {
        dist.fill(0.0);
        return dist;
    }

    let (nx, ny, nz) = shape.dims();
    let longest = nx.max(ny).max(nz);
    let mut line = vec![0.0f64; longest];
    let mut out = vec![0.0f64; longest];
    let mut scratch = Envelope::with_capacity(longest);

    // Pass along x
    for z in 0..nz {
        for y in 0..ny {
            sweep(&mut dist, &mut scratch, &mut line[..nx], &mut out[..nx], |i| {
                Coord3::new(i as i64, y as i64, z as i64)
            });
        }
    }

    // Pass along y
    for z in 0..nz {
        for x in 0..nx {
            sweep(&mut dist, &mut scratch, &mut line[..ny], &mut out[..ny], |i| {
                Coord3::new(x as i64, i as i64, z as i64)
            });
        }
    }

    // Pass along z
    for y in 0..ny {
        for x in 0..nx {
            sweep(&mut dist, &mut scratch, &mut line[..nz], &mut out[..nz], |i| {
                Coord3::new(x as i64, y as i64, i as i64)
            });
        }
    }

    for v in dist.data_mut() {
        *v = v.sqrt();
    }
    dist
}

/// Min-max normalisation to `[0, 1]`
///
/// A constant input maps to all zeros.
pub fn scale_to_unit(field: &Volume<f64>) -> Volume<f64> {
    let (min, max) = field
        .data()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = max - min;
    if !range.is_finite() || range <= 0.0 {
        return field.map(|_| 0.0);
    }
    field.map(|v| (v - min) / range)
}

fn sweep<F>(
    dist: &mut Volume<f64>,
    env: &mut Envelope,
    line: &mut [f64],
    out: &mut [f64],
    coord_at: F,
) where
    F: Fn(usize) -> Coord3,
{
    let shape = dist.shape();
    let indices: Vec<usize> = (0..line.len())
        .filter_map(|i| shape.index_of(coord_at(i)))
        .collect();
    for (slot, &idx) in line.iter_mut().zip(&indices) {
        *slot = dist.get_index(idx);
    }
    env.squared_distance(line, out);
    for (&value, &idx) in out.iter().zip(&indices) {
        dist.set_index(idx, value);
    }
}

/// Reusable buffers for the 1-D lower envelope
struct Envelope {
    vertices: Vec<usize>,
    bounds: Vec<f64>,
}

impl Envelope {
    fn with_capacity(n: usize) -> Self {
        Self {
            vertices: vec![0; n],
            bounds: vec![0.0; n + 1],
        }
    }

    /// `out[q] = min_p (q - p)^2 + f[p]`
    fn squared_distance(&mut self, f: &[f64], out: &mut [f64]) {
        let n = f.len();
        if n == 0 {
            return;
        }
        let v = &mut self.vertices;
        let z = &mut self.bounds;

        let mut k = 0usize;
        v[0] = 0;
        z[0] = f64::NEG_INFINITY;
        z[1] = f64::INFINITY;

        for q in 1..n {
            let fq = f[q] + (q * q) as f64;
            let mut s;
            loop {
                let p = v[k];
                s = (fq - (f[p] + (p * p) as f64)) / (2.0 * (q as f64 - p as f64));
                if k > 0 && s <= z[k] {
                    k -= 1;
                } else {
                    break;
                }
            }
            k += 1;
            v[k] = q;
            z[k] = s;
            z[k + 1] = f64::INFINITY;
        }

        k = 0;
        for (q, slot) in out.iter_mut().enumerate().take(n) {
            while z[k + 1] < q as f64 {
                k += 1;
            }
            let p = v[k];
            let d = q as f64 - p as f64;
            *slot = d * d + f[p];
        }
    }
}
