#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{CoreError, Result};
use blockling_data::{Particle, Vec3};
use std::collections::HashMap;

/// Integer cell coordinates, `floor(position / cell_size)` per axis.
pub type CellKey = (i32, i32, i32);

/// Uniform grid over particle positions for neighbour queries.
///
/// Uses the same offset-array layout as a compressed sparse row matrix:
/// occupied cells get a dense slot, and
/// `particle_indices[cell_offsets[slot]..cell_offsets[slot + 1]]` lists the
/// particles in that cell in ascending index order.
///
/// The grid is a snapshot. It is rebuilt from the positions at the start of a
/// physics step and never updated while the step mutates particles.
///
/// # Examples
/// ```
/// use blockling_core::spatial_grid::SpatialGrid;
/// use blockling_data::Vec3;
///
/// let positions = vec![Vec3::new(0.5, 0.5, 0.5), Vec3::new(1.5, 0.5, 0.5), Vec3::splat(40.0)];
/// let grid = SpatialGrid::from_positions(&positions, 1.0).unwrap();
///
/// assert_eq!(grid.neighbors_of(0), vec![1]);
/// assert!(grid.neighbors_of(2).is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct SpatialGrid {
    cell_size: f64,
    cell_lookup: HashMap<CellKey, usize>,
    cell_offsets: Vec<usize>,
    particle_indices: Vec<usize>,
    particle_cells: Vec<Option<CellKey>>,
}

impl SpatialGrid {
    pub fn build(particles: &[Particle], cell_size: f64) -> Result<Self> {
        let positions: Vec<Vec3> = particles.iter().map(|p| p.position).collect();
        Self::from_positions(&positions, cell_size)
    }

    pub fn from_positions(positions: &[Vec3], cell_size: f64) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(CoreError::InvalidCellSize(cell_size));
        }

        #[cfg(feature = "parallel")]
        let particle_cells: Vec<Option<CellKey>> = positions
            .par_iter()
            .map(|&p| cell_key(p, cell_size))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let particle_cells: Vec<Option<CellKey>> =
            positions.iter().map(|&p| cell_key(p, cell_size)).collect();

        // Slots are handed out in first-seen order so the layout only depends
        // on the input order.
        let mut cell_lookup: HashMap<CellKey, usize> = HashMap::new();
        let mut counts: Vec<usize> = Vec::new();
        for key in particle_cells.iter().flatten() {
            let slot = *cell_lookup.entry(*key).or_insert_with(|| {
                counts.push(0);
                counts.len() - 1
            });
            counts[slot] += 1;
        }

        let mut cell_offsets = Vec::with_capacity(counts.len() + 1);
        let mut total = 0;
        for &count in &counts {
            cell_offsets.push(total);
            total += count;
        }
        cell_offsets.push(total);

        let mut particle_indices = vec![0; total];
        let mut cursor = cell_offsets[..counts.len()].to_vec();
        for (idx, key) in particle_cells.iter().enumerate() {
            if let Some(slot) = key.and_then(|k| cell_lookup.get(&k).copied()) {
                particle_indices[cursor[slot]] = idx;
                cursor[slot] += 1;
            }
        }

        Ok(Self {
            cell_size,
            cell_lookup,
            cell_offsets,
            particle_indices,
            particle_cells,
        })
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Number of occupied cells.
    pub fn cell_count(&self) -> usize {
        self.cell_lookup.len()
    }

    /// Number of particles that landed in a cell (non-finite positions are
    /// left out of the index).
    pub fn indexed_len(&self) -> usize {
        self.particle_indices.len()
    }

    #[inline]
    pub fn cell_of(&self, position: Vec3) -> Option<CellKey> {
        cell_key(position, self.cell_size)
    }

    #[inline]
    fn cell_slice(&self, key: CellKey) -> &[usize] {
        match self.cell_lookup.get(&key) {
            Some(&slot) => {
                &self.particle_indices[self.cell_offsets[slot]..self.cell_offsets[slot + 1]]
            }
            None => &[],
        }
    }

    /// Calls `callback` for every particle in the 27 cells around particle
    /// `idx`, excluding `idx` itself. Cells are visited in fixed z, y, x order
    /// and particles within a cell in index order.
    pub fn for_each_neighbor<F>(&self, idx: usize, mut callback: F)
    where
        F: FnMut(usize),
    {
        let Some((cx, cy, cz)) = self.particle_cells.get(idx).copied().flatten() else {
            return;
        };
        for dz in -1..=1 {
            let Some(z) = cz.checked_add(dz) else { continue };
            for dy in -1..=1 {
                let Some(y) = cy.checked_add(dy) else { continue };
                for dx in -1..=1 {
                    let Some(x) = cx.checked_add(dx) else { continue };
                    for &other in self.cell_slice((x, y, z)) {
                        if other != idx {
                            callback(other);
                        }
                    }
                }
            }
        }
    }

    /// Particles in the same and adjacent cells as particle `idx`.
    pub fn neighbors_of(&self, idx: usize) -> Vec<usize> {
        let mut result = Vec::new();
        self.for_each_neighbor(idx, |other| result.push(other));
        result
    }

    /// Calls `callback` for every particle whose cell overlaps the cube of
    /// half-width `radius` around `position`. Distances are not checked.
    pub fn query_callback<F>(&self, position: Vec3, radius: f64, mut callback: F)
    where
        F: FnMut(usize),
    {
        let (Some(min), Some(max)) = (
            cell_key(position - Vec3::splat(radius), self.cell_size),
            cell_key(position + Vec3::splat(radius), self.cell_size),
        ) else {
            return;
        };

        let span = |lo: i32, hi: i32| (i64::from(hi) - i64::from(lo) + 1).max(0) as u128;
        let volume = span(min.0, max.0) * span(min.1, max.1) * span(min.2, max.2);

        if volume > self.cell_lookup.len() as u128 {
            // Sparse grid relative to the query box: scan occupied cells.
            for (idx, key) in self.particle_cells.iter().enumerate() {
                if let Some((x, y, z)) = *key {
                    if (min.0..=max.0).contains(&x)
                        && (min.1..=max.1).contains(&y)
                        && (min.2..=max.2).contains(&z)
                    {
                        callback(idx);
                    }
                }
            }
            return;
        }

        for z in min.2..=max.2 {
            for y in min.1..=max.1 {
                for x in min.0..=max.0 {
                    for &idx in self.cell_slice((x, y, z)) {
                        callback(idx);
                    }
                }
            }
        }
    }

    #[inline]
    pub fn query_into(&self, position: Vec3, radius: f64, result: &mut Vec<usize>) {
        result.clear();
        self.query_callback(position, radius, |idx| result.push(idx));
    }

    pub fn count_nearby(&self, position: Vec3, radius: f64) -> usize {
        let mut count = 0;
        self.query_callback(position, radius, |_| count += 1);
        count
    }
}

/// Cell for a position, or `None` when any coordinate is non-finite or would
/// overflow an `i32` cell index.
#[inline]
fn cell_key(position: Vec3, cell_size: f64) -> Option<CellKey> {
    let axis = |v: f64| -> Option<i32> {
        if !v.is_finite() {
            return None;
        }
        let c = (v / cell_size).floor();
        if c < f64::from(i32::MIN) || c > f64::from(i32::MAX) {
            None
        } else {
            Some(c as i32)
        }
    };
    Some((axis(position.x)?, axis(position.y)?, axis(position.z)?))
}
