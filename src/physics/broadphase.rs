//! Broadphase collision detection using a uniform grid.

use glam::DVec2;
use rustc_hash::FxHashMap;

use super::collider::Aabb;

type CellKey = (i32, i32);

/// Smallest cell edge the grid will use, in world units.
pub const MIN_CELL_SIZE: f64 = 1e-3;

/// Colliders spanning more cells than this skip the grid and are tested against everything.
pub const MAX_CELLS_PER_COLLIDER: i64 = 64;

/// How the grid picks its cell edge length each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellSize {
    /// Fixed edge length in world units.
    Fixed(f64),
    /// Median AABB diagonal of the colliders present this tick.
    Auto,
}

impl Default for CellSize {
    fn default() -> Self {
        Self::Auto
    }
}

/// Uniform grid broadphase for near-linear pair detection in sparse scenes.
///
/// Cell storage and the pair buffer are kept between ticks and only cleared, so a steady-state
/// scene does not allocate.
#[derive(Debug, Default)]
pub struct UniformGrid {
    cell_size: CellSize,
    resolved_size: f64,
    cells: FxHashMap<CellKey, Vec<u32>>,
    oversized: Vec<u32>,
    pairs: Vec<(usize, usize)>,
    diagonals: Vec<f64>,
}

impl UniformGrid {
    pub fn new(cell_size: CellSize) -> Self {
        Self {
            cell_size,
            resolved_size: MIN_CELL_SIZE,
            ..Self::default()
        }
    }

    /// Cell edge used by the most recent [`find_pairs`](Self::find_pairs) call.
    #[inline]
    pub fn cell_size(&self) -> f64 {
        self.resolved_size
    }

    /// Colliders that were too large for the grid on the last call.
    #[inline]
    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }

    /// Compute cell coordinates for a point.
    #[inline]
    fn cell_coords(&self, point: DVec2) -> CellKey {
        let inv = 1.0 / self.resolved_size;
        ((point.x * inv).floor() as i32, (point.y * inv).floor() as i32)
    }

    fn resolve_cell_size(&mut self, aabbs: &[Aabb]) -> f64 {
        let size = match self.cell_size {
            CellSize::Fixed(size) => size,
            CellSize::Auto => {
                self.diagonals.clear();
                self.diagonals.extend(aabbs.iter().map(Aabb::diagonal));
                self.diagonals.sort_unstable_by(f64::total_cmp);
                self.diagonals
                    .get(self.diagonals.len() / 2)
                    .copied()
                    .unwrap_or(MIN_CELL_SIZE)
            }
        };
        if size.is_finite() {
            size.max(MIN_CELL_SIZE)
        } else {
            MIN_CELL_SIZE
        }
    }

    /// Find all index pairs `(i, j)`, `i < j`, whose AABBs overlap.
    ///
    /// The result is sorted and free of duplicates. Touching boxes count as overlapping.
    pub fn find_pairs(&mut self, aabbs: &[Aabb]) -> &[(usize, usize)] {
        self.pairs.clear();
        self.oversized.clear();
        self.cells.retain(|_, occupants| !occupants.is_empty());
        for occupants in self.cells.values_mut() {
            occupants.clear();
        }

        if aabbs.len() < 2 {
            return &self.pairs;
        }

        self.resolved_size = self.resolve_cell_size(aabbs);

        // Insert entries into cells
        for (index, aabb) in aabbs.iter().enumerate() {
            let min_cell = self.cell_coords(aabb.min);
            let max_cell = self.cell_coords(aabb.max);
            let span = (max_cell.0 as i64 - min_cell.0 as i64 + 1)
                * (max_cell.1 as i64 - min_cell.1 as i64 + 1);
            if span > MAX_CELLS_PER_COLLIDER {
                self.oversized.push(index as u32);
                continue;
            }

            for cx in min_cell.0..=max_cell.0 {
                for cy in min_cell.1..=max_cell.1 {
                    self.cells.entry((cx, cy)).or_default().push(index as u32);
                }
            }
        }

        // Find pairs within each cell
        for cell in self.cells.values() {
            for (n, &i) in cell.iter().enumerate() {
                for &j in &cell[n + 1..] {
                    let (i, j) = (i as usize, j as usize);
                    if aabbs[i].overlaps(&aabbs[j]) {
                        self.pairs.push((i.min(j), i.max(j)));
                    }
                }
            }
        }

        for &big in &self.oversized {
            let big = big as usize;
            for (other, aabb) in aabbs.iter().enumerate() {
                if other != big && aabbs[big].overlaps(aabb) {
                    self.pairs.push((big.min(other), big.max(other)));
                }
            }
        }

        // A pair sharing several cells is reported once
        self.pairs.sort_unstable();
        self.pairs.dedup();
        &self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, half: f64) -> Aabb {
        Aabb::new(DVec2::new(x - half, y - half), DVec2::new(x + half, y + half))
    }

    fn brute_force(aabbs: &[Aabb]) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for i in 0..aabbs.len() {
            for j in (i + 1)..aabbs.len() {
                if aabbs[i].overlaps(&aabbs[j]) {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }

    #[test]
    fn test_broadphase_empty_and_single() {
        let mut grid = UniformGrid::new(CellSize::Auto);
        assert!(grid.find_pairs(&[]).is_empty());
        assert!(grid.find_pairs(&[square(0.0, 0.0, 1.0)]).is_empty());
    }

    #[test]
    fn test_broadphase_overlapping() {
        let mut grid = UniformGrid::new(CellSize::Auto);
        let aabbs = [square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)];
        assert_eq!(grid.find_pairs(&aabbs), &[(0, 1)]);
    }

    #[test]
    fn test_broadphase_no_overlap() {
        let mut grid = UniformGrid::new(CellSize::Auto);
        let aabbs = [square(0.0, 0.0, 0.5), square(10.0, 0.0, 0.5)];
        assert!(grid.find_pairs(&aabbs).is_empty());
    }

    #[test]
    fn test_pair_spanning_many_cells_is_reported_once() {
        let mut grid = UniformGrid::new(CellSize::Fixed(1.0));
        let aabbs = [square(0.0, 0.0, 3.0), square(0.5, 0.5, 3.0)];
        assert_eq!(grid.find_pairs(&aabbs), &[(0, 1)]);
    }

    #[test]
    fn test_oversized_collider_still_pairs() {
        let mut grid = UniformGrid::new(CellSize::Fixed(0.5));
        let floor = Aabb::new(DVec2::new(-500.0, -1.0), DVec2::new(500.0, 0.0));
        let aabbs = [
            square(-300.0, 0.5, 0.5),
            floor,
            square(250.0, 0.5, 0.5),
            square(0.0, 50.0, 0.5),
        ];

        let pairs = grid.find_pairs(&aabbs).to_vec();
        assert_eq!(grid.oversized_count(), 1);
        assert_eq!(pairs, vec![(0, 1), (1, 2)]);
    }

    #[test]
    fn test_auto_cell_size_uses_median_diagonal() {
        let mut grid = UniformGrid::new(CellSize::Auto);
        let aabbs = [
            square(0.0, 0.0, 0.5),
            square(5.0, 0.0, 1.5),
            square(9.0, 0.0, 100.0),
        ];
        grid.find_pairs(&aabbs);
        assert!((grid.cell_size() - 3.0 * 2.0f64.sqrt()).abs() < 1e-12);

        let points = [Aabb::new(DVec2::ZERO, DVec2::ZERO), Aabb::new(DVec2::ONE, DVec2::ONE)];
        grid.find_pairs(&points);
        assert_eq!(grid.cell_size(), MIN_CELL_SIZE);
    }

    #[test]
    fn test_matches_brute_force() {
        // Deterministic pseudo-random scene with mixed sizes.
        let mut seed = 0x2545_f491_u64;
        let mut next = || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as f64 / (1u64 << 31) as f64
        };
        let aabbs: Vec<Aabb> = (0..200)
            .map(|_| {
                let x = next() * 100.0;
                let y = next() * 100.0;
                let half = 0.2 + next() * 3.0;
                square(x, y, half)
            })
            .collect();

        let expected = brute_force(&aabbs);
        for cell_size in [CellSize::Auto, CellSize::Fixed(0.7), CellSize::Fixed(25.0)] {
            let mut grid = UniformGrid::new(cell_size);
            assert_eq!(grid.find_pairs(&aabbs), expected.as_slice());
            // Reusing the grid gives the same answer.
            assert_eq!(grid.find_pairs(&aabbs), expected.as_slice());
        }
    }

    #[test]
    fn test_negative_coordinates() {
        let mut grid = UniformGrid::new(CellSize::Fixed(1.0));
        let aabbs = [square(-0.25, -0.25, 0.2), square(0.1, 0.1, 0.2)];
        assert_eq!(grid.find_pairs(&aabbs), &[(0, 1)]);
    }
}
