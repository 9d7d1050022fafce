use glam::IVec2;

use crate::{topology::HexTopology, types::CellId};

/// Persistent crystal state, stored as parallel per-cell arrays.
///
/// - `frozen` — cells that have solidified; never cleared except by [`Grid::seed`].
/// - `water` — accumulated water content `s`.
/// - `vapor` — the last committed diffusion result `u`, kept for diagnostics.
///
/// Cells within `border_margin` of the edge form the border ring: never
/// receptive, never frozen, held at the ambient level.
#[derive(Debug, Clone)]
pub struct Grid {
    topology: HexTopology,
    border_margin: i32,
    frozen: Vec<bool>,
    water: Vec<f64>,
    vapor: Vec<f64>,
    frozen_count: usize,
}

impl Grid {
    /// Allocates a `width × width` grid and seeds it with [`Grid::seed`].
    ///
    /// ### Parameters
    /// - `width` - Odd side length that has passed [`crate::Config::validate`],
    ///   so the grid is never empty and the border leaves an interior.
    /// - `border_margin` - Thickness of the border ring, at least 1.
    /// - `beta` - Ambient vapor level every cell starts at.
    pub(crate) fn new(width: usize, border_margin: usize, beta: f64) -> Self {
        let topology = HexTopology::new(width);
        let len = topology.cell_count();
        let mut grid = Self {
            topology,
            border_margin: border_margin as i32,
            frozen: vec![false; len],
            water: vec![beta; len],
            vapor: vec![0.0; len],
            frozen_count: 0,
        };
        grid.seed(beta);
        grid
    }

    /// Reinitializes in place: every cell unfrozen at `s = beta`, `u = 0`,
    /// then the center cell frozen at `s = 1.0`.
    pub fn seed(&mut self, beta: f64) {
        self.frozen.fill(false);
        self.water.fill(beta);
        self.vapor.fill(0.0);

        let center = self.topology.index_of(self.topology.center());
        self.frozen[center] = true;
        self.water[center] = 1.0;
        self.frozen_count = 1;
    }

    #[inline]
    pub fn topology(&self) -> &HexTopology {
        &self.topology
    }

    /// Thickness of the border ring in cells.
    pub fn border_margin(&self) -> usize {
        self.border_margin as usize
    }

    /// `true` for cells inside the border ring. Coordinates outside the
    /// grid also count as border.
    #[inline]
    pub fn is_border(&self, c: IVec2) -> bool {
        let far = self.topology.width() as i32 - self.border_margin;
        c.min_element() < self.border_margin || c.max_element() >= far
    }

    /// Frozen mask indexed by [`CellId`].
    #[inline]
    pub fn frozen(&self) -> &[bool] {
        &self.frozen
    }

    /// Accumulated water `s` per cell. Frozen cells hold at least `1.0`.
    #[inline]
    pub fn water(&self) -> &[f64] {
        &self.water
    }

    /// Diffused vapor `u'` from the last committed step; all zero right
    /// after a seed.
    #[inline]
    pub fn vapor(&self) -> &[f64] {
        &self.vapor
    }

    /// Number of frozen cells, kept in step with the mask.
    pub fn frozen_count(&self) -> usize {
        self.frozen_count
    }

    /// Whether any of the six neighbors of `c` is frozen.
    ///
    /// ### Parameters
    /// - `c` - Coordinate to test; neighbors off the grid are ignored.
    pub fn has_frozen_neighbor(&self, c: IVec2) -> bool {
        self.topology
            .neighbors(c)
            .into_iter()
            .any(|n| self.topology.in_bounds(n) && self.frozen[self.topology.index_of(n)])
    }

    /// Frozen, or unfrozen with a frozen neighbor. Border cells never are.
    pub fn is_receptive(&self, c: IVec2) -> bool {
        if self.is_border(c) {
            return false;
        }
        self.frozen[self.topology.index_of(c)] || self.has_frozen_neighbor(c)
    }

    /// Whether the frozen cells form one connected set under hexagonal
    /// adjacency.
    pub fn frozen_is_connected(&self) -> bool {
        let Some(start) = self.frozen.iter().position(|&f| f) else {
            return true;
        };

        let mut seen = vec![false; self.frozen.len()];
        let mut stack = vec![start];
        seen[start] = true;
        let mut reached = 1;

        while let Some(id) = stack.pop() {
            for n in self.topology.neighbors(self.topology.coord_of(id)) {
                if !self.topology.in_bounds(n) {
                    continue;
                }
                let nid = self.topology.index_of(n);
                if self.frozen[nid] && !seen[nid] {
                    seen[nid] = true;
                    reached += 1;
                    stack.push(nid);
                }
            }
        }
        reached == self.frozen_count
    }

    /// Swaps freshly computed water and vapor buffers into the grid. The
    /// caller gets the previous generation's arrays back for reuse.
    pub(crate) fn swap_fields(&mut self, water: &mut Vec<f64>, vapor: &mut Vec<f64>) {
        debug_assert_eq!(water.len(), self.water.len());
        debug_assert_eq!(vapor.len(), self.vapor.len());
        std::mem::swap(&mut self.water, water);
        std::mem::swap(&mut self.vapor, vapor);
    }

    /// Freezes every listed cell, raising its water to at least `1.0`.
    ///
    /// ### Returns
    /// The number of cells that were not frozen before; duplicates and
    /// already-frozen ids are not counted.
    pub(crate) fn freeze_all(&mut self, ids: &[CellId]) -> usize {
        let mut added = 0;
        for &id in ids {
            debug_assert!(!self.is_border(self.topology.coord_of(id)));
            if self.frozen[id] {
                continue;
            }
            self.frozen[id] = true;
            self.water[id] = self.water[id].max(1.0);
            added += 1;
        }
        self.frozen_count += added;
        added
    }
}
