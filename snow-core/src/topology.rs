use glam::IVec2;

use crate::types::CellId;

/// Axial offsets of the six hexagonal neighbors, at 0°, 60°, 120°, 180°,
/// 240° and 300°. Direction `k + 3` is always the opposite of `k`.
pub const HEX_DIRECTIONS: [IVec2; 6] = [
    IVec2::new(1, 0),
    IVec2::new(1, -1),
    IVec2::new(0, -1),
    IVec2::new(-1, 0),
    IVec2::new(-1, 1),
    IVec2::new(0, 1),
];

/// Hexagonal adjacency laid over a square `width × width` index grid.
///
/// The same direction table applies to every cell (axial coordinates), so
/// the neighbor relation is symmetric and translation invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HexTopology {
    width: i32,
}

impl HexTopology {
    /// `width` is bounded by [`crate::config::MAX_GRID_SIZE`] once the
    /// configuration has been validated.
    pub fn new(width: usize) -> Self {
        debug_assert!(width <= i32::MAX as usize);
        Self {
            width: width as i32,
        }
    }

    /// Side length of the square index grid.
    pub fn width(&self) -> usize {
        self.width as usize
    }

    /// Total cells, `width * width`; the length of every per-cell array.
    pub fn cell_count(&self) -> usize {
        self.width() * self.width()
    }

    /// The seed cell `(width / 2, width / 2)`. Exact for odd widths.
    pub fn center(&self) -> IVec2 {
        IVec2::splat(self.width / 2)
    }

    /// `true` iff `0 <= x, y < width`.
    #[inline]
    pub fn in_bounds(&self, c: IVec2) -> bool {
        c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.width
    }

    /// The six neighbor coordinates of `c`, in [`HEX_DIRECTIONS`] order.
    /// Some may be out of bounds.
    #[inline]
    pub fn neighbors(&self, c: IVec2) -> [IVec2; 6] {
        HEX_DIRECTIONS.map(|d| c + d)
    }

    /// Row-major index of `c`.
    ///
    /// ### Parameters
    /// - `c` - Coordinate that must satisfy [`HexTopology::in_bounds`].
    ///
    /// ### Returns
    /// `y * width + x`, the position of `c` in every per-cell array.
    #[inline]
    pub fn index_of(&self, c: IVec2) -> CellId {
        debug_assert!(self.in_bounds(c), "{c} outside {0}x{0} grid", self.width);
        c.y as usize * self.width() + c.x as usize
    }

    /// Inverse of [`HexTopology::index_of`].
    #[inline]
    pub fn coord_of(&self, id: CellId) -> IVec2 {
        let w = self.width();
        IVec2::new((id % w) as i32, (id / w) as i32)
    }

    /// All coordinates in row-major order, matching [`CellId`] order.
    pub fn coords(&self) -> impl Iterator<Item = IVec2> + use<> {
        let topo = *self;
        (0..topo.cell_count()).map(move |id| topo.coord_of(id))
    }
}
