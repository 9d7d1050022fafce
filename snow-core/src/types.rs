/// Identifier for a cell in a [`crate::grid::Grid`].
///
/// This is a row-major index (`y * width + x`) into the grid's parallel
/// arrays, and is only meaningful for grids of the same width.
pub type CellId = usize;
