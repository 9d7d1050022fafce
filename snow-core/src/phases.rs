//! The three phases of one vapor-diffusion generation.
//!
//! A step runs them in order, each reading only the committed [`Grid`]
//! and the buffers written by earlier phases:
//! 1. [`classification_phase`] — mark receptive cells and split water
//!    into frozen-in and free vapor `u`.
//! 2. [`diffusion_phase`] — relax `u` toward its neighbor mean into a
//!    separate buffer `u'`.
//! 3. [`accumulation_phase`] — compute `s_new` and collect cells that
//!    reach the freeze threshold.
//!
//! None of the phases mutate the grid. The caller commits all buffers at
//! once, so scan order never leaks into the result.

use glam::IVec2;

use crate::{
    config::{Accumulation, Params},
    grid::Grid,
    scratch::StepBuffers,
};

/// Water content at which a receptive cell freezes.
pub const FREEZE_THRESHOLD: f64 = 1.0;

/// Splits each cell's water into locked and free vapor.
///
/// For every non-border cell, `receptive = frozen || has frozen neighbor`.
/// Receptive cells contribute `u = 0`; all other cells contribute their
/// whole water content `u = s`. Border cells are never receptive and
/// contribute the current ambient level `u = beta`.
///
/// ### Parameters
/// - `grid` - Committed state from the previous step; read only.
/// - `params` - Snapshot of the parameters for this step.
/// - `buf` - Scratch buffers; `receptive` and `vapor` are written.
pub fn classification_phase(grid: &Grid, params: &Params, buf: &mut StepBuffers) {
    let water = grid.water();
    for (id, c) in grid.topology().coords().enumerate() {
        if grid.is_border(c) {
            buf.receptive[id] = false;
            buf.vapor[id] = params.beta;
            continue;
        }

        let receptive = grid.is_receptive(c);
        buf.receptive[id] = receptive;
        buf.vapor[id] = if receptive { 0.0 } else { water[id] };
    }
}

/// Diffuses free vapor one step.
///
/// For non-border cells:
/// `u' = u + (alpha / 2) * (mean(u over in-bounds neighbors) - u)`,
/// floored at `0.0` (large `alpha` can overshoot next to a sink).
/// Border cells are pinned to `u' = beta`.
///
/// Reads `buf.vapor` and writes `buf.diffused` only, so every cell sees
/// its neighbors' values from [`classification_phase`].
pub fn diffusion_phase(grid: &Grid, params: &Params, buf: &mut StepBuffers) {
    let rate = params.alpha / 2.0;
    for (id, c) in grid.topology().coords().enumerate() {
        if grid.is_border(c) {
            buf.diffused[id] = params.beta;
            continue;
        }

        let u = buf.vapor[id];
        let mean = neighbor_mean(grid, c, &buf.vapor).unwrap_or(u);
        buf.diffused[id] = (u + rate * (mean - u)).max(0.0);
    }
}

/// Computes the new water content and the cells that freeze this step.
///
/// Receptivity is taken from [`classification_phase`]; the frozen mask
/// is not touched before the commit, so it is the same snapshot.
///
/// - Border cells: `s_new = beta`.
/// - Frozen cells: `s` unchanged.
/// - Receptive unfrozen cells: `s_new = s + gamma`, plus `u'` under
///   [`Accumulation::Absorbing`]. Cells reaching [`FREEZE_THRESHOLD`] are
///   pushed to `buf.pending`.
/// - Everything else: `s_new = u'`.
pub fn accumulation_phase(
    grid: &Grid,
    params: &Params,
    accumulation: Accumulation,
    buf: &mut StepBuffers,
) {
    let water = grid.water();
    let frozen = grid.frozen();

    for (id, c) in grid.topology().coords().enumerate() {
        if grid.is_border(c) {
            buf.water[id] = params.beta;
            continue;
        }

        if !buf.receptive[id] {
            buf.water[id] = buf.diffused[id];
            continue;
        }

        if frozen[id] {
            buf.water[id] = water[id];
            continue;
        }

        let gathered = match accumulation {
            Accumulation::Absorbing => params.gamma + buf.diffused[id],
            Accumulation::Background => params.gamma,
        };
        let s = water[id] + gathered;
        buf.water[id] = s;
        if s >= FREEZE_THRESHOLD {
            buf.pending.push(id);
        }
    }
}

/// Mean of `values` over the in-bounds neighbors of `c`, or `None` if it
/// has none.
///
/// Values are summed as opposite-direction pairs, middle pair last. The
/// grid's exact symmetries (180° rotation, reflection across either
/// diagonal) only permute pairs 0 and 2 or swap operands within a pair,
/// so mirrored cells get bit-identical sums.
fn neighbor_mean(grid: &Grid, c: IVec2, values: &[f64]) -> Option<f64> {
    let topo = grid.topology();
    let mut around = [0.0; 6];
    let mut count = 0u32;
    for (k, n) in topo.neighbors(c).into_iter().enumerate() {
        if topo.in_bounds(n) {
            around[k] = values[topo.index_of(n)];
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }

    let pair = |k: usize| around[k] + around[k + 3];
    Some((pair(1) + (pair(0) + pair(2))) / f64::from(count))
}
