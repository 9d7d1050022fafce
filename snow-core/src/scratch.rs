use std::collections::TryReserveError;

use crate::types::CellId;

/// Reusable per-step buffers for the vapor-diffusion phases.
///
/// Each phase reads the previous phase's buffer and writes its own, so
/// no phase ever observes a value produced earlier in the same pass:
///
/// - `receptive` / `vapor` — written by classification (`u`).
/// - `diffused` — written by diffusion (`u'`).
/// - `water` — written by accumulation (`s_new`).
/// - `pending` — cells that reached the freeze threshold this step.
///
/// Buffers outlive a single step only as reusable storage; their contents
/// are rewritten in full every step.
#[derive(Debug, Default)]
pub struct StepBuffers {
    pub receptive: Vec<bool>,
    pub vapor: Vec<f64>,
    pub diffused: Vec<f64>,
    pub water: Vec<f64>,
    pub pending: Vec<CellId>,
}

impl StepBuffers {
    /// Creates buffers sized for `len` cells.
    ///
    /// ### Parameters
    /// - `len` - Number of cells in the grid.
    pub fn with_len(len: usize) -> Self {
        Self {
            receptive: vec![false; len],
            vapor: vec![0.0; len],
            diffused: vec![0.0; len],
            water: vec![0.0; len],
            pending: Vec::with_capacity(len),
        }
    }

    /// Ensures every buffer holds exactly `len` cells and is cleared.
    ///
    /// Growth is fallible: memory is requested with
    /// [`Vec::try_reserve_exact`] so exhaustion surfaces as an error rather
    /// than an abort. `pending` gets capacity for `len` ids so pushing
    /// during the step never reallocates.
    ///
    /// ### Errors
    /// Returns the first [`TryReserveError`]; buffers already grown keep
    /// their new size, which is harmless since they are cleared on the
    /// next call.
    pub fn ensure_len(&mut self, len: usize) -> Result<(), TryReserveError> {
        try_resize(&mut self.receptive, len, false)?;
        try_resize(&mut self.vapor, len, 0.0)?;
        try_resize(&mut self.diffused, len, 0.0)?;
        try_resize(&mut self.water, len, 0.0)?;
        self.pending.clear();
        self.pending.try_reserve(len)?;
        self.clear();
        Ok(())
    }

    /// Resets all entries, keeping lengths.
    pub fn clear(&mut self) {
        self.receptive.fill(false);
        self.vapor.fill(0.0);
        self.diffused.fill(0.0);
        self.water.fill(0.0);
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.water.len()
    }

    pub fn is_empty(&self) -> bool {
        self.water.is_empty()
    }
}

/// Resizes `buf` to `len`, requesting any extra memory fallibly.
pub(crate) fn try_resize<T: Clone>(
    buf: &mut Vec<T>,
    len: usize,
    fill: T,
) -> Result<(), TryReserveError> {
    if buf.len() < len {
        buf.try_reserve_exact(len - buf.len())?;
    }
    buf.resize(len, fill);
    Ok(())
}
