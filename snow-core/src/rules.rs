//! Swappable growth rules behind one [`GrowthRule`] interface.
//!
//! A rule is chosen once, when the automaton is built, and owns whatever
//! scratch state it needs between steps.

use rand::{Rng, SeedableRng, distr::Bernoulli, rngs::StdRng};

use crate::{
    config::{self, Accumulation, PROBABILITY_RANGE, Params, RuleKind},
    error::{ConfigError, StepError},
    grid::Grid,
    phases,
    scratch::{self, StepBuffers},
    types::CellId,
};

/// One generation of crystal growth.
pub trait GrowthRule: std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Restores the rule's own state to how it was at construction.
    fn reset(&mut self) {}

    /// Advances `grid` by exactly one generation.
    ///
    /// ### Returns
    /// The number of cells newly frozen this generation.
    ///
    /// ### Errors
    /// [`StepError::Allocation`] if scratch storage cannot be acquired. The
    /// grid is left exactly as it was.
    fn advance(&mut self, grid: &mut Grid, params: &Params) -> Result<usize, StepError>;
}

/// Builds the rule described by `kind`.
///
/// ### Errors
/// [`ConfigError::Parameter`] if a probabilistic rule carries a
/// probability outside [`PROBABILITY_RANGE`].
pub fn build_rule(kind: RuleKind) -> Result<Box<dyn GrowthRule>, ConfigError> {
    Ok(match kind {
        RuleKind::VaporDiffusion { accumulation } => Box::new(VaporDiffusion::new(accumulation)),
        RuleKind::ProbabilisticFreeze { probability, seed } => {
            Box::new(ProbabilisticFreeze::new(probability, seed)?)
        }
    })
}

/// Reiter-style vapor diffusion with double-buffered phases.
#[derive(Debug)]
pub struct VaporDiffusion {
    accumulation: Accumulation,
    buffers: StepBuffers,
}

impl VaporDiffusion {
    pub fn new(accumulation: Accumulation) -> Self {
        Self {
            accumulation,
            buffers: StepBuffers::default(),
        }
    }

    pub fn accumulation(&self) -> Accumulation {
        self.accumulation
    }
}

impl GrowthRule for VaporDiffusion {
    fn name(&self) -> &'static str {
        match self.accumulation {
            Accumulation::Absorbing => "vapor diffusion (absorbing)",
            Accumulation::Background => "vapor diffusion (background)",
        }
    }

    fn advance(&mut self, grid: &mut Grid, params: &Params) -> Result<usize, StepError> {
        let cells = grid.topology().cell_count();
        self.buffers
            .ensure_len(cells)
            .map_err(|source| allocation_failed(cells, source))?;

        phases::classification_phase(grid, params, &mut self.buffers);
        phases::diffusion_phase(grid, params, &mut self.buffers);
        phases::accumulation_phase(grid, params, self.accumulation, &mut self.buffers);

        // Commit: new fields and freezes land together.
        grid.swap_fields(&mut self.buffers.water, &mut self.buffers.diffused);
        Ok(grid.freeze_all(&self.buffers.pending))
    }
}

/// Direct probabilistic freezing with no vapor field.
///
/// Every frozen cell tries each of its six directions; an unfrozen,
/// non-border neighbor freezes with probability `probability` per try.
/// Attempts read the frozen mask from the start of the step and are
/// committed together.
#[derive(Debug)]
pub struct ProbabilisticFreeze {
    coin: Bernoulli,
    probability: f64,
    seed: u64,
    rng: StdRng,
    /// Cells already proposed this step, so `pending` holds each id once.
    claimed: Vec<bool>,
    pending: Vec<CellId>,
}

impl ProbabilisticFreeze {
    /// Creates the rule with its RNG seeded from `seed`.
    ///
    /// ### Parameters
    /// - `probability` - Chance that one attempt freezes its target.
    /// - `seed` - RNG seed; [`GrowthRule::reset`] restarts from it.
    ///
    /// ### Errors
    /// [`ConfigError::Parameter`] if `probability` is NaN or outside
    /// [`PROBABILITY_RANGE`].
    pub fn new(probability: f64, seed: u64) -> Result<Self, ConfigError> {
        config::check_range("probability", probability, &PROBABILITY_RANGE)?;
        let coin = Bernoulli::new(probability).map_err(|_| ConfigError::Parameter {
            name: "probability",
            value: probability,
            min: *PROBABILITY_RANGE.start(),
            max: *PROBABILITY_RANGE.end(),
        })?;

        Ok(Self {
            coin,
            probability,
            seed,
            rng: StdRng::seed_from_u64(seed),
            claimed: Vec::new(),
            pending: Vec::new(),
        })
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl GrowthRule for ProbabilisticFreeze {
    fn name(&self) -> &'static str {
        "probabilistic freeze"
    }

    fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
    }

    fn advance(&mut self, grid: &mut Grid, _params: &Params) -> Result<usize, StepError> {
        let topo = *grid.topology();
        let cells = topo.cell_count();

        // Targets are deduplicated, so there are never more than one per
        // cell or six per frozen cell.
        let targets = grid.frozen_count().saturating_mul(6).min(cells);
        scratch::try_resize(&mut self.claimed, cells, false)
            .map_err(|source| allocation_failed(cells, source))?;
        self.claimed.fill(false);
        self.pending.clear();
        self.pending
            .try_reserve(targets)
            .map_err(|source| allocation_failed(cells, source))?;

        let frozen = grid.frozen();
        for id in (0..cells).filter(|&id| frozen[id]) {
            for n in topo.neighbors(topo.coord_of(id)) {
                if !topo.in_bounds(n) || grid.is_border(n) {
                    continue;
                }
                let nid = topo.index_of(n);
                if frozen[nid] {
                    continue;
                }
                // One draw per attempt, even for a target already claimed.
                if self.rng.sample(self.coin) && !self.claimed[nid] {
                    self.claimed[nid] = true;
                    self.pending.push(nid);
                }
            }
        }

        Ok(grid.freeze_all(&self.pending))
    }
}

fn allocation_failed(cells: usize, source: std::collections::TryReserveError) -> StepError {
    log::error!("rejecting step: scratch allocation for {cells} cells failed: {source}");
    StepError::Allocation { cells, source }
}
