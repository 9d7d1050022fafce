use std::ops::RangeInclusive;

use crate::error::ConfigError;

/// Valid range of the diffusion rate `alpha`.
pub const ALPHA_RANGE: RangeInclusive<f64> = 0.5..=5.0;
/// Valid range of the ambient vapor level `beta`.
pub const BETA_RANGE: RangeInclusive<f64> = 0.1..=0.9;
/// Valid range of the background vapor increment `gamma`.
pub const GAMMA_RANGE: RangeInclusive<f64> = 0.0..=0.1;
/// Valid range of the per-direction freeze probability.
pub const PROBABILITY_RANGE: RangeInclusive<f64> = 0.0..=1.0;

pub const MIN_GRID_SIZE: usize = 5;
pub const MAX_GRID_SIZE: usize = 1025;

pub const DEFAULT_GROWTH_PROBABILITY: f64 = 0.35;

/// Tunable model parameters.
///
/// Construction and [`crate::CrystalAutomaton::reset`] reject values
/// outside their ranges via [`Params::validate`]. Live edits go through
/// the `set_*` methods, which clamp instead.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Params {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 0.5,
            gamma: 0.01,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("alpha", self.alpha, &ALPHA_RANGE)?;
        check_range("beta", self.beta, &BETA_RANGE)?;
        check_range("gamma", self.gamma, &GAMMA_RANGE)
    }

    pub fn set_alpha(&mut self, value: f64) {
        clamp_into("alpha", &mut self.alpha, value, &ALPHA_RANGE);
    }

    pub fn set_beta(&mut self, value: f64) {
        clamp_into("beta", &mut self.beta, value, &BETA_RANGE);
    }

    pub fn set_gamma(&mut self, value: f64) {
        clamp_into("gamma", &mut self.gamma, value, &GAMMA_RANGE);
    }
}

/// How a receptive, not yet frozen cell gathers water each generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Accumulation {
    /// `s + gamma + u'`: vapor diffused into the cell this generation is
    /// absorbed in the same generation.
    #[default]
    Absorbing,
    /// `s + gamma`: receptive cells only sink vapor, so growth is driven
    /// by the background increment alone.
    Background,
}

/// Growth rule chosen when the automaton is built. Rules never mix
/// within one run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RuleKind {
    VaporDiffusion { accumulation: Accumulation },
    ProbabilisticFreeze { probability: f64, seed: u64 },
}

impl Default for RuleKind {
    fn default() -> Self {
        Self::VaporDiffusion {
            accumulation: Accumulation::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    /// Requested grid size. Even sizes lose one row and column, see
    /// [`Config::grid_width`].
    pub size: usize,
    /// Width of the border ring pinned at `beta`.
    pub border_margin: usize,
    pub params: Params,
    pub rule: RuleKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            size: 64,
            border_margin: 1,
            params: Params::default(),
            rule: RuleKind::default(),
        }
    }
}

impl Config {
    /// Working grid width: always odd, so `(width / 2, width / 2)` is the
    /// exact center.
    pub fn grid_width(&self) -> usize {
        if self.size % 2 == 0 {
            self.size.saturating_sub(1)
        } else {
            self.size
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_GRID_SIZE..=MAX_GRID_SIZE).contains(&self.size) {
            return Err(ConfigError::GridSize {
                size: self.size,
                min: MIN_GRID_SIZE,
                max: MAX_GRID_SIZE,
            });
        }

        // At least three interior cells across.
        let width = self.grid_width();
        if self.border_margin == 0 || width <= 2 * self.border_margin + 2 {
            return Err(ConfigError::BorderMargin {
                margin: self.border_margin,
                width,
            });
        }

        self.params.validate()?;

        if let RuleKind::ProbabilisticFreeze { probability, .. } = self.rule {
            check_range("probability", probability, &PROBABILITY_RANGE)?;
        }
        Ok(())
    }
}

pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    range: &RangeInclusive<f64>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Parameter {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

fn clamp_into(name: &str, slot: &mut f64, value: f64, range: &RangeInclusive<f64>) {
    if value.is_nan() {
        log::warn!("ignoring NaN write to {name}, keeping {slot}");
        return;
    }
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        log::debug!("{name} = {value} clamped to {clamped}");
    }
    *slot = clamped;
}
