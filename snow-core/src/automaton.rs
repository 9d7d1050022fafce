use glam::IVec2;

use crate::{
    config::{Config, Params},
    error::{ConfigError, StepError},
    grid::Grid,
    rules::{self, GrowthRule},
};

/// The crystal: grid state, live parameters and the chosen growth rule.
///
/// A driver calls [`CrystalAutomaton::reset`] to seed the grid, then
/// [`CrystalAutomaton::step`] at whatever cadence it likes, reading the
/// frozen mask in between. Parameter edits made between steps take effect
/// at the start of the next step.
#[derive(Debug)]
pub struct CrystalAutomaton {
    grid: Grid,
    params: Params,
    rule: Box<dyn GrowthRule>,
    steps: u64,
}

impl CrystalAutomaton {
    /// Builds an automaton with the rule named in `config.rule`.
    ///
    /// ### Errors
    /// [`ConfigError`] if `config` fails [`Config::validate`].
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;
        let rule = rules::build_rule(config.rule)?;
        Self::with_rule(config, rule)
    }

    /// Builds an automaton with a caller-supplied rule. `config.rule` is
    /// still validated but otherwise ignored.
    pub fn with_rule(config: Config, rule: Box<dyn GrowthRule>) -> Result<Self, ConfigError> {
        config.validate()?;

        let grid = Grid::new(config.grid_width(), config.border_margin, config.params.beta);
        let mut automaton = Self {
            grid,
            params: config.params,
            rule,
            steps: 0,
        };
        automaton.reset(config.params)?;
        Ok(automaton)
    }

    /// Reseeds the grid in place with a single frozen center cell and
    /// adopts `params`.
    ///
    /// ### Errors
    /// [`ConfigError::Parameter`] if any parameter is out of range; nothing
    /// changes in that case.
    pub fn reset(&mut self, params: Params) -> Result<(), ConfigError> {
        params.validate()?;

        self.params = params;
        self.grid.seed(params.beta);
        self.rule.reset();
        self.steps = 0;

        log::info!(
            "reset {0}x{0} grid ({1}), seed at {2}, alpha={3} beta={4} gamma={5}",
            self.grid.topology().width(),
            self.rule.name(),
            self.grid.topology().center(),
            params.alpha,
            params.beta,
            params.gamma,
        );
        Ok(())
    }

    /// Advances one generation.
    ///
    /// ### Returns
    /// The number of cells newly frozen. Zero is normal: growth can stall
    /// for many steps.
    ///
    /// ### Errors
    /// [`StepError`] if the rule could not acquire scratch storage; the
    /// grid and step counter are unchanged.
    pub fn step(&mut self) -> Result<usize, StepError> {
        let params = self.params;
        let newly_frozen = self.rule.advance(&mut self.grid, &params)?;
        self.steps += 1;

        if newly_frozen == 0 {
            log::debug!("step {}: no cells froze", self.steps);
        } else {
            log::debug!(
                "step {}: {} cells froze, {} total",
                self.steps,
                newly_frozen,
                self.grid.frozen_count()
            );
        }
        Ok(newly_frozen)
    }

    /// `false` for out-of-bounds coordinates.
    pub fn is_frozen(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(|id| self.grid.frozen()[id])
    }

    /// Accumulated water `s`, or `None` out of bounds.
    pub fn water_content(&self, x: i32, y: i32) -> Option<f64> {
        self.cell(x, y).map(|id| self.grid.water()[id])
    }

    /// Diffused vapor `u'` from the last step, or `None` out of bounds.
    pub fn vapor(&self, x: i32, y: i32) -> Option<f64> {
        self.cell(x, y).map(|id| self.grid.vapor()[id])
    }

    /// `true` inside the border ring and for out-of-bounds coordinates.
    pub fn is_border(&self, x: i32, y: i32) -> bool {
        self.grid.is_border(IVec2::new(x, y))
    }

    /// Successful steps since the last reset.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    pub fn frozen_count(&self) -> usize {
        self.grid.frozen_count()
    }

    /// Parameters the next step will use.
    pub fn params(&self) -> Params {
        self.params
    }

    /// Sets the diffusion rate for the next step.
    ///
    /// ### Parameters
    /// - `alpha` - New value; clamped into [`crate::config::ALPHA_RANGE`],
    ///   ignored if NaN.
    pub fn set_alpha(&mut self, alpha: f64) {
        self.params.set_alpha(alpha);
    }

    /// Sets the ambient vapor level. The border picks it up on the next
    /// step; cells already seeded keep their water.
    ///
    /// ### Parameters
    /// - `beta` - New value; clamped into [`crate::config::BETA_RANGE`],
    ///   ignored if NaN.
    pub fn set_beta(&mut self, beta: f64) {
        self.params.set_beta(beta);
    }

    /// ### Parameters
    /// - `gamma` - New background increment; clamped into
    ///   [`crate::config::GAMMA_RANGE`], ignored if NaN.
    pub fn set_gamma(&mut self, gamma: f64) {
        self.params.set_gamma(gamma);
    }

    /// Working grid width; always odd.
    pub fn width(&self) -> usize {
        self.grid.topology().width()
    }

    pub fn center(&self) -> IVec2 {
        self.grid.topology().center()
    }

    pub fn rule_name(&self) -> &'static str {
        self.rule.name()
    }

    /// Read-only view of the whole grid, for drawing or bulk inspection.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    fn cell(&self, x: i32, y: i32) -> Option<usize> {
        let c = IVec2::new(x, y);
        let topo = self.grid.topology();
        topo.in_bounds(c).then(|| topo.index_of(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Accumulation, RuleKind};
    use proptest::prelude::*;

    fn diffusion_config(size: usize, params: Params, accumulation: Accumulation) -> Config {
        Config {
            size,
            border_margin: 1,
            params,
            rule: RuleKind::VaporDiffusion { accumulation },
        }
    }

    fn scenario_params() -> Params {
        Params {
            alpha: 1.0,
            beta: 0.5,
            gamma: 0.01,
        }
    }

    /// Checks the grid's exact symmetries: reflection across both
    /// diagonals and 180° rotation about the center.
    fn assert_symmetric(grid: &Grid) {
        let topo = grid.topology();
        let last = topo.width() as i32 - 1;
        for c in topo.coords() {
            let id = topo.index_of(c);
            for image in [
                IVec2::new(c.y, c.x),
                IVec2::new(last - c.x, last - c.y),
                IVec2::new(last - c.y, last - c.x),
            ] {
                let other = topo.index_of(image);
                assert_eq!(grid.frozen()[id], grid.frozen()[other], "frozen {c} vs {image}");
                assert_eq!(
                    grid.water()[id].to_bits(),
                    grid.water()[other].to_bits(),
                    "water {c} vs {image}"
                );
            }
        }
    }

    /// Rule whose scratch allocation always fails.
    #[derive(Debug)]
    struct ExhaustedRule;

    impl GrowthRule for ExhaustedRule {
        fn name(&self) -> &'static str {
            "exhausted"
        }

        fn advance(&mut self, grid: &mut Grid, _params: &Params) -> Result<usize, StepError> {
            let cells = grid.topology().cell_count();
            let mut huge: Vec<u8> = Vec::new();
            let source = huge.try_reserve(usize::MAX).unwrap_err();
            Err(StepError::Allocation { cells, source })
        }
    }

    #[test]
    fn rejected_step_leaves_state_untouched() {
        let config = diffusion_config(15, scenario_params(), Accumulation::Absorbing);
        let mut auto = CrystalAutomaton::new(config).unwrap();
        for _ in 0..5 {
            auto.step().unwrap();
        }
        let frozen = auto.grid().frozen().to_vec();
        let water: Vec<u64> = auto.grid().water().iter().map(|s| s.to_bits()).collect();
        let count = auto.frozen_count();

        // Same grid, failing rule.
        let mut failing = CrystalAutomaton::with_rule(config, Box::new(ExhaustedRule)).unwrap();
        failing.grid = auto.grid.clone();
        failing.steps = auto.steps;

        assert!(matches!(
            failing.step(),
            Err(StepError::Allocation { cells: 225, .. })
        ));
        assert_eq!(failing.step_count(), 5);
        assert_eq!(failing.frozen_count(), count);
        assert_eq!(failing.grid().frozen(), &frozen[..]);
        let after: Vec<u64> = failing.grid().water().iter().map(|s| s.to_bits()).collect();
        assert_eq!(after, water);
    }

    #[test]
    fn new_rejects_invalid_freeze_probability() {
        let mut cfg = Config::default();
        cfg.rule = RuleKind::ProbabilisticFreeze {
            probability: 1.5,
            seed: 1,
        };
        assert!(matches!(
            CrystalAutomaton::new(cfg),
            Err(ConfigError::Parameter {
                name: "probability",
                ..
            })
        ));
    }

    #[test]
    fn new_rejects_invalid_configuration() {
        for size in [0, 1, 2] {
            let mut cfg = Config::default();
            cfg.size = size;
            assert!(matches!(
                CrystalAutomaton::new(cfg),
                Err(ConfigError::GridSize { .. })
            ));
        }

        let mut cfg = Config::default();
        cfg.params.beta = 1.5;
        assert!(matches!(
            CrystalAutomaton::new(cfg),
            Err(ConfigError::Parameter { name: "beta", .. })
        ));
    }

    #[test]
    fn reset_seeds_single_center_cell() {
        let auto = CrystalAutomaton::new(diffusion_config(
            16,
            scenario_params(),
            Accumulation::Absorbing,
        ))
        .unwrap();

        assert_eq!(auto.width(), 15);
        assert_eq!(auto.center(), IVec2::new(7, 7));
        assert_eq!(auto.frozen_count(), 1);
        assert_eq!(auto.step_count(), 0);

        for y in 0..15 {
            for x in 0..15 {
                if (x, y) == (7, 7) {
                    assert!(auto.is_frozen(x, y));
                    assert_eq!(auto.water_content(x, y), Some(1.0));
                } else {
                    assert!(!auto.is_frozen(x, y));
                    assert_eq!(auto.water_content(x, y), Some(0.5));
                }
            }
        }
    }

    #[test]
    fn reset_restores_seed_after_growth() {
        let mut auto = CrystalAutomaton::new(diffusion_config(
            21,
            scenario_params(),
            Accumulation::Absorbing,
        ))
        .unwrap();
        for _ in 0..40 {
            auto.step().unwrap();
        }
        assert!(auto.frozen_count() > 1);

        let mut params = scenario_params();
        params.beta = 0.3;
        auto.reset(params).unwrap();

        assert_eq!(auto.frozen_count(), 1);
        assert_eq!(auto.step_count(), 0);
        assert_eq!(auto.water_content(0, 0), Some(0.3));
        assert_eq!(auto.params(), params);
    }

    #[test]
    fn reset_with_invalid_params_changes_nothing() {
        let mut auto = CrystalAutomaton::new(Config::default()).unwrap();
        for _ in 0..5 {
            auto.step().unwrap();
        }
        let before = auto.grid().water().to_vec();

        let mut params = Params::default();
        params.alpha = 0.0;
        assert!(auto.reset(params).is_err());

        assert_eq!(auto.step_count(), 5);
        assert_eq!(auto.grid().water(), before.as_slice());
        assert_eq!(auto.params(), Params::default());
    }

    #[test]
    fn out_of_bounds_reads_are_empty() {
        let auto = CrystalAutomaton::new(Config::default()).unwrap();
        assert!(!auto.is_frozen(-1, 0));
        assert!(!auto.is_frozen(0, 63));
        assert_eq!(auto.water_content(63, 0), None);
        assert_eq!(auto.vapor(0, -5), None);
        assert!(auto.is_border(-1, 3));
    }

    #[test]
    fn setters_clamp_live_parameters() {
        let mut auto = CrystalAutomaton::new(Config::default()).unwrap();

        auto.set_alpha(9.0);
        auto.set_beta(-3.0);
        auto.set_gamma(0.5);

        let p = auto.params();
        assert_eq!(p.alpha, 5.0);
        assert_eq!(p.beta, 0.1);
        assert_eq!(p.gamma, 0.1);
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn beta_edit_applies_to_border_on_next_step() {
        let mut auto = CrystalAutomaton::new(Config::default()).unwrap();
        auto.set_beta(0.8);
        assert_eq!(auto.water_content(0, 0), Some(0.5));

        auto.step().unwrap();

        assert_eq!(auto.water_content(0, 0), Some(0.8));
        assert_eq!(auto.vapor(62, 10), Some(0.8));
    }

    #[test]
    fn step_counter_advances_even_without_growth() {
        let mut params = scenario_params();
        params.gamma = 0.0;
        let mut auto =
            CrystalAutomaton::new(diffusion_config(16, params, Accumulation::Background)).unwrap();

        for expected in 1..=5 {
            assert_eq!(auto.step().unwrap(), 0);
            assert_eq!(auto.step_count(), expected);
        }
    }

    #[test]
    fn scenario_fifty_steps_grows_a_connected_crystal() {
        for accumulation in [Accumulation::Absorbing, Accumulation::Background] {
            let mut auto =
                CrystalAutomaton::new(diffusion_config(16, scenario_params(), accumulation))
                    .unwrap();
            assert_eq!(auto.frozen_count(), 1);

            let mut total = 0;
            for _ in 0..50 {
                total += auto.step().unwrap();
            }

            assert!(auto.frozen_count() > 1, "{accumulation:?} did not grow");
            assert_eq!(auto.frozen_count(), total + 1);
            assert!(auto.grid().frozen_is_connected());
            for y in 0..15 {
                for x in 0..15 {
                    if auto.is_frozen(x, y) {
                        assert!(!auto.is_border(x, y), "({x}, {y}) froze in the border");
                    }
                }
            }
        }
    }

    #[test]
    fn scenario_without_background_vapor_never_grows() {
        let mut params = scenario_params();
        params.gamma = 0.0;
        let mut auto =
            CrystalAutomaton::new(diffusion_config(16, params, Accumulation::Background)).unwrap();

        for _ in 0..500 {
            auto.step().unwrap();
        }
        assert_eq!(auto.frozen_count(), 1);
    }

    #[test]
    fn absorbing_rule_still_grows_without_background_vapor() {
        let mut params = scenario_params();
        params.gamma = 0.0;
        let mut auto =
            CrystalAutomaton::new(diffusion_config(16, params, Accumulation::Absorbing)).unwrap();

        for _ in 0..50 {
            auto.step().unwrap();
        }
        assert!(auto.frozen_count() > 1);
    }

    #[test]
    fn diffusion_is_deterministic() {
        let cfg = diffusion_config(
            31,
            Params {
                alpha: 2.7,
                beta: 0.35,
                gamma: 0.003,
            },
            Accumulation::Absorbing,
        );
        let mut a = CrystalAutomaton::new(cfg).unwrap();
        let mut b = CrystalAutomaton::new(cfg).unwrap();

        for _ in 0..120 {
            assert_eq!(a.step().unwrap(), b.step().unwrap());
        }

        assert_eq!(a.grid().frozen(), b.grid().frozen());
        let bits = |auto: &CrystalAutomaton| -> Vec<u64> {
            auto.grid().water().iter().map(|s| s.to_bits()).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn growth_stays_symmetric() {
        for accumulation in [Accumulation::Absorbing, Accumulation::Background] {
            let mut auto = CrystalAutomaton::new(diffusion_config(
                21,
                Params {
                    alpha: 1.0,
                    beta: 0.4,
                    gamma: 0.001,
                },
                accumulation,
            ))
            .unwrap();

            for _ in 0..150 {
                auto.step().unwrap();
                assert_symmetric(auto.grid());
            }
        }
    }

    #[test]
    fn probabilistic_rule_is_reproducible_per_seed() {
        let cfg = Config {
            size: 33,
            border_margin: 1,
            params: Params::default(),
            rule: RuleKind::ProbabilisticFreeze {
                probability: 0.35,
                seed: 2024,
            },
        };
        let mut a = CrystalAutomaton::new(cfg).unwrap();
        let mut b = CrystalAutomaton::new(cfg).unwrap();
        assert_eq!(a.rule_name(), "probabilistic freeze");

        for _ in 0..30 {
            a.step().unwrap();
            b.step().unwrap();
        }
        assert_eq!(a.grid().frozen(), b.grid().frozen());
        assert!(a.grid().frozen_is_connected());

        // Reset replays the same flake.
        let first = a.grid().frozen().to_vec();
        a.reset(Params::default()).unwrap();
        for _ in 0..30 {
            a.step().unwrap();
        }
        assert_eq!(a.grid().frozen(), first.as_slice());
    }

    fn params_strategy() -> impl Strategy<Value = Params> {
        (0.5f64..=5.0, 0.1f64..=0.9, 0.0f64..=0.1).prop_map(|(alpha, beta, gamma)| Params {
            alpha,
            beta,
            gamma,
        })
    }

    fn accumulation_strategy() -> impl Strategy<Value = Accumulation> {
        prop_oneof![Just(Accumulation::Absorbing), Just(Accumulation::Background)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_step_invariants_hold(
            params in params_strategy(),
            accumulation in accumulation_strategy(),
            size in 7usize..=25,
            steps in 1usize..=40,
        ) {
            let mut auto = CrystalAutomaton::new(diffusion_config(size, params, accumulation)).unwrap();

            for _ in 0..steps {
                let grid = auto.grid();
                let topo = *grid.topology();
                let frozen_before = grid.frozen().to_vec();
                let water_before = grid.water().to_vec();
                let receptive: Vec<bool> = topo.coords().map(|c| grid.is_receptive(c)).collect();

                let added = auto.step().unwrap();
                let grid = auto.grid();

                let mut new_cells = 0;
                for (id, c) in topo.coords().enumerate() {
                    let s = grid.water()[id];
                    prop_assert!(s >= 0.0, "negative water {} at {}", s, c);

                    if frozen_before[id] {
                        prop_assert!(grid.frozen()[id], "{} unfroze", c);
                        prop_assert_eq!(s, water_before[id]);
                        prop_assert!(s >= 1.0);
                    } else if grid.frozen()[id] {
                        new_cells += 1;
                    }

                    if receptive[id] {
                        prop_assert!(s >= water_before[id], "receptive {} lost water", c);
                    }

                    if grid.is_border(c) {
                        prop_assert!(!grid.frozen()[id], "border {} froze", c);
                        prop_assert_eq!(s, params.beta);
                    }
                }
                prop_assert_eq!(added, new_cells);
                prop_assert!(grid.frozen_is_connected());
            }
        }

        #[test]
        fn prop_growth_is_symmetric(
            params in params_strategy(),
            accumulation in accumulation_strategy(),
            half in 3usize..=10,
            steps in 1usize..=60,
        ) {
            let size = 2 * half + 1;
            let mut auto = CrystalAutomaton::new(diffusion_config(size, params, accumulation)).unwrap();
            for _ in 0..steps {
                auto.step().unwrap();
            }
            assert_symmetric(auto.grid());
        }

        #[test]
        fn prop_probabilistic_rule_keeps_border_clear(
            probability in 0.0f64..=1.0,
            seed in any::<u64>(),
            steps in 1usize..=30,
        ) {
            let cfg = Config {
                size: 17,
                border_margin: 2,
                params: Params::default(),
                rule: RuleKind::ProbabilisticFreeze { probability, seed },
            };
            let mut auto = CrystalAutomaton::new(cfg).unwrap();
            for _ in 0..steps {
                let before = auto.grid().frozen().to_vec();
                auto.step().unwrap();
                let after = auto.grid().frozen();
                prop_assert!(before.iter().zip(after).all(|(&b, &a)| !b || a));
            }

            let grid = auto.grid();
            for c in grid.topology().coords() {
                if grid.is_border(c) {
                    prop_assert!(!grid.frozen()[grid.topology().index_of(c)]);
                }
            }
            prop_assert!(grid.frozen_is_connected());
        }
    }
}
