use std::collections::TryReserveError;

use thiserror::Error;

/// A grid size or parameter outside the supported range.
///
/// Returned from construction and [`crate::CrystalAutomaton::reset`];
/// the automaton is left untouched when `reset` fails.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("grid size {size} outside supported range {min}..={max}")]
    GridSize { size: usize, min: usize, max: usize },
    #[error("border margin {margin} leaves no interior on a {width}-wide grid")]
    BorderMargin { margin: usize, width: usize },
    #[error("parameter {name} = {value} outside {min}..={max}")]
    Parameter {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// A rejected generation. The grid keeps its last committed state.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("failed to allocate scratch buffers for {cells} cells: {source}")]
    Allocation {
        cells: usize,
        #[source]
        source: TryReserveError,
    },
}
