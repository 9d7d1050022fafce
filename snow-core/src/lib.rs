//! Core snow-crystal growth library: a diffusion-limited hexagonal
//! cellular automaton after Reiter's local model.
//!
//! Main components:
//! - [`topology`] — hexagonal neighbor table and bounds checks.
//! - [`grid`] — parallel per-cell arrays (frozen mask, water, vapor).
//! - [`config`] — grid size, tunable parameters and rule selection.
//! - [`scratch`] — reusable per-step buffers for double-buffered phases.
//! - [`phases`] — the three phases of one vapor-diffusion generation.
//! - [`rules`] — swappable growth rules (vapor diffusion, probabilistic freeze).
//! - [`automaton`] — [`CrystalAutomaton`], the state-transition entry point.
//! - [`error`] — configuration and per-step errors.
//! - [`types`] — shared type aliases.

pub mod automaton;
pub mod config;
pub mod error;
pub mod grid;
pub mod phases;
pub mod rules;
pub mod scratch;
pub mod topology;
pub mod types;

pub use automaton::CrystalAutomaton;
pub use config::{Accumulation, Config, Params, RuleKind};
pub use error::{ConfigError, StepError};
