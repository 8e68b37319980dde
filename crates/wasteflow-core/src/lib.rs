//! World construction, tick loop, and orchestration for the Wasteflow
//! simulation.
//!
//! This crate owns the [`World`]: it builds the town from configuration or
//! explicit placements, advances it one synchronous tick at a time, and
//! derives the reports a renderer or chart consumes.
//!
//! # Modules
//!
//! - [`audit`] -- Whole-world invariant checks ([`InvariantViolation`]).
//! - [`clock`] -- Logical tick counter with checked advance.
//! - [`config`] -- Configuration loading from `wasteflow-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- [`RunControl`]: stop flag and pacing shared with the
//!   runner.
//! - [`error`] -- [`ConfigurationError`], the only fatal error.
//! - [`metrics`] -- Aggregate reporters and per-agent render views.
//! - [`population`] -- Randomized building and truck parameters.
//! - [`runner`] -- Async headless loop with [`TickCallback`] hooks.
//! - [`tick`] -- [`TickSummary`] produced by every advance.
//! - [`world`] -- [`World`] and [`WorldBuilder`].
//!
//! [`InvariantViolation`]: audit::InvariantViolation
//! [`RunControl`]: control::RunControl
//! [`ConfigurationError`]: error::ConfigurationError
//! [`TickCallback`]: runner::TickCallback
//! [`TickSummary`]: tick::TickSummary
//! [`World`]: world::World
//! [`WorldBuilder`]: world::WorldBuilder

pub mod audit;
pub mod clock;
pub mod config;
pub mod control;
pub mod error;
pub mod metrics;
pub mod population;
pub mod runner;
pub mod tick;
pub mod world;

pub use audit::InvariantViolation;
pub use config::SimulationConfig;
pub use control::{RunControl, SimulationEndReason};
pub use error::ConfigurationError;
pub use runner::{SimulationResult, TickCallback, run_simulation};
pub use tick::TickSummary;
pub use world::{World, WorldBuilder};
