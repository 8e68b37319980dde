//! Collector agents for the Wasteflow simulation.
//!
//! This crate contains the coordination core: the per-truck state machine
//! that discovers pickup requests, claims one without duplicating another
//! truck's work, drives to it, harvests it, and hauls full loads to the
//! disposal site. There is no central dispatcher; each truck decides alone,
//! reading the shared [`ClaimRegistry`] and the grid.
//!
//! # Modules
//!
//! - [`claims`] -- [`ClaimRegistry`]: source -> claiming collector.
//! - [`collector`] -- [`Collector`] state machine and its [`StepContext`].
//! - [`dispatch`] -- Greedy nearest-request selection.
//! - [`error`] -- Error types for collector construction and claims
//!   ([`AgentError`]).
//! - [`navigation`] -- Axis-biased stepping and the patrol random walk.

pub mod claims;
pub mod collector;
pub mod dispatch;
pub mod error;
pub mod navigation;

// Re-export primary types at crate root for convenience.
pub use claims::ClaimRegistry;
pub use collector::{Collector, CollectorEvent, CollectorParams, CollectorState, StepContext};
pub use dispatch::Dispatch;
pub use error::AgentError;
