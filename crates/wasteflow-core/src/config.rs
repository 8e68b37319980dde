//! Configuration loading and typed config structures for the Wasteflow
//! simulation.
//!
//! The configuration lives in a YAML file (`wasteflow-config.yaml` at the
//! project root by default). Every section and field is optional and falls
//! back to the defaults below, so an empty document is a valid config.
//!
//! ```yaml
//! world:
//!   width: 20
//!   height: 20
//!   topology: toroidal   # or "bounded"
//!   seed: 42
//! population:
//!   buildings: 10
//!   trucks: 2
//! buildings:
//!   rate_min: 0.5
//!   rate_max: 2.0
//!   capacity_min: 8
//!   capacity_max: 15
//!   pickup_threshold_pct: 80
//! trucks:
//!   capacity_min: 40
//!   capacity_max: 60
//!   speed_min: 1
//!   speed_max: 2
//! simulation:
//!   max_ticks: 500
//!   tick_interval_ms: 0
//!   report_every: 50
//! logging:
//!   level: info
//!   format: pretty       # or "json"
//! ```
//!
//! The `WASTEFLOW_SEED` environment variable overrides `world.seed`.

use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;
use wasteflow_types::Topology;

use crate::error::ConfigurationError;

/// Environment variable that overrides `world.seed`.
pub const SEED_ENV_VAR: &str = "WASTEFLOW_SEED";

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Grid dimensions, topology and seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// How many buildings and trucks to create.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Ranges for randomized building parameters.
    #[serde(default)]
    pub buildings: BuildingConfig,

    /// Ranges for randomized truck parameters.
    #[serde(default)]
    pub trucks: TruckConfig,

    /// Run boundaries and pacing.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `WASTEFLOW_SEED`, when set to an unsigned integer, overrides
    /// `world.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Io`] if the file cannot be read, or
    /// [`ConfigurationError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying the environment
    /// override.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigurationError> {
        let mut config = Self::parse_yaml(yaml)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string without consulting the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Yaml`] if the string is not valid YAML.
    pub fn parse_yaml(yaml: &str) -> Result<Self, ConfigurationError> {
        // An empty document deserializes to unit, not an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Replace `world.seed` with `WASTEFLOW_SEED` if it is set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(SEED_ENV_VAR) {
            match val.trim().parse::<u64>() {
                Ok(seed) => self.world.seed = seed,
                Err(e) => warn!(value = %val, error = %e, "Ignoring unparsable {SEED_ENV_VAR}"),
            }
        }
    }

    /// Check every parameter and their combination.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] naming the first problem
    /// found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let w = &self.world;
        if w.width == 0 || w.height == 0 {
            return Err(ConfigurationError::invalid(format!(
                "grid must be at least 1x1, got {}x{}",
                w.width, w.height
            )));
        }

        let p = &self.population;
        if p.buildings == 0 {
            return Err(ConfigurationError::invalid("at least one building is required"));
        }
        if p.trucks == 0 {
            return Err(ConfigurationError::invalid("at least one truck is required"));
        }
        let cells = u64::from(w.width).saturating_mul(u64::from(w.height));
        let needed = u64::from(p.buildings)
            .saturating_add(u64::from(p.trucks))
            .saturating_add(1);
        if cells < needed {
            return Err(ConfigurationError::invalid(format!(
                "{}x{} grid has {cells} cells but {} buildings, {} trucks and the disposal site need {needed}",
                w.width, w.height, p.buildings, p.trucks
            )));
        }

        let b = &self.buildings;
        if b.rate_min <= Decimal::ZERO || b.rate_min > b.rate_max {
            return Err(ConfigurationError::invalid(format!(
                "building rate range must be positive and ordered, got {}..{}",
                b.rate_min, b.rate_max
            )));
        }
        if b.capacity_min == 0 || b.capacity_min > b.capacity_max {
            return Err(ConfigurationError::invalid(format!(
                "building capacity range must be positive and ordered, got {}..{}",
                b.capacity_min, b.capacity_max
            )));
        }
        if b.pickup_threshold_pct == 0 || b.pickup_threshold_pct > 100 {
            return Err(ConfigurationError::invalid(format!(
                "pickup threshold must be within 1..=100 percent, got {}",
                b.pickup_threshold_pct
            )));
        }

        let t = &self.trucks;
        if t.capacity_min == 0 || t.capacity_min > t.capacity_max {
            return Err(ConfigurationError::invalid(format!(
                "truck capacity range must be positive and ordered, got {}..{}",
                t.capacity_min, t.capacity_max
            )));
        }
        if t.capacity_min < b.capacity_max {
            return Err(ConfigurationError::invalid(format!(
                "smallest truck ({}) cannot empty the largest building ({})",
                t.capacity_min, b.capacity_max
            )));
        }
        if t.speed_min == 0 || t.speed_min > t.speed_max {
            return Err(ConfigurationError::invalid(format!(
                "truck speed range must be at least 1 and ordered, got {}..{}",
                t.speed_min, t.speed_max
            )));
        }

        Ok(())
    }
}

/// Grid and randomness configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    #[serde(default = "default_grid_size")]
    pub width: u32,

    /// Grid height in cells.
    #[serde(default = "default_grid_size")]
    pub height: u32,

    /// Whether the random walk wraps at the edges.
    #[serde(default)]
    pub topology: Topology,

    /// Random seed for reproducibility.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: default_grid_size(),
            height: default_grid_size(),
            topology: Topology::default(),
            seed: default_seed(),
        }
    }
}

/// Population configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Number of buildings.
    #[serde(default = "default_buildings")]
    pub buildings: u32,

    /// Number of trucks.
    #[serde(default = "default_trucks")]
    pub trucks: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            buildings: default_buildings(),
            trucks: default_trucks(),
        }
    }
}

/// Building parameter ranges. Rates are drawn with two decimal places,
/// capacities as whole units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildingConfig {
    /// Lowest generation rate per tick.
    #[serde(default = "default_rate_min")]
    pub rate_min: Decimal,

    /// Highest generation rate per tick.
    #[serde(default = "default_rate_max")]
    pub rate_max: Decimal,

    /// Smallest capacity.
    #[serde(default = "default_building_capacity_min")]
    pub capacity_min: u32,

    /// Largest capacity.
    #[serde(default = "default_building_capacity_max")]
    pub capacity_max: u32,

    /// Fill percentage at which a pickup is requested.
    #[serde(default = "default_pickup_threshold_pct")]
    pub pickup_threshold_pct: u32,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            rate_min: default_rate_min(),
            rate_max: default_rate_max(),
            capacity_min: default_building_capacity_min(),
            capacity_max: default_building_capacity_max(),
            pickup_threshold_pct: default_pickup_threshold_pct(),
        }
    }
}

/// Truck parameter ranges.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TruckConfig {
    /// Smallest capacity.
    #[serde(default = "default_truck_capacity_min")]
    pub capacity_min: u32,

    /// Largest capacity.
    #[serde(default = "default_truck_capacity_max")]
    pub capacity_max: u32,

    /// Fewest sub-steps per tick.
    #[serde(default = "default_speed_min")]
    pub speed_min: u32,

    /// Most sub-steps per tick.
    #[serde(default = "default_speed_max")]
    pub speed_max: u32,
}

impl Default for TruckConfig {
    fn default() -> Self {
        Self {
            capacity_min: default_truck_capacity_min(),
            capacity_max: default_truck_capacity_max(),
            speed_min: default_speed_min(),
            speed_max: default_speed_max(),
        }
    }
}

/// Run boundaries and pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Stop after this many ticks (0 = run until stopped).
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// Real-time milliseconds between ticks (0 = as fast as possible).
    #[serde(default)]
    pub tick_interval_ms: u64,

    /// Log a full report every this many ticks (0 = never).
    #[serde(default = "default_report_every")]
    pub report_every: u64,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: default_max_ticks(),
            tick_interval_ms: 0,
            report_every: default_report_every(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (required by serde's `default = "..."` attribute)
// ---------------------------------------------------------------------------

const fn default_grid_size() -> u32 {
    20
}

const fn default_seed() -> u64 {
    42
}

const fn default_buildings() -> u32 {
    10
}

const fn default_trucks() -> u32 {
    2
}

const fn default_rate_min() -> Decimal {
    Decimal::from_parts(5, 0, 0, false, 1)
}

const fn default_rate_max() -> Decimal {
    Decimal::from_parts(2, 0, 0, false, 0)
}

const fn default_building_capacity_min() -> u32 {
    8
}

const fn default_building_capacity_max() -> u32 {
    15
}

const fn default_pickup_threshold_pct() -> u32 {
    80
}

const fn default_truck_capacity_min() -> u32 {
    40
}

const fn default_truck_capacity_max() -> u32 {
    60
}

const fn default_speed_min() -> u32 {
    1
}

const fn default_speed_max() -> u32 {
    2
}

const fn default_max_ticks() -> u64 {
    500
}

const fn default_report_every() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_owned()
}
