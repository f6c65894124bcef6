// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solver configuration.
//!
//! The engine has no file format of its own: callers build a
//! [`SolverConfig`] directly, deserialize one from JSON, or overlay
//! `SPACEPLAN_*` environment variables on the defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which backend produces the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    /// Shelf packing followed by hill-climbing. Never fails.
    #[default]
    Heuristic,
    /// Integer program over a discretized grid.
    #[serde(alias = "ortools", alias = "constraint")]
    Cp,
}

impl SolverKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "heuristic" => Some(SolverKind::Heuristic),
            "cp" | "ortools" | "constraint" => Some(SolverKind::Cp),
            _ => None,
        }
    }
}

/// Layout solver parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub solver: SolverKind,
    /// Seed for the local search and for CP tie-breaking.
    pub seed: u64,
    /// Grid resolution in metres.
    pub grid_unit: f64,
    /// Hill-climbing iterations per storey.
    pub max_iter: usize,
    /// Wall-clock limit for the CP solver.
    pub time_limit_secs: u64,
    /// Enables cross-storey terms in the CP objective.
    pub multi_storey_mode: bool,
    /// Storey count from which an elevator core is required.
    pub highrise_elevator_threshold: usize,
    /// Vertical gap between stacked storeys in plan (m).
    pub floor_gap: f64,
    /// Upper bound on shelf width during packing (m).
    pub max_strip_width: f64,
    /// Width/height ratio of initial rectangles.
    pub default_aspect_ratio: f64,
    /// Gap between the two halves of a split core row (m).
    pub core_split_gap: f64,
    /// Weight of the circulation term relative to adjacency satisfaction.
    pub circulation_weight: f64,
    pub touch_tolerance: f64,
    pub overlap_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            solver: SolverKind::Heuristic,
            seed: 42,
            grid_unit: 0.5,
            max_iter: 5000,
            time_limit_secs: 60,
            multi_storey_mode: false,
            highrise_elevator_threshold: 6,
            floor_gap: 3.0,
            max_strip_width: 30.0,
            default_aspect_ratio: 1.5,
            core_split_gap: 3.0,
            circulation_weight: 0.25,
            touch_tolerance: 0.1,
            overlap_tolerance: 0.01,
        }
    }
}

impl SolverConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_solver(mut self, solver: SolverKind) -> Self {
        self.solver = solver;
        self
    }

    /// Overlays `SPACEPLAN_*` environment variables on the defaults.
    ///
    /// Unparseable values are logged and fall back to the default. Flags
    /// accept `1`/`0`, `true`/`false`, `yes`/`no` and `on`/`off`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            solver: std::env::var("SPACEPLAN_SOLVER")
                .ok()
                .and_then(|v| SolverKind::parse(&v))
                .unwrap_or(defaults.solver),
            seed: env_or("SPACEPLAN_SEED", defaults.seed),
            grid_unit: env_or("SPACEPLAN_GRID_UNIT", defaults.grid_unit),
            max_iter: env_or("SPACEPLAN_MAX_ITER", defaults.max_iter),
            time_limit_secs: env_or("SPACEPLAN_TIME_LIMIT_SECS", defaults.time_limit_secs),
            multi_storey_mode: env_flag("SPACEPLAN_MULTI_STOREY", defaults.multi_storey_mode),
            highrise_elevator_threshold: env_or(
                "SPACEPLAN_HIGHRISE_ELEVATOR_THRESHOLD",
                defaults.highrise_elevator_threshold,
            ),
            ..defaults
        }
    }

    /// Parses a (possibly partial) JSON configuration.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("grid_unit", self.grid_unit),
            ("max_strip_width", self.max_strip_width),
            ("default_aspect_ratio", self.default_aspect_ratio),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::InvalidConfig(format!("{name} must be positive, got {value}")));
            }
        }
        if self.time_limit_secs == 0 {
            return Err(Error::InvalidConfig("time_limit_secs must be at least 1".into()));
        }
        if self.floor_gap < 0.0 || self.core_split_gap < 0.0 {
            return Err(Error::InvalidConfig("gaps must not be negative".into()));
        }
        Ok(())
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(key, value = %raw, "Ignoring unparseable environment override");
        default
    })
}

fn env_flag(key: &str, default: bool) -> bool {
    let Ok(raw) = std::env::var(key) else {
        return default;
    };
    parse_flag(&raw).unwrap_or_else(|| {
        tracing::warn!(key, value = %raw, "Ignoring unrecognised flag value");
        default
    })
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
