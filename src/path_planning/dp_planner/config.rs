//! Configuration for the DP seed planner.
//!
//! Loaded from YAML or built in code; every field has a default so partial
//! files are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::common::{PlannerError, PlannerResult};

/// Weights of the transition cost terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DpCostWeights {
    /// Proximity to obstacles (collisions themselves are prohibitive)
    pub obstacle: f64,
    /// Absolute lateral offset from the reference line
    pub lateral: f64,
    /// Lateral offset change within one step
    pub lateral_change: f64,
    /// Change of the lateral increment between consecutive steps
    pub lateral_velocity_change: f64,
    /// Deviation of the step velocity from the nominal velocity
    pub longitudinal_velocity_bias: f64,
    /// Heading change between consecutive steps
    pub heading_change: f64,
    /// Proximity to the margin-reduced road bounds
    pub boundary: f64,
}

impl Default for DpCostWeights {
    fn default() -> Self {
        Self {
            obstacle: 2.0,
            lateral: 1.0,
            lateral_change: 0.5,
            lateral_velocity_change: 1.0,
            longitudinal_velocity_bias: 10.0,
            heading_change: 1.0,
            boundary: 5.0,
        }
    }
}

impl DpCostWeights {
    fn as_named(&self) -> [(&'static str, f64); 7] {
        [
            ("obstacle", self.obstacle),
            ("lateral", self.lateral),
            ("lateral_change", self.lateral_change),
            ("lateral_velocity_change", self.lateral_velocity_change),
            ("longitudinal_velocity_bias", self.longitudinal_velocity_bias),
            ("heading_change", self.heading_change),
            ("boundary", self.boundary),
        ]
    }
}

/// DP planner configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DpPlannerConfig {
    /// Planning horizon [s]
    pub horizon: f64,
    /// Number of densified trajectory intervals over the horizon
    pub nfe: usize,
    /// Number of time layers (NT)
    pub num_time_layers: usize,
    /// Number of station buckets per layer (NS)
    pub num_station_buckets: usize,
    /// Number of lateral buckets per layer, centerline bucket included (NL)
    pub num_lateral_buckets: usize,
    /// Maximum velocity [m/s]
    pub max_velocity: f64,
    /// Maximum acceleration / deceleration [m/ss]
    pub max_acceleration: f64,
    /// Cruising velocity the longitudinal cost pulls towards [m/s]
    pub nominal_velocity: f64,
    /// Distance kept from the road bounds by the lateral buckets [m]
    pub safety_margin: f64,
    /// Obstacle distance below which the proximity cost applies [m]
    pub obstacle_influence_distance: f64,
    /// Bound clearance below which the boundary cost applies [m]
    pub boundary_influence_distance: f64,
    pub weights: DpCostWeights,
}

impl Default for DpPlannerConfig {
    fn default() -> Self {
        Self {
            horizon: 16.0,
            nfe: 320,
            num_time_layers: 5,
            num_station_buckets: 7,
            num_lateral_buckets: 10,
            max_velocity: 10.0,
            max_acceleration: 2.0,
            nominal_velocity: 10.0,
            safety_margin: 1.0,
            obstacle_influence_distance: 2.0,
            boundary_influence_distance: 0.5,
            weights: DpCostWeights::default(),
        }
    }
}

impl DpPlannerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> PlannerResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate from a YAML string
    pub fn from_yaml(yaml: &str) -> PlannerResult<Self> {
        let config: Self =
            serde_yaml::from_str(yaml).map_err(|e| PlannerError::ConfigLoad(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> PlannerResult<String> {
        serde_yaml::to_string(self).map_err(|e| PlannerError::ConfigLoad(e.to_string()))
    }

    /// Time between two layers [s]
    pub fn unit_time(&self) -> f64 {
        self.horizon / self.num_time_layers as f64
    }

    /// Densified points per layer
    pub fn nseg(&self) -> usize {
        self.nfe / self.num_time_layers
    }

    pub fn validate(&self) -> PlannerResult<()> {
        fn positive(name: &str, value: f64) -> PlannerResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(PlannerError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )))
            }
        }
        fn non_negative(name: &str, value: f64) -> PlannerResult<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(PlannerError::InvalidParameter(format!(
                    "{} must be non-negative, got {}",
                    name, value
                )))
            }
        }

        if self.num_time_layers == 0 {
            return Err(PlannerError::InvalidParameter(
                "num_time_layers must be positive".to_string(),
            ));
        }
        if self.num_station_buckets < 2 {
            return Err(PlannerError::InvalidParameter(format!(
                "num_station_buckets must be at least 2, got {}",
                self.num_station_buckets
            )));
        }
        if self.num_lateral_buckets < 2 {
            return Err(PlannerError::InvalidParameter(format!(
                "num_lateral_buckets must be at least 2 (centerline + one offset), got {}",
                self.num_lateral_buckets
            )));
        }
        if self.nfe < self.num_time_layers {
            return Err(PlannerError::InvalidParameter(format!(
                "nfe ({}) must be at least num_time_layers ({})",
                self.nfe, self.num_time_layers
            )));
        }

        positive("horizon", self.horizon)?;
        positive("max_velocity", self.max_velocity)?;
        positive("max_acceleration", self.max_acceleration)?;
        positive("obstacle_influence_distance", self.obstacle_influence_distance)?;
        positive("boundary_influence_distance", self.boundary_influence_distance)?;
        non_negative("nominal_velocity", self.nominal_velocity)?;
        non_negative("safety_margin", self.safety_margin)?;
        for (name, weight) in self.weights.as_named() {
            non_negative(name, weight)?;
        }
        Ok(())
    }
}
