/*
 * Simulation Parameters Module
 *
 * This module defines the SimulationParams struct that contains all the
 * tunable values of the aquarium: volume geometry, per-agent steering limits,
 * boundary and collision constants, update semantics and clock rate.
 * Parameters can be loaded from a YAML scenario; any omitted field keeps its
 * default, and `validate` rejects values the simulation cannot run with.
 */

use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{invalid, Result};
use crate::kind::AgentKind;
use crate::volume::DEFAULT_PADDING;

// How agents observe each other while a tick is in progress
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    // Agents are updated in order and later agents see the new state of
    // earlier ones within the same tick.
    #[default]
    InPlace,
    // Steering and integration read a copy of the pre-tick population, so the
    // result does not depend on iteration order. Collision correction still
    // runs afterwards over the live population.
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub kind: AgentKind,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Edge length of the aquarium cube.
    pub volume_size: f32,
    /// Inward margin as a fraction of `volume_size`.
    pub padding: f32,
    pub max_speed: f32,
    pub max_force: f32,
    pub perception_radius: f32,
    pub separation_distance: f32,
    /// Velocity nudge applied per axis near a wall.
    pub turn_factor: f32,
    /// Distance from a wall at which turning starts.
    pub boundary_margin: f32,
    /// Agents closer than this are pushed apart after integration.
    pub min_distance: f32,
    pub update_mode: UpdateMode,
    /// Only honoured in `UpdateMode::Snapshot`.
    pub parallel: bool,
    /// Re-clamp into the volume after collision correction.
    pub clamp_after_collision: bool,
    pub fixed_physics_fps: f32,
    /// Upper bound on fixed steps taken by one `Flock::tick` call.
    pub max_steps_per_tick: u32,
    /// None seeds from OS entropy.
    pub seed: Option<u64>,
    pub initial_population: Vec<PopulationEntry>,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            volume_size: 80.0,
            padding: DEFAULT_PADDING,
            max_speed: 0.05,
            max_force: 0.005,
            perception_radius: 10.0,
            separation_distance: 8.0,
            turn_factor: 0.5,
            boundary_margin: 2.0,
            min_distance: 5.0,
            update_mode: UpdateMode::InPlace,
            parallel: false,
            clamp_after_collision: false,
            fixed_physics_fps: 60.0,
            max_steps_per_tick: 5,
            seed: None,
            // Three schools in the opening scene
            initial_population: vec![
                PopulationEntry { kind: AgentKind::BlueGoldfish, count: 3 },
                PopulationEntry { kind: AgentKind::CoralGrouper, count: 3 },
                PopulationEntry { kind: AgentKind::Sunfish, count: 3 },
            ],
        }
    }
}

impl SimulationParams {
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let params: SimulationParams = serde_yaml::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_yaml_reader<R: Read>(reader: R) -> Result<Self> {
        let params: SimulationParams = serde_yaml::from_reader(reader)?;
        params.validate()?;
        Ok(params)
    }

    // Reject values that would make steering or clamping meaningless
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("volume_size", self.volume_size),
            ("max_speed", self.max_speed),
            ("max_force", self.max_force),
            ("perception_radius", self.perception_radius),
            ("separation_distance", self.separation_distance),
            ("fixed_physics_fps", self.fixed_physics_fps),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("padding", self.padding),
            ("turn_factor", self.turn_factor),
            ("boundary_margin", self.boundary_margin),
            ("min_distance", self.min_distance),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(format!("{name} must be non-negative, got {value}")));
            }
        }

        if self.max_steps_per_tick == 0 {
            return Err(invalid("max_steps_per_tick must be at least 1"));
        }

        self.physics_step_size()?;
        Ok(())
    }

    // Fails when the rate is so low or so high that the step is not a usable Duration
    pub fn physics_step_size(&self) -> Result<Duration> {
        let fps = self.fixed_physics_fps;
        match Duration::try_from_secs_f64(1.0 / f64::from(fps)) {
            Ok(step) if !step.is_zero() => Ok(step),
            Ok(_) => Err(invalid(format!("fixed_physics_fps {fps} gives a zero step size"))),
            Err(err) => Err(invalid(format!("fixed_physics_fps {fps} gives no usable step size: {err}"))),
        }
    }

    pub fn initial_population_size(&self) -> usize {
        self.initial_population.iter().map(|entry| entry.count).sum()
    }
}
