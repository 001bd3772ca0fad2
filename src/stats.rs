/*
 * Statistics Module
 *
 * Per-tick counters returned by the flock and an on-demand measurement of
 * the population, used for logging and by the headless runner's reports.
 *
 * Includes metrics for:
 * - Steps taken and collision pushes applied
 * - Fish left outside the volume by collision correction
 * - Mean and peak speed, centroid, and head count per kind
 */

use std::collections::BTreeMap;

use glam::Vec3;

use crate::boid::Boid;
use crate::kind::AgentKind;
use crate::volume::BoundedVolume;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub steps: u32,
    pub agents: usize,
    pub collision_pushes: usize,
    // Fish outside the volume after the last step's collision pass
    pub escaped: usize,
}

impl TickSummary {
    // Fold a later step into this summary
    pub fn absorb(&mut self, step: TickSummary) {
        self.steps += step.steps;
        self.agents = step.agents;
        self.collision_pushes += step.collision_pushes;
        self.escaped = step.escaped;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlockStats {
    pub agents: usize,
    pub mean_speed: f32,
    pub max_speed: f32,
    pub centroid: Vec3,
    pub outside_volume: usize,
    pub per_kind: BTreeMap<AgentKind, usize>,
}

impl FlockStats {
    pub fn measure<'a>(boids: impl IntoIterator<Item = &'a Boid>, volume: &BoundedVolume) -> Self {
        let mut stats = FlockStats::default();
        let mut speed_sum = 0.0;
        let mut position_sum = Vec3::ZERO;

        for boid in boids {
            let speed = boid.velocity.length();
            stats.agents += 1;
            speed_sum += speed;
            stats.max_speed = stats.max_speed.max(speed);
            position_sum += boid.position;
            if !volume.contains(boid.position) {
                stats.outside_volume += 1;
            }
            *stats.per_kind.entry(boid.kind).or_default() += 1;
        }

        if stats.agents > 0 {
            stats.mean_speed = speed_sum / stats.agents as f32;
            stats.centroid = position_sum / stats.agents as f32;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SimulationParams;

    #[test]
    fn measure_empty_population() {
        let volume = BoundedVolume::new(10.0).unwrap();
        let boids: [Boid; 0] = [];
        let stats = FlockStats::measure(&boids, &volume);
        assert_eq!(stats, FlockStats::default());
    }

    #[test]
    fn measure_counts_kinds_and_escapees() {
        let params = SimulationParams::default();
        let volume = BoundedVolume::new(10.0).unwrap();
        let boids = [
            Boid::new(AgentKind::Piranha, Vec3::ZERO, Vec3::new(0.03, 0.0, 0.0), &params),
            Boid::new(AgentKind::Piranha, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.05, 0.0), &params),
            Boid::new(AgentKind::Sunfish, Vec3::new(20.0, 0.0, 0.0), Vec3::ZERO, &params),
        ];

        let stats = FlockStats::measure(&boids, &volume);
        assert_eq!(stats.agents, 3);
        assert_eq!(stats.outside_volume, 1);
        assert_eq!(stats.per_kind[&AgentKind::Piranha], 2);
        assert_eq!(stats.per_kind[&AgentKind::Sunfish], 1);
        assert!((stats.max_speed - 0.05).abs() < 1e-6);
        assert!((stats.centroid.x - 22.0 / 3.0).abs() < 1e-5);
    }

    #[test]
    fn absorb_accumulates_steps_and_pushes() {
        let mut total = TickSummary::default();
        total.absorb(TickSummary { steps: 1, agents: 4, collision_pushes: 2, escaped: 1 });
        total.absorb(TickSummary { steps: 1, agents: 4, collision_pushes: 3, escaped: 0 });
        assert_eq!(total, TickSummary { steps: 2, agents: 4, collision_pushes: 5, escaped: 0 });
    }
}
