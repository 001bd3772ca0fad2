/*
 * Boid Module
 *
 * This module defines the Boid struct and its behavior.
 * Each boid follows three flocking rules against fish of its own kind:
 * 1. Separation: Avoid crowding neighbors
 * 2. Alignment: Steer towards the average heading of neighbors
 * 3. Cohesion: Steer towards the average position of neighbors
 * On top of those it turns away from the aquarium walls, and after moving
 * it pushes itself out of any fish (of any kind) that is too close.
 */

use glam::{Quat, Vec3};
use rand::Rng;

use crate::kind::AgentKind;
use crate::params::SimulationParams;
use crate::volume::BoundedVolume;

// Axis the fish model faces before any rotation
pub const FORWARD: Vec3 = Vec3::Z;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub kind: AgentKind,
    pub max_speed: f32,
    pub max_force: f32,
    pub perception_radius: f32,
    pub separation_distance: f32,
    pub heading: Quat,
    pub previous_position: Vec3,
}

// Rescale `v` to `length`, or None when it has no direction
#[inline]
fn with_length(v: Vec3, length: f32) -> Option<Vec3> {
    v.try_normalize().map(|unit| unit * length)
}

impl Boid {
    pub fn new(kind: AgentKind, position: Vec3, velocity: Vec3, params: &SimulationParams) -> Self {
        let mut boid = Self {
            position,
            velocity,
            acceleration: Vec3::ZERO,
            kind,
            max_speed: params.max_speed,
            max_force: params.max_force,
            perception_radius: params.perception_radius,
            separation_distance: params.separation_distance,
            heading: Quat::IDENTITY,
            previous_position: position,
        };
        boid.update_heading();
        boid
    }

    // Random position inside the volume and a random unit-length velocity
    pub fn random<R: Rng + ?Sized>(
        kind: AgentKind,
        volume: &BoundedVolume,
        params: &SimulationParams,
        rng: &mut R,
    ) -> Self {
        let position = volume.random_point(rng);

        let velocity = loop {
            let candidate = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            if let Some(unit) = candidate.try_normalize() {
                break unit;
            }
        };

        Self::new(kind, position, velocity, params)
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn heading(&self) -> Quat {
        self.heading
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    // Direction the fish is currently facing
    #[inline]
    pub fn forward(&self) -> Vec3 {
        self.heading * FORWARD
    }

    // Position between the last two steps, for rendering between fixed steps
    pub fn interpolated_position(&self, alpha: f32) -> Vec3 {
        self.previous_position.lerp(self.position, alpha.clamp(0.0, 1.0))
    }

    pub fn store_previous_state(&mut self) {
        self.previous_position = self.position;
    }

    // Apply a force to the boid
    #[inline]
    pub fn apply_force(&mut self, force: Vec3) {
        self.acceleration += force;
    }

    // Reynolds steering: desired velocity at full speed minus current velocity
    #[inline]
    fn steer_towards(&self, direction: Vec3) -> Vec3 {
        match with_length(direction, self.max_speed) {
            Some(desired) => (desired - self.velocity).clamp_length_max(self.max_force),
            None => Vec3::ZERO,
        }
    }

    // Calculate separation force (avoid crowding neighbors)
    pub fn separation(&self, boids: &[Boid], neighbor_indices: &[usize]) -> Vec3 {
        let mut steering = Vec3::ZERO;
        let mut count = 0;

        for &i in neighbor_indices {
            let other = &boids[i];
            let d = self.position.distance(other.position);

            if d > 0.0 && d < self.separation_distance {
                // Inverse-square weighting: the closest fish dominate
                steering += (self.position - other.position) / (d * d);
                count += 1;
            }
        }

        if count == 0 {
            return Vec3::ZERO;
        }

        self.steer_towards(steering / count as f32)
    }

    // Calculate alignment force (steer towards average heading of neighbors)
    pub fn alignment(&self, boids: &[Boid], neighbor_indices: &[usize]) -> Vec3 {
        let mut average_velocity = Vec3::ZERO;
        let mut count = 0;

        for &i in neighbor_indices {
            let other = &boids[i];
            let d = self.position.distance(other.position);

            if d > 0.0 && d < self.perception_radius {
                average_velocity += other.velocity;
                count += 1;
            }
        }

        if count == 0 {
            return Vec3::ZERO;
        }

        self.steer_towards(average_velocity / count as f32)
    }

    // Calculate cohesion force (steer towards average position of neighbors)
    pub fn cohesion(&self, boids: &[Boid], neighbor_indices: &[usize]) -> Vec3 {
        let mut center = Vec3::ZERO;
        let mut count = 0;

        for &i in neighbor_indices {
            let other = &boids[i];
            let d = self.position.distance(other.position);

            if d > 0.0 && d < self.perception_radius {
                center += other.position;
                count += 1;
            }
        }

        if count == 0 {
            return Vec3::ZERO;
        }

        self.steer_towards(center / count as f32 - self.position)
    }

    // The three flocking rules, equally weighted
    pub fn flock(&mut self, boids: &[Boid], neighbor_indices: &[usize]) {
        let separation = self.separation(boids, neighbor_indices);
        let alignment = self.alignment(boids, neighbor_indices);
        let cohesion = self.cohesion(boids, neighbor_indices);

        self.apply_force(separation);
        self.apply_force(alignment);
        self.apply_force(cohesion);
    }

    // Nudge velocity away from any wall closer than `margin`; not limited by max_force
    pub fn boundaries(&mut self, volume: &BoundedVolume, turn_factor: f32, margin: f32) {
        let min = volume.min_corner();
        let max = volume.max_corner();

        if self.position.x < min.x + margin { self.velocity.x += turn_factor; }
        if self.position.x > max.x - margin { self.velocity.x -= turn_factor; }
        if self.position.y < min.y + margin { self.velocity.y += turn_factor; }
        if self.position.y > max.y - margin { self.velocity.y -= turn_factor; }
        if self.position.z < min.z + margin { self.velocity.z += turn_factor; }
        if self.position.z > max.z - margin { self.velocity.z -= turn_factor; }
    }

    // Update the boid's position based on its velocity and acceleration
    pub fn update(&mut self) {
        self.velocity += self.acceleration;

        // Limit speed; there is no minimum, a boid may come to rest
        self.velocity = self.velocity.clamp_length_max(self.max_speed);

        self.position += self.velocity;
        self.acceleration = Vec3::ZERO;
    }

    pub fn confine(&mut self, volume: &BoundedVolume) {
        self.position = volume.clamp(self.position);
    }

    // Push directly away from every fish closer than `min_distance`, one at a
    // time in slice order. `skip` is this boid's own slot in `boids`, if any.
    // Returns how many pushes were applied.
    pub fn resolve_collisions(&mut self, boids: &[Boid], skip: Option<usize>, min_distance: f32) -> usize {
        let mut pushes = 0;

        for (i, other) in boids.iter().enumerate() {
            if Some(i) == skip {
                continue;
            }

            let d = self.position.distance(other.position);
            if d < min_distance {
                // Coincident fish have no "away"; swim out along the heading
                let away = (self.position - other.position)
                    .try_normalize()
                    .unwrap_or_else(|| self.forward());
                self.position += away * (min_distance - d);
                pushes += 1;
            }
        }

        pushes
    }

    // Face along the velocity; a resting boid keeps its last heading
    pub fn update_heading(&mut self) {
        if let Some(direction) = self.velocity.try_normalize() {
            self.heading = Quat::from_rotation_arc(FORWARD, direction);
        }
    }
}
