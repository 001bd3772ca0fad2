/*
 * Flock Module
 *
 * The Flock owns every fish in the aquarium together with the shared volume,
 * the parameters, the clock and the scratch buffers reused by each step.
 * Fish live in dense storage for the brute-force neighbor scans; callers refer
 * to them through generational handles that stay valid until that fish is
 * removed, even as other fish are swapped into its slot.
 */

use std::time::Duration;

use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use slotmap::{new_key_type, SlotMap};
use tracing::{debug, info, trace};

use crate::boid::Boid;
use crate::clock::SimulationClock;
use crate::error::Result;
use crate::kind::AgentKind;
use crate::params::{SimulationParams, UpdateMode};
use crate::physics;
use crate::stats::{FlockStats, TickSummary};
use crate::volume::BoundedVolume;

new_key_type! {
    /// Stable handle for a fish, e.g. to attach render state to it.
    pub struct AgentHandle;
}

pub struct Flock {
    volume: BoundedVolume,
    params: SimulationParams,
    clock: SimulationClock,
    rng: ChaCha8Rng,
    slots: SlotMap<AgentHandle, usize>,
    handles: Vec<AgentHandle>,
    boids: Vec<Boid>,
    // Reused every step so the hot loop does not allocate
    neighbor_scratch: Vec<usize>,
    chunk_scratch: Vec<Vec<usize>>,
    snapshot: Vec<Boid>,
}

impl Flock {
    // Empty flock in `volume`; the volume's geometry replaces `volume_size` and `padding`
    pub fn new(volume: BoundedVolume, params: SimulationParams) -> Result<Self> {
        let params = SimulationParams {
            volume_size: volume.size(),
            padding: volume.padding(),
            ..params
        };
        params.validate()?;
        let clock = SimulationClock::new(params.physics_step_size()?, params.max_steps_per_tick)?;
        let rng = match params.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Ok(Self {
            volume,
            params,
            clock,
            rng,
            slots: SlotMap::with_key(),
            handles: Vec::new(),
            boids: Vec::new(),
            neighbor_scratch: Vec::new(),
            chunk_scratch: Vec::new(),
            snapshot: Vec::new(),
        })
    }

    // Build the volume from the parameters and spawn the initial population
    pub fn from_params(params: SimulationParams) -> Result<Self> {
        let volume = BoundedVolume::with_padding(params.volume_size, params.padding)?;
        let population = params.initial_population.clone();

        let mut flock = Self::new(volume, params)?;
        for entry in &population {
            flock.populate(entry.kind, entry.count);
        }

        info!(
            agents = flock.len(),
            volume_size = volume.size(),
            mode = ?flock.params.update_mode,
            "flock ready"
        );
        Ok(flock)
    }

    pub fn volume(&self) -> &BoundedVolume {
        &self.volume
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    // Discrete steps taken since construction
    pub fn steps(&self) -> u64 {
        self.clock.steps_taken()
    }

    pub fn len(&self) -> usize {
        self.boids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boids.is_empty()
    }

    pub fn contains(&self, handle: AgentHandle) -> bool {
        self.slots.contains_key(handle)
    }

    pub fn count_of(&self, kind: AgentKind) -> usize {
        self.boids.iter().filter(|boid| boid.kind == kind).count()
    }

    pub fn get(&self, handle: AgentHandle) -> Option<&Boid> {
        let index = *self.slots.get(handle)?;
        self.boids.get(index)
    }

    // Fish in update order
    pub fn iter(&self) -> impl Iterator<Item = (AgentHandle, &Boid)> + '_ {
        self.handles.iter().copied().zip(self.boids.iter())
    }

    pub fn boids(&self) -> &[Boid] {
        &self.boids
    }

    // Spawn one fish at a random position with a random heading
    pub fn add(&mut self, kind: AgentKind) -> AgentHandle {
        let boid = Boid::random(kind, &self.volume, &self.params, &mut self.rng);
        self.insert(boid)
    }

    pub fn populate(&mut self, kind: AgentKind, count: usize) -> Vec<AgentHandle> {
        self.reserve(count);
        (0..count).map(|_| self.add(kind)).collect()
    }

    // Spawn with an exact state; the position is not clamped
    pub fn spawn_at(&mut self, kind: AgentKind, position: Vec3, velocity: Vec3) -> AgentHandle {
        let boid = Boid::new(kind, position, velocity, &self.params);
        self.insert(boid)
    }

    pub fn set_position(&mut self, handle: AgentHandle, position: Vec3) -> bool {
        match self.get_mut(handle) {
            Some(boid) => {
                boid.position = position;
                boid.previous_position = position;
                true
            }
            None => false,
        }
    }

    // Also turns the fish to face the new velocity
    pub fn set_velocity(&mut self, handle: AgentHandle, velocity: Vec3) -> bool {
        match self.get_mut(handle) {
            Some(boid) => {
                boid.velocity = velocity;
                boid.update_heading();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, handle: AgentHandle) -> Option<Boid> {
        let index = self.slots.remove(handle)?;
        let removed = self.boids.swap_remove(index);
        let removed_handle = self.handles.swap_remove(index);
        debug_assert_eq!(removed_handle, handle);

        // The last fish now occupies the vacated slot
        if index < self.handles.len() {
            let moved = self.handles[index];
            if let Some(slot) = self.slots.get_mut(moved) {
                *slot = index;
            }
        }

        Some(removed)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.handles.clear();
        self.boids.clear();
    }

    // One discrete step covering one fixed step size of simulated time
    pub fn step(&mut self) -> TickSummary {
        self.tick(self.clock.step_size())
    }

    // Advance the whole population by exactly one discrete step; `delta` is
    // the time the caller attributes to it and only feeds the clock
    pub fn tick(&mut self, delta: Duration) -> TickSummary {
        let summary = self.run_step();
        self.clock.record_step(delta);
        trace!(
            step = self.clock.steps_taken(),
            pushes = summary.collision_pushes,
            escaped = summary.escaped,
            "flock tick"
        );
        summary
    }

    // Feed wall-clock frame time to the fixed timestep accumulator and run
    // every step that is due, possibly none
    pub fn advance_frame(&mut self, delta: Duration) -> TickSummary {
        let due = self.clock.advance(delta);

        let mut summary = TickSummary { agents: self.len(), ..TickSummary::default() };
        for _ in 0..due {
            summary.absorb(self.run_step());
        }

        if due > 0 {
            debug!(
                steps = summary.steps,
                agents = summary.agents,
                pushes = summary.collision_pushes,
                escaped = summary.escaped,
                "flock frame"
            );
        }
        summary
    }

    fn run_step(&mut self) -> TickSummary {
        match self.params.update_mode {
            UpdateMode::InPlace => physics::update_in_place(
                &mut self.boids,
                &mut self.neighbor_scratch,
                &self.volume,
                &self.params,
            ),
            UpdateMode::Snapshot => physics::update_with_snapshot(
                &mut self.boids,
                &mut self.snapshot,
                &mut self.neighbor_scratch,
                &mut self.chunk_scratch,
                &self.volume,
                &self.params,
            ),
        }
    }

    // Fraction of a step left over after the last frame, for interpolation
    pub fn interpolation_alpha(&self) -> f32 {
        self.clock.interpolation_alpha()
    }

    pub fn stats(&self) -> FlockStats {
        FlockStats::measure(&self.boids, &self.volume)
    }

    fn get_mut(&mut self, handle: AgentHandle) -> Option<&mut Boid> {
        let index = *self.slots.get(handle)?;
        self.boids.get_mut(index)
    }

    fn insert(&mut self, boid: Boid) -> AgentHandle {
        let index = self.boids.len();
        self.boids.push(boid);
        let handle = self.slots.insert(index);
        self.handles.push(handle);

        if self.neighbor_scratch.capacity() < self.boids.len() {
            self.neighbor_scratch.reserve(self.boids.len());
        }
        handle
    }

    fn reserve(&mut self, additional: usize) {
        self.slots.reserve(additional);
        self.handles.reserve(additional);
        self.boids.reserve(additional);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_params() -> SimulationParams {
        SimulationParams { seed: Some(7), ..SimulationParams::default() }
    }

    fn empty_flock() -> Flock {
        Flock::new(BoundedVolume::new(80.0).unwrap(), seeded_params()).unwrap()
    }

    #[test]
    fn new_rejects_invalid_params() {
        let params = SimulationParams { max_force: -1.0, ..SimulationParams::default() };
        assert!(Flock::new(BoundedVolume::new(80.0).unwrap(), params).is_err());
    }

    #[test]
    fn from_params_spawns_initial_population() {
        let flock = Flock::from_params(seeded_params()).unwrap();
        assert_eq!(flock.len(), 9);
        assert_eq!(flock.count_of(AgentKind::BlueGoldfish), 3);
        assert_eq!(flock.count_of(AgentKind::Piranha), 0);
        assert!(flock.boids().iter().all(|b| flock.volume().contains(b.position)));
    }

    #[test]
    fn added_fish_start_inside_with_unit_velocity() {
        let mut flock = empty_flock();
        let handles = flock.populate(AgentKind::Piranha, 20);
        for handle in handles {
            let boid = flock.get(handle).unwrap();
            assert!(flock.volume().contains(boid.position));
            assert!((boid.velocity.length() - 1.0).abs() < 1e-5);
            assert_eq!(boid.kind, AgentKind::Piranha);
        }
    }

    #[test]
    fn handles_survive_removal_of_others() {
        let mut flock = empty_flock();
        let first = flock.spawn_at(AgentKind::Sunfish, Vec3::new(1.0, 0.0, 0.0), Vec3::ZERO);
        let second = flock.spawn_at(AgentKind::Sunfish, Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO);
        let third = flock.spawn_at(AgentKind::Sunfish, Vec3::new(3.0, 0.0, 0.0), Vec3::ZERO);

        let removed = flock.remove(first).unwrap();
        assert_eq!(removed.position.x, 1.0);
        assert!(!flock.contains(first));
        assert!(flock.remove(first).is_none());

        assert_eq!(flock.get(second).unwrap().position.x, 2.0);
        assert_eq!(flock.get(third).unwrap().position.x, 3.0);
        assert_eq!(flock.len(), 2);
    }

    #[test]
    fn stale_handle_does_not_alias_new_fish() {
        let mut flock = empty_flock();
        let old = flock.add(AgentKind::Piranha);
        flock.remove(old);
        let new = flock.add(AgentKind::Sunfish);
        assert_ne!(old, new);
        assert!(flock.get(old).is_none());
        assert!(!flock.set_position(old, Vec3::ZERO));
    }

    #[test]
    fn set_velocity_turns_heading() {
        let mut flock = empty_flock();
        let handle = flock.spawn_at(AgentKind::Piranha, Vec3::ZERO, Vec3::ZERO);
        assert!(flock.set_velocity(handle, Vec3::new(0.0, 0.05, 0.0)));
        let boid = flock.get(handle).unwrap();
        assert!(boid.forward().abs_diff_eq(Vec3::Y, 1e-5));
    }

    #[test]
    fn new_takes_geometry_from_the_volume() {
        let params = SimulationParams { volume_size: 10.0, padding: 0.2, ..seeded_params() };
        let flock = Flock::new(BoundedVolume::with_padding(80.0, 0.1).unwrap(), params).unwrap();
        assert_eq!(flock.params().volume_size, 80.0);
        assert_eq!(flock.params().padding, 0.1);
    }

    #[test]
    fn new_reports_unusable_physics_rate() {
        let params = SimulationParams { fixed_physics_fps: 1.0e-30, ..seeded_params() };
        assert!(matches!(
            Flock::new(BoundedVolume::new(80.0).unwrap(), params),
            Err(crate::error::SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn every_tick_is_one_step() {
        let mut flock = empty_flock();
        flock.add(AgentKind::CoralGrouper);

        for delta in [Duration::ZERO, Duration::from_millis(1), Duration::from_millis(16), Duration::from_secs(2)] {
            assert_eq!(flock.tick(delta).steps, 1);
        }
        assert_eq!(flock.steps(), 4);
        assert_eq!(flock.clock().elapsed(), Duration::from_millis(2017));
    }

    #[test]
    fn advance_frame_runs_due_steps_only() {
        let mut flock = empty_flock();
        flock.add(AgentKind::CoralGrouper);
        let step = flock.clock().step_size();

        assert_eq!(flock.advance_frame(step / 2).steps, 0);
        assert_eq!(flock.advance_frame(step / 2 + Duration::from_micros(1)).steps, 1);
        assert_eq!(flock.advance_frame(step * 3).steps, 3);
        assert_eq!(flock.steps(), 4);
    }

    #[test]
    fn same_seed_gives_same_flock() {
        let mut left = Flock::from_params(seeded_params()).unwrap();
        let mut right = Flock::from_params(seeded_params()).unwrap();
        for _ in 0..50 {
            left.step();
            right.step();
        }
        assert_eq!(left.boids(), right.boids());
    }

    #[test]
    fn clear_empties_the_flock() {
        let mut flock = Flock::from_params(seeded_params()).unwrap();
        flock.clear();
        assert!(flock.is_empty());
        assert_eq!(flock.step().agents, 0);
    }
}
