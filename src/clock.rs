/*
 * Simulation Clock Module
 *
 * Keeps simulated time for the flock. A caller that already steps once per
 * frame records each step with its elapsed time. A caller driven by raw
 * wall-clock frames feeds the fixed timestep accumulator instead, which
 * answers how many discrete physics steps are due and keeps the per-step
 * constants independent of the render frame rate. The leftover fraction of a
 * step is exposed as an interpolation alpha for renderers.
 */

use std::time::Duration;

use tracing::warn;

use crate::error::{invalid, Result};

#[derive(Debug, Clone)]
pub struct SimulationClock {
    step_size: Duration,
    accumulator: Duration,
    max_steps_per_advance: u32,
    steps_taken: u64,
    elapsed: Duration,
}

impl SimulationClock {
    pub fn new(step_size: Duration, max_steps_per_advance: u32) -> Result<Self> {
        if step_size.is_zero() {
            return Err(invalid("clock step size must be positive"));
        }
        if max_steps_per_advance == 0 {
            return Err(invalid("clock must allow at least one step per advance"));
        }

        Ok(Self {
            step_size,
            accumulator: Duration::ZERO,
            max_steps_per_advance,
            steps_taken: 0,
            elapsed: Duration::ZERO,
        })
    }

    pub fn step_size(&self) -> Duration {
        self.step_size
    }

    pub fn steps_taken(&self) -> u64 {
        self.steps_taken
    }

    // Total simulated time covered by the steps taken so far
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    // Count one step that covered `delta`; the accumulator is left alone
    pub fn record_step(&mut self, delta: Duration) {
        self.steps_taken += 1;
        self.elapsed = self.elapsed.saturating_add(delta);
    }

    // Add frame time and return the number of whole steps to run now
    pub fn advance(&mut self, delta: Duration) -> u32 {
        self.accumulator = self.accumulator.saturating_add(delta);

        let mut steps = 0;
        while self.accumulator >= self.step_size && steps < self.max_steps_per_advance {
            self.accumulator -= self.step_size;
            steps += 1;
        }

        // Drop backlog we cannot catch up on instead of spiralling
        if self.accumulator >= self.step_size {
            let dropped = self.accumulator.as_secs_f64() / self.step_size.as_secs_f64();
            warn!(dropped_steps = dropped.floor() as u64, "simulation clock fell behind, discarding backlog");
            self.accumulator = Duration::from_nanos(
                (self.accumulator.as_nanos() % self.step_size.as_nanos()) as u64,
            );
        }

        self.steps_taken += u64::from(steps);
        self.elapsed = self.elapsed.saturating_add(self.step_size.saturating_mul(steps));
        steps
    }

    // Fraction of the next step already accumulated, in [0, 1]
    pub fn interpolation_alpha(&self) -> f32 {
        let alpha = self.accumulator.as_secs_f32() / self.step_size.as_secs_f32();
        alpha.clamp(0.0, 1.0)
    }
}
