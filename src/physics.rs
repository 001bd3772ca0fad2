/*
 * Physics Module
 *
 * This module advances the whole population by one discrete step.
 * Every fish runs the same fixed sequence:
 * 1. Gather same-kind neighbors (brute force, excluding itself)
 * 2. Apply separation, alignment and cohesion, then wall turning
 * 3. Integrate velocity and position, limiting speed
 * 4. Clamp the position into the volume
 * 5. Push out of any fish (any kind) closer than the minimum distance
 * 6. Turn the heading to face the new velocity
 *
 * Two orderings are supported. In place, each fish is written back before the
 * next one is processed, so later fish react to the new state of earlier
 * ones. With a snapshot, steps 1-4 read a copy of the pre-tick population
 * (optionally in parallel) and steps 5-6 then run sequentially over the live
 * population.
 */

use rayon::prelude::*;

use crate::boid::Boid;
use crate::params::SimulationParams;
use crate::stats::TickSummary;
use crate::volume::BoundedVolume;

// Collect indices of fish sharing `boids[index]`'s kind, excluding `index`
#[inline]
pub fn same_kind_neighbors(boids: &[Boid], index: usize, neighbors: &mut Vec<usize>) {
    neighbors.clear();
    let kind = boids[index].kind;
    neighbors.extend(
        boids
            .iter()
            .enumerate()
            .filter(|&(i, other)| i != index && other.kind == kind)
            .map(|(i, _)| i),
    );
}

// Steps 1-4 for the fish stored at `index` of `population`
fn steer_and_integrate(
    boid: &mut Boid,
    index: usize,
    population: &[Boid],
    neighbors: &mut Vec<usize>,
    volume: &BoundedVolume,
    params: &SimulationParams,
) {
    boid.store_previous_state();

    same_kind_neighbors(population, index, neighbors);
    boid.flock(population, neighbors);
    boid.boundaries(volume, params.turn_factor, params.boundary_margin);

    boid.update();
    boid.confine(volume);
}

// Steps 5-6, recording pushes and escapes in `summary`
fn resolve_and_orient(
    boid: &mut Boid,
    index: usize,
    population: &[Boid],
    volume: &BoundedVolume,
    params: &SimulationParams,
    summary: &mut TickSummary,
) {
    summary.collision_pushes += boid.resolve_collisions(population, Some(index), params.min_distance);

    if params.clamp_after_collision {
        boid.confine(volume);
    } else if !volume.contains(boid.position) {
        summary.escaped += 1;
    }

    boid.update_heading();
}

// Reference ordering: each fish sees the already-updated fish before it
pub fn update_in_place(
    boids: &mut [Boid],
    neighbors: &mut Vec<usize>,
    volume: &BoundedVolume,
    params: &SimulationParams,
) -> TickSummary {
    let mut summary = TickSummary { steps: 1, agents: boids.len(), ..TickSummary::default() };

    for i in 0..boids.len() {
        // Work on a copy so the slice stays readable; slot i is skipped as "self"
        let mut boid = boids[i];
        steer_and_integrate(&mut boid, i, boids, neighbors, volume, params);
        resolve_and_orient(&mut boid, i, boids, volume, params, &mut summary);
        boids[i] = boid;
    }

    summary
}

// Order-independent steering against a copy of the pre-tick population.
// `chunk_neighbors` holds one neighbor buffer per parallel chunk, kept between steps.
pub fn update_with_snapshot(
    boids: &mut [Boid],
    snapshot: &mut Vec<Boid>,
    neighbors: &mut Vec<usize>,
    chunk_neighbors: &mut Vec<Vec<usize>>,
    volume: &BoundedVolume,
    params: &SimulationParams,
) -> TickSummary {
    let mut summary = TickSummary { steps: 1, agents: boids.len(), ..TickSummary::default() };

    snapshot.clear();
    snapshot.extend_from_slice(boids);
    let population: &[Boid] = &snapshot[..];

    if params.parallel {
        // Process fish in chunks to keep the number of parallel tasks low
        let chunk_size = std::cmp::max(boids.len() / rayon::current_num_threads(), 1);
        let chunks = (boids.len() + chunk_size - 1) / chunk_size;
        if chunk_neighbors.len() < chunks {
            chunk_neighbors.resize_with(chunks, Vec::new);
        }

        boids
            .par_chunks_mut(chunk_size)
            .zip(chunk_neighbors.par_iter_mut())
            .enumerate()
            .for_each(|(chunk_idx, (boid_chunk, scratch))| {
                for (i_in_chunk, boid) in boid_chunk.iter_mut().enumerate() {
                    let i = chunk_idx * chunk_size + i_in_chunk;
                    steer_and_integrate(boid, i, population, scratch, volume, params);
                }
            });
    } else {
        for (i, boid) in boids.iter_mut().enumerate() {
            steer_and_integrate(boid, i, population, neighbors, volume, params);
        }
    }

    // Collision correction reads and writes live positions, so it stays sequential
    for i in 0..boids.len() {
        let mut boid = boids[i];
        resolve_and_orient(&mut boid, i, boids, volume, params, &mut summary);
        boids[i] = boid;
    }

    summary
}
