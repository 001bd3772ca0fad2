/*
 * Aquarium Boids - Module Definitions
 *
 * This file defines the module structure of the flocking core. Rendering,
 * assets and UI live outside this crate; each step hands back a position and
 * a heading per fish for whatever draws them.
 */

// Re-export key components for easier access
pub use boid::{Boid, FORWARD};
pub use clock::SimulationClock;
pub use error::{Result, SimulationError};
pub use flock::{AgentHandle, Flock};
pub use kind::AgentKind;
pub use params::{PopulationEntry, SimulationParams, UpdateMode};
pub use stats::{FlockStats, TickSummary};
pub use volume::BoundedVolume;

// Define modules
pub mod boid;
pub mod clock;
pub mod error;
pub mod flock;
pub mod kind;
pub mod params;
pub mod physics;
pub mod stats;
pub mod volume;
