//! Basalt terrain generation library
//!
//! Turns layered noise into a terraced volcanic landscape: hexagonal basalt
//! columns on flat plateaus, lava channels and pools between them, bottomless
//! voids, and contour lines. [`pipeline::TerrainGenerator`] is the entry point.

pub mod basalt;
pub mod bodies;
pub mod cache;
pub mod channels;
pub mod composer;
pub mod config;
pub mod contour;
pub mod export;
pub mod flood_fill;
pub mod geometry;
pub mod hex;
pub mod logging;
pub mod noise_layers;
pub mod params;
pub mod pipeline;
pub mod plateaus;
pub mod seeds;
pub mod terrain_map;
pub mod tilemap;
pub mod void_fill;

pub use params::GenerationParams;
pub use pipeline::{generate_terrain, TerrainData, TerrainGenerator};
