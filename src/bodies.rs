//! Lava and void bodies
//!
//! Plateaus, channel regions and liquid bodies all share the same geometric
//! shape (member pixels plus a bounding box); [`RegionGeometry`] exposes that
//! shape uniformly. Lava and void bodies are one tagged type.

use crate::flood_fill::PixelBounds;
use crate::geometry::LavaMesh;
use crate::plateaus::Plateau;

/// What a liquid body is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BodyKind {
    Lava,
    /// Bottomless gap; never meshed
    Void,
}

/// Where a body came from (neither kind is tied to a single plateau)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyOrigin {
    /// Classified channel space
    Channel,
    /// Remaining open space after column placement
    FloodFill,
}

/// A lava or void surface
#[derive(Clone, Debug)]
pub struct LiquidBody {
    pub kind: BodyKind,
    pub origin: BodyOrigin,
    /// Surface reference height
    pub height: f32,
    pub bounds: PixelBounds,
    pub aspect_ratio: f32,
    pub pixels: Vec<usize>,
    /// Animation phase in [0, 2π)
    pub phase: f32,
    /// Always `None` for void bodies
    pub mesh: Option<LavaMesh>,
}

pub type LavaBody = LiquidBody;
pub type VoidBody = LiquidBody;

/// Shared shape of every segmented region
pub trait RegionGeometry {
    fn bounds(&self) -> PixelBounds;
    fn pixels(&self) -> &[usize];

    fn mesh(&self) -> Option<&LavaMesh> {
        None
    }

    fn pixel_count(&self) -> usize {
        self.pixels().len()
    }

    fn aspect_ratio(&self) -> f32 {
        self.bounds().aspect_ratio()
    }
}

impl RegionGeometry for LiquidBody {
    fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    fn pixels(&self) -> &[usize] {
        &self.pixels
    }

    fn mesh(&self) -> Option<&LavaMesh> {
        self.mesh.as_ref()
    }

    fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }
}

impl RegionGeometry for Plateau {
    fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    fn pixels(&self) -> &[usize] {
        &self.pixels
    }
}

/// Animated lava surface height at `(x, y)`.
///
/// Three travelling sine waves on top of `base_z`; `phase` desynchronises bodies.
pub fn lava_surface_height(x: f32, y: f32, base_z: f32, time: f32, phase: f32) -> f32 {
    let t = time + phase;
    let wave1 = (x * 0.3 + t).sin() * 0.02;
    let wave2 = (y * 0.21 + t * 1.3).sin() * 0.015;
    let wave3 = ((x + y) * 0.15 + t * 0.8).sin() * 0.01;
    base_z + wave1 + wave2 + wave3
}
