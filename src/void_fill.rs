//! Lava / void flood fill
//!
//! After columns and channel lava are stamped, every remaining open component
//! becomes either a lava pool or a void. The choice is a seeded random draw
//! per component, so the same map always splits the same way.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::bodies::{BodyKind, BodyOrigin, LiquidBody};
use crate::flood_fill::connected_components;
use crate::geometry::grid_mesh;
use crate::seeds::{animation_phase, body_draw_seed};
use crate::terrain_map::{TerrainMap, BASALT, LAVA, VOID};
use crate::tilemap::Tilemap;

/// Components smaller than this stay as they are.
pub const MIN_COMPONENT_PIXELS: usize = 50;

#[derive(Clone, Debug, Default)]
pub struct VoidFillOutcome {
    pub lava: Vec<LiquidBody>,
    pub voids: Vec<LiquidBody>,
    /// Components skipped for being under [`MIN_COMPONENT_PIXELS`]
    pub too_small: usize,
}

/// Split the remaining open space into lava and void bodies and stamp them.
///
/// "Remaining" means neither basalt nor already lava. Each surviving
/// component is void with probability `void_chance`; only lava gets a mesh.
pub fn fill_voids(
    terrain: &mut TerrainMap,
    heights: &Tilemap<f32>,
    void_chance: f32,
    seed: i32,
    grid_spacing: f32,
) -> VoidFillOutcome {
    let (width, height) = (terrain.width, terrain.height);
    let mut rng = ChaCha8Rng::seed_from_u64(body_draw_seed(width, height, seed));
    let mut outcome = VoidFillOutcome::default();

    let components = {
        let cells = terrain.as_slice();
        connected_components(width, height, |i| cells[i] != BASALT && cells[i] != LAVA, |_, _| true)
    };

    let mut body_index = 0usize;
    for component in components {
        if component.len() < MIN_COMPONENT_PIXELS {
            outcome.too_small += 1;
            continue;
        }

        let is_void = rng.gen::<f32>() < void_chance;
        let surface = component.mean(heights.as_slice());
        let phase = animation_phase(body_index);
        body_index += 1;

        let (kind, class, mesh) = if is_void {
            (BodyKind::Void, VOID, None)
        } else {
            let mesh = grid_mesh(&component.pixels, component.bounds, width, height, grid_spacing, surface);
            (BodyKind::Lava, LAVA, Some(mesh))
        };

        for &idx in &component.pixels {
            terrain.stamp(idx, class);
        }

        let body = LiquidBody {
            kind,
            origin: BodyOrigin::FloodFill,
            height: surface,
            bounds: component.bounds,
            aspect_ratio: component.bounds.aspect_ratio(),
            pixels: component.pixels,
            phase,
            mesh,
        };
        match kind {
            BodyKind::Void => outcome.voids.push(body),
            BodyKind::Lava => outcome.lava.push(body),
        }
    }

    tracing::debug!(
        "Void fill: {} lava, {} void, {} too small",
        outcome.lava.len(),
        outcome.voids.len(),
        outcome.too_small
    );
    outcome
}
