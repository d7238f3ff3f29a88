//! Basalt column placement
//!
//! Walks every hex cell covering the map, jitters its sample point, and keeps
//! it as a column where the Worley cell value is dense enough and the ground
//! is dry. Each kept hexagon's footprint is stamped as `BASALT`.

use crate::hex::{compute_visible_edges, hex_corners, hex_to_pixel, pixel_in_hex, pixel_to_hex, HexColumn};
use crate::params::ColumnParams;
use crate::seeds::{hash2d, unit_offset};
use crate::terrain_map::{TerrainMap, BASALT};
use crate::tilemap::Tilemap;

/// Sample jitter as a fraction of the hex size.
const JITTER_FRACTION: f32 = 0.3;

/// Extra axial margin around the map-corner hex range.
const RANGE_MARGIN: i32 = 2;

/// Inputs the placer samples
pub struct ColumnInputs<'a> {
    pub terraced: &'a Tilemap<f32>,
    pub cell_value: &'a Tilemap<f32>,
    pub liquid_mask: &'a Tilemap<bool>,
}

fn axial_range(width: usize, height: usize, size: f32) -> (i32, i32, i32, i32) {
    let (w, h) = (width as f32, height as f32);
    let corners = [
        pixel_to_hex(0.0, 0.0, size),
        pixel_to_hex(w, 0.0, size),
        pixel_to_hex(0.0, h, size),
        pixel_to_hex(w, h, size),
    ];
    let q_min = corners.iter().map(|c| c.q).min().unwrap_or(0) - RANGE_MARGIN;
    let q_max = corners.iter().map(|c| c.q).max().unwrap_or(0) + RANGE_MARGIN;
    let r_min = corners.iter().map(|c| c.r).min().unwrap_or(0) - RANGE_MARGIN;
    let r_max = corners.iter().map(|c| c.r).max().unwrap_or(0) + RANGE_MARGIN;
    (q_min, q_max, r_min, r_max)
}

/// Stamp every pixel inside hex `(q, r)` as basalt.
fn stamp_hex(terrain: &mut TerrainMap, q: i32, r: i32, size: f32) {
    let corners = hex_corners(q, r, size);
    let (mut fx0, mut fx1, mut fy0, mut fy1) = (f32::MAX, f32::MIN, f32::MAX, f32::MIN);
    for &(x, y) in &corners {
        fx0 = fx0.min(x);
        fx1 = fx1.max(x);
        fy0 = fy0.min(y);
        fy1 = fy1.max(y);
    }

    let max_x = terrain.width as i32 - 1;
    let max_y = terrain.height as i32 - 1;
    let x0 = (fx0 as i32 - 1).max(0);
    let x1 = (fx1 as i32 + 1).min(max_x);
    let y0 = (fy0 as i32 - 1).max(0);
    let y1 = (fy1 as i32 + 1).min(max_y);

    for py in y0..=y1 {
        for px in x0..=x1 {
            if pixel_in_hex(px as f32, py as f32, q, r, size) {
                terrain.set(px as usize, py as usize, BASALT);
            }
        }
    }
}

/// Place columns, stamp their footprints and resolve visible edges.
pub fn place_columns(inputs: &ColumnInputs, params: &ColumnParams, terrain: &mut TerrainMap) -> Vec<HexColumn> {
    let width = terrain.width;
    let height = terrain.height;
    let size = params.hex_size;
    let mut columns = Vec::new();

    if size <= 0.0 || width < 2 || height < 2 {
        tracing::warn!("Column placement skipped (hex size {size}, map {width}x{height})");
        return columns;
    }

    let (q_min, q_max, r_min, r_max) = axial_range(width, height, size);
    let (fw, fh) = (width as f32, height as f32);
    let mut rejected_density = 0usize;
    let mut rejected_liquid = 0usize;

    for q in q_min..=q_max {
        for r in r_min..=r_max {
            let (cx, cy) = hex_to_pixel(q, r, size);

            let hv = hash2d(q, r);
            let sx = cx + unit_offset(hv, 0) * size * JITTER_FRACTION;
            let sy = cy + unit_offset(hv, 8) * size * JITTER_FRACTION;

            if sx < 0.0 || sx >= fw - 1.0 || sy < 0.0 || sy >= fh - 1.0 {
                continue;
            }
            if cx < 0.0 || cy < 0.0 || cx as usize >= width || cy as usize >= height {
                continue;
            }

            let cell = inputs.cell_value.sample_bilinear(sx, sy);
            if cell < params.density_threshold {
                rejected_density += 1;
                continue;
            }

            let lx = (sx as usize).min(width - 1);
            let ly = (sy as usize).min(height - 1);
            if *inputs.liquid_mask.get(lx, ly) {
                rejected_liquid += 1;
                continue;
            }

            let base = inputs.terraced.sample_bilinear(sx, sy);
            columns.push(HexColumn::new(q, r, base + cell * params.jitter_scale, base));
            stamp_hex(terrain, q, r, size);
        }
    }

    compute_visible_edges(&mut columns);

    tracing::debug!(
        "Placed {} columns ({} below density, {} on liquid)",
        columns.len(),
        rejected_density,
        rejected_liquid
    );
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain_map::EMPTY;

    fn inputs(w: usize, h: usize, cell: f32) -> (Tilemap<f32>, Tilemap<f32>, Tilemap<bool>) {
        (
            Tilemap::new_with(w, h, 0.5),
            Tilemap::new_with(w, h, cell),
            Tilemap::new_with(w, h, false),
        )
    }

    #[test]
    fn test_dense_field_covers_map() {
        let (t, c, l) = inputs(64, 64, 1.0);
        let mut terrain = TerrainMap::new(64, 64);
        let cols = place_columns(
            &ColumnInputs { terraced: &t, cell_value: &c, liquid_mask: &l },
            &ColumnParams::default(),
            &mut terrain,
        );
        assert!(!cols.is_empty());
        for col in &cols {
            assert!((col.base_height - 0.5).abs() < 1e-6);
            assert!((col.top_height - 0.55).abs() < 1e-6);
        }
        // Interior fully basalt
        assert_eq!(*terrain.get(32, 32), BASALT);
    }

    #[test]
    fn test_sparse_field_places_nothing() {
        let (t, c, l) = inputs(64, 64, 0.1);
        let mut terrain = TerrainMap::new(64, 64);
        let cols = place_columns(
            &ColumnInputs { terraced: &t, cell_value: &c, liquid_mask: &l },
            &ColumnParams::default(),
            &mut terrain,
        );
        assert!(cols.is_empty());
        assert!(terrain.as_slice().iter().all(|&v| v == EMPTY));
    }

    #[test]
    fn test_liquid_mask_blocks_columns() {
        let (t, c, _) = inputs(64, 64, 1.0);
        let wet = Tilemap::new_with(64, 64, true);
        let mut terrain = TerrainMap::new(64, 64);
        let cols = place_columns(
            &ColumnInputs { terraced: &t, cell_value: &c, liquid_mask: &wet },
            &ColumnParams::default(),
            &mut terrain,
        );
        assert!(cols.is_empty());
    }

    #[test]
    fn test_placement_is_deterministic() {
        let (t, _, l) = inputs(48, 40, 0.0);
        let c = Tilemap::from_fn(48, 40, |x, y| ((x * 7 + y * 3) % 10) as f32 / 10.0);
        let run = || {
            let mut terrain = TerrainMap::new(48, 40);
            let cols = place_columns(
                &ColumnInputs { terraced: &t, cell_value: &c, liquid_mask: &l },
                &ColumnParams::default(),
                &mut terrain,
            );
            (cols, terrain)
        };
        let (a, ta) = run();
        let (b, tb) = run();
        assert_eq!(a, b);
        assert_eq!(ta, tb);
    }
}
