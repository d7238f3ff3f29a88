//! Generation pipeline
//!
//! Runs every stage in a fixed order over one owned classification grid:
//! composition, plateaus, columns, channel lava, lava/void fill, contours.
//! Later stages overwrite earlier ones, except that basalt is final.

use std::time::{Duration, Instant};

use crate::basalt::{place_columns, ColumnInputs};
use crate::bodies::{LavaBody, VoidBody};
use crate::cache::{CacheStats, NoiseCache};
use crate::channels::{build_channel_lava, extract_channels, ChannelReport};
use crate::composer::{compose_layers, ComposedLayers, CompositionReport};
use crate::contour::{extract_contours, ContourLine};
use crate::hex::HexColumn;
use crate::params::GenerationParams;
use crate::plateaus::{build_band_map, detect_plateaus, Plateau};
use crate::terrain_map::{TerrainMap, LAVA};
use crate::tilemap::Tilemap;
use crate::void_fill::fill_voids;

/// Counters and timings from one run
#[derive(Clone, Debug)]
pub struct GenerationReport {
    pub composition: CompositionReport,
    pub plateaus: usize,
    pub columns: usize,
    pub channels: ChannelReport,
    pub flood_lava_bodies: usize,
    pub void_bodies: usize,
    /// Open components too small for the lava/void split
    pub small_components: usize,
    pub contour_segments: usize,
    /// Wall time per stage, in execution order
    pub timings: Vec<(&'static str, Duration)>,
}

impl GenerationReport {
    pub fn total_time(&self) -> Duration {
        self.timings.iter().map(|(_, d)| *d).sum()
    }
}

/// Everything one generation produces
#[derive(Clone, Debug)]
pub struct TerrainData {
    pub width: usize,
    pub height: usize,
    /// Unterraced elevation
    pub elevation: Tilemap<f32>,
    /// Terraced heightfield all stages read
    pub heightfield: Tilemap<f32>,
    pub band_map: Tilemap<i32>,
    pub terrain: TerrainMap,
    pub plateaus: Vec<Plateau>,
    pub columns: Vec<HexColumn>,
    /// Channel lava first, then flood-fill lava
    pub lava_bodies: Vec<LavaBody>,
    pub void_bodies: Vec<VoidBody>,
    pub contours: Vec<ContourLine>,
    pub report: GenerationReport,
}

fn timed<T>(timings: &mut Vec<(&'static str, Duration)>, stage: &'static str, f: impl FnOnce() -> T) -> T {
    let start = Instant::now();
    let out = f();
    let elapsed = start.elapsed();
    tracing::debug!("{}: {:.2?}", stage, elapsed);
    timings.push((stage, elapsed));
    out
}

/// Compose the layers (through `cache` if given) and run every stage.
pub fn generate_terrain(params: &GenerationParams, cache: Option<&mut NoiseCache>) -> TerrainData {
    let start = Instant::now();
    let composed = compose_layers(params, cache);
    let compose_time = start.elapsed();

    let mut data = generate_from_layers(composed, params);
    data.report.timings.insert(0, ("compose", compose_time));
    data
}

/// Run every stage after composition on already-composed layers.
pub fn generate_from_layers(layers: ComposedLayers, params: &GenerationParams) -> TerrainData {
    let (width, height) = (layers.terraced.width, layers.terraced.height);
    let comp = &params.composition;
    let mut timings = Vec::new();

    let mut terrain = TerrainMap::new(width, height);

    let band_map = build_band_map(&layers.terraced, comp.interval());
    let plateaus = timed(&mut timings, "plateaus", || {
        detect_plateaus(&layers.terraced, &band_map, &mut terrain)
    });

    let columns = timed(&mut timings, "columns", || {
        let inputs = ColumnInputs {
            terraced: &layers.terraced,
            cell_value: &layers.worley.cell_value,
            liquid_mask: &layers.liquid_mask,
        };
        place_columns(&inputs, &params.columns, &mut terrain)
    });

    let (mut lava_bodies, channel_report) = if params.channels.enabled {
        timed(&mut timings, "channels", || {
            let regions = extract_channels(&terrain, &layers.terraced);
            let (bodies, report) = build_channel_lava(regions, &layers.terraced, &params.channels);
            for body in &bodies {
                for &idx in &body.pixels {
                    terrain.stamp(idx, LAVA);
                }
            }
            (bodies, report)
        })
    } else {
        (Vec::new(), ChannelReport::default())
    };

    let fill = timed(&mut timings, "void_fill", || {
        fill_voids(
            &mut terrain,
            &layers.terraced,
            comp.void_chance,
            params.worley.seed,
            params.channels.grid_spacing,
        )
    });

    let contours = timed(&mut timings, "contours", || extract_contours(&layers.terraced, comp.interval()));

    let report = GenerationReport {
        composition: layers.report.clone(),
        plateaus: plateaus.len(),
        columns: columns.len(),
        channels: channel_report,
        flood_lava_bodies: fill.lava.len(),
        void_bodies: fill.voids.len(),
        small_components: fill.too_small,
        contour_segments: contours.len(),
        timings,
    };

    tracing::info!(
        "Generated {}x{}: {} plateaus, {} columns, {} lava bodies, {} voids, {} contour segments",
        width,
        height,
        report.plateaus,
        report.columns,
        lava_bodies.len() + fill.lava.len(),
        fill.voids.len(),
        report.contour_segments
    );

    lava_bodies.extend(fill.lava);

    TerrainData {
        width,
        height,
        elevation: layers.elevation,
        heightfield: layers.terraced,
        band_map,
        terrain,
        plateaus,
        columns,
        lava_bodies,
        void_bodies: fill.voids,
        contours,
        report,
    }
}

/// Pipeline driver that owns its noise cache across regenerations
#[derive(Default)]
pub struct TerrainGenerator {
    cache: NoiseCache,
}

impl TerrainGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regenerate; noise layers whose parameters are unchanged come from the cache.
    pub fn generate(&mut self, params: &GenerationParams) -> TerrainData {
        generate_terrain(params, Some(&mut self.cache))
    }

    /// Forget every cached layer (after loading new parameters, or on reset).
    pub fn invalidate(&mut self) {
        self.cache.invalidate_all();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::{compose_from_layers, LayerSource};
    use crate::hex::pixel_in_hex;
    use crate::noise_layers::WorleyLayers;
    use crate::params::{ColumnParams, CompositionParams, ElevationParams, WorleyParams};
    use crate::terrain_map::{TerrainClass, BASALT};

    fn ramp_layers(size: usize, params: &GenerationParams) -> ComposedLayers {
        let elevation = Tilemap::from_fn(size, size, |x, _| x as f32 / size as f32);
        let zeros = Tilemap::new_with(size, size, 0.0f32);
        let worley = WorleyLayers {
            distance: zeros.clone(),
            edge: zeros.clone(),
            cell_value: zeros,
        };
        compose_from_layers(elevation, None, worley, params)
    }

    fn ramp_params() -> GenerationParams {
        GenerationParams {
            width: 64,
            height: 64,
            composition: CompositionParams {
                terrace_levels: 4,
                min_region_size: 100,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_ramp_end_to_end() {
        let params = ramp_params();
        let data = generate_from_layers(ramp_layers(64, &params), &params);

        assert_eq!(data.report.composition.elevation, LayerSource::Provided);
        assert_eq!(data.plateaus.len(), 4);
        for (i, p) in data.plateaus.iter().enumerate() {
            assert_eq!(p.bounds.min_y, 0);
            assert_eq!(p.bounds.max_y, 63);
            assert_eq!(p.bounds.width(), 16);
            assert_eq!(p.bounds.min_x, i * 16);
            assert!((p.mean_height - i as f32 * 0.25).abs() < 1e-6);
        }

        // No columns on a zero cell-value field
        assert!(data.columns.is_empty());

        let mut xs: Vec<f32> = data.contours.iter().map(|l| l.x1).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        xs.dedup();
        assert_eq!(xs.len(), 3);
        for (x, expected) in xs.iter().zip([16.0, 32.0, 48.0]) {
            assert!((x - expected).abs() <= 1.0, "contour at {x}, expected near {expected}");
        }
        assert!(data.contours.iter().all(|l| l.x1 == l.x2));
    }

    #[test]
    fn test_every_cell_is_a_known_class() {
        let params = ramp_params();
        let data = generate_from_layers(ramp_layers(64, &params), &params);
        let max_id = data.plateaus.len() as i16;
        for &raw in data.terrain.as_slice() {
            match TerrainClass::from_raw(raw) {
                TerrainClass::Plateau(id) => assert!(id as i16 <= max_id),
                _ => assert!(raw >= -3),
            }
        }
    }

    fn noisy_params() -> GenerationParams {
        GenerationParams {
            width: 96,
            height: 96,
            elevation: ElevationParams { frequency: 0.02, octaves: 3, ..Default::default() },
            worley: WorleyParams { frequency: 0.05, warp_amp: 4.0, ..Default::default() },
            composition: CompositionParams { min_region_size: 60, terrace_levels: 4, ..Default::default() },
            columns: ColumnParams { density_threshold: 0.5, ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn test_basalt_footprints_survive_later_stages() {
        let params = noisy_params();
        let data = generate_terrain(&params, None);
        assert!(!data.columns.is_empty());

        let size = params.columns.hex_size;
        for col in &data.columns {
            for (x, y, &cell) in data.terrain.iter() {
                if pixel_in_hex(x as f32, y as f32, col.q, col.r, size) {
                    assert_eq!(cell, BASALT, "column ({}, {}) at pixel ({x}, {y})", col.q, col.r);
                }
            }
        }
    }

    #[test]
    fn test_regeneration_is_deterministic_and_cached() {
        let params = noisy_params();
        let mut generator = TerrainGenerator::new();
        let a = generator.generate(&params);
        let b = generator.generate(&params);

        assert_eq!(a.terrain, b.terrain);
        assert_eq!(a.columns, b.columns);
        assert_eq!(a.contours, b.contours);
        assert_eq!(b.report.composition.elevation, LayerSource::Cached);
        assert_eq!(b.report.composition.worley, LayerSource::Cached);

        generator.invalidate();
        let c = generator.generate(&params);
        assert_eq!(c.report.composition.elevation, LayerSource::Generated);
        assert_eq!(a.terrain, c.terrain);
    }

    #[test]
    fn test_void_bodies_have_no_mesh() {
        let mut params = noisy_params();
        params.composition.void_chance = 1.0;
        let data = generate_terrain(&params, None);
        assert!(data.void_bodies.iter().all(|b| b.mesh.is_none()));
        assert_eq!(data.report.flood_lava_bodies, 0);
    }
}
