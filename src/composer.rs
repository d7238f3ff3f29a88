//! Layer composition
//!
//! Fetches (or generates) the noise layers, terraces the elevation into flat
//! bands and merges speckle regions into their surroundings. The result is
//! the immutable input to every later stage.

use crate::cache::{CacheSlot, LayerArrays, NoiseCache};
use crate::flood_fill::flood_from;
use crate::noise_layers::{generate_elevation, generate_river_mask, generate_worley, WorleyLayers};
use crate::params::{GenerationParams, LayerHash, RiverParams, WorleyParams};
use crate::tilemap::Tilemap;

/// Heights closer than this are the same terrace during cleanup.
const REGION_TOLERANCE: f32 = 0.01;

/// Cleanup repeats until nothing changes, at most this many passes.
const MAX_CLEANUP_PASSES: usize = 8;

/// Where a layer came from on this run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerSource {
    Generated,
    Cached,
    /// Supplied directly by the caller
    Provided,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompositionReport {
    pub elevation: LayerSource,
    /// `None` when the river layer is disabled
    pub river: Option<LayerSource>,
    pub worley: LayerSource,
    pub cleanup_passes: usize,
    /// Speckle regions merged into their surroundings (over all passes)
    pub regions_merged: usize,
}

/// Everything the later stages read
#[derive(Clone, Debug)]
pub struct ComposedLayers {
    /// Final (unterraced) elevation
    pub elevation: Tilemap<f32>,
    /// Terraced and cleaned heightfield
    pub terraced: Tilemap<f32>,
    pub river_mask: Option<Tilemap<f32>>,
    /// Pixels where columns may not stand
    pub liquid_mask: Tilemap<bool>,
    pub worley: WorleyLayers,
    pub report: CompositionReport,
}

// =============================================================================
// COMPOSITION
// =============================================================================

fn fetch_or_generate<F>(
    cache: Option<&mut NoiseCache>,
    slot: CacheSlot,
    hash: u64,
    expected: usize,
    generate: F,
) -> (LayerArrays, LayerSource)
where
    F: FnOnce() -> LayerArrays,
{
    match cache {
        Some(cache) => {
            if let Some(arrays) = cache.get(slot, hash) {
                if arrays.len() == expected {
                    return (arrays.clone(), LayerSource::Cached);
                }
            }
            let arrays = generate();
            cache.put(slot, hash, arrays.clone());
            (arrays, LayerSource::Generated)
        }
        None => (generate(), LayerSource::Generated),
    }
}

/// Fetch-or-generate every layer, then terrace and clean the elevation.
pub fn compose_layers(params: &GenerationParams, mut cache: Option<&mut NoiseCache>) -> ComposedLayers {
    let (w, h) = (params.width, params.height);
    let map_scale = params.elevation.map_scale;

    // All layers sample at the elevation's scale
    let river_params = RiverParams { map_scale, ..params.river.clone() };
    let worley_params = WorleyParams { map_scale, ..params.worley.clone() };

    let (elevation_arrays, elevation_source) = fetch_or_generate(
        cache.as_deref_mut(),
        CacheSlot::Elevation,
        params.elevation.layer_hash_for(w, h),
        1,
        || LayerArrays::single(generate_elevation(w, h, &params.elevation)),
    );
    tracing::debug!("Elevation: {:?}", elevation_source);

    let river = if params.river.enabled {
        let (arrays, source) = fetch_or_generate(
            cache.as_deref_mut(),
            CacheSlot::River,
            river_params.layer_hash_for(w, h),
            1,
            || LayerArrays::single(generate_river_mask(w, h, &river_params)),
        );
        tracing::debug!("River mask: {:?}", source);
        Some((arrays, source))
    } else {
        None
    };

    let (worley_arrays, worley_source) = fetch_or_generate(
        cache.as_deref_mut(),
        CacheSlot::Worley,
        worley_params.layer_hash_for(w, h),
        3,
        || {
            let layers = generate_worley(w, h, &worley_params);
            LayerArrays::new(vec![layers.distance, layers.edge, layers.cell_value])
        },
    );
    tracing::debug!("Worley: {:?}", worley_source);

    let elevation = elevation_arrays
        .into_maps()
        .into_iter()
        .next()
        .unwrap_or_else(|| Tilemap::new(w, h));

    let (river_mask, river_source) = match river {
        Some((arrays, source)) => (arrays.into_maps().into_iter().next(), Some(source)),
        None => (None, None),
    };

    let mut worley_maps = worley_arrays.into_maps().into_iter();
    let mut next_worley = || worley_maps.next().unwrap_or_else(|| Tilemap::new(w, h));
    let worley = WorleyLayers {
        distance: next_worley(),
        edge: next_worley(),
        cell_value: next_worley(),
    };

    let mut composed = compose_from_layers(elevation, river_mask, worley, params);
    composed.report.elevation = elevation_source;
    composed.report.river = river_source;
    composed.report.worley = worley_source;
    composed
}

/// Terrace, clean and mask already-generated layers.
///
/// Layer sources are reported as [`LayerSource::Provided`].
pub fn compose_from_layers(
    elevation: Tilemap<f32>,
    river_mask: Option<Tilemap<f32>>,
    worley: WorleyLayers,
    params: &GenerationParams,
) -> ComposedLayers {
    let comp = &params.composition;

    let mut terraced = terrace(&elevation, comp.levels());
    let (cleanup_passes, regions_merged) = cleanup_small_regions(&mut terraced, comp.min_region_size);
    tracing::debug!(
        "Terraced into {} levels, merged {} small regions in {} passes",
        comp.levels(),
        regions_merged,
        cleanup_passes
    );

    let liquid_mask = match &river_mask {
        Some(river) => liquid_mask(river, &elevation, params.river.threshold, comp.river_elevation_max),
        None => Tilemap::new_with(elevation.width, elevation.height, false),
    };

    ComposedLayers {
        report: CompositionReport {
            elevation: LayerSource::Provided,
            river: river_mask.as_ref().map(|_| LayerSource::Provided),
            worley: LayerSource::Provided,
            cleanup_passes,
            regions_merged,
        },
        elevation,
        terraced,
        river_mask,
        liquid_mask,
        worley,
    }
}

// =============================================================================
// TERRACING & CLEANUP
// =============================================================================

/// Quantize into `levels` flat bands: `floor(h * levels) / levels`.
pub fn terrace(elevation: &Tilemap<f32>, levels: u32) -> Tilemap<f32> {
    let n = levels.max(1) as f32;
    let mut out = elevation.clone();
    for v in out.as_mut_slice() {
        *v = (*v * n).floor() / n;
    }
    out
}

/// One pass: every equal-height region under `min_size` pixels takes the mean
/// height of its boundary ring. Regions are processed in scan order and see
/// earlier replacements. Returns the number of regions replaced.
fn cleanup_pass(heights: &mut Tilemap<f32>, min_size: usize) -> usize {
    let (w, h) = (heights.width, heights.height);
    let mut visited = vec![false; w * h];
    let mut merged = 0;

    for start in 0..w * h {
        if visited[start] {
            continue;
        }
        let region_height = *heights.at(start);
        let region = {
            let values = heights.as_slice();
            flood_from(w, h, start, &mut visited, |_, n| {
                (values[n] - region_height).abs() < REGION_TOLERANCE
            })
        };

        if region.len() >= min_size {
            continue;
        }

        let mut sum = 0.0f32;
        let mut count = 0usize;
        for &idx in &region.pixels {
            for n in heights.neighbors_8(idx) {
                let v = *heights.at(n);
                if (v - region_height).abs() > REGION_TOLERANCE {
                    sum += v;
                    count += 1;
                }
            }
        }

        // Isolated region (no boundary) keeps its height
        if count == 0 {
            continue;
        }
        let replacement = sum / count as f32;
        for &idx in &region.pixels {
            heights.set_at(idx, replacement);
        }
        merged += 1;
    }

    merged
}

/// Merge speckle regions until the heightfield stops changing.
///
/// Returns `(passes, regions_merged)`. Running it again on its own output is a no-op.
pub fn cleanup_small_regions(heights: &mut Tilemap<f32>, min_size: usize) -> (usize, usize) {
    let mut passes = 0;
    let mut total = 0;

    while passes < MAX_CLEANUP_PASSES {
        let before = heights.clone();
        let merged = cleanup_pass(heights, min_size);
        passes += 1;
        total += merged;
        if merged == 0 || *heights == before {
            break;
        }
    }

    (passes, total)
}

/// Low-lying river pixels: `river >= threshold && elevation <= max_elevation`.
pub fn liquid_mask(
    river: &Tilemap<f32>,
    elevation: &Tilemap<f32>,
    threshold: f32,
    max_elevation: f32,
) -> Tilemap<bool> {
    Tilemap::from_fn(elevation.width, elevation.height, |x, y| {
        *river.get(x, y) >= threshold && *elevation.get(x, y) <= max_elevation
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{CompositionParams, ElevationParams};

    fn speckled() -> Tilemap<f32> {
        let mut map = Tilemap::new_with(10, 10, 0.5f32);
        for (x, y) in [(4, 4), (5, 4), (4, 5), (5, 5)] {
            map.set(x, y, 0.75);
        }
        map
    }

    #[test]
    fn test_terrace_bands() {
        let map = Tilemap::from_vec(4, 1, vec![0.0, 0.24, 0.26, 0.99]).unwrap();
        let t = terrace(&map, 4);
        assert_eq!(t.as_slice(), &[0.0, 0.0, 0.25, 0.75]);
    }

    #[test]
    fn test_cleanup_merges_speckle() {
        let mut map = speckled();
        let (_, merged) = cleanup_small_regions(&mut map, 10);
        assert_eq!(merged, 1);
        assert!(map.as_slice().iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_cleanup_is_idempotent() {
        let mut once = speckled();
        // A second speckle touching the border and an L-shaped one
        once.set(0, 0, 0.25);
        once.set(8, 1, 0.9);
        once.set(8, 2, 0.9);
        once.set(7, 2, 0.9);
        cleanup_small_regions(&mut once, 10);

        let mut twice = once.clone();
        let (_, merged) = cleanup_small_regions(&mut twice, 10);
        assert_eq!(merged, 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_cleanup_keeps_large_regions() {
        let mut map = Tilemap::from_fn(10, 10, |x, _| if x < 5 { 0.25 } else { 0.5 });
        let original = map.clone();
        cleanup_small_regions(&mut map, 10);
        assert_eq!(map, original);
    }

    #[test]
    fn test_liquid_mask_requires_low_ground() {
        let river = Tilemap::from_vec(3, 1, vec![0.9, 0.9, 0.1]).unwrap();
        let elev = Tilemap::from_vec(3, 1, vec![0.2, 0.6, 0.2]).unwrap();
        let mask = liquid_mask(&river, &elev, 0.7, 0.35);
        assert_eq!(mask.as_slice(), &[true, false, false]);
    }

    #[test]
    fn test_compose_uses_cache_on_second_run() {
        let params = GenerationParams {
            width: 24,
            height: 24,
            elevation: ElevationParams { octaves: 2, ..Default::default() },
            composition: CompositionParams { min_region_size: 4, ..Default::default() },
            ..Default::default()
        };
        let mut cache = NoiseCache::new();

        let first = compose_layers(&params, Some(&mut cache));
        assert_eq!(first.report.elevation, LayerSource::Generated);
        assert_eq!(first.report.worley, LayerSource::Generated);

        // Terrace count only affects composition, never the cached noise
        let mut retuned = params.clone();
        retuned.composition.terrace_levels = 3;
        let second = compose_layers(&retuned, Some(&mut cache));
        assert_eq!(second.report.elevation, LayerSource::Cached);
        assert_eq!(second.report.river, Some(LayerSource::Cached));
        assert_eq!(second.report.worley, LayerSource::Cached);
        assert_eq!(first.elevation, second.elevation);
        assert_eq!(cache.stats().misses, 3);
        assert_eq!(cache.stats().hits, 3);
    }

    #[test]
    fn test_disabled_river_gives_empty_mask() {
        let mut params = GenerationParams { width: 16, height: 16, ..Default::default() };
        params.river.enabled = false;
        let composed = compose_layers(&params, None);
        assert!(composed.river_mask.is_none());
        assert!(composed.report.river.is_none());
        assert!(composed.liquid_mask.as_slice().iter().all(|&m| !m));
    }
}
