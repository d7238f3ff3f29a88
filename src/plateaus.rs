//! Plateau segmentation
//!
//! Splits the terraced heightfield into connected flat regions. Connectivity
//! is decided on the integer band map (so float noise inside one terrace never
//! splits it), while each plateau's height is the true mean of its pixels.

use crate::flood_fill::{connected_components, PixelBounds};
use crate::terrain_map::TerrainMap;
use crate::tilemap::Tilemap;

/// Plateaus need more than this many pixels to survive.
pub const MIN_PLATEAU_PIXELS: usize = 50;

/// Guards band quantization against `k * interval` landing just below `k`.
const BAND_EPSILON: f32 = 1e-4;

/// A connected region of one terrace band
#[derive(Clone, Debug)]
pub struct Plateau {
    /// Positive id written into the classification grid
    pub id: i16,
    /// Mean heightfield value over the member pixels
    pub mean_height: f32,
    pub pixels: Vec<usize>,
    pub centroid: (f32, f32),
    pub bounds: PixelBounds,
}

/// `floor(h / interval)` per pixel.
pub fn build_band_map(heights: &Tilemap<f32>, interval: f32) -> Tilemap<i32> {
    let interval = if interval > 0.0 { interval } else { 1.0 };
    Tilemap::from_fn(heights.width, heights.height, |x, y| {
        (*heights.get(x, y) / interval + BAND_EPSILON).floor() as i32
    })
}

/// Label plateaus and write their ids into `terrain`.
///
/// Components with [`MIN_PLATEAU_PIXELS`] or fewer pixels are left untouched
/// (they stay `EMPTY` and are later absorbed as channel space).
pub fn detect_plateaus(heights: &Tilemap<f32>, bands: &Tilemap<i32>, terrain: &mut TerrainMap) -> Vec<Plateau> {
    let width = heights.width;
    let band = bands.as_slice();

    let components = connected_components(width, heights.height, |_| true, |s, n| band[s] == band[n]);

    let mut plateaus = Vec::new();
    let mut discarded = 0usize;

    for component in components {
        if component.len() <= MIN_PLATEAU_PIXELS {
            discarded += 1;
            continue;
        }
        if plateaus.len() >= i16::MAX as usize {
            tracing::warn!("Plateau id space exhausted; remaining regions left empty");
            break;
        }

        let id = (plateaus.len() + 1) as i16;
        for &idx in &component.pixels {
            terrain.set_at(idx, id);
        }

        plateaus.push(Plateau {
            id,
            mean_height: component.mean(heights.as_slice()),
            centroid: component.centroid(width),
            bounds: component.bounds,
            pixels: component.pixels,
        });
    }

    tracing::debug!("Detected {} plateaus ({} too small)", plateaus.len(), discarded);
    plateaus
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain_map::EMPTY;

    #[test]
    fn test_constant_height_is_one_plateau() {
        let heights = Tilemap::new_with(20, 10, 0.375f32);
        let bands = build_band_map(&heights, 0.125);
        let mut terrain = TerrainMap::new(20, 10);

        let plateaus = detect_plateaus(&heights, &bands, &mut terrain);
        assert_eq!(plateaus.len(), 1);
        assert_eq!(plateaus[0].pixels.len(), 200);
        assert!((plateaus[0].mean_height - 0.375).abs() < 1e-6);
        assert_eq!(plateaus[0].centroid, (9.5, 4.5));
        assert!(terrain.as_slice().iter().all(|&c| c == 1));
    }

    #[test]
    fn test_band_epsilon_keeps_exact_multiples() {
        // 3 * (1/8) must land in band 3, not 2
        let heights = Tilemap::new_with(1, 1, 3.0f32 * 0.125);
        assert_eq!(*build_band_map(&heights, 0.125).get(0, 0), 3);
    }

    #[test]
    fn test_small_regions_stay_empty() {
        // Two bands: 60-pixel left half, 40-pixel right strip
        let heights = Tilemap::from_fn(10, 10, |x, _| if x < 6 { 0.1 } else { 0.6 });
        let bands = build_band_map(&heights, 0.25);
        let mut terrain = TerrainMap::new(10, 10);

        let plateaus = detect_plateaus(&heights, &bands, &mut terrain);
        assert_eq!(plateaus.len(), 1);
        assert_eq!(plateaus[0].bounds.max_x, 5);
        assert_eq!(*terrain.get(9, 9), EMPTY);
        assert_eq!(*terrain.get(0, 0), 1);
    }

    #[test]
    fn test_mean_height_uses_true_heights() {
        let heights = Tilemap::from_fn(10, 10, |x, _| 0.5 + x as f32 * 0.001);
        let bands = build_band_map(&heights, 0.25);
        let mut terrain = TerrainMap::new(10, 10);
        let plateaus = detect_plateaus(&heights, &bands, &mut terrain);
        assert_eq!(plateaus.len(), 1);
        assert!((plateaus[0].mean_height - 0.5045).abs() < 1e-4);
    }
}
