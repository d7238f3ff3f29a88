//! Noise layer generation
//!
//! Produces the raw layers the rest of the pipeline composes:
//! - **Elevation**: multi-octave simplex noise with erosion feedback. Each octave's
//!   amplitude is damped by the slope accumulated from the octaves before it, so
//!   fine detail is suppressed on already-steep terrain.
//! - **River mask**: ridged fractal noise, normalised to [0, 1].
//! - **Worley**: one domain-warped coordinate per pixel feeding three cellular
//!   evaluations (nearest distance, F2 - F1 edge, per-cell value).

use noise::{NoiseFn, OpenSimplex};

use crate::params::{ElevationParams, RiverParams, WorleyParams};
use crate::seeds::{hash1d, hash2d, seed_offset, unit_offset};
use crate::tilemap::Tilemap;

/// Slope feedback strength: amplitude is scaled by `1 / (1 + k * |grad|)`.
const GRADIENT_SCALE: f32 = 2.0;

/// Values with a smaller spread than this are treated as flat.
const RANGE_EPSILON: f32 = 1e-6;

/// Seed offset for the warp noise so it never correlates with the cells.
const WARP_SEED_OFFSET: i32 = 31337;

/// The three Worley fields, each normalised to [0, 1] over the grid.
#[derive(Clone, Debug)]
pub struct WorleyLayers {
    /// Distance to the nearest feature point
    pub distance: Tilemap<f32>,
    /// Second-nearest minus nearest distance (0 on cell borders)
    pub edge: Tilemap<f32>,
    /// Stable random value of the owning cell
    pub cell_value: Tilemap<f32>,
}

// =============================================================================
// SAMPLING HELPERS
// =============================================================================

/// Evaluate `f(x, y)` for every pixel, row-major.
#[cfg(not(feature = "parallel"))]
fn sample_plane<F>(width: usize, height: usize, f: F) -> Vec<f32>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    let mut out = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            out.push(f(x, y));
        }
    }
    out
}

/// Evaluate `f(x, y)` for every pixel, row-major, spread over the rayon pool.
#[cfg(feature = "parallel")]
fn sample_plane<F>(width: usize, height: usize, f: F) -> Vec<f32>
where
    F: Fn(usize, usize) -> f32 + Sync,
{
    use rayon::prelude::*;

    (0..width * height)
        .into_par_iter()
        .map(|idx| f(idx % width, idx / width))
        .collect()
}

/// Blend between symmetric smoothstep (bias 0) and ease-out (bias 1).
pub fn biased_smoothstep(t: f32, bias: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let bias = bias.clamp(0.0, 1.0);
    let smooth = t * t * (3.0 - 2.0 * t);
    let ease_out = 1.0 - (1.0 - t) * (1.0 - t);
    smooth * (1.0 - bias) + ease_out * bias
}

/// Copy the first interior row/column onto each border (gradients are undefined there).
fn clamp_borders(map: &mut Tilemap<f32>) {
    let (w, h) = (map.width, map.height);
    if w < 2 || h < 2 {
        return;
    }
    for x in 0..w {
        let top = *map.get(x, 1);
        let bottom = *map.get(x, h - 2);
        map.set(x, 0, top);
        map.set(x, h - 1, bottom);
    }
    for y in 0..h {
        let left = *map.get(1, y);
        let right = *map.get(w - 2, y);
        map.set(0, y, left);
        map.set(w - 1, y, right);
    }
}

// =============================================================================
// ELEVATION
// =============================================================================

/// Generate the erosion-feedback elevation layer, values in [0, 1].
pub fn generate_elevation(width: usize, height: usize, params: &ElevationParams) -> Tilemap<f32> {
    let n = width * height;
    let noise = OpenSimplex::new(params.seed as u32);
    let (ox, oy) = seed_offset(params.seed);

    let mut out = vec![0.0f32; n];
    let mut grad_x = vec![0.0f32; n];
    let mut grad_y = vec![0.0f32; n];

    let mut amplitude = 1.0f32;
    let mut frequency = params.frequency;
    let mut max_value = 0.0f32;

    for _ in 0..params.octaves {
        let freq = frequency as f64;
        let octave = sample_plane(width, height, |x, y| {
            let wx = (x as f32 * params.map_scale + ox) as f64;
            let wy = (y as f32 * params.map_scale + oy) as f64;
            noise.get([wx * freq, wy * freq]) as f32
        });

        // Sequential across octaves: each pixel's damping depends on all earlier octaves.
        for y in 1..height.saturating_sub(1) {
            for x in 1..width.saturating_sub(1) {
                let idx = y * width + x;
                let slope = (grad_x[idx] * grad_x[idx] + grad_y[idx] * grad_y[idx]).sqrt();
                let damped = amplitude / (1.0 + slope * GRADIENT_SCALE);

                out[idx] += octave[idx] * damped;

                let dx = (octave[idx + 1] - octave[idx - 1]) * 0.5;
                let dy = (octave[idx + width] - octave[idx - width]) * 0.5;
                grad_x[idx] += dx * damped * frequency;
                grad_y[idx] += dy * damped * frequency;
            }
        }

        max_value += amplitude;
        amplitude *= params.gain;
        frequency *= params.lacunarity;
    }

    let max_value = max_value.max(RANGE_EPSILON);
    for v in out.iter_mut() {
        *v = ((*v / max_value + 1.0) * 0.5).clamp(0.0, 1.0);
    }

    let mut map = Tilemap::from_fn(width, height, |x, y| out[y * width + x]);
    clamp_borders(&mut map);

    for v in map.as_mut_slice() {
        *v = biased_smoothstep(*v, params.scurve_bias);
    }
    map
}

// =============================================================================
// RIVER MASK
// =============================================================================

/// Generate the ridged river mask, normalised to [0, 1] (flat noise gives zeros).
pub fn generate_river_mask(width: usize, height: usize, params: &RiverParams) -> Tilemap<f32> {
    let noise = OpenSimplex::new(params.seed as u32);
    let (ox, oy) = seed_offset(params.seed);

    let values = sample_plane(width, height, |x, y| {
        let px = (x as f32 * params.map_scale + ox) as f64;
        let py = (y as f32 * params.map_scale + oy) as f64;

        let mut sum = 0.0f64;
        let mut amp = 1.0f64;
        let mut freq = params.frequency as f64;
        let mut norm = 0.0f64;
        for _ in 0..params.octaves {
            let n = noise.get([px * freq, py * freq]);
            sum += (1.0 - 2.0 * n.abs()) * amp;
            norm += amp;
            amp *= params.gain as f64;
            freq *= params.lacunarity as f64;
        }
        if norm > 0.0 {
            (sum / norm) as f32
        } else {
            0.0
        }
    });

    let mut map = Tilemap::from_fn(width, height, |x, y| values[y * width + x]);
    map.normalize();
    map
}

// =============================================================================
// WORLEY
// =============================================================================

#[derive(Clone, Copy, Debug)]
struct CellSample {
    distance: f32,
    edge: f32,
    cell_value: f32,
}

/// Jittered-grid cellular noise with squared Euclidean distance.
struct Cellular {
    seed_hash: u32,
    jitter: f32,
}

impl Cellular {
    fn new(seed: i32, jitter: f32) -> Self {
        Self {
            seed_hash: hash1d(seed as u32),
            jitter,
        }
    }

    fn cell_hash(&self, cx: i32, cy: i32) -> u32 {
        let h = hash2d(cx, cy) ^ self.seed_hash;
        (h ^ (h >> 15)).wrapping_mul(0x2c1b_3c6d)
    }

    fn evaluate(&self, x: f32, y: f32) -> CellSample {
        let xi = x.floor() as i32;
        let yi = y.floor() as i32;

        let mut f1 = f32::MAX;
        let mut f2 = f32::MAX;
        let mut nearest_hash = 0u32;

        for cy in yi - 1..=yi + 1 {
            for cx in xi - 1..=xi + 1 {
                let h = self.cell_hash(cx, cy);
                let fx = cx as f32 + 0.5 + unit_offset(h, 0) * self.jitter;
                let fy = cy as f32 + 0.5 + unit_offset(h, 8) * self.jitter;
                let d = (fx - x) * (fx - x) + (fy - y) * (fy - y);

                if d < f1 {
                    f2 = f1;
                    f1 = d;
                    nearest_hash = h;
                } else if d < f2 {
                    f2 = d;
                }
            }
        }

        CellSample {
            distance: f1,
            edge: f2 - f1,
            cell_value: ((nearest_hash >> 16) as f32 / 65535.0) * 2.0 - 1.0,
        }
    }
}

/// Progressive fractal domain warp: each octave displaces the already-warped point.
struct DomainWarp {
    noise_x: OpenSimplex,
    noise_y: OpenSimplex,
    amplitude: f32,
    frequency: f32,
    octaves: u32,
}

impl DomainWarp {
    fn new(params: &WorleyParams) -> Self {
        let seed = params.seed.wrapping_add(WARP_SEED_OFFSET) as u32;
        Self {
            noise_x: OpenSimplex::new(seed),
            noise_y: OpenSimplex::new(seed.wrapping_add(1)),
            amplitude: params.warp_amp,
            frequency: params.warp_frequency,
            octaves: params.warp_octaves,
        }
    }

    fn warp(&self, mut x: f32, mut y: f32) -> (f32, f32) {
        let mut amp = self.amplitude;
        let mut freq = self.frequency as f64;
        for _ in 0..self.octaves {
            let p = [x as f64 * freq, y as f64 * freq];
            let dx = self.noise_x.get(p) as f32;
            let dy = self.noise_y.get(p) as f32;
            x += dx * amp;
            y += dy * amp;
            amp *= 0.5;
            freq *= 2.0;
        }
        (x, y)
    }
}

/// Generate the three Worley layers from one shared warped coordinate per pixel.
pub fn generate_worley(width: usize, height: usize, params: &WorleyParams) -> WorleyLayers {
    let (ox, oy) = seed_offset(params.seed);
    let warp = DomainWarp::new(params);
    let cells = Cellular::new(params.seed, params.jitter);

    let mut samples = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            let mut wx = x as f32 * params.map_scale + ox;
            let mut wy = y as f32 * params.map_scale + oy;
            if params.warp_amp > 0.0 {
                (wx, wy) = warp.warp(wx, wy);
            }
            samples.push(cells.evaluate(wx * params.frequency, wy * params.frequency));
        }
    }

    let layer = |pick: fn(&CellSample) -> f32| {
        let mut map = Tilemap::from_fn(width, height, |x, y| pick(&samples[y * width + x]));
        map.normalize();
        map
    };

    WorleyLayers {
        distance: layer(|s| s.distance),
        edge: layer(|s| s.edge),
        cell_value: layer(|s| s.cell_value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elevation_in_unit_range_and_deterministic() {
        let params = ElevationParams { frequency: 0.05, ..Default::default() };
        let a = generate_elevation(48, 32, &params);
        let b = generate_elevation(48, 32, &params);
        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_elevation_borders_match_interior() {
        let params = ElevationParams { frequency: 0.05, ..Default::default() };
        let map = generate_elevation(20, 16, &params);
        for x in 0..20 {
            assert_eq!(map.get(x, 0), map.get(x, 1));
            assert_eq!(map.get(x, 15), map.get(x, 14));
        }
        for y in 0..16 {
            assert_eq!(map.get(0, y), map.get(1, y));
            assert_eq!(map.get(19, y), map.get(18, y));
        }
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate_elevation(32, 32, &ElevationParams { seed: 1, frequency: 0.05, ..Default::default() });
        let b = generate_elevation(32, 32, &ElevationParams { seed: 2, frequency: 0.05, ..Default::default() });
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_octaves_is_flat_not_nan() {
        let params = ElevationParams { octaves: 0, ..Default::default() };
        let map = generate_elevation(8, 8, &params);
        assert!(map.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_biased_smoothstep_endpoints() {
        for bias in [0.0, 0.5, 1.0] {
            assert!(biased_smoothstep(0.0, bias).abs() < 1e-6);
            assert!((biased_smoothstep(1.0, bias) - 1.0).abs() < 1e-6);
        }
        // Ease-out skews values upward
        assert!(biased_smoothstep(0.3, 1.0) > biased_smoothstep(0.3, 0.0));
    }

    #[test]
    fn test_worley_layers_normalised() {
        let layers = generate_worley(40, 40, &WorleyParams { frequency: 0.2, ..Default::default() });
        for map in [&layers.distance, &layers.edge, &layers.cell_value] {
            let (lo, hi) = map.min_max();
            assert!(lo >= 0.0 && hi <= 1.0);
        }
        let (lo, hi) = layers.cell_value.min_max();
        assert!(hi - lo > 0.5, "cell values should span several cells");
    }

    #[test]
    fn test_cell_value_constant_within_cell() {
        let cells = Cellular::new(7, 0.0);
        // jitter 0: feature points sit at cell centres, so a point near one centre
        // belongs to that cell wherever we probe around it
        let a = cells.evaluate(3.45, 5.5);
        let b = cells.evaluate(3.55, 5.45);
        assert_eq!(a.cell_value, b.cell_value);
        assert!(a.edge >= 0.0);
    }

    #[test]
    fn test_river_mask_normalised() {
        let map = generate_river_mask(32, 32, &RiverParams { frequency: 0.05, ..Default::default() });
        let (lo, hi) = map.min_max();
        assert!(lo >= 0.0 && hi <= 1.0);
    }
}
