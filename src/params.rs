//! Generation parameters and their stable cache hashes
//!
//! Each noise layer is keyed in the [`NoiseCache`](crate::cache::NoiseCache) by a
//! hash over its parameter struct. The hash walks the *named fields* in a fixed
//! order (never the raw struct bytes), so padding and layout can't leak in.

use serde::{Deserialize, Serialize};

// =============================================================================
// PARAMETER HASHING
// =============================================================================

const FNV_OFFSET: u64 = 14_695_981_039_346_656_037;
const FNV_PRIME: u64 = 1_099_511_628_211;

/// FNV-1a hasher fed with an explicit, ordered list of named fields.
#[derive(Clone, Copy, Debug)]
pub struct ParamHasher {
    state: u64,
}

impl Default for ParamHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamHasher {
    pub fn new() -> Self {
        Self { state: FNV_OFFSET }
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
    }

    fn name(&mut self, name: &str) {
        self.write(name.as_bytes());
        self.write(&[0xFF]);
    }

    pub fn f32(mut self, name: &str, value: f32) -> Self {
        self.name(name);
        self.write(&value.to_bits().to_le_bytes());
        self
    }

    pub fn i32(mut self, name: &str, value: i32) -> Self {
        self.name(name);
        self.write(&value.to_le_bytes());
        self
    }

    pub fn u32(mut self, name: &str, value: u32) -> Self {
        self.name(name);
        self.write(&value.to_le_bytes());
        self
    }

    pub fn usize(mut self, name: &str, value: usize) -> Self {
        self.name(name);
        self.write(&(value as u64).to_le_bytes());
        self
    }

    pub fn bool(mut self, name: &str, value: bool) -> Self {
        self.name(name);
        self.write(&[value as u8]);
        self
    }

    pub fn finish(self) -> u64 {
        self.state
    }
}

/// A parameter struct that can produce a stable hash of its fields.
pub trait LayerHash {
    fn feed(&self, hasher: ParamHasher) -> ParamHasher;

    fn layer_hash(&self) -> u64 {
        self.feed(ParamHasher::new()).finish()
    }

    /// Hash including the map dimensions the layer is generated for.
    fn layer_hash_for(&self, width: usize, height: usize) -> u64 {
        self.feed(ParamHasher::new())
            .usize("width", width)
            .usize("height", height)
            .finish()
    }
}

// =============================================================================
// NOISE LAYER PARAMETERS
// =============================================================================

/// Erosion-feedback fractal elevation layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationParams {
    /// Base frequency of the first octave
    pub frequency: f32,
    pub octaves: u32,
    /// Frequency multiplier per octave
    pub lacunarity: f32,
    /// Amplitude multiplier per octave
    pub gain: f32,
    pub seed: i32,
    /// 0 = symmetric smoothstep, 1 = ease-out (pushes the histogram upward)
    pub scurve_bias: f32,
    /// Sampling scale shared by every layer
    pub map_scale: f32,
}

impl Default for ElevationParams {
    fn default() -> Self {
        Self {
            frequency: 0.003,
            octaves: 6,
            lacunarity: 2.0,
            gain: 0.5,
            seed: 1337,
            scurve_bias: 0.65,
            map_scale: 1.0,
        }
    }
}

impl LayerHash for ElevationParams {
    fn feed(&self, h: ParamHasher) -> ParamHasher {
        h.f32("frequency", self.frequency)
            .u32("octaves", self.octaves)
            .f32("lacunarity", self.lacunarity)
            .f32("gain", self.gain)
            .i32("seed", self.seed)
            .f32("scurve_bias", self.scurve_bias)
            .f32("map_scale", self.map_scale)
    }
}

/// Ridged river mask layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiverParams {
    pub enabled: bool,
    pub frequency: f32,
    pub octaves: u32,
    pub lacunarity: f32,
    pub gain: f32,
    pub seed: i32,
    /// Mask values at or above this become liquid (in low terrain)
    pub threshold: f32,
    pub map_scale: f32,
}

impl Default for RiverParams {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: 0.008,
            octaves: 4,
            lacunarity: 2.0,
            gain: 0.5,
            seed: 7331,
            threshold: 0.7,
            map_scale: 1.0,
        }
    }
}

impl LayerHash for RiverParams {
    // `enabled` and `threshold` only affect composition, not the generated layer.
    fn feed(&self, h: ParamHasher) -> ParamHasher {
        h.f32("frequency", self.frequency)
            .u32("octaves", self.octaves)
            .f32("lacunarity", self.lacunarity)
            .f32("gain", self.gain)
            .i32("seed", self.seed)
            .f32("map_scale", self.map_scale)
    }
}

/// Domain-warped cellular (Worley) layer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorleyParams {
    pub frequency: f32,
    pub seed: i32,
    /// Feature point displacement inside its cell (0 = regular grid)
    pub jitter: f32,
    /// Domain warp amplitude in pixels; 0 disables warping
    pub warp_amp: f32,
    pub warp_frequency: f32,
    pub warp_octaves: u32,
    pub map_scale: f32,
}

impl Default for WorleyParams {
    fn default() -> Self {
        Self {
            frequency: 0.015,
            seed: 4242,
            jitter: 1.0,
            warp_amp: 40.0,
            warp_frequency: 0.003,
            warp_octaves: 3,
            map_scale: 1.0,
        }
    }
}

impl LayerHash for WorleyParams {
    fn feed(&self, h: ParamHasher) -> ParamHasher {
        h.f32("frequency", self.frequency)
            .i32("seed", self.seed)
            .f32("jitter", self.jitter)
            .f32("warp_amp", self.warp_amp)
            .f32("warp_frequency", self.warp_frequency)
            .u32("warp_octaves", self.warp_octaves)
            .f32("map_scale", self.map_scale)
    }
}

// =============================================================================
// STAGE PARAMETERS
// =============================================================================

/// Terracing, cleanup and lava/void split
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionParams {
    /// Probability that a surviving open component becomes void instead of lava
    pub void_chance: f32,
    pub terrace_levels: u32,
    /// Terrace speckles smaller than this are merged into their surroundings
    pub min_region_size: usize,
    /// River mask only becomes liquid below this elevation
    pub river_elevation_max: f32,
}

impl Default for CompositionParams {
    fn default() -> Self {
        Self {
            void_chance: 0.3,
            terrace_levels: 8,
            min_region_size: 10_000,
            river_elevation_max: 0.35,
        }
    }
}

impl CompositionParams {
    /// Terrace levels, never below one.
    pub fn levels(&self) -> u32 {
        self.terrace_levels.max(1)
    }

    /// Band / contour spacing (one terrace step).
    pub fn interval(&self) -> f32 {
        1.0 / self.levels() as f32
    }
}

/// Hex column placement
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnParams {
    /// Hex circumradius in pixels
    pub hex_size: f32,
    /// Minimum Worley cell value for a hex to become a column
    pub density_threshold: f32,
    /// Column top perturbation per unit of cell value
    pub jitter_scale: f32,
}

impl Default for ColumnParams {
    fn default() -> Self {
        Self {
            hex_size: 8.0,
            density_threshold: 0.2,
            jitter_scale: 0.05,
        }
    }
}

/// How a classified channel is turned into a mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshStyle {
    /// Regular quad grid clipped to the (dilated) region
    #[default]
    Grid,
    /// Ear-clipped outline polygon
    Outline,
}

/// Channel extraction and classification
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelParams {
    pub enabled: bool,
    pub mesh_style: MeshStyle,
    /// Grid mesh sample spacing in pixels
    pub grid_spacing: f32,
}

impl Default for ChannelParams {
    fn default() -> Self {
        Self {
            enabled: true,
            mesh_style: MeshStyle::Grid,
            grid_spacing: 2.0,
        }
    }
}

/// Everything one regeneration needs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    pub width: usize,
    pub height: usize,
    pub elevation: ElevationParams,
    pub river: RiverParams,
    pub worley: WorleyParams,
    pub composition: CompositionParams,
    pub columns: ColumnParams,
    pub channels: ChannelParams,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            elevation: ElevationParams::default(),
            river: RiverParams::default(),
            worley: WorleyParams::default(),
            composition: CompositionParams::default(),
            columns: ColumnParams::default(),
            channels: ChannelParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_params_hash_identically() {
        let a = ElevationParams::default();
        let b = ElevationParams::default();
        assert_eq!(a.layer_hash(), b.layer_hash());
    }

    #[test]
    fn test_any_field_change_changes_hash() {
        let base = WorleyParams::default();
        let base_hash = base.layer_hash();

        let variants = [
            WorleyParams { frequency: 0.016, ..base.clone() },
            WorleyParams { seed: 4243, ..base.clone() },
            WorleyParams { jitter: 0.9, ..base.clone() },
            WorleyParams { warp_amp: 41.0, ..base.clone() },
            WorleyParams { warp_frequency: 0.004, ..base.clone() },
            WorleyParams { warp_octaves: 4, ..base.clone() },
            WorleyParams { map_scale: 2.0, ..base.clone() },
        ];
        for v in &variants {
            assert_ne!(v.layer_hash(), base_hash, "{:?}", v);
        }
    }

    #[test]
    fn test_dimensions_feed_the_hash() {
        let p = ElevationParams::default();
        assert_ne!(p.layer_hash_for(64, 64), p.layer_hash_for(64, 65));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "width": 128, "composition": { "terrace_levels": 4 } }"#;
        let params: GenerationParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.width, 128);
        assert_eq!(params.height, 512);
        assert_eq!(params.composition.terrace_levels, 4);
        assert_eq!(params.composition.void_chance, 0.3);
        assert_eq!(params.elevation, ElevationParams::default());
    }

    #[test]
    fn test_interval_guards_zero_levels() {
        let comp = CompositionParams { terrace_levels: 0, ..Default::default() };
        assert_eq!(comp.interval(), 1.0);
    }
}
