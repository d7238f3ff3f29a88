//! Deterministic hashing helpers for generation seeds
//!
//! Every random-looking decision in the pipeline (hex jitter, body phases,
//! lava/void draws, noise phase offsets) is derived from these integer hashes,
//! so a given parameter set always reproduces the same map.

use std::f32::consts::TAU;

/// Hash a 2D integer coordinate (used for per-hex jitter and lookup keys).
#[inline]
pub fn hash2d(x: i32, y: i32) -> u32 {
    let h = (x as u32).wrapping_mul(374_761_393) ^ (y as u32).wrapping_mul(668_265_263);
    (h ^ (h >> 13)).wrapping_mul(1_274_126_177)
}

/// Hash a sequence index (used for per-body animation phases).
#[inline]
pub fn hash1d(idx: u32) -> u32 {
    idx.wrapping_mul(374_761_393) ^ 668_265_263
}

/// Fold `value` into `seed` (boost-style hash combine).
#[inline]
pub fn hash_combine(seed: u32, value: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e37_79b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// Per-seed noise-space offset so different seeds never share noise phase.
///
/// Both components land in [1000, 11000).
pub fn seed_offset(seed: i32) -> (f32, f32) {
    let mut h = seed as u32;
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    let ox = (h % 10_000) as f32 + 1000.0;
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    let oy = (h % 10_000) as f32 + 1000.0;
    (ox, oy)
}

/// Stable animation phase in [0, 2π) for the body at `index`.
pub fn animation_phase(index: usize) -> f32 {
    (hash1d(index as u32) % 1000) as f32 / 1000.0 * TAU
}

/// Seed for the lava/void draw, mixed from map dimensions and the run seed.
pub fn body_draw_seed(width: usize, height: usize, seed: i32) -> u64 {
    let mut s = 0xDEAD_BEEFu32;
    s = hash_combine(s, width as u32);
    s = hash_combine(s, height as u32);
    s = hash_combine(s, seed as u32);
    s as u64
}

/// Map a hash to a value in [-0.5, 0.5] using the byte at `shift`.
#[inline]
pub fn unit_offset(hash: u32, shift: u32) -> f32 {
    ((hash >> shift) & 0xFF) as f32 / 255.0 - 0.5
}
