//! Flat-topped hexagon lattice math
//!
//! Axial coordinates `(q, r)` with the implicit cube coordinate `s = -q - r`.

use std::collections::HashMap;
use std::f32::consts::PI;

const SQRT_3: f32 = 1.732_050_8;

/// Height differences at or below this do not expose a side face.
pub const EDGE_DROP_EPSILON: f32 = 0.01;

/// Axial offsets of the six neighbours, in edge order.
pub const AXIAL_DIRECTIONS: [(i32, i32); 6] = [(1, 0), (0, 1), (-1, 1), (-1, 0), (0, -1), (1, -1)];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    pub fn s(&self) -> i32 {
        -self.q - self.r
    }

    pub fn neighbor(&self, dir: usize) -> HexCoord {
        let (dq, dr) = AXIAL_DIRECTIONS[dir % 6];
        HexCoord::new(self.q + dq, self.r + dr)
    }
}

/// Centre of hex `(q, r)` in pixels.
pub fn hex_to_pixel(q: i32, r: i32, size: f32) -> (f32, f32) {
    let x = size * 1.5 * q as f32;
    let y = size * SQRT_3 * (r as f32 + q as f32 * 0.5);
    (x, y)
}

/// Hex containing pixel `(x, y)`, by cube rounding.
pub fn pixel_to_hex(x: f32, y: f32, size: f32) -> HexCoord {
    let q = (2.0 / 3.0 * x) / size;
    let r = (-1.0 / 3.0 * x + SQRT_3 / 3.0 * y) / size;
    let s = -q - r;

    let mut iq = q.round();
    let mut ir = r.round();
    let is = s.round();

    let dq = (iq - q).abs();
    let dr = (ir - r).abs();
    let ds = (is - s).abs();

    // Fix whichever component drifted furthest so q + r + s stays 0
    if dq > dr && dq > ds {
        iq = -ir - is;
    } else if dr > ds {
        ir = -iq - is;
    }

    HexCoord::new(iq as i32, ir as i32)
}

/// The six corners, starting at angle 0 and turning by 60°.
pub fn hex_corners(q: i32, r: i32, size: f32) -> [(f32, f32); 6] {
    let (cx, cy) = hex_to_pixel(q, r, size);
    let mut corners = [(0.0, 0.0); 6];
    for (i, corner) in corners.iter_mut().enumerate() {
        let angle = i as f32 * PI / 3.0;
        *corner = (cx + size * angle.cos(), cy + size * angle.sin());
    }
    corners
}

/// Half-plane test against all six edges (edges count as inside).
pub fn pixel_in_hex(px: f32, py: f32, q: i32, r: i32, size: f32) -> bool {
    let corners = hex_corners(q, r, size);
    (0..6).all(|i| {
        let (ax, ay) = corners[i];
        let (bx, by) = corners[(i + 1) % 6];
        (bx - ax) * (py - ay) - (by - ay) * (px - ax) >= 0.0
    })
}

// =============================================================================
// COLUMNS
// =============================================================================

/// A basalt column standing on one hex cell
#[derive(Clone, Debug, PartialEq)]
pub struct HexColumn {
    pub q: i32,
    pub r: i32,
    pub top_height: f32,
    /// Terrace height under the column
    pub base_height: f32,
    /// Side face `i` faces neighbour [`AXIAL_DIRECTIONS`]`[i]`
    pub visible_edges: [bool; 6],
    pub edge_drops: [f32; 6],
}

impl HexColumn {
    pub fn new(q: i32, r: i32, top_height: f32, base_height: f32) -> Self {
        Self {
            q,
            r,
            top_height,
            base_height,
            visible_edges: [false; 6],
            edge_drops: [0.0; 6],
        }
    }

    pub fn coord(&self) -> HexCoord {
        HexCoord::new(self.q, self.r)
    }
}

/// Decide which side faces are exposed.
///
/// An edge with no neighbour column drops the full column height; an edge
/// whose neighbour is shorter by more than [`EDGE_DROP_EPSILON`] drops the
/// difference; any other edge is hidden.
pub fn compute_visible_edges(columns: &mut [HexColumn]) {
    let heights: HashMap<HexCoord, f32> = columns.iter().map(|c| (c.coord(), c.top_height)).collect();

    for col in columns.iter_mut() {
        let coord = col.coord();
        for dir in 0..6 {
            let (visible, drop) = match heights.get(&coord.neighbor(dir)) {
                None => (true, col.top_height),
                Some(&other) => {
                    let diff = col.top_height - other;
                    if diff > EDGE_DROP_EPSILON {
                        (true, diff)
                    } else {
                        (false, 0.0)
                    }
                }
            };
            col.visible_edges[dir] = visible;
            col.edge_drops[dir] = drop;
        }
    }
}
