//! Planar geometry for liquid surfaces
//!
//! Boundary tracing of binary pixel masks, ear-clipping triangulation and the
//! dense grid mesh used for lava surfaces.

use std::collections::{HashMap, HashSet};

use crate::flood_fill::PixelBounds;
use crate::tilemap::Tilemap;

/// Maximum ears clipped before a triangulation is given up as partial.
pub const EAR_CLIP_GUARD: usize = 100_000;

pub type Point = (f32, f32);

/// East, south, west, north (screen coordinates, y down).
const TRACE_DIRS: [(i32, i32); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LavaVertex {
    pub x: f32,
    pub y: f32,
    pub base_z: f32,
}

/// Vertex list plus triangle indices (three per triangle)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LavaMesh {
    pub vertices: Vec<LavaVertex>,
    pub indices: Vec<u32>,
}

impl LavaMesh {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

// =============================================================================
// POLYGONS
// =============================================================================

/// Signed shoelace area (positive = counter-clockwise in y-up terms).
pub fn polygon_area(poly: &[Point]) -> f32 {
    let n = poly.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    let mut j = n - 1;
    for i in 0..n {
        area += (poly[j].0 * poly[i].1 - poly[i].0 * poly[j].1) as f64;
        j = i;
    }
    (area * 0.5) as f32
}

/// Walk the boundary of the first filled pixel region (scan order).
///
/// The walker always tries a left turn first, then straight, then turns
/// right in place. One vertex (pixel centre) is emitted per move. The walk
/// ends when it returns to the start pixel, or after `8 * w * h` steps on
/// degenerate masks. The result has non-negative signed area. An empty mask
/// yields an empty outline.
pub fn trace_outline(mask: &Tilemap<bool>) -> Vec<Point> {
    let (w, h) = (mask.width as i32, mask.height as i32);
    let mut poly: Vec<Point> = Vec::new();

    let start = match mask.as_slice().iter().position(|&m| m) {
        Some(idx) => mask.coords(idx),
        None => return poly,
    };
    let (sx, sy) = (start.0 as i32, start.1 as i32);

    let filled = |x: i32, y: i32| mask.in_bounds(x, y) && *mask.get(x as usize, y as usize);

    let (mut cx, mut cy, mut dir) = (sx, sy, 0usize);
    let guard = (w as usize) * (h as usize) * 8;
    let mut steps = 0usize;

    loop {
        let left = (dir + 3) & 3;
        let (lx, ly) = (cx + TRACE_DIRS[left].0, cy + TRACE_DIRS[left].1);
        if filled(lx, ly) {
            dir = left;
            cx = lx;
            cy = ly;
        } else {
            let (fx, fy) = (cx + TRACE_DIRS[dir].0, cy + TRACE_DIRS[dir].1);
            if filled(fx, fy) {
                cx = fx;
                cy = fy;
            } else {
                dir = (dir + 1) & 3;
            }
        }

        let v = (cx as f32 + 0.5, cy as f32 + 0.5);
        let is_new = poly
            .last()
            .map_or(true, |p| (p.0 - v.0).abs() > 1e-4 || (p.1 - v.1).abs() > 1e-4);
        if is_new {
            poly.push(v);
        }

        steps += 1;
        if steps > guard || (cx == sx && cy == sy && poly.len() > 2) {
            break;
        }
    }

    if poly.len() >= 3 && polygon_area(&poly) < 0.0 {
        poly.reverse();
    }
    poly
}

// =============================================================================
// EAR CLIPPING
// =============================================================================

/// Triangle indices into the input polygon
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Triangulation {
    pub indices: Vec<u32>,
    /// False if clipping stalled (no ear found or guard hit) before three vertices remained
    pub complete: bool,
}

impl Triangulation {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn point_in_triangle(p: Point, a: Point, b: Point, c: Point) -> bool {
    let (v0x, v0y) = (c.0 - a.0, c.1 - a.1);
    let (v1x, v1y) = (b.0 - a.0, b.1 - a.1);
    let (v2x, v2y) = (p.0 - a.0, p.1 - a.1);

    let d00 = v0x * v0x + v0y * v0y;
    let d01 = v0x * v1x + v0y * v1y;
    let d11 = v1x * v1x + v1y * v1y;
    let d20 = v2x * v0x + v2y * v0y;
    let d21 = v2x * v1x + v2y * v1y;

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-12 {
        return false;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;
    u >= 0.0 && v >= 0.0 && w >= 0.0
}

fn is_ear(i0: usize, i1: usize, i2: usize, ring: &[usize], poly: &[Point]) -> bool {
    let a = poly[ring[i0]];
    let b = poly[ring[i1]];
    let c = poly[ring[i2]];

    let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
    if cross <= 0.0 {
        return false;
    }

    ring.iter()
        .enumerate()
        .filter(|&(k, _)| k != i0 && k != i1 && k != i2)
        .all(|(_, &v)| !point_in_triangle(poly[v], a, b, c))
}

/// Ear-clipping triangulation of a simple polygon (either winding).
///
/// Degenerate polygons produce a partial result with `complete == false`
/// instead of looping.
pub fn triangulate_ear_clipping(poly: &[Point]) -> Triangulation {
    let mut out = Triangulation::default();
    if poly.len() < 3 {
        return out;
    }

    let mut ring: Vec<usize> = (0..poly.len()).collect();
    if polygon_area(poly) < 0.0 {
        ring.reverse();
    }

    let mut clips = 0usize;
    while ring.len() > 3 && clips < EAR_CLIP_GUARD {
        let n = ring.len();
        let ear = (0..n).find(|&i| is_ear((i + n - 1) % n, i, (i + 1) % n, &ring, poly));

        let Some(i) = ear else {
            break;
        };
        let (i0, i2) = ((i + n - 1) % n, (i + 1) % n);
        out.indices.extend([ring[i0] as u32, ring[i] as u32, ring[i2] as u32]);
        ring.remove(i);
        clips += 1;
    }

    if ring.len() == 3 {
        out.indices.extend(ring.iter().map(|&v| v as u32));
        out.complete = true;
    }
    out
}

/// Mesh the polygon at height `z`. `None` if nothing could be triangulated.
pub fn polygon_mesh(poly: &[Point], z: f32) -> Option<(LavaMesh, Triangulation)> {
    let tri = triangulate_ear_clipping(poly);
    if tri.indices.is_empty() {
        return None;
    }
    let mesh = LavaMesh {
        vertices: poly.iter().map(|&(x, y)| LavaVertex { x, y, base_z: z }).collect(),
        indices: tri.indices.clone(),
    };
    Some((mesh, tri))
}

// =============================================================================
// GRID MESH
// =============================================================================

/// `pixels` plus their in-bounds 4-neighbours (original pixels first).
pub fn dilate_pixels(pixels: &[usize], width: usize, height: usize) -> Vec<usize> {
    let mut seen: HashSet<usize> = pixels.iter().copied().collect();
    let mut out = pixels.to_vec();

    for &idx in pixels {
        let (x, y) = ((idx % width) as i32, (idx / width) as i32);
        for (dx, dy) in crate::tilemap::OFFSETS_4 {
            let (nx, ny) = (x + dx, y + dy);
            if nx < 0 || ny < 0 || nx as usize >= width || ny as usize >= height {
                continue;
            }
            let n = ny as usize * width + nx as usize;
            if seen.insert(n) {
                out.push(n);
            }
        }
    }
    out
}

/// Regular grid over `bounds` at `spacing`, clipped to the one-ring dilation
/// of `pixels`. A quad becomes two triangles only when all four corners exist.
pub fn grid_mesh(
    pixels: &[usize],
    bounds: PixelBounds,
    width: usize,
    height: usize,
    spacing: f32,
    z: f32,
) -> LavaMesh {
    let mut mesh = LavaMesh::default();
    if pixels.is_empty() || bounds.is_empty() || width == 0 {
        return mesh;
    }
    let spacing = if spacing > 0.0 { spacing } else { 1.0 };

    let inside: HashSet<usize> = dilate_pixels(pixels, width, height).into_iter().collect();
    let is_member = |x: f32, y: f32| {
        let (ix, iy) = (x.round() as i64, y.round() as i64);
        ix >= 0
            && iy >= 0
            && (ix as usize) < width
            && (iy as usize) < height
            && inside.contains(&(iy as usize * width + ix as usize))
    };

    let (x0, y0) = (bounds.min_x as f32, bounds.min_y as f32);
    let nx = ((bounds.max_x - bounds.min_x) as f32 / spacing).ceil() as usize + 1;
    let ny = ((bounds.max_y - bounds.min_y) as f32 / spacing).ceil() as usize + 1;

    let mut vertex_at: HashMap<(usize, usize), u32> = HashMap::new();
    for j in 0..ny {
        for i in 0..nx {
            let (x, y) = (x0 + i as f32 * spacing, y0 + j as f32 * spacing);
            if is_member(x, y) {
                vertex_at.insert((i, j), mesh.vertices.len() as u32);
                mesh.vertices.push(LavaVertex { x, y, base_z: z });
            }
        }
    }

    for j in 0..ny.saturating_sub(1) {
        for i in 0..nx.saturating_sub(1) {
            let corners = (
                vertex_at.get(&(i, j)),
                vertex_at.get(&(i + 1, j)),
                vertex_at.get(&(i, j + 1)),
                vertex_at.get(&(i + 1, j + 1)),
            );
            if let (Some(&v00), Some(&v10), Some(&v01), Some(&v11)) = corners {
                mesh.indices.extend([v00, v10, v01, v10, v11, v01]);
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn regular_polygon(n: usize, radius: f32) -> Vec<Point> {
        (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * TAU;
                (radius * a.cos(), radius * a.sin())
            })
            .collect()
    }

    fn triangles_area(poly: &[Point], indices: &[u32]) -> f32 {
        indices
            .chunks(3)
            .map(|t| polygon_area(&[poly[t[0] as usize], poly[t[1] as usize], poly[t[2] as usize]]).abs())
            .sum()
    }

    #[test]
    fn test_convex_ngon_gives_n_minus_two_triangles() {
        for n in [3, 4, 7, 12, 33] {
            let poly = regular_polygon(n, 10.0);
            let tri = triangulate_ear_clipping(&poly);
            assert!(tri.complete);
            assert_eq!(tri.triangle_count(), n - 2);
            let area = polygon_area(&poly);
            assert!((triangles_area(&poly, &tri.indices) - area).abs() < 1e-2 * area);
        }
    }

    #[test]
    fn test_clockwise_input_is_handled() {
        let mut poly = regular_polygon(6, 5.0);
        poly.reverse();
        assert!(polygon_area(&poly) < 0.0);
        let tri = triangulate_ear_clipping(&poly);
        assert!(tri.complete);
        assert_eq!(tri.triangle_count(), 4);
    }

    #[test]
    fn test_concave_polygon() {
        // L shape
        let poly = vec![(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (2.0, 2.0), (2.0, 4.0), (0.0, 4.0)];
        let tri = triangulate_ear_clipping(&poly);
        assert!(tri.complete);
        assert_eq!(tri.triangle_count(), 4);
        assert!((triangles_area(&poly, &tri.indices) - 12.0).abs() < 1e-4);
    }

    #[test]
    fn test_degenerate_polygon_is_partial() {
        let line = vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)];
        let tri = triangulate_ear_clipping(&line);
        assert!(!tri.complete);
        assert!(triangulate_ear_clipping(&line[..2]).indices.is_empty());
    }

    #[test]
    fn test_trace_rectangle_outline() {
        let mask = Tilemap::from_fn(10, 8, |x, y| (2..7).contains(&x) && (3..6).contains(&y));
        let poly = trace_outline(&mask);
        assert!(poly.len() >= 4);
        assert!(polygon_area(&poly) > 0.0);
        for &(x, y) in &poly {
            assert!((2.5..=6.5).contains(&x) && (3.5..=5.5).contains(&y));
        }
        // Outline runs through pixel centres of the border ring: (6.5-2.5) * (5.5-3.5)
        assert!((polygon_area(&poly) - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_trace_empty_and_single_pixel() {
        assert!(trace_outline(&Tilemap::new_with(4, 4, false)).is_empty());
        let mut one = Tilemap::new_with(3, 3, false);
        one.set(1, 1, true);
        assert!(trace_outline(&one).len() < 3);
    }

    #[test]
    fn test_grid_mesh_square() {
        let width = 20;
        let pixels: Vec<usize> = (4..=12)
            .flat_map(|y| (4..=12).map(move |x| y * width + x))
            .collect();
        let bounds = PixelBounds { min_x: 4, min_y: 4, max_x: 12, max_y: 12 };
        let mesh = grid_mesh(&pixels, bounds, width, 20, 2.0, 0.3);
        // 5x5 lattice, 4x4 quads
        assert_eq!(mesh.vertices.len(), 25);
        assert_eq!(mesh.triangle_count(), 32);
        assert!(mesh.vertices.iter().all(|v| v.base_z == 0.3));
    }

    #[test]
    fn test_dilation_adds_one_ring() {
        let d = dilate_pixels(&[12], 5, 5);
        assert_eq!(d.len(), 5);
        assert_eq!(d[0], 12);
        assert_eq!(dilate_pixels(&[0], 5, 5).len(), 3);
    }
}
