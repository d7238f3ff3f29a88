//! Channel extraction and lava classification
//!
//! Channels are the open ground left between basalt columns. They are grouped
//! with an elevation-aware flood fill, filtered down to interior low-lying
//! rivers, pools and lakes, and turned into meshed lava bodies.

use std::collections::HashSet;

use crate::bodies::{BodyKind, BodyOrigin, LiquidBody, RegionGeometry};
use crate::flood_fill::{connected_components, PixelBounds};
use crate::geometry::{grid_mesh, polygon_mesh, trace_outline, LavaMesh, Point};
use crate::params::{ChannelParams, MeshStyle};
use crate::seeds::animation_phase;
use crate::terrain_map::{TerrainMap, BASALT};
use crate::tilemap::{Tilemap, OFFSETS_4};

/// Neighbours closer than this in elevation join a channel.
pub const JOIN_BELOW: f32 = 0.035;
/// Neighbours further than this in elevation also join (bridges terrace dithering).
pub const JOIN_ABOVE: f32 = 0.1;

/// Channels must average below this elevation.
const MAX_MEAN_ELEVATION: f32 = 0.5;
/// Regions within this many pixels of the map edge are not interior.
const BORDER_MARGIN: usize = 1;

const RIVER_MIN_ASPECT: f32 = 2.0;
const RIVER_MIN_SIZE: usize = 800;
const POOL_MIN_SIZE: usize = 300;
const POOL_MAX_SIZE: usize = 5000;
const LAKE_MIN_SIZE: usize = 2000;

/// Lava sits this far below the channel's mean elevation.
const LAVA_DEPTH: f32 = 0.15;

/// A connected stretch of open ground
#[derive(Clone, Debug)]
pub struct ChannelRegion {
    pub pixels: Vec<usize>,
    pub bounds: PixelBounds,
    pub aspect_ratio: f32,
    pub mean_elevation: f32,
}

impl RegionGeometry for ChannelRegion {
    fn bounds(&self) -> PixelBounds {
        self.bounds
    }

    fn pixels(&self) -> &[usize] {
        &self.pixels
    }

    fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }
}

/// Why a channel was kept
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelClass {
    /// Elongated
    River,
    /// Mid-size
    Pool,
    /// Large
    Lake,
}

/// Counters from one classification run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelReport {
    pub regions: usize,
    pub kept: usize,
    /// Kept channels whose outline could not be traced or meshed
    pub dropped: usize,
    pub partial_triangulations: usize,
}

// =============================================================================
// EXTRACTION
// =============================================================================

/// Group all non-basalt pixels into channel regions.
///
/// A pixel joins when its elevation differs from the region's seed pixel by
/// less than [`JOIN_BELOW`] or more than [`JOIN_ABOVE`].
pub fn extract_channels(terrain: &TerrainMap, heights: &Tilemap<f32>) -> Vec<ChannelRegion> {
    let cells = terrain.as_slice();
    let h = heights.as_slice();

    let components = connected_components(
        terrain.width,
        terrain.height,
        |i| cells[i] != BASALT,
        |s, n| {
            let diff = (h[n] - h[s]).abs();
            diff < JOIN_BELOW || diff > JOIN_ABOVE
        },
    );

    components
        .into_iter()
        .map(|c| ChannelRegion {
            aspect_ratio: c.bounds.aspect_ratio(),
            mean_elevation: c.mean(h),
            bounds: c.bounds,
            pixels: c.pixels,
        })
        .collect()
}

// =============================================================================
// CLASSIFICATION
// =============================================================================

/// Interior, low-lying rivers, pools and lakes; `None` for everything else.
pub fn classify_channel(region: &ChannelRegion, width: usize, height: usize) -> Option<ChannelClass> {
    if region.bounds.touches_border(width, height, BORDER_MARGIN) {
        return None;
    }
    if region.mean_elevation >= MAX_MEAN_ELEVATION {
        return None;
    }

    let size = region.pixels.len();
    if region.aspect_ratio > RIVER_MIN_ASPECT && size >= RIVER_MIN_SIZE {
        Some(ChannelClass::River)
    } else if (POOL_MIN_SIZE..=POOL_MAX_SIZE).contains(&size) {
        Some(ChannelClass::Pool)
    } else if size > LAKE_MIN_SIZE {
        Some(ChannelClass::Lake)
    } else {
        None
    }
}

/// Absorb bounding-box pixels with at least three of four neighbours in the region.
///
/// Scans row by row, so pixels absorbed earlier count for later ones.
pub fn fill_holes(region: &mut ChannelRegion, width: usize, height: usize) {
    let mut members: HashSet<usize> = region.pixels.iter().copied().collect();
    let b = region.bounds;

    for y in b.min_y..=b.max_y {
        for x in b.min_x..=b.max_x {
            let idx = y * width + x;
            if members.contains(&idx) {
                continue;
            }
            let count = OFFSETS_4
                .iter()
                .filter(|&&(dx, dy)| {
                    let (nx, ny) = (x as i32 + dx, y as i32 + dy);
                    nx >= 0
                        && ny >= 0
                        && (nx as usize) < width
                        && (ny as usize) < height
                        && members.contains(&(ny as usize * width + nx as usize))
                })
                .count();
            if count >= 3 {
                members.insert(idx);
                region.pixels.push(idx);
            }
        }
    }
}

/// Trace the region's outline in map coordinates (traced on a padded window).
fn region_outline(region: &ChannelRegion, width: usize) -> Vec<Point> {
    let b = region.bounds;
    if b.is_empty() || width == 0 {
        return Vec::new();
    }
    let ox = b.min_x.saturating_sub(1);
    let oy = b.min_y.saturating_sub(1);
    let ww = b.max_x + 2 - ox;
    let wh = b.max_y + 2 - oy;

    let mut window = Tilemap::new_with(ww, wh, false);
    for &idx in &region.pixels {
        let (x, y) = (idx % width, idx / width);
        window.set(x - ox, y - oy, true);
    }

    trace_outline(&window)
        .into_iter()
        .map(|(x, y)| (x + ox as f32, y + oy as f32))
        .collect()
}

/// Filter channels and build a meshed lava body for each survivor.
///
/// Bodies that cannot be traced or meshed are dropped and counted.
pub fn build_channel_lava(
    regions: Vec<ChannelRegion>,
    heights: &Tilemap<f32>,
    params: &ChannelParams,
) -> (Vec<LiquidBody>, ChannelReport) {
    let (width, height) = (heights.width, heights.height);
    let mut report = ChannelReport {
        regions: regions.len(),
        ..Default::default()
    };

    let mut kept: Vec<ChannelRegion> = regions
        .into_iter()
        .filter(|r| classify_channel(r, width, height).is_some())
        .collect();
    report.kept = kept.len();

    let mut bodies = Vec::new();
    for (i, region) in kept.iter_mut().enumerate() {
        fill_holes(region, width, height);

        let mean = region.pixels.iter().map(|&p| *heights.at(p) as f64).sum::<f64>() / region.pixels.len() as f64;
        let lava_height = mean as f32 - LAVA_DEPTH;

        let outline = region_outline(region, width);
        if outline.len() < 3 {
            tracing::warn!("Channel {}: failed to trace outline, dropped", i);
            report.dropped += 1;
            continue;
        }

        let mesh: Option<LavaMesh> = match params.mesh_style {
            MeshStyle::Outline => polygon_mesh(&outline, lava_height).map(|(mesh, tri)| {
                if !tri.complete {
                    tracing::warn!("Channel {}: partial triangulation ({} triangles)", i, tri.triangle_count());
                    report.partial_triangulations += 1;
                }
                mesh
            }),
            MeshStyle::Grid => Some(grid_mesh(
                &region.pixels,
                region.bounds,
                width,
                height,
                params.grid_spacing,
                lava_height,
            )),
        };

        let Some(mesh) = mesh.filter(|m| !m.is_empty()) else {
            tracing::warn!("Channel {}: empty mesh, dropped", i);
            report.dropped += 1;
            continue;
        };

        bodies.push(LiquidBody {
            kind: BodyKind::Lava,
            origin: BodyOrigin::Channel,
            height: lava_height,
            bounds: region.bounds,
            aspect_ratio: region.aspect_ratio,
            pixels: std::mem::take(&mut region.pixels),
            phase: animation_phase(i),
            mesh: Some(mesh),
        });
    }

    tracing::debug!(
        "Channels: {} regions, {} kept, {} lava bodies",
        report.regions,
        report.kept,
        bodies.len()
    );
    (bodies, report)
}
