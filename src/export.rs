//! PNG previews of generated terrain

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::pipeline::TerrainData;
use crate::terrain_map::TerrainClass;
use crate::tilemap::Tilemap;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("cannot export an empty {0}x{1} map")]
    EmptyMap(usize, usize),

    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

const BASALT_DARK: [f32; 3] = [0.16, 0.16, 0.18];
const BASALT_LIGHT: [f32; 3] = [0.55, 0.55, 0.58];
const LAVA_COLOR: [u8; 3] = [235, 90, 20];
const VOID_COLOR: [u8; 3] = [8, 6, 12];
const GROUND_COLOR: [f32; 3] = [0.42, 0.36, 0.30];
const CONTOUR_COLOR: [u8; 3] = [20, 20, 20];

/// Spectral colormap (matplotlib style): dark blue -> yellow -> dark red
fn spectral_colormap(t: f32) -> [u8; 3] {
    let colors: [[f32; 3]; 11] = [
        [0.37, 0.31, 0.64], // Dark blue/purple (low)
        [0.20, 0.53, 0.74],
        [0.40, 0.76, 0.65],
        [0.67, 0.87, 0.64],
        [0.90, 0.96, 0.60],
        [1.00, 1.00, 0.75],
        [1.00, 0.88, 0.55],
        [0.99, 0.68, 0.38],
        [0.96, 0.43, 0.26],
        [0.84, 0.24, 0.31],
        [0.62, 0.00, 0.26], // Dark red (high)
    ];

    let t = t.clamp(0.0, 1.0) * (colors.len() - 1) as f32;
    let i = (t as usize).min(colors.len() - 2);
    let f = t - i as f32;
    let c = lerp3(colors[i], colors[i + 1], f);
    to_rgb(c)
}

fn lerp3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn to_rgb(c: [f32; 3]) -> [u8; 3] {
    [
        (c[0].clamp(0.0, 1.0) * 255.0) as u8,
        (c[1].clamp(0.0, 1.0) * 255.0) as u8,
        (c[2].clamp(0.0, 1.0) * 255.0) as u8,
    ]
}

fn check_size(width: usize, height: usize) -> Result<(), ExportError> {
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyMap(width, height));
    }
    Ok(())
}

/// Heightfield rendered with the spectral colormap.
pub fn render_heightfield(heights: &Tilemap<f32>) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(heights.width as u32, heights.height as u32);
    for (x, y, &h) in heights.iter() {
        img.put_pixel(x as u32, y as u32, Rgb(spectral_colormap(h)));
    }
    img
}

/// Top-down classification preview with contour lines drawn over it.
pub fn render_preview(data: &TerrainData) -> RgbImage {
    let mut img: RgbImage = ImageBuffer::new(data.width as u32, data.height as u32);

    for (x, y, &raw) in data.terrain.iter() {
        let h = *data.heightfield.get(x, y);
        let color = match TerrainClass::from_raw(raw) {
            TerrainClass::Basalt => to_rgb(lerp3(BASALT_DARK, BASALT_LIGHT, h)),
            TerrainClass::Lava => LAVA_COLOR,
            TerrainClass::Void => VOID_COLOR,
            TerrainClass::Plateau(_) => spectral_colormap(h),
            TerrainClass::Empty => to_rgb(lerp3(GROUND_COLOR, [0.8, 0.75, 0.65], h)),
        };
        img.put_pixel(x as u32, y as u32, Rgb(color));
    }

    // Segments are at most one pixel long; mark both endpoints
    for line in &data.contours {
        for (px, py) in [(line.x1, line.y1), (line.x2, line.y2)] {
            let (ix, iy) = (px.round() as i64, py.round() as i64);
            if ix >= 0 && iy >= 0 && (ix as usize) < data.width && (iy as usize) < data.height {
                img.put_pixel(ix as u32, iy as u32, Rgb(CONTOUR_COLOR));
            }
        }
    }

    img
}

pub fn export_heightfield(heights: &Tilemap<f32>, path: &Path) -> Result<(), ExportError> {
    check_size(heights.width, heights.height)?;
    render_heightfield(heights).save(path)?;
    tracing::info!("Wrote heightfield to {}", path.display());
    Ok(())
}

pub fn export_preview(data: &TerrainData, path: &Path) -> Result<(), ExportError> {
    check_size(data.width, data.height)?;
    render_preview(data).save(path)?;
    tracing::info!("Wrote preview to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(spectral_colormap(0.0), [94, 79, 163]);
        assert_eq!(spectral_colormap(1.0), [158, 0, 66]);
        assert_eq!(spectral_colormap(-3.0), spectral_colormap(0.0));
    }

    #[test]
    fn test_heightfield_png_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("height.png");
        let map = Tilemap::from_fn(16, 8, |x, _| x as f32 / 15.0);
        export_heightfield(&map, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (16, 8));
        assert_eq!(img.get_pixel(0, 0).0, spectral_colormap(0.0));
    }

    #[test]
    fn test_empty_map_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let map: Tilemap<f32> = Tilemap::new(0, 4);
        let err = export_heightfield(&map, &dir.path().join("x.png")).unwrap_err();
        assert!(matches!(err, ExportError::EmptyMap(0, 4)));
    }
}
