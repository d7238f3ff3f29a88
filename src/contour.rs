//! Contour line extraction (marching squares)

use crate::tilemap::Tilemap;

/// One contour segment at `elevation`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContourLine {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub elevation: f32,
}

/// Iso-levels `interval * (k + 0.5)` below 1.0.
pub fn contour_levels(interval: f32) -> Vec<f32> {
    if !(interval > 0.0) {
        return Vec::new();
    }
    (0..)
        .map(|k| interval * (k as f32 + 0.5))
        .take_while(|&level| level < 1.0)
        .collect()
}

/// Crossing on the edge from `a` to `b`, as a fraction along it, if the edge changes side.
#[inline]
fn crossing(a: f32, b: f32, level: f32) -> Option<f32> {
    ((a < level) != (b < level)).then(|| (level - a) / (b - a))
}

/// Marching squares over the heightfield for every level.
///
/// Corner bits: (x, y) = 1, (x+1, y) = 2, (x+1, y+1) = 4, (x, y+1) = 8.
/// Saddles connect top-right / bottom-left when the cell average is at or
/// above the level, and top-left / right-bottom otherwise.
pub fn extract_contours(heights: &Tilemap<f32>, interval: f32) -> Vec<ContourLine> {
    let mut lines = Vec::new();
    let (w, h) = (heights.width, heights.height);
    if w < 2 || h < 2 {
        return lines;
    }

    for level in contour_levels(interval) {
        for y in 0..h - 1 {
            for x in 0..w - 1 {
                let h00 = *heights.get(x, y);
                let h10 = *heights.get(x + 1, y);
                let h01 = *heights.get(x, y + 1);
                let h11 = *heights.get(x + 1, y + 1);

                let config = (h00 >= level) as u8
                    | ((h10 >= level) as u8) << 1
                    | ((h11 >= level) as u8) << 2
                    | ((h01 >= level) as u8) << 3;
                if config == 0 || config == 15 {
                    continue;
                }

                let (fx, fy) = (x as f32, y as f32);
                let mut points = [(0.0f32, 0.0f32); 4];
                let mut count = 0;

                // Top, right, bottom, left
                let edges = [
                    crossing(h00, h10, level).map(|t| (fx + t, fy)),
                    crossing(h10, h11, level).map(|t| (fx + 1.0, fy + t)),
                    crossing(h11, h01, level).map(|t| (fx + 1.0 - t, fy + 1.0)),
                    crossing(h01, h00, level).map(|t| (fx, fy + 1.0 - t)),
                ];
                for p in edges.into_iter().flatten() {
                    points[count] = p;
                    count += 1;
                }

                let mut segment = |a: (f32, f32), b: (f32, f32)| {
                    lines.push(ContourLine { x1: a.0, y1: a.1, x2: b.0, y2: b.1, elevation: level });
                };

                match count {
                    2 => segment(points[0], points[1]),
                    4 => {
                        let center = (h00 + h10 + h11 + h01) * 0.25;
                        if center >= level {
                            segment(points[0], points[1]);
                            segment(points[2], points[3]);
                        } else {
                            segment(points[0], points[3]);
                            segment(points[1], points[2]);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    tracing::debug!("Extracted {} contour segments", lines.len());
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_start_at_half_interval() {
        assert_eq!(contour_levels(0.25), vec![0.125, 0.375, 0.625, 0.875]);
        assert!(contour_levels(0.0).is_empty());
    }

    #[test]
    fn test_ramp_crossing_one_level_gives_straight_line() {
        // 0.0 .. 0.6 across x: only level 0.5 (interval 1.0) is crossed
        let map = Tilemap::from_fn(7, 5, |x, _| x as f32 * 0.1);
        let lines = extract_contours(&map, 1.0);
        assert_eq!(lines.len(), 4);
        for l in &lines {
            assert!((l.x1 - 5.0).abs() < 1e-4 && (l.x2 - 5.0).abs() < 1e-4);
            assert!((l.y1 - l.y2).abs() == 1.0);
            assert_eq!(l.elevation, 0.5);
        }
    }

    #[test]
    fn test_flat_fields_emit_nothing() {
        assert!(extract_contours(&Tilemap::new_with(8, 8, 0.0f32), 0.25).is_empty());
        assert!(extract_contours(&Tilemap::new_with(8, 8, 1.0f32), 0.25).is_empty());
    }

    #[test]
    fn test_saddle_tie_break() {
        // Diagonal highs: config 5
        let high = Tilemap::from_vec(2, 2, vec![1.0, 0.0, 0.0, 1.0]).unwrap();
        let lines = extract_contours(&high, 1.0);
        assert_eq!(lines.len(), 2);
        // Cell average 0.5 >= 0.5: top joins right
        assert_eq!((lines[0].x1, lines[0].y1, lines[0].x2, lines[0].y2), (0.5, 0.0, 1.0, 0.5));

        let low = Tilemap::from_vec(2, 2, vec![0.6, 0.0, 0.0, 0.6]).unwrap();
        let lines = extract_contours(&low, 1.0);
        assert_eq!(lines.len(), 2);
        // Average 0.3 < 0.5: top joins left
        assert_eq!(lines[0].x2, 0.0);
    }
}
