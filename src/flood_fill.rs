//! Iterative 4-connected component labelling
//!
//! Every segmentation stage (terrace cleanup, plateaus, channels, void fill)
//! is a breadth-first flood fill with a different join rule. The fill always
//! uses an explicit FIFO queue so large maps cannot overflow the stack.

use std::collections::VecDeque;

use crate::tilemap::OFFSETS_4;

/// Inclusive pixel bounding box
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl Default for PixelBounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl PixelBounds {
    /// Bounds containing nothing; the first `include` sets them.
    pub fn empty() -> Self {
        Self {
            min_x: usize::MAX,
            min_y: usize::MAX,
            max_x: 0,
            max_y: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn include(&mut self, x: usize, y: usize) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.max_x - self.min_x + 1
        }
    }

    pub fn height(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.max_y - self.min_y + 1
        }
    }

    /// `max(w, h) / min(w, h)`, 1.0 for empty bounds.
    pub fn aspect_ratio(&self) -> f32 {
        let w = self.width();
        let h = self.height();
        if w == 0 || h == 0 {
            return 1.0;
        }
        w.max(h) as f32 / w.min(h) as f32
    }

    /// True if the box comes within `margin` pixels of any map edge.
    pub fn touches_border(&self, map_width: usize, map_height: usize, margin: usize) -> bool {
        self.min_x <= margin
            || self.min_y <= margin
            || self.max_x + margin + 1 >= map_width
            || self.max_y + margin + 1 >= map_height
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

/// One connected component, pixels in BFS order (seed first)
#[derive(Clone, Debug, Default)]
pub struct Component {
    pub pixels: Vec<usize>,
    pub bounds: PixelBounds,
}

impl Component {
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Mean pixel coordinate
    pub fn centroid(&self, width: usize) -> (f32, f32) {
        if self.pixels.is_empty() || width == 0 {
            return (0.0, 0.0);
        }
        let (sx, sy) = self.pixels.iter().fold((0.0f64, 0.0f64), |(sx, sy), &i| {
            (sx + (i % width) as f64, sy + (i / width) as f64)
        });
        let n = self.pixels.len() as f64;
        ((sx / n) as f32, (sy / n) as f32)
    }

    /// Mean of `values` over the member pixels
    pub fn mean(&self, values: &[f32]) -> f32 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.pixels.iter().map(|&i| values[i] as f64).sum();
        (sum / self.pixels.len() as f64) as f32
    }
}

fn neighbors_4(width: usize, height: usize, idx: usize) -> impl Iterator<Item = usize> {
    let x = (idx % width) as i32;
    let y = (idx / width) as i32;
    OFFSETS_4.into_iter().filter_map(move |(dx, dy)| {
        let nx = x + dx;
        let ny = y + dy;
        (nx >= 0 && ny >= 0 && (nx as usize) < width && (ny as usize) < height)
            .then(|| ny as usize * width + nx as usize)
    })
}

/// Flood one component from `seed`.
///
/// A neighbour joins if it is unvisited and `joins(seed, candidate)` holds.
/// Every joined pixel is marked in `visited`.
pub fn flood_from<J>(
    width: usize,
    height: usize,
    seed: usize,
    visited: &mut [bool],
    joins: J,
) -> Component
where
    J: Fn(usize, usize) -> bool,
{
    let mut component = Component::default();
    let mut queue = VecDeque::new();

    visited[seed] = true;
    queue.push_back(seed);

    while let Some(idx) = queue.pop_front() {
        component.pixels.push(idx);
        component.bounds.include(idx % width, idx / width);

        for n in neighbors_4(width, height, idx) {
            if !visited[n] && joins(seed, n) {
                visited[n] = true;
                queue.push_back(n);
            }
        }
    }

    component
}

/// Label every eligible pixel, scanning seeds in row-major order.
///
/// `eligible(i)` gates both seeds and joins; `joins(seed, candidate)` is the
/// stage-specific merge rule, evaluated against the component's seed pixel.
pub fn connected_components<E, J>(width: usize, height: usize, eligible: E, joins: J) -> Vec<Component>
where
    E: Fn(usize) -> bool,
    J: Fn(usize, usize) -> bool,
{
    let mut visited = vec![false; width * height];
    let mut components = Vec::new();

    for idx in 0..width * height {
        if visited[idx] || !eligible(idx) {
            continue;
        }
        let component = flood_from(width, height, idx, &mut visited, |s, n| {
            eligible(n) && joins(s, n)
        });
        components.push(component);
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_blobs_split_by_wall() {
        // 5x3 with a wall in column 2
        let wall = |i: usize| i % 5 == 2;
        let comps = connected_components(5, 3, |i| !wall(i), |_, _| true);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].len(), 6);
        assert_eq!(comps[0].bounds, PixelBounds { min_x: 0, min_y: 0, max_x: 1, max_y: 2 });
        assert_eq!(comps[1].bounds.min_x, 3);
    }

    #[test]
    fn test_join_rule_against_seed() {
        let values = [0.0f32, 0.1, 0.2, 0.3];
        // Joins only within 0.15 of the seed, not of the neighbour
        let comps = connected_components(4, 1, |_| true, |s, n| (values[s] - values[n]).abs() < 0.15);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].pixels, vec![0, 1]);
    }

    #[test]
    fn test_diagonals_do_not_connect() {
        // checkerboard 2x2: (0,0) and (1,1) set
        let set = [true, false, false, true];
        let comps = connected_components(2, 2, |i| set[i], |_, _| true);
        assert_eq!(comps.len(), 2);
    }

    #[test]
    fn test_large_fill_does_not_recurse() {
        let comps = connected_components(1024, 1024, |_| true, |_, _| true);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].len(), 1024 * 1024);
    }

    #[test]
    fn test_bounds_helpers() {
        let mut b = PixelBounds::empty();
        assert!(b.is_empty());
        b.include(2, 3);
        b.include(9, 4);
        assert_eq!(b.width(), 8);
        assert_eq!(b.height(), 2);
        assert_eq!(b.aspect_ratio(), 4.0);
        assert!(!b.touches_border(20, 20, 1));
        assert!(b.touches_border(11, 20, 1));
        assert!(b.touches_border(20, 20, 2));
    }

    #[test]
    fn test_centroid() {
        let c = Component { pixels: vec![0, 2], bounds: PixelBounds::empty() };
        assert_eq!(c.centroid(3), (1.0, 0.0));
    }
}
