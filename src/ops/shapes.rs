//! Integer scan-conversion of lines, rectangles and circles on a square grid.
//!
//! Every function returns row-major pixel indices (`y * size + x`). Inputs are
//! grid-local coordinates; the caller is expected to clip them. Points that
//! would land outside the grid are dropped rather than wrapped into a
//! neighbouring row, since a negative index cannot be represented.

use std::collections::BTreeSet;

use crate::color::js_round;

/// Which primitive a shape tool rasterizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Line,
    Rectangle,
    Circle,
}

impl ShapeKind {
    pub fn label(&self) -> &'static str {
        match self {
            ShapeKind::Line => "Line Tool",
            ShapeKind::Rectangle => "Rectangle Tool",
            ShapeKind::Circle => "Circle Tool",
        }
    }

    /// Rasterize between two drag corners. `filled` is ignored for lines.
    pub fn rasterize(&self, from: (i32, i32), to: (i32, i32), filled: bool, size: usize) -> Vec<usize> {
        let (x1, y1) = from;
        let (x2, y2) = to;
        match (self, filled) {
            (ShapeKind::Line, _) => line(x1, y1, x2, y2, size),
            (ShapeKind::Rectangle, false) => rectangle(x1, y1, x2, y2, size),
            (ShapeKind::Rectangle, true) => rectangle_filled(x1, y1, x2, y2, size),
            (ShapeKind::Circle, false) => circle(x1, y1, x2, y2, size),
            (ShapeKind::Circle, true) => circle_filled(x1, y1, x2, y2, size),
        }
    }
}

/// Row-major index of `(x, y)`, or `None` when it falls off the grid.
#[inline]
pub fn grid_index(x: i32, y: i32, size: usize) -> Option<usize> {
    if x < 0 || y < 0 {
        return None;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= size || y >= size {
        return None;
    }
    Some(y * size + x)
}

/// Bresenham line, both endpoints inclusive, one index per visited cell,
/// ordered from `(x1, y1)` to `(x2, y2)`.
///
/// The error accumulator breaks ties differently depending on direction, so
/// the walk always starts from the lexicographically smaller endpoint and is
/// reversed afterwards. Swapping the endpoints yields the same cell set.
pub fn line(x1: i32, y1: i32, x2: i32, y2: i32, size: usize) -> Vec<usize> {
    if (x2, y2) < (x1, y1) {
        let mut indices = bresenham(x2, y2, x1, y1, size);
        indices.reverse();
        return indices;
    }
    bresenham(x1, y1, x2, y2, size)
}

fn bresenham(x1: i32, y1: i32, x2: i32, y2: i32, size: usize) -> Vec<usize> {
    let (x1, y1, x2, y2) = (x1 as i64, y1 as i64, x2 as i64, y2 as i64);
    let dx = (x2 - x1).abs();
    let dy = -(y2 - y1).abs();
    let sx = if x1 < x2 { 1 } else { -1 };
    let sy = if y1 < y2 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x1, y1);

    let mut indices = Vec::new();
    loop {
        // x and y never leave the endpoints' box, so they fit back in i32.
        if let Some(i) = grid_index(x as i32, y as i32, size) {
            indices.push(i);
        }
        if x == x2 && y == y2 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
    indices
}

/// Normalized `(min_x, min_y, max_x, max_y)` of two corners.
#[inline]
fn bounds(x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32, i32, i32) {
    (x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2))
}

/// Rectangle outline, each edge cell reported once.
pub fn rectangle(x1: i32, y1: i32, x2: i32, y2: i32, size: usize) -> Vec<usize> {
    let (min_x, min_y, max_x, max_y) = bounds(x1, y1, x2, y2);
    let mut set = BTreeSet::new();
    for x in min_x..=max_x {
        set.extend(grid_index(x, min_y, size));
        set.extend(grid_index(x, max_y, size));
    }
    for y in min_y..=max_y {
        set.extend(grid_index(min_x, y, size));
        set.extend(grid_index(max_x, y, size));
    }
    set.into_iter().collect()
}

/// Every cell of the normalized box, row by row.
pub fn rectangle_filled(x1: i32, y1: i32, x2: i32, y2: i32, size: usize) -> Vec<usize> {
    let (min_x, min_y, max_x, max_y) = bounds(x1, y1, x2, y2);
    (min_y..=max_y)
        .flat_map(|y| (min_x..=max_x).filter_map(move |x| grid_index(x, y, size)))
        .collect()
}

/// Center and radius of the circle inscribed in a drag box.
/// `radius = round(max(half-width, half-height))`.
pub fn circle_params(x1: i32, y1: i32, x2: i32, y2: i32) -> (i32, i32, i32) {
    let rx = (x2 as i64 - x1 as i64).abs() as f64 / 2.0;
    let ry = (y2 as i64 - y1 as i64).abs() as f64 / 2.0;
    let cx = js_round(x1.min(x2) as f64 + rx) as i32;
    let cy = js_round(y1.min(y2) as f64 + ry) as i32;
    let r = js_round(rx.max(ry)) as i32;
    (cx, cy, r)
}

/// Midpoint circle outline with 8-way symmetry.
pub fn circle(x1: i32, y1: i32, x2: i32, y2: i32, size: usize) -> Vec<usize> {
    let (cx, cy, r) = circle_params(x1, y1, x2, y2);
    let mut set = BTreeSet::new();

    let (mut x, mut y) = (r, 0);
    let mut err = 1 - r;
    while x >= y {
        for (px, py) in [
            (cx + x, cy + y),
            (cx + y, cy + x),
            (cx + x, cy - y),
            (cx + y, cy - x),
            (cx - x, cy + y),
            (cx - y, cy + x),
            (cx - x, cy - y),
            (cx - y, cy - x),
        ] {
            set.extend(grid_index(px, py, size));
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
    set.into_iter().collect()
}

/// Disc via `dx² + dy² <= r²` over the bounding square, clipped to the grid.
pub fn circle_filled(x1: i32, y1: i32, x2: i32, y2: i32, size: usize) -> Vec<usize> {
    let (cx, cy, r) = circle_params(x1, y1, x2, y2);
    let (cx, cy, r) = (cx as i64, cy as i64, r as i64);
    let r_sq = r * r;
    let last = size as i64 - 1;
    let mut indices = Vec::new();
    for y in (cy - r).max(0)..=(cy + r).min(last) {
        for x in (cx - r).max(0)..=(cx + r).min(last) {
            let (dx, dy) = (x - cx, y - cy);
            if dx * dx + dy * dy <= r_sq {
                indices.push(y as usize * size + x as usize);
            }
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn set(v: Vec<usize>) -> BTreeSet<usize> {
        v.into_iter().collect()
    }

    #[test]
    fn diagonal_line() {
        assert_eq!(line(0, 0, 3, 3, 4), vec![0, 5, 10, 15]);
    }

    #[test]
    fn single_point_line() {
        assert_eq!(line(2, 1, 2, 1, 4), vec![6]);
    }

    #[test]
    fn far_off_grid_line_keeps_only_grid_cells() {
        assert_eq!(line(0, 0, 100_000, 0, 4), vec![0, 1, 2, 3]);
        assert_eq!(line(-100_000, 2, 1, 2, 4), vec![8, 9]);
    }

    #[test]
    fn huge_filled_circle_clips_without_overflow() {
        // r = 100_000, so r² does not fit in i32.
        let disc = circle_filled(-100_000, -100_000, 100_000, 100_000, 4);
        assert_eq!(disc, (0..16).collect::<Vec<_>>());
        assert!(circle_filled(0, 0, 4, 4, 0).is_empty());
    }

    #[test]
    fn swapped_endpoints_reverse_the_walk() {
        let forward = line(0, 0, 1, 2, 4);
        let mut backward = line(1, 2, 0, 0, 4);
        backward.reverse();
        assert_eq!(forward, backward);
    }

    proptest! {
        #[test]
        fn line_set_is_direction_independent(x1 in 0i32..8, y1 in 0i32..8, x2 in 0i32..8, y2 in 0i32..8) {
            prop_assert_eq!(set(line(x1, y1, x2, y2, 8)), set(line(x2, y2, x1, y1, 8)));
        }
    }

    #[test]
    fn shallow_line_is_eight_connected() {
        let pts = line(0, 0, 6, 2, 8);
        assert_eq!(pts.first(), Some(&0));
        assert_eq!(pts.last(), Some(&(2 * 8 + 6)));
        assert_eq!(pts.len(), 7);
        for pair in pts.windows(2) {
            let (ax, ay) = ((pair[0] % 8) as i32, (pair[0] / 8) as i32);
            let (bx, by) = ((pair[1] % 8) as i32, (pair[1] / 8) as i32);
            assert!((ax - bx).abs() <= 1 && (ay - by).abs() <= 1);
        }
    }

    #[test]
    fn rectangle_outline_is_deduplicated() {
        let outline = rectangle(3, 3, 1, 1, 5);
        assert_eq!(outline, vec![6, 7, 8, 11, 13, 16, 17, 18]);
    }

    #[test]
    fn degenerate_rectangle_is_a_point() {
        assert_eq!(rectangle(2, 2, 2, 2, 4), vec![10]);
    }

    #[test]
    fn filled_rectangle_covers_box() {
        assert_eq!(rectangle_filled(2, 0, 1, 1, 4), vec![1, 2, 5, 6]);
    }

    #[test]
    fn circle_params_from_box() {
        assert_eq!(circle_params(0, 0, 4, 4), (2, 2, 2));
        // rx = 1.5 -> cx = round(1.5) = 2, r = round(1.5) = 2
        assert_eq!(circle_params(3, 0, 0, 1), (2, 1, 2));
    }

    #[test]
    fn radius_two_outline() {
        let ring = set(circle(0, 0, 4, 4, 5));
        let expected: BTreeSet<usize> = [
            (2, 0), (2, 4), (0, 2), (4, 2),
            (1, 0), (3, 0), (0, 1), (4, 1),
            (0, 3), (4, 3), (1, 4), (3, 4),
        ]
        .iter()
        .map(|&(x, y)| y * 5 + x)
        .collect();
        assert_eq!(ring, expected);
    }

    #[test]
    fn filled_circle_is_clipped() {
        // center (0,0) radius 1: only the in-grid quarter survives
        let disc = circle_filled(-1, -1, 1, 1, 4);
        assert_eq!(set(disc), set(vec![0, 1, 4]));
    }

    #[test]
    fn filled_circle_contains_outline_interior() {
        let disc = set(circle_filled(0, 0, 6, 6, 7));
        assert!(disc.contains(&(3 * 7 + 3)));
        assert!(!disc.contains(&0));
        assert_eq!(disc.len(), 29);
    }

    #[test]
    fn rasterize_dispatches() {
        assert_eq!(
            ShapeKind::Rectangle.rasterize((0, 0), (1, 1), true, 4),
            rectangle_filled(0, 0, 1, 1, 4)
        );
        assert_eq!(ShapeKind::Line.rasterize((0, 0), (3, 3), true, 4), vec![0, 5, 10, 15]);
    }
}
