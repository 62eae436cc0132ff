//! Region tools: bucket fill, magic-wand selection, eyedropper.
//!
//! Both region tools walk the grid breadth-first with 4-connectivity and
//! compare tokens for exact equality against the seed's colour, captured once
//! before anything is written.

use std::collections::VecDeque;

/// Axis-aligned, inclusive selection rectangle in grid coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRect {
    pub x1: usize,
    pub y1: usize,
    pub x2: usize,
    pub y2: usize,
}

impl SelectionRect {
    /// Normalize two drag corners.
    pub fn from_corners(a: (usize, usize), b: (usize, usize)) -> Self {
        Self {
            x1: a.0.min(b.0),
            y1: a.1.min(b.1),
            x2: a.0.max(b.0),
            y2: a.1.max(b.1),
        }
    }

    pub fn width(&self) -> usize {
        self.x2 - self.x1 + 1
    }

    pub fn height(&self) -> usize {
        self.y2 - self.y1 + 1
    }

    /// Row-major indices covered by the rectangle.
    pub fn indices(&self, size: usize) -> Vec<usize> {
        (self.y1..=self.y2)
            .flat_map(|y| (self.x1..=self.x2).map(move |x| y * size + x))
            .filter(|&i| i < size * size)
            .collect()
    }
}

/// Breadth-first walk over the 4-connected region sharing the seed's token.
/// Returns indices in visit order; empty when `start` is off the buffer.
fn connected_region(data: &[String], size: usize, start: usize) -> Vec<usize> {
    let len = size * size;
    if start >= len || start >= data.len() {
        return Vec::new();
    }

    let target = data[start].as_str();
    let mut visited = vec![false; len];
    let mut queue = VecDeque::new();
    let mut region = Vec::new();

    visited[start] = true;
    queue.push_back(start);

    while let Some(idx) = queue.pop_front() {
        region.push(idx);

        let x = idx % size;
        let y = idx / size;

        let mut neighbors = [None; 4];
        if y > 0 {
            neighbors[0] = Some(idx - size);
        }
        if y + 1 < size {
            neighbors[1] = Some(idx + size);
        }
        if x > 0 {
            neighbors[2] = Some(idx - 1);
        }
        if x + 1 < size {
            neighbors[3] = Some(idx + 1);
        }

        for ni in neighbors.into_iter().flatten() {
            if !visited[ni] && data[ni] == target {
                visited[ni] = true;
                queue.push_back(ni);
            }
        }
    }

    region
}

/// Bucket fill from `start` with `new_color`, in place.
///
/// Returns the filled indices. Filling a pixel that already holds
/// `new_color` is a no-op and returns an empty list.
pub fn flood_fill(data: &mut [String], size: usize, start: usize, new_color: &str) -> Vec<usize> {
    match data.get(start) {
        Some(current) if current != new_color => {}
        _ => return Vec::new(),
    }

    // The walk reads the untouched buffer, so every comparison sees the
    // original colour.
    let region = connected_region(data, size, start);
    for &i in &region {
        data[i] = new_color.to_string();
    }
    region
}

/// Same walk as [`flood_fill`] without writing: the selected region.
pub fn magic_wand(data: &[String], size: usize, start: usize) -> Vec<usize> {
    connected_region(data, size, start)
}

/// Colour under `index` in the composite, or `None` for transparent/off-grid.
pub fn eyedropper(composite: &[String], index: usize) -> Option<&str> {
    composite
        .get(index)
        .map(String::as_str)
        .filter(|c| !c.is_empty())
}

/// Bounding rectangle of a set of indices.
pub fn selection_bounds(indices: &[usize], size: usize) -> Option<SelectionRect> {
    if size == 0 {
        return None;
    }
    let mut iter = indices.iter().map(|&i| (i % size, i / size));
    let (x, y) = iter.next()?;
    let init = SelectionRect { x1: x, y1: y, x2: x, y2: y };
    Some(iter.fold(init, |r, (x, y)| SelectionRect {
        x1: r.x1.min(x),
        y1: r.y1.min(y),
        x2: r.x2.max(x),
        y2: r.y2.max(y),
    }))
}

/// Keep only the cells of a checkerboard, `(x + y)` even.
pub fn dither_mask(indices: &[usize], size: usize) -> Vec<usize> {
    if size == 0 {
        return Vec::new();
    }
    indices
        .iter()
        .copied()
        .filter(|&i| (i % size + i / size) % 2 == 0)
        .collect()
}
