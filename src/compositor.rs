//! Flattens the layer tree into one colour buffer, memoized behind a dirty
//! flag. Invalidation can be full or limited to a rectangle; a rectangular
//! invalidation only re-derives the pixels inside it.

use crate::canvas::LayerNode;
use crate::color;

/// Inclusive pixel rectangle that needs recompositing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DirtyRegion {
    pub min_x: usize,
    pub min_y: usize,
    pub max_x: usize,
    pub max_y: usize,
}

impl DirtyRegion {
    pub fn point(index: usize, size: usize) -> Option<Self> {
        if size == 0 {
            return None;
        }
        let (x, y) = (index % size, index / size);
        Some(Self { min_x: x, min_y: y, max_x: x, max_y: y })
    }

    /// Bounding box of every in-grid index; `None` when nothing is in range.
    pub fn from_indices(indices: &[usize], size: usize) -> Option<Self> {
        indices
            .iter()
            .filter(|&&i| i < size * size)
            .filter_map(|&i| Self::point(i, size))
            .reduce(Self::union)
    }

    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    fn indices(&self, size: usize) -> impl Iterator<Item = usize> + '_ {
        let max_x = self.max_x.min(size.saturating_sub(1));
        let max_y = self.max_y.min(size.saturating_sub(1));
        (self.min_y..=max_y).flat_map(move |y| (self.min_x..=max_x).map(move |x| y * size + x))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CacheState {
    Valid,
    Region(DirtyRegion),
    Full,
}

/// A visible layer reduced to its pixels and effective opacity.
#[derive(Clone, Copy, Debug)]
pub struct FlatLayer<'a> {
    pub id: u64,
    pub data: &'a [String],
    pub opacity: f64,
}

/// Visible layers in paint order (bottom first).
///
/// The tree is walked pre-order; an invisible node prunes its subtree and each
/// layer carries the product of its own and its ancestors' opacities. The list
/// is then reversed, because index 0 of a child list is the topmost node.
pub fn flatten_visible(nodes: &[LayerNode]) -> Vec<FlatLayer<'_>> {
    fn walk<'a>(items: &'a [LayerNode], parent_opacity: f64, out: &mut Vec<FlatLayer<'a>>) {
        for item in items {
            if !item.visible() {
                continue;
            }
            let opacity = parent_opacity * item.opacity();
            match item {
                LayerNode::Layer(layer) => out.push(FlatLayer {
                    id: layer.id,
                    data: &layer.data,
                    opacity,
                }),
                LayerNode::Group(group) => walk(&group.children, opacity, out),
            }
        }
    }

    let mut flat = Vec::new();
    walk(nodes, 1.0, &mut flat);
    flat.reverse();
    flat
}

/// Length of the first layer found anywhere in the tree (pre-order).
pub fn buffer_len(nodes: &[LayerNode]) -> usize {
    for node in nodes {
        match node {
            LayerNode::Layer(layer) => return layer.data.len(),
            LayerNode::Group(group) => {
                let len = buffer_len(&group.children);
                if len > 0 {
                    return len;
                }
            }
        }
    }
    0
}

/// Final colour of pixel `j` after stacking `layers` bottom to top.
fn compose_pixel(layers: &[FlatLayer<'_>], j: usize) -> String {
    let mut acc = String::new();
    for layer in layers {
        let Some(px) = layer.data.get(j) else { continue };
        if px.is_empty() {
            continue;
        }
        acc = if layer.opacity >= 1.0 {
            px.clone()
        } else {
            color::composite(px, &acc, layer.opacity)
        };
    }
    acc
}

fn square_side(len: usize) -> Option<usize> {
    let side = (len as f64).sqrt().round() as usize;
    (side * side == len).then_some(side)
}

/// Memoized composite of a layer tree.
pub struct Compositor {
    buffer: Vec<String>,
    state: CacheState,
    recomputes: u64,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            state: CacheState::Full,
            recomputes: 0,
        }
    }

    /// Invalidate the cache. `None` means everything; regions accumulate.
    pub fn mark_dirty(&mut self, region: Option<DirtyRegion>) {
        self.state = match (self.state, region) {
            (_, None) | (CacheState::Full, _) => CacheState::Full,
            (CacheState::Valid, Some(r)) => CacheState::Region(r),
            (CacheState::Region(existing), Some(r)) => CacheState::Region(existing.union(r)),
        };
    }

    pub fn is_dirty(&self) -> bool {
        self.state != CacheState::Valid
    }

    /// Pending rectangle, if the invalidation is partial.
    pub fn dirty_region(&self) -> Option<DirtyRegion> {
        match self.state {
            CacheState::Region(r) => Some(r),
            _ => None,
        }
    }

    /// How many times the buffer has been (re)computed.
    pub fn recompute_count(&self) -> u64 {
        self.recomputes
    }

    /// The flattened image, recomputed only if something was invalidated.
    pub fn composite(&mut self, nodes: &[LayerNode]) -> &[String] {
        match self.state {
            CacheState::Valid => {}
            CacheState::Region(region) => {
                let len = buffer_len(nodes);
                match square_side(len) {
                    Some(size) if self.buffer.len() == len => {
                        let layers = flatten_visible(nodes);
                        for j in region.indices(size) {
                            self.buffer[j] = compose_pixel(&layers, j);
                        }
                        self.finish();
                    }
                    _ => self.render_full(nodes),
                }
            }
            CacheState::Full => self.render_full(nodes),
        }
        &self.buffer
    }

    fn render_full(&mut self, nodes: &[LayerNode]) {
        let len = buffer_len(nodes);
        let layers = flatten_visible(nodes);
        self.buffer = (0..len).map(|j| compose_pixel(&layers, j)).collect();
        self.finish();
    }

    fn finish(&mut self) {
        self.state = CacheState::Valid;
        self.recomputes += 1;
    }
}
