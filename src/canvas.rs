use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::color;
use crate::compositor::{Compositor, DirtyRegion};

pub type ItemId = u64;

// ============================================================================
// NODES
// ============================================================================

/// A paintable surface: `size * size` colour tokens, row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub id: ItemId,
    pub name: String,
    pub data: Vec<String>,
    pub visible: bool,
    pub opacity: f64,
}

impl Layer {
    pub fn new(id: ItemId, name: String, len: usize) -> Self {
        Self {
            id,
            name,
            data: vec![String::new(); len],
            visible: true,
            opacity: 1.0,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|c| c.is_empty())
    }
}

fn default_expanded() -> bool {
    true
}

/// A folder of nodes. `children[0]` is the topmost child.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: ItemId,
    pub name: String,
    pub children: Vec<LayerNode>,
    pub visible: bool,
    pub opacity: f64,
    /// Only affects the layers panel.
    #[serde(default = "default_expanded")]
    pub expanded: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerNode {
    Layer(Layer),
    Group(Group),
}

impl LayerNode {
    pub fn id(&self) -> ItemId {
        match self {
            LayerNode::Layer(l) => l.id,
            LayerNode::Group(g) => g.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LayerNode::Layer(l) => &l.name,
            LayerNode::Group(g) => &g.name,
        }
    }

    pub fn visible(&self) -> bool {
        match self {
            LayerNode::Layer(l) => l.visible,
            LayerNode::Group(g) => g.visible,
        }
    }

    pub fn opacity(&self) -> f64 {
        match self {
            LayerNode::Layer(l) => l.opacity,
            LayerNode::Group(g) => g.opacity,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, LayerNode::Group(_))
    }

    pub fn as_layer(&self) -> Option<&Layer> {
        match self {
            LayerNode::Layer(l) => Some(l),
            LayerNode::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            LayerNode::Group(g) => Some(g),
            LayerNode::Layer(_) => None,
        }
    }

    fn set_name(&mut self, name: String) {
        match self {
            LayerNode::Layer(l) => l.name = name,
            LayerNode::Group(g) => g.name = name,
        }
    }

    fn set_visible(&mut self, visible: bool) {
        match self {
            LayerNode::Layer(l) => l.visible = visible,
            LayerNode::Group(g) => g.visible = visible,
        }
    }

    fn set_opacity(&mut self, opacity: f64) {
        match self {
            LayerNode::Layer(l) => l.opacity = opacity,
            LayerNode::Group(g) => g.opacity = opacity,
        }
    }
}

/// A property edit for [`LayerTree::set_property`].
#[derive(Clone, Debug, PartialEq)]
pub enum ItemProperty {
    Name(String),
    Visible(bool),
    Opacity(f64),
    Expanded(bool),
}

impl ItemProperty {
    fn affects_pixels(&self) -> bool {
        matches!(self, ItemProperty::Visible(_) | ItemProperty::Opacity(_))
    }
}

/// Result of [`LayerTree::find_item`].
#[derive(Clone, Copy, Debug)]
pub struct FoundItem<'a> {
    pub node: &'a LayerNode,
    /// Owning group, `None` for top-level nodes.
    pub parent: Option<ItemId>,
    /// Position within the owning child list.
    pub index: usize,
}

/// What `on_update` observers see after each mutation.
#[derive(Clone, Copy, Debug)]
pub struct LayerTreeView<'a> {
    pub nodes: &'a [LayerNode],
    pub active_item_id: Option<ItemId>,
}

pub type UpdateHook = Box<dyn FnMut(&LayerTreeView<'_>)>;

// ============================================================================
// SNAPSHOTS
// ============================================================================

/// Deep copy of a tree, the unit stored in history and project files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(alias = "layers")]
    pub nodes: Vec<LayerNode>,
    /// Required, but may be `null`.
    #[serde(rename = "activeItemId", deserialize_with = "nullable")]
    pub active_item_id: Option<ItemId>,
    #[serde(rename = "nextId", default)]
    pub next_id: Option<ItemId>,
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<ItemId>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<ItemId>::deserialize(deserializer)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SnapshotError {
    Parse(String),
    Empty,
    DuplicateId(ItemId),
    DataLength { id: ItemId, expected: usize, found: usize },
    InvalidOpacity(ItemId),
    DanglingActive(ItemId),
    NoLayers,
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Parse(e) => write!(f, "Malformed snapshot: {}", e),
            SnapshotError::Empty => write!(f, "Snapshot contains no nodes"),
            SnapshotError::DuplicateId(id) => write!(f, "Duplicate node id {}", id),
            SnapshotError::DataLength { id, expected, found } => write!(
                f,
                "Layer {} has {} pixels, expected {}",
                id, found, expected
            ),
            SnapshotError::InvalidOpacity(id) => write!(f, "Node {} has an opacity outside [0, 1]", id),
            SnapshotError::DanglingActive(id) => write!(f, "Active id {} does not exist", id),
            SnapshotError::NoLayers => write!(f, "Snapshot contains no layers"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl From<serde_json::Error> for SnapshotError {
    fn from(e: serde_json::Error) -> Self {
        SnapshotError::Parse(e.to_string())
    }
}

impl Snapshot {
    pub fn from_json(text: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Structural checks against a grid of side `size`. Returns the largest id.
    pub fn validate(&self, size: usize) -> Result<ItemId, SnapshotError> {
        if self.nodes.is_empty() {
            return Err(SnapshotError::Empty);
        }

        let expected = size * size;
        let mut seen = HashSet::new();
        let mut layers = 0usize;
        let mut stack: Vec<&LayerNode> = self.nodes.iter().collect();
        while let Some(node) = stack.pop() {
            let id = node.id();
            if !seen.insert(id) {
                return Err(SnapshotError::DuplicateId(id));
            }
            let opacity = node.opacity();
            if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
                return Err(SnapshotError::InvalidOpacity(id));
            }
            match node {
                LayerNode::Layer(l) => {
                    if l.data.len() != expected {
                        return Err(SnapshotError::DataLength {
                            id,
                            expected,
                            found: l.data.len(),
                        });
                    }
                    layers += 1;
                }
                LayerNode::Group(g) => stack.extend(g.children.iter()),
            }
        }

        if layers == 0 {
            return Err(SnapshotError::NoLayers);
        }
        if let Some(active) = self.active_item_id
            && !seen.contains(&active)
        {
            return Err(SnapshotError::DanglingActive(active));
        }
        Ok(seen.into_iter().max().unwrap_or(0))
    }
}

// ============================================================================
// PATH HELPERS
// ============================================================================

// Nodes are addressed by index paths from the root list, so no reference into
// the tree outlives a single lookup.

fn locate_in(items: &[LayerNode], id: ItemId, path: &mut Vec<usize>) -> bool {
    for (i, item) in items.iter().enumerate() {
        path.push(i);
        if item.id() == id {
            return true;
        }
        if let LayerNode::Group(g) = item
            && locate_in(&g.children, id, path)
        {
            return true;
        }
        path.pop();
    }
    false
}

fn node_at<'a>(nodes: &'a [LayerNode], path: &[usize]) -> Option<&'a LayerNode> {
    let (&first, rest) = path.split_first()?;
    let mut node = nodes.get(first)?;
    for &i in rest {
        node = node.as_group()?.children.get(i)?;
    }
    Some(node)
}

fn node_at_mut<'a>(nodes: &'a mut [LayerNode], path: &[usize]) -> Option<&'a mut LayerNode> {
    let (&first, rest) = path.split_first()?;
    let mut node = nodes.get_mut(first)?;
    for &i in rest {
        node = match node {
            LayerNode::Group(g) => g.children.get_mut(i)?,
            LayerNode::Layer(_) => return None,
        };
    }
    Some(node)
}

/// Child list of the group at `parent_path`, or the root list for `[]`.
fn siblings_mut<'a>(nodes: &'a mut Vec<LayerNode>, parent_path: &[usize]) -> Option<&'a mut Vec<LayerNode>> {
    let mut current = nodes;
    for &i in parent_path {
        current = match current.get_mut(i)? {
            LayerNode::Group(g) => &mut g.children,
            LayerNode::Layer(_) => return None,
        };
    }
    Some(current)
}

fn contains_layer(items: &[LayerNode]) -> bool {
    items.iter().any(|n| match n {
        LayerNode::Layer(_) => true,
        LayerNode::Group(g) => contains_layer(&g.children),
    })
}

fn max_id(items: &[LayerNode]) -> ItemId {
    items
        .iter()
        .map(|n| match n {
            LayerNode::Layer(l) => l.id,
            LayerNode::Group(g) => g.id.max(max_id(&g.children)),
        })
        .max()
        .unwrap_or(0)
}

fn reassign_ids(node: &mut LayerNode, next_id: &mut ItemId) {
    let fresh = *next_id;
    *next_id += 1;
    match node {
        LayerNode::Layer(l) => l.id = fresh,
        LayerNode::Group(g) => {
            g.id = fresh;
            for child in &mut g.children {
                reassign_ids(child, next_id);
            }
        }
    }
}

// ============================================================================
// LAYER TREE
// ============================================================================

/// The document: an ordered tree of layers and groups plus its composite cache.
pub struct LayerTree {
    nodes: Vec<LayerNode>,
    active_item_id: Option<ItemId>,
    next_id: ItemId,
    size: usize,
    compositor: Compositor,
    on_update: Option<UpdateHook>,
}

impl fmt::Debug for LayerTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerTree")
            .field("size", &self.size)
            .field("nodes", &self.nodes.len())
            .field("active_item_id", &self.active_item_id)
            .field("next_id", &self.next_id)
            .finish()
    }
}

impl LayerTree {
    /// A tree of side `size` holding one blank layer.
    pub fn new(size: usize) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            active_item_id: None,
            next_id: 1,
            size,
            compositor: Compositor::new(),
            on_update: None,
        };
        tree.init(size);
        tree
    }

    /// Reset to a single blank layer on a grid of side `size`.
    pub fn init(&mut self, size: usize) {
        self.nodes.clear();
        self.active_item_id = None;
        self.next_id = 1;
        self.size = size;
        let id = self.insert_new_layer();
        self.active_item_id = Some(id);
        self.compositor.mark_dirty(None);
        self.notify();
    }

    pub fn set_on_update(&mut self, hook: impl FnMut(&LayerTreeView<'_>) + 'static) {
        self.on_update = Some(Box::new(hook));
    }

    fn notify(&mut self) {
        // Taken out for the call so the hook never observes a half-borrowed tree.
        if let Some(mut hook) = self.on_update.take() {
            hook(&LayerTreeView {
                nodes: &self.nodes,
                active_item_id: self.active_item_id,
            });
            self.on_update = Some(hook);
        }
    }

    fn alloc_id(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // --- Accessors ---

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn nodes(&self) -> &[LayerNode] {
        &self.nodes
    }

    pub fn active_item_id(&self) -> Option<ItemId> {
        self.active_item_id
    }

    pub fn next_id(&self) -> ItemId {
        self.next_id
    }

    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    fn locate(&self, id: ItemId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        locate_in(&self.nodes, id, &mut path).then_some(path)
    }

    /// Depth-first lookup returning the node and where it lives.
    pub fn find_item(&self, id: ItemId) -> Option<FoundItem<'_>> {
        let path = self.locate(id)?;
        let (index, parent_path) = path.split_last()?;
        let parent = if parent_path.is_empty() {
            None
        } else {
            node_at(&self.nodes, parent_path).map(LayerNode::id)
        };
        Some(FoundItem {
            node: node_at(&self.nodes, &path)?,
            parent,
            index: *index,
        })
    }

    pub fn active_node(&self) -> Option<&LayerNode> {
        self.find_item(self.active_item_id?).map(|f| f.node)
    }

    /// The active node if it is a layer.
    pub fn active_layer(&self) -> Option<&Layer> {
        self.active_node()?.as_layer()
    }

    fn active_layer_mut(&mut self) -> Option<&mut Layer> {
        let path = self.locate(self.active_item_id?)?;
        match node_at_mut(&mut self.nodes, &path)? {
            LayerNode::Layer(l) => Some(l),
            LayerNode::Group(_) => None,
        }
    }

    /// Every layer in pre-order.
    pub fn layers(&self) -> Vec<&Layer> {
        fn walk<'a>(items: &'a [LayerNode], out: &mut Vec<&'a Layer>) {
            for item in items {
                match item {
                    LayerNode::Layer(l) => out.push(l),
                    LayerNode::Group(g) => walk(&g.children, out),
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.nodes, &mut out);
        out
    }

    // --- Structure ---

    fn insert_new_layer(&mut self) -> ItemId {
        let id = self.alloc_id();
        let layer = Layer::new(id, format!("Layer {}", id), self.size * self.size);
        self.insert_adjacent(LayerNode::Layer(layer), true);
        id
    }

    /// Put `node` after the active node, or at the front of the active group
    /// when it is expanded and `into_expanded` is set. With nothing active it
    /// goes to the top of the root list.
    fn insert_adjacent(&mut self, node: LayerNode, into_expanded: bool) {
        let Some(path) = self.active_item_id.and_then(|id| self.locate(id)) else {
            self.nodes.insert(0, node);
            return;
        };

        if into_expanded
            && let Some(LayerNode::Group(g)) = node_at_mut(&mut self.nodes, &path)
            && g.expanded
        {
            g.children.insert(0, node);
            return;
        }

        let Some((index, parent_path)) = path.split_last() else {
            self.nodes.insert(0, node);
            return;
        };
        match siblings_mut(&mut self.nodes, parent_path) {
            Some(siblings) => siblings.insert(index + 1, node),
            None => self.nodes.insert(0, node),
        }
    }

    pub fn add_layer(&mut self) -> ItemId {
        let id = self.insert_new_layer();
        self.active_item_id = Some(id);
        self.compositor.mark_dirty(None);
        self.notify();
        id
    }

    pub fn add_group(&mut self) -> ItemId {
        let id = self.alloc_id();
        let group = Group {
            id,
            name: format!("Group {}", id),
            children: Vec::new(),
            visible: true,
            opacity: 1.0,
            expanded: true,
        };
        self.insert_adjacent(LayerNode::Group(group), false);
        self.active_item_id = Some(id);
        self.notify();
        id
    }

    /// Remove the active node and its subtree. The node that slid into its
    /// place becomes active, else the one above it, else the parent group.
    /// A blank layer is synthesized if no layer would remain.
    pub fn delete_active(&mut self) -> Option<ItemId> {
        let id = self.active_item_id?;
        let path = self.locate(id)?;
        let (&index, parent_path) = path.split_last()?;
        let parent_id = node_at(&self.nodes, parent_path).map(LayerNode::id);

        let next_active = {
            let siblings = siblings_mut(&mut self.nodes, parent_path)?;
            siblings.remove(index);
            let siblings: &[LayerNode] = siblings;
            siblings
                .get(index)
                .or_else(|| index.checked_sub(1).and_then(|i| siblings.get(i)))
                .map(LayerNode::id)
                .or(parent_id)
        };
        self.active_item_id = next_active;

        if !contains_layer(&self.nodes) {
            let fresh = self.insert_new_layer();
            self.active_item_id = Some(fresh);
        }

        self.compositor.mark_dirty(None);
        self.notify();
        Some(id)
    }

    /// Make `id` active. Unknown ids are ignored.
    pub fn select_item(&mut self, id: ItemId) -> bool {
        if self.locate(id).is_none() {
            return false;
        }
        self.active_item_id = Some(id);
        self.notify();
        true
    }

    pub fn deselect(&mut self) {
        self.active_item_id = None;
        self.notify();
    }

    /// Edit one property. Only visibility and opacity dirty the composite.
    pub fn set_property(&mut self, id: ItemId, property: ItemProperty) -> bool {
        let Some(path) = self.locate(id) else {
            return false;
        };
        let affects_pixels = property.affects_pixels();
        {
            let Some(node) = node_at_mut(&mut self.nodes, &path) else {
                return false;
            };
            match property {
                ItemProperty::Name(name) => node.set_name(name),
                ItemProperty::Visible(v) => node.set_visible(v),
                ItemProperty::Opacity(o) => {
                    if !o.is_finite() {
                        return false;
                    }
                    node.set_opacity(o.clamp(0.0, 1.0));
                }
                ItemProperty::Expanded(e) => match node {
                    LayerNode::Group(g) => g.expanded = e,
                    LayerNode::Layer(_) => return false,
                },
            }
        }
        if affects_pixels {
            self.compositor.mark_dirty(None);
        }
        self.notify();
        true
    }

    /// Deep copy of the active node with fresh ids, placed above the source.
    pub fn duplicate_active(&mut self) -> Option<ItemId> {
        let path = self.locate(self.active_item_id?)?;
        let mut copy = node_at(&self.nodes, &path)?.clone();
        reassign_ids(&mut copy, &mut self.next_id);
        copy.set_name(format!("{} copy", copy.name()));
        let new_id = copy.id();

        let (&index, parent_path) = path.split_last()?;
        siblings_mut(&mut self.nodes, parent_path)?.insert(index, copy);

        self.active_item_id = Some(new_id);
        self.compositor.mark_dirty(None);
        self.notify();
        Some(new_id)
    }

    /// Flatten the active layer into the layer directly below it. A hidden
    /// top layer contributes nothing and is simply removed.
    pub fn merge_down(&mut self) -> bool {
        let Some(path) = self.active_item_id.and_then(|id| self.locate(id)) else {
            return false;
        };
        let Some((&index, parent_path)) = path.split_last() else {
            return false;
        };
        let Some(siblings) = siblings_mut(&mut self.nodes, parent_path) else {
            return false;
        };
        if !matches!(
            (siblings.get(index), siblings.get(index + 1)),
            (Some(LayerNode::Layer(_)), Some(LayerNode::Layer(_)))
        ) {
            return false;
        }

        let top = siblings.remove(index);
        let merged_into = match (top, siblings.get_mut(index)) {
            (LayerNode::Layer(top), Some(LayerNode::Layer(bottom))) => {
                if top.visible {
                    for (dst, src) in bottom.data.iter_mut().zip(&top.data) {
                        if src.is_empty() {
                            continue;
                        }
                        *dst = if top.opacity >= 1.0 {
                            src.clone()
                        } else {
                            color::composite(src, dst, top.opacity)
                        };
                    }
                }
                bottom.id
            }
            _ => return false,
        };

        self.active_item_id = Some(merged_into);
        self.compositor.mark_dirty(None);
        self.notify();
        true
    }

    /// Swap the active node with its upper neighbour.
    pub fn move_active_up(&mut self) -> bool {
        self.shift_active(-1)
    }

    pub fn move_active_down(&mut self) -> bool {
        self.shift_active(1)
    }

    fn shift_active(&mut self, delta: isize) -> bool {
        let Some(path) = self.active_item_id.and_then(|id| self.locate(id)) else {
            return false;
        };
        let Some((&index, parent_path)) = path.split_last() else {
            return false;
        };
        let Some(siblings) = siblings_mut(&mut self.nodes, parent_path) else {
            return false;
        };
        let Some(target) = index.checked_add_signed(delta).filter(|&t| t < siblings.len()) else {
            return false;
        };
        siblings.swap(index, target);
        self.compositor.mark_dirty(None);
        self.notify();
        true
    }

    /// Reparent `id` under `new_parent` (a group, or the root for `None`) at
    /// `index`, clamped to the destination length. Moving a group into itself
    /// or one of its descendants is refused.
    pub fn move_item(&mut self, id: ItemId, new_parent: Option<ItemId>, index: usize) -> bool {
        let Some(source_path) = self.locate(id) else {
            return false;
        };
        if let Some(parent_id) = new_parent {
            let Some(parent_path) = self.locate(parent_id) else {
                return false;
            };
            if parent_path.starts_with(&source_path) {
                return false;
            }
            if !matches!(node_at(&self.nodes, &parent_path), Some(LayerNode::Group(_))) {
                return false;
            }
        }

        let Some((&old_index, old_parent)) = source_path.split_last() else {
            return false;
        };
        let Some(node) = siblings_mut(&mut self.nodes, old_parent).map(|s| s.remove(old_index)) else {
            return false;
        };

        // Paths may have shifted after the removal.
        let destination = match new_parent {
            None => Some(Vec::new()),
            Some(parent_id) => self.locate(parent_id),
        };
        let target = destination.as_deref().and_then(|p| siblings_mut(&mut self.nodes, p));
        match target {
            Some(children) => {
                let at = index.min(children.len());
                children.insert(at, node);
            }
            None => {
                // Unreachable after the checks above; put it back.
                if let Some(siblings) = siblings_mut(&mut self.nodes, old_parent) {
                    siblings.insert(old_index, node);
                }
                return false;
            }
        }

        self.compositor.mark_dirty(None);
        self.notify();
        true
    }

    // --- Pixels ---

    /// Write one pixel of the active layer. Ignored unless a layer is active
    /// and the index is on the grid.
    pub fn write(&mut self, index: usize, color: &str) -> bool {
        let size = self.size;
        {
            let Some(layer) = self.active_layer_mut() else {
                return false;
            };
            let Some(px) = layer.data.get_mut(index) else {
                return false;
            };
            *px = color.to_string();
        }
        self.compositor.mark_dirty(DirtyRegion::point(index, size));
        true
    }

    /// Write the same colour at every in-range index.
    pub fn write_many(&mut self, indices: &[usize], color: &str) -> bool {
        let region = DirtyRegion::from_indices(indices, self.size);
        {
            let Some(layer) = self.active_layer_mut() else {
                return false;
            };
            for &i in indices {
                if let Some(px) = layer.data.get_mut(i) {
                    *px = color.to_string();
                }
            }
        }
        if region.is_some() {
            self.compositor.mark_dirty(region);
        }
        true
    }

    /// Replace the active layer's whole buffer. The length must match.
    pub fn set_layer_data(&mut self, data: Vec<String>) -> bool {
        {
            let Some(layer) = self.active_layer_mut() else {
                return false;
            };
            if layer.data.len() != data.len() {
                return false;
            }
            layer.data = data;
        }
        self.compositor.mark_dirty(None);
        true
    }

    /// Blank the active layer.
    pub fn clear_active(&mut self) -> bool {
        {
            let Some(layer) = self.active_layer_mut() else {
                return false;
            };
            layer.data.iter_mut().for_each(String::clear);
        }
        self.compositor.mark_dirty(None);
        self.notify();
        true
    }

    // --- Composite / snapshots ---

    pub fn composite(&mut self) -> &[String] {
        self.compositor.composite(&self.nodes)
    }

    pub fn mark_dirty(&mut self, region: Option<DirtyRegion>) {
        self.compositor.mark_dirty(region);
    }

    pub fn get_snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.clone(),
            active_item_id: self.active_item_id,
            next_id: Some(self.next_id),
        }
    }

    /// Replace the whole tree. The snapshot is validated first and the live
    /// tree is left untouched on error.
    pub fn load_snapshot(&mut self, snapshot: Snapshot) -> Result<(), SnapshotError> {
        let highest = match snapshot.validate(self.size) {
            Ok(max) => max,
            Err(e) => {
                log_warn!("Rejected snapshot: {}", e);
                return Err(e);
            }
        };

        let floor = highest + 1;
        self.next_id = match snapshot.next_id {
            Some(n) if n >= floor => n,
            Some(n) => {
                log_info!("Snapshot nextId {} raised to {}", n, floor);
                floor
            }
            None => floor,
        };
        self.nodes = snapshot.nodes;
        self.active_item_id = snapshot.active_item_id;
        self.compositor.mark_dirty(None);
        self.notify();
        Ok(())
    }

    pub fn highest_id(&self) -> ItemId {
        max_id(&self.nodes)
    }
}
