//! Editor controller: turns pointer gestures and menu commands into tree
//! mutations and history entries.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::canvas::{ItemId, ItemProperty, LayerTree, Snapshot};
use crate::components::history::HistoryManager;
use crate::io::ProjectError;
use crate::ops::{self, SelectionRect, ShapeKind};
use crate::project::Project;
use crate::settings::{EditorSettings, MAX_GRID_SIZE};

// ============================================================================
// TOOLS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tool {
    Brush,
    Eraser,
    DitherBrush,
    Fill,
    Eyedropper,
    MagicWand,
    Marquee,
    Shape(ShapeKind),
}

impl Tool {
    pub fn all() -> &'static [Tool] {
        &[
            Tool::Brush,
            Tool::Eraser,
            Tool::DitherBrush,
            Tool::Fill,
            Tool::Eyedropper,
            Tool::MagicWand,
            Tool::Marquee,
            Tool::Shape(ShapeKind::Line),
            Tool::Shape(ShapeKind::Rectangle),
            Tool::Shape(ShapeKind::Circle),
        ]
    }

    /// Stable identifier used in settings and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Brush => "brush",
            Tool::Eraser => "eraser",
            Tool::DitherBrush => "dither-brush",
            Tool::Fill => "fill",
            Tool::Eyedropper => "eyedropper",
            Tool::MagicWand => "magic-wand",
            Tool::Marquee => "marquee",
            Tool::Shape(ShapeKind::Line) => "line",
            Tool::Shape(ShapeKind::Rectangle) => "rectangle",
            Tool::Shape(ShapeKind::Circle) => "circle",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        let name = name.trim().to_ascii_lowercase();
        let name = name.strip_prefix("tool-").unwrap_or(&name);
        match name {
            "shape" | "rect" => Some(Tool::Shape(ShapeKind::Rectangle)),
            "dither" => Some(Tool::DitherBrush),
            "wand" => Some(Tool::MagicWand),
            other => Tool::all().iter().copied().find(|t| t.name() == other),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "Brush Tool",
            Tool::Eraser => "Eraser Tool",
            Tool::DitherBrush => "Dither Brush",
            Tool::Fill => "Fill Bucket",
            Tool::Eyedropper => "Eyedropper",
            Tool::MagicWand => "Magic Wand",
            Tool::Marquee => "Marquee Select",
            Tool::Shape(kind) => kind.label(),
        }
    }

    fn is_brush(&self) -> bool {
        matches!(self, Tool::Brush | Tool::Eraser | Tool::DitherBrush)
    }
}

/// Pixels lifted from the active layer by copy/cut.
#[derive(Clone, Debug, PartialEq)]
pub struct Clipboard {
    pub width: usize,
    pub height: usize,
    /// Row-major, `width * height` tokens.
    pub data: Vec<String>,
}

#[derive(Clone, Copy, Debug)]
struct Gesture {
    start: (i32, i32),
    last: (i32, i32),
}

// ============================================================================
// EDITOR
// ============================================================================

pub struct Editor {
    project: Project,
    settings: EditorSettings,
    tool: Tool,
    color: String,
    /// Shape tools draw filled primitives while set.
    filled_shapes: bool,
    selection: Option<SelectionRect>,
    clipboard: Option<Clipboard>,
    recent_colors: Vec<String>,
    gesture: Option<Gesture>,
    shape_preview: Vec<usize>,
    status: String,
    untitled_counter: usize,
}

impl Editor {
    pub fn new(settings: EditorSettings) -> Self {
        let project = Project::new_untitled(1, settings.default_grid_size, settings.max_undo_steps);
        Self::with_project(project, settings)
    }

    pub fn with_project(project: Project, settings: EditorSettings) -> Self {
        let tool = Tool::from_name(&settings.last_active_tool).unwrap_or(Tool::Brush);
        Self {
            project,
            settings,
            tool,
            color: "#000000".to_string(),
            filled_shapes: false,
            selection: None,
            clipboard: None,
            recent_colors: Vec::new(),
            gesture: None,
            shape_preview: Vec::new(),
            status: tool.label().to_string(),
            untitled_counter: 1,
        }
    }

    // --- Accessors ---

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn tree(&self) -> &LayerTree {
        &self.project.tree
    }

    pub fn history(&self) -> &HistoryManager<Snapshot> {
        &self.project.history
    }

    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    pub fn size(&self) -> usize {
        self.project.tree.size()
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn selection(&self) -> Option<SelectionRect> {
        self.selection
    }

    pub fn clipboard(&self) -> Option<&Clipboard> {
        self.clipboard.as_ref()
    }

    pub fn recent_colors(&self) -> &[String] {
        &self.recent_colors
    }

    /// Last transient message, or the tool label.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Cells the in-progress shape would cover; not yet in any layer.
    pub fn shape_preview(&self) -> &[usize] {
        &self.shape_preview
    }

    pub fn composite(&mut self) -> &[String] {
        self.project.tree.composite()
    }

    // --- Tool state ---

    pub fn set_tool(&mut self, tool: Tool) {
        self.cancel_gesture();
        self.tool = tool;
        self.settings.last_active_tool = tool.name().to_string();
        self.status = tool.label().to_string();
        if tool != Tool::Marquee {
            self.selection = None;
        }
    }

    pub fn set_color(&mut self, token: &str) {
        self.color = token.to_string();
    }

    pub fn set_filled_shapes(&mut self, filled: bool) {
        self.filled_shapes = filled;
    }

    /// Most recent first, no case-insensitive duplicates, transparent ignored.
    pub fn add_recent_color(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        let lowered = token.to_lowercase();
        self.recent_colors.retain(|c| c.to_lowercase() != lowered);
        self.recent_colors.insert(0, token.to_string());
        self.recent_colors.truncate(self.settings.recent_colors_limit);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    fn set_status(&mut self, msg: &str) {
        self.status = msg.to_string();
    }

    fn in_grid(&self, x: i32, y: i32) -> Option<usize> {
        ops::grid_index(x, y, self.size())
    }

    fn active_layer_data(&self) -> Option<&[String]> {
        self.project.tree.active_layer().map(|l| l.data.as_slice())
    }

    // --- History plumbing ---

    fn push_history_now(&mut self) {
        let snapshot = self.project.tree.get_snapshot();
        self.project.history.push_state(snapshot);
        self.project.mark_dirty();
    }

    fn push_history_debounced(&mut self) {
        let snapshot = self.project.tree.get_snapshot();
        let delay = Duration::from_millis(self.settings.stroke_debounce_ms);
        self.project.history.push_state_debounced(snapshot, delay);
        self.project.mark_dirty();
    }

    /// Drive the debounced history commit. Call regularly (e.g. per frame).
    pub fn tick(&mut self) -> bool {
        self.project.history.poll()
    }

    pub fn tick_at(&mut self, now: Instant) -> bool {
        self.project.history.poll_at(now)
    }

    fn restore(&mut self, snapshot: Option<Snapshot>) -> bool {
        let Some(snapshot) = snapshot else { return false };
        self.cancel_gesture();
        match self.project.tree.load_snapshot(snapshot) {
            Ok(()) => {
                self.project.mark_dirty();
                true
            }
            Err(e) => {
                log_err!("History entry failed to load: {}", e);
                false
            }
        }
    }

    /// Step back one entry. A stroke still waiting on its debounce is
    /// committed first so it is the thing undone.
    pub fn undo(&mut self) -> bool {
        self.project.history.flush();
        let snapshot = self.project.history.undo().cloned();
        self.restore(snapshot)
    }

    pub fn redo(&mut self) -> bool {
        self.project.history.flush();
        let snapshot = self.project.history.redo().cloned();
        self.restore(snapshot)
    }

    pub fn jump_to_state(&mut self, index: usize) -> bool {
        self.project.history.flush();
        let snapshot = self.project.history.jump_to_state(index).cloned();
        self.restore(snapshot)
    }

    // --- Gestures ---

    fn cancel_gesture(&mut self) {
        self.gesture = None;
        self.shape_preview.clear();
    }

    /// Pointer down at grid cell `(x, y)`. Off-grid presses are ignored.
    pub fn begin_stroke(&mut self, x: i32, y: i32) -> bool {
        let Some(index) = self.in_grid(x, y) else {
            return false;
        };
        self.cancel_gesture();
        let size = self.size();

        match self.tool {
            Tool::Brush | Tool::Eraser | Tool::DitherBrush => {
                self.paint(&[index]);
            }
            Tool::Fill => {
                self.fill_at(index);
                return true;
            }
            Tool::Eyedropper => {
                let picked = ops::eyedropper(self.project.tree.composite(), index).map(str::to_string);
                if let Some(c) = picked {
                    self.set_color(&c);
                    self.add_recent_color(&c);
                    self.set_status(&format!("Picked {}", c));
                }
                return true;
            }
            Tool::MagicWand => {
                if let Some(data) = self.active_layer_data() {
                    let region = ops::magic_wand(data, size, index);
                    self.selection = ops::selection_bounds(&region, size);
                }
                return true;
            }
            Tool::Marquee => {
                let corner = (x as usize, y as usize);
                self.selection = Some(SelectionRect::from_corners(corner, corner));
            }
            Tool::Shape(kind) => {
                self.shape_preview = kind.rasterize((x, y), (x, y), self.filled_shapes, size);
            }
        }

        self.gesture = Some(Gesture {
            start: (x, y),
            last: (x, y),
        });
        true
    }

    /// Pointer moved to `(x, y)` with the button held.
    pub fn continue_stroke(&mut self, x: i32, y: i32) -> bool {
        let Some(mut gesture) = self.gesture else {
            return false;
        };
        if self.in_grid(x, y).is_none() {
            return false;
        }
        let size = self.size();

        match self.tool {
            tool if tool.is_brush() => {
                let (lx, ly) = gesture.last;
                let segment = ops::line(lx, ly, x, y, size);
                self.paint(&segment);
            }
            Tool::Marquee => {
                let (sx, sy) = gesture.start;
                self.selection = Some(SelectionRect::from_corners(
                    (sx as usize, sy as usize),
                    (x as usize, y as usize),
                ));
            }
            Tool::Shape(kind) => {
                self.shape_preview = kind.rasterize(gesture.start, (x, y), self.filled_shapes, size);
            }
            _ => return false,
        }

        gesture.last = (x, y);
        self.gesture = Some(gesture);
        true
    }

    /// Pointer released. Brush and shape gestures become one history entry
    /// once the stroke debounce elapses.
    pub fn end_stroke(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };

        match self.tool {
            tool if tool.is_brush() => {
                self.push_history_debounced();
                let color = self.color.clone();
                self.add_recent_color(&color);
            }
            Tool::Shape(kind) => {
                let indices = std::mem::take(&mut self.shape_preview);
                let color = self.color.clone();
                if self.project.tree.write_many(&indices, &color) {
                    self.push_history_debounced();
                    self.add_recent_color(&color);
                    log_info!(
                        "{} {:?} -> {:?}, {} cells",
                        kind.label(),
                        gesture.start,
                        gesture.last,
                        indices.len()
                    );
                }
            }
            _ => {}
        }
        true
    }

    fn paint(&mut self, indices: &[usize]) {
        let color = match self.tool {
            Tool::Eraser => String::new(),
            _ => self.color.clone(),
        };
        if self.tool == Tool::DitherBrush {
            let masked = ops::dither_mask(indices, self.size());
            self.project.tree.write_many(&masked, &color);
        } else {
            self.project.tree.write_many(indices, &color);
        }
    }

    fn fill_at(&mut self, index: usize) {
        let size = self.size();
        let Some(mut data) = self.active_layer_data().map(<[String]>::to_vec) else {
            return;
        };
        let filled = ops::flood_fill(&mut data, size, index, &self.color);
        if filled.is_empty() {
            return;
        }
        self.project.tree.write_many(&filled, &self.color);
        self.push_history_now();
    }

    // --- Clipboard ---

    pub fn copy(&mut self) -> bool {
        let Some(rect) = self.selection else { return false };
        let size = self.size();
        let Some(data) = self.active_layer_data() else { return false };
        let pixels = rect
            .indices(size)
            .into_iter()
            .map(|i| data[i].clone())
            .collect();
        self.clipboard = Some(Clipboard {
            width: rect.width(),
            height: rect.height(),
            data: pixels,
        });
        self.set_status("Selection Copied");
        true
    }

    pub fn cut(&mut self) -> bool {
        if !self.copy() {
            return false;
        }
        let Some(rect) = self.selection.take() else { return false };
        let indices = rect.indices(self.size());
        self.project.tree.write_many(&indices, "");
        self.push_history_now();
        self.set_status("Selection Cut");
        true
    }

    /// Paste into a new layer, anchored at the top-left corner.
    pub fn paste(&mut self) -> bool {
        let Some(clip) = self.clipboard.clone() else { return false };
        let size = self.size();
        let id = self.project.tree.add_layer();
        self.project
            .tree
            .set_property(id, ItemProperty::Name("Pasted Layer".to_string()));

        let mut data = vec![String::new(); size * size];
        for y in 0..clip.height.min(size) {
            for x in 0..clip.width.min(size) {
                data[y * size + x] = clip.data[y * clip.width + x].clone();
            }
        }
        self.project.tree.set_layer_data(data);
        self.push_history_now();
        self.set_status("Pasted to New Layer");
        true
    }

    // --- Layer commands (each one history entry) ---

    pub fn add_layer(&mut self) -> ItemId {
        let id = self.project.tree.add_layer();
        self.push_history_now();
        id
    }

    pub fn add_group(&mut self) -> ItemId {
        let id = self.project.tree.add_group();
        self.push_history_now();
        id
    }

    pub fn delete_active(&mut self) -> bool {
        let changed = self.project.tree.delete_active().is_some();
        if changed {
            self.push_history_now();
        }
        changed
    }

    pub fn duplicate_active(&mut self) -> Option<ItemId> {
        let id = self.project.tree.duplicate_active()?;
        self.push_history_now();
        Some(id)
    }

    pub fn merge_down(&mut self) -> bool {
        self.record_if(|tree| tree.merge_down())
    }

    pub fn move_active_up(&mut self) -> bool {
        self.record_if(|tree| tree.move_active_up())
    }

    pub fn move_active_down(&mut self) -> bool {
        self.record_if(|tree| tree.move_active_down())
    }

    pub fn move_item(&mut self, id: ItemId, new_parent: Option<ItemId>, index: usize) -> bool {
        self.record_if(|tree| tree.move_item(id, new_parent, index))
    }

    pub fn clear_active_layer(&mut self) -> bool {
        self.record_if(|tree| tree.clear_active())
    }

    /// Property edits are recorded, except the panel-only `Expanded`.
    pub fn set_property(&mut self, id: ItemId, property: ItemProperty) -> bool {
        let record = !matches!(property, ItemProperty::Expanded(_));
        let changed = self.project.tree.set_property(id, property);
        if changed && record {
            self.push_history_now();
        }
        changed
    }

    pub fn select_item(&mut self, id: ItemId) -> bool {
        self.project.tree.select_item(id)
    }

    fn record_if(&mut self, op: impl FnOnce(&mut LayerTree) -> bool) -> bool {
        let changed = op(&mut self.project.tree);
        if changed {
            self.push_history_now();
        }
        changed
    }

    // --- Documents ---

    /// Reset to a blank grid of side `size`. Tree, selection and history all
    /// start over; history holds just the blank state.
    pub fn create_grid(&mut self, size: usize) -> bool {
        if !(1..=MAX_GRID_SIZE).contains(&size) {
            return false;
        }
        self.cancel_gesture();
        self.selection = None;
        self.project.tree.init(size);
        self.project.history.clear();
        let snapshot = self.project.tree.get_snapshot();
        self.project.history.push_state(snapshot);
        self.set_status("New Grid Created");
        log_info!("New {}x{} grid", size, size);
        true
    }

    /// Start a fresh untitled document.
    pub fn new_project(&mut self, size: usize) -> bool {
        if !(1..=MAX_GRID_SIZE).contains(&size) {
            return false;
        }
        self.untitled_counter += 1;
        let project = Project::new_untitled(self.untitled_counter, size, self.settings.max_undo_steps);
        self.replace_project(project);
        true
    }

    pub fn open_project(&mut self, path: &Path) -> Result<(), ProjectError> {
        let project = Project::open(path, self.settings.max_undo_steps)?;
        self.replace_project(project);
        self.set_status("Project Loaded");
        Ok(())
    }

    pub fn save_project(&mut self) -> Result<(), ProjectError> {
        self.project.save()
    }

    pub fn save_project_as(&mut self, path: PathBuf) -> Result<(), ProjectError> {
        self.project.save_as(path)
    }

    fn replace_project(&mut self, project: Project) {
        self.cancel_gesture();
        self.selection = None;
        self.project = project;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor(size: usize) -> Editor {
        let settings = EditorSettings {
            default_grid_size: size,
            ..EditorSettings::default()
        };
        Editor::new(settings)
    }

    fn layer(ed: &Editor) -> Vec<String> {
        ed.tree().active_layer().unwrap().data.clone()
    }

    #[test]
    fn tool_names_round_trip() {
        for tool in Tool::all() {
            assert_eq!(Tool::from_name(tool.name()), Some(*tool));
        }
        assert_eq!(Tool::from_name("tool-shape"), Some(Tool::Shape(ShapeKind::Rectangle)));
        assert_eq!(Tool::from_name("pan"), None);
    }

    #[test]
    fn brush_stroke_connects_points() {
        let mut ed = editor(4);
        ed.set_color("#F00");
        assert!(ed.begin_stroke(0, 0));
        ed.continue_stroke(3, 3);
        ed.end_stroke();
        let data = layer(&ed);
        for i in [0, 5, 10, 15] {
            assert_eq!(data[i], "#F00");
        }
        assert_eq!(data.iter().filter(|c| !c.is_empty()).count(), 4);
        assert_eq!(ed.recent_colors(), &["#F00".to_string()]);
    }

    #[test]
    fn off_grid_press_is_ignored() {
        let mut ed = editor(4);
        assert!(!ed.begin_stroke(-1, 0));
        assert!(!ed.begin_stroke(4, 0));
        assert!(!ed.continue_stroke(1, 1));
        assert!(!ed.end_stroke());
    }

    #[test]
    fn dither_paints_checkerboard() {
        let mut ed = editor(4);
        ed.set_tool(Tool::DitherBrush);
        ed.begin_stroke(0, 0);
        ed.continue_stroke(3, 0);
        ed.end_stroke();
        let painted: Vec<usize> = (0..16).filter(|&i| !layer(&ed)[i].is_empty()).collect();
        assert_eq!(painted, vec![0, 2]);
    }

    #[test]
    fn eraser_clears() {
        let mut ed = editor(2);
        ed.begin_stroke(1, 1);
        ed.end_stroke();
        ed.set_tool(Tool::Eraser);
        ed.begin_stroke(1, 1);
        ed.end_stroke();
        assert!(layer(&ed).iter().all(|c| c.is_empty()));
    }

    #[test]
    fn stroke_history_is_debounced() {
        let mut ed = editor(4);
        ed.begin_stroke(0, 0);
        ed.end_stroke();
        ed.begin_stroke(1, 0);
        ed.end_stroke();
        assert_eq!(ed.history().len(), 1);
        assert!(ed.history().has_pending());

        let later = Instant::now() + Duration::from_secs(1);
        assert!(ed.tick_at(later));
        assert_eq!(ed.history().len(), 2);
    }

    #[test]
    fn undo_commits_pending_stroke_first() {
        let mut ed = editor(2);
        ed.begin_stroke(0, 0);
        ed.end_stroke();
        assert!(ed.undo());
        assert!(layer(&ed).iter().all(|c| c.is_empty()));
        assert!(ed.redo());
        assert_eq!(layer(&ed)[0], "#000000");
    }

    #[test]
    fn fill_pushes_immediately() {
        let mut ed = editor(4);
        ed.set_tool(Tool::Fill);
        ed.set_color("#FF0000");
        ed.begin_stroke(0, 0);
        assert!(layer(&ed).iter().all(|c| c == "#FF0000"));
        assert_eq!(ed.history().len(), 2);
        // same colour again: nothing recorded
        ed.begin_stroke(2, 2);
        assert_eq!(ed.history().len(), 2);
    }

    #[test]
    fn shape_previews_then_commits() {
        let mut ed = editor(5);
        ed.set_tool(Tool::Shape(ShapeKind::Rectangle));
        ed.begin_stroke(1, 1);
        ed.continue_stroke(3, 3);
        assert_eq!(ed.shape_preview(), &[6, 7, 8, 11, 13, 16, 17, 18]);
        assert!(layer(&ed).iter().all(|c| c.is_empty()));

        ed.end_stroke();
        assert!(ed.shape_preview().is_empty());
        let painted: Vec<usize> = (0..25).filter(|&i| !layer(&ed)[i].is_empty()).collect();
        assert_eq!(painted, vec![6, 7, 8, 11, 13, 16, 17, 18]);
    }

    #[test]
    fn filled_circle_modifier() {
        let mut ed = editor(7);
        ed.set_tool(Tool::Shape(ShapeKind::Circle));
        ed.set_filled_shapes(true);
        ed.begin_stroke(0, 0);
        ed.continue_stroke(6, 6);
        ed.end_stroke();
        assert_eq!(layer(&ed).iter().filter(|c| !c.is_empty()).count(), 29);
    }

    #[test]
    fn eyedropper_picks_from_composite() {
        let mut ed = editor(2);
        ed.set_color("#ABCDEF");
        ed.begin_stroke(1, 0);
        ed.end_stroke();
        ed.set_color("#000");
        ed.set_tool(Tool::Eyedropper);
        ed.begin_stroke(1, 0);
        assert_eq!(ed.color(), "#ABCDEF");
        assert_eq!(ed.recent_colors()[0], "#ABCDEF");
        // transparent cell leaves the colour alone
        ed.begin_stroke(0, 0);
        assert_eq!(ed.color(), "#ABCDEF");
    }

    #[test]
    fn wand_selects_bounding_box() {
        let mut ed = editor(4);
        ed.set_tool(Tool::Shape(ShapeKind::Line));
        ed.begin_stroke(1, 1);
        ed.continue_stroke(2, 1);
        ed.end_stroke();
        ed.set_tool(Tool::MagicWand);
        ed.begin_stroke(1, 1);
        assert_eq!(ed.selection(), Some(SelectionRect { x1: 1, y1: 1, x2: 2, y2: 1 }));
    }

    #[test]
    fn marquee_cut_and_paste() {
        let mut ed = editor(4);
        ed.set_tool(Tool::Fill);
        ed.set_color("#0F0");
        ed.begin_stroke(0, 0);

        ed.set_tool(Tool::Marquee);
        ed.begin_stroke(3, 3);
        ed.continue_stroke(2, 2);
        ed.end_stroke();
        assert_eq!(ed.selection(), Some(SelectionRect { x1: 2, y1: 2, x2: 3, y2: 3 }));

        assert!(ed.cut());
        assert!(ed.selection().is_none());
        let data = layer(&ed);
        for i in [10, 11, 14, 15] {
            assert!(data[i].is_empty());
        }
        assert_eq!(ed.clipboard().unwrap().data, vec!["#0F0"; 4]);

        assert!(ed.paste());
        let pasted = ed.tree().active_layer().unwrap();
        assert_eq!(pasted.name, "Pasted Layer");
        let painted: Vec<usize> = (0..16).filter(|&i| !pasted.data[i].is_empty()).collect();
        assert_eq!(painted, vec![0, 1, 4, 5]);
        assert_eq!(ed.status(), "Pasted to New Layer");
    }

    #[test]
    fn copy_needs_selection() {
        let mut ed = editor(2);
        assert!(!ed.copy());
        assert!(!ed.paste());
    }

    #[test]
    fn switching_tool_drops_selection() {
        let mut ed = editor(4);
        ed.set_tool(Tool::Marquee);
        ed.begin_stroke(0, 0);
        ed.end_stroke();
        assert!(ed.selection().is_some());
        ed.set_tool(Tool::Brush);
        assert!(ed.selection().is_none());
        assert_eq!(ed.settings().last_active_tool, "brush");
    }

    #[test]
    fn recent_colors_dedup_and_cap() {
        let mut ed = Editor::new(EditorSettings {
            recent_colors_limit: 3,
            ..EditorSettings::default()
        });
        for c in ["#aaa", "#BBB", "", "#AAA", "#ccc", "#ddd"] {
            ed.add_recent_color(c);
        }
        assert_eq!(ed.recent_colors(), &["#ddd", "#ccc", "#AAA"]);
    }

    #[test]
    fn layer_commands_record_history() {
        let mut ed = editor(2);
        let id = ed.add_layer();
        ed.set_property(id, ItemProperty::Opacity(0.5));
        ed.set_property(id, ItemProperty::Expanded(true));
        assert_eq!(ed.history().len(), 3);
        assert!(ed.undo());
        assert_eq!(ed.tree().find_item(id).unwrap().node.opacity(), 1.0);
        assert!(ed.undo());
        assert!(ed.tree().find_item(id).is_none());
    }

    #[test]
    fn create_grid_resets_everything() {
        let mut ed = editor(4);
        ed.add_layer();
        ed.set_tool(Tool::Marquee);
        ed.begin_stroke(0, 0);
        ed.end_stroke();

        assert!(ed.create_grid(8));
        assert_eq!(ed.size(), 8);
        assert_eq!(ed.tree().layers().len(), 1);
        assert!(ed.selection().is_none());
        assert_eq!(ed.history().len(), 1);
        assert!(!ed.history().can_undo());
        assert!(!ed.create_grid(0));
    }

    #[test]
    fn jump_restores_state() {
        let mut ed = editor(2);
        ed.add_layer();
        ed.add_layer();
        assert!(ed.jump_to_state(0));
        assert_eq!(ed.tree().layers().len(), 1);
        assert!(!ed.jump_to_state(9));
    }
}
