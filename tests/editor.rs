//! End-to-end editing session through the public controller.

use pixelfe::ops::ShapeKind;
use pixelfe::settings::EditorSettings;
use pixelfe::{Editor, ItemProperty, Tool};

fn editor(size: usize) -> Editor {
    let mut editor = Editor::new(EditorSettings::default());
    assert!(editor.create_grid(size));
    editor
}

fn painted(editor: &mut Editor, color: &str) -> Vec<usize> {
    editor
        .composite()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.as_str() == color)
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn stroke_undo_redo() {
    let mut ed = editor(4);
    ed.set_tool(Tool::Brush);
    ed.set_color("#FF0000");
    assert!(ed.begin_stroke(0, 1));
    assert!(ed.continue_stroke(3, 1));
    assert!(ed.end_stroke());
    assert_eq!(painted(&mut ed, "#FF0000"), vec![4, 5, 6, 7]);

    // The pending stroke is committed before stepping back.
    assert!(ed.undo());
    assert!(ed.composite().iter().all(String::is_empty));
    assert!(ed.redo());
    assert_eq!(painted(&mut ed, "#FF0000"), vec![4, 5, 6, 7]);
    assert_eq!(ed.recent_colors()[0], "#FF0000");
}

#[test]
fn hidden_layers_drop_out_of_composite() {
    let mut ed = editor(2);
    let bottom = ed.tree().active_item_id().unwrap();
    ed.set_tool(Tool::Brush);
    ed.set_color("#FF0000");
    ed.begin_stroke(0, 0);
    ed.end_stroke();

    let top = ed.add_layer();
    ed.set_color("#0000FF");
    ed.begin_stroke(0, 0);
    ed.end_stroke();

    assert!(ed.set_property(top, ItemProperty::Visible(false)));
    assert_eq!(ed.composite()[0], "#FF0000");

    assert!(ed.set_property(top, ItemProperty::Visible(true)));
    assert!(ed.set_property(bottom, ItemProperty::Visible(false)));
    assert_eq!(ed.composite()[0], "#0000FF");
}

#[test]
fn fill_then_shape_then_save_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sprite.json");

    let mut ed = editor(5);
    ed.set_tool(Tool::Fill);
    ed.set_color("#00FF00");
    assert!(ed.begin_stroke(2, 2));
    assert_eq!(painted(&mut ed, "#00FF00").len(), 25);

    ed.set_tool(Tool::Shape(ShapeKind::Rectangle));
    ed.set_color("#000000");
    ed.begin_stroke(0, 0);
    ed.continue_stroke(4, 4);
    ed.end_stroke();
    assert_eq!(painted(&mut ed, "#000000").len(), 16);
    assert_eq!(painted(&mut ed, "#00FF00").len(), 9);

    ed.save_project_as(path.clone()).unwrap();
    assert_eq!(ed.project().display_title(), "sprite.json");
    let expected = ed.composite().to_vec();

    let mut reopened = Editor::new(EditorSettings::default());
    reopened.open_project(&path).unwrap();
    assert_eq!(reopened.size(), 5);
    assert_eq!(reopened.composite(), expected.as_slice());
    assert!(!reopened.history().can_undo());
}
