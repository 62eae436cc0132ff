//! PixelFE editor core: colour blending, tool algorithms, the layer tree, the
//! cached compositor and snapshot history, plus the project file format and a
//! headless CLI on top.

#[macro_use]
pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod color;
pub mod components;
pub mod compositor;
pub mod io;
pub mod ops;
pub mod project;
pub mod settings;

pub use app::{Editor, Tool};
pub use canvas::{ItemId, ItemProperty, Layer, LayerNode, LayerTree, Snapshot};
pub use components::history::{HistoryManager, HistoryState};
