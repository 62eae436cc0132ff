//! Raster tool algorithms. Pure functions over grid indices; nothing here
//! touches the layer tree.

pub mod fill;
pub mod shapes;

pub use fill::{SelectionRect, dither_mask, eyedropper, flood_fill, magic_wand, selection_bounds};
pub use shapes::{ShapeKind, circle, circle_filled, grid_index, line, rectangle, rectangle_filled};
