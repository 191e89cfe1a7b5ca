//! Text rendering of trees for diagnostics.

mod canvas;

pub use canvas::Canvas;
