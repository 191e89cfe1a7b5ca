pub mod csg;
pub mod debug;
pub mod error;
pub mod library;
pub mod math;
pub mod operations;
pub mod volume;

pub use error::{ExportError, InvariantError, Result, TreeError, ZCutError};
