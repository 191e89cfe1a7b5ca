mod frame;
mod parent_map;
mod traversal;

pub use frame::FrameResolver;
pub use parent_map::ParentMap;
pub use traversal::{TraversalOrder, TreeIndex};
