pub mod clone;
pub mod tree;
pub mod zcut;
