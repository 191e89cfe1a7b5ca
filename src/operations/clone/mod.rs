mod deep_clone;

pub use deep_clone::DeepClone;
