//! Small shared geometric types.

mod bounds;

pub use bounds::Bounds2D;
