//! ECS systems (transform propagation).

pub mod transform;

pub use transform::{clear_parent, propagate_transforms, set_parent, transform_system, TransformScratch};
