//! Mesh-level operations built on the attribute registries.
//!
//! - [`subdivide`]: midpoint subdivision that interpolates every slot
//! - [`blend`](blend()): per-vertex blending of two meshes, e.g. morph frames

mod blend;
pub mod subdivide;

pub use blend::blend;
pub use subdivide::{subdivide_midpoint, SubdivideOptions};
