//! Scene resources
//!
//! Meshes are stored as structure-of-arrays primitive groups; textures are
//! RGB8 images sampled by the fragment stage.

mod mesh;
mod texture;

pub use mesh::*;
pub use texture::*;
