//! Rendering-related modules
//! Contains CPU mesh building and the submission boundary.

pub mod mesh;
pub mod renderer;

// Re-export commonly used types
pub use mesh::{ChunkMesh, MeshData, add_quad, build_chunk_mesh};
pub use renderer::{ChunkRenderer, RenderPass};
