// Core module with fundamental types
pub mod core;

// Render module with mesh building and the renderer boundary
pub mod render;

// Utils module with settings persistence
pub mod utils;

// World module with generation, lighting and streaming
pub mod world;

// Other modules
pub mod constants;

// Re-exports
pub use constants::*;
pub use core::{BlockType, Chunk, ChunkHandle, ChunkPos, ChunkRef, LocalPos, Vertex};
pub use render::{ChunkMesh, ChunkRenderer, MeshData, RenderPass, build_chunk_mesh};
pub use utils::{WorldSettings, load_settings, save_settings};
pub use world::{
    BlockFace, ChunkCache, RayFaceIntersection, TerrainGenerator, World, WorldStats,
};
