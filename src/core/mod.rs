//! Core data structures for the world
//! Contains block ids, chunk coordinates, the chunk block grid and vertices.

pub mod block;
pub mod chunk;
pub mod position;
pub mod vertex;

// Re-export commonly used types
pub use block::BlockType;
pub use chunk::{Chunk, ChunkHandle, ChunkRef};
pub use position::{ChunkKey, ChunkPos, LocalPos};
pub use vertex::Vertex;
