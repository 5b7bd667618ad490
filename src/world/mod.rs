//! World generation and management modules
//! Contains terrain generation, lighting, the chunk cache, the active grid and
//! the streaming engine that ties them together.

pub mod cache;
pub mod daytime;
pub mod generator;
pub mod grid;
pub mod lighting;
pub mod queues;
pub mod raycast;
pub mod structures;
pub mod terrain;
pub mod workers;

// Re-export commonly used types
pub use cache::ChunkCache;
pub use generator::TerrainGenerator;
pub use grid::{ActiveGrid, GridDims};
pub use lighting::LightParams;
pub use raycast::{BlockFace, RayFaceIntersection};
pub use terrain::{World, WorldStats};
pub use workers::WorkerHandles;
