use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::constants::*;
use crate::core::position::{ChunkPos, LocalPos};
use crate::render::mesh::ChunkMesh;
use crate::world::generator::TerrainGenerator;

/// Fixed-size voxel storage with a parallel light array.
///
/// Blocks are stored column-major (`y` varies fastest) so sunlight passes
/// walk contiguous memory.
pub struct Chunk {
    position: ChunkPos,
    pub(crate) blocks: Vec<u8>,
    pub(crate) light: Vec<f32>,
    dirty: bool,
    generated: bool,
    lit_daylight: Option<f32>,
    mesh: Option<Arc<ChunkMesh>>,
}

#[inline]
pub(crate) fn index(x: i32, y: i32, z: i32) -> usize {
    ((x * CHUNK_SIZE_Z + z) * CHUNK_SIZE_Y + y) as usize
}

#[inline]
pub(crate) fn in_bounds(x: i32, y: i32, z: i32) -> bool {
    (0..CHUNK_SIZE_X).contains(&x) && (0..CHUNK_SIZE_Y).contains(&y) && (0..CHUNK_SIZE_Z).contains(&z)
}

impl Chunk {
    pub fn new(position: ChunkPos) -> Self {
        Chunk {
            position,
            blocks: vec![0; CHUNK_VOLUME],
            light: vec![0.0; CHUNK_VOLUME],
            dirty: true,
            generated: false,
            lit_daylight: None,
            mesh: None,
        }
    }

    pub fn position(&self) -> ChunkPos {
        self.position
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> u8 {
        if in_bounds(x, y, z) {
            self.blocks[index(x, y, z)]
        } else {
            0
        }
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: u8) {
        if in_bounds(x, y, z) {
            self.blocks[index(x, y, z)] = block;
            self.dirty = true;
        }
    }

    pub fn get_block_local(&self, local: LocalPos) -> u8 {
        self.get_block(local.x, local.y, local.z)
    }

    pub fn get_light(&self, x: i32, y: i32, z: i32) -> f32 {
        if in_bounds(x, y, z) {
            self.light[index(x, y, z)]
        } else {
            0.0
        }
    }

    pub fn set_light(&mut self, x: i32, y: i32, z: i32, intensity: f32) {
        if in_bounds(x, y, z) {
            self.light[index(x, y, z)] = intensity;
            self.dirty = true;
        }
    }

    /// Populates the blocks from the terrain generator.
    /// Returns `false` if the chunk was already generated.
    pub fn generate(&mut self, generator: &TerrainGenerator) -> bool {
        if self.generated {
            return false;
        }
        generator.generate(self);
        self.generated = true;
        self.dirty = true;
        true
    }

    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Daylight the last full relight ran with.
    pub fn lit_daylight(&self) -> Option<f32> {
        self.lit_daylight
    }

    pub(crate) fn set_lit_daylight(&mut self, daylight: f32) {
        self.lit_daylight = Some(daylight);
    }

    pub fn mesh(&self) -> Option<&Arc<ChunkMesh>> {
        self.mesh.as_ref()
    }

    /// Stores a freshly built mesh and clears the dirty flag.
    pub fn set_mesh(&mut self, mesh: ChunkMesh) {
        self.mesh = Some(Arc::new(mesh));
        self.dirty = false;
    }

    pub fn blocks(&self) -> &[u8] {
        &self.blocks
    }
}

/// Shared, lockable chunk. The grid slot and the cache entry hold the same
/// handle, so there is exactly one copy of the chunk state.
pub struct ChunkHandle {
    position: ChunkPos,
    chunk: RwLock<Chunk>,
    uploaded: AtomicBool,
}

pub type ChunkRef = Arc<ChunkHandle>;

impl ChunkHandle {
    pub fn new(position: ChunkPos) -> ChunkRef {
        Arc::new(ChunkHandle {
            position,
            chunk: RwLock::new(Chunk::new(position)),
            uploaded: AtomicBool::new(false),
        })
    }

    pub fn position(&self) -> ChunkPos {
        self.position
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Chunk> {
        self.chunk.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Chunk> {
        self.chunk.write()
    }

    /// Whether a mesh of this chunk has reached the renderer at least once.
    /// Kept outside the lock so drawing never waits on a busy worker.
    pub fn is_uploaded(&self) -> bool {
        self.uploaded.load(Ordering::Acquire)
    }

    pub fn mark_uploaded(&self) {
        self.uploaded.store(true, Ordering::Release);
    }
}
