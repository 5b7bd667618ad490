//! Chunk coordinates and world → chunk/local conversion.

use glam::IVec3;

use crate::constants::*;

/// Opaque cache key for a chunk column. Invertible via [`ChunkPos::from_key`].
pub type ChunkKey = u64;

/// Integer grid coordinate of a chunk. The vertical chunk coordinate is always 0.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, z: i32) -> Self {
        ChunkPos { x, z }
    }

    /// Chunk containing the given world block column.
    pub fn containing(world_x: i32, world_z: i32) -> Self {
        ChunkPos {
            x: world_x.div_euclid(CHUNK_SIZE_X),
            z: world_z.div_euclid(CHUNK_SIZE_Z),
        }
    }

    /// Chunk containing a floating point world position.
    pub fn containing_point(x: f32, z: f32) -> Self {
        ChunkPos::containing(x.floor() as i32, z.floor() as i32)
    }

    pub fn position(&self) -> IVec3 {
        IVec3::new(self.x, 0, self.z)
    }

    /// World coordinate of the chunk's (0, 0, 0) block.
    pub fn world_origin(&self) -> IVec3 {
        IVec3::new(self.x * CHUNK_SIZE_X, 0, self.z * CHUNK_SIZE_Z)
    }

    pub fn key(&self) -> ChunkKey {
        ((zigzag(self.x) as u64) << 32) | zigzag(self.z) as u64
    }

    pub fn from_key(key: ChunkKey) -> Self {
        ChunkPos {
            x: unzigzag((key >> 32) as u32),
            z: unzigzag(key as u32),
        }
    }

    /// Squared planar distance in chunk units.
    pub fn distance_sq(&self, other: ChunkPos) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dz = (self.z - other.z) as i64;
        dx * dx + dz * dz
    }

    /// The four horizontally adjacent chunks: -x, +x, -z, +z.
    pub fn neighbors(&self) -> [ChunkPos; 4] {
        [
            ChunkPos::new(self.x - 1, self.z),
            ChunkPos::new(self.x + 1, self.z),
            ChunkPos::new(self.x, self.z - 1),
            ChunkPos::new(self.x, self.z + 1),
        ]
    }
}

fn zigzag(v: i32) -> u32 {
    ((v << 1) ^ (v >> 31)) as u32
}

fn unzigzag(v: u32) -> i32 {
    ((v >> 1) as i32) ^ -((v & 1) as i32)
}

/// Block coordinate inside a chunk.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LocalPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl LocalPos {
    pub fn is_on_border(&self) -> bool {
        self.x == 0 || self.x == CHUNK_SIZE_X - 1 || self.z == 0 || self.z == CHUNK_SIZE_Z - 1
    }

    /// Chunks across the borders this block touches.
    pub fn border_neighbors(&self, chunk: ChunkPos) -> Vec<ChunkPos> {
        let mut out = Vec::with_capacity(2);
        if self.x == 0 {
            out.push(ChunkPos::new(chunk.x - 1, chunk.z));
        } else if self.x == CHUNK_SIZE_X - 1 {
            out.push(ChunkPos::new(chunk.x + 1, chunk.z));
        }
        if self.z == 0 {
            out.push(ChunkPos::new(chunk.x, chunk.z - 1));
        } else if self.z == CHUNK_SIZE_Z - 1 {
            out.push(ChunkPos::new(chunk.x, chunk.z + 1));
        }
        out
    }
}

/// Splits a world block coordinate into its chunk and local coordinate.
/// Returns `None` above or below the single chunk layer.
pub fn split_world(x: i32, y: i32, z: i32) -> Option<(ChunkPos, LocalPos)> {
    if !(0..CHUNK_SIZE_Y).contains(&y) {
        return None;
    }
    let chunk = ChunkPos::containing(x, z);
    let local = LocalPos {
        x: x.rem_euclid(CHUNK_SIZE_X),
        y,
        z: z.rem_euclid(CHUNK_SIZE_Z),
    };
    Some((chunk, local))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_invertible() {
        for &(x, z) in &[(0, 0), (-1, 0), (0, -1), (i32::MIN, i32::MAX), (123, -4567)] {
            let pos = ChunkPos::new(x, z);
            assert_eq!(ChunkPos::from_key(pos.key()), pos);
        }
        assert_ne!(ChunkPos::new(1, 2).key(), ChunkPos::new(2, 1).key());
    }

    #[test]
    fn test_split_world_negative_coordinates() {
        let (chunk, local) = split_world(-1, 5, -17).unwrap();
        assert_eq!(chunk, ChunkPos::new(-1, -2));
        assert_eq!(local, LocalPos { x: 15, y: 5, z: 15 });

        let (chunk, local) = split_world(16, 0, 15).unwrap();
        assert_eq!(chunk, ChunkPos::new(1, 0));
        assert_eq!(local, LocalPos { x: 0, y: 0, z: 15 });
    }

    #[test]
    fn test_split_world_rejects_out_of_layer() {
        assert!(split_world(0, -1, 0).is_none());
        assert!(split_world(0, CHUNK_SIZE_Y, 0).is_none());
    }

    #[test]
    fn test_border_neighbors() {
        let local = LocalPos { x: 0, y: 3, z: CHUNK_SIZE_Z - 1 };
        let n = local.border_neighbors(ChunkPos::new(2, 2));
        assert_eq!(n, vec![ChunkPos::new(1, 2), ChunkPos::new(2, 3)]);
        assert!(LocalPos { x: 4, y: 0, z: 4 }.border_neighbors(ChunkPos::new(0, 0)).is_empty());
    }
}
