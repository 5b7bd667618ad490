use crate::constants::*;
use crate::core::block::{BlockType, block_properties};
use crate::core::chunk::Chunk;
use crate::core::vertex::Vertex;

/// Vertex and index buffers for one render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }
}

/// CPU-side geometry of one chunk, split by render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChunkMesh {
    pub opaque: MeshData,
    pub translucent: MeshData,
}

impl ChunkMesh {
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.translucent.is_empty()
    }
}

pub fn add_quad(
    mesh: &mut MeshData,
    v0: [f32; 3],
    v1: [f32; 3],
    v2: [f32; 3],
    v3: [f32; 3],
    normal: [f32; 3],
    color: [f32; 3],
    light: f32,
) {
    let base_idx = mesh.vertices.len() as u32;
    for position in [v0, v1, v2, v3] {
        mesh.vertices.push(Vertex {
            position,
            normal,
            color,
            light,
        });
    }
    mesh.indices.extend_from_slice(&[
        base_idx,
        base_idx + 1,
        base_idx + 2,
        base_idx,
        base_idx + 2,
        base_idx + 3,
    ]);
}

/// Samples blocks and light around a chunk, falling through to the four
/// horizontal neighbors at the border.
struct Sampler<'a> {
    center: &'a Chunk,
    /// -x, +x, -z, +z
    neighbors: [Option<&'a Chunk>; 4],
}

impl Sampler<'_> {
    /// Returns the block and light at a local coordinate that may lie one
    /// step outside the chunk. Missing neighbors read as lit air.
    fn sample(&self, x: i32, y: i32, z: i32, fallback_light: f32) -> (BlockType, f32) {
        if y < 0 {
            return (BlockType::Stone, fallback_light);
        }
        if y >= CHUNK_SIZE_Y {
            return (BlockType::Air, fallback_light);
        }

        let (chunk, lx, lz) = if x < 0 {
            (self.neighbors[0], x + CHUNK_SIZE_X, z)
        } else if x >= CHUNK_SIZE_X {
            (self.neighbors[1], x - CHUNK_SIZE_X, z)
        } else if z < 0 {
            (self.neighbors[2], x, z + CHUNK_SIZE_Z)
        } else if z >= CHUNK_SIZE_Z {
            (self.neighbors[3], x, z - CHUNK_SIZE_Z)
        } else {
            (Some(self.center), x, z)
        };

        match chunk {
            Some(chunk) if chunk.is_generated() || std::ptr::eq(chunk, self.center) => (
                block_properties(chunk.get_block(lx, y, lz)),
                chunk.get_light(lx, y, lz),
            ),
            _ => (BlockType::Air, fallback_light),
        }
    }
}

/// Builds the mesh of `chunk` from its current block and light state.
///
/// Faces are emitted only where the adjacent voxel does not hide them. Each
/// face is shaded with the light of the voxel it faces. Vertex positions are
/// in world space.
pub fn build_chunk_mesh(chunk: &Chunk, neighbors: [Option<&Chunk>; 4]) -> ChunkMesh {
    let sampler = Sampler {
        center: chunk,
        neighbors,
    };
    let origin = chunk.position().world_origin();
    let mut mesh = ChunkMesh::default();

    for lx in 0..CHUNK_SIZE_X {
        for lz in 0..CHUNK_SIZE_Z {
            for y in 0..CHUNK_SIZE_Y {
                let block = block_properties(chunk.get_block(lx, y, lz));
                if block == BlockType::Air {
                    continue;
                }

                let own_light = chunk.get_light(lx, y, lz);
                let target = if block.is_translucent() {
                    &mut mesh.translucent
                } else {
                    &mut mesh.opaque
                };

                let neighbors = [
                    sampler.sample(lx - 1, y, lz, own_light),
                    sampler.sample(lx + 1, y, lz, own_light),
                    sampler.sample(lx, y - 1, lz, own_light),
                    sampler.sample(lx, y + 1, lz, own_light),
                    sampler.sample(lx, y, lz - 1, own_light),
                    sampler.sample(lx, y, lz + 1, own_light),
                ];

                let x = (origin.x + lx) as f32;
                let y_f = y as f32;
                let z = (origin.z + lz) as f32;

                for (i, &(neighbor_block, light)) in neighbors.iter().enumerate() {
                    if !block.should_render_face_against(neighbor_block) {
                        continue;
                    }

                    let color = match i {
                        2 => block.bottom_color(),
                        3 => block.top_color(),
                        _ => block.color(),
                    };

                    match i {
                        0 => add_quad(
                            target,
                            [x, y_f, z],             // BL
                            [x, y_f, z + 1.0],       // BR
                            [x, y_f + 1.0, z + 1.0], // TR
                            [x, y_f + 1.0, z],       // TL
                            [-1.0, 0.0, 0.0],
                            color,
                            light,
                        ),
                        1 => add_quad(
                            target,
                            [x + 1.0, y_f, z + 1.0],
                            [x + 1.0, y_f, z],
                            [x + 1.0, y_f + 1.0, z],
                            [x + 1.0, y_f + 1.0, z + 1.0],
                            [1.0, 0.0, 0.0],
                            color,
                            light,
                        ),
                        2 => add_quad(
                            target,
                            [x, y_f, z + 1.0],
                            [x, y_f, z],
                            [x + 1.0, y_f, z],
                            [x + 1.0, y_f, z + 1.0],
                            [0.0, -1.0, 0.0],
                            color,
                            light,
                        ),
                        3 => add_quad(
                            target,
                            [x, y_f + 1.0, z],
                            [x, y_f + 1.0, z + 1.0],
                            [x + 1.0, y_f + 1.0, z + 1.0],
                            [x + 1.0, y_f + 1.0, z],
                            [0.0, 1.0, 0.0],
                            color,
                            light,
                        ),
                        4 => add_quad(
                            target,
                            [x + 1.0, y_f, z],
                            [x, y_f, z],
                            [x, y_f + 1.0, z],
                            [x + 1.0, y_f + 1.0, z],
                            [0.0, 0.0, -1.0],
                            color,
                            light,
                        ),
                        _ => add_quad(
                            target,
                            [x, y_f, z + 1.0],
                            [x + 1.0, y_f, z + 1.0],
                            [x + 1.0, y_f + 1.0, z + 1.0],
                            [x, y_f + 1.0, z + 1.0],
                            [0.0, 0.0, 1.0],
                            color,
                            light,
                        ),
                    }
                }
            }
        }
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::ChunkPos;

    fn single_block(block: BlockType) -> Chunk {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        chunk.set_block(5, 10, 5, block.id());
        chunk
    }

    #[test]
    fn test_isolated_block_has_six_faces() {
        let chunk = single_block(BlockType::Stone);
        let mesh = build_chunk_mesh(&chunk, [None; 4]);
        assert_eq!(mesh.opaque.quad_count(), 6);
        assert_eq!(mesh.opaque.vertices.len(), 24);
        assert!(mesh.translucent.is_empty());
    }

    #[test]
    fn test_adjacent_blocks_hide_shared_faces() {
        let mut chunk = single_block(BlockType::Stone);
        chunk.set_block(6, 10, 5, BlockType::Stone.id());
        let mesh = build_chunk_mesh(&chunk, [None; 4]);
        assert_eq!(mesh.opaque.quad_count(), 10);
    }

    #[test]
    fn test_water_goes_to_translucent_pass() {
        let chunk = single_block(BlockType::Water);
        let mesh = build_chunk_mesh(&chunk, [None; 4]);
        assert!(mesh.opaque.is_empty());
        assert_eq!(mesh.translucent.quad_count(), 6);
    }

    #[test]
    fn test_neighbor_chunk_occludes_border_face() {
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        chunk.set_block(CHUNK_SIZE_X - 1, 10, 5, BlockType::Stone.id());

        let generator = crate::world::generator::TerrainGenerator::new("mesh");
        let mut east = Chunk::new(ChunkPos::new(1, 0));
        east.generate(&generator);
        for y in 0..CHUNK_SIZE_Y {
            east.set_block(0, y, 5, BlockType::Stone.id());
        }

        let open = build_chunk_mesh(&chunk, [None; 4]);
        let closed = build_chunk_mesh(&chunk, [None, Some(&east), None, None]);
        assert_eq!(open.opaque.quad_count(), 6);
        assert_eq!(closed.opaque.quad_count(), 5);
    }

    #[test]
    fn test_face_light_comes_from_facing_voxel() {
        let mut chunk = single_block(BlockType::Stone);
        chunk.set_light(5, 11, 5, 0.75);
        let mesh = build_chunk_mesh(&chunk, [None; 4]);
        let top = mesh
            .opaque
            .vertices
            .iter()
            .find(|v| v.normal == [0.0, 1.0, 0.0])
            .unwrap();
        assert_eq!(top.light, 0.75);
    }
}
