//! Deterministic terrain generation using FastNoiseLite
//!
//! The generator is a pure function of the world seed and the chunk
//! coordinate, so an evicted chunk regenerates to identical contents.

use std::hash::{Hash, Hasher};

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use rustc_hash::FxHasher;

use crate::constants::*;
use crate::core::block::BlockType;
use crate::core::chunk::Chunk;
use crate::world::structures::Structure;

/// Thread-safe terrain generator with three independently seeded noise sources
pub struct TerrainGenerator {
    noise_terrain: FastNoiseLite,
    noise_detail: FastNoiseLite,
    noise_density: FastNoiseLite,
    seed_hash: u64,
}

/// Stable hash of the world seed string.
pub fn seed_hash(seed: &str) -> u64 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    hasher.finish()
}

impl TerrainGenerator {
    pub fn new(seed: &str) -> Self {
        let seed_hash = seed_hash(seed);
        let mut rng = StdRng::seed_from_u64(seed_hash);

        TerrainGenerator {
            noise_terrain: Self::create_fbm_noise(rng.random::<i32>(), 0.006),
            noise_detail: Self::create_noise(rng.random::<i32>(), 0.04),
            noise_density: Self::create_noise(rng.random::<i32>(), 0.06),
            seed_hash,
        }
    }

    fn create_noise(seed: i32, frequency: f32) -> FastNoiseLite {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(frequency));
        noise
    }

    fn create_fbm_noise(seed: i32, frequency: f32) -> FastNoiseLite {
        let mut noise = Self::create_noise(seed, frequency);
        noise.set_fractal_type(Some(FractalType::FBm));
        noise.set_fractal_octaves(Some(4));
        noise.set_fractal_lacunarity(Some(2.0));
        noise.set_fractal_gain(Some(0.5));
        noise
    }

    pub fn terrain_height(&self, x: i32, z: i32) -> i32 {
        let fx = x as f32;
        let fz = z as f32;
        let base = self.noise_terrain.get_noise_2d(fx, fz);
        let detail = self.noise_detail.get_noise_2d(fx, fz);
        let height = TERRAIN_BASE_HEIGHT + base * TERRAIN_AMPLITUDE + detail * 4.0;
        (height as i32).clamp(1, CHUNK_SIZE_Y - 16)
    }

    fn is_cave(&self, x: i32, y: i32, z: i32, surface: i32) -> bool {
        if y <= 1 || y >= surface - 4 {
            return false;
        }
        let density = self
            .noise_density
            .get_noise_3d(x as f32, y as f32 * 1.5, z as f32);
        density > 0.55
    }

    fn surface_block(&self, y: i32, surface: i32) -> BlockType {
        if surface <= SEA_LEVEL + 1 {
            BlockType::Sand
        } else if y > TERRAIN_BASE_HEIGHT as i32 + 20 {
            BlockType::Snow
        } else {
            BlockType::Grass
        }
    }

    fn position_hash(&self, x: i32, z: i32) -> u32 {
        let mut h = self.seed_hash as u32 ^ (self.seed_hash >> 32) as u32;
        h = h.wrapping_add((x as u32).wrapping_mul(374761393));
        h = h.wrapping_add((z as u32).wrapping_mul(668265263));
        h = (h ^ (h >> 13)).wrapping_mul(1274126177);
        h ^ (h >> 16)
    }

    /// Fills the chunk's block array. Light is not touched.
    pub fn generate(&self, chunk: &mut Chunk) {
        let origin = chunk.position().world_origin();
        let mut height_map = [[0i32; CHUNK_SIZE_Z as usize]; CHUNK_SIZE_X as usize];

        for lx in 0..CHUNK_SIZE_X {
            for lz in 0..CHUNK_SIZE_Z {
                let world_x = origin.x + lx;
                let world_z = origin.z + lz;
                let surface = self.terrain_height(world_x, world_z);
                height_map[lx as usize][lz as usize] = surface;

                for y in 0..CHUNK_SIZE_Y {
                    let block = if y == 0 {
                        BlockType::Bedrock
                    } else if y < surface - 4 {
                        if self.is_cave(world_x, y, world_z, surface) {
                            BlockType::Air
                        } else {
                            BlockType::Stone
                        }
                    } else if y < surface - 1 {
                        if surface <= SEA_LEVEL + 1 {
                            BlockType::Sand
                        } else {
                            BlockType::Dirt
                        }
                    } else if y == surface - 1 {
                        self.surface_block(y, surface)
                    } else if y < SEA_LEVEL {
                        BlockType::Water
                    } else {
                        break;
                    };

                    if block != BlockType::Air {
                        chunk.set_block(lx, y, lz, block.id());
                    }
                }
            }
        }

        self.generate_trees(chunk, &height_map);
    }

    /// Places trees whose crown fits inside the chunk, so no write ever
    /// crosses a chunk border.
    fn generate_trees(&self, chunk: &mut Chunk, height_map: &[[i32; CHUNK_SIZE_Z as usize]; CHUNK_SIZE_X as usize]) {
        let origin = chunk.position().world_origin();

        for lx in 2..CHUNK_SIZE_X - 2 {
            for lz in 2..CHUNK_SIZE_Z - 2 {
                let surface = height_map[lx as usize][lz as usize];
                if chunk.get_block(lx, surface - 1, lz) != BlockType::Grass.id() {
                    continue;
                }

                let hash = self.position_hash(origin.x + lx, origin.z + lz);
                if hash % 89 != 0 {
                    continue;
                }

                let height = 6 + (hash >> 8) as i32 % 2;
                if surface + height + 2 >= CHUNK_SIZE_Y {
                    continue;
                }

                let tree = Structure::tree(height, |x, y, z| {
                    let leaf_hash = self.position_hash(origin.x + lx + x * 7 + y, origin.z + lz + z * 13 - y);
                    leaf_hash % 5 != 0
                });

                for &(x, y, z, block) in &tree.blocks {
                    let (bx, by, bz) = (lx + x, surface + y, lz + z);
                    if chunk.get_block(bx, by, bz) == BlockType::Air.id() {
                        chunk.set_block(bx, by, bz, block.id());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::position::ChunkPos;

    #[test]
    fn test_same_seed_same_blocks() {
        let a = TerrainGenerator::new("determinism");
        let b = TerrainGenerator::new("determinism");

        let mut first = Chunk::new(ChunkPos::new(-7, 12));
        let mut second = Chunk::new(ChunkPos::new(-7, 12));
        a.generate(&mut first);
        b.generate(&mut second);

        assert_eq!(first.blocks(), second.blocks());
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = TerrainGenerator::new("alpha");
        let b = TerrainGenerator::new("beta");
        let heights_a: Vec<i32> = (0..64).map(|i| a.terrain_height(i * 5, i * 3)).collect();
        let heights_b: Vec<i32> = (0..64).map(|i| b.terrain_height(i * 5, i * 3)).collect();
        assert_ne!(heights_a, heights_b);
    }

    #[test]
    fn test_column_layout() {
        let generator = TerrainGenerator::new("layout");
        let mut chunk = Chunk::new(ChunkPos::new(0, 0));
        generator.generate(&mut chunk);

        for lx in 0..CHUNK_SIZE_X {
            for lz in 0..CHUNK_SIZE_Z {
                assert_eq!(chunk.get_block(lx, 0, lz), BlockType::Bedrock.id());
                assert_eq!(chunk.get_block(lx, CHUNK_SIZE_Y - 1, lz), BlockType::Air.id());
            }
        }
    }
}
