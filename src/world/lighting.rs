//! Per-voxel light propagation.
//!
//! Sunlight falls straight down each column at the current daylight
//! intensity. Below the first shadow-casting block it decays by
//! [`LIGHT_ATTENUATION`] per block down to the configured minimum. A full
//! relight additionally spreads light sideways into covered air so overhangs
//! and cave mouths are not pitch black.

use std::collections::VecDeque;

use crate::constants::*;
use crate::core::block::{BlockType, block_properties};
use crate::core::chunk::{Chunk, in_bounds, index};

/// Inputs the propagator needs from the world at the moment it runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightParams {
    pub daylight: f32,
    pub min_light: f32,
}

impl Chunk {
    /// Recomputes the light of every voxel.
    pub fn calc_light(&mut self, params: LightParams) {
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                self.sunlight_column(x, z, params);
            }
        }
        self.spread_light(params);
        self.set_lit_daylight(params.daylight);
    }

    /// Recomputes only the column at `(x, z)` after a single edit.
    pub fn calc_sunlight_at_local_pos(&mut self, x: i32, z: i32, params: LightParams) {
        if !in_bounds(x, 0, z) {
            return;
        }
        self.sunlight_column(x, z, params);
        self.mark_dirty();
    }

    fn sunlight_column(&mut self, x: i32, z: i32, params: LightParams) {
        let mut light = params.daylight;
        let mut covered = false;

        for y in (0..CHUNK_SIZE_Y).rev() {
            let i = index(x, y, z);
            let block = block_properties(self.blocks[i]);
            if block.casts_shadow() {
                covered = true;
            }

            self.light[i] = light;

            if covered || block == BlockType::Water {
                light = (light * LIGHT_ATTENUATION).max(params.min_light);
            }
        }
    }

    fn spread_light(&mut self, params: LightParams) {
        let mut queue = VecDeque::new();
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                for y in 0..CHUNK_SIZE_Y {
                    let i = index(x, y, z);
                    if !block_properties(self.blocks[i]).casts_shadow()
                        && self.light[i] - LIGHT_SPREAD_FALLOFF > params.min_light
                    {
                        queue.push_back((x, y, z));
                    }
                }
            }
        }

        const DIRECTIONS: [(i32, i32, i32); 6] = [
            (-1, 0, 0),
            (1, 0, 0),
            (0, -1, 0),
            (0, 1, 0),
            (0, 0, -1),
            (0, 0, 1),
        ];

        while let Some((x, y, z)) = queue.pop_front() {
            let spread = self.light[index(x, y, z)] - LIGHT_SPREAD_FALLOFF;
            if spread <= params.min_light {
                continue;
            }
            for (dx, dy, dz) in DIRECTIONS {
                let (nx, ny, nz) = (x + dx, y + dy, z + dz);
                if !in_bounds(nx, ny, nz) {
                    continue;
                }
                let ni = index(nx, ny, nz);
                if block_properties(self.blocks[ni]).casts_shadow() {
                    continue;
                }
                if self.light[ni] < spread {
                    self.light[ni] = spread;
                    queue.push_back((nx, ny, nz));
                }
            }
        }
    }
}
