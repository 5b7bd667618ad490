use serde::{Deserialize, Serialize};

/// Block type ids as stored in a chunk's block array.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum BlockType {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Water = 4,
    Wood = 5,
    Leaves = 6,
    Sand = 7,
    Snow = 8,
    Bedrock = 9,
}

impl BlockType {
    pub fn from_id(id: u8) -> Option<BlockType> {
        match id {
            0 => Some(BlockType::Air),
            1 => Some(BlockType::Grass),
            2 => Some(BlockType::Dirt),
            3 => Some(BlockType::Stone),
            4 => Some(BlockType::Water),
            5 => Some(BlockType::Wood),
            6 => Some(BlockType::Leaves),
            7 => Some(BlockType::Sand),
            8 => Some(BlockType::Snow),
            9 => Some(BlockType::Bedrock),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn color(&self) -> [f32; 3] {
        match self {
            BlockType::Air => [0.0, 0.0, 0.0],
            BlockType::Grass => [0.45, 0.32, 0.22],
            BlockType::Dirt => [0.52, 0.37, 0.26],
            BlockType::Stone => [0.55, 0.55, 0.55],
            BlockType::Water => [0.25, 0.46, 0.82],
            BlockType::Wood => [0.6, 0.4, 0.2],
            BlockType::Leaves => [0.3, 0.6, 0.2],
            BlockType::Sand => [0.89, 0.83, 0.61],
            BlockType::Snow => [0.95, 0.95, 0.98],
            BlockType::Bedrock => [0.2, 0.2, 0.2],
        }
    }

    pub fn top_color(&self) -> [f32; 3] {
        match self {
            BlockType::Grass => [0.36, 0.7, 0.28],
            _ => self.color(),
        }
    }

    pub fn bottom_color(&self) -> [f32; 3] {
        match self {
            BlockType::Grass => BlockType::Dirt.color(),
            _ => self.color(),
        }
    }

    pub fn is_transparent(&self) -> bool {
        matches!(
            self,
            BlockType::Air | BlockType::Water | BlockType::Leaves
        )
    }

    /// Blocks that stop sunlight from reaching the voxels below.
    pub fn casts_shadow(&self) -> bool {
        !matches!(self, BlockType::Air | BlockType::Water)
    }

    /// Geometry drawn in the second (blended) render pass.
    pub fn is_translucent(&self) -> bool {
        matches!(self, BlockType::Water | BlockType::Leaves)
    }

    pub fn should_render_face_against(&self, neighbor: BlockType) -> bool {
        if neighbor == BlockType::Air {
            return true;
        }

        // Water doesn't render internal faces nor faces against solid blocks
        if *self == BlockType::Water {
            return false;
        }

        if *self == BlockType::Leaves && neighbor == BlockType::Leaves {
            return true;
        }

        neighbor.is_transparent()
    }
}

/// Properties for raw block bytes. Unknown ids behave like stone.
pub fn block_properties(id: u8) -> BlockType {
    BlockType::from_id(id).unwrap_or(BlockType::Stone)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_discriminants() {
        for id in 0..=9u8 {
            let block = BlockType::from_id(id).unwrap();
            assert_eq!(block.id(), id);
        }
        assert_eq!(BlockType::from_id(200), None);
        assert_eq!(block_properties(200), BlockType::Stone);
    }

    #[test]
    fn test_water_hides_faces_against_solids() {
        assert!(!BlockType::Water.should_render_face_against(BlockType::Stone));
        assert!(BlockType::Stone.should_render_face_against(BlockType::Water));
        assert!(BlockType::Water.should_render_face_against(BlockType::Air));
        assert!(!BlockType::Stone.should_render_face_against(BlockType::Dirt));
    }
}
