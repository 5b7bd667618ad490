use crate::core::block::BlockType;

/// A block pattern placed relative to an origin (the bottom of its trunk).
#[derive(Debug, Clone)]
pub struct Structure {
    pub name: String,
    pub blocks: Vec<(i32, i32, i32, BlockType)>,
}

impl Structure {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            blocks: Vec::new(),
        }
    }

    pub fn with_block(mut self, x: i32, y: i32, z: i32, block: BlockType) -> Self {
        self.blocks.push((x, y, z, block));
        self
    }

    /// Broadleaf tree: a trunk of `height` blocks and a 5x5 crown with the
    /// corners cut. `keep_leaf` decides per leaf position whether it is placed.
    pub fn tree(height: i32, mut keep_leaf: impl FnMut(i32, i32, i32) -> bool) -> Self {
        let mut structure = Structure::new("Tree");

        for y in 0..height {
            structure.blocks.push((0, y, 0, BlockType::Wood));
        }

        for y in (height - 2)..(height + 2) {
            for x in -2i32..3 {
                for z in -2i32..3 {
                    let corner = x.abs() == 2 && z.abs() == 2;
                    if corner || (x == 0 && z == 0 && y < height) {
                        continue;
                    }
                    if keep_leaf(x, y, z) {
                        structure.blocks.push((x, y, z, BlockType::Leaves));
                    }
                }
            }
        }

        structure
    }

    /// Pine tree: a tall trunk with shrinking square leaf layers every other block.
    pub fn pine_tree(height: i32) -> Self {
        let mut structure = Structure::new("PineTree");

        for y in 0..height {
            structure.blocks.push((0, y, 0, BlockType::Wood));
        }

        for layer in (0..10).step_by(2) {
            let radius = 5 - layer / 2;
            for x in -radius..=radius {
                for z in -radius..=radius {
                    if x == 0 && z == 0 {
                        continue;
                    }
                    structure
                        .blocks
                        .push((x, layer + (height - 10), z, BlockType::Leaves));
                }
            }
        }

        structure
    }

    /// Horizontal reach of the structure around its origin.
    pub fn radius(&self) -> i32 {
        self.blocks
            .iter()
            .map(|&(x, _, z, _)| x.abs().max(z.abs()))
            .max()
            .unwrap_or(0)
    }

    pub fn top(&self) -> i32 {
        self.blocks.iter().map(|&(_, y, _, _)| y).max().unwrap_or(0)
    }
}
