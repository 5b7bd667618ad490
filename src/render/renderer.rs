use crate::core::position::ChunkPos;
use crate::render::mesh::ChunkMesh;

/// Which half of the frame a draw call belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RenderPass {
    Opaque,
    Translucent,
}

impl RenderPass {
    pub const ALL: [RenderPass; 2] = [RenderPass::Opaque, RenderPass::Translucent];
}

/// Submission side of the engine. The world hands finished meshes over with
/// [`ChunkRenderer::upload`] and asks for them back by position when drawing.
pub trait ChunkRenderer {
    fn upload(&mut self, pos: ChunkPos, mesh: &ChunkMesh);

    fn draw(&mut self, pos: ChunkPos, pass: RenderPass);
}
