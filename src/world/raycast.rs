//! Ray against unit-cube intersection used for block picking.

use glam::{IVec3, Vec3};

const EPSILON: f32 = 1e-5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockFace {
    Front,
    Back,
    Left,
    Right,
    Top,
    Bottom,
}

impl BlockFace {
    pub fn normal(self) -> IVec3 {
        match self {
            BlockFace::Front => IVec3::NEG_Z,
            BlockFace::Back => IVec3::Z,
            BlockFace::Left => IVec3::NEG_X,
            BlockFace::Right => IVec3::X,
            BlockFace::Top => IVec3::Y,
            BlockFace::Bottom => IVec3::NEG_Y,
        }
    }
}

/// A ray crossing one face of a block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayFaceIntersection {
    pub block: IVec3,
    pub face: BlockFace,
    /// Distance along the ray in units of the direction vector.
    pub t: f32,
    pub point: Vec3,
}

impl RayFaceIntersection {
    /// The empty cell in front of the intersected face, where a placed block goes.
    pub fn adjacent_block(&self) -> IVec3 {
        self.block + self.face.normal()
    }
}

/// The eight corners of the unit cube occupying `[x, x + 1]` on each axis.
/// Indices 0..4 are the z-min face, 4..8 the z-max face, both counter-clockwise
/// from the bottom-left.
pub fn vertices_for_block_at(x: i32, y: i32, z: i32) -> [Vec3; 8] {
    let (x, y, z) = (x as f32, y as f32, z as f32);
    [
        Vec3::new(x, y, z),
        Vec3::new(x + 1.0, y, z),
        Vec3::new(x + 1.0, y + 1.0, z),
        Vec3::new(x, y + 1.0, z),
        Vec3::new(x, y, z + 1.0),
        Vec3::new(x + 1.0, y, z + 1.0),
        Vec3::new(x + 1.0, y + 1.0, z + 1.0),
        Vec3::new(x, y + 1.0, z + 1.0),
    ]
}

/// Intersects a ray with every face of the block at `block`, nearest first.
/// Faces behind the origin or parallel to the ray are skipped, and faces hit
/// at the same distance are reported once.
pub fn intersect_block(block: IVec3, origin: Vec3, direction: Vec3) -> Vec<RayFaceIntersection> {
    let v = vertices_for_block_at(block.x, block.y, block.z);
    let faces = [
        (BlockFace::Front, v[0], v[3], v[2]),
        (BlockFace::Back, v[4], v[5], v[6]),
        (BlockFace::Left, v[0], v[4], v[7]),
        (BlockFace::Right, v[1], v[2], v[6]),
        (BlockFace::Top, v[3], v[7], v[6]),
        (BlockFace::Bottom, v[0], v[1], v[5]),
    ];

    let mut result: Vec<RayFaceIntersection> = faces
        .into_iter()
        .filter_map(|(face, v0, v1, v2)| {
            intersect_face(v0, v1, v2, origin, direction).map(|(t, point)| RayFaceIntersection {
                block,
                face,
                t,
                point,
            })
        })
        .collect();

    result.sort_by(|a, b| a.t.total_cmp(&b.t));
    // a ray through an edge or corner touches every face meeting there at once
    result.dedup_by(|later, earlier| (later.t - earlier.t).abs() < EPSILON);
    result
}

/// Plane through `v0, v1, v2`, accepted if the hit lies in the box spanned by
/// `v0` and `v2`.
fn intersect_face(v0: Vec3, v1: Vec3, v2: Vec3, origin: Vec3, direction: Vec3) -> Option<(f32, Vec3)> {
    let normal = (v1 - v0).cross(v2 - v0);
    let d = -normal.dot(v0);

    let denom = direction.dot(normal);
    if denom.abs() < EPSILON {
        return None;
    }

    let t = -(normal.dot(origin) + d) / denom;
    if t < 0.0 {
        return None;
    }

    let point = origin + direction * t;
    let min = v0 - Vec3::splat(EPSILON);
    let max = v2 + Vec3::splat(EPSILON);
    if point.cmpge(min).all() && point.cmple(max).all() {
        Some((t, point))
    } else {
        None
    }
}
