use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec3;
use minestream::utils::settings::GridSettings;
use minestream::{
    BlockFace, BlockType, CHUNK_SIZE_X, CHUNK_SIZE_Z, ChunkMesh, ChunkPos, ChunkRenderer,
    RenderPass, World, WorldSettings,
};

#[derive(Default)]
struct RecordingRenderer {
    uploads: Vec<ChunkPos>,
    draws: Vec<(ChunkPos, RenderPass)>,
}

impl ChunkRenderer for RecordingRenderer {
    fn upload(&mut self, pos: ChunkPos, _mesh: &ChunkMesh) {
        self.uploads.push(pos);
    }

    fn draw(&mut self, pos: ChunkPos, pass: RenderPass) {
        self.draws.push((pos, pass));
    }
}

fn world_with(seed: &str, width: i32, depth: i32) -> World {
    let mut settings = WorldSettings::default();
    settings.seed = seed.to_string();
    settings.viewing_distance = GridSettings {
        width,
        height: 1,
        depth,
    };
    World::new(settings)
}

fn settle(world: &World, renderer: &mut RecordingRenderer) {
    loop {
        while world.process_next_update() {}
        if world.update(0.016, renderer) == 0 {
            break;
        }
    }
}

#[test]
fn set_block_round_trips_everywhere() {
    let world = world_with("round trip", 4, 4);
    let coords = [
        (0, 0, 0),
        (-1, 5, -1),
        (15, 127, 16),
        (-17, 64, 33),
        (1000, 90, -1000),
    ];
    for (i, &(x, y, z)) in coords.iter().enumerate() {
        let block = (i as u8 % 9) + 1;
        world.set_block(x, y, z, block, i % 2 == 0);
        assert_eq!(world.get_block(x, y, z), block, "at {x},{y},{z}");
    }
}

#[test]
fn regenerated_chunk_matches_evicted_one() {
    let mut settings = WorldSettings::default();
    settings.seed = "determinism".to_string();
    settings.viewing_distance = GridSettings {
        width: 2,
        height: 1,
        depth: 2,
    };
    settings.cache.capacity = 8;
    settings.cache.eviction_batch = 4;
    let world = World::new(settings);

    let far = ChunkPos::new(40, 40);
    let origin = far.world_origin();
    let sample = |world: &World| -> Vec<u8> {
        let mut blocks = Vec::new();
        for x in 0..CHUNK_SIZE_X {
            for z in 0..CHUNK_SIZE_Z {
                for y in (0..128).step_by(3) {
                    blocks.push(world.get_block(origin.x + x, y, origin.z + z));
                }
            }
        }
        blocks
    };

    world.set_light(origin.x, 0, origin.z, 0.5);
    let before = sample(&world);
    assert!(before.iter().any(|&b| b != 0));

    // nearer chunks push the far one out of the cache
    for i in 1..=10 {
        world.set_light(i * CHUNK_SIZE_X, 0, 0, 0.5);
    }
    assert_eq!(world.get_block(origin.x, 0, origin.z), 0);

    world.set_light(origin.x, 0, origin.z, 0.5);
    assert_eq!(sample(&world), before);
}

#[test]
fn border_edit_uploads_neighbor_before_center() {
    let world = world_with("border", 4, 4);
    let mut renderer = RecordingRenderer::default();
    world.generate_initial_grid();
    settle(&world, &mut renderer);
    renderer.uploads.clear();

    // x = 15 is the +x border of chunk (0, 0); chunk (1, 0) is active
    world.set_block(15, 120, 5, BlockType::Stone.id(), true);
    assert!(world.get_light(15, 119, 5) < world.daylight());
    settle(&world, &mut renderer);

    let neighbor = renderer
        .uploads
        .iter()
        .position(|&p| p == ChunkPos::new(1, 0))
        .expect("neighbor was not remeshed");
    let center = renderer
        .uploads
        .iter()
        .position(|&p| p == ChunkPos::new(0, 0))
        .expect("edited chunk was not remeshed");
    assert!(neighbor < center);
}

#[test]
fn render_draws_opaque_pass_first() {
    let world = world_with("passes", 4, 4);
    let mut renderer = RecordingRenderer::default();
    world.generate_initial_grid();
    settle(&world, &mut renderer);
    assert_eq!(renderer.uploads.len(), 16);

    let draws = world.render(&mut renderer);
    assert_eq!(draws, 32);
    let first_translucent = renderer
        .draws
        .iter()
        .position(|&(_, pass)| pass == RenderPass::Translucent)
        .unwrap();
    assert_eq!(first_translucent, 16);
    assert!(
        renderer.draws[..16]
            .iter()
            .all(|&(_, pass)| pass == RenderPass::Opaque)
    );
}

#[test]
fn ray_intersection_through_world() {
    let world = world_with("rays", 4, 4);
    world.set_block(0, 100, 0, BlockType::Stone.id(), false);
    world.set_block(0, 101, 0, BlockType::Air.id(), false);
    world.set_block(0, 102, 0, BlockType::Air.id(), false);

    let hits = world.ray_block_intersection(0, 100, 0, Vec3::new(0.5, 100.5, -5.0), Vec3::Z);
    assert!((1..=3).contains(&hits.len()));
    assert!(hits.windows(2).all(|w| w[0].t <= w[1].t));
    assert_eq!(hits[0].face, BlockFace::Front);

    assert!(
        world
            .ray_block_intersection(0, 101, 0, Vec3::new(0.5, 101.5, -5.0), Vec3::Z)
            .is_empty()
    );

    let picked = world
        .pick_block(Vec3::new(0.5, 102.9, 0.5), Vec3::NEG_Y, 5.0)
        .unwrap();
    assert_eq!(picked.block, glam::IVec3::new(0, 100, 0));
    assert_eq!(picked.face, BlockFace::Top);
    assert_eq!(picked.adjacent_block(), glam::IVec3::new(0, 101, 0));
}

#[test]
fn daylight_follows_the_clock() {
    let world = world_with("clock", 2, 2);
    let max = world.settings().light.max_light;
    let min = world.settings().light.min_light;

    world.update_daytime(Instant::now());
    assert_eq!(world.daytime(), 17);
    assert_eq!(world.daylight(), max);

    world.advance_daytime_to(18);
    assert_eq!(world.daylight(), 0.8 * max);
    world.advance_daytime_to(23);
    assert_eq!(world.daylight(), min);
    world.advance_daytime_to(8);
    assert_eq!(world.daylight(), max);

    let color = world.daylight_color();
    assert_eq!(color, Vec3::new(0.55, 0.85, 0.99) * max);
}

#[test]
fn tree_is_stamped_through_set_block() {
    let world = world_with("trees", 4, 4);
    world.generate_pine_tree(4, 70, 4, false);
    assert_eq!(world.get_block(4, 70, 4), BlockType::Wood.id());
    assert!((70..90).any(|y| world.get_block(5, y, 4) == BlockType::Leaves.id()));

    world.generate_tree(-20, 70, -20, true);
    assert_eq!(world.get_block(-20, 70, -20), BlockType::Wood.id());
    assert!(world.stats().important >= 1);
}

#[test]
fn background_workers_stream_and_stop() {
    let world = Arc::new(world_with("threads", 4, 4));
    world.start().unwrap();

    let mut renderer = RecordingRenderer::default();
    let deadline = Instant::now() + Duration::from_secs(30);
    while renderer.uploads.len() < 16 && Instant::now() < deadline {
        world.update(0.016, &mut renderer);
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(world.is_world_generated());
    assert!(renderer.uploads.len() >= 16);

    world.set_observer_position(Vec3::new(40.0, 80.0, 0.0));
    let deadline = Instant::now() + Duration::from_secs(30);
    while world.stats().cached < 24 && Instant::now() < deadline {
        world.update(0.016, &mut renderer);
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(world.stats().cached >= 24);

    world.shutdown();
    assert!(world.is_shutting_down());
}

#[test]
fn dropping_a_started_world_stops_its_workers() {
    let world = Arc::new(world_with("dropped", 4, 4));
    world.start().unwrap();
    let weak = Arc::downgrade(&world);

    let mut renderer = RecordingRenderer::default();
    let deadline = Instant::now() + Duration::from_secs(30);
    while !world.is_world_generated() && Instant::now() < deadline {
        world.update(0.016, &mut renderer);
        std::thread::sleep(Duration::from_millis(5));
    }
    drop(world);

    let deadline = Instant::now() + Duration::from_secs(5);
    while weak.strong_count() > 0 && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(weak.strong_count(), 0);
    assert!(weak.upgrade().is_none());
}
