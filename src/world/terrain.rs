use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use glam::{IVec3, Vec3};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tracing::{debug, info};

use crate::core::block::BlockType;
use crate::core::chunk::{Chunk, ChunkRef};
use crate::core::position::{ChunkPos, split_world};
use crate::render::mesh::build_chunk_mesh;
use crate::render::renderer::{ChunkRenderer, RenderPass};
use crate::utils::settings::WorldSettings;
use crate::world::cache::ChunkCache;
use crate::world::daytime::{self, DayCycle};
use crate::world::generator::{TerrainGenerator, seed_hash};
use crate::world::grid::{ActiveGrid, GridDims, footprint_contains};
use crate::world::lighting::LightParams;
use crate::world::queues::{MeshUpload, UpdateQueues};
use crate::world::raycast::{self, RayFaceIntersection};
use crate::world::structures::Structure;
use crate::world::workers::WorkerHandles;

const PICK_STEP: f32 = 0.1;

/// Queue and cache sizes at a glance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldStats {
    pub mesh_uploads: usize,
    pub important: usize,
    pub normal: usize,
    pub cached: usize,
}

impl fmt::Display for WorldStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "world (cdl: {}, ci: {}, cn: {}, cache: {})",
            self.mesh_uploads, self.important, self.normal, self.cached
        )
    }
}

/// The streaming world: an active grid of chunks around the observer, the
/// cache behind it, and the queues feeding the background workers.
///
/// Lock order is grid, then cache, then chunk. Only the generation worker
/// holds more than one chunk lock at a time.
pub struct World {
    settings: WorldSettings,
    generator: TerrainGenerator,
    dims: GridDims,
    grid: RwLock<ActiveGrid>,
    cache: Mutex<ChunkCache>,
    pub(crate) queues: UpdateQueues,
    day: Mutex<DayCycle>,
    observer: RwLock<Vec3>,
    rng: Mutex<StdRng>,
    world_generated: AtomicBool,
    pub(crate) shutdown: AtomicBool,
    workers: Mutex<Option<WorkerHandles>>,
}

impl World {
    pub fn new(settings: WorldSettings) -> Self {
        let dims = settings.viewing_distance.dims();
        let observer = Vec3::ZERO;
        let observer_chunk = ChunkPos::containing_point(observer.x, observer.z);

        info!(
            "Creating world '{}' (seed '{}', grid {}x{})",
            settings.title, settings.seed, dims.width, dims.depth
        );

        World {
            generator: TerrainGenerator::new(&settings.seed),
            dims,
            grid: RwLock::new(ActiveGrid::new(dims, observer_chunk)),
            cache: Mutex::new(ChunkCache::new(
                settings.cache.capacity,
                settings.cache.eviction_batch,
            )),
            queues: UpdateQueues::new(
                settings.queues.important,
                settings.queues.normal,
                settings.queues.mesh_upload,
            ),
            day: Mutex::new(DayCycle::new(
                settings.daytime.start_hour,
                settings.daytime.hour_interval(),
                settings.light.min_light,
                settings.light.max_light,
                Instant::now(),
            )),
            observer: RwLock::new(observer),
            rng: Mutex::new(StdRng::seed_from_u64(seed_hash(&settings.seed))),
            world_generated: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            workers: Mutex::new(None),
            settings,
        }
    }

    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Spawns the generation and streaming workers.
    pub fn start(self: &Arc<Self>) -> anyhow::Result<()> {
        let mut workers = self.workers.lock();
        if workers.is_none() {
            self.shutdown.store(false, Ordering::SeqCst);
            *workers = Some(WorkerHandles::spawn(self)?);
        }
        Ok(())
    }

    /// Stops and joins the background workers.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.queues.notify_all();
        let handles = self.workers.lock().take();
        if let Some(handles) = handles {
            handles.join();
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn set_observer_position(&self, position: Vec3) {
        *self.observer.write() = position;
    }

    pub fn observer_position(&self) -> Vec3 {
        *self.observer.read()
    }

    fn observer_chunk(&self) -> ChunkPos {
        let position = self.observer_position();
        ChunkPos::containing_point(position.x, position.z)
    }

    pub fn is_world_generated(&self) -> bool {
        self.world_generated.load(Ordering::Acquire)
    }

    pub fn daylight(&self) -> f32 {
        self.day.lock().daylight()
    }

    pub fn daylight_color(&self) -> Vec3 {
        daytime::daylight_color(self.daylight())
    }

    /// Current in-world hour.
    pub fn daytime(&self) -> u8 {
        self.day.lock().hour()
    }

    fn light_params(&self) -> LightParams {
        LightParams {
            daylight: self.daylight(),
            min_light: self.settings.light.min_light,
        }
    }

    pub fn stats(&self) -> WorldStats {
        WorldStats {
            mesh_uploads: self.queues.upload_len(),
            important: self.queues.important_len(),
            normal: self.queues.normal_len(),
            cached: self.cache.lock().len(),
        }
    }

    // ---- chunk lookup ----

    /// Cache lookup or creation that never touches the grid. Used while the
    /// caller already holds the grid lock.
    fn load_or_create_cached(&self, pos: ChunkPos, observer: ChunkPos) -> ChunkRef {
        let dims = self.dims;
        self.cache
            .lock()
            .get_or_create(pos, observer, |p| footprint_contains(dims, observer, p))
    }

    fn load_or_create(&self, pos: ChunkPos) -> ChunkRef {
        let grid = self.grid.read();
        if let Some(chunk) = grid.get(pos) {
            return chunk;
        }
        self.load_or_create_cached(pos, grid.observer())
    }

    fn find_chunk(&self, pos: ChunkPos) -> Option<ChunkRef> {
        let grid = self.grid.read();
        grid.get(pos).or_else(|| self.cache.lock().get(pos))
    }

    /// Generates and lights the chunk if that has not happened yet.
    fn ensure_generated(&self, chunk: &mut Chunk, params: LightParams) {
        if chunk.generate(&self.generator) {
            chunk.calc_light(params);
        }
    }

    // ---- block and light access ----

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> u8 {
        let Some((pos, local)) = split_world(x, y, z) else {
            return 0;
        };
        match self.find_chunk(pos) {
            Some(chunk) => chunk.read().get_block_local(local),
            None => 0,
        }
    }

    /// Writes a block. With `update`, the column's sunlight is recomputed,
    /// touched border neighbors are dirtied and the chunk is queued as an
    /// important update.
    pub fn set_block(&self, x: i32, y: i32, z: i32, block: u8, update: bool) {
        let Some((pos, local)) = split_world(x, y, z) else {
            return;
        };
        let chunk = self.load_or_create(pos);
        let params = self.light_params();

        {
            let mut c = chunk.write();
            self.ensure_generated(&mut c, params);
            c.set_block(local.x, local.y, local.z, block);
            if update {
                c.calc_sunlight_at_local_pos(local.x, local.z, params);
            }
        }

        if update {
            if local.is_on_border() {
                let neighbors: Vec<ChunkRef> = {
                    let grid = self.grid.read();
                    local
                        .border_neighbors(pos)
                        .into_iter()
                        .filter_map(|n| grid.get(n))
                        .collect()
                };
                for neighbor in neighbors {
                    neighbor.write().mark_dirty();
                }
            }
            self.queues.push_important(chunk);
        }
    }

    pub fn get_light(&self, x: i32, y: i32, z: i32) -> f32 {
        let Some((pos, local)) = split_world(x, y, z) else {
            return 0.0;
        };
        match self.find_chunk(pos) {
            Some(chunk) => chunk.read().get_light(local.x, local.y, local.z),
            None => 0.0,
        }
    }

    pub fn set_light(&self, x: i32, y: i32, z: i32, intensity: f32) {
        let Some((pos, local)) = split_world(x, y, z) else {
            return;
        };
        let chunk = self.load_or_create(pos);
        let params = self.light_params();
        let mut c = chunk.write();
        self.ensure_generated(&mut c, params);
        c.set_light(local.x, local.y, local.z, intensity);
    }

    // ---- picking ----

    pub fn vertices_for_block_at(&self, x: i32, y: i32, z: i32) -> [Vec3; 8] {
        raycast::vertices_for_block_at(x, y, z)
    }

    /// Faces of the block at `(x, y, z)` crossed by the ray, nearest first.
    /// Empty for air.
    pub fn ray_block_intersection(
        &self,
        x: i32,
        y: i32,
        z: i32,
        origin: Vec3,
        direction: Vec3,
    ) -> Vec<RayFaceIntersection> {
        if self.get_block(x, y, z) == BlockType::Air.id() {
            return Vec::new();
        }
        raycast::intersect_block(IVec3::new(x, y, z), origin, direction)
    }

    /// The first non-air, non-water block along the ray within `max_distance`,
    /// as the face the ray enters through.
    pub fn pick_block(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<RayFaceIntersection> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut pos = origin;
        let mut prev = origin.floor().as_ivec3();
        for _ in 0..(max_distance / PICK_STEP) as i32 {
            pos += dir * PICK_STEP;
            let current = pos.floor().as_ivec3();
            if current == prev {
                continue;
            }
            prev = current;

            let block = self.get_block(current.x, current.y, current.z);
            if block == BlockType::Air.id() || block == BlockType::Water.id() {
                continue;
            }
            if let Some(hit) = self
                .ray_block_intersection(current.x, current.y, current.z, origin, dir)
                .into_iter()
                .next()
            {
                return Some(hit);
            }
        }
        None
    }

    // ---- structures ----

    pub fn generate_tree(&self, x: i32, y: i32, z: i32, update: bool) {
        let tree = {
            let mut rng = self.rng.lock();
            let height = rng.random_range(6..8);
            Structure::tree(height, |_, _, _| rng.random_bool(0.8))
        };
        self.place_structure(&tree, x, y, z, update);
    }

    pub fn generate_pine_tree(&self, x: i32, y: i32, z: i32, update: bool) {
        let height = self.rng.lock().random_range(12..16);
        self.place_structure(&Structure::pine_tree(height), x, y, z, update);
    }

    fn place_structure(&self, structure: &Structure, x: i32, y: i32, z: i32, update: bool) {
        debug!("Placing {} at {},{},{}", structure.name, x, y, z);
        for &(dx, dy, dz, block) in &structure.blocks {
            self.set_block(x + dx, y + dy, z + dz, block.id(), update);
        }
    }

    // ---- streaming ----

    /// Fills every grid cell around the observer and queues it for processing.
    pub fn generate_initial_grid(&self) {
        let start = Instant::now();
        info!("Generating chunks. Please wait...");

        let observer = self.observer_chunk();
        let mut grid = self.grid.write();
        grid.set_observer(observer);
        for (_, pos) in grid.stale_cells() {
            let chunk = self.load_or_create_cached(pos, observer);
            grid.set(Arc::clone(&chunk));
            self.queues.push_normal(chunk);
        }
        drop(grid);

        self.world_generated.store(true, Ordering::Release);
        info!("Chunks created! ({:.3}s)", start.elapsed().as_secs_f64());
    }

    /// Replaces every grid cell that no longer matches the observer's window.
    /// Returns the number of replaced cells.
    pub fn update_streaming(&self) -> usize {
        if !self.is_world_generated() {
            return 0;
        }

        let observer = self.observer_chunk();
        let mut grid = self.grid.write();
        if grid.observer() != observer {
            grid.set_observer(observer);
        }

        let stale = grid.stale_cells();
        for &(_, pos) in &stale {
            let chunk = self.load_or_create_cached(pos, observer);
            if let Some(old) = grid.set(Arc::clone(&chunk)) {
                self.queues.remove_normal(old.position());
                debug!(
                    "Streamed chunk {},{} out, {},{} in",
                    old.position().x,
                    old.position().z,
                    pos.x,
                    pos.z
                );
            }
            self.queues.push_normal(chunk);
        }
        stale.len()
    }

    /// Queues every active chunk for an ambient update.
    pub fn update_all_chunks(&self) {
        let chunks = self.grid.read().chunks();
        for chunk in chunks {
            self.queues.push_normal(chunk);
        }
    }

    // ---- processing ----

    /// Takes one chunk off the update queues and processes it.
    /// Returns `false` if both queues were empty, or if the upload backlog
    /// is full and has to be drained with [`World::update`] first.
    pub fn process_next_update(&self) -> bool {
        if self.queues.upload_backlog_full() {
            return false;
        }
        match self.queues.try_next(self.observer_chunk()) {
            Some(chunk) => {
                self.process_chunk(&chunk);
                true
            }
            None => false,
        }
    }

    pub(crate) fn process_next_update_blocking(&self, timeout: Duration) {
        if self.queues.upload_backlog_full() {
            thread::sleep(timeout);
            return;
        }
        if let Some(chunk) = self.queues.next_work(self.observer_chunk(), timeout) {
            self.process_chunk(&chunk);
        }
    }

    /// Generates, lights and meshes a chunk. Dirty active neighbors are
    /// rebuilt first so the center's mesh never goes out ahead of theirs.
    pub fn process_chunk(&self, chunk: &ChunkRef) {
        self.prepare(chunk);

        let neighbors = self.grid.read().neighbors(chunk.position());
        for neighbor in neighbors.iter().flatten() {
            self.prepare(neighbor);
            if neighbor.read().is_dirty() {
                self.rebuild_mesh(neighbor);
            }
        }

        if chunk.read().is_dirty() {
            self.rebuild_mesh(chunk);
        }
    }

    fn prepare(&self, chunk: &ChunkRef) {
        let mut c = chunk.write();
        c.generate(&self.generator);
        if c.is_dirty() {
            c.calc_light(self.light_params());
        }
    }

    fn rebuild_mesh(&self, chunk: &ChunkRef) {
        let neighbors = self.grid.read().neighbors(chunk.position());
        let guards: [Option<RwLockReadGuard<'_, Chunk>>; 4] =
            neighbors.each_ref().map(|n| n.as_ref().map(|h| h.read()));

        let mesh = {
            let mut center = chunk.write();
            // daylight may have moved on since the chunk was prepared
            let params = self.light_params();
            if center.lit_daylight() != Some(params.daylight) {
                center.calc_light(params);
            }
            let mesh = build_chunk_mesh(&center, guards.each_ref().map(|g| g.as_deref()));
            center.set_mesh(mesh);
            center.mesh().cloned()
        };
        drop(guards);

        if let Some(mesh) = mesh {
            debug!("Meshed chunk {},{}", chunk.position().x, chunk.position().z);
            self.queues.push_upload(MeshUpload {
                chunk: Arc::clone(chunk),
                mesh,
            });
        }
    }

    // ---- daytime ----

    /// Advances the clock if an hour of wall time has passed.
    pub fn update_daytime(&self, now: Instant) {
        let changed = {
            let mut day = self.day.lock();
            let before = day.hour();
            let changed = day.update(now);
            if day.hour() != before {
                info!("Updated daytime to {}h.", day.hour());
            }
            changed
        };
        if changed.is_some() {
            self.on_daylight_changed();
        }
    }

    /// Sets the clock to `hour` and applies that hour's daylight.
    pub fn advance_daytime_to(&self, hour: u8) {
        let changed = self.day.lock().set_hour(hour);
        info!("Updated daytime to {}h.", hour);
        if changed.is_some() {
            self.on_daylight_changed();
        }
    }

    /// Dirties every remembered chunk, but only queues the active ones.
    fn on_daylight_changed(&self) {
        let cached = self.cache.lock().chunks();
        for chunk in &cached {
            chunk.write().mark_dirty();
        }

        let active = self.grid.read().chunks();
        for chunk in active {
            chunk.write().mark_dirty();
            self.queues.push_normal(chunk);
        }
    }

    // ---- frame ----

    /// Hands at most `max_uploads_per_frame` finished meshes to the renderer.
    /// Returns how many were uploaded.
    pub fn update(&self, _delta: f32, renderer: &mut impl ChunkRenderer) -> usize {
        let uploads = self
            .queues
            .drain_uploads(self.settings.queues.max_uploads_per_frame);
        for upload in &uploads {
            renderer.upload(upload.chunk.position(), &upload.mesh);
            upload.chunk.mark_uploaded();
        }
        uploads.len()
    }

    /// Draws every uploaded active chunk, opaque geometry first.
    /// Returns the number of draw calls issued.
    pub fn render(&self, renderer: &mut impl ChunkRenderer) -> usize {
        let visible: Vec<ChunkPos> = {
            let grid = self.grid.read();
            grid.chunks()
                .into_iter()
                .filter(|c| c.is_uploaded() && grid.footprint_contains(c.position()))
                .map(|c| c.position())
                .collect()
        };

        for pass in RenderPass::ALL {
            for &pos in &visible {
                renderer.draw(pos, pass);
            }
        }
        visible.len() * RenderPass::ALL.len()
    }
}

impl Drop for World {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.queues.notify_all();
        if let Some(handles) = self.workers.get_mut().take() {
            handles.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::CHUNK_SIZE_Y;
    use crate::utils::settings::GridSettings;

    fn small_world(seed: &str) -> World {
        let mut settings = WorldSettings::default();
        settings.seed = seed.to_string();
        settings.viewing_distance = GridSettings {
            width: 4,
            height: 1,
            depth: 4,
        };
        World::new(settings)
    }

    fn drain(world: &World) {
        while world.process_next_update() {}
    }

    #[test]
    fn test_set_then_get_block() {
        let world = small_world("roundtrip");
        world.set_block(3, 100, -7, BlockType::Wood.id(), false);
        assert_eq!(world.get_block(3, 100, -7), BlockType::Wood.id());
        world.set_block(3, 101, -7, BlockType::Leaves.id(), true);
        assert_eq!(world.get_block(3, 101, -7), BlockType::Leaves.id());
    }

    #[test]
    fn test_out_of_range_reads_are_sentinels() {
        let world = small_world("sentinel");
        assert_eq!(world.get_block(0, -1, 0), 0);
        assert_eq!(world.get_block(0, CHUNK_SIZE_Y, 0), 0);
        assert_eq!(world.get_light(0, -5, 0), 0.0);
        // no chunk exists yet
        assert_eq!(world.get_block(5000, 10, 5000), 0);
        world.set_block(0, CHUNK_SIZE_Y + 3, 0, 1, true);
        assert_eq!(world.stats().cached, 0);
    }

    #[test]
    fn test_initial_grid_fills_and_queues_footprint() {
        let world = small_world("initial");
        assert!(!world.is_world_generated());
        assert_eq!(world.update_streaming(), 0);

        world.generate_initial_grid();
        assert!(world.is_world_generated());
        let stats = world.stats();
        assert_eq!(stats.cached, 16);
        assert_eq!(stats.normal, 16);
    }

    #[test]
    fn test_processing_meshes_every_active_chunk() {
        let world = small_world("process");
        world.generate_initial_grid();
        drain(&world);
        assert_eq!(world.stats().mesh_uploads, 16);

        struct Count(usize);
        impl ChunkRenderer for Count {
            fn upload(&mut self, _: ChunkPos, _: &crate::render::mesh::ChunkMesh) {
                self.0 += 1;
            }
            fn draw(&mut self, _: ChunkPos, _: RenderPass) {}
        }
        let mut renderer = Count(0);
        assert_eq!(world.update(0.016, &mut renderer), 8);
        assert_eq!(world.update(0.016, &mut renderer), 8);
        assert_eq!(world.update(0.016, &mut renderer), 0);
        assert_eq!(renderer.0, 16);
        assert_eq!(world.render(&mut renderer), 32);
    }

    #[test]
    fn test_streaming_replaces_one_column() {
        let world = small_world("stream");
        world.generate_initial_grid();
        drain(&world);

        world.set_observer_position(Vec3::new(16.5, 80.0, 0.5));
        assert_eq!(world.update_streaming(), 4);
        assert_eq!(world.update_streaming(), 0);
        assert_eq!(world.stats().cached, 20);
    }

    #[test]
    fn test_daylight_change_queues_active_chunks() {
        let world = small_world("daylight");
        world.generate_initial_grid();
        drain(&world);
        assert_eq!(world.daylight(), 1.0);

        world.advance_daytime_to(18);
        assert_eq!(world.daylight(), 0.8);
        assert_eq!(world.stats().normal, 16);

        world.advance_daytime_to(23);
        assert_eq!(world.daylight(), world.settings().light.min_light);
        world.advance_daytime_to(8);
        assert_eq!(world.daylight(), world.settings().light.max_light);
    }

    #[test]
    fn test_synchronous_drain_never_blocks_on_uploads() {
        let mut settings = WorldSettings::default();
        settings.seed = "backlog".to_string();
        settings.viewing_distance = GridSettings {
            width: 4,
            height: 1,
            depth: 4,
        };
        settings.queues.mesh_upload = 4;
        let world = World::new(settings);
        world.generate_initial_grid();

        struct Count(usize);
        impl ChunkRenderer for Count {
            fn upload(&mut self, _: ChunkPos, _: &crate::render::mesh::ChunkMesh) {
                self.0 += 1;
            }
            fn draw(&mut self, _: ChunkPos, _: RenderPass) {}
        }
        let mut renderer = Count(0);

        drain(&world);
        assert!(world.stats().mesh_uploads >= 4);
        assert!(world.stats().normal > 0);

        loop {
            drain(&world);
            if world.update(0.016, &mut renderer) == 0 {
                break;
            }
        }
        assert_eq!(renderer.0, 16);
        assert_eq!(world.stats().normal, 0);
    }

    #[test]
    fn test_update_all_chunks_requeues_grid() {
        let world = small_world("requeue");
        world.generate_initial_grid();
        drain(&world);
        assert_eq!(world.stats().normal, 0);

        world.update_all_chunks();
        assert_eq!(world.stats().normal, 16);
    }

    #[test]
    fn test_stats_display() {
        let stats = WorldStats {
            mesh_uploads: 1,
            important: 2,
            normal: 3,
            cached: 4,
        };
        assert_eq!(stats.to_string(), "world (cdl: 1, ci: 2, cn: 3, cache: 4)");
    }
}
