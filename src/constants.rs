use std::time::Duration;

// Chunk dimensions in blocks
pub const CHUNK_SIZE_X: i32 = 16;
pub const CHUNK_SIZE_Y: i32 = 128;
pub const CHUNK_SIZE_Z: i32 = 16;
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z) as usize;

// Active grid defaults (in chunks)
pub const VIEWING_DISTANCE_X: i32 = 16;
pub const VIEWING_DISTANCE_Y: i32 = 1;
pub const VIEWING_DISTANCE_Z: i32 = 16;

// Terrain
pub const SEA_LEVEL: i32 = 32;
pub const TERRAIN_BASE_HEIGHT: f32 = 40.0;
pub const TERRAIN_AMPLITUDE: f32 = 28.0;

// Lighting
pub const MIN_LIGHT: f32 = 0.1;
pub const MAX_LIGHT: f32 = 1.0;
/// Fraction of light kept per block of depth below the first occluder.
pub const LIGHT_ATTENUATION: f32 = 0.8;
/// Light lost per step when spreading sideways into covered air.
pub const LIGHT_SPREAD_FALLOFF: f32 = 0.15;

// Cache
pub const CHUNK_CACHE_CAPACITY: usize = 1024;
pub const CHUNK_CACHE_EVICTION_BATCH: usize = 256;

// Update queues
pub const IMPORTANT_QUEUE_CAPACITY: usize = 256;
pub const NORMAL_QUEUE_CAPACITY: usize = 2056;
pub const MESH_UPLOAD_QUEUE_CAPACITY: usize = 128;
pub const MAX_MESH_UPLOADS_PER_FRAME: usize = 8;

// Daytime
pub const HOURS_PER_DAY: u8 = 24;
pub const START_HOUR: u8 = 17;
pub const HOUR_INTERVAL: Duration = Duration::from_secs(30);

// Workers
pub const WORKER_IDLE_WAIT: Duration = Duration::from_millis(50);
pub const STREAMING_TICK: Duration = Duration::from_millis(20);
