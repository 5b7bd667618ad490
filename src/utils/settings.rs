use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::time::Duration;

use crate::constants::*;
use crate::world::grid::GridDims;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorldSettings {
    pub seed: String,
    pub title: String,
    pub viewing_distance: GridSettings,
    #[serde(default)]
    pub light: LightSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub queues: QueueSettings,
    #[serde(default)]
    pub daytime: DaytimeSettings,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            seed: "nitrox".to_string(),
            title: "Minestream".to_string(),
            viewing_distance: GridSettings::default(),
            light: LightSettings::default(),
            cache: CacheSettings::default(),
            queues: QueueSettings::default(),
            daytime: DaytimeSettings::default(),
        }
    }
}

/// Active grid size in chunks. The world is a single chunk layer, so
/// `height` other than 1 is treated as 1.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            width: VIEWING_DISTANCE_X,
            height: VIEWING_DISTANCE_Y,
            depth: VIEWING_DISTANCE_Z,
        }
    }
}

impl GridSettings {
    pub fn dims(&self) -> GridDims {
        GridDims::new(self.width, self.depth)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct LightSettings {
    pub min_light: f32,
    pub max_light: f32,
}

impl Default for LightSettings {
    fn default() -> Self {
        Self {
            min_light: MIN_LIGHT,
            max_light: MAX_LIGHT,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct CacheSettings {
    pub capacity: usize,
    pub eviction_batch: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: CHUNK_CACHE_CAPACITY,
            eviction_batch: CHUNK_CACHE_EVICTION_BATCH,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct QueueSettings {
    pub important: usize,
    pub normal: usize,
    pub mesh_upload: usize,
    pub max_uploads_per_frame: usize,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            important: IMPORTANT_QUEUE_CAPACITY,
            normal: NORMAL_QUEUE_CAPACITY,
            mesh_upload: MESH_UPLOAD_QUEUE_CAPACITY,
            max_uploads_per_frame: MAX_MESH_UPLOADS_PER_FRAME,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DaytimeSettings {
    pub start_hour: u8,
    pub hour_interval_secs: u64,
}

impl Default for DaytimeSettings {
    fn default() -> Self {
        Self {
            start_hour: START_HOUR,
            hour_interval_secs: HOUR_INTERVAL.as_secs(),
        }
    }
}

impl DaytimeSettings {
    pub fn hour_interval(&self) -> Duration {
        Duration::from_secs(self.hour_interval_secs)
    }
}

pub fn save_settings(path: &Path, settings: &WorldSettings) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create settings file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, settings).context("Failed to encode settings")?;
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<WorldSettings> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open settings file {}", path.display()))?;
    let mut reader = BufReader::new(file);
    let settings = bincode::deserialize_from(&mut reader).context("Failed to decode settings")?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_constants() {
        let settings = WorldSettings::default();
        assert_eq!(settings.viewing_distance.dims(), GridDims::new(16, 16));
        assert_eq!(settings.cache.capacity, 1024);
        assert_eq!(settings.cache.eviction_batch, 256);
        assert_eq!(settings.queues.normal, 2056);
        assert_eq!(settings.daytime.start_hour, 17);
        assert_eq!(settings.daytime.hour_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("minestream-settings-{}.bin", std::process::id()));
        let mut settings = WorldSettings::default();
        settings.seed = "saved".to_string();
        settings.viewing_distance.width = 8;

        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("minestream-does-not-exist.bin");
        assert!(load_settings(&path).is_err());
    }
}
