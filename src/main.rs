//! Minestream headless driver
//!
//! Starts the streaming workers, walks the observer across the world and feeds
//! finished meshes to a renderer that only counts what it is given.

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use glam::Vec3;
use rustc_hash::FxHashMap as HashMap;
use tracing::{info, warn};

use minestream::{
    CHUNK_SIZE_Y, ChunkMesh, ChunkPos, ChunkRenderer, RenderPass, World, WorldSettings, load_settings,
    save_settings,
};

const FRAME_TIME: Duration = Duration::from_millis(16);
const FRAMES_PER_REPORT: u64 = 60;

/// Headless chunk streaming engine
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// World seed (overrides the settings file)
    #[arg(long)]
    seed: Option<String>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Observer speed in blocks per frame along +x
    #[arg(long, default_value_t = 0.5)]
    speed: f32,

    /// Settings file (defaults to the per-user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,
}

/// Keeps the latest mesh per chunk and counts draw calls.
#[derive(Default)]
struct CountingRenderer {
    meshes: HashMap<ChunkPos, usize>,
    uploads: usize,
    opaque_draws: usize,
    translucent_draws: usize,
}

impl ChunkRenderer for CountingRenderer {
    fn upload(&mut self, pos: ChunkPos, mesh: &ChunkMesh) {
        self.uploads += 1;
        self.meshes
            .insert(pos, mesh.opaque.quad_count() + mesh.translucent.quad_count());
    }

    fn draw(&mut self, pos: ChunkPos, pass: RenderPass) {
        if !self.meshes.contains_key(&pos) {
            return;
        }
        match pass {
            RenderPass::Opaque => self.opaque_draws += 1,
            RenderPass::Translucent => self.translucent_draws += 1,
        }
    }
}

fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "minestream", "minestream")
        .map(|dirs| dirs.config_dir().join("settings.bin"))
}

fn load_or_default(path: Option<&PathBuf>) -> WorldSettings {
    let Some(path) = path else {
        return WorldSettings::default();
    };
    match load_settings(path) {
        Ok(settings) => {
            info!("Loaded settings from {}", path.display());
            settings
        }
        Err(err) => {
            warn!("Using default settings: {:#}", err);
            let settings = WorldSettings::default();
            if let Some(parent) = path.parent() {
                if std::fs::create_dir_all(parent).is_ok() {
                    if let Err(err) = save_settings(path, &settings) {
                        warn!("Could not write default settings: {:#}", err);
                    }
                }
            }
            settings
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let settings_path = args.settings.clone().or_else(default_settings_path);
    let mut settings = load_or_default(settings_path.as_ref());
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }

    info!("Starting Minestream with seed '{}'...", settings.seed);
    let world = Arc::new(World::new(settings));
    world.start().context("Failed to start world workers")?;

    let mut renderer = CountingRenderer::default();
    let mut observer = Vec3::new(0.5, 80.0, 0.5);
    let delta = FRAME_TIME.as_secs_f32();

    for frame in 0..args.ticks {
        if world.is_world_generated() {
            observer.x += args.speed;
            world.set_observer_position(observer);
        }

        world.update(delta, &mut renderer);
        world.render(&mut renderer);

        if frame % FRAMES_PER_REPORT == 0 {
            info!(
                "{} | {}h daylight {:.2} | uploads {} draws {}/{}",
                world.stats(),
                world.daytime(),
                world.daylight(),
                renderer.uploads,
                renderer.opaque_draws,
                renderer.translucent_draws
            );
        }

        thread::sleep(FRAME_TIME);
    }

    let (bx, bz) = (observer.x.floor() as i32, observer.z.floor() as i32);
    let ground = (0..CHUNK_SIZE_Y)
        .rev()
        .find(|&y| world.get_block(bx, y, bz) != 0);
    if let Some(y) = ground {
        let eye = Vec3::new(observer.x, y as f32 + 2.5, observer.z);
        if let Some(hit) = world.pick_block(eye, Vec3::NEG_Y, 8.0) {
            info!("Observer is standing on {:?} (face {:?})", hit.block, hit.face);
        }
    }

    world.shutdown();
    info!(
        "Finished: {} chunks meshed, {} uploads, {}",
        renderer.meshes.len(),
        renderer.uploads,
        world.stats()
    );
    Ok(())
}
