use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::constants::{STREAMING_TICK, WORKER_IDLE_WAIT};
use crate::world::terrain::World;

/// The generation and streaming threads of one world.
///
/// The threads only hold a [`Weak`] reference and exit once the world is
/// shutting down or gone. Dropping the handles joins them, so the caller
/// must set the world's shutdown flag first.
pub struct WorkerHandles {
    threads: Vec<JoinHandle<()>>,
}

impl WorkerHandles {
    pub(crate) fn spawn(world: &Arc<World>) -> Result<Self> {
        let mut handles = WorkerHandles {
            threads: Vec::with_capacity(2),
        };

        let generation_world = Arc::downgrade(world);
        handles.threads.push(
            thread::Builder::new()
                .name("chunk-generation".to_string())
                .spawn(move || generation_loop(generation_world))
                .context("Failed to spawn chunk generation worker")?,
        );

        let streaming_world = Arc::downgrade(world);
        let streaming = thread::Builder::new()
            .name("chunk-streaming".to_string())
            .spawn(move || streaming_loop(streaming_world));
        match streaming {
            Ok(handle) => handles.threads.push(handle),
            Err(err) => {
                world.shutdown.store(true, Ordering::SeqCst);
                world.queues.notify_all();
                drop(handles);
                return Err(err).context("Failed to spawn chunk streaming worker");
            }
        }

        info!("Started {} world workers", handles.threads.len());
        Ok(handles)
    }

    /// Waits for both threads to finish.
    pub fn join(mut self) {
        self.join_all();
    }

    fn join_all(&mut self) {
        let current = thread::current().id();
        for handle in self.threads.drain(..) {
            // the last reference to the world was dropped on this worker
            if handle.thread().id() == current {
                continue;
            }
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                warn!("World worker {} panicked", name);
            }
        }
    }
}

impl Drop for WorkerHandles {
    fn drop(&mut self) {
        self.join_all();
    }
}

fn generation_loop(weak: Weak<World>) {
    if let Some(world) = weak.upgrade() {
        world.generate_initial_grid();
    }
    while let Some(world) = weak.upgrade() {
        if world.is_shutting_down() {
            break;
        }
        world.process_next_update_blocking(WORKER_IDLE_WAIT);
    }
    info!("Chunk generation worker stopped");
}

fn streaming_loop(weak: Weak<World>) {
    while let Some(world) = weak.upgrade() {
        if world.is_shutting_down() {
            break;
        }
        world.update_streaming();
        world.update_daytime(Instant::now());
        drop(world);
        thread::sleep(STREAMING_TICK);
    }
    info!("Chunk streaming worker stopped");
}
