use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use parking_lot::{Condvar, Mutex};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use tracing::warn;

use crate::core::chunk::ChunkRef;
use crate::core::position::ChunkPos;
use crate::render::mesh::ChunkMesh;

/// A finished mesh waiting to be handed to the renderer.
pub struct MeshUpload {
    pub chunk: ChunkRef,
    pub mesh: Arc<ChunkMesh>,
}

/// Chunks waiting for ambient work, popped nearest to the observer first.
///
/// Keys are squared distances to `center`. When the observer moves to another
/// chunk the heap is rebuilt once on the next pop. Removed entries stay in
/// the heap and are skipped when they surface.
struct NormalQueue {
    heap: BinaryHeap<Reverse<(i64, ChunkPos)>>,
    members: HashMap<ChunkPos, ChunkRef>,
    center: ChunkPos,
}

impl NormalQueue {
    fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            members: HashMap::default(),
            center: ChunkPos::default(),
        }
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn contains(&self, pos: ChunkPos) -> bool {
        self.members.contains_key(&pos)
    }

    fn push(&mut self, chunk: ChunkRef) {
        let pos = chunk.position();
        self.heap.push(Reverse((pos.distance_sq(self.center), pos)));
        self.members.insert(pos, chunk);
        if self.heap.len() > self.members.len() * 2 + 64 {
            self.rebuild(self.center);
        }
    }

    fn remove(&mut self, pos: ChunkPos) -> Option<ChunkRef> {
        self.members.remove(&pos)
    }

    fn rebuild(&mut self, center: ChunkPos) {
        self.center = center;
        self.heap = self
            .members
            .keys()
            .map(|&pos| Reverse((pos.distance_sq(center), pos)))
            .collect();
    }

    fn pop(&mut self, observer: ChunkPos) -> Option<ChunkRef> {
        if observer != self.center {
            self.rebuild(observer);
        }
        while let Some(Reverse((_, pos))) = self.heap.pop() {
            if let Some(chunk) = self.members.remove(&pos) {
                return Some(chunk);
            }
        }
        None
    }
}

struct QueueState {
    important: VecDeque<ChunkRef>,
    important_members: HashSet<ChunkPos>,
    normal: NormalQueue,
}

impl QueueState {
    fn pop(&mut self, observer: ChunkPos) -> Option<ChunkRef> {
        if let Some(chunk) = self.important.pop_front() {
            self.important_members.remove(&chunk.position());
            return Some(chunk);
        }
        self.normal.pop(observer)
    }

    fn is_empty(&self) -> bool {
        self.important.is_empty() && self.normal.len() == 0
    }
}

/// The important and normal update queues plus the bounded mesh-upload channel.
///
/// Important entries always preempt normal ones. A chunk is in at most one
/// of the two update queues at a time.
///
/// Pushing a mesh never blocks. Meshes that do not fit in the channel wait
/// in `upload_overflow`, and once that is non-empty every later mesh goes
/// there too, so uploads come out in the order they were pushed. Producers
/// stop taking work while [`UpdateQueues::upload_backlog_full`] holds, which
/// bounds the overflow to the meshes of a single processing step.
pub struct UpdateQueues {
    state: Mutex<QueueState>,
    work_ready: Condvar,
    important_capacity: usize,
    normal_capacity: usize,
    upload_capacity: usize,
    upload_tx: Sender<MeshUpload>,
    upload_rx: Receiver<MeshUpload>,
    upload_overflow: Mutex<VecDeque<MeshUpload>>,
}

impl UpdateQueues {
    pub fn new(important_capacity: usize, normal_capacity: usize, upload_capacity: usize) -> Self {
        let upload_capacity = upload_capacity.max(1);
        let (upload_tx, upload_rx) = bounded(upload_capacity);
        Self {
            state: Mutex::new(QueueState {
                important: VecDeque::with_capacity(important_capacity),
                important_members: HashSet::default(),
                normal: NormalQueue::new(),
            }),
            work_ready: Condvar::new(),
            important_capacity,
            normal_capacity,
            upload_capacity,
            upload_tx,
            upload_rx,
            upload_overflow: Mutex::new(VecDeque::new()),
        }
    }

    /// Queues an edit-triggered update. Returns `false` if the queue is full.
    pub fn push_important(&self, chunk: ChunkRef) -> bool {
        let pos = chunk.position();
        let mut state = self.state.lock();
        if state.important_members.contains(&pos) {
            return true;
        }
        if state.important.len() >= self.important_capacity {
            warn!("Important update queue full, dropping chunk {},{}", pos.x, pos.z);
            return false;
        }
        state.normal.remove(pos);
        state.important_members.insert(pos);
        state.important.push_back(chunk);
        drop(state);
        self.work_ready.notify_one();
        true
    }

    /// Queues an ambient update. Returns `false` if the queue is full.
    pub fn push_normal(&self, chunk: ChunkRef) -> bool {
        let pos = chunk.position();
        let mut state = self.state.lock();
        if state.important_members.contains(&pos) || state.normal.contains(pos) {
            return true;
        }
        if state.normal.len() >= self.normal_capacity {
            warn!("Normal update queue full, dropping chunk {},{}", pos.x, pos.z);
            return false;
        }
        state.normal.push(chunk);
        drop(state);
        self.work_ready.notify_one();
        true
    }

    /// Drops a pending ambient update, e.g. for a chunk that left the grid.
    pub fn remove_normal(&self, pos: ChunkPos) -> bool {
        self.state.lock().normal.remove(pos).is_some()
    }

    /// Pops the next chunk to process without waiting.
    pub fn try_next(&self, observer: ChunkPos) -> Option<ChunkRef> {
        self.state.lock().pop(observer)
    }

    /// Pops the next chunk to process, waiting up to `timeout` for one to arrive.
    pub fn next_work(&self, observer: ChunkPos, timeout: Duration) -> Option<ChunkRef> {
        let mut state = self.state.lock();
        if state.is_empty() {
            self.work_ready.wait_for(&mut state, timeout);
        }
        state.pop(observer)
    }

    /// Wakes a worker blocked in [`UpdateQueues::next_work`].
    pub fn notify_all(&self) {
        self.work_ready.notify_all();
    }

    pub fn important_len(&self) -> usize {
        self.state.lock().important.len()
    }

    pub fn normal_len(&self) -> usize {
        self.state.lock().normal.len()
    }

    pub fn upload_len(&self) -> usize {
        let overflow = self.upload_overflow.lock();
        self.upload_rx.len() + overflow.len()
    }

    /// Whether as many meshes are waiting as the channel holds.
    pub fn upload_backlog_full(&self) -> bool {
        self.upload_len() >= self.upload_capacity
    }

    /// Hands a finished mesh to the foreground without blocking.
    pub fn push_upload(&self, upload: MeshUpload) {
        let mut overflow = self.upload_overflow.lock();
        if !overflow.is_empty() {
            overflow.push_back(upload);
            return;
        }
        match self.upload_tx.try_send(upload) {
            Ok(()) => {}
            Err(TrySendError::Full(upload)) => overflow.push_back(upload),
            // the receiver lives as long as the sender
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Takes at most `max` finished meshes in push order.
    pub fn drain_uploads(&self, max: usize) -> Vec<MeshUpload> {
        let mut overflow = self.upload_overflow.lock();
        let mut out = Vec::with_capacity(max.min(self.upload_rx.len() + overflow.len()));
        while out.len() < max {
            match self.upload_rx.try_recv() {
                Ok(upload) => out.push(upload),
                Err(_) => break,
            }
        }
        while out.len() < max {
            match overflow.pop_front() {
                Some(upload) => out.push(upload),
                None => break,
            }
        }
        out
    }
}
