use crate::core::chunk::ChunkRef;
use crate::core::position::ChunkPos;

/// Size of the active window in chunks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridDims {
    pub width: i32,
    pub depth: i32,
}

impl GridDims {
    pub fn new(width: i32, depth: i32) -> Self {
        Self {
            width: width.max(1),
            depth: depth.max(1),
        }
    }

    pub fn cell_count(&self) -> usize {
        (self.width * self.depth) as usize
    }
}

/// The window of chunks eligible for display, stored as a toroidal ring buffer.
///
/// A chunk at `(x, z)` always lives in cell `(x mod width, z mod depth)`, so
/// moving the observer by one chunk invalidates exactly one row or column of
/// cells and leaves the rest in place. A cell is stale when it is empty or
/// holds a chunk other than the one the current observer expects there.
pub struct ActiveGrid {
    dims: GridDims,
    observer: ChunkPos,
    cells: Vec<Option<ChunkRef>>,
}

impl ActiveGrid {
    pub fn new(dims: GridDims, observer: ChunkPos) -> Self {
        Self {
            dims,
            observer,
            cells: vec![None; dims.cell_count()],
        }
    }

    pub fn dims(&self) -> GridDims {
        self.dims
    }

    pub fn observer(&self) -> ChunkPos {
        self.observer
    }

    pub fn set_observer(&mut self, observer: ChunkPos) {
        self.observer = observer;
    }

    fn start(&self) -> ChunkPos {
        ChunkPos::new(
            self.observer.x - self.dims.width / 2,
            self.observer.z - self.dims.depth / 2,
        )
    }

    fn cell_index(&self, pos: ChunkPos) -> usize {
        let ix = pos.x.rem_euclid(self.dims.width);
        let iz = pos.z.rem_euclid(self.dims.depth);
        (ix * self.dims.depth + iz) as usize
    }

    /// Chunk coordinate cell `index` should hold for the current observer.
    pub fn expected_position(&self, index: usize) -> ChunkPos {
        let ix = index as i32 / self.dims.depth;
        let iz = index as i32 % self.dims.depth;
        let start = self.start();
        ChunkPos::new(
            start.x + (ix - start.x).rem_euclid(self.dims.width),
            start.z + (iz - start.z).rem_euclid(self.dims.depth),
        )
    }

    /// Whether `pos` is inside the window around the current observer.
    pub fn footprint_contains(&self, pos: ChunkPos) -> bool {
        footprint_contains(self.dims, self.observer, pos)
    }

    /// The active chunk at `pos`, if the grid currently holds it.
    pub fn get(&self, pos: ChunkPos) -> Option<ChunkRef> {
        self.cells[self.cell_index(pos)]
            .as_ref()
            .filter(|chunk| chunk.position() == pos)
            .cloned()
    }

    /// Places `chunk` in its cell and returns whatever was there before.
    pub fn set(&mut self, chunk: ChunkRef) -> Option<ChunkRef> {
        let index = self.cell_index(chunk.position());
        self.cells[index].replace(chunk)
    }

    /// Cells that are empty or hold a chunk the observer no longer expects,
    /// paired with the position that belongs there.
    pub fn stale_cells(&self) -> Vec<(usize, ChunkPos)> {
        (0..self.cells.len())
            .filter_map(|index| {
                let expected = self.expected_position(index);
                match &self.cells[index] {
                    Some(chunk) if chunk.position() == expected => None,
                    _ => Some((index, expected)),
                }
            })
            .collect()
    }

    /// Every chunk currently held, including stale ones not yet replaced.
    pub fn chunks(&self) -> Vec<ChunkRef> {
        self.cells.iter().flatten().cloned().collect()
    }

    /// Active chunks adjacent to `pos`, in -x, +x, -z, +z order.
    pub fn neighbors(&self, pos: ChunkPos) -> [Option<ChunkRef>; 4] {
        pos.neighbors().map(|n| self.get(n))
    }

    /// Every position of the window around the current observer.
    pub fn footprint(&self) -> Vec<ChunkPos> {
        (0..self.cells.len())
            .map(|index| self.expected_position(index))
            .collect()
    }
}

/// Footprint test usable without holding the grid.
pub fn footprint_contains(dims: GridDims, observer: ChunkPos, pos: ChunkPos) -> bool {
    let sx = observer.x - dims.width / 2;
    let sz = observer.z - dims.depth / 2;
    (sx..sx + dims.width).contains(&pos.x) && (sz..sz + dims.depth).contains(&pos.z)
}
