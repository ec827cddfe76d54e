//! State arena budget for compiled nodes.
//!
//! Each compiled node owns its state in a box, but every allocation is first
//! charged against a fixed-capacity [`StateArena`]. The arena is reserved up
//! front, bump-allocates aligned blocks, never frees individual blocks, and is
//! reset only as a whole. Running past capacity is a fatal error: the graph was
//! compiled against a budget too small for it.

/// Alignment of every arena block, in bytes.
pub const ARENA_ALIGN: usize = 16;

/// A block handed out by [`StateArena::alloc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArenaBlock {
    /// Byte offset of the block within the arena.
    pub offset: usize,
    /// Requested size in bytes.
    pub size: usize,
}

/// Fixed-capacity bump allocator accounting for compiled node state.
#[derive(Debug, Clone, Default)]
pub struct StateArena {
    capacity: usize,
    used: usize,
    blocks: usize,
}

impl StateArena {
    /// Creates an arena with `capacity` bytes reserved.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            blocks: 0,
        }
    }

    /// Releases every block and reserves `capacity` bytes.
    pub fn reset(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.clear();
    }

    /// Releases every block, keeping the capacity.
    pub fn clear(&mut self) {
        self.used = 0;
        self.blocks = 0;
    }

    /// Bump-allocates `size` bytes, rounded up to [`ARENA_ALIGN`].
    ///
    /// # Panics
    ///
    /// Panics if the allocation would exceed the reserved capacity.
    pub fn alloc(&mut self, size: usize) -> ArenaBlock {
        match self.try_alloc(size) {
            Some(block) => block,
            None => panic!(
                "state arena exhausted: {size} bytes requested, {} of {} used",
                self.used, self.capacity
            ),
        }
    }

    /// Bump-allocates `size` bytes, or returns `None` if it would not fit.
    pub fn try_alloc(&mut self, size: usize) -> Option<ArenaBlock> {
        let padded = size.checked_next_multiple_of(ARENA_ALIGN)?;
        let end = self.used.checked_add(padded)?;
        if end > self.capacity {
            return None;
        }
        let block = ArenaBlock {
            offset: self.used,
            size,
        };
        self.used = end;
        self.blocks += 1;
        Some(block)
    }

    /// Reserved capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes handed out so far, including alignment padding.
    pub fn used(&self) -> usize {
        self.used
    }

    /// Bytes still available.
    pub fn remaining(&self) -> usize {
        self.capacity - self.used
    }

    /// Number of live blocks.
    pub fn block_count(&self) -> usize {
        self.blocks
    }
}
