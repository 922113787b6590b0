use bytemuck::Pod;

/// Default scratch capacity per worker, 16 MiB.
pub const DEFAULT_ARENA_CAPACITY: usize = 16 * 1024 * 1024;

/// Per-worker bump arena.
///
/// The backing buffer is allocated once, before the worker thread starts, and
/// reused for every task the worker executes. `reset` reclaims all scratch at
/// once between tasks. The arena is never shared between threads.
pub struct Arena {
    buf: Vec<u8>,
    used: usize,
}

impl Arena {
    pub fn with_capacity(bytes: usize) -> Arena {
        Arena {
            buf: vec![0; bytes],
            used: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn used(&self) -> usize {
        self.used
    }

    /// Reclaims all outstanding scratch. Allocations made after a reset reuse
    /// the same backing memory.
    pub fn reset(&mut self) {
        self.used = 0;
    }

    /// Hands out a zeroed slice of `len` elements.
    ///
    /// Grows the backing buffer when a single task's scratch outgrows the
    /// pre-allocated capacity; running out of memory there aborts, which
    /// matches the fatal-allocation-failure policy of the render driver.
    pub fn alloc_slice<T: Pod>(&mut self, len: usize) -> &mut [T] {
        let bytes_needed = len * size_of::<T>() + align_of::<T>();
        let start = self.used;
        let end = start + bytes_needed;
        if end > self.buf.len() {
            self.buf.resize(end.max(self.buf.len() * 2), 0);
        }
        self.used = end;

        let region = &mut self.buf[start..end];
        region.fill(0);
        let (_, aligned, _) = bytemuck::pod_align_to_mut::<u8, T>(region);
        &mut aligned[..len]
    }
}
