//! # Working set
//!
//! A fixed-capacity buffer of 4-byte slots, allocated once for the largest working set and
//! rewritten in place for every `(csize, stride)` pair. The active access pattern is a single
//! cycle through index 0: slot `i` holds `i + stride` for `i = 0, stride, 2*stride, ...`, and the
//! last populated slot (`csize - stride`) points back to 0. Each hop's address depends on the
//! previous load, so out-of-order execution and prefetchers can't hide the latency.
use std::hint::black_box;

/// Element type of the working set, the same width as a C `int`
pub type Slot = u32;

pub struct WorkingSet {
    slots: Box<[Slot]>,
    csize: usize,
    stride: usize,
}

impl WorkingSet {
    /// Allocate a zeroed working set holding up to `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(
            capacity <= Slot::MAX as usize,
            "working set capacity {capacity} doesn't fit in a slot index"
        );
        WorkingSet {
            slots: vec![0; capacity].into_boxed_slice(),
            csize: 0,
            stride: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Elements spanned by the current pattern
    pub fn csize(&self) -> usize {
        self.csize
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Size in bytes of the current pattern's span
    pub fn span_bytes(&self) -> usize {
        self.csize * size_of::<Slot>()
    }

    /// The active prefix of the buffer, `csize` slots long
    pub fn pattern(&self) -> &[Slot] {
        &self.slots[..self.csize]
    }

    /// Overwrite the buffer with the stride-`stride` cycle over the first `csize` slots.
    ///
    /// Panics if `csize` exceeds the capacity or the pair breaks the power-of-two / `stride <=
    /// csize / 2` invariants; the sweep never produces such a pair.
    pub fn arrange(&mut self, csize: usize, stride: usize) {
        assert!(
            csize <= self.capacity(),
            "working set of {csize} elements exceeds capacity {}",
            self.capacity()
        );
        assert!(
            csize.is_power_of_two() && stride.is_power_of_two() && stride <= csize / 2,
            "invalid access pattern: csize={csize} stride={stride}"
        );

        for index in (0..csize).step_by(stride) {
            self.slots[index] = (index + stride) as Slot;
        }
        self.slots[csize - stride] = 0;

        self.csize = csize;
        self.stride = stride;
    }

    /// Follow the pattern once from index 0 until it returns to 0. This is the timed kernel.
    #[inline(always)]
    pub fn chase(&self) -> usize {
        if self.csize == 0 {
            return 0;
        }
        let ptr = self.slots.as_ptr();
        let mut next = 0usize;
        loop {
            // SAFETY: `arrange` only stores indices below `csize`, and `csize <= capacity`
            next = unsafe { *ptr.add(next) } as usize;
            if next == 0 {
                break;
            }
        }
        black_box(next)
    }

    /// Hops in one traversal of the cycle through index 0. Walks the pattern outside any timed
    /// region; a correctly arranged set returns `csize / stride`.
    pub fn cycle_len(&self) -> usize {
        let pattern = self.pattern();
        if pattern.is_empty() {
            return 0;
        }
        let mut hops = 0;
        let mut next = 0usize;
        loop {
            next = pattern[next] as usize;
            hops += 1;
            if next == 0 || hops > pattern.len() {
                break;
            }
        }
        hops
    }

    /// Indices visited by one traversal, starting at 0
    pub fn visited(&self) -> Vec<usize> {
        let pattern = self.pattern();
        let mut visited = Vec::with_capacity(self.cycle_len());
        if pattern.is_empty() {
            return visited;
        }
        let mut next = 0usize;
        loop {
            visited.push(next);
            next = pattern[next] as usize;
            if next == 0 || visited.len() > pattern.len() {
                break;
            }
        }
        visited
    }
}
