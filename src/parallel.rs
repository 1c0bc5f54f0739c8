//! Data-parallel work-unit driver (spec §5).
//!
//! `parallel_for` invokes `body(i)` for every `i` in `[0, n)` with
//! unspecified ordering and thread affinity; a single-threaded pass is a
//! valid degenerate case. We implement it on top of `rayon`, the
//! parallelism primitive used throughout the routing engine this crate is
//! modeled on (`rayon::join` for recursive fan-out, `rayon::prelude::*` for
//! data-parallel passes).

use rayon::prelude::*;

/// Runs `body` for every index in `[0, n)`, batched at `batch` items per
/// rayon work item. `label` is purely diagnostic (logged at `trace` level);
/// it has no effect on scheduling.
pub fn parallel_for(label: &str, n: usize, batch: usize, body: impl Fn(u32) + Sync) {
    let batch = batch.max(1);
    log::trace!("parallel_for[{label}]: n={n} batch={batch}");
    (0..n).into_par_iter().with_min_len(batch).for_each(|i| body(i as u32));
}

/// A fixed-size buffer that lets a `parallel_for` body write its own
/// disjoint slot from any thread without synchronization.
///
/// This is the same shared-memory write pattern as [`crate::hash_table::HashTable`]'s
/// `AddConcurrent` (spec §5 "Shared resources"): every index is written by
/// exactly one thread, so there is no data race in practice, but the
/// compiler cannot see that through a plain `&mut [T]` captured by multiple
/// closures. Calling [`ScatterSlice::set`] twice for the same index from
/// different threads is a contract violation the type cannot prevent —
/// callers must guarantee the partition themselves, as every use site in
/// this crate does (one `parallel_for` index maps to exactly one slot).
pub struct ScatterSlice<T> {
    cells: Box<[std::cell::UnsafeCell<T>]>,
}

// SAFETY: callers guarantee each index is written by exactly one thread, so
// concurrent `set` calls never alias the same cell.
unsafe impl<T: Send> Sync for ScatterSlice<T> {}

impl<T: Copy> ScatterSlice<T> {
    pub fn new(len: usize, fill: T) -> Self {
        Self {
            cells: (0..len).map(|_| std::cell::UnsafeCell::new(fill)).collect(),
        }
    }

    /// Writes `value` at `index`. Safe as long as no other thread writes or
    /// reads the same `index` concurrently (see type docs).
    pub fn set(&self, index: usize, value: T) {
        // SAFETY: `UnsafeCell<T>: T` is `Copy`, so a plain write is enough;
        // the caller-guaranteed disjointness makes this non-aliasing.
        unsafe {
            *self.cells[index].get() = value;
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        self.cells.into_vec().into_iter().map(|c| c.into_inner()).collect()
    }
}
