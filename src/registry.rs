//! Registry of live handler adapters.
//!
//! The registry owns every adapter the backend might still call into. An
//! adapter stays registered until its terminal signal fired; releasing the
//! whole registry therefore doubles as a join barrier for all in-flight
//! operations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Lifecycle surface the registry requires of every adapter.
pub trait RegisteredAdapter: Send + Sync {
    /// Blocks until the adapter observed its terminal signal. Returns
    /// immediately once the signal fired.
    fn wait_done(&self);
}

/// Removal-only reference to a registered adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryHandle(u64);

struct Entry {
    id: u64,
    adapter: Arc<dyn RegisteredAdapter>,
}

/// Thread-safe collection of live adapters.
///
/// `register`/`unregister` are safe under arbitrary concurrent callers.
/// `drain_and_wait` must not run concurrently with itself; the coordinator's
/// shutdown path is its only call site.
pub struct HandlerRegistry {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Appends an adapter and returns its removal handle.
    pub fn register(&self, adapter: Arc<dyn RegisteredAdapter>) -> RegistryHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries.lock().unwrap();
        entries.push(Entry { id, adapter });
        RegistryHandle(id)
    }

    /// Removes the matching adapter. Idempotent: removing an already-removed
    /// handle is a no-op, so two finalize paths racing on the same adapter
    /// yield exactly one removal.
    pub fn unregister(&self, handle: RegistryHandle) {
        let removed = {
            let mut entries = self.entries.lock().unwrap();
            match entries.iter().position(|e| e.id == handle.0) {
                Some(index) => Some(entries.swap_remove(index)),
                None => None,
            }
        };
        // Drop outside the lock; the adapter may be the last reference.
        drop(removed);
    }

    /// Atomically swaps out the whole collection, then waits for every
    /// adapter's terminal signal before releasing it.
    pub fn drain_and_wait(&self) {
        let drained = {
            let mut entries = self.entries.lock().unwrap();
            std::mem::take(&mut *entries)
        };
        for entry in drained {
            entry.adapter.wait_done();
        }
    }

    /// Number of live adapters.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Returns true when no adapters are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
