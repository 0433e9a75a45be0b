//! Byte spans issued by [`ScratchAllocator::store_bytes`](crate::ScratchAllocator::store_bytes).
//!
//! A span is a location, not a borrow: it can be stored next to the
//! allocator that issued it and resolved back to a slice later.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ArenaId`] allocation.
static ARENA_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier of a scratch allocator.
///
/// Spans carry the id of the allocator that issued them, so a span can
/// never resolve against a different allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    /// Allocate a fresh id. Thread-safe.
    pub(crate) fn next() -> Self {
        Self(ARENA_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location of an immutable byte region inside a scratch allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct ArenaSpan {
    pub(crate) arena: ArenaId,
    pub(crate) block: usize,
    pub(crate) offset: usize,
    pub(crate) len: usize,
}

impl ArenaSpan {
    /// Length of the region in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether this is a zero-length region.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Id of the allocator that issued this span.
    pub fn arena(&self) -> ArenaId {
        self.arena
    }
}

impl fmt::Display for ArenaSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ArenaSpan(arena={}, block={}, off={}, len={})",
            self.arena, self.block, self.offset, self.len
        )
    }
}
