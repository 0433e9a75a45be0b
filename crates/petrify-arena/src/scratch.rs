//! The scratch allocator: typed, bump-allocated storage with no individual free.

use std::fmt;
use std::ptr::NonNull;

use bytemuck::Zeroable;

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::raw::{copy_into, fill_slots, RawArena};
use crate::span::{ArenaId, ArenaSpan};

/// Bump-pointer memory owner backing recorded and replayed structures.
///
/// Allocation takes `&self`: every returned reference borrows the
/// allocator, so the borrow checker guarantees nothing outlives the
/// memory. Individual allocations are never freed or reused; dropping the
/// allocator releases every block at once.
///
/// Only `Copy` types can be placed in the arena, so nothing stored in it
/// ever needs a destructor.
///
/// # Examples
///
/// ```
/// use petrify_arena::ScratchAllocator;
///
/// let arena = ScratchAllocator::new();
/// let words = arena.alloc_slice_copy(&[1u32, 2, 3]).unwrap();
/// let name = arena.alloc_str("main").unwrap();
/// assert_eq!(words, &[1, 2, 3]);
/// assert_eq!(name, "main");
/// assert_eq!(arena.block_count(), 1);
/// ```
pub struct ScratchAllocator {
    id: ArenaId,
    config: ArenaConfig,
    raw: RawArena,
}

impl ScratchAllocator {
    /// Create an unbounded allocator with the default block size.
    pub fn new() -> Self {
        Self::build(ArenaConfig::default())
    }

    /// Create an allocator from a validated config.
    pub fn with_config(config: ArenaConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ArenaConfig) -> Self {
        Self {
            id: ArenaId::next(),
            raw: RawArena::new(config.block_size, config.max_bytes),
            config,
        }
    }

    /// The configuration this allocator was built with.
    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// Unique id of this allocator instance.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Reserve `size` bytes aligned to `align`. The contents are unspecified.
    ///
    /// Returns `Ok(None)` for a zero-length request without allocating.
    pub fn allocate_raw(&self, size: usize, align: usize) -> Result<Option<NonNull<u8>>, ArenaError> {
        if size == 0 {
            return Ok(None);
        }
        Ok(Some(self.raw.bump(size, align)?.ptr))
    }

    /// Like [`allocate_raw`](Self::allocate_raw), but the bytes read as zero.
    pub fn allocate_raw_cleared(
        &self,
        size: usize,
        align: usize,
    ) -> Result<Option<NonNull<u8>>, ArenaError> {
        if size == 0 {
            return Ok(None);
        }
        Ok(Some(self.raw.bump_cleared(size, align)?.ptr))
    }

    /// Move a single value into the arena.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc<T: Copy>(&self, value: T) -> Result<&mut T, ArenaError> {
        let slot = self.alloc_slice_copy(std::slice::from_ref(&value))?;
        Ok(&mut slot[0])
    }

    /// Copy a slice into the arena. An empty slice does not allocate.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_copy<T: Copy>(&self, src: &[T]) -> Result<&mut [T], ArenaError> {
        let slots = self.raw.alloc_uninit::<T>(src.len())?;
        Ok(copy_into(slots, src))
    }

    /// Allocate `len` zeroed values.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_zeroed<T: Zeroable + Copy>(&self, len: usize) -> Result<&mut [T], ArenaError> {
        let slots = self.raw.alloc_uninit::<T>(len)?;
        fill_slots(slots, |_| Ok::<T, ArenaError>(T::zeroed()))
    }

    /// Allocate `len` values, producing each with a fallible constructor.
    ///
    /// The constructor may itself allocate from this arena (nested
    /// arrays are built this way). If it fails, the reserved memory is
    /// simply abandoned.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_slice_try_fill<T, E, F>(&self, len: usize, f: F) -> Result<&mut [T], E>
    where
        T: Copy,
        E: From<ArenaError>,
        F: FnMut(usize) -> Result<T, E>,
    {
        let slots = self.raw.alloc_uninit::<T>(len)?;
        fill_slots(slots, f)
    }

    /// Copy a string into the arena.
    pub fn alloc_str(&self, s: &str) -> Result<&str, ArenaError> {
        let bytes = self.alloc_slice_copy(s.as_bytes())?;
        // Copied from a `&str`, so still valid UTF-8.
        Ok(std::str::from_utf8(bytes).unwrap_or_default())
    }

    /// Copy bytes into the arena and return a storable span for them.
    pub fn store_bytes(&self, bytes: &[u8]) -> Result<ArenaSpan, ArenaError> {
        if bytes.is_empty() {
            return Ok(ArenaSpan {
                arena: self.id,
                block: 0,
                offset: 0,
                len: 0,
            });
        }
        let placement = self.raw.store(bytes)?;
        Ok(ArenaSpan {
            arena: self.id,
            block: placement.block,
            offset: placement.offset,
            len: bytes.len(),
        })
    }

    /// Resolve a span issued by [`store_bytes`](Self::store_bytes).
    ///
    /// Returns `None` for spans issued by a different allocator.
    pub fn bytes(&self, span: ArenaSpan) -> Option<&[u8]> {
        if span.arena != self.id {
            return None;
        }
        if span.len == 0 {
            return Some(&[]);
        }
        self.raw.bytes(span.block, span.offset, span.len)
    }

    /// Number of blocks reserved so far.
    pub fn block_count(&self) -> usize {
        self.raw.block_count()
    }

    /// Bytes handed out to callers (excluding alignment padding).
    pub fn allocated_bytes(&self) -> usize {
        self.raw.allocated_bytes()
    }

    /// Bytes reserved from the system across all blocks.
    pub fn reserved_bytes(&self) -> usize {
        self.raw.reserved_bytes()
    }
}

impl Default for ScratchAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScratchAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScratchAllocator")
            .field("id", &self.id)
            .field("blocks", &self.block_count())
            .field("allocated", &self.allocated_bytes())
            .field("reserved", &self.reserved_bytes())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_ALIGN;

    fn small_arena() -> ScratchAllocator {
        ScratchAllocator::with_config(ArenaConfig {
            block_size: 256,
            max_bytes: None,
        })
        .unwrap()
    }

    #[test]
    fn zero_length_request_does_not_allocate() {
        let arena = ScratchAllocator::new();
        assert!(arena.allocate_raw(0, 8).unwrap().is_none());
        assert!(arena.allocate_raw_cleared(0, 8).unwrap().is_none());
        assert!(arena.alloc_slice_copy::<u64>(&[]).unwrap().is_empty());
        assert_eq!(arena.block_count(), 0);
        assert_eq!(arena.allocated_bytes(), 0);
    }

    #[test]
    fn raw_allocation_is_aligned() {
        let arena = ScratchAllocator::new();
        for align in [1usize, 2, 4, 8, 16] {
            arena.allocate_raw(1, 1).unwrap();
            let ptr = arena.allocate_raw(3, align).unwrap().unwrap();
            assert_eq!(ptr.as_ptr() as usize % align, 0, "align {align}");
        }
    }

    #[test]
    fn invalid_alignment_rejected() {
        let arena = ScratchAllocator::new();
        assert_eq!(
            arena.allocate_raw(8, 3),
            Err(ArenaError::InvalidAlignment { align: 3 })
        );
        assert_eq!(
            arena.allocate_raw(8, MAX_ALIGN * 2),
            Err(ArenaError::InvalidAlignment {
                align: MAX_ALIGN * 2
            })
        );
    }

    #[test]
    fn zeroed_slices_read_zero() {
        let arena = small_arena();
        let dirty = arena.alloc_slice_copy(&[0xFFu8; 200]).unwrap();
        assert!(dirty.iter().all(|&b| b == 0xFF));
        let zeroed: &mut [u64] = arena.alloc_slice_zeroed(32).unwrap();
        assert!(zeroed.iter().all(|&v| v == 0));
    }

    #[test]
    fn growth_preserves_earlier_allocations() {
        let arena = small_arena();
        let first = arena.alloc_slice_copy(&[7u32; 40]).unwrap();
        let second = arena.alloc_slice_copy(&[9u32; 40]).unwrap();
        // 160 + 160 bytes do not fit a 256-byte block.
        assert_eq!(arena.block_count(), 2);
        second[0] = 10;
        assert!(first.iter().all(|&v| v == 7));
        assert_eq!(second[0], 10);
        assert!(second[1..].iter().all(|&v| v == 9));
    }

    #[test]
    fn oversized_request_gets_dedicated_block() {
        let arena = small_arena();
        let big = arena.alloc_slice_zeroed::<u8>(10_000).unwrap();
        assert_eq!(big.len(), 10_000);
        assert!(arena.reserved_bytes() >= 10_000);
    }

    #[test]
    fn bounded_arena_reports_capacity_exceeded() {
        let arena = ScratchAllocator::with_config(ArenaConfig {
            block_size: 256,
            max_bytes: Some(512),
        })
        .unwrap();
        arena.alloc_slice_zeroed::<u8>(256).unwrap();
        arena.alloc_slice_zeroed::<u8>(256).unwrap();
        let err = arena.alloc_slice_zeroed::<u8>(1).unwrap_err();
        assert_eq!(
            err,
            ArenaError::CapacityExceeded {
                requested: 1,
                capacity: 512
            }
        );
    }

    #[test]
    fn try_fill_can_nest_allocations() {
        let arena = ScratchAllocator::new();
        let rows: &mut [&[u16]] = arena
            .alloc_slice_try_fill(3, |i| {
                arena
                    .alloc_slice_copy(&vec![i as u16; i + 1])
                    .map(|s| &*s)
            })
            .unwrap();
        assert_eq!(rows[0], &[0]);
        assert_eq!(rows[2], &[2, 2, 2]);
    }

    #[test]
    fn spans_resolve_only_against_their_arena() {
        let a = ScratchAllocator::new();
        let b = ScratchAllocator::new();
        let span = a.store_bytes(b"payload").unwrap();
        assert_eq!(a.bytes(span), Some(&b"payload"[..]));
        assert_eq!(b.bytes(span), None);
        let empty = a.store_bytes(&[]).unwrap();
        assert_eq!(a.bytes(empty), Some(&[][..]));
    }

    #[test]
    fn alloc_str_roundtrips() {
        let arena = ScratchAllocator::new();
        let s = arena.alloc_str("entry_point").unwrap();
        assert_eq!(s, "entry_point");
        assert_eq!(arena.alloc_str("").unwrap(), "");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn allocations_never_overlap_and_keep_contents(
                sizes in proptest::collection::vec(1usize..600, 1..40),
            ) {
                let arena = small_arena();
                let mut issued: Vec<(&[u8], u8)> = Vec::new();
                for (i, &size) in sizes.iter().enumerate() {
                    let tag = i as u8;
                    let slice = arena.alloc_slice_copy(&vec![tag; size]).unwrap();
                    issued.push((&*slice, tag));
                }
                for (slice, tag) in &issued {
                    prop_assert!(slice.iter().all(|b| b == tag));
                }
            }

            #[test]
            fn raw_alignment_always_honoured(
                requests in proptest::collection::vec((1usize..300, 0u32..5), 1..50),
            ) {
                let arena = small_arena();
                for (size, shift) in requests {
                    let align = 1usize << shift;
                    let ptr = arena.allocate_raw(size, align).unwrap().unwrap();
                    prop_assert_eq!(ptr.as_ptr() as usize % align, 0);
                }
            }
        }
    }
}
