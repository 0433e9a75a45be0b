//! Block memory and the low-level primitives behind the scratch allocator.
//!
//! Every `unsafe` block in this crate lives in this module. Each block is
//! one heap allocation aligned to [`MAX_ALIGN`]. The bump cursor of a block
//! only moves forward and blocks are only dropped together with the
//! [`RawArena`], so a region handed out is never handed out again and
//! stays valid for as long as the arena is borrowed.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::cell::{Cell, RefCell};
use std::mem::{self, MaybeUninit};
use std::ptr::{self, NonNull};
use std::slice;

use crate::config::MAX_ALIGN;
use crate::error::ArenaError;

/// A single zero-initialised heap block with a bump cursor.
struct Block {
    base: NonNull<u8>,
    layout: Layout,
    cursor: Cell<usize>,
}

// SAFETY: a block exclusively owns its heap allocation; nothing else holds
// the base pointer once the owning arena moves to another thread.
unsafe impl Send for Block {}

impl Block {
    fn new(capacity: usize) -> Result<Self, ArenaError> {
        let layout =
            Layout::from_size_align(capacity, MAX_ALIGN).map_err(|_| {
                ArenaError::CapacityExceeded {
                    requested: capacity,
                    capacity: isize::MAX as usize,
                }
            })?;
        debug_assert!(layout.size() > 0);
        // SAFETY: the layout has a non-zero size (callers never request an
        // empty block) and a valid power-of-two alignment.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        let base = NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Ok(Self {
            base,
            layout,
            cursor: Cell::new(0),
        })
    }

    fn capacity(&self) -> usize {
        self.layout.size()
    }

    /// Aligned start offset of a `size`-byte region, if it fits.
    fn fit(&self, size: usize, align: usize) -> Option<usize> {
        let start = self.cursor.get().checked_add(align - 1)? & !(align - 1);
        let end = start.checked_add(size)?;
        (end <= self.capacity()).then_some(start)
    }

    /// Claim `[offset, offset + size)` and return a pointer to it.
    fn claim(&self, offset: usize, size: usize) -> NonNull<u8> {
        debug_assert!(offset + size <= self.capacity());
        self.cursor.set(offset + size);
        // SAFETY: offset <= capacity, so the result stays within (or one past)
        // the allocation and is therefore non-null.
        unsafe { NonNull::new_unchecked(self.base.as_ptr().add(offset)) }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `base` was returned by `alloc_zeroed` with exactly this layout.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
    }
}

/// Where a bump allocation landed.
pub(crate) struct Placement {
    pub(crate) block: usize,
    pub(crate) offset: usize,
    pub(crate) ptr: NonNull<u8>,
}

/// Growable list of blocks; only the most recent block is bumped.
pub(crate) struct RawArena {
    blocks: RefCell<Vec<Block>>,
    block_size: usize,
    max_bytes: Option<usize>,
    reserved: Cell<usize>,
    allocated: Cell<usize>,
}

impl RawArena {
    pub(crate) fn new(block_size: usize, max_bytes: Option<usize>) -> Self {
        Self {
            blocks: RefCell::new(Vec::new()),
            block_size,
            max_bytes,
            reserved: Cell::new(0),
            allocated: Cell::new(0),
        }
    }

    /// Reserve `size > 0` bytes aligned to `align`, appending a block when
    /// the current one cannot hold the request.
    pub(crate) fn bump(&self, size: usize, align: usize) -> Result<Placement, ArenaError> {
        if !align.is_power_of_two() || align > MAX_ALIGN {
            return Err(ArenaError::InvalidAlignment { align });
        }
        debug_assert!(size > 0);

        let mut blocks = self.blocks.borrow_mut();
        if let Some(block) = blocks.last() {
            if let Some(offset) = block.fit(size, align) {
                let ptr = block.claim(offset, size);
                self.allocated.set(self.allocated.get() + size);
                return Ok(Placement {
                    block: blocks.len() - 1,
                    offset,
                    ptr,
                });
            }
        }

        // A fresh block starts MAX_ALIGN-aligned, so `size` bytes always fit.
        let capacity = self.next_block_capacity(size)?;
        let block = Block::new(capacity)?;
        let ptr = block.claim(0, size);
        self.reserved.set(self.reserved.get() + capacity);
        self.allocated.set(self.allocated.get() + size);
        blocks.push(block);
        tracing::trace!(
            block = blocks.len() - 1,
            capacity,
            reserved = self.reserved.get(),
            "arena block appended"
        );
        Ok(Placement {
            block: blocks.len() - 1,
            offset: 0,
            ptr,
        })
    }

    fn next_block_capacity(&self, size: usize) -> Result<usize, ArenaError> {
        let preferred = self.block_size.max(size);
        let Some(max) = self.max_bytes else {
            return Ok(preferred);
        };
        let remaining = max.saturating_sub(self.reserved.get());
        if preferred <= remaining {
            Ok(preferred)
        } else if size <= remaining {
            Ok(remaining)
        } else {
            Err(ArenaError::CapacityExceeded {
                requested: size,
                capacity: max,
            })
        }
    }

    /// Reserve `size` bytes and zero them.
    pub(crate) fn bump_cleared(&self, size: usize, align: usize) -> Result<Placement, ArenaError> {
        let placement = self.bump(size, align)?;
        // SAFETY: `bump` just reserved `size` writable bytes at `ptr` that no
        // other pointer or reference covers.
        unsafe { ptr::write_bytes(placement.ptr.as_ptr(), 0, size) };
        Ok(placement)
    }

    /// Reserve space for `src` and copy it in.
    pub(crate) fn store(&self, src: &[u8]) -> Result<Placement, ArenaError> {
        let placement = self.bump(src.len(), 1)?;
        // SAFETY: `bump` reserved `src.len()` fresh bytes at `ptr`, which
        // cannot overlap the caller's slice.
        unsafe {
            ptr::copy_nonoverlapping(src.as_ptr(), placement.ptr.as_ptr(), src.len());
        }
        Ok(placement)
    }

    /// Reserve uninitialised storage for `len` values of `T`.
    #[allow(clippy::mut_from_ref)]
    pub(crate) fn alloc_uninit<T>(&self, len: usize) -> Result<&mut [MaybeUninit<T>], ArenaError> {
        let size = mem::size_of::<T>()
            .checked_mul(len)
            .ok_or(ArenaError::CapacityExceeded {
                requested: usize::MAX,
                capacity: self.max_bytes.unwrap_or(isize::MAX as usize),
            })?;
        if size == 0 {
            // SAFETY: a zero-byte region only needs a non-null, aligned pointer.
            return Ok(unsafe {
                slice::from_raw_parts_mut(NonNull::<MaybeUninit<T>>::dangling().as_ptr(), len)
            });
        }
        let placement = self.bump(size, mem::align_of::<T>())?;
        // SAFETY: `ptr` is aligned for `T` (block base is MAX_ALIGN-aligned and
        // the offset honours align_of::<T>()), covers `size` bytes reserved for
        // this call alone, and the block outlives the `&self` borrow.
        Ok(unsafe {
            slice::from_raw_parts_mut(placement.ptr.as_ptr().cast::<MaybeUninit<T>>(), len)
        })
    }

    /// Resolve an issued byte range back to a shared slice.
    ///
    /// Returns `None` if the range lies outside the block's issued region.
    pub(crate) fn bytes(&self, block: usize, offset: usize, len: usize) -> Option<&[u8]> {
        let blocks = self.blocks.borrow();
        let b = blocks.get(block)?;
        let end = offset.checked_add(len)?;
        if end > b.cursor.get() {
            return None;
        }
        // SAFETY: the range lies within memory already issued from this block,
        // the block is never freed or moved while `self` is borrowed, and the
        // caller only resolves ranges that were issued as shared byte storage.
        Some(unsafe { slice::from_raw_parts(b.base.as_ptr().add(offset), len) })
    }

    pub(crate) fn block_count(&self) -> usize {
        self.blocks.borrow().len()
    }

    pub(crate) fn reserved_bytes(&self) -> usize {
        self.reserved.get()
    }

    pub(crate) fn allocated_bytes(&self) -> usize {
        self.allocated.get()
    }
}

/// Initialise every slot with `f` and hand the slice back as initialised.
///
/// On error the slots written so far are abandoned without being dropped.
pub(crate) fn fill_slots<T, E>(
    slots: &mut [MaybeUninit<T>],
    mut f: impl FnMut(usize) -> Result<T, E>,
) -> Result<&mut [T], E> {
    for (i, slot) in slots.iter_mut().enumerate() {
        slot.write(f(i)?);
    }
    // SAFETY: the loop above initialised every element, and `MaybeUninit<T>`
    // has the same layout as `T`.
    Ok(unsafe { &mut *(slots as *mut [MaybeUninit<T>] as *mut [T]) })
}

/// Copy `src` into freshly reserved memory.
///
/// Separate from [`fill_slots`] so the copy compiles to a single memcpy.
pub(crate) fn copy_into<'a, T: Copy>(slots: &'a mut [MaybeUninit<T>], src: &[T]) -> &'a mut [T] {
    assert_eq!(slots.len(), src.len());
    // SAFETY: both regions hold `src.len()` elements of `T`; `slots` is fresh
    // arena memory, so the two cannot overlap.
    unsafe {
        ptr::copy_nonoverlapping(src.as_ptr(), slots.as_mut_ptr().cast::<T>(), src.len());
        &mut *(slots as *mut [MaybeUninit<T>] as *mut [T])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_block_is_max_aligned() {
        let raw = RawArena::new(1024, None);
        let p = raw.bump(1, 1).unwrap();
        assert_eq!(p.ptr.as_ptr() as usize % MAX_ALIGN, 0);
        assert_eq!(p.offset, 0);
    }

    #[test]
    fn bump_honours_alignment_within_block() {
        let raw = RawArena::new(1024, None);
        raw.bump(3, 1).unwrap();
        let p = raw.bump(8, 8).unwrap();
        assert_eq!(p.offset, 8);
        assert_eq!(p.ptr.as_ptr() as usize % 8, 0);
    }

    #[test]
    fn bounded_arena_shrinks_last_block_to_budget() {
        let raw = RawArena::new(1024, Some(1536));
        raw.bump(1000, 1).unwrap();
        // 1024 reserved; 512 remain, a 300-byte request gets a 512-byte block.
        raw.bump(300, 1).unwrap();
        assert_eq!(raw.reserved_bytes(), 1536);
        assert!(matches!(
            raw.bump(600, 1),
            Err(ArenaError::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn bytes_rejects_unissued_range() {
        let raw = RawArena::new(1024, None);
        let p = raw.bump(4, 1).unwrap();
        assert!(raw.bytes(p.block, p.offset, 4).is_some());
        assert!(raw.bytes(p.block, p.offset, 5).is_none());
        assert!(raw.bytes(7, 0, 1).is_none());
    }

    #[test]
    fn cleared_bump_reads_zero_after_dirty_neighbour() {
        let raw = RawArena::new(1024, None);
        let dirty = raw.store(&[0xAB; 100]).unwrap();
        assert_eq!(raw.bytes(dirty.block, dirty.offset, 100).unwrap()[99], 0xAB);
        let p = raw.bump_cleared(64, 16).unwrap();
        // SAFETY: `p.ptr` covers 64 freshly reserved bytes.
        let bytes = unsafe { slice::from_raw_parts(p.ptr.as_ptr(), 64) };
        assert!(bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn fill_slots_stops_at_first_error() {
        let raw = RawArena::new(1024, None);
        let slots = raw.alloc_uninit::<u32>(4).unwrap();
        let result: Result<&mut [u32], &str> =
            fill_slots(slots, |i| if i == 2 { Err("boom") } else { Ok(i as u32) });
        assert_eq!(result.unwrap_err(), "boom");
    }
}
