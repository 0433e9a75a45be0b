//! Scratch memory for recorded and replayed pipeline state.
//!
//! A [`ScratchAllocator`] hands out memory from a list of blocks with a
//! bump cursor. Nothing is freed individually; dropping the allocator
//! releases everything at once. The recorder keeps its encoded records in
//! one, and the replayer decodes every description of a blob into one, so
//! the decoded views can all borrow from the same owner.
//!
//! # Architecture
//!
//! ```text
//! ScratchAllocator (safe API, &self allocation)
//! ├── ArenaConfig   (block size, optional byte budget)
//! ├── ArenaId       (per-instance id stamped into every ArenaSpan)
//! └── RawArena      (block list + bump cursor, the only unsafe code)
//!     └── Block[]   (zeroed heap allocations aligned to MAX_ALIGN)
//! ```
//!
//! Two ways to get memory back:
//!
//! - **Borrowed:** `alloc_*` return `&mut` references tied to the
//!   allocator borrow. Used for transient decoded structures.
//! - **Spans:** [`ScratchAllocator::store_bytes`] returns an
//!   [`ArenaSpan`] that can be stored next to the allocator and resolved
//!   later with [`ScratchAllocator::bytes`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
mod raw;
pub mod scratch;
pub mod span;

pub use config::{ArenaConfig, MAX_ALIGN};
pub use error::ArenaError;
pub use scratch::ScratchAllocator;
pub use span::{ArenaId, ArenaSpan};
