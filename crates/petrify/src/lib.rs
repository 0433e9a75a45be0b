//! Petrify: record, deduplicate, serialize and replay Vulkan pipeline
//! creation state.
//!
//! This is the top-level facade crate that re-exports the public API of
//! the petrify sub-crates. An application records every creation
//! descriptor as it builds its objects, writes the blob out, and on a
//! later run replays the blob to warm a driver's pipeline cache before
//! the first frame.
//!
//! # Quick start
//!
//! ```rust
//! use petrify::prelude::*;
//! use petrify::vk::{self, Handle};
//!
//! let mut recorder = StateRecorder::new();
//!
//! let (sampler_hash, index) = recorder.capture(&SamplerCreateInfo::default()).unwrap();
//! let sampler = vk::Sampler::from_raw(0x1000);
//! recorder.set_sampler_handle(index, sampler).unwrap();
//!
//! // References are recorded by content, so the layout's hash does not
//! // depend on the raw value of `sampler`.
//! let samplers = [sampler];
//! let bindings = [DescriptorSetLayoutBinding {
//!     descriptor_type: vk::DescriptorType::SAMPLER,
//!     descriptor_count: 1,
//!     stage_flags: vk::ShaderStageFlags::FRAGMENT,
//!     immutable_samplers: &samplers,
//!     ..Default::default()
//! }];
//! let layout = DescriptorSetLayoutCreateInfo {
//!     bindings: &bindings,
//!     ..Default::default()
//! };
//! let (_, layout_index) = recorder.capture(&layout).unwrap();
//!
//! assert_eq!(recorder.hash_for_sampler(sampler).unwrap(), sampler_hash);
//! assert_eq!(recorder.len(Category::DescriptorSetLayout), 1);
//! assert_eq!(layout_index, 0);
//!
//! let blob = recorder.serialize();
//! assert_eq!(&blob[..4], &petrify::record::MAGIC);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `petrify-arena` | Scratch allocator backing recorded and replayed data |
//! | [`types`] | `petrify-core` | Categories, references, descriptors, errors |
//! | [`record`] | `petrify-record` | Canonical hashing, recorder, wire codec |
//! | [`replay`] | `petrify-replay` | Blob parsing, replayer, creator trait |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Scratch allocation (`petrify-arena`).
///
/// Recorders and replayers own a [`arena::ScratchAllocator`]; size it
/// with [`arena::ArenaConfig`].
pub use petrify_arena as arena;

/// Core vocabulary (`petrify-core`).
///
/// Object [`types::Category`]s, [`types::ObjectRef`]s, every creation
/// descriptor, and the error taxonomy.
pub use petrify_core as types;

/// Recording side (`petrify-record`).
///
/// [`record::StateRecorder`] plus the free `compute_hash_*` functions and
/// the wire [`record::codec`].
pub use petrify_record as record;

/// Replay side (`petrify-replay`).
///
/// [`replay::StateReplayer`] drives a caller's [`replay::StateCreator`].
pub use petrify_replay as replay;

/// Vulkan handle and enum types used in descriptor fields.
pub use petrify_core::vk;

/// Common imports for typical petrify usage.
///
/// ```rust
/// use petrify::prelude::*;
/// ```
pub mod prelude {
    // Identity
    pub use petrify_core::{Category, CategorySet, ContentHash, ObjectRef};

    // Descriptors
    pub use petrify_core::info::*;

    // Errors
    pub use petrify_core::{FailureKind, FormatError, RecordError, ReplayError};

    // Recording
    pub use petrify_record::StateRecorder;

    // Replay
    pub use petrify_replay::{
        HandleSlot, ReplayConfig, ReplayPhase, ReplaySummary, StateCreator, StateReplayer,
    };

    // Arena
    pub use petrify_arena::ArenaConfig;
}
