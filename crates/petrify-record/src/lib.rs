//! Recording side of pipeline-state capture.
//!
//! Hashes creation descriptors canonically, deduplicates them per
//! category, rewrites their object references to (category, index)
//! pairs and serializes the result into a blob the replay crate can
//! parse.
//!
//! # Architecture
//!
//! - [`Canonical`] is the single field-order walk of every descriptor
//! - [`compute_hash`] runs the walk into an FNV-1a state
//! - [`StateRecorder`] runs it into the wire encoder and stores the bytes
//! - [`codec`] holds the primitives and framing shared with the decoder
//!
//! # Format
//!
//! ```text
//! [MAGIC "PTRF"] [VERSION u32]
//! 7 × { [count u32] count × [hash u64][deps u8][len u32][payload] }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod canonical;
pub mod codec;
pub mod hash;
pub mod recorder;

pub use canonical::{Canonical, CanonicalSink};
pub use hash::{
    compute_hash, compute_hash_compute_pipeline, compute_hash_descriptor_set_layout,
    compute_hash_graphics_pipeline, compute_hash_pipeline_layout, compute_hash_render_pass,
    compute_hash_sampler, compute_hash_shader_module, HandleLookup,
};
pub use recorder::{RecordRef, StateRecorder};

/// Magic bytes at the start of every blob.
pub const MAGIC: [u8; 4] = *b"PTRF";

/// Current binary format version.
///
/// Also seeds the content hash: any change to a canonical walk or to the
/// hash function must bump it.
pub const FORMAT_VERSION: u32 = 1;
