//! Core types for recording and replaying GPU pipeline state.
//!
//! Defines the vocabulary shared by the recorder and the replayer:
//! content hashes, the seven object categories and their dependency
//! order, (category, index) references, every creation descriptor, and
//! the error taxonomy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod info;

pub use error::{FailureKind, FormatError, RecordError, ReplayError};
pub use id::{Category, CategorySet, ContentHash, ObjectRef};
pub use info::*;

/// Re-export of the Vulkan bindings used in descriptor fields.
pub use ash::vk;
