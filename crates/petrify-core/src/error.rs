//! Error types for recording and replaying pipeline state.
//!
//! Organised by the operation that fails: decoding a blob
//! ([`FormatError`]), recording ([`RecordError`]) and replaying into a
//! creation interface ([`ReplayError`]).

use std::error::Error;
use std::fmt;

use petrify_arena::ArenaError;

use crate::id::{Category, ContentHash, ObjectRef};

/// A blob is malformed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormatError {
    /// The blob does not start with the expected magic bytes.
    InvalidMagic,
    /// The blob was written with a different format version.
    UnsupportedVersion {
        /// Version found in the header.
        found: u32,
    },
    /// The blob ended before a value was complete.
    Truncated {
        /// Bytes the next value needs.
        needed: usize,
        /// Bytes left in the enclosing region.
        remaining: usize,
    },
    /// A value is out of range for its field.
    InvalidValue {
        /// What was wrong.
        detail: String,
    },
    /// An extension chain entry carries a type tag this build does not
    /// understand in that position.
    UnknownExtension {
        /// The raw `VkStructureType` tag.
        s_type: i32,
    },
    /// Bytes were left over after the value that should have been last.
    TrailingBytes {
        /// Number of unread bytes.
        remaining: usize,
    },
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "not a pipeline state blob (bad magic)"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Truncated { needed, remaining } => {
                write!(f, "truncated: need {needed} bytes, {remaining} remaining")
            }
            Self::InvalidValue { detail } => write!(f, "invalid value: {detail}"),
            Self::UnknownExtension { s_type } => {
                write!(f, "unknown extension structure type {s_type}")
            }
            Self::TrailingBytes { remaining } => {
                write!(f, "{remaining} trailing bytes")
            }
        }
    }
}

impl Error for FormatError {}

/// Errors from hashing or registering a descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordError {
    /// A descriptor references a handle that no record of `category` is
    /// bound to.
    UnresolvedReference {
        /// Category the handle was looked up in.
        category: Category,
        /// Raw handle value.
        handle: u64,
    },
    /// No record with this index exists.
    UnknownIndex {
        /// Category searched.
        category: Category,
        /// Requested index.
        index: u32,
        /// Records in the category.
        len: u32,
    },
    /// A null handle cannot be bound to a record.
    NullHandle {
        /// Category of the record.
        category: Category,
        /// Index of the record.
        index: u32,
    },
    /// An encoded record or category does not fit the blob's 32-bit
    /// length fields.
    PayloadTooLarge {
        /// Category of the record.
        category: Category,
        /// Offending length.
        len: usize,
    },
    /// The recorder's arena could not hold the record.
    Allocation(ArenaError),
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedReference { category, handle } => {
                write!(f, "no {category} record is bound to handle {handle:#x}")
            }
            Self::UnknownIndex {
                category,
                index,
                len,
            } => {
                write!(f, "{category} index {index} out of range (len {len})")
            }
            Self::NullHandle { category, index } => {
                write!(f, "cannot bind a null handle to {category}#{index}")
            }
            Self::PayloadTooLarge { category, len } => {
                write!(f, "{category} record of {len} bytes exceeds the format limit")
            }
            Self::Allocation(e) => write!(f, "recorder allocation failed: {e}"),
        }
    }
}

impl Error for RecordError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Allocation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ArenaError> for RecordError {
    fn from(e: ArenaError) -> Self {
        Self::Allocation(e)
    }
}

/// Coarse classification of a [`ReplayError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The blob is malformed.
    Format,
    /// A reference could not be resolved to a created object.
    UnresolvedReference,
    /// The creation interface declined a capacity hint or a creation.
    Rejected,
    /// The replayer's arena ran out of space.
    Allocation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Format => "format",
            Self::UnresolvedReference => "unresolved-reference",
            Self::Rejected => "rejected",
            Self::Allocation => "allocation",
        };
        f.write_str(name)
    }
}

/// Errors from replaying a blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplayError {
    /// The blob is malformed.
    Format {
        /// Record being decoded, if the failure is inside one.
        record: Option<ObjectRef>,
        /// What was wrong.
        source: FormatError,
    },
    /// A decoded reference names an object that has no handle yet.
    UnresolvedReference {
        /// Record holding the reference.
        record: ObjectRef,
        /// The referenced record.
        target: ObjectRef,
    },
    /// The creation interface declined a capacity hint.
    CapacityRejected {
        /// Category announced.
        category: Category,
        /// Number of records announced.
        count: u32,
    },
    /// The creation interface declined to create a record.
    CreationRejected {
        /// Record declined.
        record: ObjectRef,
        /// Its content hash.
        hash: ContentHash,
    },
    /// The replayer's arena could not hold a decoded descriptor.
    Allocation {
        /// Record being decoded.
        record: Option<ObjectRef>,
        /// The arena failure.
        source: ArenaError,
    },
}

impl ReplayError {
    /// The failure class of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Format { .. } => FailureKind::Format,
            Self::UnresolvedReference { .. } => FailureKind::UnresolvedReference,
            Self::CapacityRejected { .. } | Self::CreationRejected { .. } => FailureKind::Rejected,
            Self::Allocation { .. } => FailureKind::Allocation,
        }
    }

    /// Wrap a format error without a record context.
    pub fn format(source: FormatError) -> Self {
        Self::Format {
            record: None,
            source,
        }
    }
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format {
                record: Some(r),
                source,
            } => write!(f, "malformed blob at {r}: {source}"),
            Self::Format {
                record: None,
                source,
            } => write!(f, "malformed blob: {source}"),
            Self::UnresolvedReference { record, target } => {
                write!(f, "{record} references {target}, which has no handle")
            }
            Self::CapacityRejected { category, count } => {
                write!(f, "creator rejected {count} {category} records")
            }
            Self::CreationRejected { record, hash } => {
                write!(f, "creator rejected {record} ({hash})")
            }
            Self::Allocation {
                record: Some(r),
                source,
            } => write!(f, "allocation failed decoding {r}: {source}"),
            Self::Allocation {
                record: None,
                source,
            } => write!(f, "allocation failed: {source}"),
        }
    }
}

impl Error for ReplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format { source, .. } => Some(source),
            Self::Allocation { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_error_kinds() {
        let r = ObjectRef::new(Category::PipelineLayout, 0);
        assert_eq!(
            ReplayError::format(FormatError::InvalidMagic).kind(),
            FailureKind::Format
        );
        assert_eq!(
            ReplayError::CapacityRejected {
                category: Category::Sampler,
                count: 2
            }
            .kind(),
            FailureKind::Rejected
        );
        assert_eq!(
            ReplayError::UnresolvedReference {
                record: r,
                target: ObjectRef::new(Category::DescriptorSetLayout, 4)
            }
            .kind(),
            FailureKind::UnresolvedReference
        );
    }

    #[test]
    fn source_chains_to_inner_error() {
        let e = ReplayError::Format {
            record: Some(ObjectRef::new(Category::Sampler, 1)),
            source: FormatError::Truncated {
                needed: 4,
                remaining: 1,
            },
        };
        assert_eq!(
            e.to_string(),
            "malformed blob at sampler#1: truncated: need 4 bytes, 1 remaining"
        );
        assert!(e.source().is_some());

        let r = RecordError::from(ArenaError::InvalidAlignment { align: 3 });
        assert!(r.source().is_some());
    }
}
