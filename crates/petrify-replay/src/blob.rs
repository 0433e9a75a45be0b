//! Structural validation of a blob before anything is created.

use petrify_core::{Category, CategorySet, ContentHash, FormatError, ObjectRef, ReplayError};
use petrify_record::codec::{read_header, WireReader, RECORD_HEADER_LEN};

/// One framed record of a blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlobRecord<'b> {
    /// Content hash recorded for the object.
    pub hash: ContentHash,
    /// Categories the payload references.
    pub deps: CategorySet,
    /// Encoded descriptor.
    pub payload: &'b [u8],
}

/// Every record of a blob, grouped by category, with framing validated.
///
/// Parsing checks the header, every count and record frame, that each
/// dependency mask only names categories the record's category may
/// reference, and that nothing follows the last category. Payload
/// contents are checked later, when each record is decoded.
#[derive(Clone, Debug, Default)]
pub struct BlobIndex<'b> {
    categories: [Vec<BlobRecord<'b>>; Category::COUNT],
}

impl<'b> BlobIndex<'b> {
    /// Validate the framing of `blob`.
    pub fn parse(blob: &'b [u8]) -> Result<Self, ReplayError> {
        let mut r = WireReader::new(blob);
        read_header(&mut r).map_err(ReplayError::format)?;

        let mut index = Self::default();
        for category in Category::ALL {
            let count = r.count(RECORD_HEADER_LEN).map_err(ReplayError::format)?;
            let records = &mut index.categories[category.index()];
            records.reserve_exact(count);
            for i in 0..count {
                let object = ObjectRef::new(category, i as u32);
                let record = read_record(&mut r, category).map_err(|source| ReplayError::Format {
                    record: Some(object),
                    source,
                })?;
                records.push(record);
            }
        }
        r.finish().map_err(ReplayError::format)?;
        Ok(index)
    }

    /// Records of `category` in index order.
    pub fn records(&self, category: Category) -> &[BlobRecord<'b>] {
        &self.categories[category.index()]
    }

    /// Number of records in `category`.
    pub fn count(&self, category: Category) -> u32 {
        self.records(category).len() as u32
    }

    /// Total number of records.
    pub fn total(&self) -> usize {
        self.categories.iter().map(Vec::len).sum()
    }

    /// Union of the dependency masks of every record in `category`.
    pub fn dependencies(&self, category: Category) -> CategorySet {
        self.records(category)
            .iter()
            .fold(CategorySet::EMPTY, |acc, r| acc.union(r.deps))
    }
}

fn read_record<'b>(r: &mut WireReader<'b>, category: Category) -> Result<BlobRecord<'b>, FormatError> {
    let hash = ContentHash(r.u64()?);
    let bits = r.u8()?;
    let deps = CategorySet::from_bits(bits)
        .filter(|d| d.is_subset(category.allowed_references()))
        .ok_or_else(|| FormatError::InvalidValue {
            detail: format!("dependency mask {bits:#04x} not allowed for {category}"),
        })?;
    let len = r.count(1)?;
    let payload = r.take(len)?;
    Ok(BlobRecord {
        hash,
        deps,
        payload,
    })
}
