//! The deduplicating object registry.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use ash::vk::{self, Handle};
use indexmap::IndexMap;
use petrify_arena::{ArenaConfig, ArenaSpan, ScratchAllocator};
use petrify_core::info::*;
use petrify_core::{Category, CategorySet, ContentHash, RecordError};
use smallvec::SmallVec;

use crate::canonical::{Canonical, CanonicalSink};
use crate::codec::{write_header, write_record, write_u32_le, RECORD_HEADER_LEN};
use crate::hash::{compute_hash, HandleLookup};

/// Sentinel stored for records that have no handle bound yet.
const UNBOUND: u64 = 0;

/// One stored record.
#[derive(Clone, Copy, Debug)]
struct StoredRecord {
    payload: ArenaSpan,
    deps: CategorySet,
    handle: u64,
}

/// Per-category dedup table.
#[derive(Default)]
struct CategoryTable {
    /// Insertion order is the record index.
    records: IndexMap<ContentHash, StoredRecord>,
    /// Raw handle to record index.
    by_handle: HashMap<u64, u32>,
}

/// Canonical sink producing the wire payload of one record.
///
/// References are rewritten to `(category, index)` pairs and collected
/// into the record's dependency mask.
struct PayloadEncoder<'l> {
    buf: SmallVec<[u8; 256]>,
    deps: CategorySet,
    category: Category,
    lookup: &'l StateRecorder,
}

impl CanonicalSink for PayloadEncoder<'_> {
    fn category(&self) -> Category {
        self.category
    }

    fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn put_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn put_bound(&mut self, category: Category, handle: u64) -> Result<(), RecordError> {
        let (index, _) = self
            .lookup
            .resolve(category, handle)
            .ok_or(RecordError::UnresolvedReference { category, handle })?;
        self.deps.insert(category);
        self.put_u8(1);
        self.put_u8(category as u8);
        self.put_u32(index);
        Ok(())
    }
}

/// A borrowed view of one recorded object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RecordRef<'r> {
    /// Category of the record.
    pub category: Category,
    /// Dense index within the category.
    pub index: u32,
    /// Content hash.
    pub hash: ContentHash,
    /// Categories the payload references.
    pub deps: CategorySet,
    /// Encoded payload, references already rewritten to (category, index).
    pub payload: &'r [u8],
    /// Bound runtime handle, or `None` if no handle has been bound yet.
    pub handle: Option<u64>,
}

/// Records pipeline-creation descriptors, deduplicated by content hash.
///
/// Each category keeps its records in first-registration order; that
/// order defines the record indices and the serialization order. The
/// encoded payload of every record lives in the recorder's own
/// [`ScratchAllocator`], so nothing registered borrows from the caller.
///
/// The recorder has no internal locking. It is `Send` but not `Sync`:
/// producers on several threads must wrap it in a `Mutex`.
///
/// # Examples
///
/// ```
/// use petrify_record::StateRecorder;
/// use petrify_core::vk::{self, Handle};
/// use petrify_core::SamplerCreateInfo;
///
/// let mut recorder = StateRecorder::new();
/// let info = SamplerCreateInfo { max_lod: 4.0, ..Default::default() };
/// let (hash, index) = recorder.capture(&info).unwrap();
/// assert_eq!(index, 0);
/// assert_eq!(recorder.capture(&info).unwrap(), (hash, 0));
///
/// recorder.set_sampler_handle(index, vk::Sampler::from_raw(0x1000)).unwrap();
/// assert_eq!(recorder.hash_for_sampler(vk::Sampler::from_raw(0x1000)).unwrap(), hash);
/// ```
pub struct StateRecorder {
    arena: ScratchAllocator,
    tables: [CategoryTable; Category::COUNT],
}

impl StateRecorder {
    /// Create an empty recorder with the default arena configuration.
    pub fn new() -> Self {
        Self::from_arena(ScratchAllocator::new())
    }

    /// Create an empty recorder whose arena uses `config`.
    pub fn with_arena_config(config: ArenaConfig) -> Result<Self, RecordError> {
        Ok(Self::from_arena(ScratchAllocator::with_config(config)?))
    }

    fn from_arena(arena: ScratchAllocator) -> Self {
        Self {
            arena,
            tables: Default::default(),
        }
    }

    fn table(&self, category: Category) -> &CategoryTable {
        &self.tables[category.index()]
    }

    fn table_mut(&mut self, category: Category) -> &mut CategoryTable {
        &mut self.tables[category.index()]
    }

    // ── Registration ────────────────────────────────────────────

    /// Register a descriptor under a caller-supplied hash.
    ///
    /// If `hash` is already present in the descriptor's category the
    /// existing index is returned and nothing is copied. Otherwise the
    /// descriptor is encoded, with every reference rewritten to the
    /// (category, index) of the record it is bound to, and appended.
    ///
    /// Fails with [`RecordError::UnresolvedReference`] if the descriptor
    /// references a handle that is not bound to a record, leaving the
    /// recorder unchanged.
    pub fn register<T: Canonical + ?Sized>(
        &mut self,
        hash: ContentHash,
        info: &T,
    ) -> Result<u32, RecordError> {
        let category = T::CATEGORY;
        if let Some(index) = self.table(category).records.get_index_of(&hash) {
            tracing::trace!(%category, index, %hash, "dedup hit");
            return Ok(index as u32);
        }

        let len = self.table(category).records.len();
        let index = u32::try_from(len)
            .map_err(|_| RecordError::PayloadTooLarge { category, len })?;

        let mut encoder = PayloadEncoder {
            buf: SmallVec::new(),
            deps: CategorySet::EMPTY,
            category,
            lookup: self,
        };
        info.walk(&mut encoder)?;
        let PayloadEncoder { buf, deps, .. } = encoder;
        if u32::try_from(buf.len()).is_err() {
            return Err(RecordError::PayloadTooLarge {
                category,
                len: buf.len(),
            });
        }

        let payload = self.arena.store_bytes(&buf)?;
        self.table_mut(category).records.insert(
            hash,
            StoredRecord {
                payload,
                deps,
                handle: UNBOUND,
            },
        );
        tracing::debug!(%category, index, %hash, bytes = buf.len(), %deps, "registered");
        Ok(index)
    }

    /// Compute the content hash of `info` and register it.
    pub fn capture<T: Canonical + ?Sized>(
        &mut self,
        info: &T,
    ) -> Result<(ContentHash, u32), RecordError> {
        let hash = compute_hash(&*self, info)?;
        let index = self.register(hash, info)?;
        Ok((hash, index))
    }

    /// Register a sampler.
    pub fn register_sampler(
        &mut self,
        hash: ContentHash,
        info: &SamplerCreateInfo<'_>,
    ) -> Result<u32, RecordError> {
        self.register(hash, info)
    }

    /// Register a descriptor-set layout.
    pub fn register_descriptor_set_layout(
        &mut self,
        hash: ContentHash,
        info: &DescriptorSetLayoutCreateInfo<'_>,
    ) -> Result<u32, RecordError> {
        self.register(hash, info)
    }

    /// Register a pipeline layout.
    pub fn register_pipeline_layout(
        &mut self,
        hash: ContentHash,
        info: &PipelineLayoutCreateInfo<'_>,
    ) -> Result<u32, RecordError> {
        self.register(hash, info)
    }

    /// Register a shader module.
    pub fn register_shader_module(
        &mut self,
        hash: ContentHash,
        info: &ShaderModuleCreateInfo<'_>,
    ) -> Result<u32, RecordError> {
        self.register(hash, info)
    }

    /// Register a render pass.
    pub fn register_render_pass(
        &mut self,
        hash: ContentHash,
        info: &RenderPassCreateInfo<'_>,
    ) -> Result<u32, RecordError> {
        self.register(hash, info)
    }

    /// Register a compute pipeline.
    pub fn register_compute_pipeline(
        &mut self,
        hash: ContentHash,
        info: &ComputePipelineCreateInfo<'_>,
    ) -> Result<u32, RecordError> {
        self.register(hash, info)
    }

    /// Register a graphics pipeline.
    pub fn register_graphics_pipeline(
        &mut self,
        hash: ContentHash,
        info: &GraphicsPipelineCreateInfo<'_>,
    ) -> Result<u32, RecordError> {
        self.register(hash, info)
    }

    // ── Handle binding ──────────────────────────────────────────

    /// Bind the runtime handle the caller created for a record.
    ///
    /// Later descriptors may reference the record through this handle.
    /// Rebinding a record, or binding a handle that was bound to another
    /// record of the same category, replaces the old association.
    pub fn bind_handle<H: Handle>(
        &mut self,
        category: Category,
        index: u32,
        handle: H,
    ) -> Result<(), RecordError> {
        let raw = handle.as_raw();
        let table = self.table_mut(category);
        let len = table.records.len() as u32;
        let Some((_, record)) = table.records.get_index_mut(index as usize) else {
            return Err(RecordError::UnknownIndex {
                category,
                index,
                len,
            });
        };
        if raw == UNBOUND {
            return Err(RecordError::NullHandle { category, index });
        }

        let previous = std::mem::replace(&mut record.handle, raw);
        if previous != UNBOUND && previous != raw {
            table.by_handle.remove(&previous);
            tracing::debug!(%category, index, old = previous, new = raw, "handle rebound");
        }
        if let Some(other) = table.by_handle.insert(raw, index) {
            if other != index {
                if let Some((_, stale)) = table.records.get_index_mut(other as usize) {
                    stale.handle = UNBOUND;
                }
                tracing::debug!(%category, from = other, to = index, handle = raw, "handle moved");
            }
        }
        tracing::debug!(%category, index, handle = raw, "handle bound");
        Ok(())
    }

    /// Bind a sampler handle.
    pub fn set_sampler_handle(&mut self, index: u32, handle: vk::Sampler) -> Result<(), RecordError> {
        self.bind_handle(Category::Sampler, index, handle)
    }

    /// Bind a descriptor-set layout handle.
    pub fn set_descriptor_set_layout_handle(
        &mut self,
        index: u32,
        handle: vk::DescriptorSetLayout,
    ) -> Result<(), RecordError> {
        self.bind_handle(Category::DescriptorSetLayout, index, handle)
    }

    /// Bind a pipeline layout handle.
    pub fn set_pipeline_layout_handle(
        &mut self,
        index: u32,
        handle: vk::PipelineLayout,
    ) -> Result<(), RecordError> {
        self.bind_handle(Category::PipelineLayout, index, handle)
    }

    /// Bind a shader module handle.
    pub fn set_shader_module_handle(
        &mut self,
        index: u32,
        handle: vk::ShaderModule,
    ) -> Result<(), RecordError> {
        self.bind_handle(Category::ShaderModule, index, handle)
    }

    /// Bind a render pass handle.
    pub fn set_render_pass_handle(
        &mut self,
        index: u32,
        handle: vk::RenderPass,
    ) -> Result<(), RecordError> {
        self.bind_handle(Category::RenderPass, index, handle)
    }

    /// Bind a compute pipeline handle.
    pub fn set_compute_pipeline_handle(
        &mut self,
        index: u32,
        handle: vk::Pipeline,
    ) -> Result<(), RecordError> {
        self.bind_handle(Category::ComputePipeline, index, handle)
    }

    /// Bind a graphics pipeline handle.
    pub fn set_graphics_pipeline_handle(
        &mut self,
        index: u32,
        handle: vk::Pipeline,
    ) -> Result<(), RecordError> {
        self.bind_handle(Category::GraphicsPipeline, index, handle)
    }

    // ── Lookup ──────────────────────────────────────────────────

    /// Content hash of the record bound to `handle`.
    pub fn hash_for_handle<H: Handle>(
        &self,
        category: Category,
        handle: H,
    ) -> Result<ContentHash, RecordError> {
        self.lookup(category, handle).map(|(_, hash)| hash)
    }

    /// Index of the record bound to `handle`.
    pub fn index_for_handle<H: Handle>(
        &self,
        category: Category,
        handle: H,
    ) -> Result<u32, RecordError> {
        self.lookup(category, handle).map(|(index, _)| index)
    }

    fn lookup<H: Handle>(
        &self,
        category: Category,
        handle: H,
    ) -> Result<(u32, ContentHash), RecordError> {
        let raw = handle.as_raw();
        self.resolve(category, raw)
            .ok_or(RecordError::UnresolvedReference {
                category,
                handle: raw,
            })
    }

    /// Content hash of the sampler bound to `handle`.
    pub fn hash_for_sampler(&self, handle: vk::Sampler) -> Result<ContentHash, RecordError> {
        self.hash_for_handle(Category::Sampler, handle)
    }

    /// Content hash of the descriptor-set layout bound to `handle`.
    pub fn hash_for_descriptor_set_layout(
        &self,
        handle: vk::DescriptorSetLayout,
    ) -> Result<ContentHash, RecordError> {
        self.hash_for_handle(Category::DescriptorSetLayout, handle)
    }

    /// Content hash of the pipeline layout bound to `handle`.
    pub fn hash_for_pipeline_layout(
        &self,
        handle: vk::PipelineLayout,
    ) -> Result<ContentHash, RecordError> {
        self.hash_for_handle(Category::PipelineLayout, handle)
    }

    /// Content hash of the shader module bound to `handle`.
    pub fn hash_for_shader_module(
        &self,
        handle: vk::ShaderModule,
    ) -> Result<ContentHash, RecordError> {
        self.hash_for_handle(Category::ShaderModule, handle)
    }

    /// Content hash of the render pass bound to `handle`.
    pub fn hash_for_render_pass(&self, handle: vk::RenderPass) -> Result<ContentHash, RecordError> {
        self.hash_for_handle(Category::RenderPass, handle)
    }

    /// Content hash of the compute pipeline bound to `handle`.
    pub fn hash_for_compute_pipeline(
        &self,
        handle: vk::Pipeline,
    ) -> Result<ContentHash, RecordError> {
        self.hash_for_handle(Category::ComputePipeline, handle)
    }

    /// Content hash of the graphics pipeline bound to `handle`.
    pub fn hash_for_graphics_pipeline(
        &self,
        handle: vk::Pipeline,
    ) -> Result<ContentHash, RecordError> {
        self.hash_for_handle(Category::GraphicsPipeline, handle)
    }

    // ── Inspection ──────────────────────────────────────────────

    /// Number of records in `category`.
    pub fn len(&self, category: Category) -> usize {
        self.table(category).records.len()
    }

    /// Whether no category holds any record.
    pub fn is_empty(&self) -> bool {
        self.tables.iter().all(|t| t.records.is_empty())
    }

    /// View of one record.
    pub fn record(&self, category: Category, index: u32) -> Option<RecordRef<'_>> {
        let (hash, stored) = self.table(category).records.get_index(index as usize)?;
        self.view(category, index, *hash, stored)
    }

    /// Records of `category` in index order.
    pub fn records(&self, category: Category) -> impl Iterator<Item = RecordRef<'_>> + '_ {
        self.table(category)
            .records
            .iter()
            .enumerate()
            .filter_map(move |(i, (hash, stored))| self.view(category, i as u32, *hash, stored))
    }

    fn view(
        &self,
        category: Category,
        index: u32,
        hash: ContentHash,
        stored: &StoredRecord,
    ) -> Option<RecordRef<'_>> {
        Some(RecordRef {
            category,
            index,
            hash,
            deps: stored.deps,
            payload: self.arena.bytes(stored.payload)?,
            handle: (stored.handle != UNBOUND).then_some(stored.handle),
        })
    }

    /// Bytes of encoded payload held in the recorder's arena.
    pub fn arena_bytes(&self) -> usize {
        self.arena.allocated_bytes()
    }

    // ── Serialization ───────────────────────────────────────────

    /// Serialize every record into a blob.
    ///
    /// Categories appear in dependency order and records in index order,
    /// so the output depends only on what was registered and in which
    /// order, never on hash values or handle bindings.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.serialized_len());
        write_header(&mut out);
        let mut records = 0usize;
        for category in Category::ALL {
            write_u32_le(&mut out, self.len(category) as u32);
            for record in self.records(category) {
                write_record(&mut out, record.hash, record.deps, record.payload);
                records += 1;
            }
        }
        tracing::info!(records, bytes = out.len(), "serialized pipeline state");
        out
    }

    /// Serialize into a writer.
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.serialize())
    }

    fn serialized_len(&self) -> usize {
        let records: usize = Category::ALL
            .iter()
            .flat_map(|&c| self.records(c))
            .map(|r| RECORD_HEADER_LEN + r.payload.len())
            .sum();
        crate::MAGIC.len() + 4 + 4 * Category::COUNT + records
    }
}

impl HandleLookup for StateRecorder {
    fn resolve(&self, category: Category, handle: u64) -> Option<(u32, ContentHash)> {
        let table = self.table(category);
        let &index = table.by_handle.get(&handle)?;
        let (&hash, _) = table.records.get_index(index as usize)?;
        Some((index, hash))
    }
}

impl Default for StateRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("StateRecorder");
        for category in Category::ALL {
            s.field(category.name(), &self.len(category));
        }
        s.field("arena", &self.arena).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WireReader;

    fn sampler(max_lod: f32) -> SamplerCreateInfo<'static> {
        SamplerCreateInfo {
            mag_filter: vk::Filter::LINEAR,
            min_filter: vk::Filter::LINEAR,
            max_lod,
            ..Default::default()
        }
    }

    #[test]
    fn dedup_returns_existing_index() {
        let mut rec = StateRecorder::new();
        let (h0, i0) = rec.capture(&sampler(1.0)).unwrap();
        let (h1, i1) = rec.capture(&sampler(2.0)).unwrap();
        let (h2, i2) = rec.capture(&sampler(1.0)).unwrap();
        assert_eq!((i0, i1, i2), (0, 1, 0));
        assert_eq!(h0, h2);
        assert_ne!(h0, h1);
        assert_eq!(rec.len(Category::Sampler), 2);
    }

    #[test]
    fn dedup_hit_copies_nothing() {
        let mut rec = StateRecorder::new();
        rec.capture(&sampler(1.0)).unwrap();
        let used = rec.arena_bytes();
        rec.capture(&sampler(1.0)).unwrap();
        assert_eq!(rec.arena_bytes(), used);
    }

    #[test]
    fn register_trusts_caller_hash() {
        let mut rec = StateRecorder::new();
        let i = rec.register_sampler(ContentHash(5), &sampler(1.0)).unwrap();
        // Different content, same caller-chosen hash: treated as a duplicate.
        let j = rec.register_sampler(ContentHash(5), &sampler(9.0)).unwrap();
        assert_eq!((i, j), (0, 0));
    }

    #[test]
    fn references_must_be_bound_before_registration() {
        let mut rec = StateRecorder::new();
        let layouts = [vk::DescriptorSetLayout::from_raw(0xD5)];
        let info = PipelineLayoutCreateInfo {
            set_layouts: &layouts,
            ..Default::default()
        };
        assert_eq!(
            rec.register_pipeline_layout(ContentHash(1), &info),
            Err(RecordError::UnresolvedReference {
                category: Category::DescriptorSetLayout,
                handle: 0xD5
            })
        );
        assert!(rec.is_empty());
        assert_eq!(rec.arena_bytes(), 0);
    }

    #[test]
    fn references_are_rewritten_to_indices() {
        let mut rec = StateRecorder::new();
        rec.capture(&DescriptorSetLayoutCreateInfo::default()).unwrap();
        let (_, dsl) = rec
            .capture(&DescriptorSetLayoutCreateInfo {
                flags: vk::DescriptorSetLayoutCreateFlags::PUSH_DESCRIPTOR_KHR,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(dsl, 1);
        rec.set_descriptor_set_layout_handle(dsl, vk::DescriptorSetLayout::from_raw(0xAB))
            .unwrap();

        let layouts = [vk::DescriptorSetLayout::from_raw(0xAB)];
        let (_, pl) = rec
            .capture(&PipelineLayoutCreateInfo {
                set_layouts: &layouts,
                ..Default::default()
            })
            .unwrap();
        let record = rec.record(Category::PipelineLayout, pl).unwrap();
        assert_eq!(record.deps, CategorySet::of(&[Category::DescriptorSetLayout]));

        let mut r = WireReader::new(record.payload);
        assert_eq!(r.u32(), Ok(0)); // flags
        assert_eq!(r.count(1), Ok(1));
        assert_eq!(r.presence(), Ok(true));
        assert_eq!(r.category(), Ok(Category::DescriptorSetLayout));
        assert_eq!(r.u32(), Ok(1));
        assert_eq!(r.count(1), Ok(0)); // push constants
        assert!(r.finish().is_ok());
    }

    #[test]
    fn bind_validates_index_and_handle() {
        let mut rec = StateRecorder::new();
        assert_eq!(
            rec.set_sampler_handle(0, vk::Sampler::from_raw(1)),
            Err(RecordError::UnknownIndex {
                category: Category::Sampler,
                index: 0,
                len: 0
            })
        );
        rec.capture(&sampler(1.0)).unwrap();
        assert_eq!(
            rec.set_sampler_handle(0, vk::Sampler::null()),
            Err(RecordError::NullHandle {
                category: Category::Sampler,
                index: 0
            })
        );
    }

    #[test]
    fn rebinding_replaces_old_association() {
        let mut rec = StateRecorder::new();
        let (h0, _) = rec.capture(&sampler(1.0)).unwrap();
        let (h1, _) = rec.capture(&sampler(2.0)).unwrap();
        let a = vk::Sampler::from_raw(0xA);
        let b = vk::Sampler::from_raw(0xB);

        rec.set_sampler_handle(0, a).unwrap();
        rec.set_sampler_handle(0, b).unwrap();
        assert!(rec.hash_for_sampler(a).is_err());
        assert_eq!(rec.hash_for_sampler(b), Ok(h0));

        // Moving handle `b` to record 1 unbinds record 0.
        rec.set_sampler_handle(1, b).unwrap();
        assert_eq!(rec.hash_for_sampler(b), Ok(h1));
        assert_eq!(rec.record(Category::Sampler, 0).unwrap().handle, None);
        assert_eq!(rec.index_for_handle(Category::Sampler, b), Ok(1));
    }

    #[test]
    fn handles_are_per_category() {
        let mut rec = StateRecorder::new();
        rec.capture(&sampler(1.0)).unwrap();
        rec.set_sampler_handle(0, vk::Sampler::from_raw(7)).unwrap();
        assert!(rec
            .hash_for_handle(Category::ShaderModule, vk::ShaderModule::from_raw(7))
            .is_err());
    }

    #[test]
    fn serialize_is_independent_of_bindings() {
        let mut rec = StateRecorder::new();
        rec.capture(&sampler(1.0)).unwrap();
        let before = rec.serialize();
        rec.set_sampler_handle(0, vk::Sampler::from_raw(0x55)).unwrap();
        assert_eq!(rec.serialize(), before);

        let mut written = Vec::new();
        rec.write_to(&mut written).unwrap();
        assert_eq!(written, before);
    }

    #[test]
    fn serialized_layout() {
        let mut rec = StateRecorder::new();
        rec.capture(&sampler(1.0)).unwrap();
        rec.capture(&ShaderModuleCreateInfo {
            code: &[0x0723_0203, 1, 2],
            ..Default::default()
        })
        .unwrap();
        let blob = rec.serialize();

        let mut r = WireReader::new(&blob);
        crate::codec::read_header(&mut r).unwrap();
        for category in Category::ALL {
            let count = r.u32().unwrap();
            assert_eq!(count as usize, rec.len(category), "{category}");
            for record in rec.records(category) {
                assert_eq!(r.u64(), Ok(record.hash.0));
                assert_eq!(r.u8(), Ok(0));
                let len = r.count(1).unwrap();
                assert_eq!(r.take(len), Ok(record.payload));
            }
        }
        assert!(r.finish().is_ok());
    }

    #[test]
    fn bounded_arena_reports_allocation_failure() {
        let mut rec = StateRecorder::with_arena_config(ArenaConfig {
            block_size: 256,
            max_bytes: Some(256),
        })
        .unwrap();
        let code = vec![0u32; 200];
        let err = rec
            .capture(&ShaderModuleCreateInfo {
                code: &code,
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, RecordError::Allocation(_)));
        assert!(rec.is_empty());
    }
}
