//! Dependency-ordered replay of a blob through a [`StateCreator`].

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use petrify_arena::{ArenaConfig, ScratchAllocator};
use petrify_core::{Category, CategorySet, FailureKind, FormatError, ObjectRef, ReplayError};

use crate::blob::{BlobIndex, BlobRecord};
use crate::creator::{HandleSlot, StateCreator};
use crate::decode::{DecodeError, Decoder};

/// Replay options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Sizing of the arena that owns every decoded descriptor.
    pub arena: ArenaConfig,
    /// Call [`StateCreator::wait_enqueue`] before decoding anything that
    /// references an object whose creation may still be in flight.
    ///
    /// With barriers off, a reference to an unfilled slot decodes as the
    /// null handle instead of failing. Only useful with a creator that
    /// fills every slot before `enqueue_create_*` returns.
    pub insert_barriers: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            arena: ArenaConfig::default(),
            insert_barriers: true,
        }
    }
}

/// Where a replay currently stands, or where the last one stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplayPhase {
    /// Nothing parsed yet.
    Start,
    /// Header and framing accepted.
    HeaderValidated,
    /// The capacity hint for a category was accepted.
    CapacityAnnounced(Category),
    /// A record is being decoded and handed to the creator.
    Decoding(ObjectRef),
    /// Waiting on the creator's outstanding work.
    Barrier,
    /// Every record was enqueued.
    Done,
    /// The replay stopped with an error of this kind.
    Failed(FailureKind),
}

/// Outcome of a successful replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    counts: [u32; Category::COUNT],
    barriers: u32,
}

impl ReplaySummary {
    /// Records of `category` handed to the creator.
    pub fn count(&self, category: Category) -> u32 {
        self.counts[category.index()]
    }

    /// Records handed to the creator across all categories.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Number of [`StateCreator::wait_enqueue`] calls made.
    pub fn barriers(&self) -> u32 {
        self.barriers
    }
}

/// Output slots of every record replayed so far, per category.
pub(crate) struct SlotTable {
    slots: [Vec<Arc<AtomicU64>>; Category::COUNT],
    require_filled: bool,
}

impl SlotTable {
    fn new(index: &BlobIndex<'_>, require_filled: bool) -> Self {
        let slots = Category::ALL.map(|c| Vec::with_capacity(index.records(c).len()));
        Self {
            slots,
            require_filled,
        }
    }

    fn push(&mut self, category: Category, cell: Arc<AtomicU64>) {
        self.slots[category.index()].push(cell);
    }

    /// Raw handle created for `target`.
    pub(crate) fn lookup(&self, target: ObjectRef) -> Result<u64, DecodeError> {
        let Some(cell) = self.slots[target.category.index()].get(target.index as usize) else {
            return Err(DecodeError::Format(FormatError::InvalidValue {
                detail: format!("reference to {target}, which is not yet replayed"),
            }));
        };
        match cell.load(Ordering::Acquire) {
            0 if self.require_filled => Err(DecodeError::Unresolved(target)),
            raw => Ok(raw),
        }
    }
}

/// Parses blobs and recreates their objects through a [`StateCreator`].
///
/// Categories are replayed in dependency order: samplers, descriptor-set
/// layouts, pipeline layouts, shader modules, render passes, compute
/// pipelines, graphics pipelines. Within a category records go in index
/// order, which also puts every base pipeline before its derivatives.
///
/// Decoded descriptors live in the replayer's arena. They stay valid, and
/// keep their memory, until the replayer is dropped; parsing several blobs
/// with one replayer accumulates.
pub struct StateReplayer {
    arena: ScratchAllocator,
    config: ReplayConfig,
    phase: Cell<ReplayPhase>,
}

impl StateReplayer {
    /// A replayer with the default configuration.
    pub fn new() -> Self {
        Self {
            arena: ScratchAllocator::new(),
            config: ReplayConfig::default(),
            phase: Cell::new(ReplayPhase::Start),
        }
    }

    /// A replayer with `config`, rejecting invalid arena settings.
    pub fn with_config(config: ReplayConfig) -> Result<Self, ReplayError> {
        let arena = ScratchAllocator::with_config(config.arena.clone()).map_err(|source| {
            ReplayError::Allocation {
                record: None,
                source,
            }
        })?;
        Ok(Self {
            arena,
            config,
            phase: Cell::new(ReplayPhase::Start),
        })
    }

    /// The arena owning decoded descriptors.
    pub fn allocator(&self) -> &ScratchAllocator {
        &self.arena
    }

    /// The active configuration.
    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Progress of the current or most recent [`parse`](Self::parse).
    pub fn phase(&self) -> ReplayPhase {
        self.phase.get()
    }

    /// Replay every record of `blob` through `creator`.
    ///
    /// The blob's framing is validated in full before the first capacity
    /// hint, so a truncated or corrupt container never reaches the
    /// creator. Payloads are decoded one at a time; a payload error stops
    /// the replay with earlier records already enqueued.
    pub fn parse<'a>(
        &'a self,
        creator: &mut dyn StateCreator<'a>,
        blob: &[u8],
    ) -> Result<ReplaySummary, ReplayError> {
        self.phase.set(ReplayPhase::Start);
        match self.run(creator, blob) {
            Ok(summary) => {
                self.phase.set(ReplayPhase::Done);
                tracing::info!(
                    records = summary.total(),
                    barriers = summary.barriers,
                    arena_bytes = self.arena.allocated_bytes(),
                    "replay complete"
                );
                Ok(summary)
            }
            Err(err) => {
                self.phase.set(ReplayPhase::Failed(err.kind()));
                tracing::warn!(error = %err, "replay aborted");
                Err(err)
            }
        }
    }

    fn run<'a>(
        &'a self,
        creator: &mut dyn StateCreator<'a>,
        blob: &[u8],
    ) -> Result<ReplaySummary, ReplayError> {
        let index = BlobIndex::parse(blob)?;
        self.phase.set(ReplayPhase::HeaderValidated);
        tracing::debug!(records = index.total(), bytes = blob.len(), "blob framing validated");

        let barriers = self.config.insert_barriers;
        let mut slots = SlotTable::new(&index, barriers);
        let mut pending = CategorySet::EMPTY;
        let mut summary = ReplaySummary::default();

        for category in Category::ALL {
            let records = index.records(category);
            if barriers && index.dependencies(category).intersects(pending) {
                self.barrier(creator, &mut pending, &mut summary);
            }

            let count = index.count(category);
            if !announce(creator, category, count) {
                tracing::warn!(%category, count, "capacity hint rejected");
                return Err(ReplayError::CapacityRejected { category, count });
            }
            self.phase.set(ReplayPhase::CapacityAnnounced(category));
            tracing::debug!(%category, count, "capacity announced");

            for (i, record) in records.iter().enumerate() {
                let object = ObjectRef::new(category, i as u32);
                if barriers && record.deps.contains(category) && pending.contains(category) {
                    self.barrier(creator, &mut pending, &mut summary);
                }
                self.phase.set(ReplayPhase::Decoding(object));
                tracing::trace!(%object, hash = %record.hash, "replaying record");

                let cell = Arc::new(AtomicU64::new(0));
                let accepted = self.dispatch(creator, object, record, &slots, Arc::clone(&cell))?;
                if !accepted {
                    tracing::warn!(%object, hash = %record.hash, "creation rejected");
                    return Err(ReplayError::CreationRejected {
                        record: object,
                        hash: record.hash,
                    });
                }
                slots.push(category, cell);
                pending.insert(category);
                summary.counts[category.index()] += 1;
            }
        }
        Ok(summary)
    }

    fn barrier<'a>(
        &self,
        creator: &mut dyn StateCreator<'a>,
        pending: &mut CategorySet,
        summary: &mut ReplaySummary,
    ) {
        self.phase.set(ReplayPhase::Barrier);
        tracing::trace!(%pending, "waiting on outstanding creations");
        creator.wait_enqueue();
        *pending = CategorySet::EMPTY;
        summary.barriers += 1;
    }

    fn dispatch<'a>(
        &'a self,
        creator: &mut dyn StateCreator<'a>,
        object: ObjectRef,
        record: &BlobRecord<'_>,
        slots: &SlotTable,
        cell: Arc<AtomicU64>,
    ) -> Result<bool, ReplayError> {
        let decoder = Decoder::new(&self.arena, record.payload, object, record.deps, slots);
        let (hash, index) = (record.hash, object.index);
        let accepted = match object.category {
            Category::Sampler => {
                let info = decoder.finish(Decoder::sampler)?;
                creator.enqueue_create_sampler(hash, index, info, HandleSlot::from_cell(cell))
            }
            Category::DescriptorSetLayout => {
                let info = decoder.finish(Decoder::descriptor_set_layout)?;
                creator.enqueue_create_descriptor_set_layout(
                    hash,
                    index,
                    info,
                    HandleSlot::from_cell(cell),
                )
            }
            Category::PipelineLayout => {
                let info = decoder.finish(Decoder::pipeline_layout)?;
                creator.enqueue_create_pipeline_layout(hash, index, info, HandleSlot::from_cell(cell))
            }
            Category::ShaderModule => {
                let info = decoder.finish(Decoder::shader_module)?;
                creator.enqueue_create_shader_module(hash, index, info, HandleSlot::from_cell(cell))
            }
            Category::RenderPass => {
                let info = decoder.finish(Decoder::render_pass)?;
                creator.enqueue_create_render_pass(hash, index, info, HandleSlot::from_cell(cell))
            }
            Category::ComputePipeline => {
                let info = decoder.finish(Decoder::compute_pipeline)?;
                creator.enqueue_create_compute_pipeline(
                    hash,
                    index,
                    info,
                    HandleSlot::from_cell(cell),
                )
            }
            Category::GraphicsPipeline => {
                let info = decoder.finish(Decoder::graphics_pipeline)?;
                creator.enqueue_create_graphics_pipeline(
                    hash,
                    index,
                    info,
                    HandleSlot::from_cell(cell),
                )
            }
        };
        Ok(accepted)
    }
}

impl Default for StateReplayer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StateReplayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateReplayer")
            .field("config", &self.config)
            .field("phase", &self.phase.get())
            .field("arena_bytes", &self.arena.allocated_bytes())
            .finish()
    }
}

fn announce<'a>(creator: &mut dyn StateCreator<'a>, category: Category, count: u32) -> bool {
    match category {
        Category::Sampler => creator.set_num_samplers(count),
        Category::DescriptorSetLayout => creator.set_num_descriptor_set_layouts(count),
        Category::PipelineLayout => creator.set_num_pipeline_layouts(count),
        Category::ShaderModule => creator.set_num_shader_modules(count),
        Category::RenderPass => creator.set_num_render_passes(count),
        Category::ComputePipeline => creator.set_num_compute_pipelines(count),
        Category::GraphicsPipeline => creator.set_num_graphics_pipelines(count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_inserts_barriers() {
        let config = ReplayConfig::default();
        assert!(config.insert_barriers);
        assert_eq!(config.arena, ArenaConfig::default());
    }

    #[test]
    fn fresh_replayer_is_at_start() {
        let replayer = StateReplayer::new();
        assert_eq!(replayer.phase(), ReplayPhase::Start);
        assert_eq!(replayer.allocator().allocated_bytes(), 0);
    }

    #[test]
    fn invalid_arena_config_is_an_allocation_error() {
        let config = ReplayConfig {
            arena: ArenaConfig {
                block_size: 0,
                ..ArenaConfig::default()
            },
            insert_barriers: true,
        };
        let err = StateReplayer::with_config(config).unwrap_err();
        assert_eq!(err.kind(), FailureKind::Allocation);
    }

    #[test]
    fn lookup_distinguishes_unreplayed_and_unfilled() {
        let index = BlobIndex::default();
        let mut slots = SlotTable::new(&index, true);
        let target = ObjectRef::new(Category::Sampler, 0);
        assert!(matches!(slots.lookup(target), Err(DecodeError::Format(_))));

        let cell = Arc::new(AtomicU64::new(0));
        slots.push(Category::Sampler, Arc::clone(&cell));
        assert!(matches!(slots.lookup(target), Err(DecodeError::Unresolved(t)) if t == target));

        cell.store(7, Ordering::Release);
        assert_eq!(slots.lookup(target).unwrap(), 7);
    }

    #[test]
    fn lenient_lookup_passes_null_through() {
        let index = BlobIndex::default();
        let mut slots = SlotTable::new(&index, false);
        slots.push(Category::RenderPass, Arc::new(AtomicU64::new(0)));
        let target = ObjectRef::new(Category::RenderPass, 0);
        assert_eq!(slots.lookup(target).unwrap(), 0);
    }
}
