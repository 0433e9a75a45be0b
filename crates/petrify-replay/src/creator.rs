//! The creation interface a replay drives, and the output slots it fills.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ash::vk::{self, Handle};
use petrify_core::info::*;
use petrify_core::ContentHash;

/// Output slot for the handle of one replayed object.
///
/// Cloneable and `Send + Sync`: a creator may hand a clone to another
/// thread and fill it there. An unfilled slot reads as the null handle.
/// The replayer reads slots only after the creator's
/// [`wait_enqueue`](StateCreator::wait_enqueue) has returned.
pub struct HandleSlot<H> {
    cell: Arc<AtomicU64>,
    _handle: PhantomData<fn() -> H>,
}

impl<H: Handle> HandleSlot<H> {
    /// A fresh, unfilled slot.
    pub fn new() -> Self {
        Self::from_cell(Arc::new(AtomicU64::new(0)))
    }

    pub(crate) fn from_cell(cell: Arc<AtomicU64>) -> Self {
        Self {
            cell,
            _handle: PhantomData,
        }
    }

    /// Store the created handle.
    pub fn set(&self, handle: H) {
        self.cell.store(handle.as_raw(), Ordering::Release);
    }

    /// The stored handle, or null if the slot has not been filled.
    pub fn get(&self) -> H {
        H::from_raw(self.cell.load(Ordering::Acquire))
    }

    /// Whether a non-null handle has been stored.
    pub fn is_filled(&self) -> bool {
        self.cell.load(Ordering::Acquire) != 0
    }
}

impl<H: Handle> Default for HandleSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> Clone for HandleSlot<H> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            _handle: PhantomData,
        }
    }
}

impl<H> fmt::Debug for HandleSlot<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HandleSlot({:#x})", self.cell.load(Ordering::Acquire))
    }
}

/// Caller-implemented factory for the objects a blob describes.
///
/// For every category in dependency order the replayer first calls the
/// capacity hint (`set_num_*`) with the number of records, then one
/// `enqueue_create_*` per record in index order. Returning `false` from
/// either aborts the replay.
///
/// An `enqueue_create_*` call may return before the object exists; the
/// creator then fills the slot later, at the latest when
/// [`wait_enqueue`](Self::wait_enqueue) returns. The replayer calls
/// `wait_enqueue` before decoding anything that references an object
/// enqueued since the previous call.
///
/// Descriptors borrow the replayer's arena for `'a`, so a creator may
/// hold on to them until the replayer is dropped.
pub trait StateCreator<'a> {
    /// Number of samplers that will follow.
    fn set_num_samplers(&mut self, count: u32) -> bool {
        let _ = count;
        true
    }

    /// Number of descriptor-set layouts that will follow.
    fn set_num_descriptor_set_layouts(&mut self, count: u32) -> bool {
        let _ = count;
        true
    }

    /// Number of pipeline layouts that will follow.
    fn set_num_pipeline_layouts(&mut self, count: u32) -> bool {
        let _ = count;
        true
    }

    /// Number of shader modules that will follow.
    fn set_num_shader_modules(&mut self, count: u32) -> bool {
        let _ = count;
        true
    }

    /// Number of render passes that will follow.
    fn set_num_render_passes(&mut self, count: u32) -> bool {
        let _ = count;
        true
    }

    /// Number of compute pipelines that will follow.
    fn set_num_compute_pipelines(&mut self, count: u32) -> bool {
        let _ = count;
        true
    }

    /// Number of graphics pipelines that will follow.
    fn set_num_graphics_pipelines(&mut self, count: u32) -> bool {
        let _ = count;
        true
    }

    /// Create sampler `index`.
    fn enqueue_create_sampler(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a SamplerCreateInfo<'a>,
        slot: HandleSlot<vk::Sampler>,
    ) -> bool;

    /// Create descriptor-set layout `index`.
    fn enqueue_create_descriptor_set_layout(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a DescriptorSetLayoutCreateInfo<'a>,
        slot: HandleSlot<vk::DescriptorSetLayout>,
    ) -> bool;

    /// Create pipeline layout `index`.
    fn enqueue_create_pipeline_layout(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a PipelineLayoutCreateInfo<'a>,
        slot: HandleSlot<vk::PipelineLayout>,
    ) -> bool;

    /// Create shader module `index`.
    fn enqueue_create_shader_module(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a ShaderModuleCreateInfo<'a>,
        slot: HandleSlot<vk::ShaderModule>,
    ) -> bool;

    /// Create render pass `index`.
    fn enqueue_create_render_pass(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a RenderPassCreateInfo<'a>,
        slot: HandleSlot<vk::RenderPass>,
    ) -> bool;

    /// Create compute pipeline `index`.
    fn enqueue_create_compute_pipeline(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a ComputePipelineCreateInfo<'a>,
        slot: HandleSlot<vk::Pipeline>,
    ) -> bool;

    /// Create graphics pipeline `index`.
    fn enqueue_create_graphics_pipeline(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a GraphicsPipelineCreateInfo<'a>,
        slot: HandleSlot<vk::Pipeline>,
    ) -> bool;

    /// Block until every creation enqueued so far has filled its slot.
    fn wait_enqueue(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn unfilled_slot_reads_null() {
        let slot = HandleSlot::<vk::Sampler>::new();
        assert!(!slot.is_filled());
        assert_eq!(slot.get(), vk::Sampler::null());
    }

    #[test]
    fn clones_share_the_cell_across_threads() {
        let slot = HandleSlot::<vk::Pipeline>::new();
        let remote = slot.clone();
        thread::spawn(move || remote.set(vk::Pipeline::from_raw(0x42)))
            .join()
            .unwrap();
        assert!(slot.is_filled());
        assert_eq!(slot.get().as_raw(), 0x42);
    }
}
