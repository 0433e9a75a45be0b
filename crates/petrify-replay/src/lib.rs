//! Replay side of pipeline-state capture.
//!
//! Parses a blob written by the recorder and recreates every object it
//! describes through a caller-supplied [`StateCreator`], dependencies
//! first, with each reference rewritten to the handle the creator
//! produced for its target.
//!
//! # Architecture
//!
//! - [`BlobIndex`] validates framing and groups records by category
//! - the decoder rebuilds descriptors in the replayer's arena, mirroring
//!   the recorder's canonical walk field for field
//! - [`StateReplayer`] walks categories in dependency order, calls the
//!   creator, and inserts [`wait_enqueue`](StateCreator::wait_enqueue)
//!   barriers before any record whose dependencies may be in flight
//! - [`HandleSlot`] is how an asynchronous creator reports its result
//!
//! # Example
//!
//! ```
//! use petrify_core::vk::{self, Handle};
//! use petrify_core::{ContentHash, SamplerCreateInfo};
//! use petrify_record::StateRecorder;
//! use petrify_replay::{HandleSlot, StateCreator, StateReplayer};
//!
//! struct Samplers(u64);
//!
//! impl<'a> StateCreator<'a> for Samplers {
//!     fn enqueue_create_sampler(
//!         &mut self,
//!         _hash: ContentHash,
//!         _index: u32,
//!         _info: &'a SamplerCreateInfo<'a>,
//!         slot: HandleSlot<vk::Sampler>,
//!     ) -> bool {
//!         self.0 += 1;
//!         slot.set(vk::Sampler::from_raw(self.0));
//!         true
//!     }
//!     # fn enqueue_create_descriptor_set_layout(&mut self, _: ContentHash, _: u32, _: &'a petrify_core::DescriptorSetLayoutCreateInfo<'a>, _: HandleSlot<vk::DescriptorSetLayout>) -> bool { false }
//!     # fn enqueue_create_pipeline_layout(&mut self, _: ContentHash, _: u32, _: &'a petrify_core::PipelineLayoutCreateInfo<'a>, _: HandleSlot<vk::PipelineLayout>) -> bool { false }
//!     # fn enqueue_create_shader_module(&mut self, _: ContentHash, _: u32, _: &'a petrify_core::ShaderModuleCreateInfo<'a>, _: HandleSlot<vk::ShaderModule>) -> bool { false }
//!     # fn enqueue_create_render_pass(&mut self, _: ContentHash, _: u32, _: &'a petrify_core::RenderPassCreateInfo<'a>, _: HandleSlot<vk::RenderPass>) -> bool { false }
//!     # fn enqueue_create_compute_pipeline(&mut self, _: ContentHash, _: u32, _: &'a petrify_core::ComputePipelineCreateInfo<'a>, _: HandleSlot<vk::Pipeline>) -> bool { false }
//!     # fn enqueue_create_graphics_pipeline(&mut self, _: ContentHash, _: u32, _: &'a petrify_core::GraphicsPipelineCreateInfo<'a>, _: HandleSlot<vk::Pipeline>) -> bool { false }
//! }
//!
//! let mut recorder = StateRecorder::new();
//! recorder.capture(&SamplerCreateInfo::default()).unwrap();
//! let blob = recorder.serialize();
//!
//! let replayer = StateReplayer::new();
//! let mut creator = Samplers(0);
//! let summary = replayer.parse(&mut creator, &blob).unwrap();
//! assert_eq!(summary.total(), 1);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod blob;
pub mod creator;
mod decode;
pub mod replayer;

pub use blob::{BlobIndex, BlobRecord};
pub use creator::{HandleSlot, StateCreator};
pub use replayer::{ReplayConfig, ReplayPhase, ReplaySummary, StateReplayer};
