//! Test utilities and mock creators for petrify development.
//!
//! Provides two [`StateCreator`] implementations and a set of descriptor
//! fixtures:
//!
//! - [`RecordingCreator`] logs every call, keeps every decoded
//!   descriptor, and fills each slot immediately with a deterministic
//!   fake handle ([`fake_handle`])
//! - [`DeferredCreator`] does the same bookkeeping but fills slots on a
//!   worker thread, and only once `wait_enqueue` is called
//! - [`fixtures`] builds realistic descriptors and a complete recorded
//!   [`fixtures::Scene`]

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::thread::{self, JoinHandle};

use ash::vk::{self, Handle};
use crossbeam_channel::{Receiver, Sender};
use petrify_core::info::*;
use petrify_core::{Category, ContentHash, ObjectRef};
use petrify_replay::{HandleSlot, StateCreator};

/// Handle value every mock creator assigns to `object`.
///
/// Distinct per (category, index) and never null.
pub fn fake_handle(object: ObjectRef) -> u64 {
    ((object.category as u64 + 1) << 32) | (u64::from(object.index) + 1)
}

/// One call observed by a mock creator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// `set_num_*` for a category.
    Capacity(Category, u32),
    /// `enqueue_create_*` for a record.
    Create(ObjectRef, ContentHash),
    /// `wait_enqueue`.
    Wait,
}

/// Creator that logs calls and fills slots synchronously.
///
/// Decoded descriptors are kept per category for inspection. Capacity
/// hints and creations can be made to fail with
/// [`reject_capacity`](Self::reject_capacity) and
/// [`reject_create`](Self::reject_create).
#[derive(Debug, Default)]
pub struct RecordingCreator<'a> {
    pub events: Vec<Event>,
    pub samplers: Vec<&'a SamplerCreateInfo<'a>>,
    pub set_layouts: Vec<&'a DescriptorSetLayoutCreateInfo<'a>>,
    pub pipeline_layouts: Vec<&'a PipelineLayoutCreateInfo<'a>>,
    pub shader_modules: Vec<&'a ShaderModuleCreateInfo<'a>>,
    pub render_passes: Vec<&'a RenderPassCreateInfo<'a>>,
    pub compute_pipelines: Vec<&'a ComputePipelineCreateInfo<'a>>,
    pub graphics_pipelines: Vec<&'a GraphicsPipelineCreateInfo<'a>>,
    capacity_veto: Option<Category>,
    create_veto: Option<ObjectRef>,
    unfilled: Option<ObjectRef>,
}

impl<'a> RecordingCreator<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `false` from the capacity hint of `category`.
    pub fn reject_capacity(mut self, category: Category) -> Self {
        self.capacity_veto = Some(category);
        self
    }

    /// Return `false` from the creation of `object`.
    pub fn reject_create(mut self, object: ObjectRef) -> Self {
        self.create_veto = Some(object);
        self
    }

    /// Accept the creation of `object` but never fill its slot.
    pub fn leave_unfilled(mut self, object: ObjectRef) -> Self {
        self.unfilled = Some(object);
        self
    }

    /// Creation events only, in call order.
    pub fn created(&self) -> Vec<ObjectRef> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Create(object, _) => Some(*object),
                _ => None,
            })
            .collect()
    }

    /// Number of `wait_enqueue` calls seen.
    pub fn waits(&self) -> usize {
        self.events.iter().filter(|e| **e == Event::Wait).count()
    }

    fn capacity(&mut self, category: Category, count: u32) -> bool {
        self.events.push(Event::Capacity(category, count));
        self.capacity_veto != Some(category)
    }

    /// Log a creation and decide its outcome.
    fn create(&mut self, category: Category, index: u32, hash: ContentHash) -> Outcome {
        let object = ObjectRef::new(category, index);
        self.events.push(Event::Create(object, hash));
        if self.create_veto == Some(object) {
            Outcome::Rejected
        } else if self.unfilled == Some(object) {
            Outcome::Unfilled
        } else {
            Outcome::Filled(fake_handle(object))
        }
    }
}

#[derive(Clone, Copy)]
enum Outcome {
    Rejected,
    Unfilled,
    Filled(u64),
}

fn fill<H: Handle>(slot: &HandleSlot<H>, outcome: Outcome) -> bool {
    match outcome {
        Outcome::Rejected => false,
        Outcome::Unfilled => true,
        Outcome::Filled(raw) => {
            slot.set(H::from_raw(raw));
            true
        }
    }
}

impl<'a> StateCreator<'a> for RecordingCreator<'a> {
    fn set_num_samplers(&mut self, count: u32) -> bool {
        self.capacity(Category::Sampler, count)
    }

    fn set_num_descriptor_set_layouts(&mut self, count: u32) -> bool {
        self.capacity(Category::DescriptorSetLayout, count)
    }

    fn set_num_pipeline_layouts(&mut self, count: u32) -> bool {
        self.capacity(Category::PipelineLayout, count)
    }

    fn set_num_shader_modules(&mut self, count: u32) -> bool {
        self.capacity(Category::ShaderModule, count)
    }

    fn set_num_render_passes(&mut self, count: u32) -> bool {
        self.capacity(Category::RenderPass, count)
    }

    fn set_num_compute_pipelines(&mut self, count: u32) -> bool {
        self.capacity(Category::ComputePipeline, count)
    }

    fn set_num_graphics_pipelines(&mut self, count: u32) -> bool {
        self.capacity(Category::GraphicsPipeline, count)
    }

    fn enqueue_create_sampler(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a SamplerCreateInfo<'a>,
        slot: HandleSlot<vk::Sampler>,
    ) -> bool {
        self.samplers.push(info);
        let outcome = self.create(Category::Sampler, index, hash);
        fill(&slot, outcome)
    }

    fn enqueue_create_descriptor_set_layout(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a DescriptorSetLayoutCreateInfo<'a>,
        slot: HandleSlot<vk::DescriptorSetLayout>,
    ) -> bool {
        self.set_layouts.push(info);
        let outcome = self.create(Category::DescriptorSetLayout, index, hash);
        fill(&slot, outcome)
    }

    fn enqueue_create_pipeline_layout(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a PipelineLayoutCreateInfo<'a>,
        slot: HandleSlot<vk::PipelineLayout>,
    ) -> bool {
        self.pipeline_layouts.push(info);
        let outcome = self.create(Category::PipelineLayout, index, hash);
        fill(&slot, outcome)
    }

    fn enqueue_create_shader_module(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a ShaderModuleCreateInfo<'a>,
        slot: HandleSlot<vk::ShaderModule>,
    ) -> bool {
        self.shader_modules.push(info);
        let outcome = self.create(Category::ShaderModule, index, hash);
        fill(&slot, outcome)
    }

    fn enqueue_create_render_pass(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a RenderPassCreateInfo<'a>,
        slot: HandleSlot<vk::RenderPass>,
    ) -> bool {
        self.render_passes.push(info);
        let outcome = self.create(Category::RenderPass, index, hash);
        fill(&slot, outcome)
    }

    fn enqueue_create_compute_pipeline(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a ComputePipelineCreateInfo<'a>,
        slot: HandleSlot<vk::Pipeline>,
    ) -> bool {
        self.compute_pipelines.push(info);
        let outcome = self.create(Category::ComputePipeline, index, hash);
        fill(&slot, outcome)
    }

    fn enqueue_create_graphics_pipeline(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a GraphicsPipelineCreateInfo<'a>,
        slot: HandleSlot<vk::Pipeline>,
    ) -> bool {
        self.graphics_pipelines.push(info);
        let outcome = self.create(Category::GraphicsPipeline, index, hash);
        fill(&slot, outcome)
    }

    fn wait_enqueue(&mut self) {
        self.events.push(Event::Wait);
    }
}

// ── Deferred creation ───────────────────────────────────────────

type Job = Box<dyn FnOnce() + Send>;

enum Message {
    Run(Job),
    Flush(Sender<()>),
}

/// Creator whose slots are filled on a worker thread.
///
/// Accepted creations are held back until
/// [`wait_enqueue`](StateCreator::wait_enqueue), which hands them to the
/// worker and blocks until it has run them. A replay that reads a slot
/// without a preceding wait therefore sees it unfilled.
pub struct DeferredCreator<'a> {
    pub log: RecordingCreator<'a>,
    held: Vec<Job>,
    jobs: Option<Sender<Message>>,
    worker: Option<JoinHandle<()>>,
}

impl<'a> DeferredCreator<'a> {
    pub fn new() -> Self {
        Self::wrapping(RecordingCreator::new())
    }

    /// Defer the slot fills of `log`, keeping its vetoes.
    pub fn wrapping(log: RecordingCreator<'a>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let worker = thread::spawn(move || run_jobs(rx));
        Self {
            log,
            held: Vec::new(),
            jobs: Some(tx),
            worker: Some(worker),
        }
    }

    /// Creations accepted but not yet handed to the worker.
    pub fn held(&self) -> usize {
        self.held.len()
    }

    fn defer<H: Handle + Send + 'static>(
        &mut self,
        accepted: bool,
        slot: HandleSlot<H>,
        filled: &HandleSlot<H>,
    ) -> bool {
        if accepted && filled.is_filled() {
            let handle = filled.get();
            self.held.push(Box::new(move || slot.set(handle)));
        }
        accepted
    }
}

fn run_jobs(rx: Receiver<Message>) {
    for message in rx {
        match message {
            Message::Run(job) => job(),
            Message::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

impl Default for DeferredCreator<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DeferredCreator<'_> {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl<'a> StateCreator<'a> for DeferredCreator<'a> {
    fn set_num_samplers(&mut self, count: u32) -> bool {
        self.log.set_num_samplers(count)
    }

    fn set_num_descriptor_set_layouts(&mut self, count: u32) -> bool {
        self.log.set_num_descriptor_set_layouts(count)
    }

    fn set_num_pipeline_layouts(&mut self, count: u32) -> bool {
        self.log.set_num_pipeline_layouts(count)
    }

    fn set_num_shader_modules(&mut self, count: u32) -> bool {
        self.log.set_num_shader_modules(count)
    }

    fn set_num_render_passes(&mut self, count: u32) -> bool {
        self.log.set_num_render_passes(count)
    }

    fn set_num_compute_pipelines(&mut self, count: u32) -> bool {
        self.log.set_num_compute_pipelines(count)
    }

    fn set_num_graphics_pipelines(&mut self, count: u32) -> bool {
        self.log.set_num_graphics_pipelines(count)
    }

    fn enqueue_create_sampler(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a SamplerCreateInfo<'a>,
        slot: HandleSlot<vk::Sampler>,
    ) -> bool {
        let scratch = HandleSlot::new();
        let accepted = self
            .log
            .enqueue_create_sampler(hash, index, info, scratch.clone());
        self.defer(accepted, slot, &scratch)
    }

    fn enqueue_create_descriptor_set_layout(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a DescriptorSetLayoutCreateInfo<'a>,
        slot: HandleSlot<vk::DescriptorSetLayout>,
    ) -> bool {
        let scratch = HandleSlot::new();
        let accepted = self
            .log
            .enqueue_create_descriptor_set_layout(hash, index, info, scratch.clone());
        self.defer(accepted, slot, &scratch)
    }

    fn enqueue_create_pipeline_layout(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a PipelineLayoutCreateInfo<'a>,
        slot: HandleSlot<vk::PipelineLayout>,
    ) -> bool {
        let scratch = HandleSlot::new();
        let accepted = self
            .log
            .enqueue_create_pipeline_layout(hash, index, info, scratch.clone());
        self.defer(accepted, slot, &scratch)
    }

    fn enqueue_create_shader_module(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a ShaderModuleCreateInfo<'a>,
        slot: HandleSlot<vk::ShaderModule>,
    ) -> bool {
        let scratch = HandleSlot::new();
        let accepted = self
            .log
            .enqueue_create_shader_module(hash, index, info, scratch.clone());
        self.defer(accepted, slot, &scratch)
    }

    fn enqueue_create_render_pass(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a RenderPassCreateInfo<'a>,
        slot: HandleSlot<vk::RenderPass>,
    ) -> bool {
        let scratch = HandleSlot::new();
        let accepted = self
            .log
            .enqueue_create_render_pass(hash, index, info, scratch.clone());
        self.defer(accepted, slot, &scratch)
    }

    fn enqueue_create_compute_pipeline(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a ComputePipelineCreateInfo<'a>,
        slot: HandleSlot<vk::Pipeline>,
    ) -> bool {
        let scratch = HandleSlot::new();
        let accepted = self
            .log
            .enqueue_create_compute_pipeline(hash, index, info, scratch.clone());
        self.defer(accepted, slot, &scratch)
    }

    fn enqueue_create_graphics_pipeline(
        &mut self,
        hash: ContentHash,
        index: u32,
        info: &'a GraphicsPipelineCreateInfo<'a>,
        slot: HandleSlot<vk::Pipeline>,
    ) -> bool {
        let scratch = HandleSlot::new();
        let accepted = self
            .log
            .enqueue_create_graphics_pipeline(hash, index, info, scratch.clone());
        self.defer(accepted, slot, &scratch)
    }

    fn wait_enqueue(&mut self) {
        self.log.wait_enqueue();
        let Some(jobs) = &self.jobs else {
            return;
        };
        for job in self.held.drain(..) {
            if jobs.send(Message::Run(job)).is_err() {
                return;
            }
        }
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        if jobs.send(Message::Flush(done_tx)).is_ok() {
            let _ = done_rx.recv();
        }
    }
}
