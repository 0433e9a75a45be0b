//! The canonical walk: one fixed traversal of every descriptor type.
//!
//! The same walk feeds the content hasher and the wire encoder, so a hash
//! always covers exactly the bytes that get serialized. Field order is
//! the declaration order of the descriptor structs. Arrays are
//! count-prefixed, optional blocks carry a presence byte, and extension
//! entries are written as `(structure type, payload)` in chain order.
//! The decoder in the replay crate reads the same order back.

use ash::vk::{self, Handle};
use petrify_core::info::*;
use petrify_core::{Category, RecordError};

/// Receiver of a canonical walk.
pub trait CanonicalSink {
    /// Category of the record being walked.
    fn category(&self) -> Category;

    /// Consume one byte.
    fn put_u8(&mut self, v: u8);

    /// Consume a u32.
    fn put_u32(&mut self, v: u32);

    /// Consume a u64.
    fn put_u64(&mut self, v: u64);

    /// Consume a raw byte run (the caller has already written its length).
    fn put_raw(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.put_u8(b);
        }
    }

    /// Consume a reference to a non-null object of `category`.
    ///
    /// Fails if the handle is not bound to a recorded object.
    fn put_bound(&mut self, category: Category, handle: u64) -> Result<(), RecordError>;

    /// Consume an i32.
    fn put_i32(&mut self, v: i32) {
        self.put_u32(v as u32);
    }

    /// Consume an f32 by bit pattern.
    fn put_f32(&mut self, v: f32) {
        self.put_u32(v.to_bits());
    }

    /// Consume a boolean as one byte.
    fn put_bool(&mut self, v: bool) {
        self.put_u8(u8::from(v));
    }

    /// Consume an element count.
    fn put_len(&mut self, len: usize) -> Result<(), RecordError> {
        let len = u32::try_from(len).map_err(|_| RecordError::PayloadTooLarge {
            category: self.category(),
            len,
        })?;
        self.put_u32(len);
        Ok(())
    }

    /// Consume a count-prefixed string.
    fn put_str(&mut self, s: &str) -> Result<(), RecordError> {
        self.put_len(s.len())?;
        self.put_raw(s.as_bytes());
        Ok(())
    }

    /// Consume an object reference; a null handle is recorded as absent.
    fn put_handle<H: Handle>(&mut self, category: Category, handle: H) -> Result<(), RecordError>
    where
        Self: Sized,
    {
        match handle.as_raw() {
            0 => {
                self.put_u8(0);
                Ok(())
            }
            raw => self.put_bound(category, raw),
        }
    }
}

/// A top-level creation descriptor that can be recorded.
pub trait Canonical {
    /// Category records of this type belong to.
    const CATEGORY: Category;

    /// Feed every field, array, extension entry and reference to `sink`.
    fn walk<S: CanonicalSink>(&self, sink: &mut S) -> Result<(), RecordError>;
}

fn put_slice<S, T, F>(sink: &mut S, items: &[T], mut each: F) -> Result<(), RecordError>
where
    S: CanonicalSink,
    F: FnMut(&mut S, &T) -> Result<(), RecordError>,
{
    sink.put_len(items.len())?;
    for item in items {
        each(sink, item)?;
    }
    Ok(())
}

fn put_u32s<S: CanonicalSink>(sink: &mut S, values: &[u32]) -> Result<(), RecordError> {
    put_slice(sink, values, |s, &v| {
        s.put_u32(v);
        Ok(())
    })
}

fn put_option<S, T, F>(sink: &mut S, value: Option<&T>, each: F) -> Result<(), RecordError>
where
    S: CanonicalSink,
    F: FnOnce(&mut S, &T) -> Result<(), RecordError>,
{
    match value {
        None => {
            sink.put_u8(0);
            Ok(())
        }
        Some(v) => {
            sink.put_u8(1);
            each(sink, v)
        }
    }
}

fn put_s_type<S: CanonicalSink>(sink: &mut S, s_type: vk::StructureType) {
    sink.put_i32(s_type.as_raw());
}

// ── Samplers ────────────────────────────────────────────────────

impl Canonical for SamplerCreateInfo<'_> {
    const CATEGORY: Category = Category::Sampler;

    fn walk<S: CanonicalSink>(&self, sink: &mut S) -> Result<(), RecordError> {
        sink.put_u32(self.flags.as_raw());
        sink.put_i32(self.mag_filter.as_raw());
        sink.put_i32(self.min_filter.as_raw());
        sink.put_i32(self.mipmap_mode.as_raw());
        sink.put_i32(self.address_mode_u.as_raw());
        sink.put_i32(self.address_mode_v.as_raw());
        sink.put_i32(self.address_mode_w.as_raw());
        sink.put_f32(self.mip_lod_bias);
        sink.put_bool(self.anisotropy_enable);
        sink.put_f32(self.max_anisotropy);
        sink.put_bool(self.compare_enable);
        sink.put_i32(self.compare_op.as_raw());
        sink.put_f32(self.min_lod);
        sink.put_f32(self.max_lod);
        sink.put_i32(self.border_color.as_raw());
        sink.put_bool(self.unnormalized_coordinates);
        put_slice(sink, self.extensions, |s, ext| {
            put_s_type(s, ext.s_type());
            match *ext {
                SamplerExtension::ReductionMode(mode) => s.put_i32(mode.as_raw()),
                SamplerExtension::CustomBorderColor { color, format } => {
                    for c in color {
                        s.put_u32(c);
                    }
                    s.put_i32(format.as_raw());
                }
            }
            Ok(())
        })
    }
}

// ── Layouts ─────────────────────────────────────────────────────

impl Canonical for DescriptorSetLayoutCreateInfo<'_> {
    const CATEGORY: Category = Category::DescriptorSetLayout;

    fn walk<S: CanonicalSink>(&self, sink: &mut S) -> Result<(), RecordError> {
        sink.put_u32(self.flags.as_raw());
        put_slice(sink, self.bindings, |s, b| {
            s.put_u32(b.binding);
            s.put_i32(b.descriptor_type.as_raw());
            s.put_u32(b.descriptor_count);
            s.put_u32(b.stage_flags.as_raw());
            put_slice(s, b.immutable_samplers, |s, &sampler| {
                s.put_handle(Category::Sampler, sampler)
            })
        })?;
        put_slice(sink, self.extensions, |s, ext| {
            put_s_type(s, ext.s_type());
            match *ext {
                DescriptorSetLayoutExtension::BindingFlags(flags) => {
                    put_slice(s, flags, |s, f| {
                        s.put_u32(f.as_raw());
                        Ok(())
                    })
                }
            }
        })
    }
}

impl Canonical for PipelineLayoutCreateInfo<'_> {
    const CATEGORY: Category = Category::PipelineLayout;

    fn walk<S: CanonicalSink>(&self, sink: &mut S) -> Result<(), RecordError> {
        sink.put_u32(self.flags.as_raw());
        put_slice(sink, self.set_layouts, |s, &layout| {
            s.put_handle(Category::DescriptorSetLayout, layout)
        })?;
        put_slice(sink, self.push_constant_ranges, |s, range| {
            s.put_u32(range.stage_flags.as_raw());
            s.put_u32(range.offset);
            s.put_u32(range.size);
            Ok(())
        })
    }
}

// ── Shader modules ──────────────────────────────────────────────

impl Canonical for ShaderModuleCreateInfo<'_> {
    const CATEGORY: Category = Category::ShaderModule;

    fn walk<S: CanonicalSink>(&self, sink: &mut S) -> Result<(), RecordError> {
        sink.put_u32(self.flags.as_raw());
        put_u32s(sink, self.code)
    }
}

// ── Render passes ───────────────────────────────────────────────

fn put_attachment_ref<S: CanonicalSink>(sink: &mut S, r: &AttachmentReference) -> Result<(), RecordError> {
    sink.put_u32(r.attachment);
    sink.put_i32(r.layout.as_raw());
    Ok(())
}

impl Canonical for RenderPassCreateInfo<'_> {
    const CATEGORY: Category = Category::RenderPass;

    fn walk<S: CanonicalSink>(&self, sink: &mut S) -> Result<(), RecordError> {
        sink.put_u32(self.flags.as_raw());
        put_slice(sink, self.attachments, |s, a| {
            s.put_u32(a.flags.as_raw());
            s.put_i32(a.format.as_raw());
            s.put_u32(a.samples.as_raw());
            s.put_i32(a.load_op.as_raw());
            s.put_i32(a.store_op.as_raw());
            s.put_i32(a.stencil_load_op.as_raw());
            s.put_i32(a.stencil_store_op.as_raw());
            s.put_i32(a.initial_layout.as_raw());
            s.put_i32(a.final_layout.as_raw());
            Ok(())
        })?;
        put_slice(sink, self.subpasses, |s, sp| {
            s.put_u32(sp.flags.as_raw());
            s.put_i32(sp.pipeline_bind_point.as_raw());
            put_slice(s, sp.input_attachments, put_attachment_ref)?;
            put_slice(s, sp.color_attachments, put_attachment_ref)?;
            put_slice(s, sp.resolve_attachments, put_attachment_ref)?;
            put_option(s, sp.depth_stencil_attachment.as_ref(), put_attachment_ref)?;
            put_u32s(s, sp.preserve_attachments)
        })?;
        put_slice(sink, self.dependencies, |s, d| {
            s.put_u32(d.src_subpass);
            s.put_u32(d.dst_subpass);
            s.put_u32(d.src_stage_mask.as_raw());
            s.put_u32(d.dst_stage_mask.as_raw());
            s.put_u32(d.src_access_mask.as_raw());
            s.put_u32(d.dst_access_mask.as_raw());
            s.put_u32(d.dependency_flags.as_raw());
            Ok(())
        })?;
        put_slice(sink, self.extensions, |s, ext| {
            put_s_type(s, ext.s_type());
            match *ext {
                RenderPassExtension::Multiview {
                    view_masks,
                    view_offsets,
                    correlation_masks,
                } => {
                    put_u32s(s, view_masks)?;
                    put_slice(s, view_offsets, |s, &o| {
                        s.put_i32(o);
                        Ok(())
                    })?;
                    put_u32s(s, correlation_masks)
                }
                RenderPassExtension::InputAttachmentAspect(refs) => put_slice(s, refs, |s, r| {
                    s.put_u32(r.subpass);
                    s.put_u32(r.input_attachment_index);
                    s.put_u32(r.aspect_mask.as_raw());
                    Ok(())
                }),
            }
        })
    }
}

// ── Pipelines ───────────────────────────────────────────────────

fn put_stage<S: CanonicalSink>(sink: &mut S, stage: &PipelineShaderStage<'_>) -> Result<(), RecordError> {
    sink.put_u32(stage.flags.as_raw());
    sink.put_u32(stage.stage.as_raw());
    sink.put_handle(Category::ShaderModule, stage.module)?;
    sink.put_str(stage.name)?;
    put_option(sink, stage.specialization.as_ref(), |s, spec| {
        put_slice(s, spec.map_entries, |s, e| {
            s.put_u32(e.constant_id);
            s.put_u32(e.offset);
            s.put_u32(e.size);
            Ok(())
        })?;
        s.put_len(spec.data.len())?;
        s.put_raw(spec.data);
        Ok(())
    })?;
    put_slice(sink, stage.extensions, |s, ext| {
        put_s_type(s, ext.s_type());
        match *ext {
            ShaderStageExtension::RequiredSubgroupSize(size) => s.put_u32(size),
        }
        Ok(())
    })
}

impl Canonical for ComputePipelineCreateInfo<'_> {
    const CATEGORY: Category = Category::ComputePipeline;

    fn walk<S: CanonicalSink>(&self, sink: &mut S) -> Result<(), RecordError> {
        sink.put_u32(self.flags.as_raw());
        put_stage(sink, &self.stage)?;
        sink.put_handle(Category::PipelineLayout, self.layout)?;
        sink.put_handle(Category::ComputePipeline, self.base_pipeline)?;
        sink.put_i32(self.base_pipeline_index);
        Ok(())
    }
}

fn put_vertex_input<S: CanonicalSink>(sink: &mut S, v: &VertexInputState<'_>) -> Result<(), RecordError> {
    sink.put_u32(v.flags.as_raw());
    put_slice(sink, v.bindings, |s, b| {
        s.put_u32(b.binding);
        s.put_u32(b.stride);
        s.put_i32(b.input_rate.as_raw());
        Ok(())
    })?;
    put_slice(sink, v.attributes, |s, a| {
        s.put_u32(a.location);
        s.put_u32(a.binding);
        s.put_i32(a.format.as_raw());
        s.put_u32(a.offset);
        Ok(())
    })?;
    put_slice(sink, v.extensions, |s, ext| {
        put_s_type(s, ext.s_type());
        match *ext {
            VertexInputExtension::BindingDivisors(divisors) => put_slice(s, divisors, |s, d| {
                s.put_u32(d.binding);
                s.put_u32(d.divisor);
                Ok(())
            }),
        }
    })
}

fn put_tessellation<S: CanonicalSink>(sink: &mut S, t: &TessellationState<'_>) -> Result<(), RecordError> {
    sink.put_u32(t.flags.as_raw());
    sink.put_u32(t.patch_control_points);
    put_slice(sink, t.extensions, |s, ext| {
        put_s_type(s, ext.s_type());
        match *ext {
            TessellationExtension::DomainOrigin(origin) => s.put_i32(origin.as_raw()),
        }
        Ok(())
    })
}

fn put_viewport<S: CanonicalSink>(sink: &mut S, v: &ViewportState<'_>) -> Result<(), RecordError> {
    sink.put_u32(v.flags.as_raw());
    sink.put_u32(v.viewport_count);
    put_slice(sink, v.viewports, |s, vp| {
        for f in [vp.x, vp.y, vp.width, vp.height, vp.min_depth, vp.max_depth] {
            s.put_f32(f);
        }
        Ok(())
    })?;
    sink.put_u32(v.scissor_count);
    put_slice(sink, v.scissors, |s, r| {
        s.put_i32(r.x);
        s.put_i32(r.y);
        s.put_u32(r.width);
        s.put_u32(r.height);
        Ok(())
    })
}

fn put_rasterization<S: CanonicalSink>(sink: &mut S, r: &RasterizationState<'_>) -> Result<(), RecordError> {
    sink.put_u32(r.flags.as_raw());
    sink.put_bool(r.depth_clamp_enable);
    sink.put_bool(r.rasterizer_discard_enable);
    sink.put_i32(r.polygon_mode.as_raw());
    sink.put_u32(r.cull_mode.as_raw());
    sink.put_i32(r.front_face.as_raw());
    sink.put_bool(r.depth_bias_enable);
    sink.put_f32(r.depth_bias_constant_factor);
    sink.put_f32(r.depth_bias_clamp);
    sink.put_f32(r.depth_bias_slope_factor);
    sink.put_f32(r.line_width);
    put_slice(sink, r.extensions, |s, ext| {
        put_s_type(s, ext.s_type());
        match *ext {
            RasterizationExtension::Conservative {
                flags,
                mode,
                extra_primitive_overestimation_size,
            } => {
                s.put_u32(flags.as_raw());
                s.put_i32(mode.as_raw());
                s.put_f32(extra_primitive_overestimation_size);
            }
            RasterizationExtension::DepthClip { flags, enable } => {
                s.put_u32(flags.as_raw());
                s.put_bool(enable);
            }
        }
        Ok(())
    })
}

fn put_multisample<S: CanonicalSink>(sink: &mut S, m: &MultisampleState<'_>) -> Result<(), RecordError> {
    sink.put_u32(m.flags.as_raw());
    sink.put_u32(m.rasterization_samples.as_raw());
    sink.put_bool(m.sample_shading_enable);
    sink.put_f32(m.min_sample_shading);
    put_u32s(sink, m.sample_mask)?;
    sink.put_bool(m.alpha_to_coverage_enable);
    sink.put_bool(m.alpha_to_one_enable);
    Ok(())
}

fn put_stencil_op<S: CanonicalSink>(sink: &mut S, op: &StencilOpState) {
    sink.put_i32(op.fail_op.as_raw());
    sink.put_i32(op.pass_op.as_raw());
    sink.put_i32(op.depth_fail_op.as_raw());
    sink.put_i32(op.compare_op.as_raw());
    sink.put_u32(op.compare_mask);
    sink.put_u32(op.write_mask);
    sink.put_u32(op.reference);
}

fn put_depth_stencil<S: CanonicalSink>(sink: &mut S, d: &DepthStencilState) -> Result<(), RecordError> {
    sink.put_u32(d.flags.as_raw());
    sink.put_bool(d.depth_test_enable);
    sink.put_bool(d.depth_write_enable);
    sink.put_i32(d.depth_compare_op.as_raw());
    sink.put_bool(d.depth_bounds_test_enable);
    sink.put_bool(d.stencil_test_enable);
    put_stencil_op(sink, &d.front);
    put_stencil_op(sink, &d.back);
    sink.put_f32(d.min_depth_bounds);
    sink.put_f32(d.max_depth_bounds);
    Ok(())
}

fn put_color_blend<S: CanonicalSink>(sink: &mut S, c: &ColorBlendState<'_>) -> Result<(), RecordError> {
    sink.put_u32(c.flags.as_raw());
    sink.put_bool(c.logic_op_enable);
    sink.put_i32(c.logic_op.as_raw());
    put_slice(sink, c.attachments, |s, a| {
        s.put_bool(a.blend_enable);
        s.put_i32(a.src_color_blend_factor.as_raw());
        s.put_i32(a.dst_color_blend_factor.as_raw());
        s.put_i32(a.color_blend_op.as_raw());
        s.put_i32(a.src_alpha_blend_factor.as_raw());
        s.put_i32(a.dst_alpha_blend_factor.as_raw());
        s.put_i32(a.alpha_blend_op.as_raw());
        s.put_u32(a.color_write_mask.as_raw());
        Ok(())
    })?;
    for f in c.blend_constants {
        sink.put_f32(f);
    }
    Ok(())
}

fn put_dynamic<S: CanonicalSink>(sink: &mut S, d: &DynamicState<'_>) -> Result<(), RecordError> {
    sink.put_u32(d.flags.as_raw());
    put_slice(sink, d.dynamic_states, |s, state| {
        s.put_i32(state.as_raw());
        Ok(())
    })
}

impl Canonical for GraphicsPipelineCreateInfo<'_> {
    const CATEGORY: Category = Category::GraphicsPipeline;

    fn walk<S: CanonicalSink>(&self, sink: &mut S) -> Result<(), RecordError> {
        sink.put_u32(self.flags.as_raw());
        put_slice(sink, self.stages, |s, stage| put_stage(s, stage))?;
        put_option(sink, self.vertex_input.as_ref(), put_vertex_input)?;
        put_option(sink, self.input_assembly.as_ref(), |s, ia| {
            s.put_u32(ia.flags.as_raw());
            s.put_i32(ia.topology.as_raw());
            s.put_bool(ia.primitive_restart_enable);
            Ok(())
        })?;
        put_option(sink, self.tessellation.as_ref(), put_tessellation)?;
        put_option(sink, self.viewport.as_ref(), put_viewport)?;
        put_option(sink, self.rasterization.as_ref(), put_rasterization)?;
        put_option(sink, self.multisample.as_ref(), put_multisample)?;
        put_option(sink, self.depth_stencil.as_ref(), put_depth_stencil)?;
        put_option(sink, self.color_blend.as_ref(), put_color_blend)?;
        put_option(sink, self.dynamic.as_ref(), put_dynamic)?;
        sink.put_handle(Category::PipelineLayout, self.layout)?;
        sink.put_handle(Category::RenderPass, self.render_pass)?;
        sink.put_u32(self.subpass);
        sink.put_handle(Category::GraphicsPipeline, self.base_pipeline)?;
        sink.put_i32(self.base_pipeline_index);
        Ok(())
    }
}
