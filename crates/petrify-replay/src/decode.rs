//! Decoding record payloads into arena-backed descriptors.
//!
//! Reads fields in exactly the order the recorder's canonical walk wrote
//! them. Every array, string and extension chain is copied into the
//! replayer's arena, and every reference is resolved to the handle the
//! creator produced for the referenced record.

use ash::vk::{self, Handle};
use petrify_arena::{ArenaError, ScratchAllocator};
use petrify_core::info::*;
use petrify_core::{Category, CategorySet, FormatError, ObjectRef, ReplayError};
use petrify_record::codec::WireReader;

use crate::replayer::SlotTable;

/// Why decoding one record failed; converted to a [`ReplayError`] with the
/// record attached at the record boundary.
#[derive(Debug)]
pub(crate) enum DecodeError {
    Format(FormatError),
    Allocation(ArenaError),
    Unresolved(ObjectRef),
}

impl From<FormatError> for DecodeError {
    fn from(e: FormatError) -> Self {
        Self::Format(e)
    }
}

impl From<ArenaError> for DecodeError {
    fn from(e: ArenaError) -> Self {
        Self::Allocation(e)
    }
}

impl DecodeError {
    fn at(self, record: ObjectRef) -> ReplayError {
        match self {
            Self::Format(source) => ReplayError::Format {
                record: Some(record),
                source,
            },
            Self::Allocation(source) => ReplayError::Allocation {
                record: Some(record),
                source,
            },
            Self::Unresolved(target) => ReplayError::UnresolvedReference { record, target },
        }
    }
}

fn invalid(detail: String) -> DecodeError {
    DecodeError::Format(FormatError::InvalidValue { detail })
}

type Decoded<T> = Result<T, DecodeError>;

/// Decoder for the payload of one record.
pub(crate) struct Decoder<'a, 'b, 't> {
    arena: &'a ScratchAllocator,
    r: WireReader<'b>,
    record: ObjectRef,
    deps: CategorySet,
    slots: &'t SlotTable,
}

impl<'a, 'b, 't> Decoder<'a, 'b, 't> {
    pub(crate) fn new(
        arena: &'a ScratchAllocator,
        payload: &'b [u8],
        record: ObjectRef,
        deps: CategorySet,
        slots: &'t SlotTable,
    ) -> Self {
        Self {
            arena,
            r: WireReader::new(payload),
            record,
            deps,
            slots,
        }
    }

    /// Decode the whole payload with `f`, require that nothing is left
    /// over, and move the result into the arena.
    pub(crate) fn finish<T, F>(mut self, f: F) -> Result<&'a T, ReplayError>
    where
        T: Copy,
        F: FnOnce(&mut Self) -> Decoded<T>,
    {
        let record = self.record;
        let run = |d: &mut Self| -> Decoded<&'a T> {
            let value = f(d)?;
            d.r.finish()?;
            let stored: &'a T = d.arena.alloc(value)?;
            Ok(stored)
        };
        run(&mut self).map_err(|e| e.at(record))
    }

    // ── Building blocks ─────────────────────────────────────────

    fn array<T, F>(&mut self, min_elem_size: usize, mut each: F) -> Decoded<&'a [T]>
    where
        T: Copy,
        F: FnMut(&mut Self) -> Decoded<T>,
    {
        let n = self.r.count(min_elem_size)?;
        let arena = self.arena;
        let out: &'a [T] = arena.alloc_slice_try_fill(n, |_| each(self))?;
        Ok(out)
    }

    fn u32s(&mut self) -> Decoded<&'a [u32]> {
        let n = self.r.count(4)?;
        let words = self.arena.alloc_slice_zeroed::<u32>(n)?;
        for w in words.iter_mut() {
            *w = self.r.u32()?;
        }
        Ok(words)
    }

    fn option<T, F>(&mut self, f: F) -> Decoded<Option<T>>
    where
        F: FnOnce(&mut Self) -> Decoded<T>,
    {
        if self.r.presence()? {
            f(self).map(Some)
        } else {
            Ok(None)
        }
    }

    fn string(&mut self) -> Decoded<&'a str> {
        let s = self.r.str()?;
        Ok(self.arena.alloc_str(s)?)
    }

    fn handle<H: Handle>(&mut self, expected: Category) -> Decoded<H> {
        if !self.r.presence()? {
            return Ok(H::from_raw(0));
        }
        let category = self.r.category()?;
        let index = self.r.u32()?;
        if category != expected {
            return Err(invalid(format!(
                "expected a {expected} reference, found {category}"
            )));
        }
        if !self.deps.contains(category) {
            return Err(invalid(format!(
                "reference to {category} outside the dependency mask {}",
                self.deps
            )));
        }
        let raw = self.slots.lookup(ObjectRef::new(category, index))?;
        Ok(H::from_raw(raw))
    }

    /// Read an extension chain, decoding each entry's payload with `entry`
    /// given its structure type.
    fn chain<T, F>(&mut self, mut entry: F) -> Decoded<&'a [T]>
    where
        T: Copy,
        F: FnMut(&mut Self, vk::StructureType) -> Decoded<T>,
    {
        self.array(4, |d| {
            let s_type = vk::StructureType::from_raw(d.r.i32()?);
            entry(d, s_type)
        })
    }

    fn flags(&mut self) -> Decoded<u32> {
        Ok(self.r.u32()?)
    }

    fn enum_i32(&mut self) -> Decoded<i32> {
        Ok(self.r.i32()?)
    }

    fn f32(&mut self) -> Decoded<f32> {
        Ok(self.r.f32()?)
    }

    fn bool(&mut self) -> Decoded<bool> {
        Ok(self.r.bool()?)
    }

    fn u32(&mut self) -> Decoded<u32> {
        Ok(self.r.u32()?)
    }

    // ── Samplers ────────────────────────────────────────────────

    pub(crate) fn sampler(&mut self) -> Decoded<SamplerCreateInfo<'a>> {
        Ok(SamplerCreateInfo {
            flags: vk::SamplerCreateFlags::from_raw(self.flags()?),
            mag_filter: vk::Filter::from_raw(self.enum_i32()?),
            min_filter: vk::Filter::from_raw(self.enum_i32()?),
            mipmap_mode: vk::SamplerMipmapMode::from_raw(self.enum_i32()?),
            address_mode_u: vk::SamplerAddressMode::from_raw(self.enum_i32()?),
            address_mode_v: vk::SamplerAddressMode::from_raw(self.enum_i32()?),
            address_mode_w: vk::SamplerAddressMode::from_raw(self.enum_i32()?),
            mip_lod_bias: self.f32()?,
            anisotropy_enable: self.bool()?,
            max_anisotropy: self.f32()?,
            compare_enable: self.bool()?,
            compare_op: vk::CompareOp::from_raw(self.enum_i32()?),
            min_lod: self.f32()?,
            max_lod: self.f32()?,
            border_color: vk::BorderColor::from_raw(self.enum_i32()?),
            unnormalized_coordinates: self.bool()?,
            extensions: self.chain(|d, s_type| match s_type {
                vk::StructureType::SAMPLER_REDUCTION_MODE_CREATE_INFO => Ok(
                    SamplerExtension::ReductionMode(vk::SamplerReductionMode::from_raw(
                        d.enum_i32()?,
                    )),
                ),
                vk::StructureType::SAMPLER_CUSTOM_BORDER_COLOR_CREATE_INFO_EXT => {
                    let color = [d.u32()?, d.u32()?, d.u32()?, d.u32()?];
                    Ok(SamplerExtension::CustomBorderColor {
                        color,
                        format: vk::Format::from_raw(d.enum_i32()?),
                    })
                }
                other => Err(unknown(other)),
            })?,
        })
    }

    // ── Layouts ─────────────────────────────────────────────────

    pub(crate) fn descriptor_set_layout(&mut self) -> Decoded<DescriptorSetLayoutCreateInfo<'a>> {
        Ok(DescriptorSetLayoutCreateInfo {
            flags: vk::DescriptorSetLayoutCreateFlags::from_raw(self.flags()?),
            bindings: self.array(4, |d| {
                Ok(DescriptorSetLayoutBinding {
                    binding: d.u32()?,
                    descriptor_type: vk::DescriptorType::from_raw(d.enum_i32()?),
                    descriptor_count: d.u32()?,
                    stage_flags: vk::ShaderStageFlags::from_raw(d.flags()?),
                    immutable_samplers: d.array(1, |d| d.handle(Category::Sampler))?,
                })
            })?,
            extensions: self.chain(|d, s_type| match s_type {
                vk::StructureType::DESCRIPTOR_SET_LAYOUT_BINDING_FLAGS_CREATE_INFO => {
                    Ok(DescriptorSetLayoutExtension::BindingFlags(d.array(4, |d| {
                        Ok(vk::DescriptorBindingFlags::from_raw(d.flags()?))
                    })?))
                }
                other => Err(unknown(other)),
            })?,
        })
    }

    pub(crate) fn pipeline_layout(&mut self) -> Decoded<PipelineLayoutCreateInfo<'a>> {
        Ok(PipelineLayoutCreateInfo {
            flags: vk::PipelineLayoutCreateFlags::from_raw(self.flags()?),
            set_layouts: self.array(1, |d| d.handle(Category::DescriptorSetLayout))?,
            push_constant_ranges: self.array(12, |d| {
                Ok(PushConstantRange {
                    stage_flags: vk::ShaderStageFlags::from_raw(d.flags()?),
                    offset: d.u32()?,
                    size: d.u32()?,
                })
            })?,
        })
    }

    // ── Shader modules ──────────────────────────────────────────

    pub(crate) fn shader_module(&mut self) -> Decoded<ShaderModuleCreateInfo<'a>> {
        Ok(ShaderModuleCreateInfo {
            flags: vk::ShaderModuleCreateFlags::from_raw(self.flags()?),
            code: self.u32s()?,
        })
    }

    // ── Render passes ───────────────────────────────────────────

    fn attachment_ref(&mut self) -> Decoded<AttachmentReference> {
        Ok(AttachmentReference {
            attachment: self.u32()?,
            layout: vk::ImageLayout::from_raw(self.enum_i32()?),
        })
    }

    pub(crate) fn render_pass(&mut self) -> Decoded<RenderPassCreateInfo<'a>> {
        Ok(RenderPassCreateInfo {
            flags: vk::RenderPassCreateFlags::from_raw(self.flags()?),
            attachments: self.array(36, |d| {
                Ok(AttachmentDescription {
                    flags: vk::AttachmentDescriptionFlags::from_raw(d.flags()?),
                    format: vk::Format::from_raw(d.enum_i32()?),
                    samples: vk::SampleCountFlags::from_raw(d.flags()?),
                    load_op: vk::AttachmentLoadOp::from_raw(d.enum_i32()?),
                    store_op: vk::AttachmentStoreOp::from_raw(d.enum_i32()?),
                    stencil_load_op: vk::AttachmentLoadOp::from_raw(d.enum_i32()?),
                    stencil_store_op: vk::AttachmentStoreOp::from_raw(d.enum_i32()?),
                    initial_layout: vk::ImageLayout::from_raw(d.enum_i32()?),
                    final_layout: vk::ImageLayout::from_raw(d.enum_i32()?),
                })
            })?,
            subpasses: self.array(8, |d| {
                Ok(SubpassDescription {
                    flags: vk::SubpassDescriptionFlags::from_raw(d.flags()?),
                    pipeline_bind_point: vk::PipelineBindPoint::from_raw(d.enum_i32()?),
                    input_attachments: d.array(8, Self::attachment_ref)?,
                    color_attachments: d.array(8, Self::attachment_ref)?,
                    resolve_attachments: d.array(8, Self::attachment_ref)?,
                    depth_stencil_attachment: d.option(Self::attachment_ref)?,
                    preserve_attachments: d.u32s()?,
                })
            })?,
            dependencies: self.array(28, |d| {
                Ok(SubpassDependency {
                    src_subpass: d.u32()?,
                    dst_subpass: d.u32()?,
                    src_stage_mask: vk::PipelineStageFlags::from_raw(d.flags()?),
                    dst_stage_mask: vk::PipelineStageFlags::from_raw(d.flags()?),
                    src_access_mask: vk::AccessFlags::from_raw(d.flags()?),
                    dst_access_mask: vk::AccessFlags::from_raw(d.flags()?),
                    dependency_flags: vk::DependencyFlags::from_raw(d.flags()?),
                })
            })?,
            extensions: self.chain(|d, s_type| match s_type {
                vk::StructureType::RENDER_PASS_MULTIVIEW_CREATE_INFO => {
                    Ok(RenderPassExtension::Multiview {
                        view_masks: d.u32s()?,
                        view_offsets: d.array(4, |d| d.enum_i32())?,
                        correlation_masks: d.u32s()?,
                    })
                }
                vk::StructureType::RENDER_PASS_INPUT_ATTACHMENT_ASPECT_CREATE_INFO => {
                    Ok(RenderPassExtension::InputAttachmentAspect(d.array(12, |d| {
                        Ok(InputAttachmentAspectReference {
                            subpass: d.u32()?,
                            input_attachment_index: d.u32()?,
                            aspect_mask: vk::ImageAspectFlags::from_raw(d.flags()?),
                        })
                    })?))
                }
                other => Err(unknown(other)),
            })?,
        })
    }

    // ── Pipelines ───────────────────────────────────────────────

    fn shader_stage(&mut self) -> Decoded<PipelineShaderStage<'a>> {
        Ok(PipelineShaderStage {
            flags: vk::PipelineShaderStageCreateFlags::from_raw(self.flags()?),
            stage: vk::ShaderStageFlags::from_raw(self.flags()?),
            module: self.handle(Category::ShaderModule)?,
            name: self.string()?,
            specialization: self.option(|d| {
                Ok(SpecializationInfo {
                    map_entries: d.array(12, |d| {
                        Ok(SpecializationMapEntry {
                            constant_id: d.u32()?,
                            offset: d.u32()?,
                            size: d.u32()?,
                        })
                    })?,
                    data: {
                        let bytes = d.r.bytes()?;
                        d.arena.alloc_slice_copy(bytes)?
                    },
                })
            })?,
            extensions: self.chain(|d, s_type| match s_type {
                vk::StructureType::PIPELINE_SHADER_STAGE_REQUIRED_SUBGROUP_SIZE_CREATE_INFO => {
                    Ok(ShaderStageExtension::RequiredSubgroupSize(d.u32()?))
                }
                other => Err(unknown(other)),
            })?,
        })
    }

    pub(crate) fn compute_pipeline(&mut self) -> Decoded<ComputePipelineCreateInfo<'a>> {
        Ok(ComputePipelineCreateInfo {
            flags: vk::PipelineCreateFlags::from_raw(self.flags()?),
            stage: self.shader_stage()?,
            layout: self.handle(Category::PipelineLayout)?,
            base_pipeline: self.handle(Category::ComputePipeline)?,
            base_pipeline_index: self.enum_i32()?,
        })
    }

    fn vertex_input(&mut self) -> Decoded<VertexInputState<'a>> {
        Ok(VertexInputState {
            flags: vk::PipelineVertexInputStateCreateFlags::from_raw(self.flags()?),
            bindings: self.array(12, |d| {
                Ok(VertexInputBindingDescription {
                    binding: d.u32()?,
                    stride: d.u32()?,
                    input_rate: vk::VertexInputRate::from_raw(d.enum_i32()?),
                })
            })?,
            attributes: self.array(16, |d| {
                Ok(VertexInputAttributeDescription {
                    location: d.u32()?,
                    binding: d.u32()?,
                    format: vk::Format::from_raw(d.enum_i32()?),
                    offset: d.u32()?,
                })
            })?,
            extensions: self.chain(|d, s_type| match s_type {
                VERTEX_INPUT_DIVISOR_STATE_CREATE_INFO => {
                    Ok(VertexInputExtension::BindingDivisors(d.array(8, |d| {
                        Ok(VertexInputBindingDivisor {
                            binding: d.u32()?,
                            divisor: d.u32()?,
                        })
                    })?))
                }
                other => Err(unknown(other)),
            })?,
        })
    }

    fn input_assembly(&mut self) -> Decoded<InputAssemblyState> {
        Ok(InputAssemblyState {
            flags: vk::PipelineInputAssemblyStateCreateFlags::from_raw(self.flags()?),
            topology: vk::PrimitiveTopology::from_raw(self.enum_i32()?),
            primitive_restart_enable: self.bool()?,
        })
    }

    fn tessellation(&mut self) -> Decoded<TessellationState<'a>> {
        Ok(TessellationState {
            flags: vk::PipelineTessellationStateCreateFlags::from_raw(self.flags()?),
            patch_control_points: self.u32()?,
            extensions: self.chain(|d, s_type| match s_type {
                vk::StructureType::PIPELINE_TESSELLATION_DOMAIN_ORIGIN_STATE_CREATE_INFO => Ok(
                    TessellationExtension::DomainOrigin(vk::TessellationDomainOrigin::from_raw(
                        d.enum_i32()?,
                    )),
                ),
                other => Err(unknown(other)),
            })?,
        })
    }

    fn viewport(&mut self) -> Decoded<ViewportState<'a>> {
        Ok(ViewportState {
            flags: vk::PipelineViewportStateCreateFlags::from_raw(self.flags()?),
            viewport_count: self.u32()?,
            viewports: self.array(24, |d| {
                Ok(Viewport {
                    x: d.f32()?,
                    y: d.f32()?,
                    width: d.f32()?,
                    height: d.f32()?,
                    min_depth: d.f32()?,
                    max_depth: d.f32()?,
                })
            })?,
            scissor_count: self.u32()?,
            scissors: self.array(16, |d| {
                Ok(Rect2D {
                    x: d.enum_i32()?,
                    y: d.enum_i32()?,
                    width: d.u32()?,
                    height: d.u32()?,
                })
            })?,
        })
    }

    fn rasterization(&mut self) -> Decoded<RasterizationState<'a>> {
        Ok(RasterizationState {
            flags: vk::PipelineRasterizationStateCreateFlags::from_raw(self.flags()?),
            depth_clamp_enable: self.bool()?,
            rasterizer_discard_enable: self.bool()?,
            polygon_mode: vk::PolygonMode::from_raw(self.enum_i32()?),
            cull_mode: vk::CullModeFlags::from_raw(self.flags()?),
            front_face: vk::FrontFace::from_raw(self.enum_i32()?),
            depth_bias_enable: self.bool()?,
            depth_bias_constant_factor: self.f32()?,
            depth_bias_clamp: self.f32()?,
            depth_bias_slope_factor: self.f32()?,
            line_width: self.f32()?,
            extensions: self.chain(|d, s_type| match s_type {
                vk::StructureType::PIPELINE_RASTERIZATION_CONSERVATIVE_STATE_CREATE_INFO_EXT => {
                    Ok(RasterizationExtension::Conservative {
                        flags: vk::PipelineRasterizationConservativeStateCreateFlagsEXT::from_raw(
                            d.flags()?,
                        ),
                        mode: vk::ConservativeRasterizationModeEXT::from_raw(d.enum_i32()?),
                        extra_primitive_overestimation_size: d.f32()?,
                    })
                }
                vk::StructureType::PIPELINE_RASTERIZATION_DEPTH_CLIP_STATE_CREATE_INFO_EXT => {
                    Ok(RasterizationExtension::DepthClip {
                        flags: vk::PipelineRasterizationDepthClipStateCreateFlagsEXT::from_raw(
                            d.flags()?,
                        ),
                        enable: d.bool()?,
                    })
                }
                other => Err(unknown(other)),
            })?,
        })
    }

    fn multisample(&mut self) -> Decoded<MultisampleState<'a>> {
        Ok(MultisampleState {
            flags: vk::PipelineMultisampleStateCreateFlags::from_raw(self.flags()?),
            rasterization_samples: vk::SampleCountFlags::from_raw(self.flags()?),
            sample_shading_enable: self.bool()?,
            min_sample_shading: self.f32()?,
            sample_mask: self.u32s()?,
            alpha_to_coverage_enable: self.bool()?,
            alpha_to_one_enable: self.bool()?,
        })
    }

    fn stencil_op(&mut self) -> Decoded<StencilOpState> {
        Ok(StencilOpState {
            fail_op: vk::StencilOp::from_raw(self.enum_i32()?),
            pass_op: vk::StencilOp::from_raw(self.enum_i32()?),
            depth_fail_op: vk::StencilOp::from_raw(self.enum_i32()?),
            compare_op: vk::CompareOp::from_raw(self.enum_i32()?),
            compare_mask: self.u32()?,
            write_mask: self.u32()?,
            reference: self.u32()?,
        })
    }

    fn depth_stencil(&mut self) -> Decoded<DepthStencilState> {
        Ok(DepthStencilState {
            flags: vk::PipelineDepthStencilStateCreateFlags::from_raw(self.flags()?),
            depth_test_enable: self.bool()?,
            depth_write_enable: self.bool()?,
            depth_compare_op: vk::CompareOp::from_raw(self.enum_i32()?),
            depth_bounds_test_enable: self.bool()?,
            stencil_test_enable: self.bool()?,
            front: self.stencil_op()?,
            back: self.stencil_op()?,
            min_depth_bounds: self.f32()?,
            max_depth_bounds: self.f32()?,
        })
    }

    fn color_blend(&mut self) -> Decoded<ColorBlendState<'a>> {
        Ok(ColorBlendState {
            flags: vk::PipelineColorBlendStateCreateFlags::from_raw(self.flags()?),
            logic_op_enable: self.bool()?,
            logic_op: vk::LogicOp::from_raw(self.enum_i32()?),
            attachments: self.array(29, |d| {
                Ok(ColorBlendAttachmentState {
                    blend_enable: d.bool()?,
                    src_color_blend_factor: vk::BlendFactor::from_raw(d.enum_i32()?),
                    dst_color_blend_factor: vk::BlendFactor::from_raw(d.enum_i32()?),
                    color_blend_op: vk::BlendOp::from_raw(d.enum_i32()?),
                    src_alpha_blend_factor: vk::BlendFactor::from_raw(d.enum_i32()?),
                    dst_alpha_blend_factor: vk::BlendFactor::from_raw(d.enum_i32()?),
                    alpha_blend_op: vk::BlendOp::from_raw(d.enum_i32()?),
                    color_write_mask: vk::ColorComponentFlags::from_raw(d.flags()?),
                })
            })?,
            blend_constants: [self.f32()?, self.f32()?, self.f32()?, self.f32()?],
        })
    }

    fn dynamic(&mut self) -> Decoded<DynamicState<'a>> {
        Ok(DynamicState {
            flags: vk::PipelineDynamicStateCreateFlags::from_raw(self.flags()?),
            dynamic_states: self.array(4, |d| Ok(vk::DynamicState::from_raw(d.enum_i32()?)))?,
        })
    }

    pub(crate) fn graphics_pipeline(&mut self) -> Decoded<GraphicsPipelineCreateInfo<'a>> {
        Ok(GraphicsPipelineCreateInfo {
            flags: vk::PipelineCreateFlags::from_raw(self.flags()?),
            stages: self.array(8, Self::shader_stage)?,
            vertex_input: self.option(Self::vertex_input)?,
            input_assembly: self.option(Self::input_assembly)?,
            tessellation: self.option(Self::tessellation)?,
            viewport: self.option(Self::viewport)?,
            rasterization: self.option(Self::rasterization)?,
            multisample: self.option(Self::multisample)?,
            depth_stencil: self.option(Self::depth_stencil)?,
            color_blend: self.option(Self::color_blend)?,
            dynamic: self.option(Self::dynamic)?,
            layout: self.handle(Category::PipelineLayout)?,
            render_pass: self.handle(Category::RenderPass)?,
            subpass: self.u32()?,
            base_pipeline: self.handle(Category::GraphicsPipeline)?,
            base_pipeline_index: self.enum_i32()?,
        })
    }
}

fn unknown(s_type: vk::StructureType) -> DecodeError {
    DecodeError::Format(FormatError::UnknownExtension {
        s_type: s_type.as_raw(),
    })
}
