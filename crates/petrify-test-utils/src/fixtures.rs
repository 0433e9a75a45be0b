//! Reusable descriptor fixtures.
//!
//! Each builder returns a realistic creation descriptor with every
//! optional part populated, so a round trip through record and replay
//! exercises the whole canonical walk. [`Scene`] records one object of
//! every category, with real cross references, into a [`StateRecorder`].

use ash::vk::{self, Handle};
use petrify_core::info::*;
use petrify_core::{ContentHash, RecordError};
use petrify_record::StateRecorder;

// ── Static data ─────────────────────────────────────────────────

/// A few words of SPIR-V; contents only matter to the hash.
pub const VERTEX_SPIRV: &[u32] = &[0x0723_0203, 0x0001_0000, 0x0008_000b, 0x0000_0021, 0, 0x0002_0011];
pub const FRAGMENT_SPIRV: &[u32] = &[0x0723_0203, 0x0001_0000, 0x0008_000b, 0x0000_0014, 0, 0x0002_0011];
pub const COMPUTE_SPIRV: &[u32] = &[0x0723_0203, 0x0001_0300, 0x0008_000b, 0x0000_0030, 0];

const SAMPLER_EXTENSIONS: &[SamplerExtension] = &[
    SamplerExtension::ReductionMode(vk::SamplerReductionMode::MIN),
    SamplerExtension::CustomBorderColor {
        color: [0x3f80_0000, 0, 0, 0x3f80_0000],
        format: vk::Format::R8G8B8A8_UNORM,
    },
];

const BINDING_FLAGS: &[vk::DescriptorBindingFlags] = &[
    vk::DescriptorBindingFlags::PARTIALLY_BOUND,
    vk::DescriptorBindingFlags::UPDATE_AFTER_BIND,
];

const SET_LAYOUT_EXTENSIONS: &[DescriptorSetLayoutExtension<'static>] =
    &[DescriptorSetLayoutExtension::BindingFlags(BINDING_FLAGS)];

const PUSH_CONSTANTS: &[PushConstantRange] = &[PushConstantRange {
    stage_flags: vk::ShaderStageFlags::VERTEX,
    offset: 0,
    size: 64,
}];

const ATTACHMENTS: &[AttachmentDescription] = &[
    AttachmentDescription {
        flags: vk::AttachmentDescriptionFlags::MAY_ALIAS,
        format: vk::Format::B8G8R8A8_SRGB,
        samples: vk::SampleCountFlags::TYPE_1,
        load_op: vk::AttachmentLoadOp::CLEAR,
        store_op: vk::AttachmentStoreOp::STORE,
        stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
        stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
        initial_layout: vk::ImageLayout::UNDEFINED,
        final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
    },
    AttachmentDescription {
        flags: vk::AttachmentDescriptionFlags::MAY_ALIAS,
        format: vk::Format::D32_SFLOAT_S8_UINT,
        samples: vk::SampleCountFlags::TYPE_1,
        load_op: vk::AttachmentLoadOp::CLEAR,
        store_op: vk::AttachmentStoreOp::DONT_CARE,
        stencil_load_op: vk::AttachmentLoadOp::CLEAR,
        stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
        initial_layout: vk::ImageLayout::UNDEFINED,
        final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    },
];

const COLOR_REFS: &[AttachmentReference] = &[AttachmentReference {
    attachment: 0,
    layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
}];

const SUBPASSES: &[SubpassDescription<'static>] = &[SubpassDescription {
    flags: vk::SubpassDescriptionFlags::empty(),
    pipeline_bind_point: vk::PipelineBindPoint::GRAPHICS,
    input_attachments: &[],
    color_attachments: COLOR_REFS,
    resolve_attachments: &[],
    depth_stencil_attachment: Some(AttachmentReference {
        attachment: 1,
        layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    }),
    preserve_attachments: &[],
}];

const DEPENDENCIES: &[SubpassDependency] = &[SubpassDependency {
    src_subpass: vk::SUBPASS_EXTERNAL,
    dst_subpass: 0,
    src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
    dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
    src_access_mask: vk::AccessFlags::empty(),
    dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
    dependency_flags: vk::DependencyFlags::BY_REGION,
}];

const RENDER_PASS_EXTENSIONS: &[RenderPassExtension<'static>] = &[RenderPassExtension::Multiview {
    view_masks: &[0b11],
    view_offsets: &[0],
    correlation_masks: &[0b11],
}];

const SPECIALIZATION_ENTRIES: &[SpecializationMapEntry] = &[
    SpecializationMapEntry {
        constant_id: 0,
        offset: 0,
        size: 4,
    },
    SpecializationMapEntry {
        constant_id: 1,
        offset: 4,
        size: 4,
    },
];

const SPECIALIZATION_DATA: &[u8] = &[16, 0, 0, 0, 1, 0, 0, 0];

const VERTEX_BINDINGS: &[VertexInputBindingDescription] = &[
    VertexInputBindingDescription {
        binding: 0,
        stride: 20,
        input_rate: vk::VertexInputRate::VERTEX,
    },
    VertexInputBindingDescription {
        binding: 1,
        stride: 64,
        input_rate: vk::VertexInputRate::INSTANCE,
    },
];

const VERTEX_ATTRIBUTES: &[VertexInputAttributeDescription] = &[
    VertexInputAttributeDescription {
        location: 0,
        binding: 0,
        format: vk::Format::R32G32B32_SFLOAT,
        offset: 0,
    },
    VertexInputAttributeDescription {
        location: 1,
        binding: 0,
        format: vk::Format::R32G32_SFLOAT,
        offset: 12,
    },
];

const VERTEX_EXTENSIONS: &[VertexInputExtension<'static>] =
    &[VertexInputExtension::BindingDivisors(&[VertexInputBindingDivisor {
        binding: 1,
        divisor: 4,
    }])];

const VIEWPORTS: &[Viewport] = &[Viewport {
    x: 0.0,
    y: 0.0,
    width: 1920.0,
    height: 1080.0,
    min_depth: 0.0,
    max_depth: 1.0,
}];

const SCISSORS: &[Rect2D] = &[Rect2D {
    x: 0,
    y: 0,
    width: 1920,
    height: 1080,
}];

const RASTER_EXTENSIONS: &[RasterizationExtension] = &[
    RasterizationExtension::Conservative {
        flags: vk::PipelineRasterizationConservativeStateCreateFlagsEXT::empty(),
        mode: vk::ConservativeRasterizationModeEXT::OVERESTIMATE,
        extra_primitive_overestimation_size: 0.5,
    },
    RasterizationExtension::DepthClip {
        flags: vk::PipelineRasterizationDepthClipStateCreateFlagsEXT::empty(),
        enable: true,
    },
];

const BLEND_ATTACHMENTS: &[ColorBlendAttachmentState] = &[ColorBlendAttachmentState {
    blend_enable: true,
    src_color_blend_factor: vk::BlendFactor::SRC_ALPHA,
    dst_color_blend_factor: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
    color_blend_op: vk::BlendOp::ADD,
    src_alpha_blend_factor: vk::BlendFactor::ONE,
    dst_alpha_blend_factor: vk::BlendFactor::ZERO,
    alpha_blend_op: vk::BlendOp::ADD,
    color_write_mask: vk::ColorComponentFlags::RGBA,
}];

const DYNAMIC_STATES: &[vk::DynamicState] = &[vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];

// ── Builders ────────────────────────────────────────────────────

/// Trilinear sampler with both sampler extensions.
pub fn linear_sampler() -> SamplerCreateInfo<'static> {
    SamplerCreateInfo {
        mag_filter: vk::Filter::LINEAR,
        min_filter: vk::Filter::LINEAR,
        mipmap_mode: vk::SamplerMipmapMode::LINEAR,
        address_mode_u: vk::SamplerAddressMode::REPEAT,
        address_mode_v: vk::SamplerAddressMode::REPEAT,
        address_mode_w: vk::SamplerAddressMode::CLAMP_TO_BORDER,
        mip_lod_bias: -0.5,
        anisotropy_enable: true,
        max_anisotropy: 16.0,
        compare_enable: true,
        compare_op: vk::CompareOp::LESS_OR_EQUAL,
        min_lod: 0.0,
        max_lod: 12.0,
        border_color: vk::BorderColor::FLOAT_CUSTOM_EXT,
        extensions: SAMPLER_EXTENSIONS,
        ..Default::default()
    }
}

/// Point sampler with no extensions.
pub fn nearest_sampler() -> SamplerCreateInfo<'static> {
    SamplerCreateInfo {
        mag_filter: vk::Filter::NEAREST,
        min_filter: vk::Filter::NEAREST,
        max_lod: vk::LOD_CLAMP_NONE,
        unnormalized_coordinates: true,
        ..Default::default()
    }
}

/// A combined image sampler at binding 0 using `samplers` as immutable
/// samplers, and a uniform buffer at binding 1.
pub fn texture_bindings(samplers: &[vk::Sampler]) -> [DescriptorSetLayoutBinding<'_>; 2] {
    [
        DescriptorSetLayoutBinding {
            binding: 0,
            descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            descriptor_count: samplers.len() as u32,
            stage_flags: vk::ShaderStageFlags::FRAGMENT,
            immutable_samplers: samplers,
        },
        DescriptorSetLayoutBinding {
            binding: 1,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: 1,
            stage_flags: vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
            immutable_samplers: &[],
        },
    ]
}

/// Set layout over `bindings` with per-binding flags.
pub fn set_layout<'a>(bindings: &'a [DescriptorSetLayoutBinding<'a>]) -> DescriptorSetLayoutCreateInfo<'a> {
    DescriptorSetLayoutCreateInfo {
        flags: vk::DescriptorSetLayoutCreateFlags::UPDATE_AFTER_BIND_POOL,
        bindings,
        extensions: SET_LAYOUT_EXTENSIONS,
    }
}

/// Pipeline layout over `set_layouts` with one push-constant range.
pub fn pipeline_layout(set_layouts: &[vk::DescriptorSetLayout]) -> PipelineLayoutCreateInfo<'_> {
    PipelineLayoutCreateInfo {
        flags: vk::PipelineLayoutCreateFlags::empty(),
        set_layouts,
        push_constant_ranges: PUSH_CONSTANTS,
    }
}

pub fn shader_module(code: &[u32]) -> ShaderModuleCreateInfo<'_> {
    ShaderModuleCreateInfo {
        flags: vk::ShaderModuleCreateFlags::empty(),
        code,
    }
}

/// Colour plus depth-stencil forward pass with multiview.
pub fn forward_render_pass() -> RenderPassCreateInfo<'static> {
    RenderPassCreateInfo {
        flags: vk::RenderPassCreateFlags::empty(),
        attachments: ATTACHMENTS,
        subpasses: SUBPASSES,
        dependencies: DEPENDENCIES,
        extensions: RENDER_PASS_EXTENSIONS,
    }
}

/// Shader stage with a specialization block and a subgroup-size request.
pub fn shader_stage(stage: vk::ShaderStageFlags, module: vk::ShaderModule) -> PipelineShaderStage<'static> {
    PipelineShaderStage {
        flags: vk::PipelineShaderStageCreateFlags::empty(),
        stage,
        module,
        name: "main",
        specialization: Some(SpecializationInfo {
            map_entries: SPECIALIZATION_ENTRIES,
            data: SPECIALIZATION_DATA,
        }),
        extensions: &[ShaderStageExtension::RequiredSubgroupSize(32)],
    }
}

/// Compute pipeline; a non-null `base` makes it a derivative.
pub fn compute_pipeline(
    module: vk::ShaderModule,
    layout: vk::PipelineLayout,
    base: vk::Pipeline,
) -> ComputePipelineCreateInfo<'static> {
    let flags = if base == vk::Pipeline::null() {
        vk::PipelineCreateFlags::ALLOW_DERIVATIVES
    } else {
        vk::PipelineCreateFlags::DERIVATIVE
    };
    ComputePipelineCreateInfo {
        flags,
        stage: shader_stage(vk::ShaderStageFlags::COMPUTE, module),
        layout,
        base_pipeline: base,
        base_pipeline_index: -1,
    }
}

/// Graphics pipeline with every fixed-function block present.
pub fn graphics_pipeline<'a>(
    stages: &'a [PipelineShaderStage<'a>],
    layout: vk::PipelineLayout,
    render_pass: vk::RenderPass,
) -> GraphicsPipelineCreateInfo<'a> {
    GraphicsPipelineCreateInfo {
        flags: vk::PipelineCreateFlags::ALLOW_DERIVATIVES,
        stages,
        vertex_input: Some(VertexInputState {
            flags: vk::PipelineVertexInputStateCreateFlags::empty(),
            bindings: VERTEX_BINDINGS,
            attributes: VERTEX_ATTRIBUTES,
            extensions: VERTEX_EXTENSIONS,
        }),
        input_assembly: Some(InputAssemblyState {
            flags: vk::PipelineInputAssemblyStateCreateFlags::empty(),
            topology: vk::PrimitiveTopology::PATCH_LIST,
            primitive_restart_enable: false,
        }),
        tessellation: Some(TessellationState {
            flags: vk::PipelineTessellationStateCreateFlags::empty(),
            patch_control_points: 3,
            extensions: &[TessellationExtension::DomainOrigin(
                vk::TessellationDomainOrigin::LOWER_LEFT,
            )],
        }),
        viewport: Some(ViewportState {
            flags: vk::PipelineViewportStateCreateFlags::empty(),
            viewport_count: 1,
            viewports: VIEWPORTS,
            scissor_count: 1,
            scissors: SCISSORS,
        }),
        rasterization: Some(RasterizationState {
            flags: vk::PipelineRasterizationStateCreateFlags::empty(),
            depth_clamp_enable: false,
            rasterizer_discard_enable: false,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::BACK,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            depth_bias_enable: true,
            depth_bias_constant_factor: 1.25,
            depth_bias_clamp: 0.0,
            depth_bias_slope_factor: 1.75,
            line_width: 1.0,
            extensions: RASTER_EXTENSIONS,
        }),
        multisample: Some(MultisampleState {
            flags: vk::PipelineMultisampleStateCreateFlags::empty(),
            rasterization_samples: vk::SampleCountFlags::TYPE_4,
            sample_shading_enable: true,
            min_sample_shading: 0.25,
            sample_mask: &[0xf],
            alpha_to_coverage_enable: true,
            alpha_to_one_enable: false,
        }),
        depth_stencil: Some(DepthStencilState {
            flags: vk::PipelineDepthStencilStateCreateFlags::empty(),
            depth_test_enable: true,
            depth_write_enable: true,
            depth_compare_op: vk::CompareOp::GREATER_OR_EQUAL,
            depth_bounds_test_enable: false,
            stencil_test_enable: true,
            front: StencilOpState {
                fail_op: vk::StencilOp::KEEP,
                pass_op: vk::StencilOp::REPLACE,
                depth_fail_op: vk::StencilOp::KEEP,
                compare_op: vk::CompareOp::ALWAYS,
                compare_mask: 0xff,
                write_mask: 0xff,
                reference: 1,
            },
            back: StencilOpState::default(),
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
        }),
        color_blend: Some(ColorBlendState {
            flags: vk::PipelineColorBlendStateCreateFlags::empty(),
            logic_op_enable: false,
            logic_op: vk::LogicOp::COPY,
            attachments: BLEND_ATTACHMENTS,
            blend_constants: [0.0, 0.25, 0.5, 1.0],
        }),
        dynamic: Some(DynamicState {
            flags: vk::PipelineDynamicStateCreateFlags::empty(),
            dynamic_states: DYNAMIC_STATES,
        }),
        layout,
        render_pass,
        subpass: 0,
        base_pipeline: vk::Pipeline::null(),
        base_pipeline_index: -1,
    }
}

// ── Scene ───────────────────────────────────────────────────────

/// Handles a [`Scene`] binds, and the content hash of each record.
///
/// Records land at index 0 of their category, except the derived compute
/// pipeline at index 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scene {
    pub sampler: vk::Sampler,
    pub set_layout: vk::DescriptorSetLayout,
    pub pipeline_layout: vk::PipelineLayout,
    pub vertex_shader: vk::ShaderModule,
    pub fragment_shader: vk::ShaderModule,
    pub compute_shader: vk::ShaderModule,
    pub render_pass: vk::RenderPass,
    pub compute: vk::Pipeline,
    pub derived_compute: vk::Pipeline,
    pub graphics: vk::Pipeline,
    pub graphics_hash: ContentHash,
}

impl Scene {
    /// Capture one object of every category, bound to application-side
    /// handles, into `recorder`.
    pub fn record(recorder: &mut StateRecorder) -> Result<Self, RecordError> {
        let sampler = vk::Sampler::from_raw(0x5a_0001);
        let (_, index) = recorder.capture(&linear_sampler())?;
        recorder.set_sampler_handle(index, sampler)?;

        let set_layout = vk::DescriptorSetLayout::from_raw(0xd5_0001);
        let samplers = [sampler];
        let bindings = texture_bindings(&samplers);
        let (_, index) = recorder.capture(&self::set_layout(&bindings))?;
        recorder.set_descriptor_set_layout_handle(index, set_layout)?;

        let layout = vk::PipelineLayout::from_raw(0x91_0001);
        let (_, index) = recorder.capture(&self::pipeline_layout(&[set_layout]))?;
        recorder.set_pipeline_layout_handle(index, layout)?;

        let mut modules = [vk::ShaderModule::null(); 3];
        for (i, code) in [VERTEX_SPIRV, FRAGMENT_SPIRV, COMPUTE_SPIRV].into_iter().enumerate() {
            modules[i] = vk::ShaderModule::from_raw(0x5e_0001 + i as u64);
            let (_, index) = recorder.capture(&shader_module(code))?;
            recorder.set_shader_module_handle(index, modules[i])?;
        }
        let [vertex_shader, fragment_shader, compute_shader] = modules;

        let render_pass = vk::RenderPass::from_raw(0x7b_0001);
        let (_, index) = recorder.capture(&forward_render_pass())?;
        recorder.set_render_pass_handle(index, render_pass)?;

        let compute = vk::Pipeline::from_raw(0xc0_0001);
        let (_, index) = recorder.capture(&compute_pipeline(compute_shader, layout, vk::Pipeline::null()))?;
        recorder.set_compute_pipeline_handle(index, compute)?;

        let derived_compute = vk::Pipeline::from_raw(0xc0_0002);
        let (_, index) = recorder.capture(&compute_pipeline(compute_shader, layout, compute))?;
        recorder.set_compute_pipeline_handle(index, derived_compute)?;

        let graphics = vk::Pipeline::from_raw(0x6f_0001);
        let stages = [
            shader_stage(vk::ShaderStageFlags::VERTEX, vertex_shader),
            shader_stage(vk::ShaderStageFlags::FRAGMENT, fragment_shader),
        ];
        let (graphics_hash, index) = recorder.capture(&graphics_pipeline(&stages, layout, render_pass))?;
        recorder.set_graphics_pipeline_handle(index, graphics)?;

        Ok(Self {
            sampler,
            set_layout,
            pipeline_layout: layout,
            vertex_shader,
            fragment_shader,
            compute_shader,
            render_pass,
            compute,
            derived_compute,
            graphics,
            graphics_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use petrify_core::Category;

    #[test]
    fn scene_fills_every_category() {
        let mut recorder = StateRecorder::new();
        let scene = Scene::record(&mut recorder).unwrap();
        assert_eq!(recorder.len(Category::Sampler), 1);
        assert_eq!(recorder.len(Category::ShaderModule), 3);
        assert_eq!(recorder.len(Category::ComputePipeline), 2);
        assert_eq!(recorder.len(Category::GraphicsPipeline), 1);
        assert_eq!(
            recorder.hash_for_graphics_pipeline(scene.graphics).unwrap(),
            scene.graphics_hash
        );
    }
}
