//! Compute and graphics pipelines, and the state blocks they are built from.
//!
//! Every optional fixed-function block of a graphics pipeline is an
//! `Option`: `None` records the same thing as a null state pointer.

use ash::vk;

/// Structure type of `VkPipelineVertexInputDivisorStateCreateInfoKHR`.
///
/// The EXT and KHR versions of the extension share this value.
pub const VERTEX_INPUT_DIVISOR_STATE_CREATE_INFO: vk::StructureType =
    vk::StructureType::from_raw(1_000_190_001);

/// Where one specialization constant lives in the data blob.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpecializationMapEntry {
    /// Constant id in the shader.
    pub constant_id: u32,
    /// Byte offset into the data.
    pub offset: u32,
    /// Byte size.
    pub size: u32,
}

/// Specialization constants for one shader stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpecializationInfo<'a> {
    /// Map from constant id to data range.
    pub map_entries: &'a [SpecializationMapEntry],
    /// Constant values.
    pub data: &'a [u8],
}

/// One programmable stage of a pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PipelineShaderStage<'a> {
    /// `VkPipelineShaderStageCreateFlags`.
    pub flags: vk::PipelineShaderStageCreateFlags,
    /// The single stage bit this entry describes.
    pub stage: vk::ShaderStageFlags,
    /// Shader module. Must already be recorded and bound.
    pub module: vk::ShaderModule,
    /// Entry point name.
    pub name: &'a str,
    /// Specialization constants, if any.
    pub specialization: Option<SpecializationInfo<'a>>,
    /// Extension chain, in chain order.
    pub extensions: &'a [ShaderStageExtension],
}

/// Entries that may appear in a shader stage's extension chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShaderStageExtension {
    /// `VkPipelineShaderStageRequiredSubgroupSizeCreateInfo`.
    RequiredSubgroupSize(u32),
}

impl ShaderStageExtension {
    /// Structure type tag of this entry.
    pub fn s_type(&self) -> vk::StructureType {
        match self {
            Self::RequiredSubgroupSize(_) => {
                vk::StructureType::PIPELINE_SHADER_STAGE_REQUIRED_SUBGROUP_SIZE_CREATE_INFO
            }
        }
    }
}

/// Creation parameters of a compute `VkPipeline`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ComputePipelineCreateInfo<'a> {
    /// `VkPipelineCreateFlags`.
    pub flags: vk::PipelineCreateFlags,
    /// The compute stage.
    pub stage: PipelineShaderStage<'a>,
    /// Pipeline layout. Must already be recorded and bound.
    pub layout: vk::PipelineLayout,
    /// Parent of a derivative pipeline, or null. When set it must be an
    /// already recorded and bound compute pipeline.
    pub base_pipeline: vk::Pipeline,
    /// Parent index within a batch create call; `-1` when unused.
    pub base_pipeline_index: i32,
}

/// A vertex buffer binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexInputBindingDescription {
    /// Binding number.
    pub binding: u32,
    /// Byte stride between elements.
    pub stride: u32,
    /// Per-vertex or per-instance.
    pub input_rate: vk::VertexInputRate,
}

/// A vertex attribute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexInputAttributeDescription {
    /// Shader location.
    pub location: u32,
    /// Source binding.
    pub binding: u32,
    /// Element format.
    pub format: vk::Format,
    /// Byte offset within an element.
    pub offset: u32,
}

/// Instance-rate divisor of one vertex binding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexInputBindingDivisor {
    /// Binding number.
    pub binding: u32,
    /// Instances per attribute step.
    pub divisor: u32,
}

/// `VkPipelineVertexInputStateCreateInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexInputState<'a> {
    /// Reserved flags.
    pub flags: vk::PipelineVertexInputStateCreateFlags,
    /// Buffer bindings.
    pub bindings: &'a [VertexInputBindingDescription],
    /// Attributes.
    pub attributes: &'a [VertexInputAttributeDescription],
    /// Extension chain, in chain order.
    pub extensions: &'a [VertexInputExtension<'a>],
}

/// Entries that may appear in the vertex-input extension chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexInputExtension<'a> {
    /// `VkPipelineVertexInputDivisorStateCreateInfoKHR`.
    BindingDivisors(&'a [VertexInputBindingDivisor]),
}

impl VertexInputExtension<'_> {
    /// Structure type tag of this entry.
    pub fn s_type(&self) -> vk::StructureType {
        match self {
            Self::BindingDivisors(_) => VERTEX_INPUT_DIVISOR_STATE_CREATE_INFO,
        }
    }
}

/// `VkPipelineInputAssemblyStateCreateInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputAssemblyState {
    /// Reserved flags.
    pub flags: vk::PipelineInputAssemblyStateCreateFlags,
    /// Primitive topology.
    pub topology: vk::PrimitiveTopology,
    /// Enables the restart index.
    pub primitive_restart_enable: bool,
}

/// `VkPipelineTessellationStateCreateInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TessellationState<'a> {
    /// Reserved flags.
    pub flags: vk::PipelineTessellationStateCreateFlags,
    /// Control points per patch.
    pub patch_control_points: u32,
    /// Extension chain, in chain order.
    pub extensions: &'a [TessellationExtension],
}

/// Entries that may appear in the tessellation extension chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TessellationExtension {
    /// `VkPipelineTessellationDomainOriginStateCreateInfo`.
    DomainOrigin(vk::TessellationDomainOrigin),
}

impl TessellationExtension {
    /// Structure type tag of this entry.
    pub fn s_type(&self) -> vk::StructureType {
        match self {
            Self::DomainOrigin(_) => {
                vk::StructureType::PIPELINE_TESSELLATION_DOMAIN_ORIGIN_STATE_CREATE_INFO
            }
        }
    }
}

/// A viewport rectangle with depth range.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
    /// Near depth.
    pub min_depth: f32,
    /// Far depth.
    pub max_depth: f32,
}

/// An integer rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect2D {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// `VkPipelineViewportStateCreateInfo`.
///
/// The counts are kept next to the arrays: with dynamic viewports or
/// scissors the count is set while the array is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportState<'a> {
    /// Reserved flags.
    pub flags: vk::PipelineViewportStateCreateFlags,
    /// Number of viewports.
    pub viewport_count: u32,
    /// Static viewports.
    pub viewports: &'a [Viewport],
    /// Number of scissors.
    pub scissor_count: u32,
    /// Static scissors.
    pub scissors: &'a [Rect2D],
}

/// `VkPipelineRasterizationStateCreateInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RasterizationState<'a> {
    /// Reserved flags.
    pub flags: vk::PipelineRasterizationStateCreateFlags,
    /// Clamp fragment depth instead of clipping.
    pub depth_clamp_enable: bool,
    /// Discard primitives before rasterization.
    pub rasterizer_discard_enable: bool,
    /// Fill, line or point.
    pub polygon_mode: vk::PolygonMode,
    /// Faces to cull.
    pub cull_mode: vk::CullModeFlags,
    /// Winding of front faces.
    pub front_face: vk::FrontFace,
    /// Enables depth bias.
    pub depth_bias_enable: bool,
    /// Constant depth bias.
    pub depth_bias_constant_factor: f32,
    /// Maximum depth bias.
    pub depth_bias_clamp: f32,
    /// Slope-scaled depth bias.
    pub depth_bias_slope_factor: f32,
    /// Rasterized line width.
    pub line_width: f32,
    /// Extension chain, in chain order.
    pub extensions: &'a [RasterizationExtension],
}

/// Entries that may appear in the rasterization extension chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RasterizationExtension {
    /// `VkPipelineRasterizationConservativeStateCreateInfoEXT`.
    Conservative {
        /// Reserved flags.
        flags: vk::PipelineRasterizationConservativeStateCreateFlagsEXT,
        /// Over- or underestimation.
        mode: vk::ConservativeRasterizationModeEXT,
        /// Extra overestimation in pixels.
        extra_primitive_overestimation_size: f32,
    },
    /// `VkPipelineRasterizationDepthClipStateCreateInfoEXT`.
    DepthClip {
        /// Reserved flags.
        flags: vk::PipelineRasterizationDepthClipStateCreateFlagsEXT,
        /// Enables depth clipping independently of depth clamp.
        enable: bool,
    },
}

impl RasterizationExtension {
    /// Structure type tag of this entry.
    pub fn s_type(&self) -> vk::StructureType {
        match self {
            Self::Conservative { .. } => {
                vk::StructureType::PIPELINE_RASTERIZATION_CONSERVATIVE_STATE_CREATE_INFO_EXT
            }
            Self::DepthClip { .. } => {
                vk::StructureType::PIPELINE_RASTERIZATION_DEPTH_CLIP_STATE_CREATE_INFO_EXT
            }
        }
    }
}

/// `VkPipelineMultisampleStateCreateInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MultisampleState<'a> {
    /// Reserved flags.
    pub flags: vk::PipelineMultisampleStateCreateFlags,
    /// Sample count.
    pub rasterization_samples: vk::SampleCountFlags,
    /// Enables per-sample shading.
    pub sample_shading_enable: bool,
    /// Minimum fraction of samples shaded.
    pub min_sample_shading: f32,
    /// Sample mask words; empty means all samples.
    pub sample_mask: &'a [u32],
    /// Derive coverage from alpha.
    pub alpha_to_coverage_enable: bool,
    /// Replace alpha with one.
    pub alpha_to_one_enable: bool,
}

/// Stencil operations for one face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StencilOpState {
    /// Action on stencil test failure.
    pub fail_op: vk::StencilOp,
    /// Action when both tests pass.
    pub pass_op: vk::StencilOp,
    /// Action when only the depth test fails.
    pub depth_fail_op: vk::StencilOp,
    /// Stencil comparison.
    pub compare_op: vk::CompareOp,
    /// Bits compared.
    pub compare_mask: u32,
    /// Bits written.
    pub write_mask: u32,
    /// Reference value.
    pub reference: u32,
}

/// `VkPipelineDepthStencilStateCreateInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DepthStencilState {
    /// `VkPipelineDepthStencilStateCreateFlags`.
    pub flags: vk::PipelineDepthStencilStateCreateFlags,
    /// Enables the depth test.
    pub depth_test_enable: bool,
    /// Enables depth writes.
    pub depth_write_enable: bool,
    /// Depth comparison.
    pub depth_compare_op: vk::CompareOp,
    /// Enables the depth bounds test.
    pub depth_bounds_test_enable: bool,
    /// Enables the stencil test.
    pub stencil_test_enable: bool,
    /// Front-face stencil state.
    pub front: StencilOpState,
    /// Back-face stencil state.
    pub back: StencilOpState,
    /// Lower depth bound.
    pub min_depth_bounds: f32,
    /// Upper depth bound.
    pub max_depth_bounds: f32,
}

/// Blend state of one colour attachment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ColorBlendAttachmentState {
    /// Enables blending.
    pub blend_enable: bool,
    /// Source colour factor.
    pub src_color_blend_factor: vk::BlendFactor,
    /// Destination colour factor.
    pub dst_color_blend_factor: vk::BlendFactor,
    /// Colour operator.
    pub color_blend_op: vk::BlendOp,
    /// Source alpha factor.
    pub src_alpha_blend_factor: vk::BlendFactor,
    /// Destination alpha factor.
    pub dst_alpha_blend_factor: vk::BlendFactor,
    /// Alpha operator.
    pub alpha_blend_op: vk::BlendOp,
    /// Channels written.
    pub color_write_mask: vk::ColorComponentFlags,
}

/// `VkPipelineColorBlendStateCreateInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ColorBlendState<'a> {
    /// `VkPipelineColorBlendStateCreateFlags`.
    pub flags: vk::PipelineColorBlendStateCreateFlags,
    /// Enables the logic op.
    pub logic_op_enable: bool,
    /// Logic operator.
    pub logic_op: vk::LogicOp,
    /// Per-attachment blend state.
    pub attachments: &'a [ColorBlendAttachmentState],
    /// Blend constants.
    pub blend_constants: [f32; 4],
}

/// `VkPipelineDynamicStateCreateInfo`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DynamicState<'a> {
    /// Reserved flags.
    pub flags: vk::PipelineDynamicStateCreateFlags,
    /// States set at command-buffer time.
    pub dynamic_states: &'a [vk::DynamicState],
}

/// Creation parameters of a graphics `VkPipeline`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GraphicsPipelineCreateInfo<'a> {
    /// `VkPipelineCreateFlags`.
    pub flags: vk::PipelineCreateFlags,
    /// Programmable stages.
    pub stages: &'a [PipelineShaderStage<'a>],
    /// Vertex input state.
    pub vertex_input: Option<VertexInputState<'a>>,
    /// Input assembly state.
    pub input_assembly: Option<InputAssemblyState>,
    /// Tessellation state.
    pub tessellation: Option<TessellationState<'a>>,
    /// Viewport state.
    pub viewport: Option<ViewportState<'a>>,
    /// Rasterization state.
    pub rasterization: Option<RasterizationState<'a>>,
    /// Multisample state.
    pub multisample: Option<MultisampleState<'a>>,
    /// Depth/stencil state.
    pub depth_stencil: Option<DepthStencilState>,
    /// Colour blend state.
    pub color_blend: Option<ColorBlendState<'a>>,
    /// Dynamic state.
    pub dynamic: Option<DynamicState<'a>>,
    /// Pipeline layout. Must already be recorded and bound.
    pub layout: vk::PipelineLayout,
    /// Render pass. Must already be recorded and bound.
    pub render_pass: vk::RenderPass,
    /// Subpass index within the render pass.
    pub subpass: u32,
    /// Parent of a derivative pipeline, or null. When set it must be an
    /// already recorded and bound graphics pipeline.
    pub base_pipeline: vk::Pipeline,
    /// Parent index within a batch create call; `-1` when unused.
    pub base_pipeline_index: i32,
}
