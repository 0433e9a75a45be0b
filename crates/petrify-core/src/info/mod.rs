//! Creation descriptors, one per [`Category`](crate::Category), plus the
//! nested structures and extension chains they carry.
//!
//! Descriptors are `Copy` views: arrays are borrowed slices and extension
//! chains are ordered slices of closed enums, one enum per structure that
//! can be extended. Object references are `ash` handles; a null handle
//! means "absent".

mod layout;
mod pipeline;
mod render_pass;
mod sampler;
mod shader;

pub use layout::{
    DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo, DescriptorSetLayoutExtension,
    PipelineLayoutCreateInfo, PushConstantRange,
};
pub use pipeline::{
    ColorBlendAttachmentState, ColorBlendState, ComputePipelineCreateInfo, DepthStencilState,
    DynamicState, GraphicsPipelineCreateInfo, InputAssemblyState, MultisampleState,
    PipelineShaderStage, RasterizationExtension, RasterizationState, Rect2D, ShaderStageExtension,
    SpecializationInfo, SpecializationMapEntry, StencilOpState, TessellationExtension,
    TessellationState, VertexInputAttributeDescription, VertexInputBindingDescription,
    VertexInputBindingDivisor, VertexInputExtension, VertexInputState, Viewport, ViewportState,
    VERTEX_INPUT_DIVISOR_STATE_CREATE_INFO,
};
pub use render_pass::{
    AttachmentDescription, AttachmentReference, InputAttachmentAspectReference,
    RenderPassCreateInfo, RenderPassExtension, SubpassDependency, SubpassDescription,
};
pub use sampler::{SamplerCreateInfo, SamplerExtension};
pub use shader::ShaderModuleCreateInfo;
