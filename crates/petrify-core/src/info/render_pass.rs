//! Render passes.

use ash::vk;

/// An attachment of a render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttachmentDescription {
    /// `VkAttachmentDescriptionFlags`.
    pub flags: vk::AttachmentDescriptionFlags,
    /// Image format.
    pub format: vk::Format,
    /// Sample count.
    pub samples: vk::SampleCountFlags,
    /// Colour/depth load behaviour.
    pub load_op: vk::AttachmentLoadOp,
    /// Colour/depth store behaviour.
    pub store_op: vk::AttachmentStoreOp,
    /// Stencil load behaviour.
    pub stencil_load_op: vk::AttachmentLoadOp,
    /// Stencil store behaviour.
    pub stencil_store_op: vk::AttachmentStoreOp,
    /// Layout on entry.
    pub initial_layout: vk::ImageLayout,
    /// Layout on exit.
    pub final_layout: vk::ImageLayout,
}

/// Use of an attachment inside a subpass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttachmentReference {
    /// Attachment index, or `vk::ATTACHMENT_UNUSED`.
    pub attachment: u32,
    /// Layout during the subpass.
    pub layout: vk::ImageLayout,
}

/// One subpass of a render pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubpassDescription<'a> {
    /// `VkSubpassDescriptionFlags`.
    pub flags: vk::SubpassDescriptionFlags,
    /// Graphics or compute.
    pub pipeline_bind_point: vk::PipelineBindPoint,
    /// Input attachments.
    pub input_attachments: &'a [AttachmentReference],
    /// Colour attachments.
    pub color_attachments: &'a [AttachmentReference],
    /// Resolve targets; empty, or one per colour attachment.
    pub resolve_attachments: &'a [AttachmentReference],
    /// Depth/stencil attachment, if any.
    pub depth_stencil_attachment: Option<AttachmentReference>,
    /// Attachments preserved through the subpass.
    pub preserve_attachments: &'a [u32],
}

/// Execution and memory dependency between two subpasses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubpassDependency {
    /// Source subpass, or `vk::SUBPASS_EXTERNAL`.
    pub src_subpass: u32,
    /// Destination subpass, or `vk::SUBPASS_EXTERNAL`.
    pub dst_subpass: u32,
    /// Source stage mask.
    pub src_stage_mask: vk::PipelineStageFlags,
    /// Destination stage mask.
    pub dst_stage_mask: vk::PipelineStageFlags,
    /// Source access mask.
    pub src_access_mask: vk::AccessFlags,
    /// Destination access mask.
    pub dst_access_mask: vk::AccessFlags,
    /// `VkDependencyFlags`.
    pub dependency_flags: vk::DependencyFlags,
}

/// Aspect mask for one input attachment of one subpass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputAttachmentAspectReference {
    /// Subpass index.
    pub subpass: u32,
    /// Index into that subpass's input attachments.
    pub input_attachment_index: u32,
    /// Aspects the shader may read.
    pub aspect_mask: vk::ImageAspectFlags,
}

/// Creation parameters of a `VkRenderPass`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderPassCreateInfo<'a> {
    /// `VkRenderPassCreateFlags`.
    pub flags: vk::RenderPassCreateFlags,
    /// Attachments.
    pub attachments: &'a [AttachmentDescription],
    /// Subpasses.
    pub subpasses: &'a [SubpassDescription<'a>],
    /// Subpass dependencies.
    pub dependencies: &'a [SubpassDependency],
    /// Extension chain, in chain order.
    pub extensions: &'a [RenderPassExtension<'a>],
}

/// Entries that may appear in a render pass's extension chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RenderPassExtension<'a> {
    /// `VkRenderPassMultiviewCreateInfo`.
    Multiview {
        /// View mask per subpass.
        view_masks: &'a [u32],
        /// View offset per dependency.
        view_offsets: &'a [i32],
        /// Sets of views that may be rendered concurrently.
        correlation_masks: &'a [u32],
    },
    /// `VkRenderPassInputAttachmentAspectCreateInfo`.
    InputAttachmentAspect(&'a [InputAttachmentAspectReference]),
}

impl RenderPassExtension<'_> {
    /// Structure type tag of this entry.
    pub fn s_type(&self) -> vk::StructureType {
        match self {
            Self::Multiview { .. } => vk::StructureType::RENDER_PASS_MULTIVIEW_CREATE_INFO,
            Self::InputAttachmentAspect(_) => {
                vk::StructureType::RENDER_PASS_INPUT_ATTACHMENT_ASPECT_CREATE_INFO
            }
        }
    }
}
