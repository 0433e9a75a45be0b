//! Descriptor-set layouts and pipeline layouts.

use ash::vk;

/// One binding of a descriptor-set layout.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DescriptorSetLayoutBinding<'a> {
    /// Binding number.
    pub binding: u32,
    /// Descriptor type.
    pub descriptor_type: vk::DescriptorType,
    /// Array size of the binding.
    pub descriptor_count: u32,
    /// Stages that can access the binding.
    pub stage_flags: vk::ShaderStageFlags,
    /// Immutable samplers baked into the layout. Each must already be
    /// recorded and bound; a null handle is recorded as absent.
    pub immutable_samplers: &'a [vk::Sampler],
}

/// Creation parameters of a `VkDescriptorSetLayout`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DescriptorSetLayoutCreateInfo<'a> {
    /// `VkDescriptorSetLayoutCreateFlags`.
    pub flags: vk::DescriptorSetLayoutCreateFlags,
    /// Bindings, in declaration order.
    pub bindings: &'a [DescriptorSetLayoutBinding<'a>],
    /// Extension chain, in chain order.
    pub extensions: &'a [DescriptorSetLayoutExtension<'a>],
}

/// Entries that may appear in a descriptor-set layout's extension chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DescriptorSetLayoutExtension<'a> {
    /// `VkDescriptorSetLayoutBindingFlagsCreateInfo`: one flag word per binding.
    BindingFlags(&'a [vk::DescriptorBindingFlags]),
}

impl DescriptorSetLayoutExtension<'_> {
    /// Structure type tag of this entry.
    pub fn s_type(&self) -> vk::StructureType {
        match self {
            Self::BindingFlags(_) => {
                vk::StructureType::DESCRIPTOR_SET_LAYOUT_BINDING_FLAGS_CREATE_INFO
            }
        }
    }
}

/// A push-constant range of a pipeline layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PushConstantRange {
    /// Stages that can read the range.
    pub stage_flags: vk::ShaderStageFlags,
    /// Byte offset.
    pub offset: u32,
    /// Byte size.
    pub size: u32,
}

/// Creation parameters of a `VkPipelineLayout`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PipelineLayoutCreateInfo<'a> {
    /// `VkPipelineLayoutCreateFlags`.
    pub flags: vk::PipelineLayoutCreateFlags,
    /// Set layouts by set number. Each must already be recorded and bound.
    pub set_layouts: &'a [vk::DescriptorSetLayout],
    /// Push-constant ranges.
    pub push_constant_ranges: &'a [PushConstantRange],
}
