//! Shader modules.

use ash::vk;

/// Creation parameters of a `VkShaderModule`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShaderModuleCreateInfo<'a> {
    /// `VkShaderModuleCreateFlags`.
    pub flags: vk::ShaderModuleCreateFlags,
    /// SPIR-V words.
    pub code: &'a [u32],
}
