//! Sampler descriptors.

use ash::vk;

/// Creation parameters of a `VkSampler`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SamplerCreateInfo<'a> {
    /// `VkSamplerCreateFlags`.
    pub flags: vk::SamplerCreateFlags,
    /// Magnification filter.
    pub mag_filter: vk::Filter,
    /// Minification filter.
    pub min_filter: vk::Filter,
    /// Mipmap filter.
    pub mipmap_mode: vk::SamplerMipmapMode,
    /// Addressing outside `[0, 1)` on U.
    pub address_mode_u: vk::SamplerAddressMode,
    /// Addressing outside `[0, 1)` on V.
    pub address_mode_v: vk::SamplerAddressMode,
    /// Addressing outside `[0, 1)` on W.
    pub address_mode_w: vk::SamplerAddressMode,
    /// Bias added to the computed level of detail.
    pub mip_lod_bias: f32,
    /// Enables anisotropic filtering.
    pub anisotropy_enable: bool,
    /// Anisotropy clamp.
    pub max_anisotropy: f32,
    /// Enables depth comparison.
    pub compare_enable: bool,
    /// Comparison operator for depth samplers.
    pub compare_op: vk::CompareOp,
    /// Lower LOD clamp.
    pub min_lod: f32,
    /// Upper LOD clamp.
    pub max_lod: f32,
    /// Predefined border colour.
    pub border_color: vk::BorderColor,
    /// Use texel instead of normalised coordinates.
    pub unnormalized_coordinates: bool,
    /// Extension chain, in chain order.
    pub extensions: &'a [SamplerExtension],
}

/// Entries that may appear in a sampler's extension chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SamplerExtension {
    /// `VkSamplerReductionModeCreateInfo`.
    ReductionMode(vk::SamplerReductionMode),
    /// `VkSamplerCustomBorderColorCreateInfoEXT`. The colour is kept as
    /// the raw bits of the `VkClearColorValue` union.
    CustomBorderColor {
        /// Bits of the four colour channels.
        color: [u32; 4],
        /// Format the colour is interpreted in.
        format: vk::Format,
    },
}

impl SamplerExtension {
    /// Structure type tag of this entry.
    pub fn s_type(&self) -> vk::StructureType {
        match self {
            Self::ReductionMode(_) => vk::StructureType::SAMPLER_REDUCTION_MODE_CREATE_INFO,
            Self::CustomBorderColor { .. } => {
                vk::StructureType::SAMPLER_CUSTOM_BORDER_COLOR_CREATE_INFO_EXT
            }
        }
    }
}
