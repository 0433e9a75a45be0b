//! Synthetic workloads and helpers for the petrify benchmarks.
//!
//! A workload is a number of independent "chains", each of which
//! records a sampler, a descriptor-set layout that uses it, a pipeline
//! layout, a compute shader and a compute pipeline, binding every object
//! to a handle before the next one references it. That is the shape of
//! a renderer warming its pipeline cache.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ash::vk::{self, Handle};
use petrify_core::{
    Category, ComputePipelineCreateInfo, DescriptorSetLayoutBinding, DescriptorSetLayoutCreateInfo,
    PipelineLayoutCreateInfo, PipelineShaderStage, PushConstantRange, RecordError,
    SamplerCreateInfo, ShaderModuleCreateInfo,
};
use petrify_record::StateRecorder;

/// Size of a synthetic workload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkloadProfile {
    /// Number of independent sampler → pipeline chains.
    pub chains: u32,
    /// Length of each generated SPIR-V module, in words.
    pub spirv_words: usize,
}

/// Reference profile: 64 chains with 1K-word shaders.
pub fn reference_profile() -> WorkloadProfile {
    WorkloadProfile {
        chains: 64,
        spirv_words: 1024,
    }
}

/// Stress profile: 1K chains with 4K-word shaders.
pub fn stress_profile() -> WorkloadProfile {
    WorkloadProfile {
        chains: 1024,
        spirv_words: 4096,
    }
}

/// Deterministic pseudo-SPIR-V of `words` words, distinct per `seed`.
///
/// Starts with the SPIR-V magic number so it looks plausible in a dump.
pub fn synthetic_spirv(words: usize, seed: u32) -> Vec<u32> {
    let mut state = u64::from(seed).wrapping_mul(6364136223846793005) | 1;
    let mut code = Vec::with_capacity(words.max(1));
    code.push(0x0723_0203);
    while code.len() < words {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        code.push((state >> 32) as u32);
    }
    code
}

/// Sampler whose LOD range and anisotropy depend on `i`.
pub fn sampler(i: u32) -> SamplerCreateInfo<'static> {
    SamplerCreateInfo {
        mag_filter: vk::Filter::LINEAR,
        min_filter: vk::Filter::LINEAR,
        mipmap_mode: vk::SamplerMipmapMode::LINEAR,
        address_mode_u: vk::SamplerAddressMode::REPEAT,
        address_mode_v: vk::SamplerAddressMode::REPEAT,
        address_mode_w: vk::SamplerAddressMode::CLAMP_TO_EDGE,
        anisotropy_enable: i % 2 == 0,
        max_anisotropy: (1 + i % 16) as f32,
        max_lod: i as f32,
        ..Default::default()
    }
}

/// Application-side handle for record `index` of `category`.
///
/// Unique across categories so a workload never rebinds a handle.
pub fn handle<H: Handle>(category: Category, index: u32) -> H {
    H::from_raw(((category as u64 + 1) << 40) | (u64::from(index) + 1))
}

/// Record one chain per `profile.chains` into `recorder`.
///
/// Returns the number of objects captured, duplicates included.
pub fn record_workload(
    recorder: &mut StateRecorder,
    profile: WorkloadProfile,
) -> Result<u32, RecordError> {
    let push_constants = [PushConstantRange {
        stage_flags: vk::ShaderStageFlags::COMPUTE,
        offset: 0,
        size: 16,
    }];
    let mut captured = 0;

    for i in 0..profile.chains {
        let (_, index) = recorder.capture(&sampler(i))?;
        let s: vk::Sampler = handle(Category::Sampler, index);
        recorder.set_sampler_handle(index, s)?;

        let samplers = [s];
        let bindings = [
            DescriptorSetLayoutBinding {
                binding: 0,
                descriptor_type: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 1,
                stage_flags: vk::ShaderStageFlags::COMPUTE,
                immutable_samplers: &samplers,
            },
            DescriptorSetLayoutBinding {
                binding: 1,
                descriptor_type: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: 1 + i % 4,
                stage_flags: vk::ShaderStageFlags::COMPUTE,
                immutable_samplers: &[],
            },
        ];
        let (_, index) = recorder.capture(&DescriptorSetLayoutCreateInfo {
            bindings: &bindings,
            ..Default::default()
        })?;
        let set_layout: vk::DescriptorSetLayout = handle(Category::DescriptorSetLayout, index);
        recorder.set_descriptor_set_layout_handle(index, set_layout)?;

        let (_, index) = recorder.capture(&PipelineLayoutCreateInfo {
            set_layouts: &[set_layout],
            push_constant_ranges: &push_constants,
            ..Default::default()
        })?;
        let layout: vk::PipelineLayout = handle(Category::PipelineLayout, index);
        recorder.set_pipeline_layout_handle(index, layout)?;

        let code = synthetic_spirv(profile.spirv_words, i);
        let (_, index) = recorder.capture(&ShaderModuleCreateInfo {
            code: &code,
            ..Default::default()
        })?;
        let module: vk::ShaderModule = handle(Category::ShaderModule, index);
        recorder.set_shader_module_handle(index, module)?;

        let (_, index) = recorder.capture(&ComputePipelineCreateInfo {
            stage: PipelineShaderStage {
                stage: vk::ShaderStageFlags::COMPUTE,
                module,
                name: "main",
                ..Default::default()
            },
            layout,
            base_pipeline_index: -1,
            ..Default::default()
        })?;
        recorder.set_compute_pipeline_handle(index, handle(Category::ComputePipeline, index))?;

        captured += 5;
    }

    Ok(captured)
}

/// Record `profile` into a fresh recorder and serialize it.
pub fn workload_blob(profile: WorkloadProfile) -> Result<Vec<u8>, RecordError> {
    let mut recorder = StateRecorder::new();
    record_workload(&mut recorder, profile)?;
    Ok(recorder.serialize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_spirv_is_deterministic_and_seeded() {
        let a = synthetic_spirv(64, 7);
        assert_eq!(a.len(), 64);
        assert_eq!(a[0], 0x0723_0203);
        assert_eq!(a, synthetic_spirv(64, 7));
        assert_ne!(a, synthetic_spirv(64, 8));
        assert_eq!(synthetic_spirv(0, 1).len(), 1);
    }

    #[test]
    fn every_chain_is_distinct() {
        let profile = WorkloadProfile {
            chains: 16,
            spirv_words: 32,
        };
        let mut recorder = StateRecorder::new();
        assert_eq!(record_workload(&mut recorder, profile).unwrap(), 80);
        for category in [
            Category::Sampler,
            Category::DescriptorSetLayout,
            Category::PipelineLayout,
            Category::ShaderModule,
            Category::ComputePipeline,
        ] {
            assert_eq!(recorder.len(category), 16, "{category}");
        }
        assert_eq!(recorder.len(Category::RenderPass), 0);
    }

    #[test]
    fn recording_twice_deduplicates() {
        let profile = WorkloadProfile {
            chains: 8,
            spirv_words: 16,
        };
        let mut recorder = StateRecorder::new();
        record_workload(&mut recorder, profile).unwrap();
        let bytes = recorder.arena_bytes();
        record_workload(&mut recorder, profile).unwrap();
        assert_eq!(recorder.arena_bytes(), bytes);
        assert_eq!(recorder.len(Category::ComputePipeline), 8);
    }

    #[test]
    fn profiles_scale() {
        assert!(stress_profile().chains > reference_profile().chains);
        assert!(!workload_blob(reference_profile()).unwrap().is_empty());
    }
}
