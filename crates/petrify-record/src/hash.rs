//! Content hashing of creation descriptors.
//!
//! Uses 64-bit FNV-1a over the little-endian bytes of the canonical walk.
//! The state starts from the FNV offset basis with [`FORMAT_VERSION`] and
//! the record's category folded in, so changing the walk together with
//! the version keeps old and new hashes apart. A reference contributes
//! its presence byte and the content hash of the referenced record,
//! never the handle value, which makes hashes stable across processes.

use petrify_core::info::*;
use petrify_core::{Category, ContentHash, RecordError};

use crate::canonical::{Canonical, CanonicalSink};
use crate::recorder::StateRecorder;
use crate::FORMAT_VERSION;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

/// Feed a single byte into an FNV-1a hash state.
#[inline]
fn fnv1a_byte(hash: u64, byte: u8) -> u64 {
    (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
}

/// Feed a byte run into an FNV-1a hash state.
#[inline]
fn fnv1a_bytes(mut hash: u64, bytes: &[u8]) -> u64 {
    for &b in bytes {
        hash = fnv1a_byte(hash, b);
    }
    hash
}

/// Resolves a runtime handle to the record it was bound to.
pub trait HandleLookup {
    /// Index and content hash of the record of `category` bound to the
    /// raw handle value, if any.
    fn resolve(&self, category: Category, handle: u64) -> Option<(u32, ContentHash)>;
}

/// Canonical sink that folds everything into an FNV-1a state.
struct Fnv1aSink<'l, L: ?Sized> {
    state: u64,
    category: Category,
    lookup: &'l L,
}

impl<'l, L: HandleLookup + ?Sized> Fnv1aSink<'l, L> {
    fn new(category: Category, lookup: &'l L) -> Self {
        let mut state = fnv1a_bytes(FNV_OFFSET, &FORMAT_VERSION.to_le_bytes());
        state = fnv1a_byte(state, category as u8);
        Self {
            state,
            category,
            lookup,
        }
    }
}

impl<L: HandleLookup + ?Sized> CanonicalSink for Fnv1aSink<'_, L> {
    fn category(&self) -> Category {
        self.category
    }

    fn put_u8(&mut self, v: u8) {
        self.state = fnv1a_byte(self.state, v);
    }

    fn put_u32(&mut self, v: u32) {
        self.state = fnv1a_bytes(self.state, &v.to_le_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.state = fnv1a_bytes(self.state, &v.to_le_bytes());
    }

    fn put_raw(&mut self, bytes: &[u8]) {
        self.state = fnv1a_bytes(self.state, bytes);
    }

    fn put_bound(&mut self, category: Category, handle: u64) -> Result<(), RecordError> {
        let (_, hash) = self
            .lookup
            .resolve(category, handle)
            .ok_or(RecordError::UnresolvedReference { category, handle })?;
        self.put_u8(1);
        self.put_u64(hash.0);
        Ok(())
    }
}

/// Hash any recordable descriptor, resolving its references through `lookup`.
///
/// Fails with [`RecordError::UnresolvedReference`] if a non-null reference
/// is not bound to a recorded object.
pub fn compute_hash<L, T>(lookup: &L, info: &T) -> Result<ContentHash, RecordError>
where
    L: HandleLookup + ?Sized,
    T: Canonical + ?Sized,
{
    let mut sink = Fnv1aSink::new(T::CATEGORY, lookup);
    info.walk(&mut sink)?;
    Ok(ContentHash(sink.state))
}

/// Hash a sampler descriptor.
pub fn compute_hash_sampler(
    recorder: &StateRecorder,
    info: &SamplerCreateInfo<'_>,
) -> Result<ContentHash, RecordError> {
    compute_hash(recorder, info)
}

/// Hash a descriptor-set layout; immutable samplers must be bound.
pub fn compute_hash_descriptor_set_layout(
    recorder: &StateRecorder,
    info: &DescriptorSetLayoutCreateInfo<'_>,
) -> Result<ContentHash, RecordError> {
    compute_hash(recorder, info)
}

/// Hash a pipeline layout; its set layouts must be bound.
pub fn compute_hash_pipeline_layout(
    recorder: &StateRecorder,
    info: &PipelineLayoutCreateInfo<'_>,
) -> Result<ContentHash, RecordError> {
    compute_hash(recorder, info)
}

/// Hash a shader module.
pub fn compute_hash_shader_module(
    recorder: &StateRecorder,
    info: &ShaderModuleCreateInfo<'_>,
) -> Result<ContentHash, RecordError> {
    compute_hash(recorder, info)
}

/// Hash a render pass.
pub fn compute_hash_render_pass(
    recorder: &StateRecorder,
    info: &RenderPassCreateInfo<'_>,
) -> Result<ContentHash, RecordError> {
    compute_hash(recorder, info)
}

/// Hash a compute pipeline; its module, layout and base pipeline must be bound.
pub fn compute_hash_compute_pipeline(
    recorder: &StateRecorder,
    info: &ComputePipelineCreateInfo<'_>,
) -> Result<ContentHash, RecordError> {
    compute_hash(recorder, info)
}

/// Hash a graphics pipeline; every referenced object must be bound.
pub fn compute_hash_graphics_pipeline(
    recorder: &StateRecorder,
    info: &GraphicsPipelineCreateInfo<'_>,
) -> Result<ContentHash, RecordError> {
    compute_hash(recorder, info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::{self, Handle};
    use std::collections::HashMap;

    /// Lookup backed by a plain map, independent of the recorder.
    #[derive(Default)]
    struct MapLookup(HashMap<(Category, u64), (u32, ContentHash)>);

    impl HandleLookup for MapLookup {
        fn resolve(&self, category: Category, handle: u64) -> Option<(u32, ContentHash)> {
            self.0.get(&(category, handle)).copied()
        }
    }

    fn nearest_sampler() -> SamplerCreateInfo<'static> {
        SamplerCreateInfo {
            mag_filter: vk::Filter::NEAREST,
            min_filter: vk::Filter::NEAREST,
            max_lod: 1.0,
            ..Default::default()
        }
    }

    #[test]
    fn identical_content_hashes_identically() {
        let lookup = MapLookup::default();
        let a = compute_hash(&lookup, &nearest_sampler()).unwrap();
        let b = compute_hash(&lookup, &nearest_sampler()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn hash_is_version_and_category_seeded() {
        let lookup = MapLookup::default();
        // An empty shader module walks a zero flags word and a zero count.
        let shader = ShaderModuleCreateInfo::default();
        let h = compute_hash(&lookup, &shader).unwrap();
        let mut expected = fnv1a_bytes(FNV_OFFSET, &FORMAT_VERSION.to_le_bytes());
        expected = fnv1a_byte(expected, Category::ShaderModule as u8);
        expected = fnv1a_bytes(expected, &0u32.to_le_bytes());
        expected = fnv1a_bytes(expected, &0u32.to_le_bytes());
        assert_eq!(h, ContentHash(expected));
    }

    #[test]
    fn float_fields_hash_by_bits() {
        let lookup = MapLookup::default();
        let pos = SamplerCreateInfo {
            mip_lod_bias: 0.0,
            ..nearest_sampler()
        };
        let neg = SamplerCreateInfo {
            mip_lod_bias: -0.0,
            ..nearest_sampler()
        };
        assert_ne!(
            compute_hash(&lookup, &pos).unwrap(),
            compute_hash(&lookup, &neg).unwrap()
        );
    }

    #[test]
    fn extension_order_matters() {
        let lookup = MapLookup::default();
        let chain_a = [
            SamplerExtension::ReductionMode(vk::SamplerReductionMode::MIN),
            SamplerExtension::CustomBorderColor {
                color: [1, 2, 3, 4],
                format: vk::Format::R8G8B8A8_UNORM,
            },
        ];
        let chain_b = [chain_a[1], chain_a[0]];
        let a = SamplerCreateInfo {
            extensions: &chain_a,
            ..nearest_sampler()
        };
        let b = SamplerCreateInfo {
            extensions: &chain_b,
            ..nearest_sampler()
        };
        assert_ne!(
            compute_hash(&lookup, &a).unwrap(),
            compute_hash(&lookup, &b).unwrap()
        );
    }

    #[test]
    fn references_hash_the_target_content_not_the_handle() {
        let mut first = MapLookup::default();
        first
            .0
            .insert((Category::Sampler, 0x10), (0, ContentHash(0xAAAA)));
        let mut second = MapLookup::default();
        second
            .0
            .insert((Category::Sampler, 0x99), (0, ContentHash(0xAAAA)));

        let samplers_a = [vk::Sampler::from_raw(0x10)];
        let samplers_b = [vk::Sampler::from_raw(0x99)];
        let binding_a = [DescriptorSetLayoutBinding {
            descriptor_type: vk::DescriptorType::SAMPLER,
            descriptor_count: 1,
            immutable_samplers: &samplers_a,
            ..Default::default()
        }];
        let binding_b = [DescriptorSetLayoutBinding {
            immutable_samplers: &samplers_b,
            ..binding_a[0]
        }];
        let a = DescriptorSetLayoutCreateInfo {
            bindings: &binding_a,
            ..Default::default()
        };
        let b = DescriptorSetLayoutCreateInfo {
            bindings: &binding_b,
            ..Default::default()
        };
        assert_eq!(
            compute_hash(&first, &a).unwrap(),
            compute_hash(&second, &b).unwrap()
        );

        // Same handle, different target content: different hash.
        let mut changed = MapLookup::default();
        changed
            .0
            .insert((Category::Sampler, 0x10), (0, ContentHash(0xBBBB)));
        assert_ne!(
            compute_hash(&first, &a).unwrap(),
            compute_hash(&changed, &a).unwrap()
        );
    }

    #[test]
    fn unbound_reference_fails() {
        let lookup = MapLookup::default();
        let layouts = [vk::DescriptorSetLayout::from_raw(7)];
        let info = PipelineLayoutCreateInfo {
            set_layouts: &layouts,
            ..Default::default()
        };
        assert_eq!(
            compute_hash(&lookup, &info),
            Err(RecordError::UnresolvedReference {
                category: Category::DescriptorSetLayout,
                handle: 7
            })
        );
    }

    #[test]
    fn null_reference_is_absent_not_unresolved() {
        let lookup = MapLookup::default();
        let layouts = [vk::DescriptorSetLayout::null()];
        let info = PipelineLayoutCreateInfo {
            set_layouts: &layouts,
            ..Default::default()
        };
        assert!(compute_hash(&lookup, &info).is_ok());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn any_code_word_change_changes_hash(
                code in prop::collection::vec(any::<u32>(), 1..64),
                at in any::<prop::sample::Index>(),
                flip in 1u32..,
            ) {
                let lookup = MapLookup::default();
                let i = at.index(code.len());
                let mut mutated = code.clone();
                mutated[i] ^= flip;
                let a = ShaderModuleCreateInfo { code: &code, ..Default::default() };
                let b = ShaderModuleCreateInfo { code: &mutated, ..Default::default() };
                prop_assert_ne!(
                    compute_hash(&lookup, &a).unwrap(),
                    compute_hash(&lookup, &b).unwrap()
                );
            }

            #[test]
            fn swapping_distinct_elements_changes_hash(
                code in prop::collection::vec(any::<u32>(), 2..32),
                a in any::<prop::sample::Index>(),
                b in any::<prop::sample::Index>(),
            ) {
                let (i, j) = (a.index(code.len()), b.index(code.len()));
                prop_assume!(code[i] != code[j]);
                let lookup = MapLookup::default();
                let mut swapped = code.clone();
                swapped.swap(i, j);
                let x = ShaderModuleCreateInfo { code: &code, ..Default::default() };
                let y = ShaderModuleCreateInfo { code: &swapped, ..Default::default() };
                prop_assert_ne!(
                    compute_hash(&lookup, &x).unwrap(),
                    compute_hash(&lookup, &y).unwrap()
                );
            }
        }
    }
}
