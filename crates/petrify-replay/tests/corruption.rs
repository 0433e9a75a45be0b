//! Malformed blobs are rejected with typed errors and never panic.

use petrify_core::vk;
use petrify_core::{Category, CategorySet, ContentHash, FormatError, ObjectRef, ReplayError};
use petrify_record::codec::{write_header, write_record, write_u32_le, write_u8};
use petrify_record::StateRecorder;
use petrify_replay::StateReplayer;
use petrify_test_utils::fixtures::{self, Scene};
use petrify_test_utils::RecordingCreator;
use proptest::prelude::*;

fn scene_blob() -> Vec<u8> {
    let mut recorder = StateRecorder::new();
    Scene::record(&mut recorder).unwrap();
    recorder.serialize()
}

fn blob_of(records: &[(Category, CategorySet, Vec<u8>)]) -> Vec<u8> {
    let mut out = Vec::new();
    write_header(&mut out);
    for category in Category::ALL {
        let mine: Vec<_> = records.iter().filter(|r| r.0 == category).collect();
        write_u32_le(&mut out, mine.len() as u32);
        for (i, (_, deps, payload)) in mine.into_iter().enumerate() {
            write_record(&mut out, ContentHash(0x100 + i as u64), *deps, payload);
        }
    }
    out
}

/// An empty descriptor-set layout: flags, no bindings, no extensions.
fn empty_set_layout() -> Vec<u8> {
    vec![0; 12]
}

/// A pipeline layout with one reference and no push constants.
fn layout_referencing(category: Category, index: u32) -> Vec<u8> {
    let mut p = Vec::new();
    write_u32_le(&mut p, 0);
    write_u32_le(&mut p, 1);
    write_u8(&mut p, 1);
    write_u8(&mut p, category as u8);
    write_u32_le(&mut p, index);
    write_u32_le(&mut p, 0);
    p
}

fn replay(blob: &[u8]) -> (Result<u32, ReplayError>, usize) {
    let replayer = StateReplayer::new();
    let mut creator = RecordingCreator::new();
    let result = replayer.parse(&mut creator, blob).map(|s| s.total());
    (result, creator.events.len())
}

fn at(category: Category, index: u32) -> Option<ObjectRef> {
    Some(ObjectRef::new(category, index))
}

#[test]
fn hand_built_blob_replays() {
    let dsl = CategorySet::of(&[Category::DescriptorSetLayout]);
    let blob = blob_of(&[
        (Category::DescriptorSetLayout, CategorySet::EMPTY, empty_set_layout()),
        (
            Category::PipelineLayout,
            dsl,
            layout_referencing(Category::DescriptorSetLayout, 0),
        ),
    ]);
    assert_eq!(replay(&blob).0, Ok(2));
}

#[test]
fn truncated_blob_never_reaches_the_creator() {
    let blob = scene_blob();
    for cut in 0..blob.len() {
        let (result, events) = replay(&blob[..cut]);
        assert!(result.is_err(), "cut at {cut}");
        assert_eq!(events, 0, "cut at {cut}");
    }
}

#[test]
fn version_mismatch_is_rejected() {
    let mut blob = scene_blob();
    blob[4..8].copy_from_slice(&2u32.to_le_bytes());
    assert_eq!(
        replay(&blob).0,
        Err(ReplayError::format(FormatError::UnsupportedVersion { found: 2 }))
    );
}

#[test]
fn unknown_extension_tag_is_rejected() {
    let mut blob = scene_blob();
    let tag = vk::StructureType::SAMPLER_REDUCTION_MODE_CREATE_INFO
        .as_raw()
        .to_le_bytes();
    let pos = blob.windows(4).position(|w| w == tag).unwrap();
    blob[pos..pos + 4].copy_from_slice(&0x7fff_0000i32.to_le_bytes());

    assert_eq!(
        replay(&blob).0,
        Err(ReplayError::Format {
            record: at(Category::Sampler, 0),
            source: FormatError::UnknownExtension {
                s_type: 0x7fff_0000
            },
        })
    );
}

#[test]
fn reference_to_wrong_category_is_rejected() {
    let blob = blob_of(&[
        (Category::Sampler, CategorySet::EMPTY, {
            let mut recorder = StateRecorder::new();
            recorder.capture(&fixtures::nearest_sampler()).unwrap();
            recorder.record(Category::Sampler, 0).unwrap().payload.to_vec()
        }),
        (
            Category::PipelineLayout,
            CategorySet::of(&[Category::DescriptorSetLayout]),
            layout_referencing(Category::Sampler, 0),
        ),
    ]);
    let (result, _) = replay(&blob);
    assert!(matches!(
        result,
        Err(ReplayError::Format {
            record: Some(ObjectRef {
                category: Category::PipelineLayout,
                index: 0
            }),
            source: FormatError::InvalidValue { .. },
        })
    ));
}

#[test]
fn reference_outside_dependency_mask_is_rejected() {
    let blob = blob_of(&[
        (Category::DescriptorSetLayout, CategorySet::EMPTY, empty_set_layout()),
        (
            Category::PipelineLayout,
            CategorySet::EMPTY,
            layout_referencing(Category::DescriptorSetLayout, 0),
        ),
    ]);
    let (result, events) = replay(&blob);
    assert!(matches!(
        result,
        Err(ReplayError::Format {
            source: FormatError::InvalidValue { .. },
            ..
        })
    ));
    assert!(events > 0);
}

#[test]
fn reference_to_unreplayed_index_is_rejected() {
    let blob = blob_of(&[
        (Category::DescriptorSetLayout, CategorySet::EMPTY, empty_set_layout()),
        (
            Category::PipelineLayout,
            CategorySet::of(&[Category::DescriptorSetLayout]),
            layout_referencing(Category::DescriptorSetLayout, 3),
        ),
    ]);
    let (result, _) = replay(&blob);
    let Err(ReplayError::Format {
        record,
        source: FormatError::InvalidValue { detail },
    }) = &result
    else {
        panic!("expected an invalid value, got {result:?}");
    };
    assert_eq!(*record, at(Category::PipelineLayout, 0));
    assert!(detail.contains("descriptor-set-layout#3"), "{detail}");
}

#[test]
fn payload_trailing_bytes_are_rejected() {
    let mut payload = empty_set_layout();
    payload.push(0);
    let blob = blob_of(&[(Category::DescriptorSetLayout, CategorySet::EMPTY, payload)]);
    assert_eq!(
        replay(&blob).0,
        Err(ReplayError::Format {
            record: at(Category::DescriptorSetLayout, 0),
            source: FormatError::TrailingBytes { remaining: 1 },
        })
    );
}

#[test]
fn invalid_bool_byte_is_rejected() {
    let mut recorder = StateRecorder::new();
    recorder.capture(&fixtures::nearest_sampler()).unwrap();
    let mut payload = recorder.record(Category::Sampler, 0).unwrap().payload.to_vec();
    // flags, six enums and the LOD bias precede anisotropy_enable.
    payload[32] = 2;
    let blob = blob_of(&[(Category::Sampler, CategorySet::EMPTY, payload)]);
    assert!(matches!(
        replay(&blob).0,
        Err(ReplayError::Format {
            source: FormatError::InvalidValue { .. },
            ..
        })
    ));
}

#[test]
fn oversized_array_length_fails_without_allocating() {
    let mut p = Vec::new();
    write_u32_le(&mut p, 0);
    write_u32_le(&mut p, u32::MAX);
    let blob = blob_of(&[(Category::ShaderModule, CategorySet::EMPTY, p)]);
    let replayer = StateReplayer::new();
    let mut creator = RecordingCreator::new();
    let err = replayer.parse(&mut creator, &blob).unwrap_err();
    assert!(matches!(
        err,
        ReplayError::Format {
            source: FormatError::Truncated { .. },
            ..
        }
    ));
    assert_eq!(replayer.allocator().reserved_bytes(), 0);
}

proptest! {
    #[test]
    fn mutated_blob_never_panics(
        edits in prop::collection::vec((any::<prop::sample::Index>(), any::<u8>()), 1..8)
    ) {
        let mut blob = scene_blob();
        for (pos, byte) in edits {
            let i = pos.index(blob.len());
            blob[i] = byte;
        }
        let _ = replay(&blob);
    }

    #[test]
    fn random_payload_never_panics(
        category in 0u8..7,
        payload in prop::collection::vec(any::<u8>(), 0..256),
        deps in 0u8..0x80,
    ) {
        let category = Category::from_u8(category).unwrap();
        let deps = CategorySet::from_bits(deps & category.allowed_references().bits()).unwrap();
        let blob = blob_of(&[(category, deps, payload)]);
        let _ = replay(&blob);
    }
}
