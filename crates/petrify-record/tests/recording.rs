//! Recording behaviour over realistic descriptors.

use petrify_core::vk::{self, Handle};
use petrify_core::{Category, CategorySet, RecordError};
use petrify_record::codec::{read_header, WireReader};
use petrify_record::{compute_hash_graphics_pipeline, compute_hash_sampler, StateRecorder};
use petrify_test_utils::fixtures::{self, Scene};

#[test]
fn scene_records_dependency_masks() {
    let mut recorder = StateRecorder::new();
    Scene::record(&mut recorder).unwrap();

    let deps = |category, index| recorder.record(category, index).unwrap().deps;
    assert!(deps(Category::Sampler, 0).is_empty());
    assert_eq!(
        deps(Category::DescriptorSetLayout, 0),
        CategorySet::of(&[Category::Sampler])
    );
    assert_eq!(
        deps(Category::PipelineLayout, 0),
        CategorySet::of(&[Category::DescriptorSetLayout])
    );
    assert_eq!(
        deps(Category::ComputePipeline, 0),
        CategorySet::of(&[Category::ShaderModule, Category::PipelineLayout])
    );
    assert_eq!(
        deps(Category::ComputePipeline, 1),
        CategorySet::of(&[
            Category::ShaderModule,
            Category::PipelineLayout,
            Category::ComputePipeline
        ])
    );
    assert_eq!(
        deps(Category::GraphicsPipeline, 0),
        CategorySet::of(&[
            Category::ShaderModule,
            Category::PipelineLayout,
            Category::RenderPass
        ])
    );
}

#[test]
fn recording_the_scene_twice_deduplicates() {
    let mut recorder = StateRecorder::new();
    let first = Scene::record(&mut recorder).unwrap();
    let bytes = recorder.arena_bytes();
    let second = Scene::record(&mut recorder).unwrap();

    assert_eq!(first, second);
    assert_eq!(recorder.arena_bytes(), bytes);
    for category in Category::ALL {
        let expected = match category {
            Category::ShaderModule => 3,
            Category::ComputePipeline => 2,
            _ => 1,
        };
        assert_eq!(recorder.len(category), expected, "{category}");
    }
}

#[test]
fn hash_follows_referenced_content_not_handle_values() {
    let mut a = StateRecorder::new();
    let mut b = StateRecorder::new();
    let (hash_a, _) = a.capture(&fixtures::linear_sampler()).unwrap();
    let (hash_b, _) = b.capture(&fixtures::linear_sampler()).unwrap();
    assert_eq!(hash_a, hash_b);

    a.set_sampler_handle(0, vk::Sampler::from_raw(0x10)).unwrap();
    b.set_sampler_handle(0, vk::Sampler::from_raw(0x9999)).unwrap();

    let samplers_a = [vk::Sampler::from_raw(0x10)];
    let samplers_b = [vk::Sampler::from_raw(0x9999)];
    let bindings_a = fixtures::texture_bindings(&samplers_a);
    let bindings_b = fixtures::texture_bindings(&samplers_b);
    let (layout_a, _) = a.capture(&fixtures::set_layout(&bindings_a)).unwrap();
    let (layout_b, _) = b.capture(&fixtures::set_layout(&bindings_b)).unwrap();
    assert_eq!(layout_a, layout_b);
}

#[test]
fn hash_changes_with_referenced_content() {
    let mut recorder = StateRecorder::new();
    recorder.capture(&fixtures::linear_sampler()).unwrap();
    recorder.capture(&fixtures::nearest_sampler()).unwrap();
    recorder.set_sampler_handle(0, vk::Sampler::from_raw(1)).unwrap();
    recorder.set_sampler_handle(1, vk::Sampler::from_raw(2)).unwrap();

    let linear = [vk::Sampler::from_raw(1)];
    let nearest = [vk::Sampler::from_raw(2)];
    let with_linear = fixtures::texture_bindings(&linear);
    let with_nearest = fixtures::texture_bindings(&nearest);
    let (a, ia) = recorder.capture(&fixtures::set_layout(&with_linear)).unwrap();
    let (b, ib) = recorder.capture(&fixtures::set_layout(&with_nearest)).unwrap();
    assert_ne!(a, b);
    assert_ne!(ia, ib);
}

#[test]
fn every_field_feeds_the_graphics_hash() {
    let mut recorder = StateRecorder::new();
    let scene = Scene::record(&mut recorder).unwrap();
    let stages = [
        fixtures::shader_stage(vk::ShaderStageFlags::VERTEX, scene.vertex_shader),
        fixtures::shader_stage(vk::ShaderStageFlags::FRAGMENT, scene.fragment_shader),
    ];
    let base = fixtures::graphics_pipeline(&stages, scene.pipeline_layout, scene.render_pass);
    assert_eq!(
        compute_hash_graphics_pipeline(&recorder, &base).unwrap(),
        scene.graphics_hash
    );

    let mut raster = base.rasterization.unwrap();
    raster.line_width = 2.0;
    let variants = [
        petrify_core::GraphicsPipelineCreateInfo {
            subpass: 1,
            ..base
        },
        petrify_core::GraphicsPipelineCreateInfo {
            dynamic: None,
            ..base
        },
        petrify_core::GraphicsPipelineCreateInfo {
            rasterization: Some(raster),
            ..base
        },
        petrify_core::GraphicsPipelineCreateInfo {
            stages: &stages[..1],
            ..base
        },
    ];
    for variant in &variants {
        assert_ne!(
            compute_hash_graphics_pipeline(&recorder, variant).unwrap(),
            scene.graphics_hash
        );
    }
}

#[test]
fn unbound_reference_is_rejected_without_side_effects() {
    let mut recorder = StateRecorder::new();
    let stray = [vk::DescriptorSetLayout::from_raw(0xbad)];
    let err = recorder
        .capture(&fixtures::pipeline_layout(&stray))
        .unwrap_err();
    assert_eq!(
        err,
        RecordError::UnresolvedReference {
            category: Category::DescriptorSetLayout,
            handle: 0xbad,
        }
    );
    assert!(recorder.is_empty());
}

#[test]
fn serialized_scene_has_a_valid_header_and_sampler_hash() {
    let mut recorder = StateRecorder::new();
    Scene::record(&mut recorder).unwrap();
    let blob = recorder.serialize();

    let mut r = WireReader::new(&blob);
    read_header(&mut r).unwrap();
    assert_eq!(r.u32().unwrap(), 1);
    let hash = r.u64().unwrap();
    assert_eq!(
        hash,
        compute_hash_sampler(&recorder, &fixtures::linear_sampler())
            .unwrap()
            .0
    );

    let mut streamed = Vec::new();
    recorder.write_to(&mut streamed).unwrap();
    assert_eq!(streamed, blob);
}
