//! Record → write → read → replay through the facade's public surface.

use petrify::prelude::*;
use petrify::vk;
use petrify_test_utils::fixtures::Scene;
use petrify_test_utils::{Event, RecordingCreator};

#[test]
fn scene_survives_a_trip_through_a_writer() {
    let mut recorder = StateRecorder::new();
    let scene = Scene::record(&mut recorder).unwrap();

    let mut file = Vec::new();
    recorder.write_to(&mut file).unwrap();

    let replayer = StateReplayer::new();
    let mut creator = RecordingCreator::new();
    let summary = replayer.parse(&mut creator, &file).unwrap();

    assert_eq!(summary.total(), 10);
    assert_eq!(replayer.phase(), ReplayPhase::Done);
    assert_eq!(
        recorder.hash_for_graphics_pipeline(scene.graphics).unwrap(),
        scene.graphics_hash
    );
    let graphics = ObjectRef::new(Category::GraphicsPipeline, 0);
    assert!(creator
        .events
        .contains(&Event::Create(graphics, scene.graphics_hash)));
}

#[test]
fn replayer_is_reusable_after_a_failure() {
    let mut recorder = StateRecorder::new();
    Scene::record(&mut recorder).unwrap();
    let blob = recorder.serialize();

    let replayer = StateReplayer::new();
    let mut creator = RecordingCreator::new();
    let err = replayer
        .parse(&mut creator, &blob[..blob.len() - 1])
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::Format);
    assert_eq!(replayer.phase(), ReplayPhase::Failed(FailureKind::Format));

    let mut creator = RecordingCreator::new();
    replayer.parse(&mut creator, &blob).unwrap();
    assert_eq!(replayer.phase(), ReplayPhase::Done);
    assert_eq!(creator.compute_pipelines.len(), 2);
    assert_ne!(creator.compute_pipelines[1].base_pipeline, vk::Pipeline::null());
}
