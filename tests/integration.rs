use std::sync::Arc;

use blendspace_engine::blend_space::{
    AxisConfig, BlendSpace1DConfig, BlendSpace1DNode, BlendSpace2DConfig, BlendSpace2DNode,
    BlendSpaceMotion, BlendSpaceSettings, CurrentLocation, EventFilterMode, SyncMode,
};
use blendspace_engine::graph::AnimGraph;
use blendspace_engine::graph::frame::{self, evaluate_frame};
use blendspace_engine::graph::instance::{AnimGraphContext, AnimGraphInstance};
use blendspace_engine::graph::node::AnimGraphNode;
use blendspace_engine::motion::{
    Channel, InMemoryMotionSet, JointTrack, KeyframedMotion, MotionEvent,
};
use blendspace_engine::parse::blend_space_xml;
use blendspace_engine::pose::{Joint, Skeleton, Transform};
use glam::{Quat, Vec2, Vec3};

fn one_d(settings: BlendSpaceSettings) -> AnimGraph {
    let mut graph = AnimGraph::new();
    graph
        .add_node(BlendSpace1DNode::new(
            "locomotion",
            BlendSpace1DConfig {
                settings,
                axis: AxisConfig::manual(Some("speed")),
            },
        ))
        .expect("node added");
    graph
}

fn locomotion_settings() -> BlendSpaceSettings {
    BlendSpaceSettings {
        motions: vec![
            BlendSpaceMotion::at_x("idle", 0.0),
            BlendSpaceMotion::at_x("walk", 5.0),
            BlendSpaceMotion::at_x("run", 10.0),
        ],
        ..BlendSpaceSettings::default()
    }
}

fn locomotion_set() -> Arc<InMemoryMotionSet> {
    Arc::new(
        InMemoryMotionSet::new()
            .with(KeyframedMotion::new("idle", 2.0))
            .with(KeyframedMotion::new("walk", 1.0))
            .with(KeyframedMotion::new("run", 0.5)),
    )
}

fn weights(graph: &AnimGraph, instance: &AnimGraphInstance) -> Vec<(String, f32)> {
    let root = graph.root_node().expect("root");
    instance
        .unique_data(root.id())
        .map(|data| data.weights())
        .unwrap_or_default()
}

fn square_graph(motions: Vec<BlendSpaceMotion>) -> AnimGraph {
    let mut graph = AnimGraph::new();
    graph
        .add_node(BlendSpace2DNode::new(
            "strafe",
            BlendSpace2DConfig {
                settings: BlendSpaceSettings {
                    motions,
                    ..BlendSpaceSettings::default()
                },
                axis_x: AxisConfig::manual(Some("x")),
                axis_y: AxisConfig::manual(Some("y")),
            },
        ))
        .expect("node added");
    graph
}

fn square_motions() -> Vec<BlendSpaceMotion> {
    vec![
        BlendSpaceMotion::new("a", Vec2::new(0.0, 0.0)),
        BlendSpaceMotion::new("b", Vec2::new(1.0, 0.0)),
        BlendSpaceMotion::new("c", Vec2::new(1.0, 1.0)),
        BlendSpaceMotion::new("d", Vec2::new(0.0, 1.0)),
    ]
}

fn square_set() -> Arc<InMemoryMotionSet> {
    Arc::new(
        ["a", "b", "c", "d", "e"]
            .into_iter()
            .fold(InMemoryMotionSet::new(), |set, id| set.with(KeyframedMotion::new(id, 1.0))),
    )
}

#[test]
fn one_d_query_between_samples() {
    let graph = one_d(locomotion_settings());
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), locomotion_set());

    instance.set_parameter("speed", 7.0);
    evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");

    let weights = weights(&graph, &instance);
    assert_eq!(weights.len(), 2);
    assert_eq!(weights[0].0, "walk");
    assert!((weights[0].1 - 0.6).abs() < 1e-5);
    assert_eq!(weights[1].0, "run");
    assert!((weights[1].1 - 0.4).abs() < 1e-5);
}

#[test]
fn one_d_query_below_range_snaps_to_first_sample() {
    let graph = one_d(locomotion_settings());
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), locomotion_set());

    instance.set_parameter("speed", -3.0);
    evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");

    assert_eq!(weights(&graph, &instance), vec![("idle".to_owned(), 1.0)]);
    let root = graph.root_node().expect("root");
    let data = instance.unique_data(root.id()).expect("unique data");
    assert_eq!(data.location, CurrentLocation::Point { sample: 0 });
}

#[test]
fn two_d_square_center_is_inside_a_triangle() {
    let graph = square_graph(square_motions());
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), square_set());

    instance.set_parameter("x", 0.5);
    instance.set_parameter("y", 0.5);
    evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");

    let root = graph.root_node().expect("root");
    let data = instance.unique_data(root.id()).expect("unique data");
    let CurrentLocation::Triangle { weights, .. } = data.location else {
        panic!("expected a triangle, got {:?}", data.location);
    };
    assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
    assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-5);

    instance.set_parameter("x", 0.4);
    instance.set_parameter("y", 0.3);
    evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");
    let data = instance.unique_data(root.id()).expect("unique data");
    let CurrentLocation::Triangle { weights, .. } = data.location else {
        panic!("expected a triangle, got {:?}", data.location);
    };
    assert!(weights.iter().all(|w| *w > 0.0));
}

#[test]
fn outside_query_never_reports_containment() {
    let graph = square_graph(square_motions());
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), square_set());

    for (x, y) in [(2.0, 0.5), (-1.0, -1.0), (0.5, 4.0), (-0.2, 0.7)] {
        instance.set_parameter("x", x);
        instance.set_parameter("y", y);
        evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");
        let root = graph.root_node().expect("root");
        let data = instance.unique_data(root.id()).expect("unique data");
        assert!(matches!(data.location, CurrentLocation::Edge { .. }), "({x}, {y}) gave {:?}", data.location);
        let total: f32 = data.blend_infos.iter().map(|bi| bi.weight).sum();
        assert!((total - 1.0).abs() < 1e-5);
    }
}

#[test]
fn missing_motion_is_excluded_from_geometry() {
    let mut motions = square_motions();
    motions.push(BlendSpaceMotion::new("missing", Vec2::new(0.5, 2.0)));
    let graph = square_graph(motions);
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), square_set());

    instance.set_parameter("x", 0.25);
    instance.set_parameter("y", 0.5);
    evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");

    let root = graph.root_node().expect("root");
    let data = instance.unique_data(root.id()).expect("unique data");
    assert_eq!(data.motion_infos.len(), 4);
    assert_eq!(data.triangles.len(), 2);
    assert_eq!(data.issues.len(), 1);
    assert!(data.weights().iter().all(|(id, _)| id != "missing"));
}

#[test]
fn disabled_node_outputs_the_bind_pose() {
    let bind = vec![
        Transform::from_translation(Vec3::new(0.0, 0.0, 1.0)),
        Transform::from_translation(Vec3::new(0.0, 0.5, 0.0)),
    ];
    let skeleton = Skeleton::new(vec![Joint::new("root", None), Joint::new("spine", Some(0))], bind.clone())
        .expect("skeleton");
    let set = Arc::new(
        InMemoryMotionSet::new().with(
            KeyframedMotion::new("wave", 1.0).with_track(
                JointTrack::new(1).with_rotation(Channel::constant(Quat::from_rotation_x(1.0))),
            ),
        ),
    );

    let mut graph = one_d(BlendSpaceSettings {
        motions: vec![BlendSpaceMotion::at_x("wave", 0.0)],
        ..BlendSpaceSettings::default()
    });
    let id = graph.root().expect("root id");
    graph.node_mut(id).expect("node").set_disabled(true);

    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(skeleton), set);
    let output = evaluate_frame(&graph, &mut instance, &ctx, 0.1).expect("frame");
    assert_eq!(output.pose.transforms(), bind.as_slice());
}

#[test]
fn blended_rotations_stay_unit_length() {
    let set = Arc::new(
        InMemoryMotionSet::new()
            .with(
                KeyframedMotion::new("turn", 1.0)
                    .with_track(JointTrack::new(1).with_rotation(Channel::constant(Quat::from_rotation_z(1.2)))),
            )
            .with(
                KeyframedMotion::new("nod", 1.0)
                    .with_track(JointTrack::new(1).with_rotation(Channel::constant(Quat::from_rotation_x(-2.5)))),
            ),
    );
    let graph = one_d(BlendSpaceSettings {
        motions: vec![BlendSpaceMotion::at_x("turn", 0.0), BlendSpaceMotion::at_x("nod", 1.0)],
        ..BlendSpaceSettings::default()
    });
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(3)), set);

    for speed in [0.1, 0.35, 0.5, 0.8] {
        instance.set_parameter("speed", speed);
        let output = evaluate_frame(&graph, &mut instance, &ctx, 1.0 / 60.0).expect("frame");
        for transform in output.pose.transforms() {
            assert!((transform.rotation.length() - 1.0).abs() < 1e-4);
        }
    }
}

#[test]
fn location_is_idempotent() {
    let graph = square_graph(square_motions());
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), square_set());
    instance.set_parameter("x", 0.3);
    instance.set_parameter("y", 0.9);
    let root = graph.root_node().expect("root");

    evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");
    let first = instance.unique_data(root.id()).expect("unique data").location;
    evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");
    let second = instance.unique_data(root.id()).expect("unique data").location;
    assert_eq!(first, second);
}

#[test]
fn clip_sync_keeps_follower_phase_with_leader() {
    let graph = one_d(BlendSpaceSettings {
        motions: vec![BlendSpaceMotion::at_x("walk", 0.0), BlendSpaceMotion::at_x("run", 1.0)],
        sync_mode: SyncMode::ClipBased,
        sync_leader: Some("walk".to_owned()),
        ..BlendSpaceSettings::default()
    });
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), locomotion_set());
    instance.set_parameter("speed", 0.4);
    let root = graph.root_node().expect("root");

    for _ in 0..40 {
        evaluate_frame(&graph, &mut instance, &ctx, 1.0 / 30.0).expect("frame");
        let data = instance.unique_data(root.id()).expect("unique data");
        let leader = data.motion_infos[0].instance.normalized_time();
        let follower = data.motion_infos[1].instance.normalized_time();
        assert!((leader - follower).abs() < 1e-4, "{leader} vs {follower}");
    }
}

#[test]
fn clip_sync_keeps_every_motion_in_phase_across_segments() {
    let graph = one_d(BlendSpaceSettings {
        sync_mode: SyncMode::ClipBased,
        ..locomotion_settings()
    });
    let set = Arc::new(
        InMemoryMotionSet::new()
            .with(KeyframedMotion::new("idle", 2.0))
            .with(KeyframedMotion::new("walk", 1.0))
            .with(KeyframedMotion::new("run", 0.3)),
    );
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), set);
    let root = graph.root_node().expect("root");

    // Idle/walk first, then walk/run, then run alone.
    let speeds = std::iter::repeat_n(2.0, 13)
        .chain(std::iter::repeat_n(7.0, 10))
        .chain(std::iter::repeat_n(10.0, 10));
    for speed in speeds {
        instance.set_parameter("speed", speed);
        evaluate_frame(&graph, &mut instance, &ctx, 1.0 / 30.0).expect("frame");

        let data = instance.unique_data(root.id()).expect("unique data");
        assert_eq!(data.leader, Some(0));
        let leader = data.motion_infos[0].instance.normalized_time();
        for info in &data.motion_infos[1..] {
            let diff = (info.instance.normalized_time() - leader).abs();
            assert!(diff.min(1.0 - diff) < 1e-4, "{} at speed {speed}: {diff}", info.motion_id);
        }
    }
}

#[test]
fn rewind_resets_playback() {
    let graph = one_d(locomotion_settings());
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), locomotion_set());
    instance.set_parameter("speed", 2.0);
    for _ in 0..5 {
        evaluate_frame(&graph, &mut instance, &ctx, 0.07).expect("frame");
    }

    frame::rewind(&graph, &mut instance);
    let root = graph.root_node().expect("root");
    let data = instance.unique_data(root.id()).expect("unique data");
    assert!(data.motion_infos.iter().all(|info| info.instance.current_time() == 0.0));
    assert!(data.motion_infos.iter().all(|info| info.instance.sync_index().is_none()));
}

#[test]
fn removing_an_instance_returns_pooled_objects() {
    let graph = one_d(locomotion_settings());
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(4)), locomotion_set());
    instance.set_parameter("speed", 6.0);
    evaluate_frame(&graph, &mut instance, &ctx, 0.1).expect("frame");

    assert_eq!(ctx.motion_pool().live_count(), 3);
    assert_eq!(ctx.pose_pool().live_count(), 0);

    graph.remove_instance(instance);
    assert_eq!(ctx.motion_pool().live_count(), 0);
}

#[test]
fn most_active_filter_only_emits_from_heaviest_motion() {
    let set = Arc::new(
        InMemoryMotionSet::new()
            .with(KeyframedMotion::new("walk", 1.0).with_events(vec![MotionEvent::new(0.05, "walk_step")]))
            .with(KeyframedMotion::new("run", 1.0).with_events(vec![MotionEvent::new(0.05, "run_step")])),
    );
    let graph = one_d(BlendSpaceSettings {
        motions: vec![BlendSpaceMotion::at_x("walk", 0.0), BlendSpaceMotion::at_x("run", 1.0)],
        event_filter_mode: EventFilterMode::MostActiveMotion,
        ..BlendSpaceSettings::default()
    });
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), set);
    instance.set_parameter("speed", 0.3);

    let output = evaluate_frame(&graph, &mut instance, &ctx, 0.1).expect("frame");
    let names: Vec<_> = output.events.iter().map(|event| event.name.as_str()).collect();
    assert_eq!(names, ["walk_step"]);
    assert!((output.events.events()[0].weight - 0.7).abs() < 1e-5);
}

#[test]
fn in_place_removes_root_travel() {
    let set = Arc::new(
        InMemoryMotionSet::new().with(KeyframedMotion::locomotion("walk", 1.0, Vec3::new(0.0, 1.5, 0.0), 0.0)),
    );
    let mut graph = one_d(BlendSpaceSettings {
        motions: vec![BlendSpaceMotion::at_x("walk", 0.0)],
        ..BlendSpaceSettings::default()
    });
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), set);

    let moving = evaluate_frame(&graph, &mut instance, &ctx, 0.5).expect("frame");
    let moved = moving.pose.transforms()[0].translation;
    assert!((moved.y - 0.75).abs() < 1e-4);
    assert!((moving.trajectory_delta.translation.y - 0.75).abs() < 1e-4);

    let id = graph.root().expect("root id");
    graph.node_mut(id).expect("node").set_in_place(true);
    let in_place = evaluate_frame(&graph, &mut instance, &ctx, 0.1).expect("frame");
    assert!(in_place.pose.transforms()[0].translation.truncate().length() < 1e-4);
}

#[test]
fn xml_definitions_drive_a_graph() {
    let xml = r#"<blendspaces>
  <blendspace2d name="Strafe">
    <x-axis parameter="x"/>
    <y-axis parameter="y"/>
    <motion id="a" x="0" y="0"/>
    <motion id="b" x="1" y="0"/>
    <motion id="c" x="1" y="1"/>
    <motion id="d" x="0" y="1"/>
  </blendspace2d>
</blendspaces>"#;
    let graph = blend_space_xml::parse_graph(xml).expect("graph parsed");
    let ctx = AnimGraphContext::default();
    let mut instance = ctx.create_instance(Arc::new(Skeleton::chain(1)), square_set());
    instance.set_parameter("x", 1.0);
    instance.set_parameter("y", 0.0);
    evaluate_frame(&graph, &mut instance, &ctx, 0.0).expect("frame");

    let root = graph.root_node().expect("root");
    let data = instance.unique_data(root.id()).expect("unique data");
    assert!((data.weight_of("b") - 1.0).abs() < 1e-4);
    assert_eq!(data.triangles.len(), 2);
}
