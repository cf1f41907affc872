use vizij_rig_core::expression::{ChannelPath, DriverVariable, TransformChannel};
use vizij_rig_core::host::BoundVariable;
use vizij_rig_core::ids::{BoneId, DriverId};
use vizij_rig_core::math::Axis;
use vizij_rig_core::relation::ConstraintSpec;
use vizij_rig_core::scene::BoneSpec;
use vizij_rig_core::{
    apply_relations, ConstraintKind, Diagnostic, FaceRole, InMemoryScene, MappingRelation,
    MarkerObject, ObjectId, PoseBone, Relation, RigHost,
};

/// Counts host calls by kind and forwards them to an in-memory scene.
#[derive(Default)]
struct CountingHost {
    scene: InMemoryScene,
    driver_calls: usize,
    expression_calls: usize,
    constraint_calls: usize,
}

impl RigHost for CountingHost {
    fn create_empty(&mut self, name: &str, size: f64) -> ObjectId {
        self.scene.create_empty(name, size)
    }

    fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.scene.object_by_name(name)
    }

    fn objects(&self) -> Vec<MarkerObject> {
        self.scene.objects()
    }

    fn add_to_collection(&mut self, collection: &str, objects: &[ObjectId]) {
        self.scene.add_to_collection(collection, objects)
    }

    fn pose_bones(&self, armature: ObjectId) -> Vec<PoseBone> {
        self.scene.pose_bones(armature)
    }

    fn add_driver(&mut self, object: ObjectId, channel: TransformChannel, axis: Axis) -> DriverId {
        self.driver_calls += 1;
        self.scene.add_driver(object, channel, axis)
    }

    fn set_expression(&mut self, driver: DriverId, expression: &str, variables: &[BoundVariable]) {
        self.expression_calls += 1;
        self.scene.set_expression(driver, expression, variables)
    }

    fn add_constraint(
        &mut self,
        armature: ObjectId,
        bone: BoneId,
        source: ObjectId,
        kind: ConstraintKind,
    ) {
        self.constraint_calls += 1;
        self.scene.add_constraint(armature, bone, source, kind)
    }

    fn insert_keyframe(
        &mut self,
        object: ObjectId,
        channel: TransformChannel,
        value: [f64; 3],
        frame: i32,
    ) {
        self.scene.insert_keyframe(object, channel, value, frame)
    }
}

fn host_with(markers: &[&str]) -> (CountingHost, ObjectId) {
    let mut host = CountingHost::default();
    let armature = host.scene.add_armature(
        "rig",
        &[BoneSpec {
            name: "lip.T".into(),
            head: [0.0, -0.125, 1.5625],
            tail: [0.0, -0.15625, 1.5625],
        }],
    );
    for name in markers {
        host.create_empty(name, 0.025);
    }
    (host, armature)
}

fn marker(host: &CountingHost, name: &str) -> MarkerObject {
    let id = host.object_by_name(name).expect("marker");
    MarkerObject::new(id, name)
}

#[test]
fn constraint_relations_never_touch_drivers() {
    let (mut host, armature) = host_with(&["face_mouth_t"]);
    let relation = MappingRelation {
        source: marker(&host, "face_mouth_t"),
        relation: Relation::Constraint(ConstraintSpec::new(
            "lip.T",
            ConstraintKind::CopyLocationOffset,
        )),
    };
    let report = apply_relations(&mut host, "face", armature, &[relation]);

    assert_eq!(report.constraints, 1);
    assert_eq!(report.drivers, 0);
    assert_eq!(host.constraint_calls, 1);
    assert_eq!(host.driver_calls, 0);
    assert_eq!(host.expression_calls, 0);

    let record = &host.scene.constraints[0];
    assert_eq!(host.scene.bone_name(armature, record.bone), Some("lip.T"));
    assert_eq!(record.kind, ConstraintKind::CopyLocationOffset);
}

#[test]
fn driver_relations_never_touch_constraints() {
    let (mut host, armature) = host_with(&["face_mouth", "face_mouth_t"]);
    let relation = MappingRelation {
        source: marker(&host, "face_mouth"),
        relation: Relation::FaceDriver(FaceRole::MouthUp.attribute(
            "face_mouth_t",
            "face_mouth",
            0.03125,
        )),
    };
    let report = apply_relations(&mut host, "face", armature, &[relation]);

    assert_eq!(report.drivers, 1);
    assert_eq!(host.driver_calls, 1);
    assert_eq!(host.expression_calls, 1);
    assert_eq!(host.constraint_calls, 0);

    let drivers = host.scene.drivers_on("face_mouth_t");
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0].axis, Axis::Z);
    assert_eq!(drivers[0].channel, TransformChannel::Location);
    assert_eq!(drivers[0].expression, "(0.03125*.3*(var))");
    assert_eq!(drivers[0].variables[0].object, host.object_by_name("face_mouth").unwrap());
    assert_eq!(
        drivers[0].variables[0].path,
        ChannelPath::new(TransformChannel::Scale, Axis::Z)
    );
}

#[test]
fn missing_target_is_skipped_and_reported() {
    let (mut host, armature) = host_with(&["face_mouth"]);
    let relation = MappingRelation {
        source: marker(&host, "face_mouth"),
        relation: Relation::FaceDriver(FaceRole::MouthUp.attribute(
            "face_mouth_t",
            "face_mouth",
            0.03125,
        )),
    };
    let report = apply_relations(&mut host, "face", armature, &[relation]);

    assert_eq!(report.drivers, 0);
    assert_eq!(host.driver_calls, 0);
    assert_eq!(report.skipped, vec![Diagnostic::missing_marker("face", "face_mouth_t")]);
}

#[test]
fn missing_variable_object_leaves_no_partial_driver() {
    let (mut host, armature) = host_with(&["head", "target"]);
    let mut attr = FaceRole::EyeUp.attribute("target", "head", 1.0);
    // second axis reads from an object that does not exist
    let mut extra = attr.axes[2].clone().unwrap();
    extra.variables = vec![DriverVariable::new(
        "var",
        "ghost",
        ChannelPath::new(TransformChannel::Scale, Axis::Y),
    )];
    attr.axes[1] = Some(extra);

    let relation = MappingRelation {
        source: marker(&host, "head"),
        relation: Relation::FaceDriver(attr),
    };
    let report = apply_relations(&mut host, "face", armature, &[relation]);

    assert_eq!(host.driver_calls, 0);
    assert!(host.scene.drivers.is_empty());
    assert_eq!(report.skipped, vec![Diagnostic::missing_marker("face", "ghost")]);
}

#[test]
fn missing_bone_is_skipped_and_reported() {
    let (mut host, armature) = host_with(&["face_chin"]);
    let relation = MappingRelation {
        source: marker(&host, "face_chin"),
        relation: Relation::Constraint(ConstraintSpec::new(
            "jaw_master",
            ConstraintKind::CopyRotation,
        )),
    };
    let report = apply_relations(&mut host, "face", armature, &[relation]);

    assert_eq!(report.constraints, 0);
    assert_eq!(host.constraint_calls, 0);
    assert_eq!(report.skipped, vec![Diagnostic::missing_bone("face", "jaw_master")]);
}

#[test]
fn constraint_source_must_be_a_live_object() {
    let (mut host, armature) = host_with(&[]);
    let relation = MappingRelation {
        source: MarkerObject::new(ObjectId(999), "face_chin"),
        relation: Relation::Constraint(ConstraintSpec::new(
            "lip.T",
            ConstraintKind::CopyRotation,
        )),
    };
    let report = apply_relations(&mut host, "face", armature, &[relation]);

    assert_eq!(report.constraints, 0);
    assert_eq!(host.constraint_calls, 0);
    assert!(host.scene.constraints.is_empty());
    assert_eq!(report.skipped, vec![Diagnostic::missing_marker("face", "face_chin")]);
}

#[test]
fn stale_source_handle_is_replaced_by_the_live_one() {
    let (mut host, armature) = host_with(&["face_mouth_t"]);
    let live = host.object_by_name("face_mouth_t").unwrap();
    let relation = MappingRelation {
        source: MarkerObject::new(ObjectId(999), "face_mouth_t"),
        relation: Relation::Constraint(ConstraintSpec::new(
            "lip.T",
            ConstraintKind::CopyLocationOffset,
        )),
    };
    let report = apply_relations(&mut host, "face", armature, &[relation]);

    assert_eq!(report.constraints, 1);
    assert_eq!(host.scene.constraints[0].source, live);
}

#[test]
fn driver_source_must_be_a_live_object() {
    let (mut host, armature) = host_with(&["face_mouth", "face_mouth_t"]);
    let relation = MappingRelation {
        source: MarkerObject::new(ObjectId(999), "face_mouth_gone"),
        relation: Relation::FaceDriver(FaceRole::MouthUp.attribute(
            "face_mouth_t",
            "face_mouth",
            0.03125,
        )),
    };
    let report = apply_relations(&mut host, "face", armature, &[relation]);

    assert_eq!(report.drivers, 0);
    assert_eq!(host.driver_calls, 0);
    assert_eq!(
        report.skipped,
        vec![Diagnostic::missing_marker("face", "face_mouth_gone")]
    );
}
