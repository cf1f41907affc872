//! In-memory [`RigHost`] that records every call.
//!
//! Used by tests, benches and headless tools. Objects are looked up by name
//! with the first match winning; creating an object whose name is taken gets a
//! `.001`-style suffix.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::expression::TransformChannel;
use crate::host::{BoundVariable, ConstraintKind, MarkerObject, PoseBone, RigHost};
use crate::ids::{BoneId, DriverId, IdAllocator, ObjectId};
use crate::math::{Axis, Vec3};

#[derive(Clone, Debug, PartialEq)]
pub enum ObjectKind {
    Empty { size: f64 },
    Armature,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub kind: ObjectKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DriverRecord {
    pub id: DriverId,
    pub object: ObjectId,
    pub channel: TransformChannel,
    pub axis: Axis,
    pub expression: String,
    pub variables: Vec<BoundVariable>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConstraintRecord {
    pub armature: ObjectId,
    pub bone: BoneId,
    pub source: ObjectId,
    pub kind: ConstraintKind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Keyframe {
    pub object: ObjectId,
    pub channel: TransformChannel,
    pub value: [f64; 3],
    pub frame: i32,
}

/// Bone layout as stored in rig fixtures.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoneSpec {
    pub name: String,
    pub head: [f64; 3],
    pub tail: [f64; 3],
}

/// An armature plus the marker empties present before a build.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigLayout {
    pub armature: String,
    pub bones: Vec<BoneSpec>,
    pub markers: Vec<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryScene {
    ids: IdAllocator,
    objects: Vec<SceneObject>,
    bones: HashMap<ObjectId, Vec<PoseBone>>,
    collections: HashMap<String, Vec<ObjectId>>,
    pub drivers: Vec<DriverRecord>,
    pub constraints: Vec<ConstraintRecord>,
    pub keyframes: Vec<Keyframe>,
}

impl InMemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scene holding `layout`'s armature and marker empties. Returns the
    /// armature handle alongside.
    pub fn from_layout(layout: &RigLayout) -> (Self, ObjectId) {
        let mut scene = Self::new();
        let armature = scene.add_armature(&layout.armature, &layout.bones);
        for name in &layout.markers {
            scene.create_empty(name, 0.025);
        }
        (scene, armature)
    }

    pub fn add_armature(&mut self, name: &str, bones: &[BoneSpec]) -> ObjectId {
        let id = self.insert_object(name, ObjectKind::Armature);
        let pose_bones = bones
            .iter()
            .map(|b| PoseBone {
                id: self.ids.alloc(),
                name: b.name.clone(),
                head: Vec3::from(b.head),
                tail: Vec3::from(b.tail),
            })
            .collect();
        self.bones.insert(id, pose_bones);
        id
    }

    fn insert_object(&mut self, name: &str, kind: ObjectKind) -> ObjectId {
        let id = self.ids.alloc();
        let name = self.unique_name(name);
        self.objects.push(SceneObject { id, name, kind });
        id
    }

    fn unique_name(&self, name: &str) -> String {
        if self.object_by_name(name).is_none() {
            return name.to_string();
        }
        (1..)
            .map(|n| format!("{name}.{n:03}"))
            .find(|candidate| self.object_by_name(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    pub fn object(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn name_of(&self, id: ObjectId) -> Option<&str> {
        self.object(id).map(|o| o.name.as_str())
    }

    pub fn collection(&self, name: &str) -> &[ObjectId] {
        self.collections.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bone_name(&self, armature: ObjectId, bone: BoneId) -> Option<&str> {
        self.bones
            .get(&armature)?
            .iter()
            .find(|b| b.id == bone)
            .map(|b| b.name.as_str())
    }

    /// Drivers installed on the object called `target`.
    pub fn drivers_on(&self, target: &str) -> Vec<&DriverRecord> {
        let Some(id) = self.object_by_name(target) else {
            return Vec::new();
        };
        self.drivers.iter().filter(|d| d.object == id).collect()
    }

    /// Keyframes of `channel` on the object called `name`, in insertion order.
    pub fn keyframes_for(&self, name: &str, channel: TransformChannel) -> Vec<&Keyframe> {
        let Some(id) = self.object_by_name(name) else {
            return Vec::new();
        };
        self.keyframes
            .iter()
            .filter(|k| k.object == id && k.channel == channel)
            .collect()
    }
}

impl RigHost for InMemoryScene {
    fn create_empty(&mut self, name: &str, size: f64) -> ObjectId {
        self.insert_object(name, ObjectKind::Empty { size })
    }

    fn object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects.iter().find(|o| o.name == name).map(|o| o.id)
    }

    fn objects(&self) -> Vec<MarkerObject> {
        self.objects
            .iter()
            .map(|o| MarkerObject::new(o.id, o.name.clone()))
            .collect()
    }

    fn add_to_collection(&mut self, collection: &str, objects: &[ObjectId]) {
        let members = self.collections.entry(collection.to_string()).or_default();
        for id in objects {
            if !members.contains(id) {
                members.push(*id);
            }
        }
    }

    fn pose_bones(&self, armature: ObjectId) -> Vec<PoseBone> {
        self.bones.get(&armature).cloned().unwrap_or_default()
    }

    fn add_driver(&mut self, object: ObjectId, channel: TransformChannel, axis: Axis) -> DriverId {
        let id = self.ids.alloc();
        self.drivers.push(DriverRecord {
            id,
            object,
            channel,
            axis,
            expression: String::new(),
            variables: Vec::new(),
        });
        id
    }

    fn set_expression(&mut self, driver: DriverId, expression: &str, variables: &[BoundVariable]) {
        if let Some(record) = self.drivers.iter_mut().find(|d| d.id == driver) {
            record.expression = expression.to_string();
            record.variables = variables.to_vec();
        }
    }

    fn add_constraint(
        &mut self,
        armature: ObjectId,
        bone: BoneId,
        source: ObjectId,
        kind: ConstraintKind,
    ) {
        self.constraints.push(ConstraintRecord {
            armature,
            bone,
            source,
            kind,
        });
    }

    fn insert_keyframe(
        &mut self,
        object: ObjectId,
        channel: TransformChannel,
        value: [f64; 3],
        frame: i32,
    ) {
        self.keyframes.push(Keyframe {
            object,
            channel,
            value,
            frame,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colliding_names_get_suffixed() {
        let mut scene = InMemoryScene::new();
        let a = scene.create_empty("marker", 0.1);
        let b = scene.create_empty("marker", 0.1);
        assert_eq!(scene.name_of(a), Some("marker"));
        assert_eq!(scene.name_of(b), Some("marker.001"));
        assert_eq!(scene.object_by_name("marker"), Some(a));
    }

    #[test]
    fn armature_bones_are_listed() {
        let mut scene = InMemoryScene::new();
        let arm = scene.add_armature(
            "rig",
            &[BoneSpec {
                name: "torso".into(),
                head: [0.0, 0.0, 1.0],
                tail: [0.0, 0.0, 1.5],
            }],
        );
        let bones = scene.pose_bones(arm);
        assert_eq!(bones.len(), 1);
        assert_eq!(bones[0].head, Vec3::new(0.0, 0.0, 1.0));
        assert!(scene.pose_bones(ObjectId(99)).is_empty());
    }
}
