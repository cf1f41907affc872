//! Collaborator interface consumed by the core.
//!
//! Hosts (a DCC plugin bridge, the in-memory scene, a game engine adapter)
//! implement [`RigHost`]. The core only creates objects, reads pose bones,
//! and installs drivers, constraints and keyframes through it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RigError;
use crate::expression::{ChannelPath, TransformChannel};
use crate::ids::{BoneId, DriverId, ObjectId};
use crate::math::{Axis, Vec3};

/// A live scene object referenced by name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerObject {
    pub id: ObjectId,
    pub name: String,
}

impl MarkerObject {
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Pose bone snapshot in armature space.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseBone {
    pub id: BoneId,
    pub name: String,
    pub head: Vec3,
    pub tail: Vec3,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ConstraintKind {
    #[serde(rename = "COPY_LOCATION")]
    CopyLocation,
    #[serde(rename = "COPY_LOCATION_OFFSET")]
    CopyLocationOffset,
    #[serde(rename = "COPY_ROTATION")]
    CopyRotation,
    #[serde(rename = "COPY_ROTATION_WORLD")]
    CopyRotationWorld,
    #[serde(rename = "DAMPED_TRACK")]
    DampedTrack,
}

impl ConstraintKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::CopyLocation => "COPY_LOCATION",
            ConstraintKind::CopyLocationOffset => "COPY_LOCATION_OFFSET",
            ConstraintKind::CopyRotation => "COPY_ROTATION",
            ConstraintKind::CopyRotationWorld => "COPY_ROTATION_WORLD",
            ConstraintKind::DampedTrack => "DAMPED_TRACK",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConstraintKind {
    type Err = RigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "COPY_LOCATION" => ConstraintKind::CopyLocation,
            "COPY_LOCATION_OFFSET" => ConstraintKind::CopyLocationOffset,
            "COPY_ROTATION" => ConstraintKind::CopyRotation,
            "COPY_ROTATION_WORLD" => ConstraintKind::CopyRotationWorld,
            "DAMPED_TRACK" => ConstraintKind::DampedTrack,
            other => {
                return Err(RigError::Configuration {
                    role: other.to_string(),
                })
            }
        })
    }
}

/// A driver variable after its object name was resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoundVariable {
    pub name: String,
    pub object: ObjectId,
    pub path: ChannelPath,
}

/// Scene services the rig core depends on.
pub trait RigHost {
    /// Create an empty object; the host may rename it on collision.
    fn create_empty(&mut self, name: &str, size: f64) -> ObjectId;

    fn object_by_name(&self, name: &str) -> Option<ObjectId>;

    /// All live objects, used to build name indices once per pass.
    fn objects(&self) -> Vec<MarkerObject>;

    fn add_to_collection(&mut self, collection: &str, objects: &[ObjectId]);

    /// Pose bones of `armature`; empty when the object is not an armature.
    fn pose_bones(&self, armature: ObjectId) -> Vec<PoseBone>;

    fn add_driver(&mut self, object: ObjectId, channel: TransformChannel, axis: Axis) -> DriverId;

    fn set_expression(&mut self, driver: DriverId, expression: &str, variables: &[BoundVariable]);

    fn add_constraint(
        &mut self,
        armature: ObjectId,
        bone: BoneId,
        source: ObjectId,
        kind: ConstraintKind,
    );

    fn insert_keyframe(
        &mut self,
        object: ObjectId,
        channel: TransformChannel,
        value: [f64; 3],
        frame: i32,
    );
}
