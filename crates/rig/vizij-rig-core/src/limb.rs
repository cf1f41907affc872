//! Limb drivers: place IK target markers from detected joint segments.
//!
//! A [`LimbDriver`] pairs one detected segment (two landmark markers) with the
//! matching rig segment (two pose bones). Its target marker's location is
//!
//! ```text
//! anchor + (head - tail) / length * rig_length
//! ```
//!
//! per axis, where `head`/`tail` are the detected joint locations, `length` is
//! the average detected limb length (keyframed as `scale.z` on the wrist
//! markers by the pose assignment) and `rig_length` is the distance between the
//! two rig bone heads. The anchor is the offset bone's head when one is
//! configured, the origin marker's location otherwise, so chained targets
//! (shoulder → forearm → hand) follow each other.

use hashbrown::HashMap;

use crate::error::RigError;
use crate::expression::{
    Anchor, AxisDriver, ChannelPath, DriverAttribute, DriverVariable, Formula, TransformChannel,
    HEAD_VAR, LENGTH_VAR, ORIGIN_VAR, TAIL_VAR,
};
use crate::host::PoseBone;
use crate::math::{vector_distance, Axis};

/// Static description of one limb segment.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LimbChain {
    /// Marker placed by the driver.
    pub target: &'static str,
    /// Marker the segment starts from.
    pub origin: &'static str,
    /// Detected joint pair (tail, head).
    pub detected: [&'static str; 2],
    /// Rig bones whose heads bound the segment.
    pub rig: [&'static str; 2],
    pub offset_bone: Option<&'static str>,
    /// Marker carrying the average detected limb length in `scale.z`.
    pub length_source: &'static str,
}

/// Driver definitions feeding one marker.
#[derive(Clone, Debug, PartialEq)]
pub struct PoseDriver {
    /// Marker that must exist for the definitions to be registered.
    pub name: String,
    pub expressions: Vec<DriverAttribute>,
}

#[derive(Clone, Debug)]
pub struct LimbDriver {
    pub chain: LimbChain,
    pub pose_drivers: Vec<PoseDriver>,
}

impl LimbDriver {
    pub fn new(chain: LimbChain) -> Self {
        Self {
            chain,
            pose_drivers: Vec::new(),
        }
    }

    /// Compute and cache the pose driver for this segment.
    ///
    /// Fails with [`RigError::MissingBone`] when a rig or offset bone is absent;
    /// the cached drivers are cleared in that case.
    pub fn set_expressions(&mut self, bones: &HashMap<&str, &PoseBone>) -> Result<(), RigError> {
        self.pose_drivers.clear();
        let bone = |name: &str| {
            bones.get(name).copied().ok_or_else(|| RigError::MissingBone {
                bone: name.to_string(),
            })
        };

        let [tail_bone, head_bone] = self.chain.rig;
        let rig_length = vector_distance(&bone(tail_bone)?.head, &bone(head_bone)?.head);
        let offset = match self.chain.offset_bone {
            Some(name) => Some(bone(name)?.head),
            None => None,
        };

        let [tail, head] = self.chain.detected;
        let axes = Axis::ALL.map(|axis| {
            let location = ChannelPath::new(TransformChannel::Location, axis);
            let mut variables = vec![
                DriverVariable::new(HEAD_VAR, head, location),
                DriverVariable::new(TAIL_VAR, tail, location),
                DriverVariable::new(
                    LENGTH_VAR,
                    self.chain.length_source,
                    ChannelPath::new(TransformChannel::Scale, Axis::Z),
                ),
            ];
            let anchor = match offset {
                Some(at) => Anchor::Constant(at[axis.index()]),
                None => {
                    variables.push(DriverVariable::new(ORIGIN_VAR, self.chain.origin, location));
                    Anchor::Variable
                }
            };
            Some(AxisDriver {
                variables,
                formula: Formula::Segment { anchor, rig_length },
            })
        });

        self.pose_drivers.push(PoseDriver {
            name: head.to_string(),
            expressions: vec![DriverAttribute {
                target: self.chain.target.to_string(),
                channel: TransformChannel::Location,
                axes,
            }],
        });
        Ok(())
    }
}
