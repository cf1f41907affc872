//! Arm rig: IK target drivers and body constraints.
//!
//! Detected left-side landmarks drive `.R` rig bones and vice versa; the rig is
//! expected to face the tracked subject.

use hashbrown::HashMap;
use log::warn;

use super::RigAdapter;
use crate::error::{Diagnostic, RigError};
use crate::host::{ConstraintKind, PoseBone, RigHost};
use crate::ids::ObjectId;
use crate::limb::{LimbChain, LimbDriver};
use crate::naming::pose::*;
use crate::relation::{ConstraintSpec, DriverFamily, RoleMapping};

pub const REGION: &str = "pose";

/// Marker → (pose bone, constraint kind).
pub const POSE_CONSTRAINTS: [(&str, &str, ConstraintKind); 8] = [
    (HIP_CENTER, "torso", ConstraintKind::CopyRotation),
    (SHOULDER_CENTER, "chest", ConstraintKind::CopyRotation),
    (LEFT_HAND_IK, "hand_ik.R", ConstraintKind::CopyLocation),
    (RIGHT_HAND_IK, "hand_ik.L", ConstraintKind::CopyLocation),
    (LEFT_FOREARM_IK, "forearm_tweak.R", ConstraintKind::CopyLocation),
    (RIGHT_FOREARM_IK, "forearm_tweak.L", ConstraintKind::CopyLocation),
    (LEFT_INDEX_IK, "hand_ik.R", ConstraintKind::DampedTrack),
    (RIGHT_INDEX_IK, "hand_ik.L", ConstraintKind::DampedTrack),
];

pub const ARM_CHAINS: [LimbChain; 6] = [
    LimbChain {
        target: LEFT_FOREARM_IK,
        origin: LEFT_SHOULDER,
        detected: [LEFT_SHOULDER, LEFT_ELBOW],
        rig: ["upper_arm_fk.R", "forearm_fk.R"],
        offset_bone: Some("upper_arm_fk.R"),
        length_source: LEFT_WRIST,
    },
    LimbChain {
        target: LEFT_HAND_IK,
        origin: LEFT_FOREARM_IK,
        detected: [LEFT_ELBOW, LEFT_WRIST],
        rig: ["forearm_fk.R", "hand_fk.R"],
        offset_bone: None,
        length_source: LEFT_WRIST,
    },
    LimbChain {
        target: LEFT_INDEX_IK,
        origin: LEFT_HAND_IK,
        detected: [LEFT_WRIST, LEFT_INDEX],
        rig: ["hand_fk.R", "f_middle.01_master.R"],
        offset_bone: None,
        length_source: LEFT_WRIST,
    },
    LimbChain {
        target: RIGHT_FOREARM_IK,
        origin: RIGHT_SHOULDER,
        detected: [RIGHT_SHOULDER, RIGHT_ELBOW],
        rig: ["upper_arm_fk.L", "forearm_fk.L"],
        offset_bone: Some("upper_arm_fk.L"),
        length_source: RIGHT_WRIST,
    },
    LimbChain {
        target: RIGHT_HAND_IK,
        origin: RIGHT_FOREARM_IK,
        detected: [RIGHT_ELBOW, RIGHT_WRIST],
        rig: ["forearm_fk.L", "hand_fk.L"],
        offset_bone: None,
        length_source: RIGHT_WRIST,
    },
    LimbChain {
        target: RIGHT_INDEX_IK,
        origin: RIGHT_HAND_IK,
        detected: [RIGHT_WRIST, RIGHT_INDEX],
        rig: ["hand_fk.L", "f_middle.01_master.L"],
        offset_bone: None,
        length_source: RIGHT_WRIST,
    },
];

/// Arm adapter. Limb expressions are computed from the armature at
/// construction, before any relation is registered.
#[derive(Clone, Debug)]
pub struct PoseRig {
    pub limb_drivers: Vec<LimbDriver>,
    diagnostics: Vec<Diagnostic>,
}

impl PoseRig {
    pub fn new(pose_bones: &[PoseBone]) -> Self {
        let bones: HashMap<&str, &PoseBone> =
            pose_bones.iter().map(|b| (b.name.as_str(), b)).collect();

        let mut diagnostics = Vec::new();
        let mut limb_drivers = Vec::with_capacity(ARM_CHAINS.len());
        for chain in ARM_CHAINS {
            let mut driver = LimbDriver::new(chain);
            match driver.set_expressions(&bones) {
                Ok(()) => {}
                Err(RigError::MissingBone { bone }) => {
                    warn!("{REGION}: limb '{}' skipped, no pose bone '{bone}'", chain.target);
                    diagnostics.push(Diagnostic::missing_bone(REGION, &bone));
                }
                Err(err) => warn!("{REGION}: limb '{}' skipped: {err}", chain.target),
            }
            limb_drivers.push(driver);
        }

        Self {
            limb_drivers,
            diagnostics,
        }
    }

    /// Create empties for IK targets the scene does not have yet.
    pub fn create_driver_targets<H: RigHost>(
        host: &mut H,
        collection: &str,
        size: f64,
    ) -> Vec<ObjectId> {
        let mut created = Vec::new();
        for chain in &ARM_CHAINS {
            if host.object_by_name(chain.target).is_none() {
                created.push(host.create_empty(chain.target, size));
            }
        }
        if !created.is_empty() {
            host.add_to_collection(collection, &created);
        }
        created
    }
}

impl RigAdapter for PoseRig {
    fn region(&self) -> &'static str {
        REGION
    }

    fn role_mappings(&self) -> Vec<RoleMapping> {
        let drivers = self
            .limb_drivers
            .iter()
            .flat_map(|limb| limb.pose_drivers.iter())
            .map(|pose_driver| RoleMapping::MultiUser {
                role: pose_driver.name.clone(),
                family: DriverFamily::Limb,
                consumers: pose_driver.expressions.clone(),
            });
        let constraints = POSE_CONSTRAINTS
            .iter()
            .map(|(marker, bone, kind)| RoleMapping::Single {
                role: marker.to_string(),
                constraint: ConstraintSpec::new(bone, *kind),
            });
        drivers.chain(constraints).collect()
    }

    fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
