//! Face rig: eye lids and mouth corners.
//!
//! The eye and mouth markers carry an openness value in one scale axis. Each
//! feeds several lid/lip markers through face drivers (a multi-user driver),
//! and those markers move the pose bones through offset constraints.

use hashbrown::HashMap;
use log::warn;

use super::RigAdapter;
use crate::config::{FaceConfig, FaceRegion};
use crate::error::{Diagnostic, RigError};
use crate::expression::{DriverAttribute, FaceRole};
use crate::host::{ConstraintKind, PoseBone};
use crate::math::vector_distance;
use crate::naming::face::*;
use crate::relation::{ConstraintSpec, DriverFamily, RoleMapping};

pub const REGION: &str = "face";

/// Lid bone pairs, right then left.
pub const EYE_BONES: [[&str; 2]; 2] = [["lid.T.R.002", "lid.B.R.002"], ["lid.T.L.002", "lid.B.L.002"]];

/// Vertical then lateral lip bone pairs.
pub const MOUTH_BONES: [[&str; 2]; 2] = [["lip.T", "lip.B"], ["lips.R", "lips.L"]];

/// Multi-user drivers: (source marker, target marker, distance region, role).
pub const FACE_DRIVERS: [(&str, &str, FaceRegion, &str); 8] = [
    (RIGHT_EYE, RIGHT_EYE_T, FaceRegion::RightEye, "eye_top_down"),
    (RIGHT_EYE, RIGHT_EYE_B, FaceRegion::RightEye, "eye_up"),
    (LEFT_EYE, LEFT_EYE_T, FaceRegion::LeftEye, "eye_top_down"),
    (LEFT_EYE, LEFT_EYE_B, FaceRegion::LeftEye, "eye_up"),
    (MOUTH, MOUTH_T, FaceRegion::MouthVertical, "mouth_up"),
    (MOUTH, MOUTH_B, FaceRegion::MouthVertical, "mouth_down"),
    (MOUTH, MOUTH_R, FaceRegion::MouthLateral, "mouth_left"),
    (MOUTH, MOUTH_L, FaceRegion::MouthLateral, "mouth_right"),
];

/// Single-user constraints: marker → (pose bone, kind).
pub const FACE_CONSTRAINTS: [(&str, &str, ConstraintKind); 10] = [
    (RIGHT_EYE_T, "lid.T.R.002", ConstraintKind::CopyLocationOffset),
    (RIGHT_EYE_B, "lid.B.R.002", ConstraintKind::CopyLocationOffset),
    (LEFT_EYE_T, "lid.T.L.002", ConstraintKind::CopyLocationOffset),
    (LEFT_EYE_B, "lid.B.L.002", ConstraintKind::CopyLocationOffset),
    (MOUTH_T, "lip.T", ConstraintKind::CopyLocationOffset),
    (MOUTH_B, "lip.B", ConstraintKind::CopyLocationOffset),
    (MOUTH_L, "lips.R", ConstraintKind::CopyLocationOffset),
    (MOUTH_R, "lips.L", ConstraintKind::CopyLocationOffset),
    (HEAD, "head", ConstraintKind::CopyRotationWorld),
    (CHIN, "jaw_master", ConstraintKind::CopyRotation),
];

/// Marker order of the multi-user roles.
const DRIVER_MARKERS: [&str; 3] = [MOUTH, LEFT_EYE, RIGHT_EYE];

#[derive(Clone, Debug, PartialEq)]
struct FaceTarget {
    source: String,
    attribute: DriverAttribute,
}

#[derive(Clone, Debug)]
pub struct FaceRig {
    targets: Vec<FaceTarget>,
    distances: HashMap<FaceRegion, f64>,
    diagnostics: Vec<Diagnostic>,
}

impl FaceRig {
    /// Measure the lid/lip distances and build the driver table.
    ///
    /// Unknown role names (static or from `cfg`) abort with
    /// [`RigError::Configuration`]; missing bones only drop the drivers that
    /// depend on them.
    pub fn new(pose_bones: &[PoseBone], cfg: &FaceConfig) -> Result<Self, RigError> {
        let bones: HashMap<&str, &PoseBone> =
            pose_bones.iter().map(|b| (b.name.as_str(), b)).collect();

        let mut diagnostics = Vec::new();
        let mut distances = HashMap::new();
        for region in FaceRegion::ALL {
            match average_bone_distance(&bones, region.bone_pairs()) {
                Ok(d) => {
                    distances.insert(region, d);
                }
                Err(bone) => {
                    warn!("{REGION}: no pose bone '{bone}', {region:?} drivers dropped");
                    diagnostics.push(Diagnostic::missing_bone(REGION, &bone));
                }
            }
        }

        let configured = FACE_DRIVERS
            .iter()
            .map(|&(source, target, region, role)| (source, target, region, role))
            .chain(cfg.extra_drivers.iter().map(|d| {
                (d.source.as_str(), d.target.as_str(), d.region, d.role.as_str())
            }));

        let mut targets = Vec::new();
        for (source, target, region, role) in configured {
            let role: FaceRole = role.parse()?;
            if let Some(&distance) = distances.get(&region) {
                targets.push(FaceTarget {
                    source: source.to_string(),
                    attribute: role.attribute(target, source, distance),
                });
            }
        }

        Ok(Self {
            targets,
            distances,
            diagnostics,
        })
    }

    /// Average bone distance measured for `region`.
    pub fn distance(&self, region: FaceRegion) -> Option<f64> {
        self.distances.get(&region).copied()
    }
}

impl FaceRegion {
    const ALL: [FaceRegion; 4] = [
        FaceRegion::RightEye,
        FaceRegion::LeftEye,
        FaceRegion::MouthVertical,
        FaceRegion::MouthLateral,
    ];

    fn bone_pairs(self) -> &'static [[&'static str; 2]] {
        match self {
            FaceRegion::RightEye => &EYE_BONES[0..1],
            FaceRegion::LeftEye => &EYE_BONES[1..2],
            FaceRegion::MouthVertical => &MOUTH_BONES[0..1],
            FaceRegion::MouthLateral => &MOUTH_BONES[1..2],
        }
    }
}

/// Mean head-to-head distance over `pairs`; `Err` names the first missing bone.
fn average_bone_distance(
    bones: &HashMap<&str, &PoseBone>,
    pairs: &[[&str; 2]],
) -> Result<f64, String> {
    let mut total = 0.0;
    for [a, b] in pairs {
        let a = bones.get(a).ok_or_else(|| a.to_string())?;
        let b = bones.get(b).ok_or_else(|| b.to_string())?;
        total += vector_distance(&a.head, &b.head);
    }
    Ok(total / pairs.len().max(1) as f64)
}

impl RigAdapter for FaceRig {
    fn region(&self) -> &'static str {
        REGION
    }

    fn role_mappings(&self) -> Vec<RoleMapping> {
        let mut markers: Vec<&str> = DRIVER_MARKERS.to_vec();
        for target in &self.targets {
            if !markers.contains(&target.source.as_str()) {
                markers.push(&target.source);
            }
        }

        let drivers = markers.into_iter().map(|marker| RoleMapping::MultiUser {
            role: marker.to_string(),
            family: DriverFamily::Face,
            consumers: self
                .targets
                .iter()
                .filter(|t| t.source == marker)
                .map(|t| t.attribute.clone())
                .collect(),
        });
        let constraints = FACE_CONSTRAINTS
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
