//! Vizij Rig Core (host-agnostic)
//!
//! Maps tracked landmarks onto an armature. A build registers driver and
//! constraint relations between marker empties and pose bones and applies them
//! once through a [`RigHost`]; per-frame updates keyframe derived metrics onto
//! the markers the drivers read from.
//!
//! ```text
//! landmarks --> PoseAssignment --keyframes--> markers --drivers--> IK targets
//!                                                     --constraints--> pose bones
//! ```

pub mod adapters;
pub mod apply;
pub mod assignment;
pub mod config;
pub mod error;
pub mod expression;
pub mod host;
pub mod ids;
pub mod limb;
pub mod math;
pub mod naming;
pub mod relation;
pub mod scene;

use log::{debug, info};

pub use adapters::{wire, FaceRig, PoseRig, RegionReport, RigAdapter};
pub use apply::{apply_relations, ApplyReport};
pub use assignment::{AssignmentState, FrameOutcome, Landmark, PoseAssignment};
pub use config::{FaceConfig, FaceDriverConfig, FaceRegion, MarkerConfig, PoseConfig, RigConfig};
pub use error::{Diagnostic, RigError};
pub use expression::{DriverAttribute, FaceRole, Formula, ScaleExpr, TransformChannel};
pub use host::{ConstraintKind, MarkerObject, PoseBone, RigHost};
pub use ids::{BoneId, DriverId, ObjectId};
pub use limb::{LimbChain, LimbDriver, PoseDriver};
pub use relation::{DriverType, MappingRelation, Relation, RelationRegistry, RoleMapping};
pub use scene::{InMemoryScene, RigLayout};

/// A wired rig: the relations of this build and the per-frame pose state.
#[derive(Debug)]
pub struct RigHandle {
    pub armature: ObjectId,
    pub relations: Vec<MappingRelation>,
    pub reports: Vec<RegionReport>,
    pose: Option<PoseAssignment>,
}

impl RigHandle {
    /// Everything skipped while wiring, across regions.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter().flat_map(|r| r.skipped.iter())
    }

    pub fn report(&self, region: &str) -> Option<&RegionReport> {
        self.reports.iter().find(|r| r.region == region)
    }

    pub fn pose(&self) -> Option<&PoseAssignment> {
        self.pose.as_ref()
    }

    /// Keyframe one landmark frame. Frames with missing landmarks are skipped
    /// and logged; the rig keeps its previous rotation state.
    pub fn update_frame<H: RigHost>(
        &mut self,
        host: &mut H,
        landmarks: &[Landmark],
        frame: i32,
    ) -> FrameOutcome {
        match self.pose.as_mut() {
            Some(pose) => pose.update_frame(host, landmarks, frame),
            None => FrameOutcome::Skipped(RigError::InvalidState {
                action: "update frame",
                state: "pose region disabled".to_string(),
            }),
        }
    }
}

/// Wire the enabled regions of `cfg` onto `armature`.
///
/// `markers` are the landmark/face markers present in the scene; missing IK
/// target empties are created. Configuration errors abort before the host is
/// modified. Missing markers and bones are reported per region.
pub fn build_rig<H: RigHost>(
    host: &mut H,
    armature: ObjectId,
    markers: &[MarkerObject],
    cfg: &RigConfig,
) -> Result<RigHandle, RigError> {
    let bones = host.pose_bones(armature);
    debug!("build_rig: {} pose bones, {} markers", bones.len(), markers.len());

    let face = if cfg.regions.face {
        Some(FaceRig::new(&bones, &cfg.face)?)
    } else {
        None
    };
    let pose = cfg.regions.pose.then(|| PoseRig::new(&bones));

    let mut live = markers.to_vec();
    let mut relations = Vec::new();
    let mut reports = Vec::new();

    if let Some(pose) = &pose {
        PoseRig::create_driver_targets(host, &cfg.markers.collection, cfg.markers.target_size);
        for chain in &adapters::pose::ARM_CHAINS {
            if live.iter().any(|m| m.name == chain.target) {
                continue;
            }
            if let Some(id) = host.object_by_name(chain.target) {
                live.push(MarkerObject::new(id, chain.target));
            }
        }
        let (rels, report) = wire(host, armature, &live, pose);
        relations.extend(rels);
        reports.push(report);
    }
    if let Some(face) = &face {
        let (rels, report) = wire(host, armature, &live, face);
        relations.extend(rels);
        reports.push(report);
    }

    for report in &reports {
        info!(
            "{}: {} relations, {} drivers, {} constraints, {} skipped",
            report.region,
            report.relations,
            report.drivers,
            report.constraints,
            report.skipped.len()
        );
    }

    Ok(RigHandle {
        armature,
        relations,
        reports,
        pose: cfg.regions.pose.then(|| PoseAssignment::new(cfg.pose)),
    })
}
