//! Per-frame pose data assignment.
//!
//! Landmark frames are turned into keyframes on the marker empties:
//!
//! ```text
//! Idle --load--> DataLoaded --compute--> Computed --apply--> Applied
//!   ^                                                          |
//!   +---------------------------- load ------------------------+
//! ```
//!
//! The only metric always computed is the average arm segment length, which
//! is keyframed into `scale.z` of both wrist markers and consumed by the limb
//! drivers. Positions, center points and center rotations are optional steps
//! selected through [`PoseConfig`].

use hashbrown::HashMap;
use log::{debug, error, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{MarkerConfig, PoseConfig};
use crate::error::RigError;
use crate::expression::TransformChannel;
use crate::host::{MarkerObject, RigHost};
use crate::math::{center_point, offset_euler, rotate_towards, to_euler, vector_distance};
use crate::math::{Axis, Euler, TrackAxis, Vec3};
use crate::naming::{landmark_name, HIP_CENTER_INDEX, POSE_LANDMARKS, SHOULDER_CENTER_INDEX};

/// One tracked point of a frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub index: usize,
    pub position: [f64; 3],
}

impl Landmark {
    pub fn new(index: usize, position: [f64; 3]) -> Self {
        Self { index, position }
    }
}

/// Arm landmark ranges `[start, end)`: right arm, then left arm. Joints are
/// `(v, v + 2)` for every other `v` in `start..end - 2`.
pub const ARMS: [[usize; 2]; 2] = [[12, 17], [11, 16]];

/// Wrist markers receiving the average limb length.
pub const LENGTH_TARGETS: [usize; 2] = [15, 16];

const LEFT_SHOULDER: usize = 11;
const RIGHT_SHOULDER: usize = 12;
const LEFT_HIP: usize = 23;
const RIGHT_HIP: usize = 24;

/// Applied to the derived center rotations, in multiples of π.
const CENTER_ROTATION_OFFSET: [f64; 3] = [-0.5, 0.0, -0.5];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AssignmentState {
    Idle,
    DataLoaded,
    Computed,
    Applied,
}

impl fmt::Display for AssignmentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AssignmentState::Idle => "idle",
            AssignmentState::DataLoaded => "data loaded",
            AssignmentState::Computed => "computed",
            AssignmentState::Applied => "applied",
        })
    }
}

/// Result of [`PoseAssignment::update_frame`].
#[derive(Debug)]
pub enum FrameOutcome {
    /// Number of keyframes written.
    Applied(usize),
    Skipped(RigError),
}

impl FrameOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FrameOutcome::Applied(_))
    }
}

/// Metrics of one frame, committed only once every step succeeded.
struct DerivedFrame {
    average_rig_scale: f64,
    positions: Vec<(usize, Vec3)>,
    rotation_data: Vec<(usize, Euler)>,
    scale_data: Vec<(usize, [f64; 3])>,
}

#[derive(Debug)]
pub struct PoseAssignment {
    cfg: PoseConfig,
    state: AssignmentState,
    frame: i32,
    data: HashMap<usize, Vec3>,
    available: usize,
    positions: Vec<(usize, Vec3)>,
    rotation_data: Vec<(usize, Euler)>,
    scale_data: Vec<(usize, [f64; 3])>,
    average_rig_scale: Option<f64>,
    prev_rotation: HashMap<usize, Euler>,
}

impl PoseAssignment {
    pub fn new(cfg: PoseConfig) -> Self {
        Self {
            cfg,
            state: AssignmentState::Idle,
            frame: 0,
            data: HashMap::new(),
            available: 0,
            positions: Vec::new(),
            rotation_data: Vec::new(),
            scale_data: Vec::new(),
            average_rig_scale: None,
            prev_rotation: HashMap::new(),
        }
    }

    /// Create one empty per landmark plus the two center empties and collect
    /// them. Markers that already exist are reused.
    pub fn init_markers<H: RigHost>(host: &mut H, cfg: &MarkerConfig) -> Vec<MarkerObject> {
        let centers = [SHOULDER_CENTER_INDEX, HIP_CENTER_INDEX];
        let wanted = POSE_LANDMARKS
            .iter()
            .map(|name| (*name, cfg.landmark_size))
            .chain(
                centers
                    .iter()
                    .filter_map(|i| landmark_name(*i))
                    .map(|name| (name, cfg.center_size)),
            );

        let mut markers = Vec::with_capacity(POSE_LANDMARKS.len() + centers.len());
        for (name, size) in wanted {
            let id = match host.object_by_name(name) {
                Some(id) => id,
                None => host.create_empty(name, size),
            };
            markers.push(MarkerObject::new(id, name));
        }
        let ids: Vec<_> = markers.iter().map(|m| m.id).collect();
        host.add_to_collection(&cfg.collection, &ids);
        debug!("pose: {} markers in '{}'", markers.len(), cfg.collection);
        markers
    }

    pub fn state(&self) -> AssignmentState {
        self.state
    }

    pub fn frame(&self) -> i32 {
        self.frame
    }

    /// Average arm segment length of the last computed frame.
    pub fn average_rig_scale(&self) -> Option<f64> {
        self.average_rig_scale
    }

    pub fn scale_data(&self) -> &[(usize, [f64; 3])] {
        &self.scale_data
    }

    pub fn rotation_data(&self) -> &[(usize, Euler)] {
        &self.rotation_data
    }

    pub fn positions(&self) -> &[(usize, Vec3)] {
        &self.positions
    }

    /// Rotation kept from the last computed frame for `index`.
    pub fn previous_rotation(&self, index: usize) -> Option<Euler> {
        self.prev_rotation.get(&index).copied()
    }

    pub fn load(&mut self, landmarks: &[Landmark], frame: i32) -> Result<(), RigError> {
        match self.state {
            AssignmentState::Idle | AssignmentState::Applied => {}
            state => return Err(invalid("load", state)),
        }
        let remap = self.cfg.remap_axes;
        self.data = landmarks
            .iter()
            .map(|l| {
                let [x, y, z] = l.position;
                let p = if remap {
                    Vec3::new(-x, z, -y)
                } else {
                    Vec3::new(x, y, z)
                };
                (l.index, p)
            })
            .collect();
        self.available = landmarks.len();
        self.frame = frame;
        self.state = AssignmentState::DataLoaded;
        Ok(())
    }

    fn point(&self, index: usize) -> Result<Vec3, RigError> {
        self.data.get(&index).copied().ok_or(RigError::FrameData {
            index,
            available: self.available,
        })
    }

    /// Derive this frame's metrics. On error the state drops back to
    /// [`AssignmentState::Idle`] and the last good frame's values are kept.
    pub fn compute(&mut self) -> Result<(), RigError> {
        if self.state != AssignmentState::DataLoaded {
            return Err(invalid("compute", self.state));
        }
        let derived = match self.derive() {
            Ok(derived) => derived,
            Err(err) => {
                self.state = AssignmentState::Idle;
                return Err(err);
            }
        };

        for (index, rot) in &derived.rotation_data {
            self.prev_rotation.insert(*index, *rot);
        }
        self.average_rig_scale = Some(derived.average_rig_scale);
        self.positions = derived.positions;
        self.rotation_data = derived.rotation_data;
        self.scale_data = derived.scale_data;
        self.state = AssignmentState::Computed;
        Ok(())
    }

    fn derive(&self) -> Result<DerivedFrame, RigError> {
        let avg = self.arm_length()?;
        let scale_data = LENGTH_TARGETS
            .iter()
            .map(|index| (*index, [1.0, 1.0, avg]))
            .collect();

        let mut positions = Vec::new();
        if self.cfg.keyframe_positions {
            positions.extend(self.data.iter().map(|(i, p)| (*i, *p)));
            positions.sort_by_key(|(i, _)| *i);
        }

        if self.cfg.derive_centers {
            let shoulder = center_point(&self.point(LEFT_SHOULDER)?, &self.point(RIGHT_SHOULDER)?);
            let hip = center_point(&self.point(LEFT_HIP)?, &self.point(RIGHT_HIP)?);
            positions.push((SHOULDER_CENTER_INDEX, shoulder));
            positions.push((HIP_CENTER_INDEX, hip));
        }

        let mut rotation_data = Vec::new();
        if self.cfg.derive_rotations {
            let pairs = [
                (SHOULDER_CENTER_INDEX, LEFT_SHOULDER, RIGHT_SHOULDER),
                (HIP_CENTER_INDEX, LEFT_HIP, RIGHT_HIP),
            ];
            for (index, from, to) in pairs {
                let q = rotate_towards(&self.point(from)?, &self.point(to)?, TrackAxis::Y, Axis::Z);
                // continuity is judged before the fixed offset is applied
                let previous = self
                    .previous_rotation(index)
                    .map(|prev| offset_euler(prev, CENTER_ROTATION_OFFSET.map(|o| -o)));
                let euler = to_euler(&q, previous);
                rotation_data.push((index, offset_euler(euler, CENTER_ROTATION_OFFSET)));
            }
        }

        Ok(DerivedFrame {
            average_rig_scale: avg,
            positions,
            rotation_data,
            scale_data,
        })
    }

    /// Mean over both arms of the mean joint-to-joint distance.
    fn arm_length(&self) -> Result<f64, RigError> {
        let mut per_arm = Vec::with_capacity(ARMS.len());
        for [start, end] in ARMS {
            let mut lengths = Vec::new();
            for v in (start..end.saturating_sub(2)).step_by(2) {
                lengths.push(vector_distance(&self.point(v)?, &self.point(v + 2)?));
            }
            per_arm.push(mean(&lengths));
        }
        Ok(mean(&per_arm))
    }

    /// Keyframe the computed values at the loaded frame. Returns the number of
    /// keyframes written.
    pub fn apply<H: RigHost>(&mut self, host: &mut H) -> Result<usize, RigError> {
        if self.state != AssignmentState::Computed {
            return Err(invalid("apply", self.state));
        }
        let mut by_name: HashMap<String, _> = HashMap::new();
        for MarkerObject { id, name } in host.objects() {
            by_name.entry(name).or_insert(id);
        }

        let mut written = 0;
        let mut keyframe = |index: usize, channel: TransformChannel, value: [f64; 3]| {
            let Some(name) = landmark_name(index) else {
                return;
            };
            match by_name.get(name) {
                Some(&id) => {
                    host.insert_keyframe(id, channel, value, self.frame);
                    written += 1;
                }
                None => warn!("pose: no marker '{name}' for frame {}", self.frame),
            }
        };

        for (index, p) in &self.positions {
            keyframe(*index, TransformChannel::Location, [p.x, p.y, p.z]);
        }
        for (index, rot) in &self.rotation_data {
            keyframe(*index, TransformChannel::RotationEuler, rot.to_array());
        }
        for (index, scale) in &self.scale_data {
            keyframe(*index, TransformChannel::Scale, *scale);
        }

        self.state = AssignmentState::Applied;
        Ok(written)
    }

    /// Run a full load/compute/apply cycle. Frame data errors skip the frame.
    pub fn update_frame<H: RigHost>(
        &mut self,
        host: &mut H,
        landmarks: &[Landmark],
        frame: i32,
    ) -> FrameOutcome {
        if self.state != AssignmentState::Applied {
            self.state = AssignmentState::Idle;
        }
        let result = self
            .load(landmarks, frame)
            .and_then(|()| self.compute())
            .and_then(|()| self.apply(host));
        match result {
            Ok(written) => FrameOutcome::Applied(written),
            Err(err) => {
                error!("pose: frame {frame} skipped: {err}");
                self.state = AssignmentState::Idle;
                FrameOutcome::Skipped(err)
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn invalid(action: &'static str, state: AssignmentState) -> RigError {
    RigError::InvalidState {
        action,
        state: state.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::InMemoryScene;

    fn straight_arms() -> Vec<Landmark> {
        (0..33)
            .map(|i| {
                let y = match i {
                    13 | 14 => -0.3,
                    15 | 16 => -0.6,
                    _ => 0.0,
                };
                Landmark::new(i, [0.0, y, 0.0])
            })
            .collect()
    }

    #[test]
    fn arm_length_averages_both_arms() {
        let mut pose = PoseAssignment::new(PoseConfig::default());
        pose.load(&straight_arms(), 1).unwrap();
        pose.compute().unwrap();
        let avg = pose.average_rig_scale().unwrap();
        assert!((avg - 0.3).abs() < 1e-12);
        assert_eq!(pose.scale_data()[0].0, 15);
        assert_eq!(pose.scale_data()[1].0, 16);
    }

    #[test]
    fn out_of_order_calls_are_rejected() {
        let mut pose = PoseAssignment::new(PoseConfig::default());
        assert!(matches!(pose.compute(), Err(RigError::InvalidState { .. })));
        pose.load(&straight_arms(), 1).unwrap();
        assert!(matches!(
            pose.load(&straight_arms(), 2),
            Err(RigError::InvalidState { .. })
        ));
    }

    #[test]
    fn short_frame_resets_to_idle() {
        let mut pose = PoseAssignment::new(PoseConfig::default());
        let short: Vec<_> = straight_arms().into_iter().take(12).collect();
        pose.load(&short, 1).unwrap();
        let err = pose.compute().unwrap_err();
        assert!(matches!(err, RigError::FrameData { index: 12, available: 12 }));
        assert_eq!(pose.state(), AssignmentState::Idle);
    }

    #[test]
    fn skipped_frame_keeps_last_good_metrics() {
        let cfg = PoseConfig {
            derive_centers: true,
            ..PoseConfig::default()
        };
        let mut pose = PoseAssignment::new(cfg);
        let mut scene = InMemoryScene::new();
        PoseAssignment::init_markers(&mut scene, &MarkerConfig::default());
        assert!(pose.update_frame(&mut scene, &straight_arms(), 1).is_applied());
        let keyframes = scene.keyframes.len();

        // longer arms, but the right hip is missing so the center step fails
        let longer: Vec<_> = straight_arms()
            .into_iter()
            .filter(|l| l.index != RIGHT_HIP)
            .map(|l| {
                let y = match l.index {
                    13 | 14 => -0.5,
                    15 | 16 => -1.0,
                    _ => l.position[1],
                };
                Landmark::new(l.index, [0.0, y, 0.0])
            })
            .collect();
        let outcome = pose.update_frame(&mut scene, &longer, 2);

        assert!(matches!(
            outcome,
            FrameOutcome::Skipped(RigError::FrameData { index: 24, available: 32 })
        ));
        assert_eq!(scene.keyframes.len(), keyframes);
        assert_eq!(pose.state(), AssignmentState::Idle);
        assert_eq!(pose.average_rig_scale(), Some(0.3));
        assert_eq!(pose.scale_data(), &[(15, [1.0, 1.0, 0.3]), (16, [1.0, 1.0, 0.3])]);
        assert!(pose
            .positions()
            .iter()
            .any(|(i, p)| *i == HIP_CENTER_INDEX && p.y == 0.0));
    }
}
