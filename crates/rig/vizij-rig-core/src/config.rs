//! Rig build configuration.

use serde::{Deserialize, Serialize};

use crate::error::RigError;

/// Top-level configuration for [`crate::build_rig`]. Every field has a
/// default, so partial JSON documents are accepted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub regions: Regions,
    pub markers: MarkerConfig,
    pub pose: PoseConfig,
    pub face: FaceConfig,
}

impl RigConfig {
    pub fn from_json(text: &str) -> Result<Self, RigError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Which adapters run during a build.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Regions {
    pub pose: bool,
    pub face: bool,
}

impl Default for Regions {
    fn default() -> Self {
        Self {
            pose: true,
            face: true,
        }
    }
}

/// Marker empties created by the pose assignment and the arm adapter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub collection: String,
    pub landmark_size: f64,
    pub center_size: f64,
    /// IK target empties created by the arm adapter.
    pub target_size: f64,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            collection: "cgt_pose".to_string(),
            landmark_size: 0.025,
            center_size: 0.01,
            target_size: 0.025,
        }
    }
}

/// Per-frame pose assignment steps. Only the limb length is always computed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    pub keyframe_positions: bool,
    /// Convert tracker space to rig space as `[-x, z, -y]`.
    pub remap_axes: bool,
    pub derive_centers: bool,
    pub derive_rotations: bool,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            keyframe_positions: true,
            remap_axes: false,
            derive_centers: false,
            derive_rotations: false,
        }
    }
}

/// Bone pairs whose average distance scales a face driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceRegion {
    RightEye,
    LeftEye,
    MouthVertical,
    MouthLateral,
}

/// A user-defined face driver consumer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceDriverConfig {
    pub source: String,
    pub target: String,
    pub region: FaceRegion,
    /// Role name, e.g. `"mouth_up"`.
    pub role: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceConfig {
    pub extra_drivers: Vec<FaceDriverConfig>,
}
